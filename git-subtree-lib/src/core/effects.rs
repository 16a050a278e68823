//! Wrappers around side-effectful operations, such as output and progress
//! indicators.

use std::fmt::Debug;
use std::io::{stderr, stdout, Stderr, Stdout, Write as WriteIo};
use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};

/// The kind of pass currently running, used both for a `tracing` span name
/// and for the progress spinner's message.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationType {
    LoadAnnotations,
    CountCommits,
    ProcessCommits,
    SynthesizeCommit,
    RunGitCommand(Arc<String>),
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::LoadAnnotations => write!(f, "Reading subtree annotations"),
            OperationType::CountCommits => write!(f, "Counting commits to process"),
            OperationType::ProcessCommits => write!(f, "Processing commits"),
            OperationType::SynthesizeCommit => write!(f, "Synthesizing commit"),
            OperationType::RunGitCommand(command) => write!(f, "Running Git command: {command}"),
        }
    }
}

#[derive(Clone)]
enum OutputDest {
    Stdout,
    Suppress,
    BufferForTest {
        stdout: Arc<Mutex<Vec<u8>>>,
        stderr: Arc<Mutex<Vec<u8>>>,
    },
}

/// Wrapper around side-effectful operations: where output goes, and how
/// progress is reported while a pass is running.
#[derive(Clone)]
pub struct Effects {
    dest: OutputDest,
}

impl Debug for Effects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Effects>")
    }
}

impl Effects {
    /// Constructor. Writes to stdout/stderr.
    pub fn new_from_env() -> Self {
        Effects {
            dest: OutputDest::Stdout,
        }
    }

    /// Constructor. Suppresses all output.
    pub fn new_suppress_for_test() -> Self {
        Effects {
            dest: OutputDest::Suppress,
        }
    }

    /// Constructor. Writes to the provided buffers, for test assertions.
    pub fn new_from_buffer_for_test(
        stdout: &Arc<Mutex<Vec<u8>>>,
        stderr: &Arc<Mutex<Vec<u8>>>,
    ) -> Self {
        Effects {
            dest: OutputDest::BufferForTest {
                stdout: Arc::clone(stdout),
                stderr: Arc::clone(stderr),
            },
        }
    }

    /// Suppress output sent to the returned `Effects`, keeping everything
    /// else about it the same. Used when a command wraps another command's
    /// `Effects` (e.g. `pull` wrapping `merge`) and wants to speak for it.
    pub fn suppress(&self) -> Self {
        Self {
            dest: OutputDest::Suppress,
        }
    }

    /// Start reporting progress for the specified operation type. A spinner
    /// is shown on stderr until the returned [`ProgressHandle`] is dropped.
    pub fn start_operation(&self, operation_type: OperationType) -> ProgressHandle {
        let bar = match &self.dest {
            OutputDest::Stdout => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner} {wide_msg} ({elapsed})")
                {
                    bar.set_style(style);
                }
                bar.set_message(operation_type.to_string());
                bar.enable_steady_tick(std::time::Duration::from_millis(100));
                Some(bar)
            }
            OutputDest::Suppress | OutputDest::BufferForTest { .. } => None,
        };
        tracing::debug!(operation = %operation_type, "starting operation");
        ProgressHandle {
            operation_type,
            bar,
        }
    }

    /// Create a stream that ordinary output can be written to.
    pub fn get_output_stream(&self) -> OutputStream {
        OutputStream {
            dest: self.dest.clone(),
        }
    }

    /// Create a stream that error/diagnostic output can be written to.
    pub fn get_error_stream(&self) -> ErrorStream {
        ErrorStream {
            dest: self.dest.clone(),
        }
    }
}

/// A handle to an operation in progress; kept alive for the operation's
/// duration, and dropped once it completes.
#[derive(Debug)]
pub struct ProgressHandle {
    operation_type: OperationType,
    bar: Option<ProgressBar>,
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressHandle {
    /// Notify the progress meter of the total amount of work and how much of
    /// it has been completed so far.
    pub fn notify_progress(&self, current: usize, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(current as u64);
        }
    }

    /// Notify the progress meter that additional progress has taken place.
    pub fn notify_progress_inc(&self, increment: usize) {
        if let Some(bar) = &self.bar {
            bar.inc(increment as u64);
        }
    }

    /// Update the status line without changing the underlying counters.
    pub fn notify_status(&self, message: impl Into<String>) {
        let message = message.into();
        if let Some(bar) = &self.bar {
            bar.set_message(message.clone());
        }
        tracing::debug!(operation = %self.operation_type, status = %message, "operation status");
    }
}

macro_rules! impl_write_stream {
    ($name:ident, $real:ident, $real_fn:ident, $buffer_field:ident) => {
        /// A handle implementing `std::io::Write`, routed to stdout, to the
        /// void, or to an in-memory buffer depending on how the owning
        /// [`Effects`] was constructed.
        pub struct $name {
            dest: OutputDest,
        }

        impl WriteIo for $name {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                match &self.dest {
                    OutputDest::Stdout => $real_fn().write(buf),
                    OutputDest::Suppress => Ok(buf.len()),
                    OutputDest::BufferForTest { $buffer_field, .. } => {
                        $buffer_field.lock().unwrap().write(buf)
                    }
                }
            }

            fn flush(&mut self) -> std::io::Result<()> {
                match &self.dest {
                    OutputDest::Stdout => $real_fn().flush(),
                    OutputDest::Suppress => Ok(()),
                    OutputDest::BufferForTest { $buffer_field, .. } => {
                        $buffer_field.lock().unwrap().flush()
                    }
                }
            }
        }
    };
}

impl_write_stream!(OutputStream, Stdout, stdout, stdout);
impl_write_stream!(ErrorStream, Stderr, stderr, stderr);
