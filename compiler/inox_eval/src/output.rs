//! Destination of the lines written by the evaluator.
//!
//! Test suites and test cases report their outcome through the output of
//! their [`EvalConfig`](crate::EvalConfig); hosts pick where it goes:
//! - `Stdout`: the default
//! - `Buffer`: captured, for tests and embedding hosts
//! - `Silent`: discarded

use std::sync::Arc;

use parking_lot::Mutex;

/// Output handler, dispatched by enum rather than trait object.
pub enum OutputHandler {
    Stdout,
    Buffer(Mutex<String>),
    Silent,
}

impl OutputHandler {
    pub fn stdout() -> Arc<Self> {
        Arc::new(OutputHandler::Stdout)
    }

    pub fn buffer() -> Arc<Self> {
        Arc::new(OutputHandler::Buffer(Mutex::new(String::new())))
    }

    pub fn silent() -> Arc<Self> {
        Arc::new(OutputHandler::Silent)
    }

    /// Write a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(msg);
                buffer.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Write without newline.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => print!("{msg}"),
            Self::Buffer(buffer) => buffer.lock().push_str(msg),
            Self::Silent => {}
        }
    }

    /// Captured output; empty for handlers that do not capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(buffer) => buffer.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(buffer) = self {
            buffer.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests;
