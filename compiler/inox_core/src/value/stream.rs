//! Readable streams backed by a channel.
//!
//! Readers wait for elements with a deadline: [`Stream::wait_next`] returns
//! `WaitTimeout` when no element arrived in time and `StreamEnded` once the
//! writing side is closed and every element has been read.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use super::Value;
use crate::context::Context;
use crate::errors::{self, EvalError};

/// Deadline of one wait inside a `for` loop over a stream.
pub const STREAM_ITERATION_WAIT_TIMEOUT: Duration = Duration::from_millis(5);

pub struct Stream {
    receiver: Receiver<Value>,
    sender: Mutex<Option<Sender<Value>>>,
}

impl Stream {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Stream {
            receiver,
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Stream already holding `values` and closed for writing.
    pub fn from_values(values: Vec<Value>) -> Self {
        let stream = Stream::new();
        for value in values {
            let _ = stream.write(value);
        }
        stream.close();
        stream
    }

    /// Push an element; fails once the stream is closed.
    pub fn write(&self, value: Value) -> Result<(), EvalError> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(value).map_err(|_| errors::stream_ended()),
            None => Err(errors::stream_ended()),
        }
    }

    /// Close the writing side; buffered elements can still be read.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Whether every element was read and no more can come.
    pub fn is_stopped(&self) -> bool {
        self.is_closed() && self.receiver.is_empty()
    }

    pub fn wait_next(&self, ctx: &Context, timeout: Duration) -> Result<Value, EvalError> {
        if ctx.is_done() {
            return Err(errors::cancelled());
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                if self.is_stopped() {
                    Err(errors::stream_ended())
                } else {
                    Err(errors::wait_timeout())
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(errors::stream_ended()),
        }
    }

    /// Wait for at least one element, then take up to `max` buffered ones.
    pub fn wait_next_chunk(
        &self,
        ctx: &Context,
        max: usize,
        timeout: Duration,
    ) -> Result<Vec<Value>, EvalError> {
        let first = self.wait_next(ctx, timeout)?;
        let mut chunk = vec![first];
        while chunk.len() < max {
            match self.receiver.try_recv() {
                Ok(value) => chunk.push(value),
                Err(_) => break,
            }
        }
        Ok(chunk)
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use crate::errors::EvalErrorKind;

    #[test]
    fn reads_then_ends() {
        let ctx = Context::new_root(ContextConfig::default());
        let stream = Stream::from_values(vec![Value::int(1), Value::int(2)]);
        assert_eq!(
            stream
                .wait_next(&ctx, STREAM_ITERATION_WAIT_TIMEOUT)
                .unwrap()
                .as_int(),
            Some(1)
        );
        assert_eq!(
            stream
                .wait_next(&ctx, STREAM_ITERATION_WAIT_TIMEOUT)
                .unwrap()
                .as_int(),
            Some(2)
        );
        let err = stream
            .wait_next(&ctx, STREAM_ITERATION_WAIT_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::StreamEnded));
    }

    #[test]
    fn open_empty_stream_times_out() {
        let ctx = Context::new_root(ContextConfig::default());
        let stream = Stream::new();
        let err = stream
            .wait_next(&ctx, STREAM_ITERATION_WAIT_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::WaitTimeout));
    }

    #[test]
    fn chunks() {
        let ctx = Context::new_root(ContextConfig::default());
        let stream = Stream::from_values((0..5).map(Value::int).collect());
        let chunk = stream
            .wait_next_chunk(&ctx, 3, STREAM_ITERATION_WAIT_TIMEOUT)
            .unwrap();
        assert_eq!(chunk.len(), 3);
    }
}
