//! The outbound side of a connection as seen by the subscription manager.

use std::collections::VecDeque;

use crate::error::WsError;

/// Sink for serialized JSON-RPC frames.
///
/// The manager is the only writer; implementations must deliver frames in
/// the order `send` is called.
pub trait Transport {
    fn send(&mut self, frame: String) -> Result<(), WsError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: String) -> Result<(), WsError> {
        (**self).send(frame)
    }
}

/// FIFO frame buffer.
///
/// The WebSocket driver drains it into the socket after every handler call,
/// so handlers stay synchronous.
#[derive(Debug, Default)]
pub struct Outbox {
    frames: VecDeque<String>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued frames, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        self.frames.drain(..).collect()
    }

    /// Queued frames, oldest first, without removing them.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Transport for Outbox {
    fn send(&mut self, frame: String) -> Result<(), WsError> {
        self.frames.push_back(frame);
        Ok(())
    }
}
