//! Per-connection session state.

use std::time::{Duration, Instant};
use uuid::Uuid;

/// Where a connection is in its read/dispatch/write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, nothing read yet.
    Open,
    /// Waiting for the next command line.
    Reading,
    /// A command is being handled.
    Dispatching,
    /// The response line is being written.
    Writing,
    /// The connection is finished.
    Closed,
}

/// A client session, owned by exactly one connection handler.
#[derive(Debug)]
pub struct Session {
    /// Unique session ID.
    pub id: String,

    /// Peer description used in log lines.
    pub peer: String,

    state: SessionState,
    handled: u64,
    skipped: u64,
    created_at: Instant,
}

impl Session {
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            peer: peer.into(),
            state: SessionState::Open,
            handled: 0,
            skipped: 0,
            created_at: Instant::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        tracing::trace!("[{}] Session {} -> {:?}", self.peer, self.id, state);
        self.state = state;
    }

    /// Records a command answered with a response.
    pub fn record_handled(&mut self) {
        self.handled += 1;
    }

    /// Records a line dropped without a response.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn handled_count(&self) -> u64 {
        self.handled
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    /// Returns the session age.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new("127.0.0.1:12345");
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.peer, "127.0.0.1:12345");
        assert_eq!(session.handled_count(), 0);
        assert!(!session.is_closed());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = Session::new("a");
        let b = Session::new("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_session_counters() {
        let mut session = Session::new("peer");
        session.record_handled();
        session.record_handled();
        session.record_skipped();
        session.set_state(SessionState::Closed);

        assert_eq!(session.handled_count(), 2);
        assert_eq!(session.skipped_count(), 1);
        assert!(session.is_closed());
    }
}
