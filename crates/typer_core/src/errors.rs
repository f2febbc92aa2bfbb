//! Compilation diagnostics and the concurrent error/query channel.
//!
//! The pipeline's phases push `PendingError`s and `QueryResponse`s into a
//! bounded multi-producer queue owned (via `Arc`) by a `GlobalState`; the
//! single consumer (batch driver or LSP event loop) drains on demand.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

use crate::global_state::GlobalState;
use crate::loc::Loc;
use crate::query::QueryResponse;

/// A stable integer identifying an error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorClass {
    pub code: u16,
}

impl ErrorClass {
    pub const fn new(code: u16) -> Self {
        Self { code }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Error classes by pipeline phase.
pub mod classes {
    use super::ErrorClass;

    pub mod parser {
        use super::ErrorClass;
        pub const PARSE_ERROR: ErrorClass = ErrorClass::new(2001);
    }

    pub mod namer {
        use super::ErrorClass;
        pub const REDEFINITION_OF_METHOD: ErrorClass = ErrorClass::new(4010);
    }

    pub mod resolver {
        use super::ErrorClass;
        pub const DUPLICATE_VARIABLE_DECLARATION: ErrorClass = ErrorClass::new(5004);
        pub const REDEFINITION_OF_PARENTS: ErrorClass = ErrorClass::new(5012);
        pub const STUB_CONSTANT: ErrorClass = ErrorClass::new(5345);
    }

    pub mod infer {
        use super::ErrorClass;
        pub const UNKNOWN_METHOD: ErrorClass = ErrorClass::new(7003);
        pub const NOT_ENOUGH_ARGUMENTS: ErrorClass = ErrorClass::new(7004);
        pub const TOO_MANY_ARGUMENTS: ErrorClass = ErrorClass::new(7005);
        pub const RETURN_TYPE_MISMATCH: ErrorClass = ErrorClass::new(7007);
    }
}

/// One sub-line of a complex error's section.
#[derive(Debug, Clone)]
pub struct ErrorLine {
    pub loc: Loc,
    pub formatted: String,
}

/// A titled group of sub-lines attached to a complex error.
#[derive(Debug, Clone)]
pub struct ErrorSection {
    pub header: String,
    pub messages: Vec<ErrorLine>,
}

/// A diagnostic waiting to be drained by the consumer.
#[derive(Debug, Clone)]
pub struct PendingError {
    pub loc: Loc,
    pub what: ErrorClass,
    pub formatted: String,
    pub sections: Vec<ErrorSection>,
}

impl PendingError {
    pub fn new(loc: Loc, what: ErrorClass, formatted: impl Into<String>) -> Self {
        Self {
            loc,
            what,
            formatted: formatted.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: ErrorSection) -> Self {
        self.sections.push(section);
        self
    }

    fn file_pos_to_string(gs: &GlobalState, loc: Loc) -> String {
        if loc.is_none() {
            return "???:".to_string();
        }
        let (begin, end) = loc.position(gs);
        let path = gs.file(loc.file).path().to_string();
        if begin.line == end.line {
            format!("{}:{}", path, begin.line)
        } else {
            format!("{}:{}-{}", path, begin.line, end.line)
        }
    }

    /// Render for console output.
    pub fn to_string(&self, gs: &GlobalState) -> String {
        let mut buf = format!(
            "{} {} [{}]",
            Self::file_pos_to_string(gs, self.loc),
            self.formatted,
            self.what.code
        );
        for section in &self.sections {
            if !section.header.is_empty() {
                buf.push_str(&format!("\n  {}", section.header));
            }
            for line in &section.messages {
                buf.push_str(&format!(
                    "\n  {} {}",
                    Self::file_pos_to_string(gs, line.loc),
                    line.formatted
                ));
            }
        }
        buf
    }
}

struct QueueState {
    errors: VecDeque<PendingError>,
    responses: VecDeque<QueryResponse>,
}

/// Bounded multi-producer / single-consumer channel for diagnostics and
/// query responses. Producers block when their deque is full; the consumer
/// always drains between batches, so blocking is transient.
pub struct ErrorQueue {
    state: Mutex<QueueState>,
    space: Condvar,
    capacity: usize,
}

impl ErrorQueue {
    /// Large enough that a single batch fills it only in pathological
    /// workspaces; the consumer drains between batches.
    pub const DEFAULT_CAPACITY: usize = 65536;

    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                errors: VecDeque::new(),
                responses: VecDeque::new(),
            }),
            space: Condvar::new(),
            capacity,
        }
    }

    pub fn push_error(&self, error: PendingError) {
        let mut state = self.state.lock();
        while state.errors.len() >= self.capacity {
            self.space.wait(&mut state);
        }
        state.errors.push_back(error);
    }

    pub fn push_query_response(&self, response: QueryResponse) {
        let mut state = self.state.lock();
        while state.responses.len() >= self.capacity {
            self.space.wait(&mut state);
        }
        state.responses.push_back(response);
    }

    pub fn drain_errors(&self) -> Vec<PendingError> {
        let mut state = self.state.lock();
        let drained = state.errors.drain(..).collect();
        self.space.notify_all();
        drained
    }

    pub fn drain_query_responses(&self) -> Vec<QueryResponse> {
        let mut state = self.state.lock();
        let drained = state.responses.drain(..).collect();
        self.space.notify_all();
        drained
    }

    /// Drain and render everything to stderr. Batch-mode counterpart of the
    /// LSP publisher. Returns how many errors were reported.
    pub fn flush_errors(&self, gs: &GlobalState) -> usize {
        let drained = self.drain_errors();
        for error in &drained {
            eprintln!("{}", error.to_string(gs));
        }
        drained.len()
    }
}

impl Default for ErrorQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Scoped error-collection window. On scope exit the owning state's queue is
/// either discarded (`silence_errors` set) or flushed to the console, so
/// worker-side errors from isolated states never leak into user-visible
/// diagnostics.
pub struct ErrorRegion<'gs> {
    gs: &'gs GlobalState,
}

impl<'gs> ErrorRegion<'gs> {
    pub fn new(gs: &'gs GlobalState) -> Self {
        Self { gs }
    }
}

impl Drop for ErrorRegion<'_> {
    fn drop(&mut self) {
        if self.gs.silence_errors {
            let dropped = self.gs.error_queue.drain_errors().len();
            self.gs.error_queue.drain_query_responses();
            if dropped > 0 {
                tracing::trace!(dropped, "silenced errors at region exit");
            }
        } else {
            self.gs.error_queue.flush_errors(self.gs);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_drain() {
        let q = ErrorQueue::default();
        q.push_error(PendingError::new(
            Loc::none(),
            classes::parser::PARSE_ERROR,
            "bad",
        ));
        q.push_error(PendingError::new(
            Loc::none(),
            classes::infer::UNKNOWN_METHOD,
            "worse",
        ));
        let drained = q.drain_errors();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].formatted, "bad");
        assert!(q.drain_errors().is_empty());
    }

    #[test]
    fn test_errors_and_responses_are_separate() {
        let q = ErrorQueue::default();
        q.push_error(PendingError::new(
            Loc::none(),
            classes::parser::PARSE_ERROR,
            "bad",
        ));
        assert!(q.drain_query_responses().is_empty());
        assert_eq!(q.drain_errors().len(), 1);
    }

    #[test]
    fn test_multi_producer() {
        use std::sync::Arc;
        let q = Arc::new(ErrorQueue::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let q = Arc::clone(&q);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        q.push_error(PendingError::new(
                            Loc::none(),
                            classes::parser::PARSE_ERROR,
                            format!("from {}", i),
                        ));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(q.drain_errors().len(), 400);
    }

    #[test]
    fn test_bounded_blocks_until_drained() {
        use std::sync::Arc;
        use std::time::Duration;
        let q = Arc::new(ErrorQueue::new(2));
        q.push_error(PendingError::new(Loc::none(), classes::parser::PARSE_ERROR, "a"));
        q.push_error(PendingError::new(Loc::none(), classes::parser::PARSE_ERROR, "b"));

        let producer = {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                q.push_error(PendingError::new(Loc::none(), classes::parser::PARSE_ERROR, "c"));
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        assert!(!producer.is_finished());
        assert_eq!(q.drain_errors().len(), 2);
        producer.join().unwrap();
        assert_eq!(q.drain_errors().len(), 1);
    }
}
