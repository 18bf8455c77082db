//! Embedding hooks.
//!
//! The host supplies these at engine construction. Everything has a usable
//! default so tests and the CLI can run with a plain sink.
use anima_syntax::Symbol;

use crate::errors::RuntimeError;
use crate::instance::InstanceId;

/// What to do after a runtime error reaches the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorDecision {
    /// Terminate the offending frame chain and keep going (default).
    Continue,
    /// Continue, but flag a connected debugger.
    Break,
    /// Abort: the engine stops evaluating and returns the error to the host.
    Abort,
}

pub trait AppHooks {
    /// Script print output.
    fn print(&mut self, text: &str);

    /// A runtime error surfaced. The return value picks the propagation
    /// policy; the engine itself never implements catch/recover.
    fn on_error(&mut self, _err: &RuntimeError) -> ErrorDecision {
        ErrorDecision::Continue
    }

    /// Unrecoverable condition; the engine is about to give up.
    fn on_fatal(&mut self, _msg: &str) {}

    /// Resolve an object-id literal the engine's own actor registry does not
    /// know. Returning `None` leaves the literal unresolved (a runtime
    /// error at the use site).
    fn resolve_actor(&mut self, _name: Symbol) -> Option<InstanceId> {
        None
    }
}

/// Default host: prints to stdout, continues on errors.
#[derive(Default)]
pub struct StdHooks;

impl AppHooks for StdHooks {
    fn print(&mut self, text: &str) {
        print!("{text}");
    }
}

/// Capturing host for tests and embedded tools.
#[derive(Default)]
pub struct BufferHooks {
    pub output: String,
    pub errors: Vec<RuntimeError>,
    pub decision: Option<ErrorDecision>,
}

impl AppHooks for BufferHooks {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn on_error(&mut self, err: &RuntimeError) -> ErrorDecision {
        self.errors.push(err.clone());
        self.decision.unwrap_or(ErrorDecision::Continue)
    }
}
