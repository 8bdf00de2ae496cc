// Error and warning taxonomy. Fatal kinds are `Result<_, RamError>`; the
// two run-time "warn and continue" kinds are recorded on a `Diagnostics`
// sink instead, since they must not abort evaluation.

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum RamError {
    #[error("translation error at {location}: {message}")]
    Translation { location: String, message: String },

    #[error("index analysis invariant violated: {0}")]
    IndexAnalysis(String),

    #[error("evaluator failure: {0}")]
    EvaluatorFailure(String),

    #[error("assertion failure: unreachable node kind `{0}`")]
    Assertion(String),

    #[error("i/o failure during {operation} of relation `{relation}`: {source}")]
    Io {
        operation: &'static str,
        relation: String,
        #[source]
        source: std::io::Error,
    },
}

pub type RamResult<T> = Result<T, RamError>;

/// A non-fatal run-time condition: bad regex, bad substring index, bad
/// numeric conversion. The evaluator records these and
/// continues, substituting the sentinel value the offending expression
/// would have produced.
#[derive(Debug, Clone)]
pub struct RamWarning {
    pub message: String,
}

impl fmt::Display for RamWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Accumulates warnings for one evaluation run without aborting it.
/// `tracing::warn!` fires immediately on `push`; the vector remains so a
/// host embedding the evaluator can also inspect them after the fact.
///
/// Also carries the one fatal condition an expression walk can hit without
/// a `Result` to return through (a missing user-functor symbol): `fail`
/// latches the first such message and flips an
/// `AtomicBool` the evaluator's tree walk checks cheaply between
/// iterations to short-circuit the rest of the run, in place of threading
/// a `Result` through every recursive `walk`/`eval_statement` call.
#[derive(Default)]
pub struct Diagnostics {
    warnings: parking_lot::Mutex<Vec<RamWarning>>,
    fatal: std::sync::atomic::AtomicBool,
    fatal_message: parking_lot::Mutex<Option<String>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, message: impl Into<String>) {
        let warning = RamWarning { message: message.into() };
        tracing::warn!(message = %warning, "evaluator warning");
        self.warnings.lock().push(warning);
    }

    pub fn warnings(&self) -> Vec<RamWarning> {
        self.warnings.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().is_empty()
    }

    /// Latches `message` as the run's fatal failure, if none is latched
    /// yet, and marks the run for short-circuiting. Does not panic or
    /// unwind -- callers that can observe `has_fatal` (the statement/
    /// operation tree walker) are responsible for stopping early.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(message = %message, "evaluator failure");
        let mut slot = self.fatal_message.lock();
        if slot.is_none() {
            *slot = Some(message);
        }
        self.fatal.store(true, std::sync::atomic::Ordering::Release);
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal.load(std::sync::atomic::Ordering::Acquire)
    }

    /// Returns the latched fatal failure, if any, as a `RamError` a
    /// top-level driver can surface.
    pub fn fatal(&self) -> Option<RamError> {
        self.fatal_message.lock().clone().map(RamError::EvaluatorFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_accumulate_without_failing() {
        let diagnostics = Diagnostics::new();
        diagnostics.warn("bad regex `(`");
        diagnostics.warn("division by zero");
        assert_eq!(diagnostics.warnings().len(), 2);
    }
}
