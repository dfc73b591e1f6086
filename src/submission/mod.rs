mod simulator;

use std::future::Future;
use std::pin::Pin;

pub use simulator::{
    FAILURE_MESSAGE, SUCCESS_MESSAGE, SimulatedBackend, SimulatorConfig, SimulatorError,
};

/// Terminal result of one submission attempt, shown as a single banner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmissionOutcome {
    Success(String),
    Failure(String),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            SubmissionOutcome::Success(message) | SubmissionOutcome::Failure(message) => message,
        }
    }
}

pub type BoxedSubmissionFuture<'a> = Pin<Box<dyn Future<Output = SubmissionOutcome> + Send + 'a>>;

/// The backend call a form hands validated input to.
///
/// Closures returning a future implement this, so tests can swap in a
/// deterministic backend.
pub trait SubmissionBackend<T>: Send + Sync {
    fn submit(&self, input: T) -> BoxedSubmissionFuture<'_>;
}

impl<T, F, Fut> SubmissionBackend<T> for F
where
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = SubmissionOutcome> + Send + 'static,
{
    fn submit(&self, input: T) -> BoxedSubmissionFuture<'_> {
        Box::pin((self)(input))
    }
}
