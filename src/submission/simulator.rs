use std::sync::Mutex;
use std::time::Duration;

use futures_timer::Delay;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{BoxedSubmissionFuture, SubmissionBackend, SubmissionOutcome};

pub const SUCCESS_MESSAGE: &str = "Address saved successfully!";
pub const FAILURE_MESSAGE: &str = "Authentication failed. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatorConfig {
    pub delay: Duration,
    pub success_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            success_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulatorError {
    #[error("success probability must be within 0.0..=1.0, got {0}")]
    InvalidProbability(f64),
}

/// Stand-in for a backend that would store the address.
///
/// Nothing is stored. After `delay` the call resolves with
/// [`SUCCESS_MESSAGE`] or [`FAILURE_MESSAGE`], drawn when the timer fires.
pub struct SimulatedBackend {
    config: SimulatorConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedBackend {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: SimulatorConfig, seed: u64) -> Result<Self, SimulatorError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulatorConfig, rng: StdRng) -> Result<Self, SimulatorError> {
        if !(0.0..=1.0).contains(&config.success_probability) {
            return Err(SimulatorError::InvalidProbability(
                config.success_probability,
            ));
        }
        Ok(Self {
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> SimulatorConfig {
        self.config
    }

    /// Draws one outcome without waiting.
    pub fn draw(&self) -> SubmissionOutcome {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if rng.gen_bool(self.config.success_probability) {
            SubmissionOutcome::Success(SUCCESS_MESSAGE.to_owned())
        } else {
            SubmissionOutcome::Failure(FAILURE_MESSAGE.to_owned())
        }
    }

    pub async fn resolve(&self) -> SubmissionOutcome {
        if !self.config.delay.is_zero() {
            Delay::new(self.config.delay).await;
        }
        let outcome = self.draw();
        debug!(
            delay = ?self.config.delay,
            success = outcome.is_success(),
            "simulated submission resolved"
        );
        outcome
    }
}

impl<T> SubmissionBackend<T> for SimulatedBackend {
    fn submit(&self, _input: T) -> BoxedSubmissionFuture<'_> {
        Box::pin(self.resolve())
    }
}
