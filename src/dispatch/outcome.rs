use log::{debug, error, warn};
use std::future::Future;

use crate::capability::{AvailabilityState, Capability};
use crate::errors::{AiError, LocalError};

/// Result of trying an operation on-device
#[derive(Debug)]
pub enum LocalOutcome<T> {
    /// The on-device session produced the result
    Success(T),
    /// The probe did not report `available`; nothing was attempted
    Unavailable(AvailabilityState),
    /// Session creation or the operation itself failed
    Failed(LocalError),
}

impl<T> LocalOutcome<T> {
    /// Run `attempt` if `state` is `available`
    pub async fn attempt<F, Fut>(state: AvailabilityState, attempt: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LocalError>>,
    {
        if !state.is_ready() {
            return Self::Unavailable(state);
        }
        match attempt().await {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failed(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert the on-device value, keeping the other outcomes
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LocalOutcome<U> {
        match self {
            Self::Success(value) => LocalOutcome::Success(f(value)),
            Self::Unavailable(state) => LocalOutcome::Unavailable(state),
            Self::Failed(e) => LocalOutcome::Failed(e),
        }
    }

    /// The value, if the on-device attempt succeeded
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// Finish an operation: keep an on-device result or call the remote tier
///
/// The remote call runs at most once, and its failure is the operation's failure.
pub async fn settle<T, E, F, Fut>(capability: Capability, outcome: LocalOutcome<T>, remote: F) -> Result<T, AiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<AiError>,
{
    match outcome {
        LocalOutcome::Success(value) => {
            debug!("{} served on-device", capability);
            return Ok(value);
        }
        LocalOutcome::Unavailable(state) => {
            warn!("On-device {} is {}, using the remote proxy", capability, state);
        }
        LocalOutcome::Failed(e) => {
            warn!("On-device {} failed, falling back to the remote proxy: {}", capability, e);
        }
    }

    remote().await.map_err(|e| {
        let e = e.into();
        error!("Remote {} request failed: {}", capability, e);
        e
    })
}
