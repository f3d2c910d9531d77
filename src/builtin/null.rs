use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::capability::{AvailabilityState, Capability};
use crate::errors::LocalError;

use super::{DeviceSession, DownloadMonitor, SessionProvider};

/// Provider for a capability the device does not have
///
/// Always reports `unavailable` and refuses to create sessions, which sends
/// every call for this capability to the remote proxy.
pub struct NullProvider<O, S: ?Sized> {
    capability: Capability,
    _marker: PhantomData<fn() -> (O, Arc<S>)>,
}

impl<O, S: ?Sized> NullProvider<O, S> {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            _marker: PhantomData,
        }
    }
}

impl<O, S: ?Sized> fmt::Debug for NullProvider<O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullProvider")
            .field("capability", &self.capability)
            .finish()
    }
}

#[async_trait]
impl<O, S> SessionProvider for NullProvider<O, S>
where
    O: Send + Sync,
    S: ?Sized + DeviceSession,
{
    type Options = O;
    type Session = S;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &O) -> Result<AvailabilityState, LocalError> {
        Ok(AvailabilityState::Unavailable)
    }

    async fn create(
        &self,
        _options: &O,
        _monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<S>, LocalError> {
        debug!("No on-device {} provider registered", self.capability);
        Err(LocalError::Unavailable {
            capability: self.capability,
            state: AvailabilityState::Unavailable,
        })
    }
}
