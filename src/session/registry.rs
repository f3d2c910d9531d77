/*!
 * Cache of live sessions for one capability.
 */

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;

use crate::builtin::DeviceSession;
use crate::capability::Capability;
use crate::errors::LocalError;

use super::SessionKey;

/// One cache entry, filled once
///
/// A slot leaves the map only through `remove` or `clear`, which retire it
/// first. Whoever observes a retired slot holding a session destroys it, once.
struct Slot<S: ?Sized> {
    cell: OnceCell<Arc<S>>,
    retired: AtomicBool,
    destroyed: AtomicBool,
}

impl<S: ?Sized + DeviceSession> Slot<S> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            retired: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Destroy the stored session unless that already happened
    fn destroy(&self) -> bool {
        match self.cell.get() {
            Some(session) if !self.destroyed.swap(true, Ordering::SeqCst) => {
                session.destroy();
                true
            }
            _ => false,
        }
    }
}

/// Sessions of one capability, at most one per key
///
/// Each key maps to a slot that is filled once. Concurrent `get_or_create`
/// calls for the same key await the same slot, so only one factory runs and
/// every caller receives the same session. A failed factory leaves the slot
/// empty and the slot is evicted. The map lock is never held across an await.
///
/// Removing a key while its session is still being created retires the
/// pending slot: the session is destroyed as soon as it exists and the waiting
/// callers receive the session that replaced it, or a creation error.
pub struct SessionRegistry<S: ?Sized + DeviceSession> {
    capability: Capability,
    slots: Mutex<HashMap<SessionKey, Arc<Slot<S>>>>,
}

impl<S: ?Sized + DeviceSession> SessionRegistry<S> {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Return the session stored under `key`, creating it with `factory` if needed
    pub async fn get_or_create<F, Fut>(&self, key: &SessionKey, factory: F) -> Result<Arc<S>, LocalError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<S>, LocalError>>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.clone()).or_insert_with(|| Arc::new(Slot::new())))
        };

        if let Some(session) = slot.cell.get() {
            debug!("Reusing {} session '{}'", self.capability, key);
            return Ok(Arc::clone(session));
        }

        let result = slot
            .cell
            .get_or_try_init(move || async move {
                debug!("Creating {} session '{}'", self.capability, key);
                factory().await
            })
            .await
            .map(Arc::clone);

        match result {
            Ok(session) if slot.is_retired() => {
                if slot.destroy() {
                    debug!("{} session '{}' was removed while being created, destroyed it", self.capability, key);
                }
                drop(session);
                self.adopt(key)
            }
            Ok(session) => Ok(session),
            Err(e) => {
                debug!("{} session '{}' was not created: {}", self.capability, key, e);
                let mut slots = self.slots.lock();
                let evict = slots
                    .get(key)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && current.cell.get().is_none());
                if evict {
                    slots.remove(key);
                }
                Err(e)
            }
        }
    }

    /// Session that replaced a retired slot, if it is ready
    fn adopt(&self, key: &SessionKey) -> Result<Arc<S>, LocalError> {
        self.get(key).ok_or_else(|| {
            LocalError::session_creation(self.capability, format!("session '{}' was removed while being created", key))
        })
    }

/// The live session stored under `key`, if any
    pub fn get(&self, key: &SessionKey) -> Option<Arc<S>> {
        self.slots.lock().get(key).and_then(|slot| slot.cell.get().cloned())
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.get(key).is_some()
    }

    /// Destroy and evict the session stored under `key`
    ///
    /// Returns whether a session was removed. Removing an unknown key is a no-op.
    pub fn remove(&self, key: &SessionKey) -> bool {
        let Some(slot) = self.slots.lock().remove(key) else {
            return false;
        };
        slot.retire();
        let destroyed = slot.destroy();
        if destroyed {
            debug!("Destroying {} session '{}'", self.capability, key);
        }
        destroyed
    }

    /// Destroy and evict every session; returns how many were destroyed
    pub fn clear(&self) -> usize {
        let drained: Vec<(SessionKey, Arc<Slot<S>>)> = self.slots.lock().drain().collect();
        let mut destroyed = 0;
        for (key, slot) in drained {
            slot.retire();
            if slot.destroy() {
                debug!("Destroying {} session '{}'", self.capability, key);
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of live sessions, sorted
    pub fn keys(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.cell.initialized())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl<S: ?Sized + DeviceSession> Drop for SessionRegistry<S> {
    fn drop(&mut self) {
        let destroyed = self.clear();
        if destroyed > 0 {
            debug!("Destroyed {} {} session(s) on teardown", destroyed, self.capability);
        }
    }
}

impl<S: ?Sized + DeviceSession> std::fmt::Debug for SessionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("capability", &self.capability)
            .field("sessions", &self.keys())
            .finish()
    }
}
