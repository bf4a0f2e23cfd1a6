//! The process-wide map from `(TraceId, uniquifier)` to the owning trace
//! actor's address.
//!
//! Lookups are lock-free reads against a sharded map; inserts happen at
//! actor start, removals at actor termination. A lookup of a missing key
//! (actor never existed, or raced against its own termination) returns
//! `None` — every call site treats that as a silent drop, never an error.
use crate::actor::TraceActor;
use crate::ids::RegistryKey;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use xtra::Address;

static REGISTRY: Lazy<DashMap<RegistryKey, Address<TraceActor>>> = Lazy::new(DashMap::new);

/// Registers a freshly spawned actor's address under `key`.
///
/// Overwrites any existing entry, which is exactly what the supervisor
/// wants on restart: the new actor's address replaces the crashed one's.
pub(crate) fn insert(key: RegistryKey, address: Address<TraceActor>) {
    REGISTRY.insert(key, address);
}

/// Removes the entry for `key`, if present. Called by a trace actor on its
/// own terminal sweep.
pub(crate) fn remove(key: &RegistryKey) {
    REGISTRY.remove(key);
}

/// Looks up the actor address for `key`. Returns `None` if no actor is
/// registered under that key, whether because one never existed or because
/// it has already deregistered.
pub(crate) fn lookup(key: &RegistryKey) -> Option<Address<TraceActor>> {
    REGISTRY.get(key).map(|entry| entry.value().clone())
}

#[cfg(test)]
pub(crate) fn len() -> usize {
    REGISTRY.len()
}
