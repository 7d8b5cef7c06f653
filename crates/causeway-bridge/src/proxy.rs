//! Wrapped-object registry
//!
//! Mints managed proxies for native handles on demand. Every mint yields a
//! distinct proxy; two proxies for the same handle compare unequal as objects
//! but report the same native identity through [`WrappedObject::native_eq`].
//! The registry holds the strong reference for each live proxy until it is
//! released, and is bounded: capacity exhaustion and allocation failure both
//! surface as [`BridgeError::OutOfMemory`], never as a panic.
//!
//! Minting and releasing must happen with the runtime guard held; the
//! [`crate::runtime::ManagedRuntime`] entry points assert this.

use crate::engine::{HandleKind, RawHandle};
use crate::error::BridgeError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

struct ProxyCell {
    raw: RawHandle,
    kind: HandleKind,
    mint_id: u64,
}

/// Managed proxy for a native handle.
///
/// Not an owner: the native engine creates and destroys the handle
/// independently. The proxy is only valid while the engine keeps the handle
/// alive; the engine's per-handle event serialization guarantees no event
/// arrives after destruction.
#[derive(Clone)]
pub struct WrappedObject {
    cell: Arc<ProxyCell>,
}

impl WrappedObject {
    pub fn raw(&self) -> RawHandle {
        self.cell.raw
    }

    pub fn kind(&self) -> HandleKind {
        self.cell.kind
    }

    /// Serial number of this mint, unique per proxy
    pub fn mint_id(&self) -> u64 {
        self.cell.mint_id
    }

    /// True if both proxies address the same native handle
    pub fn native_eq(&self, other: &WrappedObject) -> bool {
        self.cell.raw == other.cell.raw
    }

    /// Checked view of this proxy as another kind.
    ///
    /// Raises the cast error on mismatch; the caller parks it in the pending
    /// slot.
    pub fn cast(&self, to: HandleKind) -> Result<WrappedObject, BridgeError> {
        if self.cell.kind == to {
            Ok(self.clone())
        } else {
            Err(BridgeError::Cast {
                from: self.cell.kind.name(),
                to: to.name(),
            })
        }
    }
}

impl PartialEq for WrappedObject {
    /// Object identity: two mints for the same handle are distinct
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for WrappedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedObject")
            .field("raw", &self.cell.raw)
            .field("kind", &self.cell.kind)
            .field("mint_id", &self.cell.mint_id)
            .finish()
    }
}

struct RegistryState {
    live: HashMap<u64, WrappedObject>,
    next_mint: u64,
    minted: u64,
    capacity: usize,
}

/// Bounded registry of live wrapped objects
pub struct ProxyRegistry {
    state: Mutex<RegistryState>,
}

impl ProxyRegistry {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                live: HashMap::new(),
                next_mint: 0,
                minted: 0,
                capacity,
            }),
        }
    }

    /// Mint a proxy for a native handle, holding its strong reference until
    /// [`ProxyRegistry::release`].
    pub fn mint(&self, raw: RawHandle, kind: HandleKind) -> Result<WrappedObject, BridgeError> {
        let mut state = self.state.lock().unwrap();
        if state.live.len() >= state.capacity {
            return Err(BridgeError::OutOfMemory);
        }
        state
            .live
            .try_reserve(1)
            .map_err(|_| BridgeError::OutOfMemory)?;

        let mint_id = state.next_mint;
        state.next_mint += 1;
        state.minted += 1;

        let object = WrappedObject {
            cell: Arc::new(ProxyCell { raw, kind, mint_id }),
        };
        state.live.insert(mint_id, object.clone());
        Ok(object)
    }

    /// Drop the registry's strong reference to a proxy
    pub fn release(&self, object: &WrappedObject) {
        let mut state = self.state.lock().unwrap();
        state.live.remove(&object.mint_id());
    }

    /// Number of proxies currently held by the registry
    pub fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    /// Total mints over the registry's lifetime
    pub fn minted_count(&self) -> u64 {
        self.state.lock().unwrap().minted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_mints_share_native_identity() {
        let registry = ProxyRegistry::new(16);
        let a = registry.mint(RawHandle(7), HandleKind::Stream).unwrap();
        let b = registry.mint(RawHandle(7), HandleKind::Stream).unwrap();

        assert_ne!(a, b);
        assert!(a.native_eq(&b));
    }

    #[test]
    fn test_release_drops_registry_reference() {
        let registry = ProxyRegistry::new(16);
        let a = registry.mint(RawHandle(1), HandleKind::Stream).unwrap();
        assert_eq!(registry.live_count(), 1);

        registry.release(&a);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.minted_count(), 1);
    }

    #[test]
    fn test_capacity_exhaustion_is_oom() {
        let registry = ProxyRegistry::new(1);
        let _a = registry.mint(RawHandle(1), HandleKind::Stream).unwrap();
        let err = registry.mint(RawHandle(2), HandleKind::Stream).unwrap_err();
        assert_eq!(err, BridgeError::OutOfMemory);
    }

    #[test]
    fn test_cast_same_kind_succeeds() {
        let registry = ProxyRegistry::new(4);
        let a = registry
            .mint(RawHandle(3), HandleKind::SerialControl)
            .unwrap();
        let b = a.cast(HandleKind::SerialControl).unwrap();
        assert!(a.native_eq(&b));
    }

    #[test]
    fn test_cast_mismatch_is_cast_error() {
        let registry = ProxyRegistry::new(4);
        let a = registry.mint(RawHandle(3), HandleKind::Stream).unwrap();
        let err = a.cast(HandleKind::Acceptor).unwrap_err();
        assert!(matches!(err, BridgeError::Cast { .. }));
    }
}
