//! Native engine boundary
//!
//! The types the event-I/O engine and the bridge exchange: opaque handles,
//! event payloads, dispatch status codes, and the per-handle user-data record
//! with its accessor table. The engine owns handle lifetimes and guarantees
//! serialized event delivery per handle; the bridge guarantees nothing across
//! handles.

use crate::error::BridgeError;
use crate::object::CallbackRef;
use crate::runtime::ManagedRuntime;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Opaque native handle identifier.
///
/// Owned and destroyed by the engine; proxies minted for it never extend its
/// life.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RawHandle(pub u64);

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a native handle addresses
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HandleKind {
    Stream,
    Acceptor,
    SerialControl,
}

impl HandleKind {
    pub fn name(&self) -> &'static str {
        match self {
            HandleKind::Stream => "stream",
            HandleKind::Acceptor => "acceptor",
            HandleKind::SerialControl => "serial-control",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event delivered by the engine to a stream handle
#[derive(Clone, Debug)]
pub enum EventKind {
    /// Bytes are available (or a read error occurred)
    Read {
        /// Native error code; 0 for no error
        error: i32,
        /// Copy of the available bytes
        data: Vec<u8>,
        /// Channel identifier within the stream
        channel: u64,
    },
    /// The stream will accept more written data
    WriteReady,
    /// Urgent (out-of-band) data arrived
    Urgent,
}

/// Status handed back to the engine's event source
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchStatus {
    /// Event delivered. For data-ready events `consumed` carries the byte
    /// count reported by the listener; other events report 0.
    Handled { consumed: usize },
    /// No listener was attached; the engine treats the event as unsupported.
    Unsupported,
}

impl DispatchStatus {
    pub fn handled() -> Self {
        DispatchStatus::Handled { consumed: 0 }
    }
}

/// Per-handle user-data record.
///
/// Carries the nullable listener reference and the shared runtime reference,
/// plus the native record refcount. The record refcount tracks how many
/// native-side references exist to this record and decides when the table
/// frees it; the Arc counts inside [`CallbackRef`] track managed lifetimes.
/// The two counters are deliberately separate.
pub struct HandleData {
    refcount: AtomicUsize,
    listener: Mutex<Option<CallbackRef>>,
    runtime: Arc<ManagedRuntime>,
    serial_capable: bool,
}

impl HandleData {
    /// Fresh record with no listener, record refcount 1
    pub fn new(runtime: Arc<ManagedRuntime>) -> Arc<Self> {
        Self::with_serial(runtime, false)
    }

    /// Fresh record for a handle that also speaks the serial-control protocol
    pub fn with_serial(runtime: Arc<ManagedRuntime>, serial_capable: bool) -> Arc<Self> {
        Arc::new(Self {
            refcount: AtomicUsize::new(1),
            listener: Mutex::new(None),
            runtime,
            serial_capable,
        })
    }

    pub fn runtime(&self) -> &Arc<ManagedRuntime> {
        &self.runtime
    }

    pub fn serial_capable(&self) -> bool {
        self.serial_capable
    }

    /// Store (or clear) the persistent listener.
    ///
    /// The stored reference is the acquire; the replaced one is released on
    /// drop. Must be called with the runtime guard held.
    pub fn set_listener(&self, callback: Option<CallbackRef>) {
        debug_assert!(self.runtime.guard().held_by_current_thread());
        *self.listener.lock().unwrap() = callback;
    }

    /// Acquire the listener for the duration of one call
    pub fn listener(&self) -> Option<CallbackRef> {
        self.listener.lock().unwrap().clone()
    }

    /// Bump the native record refcount
    pub fn acquire_record(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release_record(&self) -> usize {
        let previous = self.refcount.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0);
        previous - 1
    }
}

/// Accessor table mapping native handles to their user-data records.
///
/// Stands in for the engine's get/set user-data hooks: the engine attaches a
/// record when it creates or accepts a handle and detaches it when the handle
/// is destroyed.
pub struct HandleTable {
    entries: Mutex<HashMap<RawHandle, Arc<HandleData>>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Attach a record to a newly created or accepted handle
    pub fn attach(&self, raw: RawHandle, data: Arc<HandleData>) -> Result<(), BridgeError> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .try_reserve(1)
            .map_err(|_| BridgeError::OutOfMemory)?;
        let replaced = entries.insert(raw, data);
        debug_assert!(replaced.is_none(), "record already attached to {raw}");
        Ok(())
    }

    /// Fetch the record for a handle
    pub fn get(&self, raw: RawHandle) -> Option<Arc<HandleData>> {
        self.entries.lock().unwrap().get(&raw).cloned()
    }

    /// Drop one native reference; the record is freed (and its listener
    /// released) when the count reaches zero. Returns the freed record.
    pub fn detach(&self, raw: RawHandle) -> Option<Arc<HandleData>> {
        let mut entries = self.entries.lock().unwrap();
        let data = entries.get(&raw)?.clone();
        if data.release_record() == 0 {
            entries.remove(&raw)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
