//! Event translation and callback dispatch
//!
//! Maps engine events to managed method invocations:
//! - persistent-listener events (`read_ready`, `write_ready`, `urgent`,
//!   `new_connection`) route through the handle's user-data record;
//! - one-shot completions (`open_done`, `close_done`, `shutdown_done`) route
//!   through the callback reference stored for that specific operation and
//!   consume it, so a second delivery cannot occur.
//!
//! Every entry acquires the runtime guard before touching managed state and
//! releases it on all exit paths. The invoker distinguishes missing methods,
//! raised errors, and normal returns; the result interpreter converts the
//! bytes-consumed count and applies the configured overrun policy.

use crate::engine::{DispatchStatus, EventKind, HandleData, HandleKind, HandleTable, RawHandle};
use crate::error::{os_error_string, BridgeError};
use crate::object::CallbackRef;
use crate::runtime::ManagedRuntime;
use crate::value::Value;
use causeway_config::OverrunPolicy;
use std::sync::Arc;

/// Method names the bridge invokes by fixed convention
pub mod method {
    pub const READ_READY: &str = "read_ready";
    pub const WRITE_READY: &str = "write_ready";
    pub const URGENT: &str = "urgent";
    pub const OPEN_DONE: &str = "open_done";
    pub const CLOSE_DONE: &str = "close_done";
    pub const SHUTDOWN_DONE: &str = "shutdown_done";
    pub const NEW_CONNECTION: &str = "new_connection";
}

/// Error-indicator argument: a descriptive string for a native error code, or
/// the explicit no-error marker.
pub fn error_indicator(code: i32) -> Value {
    if code == 0 {
        Value::Null
    } else {
        Value::str(os_error_string(code))
    }
}

// ===== Call invoker =====

/// How a listener call ended
#[derive(Clone, Debug, PartialEq)]
pub enum CallOutcome {
    /// The listener has no method with the dispatched name; the
    /// contract-violation error is pending and the caller reports the
    /// operation unsupported.
    Missing,
    /// Managed code raised; the error is pending and waiters are woken so a
    /// blocked native caller observes it after the bridge returns.
    Raised,
    /// Normal return, handed to the event-specific handler
    Returned(Value),
}

/// Invoke a listener method and classify the outcome.
///
/// Missing methods and raised errors park the error in the pending slot and
/// wake waiters. The guard must be held.
pub fn invoke_rv(
    runtime: &ManagedRuntime,
    callback: &CallbackRef,
    method: &str,
    args: &[Value],
) -> CallOutcome {
    debug_assert!(runtime.guard().held_by_current_thread());

    let Some(body) = callback.lookup(method) else {
        runtime.raise(BridgeError::MissingMethod {
            class: callback.class_name().to_string(),
            method: method.to_string(),
        });
        runtime.wake_waiters();
        return CallOutcome::Missing;
    };

    match body(args) {
        Ok(value) => {
            // Managed code may park an error itself and still return normally.
            if runtime.error_occurred() {
                runtime.wake_waiters();
            }
            CallOutcome::Returned(value)
        }
        Err(error) => {
            tracing::debug!(
                class = callback.class_name(),
                method,
                error = %error,
                "listener raised during callback"
            );
            runtime.raise(error);
            runtime.wake_waiters();
            CallOutcome::Raised
        }
    }
}

/// Invoke a listener method, discarding any return value
pub fn invoke(
    runtime: &ManagedRuntime,
    callback: &CallbackRef,
    method: &str,
    args: &[Value],
) -> CallOutcome {
    match invoke_rv(runtime, callback, method, args) {
        CallOutcome::Returned(_) => CallOutcome::Returned(Value::Null),
        other => other,
    }
}

// ===== Persistent-listener events =====

/// Engine entry point for stream events.
///
/// Returns `Unsupported` when the handle has no record or no listener; the
/// listener-not-set case raises exactly one contract-violation error and wakes
/// waiters.
pub fn dispatch_stream_event(
    table: &HandleTable,
    raw: RawHandle,
    event: EventKind,
) -> DispatchStatus {
    let Some(data) = table.get(raw) else {
        tracing::warn!(handle = %raw, "event for handle with no attached record");
        return DispatchStatus::Unsupported;
    };
    let runtime = Arc::clone(data.runtime());
    let _token = runtime.lock();

    let Some(listener) = data.listener() else {
        runtime.raise(BridgeError::ListenerNotSet { site: "stream" });
        runtime.wake_waiters();
        return DispatchStatus::Unsupported;
    };

    match event {
        EventKind::Read {
            error,
            data: bytes,
            channel,
        } => {
            let delivered = bytes.len();
            let io = match runtime.mint(raw, HandleKind::Stream) {
                Ok(io) => io,
                Err(err) => {
                    runtime.raise(err);
                    runtime.wake_waiters();
                    return DispatchStatus::Unsupported;
                }
            };
            let args = [
                Value::Wrapped(io.clone()),
                error_indicator(error),
                Value::bytes(bytes),
                Value::Int(channel as i64),
            ];
            let status = match invoke_rv(&runtime, &listener, method::READ_READY, &args) {
                CallOutcome::Returned(value) => DispatchStatus::Handled {
                    consumed: interpret_consumed(&runtime, &listener, value, delivered),
                },
                CallOutcome::Raised => DispatchStatus::Handled { consumed: 0 },
                CallOutcome::Missing => DispatchStatus::Unsupported,
            };
            runtime.release(&io);
            status
        }
        EventKind::WriteReady => notify_single(&runtime, &listener, raw, method::WRITE_READY),
        EventKind::Urgent => notify_single(&runtime, &listener, raw, method::URGENT),
    }
}

/// Wrap the handle and deliver a single-argument notification, return value
/// ignored
fn notify_single(
    runtime: &ManagedRuntime,
    listener: &CallbackRef,
    raw: RawHandle,
    name: &str,
) -> DispatchStatus {
    let io = match runtime.mint(raw, HandleKind::Stream) {
        Ok(io) => io,
        Err(err) => {
            runtime.raise(err);
            runtime.wake_waiters();
            return DispatchStatus::Unsupported;
        }
    };
    let outcome = invoke(runtime, listener, name, &[Value::Wrapped(io.clone())]);
    runtime.release(&io);
    match outcome {
        CallOutcome::Missing => DispatchStatus::Unsupported,
        _ => DispatchStatus::handled(),
    }
}

/// Interpret a read listener's return as a bytes-consumed count.
///
/// Non-integer (or negative) returns raise a typed error and report zero.
/// Claims above the delivered length raise the overrun error and report per
/// the configured policy; the claim is never forwarded as-is.
fn interpret_consumed(
    runtime: &ManagedRuntime,
    listener: &CallbackRef,
    value: Value,
    delivered: usize,
) -> usize {
    let claimed = match value.as_int() {
        Some(n) if n >= 0 => n,
        _ => {
            runtime.raise(BridgeError::NotAnInteger {
                class: listener.class_name().to_string(),
                method: method::READ_READY.to_string(),
            });
            runtime.wake_waiters();
            return 0;
        }
    };

    if claimed as u64 <= delivered as u64 {
        return claimed as usize;
    }

    runtime.raise(BridgeError::Overrun {
        class: listener.class_name().to_string(),
        method: method::READ_READY.to_string(),
        claimed,
        delivered,
    });
    runtime.wake_waiters();
    match runtime.settings().overrun {
        OverrunPolicy::Clamp => delivered,
        OverrunPolicy::Zero => 0,
    }
}

// ===== One-shot completions =====

/// Completion of a pending open. Consumes the operation's callback reference;
/// it is released immediately after the call.
pub fn open_done(runtime: &Arc<ManagedRuntime>, raw: RawHandle, error: i32, callback: CallbackRef) {
    one_shot(
        runtime,
        raw,
        HandleKind::Stream,
        callback,
        method::OPEN_DONE,
        Some(error),
    );
}

/// Completion of a pending close. Single-use, like [`open_done`], but carries
/// no error indicator.
pub fn close_done(runtime: &Arc<ManagedRuntime>, raw: RawHandle, callback: CallbackRef) {
    one_shot(
        runtime,
        raw,
        HandleKind::Stream,
        callback,
        method::CLOSE_DONE,
        None,
    );
}

/// Completion of a pending acceptor shutdown
pub fn acceptor_shutdown_done(runtime: &Arc<ManagedRuntime>, raw: RawHandle, callback: CallbackRef) {
    one_shot(
        runtime,
        raw,
        HandleKind::Acceptor,
        callback,
        method::SHUTDOWN_DONE,
        None,
    );
}

fn one_shot(
    runtime: &Arc<ManagedRuntime>,
    raw: RawHandle,
    kind: HandleKind,
    callback: CallbackRef,
    name: &str,
    error: Option<i32>,
) {
    let _token = runtime.lock();
    let wrapped = match runtime.mint(raw, kind) {
        Ok(wrapped) => wrapped,
        Err(err) => {
            runtime.raise(err);
            runtime.wake_waiters();
            return; // callback dropped here: released without firing
        }
    };
    match error {
        Some(code) => invoke(
            runtime,
            &callback,
            name,
            &[Value::Wrapped(wrapped.clone()), error_indicator(code)],
        ),
        None => invoke(runtime, &callback, name, &[Value::Wrapped(wrapped.clone())]),
    };
    runtime.release(&wrapped);
    drop(callback); // released exactly once, immediately after the call
}

// ===== Acceptor: new connection =====

/// Engine entry point for an accepted connection.
///
/// Allocates and attaches a fresh user-data record for the new handle,
/// sharing the acceptor's runtime reference, then delivers both wrapped
/// handles to the acceptor's persistent listener. Not single-use: fires once
/// per accepted connection.
pub fn accept_new_connection(
    table: &HandleTable,
    acceptor: RawHandle,
    new_raw: RawHandle,
    serial_capable: bool,
) -> DispatchStatus {
    let Some(acceptor_data) = table.get(acceptor) else {
        tracing::warn!(handle = %acceptor, "new connection on acceptor with no record");
        return DispatchStatus::Unsupported;
    };
    let runtime = Arc::clone(acceptor_data.runtime());

    // Attach the record before entering managed code, mirroring handle
    // creation order on the native side.
    let new_data = HandleData::with_serial(Arc::clone(&runtime), serial_capable);
    let attached = table.attach(new_raw, new_data);

    let _token = runtime.lock();
    if let Err(err) = attached {
        runtime.raise(err);
        runtime.wake_waiters();
        return DispatchStatus::Unsupported;
    }

    let Some(listener) = acceptor_data.listener() else {
        runtime.raise(BridgeError::ListenerNotSet { site: "acceptor" });
        runtime.wake_waiters();
        return DispatchStatus::Unsupported;
    };

    let acc_ref = match runtime.mint(acceptor, HandleKind::Acceptor) {
        Ok(wrapped) => wrapped,
        Err(err) => {
            runtime.raise(err);
            runtime.wake_waiters();
            return DispatchStatus::Unsupported;
        }
    };
    let io_ref = match runtime.mint(new_raw, HandleKind::Stream) {
        Ok(wrapped) => wrapped,
        Err(err) => {
            runtime.release(&acc_ref);
            runtime.raise(err);
            runtime.wake_waiters();
            return DispatchStatus::Unsupported;
        }
    };

    let outcome = invoke(
        &runtime,
        &listener,
        method::NEW_CONNECTION,
        &[Value::Wrapped(acc_ref.clone()), Value::Wrapped(io_ref.clone())],
    );

    runtime.release(&acc_ref);
    runtime.release(&io_ref);
    match outcome {
        CallOutcome::Missing => DispatchStatus::Unsupported,
        _ => DispatchStatus::handled(),
    }
}
