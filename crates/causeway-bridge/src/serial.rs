//! Serial-control sub-bridge
//!
//! The same translator/invoker pattern specialized to the serial-control
//! protocol: a fixed set of state-change signals, each mapping one native
//! value to a two-argument call on the persistent listener, plus a one-shot
//! command-completion path whose method name is chosen dynamically when the
//! operation is issued.
//!
//! The signal-to-method mapping is fixed at compile time; dispatching a
//! signal allocates nothing beyond the proxy mint.

use crate::dispatch::{error_indicator, invoke, CallOutcome};
use crate::engine::{DispatchStatus, HandleKind, HandleTable, RawHandle};
use crate::error::BridgeError;
use crate::object::CallbackRef;
use crate::runtime::ManagedRuntime;
use crate::value::Value;
use std::sync::Arc;

/// State-change signal delivered by the serial-control engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SerialSignal {
    ModemState(u32),
    LineState(u32),
    FlowControlState(bool),
    Flush(u32),
    Baud(i64),
    DataSize(i64),
    Parity(i64),
    StopBits(i64),
    FlowControl(i64),
    InputFlowControl(i64),
    BreakSignal(i64),
    Dtr(i64),
    Rts(i64),
}

/// The fixed method-name table, in signal order. Tests assert it covers every
/// signal exactly once.
pub const SIGNAL_METHODS: [&str; 13] = [
    "modem_state",
    "line_state",
    "flow_control_state",
    "flush",
    "baud",
    "data_size",
    "parity",
    "stop_bits",
    "flow_control",
    "input_flow_control",
    "break_signal",
    "dtr",
    "rts",
];

impl SerialSignal {
    fn table_index(&self) -> usize {
        match self {
            SerialSignal::ModemState(_) => 0,
            SerialSignal::LineState(_) => 1,
            SerialSignal::FlowControlState(_) => 2,
            SerialSignal::Flush(_) => 3,
            SerialSignal::Baud(_) => 4,
            SerialSignal::DataSize(_) => 5,
            SerialSignal::Parity(_) => 6,
            SerialSignal::StopBits(_) => 7,
            SerialSignal::FlowControl(_) => 8,
            SerialSignal::InputFlowControl(_) => 9,
            SerialSignal::BreakSignal(_) => 10,
            SerialSignal::Dtr(_) => 11,
            SerialSignal::Rts(_) => 12,
        }
    }

    /// Managed method name this signal dispatches to
    pub fn method_name(&self) -> &'static str {
        SIGNAL_METHODS[self.table_index()]
    }

    /// Marshal the carried value. Flow-control state is the one boolean in
    /// the table; everything else crosses as an integer.
    pub fn marshal(&self) -> Value {
        match *self {
            SerialSignal::ModemState(v) | SerialSignal::LineState(v) | SerialSignal::Flush(v) => {
                Value::Int(v as i64)
            }
            SerialSignal::FlowControlState(v) => Value::Bool(v),
            SerialSignal::Baud(v)
            | SerialSignal::DataSize(v)
            | SerialSignal::Parity(v)
            | SerialSignal::StopBits(v)
            | SerialSignal::FlowControl(v)
            | SerialSignal::InputFlowControl(v)
            | SerialSignal::BreakSignal(v)
            | SerialSignal::Dtr(v)
            | SerialSignal::Rts(v) => Value::Int(v),
        }
    }
}

/// Engine entry point for serial state-change signals.
///
/// Wraps the control handle and delivers (wrapped object, value) to the
/// persistent listener. Returns `Unsupported` with one raised
/// contract-violation error when no listener is attached.
pub fn dispatch_serial_signal(
    table: &HandleTable,
    raw: RawHandle,
    signal: SerialSignal,
) -> DispatchStatus {
    let Some(data) = table.get(raw) else {
        tracing::warn!(handle = %raw, "serial signal for handle with no attached record");
        return DispatchStatus::Unsupported;
    };
    let runtime = Arc::clone(data.runtime());
    let _token = runtime.lock();

    let Some(listener) = data.listener() else {
        runtime.raise(BridgeError::ListenerNotSet { site: "serial" });
        runtime.wake_waiters();
        return DispatchStatus::Unsupported;
    };

    let control = match runtime.mint(raw, HandleKind::SerialControl) {
        Ok(wrapped) => wrapped,
        Err(err) => {
            runtime.raise(err);
            runtime.wake_waiters();
            return DispatchStatus::Unsupported;
        }
    };

    let outcome = invoke(
        &runtime,
        &listener,
        signal.method_name(),
        &[Value::Wrapped(control.clone()), signal.marshal()],
    );

    runtime.release(&control);
    match outcome {
        CallOutcome::Missing => DispatchStatus::Unsupported,
        _ => DispatchStatus::handled(),
    }
}

/// One pending serial command bound to a dynamically chosen completion method.
///
/// Created when the operation is issued; consumed exactly once by
/// [`complete_serial_request`]. Dropping an un-fired request (the operation
/// was torn down before completing) releases the callback reference.
pub struct CompletionRequest {
    method: String,
    callback: Option<CallbackRef>,
}

impl CompletionRequest {
    /// Bind a completion method name to a callback reference
    pub fn new(method: impl Into<String>, callback: CallbackRef) -> Self {
        Self {
            method: method.into(),
            callback: Some(callback),
        }
    }

    /// The method this request will invoke on completion
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Tear down an un-fired request, releasing its callback reference
    pub fn cancel(mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::debug!(
                method = self.method.as_str(),
                class = callback.class_name(),
                "serial completion cancelled before firing"
            );
        }
    }
}

impl Drop for CompletionRequest {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::debug!(
                method = self.method.as_str(),
                class = callback.class_name(),
                "serial completion abandoned; releasing callback reference"
            );
        }
    }
}

/// Fire a serial command completion exactly once.
///
/// Arguments delivered: (wrapped control object, error indicator, value).
/// The request is consumed; its callback reference is released immediately
/// after the call.
pub fn complete_serial_request(
    runtime: &Arc<ManagedRuntime>,
    raw: RawHandle,
    mut request: CompletionRequest,
    error: i32,
    value: i64,
) {
    let Some(callback) = request.callback.take() else {
        return;
    };
    let method = std::mem::take(&mut request.method);
    drop(request);

    let _token = runtime.lock();
    let control = match runtime.mint(raw, HandleKind::SerialControl) {
        Ok(wrapped) => wrapped,
        Err(err) => {
            runtime.raise(err);
            runtime.wake_waiters();
            return;
        }
    };

    invoke(
        runtime,
        &callback,
        &method,
        &[
            Value::Wrapped(control.clone()),
            error_indicator(error),
            Value::Int(value),
        ],
    );

    runtime.release(&control);
    drop(callback); // released exactly once, immediately after the call
}
