//! Bridge error taxonomy
//!
//! Every failure the bridge can signal into the managed runtime's pending-error
//! slot. Two errno-backed families exist, one per native subsystem: stream/
//! acceptor calls report under the `engine:` prefix, serial-control calls under
//! `serial:`. None of these are retried and none auto-clear; the calling path
//! observes them through [`ManagedRuntime::error_occurred`] and
//! [`ManagedRuntime::take_error`].
//!
//! [`ManagedRuntime::error_occurred`]: crate::runtime::ManagedRuntime::error_occurred
//! [`ManagedRuntime::take_error`]: crate::runtime::ManagedRuntime::take_error

use thiserror::Error;

/// Errors raised by the bridge or by managed code during a callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Native stream/acceptor call failed with an OS error code
    #[error("engine:{site}: {message}")]
    Engine {
        site: &'static str,
        code: i32,
        message: String,
    },

    /// Native serial-control call failed with an OS error code
    #[error("serial:{site}: {message}")]
    Serial {
        site: &'static str,
        code: i32,
        message: String,
    },

    /// An event needed a listener but none was attached to the handle
    #[error("{site} callback: listener was not set")]
    ListenerNotSet { site: &'static str },

    /// The listener object has no method with the dispatched name
    #[error("callback: class '{class}' has no method '{method}'")]
    MissingMethod { class: String, method: String },

    /// The listener's return value could not be read as a byte count
    #[error("callback: class '{class}' method '{method}' did not return an integer")]
    NotAnInteger { class: String, method: String },

    /// A read listener claimed it consumed more bytes than were delivered
    #[error(
        "callback: class '{class}' method '{method}' consumed {claimed} of {delivered} bytes"
    )]
    Overrun {
        class: String,
        method: String,
        claimed: i64,
        delivered: usize,
    },

    /// Checked cast between incompatible wrapped-object kinds
    #[error("cannot cast {from} to {to}")]
    Cast {
        from: &'static str,
        to: &'static str,
    },

    /// Allocation failure while minting a proxy or attaching a record
    #[error("out of memory")]
    OutOfMemory,

    /// Error raised by managed code inside a callback body
    #[error("callback raised: {message}")]
    Raised { message: String },
}

impl BridgeError {
    /// Engine-family error from a native OS error code
    pub fn engine(site: &'static str, code: i32) -> Self {
        BridgeError::Engine {
            site,
            code,
            message: os_error_string(code),
        }
    }

    /// Serial-family error from a native OS error code
    pub fn serial(site: &'static str, code: i32) -> Self {
        BridgeError::Serial {
            site,
            code,
            message: os_error_string(code),
        }
    }

    /// Error raised by managed code
    pub fn raised(message: impl Into<String>) -> Self {
        BridgeError::Raised {
            message: message.into(),
        }
    }
}

/// System description for a native error code
pub fn os_error_string(code: i32) -> String {
    std::io::Error::from_raw_os_error(code).to_string()
}
