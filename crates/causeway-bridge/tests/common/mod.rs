//! Shared test helpers: a scripted engine side and recording listeners
#![allow(dead_code)]

use causeway_bridge::error::BridgeError;
use causeway_bridge::value::Value;
use std::sync::{Arc, Mutex};

/// Log of (method name, arguments) deliveries into managed code
pub type CallLog = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Method body that records the delivery and returns null
pub fn record(
    log: &CallLog,
    name: &'static str,
) -> impl Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync + 'static {
    record_returning(log, name, Value::Null)
}

/// Method body that records the delivery and returns a fixed value
pub fn record_returning(
    log: &CallLog,
    name: &'static str,
    value: Value,
) -> impl Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |args| {
        log.lock().unwrap().push((name.to_string(), args.to_vec()));
        Ok(value.clone())
    }
}

/// Method names delivered so far, in order
pub fn delivered(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
}

/// Arguments of the nth delivery
pub fn args_of(log: &CallLog, index: usize) -> Vec<Value> {
    log.lock().unwrap()[index].1.clone()
}
