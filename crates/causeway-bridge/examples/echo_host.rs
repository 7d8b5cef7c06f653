//! Minimal host example
//!
//! Plays the engine side by hand: attaches a record, stores an echoing
//! listener, and delivers a few events through the bridge.
//!
//! Run with: cargo run --example echo_host -p causeway-bridge

use causeway_bridge::dispatch::{dispatch_stream_event, open_done};
use causeway_bridge::engine::{EventKind, HandleData, HandleTable, RawHandle};
use causeway_bridge::object::{CallbackRef, ScriptObjectBuilder};
use causeway_bridge::runtime::ManagedRuntime;
use causeway_bridge::value::Value;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "causeway_bridge=debug".into()),
        )
        .init();

    let runtime = ManagedRuntime::new();
    let table = HandleTable::new();
    let raw = RawHandle(1);

    // Engine creates a stream handle and attaches its record
    table
        .attach(raw, HandleData::new(Arc::clone(&runtime)))
        .expect("attach record");

    // Managed side: an echoing listener
    let listener = CallbackRef::new(
        ScriptObjectBuilder::new("EchoHandler")
            .with_method("open_done", |args| {
                println!("open complete, error = {}", args[1]);
                Ok(Value::Null)
            })
            .with_method("read_ready", |args| {
                let data = args[2].as_bytes().unwrap_or(&[]);
                println!("read {} bytes: {:?}", data.len(), String::from_utf8_lossy(data));
                Ok(Value::Int(data.len() as i64))
            })
            .with_method("write_ready", |_args| {
                println!("stream writable");
                Ok(Value::Null)
            })
            .build(),
    );
    {
        let _token = runtime.lock();
        table.get(raw).unwrap().set_listener(Some(listener.acquire()));
    }

    // Pending open completes
    open_done(&runtime, raw, 0, listener.acquire());

    // Engine delivers data and a writable notification
    let status = dispatch_stream_event(
        &table,
        raw,
        EventKind::Read {
            error: 0,
            data: b"hello, causeway".to_vec(),
            channel: 0,
        },
    );
    println!("read dispatch: {status:?}");

    let status = dispatch_stream_event(&table, raw, EventKind::WriteReady);
    println!("write dispatch: {status:?}");

    // Engine destroys the handle
    table.detach(raw);
}
