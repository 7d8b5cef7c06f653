//! Managed listener objects
//!
//! The bridge never sees concrete listener types; it sees script-style objects
//! with a class name and a table of dynamically named methods. A method is a
//! shared closure taking marshaled [`Value`] arguments and returning either a
//! value or a raised [`BridgeError`].
//!
//! [`CallbackRef`] is the reference the engine stores as user data: acquired
//! when stored, released when the last holder drops it. Reference counts are
//! observable so tests can verify the release discipline.

use crate::error::BridgeError;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A listener method body
pub type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync>;

/// A managed listener: a class name plus a named method table
pub struct ScriptObject {
    class_name: String,
    methods: HashMap<String, MethodFn>,
}

impl ScriptObject {
    /// Class name, used in contract-violation messages
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Look up a method by name
    pub fn lookup(&self, method: &str) -> Option<MethodFn> {
        self.methods.get(method).cloned()
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }
}

/// Builder for constructing listener objects
///
/// # Examples
///
/// ```
/// use causeway_bridge::object::ScriptObjectBuilder;
/// use causeway_bridge::value::Value;
///
/// let listener = ScriptObjectBuilder::new("EchoHandler")
///     .with_method("read_ready", |args| {
///         let data = args[2].as_bytes().unwrap_or(&[]);
///         Ok(Value::Int(data.len() as i64))
///     })
///     .build();
/// assert!(listener.has_method("read_ready"));
/// ```
pub struct ScriptObjectBuilder {
    class_name: String,
    methods: HashMap<String, MethodFn>,
}

impl ScriptObjectBuilder {
    /// Create a builder for a listener with the given class name
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            methods: HashMap::new(),
        }
    }

    /// Add a method under the given name
    pub fn with_method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(body));
        self
    }

    pub fn build(self) -> ScriptObject {
        ScriptObject {
            class_name: self.class_name,
            methods: self.methods,
        }
    }
}

/// Reference-counted handle to a listener, stored as native user data.
///
/// Cloning acquires, dropping releases; [`CallbackRef::ref_count`] exposes the
/// live count. The native record's own refcount is a separate counter with a
/// separate lifetime (see [`crate::engine::HandleData`]); the two are never
/// conflated.
#[derive(Clone)]
pub struct CallbackRef {
    inner: Arc<ScriptObject>,
}

impl CallbackRef {
    pub fn new(object: ScriptObject) -> Self {
        Self {
            inner: Arc::new(object),
        }
    }

    /// Acquire an additional reference for storing as user data
    pub fn acquire(&self) -> CallbackRef {
        self.clone()
    }

    /// Number of live references to the listener
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn class_name(&self) -> &str {
        self.inner.class_name()
    }

    pub fn lookup(&self, method: &str) -> Option<MethodFn> {
        self.inner.lookup(method)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.inner.has_method(method)
    }
}

impl std::fmt::Debug for CallbackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRef")
            .field("class", &self.inner.class_name())
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_finds_registered_method() {
        let object = ScriptObjectBuilder::new("Handler")
            .with_method("write_ready", |_args| Ok(Value::Null))
            .build();

        assert!(object.lookup("write_ready").is_some());
        assert!(object.lookup("read_ready").is_none());
    }

    #[test]
    fn test_ref_count_tracks_acquire_and_release() {
        let cb = CallbackRef::new(ScriptObjectBuilder::new("Handler").build());
        assert_eq!(cb.ref_count(), 1);

        let stored = cb.acquire();
        assert_eq!(cb.ref_count(), 2);

        drop(stored);
        assert_eq!(cb.ref_count(), 1);
    }

    #[test]
    fn test_method_receives_arguments() {
        let object = ScriptObjectBuilder::new("Adder")
            .with_method("add", |args| {
                let a = args[0].as_int().unwrap_or(0);
                let b = args[1].as_int().unwrap_or(0);
                Ok(Value::Int(a + b))
            })
            .build();

        let method = object.lookup("add").unwrap();
        let result = method(&[Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(result, Value::Int(5));
    }
}
