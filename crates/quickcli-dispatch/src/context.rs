//! Shared state threaded through one application run.
//!
//! # Data vs Extensions
//!
//! [`ExecutionContext`] offers two stores:
//!
//! | Field | Keyed by | Holds | Typical writer |
//! |-------|----------|-------|----------------|
//! | data (`get`/`set`) | string | `serde_json::Value` | app settings, parsed `args` |
//! | `extensions` | type | any `'static` value | prepare hooks (clients, handles) |
//!
//! Reading a missing data key goes through the [`ContextConfig`] policy:
//! with `allow_unset` (the default) [`ExecutionContext::lookup`] yields the
//! configured unset value, otherwise it fails with [`ContextError::Unset`].

use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error returned by policy-governed context lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The key is not set and the policy forbids falling back.
    #[error("no such context attribute '{0}'")]
    Unset(String),
    /// No typed value of the named type was stored by a prepare hook.
    #[error("no {0} in context extensions")]
    MissingExtension(&'static str),
}

/// Policy for reading keys that were never set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// When false, looking up a missing key is an error.
    pub allow_unset: bool,
    /// Value returned for missing keys when `allow_unset` is true.
    pub unset_default: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            allow_unset: true,
            unset_default: String::new(),
        }
    }
}

impl ContextConfig {
    /// A strict policy: missing keys are errors.
    pub fn strict() -> Self {
        Self {
            allow_unset: false,
            ..Self::default()
        }
    }

    /// Sets the value returned for missing keys.
    pub fn unset_default(mut self, value: impl Into<String>) -> Self {
        self.unset_default = value.into();
        self
    }
}

/// Per-run state that isn't JSON data, keyed by its type.
///
/// Prepare hooks store things like API clients or open handles here, and
/// the leaf action takes them back out by type.
///
/// ```rust
/// use quickcli_dispatch::Extensions;
///
/// struct Remote { url: String }
///
/// let mut ext = Extensions::new();
/// ext.insert(Remote { url: "https://example.com".into() });
///
/// let remote = ext.get_required::<Remote>()?;
/// assert_eq!(remote.url, "https://example.com");
/// # Ok::<(), quickcli_dispatch::ContextError>(())
/// ```
#[derive(Default)]
pub struct Extensions {
    slots: HashMap<TypeId, Slot>,
}

struct Slot {
    type_name: &'static str,
    value: Box<dyn Any>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        let slot = Slot {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        };
        self.slots
            .insert(TypeId::of::<T>(), slot)
            .and_then(Slot::into_inner)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_mut())
    }

    /// Like [`get`](Self::get), failing with the missing type's name.
    pub fn get_required<T: 'static>(&self) -> Result<&T, ContextError> {
        self.get::<T>()
            .ok_or(ContextError::MissingExtension(std::any::type_name::<T>()))
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(Slot::into_inner)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }
}

impl Slot {
    fn into_inner<T: 'static>(self) -> Option<T> {
        self.value.downcast().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.slots.values().map(|slot| slot.type_name).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

/// Key/value store shared by every hook and action of a run.
///
/// One instance is created when the application is built and lives until
/// the process exits. Hooks receive it through
/// [`CommandContext`](crate::CommandContext).
///
/// # Example
///
/// ```rust
/// use quickcli_dispatch::{ContextConfig, ContextError, ExecutionContext};
/// use serde_json::json;
///
/// let mut ctx = ExecutionContext::new();
/// ctx.set("init_logging", true);
/// assert_eq!(ctx.lookup("init_logging"), Ok(&json!(true)));
/// assert_eq!(ctx.lookup("missing"), Ok(&json!("")));
///
/// let strict = ExecutionContext::with_config(ContextConfig::strict());
/// assert_eq!(
///     strict.lookup("missing"),
///     Err(ContextError::Unset("missing".into()))
/// );
/// ```
pub struct ExecutionContext {
    data: HashMap<String, Value>,
    config: ContextConfig,
    unset_value: Value,
    /// Typed per-run state, see [`Extensions`].
    pub extensions: Extensions,
}

impl ExecutionContext {
    /// Creates an empty context with the default policy.
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Creates an empty context governed by `config`.
    pub fn with_config(config: ContextConfig) -> Self {
        let unset_value = Value::String(config.unset_default.clone());
        Self {
            data: HashMap::new(),
            config,
            unset_value,
            extensions: Extensions::new(),
        }
    }

    /// Returns the unset policy of this context.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Sets a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Returns the value under `key`, ignoring the unset policy.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the value under `key`, or `default` when it is not set.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.data.get(key).unwrap_or(default)
    }

    /// Looks up `key`, applying the unset policy for missing keys.
    pub fn lookup(&self, key: &str) -> Result<&Value, ContextError> {
        match self.data.get(key) {
            Some(value) => Ok(value),
            None if self.config.allow_unset => Ok(&self.unset_value),
            None => Err(ContextError::Unset(key.to_string())),
        }
    }

    /// Stores `value` under `key` unless a value is already present, then
    /// returns whatever is stored.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Value {
        let key = key.into();
        if !self.data.contains_key(&key) {
            tracing::debug!(key = %key, "initializing context value");
        }
        self.data.entry(key).or_insert_with(|| value.into())
    }

    /// Inserts every pair from `values`, overwriting existing keys.
    pub fn update<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in values {
            self.data.insert(key.into(), value.into());
        }
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns true if `key` is set.
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the number of data entries (extensions are not counted).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no data is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over data entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("data", &self.data)
            .field("config", &self.config)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.data.keys().collect();
        keys.sort();
        write!(f, "{{Context::{{")?;
        for (i, key) in keys.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, self.data[key])?;
        }
        write!(f, "}}}}")
    }
}
