//! Selective persistence of allow-listed slice fields
//!
//! Each slice declares at compile time which fields may cross the durable
//! storage boundary (`#[slice(persist)]` on the field). Everything else is
//! dropped on write and reset to its default on read.
//!
//! The durable blob of a surface is one JSON object keyed by slice name:
//!
//! ```text
//! { "wallet": { "selected_account": "0xabc", "is_wallet_created": true } }
//! ```
//!
//! # Example
//!
//! ```ignore
//! #[derive(Slice, Clone, Debug, Default, PartialEq)]
//! #[slice(name = "account")]
//! struct Account {
//!     #[slice(persist)]
//!     balance: u64,
//!     secret: String,
//! }
//!
//! let blob = Account { balance: 10, secret: "x".into() }.dehydrate();
//! assert_eq!(serde_json::Value::Object(blob.clone()), json!({ "balance": 10 }));
//!
//! let restored = Account::rehydrate(&serde_json::Value::Object(blob)).value;
//! assert_eq!(restored, Account { balance: 10, secret: String::new() });
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;
use crate::slice::{Slice, StateTree};
use crate::store::{ListenerHandle, Store};

/// Serialized form of a slice or of a whole tree.
pub type Blob = serde_json::Map<String, Value>;

/// Why a field fell back to its default during rehydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The field (or its whole slice) was absent from the blob.
    Missing,
    /// The stored value could not be decoded.
    Invalid(String),
}

/// A persisted field that was reset to its default.
///
/// Recorded for logging only; rehydration never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub slice: &'static str,
    pub field: &'static str,
    pub reason: FallbackReason,
}

/// Result of rehydrating a slice or tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Rehydrated<T> {
    pub value: T,
    pub fallbacks: Vec<Fallback>,
}

impl<T> Rehydrated<T> {
    /// Map the value, keeping the fallbacks.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rehydrated<U> {
        Rehydrated {
            value: f(self.value),
            fallbacks: self.fallbacks,
        }
    }
}

/// A slice with a statically declared persistence allow-list.
///
/// Generated by `#[derive(Slice)]` from `#[slice(persist)]` field attributes.
pub trait Persist: Slice {
    /// Fields eligible for durable storage.
    const ALLOW_LIST: &'static [&'static str];

    /// Only the allow-listed fields.
    fn dehydrate(&self) -> Blob;

    /// Defaults merged with the allow-listed fields found in `raw`.
    ///
    /// Fields not in the allow-list are ignored even when present.
    fn rehydrate(raw: &Value) -> Rehydrated<Self>;
}

/// Builds a slice blob field by field.
pub struct SliceWriter {
    slice: &'static str,
    blob: Blob,
}

impl SliceWriter {
    pub fn new(slice: &'static str) -> Self {
        Self {
            slice,
            blob: Blob::new(),
        }
    }

    pub fn write<T: Serialize>(&mut self, field: &'static str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.blob.insert(field.to_string(), value);
            }
            Err(err) => {
                tracing::warn!(slice = self.slice, field, error = %err, "Skipping unserializable field");
            }
        }
    }

    pub fn finish(self) -> Blob {
        self.blob
    }
}

/// Reads allow-listed fields out of a slice blob, recording fallbacks.
pub struct SliceReader<'a> {
    slice: &'static str,
    blob: Option<&'a Blob>,
    absent: FallbackReason,
    fallbacks: Vec<Fallback>,
}

impl<'a> SliceReader<'a> {
    pub fn new(slice: &'static str, raw: &'a Value) -> Self {
        let (blob, absent) = match raw {
            Value::Object(blob) => (Some(blob), FallbackReason::Missing),
            Value::Null => (None, FallbackReason::Missing),
            other => (
                None,
                FallbackReason::Invalid(format!("expected object, found {}", json_type(other))),
            ),
        };
        Self {
            slice,
            blob,
            absent,
            fallbacks: Vec::new(),
        }
    }

    /// Overwrite `target` with the stored value of `field`, if it decodes.
    pub fn read<T: DeserializeOwned>(&mut self, field: &'static str, target: &mut T) {
        let Some(raw) = self.blob.and_then(|blob| blob.get(field)) else {
            self.fallback(field, self.absent.clone());
            return;
        };
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(value) => *target = value,
            Err(err) => self.fallback(field, FallbackReason::Invalid(err.to_string())),
        }
    }

    fn fallback(&mut self, field: &'static str, reason: FallbackReason) {
        self.fallbacks.push(Fallback {
            slice: self.slice,
            field,
            reason,
        });
    }

    pub fn finish<T>(self, value: T) -> Rehydrated<T> {
        Rehydrated {
            value,
            fallbacks: self.fallbacks,
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A state tree with a durable blob.
pub trait PersistTree: StateTree {
    /// Slices whose changes trigger a write.
    fn persisted_slices() -> Self::Changes;

    fn dehydrate(&self) -> Blob;

    fn rehydrate(blob: &Blob) -> Rehydrated<Self>;
}

/// Add a slice's blob to a tree blob under the slice name.
///
/// Slices with an empty allow-list contribute nothing.
pub fn dehydrate_slice<T: Persist>(tree: &mut Blob, slice: &T) {
    if T::ALLOW_LIST.is_empty() {
        return;
    }
    tree.insert(T::NAME.to_string(), Value::Object(slice.dehydrate()));
}

/// Rehydrate one slice out of a tree blob.
pub fn rehydrate_slice<T: Persist>(tree: &Blob, fallbacks: &mut Vec<Fallback>) -> T {
    if T::ALLOW_LIST.is_empty() {
        return T::default();
    }
    let rehydrated = T::rehydrate(tree.get(T::NAME).unwrap_or(&Value::Null));
    fallbacks.extend(rehydrated.fallbacks);
    rehydrated.value
}

/// Key-value store for serialized surface blobs.
pub trait Storage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Connects a surface's store to durable storage.
///
/// Runs at two points only: [`rehydrate`](Self::rehydrate) once at startup,
/// and [`write`](Self::write) on every change touching a persisted slice.
pub struct Persistor<S: PersistTree> {
    key: String,
    storage: Box<dyn Storage>,
    last_written: RefCell<Option<String>>,
    _tree: PhantomData<fn() -> S>,
}

impl<S: PersistTree> Persistor<S> {
    pub fn new(key: impl Into<String>, storage: impl Storage + 'static) -> Self {
        Self {
            key: key.into(),
            storage: Box::new(storage),
            last_written: RefCell::new(None),
            _tree: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Build a tree from the stored blob.
    ///
    /// Unreadable storage or an undecodable blob yields the default tree.
    pub fn rehydrate(&self) -> Rehydrated<S> {
        let stored = match self.storage.load(&self.key) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Failed to read stored state");
                None
            }
        };

        let blob = match stored.as_deref().map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Object(blob))) => blob,
            Some(Ok(_)) => {
                tracing::debug!(key = %self.key, "Stored state is not an object, using defaults");
                Blob::new()
            }
            Some(Err(err)) => {
                tracing::debug!(key = %self.key, error = %err, "Stored state is not valid JSON, using defaults");
                Blob::new()
            }
            None => Blob::new(),
        };

        let rehydrated = S::rehydrate(&blob);
        for fallback in &rehydrated.fallbacks {
            tracing::debug!(
                slice = fallback.slice,
                field = fallback.field,
                reason = ?fallback.reason,
                "Persisted field fell back to default"
            );
        }

        if stored.is_some() {
            // What's on disk now matches the tree, modulo dropped fields.
            *self.last_written.borrow_mut() =
                serde_json::to_string(&rehydrated.value.dehydrate()).ok();
        }
        rehydrated
    }

    /// Write the tree's blob unless it equals the last blob written.
    ///
    /// Returns whether storage was written.
    pub fn write(&self, state: &S) -> Result<bool, StorageError> {
        let serialized = serde_json::to_string(&state.dehydrate())?;
        if self.last_written.borrow().as_deref() == Some(serialized.as_str()) {
            return Ok(false);
        }
        self.storage.save(&self.key, &serialized)?;
        tracing::trace!(key = %self.key, bytes = serialized.len(), "Persisted state");
        *self.last_written.borrow_mut() = Some(serialized);
        Ok(true)
    }

    /// Register a store listener writing on every change to a persisted slice.
    pub fn attach(self: &Rc<Self>, store: &Store<S>) -> ListenerHandle {
        let persistor = Rc::clone(self);
        store.add_listener(move |change| {
            if !change.touches(S::persisted_slices()) {
                return;
            }
            if let Err(err) = persistor.write(&change.snapshot) {
                tracing::warn!(key = %persistor.key, error = %err, "Failed to persist state");
            }
        })
    }
}
