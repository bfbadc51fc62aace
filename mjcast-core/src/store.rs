//! Record store collaborator.
//!
//! Match and round records live in a push-and-subscribe key-value store.
//! The session only appends and updates; nothing is ever deleted.
//! `MemoryStore` is the in-process implementation used by tests, the demo
//! and single-machine setups.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use anyhow::{anyhow, bail, Result};
use serde_json::Value;

pub type RecordId = String;
pub type ChangeCallback = Box<dyn Fn(&Value) + Send + Sync>;

pub trait RecordStore {
    /// Appends `record` to `collection` and returns its new id.
    fn create(&self, collection: &str, record: Value) -> Result<RecordId>;

    /// Shallow-merges the keys of `partial` into an existing record.
    fn update(&self, collection: &str, id: &str, partial: Value) -> Result<()>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// All records of `collection` in insertion order.
    fn list(&self, collection: &str) -> Result<Vec<(RecordId, Value)>>;

    /// Calls `on_change` with the record now (if it exists) and after every
    /// update, until the returned subscription is dropped.
    fn subscribe(&self, collection: &str, id: &str, on_change: ChangeCallback)
        -> Result<Subscription>;
}

/// Handle for an active subscription. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;
type ListenerKey = (String, RecordId);

#[derive(Default)]
struct Inner {
    collections: RwLock<BTreeMap<String, BTreeMap<RecordId, Value>>>,
    listeners: Mutex<HashMap<ListenerKey, Vec<(u64, Listener)>>>,
    next_record: AtomicU64,
    next_listener: AtomicU64,
}

impl Inner {
    fn listeners_for(&self, key: &ListenerKey) -> Result<Vec<Listener>> {
        let listeners = self
            .listeners
            .lock()
            .map_err(|_| anyhow!("listener registry poisoned"))?;
        Ok(listeners
            .get(key)
            .map(|v| v.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default())
    }
}

/// In-memory last-write-wins store. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, collection: &str, id: &str, value: &Value) -> Result<()> {
        // Listeners run without any lock held so they may read the store.
        let key = (collection.to_string(), id.to_string());
        for listener in self.inner.listeners_for(&key)? {
            listener(value);
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, collection: &str, record: Value) -> Result<RecordId> {
        let n = self.inner.next_record.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("-r{:012}", n);
        let mut collections = self
            .inner
            .collections
            .write()
            .map_err(|_| anyhow!("store poisoned"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        log::debug!("created {}/{}", collection, id);
        Ok(id)
    }

    fn update(&self, collection: &str, id: &str, partial: Value) -> Result<()> {
        let Value::Object(fields) = partial else {
            bail!("update of {}/{} needs an object", collection, id);
        };
        let updated = {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| anyhow!("store poisoned"))?;
            let record = collections
                .get_mut(collection)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| anyhow!("record {}/{} not found", collection, id))?;
            let Value::Object(existing) = record else {
                bail!("record {}/{} is not an object", collection, id);
            };
            for (key, value) in fields {
                existing.insert(key, value);
            }
            record.clone()
        };
        self.notify(collection, id, &updated)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| anyhow!("store poisoned"))?;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    fn list(&self, collection: &str) -> Result<Vec<(RecordId, Value)>> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| anyhow!("store poisoned"))?;
        Ok(collections
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn subscribe(
        &self,
        collection: &str,
        id: &str,
        on_change: ChangeCallback,
    ) -> Result<Subscription> {
        let key = (collection.to_string(), id.to_string());
        let listener_id = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        let listener: Listener = Arc::from(on_change);

        // Registered before the initial read so no update is missed.
        self.inner
            .listeners
            .lock()
            .map_err(|_| anyhow!("listener registry poisoned"))?
            .entry(key.clone())
            .or_default()
            .push((listener_id, listener.clone()));

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Ok(mut listeners) = inner.listeners.lock() {
                if let Some(list) = listeners.get_mut(&key) {
                    list.retain(|(lid, _)| *lid != listener_id);
                }
            };
        });

        if let Some(current) = self.get(collection, id)? {
            listener(&current);
        }
        Ok(subscription)
    }
}
