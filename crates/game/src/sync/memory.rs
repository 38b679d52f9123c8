//! In-process realtime store.

use super::{segments, Change, EventSender, Listen, RemoteStore, StoreEvent, SyncError};
use crate::world;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Subscription {
    connection: u64,
    path: String,
    keys: Vec<String>,
    listen: Listen,
    tx: EventSender,
}

#[derive(Default)]
struct Inner {
    root: Map<String, Value>,
    subscriptions: Vec<Subscription>,
    on_disconnect: Vec<(u64, String)>,
    rejection: Option<(String, String)>,
}

/// A realtime JSON store shared by every connection made from it.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    next_connection: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new client connection.
    pub fn connect(&self) -> MemoryConnection {
        let id = self.next_connection.fetch_add(1, Ordering::Relaxed);
        debug!("Store connection {} opened", id);
        MemoryConnection {
            id,
            store: self.clone(),
            closed: AtomicBool::new(false),
        }
    }

    /// Make every following sign-in fail with the given code.
    pub fn reject_sign_in(&self, code: impl Into<String>, message: impl Into<String>) {
        self.lock().rejection = Some((code.into(), message.into()));
    }

    /// Current value at `path`.
    pub fn value(&self, path: &str) -> Option<Value> {
        let keys = segments(path).ok()?;
        lookup(&self.lock().root, &keys[..]).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Write (or remove, for `None`/null) the value at `keys` and notify subscribers.
    fn apply(&mut self, keys: &[&str], value: Option<Value>) {
        let mut before: Vec<(Vec<String>, Option<Value>)> = Vec::new();
        for sub in &self.subscriptions {
            if overlaps(&sub.keys[..], keys) && !before.iter().any(|(k, _)| *k == sub.keys) {
                before.push((sub.keys.clone(), lookup(&self.root, &sub.keys[..]).cloned()));
            }
        }

        match value.filter(|v| !v.is_null()) {
            Some(value) => insert(&mut self.root, keys, value),
            None => {
                take(&mut self.root, keys);
            }
        }

        let root = &self.root;
        self.subscriptions.retain(|sub| {
            if !overlaps(&sub.keys[..], keys) {
                return true;
            }
            let old = before
                .iter()
                .find(|(k, _)| *k == sub.keys)
                .and_then(|(_, v)| v.as_ref());
            let new = lookup(root, &sub.keys[..]);
            let changes = match sub.listen {
                Listen::ChildAdded => child_changes(old, new, true),
                Listen::ChildRemoved => child_changes(old, new, false),
                Listen::Value if old != new => vec![Change::ValueChanged(new.cloned())],
                Listen::Value => Vec::new(),
            };
            // A closed receiver drops the subscription.
            changes.into_iter().all(|change| {
                sub.tx
                    .send(StoreEvent {
                        path: sub.path.clone(),
                        change,
                    })
                    .is_ok()
            })
        });
    }
}

/// A single client's connection to a [`MemoryStore`].
///
/// Dropping it disconnects.
pub struct MemoryConnection {
    id: u64,
    store: MemoryStore,
    closed: AtomicBool,
}

impl MemoryConnection {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), SyncError> {
        if self.is_closed() {
            Err(SyncError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut inner = self.store.lock();
        inner.subscriptions.retain(|s| s.connection != self.id);
        let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.on_disconnect)
            .into_iter()
            .partition(|(connection, _)| *connection == self.id);
        inner.on_disconnect = rest;
        for (_, path) in mine {
            if let Ok(keys) = segments(&path) {
                inner.apply(&keys, None);
            }
        }
        debug!("Store connection {} closed", self.id);
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryConnection {
    async fn sign_in_anonymously(&self) -> Result<String, SyncError> {
        self.ensure_open()?;
        if let Some((code, message)) = self.store.lock().rejection.clone() {
            return Err(SyncError::AuthRejected { code, message });
        }
        let uid = world::random_id();
        debug!("Connection {} signed in as {}", self.id, uid);
        Ok(uid)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError> {
        self.ensure_open()?;
        let keys = segments(path)?;
        self.store.lock().apply(&keys, Some(value));
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), SyncError> {
        self.ensure_open()?;
        let keys = segments(path)?;
        self.store.lock().apply(&keys, None);
        Ok(())
    }

    async fn subscribe(&self, path: &str, listen: Listen, tx: EventSender) -> Result<(), SyncError> {
        self.ensure_open()?;
        let keys = segments(path)?;
        let mut inner = self.store.lock();

        let current = lookup(&inner.root, &keys[..]);
        let replay = match listen {
            Listen::ChildAdded => child_changes(None, current, true),
            Listen::ChildRemoved => Vec::new(),
            Listen::Value => vec![Change::ValueChanged(current.cloned())],
        };
        for change in replay {
            let _ = tx.send(StoreEvent {
                path: path.to_string(),
                change,
            });
        }

        inner.subscriptions.push(Subscription {
            connection: self.id,
            path: path.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            listen,
            tx,
        });
        Ok(())
    }

    async fn on_disconnect_remove(&self, path: &str) -> Result<(), SyncError> {
        self.ensure_open()?;
        segments(path)?;
        self.store.lock().on_disconnect.push((self.id, path.to_string()));
        Ok(())
    }

    async fn read_once(&self, path: &str) -> Result<Option<Value>, SyncError> {
        self.ensure_open()?;
        let keys = segments(path)?;
        Ok(lookup(&self.store.lock().root, &keys[..]).cloned())
    }

    async fn disconnect(&self) {
        self.close();
    }
}

/// Whether one path is a prefix of the other.
fn overlaps<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.as_ref() == y.as_ref())
}

fn lookup<'a, S: AsRef<str>>(root: &'a Map<String, Value>, keys: &[S]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    let mut node = root.get(first.as_ref())?;
    for key in rest {
        node = node.as_object()?.get(key.as_ref())?;
    }
    Some(node)
}

fn insert(map: &mut Map<String, Value>, keys: &[&str], value: Value) {
    match keys {
        [] => {}
        [key] => {
            map.insert(key.to_string(), value);
        }
        [key, rest @ ..] => {
            let child = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                insert(inner, rest, value);
            }
        }
    }
}

/// Remove the value at `keys`, pruning parents left empty.
fn take(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    match keys {
        [] => None,
        [key] => map.remove(*key),
        [key, rest @ ..] => {
            let Some(Value::Object(inner)) = map.get_mut(*key) else {
                return None;
            };
            let removed = take(inner, rest);
            if inner.is_empty() {
                map.remove(*key);
            }
            removed
        }
    }
}

/// Children present in `new` but not `old` (added), or the reverse (removed).
fn child_changes(old: Option<&Value>, new: Option<&Value>, added: bool) -> Vec<Change> {
    let empty = Map::new();
    let old = old.and_then(Value::as_object).unwrap_or(&empty);
    let new = new.and_then(Value::as_object).unwrap_or(&empty);
    if added {
        new.iter()
            .filter(|(key, _)| !old.contains_key(*key))
            .map(|(key, value)| Change::ChildAdded {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    } else {
        old.iter()
            .filter(|(key, _)| !new.contains_key(*key))
            .map(|(key, value)| Change::ChildRemoved {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}
