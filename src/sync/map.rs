//! Key/value monitors: the safe interface and the one that looks safe.

use super::monitor::Monitor;
use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A map whose operations are the critical sections callers actually need.
///
/// There is no public `contains`: a check followed by a separate act could
/// see the map change in between. Instead "if absent" and "if present" are
/// part of each operation, so any number of threads can hammer the same
/// `MapMonitor` without breaking its invariants.
pub struct MapMonitor<K, V> {
    inner: Monitor<HashMap<K, V>>,
}

impl<K, V> MapMonitor<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: Monitor::new(HashMap::new()),
        }
    }

    /// Insert unless the key is already present. Returns whether it inserted;
    /// an existing value is never overwritten.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        self.inner.enter(|map| {
            if contains(map, &key) {
                return false;
            }
            map.insert(key, value);
            true
        })
    }

    /// Remove the key if present. Absent keys are a no-op.
    pub fn remove_if_present<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.enter(|map| {
            if contains(map, key) {
                map.remove(key)
            } else {
                None
            }
        })
    }

    /// Run `f` on the value while the key cannot be removed or replaced.
    pub fn with_value_if_present<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.enter(|map| map.get(key).map(f))
    }

    /// Mutate the value in place if present. Returns whether it was.
    pub fn update_if_present<Q>(&self, key: &Q, f: impl FnOnce(&mut V)) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.enter(|map| match map.get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        })
    }

    /// Copy of the value, or [`Error::KeyNotFound`].
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
        V: Clone,
    {
        self.inner
            .enter(|map| map.get(key).cloned())
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn len(&self) -> usize {
        self.inner.enter(|map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent copy of every entry.
    pub fn snapshot(&self) -> HashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.inner.enter(|map| map.clone())
    }

    pub fn into_inner(self) -> HashMap<K, V> {
        self.inner.into_inner()
    }
}

/// Only meaningful while the monitor's lock is held.
fn contains<K, V, Q>(map: &HashMap<K, V>, key: &Q) -> bool
where
    K: Eq + Hash + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
{
    map.contains_key(key)
}

impl<K: Eq + Hash, V> Default for MapMonitor<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for MapMonitor<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: Monitor::new(iter.into_iter().collect()),
        }
    }
}

impl<K, V> fmt::Debug for MapMonitor<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapMonitor").finish_non_exhaustive()
    }
}

/// A map whose primitives each lock on their own.
///
/// Every single call is safe, but the obvious way to use it is not:
///
/// ```no_run
/// # use threadkit::ProtectedMap;
/// # let map: ProtectedMap<i32, i32> = ProtectedMap::new();
/// # let key = 1;
/// if map.contains(&key) {
///     // another thread may remove `key` right here
///     let value = map.get(&key); // can now fail with KeyNotFound
/// }
/// ```
///
/// The check and the act are two critical sections, not one. Either wrap
/// both in a shared [`Mutex`](super::Mutex) at every call site, or use
/// [`MapMonitor`], whose operations are the compound ones.
pub struct ProtectedMap<K, V> {
    inner: Monitor<HashMap<K, V>>,
}

impl<K, V> ProtectedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: Monitor::new(HashMap::new()),
        }
    }

    /// Insert or overwrite.
    pub fn put(&self, key: K, value: V) {
        self.inner.enter(|map| {
            map.insert(key, value);
        });
    }

    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
        V: Clone,
    {
        self.inner
            .enter(|map| map.get(key).cloned())
            .ok_or_else(|| Error::key_not_found(key))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.enter(|map| map.contains_key(key))
    }

    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.enter(|map| {
            map.remove(key);
        });
    }

    pub fn len(&self) -> usize {
        self.inner.enter(|map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, V> Default for ProtectedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ProtectedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedMap").finish_non_exhaustive()
    }
}
