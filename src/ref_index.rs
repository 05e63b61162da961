//! A secondary index mapping a key to the slots of its live orders,
//! e.g. all orders of one user or all orders on one security.

use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
};

/// Key → unordered bucket of primary store slots.
///
/// Buckets carry no ordering contract: removal swaps the last entry into
/// the vacated position. A key with an empty bucket is removed entirely.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct RefIndex<K>
where
    K: Eq + Hash,
{
    buckets: HashMap<K, Vec<usize>>,
}

impl<K> RefIndex<K>
where
    K: Eq + Hash,
{
    /// Append a slot reference under `key`, creating the bucket if absent.
    pub(crate) fn add(&mut self, key: K, slot: usize) {
        self.buckets.entry(key).or_default().push(slot);
    }

    /// Drop the reference to `slot` under `key`.
    /// A missing key or slot is silently ignored.
    pub(crate) fn remove<Q>(&mut self, key: &Q, slot: usize)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return;
        };
        if let Some(pos) = bucket.iter().position(|&s| s == slot) {
            bucket.swap_remove(pos);
        }
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
    }

    /// The bucket of `key` if any.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&[usize]>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// An owned copy of the bucket of `key`, safe to iterate while the
    /// index is mutated underneath.
    pub(crate) fn snapshot<Q>(&self, key: &Q) -> Vec<usize>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.buckets.get(key).cloned().unwrap_or_default()
    }

    /// Iterate over all keys and their buckets.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &[usize])> {
        self.buckets.iter().map(|(key, bucket)| (key, bucket.as_slice()))
    }
}
