//! Nearest-strictly-prior lookups ("as-of" joins) over keyed histories.
//!
//! Records are bucketed by key and each bucket is sorted by its ordering
//! value once; every lookup is then a binary search into that key's own
//! history, so joining `n` records against `m` queries costs
//! `O((n + m) log n)`.
//!
//! Exact matches are never returned: a record dated `d` is only visible to
//! queries dated strictly after `d`. A game therefore can't be its own
//! predecessor, and two records on the same date never see each other.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct AsOfIndex<K, T, V> {
    history: HashMap<K, Vec<(T, V)>>,
}

impl<K, T, V> AsOfIndex<K, T, V>
where
    K: Hash + Eq,
    T: Ord + Copy,
{
    /// Builds the index from `(on, by, value)` records in any order.
    ///
    /// Records sharing a key and ordering value keep their input order.
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (T, K, V)>,
    {
        let mut history: HashMap<K, Vec<(T, V)>> = HashMap::new();
        for (on, by, value) in records {
            history.entry(by).or_default().push((on, value));
        }
        for records in history.values_mut() {
            records.sort_by_key(|(on, _)| *on);
        }
        AsOfIndex { history }
    }

    /// The latest record for `by` ordered strictly before `on`.
    pub fn prior<Q>(&self, by: &Q, on: T) -> Option<(T, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let records = self.history.get(by)?;
        let idx = records.partition_point(|(at, _)| *at < on);
        idx.checked_sub(1).map(|i| (records[i].0, &records[i].1))
    }

    /// How many records for `by` are ordered strictly before `on`.
    pub fn count_prior<Q>(&self, by: &Q, on: T) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.history
            .get(by)
            .map_or(0, |records| records.partition_point(|(at, _)| *at < on))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.history.keys()
    }
}
