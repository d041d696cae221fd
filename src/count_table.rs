//! A bucketed key -> signed count table tuned for the tight
//! create/merge/compare loops of composition arithmetic.

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use ahash::{HashMap, RandomState};
use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, Serializer};

const BUCKET_COUNT: usize = 6;

/// An open-hashing mapping from keys to machine-integer counts.
///
/// Keys hash into one of a small fixed number of buckets, each a plain
/// `Vec` of `(key, count)` cells scanned linearly and grown geometrically.
/// At the handful-of-entries sizes produced while traversing molecular
/// graphs, this stays cheaper than a resizing general-purpose hash map,
/// and counts are stored inline rather than boxed.
///
/// Unlike [`Composition`](crate::Composition), the generic table tolerates
/// explicitly stored zero counts; equality and arithmetic treat them the
/// same as absent keys.
#[derive(Clone, Debug)]
pub struct CountTable<K> {
    buckets: [Vec<(K, i64)>; BUCKET_COUNT],
    hasher: RandomState,
}

// Public API ==========================================================================================================

impl<K> CountTable<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            hasher: RandomState::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Borrowing iterator over the stored entries, in bucket order rather
    /// than insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, i64)> {
        self.buckets.iter().flatten().map(|&(ref key, count)| (key, count))
    }

    /// Snapshot of the stored counts.
    pub fn values(&self) -> Vec<i64> {
        self.iter().map(|(_, count)| count).collect()
    }

    /// Multiply every stored count by `scalar` in place.
    pub fn scale_by(&mut self, scalar: i64) {
        for bucket in &mut self.buckets {
            for cell in bucket {
                cell.1 *= scalar;
            }
        }
    }
}

impl<K: Hash + Eq> CountTable<K> {
    /// The count stored under `key`, with absent keys reading as 0.
    pub fn get<Q>(&self, key: &Q) -> i64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map_or(0, |(bucket, cell)| self.buckets[bucket][cell].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Store `value` under `key`, overwriting any previous count. A zero
    /// `value` is stored like any other.
    pub fn set(&mut self, key: K, value: i64) {
        match self.find(&key) {
            Some((bucket, cell)) => self.buckets[bucket][cell].1 = value,
            None => {
                let bucket = self.bucket_index(&key);
                self.buckets[bucket].push((key, value));
            }
        }
    }

    pub fn increment(&mut self, key: K, delta: i64) {
        match self.find(&key) {
            Some((bucket, cell)) => self.buckets[bucket][cell].1 += delta,
            None => {
                let bucket = self.bucket_index(&key);
                self.buckets[bucket].push((key, delta));
            }
        }
    }

    pub fn decrement(&mut self, key: K, delta: i64) {
        self.increment(key, -delta);
    }

    /// Remove `key`, returning the count it held (0 if absent).
    pub fn remove<Q>(&mut self, key: &Q) -> i64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some((bucket, cell)) = self.find(key) {
            self.buckets[bucket].swap_remove(cell).1
        } else {
            0
        }
    }
}

impl<K: Hash + Eq + Clone> CountTable<K> {
    /// Elementwise `self[k] += other[k]`, creating keys found only in
    /// `other`.
    pub fn add_from(&mut self, other: &Self) {
        for (key, count) in other.iter() {
            self.increment(key.clone(), count);
        }
    }

    /// Elementwise `self[k] -= other[k]`, creating keys found only in
    /// `other`.
    pub fn subtract_from(&mut self, other: &Self) {
        for (key, count) in other.iter() {
            self.decrement(key.clone(), count);
        }
    }

    /// Snapshot of the stored keys.
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Snapshot of the stored entries.
    pub fn items(&self) -> Vec<(K, i64)> {
        self.iter().map(|(key, count)| (key.clone(), count)).collect()
    }

    /// Snapshot conversion into a plain hash map.
    pub fn to_mapping(&self) -> HashMap<K, i64> {
        self.iter().map(|(key, count)| (key.clone(), count)).collect()
    }
}

// Private Helper Methods ==============================================================================================

impl<K: Hash + Eq> CountTable<K> {
    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        (self.hasher.hash_one(key) % BUCKET_COUNT as u64) as usize
    }

    fn find<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_index(key);
        self.buckets[bucket]
            .iter()
            .position(|(stored, _)| stored.borrow() == key)
            .map(|cell| (bucket, cell))
    }
}

// Equality, Construction, and Serialization ===========================================================================

impl<K> Default for CountTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq> PartialEq for CountTable<K> {
    /// Deep value equality: every key carrying a nonzero count in either
    /// table must carry the same count in both, with absence reading as 0.
    fn eq(&self, other: &Self) -> bool {
        self.iter().all(|(key, count)| count == 0 || other.get(key) == count)
            && other.iter().all(|(key, count)| count == 0 || self.get(key) == count)
    }
}

impl<K: Hash + Eq> Eq for CountTable<K> {}

impl<K: Hash + Eq> FromIterator<(K, i64)> for CountTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<K: Hash + Eq> Extend<(K, i64)> for CountTable<K> {
    fn extend<I: IntoIterator<Item = (K, i64)>>(&mut self, iter: I) {
        for (key, count) in iter {
            self.increment(key, count);
        }
    }
}

impl<K: Serialize + Ord + Hash + Eq> Serialize for CountTable<K> {
    /// Serializes as a map with keys in sorted order, so equal tables
    /// always produce identical output.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, count) in self.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
            map.serialize_entry(key, &count)?;
        }
        map.end()
    }
}

// Arithmetic Operators ================================================================================================

impl<K: Hash + Eq + Clone> Add for &CountTable<K> {
    type Output = CountTable<K>;

    fn add(self, rhs: Self) -> Self::Output {
        let mut sum = self.clone();
        sum.add_from(rhs);
        sum
    }
}

impl<K: Hash + Eq + Clone> Sub for &CountTable<K> {
    type Output = CountTable<K>;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut difference = self.clone();
        difference.subtract_from(rhs);
        difference
    }
}

impl<K: Hash + Eq + Clone> AddAssign<&Self> for CountTable<K> {
    fn add_assign(&mut self, rhs: &Self) {
        self.add_from(rhs);
    }
}

impl<K: Hash + Eq + Clone> SubAssign<&Self> for CountTable<K> {
    fn sub_assign(&mut self, rhs: &Self) {
        self.subtract_from(rhs);
    }
}

impl<K: Clone> Mul<i64> for &CountTable<K> {
    type Output = CountTable<K>;

    fn mul(self, scalar: i64) -> Self::Output {
        let mut scaled = self.clone();
        scaled.scale_by(scalar);
        scaled
    }
}

impl<K: Clone> Neg for &CountTable<K> {
    type Output = CountTable<K>;

    fn neg(self) -> Self::Output {
        self * -1
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, i64)]) -> CountTable<String> {
        entries.iter().map(|&(key, count)| (key.to_owned(), count)).collect()
    }

    #[test]
    fn get_set_remove() {
        let mut counts = CountTable::new();
        assert_eq!(counts.get("Hex"), 0);
        counts.set("Hex".to_owned(), 3);
        counts.set("HexNAc".to_owned(), 2);
        assert_eq!(counts.get("Hex"), 3);
        assert_eq!(counts.get("HexNAc"), 2);
        assert_eq!(counts.len(), 2);
        // Overwrite
        counts.set("Hex".to_owned(), 5);
        assert_eq!(counts.get("Hex"), 5);
        assert_eq!(counts.len(), 2);
        // Removal returns the previous count, absent keys return 0
        assert_eq!(counts.remove("Hex"), 5);
        assert_eq!(counts.remove("Hex"), 0);
        assert_eq!(counts.get("Hex"), 0);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn increment_decrement() {
        let mut counts = CountTable::new();
        counts.increment("Fuc".to_owned(), 2);
        counts.increment("Fuc".to_owned(), 3);
        counts.decrement("Fuc".to_owned(), 1);
        assert_eq!(counts.get("Fuc"), 4);
        // Counts pass through zero without the key vanishing
        counts.decrement("Fuc".to_owned(), 4);
        assert_eq!(counts.get("Fuc"), 0);
        assert!(counts.contains_key("Fuc"));
    }

    #[test]
    fn bucket_growth() {
        // Far more keys than buckets, so every bucket array regrows
        let mut counts = CountTable::new();
        for i in 0..200_i64 {
            counts.set(format!("residue-{i}"), i);
        }
        assert_eq!(counts.len(), 200);
        for i in 0..200_i64 {
            assert_eq!(counts.get(format!("residue-{i}").as_str()), i);
        }
    }

    #[test]
    fn elementwise_merges() {
        let mut counts = table(&[("Hex", 3), ("Fuc", 1)]);
        counts.add_from(&table(&[("Hex", 2), ("NeuAc", 1)]));
        assert_eq!(counts, table(&[("Hex", 5), ("Fuc", 1), ("NeuAc", 1)]));

        counts.subtract_from(&table(&[("Fuc", 1), ("Pent", 2)]));
        assert_eq!(
            counts,
            table(&[("Hex", 5), ("NeuAc", 1), ("Pent", -2)])
        );

        counts.scale_by(-2);
        assert_eq!(
            counts,
            table(&[("Hex", -10), ("NeuAc", -2), ("Pent", 4)])
        );
    }

    #[test]
    fn operators_match_merges() {
        let lhs = table(&[("Hex", 3), ("Fuc", 1)]);
        let rhs = table(&[("Hex", 1), ("NeuAc", 2)]);

        let mut in_place = lhs.clone();
        in_place += &rhs;
        assert_eq!(&lhs + &rhs, in_place);

        let mut in_place = lhs.clone();
        in_place -= &rhs;
        assert_eq!(&lhs - &rhs, in_place);

        assert_eq!(&lhs * 3, table(&[("Hex", 9), ("Fuc", 3)]));
        assert_eq!(-&lhs, table(&[("Hex", -3), ("Fuc", -1)]));
    }

    #[test]
    fn equality_ignores_zero_entries() {
        let mut with_zero = table(&[("Hex", 3)]);
        with_zero.set("Fuc".to_owned(), 0);
        let without_zero = table(&[("Hex", 3)]);
        assert_eq!(with_zero, without_zero);
        assert_eq!(without_zero, with_zero);
        // A nonzero count is never ignored
        with_zero.set("Fuc".to_owned(), 1);
        assert_ne!(with_zero, without_zero);
    }

    #[test]
    fn snapshots() {
        let counts = table(&[("Hex", 3), ("Fuc", 1)]);
        let mut items = counts.items();
        items.sort();
        assert_eq!(items, [("Fuc".to_owned(), 1), ("Hex".to_owned(), 3)]);
        let mut keys = counts.keys();
        keys.sort();
        assert_eq!(keys, ["Fuc", "Hex"]);
        let mut values = counts.values();
        values.sort_unstable();
        assert_eq!(values, [1, 3]);

        let mapping = counts.to_mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["Hex"], 3);
        assert_eq!(mapping["Fuc"], 1);
    }

    #[test]
    fn copies_are_independent() {
        let original = table(&[("Hex", 3)]);
        let mut copy = original.clone();
        copy.set("Hex".to_owned(), 7);
        assert_eq!(original.get("Hex"), 3);
        assert_eq!(copy.get("Hex"), 7);
    }

    #[test]
    fn integer_keys() {
        let mut counts = CountTable::new();
        for i in 0..50_u32 {
            counts.increment(i, i64::from(i));
        }
        assert_eq!(counts.get(&49), 49);
        assert_eq!(counts.get(&50), 0);
    }

    #[test]
    fn serializes_in_sorted_order() {
        let counts = table(&[("O", 1), ("H", 2), ("C", 6)]);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"C":6,"H":2,"O":1}"#);
    }

    #[test]
    fn arithmetic_mirrors_compositions() {
        use crate::Composition;

        let lhs = [("C", 6), ("H", 12), ("O", 6)];
        let rhs = [("H", 2), ("O", 1), ("N", 3)];
        let (t1, t2) = (table(&lhs), table(&rhs));
        let c1 = Composition::from_mapping(lhs);
        let c2 = Composition::from_mapping(rhs);

        assert_eq!((&t1 + &t2).to_mapping(), (&c1 + &c2).to_mapping());
        assert_eq!((&t1 - &t2).to_mapping(), (&c1 - &c2).to_mapping());
        assert_eq!((&t1 * 3).to_mapping(), (&c1 * 3).to_mapping());
    }
}
