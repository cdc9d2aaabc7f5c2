use ahash::RandomState;
use hashbrown::{Equivalent, HashMap};
use num_traits::Float;

use core::hash::Hash;

use crate::{Aggregate, Kbn};

/// Mapping from key to a value that may be null
///
/// `None` is the null marker. It is distinct from an absent key.
pub type ValueMap<K, T> = HashMap<K, Option<T>, RandomState>;

/// Mergeable aggregate that sums mappings entrywise
///
/// Every incoming mapping is folded into a table of running sums, one per key:
///
/// - a null value for a key never seen before records the key with a null marker
/// - a null value for a known key leaves it as is
/// - a numeric value is added to the key's sum, a null marker counting as zero
///
/// Once a key has received a numeric value it never returns to null. Merging a
/// partial aggregate applies the same rule, so maps may be combined in any
/// grouping and order. Sums are accumulated with Kahan-Babuska-Neumaier
/// compensation to keep long chains of additions exact to rounding.
///
/// The whole table is held in memory, so the aggregate grows with the number of
/// distinct keys in the group.
#[derive(Debug, Clone)]
pub struct CombineMap<K, T> {
    /// Running sum per key, `None` for the null marker
    table: HashMap<K, Option<Kbn<T>>, RandomState>,
}

impl<K, T> Default for CombineMap<K, T>
where
    K: Eq + Hash,
    T: Float + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> CombineMap<K, T>
where
    K: Eq + Hash,
    T: Float + Default,
{
    /// Creates an empty `CombineMap`
    ///
    /// # Returns
    ///
    /// * `Self` - The aggregate with no keys
    pub fn new() -> Self {
        Self {
            table: HashMap::with_hasher(RandomState::default()),
        }
    }

    /// Resets to the empty state
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The aggregate
    pub fn reset(&mut self) -> &mut Self {
        self.table.clear();
        self
    }

    /// Folds one value for one key into the table
    fn add(&mut self, key: K, value: Option<T>) {
        let slot = self.table.entry(key).or_insert(None);
        if let Some(value) = value {
            *slot.get_or_insert_with(Kbn::default) += value;
        }
    }

    /// Folds an incoming mapping into the table
    ///
    /// # Arguments
    ///
    /// * `entries` - The key/value pairs of the incoming mapping
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The aggregate
    ///
    /// # Examples
    ///
    /// ```
    /// use udaf_statistics::CombineMap;
    ///
    /// let mut map = CombineMap::new();
    /// map.next([("a", None)]).next([("a", Some(5.0))]);
    /// assert_eq!(map.get("a"), Some(Some(5.0)));
    ///
    /// map.next([("a", None), ("b", None)]);
    /// assert_eq!(map.get("a"), Some(Some(5.0)));
    /// assert_eq!(map.get("b"), Some(None));
    /// assert_eq!(map.get("c"), None);
    /// ```
    pub fn next<I>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Option<T>)>,
    {
        entries
            .into_iter()
            .for_each(|(key, value)| self.add(key, value));
        self
    }

    /// Folds a partial aggregate from a sibling shard into the table
    ///
    /// # Arguments
    ///
    /// * `partial` - The partial aggregate
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The aggregate
    ///
    /// # Examples
    ///
    /// ```
    /// use udaf_statistics::CombineMap;
    ///
    /// let mut a = CombineMap::new();
    /// a.next([("a", Some(6.0)), ("b", Some(8.0))]);
    /// let mut b = CombineMap::new();
    /// b.next([("a", Some(10.0)), ("c", Some(12.0))]);
    ///
    /// a.merge(b.partial());
    /// assert_eq!(a.get("a"), Some(Some(16.0)));
    /// assert_eq!(a.get("b"), Some(Some(8.0)));
    /// assert_eq!(a.get("c"), Some(Some(12.0)));
    /// ```
    pub fn merge(&mut self, partial: ValueMap<K, T>) -> &mut Self {
        tracing::trace!(entries = partial.len(), "merging map partial");
        self.next(partial)
    }

    /// Returns the current value of a key
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    ///
    /// # Returns
    ///
    /// * `Option<Option<T>>` - `None` if the key was never seen, `Some(None)` for a
    ///   null marker, otherwise the running sum
    pub fn get<Q>(&self, key: &Q) -> Option<Option<T>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.table
            .get(key)
            .map(|slot| slot.as_ref().map(|sum| sum.total()))
    }

    /// Returns `true` if the key was seen, with or without a value
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.table.contains_key(key)
    }

    /// Returns the number of keys seen
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no key was seen
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns an iterator over keys and their current values
    pub fn iter(&self) -> impl Iterator<Item = (&K, Option<T>)> {
        self.table
            .iter()
            .map(|(key, slot)| (key, slot.as_ref().map(|sum| sum.total())))
    }

    /// Returns a snapshot of the table for a downstream merge
    ///
    /// # Returns
    ///
    /// * `ValueMap<K, T>` - The partial aggregate
    pub fn partial(&self) -> ValueMap<K, T>
    where
        K: Clone,
    {
        self.iter().map(|(key, value)| (key.clone(), value)).collect()
    }

    /// Consumes the aggregate and returns the combined mapping
    ///
    /// # Returns
    ///
    /// * `ValueMap<K, T>` - Sum per key, `None` for keys that only ever had nulls
    pub fn into_map(self) -> ValueMap<K, T> {
        self.table
            .into_iter()
            .map(|(key, slot)| (key, slot.map(|sum| sum.total())))
            .collect()
    }
}

impl<K, T> Aggregate for CombineMap<K, T>
where
    K: Eq + Hash + Clone,
    T: Float + Default,
{
    /// A null row carries no mapping and is skipped
    type Input = Option<ValueMap<K, T>>;
    type Partial = ValueMap<K, T>;
    type Output = ValueMap<K, T>;

    fn iterate(&mut self, input: Self::Input) {
        if let Some(entries) = input {
            self.next(entries);
        }
    }

    fn terminate_partial(&self) -> Self::Partial {
        self.partial()
    }

    fn merge(&mut self, partial: Self::Partial) {
        CombineMap::merge(self, partial);
    }

    fn terminate(self) -> Self::Output {
        self.into_map()
    }

    fn reset(&mut self) {
        CombineMap::reset(self);
    }
}
