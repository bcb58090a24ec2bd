use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// Builds the equality predicate the table uses to match a borrowed key.
fn equivalent_key<Q, K, V>(key: &Q) -> impl Fn(&(K, V)) -> bool + '_
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    move |(k, _)| key.eq(k.borrow())
}

/// A hash map backed by the linear-probing [`HashTable`].
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Each key is
/// hashed once per operation; the table caches the hash alongside the pair,
/// so growing never rehashes keys through `S`.
///
/// # Performance Characteristics
///
/// - **Memory**: one contiguous slot array; each slot holds a tag, the cached
///   `u64` hash and the `(K, V)` pair.
/// - **Removal**: leaves a tombstone. Tombstones count toward the maximum
///   load factor (75% by default) and are purged by the next rehash, which
///   keeps the current size when the live entries are few.
/// - **Shrinking**: never implicit; call [`HashMap::shrink_to_fit`].
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashMap;
///
/// let mut scores: HashMap<_, _> = HashMap::new();
/// scores.insert("alice", 10);
/// scores.insert("bob", 7);
///
/// *scores.entry("bob").or_insert(0) += 1;
///
/// assert_eq!(scores["bob"], 8);
/// assert_eq!(scores.remove("alice"), Some(10));
/// assert_eq!(scores.len(), 1);
/// ```
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K: Clone, V: Clone, S: Clone> Clone for HashMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates a new hash map with room for at least `capacity` slots and the
    /// given hasher builder.
    ///
    /// The slot count is rounded up to a power of two; `0` selects the
    /// default capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Fallible form of [`HashMap::with_capacity_and_hasher`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a zero capacity and
    /// [`Error::CapacityOverflow`] if the capacity cannot be rounded up to a
    /// power of two.
    pub fn try_with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        Ok(Self {
            table: HashTable::try_with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns `(len + tombstones) / capacity`, the quantity the growth
    /// threshold is checked against.
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Clears the map, removing all key-value pairs and resetting the
    /// capacity to the one the map was created with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::with_capacity(16);
    /// for i in 0..100 {
    ///     map.insert(i, i);
    /// }
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the table to the smallest capacity that holds the current
    /// entries, never below the capacity the map was created with. Purges
    /// all tombstones.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// An iterator visiting all key-value pairs in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// let mut pairs: Vec<_> = map.iter().collect();
    /// pairs.sort();
    /// assert_eq!(pairs, vec![(&"a", &1), (&"b", &2)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// An iterator visiting all key-value pairs, with mutable references to
    /// the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// An iterator visiting all keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// An iterator visiting all values mutably.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    ///
    /// for value in map.values_mut() {
    ///     *value *= 10;
    /// }
    /// assert_eq!(map["a"], 10);
    /// assert_eq!(map["b"], 20);
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Clears the map, returning all key-value pairs as an iterator. The map
    /// keeps its capacity.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns occupancy and probe-length statistics for the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Returns the probe-length histogram of the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> hash_table::ProbeHistogram {
        self.table.probe_histogram()
    }

    /// Returns the underlying table, for slot-level inspection.
    #[cfg(any(test, feature = "stats"))]
    pub fn table(&self) -> &HashTable<(K, V)> {
        &self.table
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a key-value pair into the map.
    ///
    /// Returns the previous value if the key was present; the stored key is
    /// kept and the new one dropped. A new key may grow the table, which
    /// completes before this returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Some(old_value)
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    ///
    /// // A lookup with a fallback.
    /// assert_eq!(*map.get(&2).unwrap_or(&"none"), "none");
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and its value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, equivalent_key(key))
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, equivalent_key(key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_index(hash, equivalent_key(key))
            .is_some()
    }

    /// Removes a key from the map, returning the value if the key was
    /// present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, equivalent_key(key))
    }

    /// Removes a key from the map, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is not present. The map is
    /// left unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::Error;
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert("k", 1);
    ///
    /// assert_eq!(map.take("k"), Ok(1));
    /// assert_eq!(map.take("k"), Err(Error::KeyNotFound));
    /// ```
    pub fn take<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).ok_or(Error::KeyNotFound)
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut letters: HashMap<_, _> = HashMap::new();
    /// for ch in "a short treatise on fungi".chars() {
    ///     *letters.entry(ch).or_insert(0) += 1;
    /// }
    ///
    /// assert_eq!(letters[&'s'], 2);
    /// assert_eq!(letters[&'t'], 3);
    /// assert_eq!(letters.get(&'y'), None);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map with room for at least `capacity` slots using
    /// the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Fallible form of [`HashMap::with_capacity`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a zero capacity and
    /// [`Error::CapacityOverflow`] if the capacity cannot be rounded up to a
    /// power of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::Error;
    /// # use probe_hash::HashMap;
    /// #
    /// let map: HashMap<u32, u32> = HashMap::try_with_capacity(10).unwrap();
    /// assert_eq!(map.capacity(), 16);
    ///
    /// let err = HashMap::<u32, u32>::try_with_capacity(0).unwrap_err();
    /// assert_eq!(err, Error::InvalidCapacity(0));
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        Self::try_with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|v| *value == *v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for HashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Returns a reference to the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in HashMap"),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        // Duplicate keys are likely when extending a non-empty map.
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(reserve);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V> {
    inner: hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V> {
    inner: hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;
    use core::hash::BuildHasherDefault;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::hash_table::MAX_LOAD_DENOMINATOR;
    use crate::hash_table::MAX_LOAD_NUMERATOR;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Hashes a `u64` key to itself, so tests can pick home slots.
    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                self.0 = self.0.rotate_left(8) ^ byte as u64;
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    type IdentityState = BuildHasherDefault<IdentityHasher>;

    fn slot_of<V, S>(map: &HashMap<u64, V, S>, key: u64) -> Option<usize> {
        map.table.find_index(key, |(k, _)| *k == key)
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);

        let map2: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_with_capacity() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::with_capacity(100);
        assert_eq!(map.capacity(), 128);
        assert!(map.is_empty());

        let map: HashMap<i32, String, SipHashBuilder> = HashMap::with_capacity(0);
        assert_eq!(map.capacity(), crate::hash_table::DEFAULT_CAPACITY);
    }

    #[test]
    fn test_try_with_capacity() {
        let map: Result<HashMap<i32, i32, SipHashBuilder>> = HashMap::try_with_capacity(0);
        assert_eq!(map.err(), Some(Error::InvalidCapacity(0)));

        let map: Result<HashMap<i32, i32, SipHashBuilder>> =
            HashMap::try_with_capacity(usize::MAX);
        assert_eq!(map.err(), Some(Error::CapacityOverflow));

        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::try_with_capacity(8).unwrap();
        assert_eq!(map.capacity(), 8);
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "one".to_string()), None);
        assert_eq!(map.insert(2, "two".to_string()), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.get(&1), Some(&"one".to_string()));
        assert_eq!(map.get(&2), Some(&"two".to_string()));
        assert_eq!(map.get(&3), None);

        assert_eq!(map.insert(1, "ONE".to_string()), Some("one".to_string()));
        assert_eq!(map.get(&1), Some(&"ONE".to_string()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, 10);

        if let Some(value) = map.get_mut(&1) {
            *value = 20;
        }
        assert_eq!(map.get(&1), Some(&20));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_get_key_value() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert("key".to_string(), 5);

        assert_eq!(map.get_key_value("key"), Some((&"key".to_string(), &5)));
        assert_eq!(map.get_key_value("other"), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "value");

        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_remove() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");
        map.insert(2, "two");

        assert_eq!(map.remove(&1), Some("one"));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");

        assert_eq!(map.remove_entry(&1), Some((1, "one")));
        assert!(map.is_empty());
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_take() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");

        assert_eq!(map.take(&1), Ok("one"));
        assert_eq!(map.take(&1), Err(Error::KeyNotFound));
        assert!(map.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..100 {
            map.insert(i, i * 2);
        }
        map.remove(&0);
        assert!(map.capacity() > crate::hash_table::DEFAULT_CAPACITY);

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), crate::hash_table::DEFAULT_CAPACITY);
        assert_eq!(map.table.tombstones(), 0);
        assert_eq!(map.iter().count(), 0);
        for i in 0..100 {
            assert!(!map.contains_key(&i));
        }

        // The map stays usable.
        map.insert(5, 5);
        assert_eq!(map.get(&5), Some(&5));
    }

    #[test]
    fn test_reserve() {
        let mut map: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        map.reserve(100);
        let capacity = map.capacity();
        assert!(capacity >= 100);

        for i in 0..100 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut map: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        for i in 0..1000 {
            map.insert(i, i);
        }
        for i in 4..1000 {
            map.remove(&i);
        }
        let before = map.capacity();

        map.shrink_to_fit();
        assert!(map.capacity() < before);
        assert_eq!(map.table.tombstones(), 0);
        for i in 0..4 {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_entry_api() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        let value = map.entry(1).or_insert("default");
        assert_eq!(*value, "default");

        let value = map.entry(1).or_insert("other");
        assert_eq!(*value, "default");

        let value = map.entry(2).or_insert_with(|| "computed");
        assert_eq!(*value, "computed");

        map.entry(1).and_modify(|v| *v = "modified");
        assert_eq!(map.get(&1), Some(&"modified"));

        // and_modify on a vacant entry leaves it vacant.
        map.entry(3).and_modify(|v| *v = "never");
        assert!(!map.contains_key(&3));
        assert_eq!(map.entry(3).key(), &3);
    }

    #[test]
    fn test_entry_or_default() {
        let mut map: HashMap<i32, Vec<i32>, SipHashBuilder> = HashMap::new();

        map.entry(1).or_default().push(42);
        map.entry(1).or_default().push(43);

        assert_eq!(map.get(&1), Some(&vec![42, 43]));
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"one");

                *entry.get_mut() = "ONE";
                assert_eq!(entry.get(), &"ONE");

                let old_value = entry.insert("new");
                assert_eq!(old_value, "ONE");
                assert_eq!(entry.get(), &"new");
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        match map.entry(1) {
            Entry::Occupied(entry) => assert_eq!(entry.remove_entry(), (1, "new")),
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map: HashMap<i32, &str, SipHashBuilder> = HashMap::new();

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);
                let value = entry.insert("inserted");
                assert_eq!(*value, "inserted");
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        match map.entry(2) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), 2),
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_iterators() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");
        map.insert(2, "two");
        map.insert(3, "three");

        let mut pairs: Vec<_> = map.iter().collect();
        pairs.sort_by_key(|(k, _)| **k);
        assert_eq!(pairs, vec![(&1, &"one"), (&2, &"two"), (&3, &"three")]);
        assert_eq!(map.iter().len(), 3);

        let mut keys: Vec<_> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 3]);

        let mut values: Vec<_> = map.values().copied().collect();
        values.sort_unstable();
        assert_eq!(values, vec!["one", "three", "two"]);

        let mut borrowed = 0;
        for (k, _) in &map {
            borrowed += k;
        }
        assert_eq!(borrowed, 6);
    }

    #[test]
    fn test_mutable_iterators() {
        let mut map: HashMap<i32, i32, SipHashBuilder> = (0..10).map(|i| (i, i)).collect();

        for (k, v) in &mut map {
            *v += k;
        }
        for v in map.values_mut() {
            *v += 1;
        }
        for i in 0..10 {
            assert_eq!(map[&i], i * 2 + 1);
        }
    }

    #[test]
    fn test_into_iter() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..20 {
            map.insert(i, i * 10);
        }
        map.remove(&7);

        let mut pairs: Vec<(i32, i32)> = map.into_iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs.len(), 19);
        assert!(!pairs.contains(&(7, 70)));
        assert!(pairs.contains(&(19, 190)));
    }

    #[test]
    fn test_drain() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");
        map.insert(2, "two");
        let capacity = map.capacity();

        let mut drained: Vec<_> = map.drain().collect();
        drained.sort_by_key(|(k, _)| *k);

        assert_eq!(drained, vec![(1, "one"), (2, "two")]);
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn test_multiple_insertions() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            assert_eq!(map.insert(i, i * 2), None);
        }
        assert_eq!(map.len(), 1000);
        assert!(map.capacity().is_power_of_two());

        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
        for i in 0..1000 {
            assert_eq!(map.remove(&i), Some(i * 2));
        }
        assert!(map.is_empty());
        for i in 0..1000 {
            assert!(!map.contains_key(&i));
        }
    }

    #[test]
    fn test_collision_handling() {
        let mut map: HashMap<u64, &str, IdentityState> = HashMap::with_capacity(8);
        map.insert(3, "three");
        map.insert(11, "eleven");

        assert_eq!(slot_of(&map, 3), Some(3));
        assert_eq!(slot_of(&map, 11), Some(4));
        assert_eq!(map.get(&3), Some(&"three"));
        assert_eq!(map.get(&11), Some(&"eleven"));
    }

    #[test]
    fn test_lookup_through_tombstone() {
        let mut map: HashMap<u64, &str, IdentityState> = HashMap::with_capacity(8);
        map.insert(3, "three");
        map.insert(11, "eleven");
        map.remove(&3);

        assert_eq!(map.get(&11), Some(&"eleven"));
        assert!(!map.contains_key(&3));

        // Overwriting 11 must find it past the tombstone, not duplicate it.
        assert_eq!(map.insert(11, "ELEVEN"), Some("eleven"));
        assert_eq!(map.len(), 1);
        assert_eq!(slot_of(&map, 11), Some(4));

        // A fresh key with the same home reuses the tombstone.
        map.insert(19, "nineteen");
        assert_eq!(slot_of(&map, 19), Some(3));
        assert_eq!(map.table.tombstones(), 0);
    }

    #[test]
    #[cfg(not(any(
        feature = "max-load-sixty-two-point-five",
        feature = "max-load-eighty-seven-point-five"
    )))]
    fn test_seventh_key_grows_table() {
        let mut map: HashMap<u64, u64, IdentityState> = HashMap::with_capacity(8);
        for k in 0..6 {
            map.insert(k, k);
        }
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.load_factor(), 0.75);

        map.insert(6, 6);
        assert_eq!(map.capacity(), 16);
        for k in 0..7 {
            assert_eq!(map.get(&k), Some(&k));
        }
    }

    #[test]
    fn test_load_stays_under_threshold() {
        let mut map: HashMap<u64, u64, SipHashBuilder> = HashMap::new();
        let threshold = MAX_LOAD_NUMERATOR as f64 / MAX_LOAD_DENOMINATOR as f64;
        for k in 0..5000 {
            map.insert(k, k);
            if k % 3 == 0 {
                map.remove(&(k / 2));
            }
            assert!(map.load_factor() <= threshold);
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_churn_does_not_grow() {
        let mut map: HashMap<u64, u64, SipHashBuilder> = HashMap::new();
        map.insert(u64::MAX, 0);

        for k in 0..100_000 {
            map.insert(k, k);
            assert_eq!(map.remove(&k), Some(k));
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.capacity(), crate::hash_table::DEFAULT_CAPACITY);
        assert_eq!(map.get(&u64::MAX), Some(&0));
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let mut map: HashMap<u64, u64, IdentityState> = HashMap::with_capacity(8);
        for k in 0..4 {
            map.insert(k, k);
        }
        for _ in 0..100 {
            map.insert(2, 0);
        }
        assert_eq!(map.len(), 4);
        assert_eq!(map.capacity(), 8);
    }

    #[test]
    fn test_string_keys() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);

        assert_eq!(map.get("hello"), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map["world"], 2);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn test_index_missing_key_panics() {
        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        let _value = map[&1];
    }

    #[test]
    fn test_default_trait() {
        let map: HashMap<i32, String, SipHashBuilder> = Default::default();
        assert!(map.is_empty());
    }

    #[test]
    fn test_debug_renders_map() {
        let mut map: HashMap<u64, &str, IdentityState> = HashMap::with_capacity(8);
        map.insert(2, "b");
        map.insert(1, "a");

        assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);

        let empty: HashMap<u64, &str, IdentityState> = HashMap::new();
        assert_eq!(format!("{empty:?}"), "{}");
    }

    #[test]
    fn test_equality() {
        let a: HashMap<i32, i32, SipHashBuilder> = (0..50).map(|i| (i, i)).collect();
        let mut b: HashMap<i32, i32, SipHashBuilder> = (0..50).rev().map(|i| (i, i)).collect();
        assert_eq!(a, b);

        b.insert(0, 100);
        assert_ne!(a, b);

        b.insert(0, 0);
        b.insert(50, 50);
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        original.insert(1, "one".to_string());

        let cloned = original.clone();
        original.insert(1, "changed".to_string());

        assert_eq!(cloned.get(&1), Some(&"one".to_string()));
        assert_eq!(original.get(&1), Some(&"changed".to_string()));
    }

    #[test]
    fn test_extend_overwrites() {
        let mut map: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        map.extend([(1, 1), (2, 2)]);
        map.extend([(2, 20), (3, 30)]);

        assert_eq!(map.len(), 3);
        assert_eq!(map[&2], 20);
        assert_eq!(map[&3], 30);
    }

    #[test]
    fn test_complex_values() {
        #[derive(Debug, Clone, PartialEq)]
        struct ComplexValue {
            id: u32,
            name: String,
            data: Vec<i32>,
        }

        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        let value = ComplexValue {
            id: 1,
            name: "test".to_string(),
            data: vec![1, 2, 3],
        };

        map.insert("key1", value.clone());
        assert_eq!(map.get(&"key1"), Some(&value));

        if let Some(v) = map.get_mut(&"key1") {
            v.data.push(4);
        }
        assert_eq!(map.get(&"key1").unwrap().data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_stats_through_map() {
        let mut map: HashMap<u64, u64, IdentityState> = HashMap::with_capacity(8);
        map.insert(3, 0);
        map.insert(11, 0);

        assert_eq!(map.probe_histogram().bins(), &[1, 1]);
        let stats = map.debug_stats();
        assert_eq!(stats.populated, 2);
        assert_eq!(stats.capacity, map.table().capacity());
    }
}
