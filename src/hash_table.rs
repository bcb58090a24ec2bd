use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::mem;

use crate::error::Error;
use crate::error::Result;

/// Number of slots allocated when no capacity is requested.
pub const DEFAULT_CAPACITY: usize = 8;

/// Denominator of the maximum load factor. The numerator is selected by the
/// `max-load-*` cargo features; without any of them the threshold is 6/8.
pub const MAX_LOAD_DENOMINATOR: usize = 8;

cfg_if::cfg_if! {
    if #[cfg(feature = "max-load-sixty-two-point-five")] {
        /// Numerator of the maximum load factor (5/8).
        pub const MAX_LOAD_NUMERATOR: usize = 5;
    } else if #[cfg(feature = "max-load-eighty-seven-point-five")] {
        /// Numerator of the maximum load factor (7/8).
        pub const MAX_LOAD_NUMERATOR: usize = 7;
    } else {
        /// Numerator of the maximum load factor (6/8).
        pub const MAX_LOAD_NUMERATOR: usize = 6;
    }
}

/// Returns true if `used` slots (live entries plus tombstones) out of
/// `capacity` is over the maximum load factor.
#[inline(always)]
fn exceeds_max_load(used: usize, capacity: usize) -> bool {
    used as u128 * MAX_LOAD_DENOMINATOR as u128 > capacity as u128 * MAX_LOAD_NUMERATOR as u128
}

/// Smallest power of two `>= floor` that holds `required` live entries
/// without exceeding the maximum load factor.
#[inline]
fn capacity_for(required: usize, floor: usize) -> usize {
    let mut capacity = floor;
    while exceeds_max_load(required, capacity) {
        capacity = match capacity.checked_mul(2) {
            Some(capacity) => capacity,
            None => capacity_overflow(),
        };
    }
    capacity
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Occupied { hash: u64, value: V },
    Tombstone,
}

fn empty_slots<V>(capacity: usize) -> Box<[Slot<V>]> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots.into_boxed_slice()
}

/// Outcome of walking a probe sequence for insertion.
enum Probe {
    /// The matching value lives at this index.
    Found(usize),
    /// The value is absent; this is the slot it should be written to.
    Vacant(usize),
}

/// Debug statistics for hash table analysis.
///
/// Available with the `stats` feature (and always under `cfg(test)`).
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Number of tombstoned slots
    pub tombstones: usize,
    /// Total number of slots allocated
    pub capacity: usize,
    /// Number of slots that have never been used since the last rehash
    pub empty_slots: usize,
    /// (populated + tombstones) / capacity
    pub load_factor: f64,
    /// Longest distance between an entry and its home slot
    pub max_probe: usize,
    /// Mean distance between an entry and its home slot
    pub mean_probe: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {} live, {} tombstones in {} slots ({:.2}% load factor)",
            self.populated,
            self.tombstones,
            self.capacity,
            self.load_factor * 100.0
        );
        println!("Empty slots: {}", self.empty_slots);
        println!(
            "Probe length: max {}, mean {:.3}",
            self.max_probe, self.mean_probe
        );
    }
}

/// Histogram of probe lengths: bin `d` counts live entries stored `d` slots
/// after their home slot.
///
/// Available with the `stats` feature (and always under `cfg(test)`).
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    bins: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Returns the histogram bins, indexed by probe length.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "probe histogram ({} entries):",
            self.bins.iter().sum::<usize>()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            match units % 8 {
                0 => {}
                1 => bar.push('▏'),
                2 => bar.push('▎'),
                3 => bar.push('▍'),
                4 => bar.push('▌'),
                5 => bar.push('▋'),
                6 => bar.push('▊'),
                _ => bar.push('▉'),
            }
            bar
        };

        for (distance, &count) in self.bins.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// An open-addressing hash table using linear probing with tombstones.
///
/// `HashTable<V>` stores values of type `V` in a single power-of-two sized
/// array of slots. Like a raw table, it does not hash anything itself: every
/// operation takes the value's 64-bit hash and an equality predicate. The
/// hash is cached next to each value, so rehashing never calls back into user
/// code.
///
/// ## Algorithm
///
/// - A value's home slot is `hash & (capacity - 1)`. Collisions continue to
///   the next slot, wrapping at the end of the array.
/// - Removal leaves a tombstone so that probe sequences passing through the
///   slot stay intact. Lookups skip tombstones; insertion reuses the first
///   tombstone on the probe path.
/// - The load factor counts live entries and tombstones. Once an insertion
///   pushes it over the maximum, every live entry is rehashed into a fresh
///   array, which also discards all tombstones. The array doubles unless the
///   live entries alone fill at most half the threshold, in which case it is
///   rebuilt at the same size. Nothing else compacts tombstones, so
///   delete/insert churn below the threshold lengthens probes until the next
///   rehash.
///
/// ## Hash consistency
///
/// The caller must pass the same hash for equal values for the lifetime of
/// the table. Violations are not detected; lookups may then miss values, but
/// the table stays memory safe.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use probe_hash::hash_table::Entry;
/// # use probe_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// let hash = hash_id(123);
///
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
///
/// assert_eq!(table.find(hash, |p| p.id == 123).unwrap().name, "Alice");
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    slots: Box<[Slot<V>]>,
    populated: usize,
    tombstones: usize,
    initial_capacity: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        // One row of 16 slots per line: `..` empty, `xx` tombstone, otherwise
        // the entry's distance from its home slot.
        let rows = self
            .slots
            .chunks(16)
            .enumerate()
            .map(|(row, chunk)| {
                chunk
                    .iter()
                    .enumerate()
                    .map(|(offset, slot)| match slot {
                        Slot::Empty => "..".to_string(),
                        Slot::Tombstone => "xx".to_string(),
                        Slot::Occupied { hash, .. } => {
                            let distance = self.probe_distance(row * 16 + offset, *hash);
                            format!("{:02}", distance.min(99))
                        }
                    })
                    .collect::<Vec<String>>()
                    .join(" ")
            })
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("slots", &rows)
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("capacity", &self.slots.len())
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::DEFAULT_CAPACITY;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::new();
    /// assert_eq!(table.capacity(), DEFAULT_CAPACITY);
    /// ```
    pub fn new() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// The slot count is rounded up to the next power of two. A hint of `0`
    /// selects [`DEFAULT_CAPACITY`]. Use [`HashTable::try_with_capacity`] to
    /// reject a zero hint instead.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }
        match capacity.checked_next_power_of_two() {
            Some(capacity) => Self::allocate(capacity),
            None => capacity_overflow(),
        }
    }

    /// Creates an empty table with at least `capacity` slots, rejecting
    /// invalid requests.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] if `capacity` is zero.
    /// - [`Error::CapacityOverflow`] if rounding `capacity` up to a power of
    ///   two overflows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::Error;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::try_with_capacity(5).unwrap();
    /// assert_eq!(table.capacity(), 8);
    ///
    /// assert_eq!(
    ///     HashTable::<u32>::try_with_capacity(0).unwrap_err(),
    ///     Error::InvalidCapacity(0)
    /// );
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let capacity = capacity
            .checked_next_power_of_two()
            .ok_or(Error::CapacityOverflow)?;
        Ok(Self::allocate(capacity))
    }

    fn allocate(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: empty_slots(capacity),
            populated: 0,
            tombstones: 0,
            initial_capacity: capacity,
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline(always)]
    fn home_index(&self, hash: u64) -> usize {
        hash as usize & self.mask()
    }

    #[inline(always)]
    fn probe_distance(&self, index: usize, hash: u64) -> usize {
        index.wrapping_sub(self.home_index(hash)) & self.mask()
    }

    /// Returns the number of live values in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    ///
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no live values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of slots in the bucket array.
    ///
    /// Always a power of two. Only insertion-triggered growth,
    /// [`reserve`](HashTable::reserve), [`shrink_to_fit`](HashTable::shrink_to_fit)
    /// and [`clear`](HashTable::clear) change it.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstoned slots.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns the current load factor, `(len + tombstones) / capacity`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    /// table.entry(2, |&n: &u64| n == 2).or_insert(2);
    /// table.remove(2, |&n| n == 2);
    ///
    /// // The tombstone left by the removal still counts.
    /// assert_eq!(table.load_factor(), 0.25);
    /// ```
    pub fn load_factor(&self) -> f64 {
        (self.populated + self.tombstones) as f64 / self.slots.len() as f64
    }

    /// Locates the slot holding the value matching `hash` and `eq`.
    ///
    /// The walk starts at the home slot, skips tombstones, and stops at the
    /// first empty slot or after visiting every slot once.
    pub(crate) fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        let mask = self.mask();
        let mut index = self.home_index(hash);
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied { hash: stored, value } => {
                    if *stored == hash && eq(value) {
                        return Some(index);
                    }
                }
            }
            index = (index + 1) & mask;
        }

        None
    }

    /// Walks the probe sequence for an insertion.
    ///
    /// Tombstones do not end the walk: the value may still live further
    /// along, so only an empty slot proves it absent. The first tombstone
    /// passed is remembered and preferred as the insertion slot.
    fn probe(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Probe {
        let mask = self.mask();
        let mut index = self.home_index(hash);
        let mut first_tombstone = None;
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(index)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(index);
                }
                Slot::Occupied { hash: stored, value } => {
                    if *stored == hash && eq(value) {
                        return Probe::Found(index);
                    }
                }
            }
            index = (index + 1) & mask;
        }

        // The load factor keeps live entries and tombstones strictly below the
        // capacity, so a full walk always passed either an empty slot or a
        // tombstone.
        match first_tombstone {
            Some(index) => Probe::Vacant(index),
            None => unreachable!("probe sequence exhausted without a vacant slot"),
        }
    }

    #[inline]
    fn value(&self, index: usize) -> &V {
        match &self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    #[inline]
    fn value_mut(&mut self, index: usize) -> &mut V {
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    /// Returns a reference to the value matching `hash` and `eq`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(7, |&n| n == 7), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        Some(self.value(index))
    }

    /// Returns a mutable reference to the value matching `hash` and `eq`, if
    /// any.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        Some(self.value_mut(index))
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The slot becomes a tombstone. The table never shrinks or compacts as
    /// a result of a removal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.tombstones(), 1);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> V {
        match mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied { value, .. } => {
                self.populated -= 1;
                self.tombstones += 1;
                value
            }
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    /// Gets the entry for the given hash and equality predicate.
    ///
    /// Inserting through a [`VacantEntry`] may grow the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::Entry;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    ///
    /// match table.entry(7, |s: &String| s == "hello") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string());
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         *entry.get_mut() = "updated".to_string();
    ///     }
    /// }
    ///
    /// assert!(matches!(
    ///     table.entry(7, |s: &String| s == "hello"),
    ///     Entry::Occupied(_)
    /// ));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.probe(hash, eq) {
            Probe::Found(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Probe::Vacant(index) => Entry::Vacant(VacantEntry {
                table: self,
                hash,
                index,
            }),
        }
    }

    /// Removes all values, resetting the table to an empty bucket array of
    /// the capacity it was created with.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// for n in 0..100u64 {
    ///     table.entry(n, |&v: &u64| v == n).or_insert(n);
    /// }
    /// assert!(table.capacity() > 8);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        self.slots = empty_slots(self.initial_capacity);
        self.populated = 0;
        self.tombstones = 0;
    }

    /// Reserves room for at least `additional` more values.
    ///
    /// After this call, `additional` insertions will not trigger a resize.
    /// When a rehash is needed it also purges every tombstone.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.populated.saturating_add(additional);
        if exceeds_max_load(required.saturating_add(self.tombstones), self.slots.len()) {
            let capacity = capacity_for(required, self.slots.len());
            self.rehash(capacity, None);
        }
    }

    /// Rehashes into the smallest power-of-two capacity, no smaller than the
    /// capacity the table was created with, that holds the live values.
    ///
    /// This is the only way the bucket array ever gets smaller. It also
    /// purges every tombstone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// for n in 0..1000u64 {
    ///     table.entry(n, |&v: &u64| v == n).or_insert(n);
    /// }
    /// for n in 2..1000u64 {
    ///     table.remove(n, |&v| v == n);
    /// }
    ///
    /// table.shrink_to_fit();
    /// assert_eq!(table.capacity(), 8);
    /// assert_eq!(table.tombstones(), 0);
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let capacity = capacity_for(self.populated, self.initial_capacity);
        if capacity < self.slots.len() || self.tombstones > 0 {
            self.rehash(capacity, None);
        }
    }

    /// Rehashes after an insertion crossed the load threshold.
    ///
    /// When tombstones rather than live entries filled the table (the live
    /// count is at most half the threshold), the array is rebuilt at its
    /// current size. Otherwise it doubles.
    #[cold]
    #[inline(never)]
    fn grow(&mut self, tracked: usize) -> usize {
        let capacity = if exceeds_max_load(self.populated.saturating_mul(2), self.slots.len()) {
            match self.slots.len().checked_mul(2) {
                Some(capacity) => capacity,
                None => capacity_overflow(),
            }
        } else {
            self.slots.len()
        };
        match self.rehash(capacity, Some(tracked)) {
            Some(index) => index,
            None => unreachable!("tracked slot {tracked} was not live"),
        }
    }

    /// Moves every live value into a fresh array of `capacity` slots.
    ///
    /// Tombstones are dropped, so the tombstone count resets to zero. If
    /// `tracked` names a live slot in the old array, its index in the new
    /// array is returned.
    fn rehash(&mut self, capacity: usize, tracked: Option<usize>) -> Option<usize> {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(!exceeds_max_load(self.populated, capacity));

        let old = mem::replace(&mut self.slots, empty_slots(capacity));
        self.tombstones = 0;

        let mut relocated = None;
        for (old_index, slot) in old.into_vec().into_iter().enumerate() {
            if let Slot::Occupied { hash, value } = slot {
                let index = self.place(hash, value);
                if tracked == Some(old_index) {
                    relocated = Some(index);
                }
            }
        }

        relocated
    }

    /// Writes a value into the first empty slot of its probe sequence.
    ///
    /// Only valid while rebuilding, when the array holds no tombstones and no
    /// value equal to this one.
    fn place(&mut self, hash: u64, value: V) -> usize {
        let mask = self.mask();
        let mut index = self.home_index(hash);
        while !matches!(self.slots[index], Slot::Empty) {
            index = (index + 1) & mask;
        }
        self.slots[index] = Slot::Occupied { hash, value };
        index
    }

    /// Returns an iterator over the values in the table.
    ///
    /// Values are yielded in bucket-array order. That order is neither
    /// insertion order nor stable across a resize. Each call starts over
    /// from the first slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8);
    /// table.entry(5, |&n: &u64| n == 5).or_insert(5);
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    ///
    /// let values: Vec<u64> = table.iter().copied().collect();
    /// assert_eq!(values, vec![1, 5]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// Callers must not change a value in a way that changes its hash.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator that removes and yields all values.
    ///
    /// The table is empty as soon as `drain` returns, and keeps its current
    /// capacity with no tombstones. Values not consumed by the iterator are
    /// dropped along with it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    /// table.entry(2, |&n: &u64| n == 2).or_insert(2);
    ///
    /// let values: Vec<u64> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(values.len(), 2);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V> {
        let capacity = self.slots.len();
        let slots = mem::replace(&mut self.slots, empty_slots(capacity));
        let remaining = mem::take(&mut self.populated);
        self.tombstones = 0;

        Drain {
            inner: IntoIter {
                slots: slots.into_vec().into_iter(),
                remaining,
            },
            _table: PhantomData,
        }
    }

    /// Computes a histogram of probe lengths for the current table state.
    ///
    /// Requires the `stats` feature outside of tests.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut bins = alloc::vec![0usize; 1];
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { hash, .. } = slot {
                let distance = self.probe_distance(index, *hash);
                if distance >= bins.len() {
                    bins.resize(distance + 1, 0);
                }
                bins[distance] += 1;
            }
        }

        ProbeHistogram { bins }
    }

    /// Returns occupancy and probe-length statistics.
    ///
    /// Requires the `stats` feature outside of tests.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.probe_histogram();
        let total_probe: usize = histogram
            .bins()
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();

        DebugStats {
            populated: self.populated,
            tombstones: self.tombstones,
            capacity: self.slots.len(),
            empty_slots: self.slots.len() - self.populated - self.tombstones,
            load_factor: self.load_factor(),
            max_probe: histogram.bins().len() - 1,
            mean_probe: if self.populated == 0 {
                0.0
            } else {
                total_probe as f64 / self.populated as f64
            },
        }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - no matching value is present in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - a matching value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    ///
    /// let value = table.entry(9, |s: &String| s == "key").or_insert("key".to_string());
    /// assert_eq!(value, "key");
    ///
    /// let existing = table.entry(9, |s: &String| s == "key").or_insert("other".to_string());
    /// assert_eq!(existing, "key");
    /// ```
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry. The closure is not
    /// called for an occupied entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry's value and returns it. Returns
    /// `None` without inserting anything if the entry is vacant.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    ///
    /// let result = table.entry(42, |&n: &u64| n == 42).and_modify(|v| *v += 1);
    /// assert_eq!(result, None);
    ///
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// // The predicate still matches the stored value after the update.
    /// let result = table.entry(42, |&n: &u64| n == 42).and_modify(|v| *v = 42);
    /// assert_eq!(result, Some(&mut 42));
    /// ```
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// Holds the slot the probe chose: the first tombstone on the probe path, or
/// the empty slot that ended it.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
    index: usize,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts a value into the vacant entry and returns a mutable reference to
    /// it.
    ///
    /// If the insertion pushes the load factor over the maximum, the table
    /// rehashes before this returns (doubling, or at the same size when
    /// tombstones caused the overflow); the returned reference points at the
    /// value's new slot.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        let previous = mem::replace(
            &mut table.slots[self.index],
            Slot::Occupied {
                hash: self.hash,
                value,
            },
        );
        debug_assert!(!matches!(previous, Slot::Occupied { .. }));

        table.populated += 1;
        if matches!(previous, Slot::Tombstone) {
            table.tombstones -= 1;
        }

        let index = if exceeds_max_load(table.populated + table.tombstones, table.slots.len()) {
            table.grow(self.index)
        } else {
            self.index
        };

        table.value_mut(index)
    }
}

/// A view into an occupied entry in the hash table.
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.table.value(self.index)
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.value_mut(self.index)
    }

    /// Converts the entry into a mutable reference to the value, bound to
    /// the table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        let table = self.table;
        table.value_mut(self.index)
    }

    /// Removes the value from the table, leaving a tombstone, and returns it.
    pub fn remove(self) -> V {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

/// A mutable iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, V> {
    slots: core::slice::IterMut<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V> {
    slots: alloc::vec::IntoIter<Slot<V>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> IntoIterator for HashTable<V> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_vec().into_iter(),
            remaining: self.populated,
        }
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A draining iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V> {
    inner: IntoIter<V>,
    _table: PhantomData<&'a mut HashTable<V>>,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}
