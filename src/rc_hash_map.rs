use core::hash::{BuildHasher, Hash};
use hashbrown::{
	hash_map::{DefaultHashBuilder, Entry},
	HashMap,
};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// Values shared by key and reference-counted with a `C` counter.
///
/// Released entries (count zero) are kept until [`RcHashMap::drain_released`], so a key that is released and
/// acquired again within one render pass reuses its value.
#[derive(Debug)]
pub struct RcHashMap<K, C, V, S = DefaultHashBuilder>(HashMap<K, Counted<C, V>, S>);

#[derive(Debug)]
struct Counted<C, V> {
	count: C,
	value: V,
}

impl<K, C, V> RcHashMap<K, C, V>
where
	K: Eq + Hash,
	C: CheckedAdd + CheckedSub + One + Zero,
{
	#[must_use]
	pub fn new() -> Self {
		Self(HashMap::new())
	}
}

impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Eq + Hash,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher,
{
	/// Counts one more reference to `key`, creating its value from the key if there is none yet.
	pub fn acquire(&mut self, key: K, create: impl FnOnce(&K) -> V) -> Result<&V, CountSaturatedError> {
		match self.0.entry(key) {
			Entry::Occupied(occupied) => {
				let counted = occupied.into_mut();
				counted.count = counted.count.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok(&counted.value)
			}
			Entry::Vacant(vacant) => {
				let value = create(vacant.key());
				Ok(&vacant.insert(Counted { count: C::one(), value }).value)
			}
		}
	}

	/// Counts one reference less. The value stays available until drained.
	///
	/// Returns [`None`] for unknown keys.
	pub fn release(&mut self, key: &K) -> Result<Option<&V>, CountSaturatedError> {
		match self.0.get_mut(key) {
			Some(counted) => {
				counted.count = counted.count.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				Ok(Some(&counted.value))
			}
			None => Ok(None),
		}
	}

	/// Removes every entry that has no references left.
	pub fn drain_released(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
		self.0
			.drain_filter(|_, counted| counted.count.is_zero())
			.map(|(key, counted)| (key, counted.value))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn capacity(&self) -> usize {
		self.0.capacity()
	}
}

impl<K, C, V> Default for RcHashMap<K, C, V>
where
	K: Eq + Hash,
	C: CheckedAdd + CheckedSub + One + Zero,
{
	fn default() -> Self {
		Self::new()
	}
}

/// A reference count would have over- or underflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSaturatedError;
