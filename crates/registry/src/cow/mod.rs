//! Copy-on-write collections behind atomic snapshot references.
//!
//! Reads load the current snapshot and never block or observe a partial
//! update. Writes rebuild the whole snapshot and install it with
//! compare-and-swap, retrying the read-build-swap sequence when another
//! writer got there first. The raw compare-and-swap never leaks out of this
//! module.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;


/// A hash map whose current state is one immutable snapshot.
pub struct CowMap<K, V> {
	snap: ArcSwap<HashMap<K, V>>,
}

impl<K, V> CowMap<K, V>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	pub fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(HashMap::default()),
		}
	}

	/// The current snapshot, safe to iterate without further loads.
	#[inline]
	pub fn snapshot(&self) -> Arc<HashMap<K, V>> {
		self.snap.load_full()
	}

	#[inline]
	pub fn get<Q>(&self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Eq + Hash + ?Sized,
	{
		self.snap.load().get(key).cloned()
	}

	#[inline]
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Eq + Hash + ?Sized,
	{
		self.snap.load().contains_key(key)
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.snap.load().len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.snap.load().is_empty()
	}

	/// Inserts only if the key is absent. Returns the pre-existing value on
	/// conflict, `None` on success. Losing a creation race to another writer
	/// of the same key returns that writer's value, so both callers observe
	/// one winner.
	pub fn put_if_absent(&self, key: K, value: V) -> Option<V> {
		loop {
			let cur = self.snap.load_full();
			if let Some(existing) = cur.get(&key) {
				return Some(existing.clone());
			}
			let mut next = HashMap::clone(&cur);
			next.insert(key.clone(), value.clone());
			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return None;
			}
			// another writer raced us; retry against the new snapshot
		}
	}

	/// Inserts unconditionally, returning the previous value if any.
	pub fn insert(&self, key: K, value: V) -> Option<V> {
		loop {
			let cur = self.snap.load_full();
			let mut next = HashMap::clone(&cur);
			let previous = next.insert(key.clone(), value.clone());
			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return previous;
			}
		}
	}

	pub fn remove<Q>(&self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Eq + Hash + ?Sized,
	{
		self.remove_if(key, |_| true)
	}

	/// Removes the key only while its current value satisfies `accept`,
	/// atomically with respect to concurrent writers.
	pub fn remove_if<Q>(&self, key: &Q, accept: impl Fn(&V) -> bool) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Eq + Hash + ?Sized,
	{
		loop {
			let cur = self.snap.load_full();
			match cur.get(key) {
				None => return None,
				Some(existing) if !accept(existing) => return None,
				Some(_) => {}
			}
			let mut next = HashMap::clone(&cur);
			let removed = next.remove(key);
			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return removed;
			}
		}
	}

	/// Resets to an explicit empty snapshot, never a null reference.
	pub fn clear(&self) {
		self.snap.store(Arc::new(HashMap::default()));
	}
}

impl<K, V> Default for CowMap<K, V>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	fn default() -> Self {
		Self::new()
	}
}

/// A list with the same snapshot-and-swap discipline as [`CowMap`].
pub struct CowVec<T> {
	snap: ArcSwap<Vec<T>>,
}

impl<T: Clone> CowVec<T> {
	pub fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(Vec::new()),
		}
	}

	#[inline]
	pub fn snapshot(&self) -> Arc<Vec<T>> {
		self.snap.load_full()
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.snap.load().len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.snap.load().is_empty()
	}

	pub fn push(&self, item: T) {
		loop {
			let cur = self.snap.load_full();
			let mut next = Vec::clone(&cur);
			next.push(item.clone());
			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return;
			}
		}
	}

	/// Keeps only the items `keep` accepts.
	pub fn retain(&self, keep: impl Fn(&T) -> bool) {
		loop {
			let cur = self.snap.load_full();
			let next: Vec<T> = cur.iter().filter(|item| keep(item)).cloned().collect();
			if next.len() == cur.len() {
				return;
			}
			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return;
			}
		}
	}
}

impl<T: Clone> Default for CowVec<T> {
	fn default() -> Self {
		Self::new()
	}
}
