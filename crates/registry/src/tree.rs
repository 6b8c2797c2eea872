//! The generic copy-on-write value tree underlying the registration,
//! transformer, and notification registries.
//!
//! A [`Subregistry`] is one child-type bucket of a tree node: a snapshot map
//! from child value (with `*` as the wildcard slot) to the node registered
//! there. The wildcard/concrete coexistence rules live here so every address
//! tree descends through the same implementation.

use std::sync::Arc;

use mast_model::{PathElement, PathValue, WILDCARD};
use rustc_hash::FxHashMap as HashMap;
use smallvec::{SmallVec, smallvec};

use crate::cow::CowMap;

/// One child-type bucket keyed by child value.
pub struct Subregistry<N> {
	entries: CowMap<Box<str>, N>,
}

impl<N: Clone> Subregistry<N> {
	pub fn new() -> Self {
		Self {
			entries: CowMap::new(),
		}
	}

	#[inline]
	pub fn get(&self, value: &str) -> Option<N> {
		self.entries.get(value)
	}

	/// The node in the wildcard slot, if any.
	#[inline]
	pub fn wildcard(&self) -> Option<N> {
		self.entries.get(WILDCARD)
	}

	/// The concrete child when present, the wildcard slot otherwise.
	pub fn get_or_wildcard(&self, value: &str) -> Option<N> {
		let snap = self.entries.snapshot();
		snap.get(value).or_else(|| snap.get(WILDCARD)).cloned()
	}

	#[inline]
	pub fn snapshot(&self) -> Arc<HashMap<Box<str>, N>> {
		self.entries.snapshot()
	}

	/// Registers a node at a value slot. Two registrations at the same slot
	/// are a contract violation, never merged: the existing node comes back
	/// as the error.
	pub fn register(&self, value: &str, node: N) -> Result<(), N> {
		match self.entries.put_if_absent(Box::from(value), node) {
			None => Ok(()),
			Some(existing) => Err(existing),
		}
	}

	/// Create-if-absent that adopts the winner of a benign creation race.
	pub fn get_or_insert_with(&self, value: &str, make: impl FnOnce() -> N) -> N {
		if let Some(existing) = self.entries.get(value) {
			return existing;
		}
		let fresh = make();
		self.entries
			.put_if_absent(Box::from(value), fresh.clone())
			.unwrap_or(fresh)
	}

	pub fn remove(&self, value: &str) -> Option<N> {
		self.entries.remove(value)
	}

	/// Removes the slot only while its node satisfies `accept`, so typed
	/// unregistration never takes out an unrelated node kind.
	pub fn remove_if(&self, value: &str, accept: impl Fn(&N) -> bool) -> Option<N> {
		self.entries.remove_if(value, accept)
	}

	/// Single-result descent step. The concrete child's whole subtree is
	/// queried first; only if it yields nothing is the query retried against
	/// the wildcard sibling, so a concrete result always wins a tie.
	pub fn resolve<R>(&self, value: &str, mut query: impl FnMut(&N) -> Option<R>) -> Option<R> {
		let snap = self.entries.snapshot();
		if let Some(node) = snap.get(value) {
			if let Some(found) = query(node) {
				return Some(found);
			}
		}
		if value != WILDCARD {
			if let Some(node) = snap.get(WILDCARD) {
				return query(node);
			}
		}
		None
	}

	/// Enumeration descent step: the wildcard subtree is visited before the
	/// concrete one, so concrete results overwrite wildcard results of the
	/// same key in the caller's accumulator.
	pub fn each_match(&self, value: &str, mut visit: impl FnMut(&N)) {
		let snap = self.entries.snapshot();
		if value != WILDCARD {
			if let Some(node) = snap.get(WILDCARD) {
				visit(node);
			}
		}
		if let Some(node) = snap.get(value) {
			visit(node);
		}
	}
}

impl<N: Clone> Default for Subregistry<N> {
	fn default() -> Self {
		Self::new()
	}
}

/// The value slots an address segment matches during descent: one slot for
/// concrete and wildcard segments, each listed value for multi-target
/// segments.
pub fn segment_values(element: &PathElement) -> SmallVec<[&str; 1]> {
	match element.value() {
		PathValue::Concrete(value) => smallvec![value.as_str()],
		PathValue::Wildcard => smallvec![WILDCARD],
		PathValue::Multi(values) => values.iter().map(String::as_str).collect(),
	}
}
