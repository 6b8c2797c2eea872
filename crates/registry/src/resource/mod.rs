//! The resource tree: runtime-held configuration state.
//!
//! A [`Resource`] owns one model value plus named collections of named
//! children. The tree itself carries no interior synchronization; its whole
//! concurrency contract is the clone-then-publish discipline enforced by
//! ownership: mutate through `&mut` on a private clone, then make the clone
//! visible atomically through a [`ResourceRoot`]. A snapshot read can never
//! race a write because shared snapshots are immutable by type.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use mast_model::{ModelValue, PathAddress, PathElement};

use crate::error::ResourceError;


/// One node of the configuration tree: a local model value and children
/// grouped by type. Children keep registration order for stable
/// enumeration. `Clone` is a fully independent deep copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
	model: ModelValue,
	children: IndexMap<String, IndexMap<String, Resource>>,
}

impl Resource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_model(model: ModelValue) -> Self {
		Self {
			model,
			children: IndexMap::new(),
		}
	}

	#[inline]
	pub fn model(&self) -> &ModelValue {
		&self.model
	}

	#[inline]
	pub fn model_mut(&mut self) -> &mut ModelValue {
		&mut self.model
	}

	pub fn set_model(&mut self, model: ModelValue) {
		self.model = model;
	}

	/// Takes the local value, leaving undefined behind.
	pub fn take_model(&mut self) -> ModelValue {
		std::mem::take(&mut self.model)
	}

	/// The child at a concrete element; wildcard and multi-target elements
	/// never name a resource.
	pub fn get_child(&self, element: &PathElement) -> Option<&Resource> {
		let name = element.value().as_concrete()?;
		self.children.get(element.key())?.get(name)
	}

	pub fn get_child_mut(&mut self, element: &PathElement) -> Option<&mut Resource> {
		let name = element.value().as_concrete()?;
		self.children.get_mut(element.key())?.get_mut(name)
	}

	pub fn has_child(&self, element: &PathElement) -> bool {
		self.get_child(element).is_some()
	}

	pub fn require_child(&self, element: &PathElement) -> Result<&Resource, ResourceError> {
		self.get_child(element).ok_or_else(|| ResourceError::NoSuchChild {
			element: element.clone(),
		})
	}

	pub fn require_child_mut(
		&mut self,
		element: &PathElement,
	) -> Result<&mut Resource, ResourceError> {
		self.get_child_mut(element).ok_or_else(|| ResourceError::NoSuchChild {
			element: element.clone(),
		})
	}

	/// Walks the address, requiring every step.
	pub fn navigate(&self, address: &PathAddress) -> Result<&Resource, ResourceError> {
		let mut current = self;
		for element in address {
			current = current.require_child(element)?;
		}
		Ok(current)
	}

	pub fn navigate_mut(&mut self, address: &PathAddress) -> Result<&mut Resource, ResourceError> {
		let mut current = self;
		for element in address {
			current = current.require_child_mut(element)?;
		}
		Ok(current)
	}

	/// Registers a child at a concrete element. One (type, name) slot holds
	/// at most one child.
	pub fn register_child(
		&mut self,
		element: PathElement,
		resource: Resource,
	) -> Result<(), ResourceError> {
		let Some(name) = element.value().as_concrete() else {
			return Err(ResourceError::InvalidElement(
				"a resource child needs a concrete element, not a wildcard or multi-target",
			));
		};
		let bucket = self.children.entry(element.key().to_owned()).or_default();
		if bucket.contains_key(name) {
			return Err(ResourceError::DuplicateChild { element });
		}
		bucket.insert(name.to_owned(), resource);
		Ok(())
	}

	/// Removes and returns a child; absent children are a no-op.
	pub fn remove_child(&mut self, element: &PathElement) -> Option<Resource> {
		let name = element.value().as_concrete()?;
		let bucket = self.children.get_mut(element.key())?;
		let removed = bucket.shift_remove(name);
		if bucket.is_empty() {
			self.children.shift_remove(element.key());
		}
		removed
	}

	/// Child types with at least one child, in first-registration order.
	pub fn child_types(&self) -> impl Iterator<Item = &str> {
		self.children.keys().map(String::as_str)
	}

	/// Names of the children of one type, in registration order.
	pub fn children_names(&self, child_type: &str) -> impl Iterator<Item = &str> {
		self.children
			.get(child_type)
			.into_iter()
			.flat_map(|bucket| bucket.keys())
			.map(String::as_str)
	}

	/// Children of one type, each paired with the element it was registered
	/// under.
	pub fn children(&self, child_type: &str) -> impl Iterator<Item = (PathElement, &Resource)> {
		let key = child_type.to_owned();
		self.children
			.get(child_type)
			.into_iter()
			.flat_map(move |bucket| {
				let key = key.clone();
				bucket
					.iter()
					.map(move |(name, child)| (PathElement::new(key.clone(), name.clone()), child))
			})
	}
}

/// The publish point for a resource tree.
///
/// Writers clone the current tree, mutate the clone, and publish it; the
/// compare-and-swap variant lets a writer detect that another publish
/// happened since its snapshot and rebuild instead of overwriting.
pub struct ResourceRoot {
	current: ArcSwap<Resource>,
}

impl ResourceRoot {
	pub fn new(root: Resource) -> Self {
		Self {
			current: ArcSwap::from_pointee(root),
		}
	}

	/// The current tree. Holders keep a consistent snapshot regardless of
	/// later publishes.
	#[inline]
	pub fn read(&self) -> Arc<Resource> {
		self.current.load_full()
	}

	/// Unconditionally installs a new tree.
	pub fn publish(&self, next: Resource) {
		self.current.store(Arc::new(next));
	}

	/// Installs `next` only if `expected` is still the current tree.
	/// Returns false when an interleaved publish won; the caller re-reads
	/// and rebuilds.
	pub fn publish_if_unchanged(&self, expected: &Arc<Resource>, next: Resource) -> bool {
		let prev = self.current.compare_and_swap(expected, Arc::new(next));
		Arc::ptr_eq(&prev, expected)
	}
}

impl Default for ResourceRoot {
	fn default() -> Self {
		Self::new(Resource::new())
	}
}
