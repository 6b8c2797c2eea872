//! Transformer registries fixed to one peer's schema versions.
//!
//! An [`OperationTransformerRegistry`] is the output of
//! [`GlobalTransformerRegistry::resolve`](crate::GlobalTransformerRegistry::resolve):
//! the same address tree with the version dimension flattened away. The relay
//! path queries it once per operation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mast_model::{OperationRequest, PathAddress, PathElement};
use mast_registry::tree::segment_values;
use mast_registry::{CowMap, Subregistry};

use crate::entry::{OperationTransformerEntry, TransformedOperation};

pub(crate) struct ResolvedNode {
	operations: CowMap<Box<str>, OperationTransformerEntry>,
	/// Set when the resource was discarded at the resolved version; covers
	/// this node and any deeper address with nothing of its own registered.
	discarded: AtomicBool,
	children: CowMap<Box<str>, Arc<Subregistry<Arc<ResolvedNode>>>>,
}

impl ResolvedNode {
	fn new() -> Self {
		Self {
			operations: CowMap::new(),
			discarded: AtomicBool::new(false),
			children: CowMap::new(),
		}
	}

	pub(crate) fn put_operation(&self, name: &str, entry: OperationTransformerEntry) {
		self.operations.insert(Box::from(name), entry);
	}

	pub(crate) fn mark_discarded(&self) {
		self.discarded.store(true, Ordering::Release);
	}

	pub(crate) fn child_or_create(&self, key: &str, value: &str) -> Arc<ResolvedNode> {
		let bucket = match self.children.get(key) {
			Some(existing) => existing,
			None => {
				let fresh = Arc::new(Subregistry::new());
				self.children
					.put_if_absent(Box::from(key), Arc::clone(&fresh))
					.unwrap_or(fresh)
			}
		};
		bucket.get_or_insert_with(value, || Arc::new(ResolvedNode::new()))
	}

	fn discard_default(&self) -> Option<OperationTransformerEntry> {
		self.discarded
			.load(Ordering::Acquire)
			.then(OperationTransformerEntry::discard)
	}

	/// `None` means nothing explicit anywhere along this path; the caller
	/// supplies the forward default.
	fn find(&self, address: &[PathElement], name: &str) -> Option<OperationTransformerEntry> {
		let Some((head, rest)) = address.split_first() else {
			return self.operations.get(name).or_else(|| self.discard_default());
		};
		let deeper = self.children.get(head.key()).and_then(|bucket| {
			for value in segment_values(head) {
				if let Some(found) = bucket.resolve(value, |child| child.find(rest, name)) {
					return Some(found);
				}
			}
			None
		});
		// a dead end below a discarded resource is still discarded
		deeper.or_else(|| self.discard_default())
	}
}

/// Per-address, per-operation transformation decisions for one peer.
pub struct OperationTransformerRegistry {
	root: Arc<ResolvedNode>,
}

impl OperationTransformerRegistry {
	pub(crate) fn new() -> Self {
		Self {
			root: Arc::new(ResolvedNode::new()),
		}
	}

	pub(crate) fn root(&self) -> &Arc<ResolvedNode> {
		&self.root
	}

	/// The entry governing `name` at `address`. Descent prefers the concrete
	/// child's subtree and falls back to the wildcard sibling; an address or
	/// name with nothing registered resolves to the forward default.
	pub fn resolve_operation(&self, address: &PathAddress, name: &str) -> OperationTransformerEntry {
		self.root
			.find(address.elements(), name)
			.unwrap_or_else(OperationTransformerEntry::forward)
	}

	/// Resolves and applies in one step, the way the relay path consumes
	/// this registry.
	pub fn transform_operation(&self, operation: &OperationRequest) -> TransformedOperation {
		self.resolve_operation(&operation.address, &operation.name)
			.transform(&operation.address, operation)
	}
}
