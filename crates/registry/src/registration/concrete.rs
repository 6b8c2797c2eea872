//! Storage for a concrete registration node.
//!
//! All mutation in the registration tree lands here; alias and proxy nodes
//! carry no registration state of their own. Every map is copy-on-write, so
//! lookups running concurrently with registration see either the old or the
//! new snapshot, never a partial write.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::FxHashMap as HashMap;

use super::RegNode;
use crate::cow::CowMap;
use crate::entry::{AttributeAccess, OperationEntry};
use crate::handler::DescriptionProvider;
use crate::tree::Subregistry;

pub(crate) struct ConcreteNode {
	description: Arc<dyn DescriptionProvider>,
	runtime_only: AtomicBool,
	immutable: bool,
	children: CowMap<Box<str>, Arc<Subregistry<Arc<RegNode>>>>,
	operations: CowMap<Box<str>, Arc<OperationEntry>>,
	attributes: CowMap<Box<str>, Arc<AttributeAccess>>,
}

impl ConcreteNode {
	pub(crate) fn new(
		description: Arc<dyn DescriptionProvider>,
		runtime_only: bool,
		immutable: bool,
	) -> Self {
		Self {
			description,
			runtime_only: AtomicBool::new(runtime_only),
			immutable,
			children: CowMap::new(),
			operations: CowMap::new(),
			attributes: CowMap::new(),
		}
	}

	#[inline]
	pub(crate) fn description(&self) -> &Arc<dyn DescriptionProvider> {
		&self.description
	}

	#[inline]
	pub(crate) fn is_runtime_only(&self) -> bool {
		self.runtime_only.load(Ordering::Acquire)
	}

	pub(crate) fn set_runtime_only(&self, runtime_only: bool) {
		self.runtime_only.store(runtime_only, Ordering::Release);
	}

	#[inline]
	pub(crate) fn is_immutable(&self) -> bool {
		self.immutable
	}

	#[inline]
	pub(crate) fn child_bucket(&self, key: &str) -> Option<Arc<Subregistry<Arc<RegNode>>>> {
		self.children.get(key)
	}

	/// The child-type bucket, created if absent. Two threads racing to
	/// create the same bucket both end up with the winner's.
	pub(crate) fn child_bucket_or_create(&self, key: &str) -> Arc<Subregistry<Arc<RegNode>>> {
		if let Some(existing) = self.children.get(key) {
			return existing;
		}
		let fresh = Arc::new(Subregistry::new());
		self.children
			.put_if_absent(Box::from(key), Arc::clone(&fresh))
			.unwrap_or(fresh)
	}

	#[inline]
	pub(crate) fn children_snapshot(&self) -> Arc<HashMap<Box<str>, Arc<Subregistry<Arc<RegNode>>>>> {
		self.children.snapshot()
	}

	#[inline]
	pub(crate) fn local_operation(&self, name: &str) -> Option<Arc<OperationEntry>> {
		self.operations.get(name)
	}

	/// The local entry for `name` if it is flagged to flow down to
	/// descendants.
	pub(crate) fn inheritable_operation(&self, name: &str) -> Option<Arc<OperationEntry>> {
		self.operations.get(name).filter(|entry| entry.is_inherited())
	}

	pub(crate) fn register_operation(
		&self,
		name: &str,
		entry: Arc<OperationEntry>,
	) -> Result<(), Arc<OperationEntry>> {
		match self.operations.put_if_absent(Box::from(name), entry) {
			None => Ok(()),
			Some(existing) => Err(existing),
		}
	}

	pub(crate) fn unregister_operation(&self, name: &str) -> Option<Arc<OperationEntry>> {
		self.operations.remove(name)
	}

	#[inline]
	pub(crate) fn operations_snapshot(&self) -> Arc<HashMap<Box<str>, Arc<OperationEntry>>> {
		self.operations.snapshot()
	}

	#[inline]
	pub(crate) fn attribute(&self, name: &str) -> Option<Arc<AttributeAccess>> {
		self.attributes.get(name)
	}

	pub(crate) fn register_attribute(
		&self,
		name: &str,
		access: Arc<AttributeAccess>,
	) -> Result<(), Arc<AttributeAccess>> {
		match self.attributes.put_if_absent(Box::from(name), access) {
			None => Ok(()),
			Some(existing) => Err(existing),
		}
	}

	pub(crate) fn unregister_attribute(&self, name: &str) -> Option<Arc<AttributeAccess>> {
		self.attributes.remove(name)
	}

	#[inline]
	pub(crate) fn attributes_snapshot(&self) -> Arc<HashMap<Box<str>, Arc<AttributeAccess>>> {
		self.attributes.snapshot()
	}
}
