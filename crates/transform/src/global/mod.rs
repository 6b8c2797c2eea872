//! The version-agnostic transformer registration tree.
//!
//! Subsystems register transformers here for every (address, version,
//! operation) they know how to downgrade, without knowing which versions any
//! particular peer runs. Resolution then walks the tree once per peer and
//! copies out the entries of the versions that peer actually has, pinning
//! subtrees through an [`AddressVersionMap`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mast_model::{ModelVersion, PathAddress, PathElement};
use mast_registry::{CowMap, RegistryError, Subregistry};
use rustc_hash::FxHashMap as HashMap;
use tracing::debug;

use crate::entry::OperationTransformerEntry;
use crate::resolved::{OperationTransformerRegistry, ResolvedNode};


/// Per-subtree schema version overrides applied during resolution.
///
/// Keys are addresses exactly as registered, wildcard slots included: pinning
/// `/profile=*/subsystem=web` selects the version for the whole wildcard
/// subtree. An unpinned subtree inherits its parent's version.
#[derive(Clone, Debug, Default)]
pub struct AddressVersionMap {
	pins: HashMap<PathAddress, ModelVersion>,
}

impl AddressVersionMap {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pin(mut self, address: PathAddress, version: ModelVersion) -> Self {
		self.pins.insert(address, version);
		self
	}

	#[inline]
	pub fn get(&self, address: &PathAddress) -> Option<ModelVersion> {
		self.pins.get(address).copied()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.pins.is_empty()
	}
}

struct VersionSlot {
	operations: CowMap<Box<str>, OperationTransformerEntry>,
	discarded: AtomicBool,
}

impl VersionSlot {
	fn new() -> Self {
		Self {
			operations: CowMap::new(),
			discarded: AtomicBool::new(false),
		}
	}
}

struct GlobalNode {
	versions: CowMap<ModelVersion, Arc<VersionSlot>>,
	children: CowMap<Box<str>, Arc<Subregistry<Arc<GlobalNode>>>>,
}

impl GlobalNode {
	fn new() -> Self {
		Self {
			versions: CowMap::new(),
			children: CowMap::new(),
		}
	}

	fn bucket_or_create(&self, key: &str) -> Arc<Subregistry<Arc<GlobalNode>>> {
		if let Some(existing) = self.children.get(key) {
			return existing;
		}
		let fresh = Arc::new(Subregistry::new());
		self.children
			.put_if_absent(Box::from(key), Arc::clone(&fresh))
			.unwrap_or(fresh)
	}

	fn version_or_create(&self, version: ModelVersion) -> Arc<VersionSlot> {
		if let Some(existing) = self.versions.get(&version) {
			return existing;
		}
		let fresh = Arc::new(VersionSlot::new());
		self.versions
			.put_if_absent(version, Arc::clone(&fresh))
			.unwrap_or(fresh)
	}

	/// Copies this subtree's entries for the selected version into the
	/// resolved tree, recursing with the version each child subtree selects.
	fn copy_into(
		&self,
		out: &ResolvedNode,
		address: PathAddress,
		inherited: ModelVersion,
		pins: &AddressVersionMap,
	) {
		let version = pins.get(&address).unwrap_or(inherited);
		if let Some(slot) = self.versions.get(&version) {
			for (name, entry) in slot.operations.snapshot().iter() {
				out.put_operation(name, entry.clone());
			}
			if slot.discarded.load(Ordering::Acquire) {
				out.mark_discarded();
			}
		}
		for (key, bucket) in self.children.snapshot().iter() {
			for (value, child) in bucket.snapshot().iter() {
				let out_child = out.child_or_create(key, value);
				let element = PathElement::new(&**key, &**value);
				child.copy_into(&out_child, address.clone().append(element), version, pins);
			}
		}
	}
}

/// The shared tree every subsystem registers its downgrade transformers in.
///
/// Registration is keyed by exact address slots: a wildcard segment
/// registers at the wildcard slot itself, matching any value once resolved.
/// Re-registering the same (address, version, operation) replaces the entry.
pub struct GlobalTransformerRegistry {
	root: Arc<GlobalNode>,
}

impl GlobalTransformerRegistry {
	pub fn new() -> Self {
		Self {
			root: Arc::new(GlobalNode::new()),
		}
	}

	/// Registers the transformer entry governing `name` at `address` when
	/// relaying to a peer on `version`.
	pub fn register_operation(
		&self,
		address: &PathAddress,
		version: ModelVersion,
		name: &str,
		entry: OperationTransformerEntry,
	) -> Result<(), RegistryError> {
		let slot = self.version_slot(address, version)?;
		slot.operations.insert(Box::from(name), entry);
		debug!(%address, %version, operation = name, "registered operation transformer");
		Ok(())
	}

	/// Registers an explicit discard for `name`: the peer never sees it.
	pub fn discard_operation(
		&self,
		address: &PathAddress,
		version: ModelVersion,
		name: &str,
	) -> Result<(), RegistryError> {
		self.register_operation(address, version, name, OperationTransformerEntry::discard())
	}

	/// Discards the resource at `address` for `version`: every operation
	/// there without an explicit entry resolves to discard, addresses below
	/// it included.
	pub fn discard_resource(
		&self,
		address: &PathAddress,
		version: ModelVersion,
	) -> Result<(), RegistryError> {
		let slot = self.version_slot(address, version)?;
		slot.discarded.store(true, Ordering::Release);
		debug!(%address, %version, "discarding resource operations");
		Ok(())
	}

	/// Flattens the tree for one peer: `version` at the root, inherited
	/// downward except where `pins` selects another version for a subtree.
	///
	/// The walk reads each map as a coherent snapshot; registrations racing
	/// the walk land in the next resolution.
	pub fn resolve(&self, version: ModelVersion, pins: &AddressVersionMap) -> OperationTransformerRegistry {
		let resolved = OperationTransformerRegistry::new();
		self.root
			.copy_into(resolved.root(), PathAddress::empty(), version, pins);
		debug!(%version, "resolved operation transformer registry");
		resolved
	}

	/// One-off resolution of a single (address, version, operation) triple.
	pub fn resolve_operation(
		&self,
		address: &PathAddress,
		version: ModelVersion,
		name: &str,
	) -> OperationTransformerEntry {
		self.resolve(version, &AddressVersionMap::new())
			.resolve_operation(address, name)
	}

	fn version_slot(
		&self,
		address: &PathAddress,
		version: ModelVersion,
	) -> Result<Arc<VersionSlot>, RegistryError> {
		let mut node = Arc::clone(&self.root);
		for element in address {
			let Some(slot) = element.value().as_single() else {
				return Err(RegistryError::InvalidArgument(
					"a transformer registration address cannot contain multi-target segments",
				));
			};
			let bucket = node.bucket_or_create(element.key());
			node = bucket.get_or_insert_with(slot, || Arc::new(GlobalNode::new()));
		}
		Ok(node.version_or_create(version))
	}
}

impl Default for GlobalTransformerRegistry {
	fn default() -> Self {
		Self::new()
	}
}
