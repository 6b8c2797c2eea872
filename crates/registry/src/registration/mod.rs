//! The registration tree: per-address metadata describing what exists in
//! the management model and what handles it.
//!
//! A node is one of three kinds. Concrete nodes carry the actual
//! registration state: operations, attributes, child sub-registries, a
//! description. Alias nodes redirect to a target registration and proxy
//! nodes stand in for a remote controller; both are terminal and reject all
//! registration, which the handle surface enforces through one fallible
//! mutation path instead of a method-by-method veto.
//!
//! Resolution descends value-keyed sub-registries with the
//! wildcard/concrete coexistence rule of [`Subregistry`](crate::Subregistry):
//! single-result lookups prefer the concrete child's whole subtree and fall
//! back to the wildcard sibling, enumerations visit wildcard first so
//! concrete entries overwrite. A query on a non-root handle first rebuilds
//! its absolute address through parent back-references and resolves from
//! the root, so wildcard siblings of its own ancestors can answer too.

use std::fmt;
use std::sync::{Arc, Weak};

use mast_model::{PathAddress, PathElement};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use tracing::debug;

use crate::entry::{AttributeAccess, EntryType, OperationEntry, OperationFlags, Storage};
use crate::error::{RegistrationKind, RegistryError};
use crate::handler::{DescriptionProvider, OperationHandler, ProxyController, StaticDescription};
use crate::tree::segment_values;

mod alias;
mod concrete;
mod proxy;

#[cfg(test)]
mod tests;

pub use alias::AliasEntry;

use alias::AliasHandler;
use concrete::ConcreteNode;
use proxy::ProxyNode;

/// Input for [`ManagementRegistration::register_sub_model`].
pub struct SubModelDef {
	pub element: PathElement,
	pub description: Arc<dyn DescriptionProvider>,
	pub runtime_only: bool,
	pub immutable: bool,
}

impl SubModelDef {
	pub fn new(element: PathElement) -> Self {
		Self {
			element,
			description: Arc::new(StaticDescription::undefined()),
			runtime_only: false,
			immutable: false,
		}
	}

	pub fn describe(mut self, description: Arc<dyn DescriptionProvider>) -> Self {
		self.description = description;
		self
	}

	/// Marks the submodel runtime-only: live state with no persistent
	/// configuration representation.
	pub fn runtime_only(mut self) -> Self {
		self.runtime_only = true;
		self
	}

	/// Locks the submodel against any registration after creation.
	pub fn immutable(mut self) -> Self {
		self.immutable = true;
		self
	}
}

/// Input for [`ManagementRegistration::register_operation_handler`].
pub struct OperationDef {
	pub name: String,
	pub handler: Arc<dyn OperationHandler>,
	pub description: Arc<dyn DescriptionProvider>,
	pub inherited: bool,
	pub entry_type: EntryType,
	pub flags: OperationFlags,
}

impl OperationDef {
	pub fn new(name: impl Into<String>, handler: Arc<dyn OperationHandler>) -> Self {
		Self {
			name: name.into(),
			handler,
			description: Arc::new(StaticDescription::undefined()),
			inherited: false,
			entry_type: EntryType::Public,
			flags: OperationFlags::empty(),
		}
	}

	pub fn describe(mut self, description: Arc<dyn DescriptionProvider>) -> Self {
		self.description = description;
		self
	}

	/// Makes the entry visible at every registered descendant address until
	/// a descendant registers the same name locally.
	pub fn inherited(mut self) -> Self {
		self.inherited = true;
		self
	}

	/// Hides the entry from enumeration while keeping it resolvable by
	/// name.
	pub fn private(mut self) -> Self {
		self.entry_type = EntryType::Private;
		self
	}

	pub fn flags(mut self, flags: OperationFlags) -> Self {
		self.flags = flags;
		self
	}
}

/// Non-owning link to the parent node, carrying the element this node was
/// registered under. Used for location strings, inheritance walks, and
/// rebuilding absolute addresses; never for ownership.
#[derive(Clone)]
struct ParentRef {
	node: Weak<RegNode>,
	element: PathElement,
}

enum NodeKind {
	Concrete(ConcreteNode),
	Alias(Arc<AliasEntry>),
	Proxy(ProxyNode),
}

pub(crate) struct RegNode {
	kind: NodeKind,
	parent: Option<ParentRef>,
}

impl RegNode {
	fn registered_element(&self) -> Option<&PathElement> {
		self.parent.as_ref().map(|parent| &parent.element)
	}

	fn is_wildcard_slot(&self) -> bool {
		self.registered_element().is_some_and(PathElement::is_wildcard)
	}

	fn is_alias(&self) -> bool {
		matches!(self.kind, NodeKind::Alias(_))
	}

	fn is_proxy(&self) -> bool {
		matches!(self.kind, NodeKind::Proxy(_))
	}

	fn is_runtime_only(&self) -> bool {
		match &self.kind {
			NodeKind::Concrete(concrete) => concrete.is_runtime_only(),
			NodeKind::Alias(entry) => entry.target_node().is_runtime_only(),
			NodeKind::Proxy(_) => true,
		}
	}

	fn is_remote(&self) -> bool {
		match &self.kind {
			NodeKind::Concrete(_) => false,
			NodeKind::Alias(entry) => entry.target_node().is_remote(),
			NodeKind::Proxy(_) => true,
		}
	}

	/// Walks parent links to the root. Returns the root node and this
	/// node's absolute address, or `None` when an ancestor is gone.
	fn absolute_prefix(self: &Arc<Self>) -> Option<(Arc<RegNode>, PathAddress)> {
		let mut elements = Vec::new();
		let mut current = Arc::clone(self);
		while let Some(parent_ref) = current.parent.clone() {
			let parent = parent_ref.node.upgrade()?;
			elements.push(parent_ref.element);
			current = parent;
		}
		elements.reverse();
		Some((current, PathAddress::new(elements)))
	}

	/// Ancestors nearest-first; stops at the first unreachable link.
	fn ancestors(&self) -> Vec<Arc<RegNode>> {
		let mut chain = Vec::new();
		let mut parent = self.parent.clone();
		while let Some(parent_ref) = parent {
			let Some(node) = parent_ref.node.upgrade() else {
				break;
			};
			parent = node.parent.clone();
			chain.push(node);
		}
		chain
	}

	/// Single-result operation resolution. `inherited` accumulates the
	/// nearest inheritable entry seen on the way down; it only applies at a
	/// registered terminal, so a dead-end bucket resolves to nothing even
	/// with an inherited candidate in hand.
	fn operation_entry(
		&self,
		address: &[PathElement],
		name: &str,
		inherited: Option<Arc<OperationEntry>>,
	) -> Option<Arc<OperationEntry>> {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => concrete.local_operation(name).or(inherited),
				Some((head, rest)) => {
					let inherited = concrete.inheritable_operation(name).or(inherited);
					let bucket = concrete.child_bucket(head.key())?;
					for value in segment_values(head) {
						let found = bucket.resolve(value, |child| {
							child.operation_entry(rest, name, inherited.clone())
						});
						if let Some(found) = found {
							return Some(found);
						}
					}
					None
				}
			},
			NodeKind::Alias(entry) => {
				let resolved = entry.target_node().operation_entry(address, name, inherited)?;
				Some(Arc::new(OperationEntry {
					handler: Arc::new(AliasHandler::new(
						Arc::clone(entry),
						Arc::clone(&resolved.handler),
					)),
					description: Arc::clone(&resolved.description),
					inherited: resolved.inherited,
					entry_type: resolved.entry_type,
					flags: resolved.flags,
				}))
			}
			NodeKind::Proxy(proxy) => Some(Arc::clone(proxy.entry())),
		}
	}

	fn attribute_access(&self, address: &[PathElement], name: &str) -> Option<Arc<AttributeAccess>> {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => concrete.attribute(name),
				Some((head, rest)) => {
					let bucket = concrete.child_bucket(head.key())?;
					for value in segment_values(head) {
						let found =
							bucket.resolve(value, |child| child.attribute_access(rest, name));
						if let Some(found) = found {
							return Some(found);
						}
					}
					None
				}
			},
			NodeKind::Alias(entry) => entry.target_node().attribute_access(address, name),
			NodeKind::Proxy(_) => None,
		}
	}

	fn model_description(&self, address: &[PathElement]) -> Option<Arc<dyn DescriptionProvider>> {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => Some(Arc::clone(concrete.description())),
				Some((head, rest)) => {
					let bucket = concrete.child_bucket(head.key())?;
					for value in segment_values(head) {
						let found = bucket.resolve(value, |child| child.model_description(rest));
						if let Some(found) = found {
							return Some(found);
						}
					}
					None
				}
			},
			NodeKind::Alias(entry) => entry.target_node().model_description(address),
			NodeKind::Proxy(_) => None,
		}
	}

	fn proxy_controller(&self, address: &[PathElement]) -> Option<Arc<dyn ProxyController>> {
		match &self.kind {
			NodeKind::Concrete(concrete) => {
				let (head, rest) = address.split_first()?;
				let bucket = concrete.child_bucket(head.key())?;
				for value in segment_values(head) {
					let found = bucket.resolve(value, |child| child.proxy_controller(rest));
					if let Some(found) = found {
						return Some(found);
					}
				}
				None
			}
			NodeKind::Alias(entry) => entry.target_node().proxy_controller(address),
			NodeKind::Proxy(proxy) => Some(Arc::clone(proxy.controller())),
		}
	}

	fn find_node(self: &Arc<Self>, address: &[PathElement]) -> Option<Arc<RegNode>> {
		match &self.kind {
			NodeKind::Concrete(concrete) => {
				let Some((head, rest)) = address.split_first() else {
					return Some(Arc::clone(self));
				};
				let bucket = concrete.child_bucket(head.key())?;
				for value in segment_values(head) {
					let found = bucket.resolve(value, |child| child.find_node(rest));
					if let Some(found) = found {
						return Some(found);
					}
				}
				None
			}
			NodeKind::Alias(entry) => {
				if address.is_empty() {
					Some(Arc::clone(self))
				} else {
					entry.target_node().find_node(address)
				}
			}
			// a proxy answers for its own address and everything below it
			NodeKind::Proxy(_) => Some(Arc::clone(self)),
		}
	}

	fn gather_proxy_controllers(
		&self,
		address: &[PathElement],
		acc: &mut Vec<Arc<dyn ProxyController>>,
	) {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => self.collect_proxies(acc),
				Some((head, rest)) => {
					let Some(bucket) = concrete.child_bucket(head.key()) else {
						return;
					};
					if head.is_wildcard() {
						for child in bucket.snapshot().values() {
							child.gather_proxy_controllers(rest, acc);
						}
					} else {
						for value in segment_values(head) {
							bucket.each_match(value, |child| {
								child.gather_proxy_controllers(rest, acc);
							});
						}
					}
				}
			},
			NodeKind::Alias(entry) => entry.target_node().gather_proxy_controllers(address, acc),
			NodeKind::Proxy(proxy) => acc.push(Arc::clone(proxy.controller())),
		}
	}

	fn collect_proxies(&self, acc: &mut Vec<Arc<dyn ProxyController>>) {
		match &self.kind {
			NodeKind::Concrete(concrete) => {
				for bucket in concrete.children_snapshot().values() {
					for child in bucket.snapshot().values() {
						child.collect_proxies(acc);
					}
				}
			}
			// aliased subtrees are counted at their real address only
			NodeKind::Alias(_) => {}
			NodeKind::Proxy(proxy) => acc.push(Arc::clone(proxy.controller())),
		}
	}

	fn gather_attribute_names(&self, address: &[PathElement], acc: &mut HashSet<String>) {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => {
					acc.extend(
						concrete.attributes_snapshot().keys().map(|name| name.to_string()),
					);
				}
				Some((head, rest)) => {
					each_child_match(concrete, head, |child| {
						child.gather_attribute_names(rest, acc);
					});
				}
			},
			NodeKind::Alias(entry) => entry.target_node().gather_attribute_names(address, acc),
			NodeKind::Proxy(_) => {}
		}
	}

	fn gather_child_names(&self, address: &[PathElement], acc: &mut HashSet<String>) {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => {
					for (key, bucket) in concrete.children_snapshot().iter() {
						if !bucket.snapshot().is_empty() {
							acc.insert(key.to_string());
						}
					}
				}
				Some((head, rest)) => {
					each_child_match(concrete, head, |child| {
						child.gather_child_names(rest, acc);
					});
				}
			},
			NodeKind::Alias(entry) => entry.target_node().gather_child_names(address, acc),
			NodeKind::Proxy(_) => {}
		}
	}

	fn gather_child_addresses(
		&self,
		address: &[PathElement],
		acc: &mut HashSet<(Box<str>, Box<str>)>,
	) {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => {
					for (key, bucket) in concrete.children_snapshot().iter() {
						for value in bucket.snapshot().keys() {
							acc.insert((key.clone(), value.clone()));
						}
					}
				}
				Some((head, rest)) => {
					each_child_match(concrete, head, |child| {
						child.gather_child_addresses(rest, acc);
					});
				}
			},
			NodeKind::Alias(entry) => entry.target_node().gather_child_addresses(address, acc),
			NodeKind::Proxy(_) => {}
		}
	}

	fn gather_operation_descriptions(
		&self,
		address: &[PathElement],
		include_inherited: bool,
		acc: &mut HashMap<Box<str>, Arc<OperationEntry>>,
	) {
		match &self.kind {
			NodeKind::Concrete(concrete) => match address.split_first() {
				None => {
					if include_inherited {
						// nearest ancestor wins; locals below overwrite both
						for ancestor in self.ancestors() {
							let NodeKind::Concrete(node) = &ancestor.kind else {
								continue;
							};
							for (name, entry) in node.operations_snapshot().iter() {
								if entry.is_inherited()
									&& !entry.is_private() && !acc.contains_key(name)
								{
									acc.insert(name.clone(), Arc::clone(entry));
								}
							}
						}
					}
					for (name, entry) in concrete.operations_snapshot().iter() {
						if !entry.is_private() {
							acc.insert(name.clone(), Arc::clone(entry));
						}
					}
				}
				Some((head, rest)) => {
					each_child_match(concrete, head, |child| {
						child.gather_operation_descriptions(rest, include_inherited, acc);
					});
				}
			},
			NodeKind::Alias(entry) => {
				entry
					.target_node()
					.gather_operation_descriptions(address, include_inherited, acc);
			}
			NodeKind::Proxy(_) => {}
		}
	}
}

/// Enumeration descent step over one address segment: wildcard slot first,
/// then each matching value slot.
fn each_child_match(
	concrete: &ConcreteNode,
	head: &PathElement,
	mut visit: impl FnMut(&Arc<RegNode>),
) {
	let Some(bucket) = concrete.child_bucket(head.key()) else {
		return;
	};
	for value in segment_values(head) {
		bucket.each_match(value, &mut visit);
	}
}

/// A handle onto one node of the registration tree.
///
/// Handles are cheap to clone and safe to share across threads. Reads
/// resolve addresses relative to the handle's node; mutation is rejected
/// for alias and proxy nodes and for submodels registered immutable.
#[derive(Clone)]
pub struct ManagementRegistration {
	node: Arc<RegNode>,
	// Keeps the whole tree alive while any handle into it lives, so parent
	// back-references of attached nodes always upgrade.
	root: Arc<RegNode>,
}

impl fmt::Debug for ManagementRegistration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManagementRegistration").finish_non_exhaustive()
	}
}

impl ManagementRegistration {
	/// Creates a new mutable tree root.
	pub fn root(description: Arc<dyn DescriptionProvider>) -> Self {
		let node = Arc::new(RegNode {
			kind: NodeKind::Concrete(ConcreteNode::new(description, false, false)),
			parent: None,
		});
		Self {
			root: Arc::clone(&node),
			node,
		}
	}

	/// Rebases a node-relative address onto the tree root. `None` when the
	/// node was unregistered and its parent chain is gone.
	fn rooted(&self, address: &PathAddress) -> Option<(Arc<RegNode>, PathAddress)> {
		let (root, prefix) = self.node.absolute_prefix()?;
		let full = if prefix.is_empty() {
			address.clone()
		} else {
			prefix.concat(address)
		};
		Some((root, full))
	}

	/// The operation entry resolved at an address relative to this node:
	/// the local registration if the terminal has one, otherwise the
	/// nearest ancestor's inherited entry. Detached handles resolve
	/// nothing.
	pub fn operation_entry(
		&self,
		address: &PathAddress,
		name: &str,
	) -> Option<Arc<OperationEntry>> {
		let (root, full) = self.rooted(address)?;
		root.operation_entry(full.elements(), name, None)
	}

	pub fn operation_handler(
		&self,
		address: &PathAddress,
		name: &str,
	) -> Option<Arc<dyn OperationHandler>> {
		self.operation_entry(address, name)
			.map(|entry| Arc::clone(&entry.handler))
	}

	pub fn operation_flags(&self, address: &PathAddress, name: &str) -> Option<OperationFlags> {
		self.operation_entry(address, name).map(|entry| entry.flags)
	}

	pub fn operation_description(
		&self,
		address: &PathAddress,
		name: &str,
	) -> Option<Arc<dyn DescriptionProvider>> {
		self.operation_entry(address, name)
			.map(|entry| Arc::clone(&entry.description))
	}

	pub fn attribute_access(
		&self,
		address: &PathAddress,
		name: &str,
	) -> Option<Arc<AttributeAccess>> {
		let (root, full) = self.rooted(address)?;
		root.attribute_access(full.elements(), name)
	}

	pub fn model_description(&self, address: &PathAddress) -> Option<Arc<dyn DescriptionProvider>> {
		let (root, full) = self.rooted(address)?;
		root.model_description(full.elements())
	}

	/// The proxy controller responsible for the address, if the address is
	/// at or below a proxy registration.
	pub fn proxy_controller(&self, address: &PathAddress) -> Option<Arc<dyn ProxyController>> {
		let (root, full) = self.rooted(address)?;
		root.proxy_controller(full.elements())
	}

	/// Every proxy controller mounted at or below the address, deduplicated.
	/// Wildcard segments fan out over all children at that level.
	pub fn proxy_controllers(&self, address: &PathAddress) -> Vec<Arc<dyn ProxyController>> {
		let Some((root, full)) = self.rooted(address) else {
			return Vec::new();
		};
		let mut controllers = Vec::new();
		root.gather_proxy_controllers(full.elements(), &mut controllers);
		let mut seen = HashSet::default();
		controllers.retain(|controller| seen.insert(Arc::as_ptr(controller) as *const () as usize));
		controllers
	}

	/// The registration node at the address. Descending through an alias
	/// resolves in the target's subtree; an alias or proxy addressed
	/// directly is returned itself, so its terminal contract stays
	/// observable.
	pub fn sub_registration(&self, address: &PathAddress) -> Option<ManagementRegistration> {
		let (root, full) = self.rooted(address)?;
		let node = root.find_node(full.elements())?;
		Some(Self { node, root })
	}

	pub fn attribute_names(&self, address: &PathAddress) -> Vec<String> {
		let Some((root, full)) = self.rooted(address) else {
			return Vec::new();
		};
		let mut names = HashSet::default();
		root.gather_attribute_names(full.elements(), &mut names);
		let mut names: Vec<String> = names.into_iter().collect();
		names.sort_unstable();
		names
	}

	/// Child type names with at least one registration under the address.
	pub fn child_names(&self, address: &PathAddress) -> Vec<String> {
		let Some((root, full)) = self.rooted(address) else {
			return Vec::new();
		};
		let mut names = HashSet::default();
		root.gather_child_names(full.elements(), &mut names);
		let mut names: Vec<String> = names.into_iter().collect();
		names.sort_unstable();
		names
	}

	/// Every (type, value) child slot under the address, wildcard slots
	/// as wildcard elements.
	pub fn child_addresses(&self, address: &PathAddress) -> Vec<PathElement> {
		let Some((root, full)) = self.rooted(address) else {
			return Vec::new();
		};
		let mut slots = HashSet::default();
		root.gather_child_addresses(full.elements(), &mut slots);
		let mut slots: Vec<(Box<str>, Box<str>)> = slots.into_iter().collect();
		slots.sort_unstable();
		slots
			.into_iter()
			.map(|(key, value)| PathElement::new(key.into_string(), value.into_string()))
			.collect()
	}

	/// Public operation entries by name. With `inherited` set, ancestors'
	/// inherited-flagged entries are merged in underneath local ones.
	pub fn operation_descriptions(
		&self,
		address: &PathAddress,
		inherited: bool,
	) -> HashMap<Box<str>, Arc<OperationEntry>> {
		let Some((root, full)) = self.rooted(address) else {
			return HashMap::default();
		};
		let mut entries = HashMap::default();
		root.gather_operation_descriptions(full.elements(), inherited, &mut entries);
		entries
	}

	pub fn is_runtime_only(&self) -> bool {
		self.node.is_runtime_only()
	}

	pub fn set_runtime_only(&self, runtime_only: bool) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		concrete.set_runtime_only(runtime_only);
		Ok(())
	}

	pub fn is_remote(&self) -> bool {
		self.node.is_remote()
	}

	pub fn is_alias(&self) -> bool {
		self.node.is_alias()
	}

	pub fn alias_entry(&self) -> Option<Arc<AliasEntry>> {
		match &self.node.kind {
			NodeKind::Alias(entry) => Some(Arc::clone(entry)),
			_ => None,
		}
	}

	/// The absolute address of this registration; `None` once detached.
	pub fn path_address(&self) -> Option<PathAddress> {
		self.node.absolute_prefix().map(|(_, address)| address)
	}

	/// Diagnostic location string for error messages.
	pub fn location(&self) -> String {
		match self.node.absolute_prefix() {
			Some((_, address)) => address.to_string(),
			None => "<detached>".to_owned(),
		}
	}

	/// The one gate all mutation goes through: alias and proxy nodes are
	/// terminal, immutable submodels are locked.
	fn concrete_for_write(&self) -> Result<&ConcreteNode, RegistryError> {
		match &self.node.kind {
			NodeKind::Concrete(concrete) => {
				if concrete.is_immutable() {
					return Err(RegistryError::IllegalState(format!(
						"registration at {} is immutable",
						self.location()
					)));
				}
				Ok(concrete)
			}
			NodeKind::Alias(_) | NodeKind::Proxy(_) => Err(RegistryError::AlreadyRegistered {
				location: self.location(),
			}),
		}
	}

	/// Registers a child submodel and returns its handle.
	pub fn register_sub_model(
		&self,
		def: SubModelDef,
	) -> Result<ManagementRegistration, RegistryError> {
		let concrete = self.concrete_for_write()?;
		let SubModelDef {
			element,
			description,
			runtime_only,
			immutable,
		} = def;
		let Some(slot) = element.value().as_single() else {
			return Err(RegistryError::InvalidArgument(
				"a submodel element cannot be multi-target",
			));
		};
		if self.node.is_runtime_only() && !runtime_only {
			return Err(RegistryError::IllegalState(format!(
				"cannot register non-runtime submodel '{element}' under runtime-only registration {}",
				self.location()
			)));
		}
		// a runtime-only child has no concrete parent instance to hang off
		if runtime_only && self.node.is_wildcard_slot() {
			return Err(RegistryError::IllegalState(format!(
				"cannot register runtime-only submodel '{element}' directly under wildcard registration {}",
				self.location()
			)));
		}
		let bucket = concrete.child_bucket_or_create(element.key());
		let child = Arc::new(RegNode {
			kind: NodeKind::Concrete(ConcreteNode::new(description, runtime_only, immutable)),
			parent: Some(ParentRef {
				node: Arc::downgrade(&self.node),
				element: element.clone(),
			}),
		});
		if bucket.register(slot, Arc::clone(&child)).is_err() {
			return Err(RegistryError::DuplicateRegistration {
				location: self.location(),
				kind: RegistrationKind::Submodel,
				name: element.to_string(),
			});
		}
		debug!(location = %self.location(), %element, "registered submodel");
		Ok(Self {
			node: child,
			root: Arc::clone(&self.root),
		})
	}

	/// Removes the child registration at the element; absent slots are a
	/// no-op.
	pub fn unregister_sub_model(&self, element: &PathElement) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		let Some(slot) = element.value().as_single() else {
			return Err(RegistryError::InvalidArgument(
				"a submodel element cannot be multi-target",
			));
		};
		if let Some(bucket) = concrete.child_bucket(element.key())
			&& bucket.remove(slot).is_some()
		{
			debug!(location = %self.location(), %element, "unregistered submodel");
		}
		Ok(())
	}

	pub fn register_operation_handler(&self, def: OperationDef) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		let OperationDef {
			name,
			handler,
			description,
			inherited,
			entry_type,
			flags,
		} = def;
		let entry = Arc::new(OperationEntry {
			handler,
			description,
			inherited,
			entry_type,
			flags,
		});
		if concrete.register_operation(&name, entry).is_err() {
			return Err(RegistryError::DuplicateRegistration {
				location: self.location(),
				kind: RegistrationKind::Operation,
				name,
			});
		}
		debug!(location = %self.location(), %name, "registered operation");
		Ok(())
	}

	pub fn unregister_operation_handler(&self, name: &str) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		concrete.unregister_operation(name);
		Ok(())
	}

	pub fn register_attribute(
		&self,
		name: &str,
		access: AttributeAccess,
	) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		if concrete.register_attribute(name, Arc::new(access)).is_err() {
			return Err(RegistryError::DuplicateRegistration {
				location: self.location(),
				kind: RegistrationKind::Attribute,
				name: name.to_owned(),
			});
		}
		debug!(location = %self.location(), name, "registered attribute");
		Ok(())
	}

	pub fn register_read_only_attribute(
		&self,
		name: &str,
		read_handler: Option<Arc<dyn OperationHandler>>,
		storage: Storage,
	) -> Result<(), RegistryError> {
		self.register_attribute(name, AttributeAccess::read_only(storage, read_handler))
	}

	pub fn register_read_write_attribute(
		&self,
		name: &str,
		read_handler: Option<Arc<dyn OperationHandler>>,
		write_handler: Arc<dyn OperationHandler>,
		storage: Storage,
	) -> Result<(), RegistryError> {
		self.register_attribute(
			name,
			AttributeAccess::read_write(storage, read_handler, write_handler),
		)
	}

	pub fn register_metric(
		&self,
		name: &str,
		read_handler: Arc<dyn OperationHandler>,
	) -> Result<(), RegistryError> {
		self.register_attribute(name, AttributeAccess::metric(read_handler))
	}

	pub fn unregister_attribute(&self, name: &str) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		concrete.unregister_attribute(name);
		Ok(())
	}

	pub fn register_proxy_controller(
		&self,
		element: PathElement,
		controller: Arc<dyn ProxyController>,
	) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		let Some(slot) = element.value().as_single() else {
			return Err(RegistryError::InvalidArgument(
				"a proxy element cannot be multi-target",
			));
		};
		let bucket = concrete.child_bucket_or_create(element.key());
		let node = Arc::new(RegNode {
			kind: NodeKind::Proxy(ProxyNode::new(controller)),
			parent: Some(ParentRef {
				node: Arc::downgrade(&self.node),
				element: element.clone(),
			}),
		});
		if bucket.register(slot, node).is_err() {
			return Err(RegistryError::DuplicateRegistration {
				location: self.location(),
				kind: RegistrationKind::ProxyController,
				name: element.to_string(),
			});
		}
		debug!(location = %self.location(), %element, "registered proxy controller");
		Ok(())
	}

	/// Removes the proxy at the element. A non-proxy node in that slot is
	/// left untouched; absent slots are a no-op.
	pub fn unregister_proxy_controller(&self, element: &PathElement) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		let Some(slot) = element.value().as_single() else {
			return Err(RegistryError::InvalidArgument(
				"a proxy element cannot be multi-target",
			));
		};
		if let Some(bucket) = concrete.child_bucket(element.key()) {
			bucket.remove_if(slot, |node| node.is_proxy());
		}
		Ok(())
	}

	/// Registers an alias redirecting the element to the entry's target
	/// and returns the alias handle. Attaching records the absolute
	/// (alias, target) address pair used by address conversion.
	pub fn register_alias(
		&self,
		element: PathElement,
		entry: AliasEntry,
	) -> Result<ManagementRegistration, RegistryError> {
		let concrete = self.concrete_for_write()?;
		let Some(slot) = element.value().as_single() else {
			return Err(RegistryError::InvalidArgument(
				"an alias element cannot be multi-target",
			));
		};
		let (_, base) = self.node.absolute_prefix().ok_or_else(|| {
			RegistryError::IllegalState(
				"cannot attach an alias under a detached registration".to_owned(),
			)
		})?;
		let (_, target_address) = entry.target_node().absolute_prefix().ok_or_else(|| {
			RegistryError::IllegalState("alias target registration is detached".to_owned())
		})?;
		entry.attach(base.append(element.clone()), target_address)?;
		let bucket = concrete.child_bucket_or_create(element.key());
		let node = Arc::new(RegNode {
			kind: NodeKind::Alias(Arc::new(entry)),
			parent: Some(ParentRef {
				node: Arc::downgrade(&self.node),
				element: element.clone(),
			}),
		});
		if bucket.register(slot, Arc::clone(&node)).is_err() {
			return Err(RegistryError::DuplicateRegistration {
				location: self.location(),
				kind: RegistrationKind::Alias,
				name: element.to_string(),
			});
		}
		debug!(location = %self.location(), %element, "registered alias");
		Ok(Self {
			node,
			root: Arc::clone(&self.root),
		})
	}

	/// Removes the alias at the element. A non-alias node in that slot is
	/// left untouched; absent slots are a no-op.
	pub fn unregister_alias(&self, element: &PathElement) -> Result<(), RegistryError> {
		let concrete = self.concrete_for_write()?;
		let Some(slot) = element.value().as_single() else {
			return Err(RegistryError::InvalidArgument(
				"an alias element cannot be multi-target",
			));
		};
		if let Some(bucket) = concrete.child_bucket(element.key()) {
			bucket.remove_if(slot, |node| node.is_alias());
		}
		Ok(())
	}
}
