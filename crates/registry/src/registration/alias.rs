//! Alias indirection: a terminal node that redirects one address to another.
//!
//! Reads pass straight through to the target. Operation dispatch is wrapped:
//! the handler handed back for an alias address first rewrites the request's
//! address to the target address, then runs the target's real handler, so
//! the callee only ever sees its own address space.

use std::sync::{Arc, OnceLock};

use mast_model::{OperationRequest, PathAddress};

use super::{ManagementRegistration, RegNode};
use crate::error::RegistryError;
use crate::handler::{OperationFailed, OperationHandler};

type AddressMapper = Arc<dyn Fn(&PathAddress) -> PathAddress + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasAddresses {
	alias: PathAddress,
	target: PathAddress,
}

/// The redirection record carried by an alias registration.
///
/// Built by the caller against a target handle, then attached exactly once
/// when the alias is registered; attaching records the absolute (alias,
/// target) address pair the default conversion rebases through.
pub struct AliasEntry {
	target: ManagementRegistration,
	mapper: Option<AddressMapper>,
	addresses: OnceLock<AliasAddresses>,
}

impl AliasEntry {
	/// An alias converting addresses by prefix rebase: the alias address
	/// prefix is replaced with the target address, the remainder kept.
	pub fn new(target: ManagementRegistration) -> Self {
		Self {
			target,
			mapper: None,
			addresses: OnceLock::new(),
		}
	}

	/// An alias with a caller-supplied pure conversion over absolute
	/// addresses, for redirections a prefix rebase cannot express.
	pub fn with_mapper(
		target: ManagementRegistration,
		mapper: impl Fn(&PathAddress) -> PathAddress + Send + Sync + 'static,
	) -> Self {
		Self {
			target,
			mapper: Some(Arc::new(mapper)),
			addresses: OnceLock::new(),
		}
	}

	#[inline]
	pub fn target(&self) -> &ManagementRegistration {
		&self.target
	}

	/// The absolute address the alias was registered at. `None` until the
	/// entry is attached.
	pub fn alias_address(&self) -> Option<&PathAddress> {
		self.addresses.get().map(|a| &a.alias)
	}

	/// The absolute address of the target registration. `None` until the
	/// entry is attached.
	pub fn target_address(&self) -> Option<&PathAddress> {
		self.addresses.get().map(|a| &a.target)
	}

	/// Rewrites an absolute address from alias space to target space.
	/// Addresses outside the alias subtree come back unchanged.
	pub fn convert_to_target(&self, address: &PathAddress) -> PathAddress {
		if let Some(mapper) = &self.mapper {
			return mapper(address);
		}
		let Some(addresses) = self.addresses.get() else {
			return address.clone();
		};
		let prefix = addresses.alias.elements();
		if address.elements().starts_with(prefix) {
			addresses.target.concat(&address.sub_address(prefix.len()))
		} else {
			address.clone()
		}
	}

	pub(crate) fn attach(
		&self,
		alias: PathAddress,
		target: PathAddress,
	) -> Result<(), RegistryError> {
		self.addresses
			.set(AliasAddresses { alias, target })
			.map_err(|_| {
				RegistryError::IllegalState("alias entry is already attached".to_owned())
			})
	}

	#[inline]
	pub(crate) fn target_node(&self) -> &Arc<RegNode> {
		&self.target.node
	}
}

/// Wraps a target handler so dispatch through the alias rewrites the
/// request address before the real handler runs.
pub(crate) struct AliasHandler {
	entry: Arc<AliasEntry>,
	inner: Arc<dyn OperationHandler>,
}

impl AliasHandler {
	pub(crate) fn new(entry: Arc<AliasEntry>, inner: Arc<dyn OperationHandler>) -> Self {
		Self { entry, inner }
	}
}

impl OperationHandler for AliasHandler {
	fn execute(&self, operation: &mut OperationRequest) -> Result<(), OperationFailed> {
		operation.address = self.entry.convert_to_target(&operation.address);
		self.inner.execute(operation)
	}
}
