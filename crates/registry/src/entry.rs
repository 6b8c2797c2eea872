//! Per-name metadata stored in registration nodes: operation entries and
//! attribute descriptors.

use std::sync::Arc;

use bitflags::bitflags;

use crate::handler::{DescriptionProvider, OperationHandler};

/// Whether an operation shows up in enumeration for management clients.
/// Private entries stay resolvable by name but are dropped from
/// [operation descriptions](crate::ManagementRegistration::operation_descriptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
	Public,
	Private,
}

bitflags! {
	/// Behavioral flags carried by an operation entry, surfaced to the
	/// engine via `operation_flags`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct OperationFlags: u8 {
		/// The operation never writes the model.
		const READ_ONLY = 1 << 0;
		/// The operation touches runtime services only.
		const RUNTIME_ONLY = 1 << 1;
		/// Hidden from casual discovery; still resolvable by name.
		const HIDDEN = 1 << 2;
		const RESTART_RESOURCE_SERVICES = 1 << 3;
		const RESTART_ALL_SERVICES = 1 << 4;
		const RESTART_JVM = 1 << 5;
	}
}

/// One registered operation: its handler, description, and dispatch
/// metadata. An entry registered with `inherited` is visible at every
/// registered descendant address until a descendant registers the same name
/// locally.
#[derive(Clone)]
pub struct OperationEntry {
	pub handler: Arc<dyn OperationHandler>,
	pub description: Arc<dyn DescriptionProvider>,
	pub inherited: bool,
	pub entry_type: EntryType,
	pub flags: OperationFlags,
}

impl OperationEntry {
	#[inline]
	pub fn is_inherited(&self) -> bool {
		self.inherited
	}

	#[inline]
	pub fn is_private(&self) -> bool {
		self.entry_type == EntryType::Private
	}
}

/// How an attribute may be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
	ReadOnly,
	ReadWrite,
	Metric,
}

/// Where an attribute's value lives: the persistent configuration model or
/// runtime services only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
	Configuration,
	Runtime,
}

bitflags! {
	/// Side-effect flags for attribute writes.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct AttributeFlags: u8 {
		const RESTART_RESOURCE_SERVICES = 1 << 0;
		const RESTART_ALL_SERVICES = 1 << 1;
		const RESTART_JVM = 1 << 2;
	}
}

/// One registered attribute. The constructors hold the access invariants:
/// read-write access always carries a write handler, and a metric is always
/// runtime storage with metric access.
#[derive(Clone)]
pub struct AttributeAccess {
	pub access: AccessType,
	pub storage: Storage,
	pub read_handler: Option<Arc<dyn OperationHandler>>,
	pub write_handler: Option<Arc<dyn OperationHandler>>,
	pub flags: AttributeFlags,
}

impl AttributeAccess {
	/// A read-only attribute. Without a read handler the engine reads the
	/// value straight from the model.
	pub fn read_only(storage: Storage, read_handler: Option<Arc<dyn OperationHandler>>) -> Self {
		Self {
			access: AccessType::ReadOnly,
			storage,
			read_handler,
			write_handler: None,
			flags: AttributeFlags::empty(),
		}
	}

	pub fn read_write(
		storage: Storage,
		read_handler: Option<Arc<dyn OperationHandler>>,
		write_handler: Arc<dyn OperationHandler>,
	) -> Self {
		Self {
			access: AccessType::ReadWrite,
			storage,
			read_handler,
			write_handler: Some(write_handler),
			flags: AttributeFlags::empty(),
		}
	}

	/// A metric: runtime-held, read through its handler, never written.
	pub fn metric(read_handler: Arc<dyn OperationHandler>) -> Self {
		Self {
			access: AccessType::Metric,
			storage: Storage::Runtime,
			read_handler: Some(read_handler),
			write_handler: None,
			flags: AttributeFlags::empty(),
		}
	}

	pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
		self.flags = flags;
		self
	}
}
