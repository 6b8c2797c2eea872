//! Concurrent, path-addressable registries for the management model.
//!
//! Subsystems register resources, attributes, operations, and indirections
//! (aliases, proxies) at arbitrary tree addresses; the execution engine then
//! resolves "what handles this request at this address" with wildcard,
//! inheritance, and indirection semantics under concurrent access. Reads
//! never block: every map is an atomically swapped immutable snapshot, and
//! writers install new snapshots with compare-and-swap retry.

/// Copy-on-write map and list primitives behind atomic snapshot swaps.
pub mod cow;
/// Operation entries, attribute descriptors, and their flag sets.
pub mod entry;
/// Error taxonomy for registration and resource navigation.
pub mod error;
/// Boundary traits implemented by execution-engine collaborators.
pub mod handler;
/// Notification routing: matching emitted notifications to handlers.
pub mod notification;
/// The registration tree: concrete nodes, aliases, and proxies.
pub mod registration;
/// The resource tree holding runtime configuration state.
pub mod resource;
/// The generic copy-on-write value tree shared by address registries.
pub mod tree;

pub use cow::{CowMap, CowVec};
pub use entry::{
	AccessType, AttributeAccess, AttributeFlags, EntryType, OperationEntry, OperationFlags,
	Storage,
};
pub use error::{RegistrationKind, RegistryError, ResourceError};
pub use handler::{
	DescriptionProvider, OperationFailed, OperationHandler, ProxyController, StaticDescription,
};
pub use notification::{
	FilterAll, Notification, NotificationFilter, NotificationHandler, NotificationHandlerRegistry,
	NotificationSource,
};
pub use registration::{AliasEntry, ManagementRegistration, OperationDef, SubModelDef};
pub use resource::{Resource, ResourceRoot};
pub use tree::Subregistry;
