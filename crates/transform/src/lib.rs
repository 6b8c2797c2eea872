//! Operation transformation between management model revisions.
//!
//! A coordinating process manages peers whose model schemas lag behind its
//! own. Before an operation is relayed to such a peer, it passes through a
//! transformer registered for the peer's schema version at the operation's
//! address: rewritten to the older shape, forwarded unchanged, or discarded
//! outright because the target version has no counterpart for it.
//!
//! Registrations accumulate in a version-agnostic [`GlobalTransformerRegistry`]
//! keyed by address, version, and operation name. Per peer, [`resolve`]
//! flattens that tree into an [`OperationTransformerRegistry`] fixed to the
//! peer's versions, which the relay path then queries per operation.
//!
//! [`resolve`]: GlobalTransformerRegistry::resolve

/// Transformer entries and the policies they carry.
pub mod entry;
/// The version-agnostic registration tree and its resolution walk.
pub mod global;
/// Version-resolved registries queried on the relay path.
pub mod resolved;

pub use entry::{
	OperationTransformer, OperationTransformerEntry, TransformPolicy, TransformedOperation,
};
pub use global::{AddressVersionMap, GlobalTransformerRegistry};
pub use resolved::OperationTransformerRegistry;
