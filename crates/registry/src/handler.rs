//! Boundary traits for the collaborators this core resolves but never runs:
//! operation handlers, description providers, and remote proxy controllers.

use mast_model::{ModelValue, OperationRequest, PathAddress};
use thiserror::Error;

/// Failure surfaced by a handler or a remote controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation failed: {reason}")]
pub struct OperationFailed {
	pub reason: String,
}

impl OperationFailed {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			reason: reason.into(),
		}
	}
}

/// Executes one management operation. The engine resolves a handler through
/// the registration tree, then invokes it with the request to run; alias
/// indirection hands the handler a request whose address was already
/// rewritten to the target.
pub trait OperationHandler: Send + Sync {
	fn execute(&self, operation: &mut OperationRequest) -> Result<(), OperationFailed>;
}

impl<F> OperationHandler for F
where
	F: Fn(&mut OperationRequest) -> Result<(), OperationFailed> + Send + Sync,
{
	fn execute(&self, operation: &mut OperationRequest) -> Result<(), OperationFailed> {
		self(operation)
	}
}

/// Produces the description of a resource or operation for management
/// clients. Descriptions are opaque to this core.
pub trait DescriptionProvider: Send + Sync {
	fn describe(&self) -> ModelValue;
}

impl<F> DescriptionProvider for F
where
	F: Fn() -> ModelValue + Send + Sync,
{
	fn describe(&self) -> ModelValue {
		self()
	}
}

/// A provider returning a fixed value.
pub struct StaticDescription(pub ModelValue);

impl StaticDescription {
	pub fn undefined() -> Self {
		Self(ModelValue::Undefined)
	}
}

impl DescriptionProvider for StaticDescription {
	fn describe(&self) -> ModelValue {
		self.0.clone()
	}
}

/// Forwards operations to a controller running in another process. A proxy
/// registration returns its controller for its own address and every deeper
/// one.
pub trait ProxyController: Send + Sync {
	/// The address this controller is mounted at on the remote side.
	fn proxy_address(&self) -> &PathAddress;

	fn forward(&self, operation: &mut OperationRequest) -> Result<(), OperationFailed>;
}
