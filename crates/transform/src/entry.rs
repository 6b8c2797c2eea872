//! What happens to one operation headed for an older peer.

use std::fmt;
use std::sync::Arc;

use mast_model::{OperationRequest, PathAddress};

/// How a resolved registration treats an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformPolicy {
	/// Rewrite through a registered [`OperationTransformer`].
	Transform,
	/// Relay unchanged. Also the policy of every unregistered operation.
	Forward,
	/// Drop without relaying; the target version has no counterpart.
	Discard,
}

/// Outcome of transforming one operation: the rewritten request, or nothing
/// when the transformer decided mid-flight that the peer must not see it.
#[derive(Clone, Debug)]
pub struct TransformedOperation {
	operation: Option<OperationRequest>,
}

impl TransformedOperation {
	pub fn new(operation: OperationRequest) -> Self {
		Self {
			operation: Some(operation),
		}
	}

	pub fn discarded() -> Self {
		Self {
			operation: None,
		}
	}

	#[inline]
	pub fn is_discarded(&self) -> bool {
		self.operation.is_none()
	}

	#[inline]
	pub fn operation(&self) -> Option<&OperationRequest> {
		self.operation.as_ref()
	}

	#[inline]
	pub fn into_operation(self) -> Option<OperationRequest> {
		self.operation
	}
}

/// Rewrites operations addressed at one subtree into an older model shape.
pub trait OperationTransformer: Send + Sync {
	/// `address` is the operation's resolved target; for registrations at a
	/// wildcard slot it carries the concrete values of the actual request.
	fn transform(&self, address: &PathAddress, operation: &OperationRequest) -> TransformedOperation;
}

impl<F> OperationTransformer for F
where
	F: Fn(&PathAddress, &OperationRequest) -> TransformedOperation + Send + Sync,
{
	fn transform(&self, address: &PathAddress, operation: &OperationRequest) -> TransformedOperation {
		self(address, operation)
	}
}

/// A policy plus, for [`TransformPolicy::Transform`], the transformer to run.
#[derive(Clone)]
pub struct OperationTransformerEntry {
	policy: TransformPolicy,
	transformer: Option<Arc<dyn OperationTransformer>>,
}

impl OperationTransformerEntry {
	pub fn forward() -> Self {
		Self {
			policy: TransformPolicy::Forward,
			transformer: None,
		}
	}

	pub fn discard() -> Self {
		Self {
			policy: TransformPolicy::Discard,
			transformer: None,
		}
	}

	pub fn transforming(transformer: Arc<dyn OperationTransformer>) -> Self {
		Self {
			policy: TransformPolicy::Transform,
			transformer: Some(transformer),
		}
	}

	#[inline]
	pub fn policy(&self) -> TransformPolicy {
		self.policy
	}

	/// `Some` exactly when the policy is [`TransformPolicy::Transform`].
	#[inline]
	pub fn transformer(&self) -> Option<&Arc<dyn OperationTransformer>> {
		self.transformer.as_ref()
	}

	/// Applies the policy to one operation.
	pub fn transform(&self, address: &PathAddress, operation: &OperationRequest) -> TransformedOperation {
		match (&self.policy, &self.transformer) {
			(TransformPolicy::Transform, Some(transformer)) => {
				transformer.transform(address, operation)
			}
			(TransformPolicy::Discard, _) => TransformedOperation::discarded(),
			_ => TransformedOperation::new(operation.clone()),
		}
	}
}

impl fmt::Debug for OperationTransformerEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OperationTransformerEntry")
			.field("policy", &self.policy)
			.finish_non_exhaustive()
	}
}
