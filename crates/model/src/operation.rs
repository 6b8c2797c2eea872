//! Management requests resolved and dispatched through the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::PathAddress;
use crate::value::ModelValue;

/// One management request: an operation name, the address it targets, and
/// its parameters. Alias indirection rewrites `address` in place before the
/// target handler runs; operation transformers may rewrite the whole
/// request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
	pub name: String,
	pub address: PathAddress,
	pub params: ModelValue,
}

impl OperationRequest {
	pub fn new(name: impl Into<String>, address: PathAddress) -> Self {
		Self {
			name: name.into(),
			address,
			params: ModelValue::Undefined,
		}
	}

	/// Sets one named parameter, promoting the parameter block to an object.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ModelValue>) -> Self {
		self.params.set(key, value);
		self
	}

	pub fn with_params(mut self, params: ModelValue) -> Self {
		self.params = params;
		self
	}
}

impl fmt::Display for OperationRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} @ {}", self.name, self.address)
	}
}
