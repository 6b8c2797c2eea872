//! Contract-violation errors surfaced by the registries.
//!
//! Every error here is synchronous and final: nothing is retried or
//! swallowed internally. The one internally resolved conflict, two threads
//! racing to create the same sub-registry, is not an error; both callers
//! adopt the winning node.

use std::fmt;

use mast_model::PathElement;
use thiserror::Error;

/// The kind of entry a failed registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
	Submodel,
	Operation,
	Attribute,
	ProxyController,
	Alias,
}

impl fmt::Display for RegistrationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			RegistrationKind::Submodel => "submodel",
			RegistrationKind::Operation => "operation",
			RegistrationKind::Attribute => "attribute",
			RegistrationKind::ProxyController => "proxy controller",
			RegistrationKind::Alias => "alias",
		})
	}
}

/// Errors raised by registration-tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	/// A submodel, operation, attribute, proxy, or alias was registered at a
	/// name or address that is already taken.
	#[error("{kind} '{name}' is already registered at {location}")]
	DuplicateRegistration {
		location: String,
		kind: RegistrationKind,
		name: String,
	},
	/// A mutating call reached an alias or proxy node, which are terminal
	/// and reject all registration.
	#[error("registration at {location} is terminal and rejects modification")]
	AlreadyRegistered { location: String },
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
	#[error("{0}")]
	IllegalState(String),
}

/// Errors raised by resource-tree navigation and mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
	#[error("no child resource at '{element}'")]
	NoSuchChild { element: PathElement },
	#[error("a child resource already exists at '{element}'")]
	DuplicateChild { element: PathElement },
	#[error("invalid resource element: {0}")]
	InvalidElement(&'static str),
}
