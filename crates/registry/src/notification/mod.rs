//! Notification routing: matching emitted notifications to the handlers
//! that asked for them.
//!
//! Handlers register as `(handler, filter)` pairs against a source: either
//! one tree address (wildcard segments allowed) or every address at once.
//! Routing an emitted notification descends its concrete source address
//! through the same value-keyed tree as the other registries, except that
//! matching is cumulative rather than single-result: at every level both the
//! concrete child's subtree and the wildcard sibling's subtree contribute,
//! and the any-address pairs are merged in last. Each pair's filter gets the
//! final veto.

use std::fmt;
use std::sync::Arc;

use mast_model::{ModelValue, PathAddress, PathElement};
use rustc_hash::FxHashSet as HashSet;
use tracing::debug;

use crate::cow::{CowMap, CowVec};
use crate::error::RegistryError;
use crate::tree::{Subregistry, segment_values};


/// An event emitted by a resource at `source`.
#[derive(Clone, Debug)]
pub struct Notification {
	/// Notification kind, e.g. `resource-added`.
	pub kind: String,
	/// Address of the resource that emitted the notification.
	pub source: PathAddress,
	/// Human-readable description of the event.
	pub message: String,
	/// Kind-specific payload.
	pub data: ModelValue,
}

impl Notification {
	pub fn new(kind: impl Into<String>, source: PathAddress, message: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			source,
			message: message.into(),
			data: ModelValue::Undefined,
		}
	}

	pub fn with_data(mut self, data: ModelValue) -> Self {
		self.data = data;
		self
	}
}

impl fmt::Display for Notification {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} from {}: {}", self.kind, self.source, self.message)
	}
}

/// Receives the notifications its registration matched.
pub trait NotificationHandler: Send + Sync {
	fn handle(&self, notification: &Notification);
}

impl<F> NotificationHandler for F
where
	F: Fn(&Notification) + Send + Sync,
{
	fn handle(&self, notification: &Notification) {
		self(notification)
	}
}

/// Per-registration veto applied after address matching.
pub trait NotificationFilter: Send + Sync {
	fn matches(&self, notification: &Notification) -> bool;
}

impl<F> NotificationFilter for F
where
	F: Fn(&Notification) -> bool + Send + Sync,
{
	fn matches(&self, notification: &Notification) -> bool {
		self(notification)
	}
}

/// The filter that accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterAll;

impl NotificationFilter for FilterAll {
	fn matches(&self, _notification: &Notification) -> bool {
		true
	}
}

/// Where a handler wants its notifications from.
#[derive(Clone, Debug)]
pub enum NotificationSource {
	/// Every notification, whatever its source address.
	Any,
	/// Notifications from one address; wildcard segments match any value.
	Address(PathAddress),
}

impl From<PathAddress> for NotificationSource {
	fn from(address: PathAddress) -> Self {
		Self::Address(address)
	}
}

impl fmt::Display for NotificationSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Any => f.write_str("<any>"),
			Self::Address(address) => address.fmt(f),
		}
	}
}

struct HandlerPair {
	handler: Arc<dyn NotificationHandler>,
	filter: Arc<dyn NotificationFilter>,
}

impl HandlerPair {
	/// Registration identity is the pair of objects, not their behavior.
	fn is_pair(&self, handler: &Arc<dyn NotificationHandler>, filter: &Arc<dyn NotificationFilter>) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.handler), Arc::as_ptr(handler))
			&& std::ptr::addr_eq(Arc::as_ptr(&self.filter), Arc::as_ptr(filter))
	}
}

impl Clone for HandlerPair {
	fn clone(&self) -> Self {
		Self {
			handler: Arc::clone(&self.handler),
			filter: Arc::clone(&self.filter),
		}
	}
}

struct RouteNode {
	pairs: CowVec<HandlerPair>,
	children: CowMap<Box<str>, Arc<Subregistry<Arc<RouteNode>>>>,
}

impl RouteNode {
	fn new() -> Self {
		Self {
			pairs: CowVec::new(),
			children: CowMap::new(),
		}
	}

	fn bucket_or_create(&self, key: &str) -> Arc<Subregistry<Arc<RouteNode>>> {
		if let Some(existing) = self.children.get(key) {
			return existing;
		}
		let fresh = Arc::new(Subregistry::new());
		self.children
			.put_if_absent(Box::from(key), Arc::clone(&fresh))
			.unwrap_or(fresh)
	}

	fn collect(
		&self,
		address: &[PathElement],
		notification: &Notification,
		found: &mut Vec<Arc<dyn NotificationHandler>>,
	) {
		let Some((head, rest)) = address.split_first() else {
			for pair in self.pairs.snapshot().iter() {
				if pair.filter.matches(notification) {
					found.push(Arc::clone(&pair.handler));
				}
			}
			return;
		};
		let Some(bucket) = self.children.get(head.key()) else {
			return;
		};
		for value in segment_values(head) {
			bucket.each_match(value, |child| child.collect(rest, notification, found));
		}
	}
}

/// Routes emitted notifications to registered `(handler, filter)` pairs.
pub struct NotificationHandlerRegistry {
	root: Arc<RouteNode>,
	any_address: CowVec<HandlerPair>,
}

impl NotificationHandlerRegistry {
	pub fn new() -> Self {
		Self {
			root: Arc::new(RouteNode::new()),
			any_address: CowVec::new(),
		}
	}

	/// Registers a `(handler, filter)` pair against `source`. The same pair
	/// may be registered at several sources; each registration routes
	/// independently.
	pub fn register(
		&self,
		source: NotificationSource,
		handler: Arc<dyn NotificationHandler>,
		filter: Arc<dyn NotificationFilter>,
	) -> Result<(), RegistryError> {
		match source {
			NotificationSource::Any => {
				self.any_address.push(HandlerPair { handler, filter });
				debug!(source = "<any>", "registered notification handler");
			}
			NotificationSource::Address(address) => {
				let node = self.node_or_create(&address)?;
				node.pairs.push(HandlerPair { handler, filter });
				debug!(source = %address, "registered notification handler");
			}
		}
		Ok(())
	}

	/// Removes every registration of exactly this `(handler, filter)` pair at
	/// `source`, comparing both members by object identity. Unregistering a
	/// pair that was never registered there is a no-op.
	pub fn unregister(
		&self,
		source: &NotificationSource,
		handler: &Arc<dyn NotificationHandler>,
		filter: &Arc<dyn NotificationFilter>,
	) -> Result<(), RegistryError> {
		match source {
			NotificationSource::Any => {
				self.any_address.retain(|pair| !pair.is_pair(handler, filter));
			}
			NotificationSource::Address(address) => {
				if let Some(node) = self.node_at(address)? {
					node.pairs.retain(|pair| !pair.is_pair(handler, filter));
				}
			}
		}
		debug!(source = %source, "unregistered notification handler");
		Ok(())
	}

	/// Every handler whose registration matches the notification's source
	/// address and whose filter accepts it, each at most once. Address pairs
	/// come first, any-address pairs are merged in last.
	pub fn find_handlers(&self, notification: &Notification) -> Vec<Arc<dyn NotificationHandler>> {
		let mut found = Vec::new();
		self.root
			.collect(notification.source.elements(), notification, &mut found);
		for pair in self.any_address.snapshot().iter() {
			if pair.filter.matches(notification) {
				found.push(Arc::clone(&pair.handler));
			}
		}
		let mut seen = HashSet::default();
		found.retain(|handler| seen.insert(Arc::as_ptr(handler) as *const () as usize));
		found
	}

	fn node_or_create(&self, address: &PathAddress) -> Result<Arc<RouteNode>, RegistryError> {
		let mut node = Arc::clone(&self.root);
		for element in address {
			let Some(slot) = element.value().as_single() else {
				return Err(RegistryError::InvalidArgument(
					"a notification source cannot contain multi-target segments",
				));
			};
			let bucket = node.bucket_or_create(element.key());
			node = bucket.get_or_insert_with(slot, || Arc::new(RouteNode::new()));
		}
		Ok(node)
	}

	/// Finds the node at exactly this address; wildcard segments address the
	/// wildcard slot itself, they do not fan out.
	fn node_at(&self, address: &PathAddress) -> Result<Option<Arc<RouteNode>>, RegistryError> {
		let mut node = Arc::clone(&self.root);
		for element in address {
			let Some(slot) = element.value().as_single() else {
				return Err(RegistryError::InvalidArgument(
					"a notification source cannot contain multi-target segments",
				));
			};
			let Some(next) = node.children.get(element.key()).and_then(|bucket| bucket.get(slot)) else {
				return Ok(None);
			};
			node = next;
		}
		Ok(Some(node))
	}
}

impl Default for NotificationHandlerRegistry {
	fn default() -> Self {
		Self::new()
	}
}
