//! Proxy indirection: a terminal node standing in for a remote controller.
//!
//! A proxy answers every operation name at its own address and any deeper
//! one with a single private forwarding entry, enumerates nothing, and
//! reports itself remote and runtime-only.

use std::sync::Arc;

use mast_model::OperationRequest;

use crate::entry::{EntryType, OperationEntry, OperationFlags};
use crate::handler::{OperationFailed, OperationHandler, ProxyController, StaticDescription};

pub(crate) struct ProxyNode {
	controller: Arc<dyn ProxyController>,
	entry: Arc<OperationEntry>,
}

impl ProxyNode {
	pub(crate) fn new(controller: Arc<dyn ProxyController>) -> Self {
		let entry = Arc::new(OperationEntry {
			handler: Arc::new(ForwardHandler {
				controller: Arc::clone(&controller),
			}),
			description: Arc::new(StaticDescription::undefined()),
			inherited: false,
			entry_type: EntryType::Private,
			flags: OperationFlags::empty(),
		});
		Self { controller, entry }
	}

	#[inline]
	pub(crate) fn controller(&self) -> &Arc<dyn ProxyController> {
		&self.controller
	}

	#[inline]
	pub(crate) fn entry(&self) -> &Arc<OperationEntry> {
		&self.entry
	}
}

/// The proxy's one handler: hand the request to the remote controller
/// unchanged.
struct ForwardHandler {
	controller: Arc<dyn ProxyController>,
}

impl OperationHandler for ForwardHandler {
	fn execute(&self, operation: &mut OperationRequest) -> Result<(), OperationFailed> {
		self.controller.forward(operation)
	}
}
