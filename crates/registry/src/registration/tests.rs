use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mast_model::{ModelValue, OperationRequest, PathAddress, PathElement};

use super::{AliasEntry, ManagementRegistration, OperationDef, SubModelDef};
use crate::entry::Storage;
use crate::error::{RegistrationKind, RegistryError};
use crate::handler::{
	DescriptionProvider, OperationFailed, OperationHandler, ProxyController, StaticDescription,
};

fn new_root() -> ManagementRegistration {
	ManagementRegistration::root(Arc::new(StaticDescription::undefined()))
}

fn noop() -> Arc<dyn OperationHandler> {
	Arc::new(|_: &mut OperationRequest| Ok(()))
}

fn addr(text: &str) -> PathAddress {
	text.parse().unwrap()
}

/// Handler that records every address it was invoked with.
fn recording(seen: &Arc<Mutex<Vec<PathAddress>>>) -> Arc<dyn OperationHandler> {
	let seen = Arc::clone(seen);
	Arc::new(move |op: &mut OperationRequest| {
		seen.lock().unwrap().push(op.address.clone());
		Ok(())
	})
}

struct TestProxy {
	address: PathAddress,
	forwarded: AtomicUsize,
}

impl TestProxy {
	fn mounted(address: PathAddress) -> Arc<dyn ProxyController> {
		Arc::new(Self {
			address,
			forwarded: AtomicUsize::new(0),
		})
	}
}

impl ProxyController for TestProxy {
	fn proxy_address(&self) -> &PathAddress {
		&self.address
	}

	fn forward(&self, _operation: &mut OperationRequest) -> Result<(), OperationFailed> {
		self.forwarded.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

#[test]
fn test_duplicate_submodel_rejected() {
	let root = new_root();
	root.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap();
	let err = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap_err();
	assert!(matches!(
		err,
		RegistryError::DuplicateRegistration {
			kind: RegistrationKind::Submodel,
			..
		}
	));
}

#[test]
fn test_wildcard_and_concrete_children_coexist() {
	let root = new_root();
	root.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap();
	root.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	assert!(root.sub_registration(&addr("/subsystem=web")).is_some());
	assert!(root.sub_registration(&addr("/subsystem=*")).is_some());
}

#[test]
fn test_multi_target_submodel_rejected() {
	let root = new_root();
	let err = root
		.register_sub_model(SubModelDef::new(PathElement::multi("subsystem", ["a", "b"])))
		.unwrap_err();
	assert!(matches!(err, RegistryError::InvalidArgument(_)));
}

#[test]
fn test_wildcard_sibling_answers_for_concrete_address() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	let handler = noop();
	wildcard
		.register_operation_handler(
			OperationDef::new("read-config", Arc::clone(&handler)).inherited(),
		)
		.unwrap();
	root.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();

	let resolved = root
		.operation_handler(&addr("/subsystem=foo"), "read-config")
		.unwrap();
	assert!(Arc::ptr_eq(&resolved, &handler));
}

#[test]
fn test_local_registration_shadows_wildcard_sibling() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	let inherited = noop();
	wildcard
		.register_operation_handler(
			OperationDef::new("read-config", Arc::clone(&inherited)).inherited(),
		)
		.unwrap();
	let foo = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();
	let local = noop();
	foo.register_operation_handler(OperationDef::new("read-config", Arc::clone(&local)))
		.unwrap();

	let resolved = root
		.operation_handler(&addr("/subsystem=foo"), "read-config")
		.unwrap();
	assert!(Arc::ptr_eq(&resolved, &local));
	assert!(!Arc::ptr_eq(&resolved, &inherited));
}

#[test]
fn test_inherited_operation_visible_below_registering_node() {
	let root = new_root();
	let subsystem = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	let handler = noop();
	subsystem
		.register_operation_handler(OperationDef::new("ping", Arc::clone(&handler)).inherited())
		.unwrap();
	subsystem
		.register_sub_model(SubModelDef::new(PathElement::new("connector", "http")))
		.unwrap();

	// the registered descendant sees the ancestor's inherited entry
	let resolved = root
		.operation_handler(&addr("/subsystem=web/connector=http"), "ping")
		.unwrap();
	assert!(Arc::ptr_eq(&resolved, &handler));
}

#[test]
fn test_inherited_operation_invisible_at_unregistered_address() {
	let root = new_root();
	let subsystem = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	subsystem
		.register_operation_handler(OperationDef::new("ping", noop()).inherited())
		.unwrap();
	subsystem
		.register_sub_model(SubModelDef::new(PathElement::new("connector", "http")))
		.unwrap();

	// connector=ajp was never registered, so the descent dead-ends even
	// though an inherited candidate was in hand
	assert!(
		root.operation_handler(&addr("/subsystem=web/connector=ajp"), "ping")
			.is_none()
	);
	assert!(
		root.operation_handler(&addr("/subsystem=web/listener=default"), "ping")
			.is_none()
	);
}

#[test]
fn test_nearest_ancestor_inherited_entry_wins() {
	let root = new_root();
	let outer = noop();
	root.register_operation_handler(OperationDef::new("ping", Arc::clone(&outer)).inherited())
		.unwrap();
	let subsystem = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap();
	let inner = noop();
	subsystem
		.register_operation_handler(OperationDef::new("ping", Arc::clone(&inner)).inherited())
		.unwrap();
	subsystem
		.register_sub_model(SubModelDef::new(PathElement::new("connector", "http")))
		.unwrap();

	let resolved = root
		.operation_handler(&addr("/subsystem=web/connector=http"), "ping")
		.unwrap();
	assert!(Arc::ptr_eq(&resolved, &inner));
}

#[test]
fn test_attribute_names_merge_wildcard_and_concrete() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	wildcard
		.register_read_only_attribute("x", None, Storage::Configuration)
		.unwrap();
	let foo = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();
	foo.register_read_only_attribute("y", None, Storage::Configuration)
		.unwrap();

	assert_eq!(root.attribute_names(&addr("/subsystem=foo")), ["x", "y"]);
	// the wildcard address only sees the wildcard node
	assert_eq!(root.attribute_names(&addr("/subsystem=*")), ["x"]);
}

#[test]
fn test_attribute_access_concrete_wins_over_wildcard() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	wildcard
		.register_read_only_attribute("port", None, Storage::Configuration)
		.unwrap();
	let foo = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();
	let write = noop();
	foo.register_read_write_attribute("port", None, Arc::clone(&write), Storage::Configuration)
		.unwrap();

	let access = root
		.attribute_access(&addr("/subsystem=foo"), "port")
		.unwrap();
	assert!(access.write_handler.is_some());
}

#[test]
fn test_duplicate_operation_and_attribute_rejected() {
	let root = new_root();
	root.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap();
	let err = root
		.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap_err();
	assert!(matches!(
		err,
		RegistryError::DuplicateRegistration {
			kind: RegistrationKind::Operation,
			..
		}
	));

	root.register_read_only_attribute("attr", None, Storage::Configuration)
		.unwrap();
	let err = root
		.register_metric("attr", noop())
		.unwrap_err();
	assert!(matches!(
		err,
		RegistryError::DuplicateRegistration {
			kind: RegistrationKind::Attribute,
			..
		}
	));
}

#[test]
fn test_private_operation_resolvable_but_not_enumerated() {
	let root = new_root();
	let handler = noop();
	root.register_operation_handler(
		OperationDef::new("internal-sync", Arc::clone(&handler)).private(),
	)
	.unwrap();
	root.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap();

	assert!(
		root.operation_handler(&PathAddress::empty(), "internal-sync")
			.is_some()
	);
	let descriptions = root.operation_descriptions(&PathAddress::empty(), false);
	assert!(descriptions.contains_key("add"));
	assert!(!descriptions.contains_key("internal-sync"));
}

#[test]
fn test_operation_descriptions_concrete_overwrites_wildcard() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	wildcard
		.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap();
	wildcard
		.register_operation_handler(OperationDef::new("remove", noop()))
		.unwrap();
	let foo = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();
	let concrete_add = noop();
	foo.register_operation_handler(OperationDef::new("add", Arc::clone(&concrete_add)))
		.unwrap();

	let descriptions = root.operation_descriptions(&addr("/subsystem=foo"), false);
	assert_eq!(descriptions.len(), 2);
	assert!(Arc::ptr_eq(&descriptions["add"].handler, &concrete_add));
	assert!(descriptions.contains_key("remove"));
}

#[test]
fn test_operation_descriptions_inherited_walk() {
	let root = new_root();
	let global = noop();
	root.register_operation_handler(
		OperationDef::new("read-resource", Arc::clone(&global)).inherited(),
	)
	.unwrap();
	root.register_operation_handler(OperationDef::new("root-only", noop()))
		.unwrap();
	let subsystem = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap();
	let shadow = noop();
	subsystem
		.register_operation_handler(
			OperationDef::new("read-resource", Arc::clone(&shadow)).inherited(),
		)
		.unwrap();
	subsystem
		.register_sub_model(SubModelDef::new(PathElement::new("connector", "http")))
		.unwrap();

	let plain = root.operation_descriptions(&addr("/subsystem=web/connector=http"), false);
	assert!(plain.is_empty());

	let merged = root.operation_descriptions(&addr("/subsystem=web/connector=http"), true);
	assert_eq!(merged.len(), 1);
	// the nearer ancestor's entry shadows the root's
	assert!(Arc::ptr_eq(&merged["read-resource"].handler, &shadow));
	// non-inherited ancestor entries never flow down
	assert!(!merged.contains_key("root-only"));
}

#[test]
fn test_cross_branch_wildcard_fallback() {
	let root = new_root();
	let concrete_parent = root
		.register_sub_model(SubModelDef::new(PathElement::new("parent", "ext")))
		.unwrap();
	concrete_parent
		.register_sub_model(SubModelDef::new(PathElement::new("child", "ext")))
		.unwrap();
	let wildcard_parent = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("parent")))
		.unwrap();
	let wildcard_child = wildcard_parent
		.register_sub_model(SubModelDef::new(PathElement::wildcard("child")))
		.unwrap();
	wildcard_parent
		.register_sub_model(SubModelDef::new(PathElement::new("child", "wild-ext")))
		.unwrap();
	wildcard_child
		.register_read_only_attribute("shared", None, Storage::Configuration)
		.unwrap();

	// /parent=ext has no child=wild-ext, so the concrete branch dead-ends
	// and the wildcard parent's subtree answers instead
	assert!(
		root.attribute_access(&addr("/parent=ext/child=wild-ext"), "shared")
			.is_some()
	);
	// within the wildcard parent, the wildcard child answers for any value
	assert!(
		root.attribute_access(&addr("/parent=other/child=anything"), "shared")
			.is_some()
	);
	// fully unregistered child type stays unresolvable
	assert!(
		root.attribute_access(&addr("/parent=ext/grandchild=x"), "shared")
			.is_none()
	);
}

#[test]
fn test_root_invocation_from_child_handle() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	let handler = noop();
	wildcard
		.register_operation_handler(OperationDef::new("describe", Arc::clone(&handler)))
		.unwrap();
	let foo = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();

	// the concrete handle has no local entry; resolution from the root
	// lets its wildcard sibling answer
	let resolved = foo
		.operation_handler(&PathAddress::empty(), "describe")
		.unwrap();
	assert!(Arc::ptr_eq(&resolved, &handler));
	assert_eq!(foo.path_address(), Some(addr("/subsystem=foo")));
	assert_eq!(foo.location(), "/subsystem=foo");
}

#[test]
fn test_multi_target_enumeration_unions() {
	let root = new_root();
	let one = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "one")))
		.unwrap();
	one.register_read_only_attribute("x", None, Storage::Configuration)
		.unwrap();
	let two = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "two")))
		.unwrap();
	two.register_read_only_attribute("y", None, Storage::Configuration)
		.unwrap();

	let multi = PathAddress::of(PathElement::multi("subsystem", ["one", "two"]));
	assert_eq!(root.attribute_names(&multi), ["x", "y"]);
}

#[test]
fn test_multi_target_lookup_takes_first_listed_match() {
	let root = new_root();
	let one = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "one")))
		.unwrap();
	let first = noop();
	one.register_operation_handler(OperationDef::new("op", Arc::clone(&first)))
		.unwrap();
	let two = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "two")))
		.unwrap();
	let second = noop();
	two.register_operation_handler(OperationDef::new("op", Arc::clone(&second)))
		.unwrap();

	let multi = PathAddress::of(PathElement::multi("subsystem", ["one", "two"]));
	let resolved = root.operation_handler(&multi, "op").unwrap();
	assert!(Arc::ptr_eq(&resolved, &first));

	let skip_missing = PathAddress::of(PathElement::multi("subsystem", ["absent", "two"]));
	let resolved = root.operation_handler(&skip_missing, "op").unwrap();
	assert!(Arc::ptr_eq(&resolved, &second));
}

#[test]
fn test_child_names_and_addresses() {
	let root = new_root();
	root.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "a")))
		.unwrap();
	root.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	root.register_sub_model(SubModelDef::new(PathElement::new("interface", "public")))
		.unwrap();

	assert_eq!(
		root.child_names(&PathAddress::empty()),
		["interface", "subsystem"]
	);
	assert_eq!(
		root.child_addresses(&PathAddress::empty()),
		[
			PathElement::new("interface", "public"),
			PathElement::wildcard("subsystem"),
			PathElement::new("subsystem", "a"),
		]
	);
}

#[test]
fn test_runtime_only_parent_rejects_persistent_child() {
	let root = new_root();
	let service = root
		.register_sub_model(SubModelDef::new(PathElement::new("service", "jmx")).runtime_only())
		.unwrap();
	assert!(service.is_runtime_only());

	let err = service
		.register_sub_model(SubModelDef::new(PathElement::new("config", "main")))
		.unwrap_err();
	assert!(matches!(err, RegistryError::IllegalState(_)));

	service
		.register_sub_model(SubModelDef::new(PathElement::new("config", "main")).runtime_only())
		.unwrap();
}

#[test]
fn test_wildcard_parent_rejects_runtime_only_child() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	let err = wildcard
		.register_sub_model(SubModelDef::new(PathElement::new("runtime", "stats")).runtime_only())
		.unwrap_err();
	assert!(matches!(err, RegistryError::IllegalState(_)));

	wildcard
		.register_sub_model(SubModelDef::new(PathElement::new("runtime", "stats")))
		.unwrap();
}

#[test]
fn test_immutable_submodel_rejects_registration_but_answers_reads() {
	let root = new_root();
	let description: Arc<dyn DescriptionProvider> =
		Arc::new(StaticDescription(ModelValue::from("locked")));
	let locked = root
		.register_sub_model(
			SubModelDef::new(PathElement::new("core", "layout"))
				.describe(Arc::clone(&description))
				.immutable(),
		)
		.unwrap();

	let err = locked
		.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap_err();
	assert!(matches!(err, RegistryError::IllegalState(_)));
	let err = locked
		.register_sub_model(SubModelDef::new(PathElement::new("sub", "x")))
		.unwrap_err();
	assert!(matches!(err, RegistryError::IllegalState(_)));

	let resolved = root.model_description(&addr("/core=layout")).unwrap();
	assert_eq!(resolved.describe(), ModelValue::from("locked"));
}

#[test]
fn test_unregister_sub_model_removes_subtree_from_resolution() {
	let root = new_root();
	let web = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap();
	web.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap();
	assert!(root.operation_handler(&addr("/subsystem=web"), "add").is_some());

	root.unregister_sub_model(&PathElement::new("subsystem", "web"))
		.unwrap();
	assert!(root.operation_handler(&addr("/subsystem=web"), "add").is_none());
	assert!(root.sub_registration(&addr("/subsystem=web")).is_none());
	// absent slots are a no-op
	root.unregister_sub_model(&PathElement::new("subsystem", "web"))
		.unwrap();

	// the held handle still knows its address but resolves nothing
	assert_eq!(web.path_address(), Some(addr("/subsystem=web")));
	assert!(web.operation_handler(&PathAddress::empty(), "add").is_none());
}

#[test]
fn test_unregister_operation_uncovers_wildcard_sibling() {
	let root = new_root();
	let wildcard = root
		.register_sub_model(SubModelDef::new(PathElement::wildcard("subsystem")))
		.unwrap();
	let fallback = noop();
	wildcard
		.register_operation_handler(OperationDef::new("add", Arc::clone(&fallback)))
		.unwrap();
	let foo = root
		.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "foo")))
		.unwrap();
	let local = noop();
	foo.register_operation_handler(OperationDef::new("add", Arc::clone(&local)))
		.unwrap();

	let resolved = root.operation_handler(&addr("/subsystem=foo"), "add").unwrap();
	assert!(Arc::ptr_eq(&resolved, &local));

	foo.unregister_operation_handler("add").unwrap();
	let resolved = root.operation_handler(&addr("/subsystem=foo"), "add").unwrap();
	assert!(Arc::ptr_eq(&resolved, &fallback));
}

#[test]
fn test_unregister_attribute() {
	let root = new_root();
	root.register_read_only_attribute("attr", None, Storage::Configuration)
		.unwrap();
	assert!(root.attribute_access(&PathAddress::empty(), "attr").is_some());
	root.unregister_attribute("attr").unwrap();
	assert!(root.attribute_access(&PathAddress::empty(), "attr").is_none());
	root.unregister_attribute("attr").unwrap();
}

#[test]
fn test_alias_reads_delegate_to_target() {
	let root = new_root();
	let management = root
		.register_sub_model(SubModelDef::new(PathElement::new("interface", "management")))
		.unwrap();
	management
		.register_read_only_attribute("inet-address", None, Storage::Configuration)
		.unwrap();
	management
		.register_sub_model(SubModelDef::new(PathElement::new("protocol", "http")))
		.unwrap();
	root.register_alias(
		PathElement::new("interface", "public"),
		AliasEntry::new(management.clone()),
	)
	.unwrap();

	assert_eq!(
		root.attribute_names(&addr("/interface=public")),
		root.attribute_names(&addr("/interface=management"))
	);
	assert!(
		root.attribute_access(&addr("/interface=public"), "inet-address")
			.is_some()
	);
	// descent through the alias resolves in the target subtree
	assert!(
		root.model_description(&addr("/interface=public/protocol=http"))
			.is_some()
	);
	assert_eq!(root.child_names(&addr("/interface=public")), ["protocol"]);
}

#[test]
fn test_alias_dispatch_rewrites_operation_address() {
	let root = new_root();
	let management = root
		.register_sub_model(SubModelDef::new(PathElement::new("interface", "management")))
		.unwrap();
	let seen = Arc::new(Mutex::new(Vec::new()));
	management
		.register_operation_handler(OperationDef::new("describe", recording(&seen)))
		.unwrap();
	root.register_alias(
		PathElement::new("interface", "public"),
		AliasEntry::new(management),
	)
	.unwrap();

	let handler = root
		.operation_handler(&addr("/interface=public"), "describe")
		.unwrap();
	let mut operation = OperationRequest::new("describe", addr("/interface=public"));
	handler.execute(&mut operation).unwrap();

	// the target's handler ran with the rewritten address
	assert_eq!(*seen.lock().unwrap(), [addr("/interface=management")]);
	assert_eq!(operation.address, addr("/interface=management"));
}

#[test]
fn test_alias_dispatch_rewrites_deeper_addresses() {
	let root = new_root();
	let management = root
		.register_sub_model(SubModelDef::new(PathElement::new("interface", "management")))
		.unwrap();
	let protocol = management
		.register_sub_model(SubModelDef::new(PathElement::new("protocol", "http")))
		.unwrap();
	let seen = Arc::new(Mutex::new(Vec::new()));
	protocol
		.register_operation_handler(OperationDef::new("enable", recording(&seen)))
		.unwrap();
	root.register_alias(
		PathElement::new("interface", "public"),
		AliasEntry::new(management),
	)
	.unwrap();

	let source = addr("/interface=public/protocol=http");
	let handler = root.operation_handler(&source, "enable").unwrap();
	let mut operation = OperationRequest::new("enable", source);
	handler.execute(&mut operation).unwrap();
	assert_eq!(*seen.lock().unwrap(), [addr("/interface=management/protocol=http")]);
}

#[test]
fn test_alias_propagates_handler_failure() {
	let root = new_root();
	let target = root
		.register_sub_model(SubModelDef::new(PathElement::new("interface", "management")))
		.unwrap();
	target
		.register_operation_handler(OperationDef::new(
			"explode",
			Arc::new(|_: &mut OperationRequest| Err(OperationFailed::new("boom"))),
		))
		.unwrap();
	root.register_alias(
		PathElement::new("interface", "public"),
		AliasEntry::new(target),
	)
	.unwrap();

	let handler = root
		.operation_handler(&addr("/interface=public"), "explode")
		.unwrap();
	let mut operation = OperationRequest::new("explode", addr("/interface=public"));
	let err = handler.execute(&mut operation).unwrap_err();
	assert_eq!(err, OperationFailed::new("boom"));
}

#[test]
fn test_alias_node_rejects_mutation() {
	let root = new_root();
	let target = root
		.register_sub_model(SubModelDef::new(PathElement::new("interface", "management")))
		.unwrap();
	let alias = root
		.register_alias(
			PathElement::new("interface", "public"),
			AliasEntry::new(target),
		)
		.unwrap();

	assert!(alias.is_alias());
	let entry = alias.alias_entry().unwrap();
	assert_eq!(entry.alias_address(), Some(&addr("/interface=public")));
	assert_eq!(entry.target_address(), Some(&addr("/interface=management")));

	let err = alias
		.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap_err();
	assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));
	let err = alias
		.register_sub_model(SubModelDef::new(PathElement::new("sub", "x")))
		.unwrap_err();
	assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));

	// the alias is addressable for introspection
	let looked_up = root.sub_registration(&addr("/interface=public")).unwrap();
	assert!(looked_up.is_alias());
}

#[test]
fn test_alias_custom_mapper() {
	let root = new_root();
	let target = root
		.register_sub_model(SubModelDef::new(PathElement::new("socket", "standard")))
		.unwrap();
	let seen = Arc::new(Mutex::new(Vec::new()));
	target
		.register_operation_handler(OperationDef::new("bind", recording(&seen)))
		.unwrap();
	root.register_alias(
		PathElement::new("socket", "legacy"),
		AliasEntry::with_mapper(target, |_| addr("/socket=standard")),
	)
	.unwrap();

	let handler = root.operation_handler(&addr("/socket=legacy"), "bind").unwrap();
	let mut operation = OperationRequest::new("bind", addr("/socket=legacy"));
	handler.execute(&mut operation).unwrap();
	assert_eq!(*seen.lock().unwrap(), [addr("/socket=standard")]);
}

#[test]
fn test_unregister_alias_is_kind_checked() {
	let root = new_root();
	let target = root
		.register_sub_model(SubModelDef::new(PathElement::new("interface", "management")))
		.unwrap();
	root.register_alias(
		PathElement::new("interface", "public"),
		AliasEntry::new(target),
	)
	.unwrap();

	// a concrete sibling is not touched by alias unregistration
	root.unregister_alias(&PathElement::new("interface", "management"))
		.unwrap();
	assert!(root.sub_registration(&addr("/interface=management")).is_some());

	root.unregister_alias(&PathElement::new("interface", "public"))
		.unwrap();
	assert!(root.sub_registration(&addr("/interface=public")).is_none());
}

#[test]
fn test_proxy_rejects_registration_and_forwards_operations() {
	let root = new_root();
	let controller = TestProxy::mounted(addr("/host=remote1"));
	root.register_proxy_controller(PathElement::new("host", "remote1"), Arc::clone(&controller))
		.unwrap();

	let proxy = root.sub_registration(&addr("/host=remote1")).unwrap();
	assert!(proxy.is_remote());
	assert!(proxy.is_runtime_only());
	let err = proxy
		.register_operation_handler(OperationDef::new("add", noop()))
		.unwrap_err();
	assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));

	// any operation name resolves to the forwarding entry, at any depth
	let handler = root
		.operation_handler(&addr("/host=remote1/server=a"), "anything")
		.unwrap();
	let mut operation = OperationRequest::new("anything", addr("/host=remote1/server=a"));
	handler.execute(&mut operation).unwrap();
	let resolved = root.proxy_controller(&addr("/host=remote1/server=a/deep=x")).unwrap();
	assert!(Arc::ptr_eq(&resolved, &controller));

	// enumerations stay empty
	assert!(root.attribute_names(&addr("/host=remote1")).is_empty());
	assert!(root.child_names(&addr("/host=remote1")).is_empty());
	assert!(
		root.operation_descriptions(&addr("/host=remote1"), true)
			.is_empty()
	);
}

#[test]
fn test_proxy_controller_not_returned_for_local_nodes() {
	let root = new_root();
	root.register_sub_model(SubModelDef::new(PathElement::new("subsystem", "web")))
		.unwrap();
	assert!(root.proxy_controller(&addr("/subsystem=web")).is_none());
	assert!(root.proxy_controller(&PathAddress::empty()).is_none());
}

#[test]
fn test_proxy_controllers_collects_recursively() {
	let root = new_root();
	let r1 = TestProxy::mounted(addr("/host=r1"));
	let r2 = TestProxy::mounted(addr("/host=r2"));
	root.register_proxy_controller(PathElement::new("host", "r1"), Arc::clone(&r1))
		.unwrap();
	root.register_proxy_controller(PathElement::new("host", "r2"), Arc::clone(&r2))
		.unwrap();
	let group = root
		.register_sub_model(SubModelDef::new(PathElement::new("group", "main")))
		.unwrap();
	let nested = TestProxy::mounted(addr("/group=main/host=r3"));
	group
		.register_proxy_controller(PathElement::new("host", "r3"), Arc::clone(&nested))
		.unwrap();

	let all = root.proxy_controllers(&PathAddress::empty());
	assert_eq!(all.len(), 3);

	// a wildcard segment fans out over every child at that level
	let hosts = root.proxy_controllers(&addr("/host=*"));
	assert_eq!(hosts.len(), 2);
	assert!(hosts.iter().any(|c| Arc::ptr_eq(c, &r1)));
	assert!(hosts.iter().any(|c| Arc::ptr_eq(c, &r2)));

	let under_group = root.proxy_controllers(&addr("/group=main"));
	assert_eq!(under_group.len(), 1);
	assert!(Arc::ptr_eq(&under_group[0], &nested));
}

#[test]
fn test_unregister_proxy_is_kind_checked() {
	let root = new_root();
	root.register_sub_model(SubModelDef::new(PathElement::new("host", "local")))
		.unwrap();
	root.register_proxy_controller(
		PathElement::new("host", "remote"),
		TestProxy::mounted(addr("/host=remote")),
	)
	.unwrap();

	root.unregister_proxy_controller(&PathElement::new("host", "local"))
		.unwrap();
	assert!(root.sub_registration(&addr("/host=local")).is_some());

	root.unregister_proxy_controller(&PathElement::new("host", "remote"))
		.unwrap();
	assert!(root.proxy_controller(&addr("/host=remote")).is_none());
}

#[test]
fn test_concurrent_same_slot_registration_has_one_winner() {
	let root = new_root();
	let wins = AtomicUsize::new(0);
	let losses = AtomicUsize::new(0);

	std::thread::scope(|scope| {
		for _ in 0..8 {
			let root = root.clone();
			let wins = &wins;
			let losses = &losses;
			scope.spawn(move || {
				match root.register_sub_model(SubModelDef::new(PathElement::new(
					"subsystem",
					"contended",
				))) {
					Ok(_) => wins.fetch_add(1, Ordering::SeqCst),
					Err(RegistryError::DuplicateRegistration { .. }) => {
						losses.fetch_add(1, Ordering::SeqCst)
					}
					Err(other) => panic!("unexpected error: {other}"),
				};
			});
		}
	});

	assert_eq!(wins.load(Ordering::SeqCst), 1);
	assert_eq!(losses.load(Ordering::SeqCst), 7);
	assert!(root.sub_registration(&addr("/subsystem=contended")).is_some());
}

#[test]
fn test_concurrent_distinct_registrations_all_land() {
	let root = new_root();
	let writers = 4;
	let per_writer = 16;

	std::thread::scope(|scope| {
		for w in 0..writers {
			let root = root.clone();
			scope.spawn(move || {
				for i in 0..per_writer {
					root.register_sub_model(SubModelDef::new(PathElement::new(
						"subsystem",
						format!("s-{w}-{i}"),
					)))
					.unwrap();
					root.register_operation_handler(OperationDef::new(
						format!("op-{w}-{i}"),
						noop(),
					))
					.unwrap();
				}
			});
		}
	});

	assert_eq!(
		root.child_addresses(&PathAddress::empty()).len(),
		writers * per_writer
	);
	assert_eq!(
		root.operation_descriptions(&PathAddress::empty(), false).len(),
		writers * per_writer
	);
}
