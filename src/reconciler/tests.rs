use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::*;
use crate::component::{ComponentLink, ComponentType};
use crate::engine::TreeStats;
use crate::error::Error;
use crate::testing::{AttrWrite, RecordingAccessor, WriteLog, drain};
use crate::types::{AttrValue, NodeFlags};
use crate::vnode::{ComponentDescriptor, RefCallback, component, element, functional, text};

type RefLog = Rc<RefCell<Vec<(&'static str, Option<NodeId>)>>>;

fn setup() -> (Reconciler, WriteLog) {
    let (accessor, log) = RecordingAccessor::new();
    (Reconciler::new().with_accessor(accessor), log)
}

fn tracker(name: &'static str, log: &RefLog) -> RefCallback {
    let log = Rc::clone(log);
    RefCallback::new(move |node| log.borrow_mut().push((name, node)))
}

fn keyed_list(keys: &[&str]) -> Descriptor {
    element("ul")
        .children(keys.iter().map(|k| element("li").key(*k).child(*k)))
        .into()
}

// =============================================================================
// Convergence
// =============================================================================

#[test]
fn test_second_pass_is_a_no_op() {
    let (mut rc, log) = setup();
    let view = || -> Descriptor {
        element("form")
            .attr("id", "signup")
            .attr("class", "wide")
            .child(element("input").attr("value", "bob").attr("checked", true))
            .child(element("svg").attr("viewBox", "0 0 4 4").child(element("path")))
            .child(keyed_list(&["a", "b", "c"]))
            .child("footer")
            .into()
    };

    let root = rc.render(&view(), None, None).unwrap();
    rc.tree_mut().reset_stats();
    drain(&log);

    let again = rc.render(&view(), None, Some(root)).unwrap();

    assert_eq!(again, root);
    assert_eq!(rc.tree().stats(), TreeStats::default());
    assert!(drain(&log).is_empty());
}

#[test]
fn test_text_node_is_reused() {
    let (mut rc, _log) = setup();

    let node = rc.render(&text("before"), None, None).unwrap();
    rc.tree_mut().reset_stats();

    let again = rc.render(&text("after"), None, Some(node)).unwrap();

    assert_eq!(again, node);
    assert_eq!(rc.tree().text(node), Some("after"));
    let stats = rc.tree().stats();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.text_writes, 1);
}

#[test]
fn test_text_replaces_element() {
    let (mut rc, _log) = setup();
    let host = rc.tree_mut().create_element("main", false);

    let div = rc.render(&element("div").child("x").into(), Some(host), None).unwrap();
    let node = rc.render(&text("plain"), Some(host), Some(div)).unwrap();

    assert_ne!(node, div);
    assert_eq!(rc.tree().children(host), &[node]);
    assert!(rc.tree().flags(div).contains(NodeFlags::POOLED));
}

#[test]
fn test_single_text_child_is_rewritten_in_place() {
    let (mut rc, _log) = setup();

    let p = rc.render(&element("p").child("one").into(), None, None).unwrap();
    let text_node = rc.tree().children(p)[0];
    rc.tree_mut().reset_stats();

    rc.render(&element("p").child("two").into(), None, Some(p)).unwrap();

    assert_eq!(rc.tree().children(p), &[text_node]);
    assert_eq!(rc.tree().text(text_node), Some("two"));
    let stats = rc.tree().stats();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.inserts, 0);
    assert_eq!(stats.text_writes, 1);
}

// =============================================================================
// Replacement
// =============================================================================

#[test]
fn test_tag_change_migrates_children() {
    let (mut rc, _log) = setup();
    let host = rc.tree_mut().create_element("main", false);
    let before = rc.tree_mut().create_element("header", false);
    rc.tree_mut().append_child(host, before);

    let div = rc
        .render(
            &element("div").child(element("b").child("x")).child("y").into(),
            Some(host),
            None,
        )
        .unwrap();
    let children = rc.tree().children(div).to_vec();

    let span = rc
        .render(
            &element("span").child(element("b").child("x")).child("y").into(),
            Some(host),
            Some(div),
        )
        .unwrap();

    assert_ne!(span, div);
    assert_eq!(rc.tree().tag(span), Some("span"));
    assert_eq!(rc.tree().children(span), children.as_slice());
    assert!(children.iter().all(|&c| rc.tree().parent(c) == Some(span)));

    // Replacement took the old position; the shell went to the pool empty
    assert_eq!(rc.tree().children(host), &[before, span]);
    assert!(rc.tree().flags(div).contains(NodeFlags::POOLED));
    assert!(rc.tree().children(div).is_empty());
}

// =============================================================================
// Child matching
// =============================================================================

#[test]
fn test_keyed_reorder_keeps_identity() {
    let (mut rc, _log) = setup();

    let root = rc.render(&keyed_list(&["a", "b", "c"]), None, None).unwrap();
    let [a, b, c] = rc.tree().children(root) else {
        panic!("expected three children");
    };
    let (a, b, c) = (*a, *b, *c);
    rc.tree_mut().reset_stats();

    rc.render(&keyed_list(&["c", "a", "b"]), None, Some(root)).unwrap();

    assert_eq!(rc.tree().children(root), &[c, a, b]);
    let stats = rc.tree().stats();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.disposed, 0);
    assert_eq!(stats.detaches, 0);
    assert_eq!(stats.inserts, 1);
}

#[test]
fn test_orphans_are_released() {
    let (mut rc, _log) = setup();
    let refs: RefLog = Rc::new(RefCell::new(Vec::new()));
    let (x, y, z) = (tracker("x", &refs), tracker("y", &refs), tracker("z", &refs));

    let root = rc
        .render(
            &element("div")
                .child(element("span").with_ref(x.clone()))
                .child(element("span").with_ref(y))
                .child(element("span").with_ref(z))
                .into(),
            None,
            None,
        )
        .unwrap();
    let first = rc.tree().children(root)[0];
    refs.borrow_mut().clear();

    rc.render(&element("div").child(element("span").with_ref(x)).into(), None, Some(root))
        .unwrap();

    assert_eq!(rc.tree().children(root), &[first]);
    assert_eq!(
        *refs.borrow(),
        vec![("x", Some(first)), ("y", None), ("z", None)]
    );
}

#[test]
fn test_released_text_is_disposed() {
    let (mut rc, _log) = setup();

    let root = rc
        .render(&element("p").child("a").child(element("br")).into(), None, None)
        .unwrap();
    let text_node = rc.tree().children(root)[0];

    rc.render(&element("p").child(element("br")).into(), None, Some(root)).unwrap();

    assert!(!rc.tree().contains(text_node));
    assert_eq!(rc.tree().markup(root), "<p><br></br></p>");
}

#[test]
fn test_duplicate_keys_stay_stable() {
    let (mut rc, _log) = setup();

    let root = rc.render(&keyed_list(&["a", "a"]), None, None).unwrap();
    let children = rc.tree().children(root).to_vec();
    assert_eq!(children.len(), 2);
    rc.tree_mut().reset_stats();

    rc.render(&keyed_list(&["a", "a"]), None, Some(root)).unwrap();

    assert_eq!(rc.tree().children(root), children.as_slice());
    assert_eq!(rc.tree().stats().created, 0);
}

#[test]
fn test_pooled_element_sheds_stale_attributes() {
    let (mut rc, log) = setup();

    let root = rc
        .render(&element("div").child(element("p").attr("class", "old")).into(), None, None)
        .unwrap();
    let p = rc.tree().children(root)[0];

    rc.render(&element("div").into(), None, Some(root)).unwrap();
    assert!(rc.tree().flags(p).contains(NodeFlags::POOLED));
    drain(&log);

    rc.render(&element("div").child(element("p").attr("id", "new")).into(), None, Some(root))
        .unwrap();

    assert_eq!(rc.tree().children(root), &[p]);
    assert_eq!(rc.tree().markup(root), "<div><p id=\"new\"></p></div>");
    assert_eq!(
        drain(&log),
        vec![
            AttrWrite::Remove("class".to_string()),
            AttrWrite::Set("id".to_string(), AttrValue::from("new")),
        ]
    );
}

#[test]
fn test_functional_children_are_expanded_before_matching() {
    let (mut rc, _log) = setup();
    let item = |label: &'static str| {
        functional("Item", move |props, _| {
            element("li").attr("title", props.get_str("title").to_string()).child(label).into()
        })
        .attr("title", label)
    };

    let root = rc
        .render(&element("ul").child(item("one")).child(item("two")).into(), None, None)
        .unwrap();
    let children = rc.tree().children(root).to_vec();

    rc.render(&element("ul").child(item("uno")).child(item("dos")).into(), None, Some(root))
        .unwrap();

    assert_eq!(rc.tree().children(root), children.as_slice());
    assert_eq!(
        rc.tree().markup(root),
        "<ul><li title=\"uno\">uno</li><li title=\"dos\">dos</li></ul>"
    );
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn test_attribute_delta_is_minimal() {
    let (mut rc, log) = setup();

    let node = rc
        .render(&element("div").attr("id", "a").attr("class", "x").into(), None, None)
        .unwrap();
    drain(&log);

    rc.render(&element("div").attr("id", "a").attr("title", "t").into(), None, Some(node))
        .unwrap();

    assert_eq!(
        drain(&log),
        vec![
            AttrWrite::Remove("class".to_string()),
            AttrWrite::Set("title".to_string(), AttrValue::from("t")),
        ]
    );
    assert_eq!(rc.tree().attribute(node, "id"), Some(&AttrValue::from("a")));
}

#[test]
fn test_nan_attribute_is_not_rewritten() {
    let (mut rc, log) = setup();
    let view = || -> Descriptor { element("meter").attr("ratio", f64::NAN).into() };

    let node = rc.render(&view(), None, None).unwrap();
    drain(&log);

    rc.render(&view(), None, Some(node)).unwrap();

    assert!(drain(&log).is_empty());
}

#[test]
fn test_live_property_is_the_baseline() {
    let (mut rc, log) = setup();
    let checkbox = |checked: bool| -> Descriptor { element("input").attr("checked", checked).into() };

    let node = rc.render(&checkbox(true), None, None).unwrap();
    drain(&log);

    // User unchecks it: cached true, live false, descriptor still true
    rc.tree_mut().set_property(node, "checked", AttrValue::Bool(false));
    rc.render(&checkbox(true), None, Some(node)).unwrap();

    assert_eq!(
        drain(&log),
        vec![AttrWrite::Set("checked".to_string(), AttrValue::Bool(true))]
    );
    assert_eq!(rc.tree().property(node, "checked"), Some(&AttrValue::Bool(true)));
}

#[test]
fn test_live_property_matching_descriptor_skips_write() {
    let (mut rc, log) = setup();
    let checkbox = |checked: bool| -> Descriptor { element("input").attr("checked", checked).into() };

    let node = rc.render(&checkbox(true), None, None).unwrap();
    drain(&log);

    // Live state already matches the new descriptor
    rc.tree_mut().set_property(node, "checked", AttrValue::Bool(false));
    rc.render(&checkbox(false), None, Some(node)).unwrap();

    assert!(drain(&log).is_empty());
    assert_eq!(
        rc.tree().recorded(node).and_then(|r| r.get("checked")),
        Some(&AttrValue::Bool(false))
    );

    // And stays quiet on the next identical pass
    rc.render(&checkbox(false), None, Some(node)).unwrap();
    assert!(drain(&log).is_empty());
}

// =============================================================================
// Namespace mode
// =============================================================================

#[test]
fn test_namespace_mode_is_scoped_to_subtree() {
    let (mut rc, _log) = setup();

    let root = rc
        .render(
            &element("div")
                .child(element("svg").attr("viewBox", "0 0 8 8").child(element("path").attr("strokeWidth", 2)))
                .child(element("span").attr("tabIndex", 0))
                .into(),
            None,
            None,
        )
        .unwrap();

    let [svg, span] = rc.tree().children(root) else {
        panic!("expected two children");
    };
    let (svg, span) = (*svg, *span);
    let path = rc.tree().children(svg)[0];

    assert!(rc.tree().flags(svg).contains(NodeFlags::NAMESPACED));
    assert!(rc.tree().flags(path).contains(NodeFlags::NAMESPACED));
    assert!(!rc.tree().flags(span).contains(NodeFlags::NAMESPACED));
    assert!(!rc.tree().flags(root).contains(NodeFlags::NAMESPACED));

    assert!(rc.tree().attribute(svg, "viewBox").is_some());
    assert!(rc.tree().attribute(path, "strokeWidth").is_some());
    assert!(rc.tree().attribute(span, "tabindex").is_some());
    assert!(!rc.is_namespaced());
}

#[test]
fn test_custom_namespace_tags() {
    let config = ReconcilerConfig {
        namespace_tags: vec!["math".to_string()],
        ..Default::default()
    };
    let mut rc = Reconciler::new().with_config(config);

    let root = rc
        .render(&element("MATH").child(element("mi")).into(), None, None)
        .unwrap();

    let mi = rc.tree().children(root)[0];
    assert!(rc.tree().flags(mi).contains(NodeFlags::NAMESPACED));
}

// =============================================================================
// Refs
// =============================================================================

#[test]
fn test_ref_replacement_and_removal() {
    let (mut rc, _log) = setup();
    let refs: RefLog = Rc::new(RefCell::new(Vec::new()));
    let first = tracker("first", &refs);
    let second = tracker("second", &refs);

    let node = rc.render(&element("div").with_ref(first).into(), None, None).unwrap();
    rc.render(&element("div").with_ref(second).into(), None, Some(node)).unwrap();
    rc.render(&element("div").into(), None, Some(node)).unwrap();

    assert_eq!(
        *refs.borrow(),
        vec![
            ("first", Some(node)),
            ("first", None),
            ("second", Some(node)),
            ("second", None),
        ]
    );
}

// =============================================================================
// Components and the mount queue
// =============================================================================

/// Host that renders every component as `<section>name</section>` and logs
/// what the reconciler asks of it.
#[derive(Default)]
struct SectionHost {
    log: RefCell<Vec<String>>,
    bases: RefCell<HashMap<ComponentId, NodeId>>,
    next: Cell<u64>,
    /// Instance whose `did_mount` fails.
    failing_mount: Cell<Option<u64>>,
}

impl SectionHost {
    fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

impl ComponentHost for SectionHost {
    fn build_from_descriptor(
        &self,
        rc: &mut Reconciler,
        existing: Option<NodeId>,
        descriptor: &ComponentDescriptor,
        context: &Context,
        _mount_all: bool,
    ) -> Result<NodeId> {
        let name = descriptor.ty.name();
        let out = rc.reconcile(
            existing,
            &element("section").child(name).into(),
            context,
            DiffFlags::UNMOUNT_CHILDREN_ONLY,
        )?;

        if rc.tree().component(out).is_some() {
            self.log.borrow_mut().push(format!("update {name} at depth {}", rc.depth()));
            return Ok(out);
        }

        self.next.set(self.next.get() + 1);
        let instance = ComponentId::new(self.next.get());
        rc.tree_mut().set_component(
            out,
            Some(ComponentLink {
                instance,
                ty: descriptor.ty.clone(),
            }),
        );
        rc.tree_mut().set_key(out, descriptor.key.clone());
        rc.enqueue_mount(instance);
        self.bases.borrow_mut().insert(instance, out);
        self.log
            .borrow_mut()
            .push(format!("build {name} as {} at depth {}", instance.raw(), rc.depth()));
        Ok(out)
    }

    fn unmount(&self, rc: &mut Reconciler, instance: ComponentId, remove: bool) -> Result<()> {
        let base = self
            .bases
            .borrow_mut()
            .remove(&instance)
            .ok_or(Error::UnknownInstance(instance))?;
        self.log
            .borrow_mut()
            .push(format!("unmount {} remove={remove}", instance.raw()));

        rc.tree_mut().set_component(base, None);
        if remove {
            rc.recycle(base);
        }
        Ok(())
    }

    fn did_mount(&self, rc: &mut Reconciler, instance: ComponentId) -> Result<()> {
        if self.failing_mount.get() == Some(instance.raw()) {
            return Err(Error::Component {
                component: format!("#{}", instance.raw()),
                reason: "did_mount failed".to_string(),
            });
        }
        self.log
            .borrow_mut()
            .push(format!("did_mount {} at depth {}", instance.raw(), rc.depth()));
        Ok(())
    }
}

fn setup_with_host() -> (Reconciler, Rc<SectionHost>) {
    let host = Rc::new(SectionHost::default());
    let rc = Reconciler::new().with_component_host(host.clone());
    (rc, host)
}

#[test]
fn test_mounts_flush_after_the_whole_pass() {
    let (mut rc, host) = setup_with_host();
    let a = ComponentType::new("A", ());
    let b = ComponentType::new("B", ());

    let root = rc
        .render(
            &element("div")
                .child(component(&a))
                .child(element("p").child(component(&b)))
                .into(),
            None,
            None,
        )
        .unwrap();

    assert_eq!(
        host.take_log(),
        vec![
            "build A as 1 at depth 1",
            "build B as 2 at depth 1",
            "did_mount 1 at depth 0",
            "did_mount 2 at depth 0",
        ]
    );
    assert_eq!(rc.pending_mounts(), 0);
    assert_eq!(
        rc.tree().markup(root),
        "<div><section>A</section><p><section>B</section></p></div>"
    );
}

#[test]
fn test_component_children_match_by_type() {
    let (mut rc, host) = setup_with_host();
    let a = ComponentType::new("A", ());
    let b = ComponentType::new("B", ());

    let root = rc
        .render(&element("div").child(component(&a)).child(component(&b)).into(), None, None)
        .unwrap();
    let a_base = rc.tree().children(root)[0];
    host.take_log();

    // Same constructor is updated in place, the other one is unmounted
    rc.render(&element("div").child(component(&a)).into(), None, Some(root))
        .unwrap();

    assert_eq!(rc.tree().children(root), &[a_base]);
    assert_eq!(
        host.take_log(),
        vec!["update A at depth 1", "unmount 2 remove=true"]
    );
}

#[test]
fn test_component_base_not_claimed_by_element() {
    let (mut rc, host) = setup_with_host();
    let a = ComponentType::new("A", ());

    let root = rc
        .render(&element("div").child(component(&a)).into(), None, None)
        .unwrap();
    let a_base = rc.tree().children(root)[0];
    host.take_log();

    rc.render(&element("div").child(element("section").child("A")).into(), None, Some(root))
        .unwrap();

    assert_ne!(rc.tree().children(root)[0], a_base);
    assert_eq!(host.take_log(), vec!["unmount 1 remove=true"]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_accessor_error_propagates_and_resets_pass_state() {
    let mut rc = Reconciler::new().with_accessor(RecordingAccessor::failing_on("title"));

    let err = rc
        .render(
            &element("svg").child(element("g").attr("title", "boom")).into(),
            None,
            None,
        )
        .unwrap_err();

    assert!(matches!(err, Error::Attribute { ref name, .. } if name == "title"));
    assert_eq!(rc.depth(), 0);
    assert!(!rc.is_namespaced());
}

#[test]
fn test_failed_pass_discards_pending_mounts() {
    let host = Rc::new(SectionHost::default());
    let mut rc = Reconciler::new()
        .with_component_host(host.clone())
        .with_accessor(RecordingAccessor::failing_on("title"));
    let a = ComponentType::new("A", ());

    let err = rc
        .render(
            &element("div")
                .child(component(&a))
                .child(element("p").attr("title", "boom"))
                .into(),
            None,
            None,
        )
        .unwrap_err();

    assert!(matches!(err, Error::Attribute { .. }));
    assert_eq!(rc.pending_mounts(), 0);
    assert_eq!(host.take_log(), vec!["build A as 1 at depth 1"]);
}

#[test]
fn test_failed_did_mount_discards_remaining_mounts() {
    let (mut rc, host) = setup_with_host();
    host.failing_mount.set(Some(1));
    let f = ComponentType::new("F", ());
    let l = ComponentType::new("L", ());

    let err = rc
        .render(&element("div").child(component(&f)).child(component(&l)).into(), None, None)
        .unwrap_err();

    assert!(matches!(err, Error::Component { ref reason, .. } if reason == "did_mount failed"));
    assert_eq!(rc.pending_mounts(), 0);
    assert_eq!(
        host.take_log(),
        vec!["build F as 1 at depth 1", "build L as 2 at depth 1"]
    );

    // L never completed mounting, a later pass must not notify it
    rc.render(&text("unrelated"), None, None).unwrap();
    assert!(host.take_log().is_empty());
}

#[test]
fn test_release_of_stale_node_is_ignored() {
    let (mut rc, _log) = setup();
    let node = rc.render(&element("div").into(), None, None).unwrap();
    rc.tree_mut().dispose(node);

    rc.release(node, false).unwrap();

    assert!(!rc.tree().contains(node));
    assert_eq!(rc.tree().len(), 0);
}

#[test]
fn test_render_appends_to_parent_once() {
    let (mut rc, _log) = setup();
    let host = rc.tree_mut().create_element("body", false);

    let node = rc.render(&element("main").into(), Some(host), None).unwrap();
    rc.render(&element("main").into(), Some(host), Some(node)).unwrap();

    assert_eq!(rc.tree().children(host), &[node]);
}
