use hydrate_dom::{
	hydrate, hydrate_element, mount_element, ssr::render_to_dom, Definition, Dom, HydrationMountError, HydrationOptions, MemoryDom, MismatchKind, NodePath, PreserveOrigin,
	VNode,
};

mod memory_components_;
use memory_components_::{init_logging, App, Clock, Counter, Nav, Page, Spaced, CLICKS};

fn server_counter(state: &str, children: Vec<VNode>) -> VNode {
	VNode::element("x-counter").attr("data-ssr-state", state).children(children).into()
}

fn count(text: &str) -> VNode {
	VNode::element("span").class("count").text(text).into()
}

fn button() -> VNode {
	VNode::element("button").text("+").into()
}

#[test]
fn identical_trees_create_nothing() {
	init_logging();
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body").unwrap();
	let root = render_to_dom(&mut dom, VNode::component::<App>()).unwrap();
	dom.append_child(body, root);
	let before = dom.inner_html(body);
	dom.reset_stats();

	let mounted = hydrate::<App, _>(&mut dom, Some(&root)).unwrap();

	assert!(mounted.report().is_clean(), "{:#?}", mounted.report());
	assert_eq!(mounted.report().created, 0);
	assert_eq!(mounted.report().removed, 0);
	assert_eq!(mounted.report().preserved, 1);
	assert_eq!(dom.stats().created, 0);
	assert_eq!(dom.stats().removed, 0);
	assert_eq!(dom.stats().inserted, 0);
	assert_eq!(dom.stats().data_writes, 0);
	assert_eq!(*mounted.node(), root);
	assert_eq!(dom.inner_html(body), before.replace(r#" data-ssr-state="{&quot;title&quot;:&quot;Hello&quot;,&quot;wrapper&quot;:&quot;section&quot;}""#, "").replace(r#" data-ssr-state="{&quot;count&quot;:3}""#, ""));
	assert!(!dom.inner_html(body).contains("data-ssr-state"));
	assert_eq!(mounted.instance::<App>().unwrap().state.title, "Hello");
	assert_eq!(mounted.find_instance::<Counter>().unwrap().state.count, 3);
}

#[test]
fn text_only_mismatch() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":5}"#, vec![count("4"), button()]));
	dom.reset_stats();

	let mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();

	let report = mounted.report();
	assert_eq!(report.mismatches.len(), 1);
	assert_eq!(report.mismatches[0].kind, MismatchKind::Text);
	assert_eq!(report.mismatches[0].path, NodePath::from(vec![0, 0]));
	assert_eq!(dom.stats().data_writes, 1);
	assert_eq!(dom.stats().created, 0);
	assert_eq!(dom.stats().removed, 0);
	assert_eq!(dom.stats().attribute_writes, 1);
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">5</span><button>+</button></x-counter>"#);
}

#[test]
fn listeners_attach_during_hydration() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":1}"#, vec![count("1"), button()]));
	let button = dom.child_nodes(&root)[1];
	assert_eq!(dom.listener_count(button), 0);

	let _mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();

	assert_eq!(dom.listener_count(button), 1);
	let clicks = CLICKS.with(std::cell::Cell::get);
	assert_eq!(dom.dispatch_event(button, "click"), 1);
	assert_eq!(CLICKS.with(std::cell::Cell::get), clicks + 1);
}

#[test]
fn structure_mismatch_matches_client_render() {
	init_logging();
	let mut dom = MemoryDom::new();
	let old = VNode::element("p").text("old");
	let root = dom.materialize(server_counter(r#"{"count":0}"#, vec![old.into(), button()]));
	let server_button = dom.child_nodes(&root)[1];

	let mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();
	assert_eq!(mounted.report().mismatches.len(), 1);
	assert_eq!(mounted.report().mismatches[0].kind, MismatchKind::Structure);
	assert_eq!(mounted.report().mismatches[0].path, NodePath::from(vec![0]));
	assert_eq!(dom.child_nodes(&root)[1], server_button);

	let mut client = MemoryDom::new();
	let body = client.create_element("body").unwrap();
	let rendered = mount_element(&mut client, &body, Definition::<Counter>::new().shared(), &[], &HydrationOptions::default()).unwrap();
	assert_eq!(dom.outer_html(root), client.outer_html(*rendered.node()));
}

#[test]
fn incompatible_state() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":"many"}"#, vec![count("many"), button()]));

	let mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();

	let report = mounted.report();
	assert_eq!(report.state_errors.len(), 1);
	assert_eq!(report.state_errors[0].tag, "x-counter");
	assert_eq!(report.state_errors[0].path, NodePath::root());
	assert!(report.mismatches.iter().any(|m| m.kind == MismatchKind::State));
	assert_eq!(report.removed, 2);
	assert_eq!(mounted.instance::<Counter>().unwrap().state.count, 0);
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">0</span><button>+</button></x-counter>"#);
}

#[test]
fn incompatible_state_stays_local() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<App>()).unwrap();
	let heading = dom.child_nodes(&root)[0];
	let counter = dom.find_element(root, "x-counter").unwrap();
	dom.set_attribute(&counter, "data-ssr-state", "[]");

	let mounted = hydrate::<App, _>(&mut dom, Some(&root)).unwrap();

	assert_eq!(mounted.report().state_errors.len(), 1);
	assert_eq!(mounted.report().state_errors[0].path, NodePath::from(vec![2]));
	assert_eq!(dom.child_nodes(&root)[0], heading);
	assert_eq!(dom.child_nodes(&root)[2], counter);
	assert_eq!(mounted.find_instance::<Counter>().unwrap().state.count, 3);
}

#[test]
fn mount_errors() {
	init_logging();
	let mut dom = MemoryDom::new();
	assert_eq!(hydrate::<Counter, _>(&mut dom, None).unwrap_err(), HydrationMountError::MissingRoot);

	let text = dom.create_text("x-counter");
	assert!(matches!(
		hydrate::<Counter, _>(&mut dom, Some(&text)).unwrap_err(),
		HydrationMountError::NotAnElement { .. }
	));

	let div = dom.create_element("div").unwrap();
	assert_eq!(
		hydrate::<Counter, _>(&mut dom, Some(&div)).unwrap_err(),
		HydrationMountError::DetachedRootMismatch {
			expected: "x-counter".to_owned(),
			found: "div".to_owned(),
		}
	);
}

#[test]
fn mismatched_root_is_replaced() {
	init_logging();
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body").unwrap();
	let div = dom.create_element("div").unwrap();
	dom.append_child(body, div);

	let mounted = hydrate::<Counter, _>(&mut dom, Some(&div)).unwrap();

	assert_ne!(*mounted.node(), div);
	assert_eq!(dom.child_nodes(&body), vec![*mounted.node()]);
	assert_eq!(mounted.report().mismatches[0].kind, MismatchKind::Structure);
	assert_eq!(dom.inner_html(body), r#"<x-counter><span class="count">0</span><button>+</button></x-counter>"#);
}

#[test]
fn surplus_nodes() {
	init_logging();
	let mut dom = MemoryDom::new();
	let stray = VNode::element("i").text("stray");
	let root = dom.materialize(server_counter(r#"{"count":1}"#, vec![count("1"), button(), stray.into()]));
	let mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();
	assert_eq!(mounted.report().removed, 1);
	assert_eq!(mounted.report().mismatches[0].path, NodePath::from(vec![2]));
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">1</span><button>+</button></x-counter>"#);

	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":1}"#, vec![count("1")]));
	let mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();
	assert_eq!(mounted.report().created, 2);
	assert_eq!(mounted.report().mismatches[0].expected, "<button>");
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">1</span><button>+</button></x-counter>"#);
}

#[test]
fn whitespace_is_ignored() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":1}"#, vec![VNode::text("\n\t"), count("1"), VNode::text("\n\t"), button(), VNode::text("\n")]));
	let span = dom.child_nodes(&root)[1];
	dom.reset_stats();

	let mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();

	assert!(mounted.report().is_clean(), "{:#?}", mounted.report());
	assert_eq!(dom.stats().created, 0);
	assert_eq!(dom.stats().removed, 3);
	assert_eq!(mounted.report().removed, 3);
	assert_eq!(dom.child_nodes(&root)[0], span);
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">1</span><button>+</button></x-counter>"#);
}

#[test]
fn template_whitespace_pairs_up() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<Spaced>()).unwrap();
	let nodes = dom.child_nodes(&root);
	dom.reset_stats();

	let mounted = hydrate::<Spaced, _>(&mut dom, Some(&root)).unwrap();

	assert!(mounted.report().is_clean(), "{:#?}", mounted.report());
	assert_eq!(dom.stats().created, 0);
	assert_eq!(dom.stats().removed, 0);
	assert_eq!(dom.child_nodes(&root), nodes);
	assert_eq!(dom.outer_html(root), "<x-spaced><b>a</b> <i>b</i></x-spaced>");
}

#[test]
fn whitespace_can_be_significant() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":1}"#, vec![VNode::text("\n"), count("1"), button()]));
	let options = HydrationOptions {
		ignore_whitespace_text: false,
		..HydrationOptions::default()
	};

	let mounted = hydrate_element(&mut dom, Definition::<Counter>::new().shared(), Some(&root), &options).unwrap();

	let report = mounted.report();
	assert_eq!(report.mismatches[0].kind, MismatchKind::Structure);
	assert_eq!(report.mismatches[0].path, NodePath::from(vec![0]));
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">1</span><button>+</button></x-counter>"#);
}

#[test]
fn static_content_is_bound_without_comparison() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<Nav>()).unwrap();
	let nav = dom.child_nodes(&root)[0];
	let button = dom.find_element(root, "button").unwrap();
	let output = dom.find_element(root, "output").unwrap();
	let label = dom.child_nodes(&button)[0];
	dom.set_attribute(&nav, "class", "server");
	dom.set_data(&label, "server label");
	dom.reset_stats();

	let mounted = hydrate::<Nav, _>(&mut dom, Some(&root)).unwrap();

	assert!(mounted.report().is_clean(), "{:#?}", mounted.report());
	assert_eq!(dom.stats().created, 0);
	assert_eq!(dom.stats().data_writes, 0);
	assert_eq!(dom.get_attribute(nav, "class"), Some("server"));
	assert_eq!(dom.inner_html(button), "server label");
	assert_eq!(dom.property(output, "value"), Some(&serde_json::Value::from("static")));

	assert_eq!(dom.listener_count(button), 1);
	let clicks = CLICKS.with(std::cell::Cell::get);
	assert_eq!(dom.dispatch_event(button, "click"), 1);
	assert_eq!(CLICKS.with(std::cell::Cell::get), clicks + 1);
}

#[test]
fn properties_are_copied() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<Nav>()).unwrap();
	let input = dom.find_element(root, "input").unwrap();
	assert_eq!(dom.outer_html(input), r#"<input name="q">"#);
	assert_eq!(dom.property(input, "value"), None);

	let mut mounted = hydrate::<Nav, _>(&mut dom, Some(&root)).unwrap();

	assert!(mounted.report().is_clean(), "{:#?}", mounted.report());
	assert_eq!(dom.property(input, "value"), Some(&serde_json::Value::from("query")));

	dom.reset_stats();
	mounted.rerender(&mut dom);
	assert_eq!(dom.stats().created, 0);
	assert_eq!(dom.property(input, "value"), Some(&serde_json::Value::from("query")));
}

#[test]
fn depth_limit_leaves_deep_branches() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<App>()).unwrap();
	let heading = dom.child_nodes(&root)[0];
	let title = dom.child_nodes(&heading)[0];
	dom.set_data(&title, "Server");
	dom.reset_stats();
	let options = HydrationOptions {
		depth_limit: 2,
		..HydrationOptions::default()
	};

	let mounted = hydrate_element(&mut dom, Definition::<App>::new().shared(), Some(&root), &options).unwrap();

	assert_eq!(mounted.report().created, 0);
	assert_eq!(mounted.report().removed, 0);
	assert_eq!(dom.stats().data_writes, 0);
	assert_eq!(dom.inner_html(heading), "Server");

	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<App>()).unwrap();
	let heading = dom.child_nodes(&root)[0];
	let title = dom.child_nodes(&heading)[0];
	dom.set_data(&title, "Server");
	let _mounted = hydrate::<App, _>(&mut dom, Some(&root)).unwrap();
	assert_eq!(dom.inner_html(heading), "Hello");
}

#[test]
fn client_only_component() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<Clock>()).unwrap();
	assert_eq!(dom.outer_html(root), "<x-clock><p>loading</p></x-clock>");

	let mounted = hydrate::<Clock, _>(&mut dom, Some(&root)).unwrap();

	assert!(mounted.report().is_clean());
	assert_eq!(dom.outer_html(root), "<x-clock><time>now</time></x-clock>");
}

#[test]
fn server_only_component() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = render_to_dom(&mut dom, VNode::component::<Page>()).unwrap();
	let banner = dom.child_nodes(&root)[0];
	let before = dom.outer_html(banner);

	let mounted = hydrate_element(&mut dom, Definition::<Page>::new().shared(), Some(&root), &HydrationOptions::default()).unwrap();

	assert!(mounted.report().is_clean());
	let preserved = mounted.preserved().get(&NodePath::from(vec![0])).unwrap();
	assert_eq!(preserved.node, banner);
	assert_eq!(preserved.origin, PreserveOrigin::ServerOnlyComponent);
	assert_eq!(dom.outer_html(banner), before);
	assert_eq!(dom.inner_html(root), "<x-banner><b>banner</b></x-banner><x-clock><time>now</time></x-clock>");
}

#[test]
fn rerender_patches_in_place() {
	init_logging();
	let mut dom = MemoryDom::new();
	let root = dom.materialize(server_counter(r#"{"count":5}"#, vec![count("5"), button()]));
	let mut mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();
	let button = dom.child_nodes(&root)[1];

	mounted.instance_mut::<Counter>().unwrap().state.count = 6;
	dom.reset_stats();
	let report = mounted.rerender(&mut dom);

	assert_eq!(report.created, 0);
	assert_eq!(report.removed, 0);
	assert_eq!(dom.stats().data_writes, 1);
	assert_eq!(dom.stats().attribute_writes, 0);
	assert_eq!(dom.listener_count(button), 1);
	assert_eq!(dom.outer_html(root), r#"<x-counter><span class="count">6</span><button>+</button></x-counter>"#);
	assert_eq!(mounted.instance::<Counter>().unwrap().state.count, 6);
}
