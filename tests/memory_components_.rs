#![allow(dead_code)]

use hydrate_dom::{
	scope::{scope_stylesheet, ScopingToken},
	vdom::Handler,
	Attribute, Component, Definition, DomEvent, VNode,
};
use serde::{Deserialize, Serialize};
use std::{cell::Cell, fmt, rc::Rc};

pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

thread_local! {
	pub static CLICKS: Cell<usize> = Cell::new(0);
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Count {
	pub count: u32,
}

pub struct Counter {
	pub state: Count,
	on_click: Handler,
}

impl fmt::Debug for Counter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Counter").field("state", &self.state).finish()
	}
}

impl Component for Counter {
	const TAG: &'static str = "x-counter";
	type State = Count;

	fn create(attributes: &[Attribute], state: Option<Count>) -> Self {
		let start = hydrate_dom::vdom::attribute(attributes, "start").and_then(|start| start.parse().ok()).unwrap_or(0);
		Self {
			state: state.unwrap_or(Count { count: start }),
			on_click: Rc::new(|_: &DomEvent| CLICKS.with(|clicks| clicks.set(clicks.get() + 1))),
		}
	}

	fn state(&self) -> &Count {
		&self.state
	}

	fn render(&self) -> Vec<VNode> {
		vec![
			VNode::element("span").class("count").text(self.state.count.to_string()).into(),
			VNode::element("button").listen("click", self.on_click.clone()).text("+").into(),
		]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
	pub title: String,
	pub wrapper: String,
}

impl Default for AppState {
	fn default() -> Self {
		Self {
			title: "Hello".to_owned(),
			wrapper: "section".to_owned(),
		}
	}
}

/// A heading, a nested counter and a wrapped advert slot whose content only the server provides.
#[derive(Debug)]
pub struct App {
	pub state: AppState,
}

impl Component for App {
	const TAG: &'static str = "x-app";
	type State = AppState;

	fn create(_attributes: &[Attribute], state: Option<AppState>) -> Self {
		Self { state: state.unwrap_or_default() }
	}

	fn state(&self) -> &AppState {
		&self.state
	}

	fn render(&self) -> Vec<VNode> {
		vec![
			VNode::element("h1").text(self.state.title.clone()).into(),
			VNode::element(&self.state.wrapper)
				.child(VNode::element("div").class("ad").preserved().text("client advert"))
				.into(),
			VNode::component::<Counter>().attr("start", "3").into(),
		]
	}
}

/// Doesn't render on the server.
#[derive(Debug)]
pub struct Clock;

impl Component for Clock {
	const TAG: &'static str = "x-clock";
	const RENDERS_ON_SERVER: bool = false;
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![VNode::element("time").text("now").into()]
	}

	fn placeholder(&self) -> Vec<VNode> {
		vec![VNode::element("p").text("loading").into()]
	}
}

/// Doesn't render on the client.
#[derive(Debug)]
pub struct Banner;

impl Component for Banner {
	const TAG: &'static str = "x-banner";
	const RENDERS_ON_CLIENT: bool = false;
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![VNode::element("b").text("banner").into()]
	}
}

#[derive(Debug)]
pub struct Page;

impl Component for Page {
	const TAG: &'static str = "x-page";
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![VNode::component::<Banner>().into(), VNode::component::<Clock>().into()]
	}
}

pub fn child_definition() -> Rc<dyn hydrate_dom::ComponentDefinition> {
	let token = ScopingToken::new(Child::TAG, "child");
	let stylesheet = scope_stylesheet("child.scoped.css", "p { margin: 0; }", &token).unwrap();
	Definition::<Child>::new().with_stylesheet(stylesheet).shared()
}

pub fn layout_definition() -> Rc<dyn hydrate_dom::ComponentDefinition> {
	let token = ScopingToken::new(Layout::TAG, "layout");
	let stylesheet = scope_stylesheet("layout.scoped.css", "main x-child { display: block; }", &token).unwrap();
	Definition::<Layout>::new().with_stylesheet(stylesheet).shared()
}

/// Styled, and places a styled [`Child`].
#[derive(Debug)]
pub struct Layout;

impl Component for Layout {
	const TAG: &'static str = "x-layout";
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![VNode::element("main").child(VNode::host(child_definition())).into()]
	}
}

#[derive(Debug)]
pub struct Child;

impl Component for Child {
	const TAG: &'static str = "x-child";
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![VNode::element("p").text("child").into()]
	}
}

/// Inline formatting whose separating space is part of the template.
#[derive(Debug)]
pub struct Spaced;

impl Component for Spaced {
	const TAG: &'static str = "x-spaced";
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![VNode::element("b").text("a").into(), VNode::text(" "), VNode::element("i").text("b").into()]
	}
}

/// Static navigation that still needs its listener and property, next to a dynamic input.
pub struct Nav {
	on_click: Handler,
}

impl fmt::Debug for Nav {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Nav").finish()
	}
}

impl Component for Nav {
	const TAG: &'static str = "x-nav";
	type State = ();

	fn create(_attributes: &[Attribute], _state: Option<()>) -> Self {
		Self {
			on_click: Rc::new(|_: &DomEvent| CLICKS.with(|clicks| clicks.set(clicks.get() + 1))),
		}
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&self) -> Vec<VNode> {
		vec![
			VNode::element("nav")
				.static_content()
				.child(VNode::element("button").listen("click", self.on_click.clone()).text("go"))
				.child(VNode::element("output").property("value", "static"))
				.into(),
			VNode::element("input").attr("name", "q").property("value", "query").into(),
		]
	}
}
