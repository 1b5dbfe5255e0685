#![cfg(all(target_arch = "wasm32", feature = "web"))]

use hydrate_dom::{hydrate, ssr::render_to_dom, web::WebDom, Dom, VNode};
use std::sync::Once;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlElement};

mod memory_components_;
use memory_components_::{Counter, CLICKS};

wasm_bindgen_test_configure!(run_in_browser);

static LOGGING: Once = Once::new();

#[wasm_bindgen_test]
fn hydrate_and_click() {
	LOGGING.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body: web_sys::Node = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into();
	let mut dom = WebDom::new(document);

	let root = render_to_dom(&mut dom, VNode::component::<Counter>().attr("id", "counter").attr("start", "4")).unwrap();
	dom.insert_before(&body, &root, None);
	let root_element: &web_sys::Element = root.dyn_ref().unwrap();
	assert_eq!(root_element.get_attribute("data-ssr-state").as_deref(), Some(r#"{"count":4}"#));

	let mut mounted = hydrate::<Counter, _>(&mut dom, Some(&root)).unwrap();
	assert!(mounted.report().is_clean());
	assert_eq!(root_element.get_attribute("data-ssr-state"), None);
	assert_eq!(dom.listener_count(), 1);

	let button: HtmlElement = root_element.query_selector("button").unwrap().unwrap().dyn_into().unwrap();
	let clicks = CLICKS.with(std::cell::Cell::get);
	button.click();
	assert_eq!(CLICKS.with(std::cell::Cell::get), clicks + 1);

	mounted.instance_mut::<Counter>().unwrap().state.count = 5;
	mounted.rerender(&mut dom);
	assert_eq!(root_element.text_content().as_deref(), Some("5+"));

	dom.remove_child(&body, &root);
	assert_eq!(dom.listener_count(), 0);
}
