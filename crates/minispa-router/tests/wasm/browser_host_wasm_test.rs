//! Browser host WASM tests
//!
//! Exercises [`BrowserHost`] and [`BrowserElement`] against a real DOM:
//! element writes, history entries with state, timers and a full router
//! navigation rendered into the page.
//!
//! **Run with**: `wasm-pack test --chrome --headless crates/minispa-router`

#![cfg(target_arch = "wasm32")]

use std::rc::Rc;

use async_trait::async_trait;
use minispa_router::{
	BoxError, BrowserElement, BrowserHost, Component, ComponentFactory, DomTarget, Host, NavigateOptions,
	NavigateOutcome, NavigationContext, RenderOutcome, RouteDef, Router, RouterOptions,
};
use serde_json::json;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

// ============================================================================
// Test Fixtures
// ============================================================================

/// Appends a fresh `<div id="{id}">` to the body.
fn mount_point(id: &str) -> web_sys::Element {
	let document = web_sys::window().unwrap().document().unwrap();
	if let Some(stale) = document.get_element_by_id(id) {
		stale.remove();
	}
	let element = document.create_element("div").unwrap();
	element.set_id(id);
	document.body().unwrap().append_child(&element).unwrap();
	element
}

struct Greeting {
	name: String,
}

#[async_trait(?Send)]
impl Component for Greeting {
	async fn render(&self) -> Result<String, BoxError> {
		Ok(format!("<h1>Hello {}</h1>", self.name))
	}
}

fn greeting() -> ComponentFactory {
	ComponentFactory::new(|ctx: &NavigationContext| Greeting {
		name: ctx.param("name").unwrap_or_default().to_string(),
	})
}

// ============================================================================
// BrowserElement
// ============================================================================

#[wasm_bindgen_test]
fn test_element_markup_and_content() {
	let element = BrowserElement(mount_point("markup-test"));
	assert!(!element.has_content());

	element.set_inner_html("<span class=\"inner\">hi</span>");

	assert!(element.has_content());
	assert_eq!(element.inner_html(), "<span class=\"inner\">hi</span>");
	let inner = element.query_selector(".inner").unwrap();
	assert_eq!(inner.inner_html(), "hi");
	assert!(element.query_selector(".missing").is_none());
}

#[wasm_bindgen_test]
fn test_element_classes_and_attributes() {
	let raw = mount_point("class-test");
	let element = BrowserElement(raw.clone());

	element.add_class("route-enter");
	element.set_attribute("data-trans", "fade");
	assert!(raw.class_list().contains("route-enter"));
	assert_eq!(raw.get_attribute("data-trans").as_deref(), Some("fade"));

	element.remove_class("route-enter");
	element.remove_attribute("data-trans");
	assert!(!raw.class_list().contains("route-enter"));
	assert!(raw.get_attribute("data-trans").is_none());
}

// ============================================================================
// BrowserHost
// ============================================================================

#[wasm_bindgen_test]
fn test_host_history_round_trip() {
	let host = BrowserHost::new().unwrap();
	let original = host.location().href();

	host.push_state("/wasm/pushed?q=1#top", Some(&json!({ "trans": "slide" })))
		.unwrap();
	let location = host.location();
	assert_eq!(location.pathname, "/wasm/pushed");
	assert_eq!(location.search, "?q=1");
	assert_eq!(location.hash, "#top");
	assert_eq!(host.history_state(), Some(json!({ "trans": "slide" })));

	host.replace_state("/wasm/replaced", None).unwrap();
	assert_eq!(host.location().pathname, "/wasm/replaced");
	assert!(host.history_state().is_none());

	host.replace_state(&original, None).unwrap();
}

#[wasm_bindgen_test]
fn test_host_finds_elements_by_selector() {
	let host = BrowserHost::new().unwrap();
	mount_point("selector-test");

	assert!(host.query_selector("#selector-test").is_some());
	assert!(host.query_selector("#nowhere").is_none());
	assert!(!host.origin().is_empty());
}

#[wasm_bindgen_test]
async fn test_host_sleep_resolves() {
	let host = BrowserHost::new().unwrap();
	host.sleep(5).await;
	host.sleep(0).await;
}

// ============================================================================
// Router on the real DOM
// ============================================================================

#[wasm_bindgen_test]
async fn test_router_renders_into_document() {
	let app = mount_point("router-test");
	let host: Rc<dyn Host> = Rc::new(BrowserHost::new().unwrap());
	let original = host.location().href();
	let router = Router::new(
		RouterOptions::new([RouteDef::new("/wasm/hello/:name").view(greeting())]).mount_selector("#router-test"),
		host.clone(),
	)
	.unwrap();

	let outcome = router
		.navigate_to("/wasm/hello/ferris", NavigateOptions::default())
		.await
		.unwrap();

	assert_eq!(outcome, NavigateOutcome::Rendered(RenderOutcome::Mounted));
	assert_eq!(app.inner_html(), "<h1>Hello ferris</h1>");
	assert_eq!(host.location().pathname, "/wasm/hello/ferris");
	host.replace_state(&original, None).unwrap();
}

#[wasm_bindgen_test]
fn test_router_start_and_stop_listeners() {
	mount_point("app");
	let router = Router::new(
		RouterOptions::new([RouteDef::new("*").view(greeting())]),
		Rc::new(BrowserHost::new().unwrap()),
	)
	.unwrap();

	router.start().unwrap();
	assert!(router.is_started());
	router.stop();
	assert!(!router.is_started());
}
