//! `web-sys` host for `wasm32` builds.

use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, Event, EventTarget, MouseEvent, Window};

use super::{ClickHandler, DomTarget, Host, Location, PopStateHandler, Subscription};
use crate::error::{Result, RouterError};
use crate::link::{LinkClick, LinkTarget};
use crate::warn_log;

fn host_error(context: &str, err: JsValue) -> RouterError {
	RouterError::Host(format!("{}: {:?}", context, err))
}

/// A DOM element.
#[derive(Debug, Clone)]
pub struct BrowserElement(pub Element);

impl DomTarget for BrowserElement {
	fn set_inner_html(&self, html: &str) {
		self.0.set_inner_html(html);
	}

	fn inner_html(&self) -> String {
		self.0.inner_html()
	}

	fn query_selector(&self, selector: &str) -> Option<Rc<dyn DomTarget>> {
		let found = self.0.query_selector(selector).ok().flatten()?;
		Some(Rc::new(BrowserElement(found)))
	}

	fn set_attribute(&self, name: &str, value: &str) {
		if let Err(err) = self.0.set_attribute(name, value) {
			warn_log!("set_attribute({}) failed: {:?}", name, err);
		}
	}

	fn remove_attribute(&self, name: &str) {
		if let Err(err) = self.0.remove_attribute(name) {
			warn_log!("remove_attribute({}) failed: {:?}", name, err);
		}
	}

	fn add_class(&self, class: &str) {
		if let Err(err) = self.0.class_list().add_1(class) {
			warn_log!("classList.add({}) failed: {:?}", class, err);
		}
	}

	fn remove_class(&self, class: &str) {
		if let Err(err) = self.0.class_list().remove_1(class) {
			warn_log!("classList.remove({}) failed: {:?}", class, err);
		}
	}
}

/// The real browser: `window`, `document` and `history`.
#[derive(Debug, Clone)]
pub struct BrowserHost {
	window: Window,
	document: Document,
}

impl BrowserHost {
	/// Binds to the global `window` and `document`.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Host`] outside a browser window context.
	pub fn new() -> Result<Self> {
		let window = web_sys::window().ok_or_else(|| RouterError::Host("no global `window`".to_string()))?;
		let document = window
			.document()
			.ok_or_else(|| RouterError::Host("no `document` on window".to_string()))?;
		Ok(Self { window, document })
	}

	fn to_js_state(state: Option<&Value>) -> Result<JsValue> {
		let Some(state) = state else {
			return Ok(JsValue::NULL);
		};
		let json = serde_json::to_string(state).map_err(|e| RouterError::History(e.to_string()))?;
		js_sys::JSON::parse(&json).map_err(|e| host_error("JSON.parse", e))
	}

	fn listen(target: &EventTarget, event: &'static str, closure: Closure<dyn FnMut(Event)>) -> Result<Subscription> {
		target
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			.map_err(|e| host_error(event, e))?;
		let target = target.clone();
		Ok(Subscription::new(move || {
			let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
		}))
	}
}

fn link_click(event: &Event, link_selector: &str) -> Option<LinkClick> {
	let mouse = event.dyn_ref::<MouseEvent>()?;
	let element = event.target()?.dyn_into::<Element>().ok()?;
	let anchor = element.closest(link_selector).ok().flatten()?;

	Some(LinkClick {
		default_prevented: event.default_prevented(),
		button: mouse.button(),
		meta_key: mouse.meta_key(),
		ctrl_key: mouse.ctrl_key(),
		shift_key: mouse.shift_key(),
		alt_key: mouse.alt_key(),
		link: Some(LinkTarget {
			href: anchor.get_attribute("href").unwrap_or_default(),
			target: anchor.get_attribute("target"),
			download: anchor.has_attribute("download"),
			rel: anchor.get_attribute("rel"),
		}),
	})
}

impl Host for BrowserHost {
	fn location(&self) -> Location {
		let location = self.window.location();
		Location {
			pathname: location.pathname().unwrap_or_else(|_| "/".to_string()),
			search: location.search().unwrap_or_default(),
			hash: location.hash().unwrap_or_default(),
		}
	}

	fn origin(&self) -> String {
		self.window.location().origin().unwrap_or_default()
	}

	fn history_state(&self) -> Option<Value> {
		let state = self.window.history().ok()?.state().ok()?;
		if state.is_null() || state.is_undefined() {
			return None;
		}
		let json = js_sys::JSON::stringify(&state).ok()?.as_string()?;
		serde_json::from_str(&json).ok()
	}

	fn push_state(&self, url: &str, state: Option<&Value>) -> Result<()> {
		let data = Self::to_js_state(state)?;
		self.window
			.history()
			.and_then(|history| history.push_state_with_url(&data, "", Some(url)))
			.map_err(|e| RouterError::History(format!("{:?}", e)))
	}

	fn replace_state(&self, url: &str, state: Option<&Value>) -> Result<()> {
		let data = Self::to_js_state(state)?;
		self.window
			.history()
			.and_then(|history| history.replace_state_with_url(&data, "", Some(url)))
			.map_err(|e| RouterError::History(format!("{:?}", e)))
	}

	fn query_selector(&self, selector: &str) -> Option<Rc<dyn DomTarget>> {
		let element = self.document.query_selector(selector).ok().flatten()?;
		Some(Rc::new(BrowserElement(element)))
	}

	fn on_popstate(&self, handler: PopStateHandler) -> Result<Subscription> {
		let closure = Closure::wrap(Box::new(move |_event: Event| handler()) as Box<dyn FnMut(Event)>);
		Self::listen(&self.window, "popstate", closure)
	}

	fn on_link_click(&self, link_selector: &str, handler: ClickHandler) -> Result<Subscription> {
		let link_selector = link_selector.to_string();
		let closure = Closure::wrap(Box::new(move |event: Event| {
			if let Some(click) = link_click(&event, &link_selector)
				&& handler(&click)
			{
				event.prevent_default();
			}
		}) as Box<dyn FnMut(Event)>);
		Self::listen(&self.document, "click", closure)
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task);
	}

	fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
		let window = self.window.clone();
		let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
		async move {
			let promise = js_sys::Promise::new(&mut |resolve, _reject| {
				if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout) {
					warn_log!("setTimeout failed: {:?}", err);
					let _ = resolve.call0(&JsValue::NULL);
				}
			});
			let _ = JsFuture::from(promise).await;
		}
		.boxed_local()
	}
}
