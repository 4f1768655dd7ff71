//! Browser integration surface.
//!
//! The router never touches `window`, `document` or `history` directly: it
//! talks to a [`Host`]. [`web::BrowserHost`] implements it on top of
//! `web-sys` for `wasm32` builds, and [`memory::MemoryHost`] implements it in
//! memory for native builds and tests.

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::error::{Result, RouterError};
use crate::link::LinkClick;

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// The parts of the current URL the router reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
	/// Path component, e.g. `/posts/42`.
	pub pathname: String,
	/// Query string including the leading `?`, or empty.
	pub search: String,
	/// Fragment including the leading `#`, or empty.
	pub hash: String,
}

impl Location {
	/// Creates a location from its parts.
	pub fn new(pathname: impl Into<String>, search: impl Into<String>, hash: impl Into<String>) -> Self {
		Self {
			pathname: pathname.into(),
			search: search.into(),
			hash: hash.into(),
		}
	}

	/// Resolves `href` against `origin` and the current location.
	///
	/// Returns the resolved origin alongside the location so callers can
	/// reject cross-origin targets.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Host`] when `origin` or `href` is not a valid URL.
	pub fn resolve(origin: &str, current: &Location, href: &str) -> Result<(String, Location)> {
		let base = url::Url::parse(origin)
			.and_then(|base| base.join(&current.href()))
			.map_err(|e| RouterError::Host(format!("invalid origin `{}`: {}", origin, e)))?;
		let target = base
			.join(href)
			.map_err(|e| RouterError::Host(format!("invalid URL `{}`: {}", href, e)))?;

		let location = Location {
			pathname: target.path().to_string(),
			search: target.query().map(|q| format!("?{}", q)).unwrap_or_default(),
			hash: target.fragment().map(|f| format!("#{}", f)).unwrap_or_default(),
		};
		Ok((target.origin().ascii_serialization(), location))
	}

	/// Path, query string and fragment concatenated.
	pub fn href(&self) -> String {
		format!("{}{}{}", self.pathname, self.search, self.hash)
	}
}

/// A DOM element the router can write markup into.
pub trait DomTarget {
	/// Replaces the element's content.
	fn set_inner_html(&self, html: &str);

	/// Returns the element's current markup.
	fn inner_html(&self) -> String;

	/// Finds a descendant element.
	fn query_selector(&self, selector: &str) -> Option<Rc<dyn DomTarget>>;

	/// Sets an attribute.
	fn set_attribute(&self, name: &str, value: &str);

	/// Removes an attribute.
	fn remove_attribute(&self, name: &str);

	/// Adds a CSS class.
	fn add_class(&self, class: &str);

	/// Removes a CSS class.
	fn remove_class(&self, class: &str);

	/// Returns true when something is rendered inside the element.
	fn has_content(&self) -> bool {
		!self.inner_html().trim().is_empty()
	}
}

/// A registered event listener, removed when dropped.
pub struct Subscription {
	release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	/// Creates a subscription that runs `release` when dropped.
	pub fn new(release: impl FnOnce() + 'static) -> Self {
		Self {
			release: Some(Box::new(release)),
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.release.is_some())
			.finish()
	}
}

/// Handler for popstate (back/forward) events.
pub type PopStateHandler = Rc<dyn Fn()>;

/// Handler for clicks on elements matching the link selector.
///
/// Returns true when the click was handled and its default action must be
/// prevented.
pub type ClickHandler = Rc<dyn Fn(&LinkClick) -> bool>;

/// The browser environment the router runs in.
pub trait Host {
	/// Current location.
	fn location(&self) -> Location;

	/// Serialized origin, e.g. `https://example.com`.
	fn origin(&self) -> String;

	/// Payload stored with the current history entry.
	fn history_state(&self) -> Option<Value>;

	/// Pushes a history entry.
	fn push_state(&self, url: &str, state: Option<&Value>) -> Result<()>;

	/// Replaces the current history entry.
	fn replace_state(&self, url: &str, state: Option<&Value>) -> Result<()>;

	/// Finds an element in the document.
	fn query_selector(&self, selector: &str) -> Option<Rc<dyn DomTarget>>;

	/// Listens for back/forward navigation.
	fn on_popstate(&self, handler: PopStateHandler) -> Result<Subscription>;

	/// Listens for clicks delegated to elements matching `link_selector`.
	fn on_link_click(&self, link_selector: &str, handler: ClickHandler) -> Result<Subscription>;

	/// Runs a task on the local executor.
	fn spawn(&self, task: LocalBoxFuture<'static, ()>);

	/// Resolves after `ms` milliseconds.
	fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}
