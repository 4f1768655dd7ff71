//! Router configuration.
//!
//! [`RouterOptions`] is the builder handed to [`Router::new`](crate::Router::new).
//! Its plain-data part, [`RouterSettings`], can also be loaded from JSON so
//! selectors and limits can live next to the rest of an application's
//! configuration.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::error::RouterError;
use crate::guards::reject_api_paths;
use crate::hook::{AnimationHook, HardSwap};
use crate::link::DEFAULT_NEVER_INTERCEPT;
use crate::route::RouteDef;

/// Default mount point selector.
pub const DEFAULT_MOUNT_SELECTOR: &str = "#app";
/// Default delegated link selector.
pub const DEFAULT_LINK_SELECTOR: &str = "[data-link]";
/// Default selector of the element a leaf-only commit writes into.
pub const DEFAULT_SLOT_SELECTOR: &str = "[data-router-slot]";
/// Default ceiling on chained guard redirects.
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

/// Plain-data router settings.
///
/// # Example
///
/// ```ignore
/// let settings = RouterSettings::from_json(r#"{ "mount_selector": "#root", "max_redirects": 4 }"#)?;
/// let options = RouterOptions::new(routes).settings(settings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
	/// Selector of the element views are rendered into.
	pub mount_selector: String,
	/// Selector of elements whose clicks are intercepted.
	pub link_selector: String,
	/// Route rendered when nothing matches and no catch-all exists.
	pub not_found_path: Option<String>,
	/// Path prefix that is never handled client-side.
	pub never_intercept_prefix: String,
	/// Selector of the layout element a leaf-only commit writes into.
	pub slot_selector: String,
	/// Maximum number of chained guard redirects.
	pub max_redirects: usize,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			mount_selector: DEFAULT_MOUNT_SELECTOR.to_string(),
			link_selector: DEFAULT_LINK_SELECTOR.to_string(),
			not_found_path: None,
			never_intercept_prefix: DEFAULT_NEVER_INTERCEPT.to_string(),
			slot_selector: DEFAULT_SLOT_SELECTOR.to_string(),
			max_redirects: DEFAULT_MAX_REDIRECTS,
		}
	}
}

impl RouterSettings {
	/// Parses settings from JSON; missing fields keep their defaults.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}
}

type InterceptFn = dyn Fn(String) -> LocalBoxFuture<'static, bool>;

/// Global pre-navigation check; returning `false` cancels the navigation.
#[derive(Clone)]
pub struct BeforeNavigate(Rc<InterceptFn>);

impl BeforeNavigate {
	/// Creates a synchronous check.
	pub fn new<F>(check: F) -> Self
	where
		F: Fn(&str) -> bool + 'static,
	{
		Self(Rc::new(move |to: String| future::ready(check(&to)).boxed_local()))
	}

	/// Creates an asynchronous check.
	pub fn future<F, Fut>(check: F) -> Self
	where
		F: Fn(String) -> Fut + 'static,
		Fut: Future<Output = bool> + 'static,
	{
		Self(Rc::new(move |to: String| check(to).boxed_local()))
	}

	/// Asks whether navigating to `to` may proceed.
	pub async fn allows(&self, to: &str) -> bool {
		(self.0)(to.to_string()).await
	}
}

impl fmt::Debug for BeforeNavigate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("BeforeNavigate").finish()
	}
}

/// Callback receiving failures of renders nobody awaits (popstate, link
/// clicks, the initial render).
pub type RenderErrorCallback = Rc<dyn Fn(&RouterError)>;

/// Everything needed to construct a router.
#[derive(Clone)]
pub struct RouterOptions {
	pub(crate) routes: Vec<RouteDef>,
	pub(crate) settings: RouterSettings,
	pub(crate) on_before_navigate: Option<BeforeNavigate>,
	pub(crate) animation_hook: Rc<dyn AnimationHook>,
	pub(crate) on_render_error: Option<RenderErrorCallback>,
}

impl fmt::Debug for RouterOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterOptions")
			.field("routes", &self.routes.len())
			.field("settings", &self.settings)
			.field("has_before_navigate", &self.on_before_navigate.is_some())
			.field("has_error_callback", &self.on_render_error.is_some())
			.finish()
	}
}

impl RouterOptions {
	/// Options with default settings, the `/api/` interceptor and
	/// [`HardSwap`] as default hook.
	pub fn new(routes: impl IntoIterator<Item = RouteDef>) -> Self {
		Self {
			routes: routes.into_iter().collect(),
			settings: RouterSettings::default(),
			on_before_navigate: Some(BeforeNavigate::new(reject_api_paths)),
			animation_hook: Rc::new(HardSwap),
			on_render_error: None,
		}
	}

	/// Replaces all plain-data settings at once.
	pub fn settings(mut self, settings: RouterSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Sets the mount point selector.
	pub fn mount_selector(mut self, selector: impl Into<String>) -> Self {
		self.settings.mount_selector = selector.into();
		self
	}

	/// Sets the delegated link selector.
	pub fn link_selector(mut self, selector: impl Into<String>) -> Self {
		self.settings.link_selector = selector.into();
		self
	}

	/// Sets the fallback route path.
	pub fn not_found_path(mut self, path: impl Into<String>) -> Self {
		self.settings.not_found_path = Some(path.into());
		self
	}

	/// Sets the prefix of paths left to the browser.
	pub fn never_intercept_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.settings.never_intercept_prefix = prefix.into();
		self
	}

	/// Sets the leaf-only commit target selector.
	pub fn slot_selector(mut self, selector: impl Into<String>) -> Self {
		self.settings.slot_selector = selector.into();
		self
	}

	/// Sets the redirect ceiling.
	pub fn max_redirects(mut self, max: usize) -> Self {
		self.settings.max_redirects = max;
		self
	}

	/// Replaces the pre-navigation check.
	pub fn on_before_navigate(mut self, check: BeforeNavigate) -> Self {
		self.on_before_navigate = Some(check);
		self
	}

	/// Removes the pre-navigation check.
	pub fn without_before_navigate(mut self) -> Self {
		self.on_before_navigate = None;
		self
	}

	/// Sets the default animation hook.
	pub fn animation_hook(mut self, hook: Rc<dyn AnimationHook>) -> Self {
		self.animation_hook = hook;
		self
	}

	/// Sets the callback for failures of unawaited renders.
	pub fn on_render_error(mut self, callback: impl Fn(&RouterError) + 'static) -> Self {
		self.on_render_error = Some(Rc::new(callback));
		self
	}

	/// Current plain-data settings.
	pub fn current_settings(&self) -> &RouterSettings {
		&self.settings
	}
}
