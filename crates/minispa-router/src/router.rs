//! The navigation controller.
//!
//! [`Router`] owns the route table, the mount point and the event
//! subscriptions, and exposes the public navigation API.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::ComponentResolver;
use crate::config::RouterOptions;
use crate::error::{Result, RouterError};
use crate::host::{ClickHandler, Host, PopStateHandler, Subscription};
use crate::link::intercept;
use crate::path::normalize_path;
use crate::render::{RenderOutcome, Renderer};
use crate::route::{CompiledRoute, RouteTable};
use crate::state::RenderState;
use crate::{debug_log, info_log};

/// Options of [`Router::navigate_to`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
	/// Replace the current history entry instead of pushing a new one.
	pub replace: bool,
	/// Payload stored with the history entry and exposed as
	/// [`NavigationContext::state`](crate::NavigationContext::state).
	pub state: Option<Value>,
	/// Navigate even while a render is in flight or the URL is unchanged.
	pub force: bool,
}

impl NavigateOptions {
	/// Pushes a new entry.
	pub fn push() -> Self {
		Self::default()
	}

	/// Replaces the current entry.
	pub fn replace() -> Self {
		Self {
			replace: true,
			..Self::default()
		}
	}

	/// Attaches a state payload.
	pub fn with_state(mut self, state: Value) -> Self {
		self.state = Some(state);
		self
	}

	/// Bypasses the busy and same-location checks.
	pub fn forced(mut self) -> Self {
		self.force = true;
		self
	}
}

/// Why a navigation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// Another render was in flight.
	Busy,
	/// The target is the current location.
	SameLocation,
	/// The pre-navigation check refused the target.
	Intercepted,
}

/// Result of [`Router::navigate_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
	/// History was left untouched.
	Skipped(SkipReason),
	/// History was updated and a render ran.
	Rendered(RenderOutcome),
}

/// Client-side router.
///
/// # Example
///
/// ```ignore
/// use std::rc::Rc;
/// use minispa_router::{BrowserHost, RouteDef, Router, RouterOptions};
///
/// let router = Router::new(
///     RouterOptions::new([
///         RouteDef::new("/").view(home),
///         RouteDef::new("/posts/:id").view(post),
///         RouteDef::new("*").view(not_found),
///     ]),
///     Rc::new(BrowserHost::new()?),
/// )?;
/// router.start()?;
/// ```
#[derive(Clone)]
pub struct Router {
	inner: Rc<RouterInner>,
}

struct RouterInner {
	renderer: Rc<Renderer>,
	subscriptions: RefCell<Vec<Subscription>>,
	started: Cell<bool>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("started", &self.inner.started.get())
			.field("renderer", &self.inner.renderer)
			.finish()
	}
}

impl Router {
	/// Compiles the routes and locates the mount point.
	///
	/// # Errors
	///
	/// - [`RouterError::EmptyRoutes`] when no route is given.
	/// - [`RouterError::InvalidPattern`] when a path does not compile.
	/// - [`RouterError::MountPointNotFound`] when the mount selector matches
	///   nothing.
	pub fn new(options: RouterOptions, host: Rc<dyn Host>) -> Result<Self> {
		if options.routes.is_empty() {
			return Err(RouterError::EmptyRoutes);
		}
		let settings = options.settings;
		let table = RouteTable::build(&options.routes, settings.not_found_path.as_deref())?;
		let mount_point = host
			.query_selector(&settings.mount_selector)
			.ok_or_else(|| RouterError::MountPointNotFound(settings.mount_selector.clone()))?;

		let renderer = Rc::new(Renderer {
			table,
			host,
			mount_point,
			settings,
			before_navigate: options.on_before_navigate,
			default_hook: options.animation_hook,
			on_render_error: options.on_render_error,
			state: Rc::new(RefCell::new(RenderState::default())),
			resolver: Rc::new(ComponentResolver::new()),
		});

		Ok(Self {
			inner: Rc::new(RouterInner {
				renderer,
				subscriptions: RefCell::new(Vec::new()),
				started: Cell::new(false),
			}),
		})
	}

	/// Subscribes to history and link events and renders the current location.
	///
	/// Does nothing when already started.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Host`] when an event listener cannot be attached.
	pub fn start(&self) -> Result<()> {
		if self.inner.started.get() {
			return Ok(());
		}
		let renderer = &self.inner.renderer;

		let on_popstate: PopStateHandler = {
			let weak = Rc::downgrade(renderer);
			Rc::new(move || {
				if let Some(renderer) = weak.upgrade() {
					debug_log!("popstate");
					renderer.spawn_render(renderer.host.history_state());
				}
			})
		};

		let on_click: ClickHandler = {
			let weak = Rc::downgrade(renderer);
			Rc::new(move |click| {
				let Some(renderer) = weak.upgrade() else {
					return false;
				};
				let origin = renderer.host.origin();
				let current = renderer.host.location();
				match intercept(click, &origin, &current, &renderer.settings.never_intercept_prefix) {
					Some(href) => {
						renderer.spawn_navigate(href, NavigateOptions::default());
						true
					}
					None => false,
				}
			})
		};

		let popstate = renderer.host.on_popstate(on_popstate)?;
		let clicks = renderer
			.host
			.on_link_click(&renderer.settings.link_selector, on_click)?;
		self.inner.subscriptions.borrow_mut().extend([popstate, clicks]);
		self.inner.started.set(true);
		info_log!("router started");

		renderer.spawn_render(renderer.host.history_state());
		Ok(())
	}

	/// Removes every event subscription. Does nothing when not started.
	pub fn stop(&self) {
		if !self.inner.started.replace(false) {
			return;
		}
		let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
		drop(subscriptions);
		info_log!("router stopped");
	}

	/// Navigates to `url` (path, query and fragment, or a same-origin URL).
	///
	/// Skipped while another render is in flight, when the target equals the
	/// current location, or when the pre-navigation check refuses it;
	/// `force` lifts the first two, `replace` the second.
	///
	/// # Errors
	///
	/// Returns history errors and any failure of the resulting render.
	pub async fn navigate_to(&self, url: &str, options: NavigateOptions) -> Result<NavigateOutcome> {
		self.inner.renderer.clone().navigate(url.to_string(), options, 0).await
	}

	/// Whether event subscriptions are active.
	pub fn is_started(&self) -> bool {
		self.inner.started.get()
	}

	/// Whether a render is in flight.
	pub fn is_busy(&self) -> bool {
		self.inner.renderer.state.borrow().is_busy()
	}

	/// Id of the latest render attempt.
	pub fn render_id(&self) -> u64 {
		self.inner.renderer.state.borrow().render_id()
	}

	/// The flattened route table.
	pub fn routes(&self) -> &[Rc<CompiledRoute>] {
		self.inner.renderer.table.routes()
	}

	/// Normalized pathname of the host's current location.
	pub fn current_path(&self) -> String {
		normalize_path(&self.inner.renderer.host.location().pathname)
	}

	/// Read access to the mounted components.
	pub fn with_state<R>(&self, read: impl FnOnce(&RenderState) -> R) -> R {
		read(&self.inner.renderer.state.borrow())
	}
}
