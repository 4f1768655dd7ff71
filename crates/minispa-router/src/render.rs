//! The render pipeline.
//!
//! One render attempt runs through these states:
//!
//! ```text
//! matching ─► guarding ─┬─► blocked
//!                       ├─► redirecting ─► (forced replace navigation)
//!                       └─► animating ─► done
//! ```
//!
//! Every state can also exit as stale: after each await the pipeline checks
//! its [`RenderToken`] and stops without touching the DOM once a newer
//! render has started.

use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::commit::CommitScope;
use crate::component::ComponentResolver;
use crate::config::{BeforeNavigate, RenderErrorCallback, RouterSettings};
use crate::context::build_context;
use crate::error::{Result, RouterError};
use crate::guard::{GuardDecision, run_guards};
use crate::hook::{AnimationHook, RenderContext, RenderHelpers};
use crate::host::{DomTarget, Host, Location};
use crate::path::normalize_path;
use crate::route::RouteTable;
use crate::router::{NavigateOptions, NavigateOutcome, SkipReason};
use crate::state::{RenderState, RenderToken, SharedRenderState};
use crate::{debug_log, error_log, info_log};

/// Markup written when no route and no fallback route match.
pub const NOT_FOUND_HTML: &str = "<h1>Not Found</h1>";

/// How a render attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
	/// The matched route is mounted.
	Mounted,
	/// Nothing matched; the placeholder was written.
	NotFound,
	/// A guard blocked the navigation, or the interceptor refused its
	/// redirect target.
	Blocked,
	/// A guard redirected to another path.
	Redirected(String),
	/// A newer render superseded this one.
	Stale,
}

/// Clears the busy flag when the render ends, however it ends.
struct BusyGuard(RenderToken);

impl Drop for BusyGuard {
	fn drop(&mut self) {
		self.0.release();
	}
}

/// Route table, host handles and render state shared by every render.
pub(crate) struct Renderer {
	pub(crate) table: RouteTable,
	pub(crate) host: Rc<dyn Host>,
	pub(crate) mount_point: Rc<dyn DomTarget>,
	pub(crate) settings: RouterSettings,
	pub(crate) before_navigate: Option<BeforeNavigate>,
	pub(crate) default_hook: Rc<dyn AnimationHook>,
	pub(crate) on_render_error: Option<RenderErrorCallback>,
	pub(crate) state: SharedRenderState,
	pub(crate) resolver: Rc<ComponentResolver>,
}

impl fmt::Debug for Renderer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Renderer")
			.field("routes", &self.table.routes().len())
			.field("settings", &self.settings)
			.field("state", &self.state.borrow())
			.finish()
	}
}

impl Renderer {
	/// Updates history and renders the new location.
	pub(crate) fn navigate(
		self: Rc<Self>,
		url: String,
		options: NavigateOptions,
		depth: usize,
	) -> LocalBoxFuture<'static, Result<NavigateOutcome>> {
		async move {
			if self.state.borrow().is_busy() && !options.force {
				debug_log!("navigation to {} skipped: render in flight", url);
				return Ok(NavigateOutcome::Skipped(SkipReason::Busy));
			}

			let origin = self.host.origin();
			let current = self.host.location();
			let (target_origin, target) = Location::resolve(&origin, &current, &url)?;
			if target_origin != origin.trim_end_matches('/') {
				return Err(RouterError::History(format!("cannot navigate to cross-origin URL `{}`", url)));
			}
			let href = target.href();

			if href == current.href() && !options.replace && !options.force {
				return Ok(NavigateOutcome::Skipped(SkipReason::SameLocation));
			}

			// Claim the render generation before the interceptor can yield.
			let token = RenderState::begin(&self.state);
			let _busy = BusyGuard(token.clone());

			if let Some(check) = &self.before_navigate
				&& !check.allows(&href).await
			{
				info_log!("navigation to {} cancelled", href);
				return Ok(NavigateOutcome::Skipped(SkipReason::Intercepted));
			}
			if token.is_stale() {
				return Ok(NavigateOutcome::Rendered(RenderOutcome::Stale));
			}

			if options.replace {
				self.host.replace_state(&href, options.state.as_ref())?;
			} else {
				self.host.push_state(&href, options.state.as_ref())?;
			}
			let outcome = self.render(token, options.state, depth).await?;
			Ok(NavigateOutcome::Rendered(outcome))
		}
		.boxed_local()
	}

	/// Renders the host's current location.
	pub(crate) async fn render(
		self: Rc<Self>,
		token: RenderToken,
		nav_state: Option<Value>,
		depth: usize,
	) -> Result<RenderOutcome> {
		let _busy = BusyGuard(token.clone());

		let location = self.host.location();
		let pathname = normalize_path(&location.pathname);
		debug_log!("render {} for {}", token.id(), pathname);

		let Some(matched) = self.table.resolve(&pathname) else {
			if token.is_stale() {
				return Ok(RenderOutcome::Stale);
			}
			self.unmount_all();
			self.mount_point.set_inner_html(NOT_FOUND_HTML);
			return Ok(RenderOutcome::NotFound);
		};
		let route = matched.route;
		let ctx = Rc::new(build_context(&pathname, matched.params, &location, nav_state));

		let decision = run_guards(route.parents(), &route, &ctx).await?;
		if token.is_stale() {
			return Ok(RenderOutcome::Stale);
		}
		match decision {
			GuardDecision::Continue => {}
			GuardDecision::Block => return Ok(RenderOutcome::Blocked),
			GuardDecision::Redirect { to } => {
				if depth >= self.settings.max_redirects {
					return Err(RouterError::RedirectLoop {
						limit: self.settings.max_redirects,
						to,
					});
				}
				let options = NavigateOptions {
					replace: true,
					force: true,
					state: None,
				};
				let outcome = self.clone().navigate(to.clone(), options, depth + 1).await?;
				return Ok(match outcome {
					NavigateOutcome::Skipped(_) => {
						info_log!("redirect to {} was refused", to);
						RenderOutcome::Blocked
					}
					NavigateOutcome::Rendered(RenderOutcome::Stale) => RenderOutcome::Stale,
					NavigateOutcome::Rendered(_) => RenderOutcome::Redirected(to),
				});
			}
		}

		let hook = route
			.nearest_animation_hook()
			.unwrap_or_else(|| self.default_hook.clone());

		let innermost = route.layout_chain().last();
		let next_layout = match innermost {
			Some((owner, layout)) => self.resolver.resolve(Some(layout), owner.full_path()).await?,
			None => None,
		};
		if token.is_stale() {
			return Ok(RenderOutcome::Stale);
		}

		let cx = RenderContext {
			ctx: ctx.clone(),
			route: route.clone(),
			mount_point: self.mount_point.clone(),
		};
		let helpers = RenderHelpers::new(
			CommitScope {
				token: token.clone(),
				state: self.state.clone(),
				resolver: self.resolver.clone(),
				route,
				ctx,
				mount_point: self.mount_point.clone(),
				slot_selector: self.settings.slot_selector.clone(),
				next_layout,
			},
			self.host.clone(),
		);

		hook.mount(&cx, &helpers).await?;

		if token.is_stale() {
			Ok(RenderOutcome::Stale)
		} else {
			Ok(RenderOutcome::Mounted)
		}
	}

	/// Starts a render of the current location without waiting for it.
	pub(crate) fn spawn_render(self: &Rc<Self>, nav_state: Option<Value>) {
		let token = RenderState::begin(&self.state);
		let this = self.clone();
		self.host.spawn(
			async move {
				if let Err(err) = this.clone().render(token, nav_state, 0).await {
					this.report(&err);
				}
			}
			.boxed_local(),
		);
	}

	/// Starts a navigation without waiting for it.
	pub(crate) fn spawn_navigate(self: &Rc<Self>, url: String, options: NavigateOptions) {
		let this = self.clone();
		self.host.spawn(
			async move {
				if let Err(err) = this.clone().navigate(url, options, 0).await {
					this.report(&err);
				}
			}
			.boxed_local(),
		);
	}

	pub(crate) fn report(&self, err: &RouterError) {
		error_log!("render failed: {}", err);
		if let Some(callback) = &self.on_render_error {
			callback(err);
		}
	}

	fn unmount_all(&self) {
		let (view, layouts) = {
			let mut state = self.state.borrow_mut();
			(state.current_view.take(), std::mem::take(&mut state.current_layouts))
		};
		if let Some(view) = view {
			view.instance.destroy();
		}
		for layout in layouts.iter().rev() {
			layout.instance.destroy();
		}
	}
}
