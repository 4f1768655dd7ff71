//! Animation hook protocol.
//!
//! After guards pass, the render orchestrator hands control to exactly one
//! [`AnimationHook`]. The hook decides when the old content goes away and
//! when the new content arrives; the actual DOM work is done through the
//! [`RenderHelpers`] it receives, which stop on their own once the render is
//! superseded by a newer navigation.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;

use crate::commit::{CommitOptions, CommitOutcome, CommitScope};
use crate::context::NavigationContext;
use crate::error::Result;
use crate::host::{DomTarget, Host};
use crate::route::CompiledRoute;

/// What is being rendered and where.
#[derive(Clone)]
pub struct RenderContext {
	/// Navigation context of this render.
	pub ctx: Rc<NavigationContext>,
	/// Matched route.
	pub route: Rc<CompiledRoute>,
	/// Router mount point.
	pub mount_point: Rc<dyn DomTarget>,
}

impl fmt::Debug for RenderContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderContext")
			.field("path", &self.ctx.path)
			.field("route", &self.route.full_path())
			.finish()
	}
}

/// DOM mutation primitives bound to one render.
pub struct RenderHelpers {
	scope: CommitScope,
	host: Rc<dyn Host>,
}

impl fmt::Debug for RenderHelpers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderHelpers")
			.field("render_id", &self.scope.token.id())
			.field("route", &self.scope.route.full_path())
			.finish()
	}
}

impl RenderHelpers {
	pub(crate) fn new(scope: CommitScope, host: Rc<dyn Host>) -> Self {
		Self { scope, host }
	}

	/// True once a newer render has started.
	pub fn is_stale(&self) -> bool {
		self.scope.token.is_stale()
	}

	/// Destroys the mounted leaf and the layouts that will not be reused.
	///
	/// No-op when stale.
	pub fn teardown(&self) {
		self.scope.teardown();
	}

	/// Destroys only the mounted leaf. No-op when stale.
	pub fn teardown_leaf(&self) {
		self.scope.teardown_leaf();
	}

	/// Whether the next route's innermost layout is the one already mounted.
	pub fn same_layout(&self) -> bool {
		self.scope.same_layout()
	}

	/// Builds, swaps in and mounts the new content.
	///
	/// # Errors
	///
	/// Propagates load, render and slot errors. A superseded render returns
	/// `Ok(CommitOutcome::Stale)` without touching the DOM.
	pub async fn commit(&self, options: CommitOptions) -> Result<CommitOutcome> {
		if self.is_stale() {
			return Ok(CommitOutcome::Stale);
		}
		self.scope.commit(options).await
	}

	/// Element a leaf-only commit writes into by default.
	pub fn slot_target(&self) -> Rc<dyn DomTarget> {
		self.scope
			.mount_point
			.query_selector(&self.scope.slot_selector)
			.unwrap_or_else(|| self.scope.mount_point.clone())
	}

	/// Waits `ms` milliseconds on the host's timer.
	pub fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
		self.host.sleep(ms)
	}
}

/// A transition strategy.
///
/// Implementations must call [`RenderHelpers::commit`] at most once per
/// navigation, and should check [`RenderHelpers::is_stale`] after each of
/// their own awaits.
///
/// # Example
///
/// ```ignore
/// struct FadeOut;
///
/// #[async_trait::async_trait(?Send)]
/// impl AnimationHook for FadeOut {
///     async fn mount(&self, cx: &RenderContext, helpers: &RenderHelpers) -> Result<()> {
///         cx.mount_point.add_class("fading");
///         helpers.sleep(150).await;
///         cx.mount_point.remove_class("fading");
///         if helpers.is_stale() {
///             return Ok(());
///         }
///         helpers.teardown();
///         helpers.commit(CommitOptions::new()).await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait AnimationHook {
	/// Drives one navigation's DOM swap.
	async fn mount(&self, cx: &RenderContext, helpers: &RenderHelpers) -> Result<()>;
}

/// Unanimated swap: teardown, then commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardSwap;

#[async_trait(?Send)]
impl AnimationHook for HardSwap {
	async fn mount(&self, _cx: &RenderContext, helpers: &RenderHelpers) -> Result<()> {
		helpers.teardown();
		helpers.commit(CommitOptions::new()).await?;
		Ok(())
	}
}
