//! Route guards and the guard chain runner.
//!
//! A guard inspects the [`NavigationContext`] before anything is mounted and
//! answers with a [`GuardOutcome`]: allow, block, or redirect elsewhere.
//! Guards run parents first, then the leaf, and the first block or redirect
//! wins.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use crate::context::NavigationContext;
use crate::debug_log;
use crate::error::{BoxError, Result, RouterError};
use crate::route::CompiledRoute;

/// What a single guard decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
	/// Continue with the next guard.
	Allow,
	/// Cancel the navigation.
	Block,
	/// Cancel the navigation and go to another path instead.
	Redirect(String),
}

impl From<bool> for GuardOutcome {
	fn from(allowed: bool) -> Self {
		if allowed { Self::Allow } else { Self::Block }
	}
}

impl From<()> for GuardOutcome {
	fn from(_: ()) -> Self {
		Self::Allow
	}
}

impl From<String> for GuardOutcome {
	fn from(to: String) -> Self {
		Self::Redirect(to)
	}
}

impl From<&str> for GuardOutcome {
	fn from(to: &str) -> Self {
		Self::Redirect(to.to_string())
	}
}

impl<T: Into<GuardOutcome>> From<Option<T>> for GuardOutcome {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Self::Allow)
	}
}

/// Result of running a whole guard chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
	/// Every guard allowed the navigation.
	Continue,
	/// A guard blocked the navigation.
	Block,
	/// A guard redirected the navigation.
	Redirect {
		/// Redirect target.
		to: String,
	},
}

type GuardFn =
	dyn Fn(Rc<NavigationContext>) -> LocalBoxFuture<'static, std::result::Result<GuardOutcome, BoxError>>;

/// A `before_enter` callback attached to a route.
///
/// # Example
///
/// ```ignore
/// use minispa_router::Guard;
///
/// // Synchronous: `false` blocks, a string redirects, anything else continues.
/// let members = Guard::new(|_ctx| if is_logged_in() { GuardOutcome::Allow } else { "/login".into() });
///
/// // Asynchronous and fallible.
/// let session = Guard::future(|ctx| async move {
///     let ok = check_session(&ctx.path).await?;
///     Ok(ok)
/// });
/// ```
#[derive(Clone)]
pub struct Guard(Rc<GuardFn>);

impl Guard {
	/// Creates a synchronous, infallible guard.
	pub fn new<F, R>(check: F) -> Self
	where
		F: Fn(&NavigationContext) -> R + 'static,
		R: Into<GuardOutcome>,
	{
		Self(Rc::new(move |ctx: Rc<NavigationContext>| {
			future::ready(Ok(check(&*ctx).into())).boxed_local()
		}))
	}

	/// Creates a synchronous guard that may fail.
	pub fn try_new<F, R>(check: F) -> Self
	where
		F: Fn(&NavigationContext) -> std::result::Result<R, BoxError> + 'static,
		R: Into<GuardOutcome>,
	{
		Self(Rc::new(move |ctx: Rc<NavigationContext>| {
			future::ready(check(&*ctx).map(Into::into)).boxed_local()
		}))
	}

	/// Creates an asynchronous guard.
	pub fn future<F, Fut, R>(check: F) -> Self
	where
		F: Fn(Rc<NavigationContext>) -> Fut + 'static,
		Fut: Future<Output = std::result::Result<R, BoxError>> + 'static,
		R: Into<GuardOutcome>,
	{
		Self(Rc::new(move |ctx: Rc<NavigationContext>| {
			check(ctx).map(|res| res.map(Into::into)).boxed_local()
		}))
	}

	/// Runs the guard.
	pub async fn check(&self, ctx: Rc<NavigationContext>) -> std::result::Result<GuardOutcome, BoxError> {
		(self.0)(ctx).await
	}
}

impl fmt::Debug for Guard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Guard")
	}
}

/// Runs the guards of `parents` (outermost first) and then `leaf`.
///
/// Stops at the first guard that blocks or redirects. Guards are never
/// retried.
///
/// # Errors
///
/// Returns [`RouterError::Guard`] when a guard fails; later guards do not run.
pub async fn run_guards(
	parents: &[Rc<CompiledRoute>],
	leaf: &CompiledRoute,
	ctx: &Rc<NavigationContext>,
) -> Result<GuardDecision> {
	let chain = parents.iter().map(Rc::as_ref).chain(std::iter::once(leaf));

	for route in chain {
		let Some(guard) = route.before_enter() else {
			continue;
		};

		let outcome = guard.check(ctx.clone()).await.map_err(|source| RouterError::Guard {
			route: route.full_path().to_string(),
			source,
		})?;

		match outcome {
			GuardOutcome::Allow => {}
			GuardOutcome::Block => {
				debug_log!("guard on {} blocked {}", route.full_path(), ctx.path);
				return Ok(GuardDecision::Block);
			}
			GuardOutcome::Redirect(to) => {
				debug_log!("guard on {} redirected {} to {}", route.full_path(), ctx.path, to);
				return Ok(GuardDecision::Redirect { to });
			}
		}
	}

	Ok(GuardDecision::Continue)
}
