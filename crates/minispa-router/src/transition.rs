//! Ready-made animation hooks and CSS timing helpers.
//!
//! - [`PhaseTransition`] adapts a two-phase callback (`out` before teardown,
//!   `in` after commit) into an [`AnimationHook`].
//! - [`ClassTransition`] toggles `route-leave`/`route-enter` classes on the
//!   mount point and exposes the variant through `data-trans`. A navigation
//!   can pick another variant by passing `{"trans": "fade"}` as its state.
//! - [`PreserveLayoutSwap`] only replaces the leaf while the innermost layout
//!   stays the same.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;

use crate::commit::{CommitOptions, CommitOutcome};
use crate::error::{BoxError, Result, RouterError};
use crate::hook::{AnimationHook, HardSwap, RenderContext, RenderHelpers};
use crate::host::DomTarget;

/// Which half of a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	/// The old content is leaving.
	Out,
	/// The new content has been inserted.
	In,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Phase::Out => "out",
			Phase::In => "in",
		})
	}
}

/// Two-phase transition callback, called with the mount point.
pub type TransitionFn = Rc<dyn Fn(Rc<dyn DomTarget>, Phase) -> LocalBoxFuture<'static, std::result::Result<(), BoxError>>>;

/// Hook running a [`TransitionFn`] around a full swap.
///
/// The `out` phase is skipped on first render, when the mount point is empty.
#[derive(Clone)]
pub struct PhaseTransition {
	transition: TransitionFn,
}

impl PhaseTransition {
	/// Wraps a phase callback.
	pub fn new(transition: TransitionFn) -> Self {
		Self { transition }
	}
}

impl fmt::Debug for PhaseTransition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PhaseTransition").finish_non_exhaustive()
	}
}

#[async_trait(?Send)]
impl AnimationHook for PhaseTransition {
	async fn mount(&self, cx: &RenderContext, helpers: &RenderHelpers) -> Result<()> {
		let el = cx.mount_point.clone();
		if el.has_content() {
			(self.transition)(el.clone(), Phase::Out)
				.await
				.map_err(RouterError::animation)?;
			if helpers.is_stale() {
				return Ok(());
			}
		}

		helpers.teardown();
		if helpers.commit(CommitOptions::new()).await? == CommitOutcome::Stale {
			return Ok(());
		}

		(self.transition)(el, Phase::In)
			.await
			.map_err(RouterError::animation)
	}
}

const LEAVE: &str = "route-leave";
const LEAVE_ACTIVE: &str = "route-leave-active";
const ENTER: &str = "route-enter";
const ENTER_ACTIVE: &str = "route-enter-active";

/// Variant that disables the animation.
pub const NO_TRANSITION: &str = "none";

/// Margin added to the computed transition time before giving up waiting.
const SETTLE_MARGIN_MS: u32 = 50;

/// CSS class transition on the mount point.
///
/// Expected stylesheet hooks: `.route-leave`, `.route-leave-active`,
/// `.route-enter`, `.route-enter-active`, qualified by
/// `[data-trans="slide" | "fade" | "zoom"]`.
#[derive(Debug, Clone)]
pub struct ClassTransition {
	default_variant: String,
	total_ms: u32,
}

impl Default for ClassTransition {
	fn default() -> Self {
		Self::new("fade")
	}
}

impl ClassTransition {
	/// Uses `default_variant` unless the navigation state names another.
	pub fn new(default_variant: impl Into<String>) -> Self {
		Self {
			default_variant: default_variant.into(),
			total_ms: 0,
		}
	}

	/// Sets the stylesheet's `transition-duration` and `transition-delay`
	/// lists, used to know how long each phase takes.
	pub fn timing(mut self, durations: &str, delays: &str) -> Self {
		self.total_ms = max_transition_ms(durations, delays);
		self
	}

	/// Variant for this navigation.
	pub fn variant<'a>(&'a self, cx: &'a RenderContext) -> &'a str {
		cx.ctx
			.state
			.as_ref()
			.and_then(|state| state.get("trans"))
			.and_then(|trans| trans.as_str())
			.filter(|trans| !trans.is_empty())
			.unwrap_or(&self.default_variant)
	}

	async fn run_phase(&self, el: &Rc<dyn DomTarget>, phase: Phase, helpers: &RenderHelpers) {
		let active = match phase {
			Phase::Out => {
				el.remove_class(ENTER);
				el.remove_class(ENTER_ACTIVE);
				el.add_class(LEAVE);
				LEAVE_ACTIVE
			}
			Phase::In => {
				el.remove_class(LEAVE);
				el.remove_class(LEAVE_ACTIVE);
				el.add_class(ENTER);
				ENTER_ACTIVE
			}
		};
		el.add_class(active);
		helpers.sleep(self.total_ms + SETTLE_MARGIN_MS).await;
		if helpers.is_stale() {
			return;
		}
		for class in [ENTER, ENTER_ACTIVE, LEAVE, LEAVE_ACTIVE] {
			el.remove_class(class);
		}
	}
}

#[async_trait(?Send)]
impl AnimationHook for ClassTransition {
	async fn mount(&self, cx: &RenderContext, helpers: &RenderHelpers) -> Result<()> {
		let el = cx.mount_point.clone();
		let variant = self.variant(cx);
		el.set_attribute("data-trans", variant);

		if variant == NO_TRANSITION {
			return HardSwap.mount(cx, helpers).await;
		}

		if el.has_content() {
			self.run_phase(&el, Phase::Out, helpers).await;
			if helpers.is_stale() {
				return Ok(());
			}
		}

		helpers.teardown();
		if helpers.commit(CommitOptions::new()).await? == CommitOutcome::Stale {
			return Ok(());
		}
		self.run_phase(&el, Phase::In, helpers).await;
		Ok(())
	}
}

/// Leaf-only swap while the innermost layout is unchanged, full swap
/// otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveLayoutSwap;

#[async_trait(?Send)]
impl AnimationHook for PreserveLayoutSwap {
	async fn mount(&self, cx: &RenderContext, helpers: &RenderHelpers) -> Result<()> {
		if helpers.same_layout() {
			helpers.teardown_leaf();
			helpers.commit(CommitOptions::leaf_only()).await?;
			Ok(())
		} else {
			HardSwap.mount(cx, helpers).await
		}
	}
}

/// Parses a CSS time value (`200ms`, `0.3s`, `150`) into milliseconds.
///
/// Unitless numbers are read as seconds. Anything unparsable is zero.
pub fn css_time_to_ms(value: &str) -> f64 {
	let value = value.trim();
	let (number, scale) = if let Some(ms) = value.strip_suffix("ms") {
		(ms, 1.0)
	} else if let Some(s) = value.strip_suffix('s') {
		(s, 1000.0)
	} else {
		(value, 1000.0)
	};
	number
		.trim()
		.parse::<f64>()
		.ok()
		.filter(|n| n.is_finite())
		.map_or(0.0, |n| n * scale)
}

/// Longest `duration + delay` over comma-separated CSS lists, in
/// milliseconds.
///
/// Durations and delays pair up positionally; the shorter list repeats.
pub fn max_transition_ms(durations: &str, delays: &str) -> u32 {
	let durations: Vec<f64> = durations.split(',').map(css_time_to_ms).collect();
	let delays: Vec<f64> = delays.split(',').map(css_time_to_ms).collect();
	let len = durations.len().max(delays.len());

	let max = (0..len)
		.map(|i| durations[i % durations.len()] + delays[i % delays.len()])
		.fold(0.0_f64, f64::max);
	max.round().clamp(0.0, f64::from(u32::MAX)) as u32
}
