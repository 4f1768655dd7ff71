//! Error types for the router.
//!
//! Every fallible router operation returns [`RouterError`]. Errors raised by
//! application code (guards, lazy loaders, component rendering, animation
//! hooks) are carried as boxed sources so callers can still downcast them.

use thiserror::Error;

/// A boxed error produced by application code.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Convenient result alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Error type for router operations.
#[derive(Debug, Error)]
pub enum RouterError {
	/// The router was constructed without any route.
	#[error("Router: you must provide a non-empty routes list")]
	EmptyRoutes,

	/// No element matched the configured mount selector.
	#[error("Router: mount element not found for selector `{0}`")]
	MountPointNotFound(String),

	/// A route path could not be compiled into a matcher.
	#[error("Invalid route pattern `{pattern}`: {reason}")]
	InvalidPattern {
		/// The offending pattern.
		pattern: String,
		/// Why compilation failed.
		reason: String,
	},

	/// A layout produced markup without the slot marker.
	#[error("Layout missing {marker} (route `{route}`)")]
	MissingSlot {
		/// Full path of the route whose layout chain failed.
		route: String,
		/// The expected slot marker.
		marker: &'static str,
	},

	/// A guard callback failed.
	#[error("Guard for `{route}` failed")]
	Guard {
		/// Full path of the guarded route.
		route: String,
		#[source]
		source: BoxError,
	},

	/// A lazy component loader failed.
	#[error("Failed to load component for `{route}`")]
	Load {
		/// Full path of the route being loaded.
		route: String,
		#[source]
		source: BoxError,
	},

	/// A view or layout failed to produce its markup.
	#[error("Failed to render component for `{route}`")]
	Render {
		/// Full path of the route being rendered.
		route: String,
		#[source]
		source: BoxError,
	},

	/// An animation hook failed.
	#[error("Animation hook failed: {0}")]
	Animation(#[source] BoxError),

	/// A history write was rejected by the host.
	#[error("History update failed: {0}")]
	History(String),

	/// Guards redirected more times than allowed in one navigation chain.
	#[error("Redirect limit of {limit} exceeded while redirecting to `{to}`")]
	RedirectLoop {
		/// The configured ceiling.
		limit: usize,
		/// The redirect target that would have exceeded it.
		to: String,
	},

	/// Any other failure reported by the host environment.
	#[error("Host error: {0}")]
	Host(String),
}

impl RouterError {
	/// Wraps an application error raised by an animation hook.
	pub fn animation(err: impl Into<BoxError>) -> Self {
		Self::Animation(err.into())
	}

	/// Returns true for errors raised by application code rather than the router.
	pub fn is_application_error(&self) -> bool {
		matches!(
			self,
			Self::Guard { .. } | Self::Load { .. } | Self::Render { .. } | Self::Animation(_)
		)
	}
}
