//! Delegated link-click interception.
//!
//! The host turns a DOM click on an element matching the link selector into a
//! [`LinkClick`]; [`intercept`] decides whether the router should handle it or
//! let the browser follow the link normally.

use crate::host::Location;

/// Mouse button number of the primary button.
pub const PRIMARY_BUTTON: i16 = 0;

/// Default prefix of paths that always go to the server.
pub const DEFAULT_NEVER_INTERCEPT: &str = "/api/";

/// The attributes of a clicked link the router cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTarget {
	/// Raw `href` attribute.
	pub href: String,
	/// `target` attribute, if any.
	pub target: Option<String>,
	/// Whether the link has a `download` attribute.
	pub download: bool,
	/// `rel` attribute, if any.
	pub rel: Option<String>,
}

impl LinkTarget {
	/// Creates a plain same-tab link.
	pub fn new(href: impl Into<String>) -> Self {
		Self {
			href: href.into(),
			..Self::default()
		}
	}
}

/// A click delegated from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClick {
	/// Whether another listener already called `preventDefault()`.
	pub default_prevented: bool,
	/// Mouse button number.
	pub button: i16,
	/// Meta key held.
	pub meta_key: bool,
	/// Control key held.
	pub ctrl_key: bool,
	/// Shift key held.
	pub shift_key: bool,
	/// Alt key held.
	pub alt_key: bool,
	/// Closest ancestor matching the link selector.
	pub link: Option<LinkTarget>,
}

impl LinkClick {
	/// A plain primary-button click on `link`.
	pub fn on(link: LinkTarget) -> Self {
		Self {
			link: Some(link),
			..Self::default()
		}
	}

	fn is_modified(&self) -> bool {
		self.meta_key || self.ctrl_key || self.shift_key || self.alt_key
	}
}

/// Decides whether a click becomes an SPA navigation.
///
/// Returns the path, query and fragment to navigate to, or `None` when the
/// browser should handle the click itself.
pub fn intercept(click: &LinkClick, origin: &str, current: &Location, never_prefix: &str) -> Option<String> {
	if click.default_prevented || click.button != PRIMARY_BUTTON || click.is_modified() {
		return None;
	}

	let link = click.link.as_ref()?;
	if link.target.as_deref() == Some("_blank") || link.download || link.rel.as_deref() == Some("external") {
		return None;
	}

	let (target_origin, location) = Location::resolve(origin, current, &link.href).ok()?;
	if target_origin != origin.trim_end_matches('/') {
		return None;
	}
	if !never_prefix.is_empty() && location.pathname.starts_with(never_prefix) {
		return None;
	}

	Some(location.href())
}
