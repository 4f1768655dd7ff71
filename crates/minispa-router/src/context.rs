//! Per-navigation context handed to guards, components and animation hooks.

use serde::Serialize;
use serde_json::Value;

use crate::host::Location;
use crate::path::{Params, Query, parse_query, strip_hash};

/// Everything a guard, view or hook knows about the navigation in progress.
///
/// Built fresh for every render and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationContext {
	/// Normalized pathname (e.g. `/posts/42`).
	pub path: String,
	/// Percent-decoded route parameters.
	pub params: Params,
	/// Query string parameters.
	pub query: Query,
	/// URL fragment without the leading `#`.
	pub hash: String,
	/// Opaque payload attached to the navigation that triggered this render.
	pub state: Option<Value>,
}

impl NavigationContext {
	/// Returns a route parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// Returns a query parameter.
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query.get(name).map(String::as_str)
	}

	/// Returns the path with its query string and fragment, as the user sees it.
	pub fn full_url(&self) -> String {
		let mut url = self.path.clone();
		if !self.query.is_empty() {
			let mut pairs: Vec<_> = self.query.iter().collect();
			pairs.sort();
			let encoded = serde_urlencoded::to_string(pairs).unwrap_or_default();
			url.push('?');
			url.push_str(&encoded);
		}
		if !self.hash.is_empty() {
			url.push('#');
			url.push_str(&self.hash);
		}
		url
	}
}

/// Builds the context for one render.
///
/// `pathname` must already be normalized; query and hash come from `location`.
pub fn build_context(
	pathname: &str,
	params: Params,
	location: &Location,
	state: Option<Value>,
) -> NavigationContext {
	NavigationContext {
		path: pathname.to_string(),
		params,
		query: parse_query(&location.search),
		hash: strip_hash(&location.hash).to_string(),
		state,
	}
}
