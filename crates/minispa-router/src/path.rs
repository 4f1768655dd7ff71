//! Path pattern compilation and matching.
//!
//! Patterns are `/`-delimited sequences of literal segments and `:name`
//! parameters, or the catch-all `*`. They are compiled once into anchored
//! regular expressions.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::warn_log;

/// Extracted path parameters, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// Parsed query string.
pub type Query = HashMap<String, String>;

/// The catch-all pattern.
pub const CATCH_ALL: &str = "*";

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
	/// The source pattern.
	pattern: String,
	/// Anchored matcher; `None` for the catch-all.
	regex: Option<Regex>,
	/// Parameter names in the order they appear in the pattern.
	param_names: Vec<String>,
}

impl PathPattern {
	/// Compiles a pattern.
	///
	/// `*` and `/*` compile to the catch-all, which matches every pathname and
	/// captures nothing.
	///
	/// # Errors
	///
	/// Returns [`RouterError::InvalidPattern`] when a parameter segment has an
	/// empty or non-word name (`/users/:`, `/users/:user-id`).
	pub fn compile(pattern: &str) -> Result<Self> {
		if pattern == CATCH_ALL || pattern == "/*" {
			return Ok(Self {
				pattern: pattern.to_string(),
				regex: None,
				param_names: Vec::new(),
			});
		}

		let mut param_names = Vec::new();
		let mut source = String::from("^");

		for (i, segment) in pattern.split('/').enumerate() {
			if i > 0 {
				source.push('/');
			}
			match segment.strip_prefix(':') {
				Some(name) => {
					if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
						return Err(RouterError::InvalidPattern {
							pattern: pattern.to_string(),
							reason: format!("invalid parameter segment `{}`", segment),
						});
					}
					param_names.push(name.to_string());
					source.push_str("([^/]+)");
				}
				None => source.push_str(&regex::escape(segment)),
			}
		}
		source.push('$');

		let regex = Regex::new(&source).map_err(|e| RouterError::InvalidPattern {
			pattern: pattern.to_string(),
			reason: e.to_string(),
		})?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex: Some(regex),
			param_names,
		})
	}

	/// Returns the source pattern.
	pub fn as_str(&self) -> &str {
		&self.pattern
	}

	/// Returns true for the catch-all pattern.
	pub fn is_catch_all(&self) -> bool {
		self.regex.is_none()
	}

	/// Returns the parameter names in pattern order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Matches a pathname, returning the percent-decoded parameters.
	pub fn matches(&self, pathname: &str) -> Option<Params> {
		let Some(regex) = &self.regex else {
			return Some(Params::new());
		};

		let captures = regex.captures(pathname)?;
		let params = self
			.param_names
			.iter()
			.enumerate()
			.map(|(i, name)| {
				let raw = captures.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
				(name.clone(), decode_segment(raw))
			})
			.collect();

		Some(params)
	}
}

fn decode_segment(raw: &str) -> String {
	match urlencoding::decode(raw) {
		Ok(decoded) => decoded.into_owned(),
		Err(e) => {
			warn_log!("keeping undecodable path parameter `{}`: {}", raw, e);
			raw.to_string()
		}
	}
}

/// Strips trailing slashes, keeping the root path intact.
pub fn normalize_path(path: &str) -> String {
	let trimmed = path.trim_end_matches('/');
	if trimmed.is_empty() {
		"/".to_string()
	} else {
		trimmed.to_string()
	}
}

/// Parses a URL query string (with or without its leading `?`).
///
/// Later duplicates of a key win.
pub fn parse_query(search: &str) -> Query {
	let search = search.strip_prefix('?').unwrap_or(search);
	serde_urlencoded::from_str::<Vec<(String, String)>>(search)
		.map(|pairs| pairs.into_iter().collect())
		.unwrap_or_default()
}

/// Strips the leading `#` from a URL fragment.
pub fn strip_hash(hash: &str) -> &str {
	hash.strip_prefix('#').unwrap_or(hash)
}
