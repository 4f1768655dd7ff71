//! Ready-made guards.
//!
//! [`require_auth`] protects routes behind a login, delegating token and
//! session handling to an application-provided [`SessionProvider`].
//! [`reject_api_paths`] is the default global pre-navigation check.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;

use crate::error::BoxError;
use crate::guard::{Guard, GuardOutcome};
use crate::link::DEFAULT_NEVER_INTERCEPT;
use crate::{error_log, info_log, warn_log};

/// Client-side view of the user's session.
#[async_trait(?Send)]
pub trait SessionProvider {
	/// Whether an access token is present.
	fn is_logged_in(&self) -> bool;

	/// Whether the access token looks expired.
	fn is_token_expired(&self) -> bool;

	/// Tries to restore or refresh the session; returns true on success.
	async fn init_from_storage(&self) -> bool;

	/// Forgets the session.
	fn clear(&self);
}

/// Server-side session check; `Ok(true)` means the session is valid.
pub type SessionCheck = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<bool, BoxError>>>;

/// Options of [`require_auth`].
#[derive(Clone)]
pub struct RequireAuth {
	/// Where unauthenticated users are sent.
	pub login_path: String,
	/// Optional authoritative session check.
	pub check_session: Option<SessionCheck>,
}

impl Default for RequireAuth {
	fn default() -> Self {
		Self {
			login_path: "/login".to_string(),
			check_session: None,
		}
	}
}

impl fmt::Debug for RequireAuth {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RequireAuth")
			.field("login_path", &self.login_path)
			.field("check_session", &self.check_session.is_some())
			.finish()
	}
}

/// Builds a guard that redirects to the login page unless a session exists.
///
/// The redirect carries the requested URL as `?next=`. An expired token is
/// refreshed through [`SessionProvider::init_from_storage`] first. When a
/// session check is configured, it has the final word; a failed or erroring
/// check clears the session.
pub fn require_auth(session: Rc<dyn SessionProvider>, options: RequireAuth) -> Guard {
	let options = Rc::new(options);
	Guard::future(move |ctx| {
		let session = session.clone();
		let options = options.clone();
		async move {
			info_log!("checking auth for {}", ctx.path);
			let login = format!(
				"{}?next={}",
				options.login_path,
				urlencoding::encode(&ctx.full_url())
			);

			if !session.is_logged_in() {
				warn_log!("not logged in, redirecting to {}", options.login_path);
				return Ok::<_, BoxError>(GuardOutcome::Redirect(login));
			}

			if session.is_token_expired() {
				info_log!("token looks expired, refreshing");
				if !session.init_from_storage().await {
					warn_log!("session refresh failed");
					return Ok(GuardOutcome::Redirect(login));
				}
			}

			let Some(check) = &options.check_session else {
				return Ok(GuardOutcome::Allow);
			};
			match check().await {
				Ok(true) => return Ok(GuardOutcome::Allow),
				Ok(false) => warn_log!("session check rejected {}", ctx.path),
				Err(err) => error_log!("session check failed: {}", err),
			}
			session.clear();
			Ok(GuardOutcome::Redirect(login))
		}
	})
}

/// Pre-navigation check refusing URLs under `/api/`.
pub fn reject_api_paths(to: &str) -> bool {
	!to.starts_with(DEFAULT_NEVER_INTERCEPT)
}
