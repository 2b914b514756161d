//! Outgoing request header sanitization.
//!
//! Applied to requests that were allowed to proceed. Three independent checks:
//!
//! - **Cookie stripping**: remove `Cookie` when the oracle blocks category
//!   `cookie` from the page hostname to the destination.
//! - **Referrer spoofing**: when `referrer-spoof` is on for the page, replace
//!   a cross-domain `Referer` with `scheme://destination/`.
//! - **User-agent spoofing**: when `ua-spoof` is on for the page, overwrite
//!   `User-Agent` with the configured replacement, whatever it is.

use serde::Serialize;

use crate::category::Category;
use crate::headers::{HeaderSet, COOKIE, REFERER, USER_AGENT};
use crate::policy::{PolicyOracle, Switch};
use crate::request::Request;
use crate::settings::UserSettings;
use crate::uri;

/// Which sanitizations actually modified the headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeOutcome {
    /// `Cookie` was removed.
    pub cookie_stripped: bool,
    /// `Referer` was rewritten.
    pub referer_spoofed: bool,
    /// `User-Agent` was replaced.
    pub user_agent_spoofed: bool,
}

impl SanitizeOutcome {
    /// Returns true if any header changed.
    pub fn changed(&self) -> bool {
        self.cookie_stripped || self.referer_spoofed || self.user_agent_spoofed
    }
}

/// Sanitizes `headers` of `request` issued from a page on `page_hostname`.
pub fn sanitize_request_headers(
    oracle: &dyn PolicyOracle,
    settings: &dyn UserSettings,
    page_hostname: &str,
    request: &Request,
    headers: &mut HeaderSet,
) -> SanitizeOutcome {
    let mut outcome = SanitizeOutcome::default();

    if oracle.must_block(page_hostname, &request.hostname, Category::Cookie) {
        outcome.cookie_stripped = headers.set(COOKIE, "");
    }

    if oracle.evaluate_switch(Switch::ReferrerSpoof, page_hostname) {
        outcome.referer_spoofed = foil_referer(&request.url, &request.hostname, headers);
    }

    // An empty replacement removes the header.
    if oracle.evaluate_switch(Switch::UaSpoof, page_hostname) {
        let replacement = settings.user_agent_replace_str();
        outcome.user_agent_spoofed = headers.set(USER_AGENT, &replacement);
    }

    if outcome.changed() {
        tracing::debug!(
            url = %request.url,
            cookie = outcome.cookie_stripped,
            referer = outcome.referer_spoofed,
            user_agent = outcome.user_agent_spoofed,
            "sanitized request headers"
        );
    }
    outcome
}

/// Rewrites a cross-domain `Referer` to the bare destination origin.
///
/// Same-domain referrers are kept. Returns true if the header changed.
pub fn foil_referer(request_url: &str, to_hostname: &str, headers: &mut HeaderSet) -> bool {
    let referer = headers.get(REFERER);
    if referer.is_empty() {
        return false;
    }
    if uri::domain_from_hostname(to_hostname) == uri::domain_from_url(referer) {
        return false;
    }
    let spoofed = format!("{}://{}/", uri::scheme_from_url(request_url), to_hostname);
    headers.set(REFERER, &spoofed)
}
