//! Error type for Slack Web API calls.

/// Uniform classification of everything that can go wrong talking to
/// the Slack API. No raw transport error escapes the client uncaught.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx HTTP response.
    #[error("Slack API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx envelope with `ok: false`; `code` is Slack's error string.
    #[error("Slack API call {method} failed: {code}")]
    Api { method: String, code: String },

    /// A 2xx body missing a field the operation requires.
    #[error("failed to parse {method} response: {detail}")]
    Parse { method: String, detail: String },

    /// The server kept returning a non-empty cursor past the page cap.
    #[error("{method} returned {pages} pages without draining its cursor")]
    PaginationLimit { method: String, pages: usize },
}
