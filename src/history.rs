//! Session history endpoint.
//!
//! Fetches the ordered message records for a session over HTTP, used to
//! repopulate the message list when a session is selected. The history
//! endpoint lives on the same origin as the socket:
//!
//! `GET <http|https>://<host>/api/chats/<session_id>/`
//!
//! The response is a JSON array of `{role, content}` records, oldest
//! first.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::Result;
use crate::protocol::ChatMessage;
use crate::session::{Endpoints, SessionId};

// ============================================================================
// Fetch
// ============================================================================

/// Fetches the message history for a session.
///
/// # Errors
///
/// Returns [`Error::Http`](crate::Error::Http) if the request fails, the
/// server responds with an error status, or the body is not a valid
/// record array.
pub async fn fetch(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    session: SessionId,
) -> Result<Vec<ChatMessage>> {
    let url = endpoints.history_url(session);
    debug!(%session, %url, "fetching session history");

    let messages = http
        .get(url.as_str())
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<ChatMessage>>()
        .await?;

    debug!(%session, count = messages.len(), "session history fetched");
    Ok(messages)
}

// ============================================================================
// Tests
// ============================================================================
