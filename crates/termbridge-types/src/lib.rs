//! Core protocol types for termbridge
//!
//! This crate provides the request/response data model shared by the bridge
//! router, the protocol loop, and the terminal driver binding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Constants
// ============================================================================

/// Default number of scrollback lines fetched by the `read` action
pub const DEFAULT_READ_LINES: usize = 50;

/// Default number of scrollback lines inspected by the `detect` action
pub const DEFAULT_DETECT_LINES: usize = 20;

// ============================================================================
// Errors
// ============================================================================

/// Request-level failures surfaced to the caller as `ok:false` responses.
/// None of these terminate the bridge process.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Standalone mode: only ping and detect_text supported")]
    StandaloneOnly,
}

// ============================================================================
// Actions
// ============================================================================

/// The closed set of operations the bridge understands. Anything else on the
/// wire falls through to `BridgeError::UnknownAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Close,
    Send,
    Read,
    List,
    Detect,
    Badge,
    Ping,
    DetectText,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Open => "open",
            Action::Close => "close",
            Action::Send => "send",
            Action::Read => "read",
            Action::List => "list",
            Action::Detect => "detect",
            Action::Badge => "badge",
            Action::Ping => "ping",
            Action::DetectText => "detect_text",
        }
    }

    /// True for actions that are answered even when no terminal driver is
    /// connected (standalone mode).
    pub fn works_standalone(&self) -> bool {
        matches!(self, Action::Ping | Action::DetectText)
    }
}

impl std::str::FromStr for Action {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, BridgeError> {
        match s {
            "open" => Ok(Action::Open),
            "close" => Ok(Action::Close),
            "send" => Ok(Action::Send),
            "read" => Ok(Action::Read),
            "list" => Ok(Action::List),
            "detect" => Ok(Action::Detect),
            "badge" => Ok(Action::Badge),
            "ping" => Ok(Action::Ping),
            "detect_text" => Ok(Action::DetectText),
            other => Err(BridgeError::UnknownAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Where `open` materializes a new session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenTarget {
    #[default]
    Window,
    Tab,
    Split,
}

/// Split orientation for `open` with `target:"split"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    #[default]
    Vertical,
    Horizontal,
}

impl SplitDirection {
    pub fn is_vertical(&self) -> bool {
        matches!(self, SplitDirection::Vertical)
    }
}

/// One decoded request line. Every field except `action` is optional on the
/// wire; missing fields decode to their defaults so handlers can read them
/// without re-validating shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    /// Caller-assigned correlation id, echoed verbatim in the response.
    pub id: String,
    pub action: String,

    // open
    pub command: String,
    pub title: String,
    pub cwd: String,
    /// Sorted so multi-variable opens replay in a stable order.
    pub env: BTreeMap<String, String>,
    pub target: OpenTarget,
    pub direction: SplitDirection,
    pub badge: String,

    // close / send / read / detect / badge
    pub terminal_id: String,
    pub lines: Option<usize>,
    pub raw: bool,

    // detect_text
    pub text: String,
}

// ============================================================================
// Responses
// ============================================================================

/// One response line. `id` is absent only on the readiness announcement and
/// the startup diagnostic; `error` is present exactly when `ok` is false.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl Response {
    /// Successful response for a request.
    pub fn ok(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ok: true,
            error: None,
            fields: serde_json::Map::new(),
        }
    }

    /// Failed response for a request.
    pub fn err(id: &str, error: impl std::fmt::Display) -> Self {
        Self {
            id: Some(id.to_string()),
            ok: false,
            error: Some(error.to_string()),
            fields: serde_json::Map::new(),
        }
    }

    /// Readiness announcement emitted before the first request is read.
    pub fn ready() -> Self {
        Self {
            id: None,
            ok: true,
            error: None,
            fields: serde_json::Map::new(),
        }
        .with("ready", true)
    }

    /// Response for an input line that failed to parse as JSON. The caller
    /// never learns the request id in this case, so it defaults to "".
    pub fn invalid_json(detail: impl std::fmt::Display) -> Self {
        Self::err("", format!("Invalid JSON: {}", detail))
    }

    /// Fatal startup diagnostic, emitted once before the process exits.
    pub fn startup_failure(error: impl std::fmt::Display) -> Self {
        Self {
            id: None,
            ok: false,
            error: Some(error.to_string()),
            fields: serde_json::Map::new(),
        }
    }

    /// Attach an extra field to the envelope.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }
}

// ============================================================================
// List output
// ============================================================================

/// One entry of the `list` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub terminal_id: String,
    pub title: String,
    pub alive: bool,
    pub created_at: String,
}
