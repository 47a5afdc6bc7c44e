use regex::Regex;
use serde::Serialize;

use super::ansi::AnsiFilter;

/// Interaction states a terminal session can be classified into.
/// Exactly one state is reported per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Error,
    Checkpoint,
    PlanApproval,
    Complete,
    WaitingInput,
    Working,
    Idle,
    Unknown,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Error => "error",
            SessionState::Checkpoint => "checkpoint",
            SessionState::PlanApproval => "plan_approval",
            SessionState::Complete => "complete",
            SessionState::WaitingInput => "waiting_input",
            SessionState::Working => "working",
            SessionState::Idle => "idle",
            SessionState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one classification call.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub state: SessionState,
    /// Exact substring that triggered the state, absent for `unknown`.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
}

impl Classification {
    fn unknown() -> Self {
        Self {
            state: SessionState::Unknown,
            matched: None,
        }
    }
}

// Priority order is significant: failure and checkpoint signals must pre-empt
// a superficially-matching spinner or prompt, and a bare idle prompt is the
// weakest signal so it is tested last.
const STATE_PATTERNS: &[(SessionState, &str)] = &[
    (SessionState::Error, r"Error:|FATAL|panic|Traceback|ENOENT|EACCES"),
    (
        SessionState::Checkpoint,
        r"CHECKPOINT SAVED|Context pressure: [89]\d%|Context pressure: 100%",
    ),
    (
        SessionState::PlanApproval,
        r"Waiting for plan approval|Approve this plan\?",
    ),
    (SessionState::Complete, r"All plan steps complete|Task complete"),
    (SessionState::WaitingInput, r"(?i)\?\s+(?:yes|no|approve|reject)"),
    (SessionState::Working, r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]|Running|Executing"),
    (SessionState::Idle, r"(?m)^>\s*$"),
];

/// Classifies terminal output by searching an ordered list of patterns over
/// ANSI-stripped text and reporting the first match.
pub struct StateClassifier {
    filter: AnsiFilter,
    patterns: Vec<(SessionState, Regex)>,
}

impl StateClassifier {
    pub fn new() -> Self {
        let patterns = STATE_PATTERNS
            .iter()
            .map(|(state, pattern)| (*state, Regex::new(pattern).unwrap()))
            .collect();
        Self {
            filter: AnsiFilter::new(),
            patterns,
        }
    }

    pub fn classify(&self, text: &str) -> Classification {
        if text.is_empty() {
            return Classification::unknown();
        }

        let clean = self.filter.strip(text);
        for (state, pattern) in &self.patterns {
            if let Some(found) = pattern.find(&clean) {
                return Classification {
                    state: *state,
                    matched: Some(found.as_str().to_string()),
                };
            }
        }

        Classification::unknown()
    }
}

impl Default for StateClassifier {
    fn default() -> Self {
        Self::new()
    }
}
