/// Terminal driver abstraction over host terminal automation surfaces
use anyhow::Result;
use async_trait::async_trait;

/// Opaque reference to one live terminal window/tab/pane. The identifier is
/// generated by the driver at creation time and doubles as the registry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: String,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Terminal driver trait - abstraction over the host terminal application.
///
/// `close` is idempotent by contract: closing a session that is already gone
/// must return Ok, never a hard failure.
#[async_trait]
pub trait TerminalDriver: Send + Sync {
    /// Materialize a new top-level window and return its session handle.
    async fn create_window(&mut self) -> Result<SessionHandle>;

    /// Materialize a new tab, in the given window when one is supplied,
    /// otherwise in the current window. Must yield a handle even when no
    /// window exists yet (by creating one).
    async fn create_tab(&mut self, in_window: Option<&SessionHandle>) -> Result<SessionHandle>;

    /// Split a session into a new pane. With no parent, splits the current
    /// session; must yield a handle even when no session exists yet.
    async fn split_session(
        &mut self,
        parent: Option<&SessionHandle>,
        vertical: bool,
    ) -> Result<SessionHandle>;

    /// Send text to the session's input stream, followed by a newline.
    async fn send_text(&mut self, handle: &SessionHandle, text: &str) -> Result<()>;

    /// Fetch a line range of scrollback/screen content, newest lines last.
    /// Lines may contain embedded escape sequences.
    async fn get_contents(
        &self,
        handle: &SessionHandle,
        from_line: usize,
        line_count: usize,
    ) -> Result<Vec<String>>;

    /// Read a named session variable, None when unset.
    async fn get_variable(&self, handle: &SessionHandle, name: &str) -> Result<Option<String>>;

    /// Set a named session variable.
    async fn set_variable(&mut self, handle: &SessionHandle, name: &str, value: &str)
        -> Result<()>;

    /// Close the session. Closing an already-closed session returns Ok.
    async fn close(&mut self, handle: &SessionHandle) -> Result<()>;

    /// Driver name for diagnostics.
    fn driver_name(&self) -> &str;
}

/// Which concrete driver binding to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriverKind {
    #[default]
    Tmux,
}

impl std::str::FromStr for DriverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tmux" => Ok(Self::Tmux),
            _ => Err(anyhow::anyhow!(
                "Invalid terminal driver: '{}'. Valid options: 'tmux'",
                s
            )),
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tmux => write!(f, "tmux"),
        }
    }
}
