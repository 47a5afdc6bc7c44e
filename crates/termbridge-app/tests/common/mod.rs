use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use termbridge_driver::{SessionHandle, TerminalDriver};

/// Scripted in-memory driver state, shared with the test so it can seed pane
/// contents and inspect what the bridge did after the run.
#[derive(Debug, Default)]
pub struct FakeState {
    next_id: u32,
    pub panes: HashMap<String, FakePane>,
}

#[derive(Debug, Default)]
pub struct FakePane {
    /// How the pane was created: "window", "tab" or "split".
    pub kind: String,
    /// Text sent to the pane, newline included.
    pub sent: Vec<String>,
    /// Scripted scrollback, oldest first.
    pub contents: Vec<String>,
    pub variables: HashMap<String, String>,
    pub closed: bool,
    /// When set, variable reads fail as if the pane vanished.
    pub broken: bool,
}

impl FakeState {
    fn create_pane(&mut self, kind: &str) -> SessionHandle {
        self.next_id += 1;
        let id = format!("fake-{}", self.next_id);
        // Keep any pre-scripted pane state (contents, variables, flags) so
        // tests can stage behavior for panes that do not exist yet.
        let pane = self.panes.entry(id.clone()).or_default();
        pane.kind = kind.to_string();
        SessionHandle::new(id)
    }

    pub fn set_contents(&mut self, id: &str, lines: &[&str]) {
        if let Some(pane) = self.panes.get_mut(id) {
            pane.contents = lines.iter().map(|line| line.to_string()).collect();
        }
    }
}

/// TerminalDriver backed by `FakeState`, for protocol tests without a live
/// terminal application.
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

#[async_trait]
impl TerminalDriver for FakeDriver {
    async fn create_window(&mut self) -> Result<SessionHandle> {
        Ok(self.state.lock().unwrap().create_pane("window"))
    }

    async fn create_tab(&mut self, _in_window: Option<&SessionHandle>) -> Result<SessionHandle> {
        Ok(self.state.lock().unwrap().create_pane("tab"))
    }

    async fn split_session(
        &mut self,
        _parent: Option<&SessionHandle>,
        _vertical: bool,
    ) -> Result<SessionHandle> {
        Ok(self.state.lock().unwrap().create_pane("split"))
    }

    async fn send_text(&mut self, handle: &SessionHandle, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.panes.get_mut(handle.id()) {
            Some(pane) if !pane.closed => {
                pane.sent.push(format!("{}\n", text));
                Ok(())
            }
            Some(_) => bail!("session closed: {}", handle.id()),
            None => bail!("no such session: {}", handle.id()),
        }
    }

    async fn get_contents(
        &self,
        handle: &SessionHandle,
        _from_line: usize,
        line_count: usize,
    ) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        match state.panes.get(handle.id()) {
            Some(pane) => {
                let skip = pane.contents.len().saturating_sub(line_count);
                Ok(pane.contents[skip..].to_vec())
            }
            None => bail!("no such session: {}", handle.id()),
        }
    }

    async fn get_variable(&self, handle: &SessionHandle, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        match state.panes.get(handle.id()) {
            Some(pane) if pane.broken => bail!("connection lost: {}", handle.id()),
            Some(pane) => Ok(pane.variables.get(name).cloned()),
            None => bail!("no such session: {}", handle.id()),
        }
    }

    async fn set_variable(
        &mut self,
        handle: &SessionHandle,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.panes.get_mut(handle.id()) {
            Some(pane) => {
                pane.variables.insert(name.to_string(), value.to_string());
                Ok(())
            }
            None => bail!("no such session: {}", handle.id()),
        }
    }

    async fn close(&mut self, handle: &SessionHandle) -> Result<()> {
        // Idempotent: closing an unknown or already-closed pane succeeds.
        if let Some(pane) = self.state.lock().unwrap().panes.get_mut(handle.id()) {
            pane.closed = true;
        }
        Ok(())
    }

    fn driver_name(&self) -> &str {
        "fake"
    }
}
