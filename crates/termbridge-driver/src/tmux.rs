/// Tmux-based terminal driver
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::process::Command;
use tracing::debug;

use super::driver::{SessionHandle, TerminalDriver};

/// Drives a tmux server through its CLI. Windows and tabs both map to tmux
/// windows (the owning session is created on demand); splits map to panes.
/// Handles carry tmux pane ids, which stay stable across window moves.
pub struct TmuxDriver {
    pid: u32,
    window_seq: u32,
}

impl TmuxDriver {
    /// Create a new tmux driver. Fails when tmux is not installed or not
    /// runnable, which the caller treats as a fatal startup error.
    pub fn new() -> Result<Self> {
        let output = Command::new("tmux").arg("-V").output()?;
        if !output.status.success() {
            bail!("tmux command failed - ensure tmux is installed and working");
        }

        Ok(Self {
            pid: std::process::id(),
            window_seq: 0,
        })
    }

    /// Generate a tmux session name for a new detached window.
    /// Format: termbridge-{pid}-{seq}
    fn next_session_name(&mut self) -> String {
        self.window_seq += 1;
        format!("termbridge-{}-{}", self.pid, self.window_seq)
    }

    /// Run a tmux command and return trimmed stdout.
    fn run_tmux_command(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "tmux");
        let output = Command::new("tmux").args(args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("tmux command failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn has_server(&self) -> bool {
        Command::new("tmux")
            .args(["list-sessions"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Map a dotted variable name onto a tmux pane user option (@-prefixed,
    /// dots are not allowed in option names).
    fn option_name(name: &str) -> String {
        format!("@{}", name.replace('.', "_"))
    }
}

#[async_trait]
impl TerminalDriver for TmuxDriver {
    async fn create_window(&mut self) -> Result<SessionHandle> {
        let name = self.next_session_name();
        let pane_id = self.run_tmux_command(&[
            "new-session",
            "-d",
            "-P",
            "-F",
            "#{pane_id}",
            "-s",
            &name,
        ])?;
        Ok(SessionHandle::new(pane_id))
    }

    async fn create_tab(&mut self, in_window: Option<&SessionHandle>) -> Result<SessionHandle> {
        // Without a reachable server there is no window to put a tab in, so
        // fall back to creating a window.
        if in_window.is_none() && !self.has_server() {
            return self.create_window().await;
        }

        let pane_id = match in_window {
            Some(parent) => self.run_tmux_command(&[
                "new-window",
                "-P",
                "-F",
                "#{pane_id}",
                "-t",
                parent.id(),
            ])?,
            None => self.run_tmux_command(&["new-window", "-P", "-F", "#{pane_id}"])?,
        };
        Ok(SessionHandle::new(pane_id))
    }

    async fn split_session(
        &mut self,
        parent: Option<&SessionHandle>,
        vertical: bool,
    ) -> Result<SessionHandle> {
        if parent.is_none() && !self.has_server() {
            return self.create_window().await;
        }

        // A "vertical" split puts panes side by side, which tmux spells -h.
        let orientation = if vertical { "-h" } else { "-v" };
        let pane_id = match parent {
            Some(parent) => self.run_tmux_command(&[
                "split-window",
                orientation,
                "-P",
                "-F",
                "#{pane_id}",
                "-t",
                parent.id(),
            ])?,
            None => {
                self.run_tmux_command(&["split-window", orientation, "-P", "-F", "#{pane_id}"])?
            }
        };
        Ok(SessionHandle::new(pane_id))
    }

    async fn send_text(&mut self, handle: &SessionHandle, text: &str) -> Result<()> {
        // -l sends the text literally; the newline goes as a separate Enter
        // key so tmux does not interpret it as a key name.
        self.run_tmux_command(&["send-keys", "-t", handle.id(), "-l", text])?;
        self.run_tmux_command(&["send-keys", "-t", handle.id(), "Enter"])?;
        Ok(())
    }

    async fn get_contents(
        &self,
        handle: &SessionHandle,
        from_line: usize,
        line_count: usize,
    ) -> Result<Vec<String>> {
        let start = format!("-{}", from_line + line_count);
        let end = format!("-{}", from_line + 1);
        let mut args = vec![
            "capture-pane",
            "-p",
            "-e",
            "-t",
            handle.id(),
            "-S",
            start.as_str(),
        ];
        if from_line > 0 {
            args.push("-E");
            args.push(end.as_str());
        }

        let output = self.run_tmux_command(&args)?;
        // Without -E tmux captures down to the bottom of the visible pane,
        // which can exceed the requested range; keep only the newest lines.
        Ok(tail_lines(&output, line_count))
    }

    async fn get_variable(&self, handle: &SessionHandle, name: &str) -> Result<Option<String>> {
        // session.* variables map to tmux display formats, user.* variables
        // to pane user options.
        if name == "session.name" {
            let title =
                self.run_tmux_command(&["display-message", "-p", "-t", handle.id(), "#{pane_title}"])?;
            return Ok(if title.is_empty() { None } else { Some(title) });
        }

        let option = Self::option_name(name);
        let value =
            self.run_tmux_command(&["show-options", "-pqv", "-t", handle.id(), &option])?;
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    async fn set_variable(
        &mut self,
        handle: &SessionHandle,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let option = Self::option_name(name);
        self.run_tmux_command(&["set-option", "-p", "-t", handle.id(), &option, value])?;
        Ok(())
    }

    async fn close(&mut self, handle: &SessionHandle) -> Result<()> {
        let output = Command::new("tmux")
            .args(["kill-pane", "-t", handle.id()])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Idempotent close: a pane that is already gone is not a failure.
            if stderr.contains("can't find pane") || stderr.contains("no server running") {
                debug!(pane = handle.id(), "close of already-closed pane");
                return Ok(());
            }
            bail!("tmux command failed: {}", stderr.trim());
        }

        Ok(())
    }

    fn driver_name(&self) -> &str {
        "tmux"
    }
}

/// Last `line_count` lines of a capture, oldest first.
fn tail_lines(output: &str, line_count: usize) -> Vec<String> {
    let lines: Vec<String> = output.lines().map(str::to_string).collect();
    let skip = lines.len().saturating_sub(line_count);
    lines[skip..].to_vec()
}
