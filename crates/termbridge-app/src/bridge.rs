use anyhow::Result;

use termbridge_detect::{AnsiFilter, Classification, StateClassifier};
use termbridge_driver::{SessionHandle, SessionRegistry, TerminalDriver};
use termbridge_types::{
    Action, BridgeError, OpenTarget, Request, Response, SessionSummary, DEFAULT_DETECT_LINES,
    DEFAULT_READ_LINES,
};

/// Routes decoded requests to action handlers. Owns the session registry and
/// the classifier; the terminal driver is absent in standalone mode, where
/// only `ping` and `detect_text` are served.
pub struct Bridge {
    driver: Option<Box<dyn TerminalDriver>>,
    registry: SessionRegistry,
    filter: AnsiFilter,
    classifier: StateClassifier,
}

impl Bridge {
    pub fn new(driver: Box<dyn TerminalDriver>) -> Self {
        Self {
            driver: Some(driver),
            registry: SessionRegistry::new(),
            filter: AnsiFilter::new(),
            classifier: StateClassifier::new(),
        }
    }

    pub fn standalone() -> Self {
        Self {
            driver: None,
            registry: SessionRegistry::new(),
            filter: AnsiFilter::new(),
            classifier: StateClassifier::new(),
        }
    }

    /// Readiness announcement, emitted before the first request is read.
    pub fn ready_response(&self) -> Response {
        let response = Response::ready();
        if self.driver.is_none() {
            response.with("mode", "standalone")
        } else {
            response
        }
    }

    /// Handle one request. Every failure, including driver failures, is
    /// converted into an `ok:false` response here; nothing propagates to the
    /// protocol loop.
    pub async fn handle(&mut self, req: Request) -> Response {
        let action: Action = match req.action.parse() {
            Ok(action) => action,
            Err(e) => return Response::err(&req.id, e),
        };

        if self.driver.is_none() && !action.works_standalone() {
            return Response::err(&req.id, BridgeError::StandaloneOnly);
        }

        let result = match action {
            Action::Ping => Ok(Response::ok(&req.id).with("pong", true)),
            Action::DetectText => {
                let classification = self.classifier.classify(&req.text);
                Ok(classification_response(&req.id, classification))
            }
            Action::Open => self.open(&req).await,
            Action::Close => self.close(&req).await,
            Action::Send => self.send(&req).await,
            Action::Read => self.read(&req).await,
            Action::List => self.list(&req).await,
            Action::Detect => self.detect(&req).await,
            Action::Badge => self.badge(&req).await,
        };

        result.unwrap_or_else(|e| Response::err(&req.id, e))
    }

    fn driver(&self) -> Result<&dyn TerminalDriver> {
        Ok(self.driver.as_deref().ok_or(BridgeError::StandaloneOnly)?)
    }

    fn driver_mut(&mut self) -> Result<&mut dyn TerminalDriver> {
        Ok(self
            .driver
            .as_deref_mut()
            .ok_or(BridgeError::StandaloneOnly)?)
    }

    /// Resolve a terminalId to its handle, or fail with SessionNotFound.
    fn lookup(&self, terminal_id: &str) -> Result<SessionHandle> {
        Ok(self
            .registry
            .get(terminal_id)
            .cloned()
            .ok_or_else(|| BridgeError::SessionNotFound(terminal_id.to_string()))?)
    }

    async fn open(&mut self, req: &Request) -> Result<Response> {
        let driver = self
            .driver
            .as_deref_mut()
            .ok_or(BridgeError::StandaloneOnly)?;

        // Normalized three-way acquisition: every target yields exactly one
        // session handle.
        let handle = match req.target {
            OpenTarget::Window => driver.create_window().await?,
            OpenTarget::Tab => driver.create_tab(None).await?,
            OpenTarget::Split => {
                driver
                    .split_session(None, req.direction.is_vertical())
                    .await?
            }
        };

        if !req.cwd.is_empty() {
            driver.send_text(&handle, &format!("cd {}", req.cwd)).await?;
        }
        for (key, value) in &req.env {
            driver
                .send_text(&handle, &format!("export {}=\"{}\"", key, value))
                .await?;
        }
        if !req.title.is_empty() {
            driver
                .send_text(&handle, &format!("printf '\\e]1;{}\\a'", req.title))
                .await?;
        }
        if !req.command.is_empty() {
            driver.send_text(&handle, &req.command).await?;
        }
        if !req.badge.is_empty() {
            driver.set_variable(&handle, "user.badge", &req.badge).await?;
        }

        let terminal_id = handle.id().to_string();
        let title = if req.title.is_empty() {
            terminal_id.clone()
        } else {
            req.title.clone()
        };
        self.registry.put(terminal_id.clone(), handle);

        Ok(Response::ok(&req.id)
            .with("terminalId", terminal_id)
            .with("title", title))
    }

    async fn close(&mut self, req: &Request) -> Result<Response> {
        let handle = self.lookup(&req.terminal_id)?;
        // Driver close is idempotent, so an already-closed session still
        // counts as success and the entry is dropped either way.
        self.driver_mut()?.close(&handle).await?;
        self.registry.remove(&req.terminal_id);
        Ok(Response::ok(&req.id))
    }

    async fn send(&mut self, req: &Request) -> Result<Response> {
        let handle = self.lookup(&req.terminal_id)?;
        self.driver_mut()?.send_text(&handle, &req.command).await?;
        Ok(Response::ok(&req.id))
    }

    async fn read(&mut self, req: &Request) -> Result<Response> {
        let handle = self.lookup(&req.terminal_id)?;
        let lines = req.lines.unwrap_or(DEFAULT_READ_LINES);
        let content = self.driver()?.get_contents(&handle, 0, lines).await?;

        let mut output = content.join("\n");
        if !req.raw {
            output = self.filter.strip(&output);
        }

        Ok(Response::ok(&req.id).with("output", output))
    }

    async fn list(&self, req: &Request) -> Result<Response> {
        let driver = self.driver()?;

        let mut sessions = Vec::new();
        for (id, entry) in self.registry.list() {
            // A session whose display name can no longer be fetched is
            // reported as not alive rather than dropped from the listing.
            let (title, alive) = match driver.get_variable(&entry.handle, "session.name").await {
                Ok(Some(name)) => (name, true),
                Ok(None) => (id.to_string(), true),
                Err(_) => (id.to_string(), false),
            };
            sessions.push(SessionSummary {
                terminal_id: id.to_string(),
                title,
                alive,
                created_at: entry.created_at.to_rfc3339(),
            });
        }

        Ok(Response::ok(&req.id).with("sessions", sessions))
    }

    async fn detect(&mut self, req: &Request) -> Result<Response> {
        let handle = self.lookup(&req.terminal_id)?;
        let lines = req.lines.unwrap_or(DEFAULT_DETECT_LINES);
        let content = self.driver()?.get_contents(&handle, 0, lines).await?;

        let classification = self.classifier.classify(&content.join("\n"));
        Ok(classification_response(&req.id, classification))
    }

    async fn badge(&mut self, req: &Request) -> Result<Response> {
        let handle = self.lookup(&req.terminal_id)?;
        self.driver_mut()?
            .set_variable(&handle, "user.badge", &req.text)
            .await?;
        Ok(Response::ok(&req.id))
    }
}

fn classification_response(id: &str, classification: Classification) -> Response {
    let response = Response::ok(id).with("state", classification.state.as_str());
    match classification.matched {
        Some(matched) => response.with("match", matched),
        None => response,
    }
}
