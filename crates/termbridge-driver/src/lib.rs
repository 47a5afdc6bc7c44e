// Terminal automation layer
//
// This crate provides the capability interface the bridge uses to drive a
// host terminal application (create windows/tabs/splits, send text, capture
// output), the registry that tracks live sessions by opaque identifier, and
// the concrete tmux binding.

mod driver;
mod registry;
mod tmux;

pub use driver::{DriverKind, SessionHandle, TerminalDriver};
pub use registry::{RegisteredSession, SessionRegistry};
pub use tmux::TmuxDriver;
