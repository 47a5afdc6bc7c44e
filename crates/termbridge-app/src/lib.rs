// termbridge - JSON-over-stdio bridge to terminal multiplexer sessions
//
// An orchestrating process writes one JSON request per line to stdin and
// reads one JSON response per line from stdout. The bridge opens, drives,
// inspects and closes terminal sessions on its behalf.

mod bridge;
mod protocol;

pub use bridge::Bridge;
pub use protocol::run_loop;
