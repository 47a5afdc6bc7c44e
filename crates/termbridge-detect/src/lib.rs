// Terminal output classification
//
// Pure, stateless helpers that turn raw captured terminal text into one of a
// small set of interaction states. Escape sequences are stripped first so
// patterns only ever see printable content.

mod ansi;
mod classifier;

pub use ansi::AnsiFilter;
pub use classifier::{Classification, SessionState, StateClassifier};
