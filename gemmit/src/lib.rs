//! Interactive commit-message assistant.
//!
//! gemmit inspects the staged changes of a git repository, asks a generator for
//! a commit message, walks the user through a warning and a confirmation
//! prompt, then commits. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (state machine, classification,
//!   prompt rendering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (git, generator backends, config,
//!   terminal). Behind traits so tests can script them.
//!
//! [`driver`] owns the workflow model and runs collaborator calls as
//! background [`tasks`]; [`render`] turns the model into terminal views.

pub mod core;
pub mod driver;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod render;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
