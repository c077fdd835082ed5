//! Side-effecting collaborators: git, generator backends, config and the terminal.

pub mod committer;
pub mod config;
pub mod generator;
pub mod git;
pub mod inspector;
pub mod process;
pub mod terminal;
