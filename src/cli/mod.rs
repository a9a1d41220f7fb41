pub mod commands;
pub mod core;
pub mod format;
mod help;
pub mod io;
pub mod output;
mod registry;
mod shell;
pub mod shell_context;

pub use shell::run_cli;
