//! Subcommands beyond the long-running supervisor.

pub mod once;

pub use once::OnceArgs;
