//! Dotfile management engine.
//!
//! Keeps a canonical copy of configuration files in a dotfiles directory and
//! materializes them into the home directory as symlinks, while recording
//! which package managers and git repositories should be kept in sync with
//! it.  Everything is driven by TOML files under the punkt home directory.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load the global configuration and read or write the
//!   per-manager files
//! - **[`symlink`]**: the reconciliation algorithm (adopt, link, undo)
//! - **[`managers`]**: the symlink, git and generic managers plus the
//!   [`RootManager`](managers::RootManager) that drives them
//! - **[`commands`]**: top-level subcommand orchestration (`add`, `remove`,
//!   `dump`, `ensure`, `update`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod managers;
pub mod operations;
pub mod path;
pub mod symlink;
