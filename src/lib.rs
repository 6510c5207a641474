//! ncu-rc - rc configuration resolution and dependency filtering
//!
//! This crate decides, for one invocation, which options are in effect and
//! which dependencies are candidates for upgrade:
//!
//! 1. [`config`] finds and loads an `.ncurc.*` file and merges it with the
//!    built-in defaults and the options typed on the command line.
//! 2. [`filter`] compiles the `filter`, `reject`, `filterVersion`,
//!    `rejectVersion` and `filterResults` axes and applies them to a
//!    dependency list.

pub mod check;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod output;
pub mod registry;

pub use config::{resolve, CliLayer, ConfigError, OptionValue, ResolveContext, ResolvedOptions};
pub use dependency::{Candidate, Dependency, UpgradeCandidate, VersionInfo};
pub use error::{Error, Result};
pub use filter::{FilterError, Predicate};
