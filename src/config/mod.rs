//! Configuration resolution
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in option defaults
//! 2. rc file (`.ncurc.json`, `.ncurc.cjs`, `.ncurc.js`, ...), discovered
//!    upward from the working directory or named explicitly
//! 3. Options typed on the command line

mod defaults;
mod effective;
mod layer;
mod load;
mod locate;
mod merge;
mod value;

pub use defaults::{
    is_boolean, is_predicate_axis, spec, BuiltinDefaults, DefaultValue, OptionKind, OptionSpec, DEP_SECTIONS,
    LOG_LEVELS, OPTIONS, PREDICATE_AXES,
};
pub use effective::{resolve, ConfigError, ResolveContext, ResolvedOptions, SUPPRESS_ENV};
pub use layer::{negated_name, CliEntry, CliLayer, ConfigLayer, ConfigOrigin, ConfigSource};
pub use load::{load, RcFormat};
pub use locate::{discover, locate, RC_FILE_NAMES};
pub use merge::{merge, overlay};
pub(crate) use value::split_regex_literal;
pub use value::{Callback, CallbackError, CallbackInput, Literal, OptionValue, Pattern};
