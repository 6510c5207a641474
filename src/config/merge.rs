//! Configuration merge logic
//!
//! Implements the 3-layer merge, lowest precedence first:
//! 1. Built-in defaults
//! 2. rc file (skipped when absent or empty)
//! 3. Options typed on the command line
//!
//! Overlay is per key: a key present in a higher layer replaces the lower
//! value outright, including boolean `false` and lists. Values the argument
//! parser filled in on its own never take part.

use log::debug;

use super::effective::ResolvedOptions;
use super::layer::{CliLayer, ConfigLayer, ConfigOrigin, ConfigSource};
use super::value::OptionValue;

/// Overlay `entries` onto `resolved`, recording `origin` for every key.
pub fn overlay<'a>(
    resolved: &mut ResolvedOptions,
    origin: ConfigOrigin,
    entries: impl IntoIterator<Item = (&'a String, &'a OptionValue)>,
) {
    for (key, value) in entries {
        debug!("{:?} sets {} = {:?}", origin, key, value);
        resolved.set(key.clone(), value.clone(), origin);
    }
}

/// Merge the layers for one invocation.
///
/// An rc layer with no option keys contributes nothing: the result is the
/// same as passing `None`, and no rc path is recorded.
pub fn merge(defaults: &ConfigLayer, rc: Option<&ConfigLayer>, cli: &CliLayer) -> ResolvedOptions {
    let mut resolved = ResolvedOptions::default();

    resolved.add_source(defaults.source().clone());
    overlay(&mut resolved, ConfigOrigin::Default, defaults.iter());

    if let Some(layer) = rc.filter(|l| !l.is_empty()) {
        resolved.add_source(layer.source().clone());
        if let Some(path) = &layer.source().path {
            resolved.set_rc_config_path(path.clone());
        }
        overlay(&mut resolved, ConfigOrigin::RcFile, layer.iter());
    }

    let overrides = cli.explicit_overrides();
    if !overrides.is_empty() {
        resolved.add_source(ConfigSource {
            origin: ConfigOrigin::Cli,
            path: None,
            digest: None,
        });
    }
    overlay(&mut resolved, ConfigOrigin::Cli, overrides.iter());

    resolved
}
