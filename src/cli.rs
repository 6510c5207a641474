//! Command-line surface
//!
//! Long options use the option names verbatim (`--jsonUpgraded`). Every
//! boolean has a hidden `--no-<name>` twin; the two override each other so
//! the last one typed wins. [`layer_from_matches`] turns parsed arguments into
//! a [`CliLayer`], marking which values were actually typed.

use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, Parser};

use crate::config::{CliLayer, OptionValue};

#[derive(Parser, Debug)]
#[command(name = "ncu-rc")]
#[command(about = "Resolve rc configuration and filter dependency upgrades", version)]
pub struct Cli {
    /// Directory of the rc file (default: search upward from the project)
    #[arg(id = "configFilePath", long = "configFilePath", value_name = "DIR")]
    pub config_file_path: Option<String>,

    /// rc file name; the file must exist
    #[arg(id = "configFileName", long = "configFileName", value_name = "NAME")]
    pub config_file_name: Option<String>,

    /// Merge the rc file even when auto-discovery is suppressed
    #[arg(id = "mergeConfig", long = "mergeConfig", overrides_with = "no-mergeConfig")]
    pub merge_config: bool,

    #[arg(id = "no-mergeConfig", long = "no-mergeConfig", overrides_with = "mergeConfig", hide = true)]
    pub no_merge_config: bool,

    /// Working directory to read package.json from
    #[arg(id = "cwd", long = "cwd", value_name = "DIR")]
    pub cwd: Option<String>,

    /// Manifest path (default: ./package.json)
    #[arg(id = "packageFile", long = "packageFile", value_name = "PATH")]
    pub package_file: Option<String>,

    /// Read the manifest from standard input
    #[arg(id = "stdin", long = "stdin", overrides_with = "no-stdin")]
    pub stdin: bool,

    #[arg(id = "no-stdin", long = "no-stdin", overrides_with = "stdin", hide = true)]
    pub no_stdin: bool,

    /// Include only package names matching the given names, wildcards or /regex/
    #[arg(id = "filter", long = "filter", short = 'f', value_name = "SPEC")]
    pub filter: Option<String>,

    /// Exclude package names matching the given names, wildcards or /regex/
    #[arg(id = "reject", long = "reject", short = 'x', value_name = "SPEC")]
    pub reject: Option<String>,

    /// Include only current versions matching the given spec
    #[arg(id = "filterVersion", long = "filterVersion", value_name = "SPEC")]
    pub filter_version: Option<String>,

    /// Exclude current versions matching the given spec
    #[arg(id = "rejectVersion", long = "rejectVersion", value_name = "SPEC")]
    pub reject_version: Option<String>,

    /// Dependency sections to check: prod, dev, optional, peer
    #[arg(id = "dep", long = "dep", value_name = "SECTIONS", default_value = "prod,dev,optional")]
    pub dep: String,

    /// Print upgraded dependencies as JSON
    #[arg(id = "jsonUpgraded", long = "jsonUpgraded", overrides_with = "no-jsonUpgraded")]
    pub json_upgraded: bool,

    #[arg(id = "no-jsonUpgraded", long = "no-jsonUpgraded", overrides_with = "jsonUpgraded", hide = true)]
    pub no_json_upgraded: bool,

    /// Print every dependency as JSON with upgrades applied
    #[arg(id = "jsonAll", long = "jsonAll", short = 'j', overrides_with = "no-jsonAll")]
    pub json_all: bool,

    #[arg(id = "no-jsonAll", long = "no-jsonAll", overrides_with = "jsonAll", hide = true)]
    pub no_json_all: bool,

    /// Check every package.json below the working directory
    #[arg(id = "deep", long = "deep", overrides_with = "no-deep")]
    pub deep: bool,

    #[arg(id = "no-deep", long = "no-deep", overrides_with = "deep", hide = true)]
    pub no_deep: bool,

    /// silent, error, warn, info or verbose
    #[arg(id = "loglevel", long = "loglevel", short = 'l', value_name = "LEVEL", default_value = "warn")]
    pub loglevel: String,

    /// Suppress all logging
    #[arg(id = "silent", long = "silent", short = 's', overrides_with = "no-silent")]
    pub silent: bool,

    #[arg(id = "no-silent", long = "no-silent", overrides_with = "silent", hide = true)]
    pub no_silent: bool,

    /// JSON file mapping package names to their latest version
    #[arg(id = "registry", long = "registry", value_name = "FILE")]
    pub registry: Option<String>,
}

/// Build the command-line layer from parsed arguments.
pub fn layer_from_matches(matches: &ArgMatches) -> CliLayer {
    let mut layer = CliLayer::new();
    let command = Cli::command();

    for arg in command.get_arguments() {
        let id = arg.get_id().as_str();
        let value = match arg.get_action() {
            ArgAction::SetTrue => match matches.try_get_one::<bool>(id) {
                Ok(Some(flag)) => OptionValue::bool(*flag),
                _ => continue,
            },
            ArgAction::Set => match matches.try_get_one::<String>(id) {
                Ok(Some(text)) => OptionValue::string(text.as_str()),
                _ => continue,
            },
            _ => continue,
        };
        let explicit = matches.value_source(id) == Some(ValueSource::CommandLine);
        layer.set(id, value, explicit);
    }
    layer
}

/// Parse `args` (including the program name) into a command-line layer.
pub fn parse_layer<I, T>(args: I) -> Result<CliLayer, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    Ok(layer_from_matches(&matches))
}
