//! One check run: manifests in, filtered upgrade reports out.

use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, LevelFilter};

use crate::config::{ResolveContext, ResolvedOptions};
use crate::error::Result;
use crate::filter::{self, Predicate};
use crate::manifest::{find_manifests, DepSection, Manifest, ManifestError, PACKAGE_FILE};
use crate::output::Report;
use crate::registry::{resolve_upgrades, RegistryError, StaticRegistry, VersionSource};

/// Log level implied by `loglevel` and `silent`.
pub fn log_level(options: &ResolvedOptions) -> LevelFilter {
    if options.flag("silent") {
        return LevelFilter::Off;
    }
    match options.get_str("loglevel").unwrap_or("warn") {
        "silent" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "info" => LevelFilter::Info,
        "verbose" => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    }
}

/// Open the registry named by the `registry` option.
pub fn open_registry(options: &ResolvedOptions, ctx: &ResolveContext) -> Result<StaticRegistry> {
    let path = options.get_str("registry").ok_or(RegistryError::Unconfigured)?;
    Ok(StaticRegistry::load(&ctx.cwd.join(path))?)
}

/// Directory manifests are read from: `cwd` option, else the process cwd.
fn project_dir(options: &ResolvedOptions, ctx: &ResolveContext) -> PathBuf {
    options
        .get_str("cwd")
        .map(|dir| ctx.cwd.join(dir))
        .unwrap_or_else(|| ctx.cwd.clone())
}

/// Collect the manifests this run covers.
pub fn read_manifests(options: &ResolvedOptions, ctx: &ResolveContext, stdin: impl Read) -> Result<Vec<Manifest>> {
    if options.flag("stdin") {
        return Ok(vec![Manifest::from_reader(stdin)?]);
    }

    let dir = project_dir(options, ctx);
    if options.flag("deep") {
        let paths = find_manifests(&dir);
        if paths.is_empty() {
            return Err(ManifestError::NotFound(dir).into());
        }
        return paths
            .iter()
            .map(|p| Manifest::read(p).map_err(Into::into))
            .collect();
    }

    let path = match options.get_str("packageFile") {
        Some(file) => ctx.cwd.join(file),
        None => dir.join(PACKAGE_FILE),
    };
    if !path.is_file() {
        let parent = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        return Err(ManifestError::NotFound(parent).into());
    }
    Ok(vec![Manifest::read(&path)?])
}

/// Filter one manifest's dependencies and resolve their upgrades.
pub fn check_manifest<S: VersionSource + ?Sized>(
    manifest: &Manifest,
    sections: &[DepSection],
    predicate: &Predicate,
    registry: &S,
) -> Result<Report> {
    let dependencies = manifest.dependencies(sections);
    let selected: Vec<_> = filter::select_dependencies(&dependencies, predicate)?
        .into_iter()
        .cloned()
        .collect();
    debug!(
        "{}: {} of {} dependencies selected",
        manifest.label(),
        selected.len(),
        dependencies.len()
    );

    let candidates = resolve_upgrades(registry, &selected)?;
    let accepted = filter::select_results(candidates, predicate)?;
    Ok(Report::new(manifest.label(), dependencies, accepted))
}

/// Run a full check with resolved options.
pub fn run_check<S: VersionSource + ?Sized>(
    options: &ResolvedOptions,
    ctx: &ResolveContext,
    stdin: impl Read,
    registry: &S,
) -> Result<Vec<Report>> {
    let sections = DepSection::parse_list(options.get_str("dep").unwrap_or("prod,dev,optional"))?;
    let predicate = Predicate::compile(options)?;
    if predicate.is_empty() {
        debug!("no filters configured, checking every dependency");
    }

    read_manifests(options, ctx, stdin)?
        .iter()
        .map(|manifest| check_manifest(manifest, &sections, &predicate, registry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, CliLayer, OptionValue};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn registry() -> StaticRegistry {
        StaticRegistry::new(BTreeMap::from([
            ("ncu-test-v2".to_string(), "99.9.9".to_string()),
            ("ncu-test-tag".to_string(), "99.9.9".to_string()),
        ]))
    }

    #[test]
    fn test_log_level() {
        let dir = TempDir::new().unwrap();
        let ctx = ResolveContext::new(dir.path());

        let default = resolve(&CliLayer::new(), &ctx).unwrap();
        assert_eq!(log_level(&default), LevelFilter::Warn);

        let verbose = resolve(&CliLayer::new().explicit("loglevel", OptionValue::string("verbose")), &ctx).unwrap();
        assert_eq!(log_level(&verbose), LevelFilter::Debug);

        let silent = resolve(
            &CliLayer::new()
                .explicit("loglevel", OptionValue::string("info"))
                .explicit("silent", OptionValue::bool(true)),
            &ctx,
        )
        .unwrap();
        assert_eq!(log_level(&silent), LevelFilter::Off);
    }

    #[test]
    fn test_stdin_check() {
        let dir = TempDir::new().unwrap();
        let ctx = ResolveContext::new(dir.path());
        let cli = CliLayer::new()
            .explicit("stdin", OptionValue::bool(true))
            .explicit("filter", OptionValue::string("ncu-test-v2"));
        let options = resolve(&cli, &ctx).unwrap();

        let input = br#"{"dependencies": {"ncu-test-v2": "1.0.0", "ncu-test-tag": "0.1.0"}}"#;
        let reports = run_check(&options, &ctx, &input[..], &registry()).unwrap();

        assert_eq!(reports.len(), 1);
        let names: Vec<_> = reports[0].upgrades.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["ncu-test-v2"]);
        assert_eq!(reports[0].dependencies.len(), 2);
    }

    #[test]
    fn test_deep_check() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("packages/a")).unwrap();
        fs::write(dir.path().join("package.json"), r#"{"dependencies": {"ncu-test-v2": "1.0.0"}}"#).unwrap();
        fs::write(
            dir.path().join("packages/a/package.json"),
            r#"{"devDependencies": {"ncu-test-tag": "0.1.0"}}"#,
        )
        .unwrap();

        let ctx = ResolveContext::new(dir.path());
        let options = resolve(&CliLayer::new().explicit("deep", OptionValue::bool(true)), &ctx).unwrap();
        let reports = run_check(&options, &ctx, std::io::empty(), &registry()).unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.upgrades.len() == 1));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let ctx = ResolveContext::new(dir.path());
        let options = resolve(&CliLayer::new(), &ctx).unwrap();

        let err = run_check(&options, &ctx, std::io::empty(), &registry()).unwrap_err();
        assert!(err.to_string().contains("No package.json"));
    }

    #[test]
    fn test_registry_required() {
        let dir = TempDir::new().unwrap();
        let ctx = ResolveContext::new(dir.path());
        let options = resolve(&CliLayer::new(), &ctx).unwrap();

        assert!(matches!(
            open_registry(&options, &ctx),
            Err(crate::Error::Registry(RegistryError::Unconfigured))
        ));
    }
}
