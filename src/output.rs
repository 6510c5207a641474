//! Rendering of upgrade reports.

use serde_json::{Map, Value};

use crate::config::ResolvedOptions;
use crate::dependency::{Dependency, UpgradeCandidate};

/// Message printed when nothing is upgradeable.
pub const UP_TO_DATE: &str = "All dependencies match the latest package versions :)";

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    /// `{name: upgradedVersion}` for upgrades only.
    JsonUpgraded,
    /// Every dependency, upgrades applied.
    JsonAll,
}

impl OutputFormat {
    pub fn from_options(options: &ResolvedOptions) -> Self {
        if options.flag("jsonAll") {
            OutputFormat::JsonAll
        } else if options.flag("jsonUpgraded") {
            OutputFormat::JsonUpgraded
        } else {
            OutputFormat::Table
        }
    }

    pub fn is_json(self) -> bool {
        self != OutputFormat::Table
    }
}

/// Outcome for one manifest.
#[derive(Debug, Clone)]
pub struct Report {
    /// Manifest path, or `-` for stdin.
    pub label: String,
    /// Every dependency read from the selected sections.
    pub dependencies: Vec<Dependency>,
    /// Accepted candidates whose version changes.
    pub upgrades: Vec<UpgradeCandidate>,
}

impl Report {
    pub fn new(label: impl Into<String>, dependencies: Vec<Dependency>, accepted: Vec<UpgradeCandidate>) -> Self {
        Self {
            label: label.into(),
            dependencies,
            upgrades: accepted.into_iter().filter(UpgradeCandidate::is_upgrade).collect(),
        }
    }

    fn to_json(&self, format: OutputFormat) -> Value {
        let mut map = Map::new();
        match format {
            OutputFormat::JsonAll => {
                for dep in &self.dependencies {
                    map.insert(dep.name.clone(), Value::String(dep.current_version.clone()));
                }
                for upgrade in &self.upgrades {
                    if let Some(version) = &upgrade.upgraded_version {
                        map.insert(upgrade.name.clone(), Value::String(version.clone()));
                    }
                }
            }
            OutputFormat::JsonUpgraded | OutputFormat::Table => {
                for upgrade in &self.upgrades {
                    if let Some(version) = &upgrade.upgraded_version {
                        map.insert(upgrade.name.clone(), Value::String(version.clone()));
                    }
                }
            }
        }
        Value::Object(map)
    }

    fn to_table(&self) -> String {
        if self.upgrades.is_empty() {
            return UP_TO_DATE.to_string();
        }
        let name_width = self.upgrades.iter().map(|u| u.name.len()).max().unwrap_or(0);
        let current_width = self.upgrades.iter().map(|u| u.current_version.len()).max().unwrap_or(0);
        self.upgrades
            .iter()
            .map(|u| {
                format!(
                    " {:<name_width$}  {:>current_width$}  →  {}",
                    u.name,
                    u.current_version,
                    u.upgraded_version.as_deref().unwrap_or(""),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render reports. With `deep`, JSON is keyed by manifest and tables get a
/// heading per manifest.
pub fn render(reports: &[Report], format: OutputFormat, deep: bool) -> Result<String, serde_json::Error> {
    if format.is_json() {
        let value = if deep {
            Value::Object(
                reports
                    .iter()
                    .map(|r| (r.label.clone(), r.to_json(format)))
                    .collect(),
            )
        } else {
            reports
                .first()
                .map(|r| r.to_json(format))
                .unwrap_or_else(|| Value::Object(Map::new()))
        };
        return serde_json::to_string_pretty(&value);
    }

    let sections: Vec<String> = reports
        .iter()
        .map(|r| {
            if deep {
                format!("{}\n{}", r.label, r.to_table())
            } else {
                r.to_table()
            }
        })
        .collect();
    Ok(sections.join("\n\n"))
}

/// Full stdout for a run: the rc-file notice (table output only, never when
/// silent) followed by the rendered reports.
pub fn render_stdout(options: &ResolvedOptions, reports: &[Report]) -> Result<String, serde_json::Error> {
    let format = OutputFormat::from_options(options);
    let body = render(reports, format, options.flag("deep"))?;
    match options.notice() {
        Some(notice) if !format.is_json() && !options.flag("silent") => Ok(format!("{}\n{}", notice, body)),
        _ => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> Report {
        let deps = vec![Dependency::new("ncu-test-v2", "1.0.0"), Dependency::new("ncu-test-tag", "0.1.0")];
        let accepted = vec![
            deps[0].with_upgrade(Some("99.9.9".into())),
            deps[1].with_upgrade(Some("0.1.0".into())),
        ];
        Report::new("package.json", deps, accepted)
    }

    #[test]
    fn test_json_upgraded() {
        let out = render(&[report()], OutputFormat::JsonUpgraded, false).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"ncu-test-v2": "99.9.9"}));
    }

    #[test]
    fn test_json_all() {
        let out = render(&[report()], OutputFormat::JsonAll, false).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"ncu-test-v2": "99.9.9", "ncu-test-tag": "0.1.0"}));
    }

    #[test]
    fn test_deep_json_keyed_by_manifest() {
        let out = render(&[report()], OutputFormat::JsonUpgraded, true).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"package.json": {"ncu-test-v2": "99.9.9"}}));
    }

    #[test]
    fn test_table() {
        let out = render(&[report()], OutputFormat::Table, false).unwrap();
        assert_eq!(out, " ncu-test-v2  1.0.0  →  99.9.9");

        let empty = Report::new("package.json", vec![], vec![]);
        assert_eq!(render(&[empty], OutputFormat::Table, false).unwrap(), UP_TO_DATE);
    }
}
