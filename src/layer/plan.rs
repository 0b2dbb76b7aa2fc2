//! Buildpack plan
//!
//! The plan lists what later buildpacks asked of this one. Each entry names
//! a dependency and carries free-form metadata (`version`,
//! `version-source`, `build`, `launch`).

use crate::error::{VsdbgError, VsdbgResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One requirement from the buildpack plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,

    #[serde(default)]
    pub metadata: toml::Table,
}

impl PlanEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: toml::Table::new(),
        }
    }

    /// Set a metadata key, returning the entry
    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Requested version constraint, if any
    pub fn version(&self) -> Option<&str> {
        self.metadata.get("version").and_then(|v| v.as_str())
    }

    /// Where the version constraint came from (env var, project file, ...)
    pub fn version_source(&self) -> Option<&str> {
        self.metadata.get("version-source").and_then(|v| v.as_str())
    }

    /// Whether a boolean metadata flag is set to `true`
    pub fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// The buildpack plan handed to the build phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackPlan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

impl BuildpackPlan {
    /// Parse a plan from a TOML file on disk
    pub async fn from_file(path: &Path) -> VsdbgResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| VsdbgError::io(format!("reading plan {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| VsdbgError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Selects entries for a dependency and merges their layer requirements
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Pick the entry that decides the version for `name`.
    ///
    /// Returns the winning entry and every matching entry in plan
    /// order. The first match wins. With no matching entry the winner
    /// is a bare entry for `name`.
    pub fn resolve(&self, name: &str, entries: &[PlanEntry]) -> (PlanEntry, Vec<PlanEntry>) {
        let matching: Vec<PlanEntry> =
            entries.iter().filter(|e| e.name == name).cloned().collect();

        let chosen = matching
            .first()
            .cloned()
            .unwrap_or_else(|| PlanEntry::new(name));
        (chosen, matching)
    }

    /// Union the `launch` and `build` flags of every entry for `name`
    pub fn merge_layer_types(&self, name: &str, entries: &[PlanEntry]) -> (bool, bool) {
        entries
            .iter()
            .filter(|e| e.name == name)
            .fold((false, false), |(launch, build), e| {
                (launch || e.flag("launch"), build || e.flag("build"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_keeps_plan_order() {
        let entries = vec![
            PlanEntry::new("node"),
            PlanEntry::new("vsdbg")
                .with("version", "17.*")
                .with("version-source", "buildpack.yml"),
            PlanEntry::new("vsdbg")
                .with("version", "16.*")
                .with("version-source", "BP_VSDBG_VERSION"),
        ];

        let (entry, sorted) = Planner::new().resolve("vsdbg", &entries);
        assert_eq!(entry.version(), Some("17.*"));
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn resolve_without_match_returns_bare_entry() {
        let (entry, sorted) = Planner::new().resolve("vsdbg", &[PlanEntry::new("node")]);
        assert_eq!(entry.name, "vsdbg");
        assert_eq!(entry.version(), None);
        assert!(sorted.is_empty());
    }

    #[test]
    fn merge_layer_types_unions_flags() {
        let entries = vec![
            PlanEntry::new("vsdbg").with("launch", true),
            PlanEntry::new("vsdbg").with("build", false),
            PlanEntry::new("node").with("build", true),
        ];
        assert_eq!(Planner::new().merge_layer_types("vsdbg", &entries), (true, false));

        let entries = vec![PlanEntry::new("vsdbg").with("build", true)];
        assert_eq!(Planner::new().merge_layer_types("vsdbg", &entries), (false, true));
    }

    #[tokio::test]
    async fn plan_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(
            &path,
            r#"
[[entries]]
name = "vsdbg"

[entries.metadata]
version = "17.*"
launch = true
"#,
        )
        .unwrap();

        let plan = BuildpackPlan::from_file(&path).await.unwrap();
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].version(), Some("17.*"));
        assert!(plan.entries[0].flag("launch"));
    }

    #[tokio::test]
    async fn plan_from_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, "entries = 3").unwrap();

        let err = BuildpackPlan::from_file(&path).await.unwrap_err();
        assert!(matches!(err, VsdbgError::ConfigInvalid { .. }));
    }
}
