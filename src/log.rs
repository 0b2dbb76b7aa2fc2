//! Build log emitter
//!
//! The emitter is the user-facing build log. It is handed to the
//! orchestrator explicitly; nothing in the crate writes build output
//! through a process-wide logger. Diagnostics still go through `tracing`.

use crate::dependency::DependencyDescriptor;
use crate::layer::plan::PlanEntry;
use crate::layer::store::Layer;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Build log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

/// Indented, leveled writer for build output
pub struct Emitter {
    out: Mutex<Box<dyn Write + Send>>,
    level: LogLevel,
}

impl Emitter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            level: LogLevel::Info,
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    fn line(&self, indent: usize, message: impl Display) {
        // A broken log sink must not fail the build.
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{:indent$}{}", "", message, indent = indent);
        }
    }

    fn debug_enabled(&self) -> bool {
        self.level == LogLevel::Debug
    }

    pub fn title(&self, message: impl Display) {
        self.line(0, message);
    }

    pub fn process(&self, message: impl Display) {
        self.line(2, message);
    }

    pub fn subprocess(&self, message: impl Display) {
        self.line(4, message);
    }

    pub fn action(&self, message: impl Display) {
        self.line(6, message);
    }

    /// Only written at debug level
    pub fn detail(&self, message: impl Display) {
        if self.debug_enabled() {
            self.line(6, message);
        }
    }

    pub fn break_line(&self) {
        self.line(0, "");
    }

    pub fn completed_in(&self, duration: Duration) {
        self.action(format!("Completed in {}ms", duration.as_millis()));
    }

    /// List plan entries that asked for the dependency, in plan order
    pub fn candidates(&self, entries: &[PlanEntry]) {
        if !self.debug_enabled() || entries.is_empty() {
            return;
        }
        self.subprocess("Candidate version sources (in priority order):");
        for entry in entries {
            let version = entry.version().unwrap_or("*");
            let source = entry.version_source().unwrap_or("<unknown>");
            self.action(format!("{:<30} -> {:?}", source, version));
        }
        self.break_line();
    }

    pub fn selected_dependency(&self, entry: &PlanEntry, dependency: &DependencyDescriptor) {
        let source = entry.version_source().unwrap_or("<unknown>");
        self.subprocess(format!(
            "Selected {} version (using {}): {}",
            dependency.name, source, dependency.version
        ));
        self.break_line();
    }

    pub fn generating_sbom(&self, path: &std::path::Path) {
        self.process(format!("Generating SBOM for {}", path.display()));
    }

    pub fn formatting_sbom(&self, formats: &[String]) {
        self.process("Writing SBOM in the following format(s):");
        for format in formats {
            self.subprocess(format);
        }
        self.break_line();
    }

    pub fn environment_variables(&self, layer: &Layer) {
        if !layer.shared_env.is_empty() {
            self.process("Configuring build and launch environment");
            for (key, value) in layer.shared_env.iter() {
                self.subprocess(format!("{} -> {:?}", key, value));
            }
            self.break_line();
        }
    }
}
