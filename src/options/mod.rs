//! Selection options with TOML preset support.
//!
//! Highlight appearance, property refresh rate and render-pass limits are
//! consolidated here. Options serialize to/from TOML so viewers can keep
//! them next to their view presets.

mod highlight;
mod properties;
mod render_passes;

use std::path::Path;

pub use highlight::HighlightOptions;
pub use properties::PropertyOptions;
pub use render_passes::RenderPassOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[highlight]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct SelectionOptions {
    /// Selection box appearance.
    pub highlight: HighlightOptions,
    /// Property panel refresh.
    pub properties: PropertyOptions,
    /// Multi-pass pick pipeline limits.
    pub render_passes: RenderPassOptions,
}

impl SelectionOptions {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(SelectionOptions)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, SelectionError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save options to a TOML file, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), SelectionError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(path, content)?)
    }

    /// Preset names (TOML file stems) in `dir`, sorted. Empty if the
    /// directory cannot be read.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|path| {
                path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
            })
            .collect();
        names.sort();
        names
    }

    /// Property refresh interval as a duration.
    #[must_use]
    pub fn refresh_interval(&self) -> web_time::Duration {
        web_time::Duration::from_millis(self.properties.refresh_interval_ms)
    }
}
