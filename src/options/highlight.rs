use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Highlight", inline)]
#[serde(default)]
/// Highlight boxes drawn around selected targets.
pub struct HighlightOptions {
    /// Draw a box around every selected target.
    #[schemars(title = "Highlight Selection")]
    pub enabled: bool,
    /// Material assigned to selection boxes. Must exist in the scene.
    #[schemars(skip)]
    pub material: String,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            material: "selection/cyan".to_owned(),
        }
    }
}
