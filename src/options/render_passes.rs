use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Render Passes", inline)]
#[serde(default)]
/// Limits for the multi-pass pick pipeline.
pub struct RenderPassOptions {
    /// Upper bound on extra passes handlers may request after pass 0.
    #[schemars(title = "Max Additional Passes", range(min = 0, max = 32))]
    pub max_additional_passes: u32,
}

impl Default for RenderPassOptions {
    fn default() -> Self {
        Self {
            max_additional_passes: 8,
        }
    }
}
