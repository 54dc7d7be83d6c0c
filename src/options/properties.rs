use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Properties", inline)]
#[serde(default)]
/// Selection panel refresh behaviour.
pub struct PropertyOptions {
    /// Minimum time between two property refreshes, in milliseconds.
    #[schemars(
        title = "Refresh Interval (ms)",
        range(min = 16, max = 5000),
        extend("step" = 1)
    )]
    pub refresh_interval_ms: u64,
}

impl Default for PropertyOptions {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 200,
        }
    }
}
