use serde::{Deserialize, Serialize};

/// A resolved worry, kept for the summary once its monster has fallen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedWorry {
    pub worry_text: String,
    pub comfort_text: String,
}
