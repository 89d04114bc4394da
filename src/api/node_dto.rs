use serde::{Deserialize, Serialize};

/// One entry of the node file, as written by the operator.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NodeDto {
    pub ip: String,

    /// `master`, `worker` (or the legacy `node`). Absent means worker.
    #[serde(default)]
    pub role: Option<String>,

    /// Nodes flagged for removal are dropped before validation.
    #[serde(default)]
    pub remove: Option<bool>,
}

impl NodeDto {
    pub fn new(ip: impl Into<String>, role: Option<&str>) -> Self {
        NodeDto { ip: ip.into(), role: role.map(str::to_string), remove: None }
    }
}
