// ABOUTME: Parsing of `tailscale status --json` output.
// ABOUTME: Only the tailnet name and this node's tags are read.

use serde::Deserialize;

use crate::network::NetworkError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailscaleStatus {
    #[serde(rename = "TailnetName", default)]
    tailnet_name: String,
    #[serde(rename = "CurrentTailnet", default)]
    current_tailnet: Option<CurrentTailnet>,
    #[serde(rename = "Self", default)]
    pub node: NodeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CurrentTailnet {
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "Online", default)]
    pub online: bool,
    #[serde(rename = "TailscaleIPs", default)]
    pub tailscale_ips: Vec<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
}

impl TailscaleStatus {
    pub fn parse(json: &str) -> Result<Self, NetworkError> {
        serde_json::from_str(json).map_err(|e| NetworkError::Status(e.to_string()))
    }

    /// Tailnet name, preferring `TailnetName` over `CurrentTailnet.Name`.
    pub fn tailnet(&self) -> &str {
        if !self.tailnet_name.is_empty() {
            return &self.tailnet_name;
        }
        self.current_tailnet
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("")
    }

    /// Whether this node carries exactly `expected` (order-insensitive).
    pub fn tags_match(&self, expected: &[String]) -> bool {
        let mut actual = self.node.tags.clone();
        actual.sort();
        actual.dedup();
        actual == expected
    }
}
