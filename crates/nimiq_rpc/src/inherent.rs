use serde::Deserialize;

/// Inherent returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inherent {
    /// Type discriminant of the inherent
    #[serde(rename = "type")]
    pub inherent_type: u8,
    /// Block number of the inherent
    pub block_number: u32,
    /// Timestamp of the inherent
    pub timestamp: u64,
    /// Target address of the inherent
    pub target: String,
    /// Value of the inherent (in smallest unit)
    pub value: u64,
    /// Data of the inherent
    pub data: Option<String>,
    /// Hash of the inherent
    pub hash: String,
}
