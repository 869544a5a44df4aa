use serde::Deserialize;

/// Overview of the mempool, with transactions sorted into buckets by their
/// fee per byte (in smallest unit).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MempoolInfo {
    /// Total number of transactions in the mempool
    #[serde(default)]
    pub total: u32,
    /// The fee-per-byte bucket boundaries in use
    #[serde(default)]
    pub buckets: Vec<u64>,
}
