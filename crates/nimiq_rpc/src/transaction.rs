use serde::Deserialize;

/// Transaction returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Hex-encoded hash of the transaction
    pub hash: String,
    /// Hex-encoded hash of the block containing the transaction
    pub block_hash: Option<String>,
    /// Height of the block containing the transaction
    pub block_number: Option<u32>,
    /// UNIX timestamp of the block containing the transaction
    pub timestamp: Option<u64>,
    /// Number of confirmations of the block containing the transaction
    #[serde(default)]
    pub confirmations: u32,
    /// Index of the transaction in the block
    pub transaction_index: Option<u32>,
    /// Hex-encoded address of the sending account
    pub from: String,
    /// User friendly address (NQ-address) of the sending account
    pub from_address: String,
    /// Hex-encoded address of the recipient account
    pub to: String,
    /// User friendly address (NQ-address) of the recipient account
    pub to_address: String,
    /// The value (in smallest unit) sent with this transaction
    pub value: u64,
    /// The fee (in smallest unit) for this transaction
    pub fee: u64,
    /// Hex-encoded contract parameters or a message
    pub data: Option<String>,
    /// Bit-encoded transaction flags
    pub flags: u32,
    /// Whether the transaction is valid
    pub valid: Option<bool>,
    /// Whether the transaction is in the mempool
    pub in_mempool: Option<bool>,
}
