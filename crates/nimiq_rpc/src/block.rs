use serde::{Deserialize, Deserializer};

use crate::transaction::Transaction;

/// Block returned by the server, dispatched on the `type` field. Unknown
/// block types decode as micro blocks; every micro-only field is optional,
/// so the common header remains readable.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Micro block, produced by a single validator
    Micro(MicroBlock),
    /// Macro block, closing a batch or an epoch
    Macro(MacroBlock),
}

impl Block {
    /// Height of the block.
    pub fn number(&self) -> u32 {
        match self {
            Self::Micro(block) => block.number,
            Self::Macro(block) => block.number,
        }
    }

    /// Hash of the block.
    pub fn hash(&self) -> &str {
        match self {
            Self::Micro(block) => &block.hash,
            Self::Macro(block) => &block.hash,
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let block = match tag.as_str() {
            "macro" => Self::Macro(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
            _ => Self::Micro(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
        };
        Ok(block)
    }
}

/// Micro block returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroBlock {
    /// Height of the block
    pub number: u32,
    /// Batch number of the block
    pub batch: u32,
    /// Epoch number of the block
    pub epoch: u32,
    /// Hash of the block
    pub hash: String,
    /// Hash of the block body
    pub body_hash: String,
    /// Hash of the parent of the block
    pub parent_hash: String,
    /// Extra data of the block
    pub extra_data: String,
    /// Size of the block in bytes
    pub size: u32,
    /// Version of the block
    pub version: u16,
    /// Network ID of the block
    pub network: u32,
    /// Timestamp of the block
    pub timestamp: u64,
    /// Seed of the block
    pub seed: String,
    /// Hash of the state of the block
    pub state_hash: String,
    /// Hash of the history of the block
    pub history_hash: String,
    /// Slot of the validator that produced the block
    pub producer: Option<Slot>,
    /// Fork proofs included in the block
    pub fork_proofs: Option<Vec<ForkProof>>,
    /// Justification of the block
    pub justification: Option<serde_json::Value>,
    /// Equivocation proofs included in the block
    pub equivocation_proofs: Option<Vec<serde_json::Value>>,
    /// Transactions of the block, full objects or just hashes depending on
    /// the request
    #[serde(default)]
    pub transactions: Vec<TransactionOrHash>,
}

/// Macro block returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroBlock {
    /// Height of the block
    pub number: u32,
    /// Batch number of the block
    pub batch: u32,
    /// Epoch number of the block
    pub epoch: u32,
    /// Hash of the block
    pub hash: String,
    /// Hash of the block body
    pub body_hash: String,
    /// Hash of the parent of the block
    pub parent_hash: String,
    /// Extra data of the block
    pub extra_data: String,
    /// Size of the block in bytes
    pub size: u32,
    /// Version of the block
    pub version: u16,
    /// Network ID of the block
    pub network: u32,
    /// Timestamp of the block
    pub timestamp: u64,
    /// Seed of the block
    pub seed: String,
    /// Hash of the state of the block
    pub state_hash: String,
    /// Hash of the history of the block
    pub history_hash: String,
    /// Whether the block is an election macro block
    pub is_election_block: bool,
    /// Hash of the preceding election macro block
    pub parent_election_hash: String,
    /// The block interlink, only present on election blocks
    #[serde(default)]
    pub interlink: Option<serde_json::Value>,
    /// Validator slots elected by the block, only present on election
    /// blocks
    #[serde(default)]
    pub slots: Option<Vec<Slot>>,
    /// Bitset of slots that lost rewards in the batch
    #[serde(default)]
    pub lost_reward_set: Option<serde_json::Value>,
    /// Bitset of slots disabled in the batch
    #[serde(default)]
    pub disabled_set: Option<serde_json::Value>,
    /// Justification of the block
    pub justification: Option<serde_json::Value>,
    /// Transactions of the block, full objects or just hashes depending on
    /// the request
    #[serde(default)]
    pub transactions: Vec<TransactionOrHash>,
}

/// A transaction in a block body, either in full or as its hash.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TransactionOrHash {
    /// Hex-encoded transaction hash
    Hash(String),
    /// Full transaction object
    Full(Box<Transaction>),
}

/// A validator slot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Slot number
    pub slot_number: u16,
    /// Address of the validator this slot belongs to
    pub validator: String,
    /// Public key of the validator this slot belongs to
    pub public_key: String,
}

/// Slots slashed in a batch, as reported by `getCurrentSlashedSlots` and
/// `getPreviousSlashedSlots`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashedSlots {
    /// Block number for the slashed slots
    pub block_number: u32,
    /// Bitset indicating lost rewards for the slashed slots
    pub lost_rewards: serde_json::Value,
    /// Bitset indicating disabled slots
    pub disabled: serde_json::Value,
}

/// Proof of a fork produced by a validator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkProof {
    /// Block number at which the fork occurred
    pub block_number: u32,
    /// View number of the forked block
    pub view_number: u32,
    /// The two conflicting block hashes
    pub hashes: Vec<String>,
}
