use serde::{Deserialize, Deserializer};

use crate::log::Log;

/// The logs of one transaction.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLog {
    /// Hash of the transaction the logs belong to
    pub hash: String,
    /// The logs emitted while executing the transaction
    pub logs: Vec<Log>,
}

/// All logs of one block, pushed by `subscribeForLogsByAddressesAndTypes`.
/// Dispatched on the `type` field; an unknown tag decodes as a reverted
/// block log, which carries the common fields.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockLog {
    /// Logs of a block applied to the chain
    Applied(AppliedBlockLog),
    /// Logs of a block reverted from the chain
    Reverted(RevertedBlockLog),
}

impl BlockLog {
    /// The inherent logs of the block.
    pub fn inherents(&self) -> &[Log] {
        match self {
            Self::Applied(log) => &log.inherents,
            Self::Reverted(log) => &log.inherents,
        }
    }

    /// The per-transaction logs of the block.
    pub fn transactions(&self) -> &[TransactionLog] {
        match self {
            Self::Applied(log) => &log.transactions,
            Self::Reverted(log) => &log.transactions,
        }
    }
}

impl<'de> Deserialize<'de> for BlockLog {
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

        let block_log = match tag.as_str() {
            "applied-block" => {
                Self::Applied(serde_json::from_value(value).map_err(serde::de::Error::custom)?)
            }
            _ => Self::Reverted(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
        };
        Ok(block_log)
    }
}

/// Logs of a block applied to the chain.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedBlockLog {
    /// Timestamp of the block
    pub timestamp: u64,
    /// Inherent logs of the block
    #[serde(default)]
    pub inherents: Vec<Log>,
    /// Per-transaction logs of the block
    #[serde(default)]
    pub transactions: Vec<TransactionLog>,
}

/// Logs of a block reverted from the chain.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertedBlockLog {
    /// Inherent logs of the block
    #[serde(default)]
    pub inherents: Vec<Log>,
    /// Per-transaction logs of the block
    #[serde(default)]
    pub transactions: Vec<TransactionLog>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn applied_block_logs_carry_a_timestamp() {
        let block_log: BlockLog = serde_json::from_value(json!({
            "type": "applied-block",
            "timestamp": 1_669_641_133_081_u64,
            "inherents": [{"type": "payout-reward",
                "to": "NQ07 0000 0000 0000 0000 0000 0000 0000 0000",
                "value": 500}],
            "transactions": [{"hash": "5f28...", "logs": [{"type": "pay-fee",
                "from": "NQ07 0000 0000 0000 0000 0000 0000 0000 0000",
                "fee": 2}]}],
        }))
        .expect("decodes");

        let BlockLog::Applied(applied) = &block_log else {
            panic!("expected an applied block log");
        };
        assert_eq!(applied.timestamp, 1_669_641_133_081);
        assert!(matches!(block_log.inherents()[0], Log::PayoutReward(_)));
        assert_eq!(block_log.transactions()[0].logs.len(), 1);
    }

    #[test]
    fn unknown_tags_decode_as_reverted() {
        let block_log: BlockLog = serde_json::from_value(json!({
            "type": "rebased-block",
            "inherents": [],
            "transactions": [],
        }))
        .expect("decodes");

        assert!(matches!(block_log, BlockLog::Reverted(_)));
    }
}
