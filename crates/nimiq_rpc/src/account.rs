use serde::{Deserialize, Deserializer};

/// Account returned by `getAccountByAddress` and `getAccounts`, dispatched
/// on the `type` field. Unknown account types decode as basic accounts,
/// keeping address and balance readable.
#[derive(Clone, Debug, PartialEq)]
pub enum Account {
    /// Normal Nimiq account
    Basic(BasicAccount),
    /// Vesting contract
    Vesting(VestingContract),
    /// Hashed Timelock Contract
    Htlc(HashedTimeLockedContract),
    /// Staking contract
    Staking(StakingContract),
}

impl Account {
    /// User friendly address (NQ-address) of the account.
    pub fn address(&self) -> &str {
        match self {
            Self::Basic(account) => &account.address,
            Self::Vesting(contract) => &contract.address,
            Self::Htlc(contract) => &contract.address,
            Self::Staking(contract) => &contract.address,
        }
    }

    /// Balance of the account (in smallest unit).
    pub fn balance(&self) -> u64 {
        match self {
            Self::Basic(account) => account.balance,
            Self::Vesting(contract) => contract.balance,
            Self::Htlc(contract) => contract.balance,
            Self::Staking(contract) => contract.balance,
        }
    }
}

impl<'de> Deserialize<'de> for Account {
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

        let account = match tag.as_str() {
            "vesting" => Self::Vesting(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
            "htlc" => Self::Htlc(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
            "staking" => Self::Staking(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
            _ => Self::Basic(serde_json::from_value(value).map_err(serde::de::Error::custom)?),
        };
        Ok(account)
    }
}

/// Normal Nimiq account object returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAccount {
    /// User friendly address (NQ-address)
    pub address: String,
    /// Balance of the account (in smallest unit)
    pub balance: u64,
}

/// Vesting contract object returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingContract {
    /// User friendly address (NQ-address)
    pub address: String,
    /// Balance of the contract (in smallest unit)
    pub balance: u64,
    /// User friendly address (NQ-address) of the owner of the vesting
    /// contract
    pub owner: String,
    /// The block at which the vesting contract commenced
    pub vesting_start: u32,
    /// The number of blocks after which some part of the vested funds is
    /// released
    pub vesting_step_blocks: u32,
    /// The amount (in smallest unit) released every `vesting_step_blocks`
    /// blocks
    pub vesting_step_amount: u64,
    /// The total amount (in smallest unit) that was provided at the
    /// contract creation
    pub vesting_total_amount: u64,
}

/// Hashed Timelock Contract object returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedTimeLockedContract {
    /// User friendly address (NQ-address)
    pub address: String,
    /// Balance of the contract (in smallest unit)
    pub balance: u64,
    /// User friendly address (NQ-address) of the sender of the HTLC
    pub sender: String,
    /// User friendly address (NQ-address) of the recipient of the HTLC
    pub recipient: String,
    /// Hex-encoded 32 byte hash root
    pub hash_root: String,
    /// Number of hashes this HTLC is split into
    pub hash_count: u32,
    /// Block after which the contract can only be used by the original
    /// sender to recover funds
    pub timeout: u64,
    /// The total amount (in smallest unit) that was provided at the
    /// contract creation
    pub total_amount: u64,
}

/// Staking contract object returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingContract {
    /// User friendly address (NQ-address)
    pub address: String,
    /// Balance of the contract (in smallest unit)
    pub balance: u64,
}

/// Account wallet returned by the node's wallet methods.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    /// User friendly address (NQ-address)
    pub address: String,
    /// Hex-encoded 32 byte Ed25519 public key
    pub public_key: String,
    /// Hex-encoded 32 byte Ed25519 private key
    pub private_key: Option<String>,
}
