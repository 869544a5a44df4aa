use serde::{Deserialize, Deserializer};

/// A single log emitted while applying a block, dispatched on the
/// kebab-case `type` field. A log of an unknown type decodes as
/// [`Log::Other`], preserving the tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Log {
    /// `pay-fee`
    PayFee(PayFeeLog),
    /// `transfer`
    Transfer(TransferLog),
    /// `htlc-create`
    HtlcCreate(HtlcCreateLog),
    /// `htlc-timeout-resolve`
    HtlcTimeoutResolve(HtlcTimeoutResolveLog),
    /// `htlc-regular-transfer`
    HtlcRegularTransfer(HtlcRegularTransferLog),
    /// `htlc-early-resolve`
    HtlcEarlyResolve(HtlcEarlyResolveLog),
    /// `vesting-create`
    VestingCreate(VestingCreateLog),
    /// `create-validator`
    CreateValidator(CreateValidatorLog),
    /// `update-validator`
    UpdateValidator(UpdateValidatorLog),
    /// `inactivate-validator`
    InactivateValidator(InactivateValidatorLog),
    /// `reactivate-validator`
    ReactivateValidator(ReactivateValidatorLog),
    /// `unpark-validator`
    UnparkValidator(UnparkValidatorLog),
    /// `create-staker`
    CreateStaker(CreateStakerLog),
    /// `stake`
    Stake(StakeLog),
    /// `update-staker`
    UpdateStaker(UpdateStakerLog),
    /// `delete-validator`
    DeleteValidator(DeleteValidatorLog),
    /// `unstake`
    Unstake(UnstakeLog),
    /// `payout-reward`
    PayoutReward(PayoutRewardLog),
    /// `park`
    Park(ParkLog),
    /// `slash`
    Slash(SlashLog),
    /// `revert-contract`
    RevertContract(RevertContractLog),
    /// A log type this client does not know
    Other {
        /// The raw `type` tag of the log
        log_type: String,
    },
}

impl<'de> Deserialize<'de> for Log {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        fn decode<T: serde::de::DeserializeOwned, E: serde::de::Error>(
            value: serde_json::Value,
        ) -> Result<T, E> {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }

        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let log = match tag.as_str() {
            "pay-fee" => Self::PayFee(decode(value)?),
            "transfer" => Self::Transfer(decode(value)?),
            "htlc-create" => Self::HtlcCreate(decode(value)?),
            "htlc-timeout-resolve" => Self::HtlcTimeoutResolve(decode(value)?),
            "htlc-regular-transfer" => Self::HtlcRegularTransfer(decode(value)?),
            "htlc-early-resolve" => Self::HtlcEarlyResolve(decode(value)?),
            "vesting-create" => Self::VestingCreate(decode(value)?),
            "create-validator" => Self::CreateValidator(decode(value)?),
            "update-validator" => Self::UpdateValidator(decode(value)?),
            "inactivate-validator" => Self::InactivateValidator(decode(value)?),
            "reactivate-validator" => Self::ReactivateValidator(decode(value)?),
            "unpark-validator" => Self::UnparkValidator(decode(value)?),
            "create-staker" => Self::CreateStaker(decode(value)?),
            "stake" => Self::Stake(decode(value)?),
            "update-staker" => Self::UpdateStaker(decode(value)?),
            "delete-validator" => Self::DeleteValidator(decode(value)?),
            "unstake" => Self::Unstake(decode(value)?),
            "payout-reward" => Self::PayoutReward(decode(value)?),
            "park" => Self::Park(decode(value)?),
            "slash" => Self::Slash(decode(value)?),
            "revert-contract" => Self::RevertContract(decode(value)?),
            _ => Self::Other { log_type: tag },
        };
        Ok(log)
    }
}

/// The fee paid for a transaction.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayFeeLog {
    /// Address the fee was taken from
    pub from: String,
    /// The fee (in smallest unit)
    pub fee: u64,
}

/// A balance transfer between two accounts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLog {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// The amount transferred (in smallest unit)
    pub amount: u64,
}

/// Creation of a Hashed Timelock Contract.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcCreateLog {
    /// Address of the created contract
    pub contract_address: String,
    /// Sender address of the HTLC
    pub sender: String,
    /// Recipient address of the HTLC
    pub recipient: String,
    /// Hash algorithm used by the HTLC
    pub hash_algorithm: String,
    /// Hex-encoded hash root
    pub hash_root: String,
    /// Number of hashes the HTLC is split into
    pub hash_count: u32,
    /// Block after which only the sender can recover funds
    pub timeout: u64,
    /// Total amount locked in the contract (in smallest unit)
    pub total_amount: u64,
}

/// Resolution of an HTLC after its timeout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcTimeoutResolveLog {
    /// Address of the resolved contract
    pub contract_address: String,
}

/// Regular transfer out of an HTLC by revealing a pre-image.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcRegularTransferLog {
    /// Address of the contract
    pub contract_address: String,
    /// The revealed pre-image
    pub pre_image: String,
    /// Depth of the revealed hash
    pub hash_depth: u32,
}

/// Early resolution of an HTLC by both parties.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcEarlyResolveLog {
    /// Address of the resolved contract
    pub contract_address: String,
}

/// Creation of a vesting contract.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VestingCreateLog {
    /// Address of the created contract
    pub contract_owner: String,
    /// Owner of the vested funds
    pub owner: String,
    /// Start time of the vesting schedule
    pub start_time: u64,
    /// Duration of one vesting step
    pub time_step: u64,
    /// Amount released per step (in smallest unit)
    pub step_amount: u64,
    /// Total vested amount (in smallest unit)
    pub total_amount: u64,
}

/// Registration of a new validator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateValidatorLog {
    /// Address of the validator
    pub validator_address: String,
    /// Reward address of the validator
    pub reward_address: String,
}

/// Update of a validator's reward address.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValidatorLog {
    /// Address of the validator
    pub validator_address: String,
    /// Reward address before the update
    pub old_reward_address: String,
    /// Reward address after the update
    pub new_reward_address: String,
}

/// Deactivation of a validator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InactivateValidatorLog {
    /// Address of the validator
    pub validator_address: String,
}

/// Reactivation of a validator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactivateValidatorLog {
    /// Address of the validator
    pub validator_address: String,
}

/// Unparking of a validator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparkValidatorLog {
    /// Address of the validator
    pub validator_address: String,
}

/// Registration of a new staker.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStakerLog {
    /// Address of the staker
    pub staker_address: String,
    /// Address of the validator the stake is delegated to
    pub validator_address: String,
    /// The staked amount (in smallest unit)
    pub value: u64,
}

/// Additional stake by an existing staker.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeLog {
    /// Address of the staker
    pub staker_address: String,
    /// The staked amount (in smallest unit)
    pub value: u64,
    /// Address of the validator the stake is delegated to
    pub validator_address: Option<String>,
}

/// A staker switching delegation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStakerLog {
    /// Address of the staker
    pub staker_address: String,
    /// Validator delegated to before the update
    pub old_validator_address: Option<String>,
    /// Validator delegated to after the update
    pub new_validator_address: Option<String>,
}

/// Removal of a validator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteValidatorLog {
    /// Address of the validator
    pub validator_address: String,
    /// Reward address the deposit was paid out to
    pub reward_address: String,
}

/// Withdrawal of stake.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeLog {
    /// Address of the staker
    pub staker_address: String,
    /// The withdrawn amount (in smallest unit)
    pub value: u64,
    /// Address of the validator the stake was delegated to
    pub validator_address: Option<String>,
}

/// Payout of a block reward.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRewardLog {
    /// Recipient of the reward
    pub to: String,
    /// The reward (in smallest unit)
    pub value: u64,
}

/// Parking of a validator after missed blocks.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkLog {
    /// Address of the validator
    pub validator_address: String,
    /// Block at which the validator was parked
    pub event_block: u32,
}

/// Slashing of a slot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashLog {
    /// Address of the validator owning the slot
    pub validator_address: String,
    /// Block at which the offence occurred
    pub event_block: u32,
    /// The slashed slot
    pub slot: u16,
    /// Whether the slot was newly disabled by this slash
    pub newly_disabled: bool,
}

/// Reversion of a contract to a basic account.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertContractLog {
    /// Address of the reverted contract
    pub contract_address: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn dispatches_on_the_kebab_case_tag() {
        let log: Log = serde_json::from_value(json!({
            "type": "transfer",
            "from": "NQ07 0000 0000 0000 0000 0000 0000 0000 0000",
            "to": "NQ26 8MMT 8317 VD0D NNKE 3NVA GBVE UY1E 9YDF",
            "amount": 1_000_000,
        }))
        .expect("decodes");

        let Log::Transfer(transfer) = log else {
            panic!("expected a transfer log");
        };
        assert_eq!(transfer.amount, 1_000_000);
    }

    #[test]
    fn optional_delegations_may_be_absent() {
        let log: Log = serde_json::from_value(json!({
            "type": "stake",
            "stakerAddress": "NQ07 0000 0000 0000 0000 0000 0000 0000 0000",
            "value": 500,
        }))
        .expect("decodes");

        let Log::Stake(stake) = log else {
            panic!("expected a stake log");
        };
        assert_eq!(stake.validator_address, None);
    }

    #[test]
    fn unknown_log_types_keep_their_tag() {
        let log: Log = serde_json::from_value(json!({
            "type": "jail-validator",
            "validatorAddress": "NQ57 M1NT 1T1T 1T1T 1T1T 1T1T 1T1T 1T1T 1T1T",
        }))
        .expect("decodes");

        assert_eq!(
            log,
            Log::Other {
                log_type: "jail-validator".to_owned()
            }
        );
    }
}
