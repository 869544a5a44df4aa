use serde::Deserialize;

/// Validator returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// Address of the validator
    pub address: String,
    /// Signing key of the validator
    pub signing_key: String,
    /// Voting key of the validator
    pub voting_key: String,
    /// Reward address of the validator
    pub reward_address: String,
    /// Balance of the validator
    pub balance: u64,
    /// Number of stakers delegating to this validator
    pub num_stakers: u32,
    /// Whether the validator is retired
    pub retired: bool,
    /// Inactivity flag of the validator
    pub inactivity_flag: Option<bool>,
    /// Signal data of the validator
    pub signal_data: Option<String>,
    /// Block since which the validator has been jailed
    pub jailed_from: Option<u32>,
}

/// Validators parked at a given block.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkedValidators {
    /// Block number at which the validators were parked
    pub block_number: u32,
    /// The parked validators
    pub validators: Vec<Validator>,
}
