use serde::Deserialize;

/// Staker returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staker {
    /// Address of the staker
    pub address: String,
    /// Active balance of the staker
    pub balance: u64,
    /// Inactive balance of the staker
    pub inactive_balance: u64,
    /// Retired balance of the staker
    pub retired_balance: u64,
    /// Address of the validator the stake is delegated to
    pub delegation: Option<String>,
    /// Block since which this staker has been inactive
    pub inactive_from: Option<u32>,
}
