use serde::Deserialize;

/// The chain state a piece of data was fetched at, attached by the server
/// to most results.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainState {
    /// Block number the data was fetched for
    pub block_number: u32,
    /// Block hash the data was fetched for
    pub block_hash: String,
}

/// The `{data, metadata}` envelope every Nimiq RPC result is wrapped in.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RpcData<T> {
    /// The actual result
    pub data: T,
    /// Chain state the result was produced at, when the server attaches it
    pub metadata: Option<BlockchainState>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn metadata_is_optional() {
        let plain: RpcData<u32> = serde_json::from_value(json!({"data": 600})).expect("decodes");
        assert_eq!(plain.data, 600);
        assert_eq!(plain.metadata, None);

        let stated: RpcData<u32> = serde_json::from_value(json!({
            "data": 600,
            "metadata": {"blockNumber": 600, "blockHash": "b0e8..."},
        }))
        .expect("decodes");
        assert_eq!(stated.metadata.map(|state| state.block_number), Some(600));
    }
}
