use std::{future::Future, sync::Arc, time::Duration};

use futures::FutureExt;
use nimiq_rpc_client::{Credentials, NotificationHandler, RpcClient, RpcClientError};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{
    account::{Account, WalletAccount},
    block::{Block, SlashedSlots, Slot, TransactionOrHash},
    block_log::BlockLog,
    inherent::Inherent,
    mempool::MempoolInfo,
    staker::Staker,
    state::RpcData,
    transaction::Transaction,
    validator::{ParkedValidators, Validator},
};

/// Typed client for the JSON-RPC API of a Nimiq albatross node.
///
/// Connects over HTTP or WebSocket depending on the URL scheme; the
/// `subscribe_for_*` methods require a WebSocket connection. Callbacks run
/// on their own task per notification, so a slow callback never stalls
/// other subscriptions or pending calls.
pub struct NimiqClient {
    client: RpcClient,
}

impl NimiqClient {
    /// Connects to the node at `url` with the default response timeout.
    pub async fn connect(
        url: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, RpcClientError> {
        let client = RpcClient::connect(url, credentials).await?;
        Ok(Self { client })
    }

    /// Connects to the node at `url` with a custom WebSocket response
    /// timeout.
    pub async fn connect_with_timeout(
        url: &str,
        credentials: Option<Credentials>,
        response_timeout: Duration,
    ) -> Result<Self, RpcClientError> {
        let client = RpcClient::connect_with_timeout(url, credentials, response_timeout).await?;
        Ok(Self { client })
    }

    /// The underlying transport client, for methods this surface does not
    /// cover.
    pub fn rpc(&self) -> &RpcClient {
        &self.client
    }

    /// Closes the connection. Outstanding WebSocket calls fail with
    /// [`RpcClientError::ConnectionClosed`].
    pub fn close(&self) {
        self.client.close();
    }

    /// Unwraps the `{data, metadata}` envelope and returns the data.
    async fn call<SuccessT: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<SuccessT, RpcClientError> {
        let envelope: RpcData<SuccessT> = self.client.call(method, params).await?;
        Ok(envelope.data)
    }

    /// Keeps the `{data, metadata}` envelope intact.
    async fn call_with_metadata<SuccessT: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<RpcData<SuccessT>, RpcClientError> {
        self.client.call(method, params).await
    }

    /// Issues a call whose result is irrelevant.
    async fn call_ignoring_result(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<(), RpcClientError> {
        let _: serde_json::Value = self.client.call(method, params).await?;
        Ok(())
    }

    // ---- Blockchain queries ----

    /// Returns the height of the most recent block.
    pub async fn block_number(&self) -> Result<u32, RpcClientError> {
        self.call("getBlockNumber", vec![]).await
    }

    /// Returns the batch number of the most recent block.
    pub async fn batch_number(&self) -> Result<u32, RpcClientError> {
        self.call("getBatchNumber", vec![]).await
    }

    /// Returns the epoch number of the most recent block.
    pub async fn epoch_number(&self) -> Result<u32, RpcClientError> {
        self.call("getEpochNumber", vec![]).await
    }

    /// Returns whether the node has established consensus with the network.
    pub async fn is_consensus_established(&self) -> Result<bool, RpcClientError> {
        self.call("isConsensusEstablished", vec![]).await
    }

    /// Returns the block with the given hash.
    pub async fn get_block_by_hash(
        &self,
        hash: &str,
        include_transactions: Option<bool>,
    ) -> Result<Block, RpcClientError> {
        self.call("getBlockByHash", vec![json!(hash), json!(include_transactions)])
            .await
    }

    /// Returns the block at the given height.
    pub async fn get_block_by_number(
        &self,
        block_number: u32,
        include_transactions: Option<bool>,
    ) -> Result<Block, RpcClientError> {
        self.call(
            "getBlockByNumber",
            vec![json!(block_number), json!(include_transactions)],
        )
        .await
    }

    /// Returns the block most recently added to the chain.
    pub async fn get_latest_block(
        &self,
        include_body: Option<bool>,
    ) -> Result<Block, RpcClientError> {
        self.call("getLatestBlock", vec![json!(include_body)]).await
    }

    /// Returns the number of transactions in the block with the given hash.
    pub async fn get_block_transaction_count_by_hash(
        &self,
        hash: &str,
    ) -> Result<u32, RpcClientError> {
        self.call("getBlockTransactionCountByHash", vec![json!(hash)])
            .await
    }

    /// Returns the number of transactions in the block at the given height.
    pub async fn get_block_transaction_count_by_number(
        &self,
        block_number: u32,
    ) -> Result<u32, RpcClientError> {
        self.call("getBlockTransactionCountByNumber", vec![json!(block_number)])
            .await
    }

    /// Returns the slot owning the block at the given height. `offset`
    /// selects a view change round other than the first.
    pub async fn get_slot_at(
        &self,
        block_number: u32,
        offset: Option<u32>,
    ) -> Result<RpcData<Slot>, RpcClientError> {
        self.call_with_metadata("getSlotAt", vec![json!(block_number), json!(offset)])
            .await
    }

    /// Returns the slots slashed in the current batch.
    pub async fn get_current_slashed_slots(&self) -> Result<RpcData<SlashedSlots>, RpcClientError> {
        self.call_with_metadata("getCurrentSlashedSlots", vec![]).await
    }

    /// Returns the slots slashed in the previous batch.
    pub async fn get_previous_slashed_slots(
        &self,
    ) -> Result<RpcData<SlashedSlots>, RpcClientError> {
        self.call_with_metadata("getPreviousSlashedSlots", vec![])
            .await
    }

    /// Returns the inherents of the given batch.
    pub async fn get_inherents_by_batch_number(
        &self,
        batch_number: u32,
    ) -> Result<Vec<Inherent>, RpcClientError> {
        self.call("getInherentsByBatchNumber", vec![json!(batch_number)])
            .await
    }

    /// Returns the inherents of the block at the given height.
    pub async fn get_inherents_by_block_number(
        &self,
        block_number: u32,
    ) -> Result<Vec<Inherent>, RpcClientError> {
        self.call("getInherentsByBlockNumber", vec![json!(block_number)])
            .await
    }

    // ---- Accounts ----

    /// Returns the addresses owned by the client.
    pub async fn accounts(&self) -> Result<Vec<String>, RpcClientError> {
        self.call("listAccounts", vec![]).await
    }

    /// Returns the account with the given address, together with the chain
    /// state it was read at.
    pub async fn get_account_by_address(
        &self,
        address: &str,
    ) -> Result<RpcData<Account>, RpcClientError> {
        self.call_with_metadata("getAccountByAddress", vec![json!(address)])
            .await
    }

    /// Returns all accounts in the accounts tree, together with the chain
    /// state they were read at.
    pub async fn get_accounts(&self) -> Result<RpcData<Vec<Account>>, RpcClientError> {
        self.call_with_metadata("getAccounts", vec![]).await
    }

    // ---- Wallet ----

    /// Creates a new account in the node's wallet store, optionally
    /// protected by a passphrase.
    pub async fn create_account(
        &self,
        passphrase: Option<&str>,
    ) -> Result<WalletAccount, RpcClientError> {
        self.call("createAccount", vec![json!(passphrase)]).await
    }

    /// Imports a hex-encoded private key into the node's wallet store and
    /// returns its address.
    pub async fn import_raw_key(
        &self,
        private_key: &str,
        passphrase: Option<&str>,
    ) -> Result<String, RpcClientError> {
        self.call("importRawKey", vec![json!(private_key), json!(passphrase)])
            .await
    }

    /// Returns whether an account with the given address is imported.
    pub async fn is_account_imported(&self, address: &str) -> Result<bool, RpcClientError> {
        self.call("isAccountImported", vec![json!(address)]).await
    }

    /// Returns whether the account with the given address is unlocked.
    pub async fn is_account_unlocked(&self, address: &str) -> Result<bool, RpcClientError> {
        self.call("isAccountUnlocked", vec![json!(address)]).await
    }

    /// Locks the account with the given address.
    pub async fn lock_account(&self, address: &str) -> Result<(), RpcClientError> {
        self.call_ignoring_result("lockAccount", vec![json!(address)])
            .await
    }

    /// Unlocks the account with the given address, for `duration`
    /// milliseconds when given.
    pub async fn unlock_account(
        &self,
        address: &str,
        passphrase: Option<&str>,
        duration: Option<u64>,
    ) -> Result<(), RpcClientError> {
        self.call_ignoring_result(
            "unlockAccount",
            vec![json!(address), json!(passphrase), json!(duration)],
        )
        .await
    }

    // ---- Transactions ----

    /// Returns the transaction with the given hash.
    pub async fn get_transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Transaction, RpcClientError> {
        self.call("getTransactionByHash", vec![json!(hash)]).await
    }

    /// Decodes a hex-encoded signed transaction without submitting it.
    pub async fn get_raw_transaction_info(
        &self,
        raw_transaction: &str,
    ) -> Result<Transaction, RpcClientError> {
        self.call("getRawTransactionInfo", vec![json!(raw_transaction)])
            .await
    }

    /// Returns the latest transactions sent by or to an address. Note that
    /// this information can change when blocks are reverted due to forks.
    pub async fn get_transactions_by_address(
        &self,
        address: &str,
        max: Option<u16>,
    ) -> Result<Vec<Transaction>, RpcClientError> {
        self.call(
            "getTransactionsByAddress",
            vec![json!(address), json!(max)],
        )
        .await
    }

    /// Returns the hashes of the latest transactions sent by or to an
    /// address.
    pub async fn get_transaction_hashes_by_address(
        &self,
        address: &str,
        max: Option<u16>,
    ) -> Result<Vec<String>, RpcClientError> {
        self.call(
            "getTransactionHashesByAddress",
            vec![json!(address), json!(max)],
        )
        .await
    }

    /// Returns the transactions of the given batch.
    pub async fn get_transactions_by_batch_number(
        &self,
        batch_number: u32,
    ) -> Result<Vec<Transaction>, RpcClientError> {
        self.call("getTransactionsByBatchNumber", vec![json!(batch_number)])
            .await
    }

    /// Returns the transactions of the block at the given height.
    pub async fn get_transactions_by_block_number(
        &self,
        block_number: u32,
    ) -> Result<Vec<Transaction>, RpcClientError> {
        self.call("getTransactionsByBlockNumber", vec![json!(block_number)])
            .await
    }

    /// Submits a hex-encoded signed transaction and returns its hash.
    pub async fn send_raw_transaction(
        &self,
        raw_transaction: &str,
    ) -> Result<String, RpcClientError> {
        self.call("sendRawTransaction", vec![json!(raw_transaction)])
            .await
    }

    /// Creates and submits a basic transaction, signed by the node's
    /// wallet. `validity_start_height` is a block number (`"1000"`) or an
    /// offset (`"+10"`). Returns the transaction hash.
    pub async fn send_basic_transaction(
        &self,
        wallet: &str,
        recipient: &str,
        value: u64,
        fee: u64,
        validity_start_height: &str,
    ) -> Result<String, RpcClientError> {
        self.call(
            "sendBasicTransaction",
            vec![
                json!(wallet),
                json!(recipient),
                json!(value),
                json!(fee),
                json!(validity_start_height),
            ],
        )
        .await
    }

    /// Creates and submits a transaction adding stake to an existing
    /// staker. Returns the transaction hash.
    pub async fn send_stake_transaction(
        &self,
        wallet: &str,
        staker: &str,
        value: u64,
        fee: u64,
        validity_start_height: &str,
    ) -> Result<String, RpcClientError> {
        self.call(
            "sendStakeTransaction",
            vec![
                json!(wallet),
                json!(staker),
                json!(value),
                json!(fee),
                json!(validity_start_height),
            ],
        )
        .await
    }

    // ---- Mempool ----

    /// Returns an overview of the mempool.
    pub async fn mempool(&self) -> Result<MempoolInfo, RpcClientError> {
        self.call("mempool", vec![]).await
    }

    /// Returns the transactions currently in the mempool, in full or as
    /// hashes.
    pub async fn mempool_content(
        &self,
        include_transactions: Option<bool>,
    ) -> Result<Vec<TransactionOrHash>, RpcClientError> {
        self.call("mempoolContent", vec![json!(include_transactions)])
            .await
    }

    /// Returns the minimum fee per byte the mempool accepts.
    pub async fn min_fee_per_byte(&self) -> Result<u64, RpcClientError> {
        self.call("getMinFeePerByte", vec![]).await
    }

    // ---- Validators and stakers ----

    /// Returns the address of this validator node.
    pub async fn get_validator_address(&self) -> Result<String, RpcClientError> {
        self.call("getAddress", vec![]).await
    }

    /// Returns the signing key of this validator node.
    pub async fn get_validator_signing_key(&self) -> Result<String, RpcClientError> {
        self.call("getSigningKey", vec![]).await
    }

    /// Returns the voting key of this validator node.
    pub async fn get_validator_voting_key(&self) -> Result<String, RpcClientError> {
        self.call("getVotingKey", vec![]).await
    }

    /// Returns the validator with the given address, together with the
    /// chain state it was read at.
    pub async fn get_validator_by_address(
        &self,
        address: &str,
    ) -> Result<RpcData<Validator>, RpcClientError> {
        self.call_with_metadata("getValidatorByAddress", vec![json!(address)])
            .await
    }

    /// Returns all validators, together with the chain state they were
    /// read at.
    pub async fn get_validators(&self) -> Result<RpcData<Vec<Validator>>, RpcClientError> {
        self.call_with_metadata("getValidators", vec![]).await
    }

    /// Returns the validators elected for the current epoch, together with
    /// the chain state they were read at.
    pub async fn get_active_validators(
        &self,
    ) -> Result<RpcData<Vec<Validator>>, RpcClientError> {
        self.call_with_metadata("getActiveValidators", vec![]).await
    }

    /// Returns the currently parked validators, together with the chain
    /// state they were read at.
    pub async fn get_parked_validators(
        &self,
    ) -> Result<RpcData<ParkedValidators>, RpcClientError> {
        self.call_with_metadata("getParkedValidators", vec![]).await
    }

    /// Returns the staker with the given address, together with the chain
    /// state it was read at.
    pub async fn get_staker_by_address(
        &self,
        address: &str,
    ) -> Result<RpcData<Staker>, RpcClientError> {
        self.call_with_metadata("getStakerByAddress", vec![json!(address)])
            .await
    }

    /// Returns the stakers delegating to the validator with the given
    /// address, together with the chain state they were read at.
    pub async fn get_stakers_by_validator_address(
        &self,
        address: &str,
    ) -> Result<RpcData<Vec<Staker>>, RpcClientError> {
        self.call_with_metadata("getStakersByValidatorAddress", vec![json!(address)])
            .await
    }

    // ---- Network ----

    /// Returns the number of connected peers.
    pub async fn peer_count(&self) -> Result<u64, RpcClientError> {
        self.call("getPeerCount", vec![]).await
    }

    /// Returns the peer id of this node.
    pub async fn peer_id(&self) -> Result<String, RpcClientError> {
        self.call("getPeerId", vec![]).await
    }

    /// Returns the list of connected peers.
    pub async fn peer_list(&self) -> Result<Vec<String>, RpcClientError> {
        self.call("getPeerList", vec![]).await
    }

    // ---- Subscriptions (WebSocket only) ----

    /// Calls `callback` with every new head block. Fails with
    /// [`RpcClientError::SubscriptionsUnsupported`] over HTTP.
    pub async fn subscribe_for_head_block<CallbackT, FutureT>(
        &self,
        include_body: Option<bool>,
        callback: CallbackT,
    ) -> Result<(), RpcClientError>
    where
        CallbackT: Fn(Block) -> FutureT + Send + Sync + 'static,
        FutureT: Future<Output = ()> + Send + 'static,
    {
        self.client
            .subscribe(
                "subscribeForHeadBlock",
                vec![json!(include_body)],
                data_handler(callback),
            )
            .await
    }

    /// Calls `callback` with the hash of every new head block.
    pub async fn subscribe_for_head_block_hash<CallbackT, FutureT>(
        &self,
        callback: CallbackT,
    ) -> Result<(), RpcClientError>
    where
        CallbackT: Fn(String) -> FutureT + Send + Sync + 'static,
        FutureT: Future<Output = ()> + Send + 'static,
    {
        self.client
            .subscribe("subscribeForHeadBlockHash", vec![], data_handler(callback))
            .await
    }

    /// Calls `callback` with the block logs matching the given addresses
    /// and log types, together with the chain state they were produced at.
    pub async fn subscribe_for_logs_by_addresses_and_types<CallbackT, FutureT>(
        &self,
        addresses: Vec<String>,
        log_types: Vec<String>,
        callback: CallbackT,
    ) -> Result<(), RpcClientError>
    where
        CallbackT: Fn(RpcData<BlockLog>) -> FutureT + Send + Sync + 'static,
        FutureT: Future<Output = ()> + Send + 'static,
    {
        self.client
            .subscribe(
                "subscribeForLogsByAddressesAndTypes",
                vec![json!(addresses), json!(log_types)],
                envelope_handler(callback),
            )
            .await
    }

    /// Calls `callback` whenever the validator with the given address is
    /// elected.
    pub async fn subscribe_for_validator_election_by_address<CallbackT, FutureT>(
        &self,
        address: &str,
        callback: CallbackT,
    ) -> Result<(), RpcClientError>
    where
        CallbackT: Fn(RpcData<Validator>) -> FutureT + Send + Sync + 'static,
        FutureT: Future<Output = ()> + Send + 'static,
    {
        self.client
            .subscribe(
                "subscribeForValidatorElectionByAddress",
                vec![json!(address)],
                envelope_handler(callback),
            )
            .await
    }

    /// Stops dispatching head block notifications.
    pub fn unsubscribe_from_head_block(&self) {
        self.client.unsubscribe("subscribeForHeadBlock");
    }

    /// Stops dispatching head block hash notifications.
    pub fn unsubscribe_from_head_block_hash(&self) {
        self.client.unsubscribe("subscribeForHeadBlockHash");
    }

    /// Stops dispatching block log notifications.
    pub fn unsubscribe_from_logs(&self) {
        self.client.unsubscribe("subscribeForLogsByAddressesAndTypes");
    }

    /// Stops dispatching validator election notifications.
    pub fn unsubscribe_from_validator_election(&self) {
        self.client
            .unsubscribe("subscribeForValidatorElectionByAddress");
    }
}

/// Builds a handler that decodes the push payload's `{data, metadata}`
/// envelope and passes only the data to the callback.
fn data_handler<PayloadT, CallbackT, FutureT>(callback: CallbackT) -> NotificationHandler
where
    PayloadT: DeserializeOwned + 'static,
    CallbackT: Fn(PayloadT) -> FutureT + Send + Sync + 'static,
    FutureT: Future<Output = ()> + Send + 'static,
{
    envelope_handler(move |envelope: RpcData<PayloadT>| callback(envelope.data))
}

/// Builds a handler that decodes the push payload's `{data, metadata}`
/// envelope and passes it to the callback in full. Decode failures are
/// reported to the dispatcher, which logs them without affecting other
/// subscriptions.
fn envelope_handler<PayloadT, CallbackT, FutureT>(callback: CallbackT) -> NotificationHandler
where
    PayloadT: DeserializeOwned + 'static,
    CallbackT: Fn(RpcData<PayloadT>) -> FutureT + Send + Sync + 'static,
    FutureT: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |payload: serde_json::Value| {
        let rendered = payload.to_string();
        match serde_json::from_value::<RpcData<PayloadT>>(payload) {
            Ok(envelope) => {
                let future = callback(envelope);
                async move {
                    future.await;
                    Ok(())
                }
                .boxed()
            }
            Err(error) => async move {
                Err(RpcClientError::InvalidResponse {
                    response: rendered,
                    expected_type: std::any::type_name::<PayloadT>(),
                    error,
                })
            }
            .boxed(),
        }
    })
}
