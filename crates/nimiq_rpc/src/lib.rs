//! Typed client for the Nimiq JSON-RPC API, layered over
//! [`nimiq_rpc_client`]. One Rust method per RPC method, with the wire
//! models of the albatross node.

/// Types for accounts and contracts returned by the account methods
pub mod account;
/// Types for micro and macro blocks, slots and fork proofs
pub mod block;
/// Block-level log aggregates pushed by the log subscription
pub mod block_log;
/// Types related to the typed Nimiq JSON-RPC API
pub mod client;
mod inherent;
/// The per-event logs emitted while applying blocks
pub mod log;
mod mempool;
mod staker;
mod state;
mod transaction;
mod validator;

pub use nimiq_rpc_client::{Credentials, RpcClientError};

pub use self::{
    client::NimiqClient,
    inherent::Inherent,
    mempool::MempoolInfo,
    staker::Staker,
    state::{BlockchainState, RpcData},
    transaction::Transaction,
    validator::{ParkedValidators, Validator},
};
