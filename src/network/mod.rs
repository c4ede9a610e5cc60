//! Client/node transport
//!
//! Newline-delimited JSON requests over TCP, a reconnecting client with a
//! retry policy, and the thread-per-connection server the local test network
//! runs on.

pub mod client;
pub mod protocol;
pub mod retry;
pub mod server;

pub use client::{parse_node_address, NodeClient};
pub use protocol::{
    Call, ChainObject, ChainProperties, Reply, Request, Response, RpcError, RpcErrorCode,
    PROTOCOL_VERSION,
};
pub use retry::RetryPolicy;
pub use server::{NodeServer, RequestHandler, ShutdownHandle};
