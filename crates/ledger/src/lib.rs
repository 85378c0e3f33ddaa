//! FileGuard ledger plumbing
//!
//! `server` hosts access-control contracts on a devnet ledger over HTTP and
//! `client` drives one of them through the [`AccessControl`] trait.
//!
//! [`AccessControl`]: fileguard_access::AccessControl

pub mod api;
pub mod client;
pub mod server;

pub use client::{RpcAccessControl, RpcOptions};
pub use server::{
    build_router, serve, start_server, DevnetLedger, SharedLedger, DEFAULT_RECEIPT_RETENTION,
};
