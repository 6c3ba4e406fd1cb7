//! # Smart account
//!
//! Library for sending transactions from smart contract accounts through a relayer.
//!
//! A [`SmartAccount`] is built from an [`AccountConfig`] and a [`MasterKeySigner`], initialized
//! on one of the configured chains and then used to simulate, sign and relay calls.

pub mod account;
pub mod chains;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod provider;
pub mod relayer;
pub mod service;
pub mod signers;
pub mod types;

pub use account::{SmartAccount, SmartAccountBuilder, SmartAccountResponse};
pub use config::{AccountConfig, ChainOption};
pub use error::AccountError;
pub use signers::{Clearable, MasterKeySigner};
