//! # Smart account CLI
use crate::{
    account::{SendOptions, SimulateOptions, SmartAccount},
    config::AccountConfig,
    signers::DynSigner,
    types::Transaction,
};
use alloy::primitives::{Address, B256, Bytes, ChainId, U256};
use clap::{Parser, Subcommand};
use eyre::{OptionExt, WrapErr};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

/// Sends transactions from a smart contract account through its relayer.
#[derive(Debug, Parser)]
#[command(author, about = "Smart account", long_about = None)]
pub struct Args {
    /// The configuration file.
    #[arg(long, value_name = "CONFIG", env = "SMART_ACCOUNT_CONFIG", default_value = "account.yaml")]
    pub config: PathBuf,
    /// The chain to operate on.
    #[arg(long = "chain-id", value_name = "CHAIN_ID")]
    pub chain_id: ChainId,
    /// The private key of the master key.
    #[arg(long = "private-key", value_name = "SECRET_KEY", env = "SMART_ACCOUNT_PK")]
    pub private_key: String,
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands of the CLI.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the account address and whether it is deployed.
    Address,
    /// Print the keyset json of the account.
    Keyset,
    /// List the fee tokens accepted by the relayer.
    FeeTokens,
    /// Simulate a call and print its fee options.
    Simulate(CallArgs),
    /// Send a call.
    Send {
        /// The call.
        #[command(flatten)]
        call: CallArgs,
        /// Wait for the receipt.
        #[arg(long, default_value_t = false)]
        wait: bool,
    },
    /// Wait for the receipt of a relayed transaction.
    Wait {
        /// The relayer transaction hash.
        hash: B256,
        /// Confirmations to report.
        #[arg(long, default_value_t = 1)]
        confirmations: u64,
        /// Seconds to wait. Defaults to the configured timeout.
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
    /// Sign a message with the account.
    SignMessage {
        /// The message.
        message: String,
    },
}

/// A call made by the account.
#[derive(Debug, Clone, clap::Args)]
pub struct CallArgs {
    /// Destination address.
    pub to: Address,
    /// Calldata as hex string.
    #[arg(default_value = "0x")]
    pub data: Bytes,
    /// Wei sent with the call.
    #[arg(long, default_value = "0")]
    pub value: U256,
    /// Token the fee is paid in, the zero address for the native token.
    #[arg(long = "fee-token", value_name = "ADDRESS")]
    pub fee_token: Option<Address>,
}

impl CallArgs {
    fn transaction(&self) -> Transaction {
        Transaction::call(self.to, self.value, self.data.clone())
    }
}

impl Args {
    /// Run the command.
    pub async fn run(self) -> eyre::Result<()> {
        let config = AccountConfig::load_from_file(&self.config)?;
        let signer = DynSigner::from_signing_key(&self.private_key)
            .wrap_err("failed to load the master key")?;

        let mut account = SmartAccount::new(config, Arc::new(signer));
        account.init(self.chain_id).await?;
        info!(address = %account.address()?, chain_id = self.chain_id, "loaded account");

        match self.command {
            Command::Address => {
                println!("{}", account.address()?);
                println!("deployed: {}", account.is_deployed().await?);
            }
            Command::Keyset => println!("{}", account.keyset()?.to_json()?),
            Command::FeeTokens => {
                for token in account.fee_tokens().await?.tokens {
                    println!("{}", serde_json::to_string(&token)?);
                }
            }
            Command::Simulate(call) => {
                let result = account
                    .simulate_transaction(
                        call.transaction(),
                        SimulateOptions { fee_token: call.fee_token },
                    )
                    .await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Command::Send { call, wait } => {
                let fee = match call.fee_token {
                    Some(token) => {
                        let result = account
                            .simulate_transaction(
                                call.transaction(),
                                SimulateOptions { fee_token: Some(token) },
                            )
                            .await?;
                        if result.is_fee_required {
                            let option = result
                                .fee_options
                                .into_iter()
                                .find(|option| option.token == token)
                                .ok_or_eyre("fee token not accepted by the relayer")?;
                            if let Some(err) = &option.error {
                                eyre::bail!("fee token {token} unavailable: {err}");
                            }
                            Some(option)
                        } else {
                            None
                        }
                    }
                    None => None,
                };

                let response = account
                    .send_transaction(
                        call.transaction(),
                        SendOptions { fee, free_fee_option: None },
                    )
                    .await?;
                println!("{}", response.hash);

                if wait {
                    let receipt = response.wait(None, None).await?;
                    println!("{}", serde_json::to_string_pretty(&receipt)?);
                }
            }
            Command::Wait { hash, confirmations, timeout } => {
                let receipt = account
                    .wait_transaction_by_receipt(hash, Some(confirmations), None, timeout)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
            Command::SignMessage { message } => {
                println!("{}", account.sign_message(message.as_bytes()).await?);
            }
        }

        account.destroy().await?;
        Ok(())
    }
}
