//! Smart account constants.

use alloy::{
    hex,
    primitives::{Address, address},
};
use std::time::Duration;

/// Index of the master key inside the keyset.
pub const MASTER_KEY_INDEX: usize = 0;

/// Keyset index used for EIP-712 and message signatures.
pub const EIP712_KEY_INDEX: usize = 1;

/// Default number of seconds (and relayer polls) to wait for a receipt.
pub const DEFAULT_TIMEOUT: u64 = 60;

/// Interval between two receipt polls.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Owner weight of a master key built without a keyset json.
pub const DEFAULT_MASTER_KEY_OWNER_WEIGHT: u32 = 100;

/// Assets-op weight of a master key built without a keyset json.
pub const DEFAULT_MASTER_KEY_ASSETS_OP_WEIGHT: u32 = 100;

/// Guardian weight of a master key built without a keyset json.
pub const DEFAULT_MASTER_KEY_GUARDIAN_WEIGHT: u32 = 0;

/// The fixed 32-byte suffix marking an [EIP-6492](https://eips.ethereum.org/EIPS/eip-6492)
/// pre-deployment signature.
pub const ERC6492_DETECTION_SUFFIX: [u8; 32] =
    hex!("6492649264926492649264926492649264926492649264926492649264926492");

/// The [EIP-2470](https://eips.ethereum.org/EIPS/eip-2470) singleton factory the account
/// address is derived from.
pub const SINGLETON_FACTORY_ADDRESS: Address =
    address!("0xce0042B868300000d44A59004Da54A005ffdcf9f");

/// The factory deploying accounts on behalf of an app.
pub const ACCOUNT_FACTORY_ADDRESS: Address =
    address!("0x9dECf65345384893c743De463190B0AA83f54dE8");

/// Creation code of the account proxy. The module main address is appended as `uint256`.
pub const WALLET_CREATION_CODE: [u8; 40] =
    hex!("603a600e3d39601a805130553df3363d3d373d3d3d363d30545af43d82803e903d91601857fd5bf3");

/// Header carrying the app id on relayer requests.
pub const APP_ID_HEADER: &str = "X-UP-APP-ID";
