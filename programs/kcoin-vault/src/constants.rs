use anchor_lang::prelude::*;

#[constant]
pub const VAULT_SEED: &[u8] = b"vault";

/// Denominator of the exchange rate.
#[constant]
pub const SCALING_FACTOR: u64 = 1000;

/// Rate set by `init_asset`: 2000 / 1000 = 2 microK per lamport.
#[constant]
pub const INITIAL_EXCHANGE_RATE: u64 = 2000;

/// K Coin supply minted into the reserve at initialization.
#[constant]
pub const ASSET_TOTAL: u64 = 1_000_000_000;

#[constant]
pub const ASSET_DECIMALS: u8 = 3;

pub const ASSET_NAME: &str = "K Coin";
pub const ASSET_UNIT_NAME: &str = "microK";
