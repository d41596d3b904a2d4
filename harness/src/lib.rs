//! Harness for the K Coin vault program.
//!
//! Runs the program as a builtin inside `solana-program-test`, so every
//! mint and burn goes through real transactions, the token program and the
//! instructions sysvar without a running validator.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod property;
pub mod sequence;
pub mod setup;

pub use client::VaultClient;
pub use config::{FixtureConfig, HarnessConfig, PropertyConfig};
pub use error::{HarnessError, HarnessResult};
pub use setup::*;

/// Anchor error code of a vault error as seen in a failed transaction
pub fn vault_error_code(error: kcoin_vault::error::VaultError) -> u32 {
    error as u32 + anchor_lang::error::ERROR_CODE_OFFSET
}
