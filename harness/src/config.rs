//! Fixture and property-run settings.
//!
//! Everything the harness needs to bootstrap a vault is carried in these
//! records and passed to setup explicitly. A TOML file can override any field:
//!
//! ```toml
//! [fixture]
//! vault_funding = 2_000_000
//!
//! [property]
//! cases = 100
//! seed = 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub fixture: FixtureConfig,
    pub property: PropertyConfig,
}

impl HarnessConfig {
    pub fn from_toml_str(source: &str) -> HarnessResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> HarnessResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Starting balances for the accounts a vault fixture creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Lamports given to the vault creator
    pub creator_lamports: u64,
    /// Lamports the creator deposits into the vault after creating it
    pub vault_funding: u64,
    /// Lamports given to each user account
    pub user_lamports: u64,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            creator_lamports: 100 * LAMPORTS_PER_SOL,
            vault_funding: 1_000_000,
            user_lamports: 10 * LAMPORTS_PER_SOL,
        }
    }
}

/// Mint/burn round-trip run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyConfig {
    pub cases: u32,
    pub min_amount: u64,
    pub max_amount: u64,
    /// Fixed seed for reproducible runs; random when absent
    pub seed: Option<u64>,
}

impl Default for PropertyConfig {
    fn default() -> Self {
        Self {
            cases: 25,
            min_amount: 10,
            max_amount: 1_000_000,
            seed: None,
        }
    }
}
