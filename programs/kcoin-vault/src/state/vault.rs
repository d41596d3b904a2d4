use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::exchange;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VaultStatus {
    /// Created, asset not yet issued
    Uninitialized,
    /// Asset issued and exchange rate set; mint and burn are open
    Active,
}

#[account]
pub struct Vault {
    /// Creator, the only identity allowed to initialize the asset
    pub creator: Pubkey,
    /// K Coin mint, default until `init_asset`
    pub asset_id: Pubkey,
    /// The vault's K Coin token account
    pub reserve: Pubkey,
    /// microK per lamport, scaled by SCALING_FACTOR
    pub exchange_rate: u64,
    pub status: VaultStatus,
    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl Vault {
    pub const LEN: usize = 8 + // discriminator
        32 + // creator
        32 + // asset_id
        32 + // reserve
        8 + // exchange_rate
        1 + // status
        1; // bump

    pub fn is_active(&self) -> bool {
        self.status == VaultStatus::Active
    }

    /// Moves the vault to `Active`. Runs once; the asset id is never reassigned.
    pub fn activate(
        &mut self,
        asset_id: Pubkey,
        reserve: Pubkey,
        exchange_rate: u64,
    ) -> Result<()> {
        require!(!self.is_active(), VaultError::AlreadyInitialized);
        require!(exchange_rate > 0, VaultError::MathOverflow);

        self.asset_id = asset_id;
        self.reserve = reserve;
        self.exchange_rate = exchange_rate;
        self.status = VaultStatus::Active;
        Ok(())
    }

    pub fn to_asset(&self, base_amount: u64) -> Result<u64> {
        require!(self.is_active(), VaultError::NotInitialized);
        exchange::to_asset(base_amount, self.exchange_rate)
            .ok_or_else(|| error!(VaultError::MathOverflow))
    }

    pub fn to_base(&self, asset_amount: u64) -> Result<u64> {
        require!(self.is_active(), VaultError::NotInitialized);
        exchange::to_base(asset_amount, self.exchange_rate)
            .ok_or_else(|| error!(VaultError::MathOverflow))
    }
}
