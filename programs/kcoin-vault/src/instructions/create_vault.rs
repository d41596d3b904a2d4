use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;
use crate::state::{Vault, VaultStatus};

#[derive(Accounts)]
pub struct CreateVault<'info> {
    /// The vault account; also holds the lamports backing K Coin
    #[account(
        init,
        payer = creator,
        space = Vault::LEN,
        seeds = [VAULT_SEED, creator.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    /// Becomes the only identity allowed to initialize the asset
    #[account(mut)]
    pub creator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<CreateVault>) -> Result<()> {
    let vault = &mut ctx.accounts.vault;

    vault.creator = ctx.accounts.creator.key();
    vault.asset_id = Pubkey::default();
    vault.reserve = Pubkey::default();
    vault.exchange_rate = 0;
    vault.status = VaultStatus::Uninitialized;
    vault.bump = ctx.bumps.vault;

    msg!("Vault created!");
    msg!("Vault: {}", vault.key());
    msg!("Creator: {}", vault.creator);

    Ok(())
}
