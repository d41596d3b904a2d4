use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::ID as INSTRUCTIONS_SYSVAR_ID;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::VAULT_SEED;
use crate::error::VaultError;
use crate::state::Vault;
use crate::transfer_record::{preceding_instruction, AssetTransfer};

#[derive(Accounts)]
pub struct BurnKCoin<'info> {
    /// Pays the refund out of its own lamports
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.creator.as_ref()],
        bump = vault.bump,
        constraint = vault.is_active() @ VaultError::NotInitialized,
    )]
    pub vault: Account<'info, Vault>,

    #[account(address = vault.asset_id @ VaultError::AssetMismatch)]
    pub asset_mint: InterfaceAccount<'info, Mint>,

    /// The vault's K Coin account, destination of the returned coins
    #[account(address = vault.reserve @ VaultError::AssetMismatch)]
    pub reserve: InterfaceAccount<'info, TokenAccount>,

    /// Receives the refund
    #[account(mut)]
    pub sender: Signer<'info>,

    /// CHECK: Instructions sysvar, used to read the asset transfer
    #[account(address = INSTRUCTIONS_SYSVAR_ID)]
    pub instructions: UncheckedAccount<'info>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<BurnKCoin>) -> Result<u64> {
    let returned = AssetTransfer::parse(
        &preceding_instruction(&ctx.accounts.instructions.to_account_info())?,
        &ctx.accounts.token_program.key(),
    )?;

    require_keys_eq!(
        returned.destination,
        ctx.accounts.reserve.key(),
        VaultError::InvalidDestination
    );
    require_keys_eq!(
        returned.authority,
        ctx.accounts.sender.key(),
        VaultError::InvalidTransferRecord
    );
    if let Some(mint) = returned.mint {
        require_keys_eq!(mint, ctx.accounts.asset_mint.key(), VaultError::AssetMismatch);
    }
    require!(returned.amount > 0, VaultError::InvalidAmount);

    let refund = ctx.accounts.vault.to_base(returned.amount)?;

    // The vault pays from its own balance but must stay rent-exempt.
    let vault_info = ctx.accounts.vault.to_account_info();
    let rent_floor = Rent::get()?.minimum_balance(vault_info.data_len());
    let remaining = vault_info
        .lamports()
        .checked_sub(refund)
        .filter(|remaining| *remaining >= rent_floor)
        .ok_or(VaultError::InsufficientReserves)?;

    let sender_info = ctx.accounts.sender.to_account_info();
    let credited = sender_info
        .lamports()
        .checked_add(refund)
        .ok_or(VaultError::MathOverflow)?;

    **vault_info.try_borrow_mut_lamports()? = remaining;
    **sender_info.try_borrow_mut_lamports()? = credited;

    msg!("Burn successful!");
    msg!("Returned: {} microK", returned.amount);
    msg!("Refunded: {} lamports", refund);
    msg!("Vault lamports remaining: {}", remaining);

    Ok(refund)
}
