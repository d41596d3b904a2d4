use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::ID as INSTRUCTIONS_SYSVAR_ID;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::constants::VAULT_SEED;
use crate::error::VaultError;
use crate::state::Vault;
use crate::transfer_record::{preceding_instruction, FundingTransfer};

#[derive(Accounts)]
pub struct MintKCoin<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.creator.as_ref()],
        bump = vault.bump,
        constraint = vault.is_active() @ VaultError::NotInitialized,
    )]
    pub vault: Account<'info, Vault>,

    #[account(address = vault.asset_id @ VaultError::AssetMismatch)]
    pub asset_mint: InterfaceAccount<'info, Mint>,

    /// The vault's K Coin account, source of the issued coins
    #[account(mut, address = vault.reserve @ VaultError::AssetMismatch)]
    pub reserve: InterfaceAccount<'info, TokenAccount>,

    /// The sender's K Coin account, receives the issued coins
    #[account(
        mut,
        token::mint = asset_mint,
        token::authority = sender,
    )]
    pub sender_asset_account: InterfaceAccount<'info, TokenAccount>,

    pub sender: Signer<'info>,

    /// CHECK: Instructions sysvar, used to read the funding transfer
    #[account(address = INSTRUCTIONS_SYSVAR_ID)]
    pub instructions: UncheckedAccount<'info>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<MintKCoin>) -> Result<u64> {
    let funding = FundingTransfer::parse(&preceding_instruction(
        &ctx.accounts.instructions.to_account_info(),
    )?)?;

    require_keys_eq!(
        funding.to,
        ctx.accounts.vault.key(),
        VaultError::InvalidDestination
    );
    require_keys_eq!(
        funding.from,
        ctx.accounts.sender.key(),
        VaultError::InvalidTransferRecord
    );
    require!(funding.lamports > 0, VaultError::InvalidAmount);

    let issued = ctx.accounts.vault.to_asset(funding.lamports)?;

    let creator = ctx.accounts.vault.creator;
    let vault_seeds = &[VAULT_SEED, creator.as_ref(), &[ctx.accounts.vault.bump]];
    let signer_seeds = &[&vault_seeds[..]];

    let transfer_accounts = TransferChecked {
        from: ctx.accounts.reserve.to_account_info(),
        mint: ctx.accounts.asset_mint.to_account_info(),
        to: ctx.accounts.sender_asset_account.to_account_info(),
        authority: ctx.accounts.vault.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        transfer_accounts,
        signer_seeds,
    );

    transfer_checked(cpi_ctx, issued, ctx.accounts.asset_mint.decimals)?;

    msg!("Mint successful!");
    msg!("Paid: {} lamports", funding.lamports);
    msg!("Issued: {} microK", issued);
    msg!("Reserve remaining: {}", ctx.accounts.reserve.amount.saturating_sub(issued));

    Ok(issued)
}
