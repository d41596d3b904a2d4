use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{mint_to, Mint, MintTo, TokenAccount, TokenInterface};

use crate::constants::{
    ASSET_DECIMALS, ASSET_NAME, ASSET_TOTAL, ASSET_UNIT_NAME, INITIAL_EXCHANGE_RATE, VAULT_SEED,
};
use crate::error::VaultError;
use crate::state::Vault;

#[derive(Accounts)]
pub struct InitAsset<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.creator.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Account<'info, Vault>,

    /// The K Coin mint, created here with the vault as mint and freeze authority
    #[account(
        init,
        payer = owner,
        mint::decimals = ASSET_DECIMALS,
        mint::authority = vault,
        mint::freeze_authority = vault,
        mint::token_program = token_program,
    )]
    pub asset_mint: InterfaceAccount<'info, Mint>,

    /// The vault's K Coin account, receives the whole supply
    #[account(
        init,
        payer = owner,
        associated_token::mint = asset_mint,
        associated_token::authority = vault,
        associated_token::token_program = token_program,
    )]
    pub reserve: InterfaceAccount<'info, TokenAccount>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

pub fn handler(ctx: Context<InitAsset>) -> Result<Pubkey> {
    require!(
        !ctx.accounts.vault.is_active(),
        VaultError::AlreadyInitialized
    );
    require_keys_eq!(
        ctx.accounts.owner.key(),
        ctx.accounts.vault.creator,
        VaultError::Unauthorized
    );

    let creator = ctx.accounts.vault.creator;
    let vault_seeds = &[VAULT_SEED, creator.as_ref(), &[ctx.accounts.vault.bump]];
    let signer_seeds = &[&vault_seeds[..]];

    let mint_accounts = MintTo {
        mint: ctx.accounts.asset_mint.to_account_info(),
        to: ctx.accounts.reserve.to_account_info(),
        authority: ctx.accounts.vault.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        mint_accounts,
        signer_seeds,
    );

    mint_to(cpi_ctx, ASSET_TOTAL)?;

    let asset_id = ctx.accounts.asset_mint.key();
    let reserve = ctx.accounts.reserve.key();
    let vault = &mut ctx.accounts.vault;
    vault.activate(asset_id, reserve, INITIAL_EXCHANGE_RATE)?;

    msg!("{} ({}) initialized!", ASSET_NAME, ASSET_UNIT_NAME);
    msg!("Asset: {}", vault.asset_id);
    msg!("Reserve: {}", vault.reserve);
    msg!("Supply: {}", ASSET_TOTAL);
    msg!("Exchange rate: {}", vault.exchange_rate);

    Ok(asset_id)
}
