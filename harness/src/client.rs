//! Typed access to a bootstrapped vault.
//!
//! Bootstrapping creates the vault, funds it, issues K Coin and leaves the
//! client ready for `mint`/`burn` calls from any number of users.

use anchor_lang::solana_program::sysvar;
use anchor_lang::{InstructionData, ToAccountMetas};
use anchor_spl::token::spl_token;
use kcoin_vault::state::Vault;
use kcoin_vault::ASSET_DECIMALS;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signer, system_instruction};

use crate::config::FixtureConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::setup::{self, AssetAccounts, UserAccounts, VaultAccounts, VaultTestEnv};

/// `[funding transfer, mint]` paying `lamports` to `destination`
pub fn mint_instructions(
    program_id: &Pubkey,
    vault: &Pubkey,
    asset: &AssetAccounts,
    sender: &Pubkey,
    sender_asset_account: &Pubkey,
    lamports: u64,
    destination: &Pubkey,
) -> Vec<Instruction> {
    let accounts = kcoin_vault::accounts::MintKCoin {
        vault: *vault,
        asset_mint: asset.asset_mint,
        reserve: asset.reserve,
        sender_asset_account: *sender_asset_account,
        sender: *sender,
        instructions: sysvar::instructions::ID,
        token_program: spl_token::ID,
    };

    vec![
        system_instruction::transfer(sender, destination, lamports),
        Instruction {
            program_id: *program_id,
            accounts: accounts.to_account_metas(None),
            data: kcoin_vault::instruction::Mint {}.data(),
        },
    ]
}

/// `[asset transfer, burn]` returning `amount` microK to `destination`
pub fn burn_instructions(
    program_id: &Pubkey,
    vault: &Pubkey,
    asset: &AssetAccounts,
    sender: &Pubkey,
    sender_asset_account: &Pubkey,
    amount: u64,
    destination: &Pubkey,
) -> HarnessResult<Vec<Instruction>> {
    let accounts = kcoin_vault::accounts::BurnKCoin {
        vault: *vault,
        asset_mint: asset.asset_mint,
        reserve: asset.reserve,
        sender: *sender,
        instructions: sysvar::instructions::ID,
        token_program: spl_token::ID,
    };

    let transfer_ix = spl_token::instruction::transfer_checked(
        &spl_token::ID,
        sender_asset_account,
        &asset.asset_mint,
        destination,
        sender,
        &[],
        amount,
        ASSET_DECIMALS,
    )?;

    Ok(vec![
        transfer_ix,
        Instruction {
            program_id: *program_id,
            accounts: accounts.to_account_metas(None),
            data: kcoin_vault::instruction::Burn {}.data(),
        },
    ])
}

pub struct VaultClient {
    pub env: VaultTestEnv,
    pub vault: VaultAccounts,
    pub asset: AssetAccounts,
    config: FixtureConfig,
}

impl VaultClient {
    /// Creates and funds a vault, then issues its asset
    pub async fn bootstrap(config: &FixtureConfig) -> HarnessResult<Self> {
        let mut env = setup::setup_program_test().await;

        let vault = setup::setup_vault(&mut env.context, &env.program_id, config).await?;
        let asset =
            setup::init_asset(&mut env.context, &env.program_id, &vault.vault, &vault.creator)
                .await?;

        tracing::info!(
            vault = %vault.vault,
            asset_id = %asset.asset_mint,
            "vault ready"
        );

        Ok(Self {
            env,
            vault,
            asset,
            config: config.clone(),
        })
    }

    /// Funds a new user and opens its K Coin account
    pub async fn create_user(&mut self) -> HarnessResult<UserAccounts> {
        setup::setup_user(&mut self.env.context, &self.asset.asset_mint, &self.config).await
    }

    /// Pays `lamports` into the vault and returns the microK issued
    pub async fn call_mint(&mut self, user: &UserAccounts, lamports: u64) -> HarnessResult<u64> {
        let destination = self.vault.vault;
        self.call_mint_to(user, lamports, &destination).await
    }

    /// Like [`Self::call_mint`] with the funding transfer sent to `destination`
    pub async fn call_mint_to(
        &mut self,
        user: &UserAccounts,
        lamports: u64,
        destination: &Pubkey,
    ) -> HarnessResult<u64> {
        let instructions = mint_instructions(
            &self.env.program_id,
            &self.vault.vault,
            &self.asset,
            &user.owner.pubkey(),
            &user.asset_account,
            lamports,
            destination,
        );

        let return_data =
            setup::send_instructions(&mut self.env.context, &instructions, &[&user.owner]).await?;
        let issued = setup::decode_u64(return_data).ok_or(HarnessError::MissingReturnData("mint"))?;

        tracing::debug!(lamports, issued, "mint");
        Ok(issued)
    }

    /// Returns `amount` microK to the reserve and returns the lamports refunded
    pub async fn call_burn(&mut self, user: &UserAccounts, amount: u64) -> HarnessResult<u64> {
        let destination = self.asset.reserve;
        self.call_burn_to(user, amount, &destination).await
    }

    /// Like [`Self::call_burn`] with the asset transfer sent to `destination`
    pub async fn call_burn_to(
        &mut self,
        user: &UserAccounts,
        amount: u64,
        destination: &Pubkey,
    ) -> HarnessResult<u64> {
        let instructions = burn_instructions(
            &self.env.program_id,
            &self.vault.vault,
            &self.asset,
            &user.owner.pubkey(),
            &user.asset_account,
            amount,
            destination,
        )?;

        let return_data =
            setup::send_instructions(&mut self.env.context, &instructions, &[&user.owner]).await?;
        let refund = setup::decode_u64(return_data).ok_or(HarnessError::MissingReturnData("burn"))?;

        tracing::debug!(amount, refund, "burn");
        Ok(refund)
    }

    pub async fn vault_state(&mut self) -> HarnessResult<Vault> {
        let vault = self.vault.vault;
        setup::get_vault_state(&mut self.env.context, &vault).await
    }

    pub async fn reserve_balance(&mut self) -> HarnessResult<u64> {
        let reserve = self.asset.reserve;
        setup::get_token_balance(&mut self.env.context, &reserve).await
    }

    pub async fn asset_balance(&mut self, user: &UserAccounts) -> HarnessResult<u64> {
        setup::get_token_balance(&mut self.env.context, &user.asset_account).await
    }

    pub async fn lamports(&mut self, account: &Pubkey) -> HarnessResult<u64> {
        setup::get_lamports(&mut self.env.context, account).await
    }
}
