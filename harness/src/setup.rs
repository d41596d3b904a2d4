use anchor_lang::solana_program::account_info::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::{AccountDeserialize, InstructionData, ToAccountMetas};
use anchor_spl::associated_token::{
    self, get_associated_token_address,
    spl_associated_token_account::instruction as ata_instruction,
};
use anchor_spl::token::spl_token;
use kcoin_vault::state::Vault;
use kcoin_vault::VAULT_SEED;
use solana_program_test::{processor, ProgramTest, ProgramTestContext};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction, system_program,
    transaction::Transaction,
};

use crate::config::FixtureConfig;
use crate::error::{HarnessError, HarnessResult};

/// Test environment with the vault program loaded into an in-process bank
pub struct VaultTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// Accounts of a created vault
#[derive(Debug)]
pub struct VaultAccounts {
    pub vault: Pubkey,
    pub creator: Keypair,
}

/// Accounts created by `init_asset`
#[derive(Debug, Clone, Copy)]
pub struct AssetAccounts {
    pub asset_mint: Pubkey,
    pub reserve: Pubkey,
}

/// A funded user with a K Coin account
#[derive(Debug)]
pub struct UserAccounts {
    pub owner: Keypair,
    pub asset_account: Pubkey,
}

// ============================================================================
// Core Setup Functions
// ============================================================================

// Anchor's entrypoint ties the slice lifetime to the account lifetime, the
// builtin processor signature does not. Each call leaks one account vector,
// so long-running loops should reuse a bank rather than start new ones.
fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let accounts = Box::leak(Box::new(accounts.to_vec()));
    kcoin_vault::entry(program_id, accounts, data)
}

/// A program test with the vault registered as a builtin, before start
pub fn vault_program_test() -> ProgramTest {
    ProgramTest::new(
        "kcoin_vault",
        kcoin_vault::ID,
        processor!(process_instruction),
    )
}

/// Starts `program_test`, which must carry the vault program
pub async fn start_program_test(program_test: ProgramTest) -> VaultTestEnv {
    let context = program_test.start_with_context().await;

    VaultTestEnv {
        program_id: kcoin_vault::ID,
        context,
    }
}

/// Starts a bank with the vault program registered as a builtin
pub async fn setup_program_test() -> VaultTestEnv {
    start_program_test(vault_program_test()).await
}

/// Signs with the payer plus `signers` and submits on a fresh blockhash.
///
/// Returns the program return data of the last instruction that set one.
pub async fn send_instructions(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> HarnessResult<Option<Vec<u8>>> {
    let blockhash = fresh_blockhash(context).await?;

    let mut all_signers: Vec<&Keypair> = vec![&context.payer];
    all_signers.extend(
        signers
            .iter()
            .copied()
            .filter(|signer| signer.pubkey() != context.payer.pubkey()),
    );

    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers[..],
        blockhash,
    );

    let outcome = context.banks_client.process_transaction_with_metadata(tx).await?;
    outcome.result?;

    Ok(outcome
        .metadata
        .and_then(|metadata| metadata.return_data)
        .map(|return_data| return_data.data))
}

// Identical transactions on one blockhash would be rejected as duplicates.
async fn fresh_blockhash(context: &mut ProgramTestContext) -> HarnessResult<Hash> {
    Ok(context.get_new_latest_blockhash().await?)
}

/// Transfers lamports from the bank payer
pub async fn fund_account(
    context: &mut ProgramTestContext,
    recipient: &Pubkey,
    lamports: u64,
) -> HarnessResult<()> {
    let ix = system_instruction::transfer(&context.payer.pubkey(), recipient, lamports);
    send_instructions(context, &[ix], &[]).await?;
    Ok(())
}

/// Creates a funded creator and its vault, then deposits the configured float
pub async fn setup_vault(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    config: &FixtureConfig,
) -> HarnessResult<VaultAccounts> {
    let creator = Keypair::new();
    fund_account(context, &creator.pubkey(), config.creator_lamports).await?;

    let (vault, _) = derive_vault_pda(program_id, &creator.pubkey());

    let accounts = kcoin_vault::accounts::CreateVault {
        vault,
        creator: creator.pubkey(),
        system_program: system_program::ID,
    };

    let create_ix = Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: kcoin_vault::instruction::CreateVault {}.data(),
    };

    let mut instructions = vec![create_ix];
    if config.vault_funding > 0 {
        instructions.push(system_instruction::transfer(
            &creator.pubkey(),
            &vault,
            config.vault_funding,
        ));
    }

    send_instructions(context, &instructions, &[&creator]).await?;

    tracing::info!(%vault, creator = %creator.pubkey(), "created vault");

    Ok(VaultAccounts { vault, creator })
}

/// Builds an `init_asset` instruction creating `asset_mint`
pub fn init_asset_instruction(
    program_id: &Pubkey,
    vault: &Pubkey,
    owner: &Pubkey,
    asset_mint: &Pubkey,
) -> Instruction {
    let accounts = kcoin_vault::accounts::InitAsset {
        vault: *vault,
        asset_mint: *asset_mint,
        reserve: get_associated_token_address(vault, asset_mint),
        owner: *owner,
        system_program: system_program::ID,
        token_program: spl_token::ID,
        associated_token_program: associated_token::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: kcoin_vault::instruction::InitAsset {}.data(),
    }
}

/// Issues the K Coin asset, signed by `owner`
pub async fn init_asset(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    vault: &Pubkey,
    owner: &Keypair,
) -> HarnessResult<AssetAccounts> {
    let asset_mint = Keypair::new();
    let ix = init_asset_instruction(program_id, vault, &owner.pubkey(), &asset_mint.pubkey());

    let return_data = send_instructions(context, &[ix], &[owner, &asset_mint]).await?;
    let asset_id = decode_pubkey(return_data).ok_or(HarnessError::MissingReturnData("init_asset"))?;

    tracing::info!(%asset_id, "initialized K Coin");

    Ok(AssetAccounts {
        asset_mint: asset_id,
        reserve: get_associated_token_address(vault, &asset_id),
    })
}

/// Funds a new user and opens its K Coin account
pub async fn setup_user(
    context: &mut ProgramTestContext,
    asset_mint: &Pubkey,
    config: &FixtureConfig,
) -> HarnessResult<UserAccounts> {
    let owner = Keypair::new();
    fund_account(context, &owner.pubkey(), config.user_lamports).await?;

    let asset_account = open_token_account(context, &owner.pubkey(), asset_mint).await?;

    Ok(UserAccounts {
        owner,
        asset_account,
    })
}

/// Creates the associated token account of `wallet` for `mint`
pub async fn open_token_account(
    context: &mut ProgramTestContext,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> HarnessResult<Pubkey> {
    let ix = ata_instruction::create_associated_token_account(
        &context.payer.pubkey(),
        wallet,
        mint,
        &spl_token::ID,
    );
    send_instructions(context, &[ix], &[]).await?;
    Ok(get_associated_token_address(wallet, mint))
}

/// Creates a plain SPL mint unrelated to any vault
pub async fn setup_foreign_mint(
    context: &mut ProgramTestContext,
    decimals: u8,
) -> HarnessResult<(Pubkey, Keypair)> {
    let mint_authority = Keypair::new();
    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();

    let rent = context.banks_client.get_rent().await?;
    let mint_len = 82; // Size of Mint account in SPL Token program

    let create_account_ix = system_instruction::create_account(
        &context.payer.pubkey(),
        &mint,
        rent.minimum_balance(mint_len),
        mint_len as u64,
        &spl_token::ID,
    );

    let init_mint_ix = spl_token::instruction::initialize_mint(
        &spl_token::ID,
        &mint,
        &mint_authority.pubkey(),
        None,
        decimals,
    )?;

    send_instructions(context, &[create_account_ix, init_mint_ix], &[&mint_keypair]).await?;

    Ok((mint, mint_authority))
}

/// Everything a mint/burn run needs: an active vault and one user
pub async fn setup_complete_environment(
    config: &FixtureConfig,
) -> HarnessResult<(VaultTestEnv, VaultAccounts, AssetAccounts, UserAccounts)> {
    let mut env = setup_program_test().await;

    let vault = setup_vault(&mut env.context, &env.program_id, config).await?;
    let asset = init_asset(&mut env.context, &env.program_id, &vault.vault, &vault.creator).await?;
    let user = setup_user(&mut env.context, &asset.asset_mint, config).await?;

    Ok((env, vault, asset, user))
}

// ============================================================================
// PDA Derivation Helpers
// ============================================================================

/// Derive the vault PDA of `creator`
pub fn derive_vault_pda(program_id: &Pubkey, creator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, creator.as_ref()], program_id)
}

// ============================================================================
// Account State Helpers
// ============================================================================

pub fn decode_u64(return_data: Option<Vec<u8>>) -> Option<u64> {
    let bytes: [u8; 8] = return_data?.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

fn decode_pubkey(return_data: Option<Vec<u8>>) -> Option<Pubkey> {
    let bytes: [u8; 32] = return_data?.get(..32)?.try_into().ok()?;
    Some(Pubkey::new_from_array(bytes))
}

/// Fetch and return vault state
pub async fn get_vault_state(
    context: &mut ProgramTestContext,
    vault: &Pubkey,
) -> HarnessResult<Vault> {
    let account = context
        .banks_client
        .get_account(*vault)
        .await?
        .ok_or(HarnessError::AccountNotFound(*vault))?;

    Vault::try_deserialize(&mut account.data.as_slice())
        .map_err(|_| HarnessError::InvalidAccountData(*vault))
}

/// Get token account balance
pub async fn get_token_balance(
    context: &mut ProgramTestContext,
    account: &Pubkey,
) -> HarnessResult<u64> {
    let account_data = context
        .banks_client
        .get_account(*account)
        .await?
        .ok_or(HarnessError::AccountNotFound(*account))?;

    // Token account layout: amount is the u64 at offset 64
    let amount = account_data
        .data
        .get(64..72)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(HarnessError::InvalidAccountData(*account))?;

    Ok(amount)
}

/// Get mint supply
pub async fn get_mint_supply(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
) -> HarnessResult<u64> {
    let account = context
        .banks_client
        .get_account(*mint)
        .await?
        .ok_or(HarnessError::AccountNotFound(*mint))?;

    // Mint layout: supply is the u64 at offset 36
    let supply = account
        .data
        .get(36..44)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(HarnessError::InvalidAccountData(*mint))?;

    Ok(supply)
}

/// Get lamport balance
pub async fn get_lamports(
    context: &mut ProgramTestContext,
    account: &Pubkey,
) -> HarnessResult<u64> {
    Ok(context.banks_client.get_balance(*account).await?)
}
