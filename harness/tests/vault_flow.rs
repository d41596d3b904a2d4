use anchor_lang::solana_program::account_info::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke;
use anchor_lang::solana_program::program_error::ProgramError;
use kcoin_harness::client::{burn_instructions, mint_instructions};
use kcoin_harness::property::run_round_trips;
use kcoin_harness::sequence::{parse_sequence, run_sequence};
use kcoin_harness::*;
use kcoin_vault::error::VaultError;
use kcoin_vault::state::VaultStatus;
use kcoin_vault::{ASSET_TOTAL, INITIAL_EXCHANGE_RATE};
use solana_program_test::processor;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;

/// Calls made by the relay for each instruction it receives
const RELAY_CALLS: usize = 2;

// Forwards its data to the program in the first account, several times over
fn relay_process_instruction(
    _program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let (target, forwarded) = accounts
        .split_first()
        .ok_or(ProgramError::NotEnoughAccountKeys)?;

    let ix = Instruction {
        program_id: *target.key,
        accounts: forwarded
            .iter()
            .map(|account| AccountMeta {
                pubkey: *account.key,
                is_signer: account.is_signer,
                is_writable: account.is_writable,
            })
            .collect(),
        data: data.to_vec(),
    };

    for _ in 0..RELAY_CALLS {
        invoke(&ix, accounts)?;
    }
    Ok(())
}

/// Wraps the vault instruction of `[transfer, vault ix]` in a relay call
fn relayed(relay_id: &Pubkey, mut instructions: Vec<Instruction>) -> Vec<Instruction> {
    let vault_ix = instructions.remove(1);

    let mut accounts = vec![AccountMeta::new_readonly(vault_ix.program_id, false)];
    accounts.extend(vault_ix.accounts);

    instructions.push(Instruction {
        program_id: *relay_id,
        accounts,
        data: vault_ix.data,
    });
    instructions
}

/// An active vault and a user on a bank that also runs the relay
async fn setup_with_relay() -> (VaultTestEnv, VaultAccounts, AssetAccounts, UserAccounts, Pubkey) {
    let relay_id = Pubkey::new_unique();
    let mut program_test = vault_program_test();
    program_test.add_program(
        "kcoin_relay",
        relay_id,
        processor!(relay_process_instruction),
    );

    let mut env = start_program_test(program_test).await;
    let program_id = env.program_id;
    let config = FixtureConfig::default();

    let vault = setup_vault(&mut env.context, &program_id, &config).await.unwrap();
    let asset = init_asset(&mut env.context, &program_id, &vault.vault, &vault.creator)
        .await
        .unwrap();
    let user = setup_user(&mut env.context, &asset.asset_mint, &config).await.unwrap();

    (env, vault, asset, user, relay_id)
}

fn assert_vault_error<T: std::fmt::Debug>(result: HarnessResult<T>, expected: VaultError) {
    let err = result.expect_err("transaction should fail");
    assert_eq!(
        err.custom_code(),
        Some(vault_error_code(expected)),
        "expected {expected:?}, got {err:?}"
    );
}

async fn funded_keypair(client: &mut VaultClient) -> Keypair {
    let keypair = Keypair::new();
    fund_account(
        &mut client.env.context,
        &keypair.pubkey(),
        10 * config::LAMPORTS_PER_SOL,
    )
    .await
    .unwrap();
    keypair
}

#[tokio::test]
async fn test_init_asset_activates_vault() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();

    let vault = client.vault_state().await.unwrap();
    assert_eq!(vault.status, VaultStatus::Active);
    assert_eq!(vault.asset_id, client.asset.asset_mint);
    assert_eq!(vault.reserve, client.asset.reserve);
    assert_eq!(vault.exchange_rate, INITIAL_EXCHANGE_RATE);
    assert_eq!(vault.creator, client.vault.creator.pubkey());

    assert_eq!(client.reserve_balance().await.unwrap(), ASSET_TOTAL);
    let mint = client.asset.asset_mint;
    assert_eq!(
        get_mint_supply(&mut client.env.context, &mint).await.unwrap(),
        ASSET_TOTAL
    );
}

#[tokio::test]
async fn test_mint_and_burn_scenarios() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();
    let vault = client.vault.vault;

    for (paid, expected_coins) in [(100, 200), (999, 1998), (101, 202)] {
        let user_lamports = client.lamports(&user.owner.pubkey()).await.unwrap();
        let vault_lamports = client.lamports(&vault).await.unwrap();
        let reserve = client.reserve_balance().await.unwrap();

        let minted = client.call_mint(&user, paid).await.unwrap();
        assert_eq!(minted, expected_coins, "mint({paid})");
        assert_eq!(client.asset_balance(&user).await.unwrap(), expected_coins);
        assert_eq!(client.reserve_balance().await.unwrap(), reserve - expected_coins);
        assert_eq!(client.lamports(&vault).await.unwrap(), vault_lamports + paid);

        let refunded = client.call_burn(&user, minted).await.unwrap();
        assert_eq!(refunded, paid, "burn({minted})");
        assert_eq!(client.asset_balance(&user).await.unwrap(), 0);
        assert_eq!(client.reserve_balance().await.unwrap(), reserve);
        assert_eq!(client.lamports(&vault).await.unwrap(), vault_lamports);
        // The bank payer covers fees, so the user's balance is restored exactly
        assert_eq!(
            client.lamports(&user.owner.pubkey()).await.unwrap(),
            user_lamports
        );
    }
}

#[tokio::test]
async fn test_partial_burn_truncates() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();

    assert_eq!(client.call_mint(&user, 10).await.unwrap(), 20);
    assert_eq!(client.call_burn(&user, 3).await.unwrap(), 1);
    assert_eq!(client.asset_balance(&user).await.unwrap(), 17);
}

#[tokio::test]
async fn test_second_init_is_rejected() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let program_id = client.env.program_id;
    let vault = client.vault.vault;
    let before = client.vault_state().await.unwrap();

    let creator = client.vault.creator.insecure_clone();
    let stranger = funded_keypair(&mut client).await;

    for caller in [&creator, &stranger] {
        let result = init_asset(&mut client.env.context, &program_id, &vault, caller).await;
        assert_vault_error(result, VaultError::AlreadyInitialized);
    }

    let after = client.vault_state().await.unwrap();
    assert_eq!(after.asset_id, before.asset_id);
    assert_eq!(after.reserve, before.reserve);
    assert_eq!(after.exchange_rate, before.exchange_rate);
}

#[tokio::test]
async fn test_init_by_non_owner_is_rejected() {
    let mut env = setup_program_test().await;
    let program_id = env.program_id;
    let vault = setup_vault(&mut env.context, &program_id, &FixtureConfig::default())
        .await
        .unwrap();

    let stranger = Keypair::new();
    fund_account(&mut env.context, &stranger.pubkey(), config::LAMPORTS_PER_SOL)
        .await
        .unwrap();

    let result = init_asset(&mut env.context, &program_id, &vault.vault, &stranger).await;
    assert_vault_error(result, VaultError::Unauthorized);

    let state = get_vault_state(&mut env.context, &vault.vault).await.unwrap();
    assert_eq!(state.status, VaultStatus::Uninitialized);
    assert_eq!(state.exchange_rate, 0);

    // The creator can still initialize afterwards
    let asset = init_asset(&mut env.context, &program_id, &vault.vault, &vault.creator)
        .await
        .unwrap();
    let state = get_vault_state(&mut env.context, &vault.vault).await.unwrap();
    assert_eq!(state.asset_id, asset.asset_mint);
}

#[tokio::test]
async fn test_mint_before_init_is_rejected() {
    let mut env = setup_program_test().await;
    let program_id = env.program_id;
    let config = FixtureConfig::default();
    let vault = setup_vault(&mut env.context, &program_id, &config).await.unwrap();

    // Stand-in token accounts, since an uninitialized vault has no asset yet
    let (foreign_mint, _authority) = setup_foreign_mint(&mut env.context, 3).await.unwrap();
    let user = setup_user(&mut env.context, &foreign_mint, &config).await.unwrap();
    let stand_in_reserve = open_token_account(
        &mut env.context,
        &vault.creator.pubkey(),
        &foreign_mint,
    )
    .await
    .unwrap();

    let asset = AssetAccounts {
        asset_mint: foreign_mint,
        reserve: stand_in_reserve,
    };
    let instructions = mint_instructions(
        &program_id,
        &vault.vault,
        &asset,
        &user.owner.pubkey(),
        &user.asset_account,
        100,
        &vault.vault,
    );

    let vault_lamports = get_lamports(&mut env.context, &vault.vault).await.unwrap();
    let result = send_instructions(&mut env.context, &instructions, &[&user.owner]).await;
    assert_vault_error(result, VaultError::NotInitialized);

    assert_eq!(
        get_lamports(&mut env.context, &vault.vault).await.unwrap(),
        vault_lamports
    );
}

#[tokio::test]
async fn test_mint_to_wrong_destination_is_rejected() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();
    let elsewhere = client.vault.creator.pubkey();

    let user_lamports = client.lamports(&user.owner.pubkey()).await.unwrap();
    let reserve = client.reserve_balance().await.unwrap();

    let result = client.call_mint_to(&user, 100, &elsewhere).await;
    assert_vault_error(result, VaultError::InvalidDestination);

    assert_eq!(
        client.lamports(&user.owner.pubkey()).await.unwrap(),
        user_lamports
    );
    assert_eq!(client.reserve_balance().await.unwrap(), reserve);
    assert_eq!(client.asset_balance(&user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_burn_to_wrong_destination_is_rejected() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();
    let other = client.create_user().await.unwrap();

    client.call_mint(&user, 100).await.unwrap();
    let vault = client.vault.vault;
    let vault_lamports = client.lamports(&vault).await.unwrap();

    let result = client.call_burn_to(&user, 200, &other.asset_account).await;
    assert_vault_error(result, VaultError::InvalidDestination);

    assert_eq!(client.asset_balance(&user).await.unwrap(), 200);
    assert_eq!(client.asset_balance(&other).await.unwrap(), 0);
    assert_eq!(client.lamports(&vault).await.unwrap(), vault_lamports);
}

#[tokio::test]
async fn test_mint_requires_preceding_funding() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();
    let program_id = client.env.program_id;
    let vault = client.vault.vault;

    let mut instructions = mint_instructions(
        &program_id,
        &vault,
        &client.asset,
        &user.owner.pubkey(),
        &user.asset_account,
        100,
        &vault,
    );

    // Mint alone
    let mint_only = vec![instructions[1].clone()];
    let result = send_instructions(&mut client.env.context, &mint_only, &[&user.owner]).await;
    assert_vault_error(result, VaultError::MissingTransferRecord);

    // Funding paid by somebody other than the sender
    let payer = client.env.context.payer.pubkey();
    instructions[0] = system_instruction::transfer(&payer, &vault, 100);
    let result = send_instructions(&mut client.env.context, &instructions, &[&user.owner]).await;
    assert_vault_error(result, VaultError::InvalidTransferRecord);

    assert_eq!(client.asset_balance(&user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_zero_amounts_are_rejected() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();

    assert_vault_error(client.call_mint(&user, 0).await, VaultError::InvalidAmount);
    assert_vault_error(client.call_burn(&user, 0).await, VaultError::InvalidAmount);
}

#[tokio::test]
async fn test_burn_requires_preceding_asset_transfer() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();
    client.call_mint(&user, 100).await.unwrap();

    let program_id = client.env.program_id;
    let vault = client.vault.vault;
    let reserve = client.asset.reserve;
    let instructions = burn_instructions(
        &program_id,
        &vault,
        &client.asset,
        &user.owner.pubkey(),
        &user.asset_account,
        200,
        &reserve,
    )
    .unwrap();

    // A lamport transfer does not pay for a burn
    let wrong_kind = vec![
        system_instruction::transfer(&user.owner.pubkey(), &vault, 100),
        instructions[1].clone(),
    ];
    let result = send_instructions(&mut client.env.context, &wrong_kind, &[&user.owner]).await;
    assert_vault_error(result, VaultError::InvalidTransferRecord);

    assert_eq!(client.asset_balance(&user).await.unwrap(), 200);
}

#[tokio::test]
async fn test_method_sequence() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();

    let calls = parse_sequence("mint(1000) burn(2000) mint(101) burn(202)").unwrap();
    let outputs = run_sequence(&mut client, &user, &calls).await.unwrap();

    let values: Vec<u64> = outputs.iter().map(|(_, output)| *output).collect();
    assert_eq!(values, vec![2000, 1000, 202, 101]);
}

#[tokio::test]
async fn test_method_sequence_rejects_zero_output() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();

    let calls = parse_sequence("mint(10) burn(1)").unwrap();
    let err = run_sequence(&mut client, &user, &calls).await.unwrap_err();
    assert!(matches!(err, HarnessError::ZeroOutput(ref call) if call == "burn(1)"));
}

#[tokio::test]
async fn test_round_trip_property() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();

    let config = PropertyConfig {
        cases: 5,
        min_amount: 10,
        max_amount: 1_000_000,
        seed: Some(7),
    };
    let report = run_round_trips(&mut client, &user, &config).await.unwrap();

    assert_eq!(report.seed, 7);
    assert_eq!(report.cases.len(), 5);
    for case in &report.cases {
        assert_eq!(case.minted, case.paid * 2);
        assert_eq!(case.refunded, case.paid);
    }
}

#[tokio::test]
async fn test_mint_through_another_program_is_rejected() {
    let (mut env, vault, asset, user, relay_id) = setup_with_relay().await;
    let program_id = env.program_id;

    let instructions = relayed(
        &relay_id,
        mint_instructions(
            &program_id,
            &vault.vault,
            &asset,
            &user.owner.pubkey(),
            &user.asset_account,
            100,
            &vault.vault,
        ),
    );

    let vault_lamports = get_lamports(&mut env.context, &vault.vault).await.unwrap();
    let result = send_instructions(&mut env.context, &instructions, &[&user.owner]).await;
    assert_vault_error(result, VaultError::NotTopLevelInstruction);

    assert_eq!(
        get_token_balance(&mut env.context, &user.asset_account).await.unwrap(),
        0
    );
    assert_eq!(
        get_token_balance(&mut env.context, &asset.reserve).await.unwrap(),
        ASSET_TOTAL
    );
    assert_eq!(
        get_lamports(&mut env.context, &vault.vault).await.unwrap(),
        vault_lamports
    );
}

#[tokio::test]
async fn test_burn_through_another_program_is_rejected() {
    let (mut env, vault, asset, user, relay_id) = setup_with_relay().await;
    let program_id = env.program_id;
    let sender = user.owner.pubkey();

    let mint_ixs = mint_instructions(
        &program_id,
        &vault.vault,
        &asset,
        &sender,
        &user.asset_account,
        100,
        &vault.vault,
    );
    send_instructions(&mut env.context, &mint_ixs, &[&user.owner])
        .await
        .unwrap();

    let instructions = relayed(
        &relay_id,
        burn_instructions(
            &program_id,
            &vault.vault,
            &asset,
            &sender,
            &user.asset_account,
            200,
            &asset.reserve,
        )
        .unwrap(),
    );

    let vault_lamports = get_lamports(&mut env.context, &vault.vault).await.unwrap();
    let user_lamports = get_lamports(&mut env.context, &sender).await.unwrap();
    let result = send_instructions(&mut env.context, &instructions, &[&user.owner]).await;
    assert_vault_error(result, VaultError::NotTopLevelInstruction);

    assert_eq!(
        get_token_balance(&mut env.context, &user.asset_account).await.unwrap(),
        200
    );
    assert_eq!(
        get_lamports(&mut env.context, &vault.vault).await.unwrap(),
        vault_lamports
    );
    assert_eq!(
        get_lamports(&mut env.context, &sender).await.unwrap(),
        user_lamports
    );
}

#[tokio::test]
async fn test_one_funding_cannot_pay_for_two_mints() {
    let mut client = VaultClient::bootstrap(&FixtureConfig::default()).await.unwrap();
    let user = client.create_user().await.unwrap();
    let program_id = client.env.program_id;
    let vault = client.vault.vault;

    let mut instructions = mint_instructions(
        &program_id,
        &vault,
        &client.asset,
        &user.owner.pubkey(),
        &user.asset_account,
        100,
        &vault,
    );
    let second_mint = instructions[1].clone();
    instructions.push(second_mint);

    let result = send_instructions(&mut client.env.context, &instructions, &[&user.owner]).await;
    assert_vault_error(result, VaultError::InvalidTransferRecord);

    assert_eq!(client.asset_balance(&user).await.unwrap(), 0);
}
