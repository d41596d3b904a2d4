//! Transfers that pay for a vault call.
//!
//! `mint` and `burn` do not move the caller's funds themselves. The caller
//! places the transfer immediately before the vault instruction in the same
//! transaction, and the vault reads it back through the instructions sysvar.
//! A failing vault instruction rolls the transfer back with it.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};
use anchor_lang::system_program;

use crate::error::VaultError;

/// `SystemInstruction::Transfer`, bincode-encoded as a little-endian u32.
const SYSTEM_TRANSFER_TAG: u32 = 2;
const TOKEN_TRANSFER_TAG: u8 = 3;
const TOKEN_TRANSFER_CHECKED_TAG: u8 = 12;

/// Lamport payment into the vault, the funding side of `mint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingTransfer {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
}

/// K Coin transfer into the reserve, the funding side of `burn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTransfer {
    pub source: Pubkey,
    /// Only present for `TransferChecked`
    pub mint: Option<Pubkey>,
    pub destination: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
}

/// Loads the instruction right before the one currently executing.
///
/// The current index names the top-level instruction, which a CPI shares
/// with every call it makes. The vault must therefore be that instruction's
/// program, or one transfer could pay for several calls.
pub fn preceding_instruction(instructions_sysvar: &AccountInfo) -> Result<Instruction> {
    let current = load_current_index_checked(instructions_sysvar)?;
    let executing = load_instruction_at_checked(usize::from(current), instructions_sysvar)?;
    require_keys_eq!(
        executing.program_id,
        crate::ID,
        VaultError::NotTopLevelInstruction
    );
    require!(current > 0, VaultError::MissingTransferRecord);
    Ok(load_instruction_at_checked(
        usize::from(current - 1),
        instructions_sysvar,
    )?)
}

impl FundingTransfer {
    pub fn parse(ix: &Instruction) -> Result<Self> {
        require_keys_eq!(
            ix.program_id,
            system_program::ID,
            VaultError::InvalidTransferRecord
        );
        require!(
            ix.data.len() == 12 && ix.accounts.len() >= 2,
            VaultError::InvalidTransferRecord
        );

        let tag = u32::from_le_bytes(read_array(&ix.data[0..4])?);
        require!(tag == SYSTEM_TRANSFER_TAG, VaultError::InvalidTransferRecord);

        Ok(Self {
            from: ix.accounts[0].pubkey,
            to: ix.accounts[1].pubkey,
            lamports: u64::from_le_bytes(read_array(&ix.data[4..12])?),
        })
    }
}

impl AssetTransfer {
    pub fn parse(ix: &Instruction, token_program: &Pubkey) -> Result<Self> {
        require_keys_eq!(
            ix.program_id,
            *token_program,
            VaultError::InvalidTransferRecord
        );

        match ix.data.first() {
            Some(&TOKEN_TRANSFER_TAG) => {
                require!(
                    ix.data.len() >= 9 && ix.accounts.len() >= 3,
                    VaultError::InvalidTransferRecord
                );
                Ok(Self {
                    source: ix.accounts[0].pubkey,
                    mint: None,
                    destination: ix.accounts[1].pubkey,
                    authority: ix.accounts[2].pubkey,
                    amount: u64::from_le_bytes(read_array(&ix.data[1..9])?),
                })
            }
            Some(&TOKEN_TRANSFER_CHECKED_TAG) => {
                require!(
                    ix.data.len() >= 10 && ix.accounts.len() >= 4,
                    VaultError::InvalidTransferRecord
                );
                Ok(Self {
                    source: ix.accounts[0].pubkey,
                    mint: Some(ix.accounts[1].pubkey),
                    destination: ix.accounts[2].pubkey,
                    authority: ix.accounts[3].pubkey,
                    amount: u64::from_le_bytes(read_array(&ix.data[1..9])?),
                })
            }
            _ => err!(VaultError::InvalidTransferRecord),
        }
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| error!(VaultError::InvalidTransferRecord))
}
