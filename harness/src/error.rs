use solana_program_test::BanksClientError;
use solana_sdk::instruction::InstructionError;
use solana_sdk::program_error::ProgramError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("banks client error: {0}")]
    Banks(#[from] BanksClientError),

    #[error("transaction failed: {0}")]
    Transaction(#[from] TransactionError),

    #[error("program error: {0}")]
    Program(#[from] ProgramError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("account {0} holds unexpected data")]
    InvalidAccountData(Pubkey),

    #[error("{0} returned no value")]
    MissingReturnData(&'static str),

    #[error("invalid method call `{0}`, expected mint(<amount>) or burn(<amount>)")]
    InvalidMethod(String),

    #[error("{0} returned zero")]
    ZeroOutput(String),

    #[error("round trip of {paid} lamports returned {returned}")]
    RoundTripLoss { paid: u64, returned: u64 },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

impl HarnessError {
    /// Custom program error code carried by a failed transaction, if any.
    pub fn custom_code(&self) -> Option<u32> {
        let tx_error = match self {
            HarnessError::Transaction(err) => err,
            HarnessError::Banks(BanksClientError::TransactionError(err)) => err,
            HarnessError::Banks(BanksClientError::SimulationError { err, .. }) => err,
            _ => return None,
        };
        match tx_error {
            TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
            _ => None,
        }
    }
}
