use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Only the vault creator can initialize the asset")]
    Unauthorized,
    #[msg("Vault asset is already initialized")]
    AlreadyInitialized,
    #[msg("Vault asset is not initialized")]
    NotInitialized,
    #[msg("Transfer destination is not the vault account")]
    InvalidDestination,
    #[msg("Transfer amount must be greater than zero")]
    InvalidAmount,
    #[msg("No transfer precedes the vault instruction")]
    MissingTransferRecord,
    #[msg("Preceding instruction is not a matching transfer")]
    InvalidTransferRecord,
    #[msg("Asset does not match the vault's asset")]
    AssetMismatch,
    #[msg("Math operation overflow")]
    MathOverflow,
    #[msg("Vault cannot pay out without dropping below rent exemption")]
    InsufficientReserves,
    #[msg("Vault must be called directly by the transaction, not through another program")]
    NotTopLevelInstruction,
}
