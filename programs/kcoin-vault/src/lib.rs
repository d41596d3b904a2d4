pub mod constants;
pub mod error;
pub mod exchange;
pub mod instructions;
pub mod state;
pub mod transfer_record;

use anchor_lang::prelude::*;

pub use constants::*;
pub use instructions::*;
pub use state::*;

declare_id!("7MugujJgEfD5pVNKQE95NU4bGo3azYH74WccsgXhpB6t");

#[program]
pub mod kcoin_vault {
    use super::*;

    pub fn create_vault(ctx: Context<CreateVault>) -> Result<()> {
        create_vault::handler(ctx)
    }

    pub fn init_asset(ctx: Context<InitAsset>) -> Result<Pubkey> {
        init_asset::handler(ctx)
    }

    pub fn mint(ctx: Context<MintKCoin>) -> Result<u64> {
        mint::handler(ctx)
    }

    pub fn burn(ctx: Context<BurnKCoin>) -> Result<u64> {
        burn::handler(ctx)
    }
}
