pub mod burn;
pub mod create_vault;
pub mod init_asset;
pub mod mint;

pub use burn::*;
pub use create_vault::*;
pub use init_asset::*;
pub use mint::*;
