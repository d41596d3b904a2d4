//! Conversion between lamports and microK.
//!
//! Both directions truncate. `to_base(to_asset(x))` never exceeds `x`, and
//! for rates of at least [`SCALING_FACTOR`] it loses at most one lamport.

use crate::constants::SCALING_FACTOR;

/// microK issued for `base_amount` lamports: `base_amount * rate / SCALING_FACTOR`.
///
/// `None` when the product does not fit in a `u64`.
pub fn to_asset(base_amount: u64, exchange_rate: u64) -> Option<u64> {
    let asset = (base_amount as u128)
        .checked_mul(exchange_rate as u128)?
        .checked_div(SCALING_FACTOR as u128)?;
    u64::try_from(asset).ok()
}

/// Lamports refunded for `asset_amount` microK: `asset_amount * SCALING_FACTOR / rate`.
///
/// `None` for a zero rate or a result outside `u64`.
pub fn to_base(asset_amount: u64, exchange_rate: u64) -> Option<u64> {
    let base = (asset_amount as u128)
        .checked_mul(SCALING_FACTOR as u128)?
        .checked_div(exchange_rate as u128)?;
    u64::try_from(base).ok()
}


#[cfg(kani)]
mod verification {
    use super::*;

    #[kani::proof]
    fn verify_round_trip_never_gains() {
        let base: u64 = kani::any();
        let rate: u64 = kani::any();
        kani::assume(rate > 0);

        if let Some(asset) = to_asset(base, rate) {
            let back = to_base(asset, rate).unwrap();
            assert!(back <= base);
        }
    }

    #[kani::proof]
    fn verify_round_trip_loses_at_most_one() {
        let base: u64 = kani::any();
        let rate: u64 = kani::any();
        kani::assume(rate >= SCALING_FACTOR);

        if let Some(asset) = to_asset(base, rate) {
            let back = to_base(asset, rate).unwrap();
            assert!(base - back <= 1);
        }
    }
}
