use kcoin_vault::exchange::{to_asset, to_base};
use kcoin_vault::{INITIAL_EXCHANGE_RATE, SCALING_FACTOR};
use proptest::prelude::*;

// ── Round trips at the vault's own rate ────────────────────────────────────────

proptest! {
    /// Property: a mint/burn round trip at 2.0 returns what was paid
    #[test]
    fn prop_initial_rate_round_trip_exact(base in 0u64..=(u64::MAX / 2)) {
        let asset = to_asset(base, INITIAL_EXCHANGE_RATE).unwrap();
        prop_assert_eq!(asset, base * 2);
        prop_assert_eq!(to_base(asset, INITIAL_EXCHANGE_RATE), Some(base));
    }

    /// Property: the harness default range 10..=1_000_000 stays within one unit
    #[test]
    fn prop_harness_range_within_one(base in 10u64..=1_000_000u64) {
        let asset = to_asset(base, INITIAL_EXCHANGE_RATE).unwrap();
        let back = to_base(asset, INITIAL_EXCHANGE_RATE).unwrap();
        prop_assert!(base.abs_diff(back) <= 1);
    }
}

// ── Round trips at arbitrary rates ─────────────────────────────────────────────

proptest! {
    /// Property: truncation never hands back more than was paid
    #[test]
    fn prop_round_trip_never_gains(
        base in 0u64..=u32::MAX as u64,
        rate in 1u64..=1_000_000u64,
    ) {
        let asset = to_asset(base, rate).unwrap();
        let back = to_base(asset, rate).unwrap();
        prop_assert!(back <= base);
    }

    /// Property: at rates of at least 1.0 the loss is bounded by one unit
    #[test]
    fn prop_round_trip_loses_at_most_one(
        base in 0u64..=u32::MAX as u64,
        rate in SCALING_FACTOR..=1_000_000u64,
    ) {
        let asset = to_asset(base, rate).unwrap();
        let back = to_base(asset, rate).unwrap();
        prop_assert!(base - back <= 1, "base={} asset={} back={}", base, asset, back);
    }

    /// Property: converting never panics on the full u64 range
    #[test]
    fn prop_no_panic_full_range(amount in any::<u64>(), rate in any::<u64>()) {
        let _ = to_asset(amount, rate);
        let _ = to_base(amount, rate);
    }

    /// Property: more lamports never issue fewer microK
    #[test]
    fn prop_to_asset_monotonic(
        a in 0u64..1_000_000_000u64,
        b in 0u64..1_000_000_000u64,
        rate in 1u64..=1_000_000u64,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(to_asset(lo, rate).unwrap() <= to_asset(hi, rate).unwrap());
    }
}

// ── Fixed scenarios ────────────────────────────────────────────────────────────

#[test]
fn test_lossy_rate_example() {
    // 1.5 microK per lamport: 3 lamports -> 4 microK -> 2 lamports
    let rate = 1500;
    let asset = to_asset(3, rate).unwrap();
    let back = to_base(asset, rate).unwrap();
    assert_eq!((asset, back), (4, 2));
    assert!(3 - back <= 1);
}
