//! Property tests for the quoting invariants.

use proptest::prelude::*;

use steamm_sdk::quoter::{quote_deposit, quote_redeem, ConstantProduct, Reserves, SwapQuoter};
use steamm_sdk::{
    split_fee, Asset, BankState, CreatePoolParams, Decimal, EngineConfig, Error, FeeConfig,
    PoolState, QuoterKind,
};

fn fee_tier() -> impl Strategy<Value = u16> {
    prop::sample::select(vec![0u16, 1, 5, 10, 30, 100])
}

// ============================================================================
// Constant product
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn cpmm_swap_never_shrinks_k(
        reserve_a in 1u64..1_000_000_000_000,
        reserve_b in 1u64..1_000_000_000_000,
        swap_fee_bps in fee_tier(),
        amount_in in 1u64..1_000_000_000,
        a2b in any::<bool>(),
    ) {
        let reserves = Reserves { reserve_a, reserve_b, lp_supply: 1 };
        let fees = FeeConfig { swap_fee_bps, protocol_fee_bps: 0 };

        if let Ok(q) = ConstantProduct::default().quote_swap(&reserves, &fees, a2b, amount_in) {
            let k_before = reserve_a as u128 * reserve_b as u128;
            let k_after = q.new_reserve_in as u128 * q.new_reserve_out as u128;
            prop_assert!(k_after >= k_before);
            if swap_fee_bps > 0 {
                prop_assert!(k_after > k_before);
            }
            let (_, reserve_out) = reserves.directional(a2b);
            prop_assert!(q.amount_out < reserve_out);
        }
    }

    #[test]
    fn zero_input_is_always_empty_coins(
        reserve_a in 0u64..1_000_000_000_000,
        reserve_b in 0u64..1_000_000_000_000,
        swap_fee_bps in fee_tier(),
        offset in 0u64..1_000_000,
    ) {
        let reserves = Reserves { reserve_a, reserve_b, lp_supply: 1 };
        let fees = FeeConfig { swap_fee_bps, protocol_fee_bps: 0 };
        let err = ConstantProduct { offset }.quote_swap(&reserves, &fees, true, 0).unwrap_err();
        prop_assert_eq!(err.kind(), "EEmptyCoins");
    }
}

// ============================================================================
// Fees
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fee_split_is_exact(gross in any::<u64>(), protocol_fee_bps in 0u16..=10_000) {
        let (lp, protocol) = split_fee(gross, protocol_fee_bps).unwrap();
        prop_assert!(protocol <= gross);
        prop_assert_eq!(lp + protocol, gross);
    }
}

// ============================================================================
// Deposit / redeem
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn redeeming_a_deposit_never_returns_more(
        reserve_a in 1u64..1_000_000_000_000,
        reserve_b in 1u64..1_000_000_000_000,
        lp_supply in 1u64..1_000_000_000_000,
        max_a in 1u64..1_000_000_000_000,
        max_b in 1u64..1_000_000_000_000,
    ) {
        let before = Reserves { reserve_a, reserve_b, lp_supply };
        let dep = match quote_deposit(&before, max_a, max_b) {
            Ok(dep) => dep,
            Err(_) => return Ok(()),
        };
        prop_assert!(dep.deposit_a <= max_a);
        prop_assert!(dep.deposit_b <= max_b);

        let Some(new_supply) = lp_supply.checked_add(dep.lp_tokens_minted) else {
            return Ok(());
        };
        let after = Reserves {
            reserve_a: reserve_a + dep.deposit_a,
            reserve_b: reserve_b + dep.deposit_b,
            lp_supply: new_supply,
        };
        let red = quote_redeem(&after, dep.lp_tokens_minted).unwrap();
        prop_assert!(red.withdraw_a <= dep.deposit_a);
        prop_assert!(red.withdraw_b <= dep.deposit_b);
    }

    #[test]
    fn first_deposit_redeems_exactly(max_a in 1u64..1_000_000_000_000, max_b in 1u64..1_000_000_000_000) {
        let empty = Reserves { reserve_a: 0, reserve_b: 0, lp_supply: 0 };
        let dep = quote_deposit(&empty, max_a, max_b).unwrap();
        let seeded = Reserves { reserve_a: max_a, reserve_b: max_b, lp_supply: dep.lp_tokens_minted };
        let red = quote_redeem(&seeded, dep.lp_tokens_minted).unwrap();
        prop_assert_eq!((red.withdraw_a, red.withdraw_b), (max_a, max_b));
    }
}

// ============================================================================
// LP non-dilution
// ============================================================================

fn bank(id: &str) -> BankState {
    BankState::new(Asset::new(id, 0), Asset::new(format!("b{id}"), 0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Valued at the pre-swap spot price, a full redemption is worth at least
    /// as much after any swap as before it.
    #[test]
    fn swap_never_dilutes_lps(
        seed_a in 1_000u64..1_000_000_000,
        seed_b in 1_000u64..1_000_000_000,
        swap_fee_bps in prop::sample::select(vec![1u16, 5, 10, 30, 100]),
        protocol_fee_bps in 0u16..=10_000,
        amount_in in 1u64..100_000_000,
        a2b in any::<bool>(),
    ) {
        let config = EngineConfig::default();
        let mut pool = PoolState::create(
            CreatePoolParams {
                id: "p".into(),
                asset_a: "A".into(),
                asset_b: "B".into(),
                quoter: QuoterKind::ConstantProduct { offset: 0 },
                fee_config: FeeConfig::new(swap_fee_bps, protocol_fee_bps).unwrap(),
                lp_decimals: 9,
                lp_supply: 0,
            },
            &config,
        )
        .unwrap();
        let (mut a, mut b) = (bank("A"), bank("B"));
        let quoter = pool.reserve_ratio_quoter();
        pool.apply_deposit(&mut a, &mut b, &quoter, seed_a, seed_b, 0, &config).unwrap();

        let price_a = Decimal::from_integer(pool.reserve_b);
        let price_b = Decimal::from_integer(pool.reserve_a);
        let lp = pool.lp_supply;
        let before = pool.lp_valuation(&a, &b, lp, price_a, price_b).unwrap();

        if pool.apply_swap(&mut a, &mut b, &quoter, a2b, amount_in, 0, &config).is_ok() {
            let after = pool.lp_valuation(&a, &b, lp, price_a, price_b).unwrap();
            prop_assert!(after >= before, "diluted: {} < {}", after, before);
        }
    }
}

#[test]
fn exceeding_liquidity_is_resource_exhaustion() {
    let reserves = Reserves { reserve_a: 1_000, reserve_b: 1_000, lp_supply: 1 };
    let fees = FeeConfig { swap_fee_bps: 30, protocol_fee_bps: 0 };
    let err = ConstantProduct { offset: 1_000_000 }
        .quote_swap(&reserves, &fees, true, 2_000)
        .unwrap_err();
    assert!(matches!(err, Error::OutputExceedsLiquidity));
    assert_eq!(err.category(), steamm_sdk::ErrorCategory::ResourceExhaustion);
}
