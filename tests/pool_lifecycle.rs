mod common;

use clmm_pool_engine::{
    error::{Error, PoolError},
    math::tick_math::{max_usable_tick, min_usable_tick},
    pool::{
        AssetLedger, Clock, InMemoryLedger, ManualClock, MintCallback, PoolEvent, SwapCallback,
        SwapParams, SystemClock,
    },
    Address, ClPool, PoolConfig, I256, U256,
};
use common::*;

const FEE: u32 = 3000;
const SPACING: i32 = 60;

fn total_supply(pool: &TestPool, token: Address) -> U256 {
    [ALICE, BOB, CAROL, POOL]
        .into_iter()
        .map(|owner| balance(pool, token, owner))
        .fold(U256::ZERO, |acc, value| acc + value)
}

fn swap_exact_in(pool: &mut TestPool, trader: Address, zero_for_one: bool, amount: u128) -> I256 {
    let params = SwapParams::exact_in(zero_for_one, U256::from(amount)).unwrap();
    let result = pool
        .swap(trader, params, &mut Payer::new(trader), &[])
        .unwrap();
    if zero_for_one {
        result.amount1_delta
    } else {
        result.amount0_delta
    }
}

#[test]
fn liquidity_round_trip_conserves_tokens() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    let supply0 = total_supply(&pool, TOKEN0);
    let supply1 = total_supply(&pool, TOKEN1);
    let (min, max) = (min_usable_tick(SPACING), max_usable_tick(SPACING));

    pool.mint(ALICE, min, max, e18(10), &mut Payer::new(ALICE), &[])
        .unwrap();
    pool.mint(BOB, -600, 600, e18(5), &mut Payer::new(BOB), &[])
        .unwrap();

    for round in 0..6u32 {
        pool.clock_mut().advance(15);
        let out = swap_exact_in(&mut pool, CAROL, round % 2 == 0, e18(1) / 3);
        assert!(out.is_negative());
    }

    for (owner, lower, upper, amount) in [(ALICE, min, max, e18(10)), (BOB, -600, 600, e18(5))] {
        pool.burn(owner, lower, upper, amount).unwrap();
        let (collected0, collected1) = pool
            .collect(owner, owner, lower, upper, u128::MAX, u128::MAX)
            .unwrap();
        assert!(collected0 > 0 && collected1 > 0);
        let position = pool.position(owner, lower, upper);
        assert_eq!(position.liquidity, 0);
        assert_eq!((position.tokens_owed0, position.tokens_owed1), (0, 0));
    }

    assert_eq!(pool.liquidity(), 0);
    assert!(pool.ticks().is_empty());
    assert_eq!(total_supply(&pool, TOKEN0), supply0);
    assert_eq!(total_supply(&pool, TOKEN1), supply1);
    // only rounding dust stays behind
    assert!(pool.balance0() < U256::from(1000u32));
    assert!(pool.balance1() < U256::from(1000u32));
}

#[test]
fn committed_operations_emit_tagged_events() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    pool.mint(ALICE, -120, 120, e18(1), &mut Payer::new(ALICE), &[])
        .unwrap();
    swap_exact_in(&mut pool, BOB, true, 1_000_000);

    let events = pool.take_events();
    assert!(matches!(events[0], PoolEvent::Initialize { tick: 0, .. }));
    assert!(matches!(events[1], PoolEvent::Mint { owner: ALICE, .. }));
    assert!(matches!(events[2], PoolEvent::Swap { recipient: BOB, .. }));
    assert!(pool.take_events().is_empty());

    let json = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(json["event"], "mint");
    assert_eq!(json["tick_lower"], -120);
    assert_eq!(json["tick_upper"], 120);
    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["event"], "initialize");
}

#[test]
fn time_weighted_tick_over_a_grown_ring_buffer() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    let (min, max) = (min_usable_tick(SPACING), max_usable_tick(SPACING));
    pool.mint(ALICE, min, max, e18(100), &mut Payer::new(ALICE), &[])
        .unwrap();
    pool.increase_observation_cardinality_next(10).unwrap();

    let mut expected: i64 = 0;
    for zero_for_one in [true, true, false] {
        pool.clock_mut().advance(10);
        expected += i64::from(pool.slot0().tick) * 10;
        swap_exact_in(&mut pool, CAROL, zero_for_one, e18(2));
    }
    pool.clock_mut().advance(10);
    expected += i64::from(pool.slot0().tick) * 10;

    let (ticks, seconds_per_liquidity) = pool.observe(&[40, 0]).unwrap();
    assert_eq!(ticks[0], 0);
    assert_eq!(ticks[1] - ticks[0], expected);
    assert!(seconds_per_liquidity[1] > seconds_per_liquidity[0]);

    let slot0 = pool.slot0();
    assert_eq!(slot0.observation_cardinality, 10);
    assert_eq!(slot0.observation_index, 3);

    assert_eq!(
        pool.observe(&[41]),
        Err(Error::PoolError(PoolError::ObservationNotAvailable))
    );
}

/// Pays in full and then fails anyway.
struct Reneger;

impl Reneger {
    fn refuse() -> Error {
        PoolError::TransferFailed {
            token: Address::ZERO,
            amount: U256::ZERO,
        }
        .into()
    }
}

impl<L: AssetLedger, C: Clock> MintCallback<L, C> for Reneger {
    fn mint_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        Payer::new(ALICE).mint_callback(pool, amount0_owed, amount1_owed, data)?;
        Err(Self::refuse())
    }
}

impl<L: AssetLedger, C: Clock> SwapCallback<L, C> for Reneger {
    fn swap_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &[u8],
    ) -> Result<(), Error> {
        Payer::new(ALICE).swap_callback(pool, amount0_delta, amount1_delta, data)?;
        Err(Self::refuse())
    }
}

#[test]
fn callback_failure_reverts_every_effect() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    pool.mint(BOB, -600, 600, e18(3), &mut Payer::new(BOB), &[])
        .unwrap();
    pool.take_events();
    pool.clock_mut().advance(30);

    let slot0 = pool.slot0();
    let liquidity = pool.liquidity();
    let alice = (balance(&pool, TOKEN0, ALICE), balance(&pool, TOKEN1, ALICE));
    let reserves = (pool.balance0(), pool.balance1());
    let observation = pool.observation(slot0.observation_index);

    assert_eq!(
        pool.mint(ALICE, -1200, 1200, e18(1), &mut Reneger, &[]),
        Err(Reneger::refuse())
    );
    let params = SwapParams::exact_in(true, U256::from(e18(1))).unwrap();
    assert_eq!(
        pool.swap(ALICE, params, &mut Reneger, &[]),
        Err(Reneger::refuse())
    );

    assert_eq!(pool.slot0(), slot0);
    assert_eq!(pool.observation(slot0.observation_index), observation);
    assert_eq!(pool.liquidity(), liquidity);
    assert_eq!(pool.fee_growth_global0_x128(), U256::ZERO);
    assert_eq!(
        (balance(&pool, TOKEN0, ALICE), balance(&pool, TOKEN1, ALICE)),
        alice
    );
    assert_eq!((pool.balance0(), pool.balance1()), reserves);
    assert_eq!(pool.position(ALICE, -1200, 1200).liquidity, 0);
    assert!(!pool.ticks().is_initialized(-1200));
    assert!(pool.take_events().is_empty());
    assert!(pool.slot0().unlocked);
}

#[test]
fn flash_fees_are_shared_pro_rata() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    let (min, max) = (min_usable_tick(SPACING), max_usable_tick(SPACING));
    pool.mint(ALICE, min, max, e18(1), &mut Payer::new(ALICE), &[])
        .unwrap();
    pool.mint(BOB, min, max, e18(3), &mut Payer::new(BOB), &[])
        .unwrap();

    let borrowed = U256::from(e18(1));
    let fee = U256::from(e18(1) * 3 / 1000);
    let mut payer = Payer::new(CAROL);
    payer.repay = (borrowed + fee, U256::ZERO);
    let result = pool
        .flash(CAROL, borrowed, U256::ZERO, &mut payer, &[])
        .unwrap();
    assert_eq!(result.paid0, fee);
    assert_eq!(result.paid1, U256::ZERO);

    let mut fees = Vec::new();
    for owner in [ALICE, BOB] {
        pool.burn(owner, min, max, 0).unwrap();
        let (fee0, fee1) = pool
            .collect(owner, owner, min, max, u128::MAX, u128::MAX)
            .unwrap();
        assert_eq!(fee1, 0);
        fees.push(fee0);
    }
    let (alice, bob) = (fees[0], fees[1]);
    let total = e18(1) * 3 / 1000;
    assert!(alice + bob <= total && total - (alice + bob) <= 2);
    assert!(bob.abs_diff(alice * 3) <= 3);
}

#[test]
fn exact_output_stops_at_the_price_limit() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    pool.mint(ALICE, -60, 60, e18(1), &mut Payer::new(ALICE), &[])
        .unwrap();

    let limit = clmm_pool_engine::math::tick_math::sqrt_price_at_tick(-30).unwrap();
    let requested = U256::from(e18(1));
    let params = SwapParams {
        sqrt_price_limit_x96: limit,
        ..SwapParams::exact_out(true, requested).unwrap()
    };
    let result = pool
        .swap(CAROL, params, &mut Payer::new(CAROL), &[])
        .unwrap();

    assert_eq!(pool.slot0().sqrt_price_x96, limit);
    assert_eq!(pool.slot0().tick, -30);
    assert!(result.amount1_delta.is_negative());
    assert!(result.amount1_delta.unsigned_abs() < requested);
    assert!(result.amount0_delta.is_positive());
}

#[test]
fn positions_of_different_owners_are_independent() {
    let mut pool = funded_pool(FEE, SPACING, encode_price_sqrt(1, 1));
    pool.mint(ALICE, -120, 120, 1_000, &mut Payer::new(ALICE), &[])
        .unwrap();
    pool.mint(BOB, -120, 120, 3_000, &mut Payer::new(BOB), &[])
        .unwrap();
    assert_eq!(pool.tick(-120).liquidity_gross, 4_000);

    assert_eq!(
        pool.burn(ALICE, -120, 120, 1_001),
        Err(Error::PoolError(PoolError::InsufficientLiquidity))
    );
    pool.burn(ALICE, -120, 120, 1_000).unwrap();
    assert_eq!(pool.position(BOB, -120, 120).liquidity, 3_000);
    assert_eq!(pool.tick(120).liquidity_net, -3_000);

    // collecting on someone else's behalf moves nothing
    assert_eq!(
        pool.collect(CAROL, CAROL, -120, 120, u128::MAX, u128::MAX)
            .unwrap(),
        (0, 0)
    );
}

#[test]
fn pool_runs_on_the_system_clock() {
    init_test_tracing();
    let config = PoolConfig::new(POOL, TOKEN0, TOKEN1, 500, 10).unwrap();
    let mut pool = ClPool::new(config, InMemoryLedger::new(), SystemClock).unwrap();
    pool.initialize(encode_price_sqrt(4, 1)).unwrap();

    let first = pool.observation(0);
    assert!(first.initialized);
    assert!(first.block_timestamp <= pool.clock().now());
    assert_eq!(pool.slot0().tick, 13863);
}

#[test]
fn rejects_invalid_configs() {
    let cases = [
        PoolConfig::new(POOL, TOKEN0, TOKEN0, FEE, SPACING),
        PoolConfig::new(POOL, Address::ZERO, TOKEN1, FEE, SPACING),
        PoolConfig::new(POOL, TOKEN0, TOKEN1, 1_000_000, SPACING),
        PoolConfig::new(POOL, TOKEN0, TOKEN1, FEE, 0),
        PoolConfig::new(POOL, TOKEN0, TOKEN1, FEE, 16_384),
    ];
    for case in cases {
        assert!(matches!(case, Err(PoolError::InvalidConfig(_))));
    }

    let config = PoolConfig::new(POOL, TOKEN1, TOKEN0, FEE, SPACING).unwrap();
    assert_eq!((config.token0, config.token1), (TOKEN0, TOKEN1));
    let pool: Result<ClPool<InMemoryLedger, ManualClock>, _> =
        ClPool::new(config, InMemoryLedger::new(), ManualClock::new(START_TIME));
    assert!(pool.is_ok());
}
