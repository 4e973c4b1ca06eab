#![allow(dead_code)]

use clmm_pool_engine::{
    error::Error,
    math::{
        bit_math, math_helpers, sqrt_price_math, swap_math, tick_bitmap::TickBitmap, tick_math,
    },
    pool::{
        AssetLedger, Clock, InMemoryLedger, ManualClock, MintCallback, SwapCallback, SwapParams,
    },
    Address, ClPool, PoolConfig, I256, U256,
};
use criterion::{black_box, BatchSize, Criterion};

const TOKEN0: Address = Address::with_last_byte(0x10);
const TOKEN1: Address = Address::with_last_byte(0x20);
const POOL: Address = Address::with_last_byte(0xee);
const TRADER: Address = Address::with_last_byte(0xa1);

const TICKS: [i32; 6] = [-887_272, -200_000, -1, 0, 50_000, 887_271];

pub fn bench_tick_math(c: &mut Criterion) {
    let prices: Vec<U256> = TICKS
        .iter()
        .map(|&tick| tick_math::sqrt_price_at_tick(tick).unwrap())
        .collect();

    c.bench_function("tick_math/sqrt_price_at_tick", |b| {
        b.iter(|| {
            for &tick in &TICKS {
                black_box(tick_math::sqrt_price_at_tick(black_box(tick)).unwrap());
            }
        })
    });
    c.bench_function("tick_math/tick_at_sqrt_price", |b| {
        b.iter(|| {
            for &price in &prices {
                black_box(tick_math::tick_at_sqrt_price(black_box(price)).unwrap());
            }
        })
    });
}

pub fn bench_sqrt_price_math(c: &mut Criterion) {
    let price = tick_math::sqrt_price_at_tick(0).unwrap();
    let upper = tick_math::sqrt_price_at_tick(600).unwrap();
    let liquidity = 10u128.pow(21);
    let amount = U256::from(10u128.pow(18));

    c.bench_function("sqrt_price_math/next_from_input", |b| {
        b.iter(|| {
            black_box(
                sqrt_price_math::next_sqrt_price_from_input(
                    black_box(price),
                    liquidity,
                    amount,
                    true,
                )
                .unwrap(),
            )
        })
    });
    c.bench_function("sqrt_price_math/next_from_output", |b| {
        b.iter(|| {
            black_box(
                sqrt_price_math::next_sqrt_price_from_output(
                    black_box(price),
                    liquidity,
                    amount,
                    false,
                )
                .unwrap(),
            )
        })
    });
    c.bench_function("sqrt_price_math/amount_deltas", |b| {
        b.iter(|| {
            black_box(sqrt_price_math::amount_0_delta(price, upper, liquidity, true).unwrap());
            black_box(sqrt_price_math::amount_1_delta(price, upper, liquidity, false).unwrap());
        })
    });
}

pub fn bench_swap_math(c: &mut Criterion) {
    let current = tick_math::sqrt_price_at_tick(0).unwrap();
    let target = tick_math::sqrt_price_at_tick(-600).unwrap();
    let liquidity = 10u128.pow(21);
    let exact_in = I256::try_from(10i64.pow(18)).unwrap();

    c.bench_function("swap_math/compute_swap_step_exact_in", |b| {
        b.iter(|| {
            black_box(
                swap_math::compute_swap_step(current, target, liquidity, black_box(exact_in), 3000)
                    .unwrap(),
            )
        })
    });
    c.bench_function("swap_math/compute_swap_step_exact_out", |b| {
        b.iter(|| {
            black_box(
                swap_math::compute_swap_step(current, target, liquidity, black_box(-exact_in), 3000)
                    .unwrap(),
            )
        })
    });
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let a = U256::MAX >> 3usize;
    let b_value = U256::from(u128::MAX);
    let denominator = U256::MAX >> 5usize;

    c.bench_function("math_helpers/mul_div", |b| {
        b.iter(|| black_box(math_helpers::mul_div(black_box(a), b_value, denominator).unwrap()))
    });
    c.bench_function("math_helpers/mul_div_rounding_up", |b| {
        b.iter(|| {
            black_box(
                math_helpers::mul_div_rounding_up(black_box(a), b_value, denominator).unwrap(),
            )
        })
    });
}

pub fn bench_tick_bitmap(c: &mut Criterion) {
    let mut bitmap = TickBitmap::new();
    for tick in (-60_000..60_000).step_by(600) {
        bitmap.flip_tick(tick, 60).unwrap();
    }

    c.bench_function("tick_bitmap/next_initialized_lte", |b| {
        b.iter(|| {
            black_box(
                bitmap
                    .next_initialized_tick_within_one_word(black_box(1_234), 60, true)
                    .unwrap(),
            )
        })
    });
    c.bench_function("tick_bitmap/next_initialized_gt", |b| {
        b.iter(|| {
            black_box(
                bitmap
                    .next_initialized_tick_within_one_word(black_box(-1_234), 60, false)
                    .unwrap(),
            )
        })
    });
}

pub fn bench_bit_math(c: &mut Criterion) {
    let values = [U256::ONE, U256::from(u64::MAX), U256::MAX >> 7usize, U256::MAX];
    c.bench_function("bit_math/msb_lsb", |b| {
        b.iter(|| {
            for &value in &values {
                black_box(bit_math::most_significant_bit(black_box(value)).unwrap());
                black_box(bit_math::least_significant_bit(black_box(value)).unwrap());
            }
        })
    });
}

struct Payer;

impl Payer {
    fn pay<L: AssetLedger, C: Clock>(
        pool: &mut ClPool<L, C>,
        token: Address,
        amount: U256,
    ) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        let to = pool.config().pool_address;
        pool.ledger_mut().transfer(token, TRADER, to, amount)
    }
}

impl<L: AssetLedger, C: Clock> MintCallback<L, C> for Payer {
    fn mint_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_owed: U256,
        amount1_owed: U256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let (token0, token1) = (pool.config().token0, pool.config().token1);
        Self::pay(pool, token0, amount0_owed)?;
        Self::pay(pool, token1, amount1_owed)
    }
}

impl<L: AssetLedger, C: Clock> SwapCallback<L, C> for Payer {
    fn swap_callback(
        &mut self,
        pool: &mut ClPool<L, C>,
        amount0_delta: I256,
        amount1_delta: I256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let (token0, token1) = (pool.config().token0, pool.config().token1);
        if amount0_delta.is_positive() {
            Self::pay(pool, token0, amount0_delta.into_raw())?;
        }
        if amount1_delta.is_positive() {
            Self::pay(pool, token1, amount1_delta.into_raw())?;
        }
        Ok(())
    }
}

/// Pool at price 1 with a ladder of narrow positions every 10 spacings.
fn laddered_pool() -> ClPool<InMemoryLedger, ManualClock> {
    let config = PoolConfig::new(POOL, TOKEN0, TOKEN1, 3000, 60).unwrap();
    let mut ledger = InMemoryLedger::new();
    ledger.fund(TOKEN0, TRADER, U256::MAX >> 8usize);
    ledger.fund(TOKEN1, TRADER, U256::MAX >> 8usize);
    let mut pool = ClPool::new(config, ledger, ManualClock::new(1_000)).unwrap();
    pool.initialize(U256::ONE << 96usize).unwrap();
    pool.increase_observation_cardinality_next(64).unwrap();

    let liquidity = 10u128.pow(20);
    let (min, max) = (
        tick_math::min_usable_tick(60),
        tick_math::max_usable_tick(60),
    );
    pool.mint(TRADER, min, max, liquidity, &mut Payer, &[])
        .unwrap();
    for lower in (-6_000..6_000).step_by(600) {
        pool.mint(TRADER, lower, lower + 600, liquidity, &mut Payer, &[])
            .unwrap();
    }
    pool.take_events();
    pool
}

pub fn bench_pool_swap(c: &mut Criterion) {
    let pool = laddered_pool();
    let amount = U256::from(10u128.pow(21));

    c.bench_function("pool/swap_within_one_range", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| {
                let params = SwapParams::exact_in(true, U256::from(10u128.pow(15))).unwrap();
                black_box(pool.swap(TRADER, params, &mut Payer, &[]).unwrap())
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("pool/swap_crossing_ticks", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| {
                pool.clock_mut().advance(12);
                let params = SwapParams::exact_in(false, amount).unwrap();
                black_box(pool.swap(TRADER, params, &mut Payer, &[]).unwrap())
            },
            BatchSize::SmallInput,
        )
    });
}

pub fn bench_pool_liquidity(c: &mut Criterion) {
    let pool = laddered_pool();

    c.bench_function("pool/mint_burn_collect", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| {
                pool.mint(TRADER, -1_200, 1_200, 10u128.pow(18), &mut Payer, &[])
                    .unwrap();
                pool.burn(TRADER, -1_200, 1_200, 10u128.pow(18)).unwrap();
                black_box(
                    pool.collect(TRADER, TRADER, -1_200, 1_200, u128::MAX, u128::MAX)
                        .unwrap(),
                )
            },
            BatchSize::SmallInput,
        )
    });

    let mut aged = pool.clone();
    for zero_for_one in [true, false, true] {
        aged.clock_mut().advance(600);
        let params = SwapParams::exact_in(zero_for_one, U256::from(10u128.pow(19))).unwrap();
        aged.swap(TRADER, params, &mut Payer, &[]).unwrap();
    }
    c.bench_function("pool/observe", |b| {
        b.iter(|| black_box(aged.observe(black_box(&[0, 300, 900, 1_800])).unwrap()))
    });
}
