use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price error - tick out of range")]
    TickOutOfRange,
    #[error("Price error - sqrtPrice out of range")]
    SqrtPriceOutOfRange,
    #[error("Price error - sqrtPrice is 0")]
    SqrtPriceIsZero,
    #[error("Price error - liquidity is 0")]
    LiquidityIsZero,
    #[error("Price error - requested amount exceeds virtual reserves")]
    InsufficientReserves,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool error - initial price out of bounds")]
    PriceOutOfBounds,
    #[error("Pool error - already initialized")]
    AlreadyInitialized,
    #[error("Pool error - not initialized")]
    NotInitialized,
    #[error("Pool error - locked")]
    Locked,
    #[error("Pool error - invalid tick range [{tick_lower}, {tick_upper}]")]
    InvalidRange { tick_lower: i32, tick_upper: i32 },
    #[error("Pool error - liquidity per tick exceeds the cap")]
    LiquidityOverflow,
    #[error("Pool error - insufficient position liquidity")]
    InsufficientLiquidity,
    #[error("Pool error - insufficient input amount")]
    InsufficientInputAmount,
    #[error("Pool error - observation older than the oldest retained")]
    ObservationNotAvailable,
    #[error("Pool error - no liquidity available")]
    ZeroLiquidity,
    #[error("Pool error - amount is 0")]
    ZeroAmount,
    #[error("Pool error - invalid sqrtPrice limit")]
    InvalidPriceLimit,
    #[error("Pool error - position has no liquidity to poke")]
    NoPosition,
    #[error("Pool error - tick {0} is not initialized")]
    TickNotInitialized(i32),
    #[error("Pool error - transfer of {amount} of token {token} failed")]
    TransferFailed { token: Address, amount: U256 },
    #[error("Pool error - invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] MathError),

    #[error(transparent)]
    PriceError(#[from] PriceError),

    #[error(transparent)]
    PoolError(#[from] PoolError),
}
