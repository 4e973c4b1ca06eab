use criterion::{criterion_group, criterion_main};

mod common;

criterion_group!(
    fixed_point_benches,
    common::bench_bit_math,
    common::bench_math_helpers,
    common::bench_tick_math,
    common::bench_tick_bitmap,
);
criterion_main!(fixed_point_benches);
