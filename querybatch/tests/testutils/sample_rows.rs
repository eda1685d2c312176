//! Generated table data

use querybatch::{Cell, Row};

pub const NAMES: [&str; 8] = [
    "Aurelia", "borealis", "Cascadia", "delta", "Elysium", "aurelia", "Zenith", "",
];

/// Rows of `[number, text, bool]`, with occasional nulls and non-finite numbers
pub fn generate(rows: usize, seed: u64) -> Vec<Row> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..rows)
        .map(|_| {
            let number = match rng.u8(..20) {
                0 => Cell::Null,
                1 => Cell::Number(f64::NAN),
                2 => Cell::Number(f64::INFINITY),
                3 => Cell::Number(f64::NEG_INFINITY),
                _ => Cell::Number(rng.i32(-500..500) as f64 / 4.0),
            };
            let text = match rng.u8(..12) {
                0 => Cell::Null,
                _ => Cell::from(NAMES[rng.usize(..NAMES.len())]),
            };
            let flag = match rng.u8(..10) {
                0 => Cell::Null,
                _ => Cell::from(rng.bool()),
            };
            vec![number, text, flag]
        })
        .collect()
}

/// Distinct finite numbers in shuffled order
pub fn distinct_numbers(rows: usize, seed: u64) -> Vec<Row> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut values: Vec<i64> = (0..rows as i64).map(|i| i * 3 - 100).collect();
    rng.shuffle(&mut values);
    values.into_iter().map(|v| vec![Cell::from(v)]).collect()
}
