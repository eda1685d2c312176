/// Benchmark for table sort throughput
///
/// Compares the comparator path with the keyed path on generated tables and
/// measures the repeated-sort and partial re-sort short cuts.
use querybatch::{sort, Cell, ColumnConfig, Row, SortDirective, SortOptions};
use std::time::Instant;

const NAMES: [&str; 6] = ["Aurelia", "borealis", "Cascadia", "delta", "Elysium", "Zenith"];

fn generate(rows: usize) -> Vec<Row> {
    let mut rng = fastrand::Rng::with_seed(1);
    (0..rows)
        .map(|_| {
            let number = if rng.u8(..50) == 0 {
                Cell::Null
            } else {
                Cell::Number(rng.f64() * 10_000.0)
            };
            vec![
                number,
                Cell::from(NAMES[rng.usize(..NAMES.len())]),
                Cell::from(rng.bool()),
            ]
        })
        .collect()
}

fn time_sort(label: &str, data: &[Row], directives: &[SortDirective], options: &SortOptions) {
    let columns = ColumnConfig::for_width(3);
    let iterations = 10;

    let start = Instant::now();
    for _ in 0..iterations {
        let outcome = sort(data, directives, &columns, options);
        assert!(outcome.is_some());
    }
    let elapsed = start.elapsed();
    let rows_per_sec = (data.len() * iterations) as f64 / elapsed.as_secs_f64();

    println!("  {}", label);
    println!("    Time per sort: {:?}", elapsed / iterations as u32);
    println!("    Throughput: {:.0} rows/sec", rows_per_sec);
}

fn main() {
    println!("=== Table Sort Throughput Benchmark ===\n");

    let directives = [SortDirective::asc(1), SortDirective::desc(0)];
    let comparator = SortOptions {
        keyed_threshold: usize::MAX,
        ..SortOptions::default()
    };
    let keyed = SortOptions {
        keyed_threshold: 0,
        ..SortOptions::default()
    };

    for rows in [1_000, 10_000, 100_000] {
        let data = generate(rows);
        println!("📊 {} rows, 2 keys:", rows);
        time_sort("Comparator path", &data, &directives, &comparator);
        time_sort("Keyed path", &data, &directives, &keyed);
        println!();
    }

    // Repeated and extended sorts reuse recorded metadata
    println!("📊 Metadata short cuts (100000 rows):");
    let data = generate(100_000);
    let columns = ColumnConfig::for_width(3);
    let options = SortOptions::default();
    let Some(first) = sort(&data, &[SortDirective::asc(1)], &columns, &options) else {
        return;
    };

    let start = Instant::now();
    let repeated = sort(&first.data, &[SortDirective::asc(1)], &first.columns, &options);
    println!("  Repeated sort: {:?} (re-sorted: {})", start.elapsed(), repeated.is_some());

    let start = Instant::now();
    let refined = sort(&first.data, &directives, &first.columns, &options);
    println!("  Partial re-sort: {:?} (re-sorted: {})", start.elapsed(), refined.is_some());
    println!();
}
