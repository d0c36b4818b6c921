//! Benchmark driver: sweeps thread counts over the three list variants
//! and two workloads, appending one CSV record per run.

use std::fs::File;
use std::time::{Duration, Instant};

use crossbeam_utils::thread::scope;
use csv::Writer;

use list_bench::coarse::CoarseList;
use list_bench::concurrent_set::ConcurrentSet;
use list_bench::config::{setup, Config};
use list_bench::hp::HpList;
use list_bench::no_reclaim::NoReclaimList;

fn main() {
    let (config, mut output) = setup();

    bench_variant::<HpList<i32>>("LockFreeList", 3, &config, &mut output);
    bench_variant::<CoarseList<i32>>("CoarseGrainList", 5, &config, &mut output);
    bench_variant::<NoReclaimList<i32>>("LockFreeListNoReclaim", 3, &config, &mut output);
}

fn bench_variant<S: ConcurrentSet<i32> + Send + Sync>(
    variant: &str,
    remove_attempts: u32,
    config: &Config,
    output: &mut Writer<File>,
) {
    println!("Benchmarking {variant} insert only");
    let mut threads = 1;
    while threads <= config.max_threads {
        let elapsed = bench_insert_only::<S>(threads, config.ops);
        log_result(output, variant, "insert", threads, elapsed);
        threads *= 2;
    }

    println!("Benchmarking {variant} mixed");
    let mut threads = 1;
    while threads <= config.max_threads {
        let elapsed = bench_mixed::<S>(threads, config.ops, remove_attempts);
        log_result(output, variant, "mixed", threads, elapsed);
        threads *= 2;
    }
}

/// Worker `i` inserts the keys `i..ops`; the ranges overlap on purpose so
/// most inserts past the first contend on duplicates.
fn bench_insert_only<S: ConcurrentSet<i32> + Send + Sync>(threads: usize, ops: usize) -> u128 {
    let set = S::new();
    let set = &set;

    let start = Instant::now();
    scope(|s| {
        for i in 0..threads {
            s.spawn(move |_| {
                let mut handle = set.register();
                for key in i..ops {
                    set.insert(&mut handle, key as i32);
                }
            });
        }
    })
    .unwrap();
    start.elapsed().as_millis()
}

/// Worker `i` alternates inserting even offsets into its own key stripe
/// with removing the key it inserted one step earlier, backing off
/// exponentially when the remove loses a race.
fn bench_mixed<S: ConcurrentSet<i32> + Send + Sync>(
    threads: usize,
    ops: usize,
    remove_attempts: u32,
) -> u128 {
    let set = S::new();
    let set = &set;

    let start = Instant::now();
    scope(|s| {
        for i in 0..threads {
            s.spawn(move |_| {
                let mut handle = set.register();
                let base = (i * ops) as i32;
                for step in 0..ops as i32 {
                    if step % 2 == 0 {
                        set.insert(&mut handle, base + step);
                    } else {
                        for attempt in 0..remove_attempts {
                            if set.remove(&mut handle, &(base + step - 1)) {
                                break;
                            }
                            std::thread::sleep(Duration::from_millis(1 << attempt));
                        }
                    }
                }
            });
        }
    })
    .unwrap();
    start.elapsed().as_millis()
}

fn log_result(
    output: &mut Writer<File>,
    variant: &str,
    workload: &str,
    threads: usize,
    elapsed_ms: u128,
) {
    output
        .write_record([
            format!("{variant}_{workload}"),
            threads.to_string(),
            elapsed_ms.to_string(),
        ])
        .unwrap();
    output.flush().unwrap();
    println!("Threads: {threads} | Time: {elapsed_ms} ms");
}
