//! Benchmark configuration and result output.

use clap::{value_parser, Arg, Command};
use csv::Writer;
use std::fs::{File, OpenOptions};

pub struct Config {
    pub max_threads: usize,
    pub ops: usize,
}

/// Parses the command line. Every argument has a default, so a bare
/// invocation runs the full sweep and writes `benchmark_results.txt`.
pub fn setup() -> (Config, Writer<File>) {
    let m = Command::new("list-bench")
        .about("Benchmarks the coarse-locked and lock-free sorted lists at varying thread counts")
        .arg(
            Arg::new("max threads")
                .short('t')
                .long("max-threads")
                .value_parser(value_parser!(usize))
                .help("Upper bound of the power-of-two thread sweep")
                .default_value("128"),
        )
        .arg(
            Arg::new("operations")
                .short('n')
                .long("ops")
                .value_parser(value_parser!(usize))
                .help("Operations per worker thread")
                .default_value("150"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Result file, one CSV record per (variant, workload, threads)")
                .default_value("benchmark_results.txt"),
        )
        .get_matches();

    let config = Config {
        max_threads: m.get_one::<usize>("max threads").copied().unwrap(),
        ops: m.get_one::<usize>("operations").copied().unwrap(),
    };

    let output_name = m.get_one::<String>("output").unwrap();
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(output_name)
        .unwrap();

    (config, Writer::from_writer(file))
}
