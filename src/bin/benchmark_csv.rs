//! Benchmarking tool that outputs CSV data for plotting parse time vs input
//! length.
//!
//! Usage:
//!   cargo run --release --bin benchmark_csv
//!
//! Output:
//!   Creates results/earley_benchmark.csv with columns:
//!   stage, input_length, median_time_ns, mad_ns, iterations, success

use std::fs::{self, File};
use std::hint::black_box;
use std::io::Write;
use std::time::Instant;

use earley_chart::calc;
use earley_chart::earley;
use earley_chart::grammar::Grammar;
use earley_chart::parse_tree::build_parse_tree;

// ============================================================================
// Configuration
// ============================================================================

const OUTPUT_PATH: &str = "results/earley_benchmark.csv";

/// Input lengths to generate and measure
const INPUT_LENGTHS: &[usize] = &[8, 16, 32, 64, 128, 256, 512, 1024];

/// Number of warmup iterations before measuring
const WARMUP_ITERATIONS: u32 = 2;

/// Iterations per measurement
const ITERATIONS: u32 = 15;

const ITEM_CAPACITY: usize = 1 << 24;

// ============================================================================
// Measurement
// ============================================================================

#[derive(Clone)]
struct BenchmarkResult {
    stage: &'static str,
    input_length: usize,
    median_time_ns: f64,
    mad_ns: f64,
    iterations: u32,
    success: bool,
}

impl BenchmarkResult {
    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{:.2},{:.2},{},{}",
            self.stage,
            self.input_length,
            self.median_time_ns,
            self.mad_ns,
            self.iterations,
            self.success
        )
    }
}

fn median_of(mut times: Vec<f64>) -> f64 {
    times.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if times.len() % 2 == 0 {
        (times[times.len() / 2 - 1] + times[times.len() / 2]) / 2.0
    } else {
        times[times.len() / 2]
    }
}

/// Measure a closure, reporting median and MAD (median absolute deviation)
/// of the per-iteration wall time.
fn measure<F>(mut run: F) -> (f64, f64, u32)
where
    F: FnMut() -> bool,
{
    for _ in 0..WARMUP_ITERATIONS {
        black_box(run());
    }

    let mut times: Vec<f64> = Vec::new();
    for _ in 0..ITERATIONS {
        let start = Instant::now();
        black_box(run());
        times.push(start.elapsed().as_nanos() as f64);
    }

    let median = median_of(times.clone());
    let deviations: Vec<f64> = times.iter().map(|t| (t - median).abs()).collect();
    let mad = median_of(deviations);
    (median, mad, ITERATIONS)
}

// ============================================================================
// Input generation
// ============================================================================

/// Builds a valid expression of exactly `len` characters by alternating
/// digits and operators.
fn generate_input(len: usize) -> String {
    let operators = ['+', '*', '-', '/'];
    let mut input: String = (0..len)
        .map(|i| {
            if i % 2 == 0 {
                char::from_digit(((i / 2) % 9 + 1) as u32, 10).unwrap()
            } else {
                operators[(i / 2) % operators.len()]
            }
        })
        .collect();
    // An even length ends on an operator; make the tail a two-digit number.
    if len % 2 == 0 && len > 0 {
        input.pop();
        input.push('7');
    }
    input
}

// ============================================================================
// Main benchmark logic
// ============================================================================

fn main() -> std::io::Result<()> {
    println!("Earley benchmark");
    println!("{}", "=".repeat(60));

    fs::create_dir_all("results")?;
    let mut csv_file = File::create(OUTPUT_PATH)?;
    writeln!(
        csv_file,
        "stage,input_length,median_time_ns,mad_ns,iterations,success"
    )?;

    let rules = calc::rules();
    let grammar = Grammar::new(&rules);

    for &len in INPUT_LENGTHS {
        let input = generate_input(len);
        println!("\nInput length {}...", len);

        let (median, mad, iterations) = measure(|| {
            earley::parse(&grammar, calc::START, ITEM_CAPACITY, input.chars()).is_ok()
        });
        let recognize = BenchmarkResult {
            stage: "recognize",
            input_length: len,
            median_time_ns: median,
            mad_ns: mad,
            iterations,
            success: true,
        };
        println!("  recognize: {:.0}ns (mad {:.0}ns)", median, mad);
        writeln!(csv_file, "{}", recognize.to_csv_row())?;

        let mut tree_built = false;
        let (median, mad, iterations) = measure(|| {
            let Ok(state_sets) =
                earley::parse(&grammar, calc::START, ITEM_CAPACITY, input.chars())
            else {
                return false;
            };
            let Some(full_parse) =
                earley::find_full_parse(&rules, calc::START, &state_sets, input.len())
            else {
                return false;
            };
            tree_built = build_parse_tree(&grammar, &state_sets, full_parse).is_some();
            tree_built
        });
        let tree = BenchmarkResult {
            stage: "tree",
            input_length: len,
            median_time_ns: median,
            mad_ns: mad,
            iterations,
            success: tree_built,
        };
        println!("  tree:      {:.0}ns (mad {:.0}ns)", median, mad);
        writeln!(csv_file, "{}", tree.to_csv_row())?;
    }

    println!("\nResults written to {}", OUTPUT_PATH);
    Ok(())
}
