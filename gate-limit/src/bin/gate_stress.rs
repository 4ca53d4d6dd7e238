use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use clap::Parser;
use gate_limit::GateError;
use gate_limit::SlidingWindowLimiter;
use hdrhistogram::Histogram;
use tracing_subscriber::EnvFilter;

/// Hammer one blocking limiter from many threads and check the window bound.
#[derive(Debug, Parser)]
struct Args {
    /// Admissions allowed per window
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// Window length, e.g. "1s" or "250ms"
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    window: Duration,

    /// Concurrent callers
    #[arg(long, default_value_t = 16)]
    threads: usize,

    /// Acquisitions per caller
    #[arg(long, default_value_t = 25)]
    calls: usize,

    /// Tolerated gap between admission and sampling when checking the bound
    #[arg(long, default_value = "2ms", value_parser = humantime::parse_duration)]
    jitter: Duration,
}

#[derive(Debug)]
struct Report {
    waits: Vec<Duration>,
    admitted_at: Vec<Instant>,
}

fn run_load_test(limiter: &SlidingWindowLimiter, threads: usize, calls: usize) -> Report {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let limiter = limiter.clone();
            let bar = Arc::clone(&barrier);
            thread::spawn(move || {
                bar.wait(); // Wait for the start signal
                let mut report = Report {
                    waits: Vec::with_capacity(calls),
                    admitted_at: Vec::with_capacity(calls),
                };
                for _ in 0..calls {
                    let asked = Instant::now();
                    limiter.acquire();
                    let admitted = Instant::now();
                    report.waits.push(admitted - asked);
                    report.admitted_at.push(admitted);
                }
                report
            })
        })
        .collect();

    let mut merged = Report {
        waits: Vec::with_capacity(threads * calls),
        admitted_at: Vec::with_capacity(threads * calls),
    };
    for handle in handles {
        match handle.join() {
            Ok(report) => {
                merged.waits.extend(report.waits);
                merged.admitted_at.extend(report.admitted_at);
            }
            Err(_) => tracing::error!("caller thread panicked"),
        }
    }
    merged
}

/// Largest number of admissions observed inside any window of length `window`.
fn busiest_window(mut stamps: Vec<Instant>, window: Duration) -> usize {
    stamps.sort();
    let mut busiest = 0;
    let mut start = 0;
    for end in 0..stamps.len() {
        while stamps[end] - stamps[start] >= window {
            start += 1;
        }
        busiest = busiest.max(end - start + 1);
    }
    busiest
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if args.threads == 0 {
        return Err(GateError::InvalidConfig("threads must be greater than zero").into());
    }
    let limiter = SlidingWindowLimiter::new(args.limit, args.window)?;

    let start = Instant::now();
    let report = run_load_test(&limiter, args.threads, args.calls);
    let total_duration = start.elapsed();

    let mut hist_wait = Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3)?;
    for wait in &report.waits {
        hist_wait.record((wait.as_micros() as u64).max(1))?;
    }

    let total = report.admitted_at.len();
    let checked = args
        .window
        .saturating_sub(args.jitter)
        .max(Duration::from_nanos(1));
    let busiest = busiest_window(report.admitted_at, checked);

    println!("--- Sliding Window Gate ---");
    println!("Limit/Window:    {}/{:?}", args.limit, args.window);
    println!("Total Duration:  {:.2?}", total_duration);
    println!("Admitted:        {}", total);
    println!(
        "Rate:            {:.2} req/sec",
        total as f64 / total_duration.as_secs_f64()
    );
    println!("P50 (Wait):      {}µs", hist_wait.value_at_quantile(0.5));
    println!("P99 (Wait):      {}µs", hist_wait.value_at_quantile(0.99));
    println!("Max (Wait):      {}µs", hist_wait.max());
    println!("Busiest Window:  {}", busiest);

    if busiest > args.limit {
        tracing::error!(busiest, limit = args.limit, "window bound violated");
        std::process::exit(1);
    }
    Ok(())
}
