use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use gate_limit::CancelToken;
use gate_limit::GateConfig;
use gate_limit::GateError;
use gate_limit::SlidingWindowLimiter;
use more_asserts::assert_ge;
use more_asserts::assert_le;
use more_asserts::assert_lt;

// Admissions are sampled just after `acquire` returns, so shrink the window a
// little to absorb the gap between admission and sampling.
const JITTER: Duration = Duration::from_millis(10);

fn max_in_any_window(mut stamps: Vec<Instant>, window: Duration) -> usize {
    stamps.sort();
    let mut max = 0;
    let mut start = 0;
    for end in 0..stamps.len() {
        while stamps[end] - stamps[start] >= window {
            start += 1;
        }
        max = max.max(end - start + 1);
    }
    max
}

fn hammer(limiter: &SlidingWindowLimiter, threads: usize, calls: usize) -> Vec<Instant> {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let limiter = limiter.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..calls)
                    .map(|_| {
                        limiter.acquire();
                        Instant::now()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[test]
fn it_never_exceeds_the_limit_in_any_window() {
    let window = Duration::from_millis(100);
    let limiter = SlidingWindowLimiter::new(5, window).unwrap();

    let start = Instant::now();
    let stamps = hammer(&limiter, 8, 4);

    assert_eq!(stamps.len(), 32);
    assert_le!(max_in_any_window(stamps, window - JITTER), 5);
    // 32 admissions at 5 per window need at least 6 full windows
    assert_ge!(start.elapsed(), window * 6);
}

#[test]
fn it_releases_the_remainder_as_slots_free() {
    let window = Duration::from_millis(150);
    let limiter = SlidingWindowLimiter::new(2, window).unwrap();

    let start = Instant::now();
    let mut waits: Vec<Duration> = hammer(&limiter, 6, 1)
        .into_iter()
        .map(|stamp| stamp - start)
        .collect();
    waits.sort();

    // Two go straight through, the rest trail in pairs, one window apart
    assert_lt!(waits[1], window / 2);
    assert_ge!(waits[2], window - JITTER);
    assert_ge!(waits[4], window * 2 - JITTER);
}

#[test]
fn it_builds_from_config() {
    let config: GateConfig = GateConfig::per_second(2);
    let limiter = SlidingWindowLimiter::from_config(&config).unwrap();
    assert_eq!(limiter.limit(), 2);
    assert_eq!(limiter.window(), Duration::from_secs(1));

    assert_eq!(
        SlidingWindowLimiter::from_config(&GateConfig::per_second(0)).unwrap_err(),
        GateError::InvalidConfig("limit must be greater than zero")
    );
}

#[test]
fn one_token_cancels_waiters_on_several_limiters() {
    let first = SlidingWindowLimiter::new(1, Duration::from_secs(60)).unwrap();
    let second = SlidingWindowLimiter::new(1, Duration::from_secs(60)).unwrap();
    first.acquire();
    second.acquire();

    let token = CancelToken::new();
    let handles: Vec<_> = [first.clone(), second.clone(), first.clone()]
        .into_iter()
        .map(|limiter| {
            let token = token.clone();
            thread::spawn(move || limiter.acquire_cancellable(&token))
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    token.cancel();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Err(GateError::Cancelled));
    }
    assert_eq!(first.available(), 0);
    assert_eq!(second.available(), 0);
}

#[test]
fn a_cancelled_waiter_does_not_block_the_others() {
    let window = Duration::from_millis(100);
    let limiter = SlidingWindowLimiter::new(1, window).unwrap();
    limiter.acquire();

    let token = CancelToken::new();
    let cancelled = {
        let limiter = limiter.clone();
        let token = token.clone();
        thread::spawn(move || limiter.acquire_cancellable(&token))
    };
    let patient = {
        let limiter = limiter.clone();
        thread::spawn(move || limiter.acquire_timeout(Duration::from_secs(5)))
    };

    token.cancel();
    assert_eq!(cancelled.join().unwrap(), Err(GateError::Cancelled));
    assert_eq!(patient.join().unwrap(), Ok(()));
}

/// User plus system CPU time of the calling thread, in clock ticks.
#[cfg(target_os = "linux")]
fn thread_cpu_ticks() -> u64 {
    let stat = std::fs::read_to_string("/proc/thread-self/stat").unwrap();
    // The command name may contain spaces, so count fields after its ')'
    let (_, fields) = stat.rsplit_once(')').unwrap();
    let fields: Vec<&str> = fields.split_whitespace().collect();
    let utime: u64 = fields[11].parse().unwrap();
    let stime: u64 = fields[12].parse().unwrap();
    utime + stime
}

#[cfg(target_os = "linux")]
#[test]
fn a_blocked_caller_sleeps_instead_of_spinning() {
    let window = Duration::from_millis(500);
    let limiter = SlidingWindowLimiter::new(3, window).unwrap();
    for _ in 0..3 {
        limiter.acquire();
    }

    let before = thread_cpu_ticks();
    let start = Instant::now();
    limiter.acquire();
    let waited = start.elapsed();
    let spent = thread_cpu_ticks() - before;

    assert_ge!(waited, window - JITTER);
    // A spinning waiter would burn about 50 ticks (at 100Hz) over the window
    assert_le!(spent, 5);
}
