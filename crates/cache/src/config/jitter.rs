use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Spread a duration uniformly over `[base * 0.9, base * 1.1)`
///
/// A zero duration stays zero, so "not cacheable" survives jitter.
pub fn jitter(base: Duration) -> Duration {
    let nanos = base.as_nanos();
    let low = (nanos * 9).div_ceil(10);
    let high = (nanos * 11).div_ceil(10);
    if low >= high {
        return base;
    }

    let sampled = fastrand::u128(low..high);
    Duration::new(
        u64::try_from(sampled / NANOS_PER_SEC).unwrap_or(u64::MAX),
        (sampled % NANOS_PER_SEC) as u32,
    )
}
