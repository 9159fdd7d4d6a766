//! Audio tempo factor decomposition.

/// Smallest factor a single `atempo` stage accepts.
pub const MIN_TEMPO_FACTOR: f64 = 0.5;
/// Largest factor a single `atempo` stage accepts.
pub const MAX_TEMPO_FACTOR: f64 = 2.0;

/// Split `speed` into factors within `[0.5, 2.0]` whose product is `speed`.
///
/// A speed that is not a finite positive number has no chain; the result
/// is empty.
///
/// ```
/// use reelsync_timeline::tempo::tempo_chain;
/// assert_eq!(tempo_chain(1.5), vec![1.5]);
/// assert_eq!(tempo_chain(4.0), vec![2.0, 2.0]);
/// assert_eq!(tempo_chain(0.25), vec![0.5, 0.5]);
/// ```
pub fn tempo_chain(speed: f64) -> Vec<f64> {
    let mut chain = Vec::new();
    if !speed.is_finite() || speed <= 0.0 {
        return chain;
    }
    let mut remaining = speed;
    while remaining > MAX_TEMPO_FACTOR {
        chain.push(MAX_TEMPO_FACTOR);
        remaining /= MAX_TEMPO_FACTOR;
    }
    while remaining < MIN_TEMPO_FACTOR {
        chain.push(MIN_TEMPO_FACTOR);
        remaining /= MIN_TEMPO_FACTOR;
    }
    chain.push(remaining);
    chain
}
