//! Environment abstraction for runtimes.
//!
//! Decouples simulation logic from system resources (time, randomness). The
//! production server uses real clocks and OS randomness; tests can substitute
//! a deterministic implementation.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only runtime code awaits this (worker tick boundaries). Pool and log
    /// operations never sleep.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Wall-clock time in seconds since the Unix epoch.
    ///
    /// Used to timestamp log events. Not monotonic.
    fn wall_clock_secs(&self) -> u64;

    /// Generates a random `u64`.
    ///
    /// Used for run identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
