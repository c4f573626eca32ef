//! Millisecond tick source
//!
//! The handshake layer measures elapsed time with wraparound-safe deltas,
//! so the tick counter must wrap at `u32::MAX` rather than saturate.

/// Free-running monotonic millisecond counter
pub trait Monotonic {
    /// Current tick in milliseconds
    ///
    /// Wraps at `u32::MAX`. On a typical Cortex-M this is the SysTick
    /// uptime counter; on a host it can be any monotonic clock truncated
    /// to 32 bits.
    fn now_ms(&self) -> u32;
}

// Allow a shared reference to a clock to be used as the node's clock.
// Handy for tests that keep the clock outside the node and advance it.
impl<T: Monotonic> Monotonic for &T {
    fn now_ms(&self) -> u32 {
        (*self).now_ms()
    }
}
