//! Bounded-wait output collection.
//!
//! The device gives no framing around the payload, so collection ends on
//! silence: every chunk pushes the idle deadline forward, and the first of
//! the idle deadline or the overall deadline to pass ends the loop. Reads
//! block on the channel with a deadline rather than sleeping and polling.

use std::fmt;
use std::time::Duration;

use log::{debug, trace};
use tokio::time::{Instant, timeout, timeout_at};

use super::buffer::OutputBuffer;
use crate::error::Result;
use crate::transport::ShellChannel;

/// Time limits for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Maximum gap with no new output before collection is complete.
    pub idle: Duration,

    /// Hard upper bound on total collection time.
    pub overall: Duration,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(2),
            overall: Duration::from_secs(30),
        }
    }
}

/// Why collection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No output arrived for the idle threshold.
    Idle,
    /// The overall budget ran out while output was still arriving.
    Deadline,
    /// The remote side closed the channel.
    Closed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Deadline => f.write_str("deadline"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Read from `channel` into `buffer` until idle, deadline or close.
pub async fn collect<C: ShellChannel>(
    channel: &mut C,
    buffer: &mut OutputBuffer,
    budget: Budget,
) -> Result<StopReason> {
    let deadline = Instant::now() + budget.overall;
    let mut idle_deadline = Instant::now() + budget.idle;

    loop {
        let wake = idle_deadline.min(deadline);
        match timeout_at(wake, channel.read()).await {
            Ok(Ok(Some(chunk))) => {
                trace!("collected {} bytes", chunk.len());
                buffer.extend(&chunk);
                idle_deadline = Instant::now() + budget.idle;
            }
            Ok(Ok(None)) => {
                debug!("channel closed after {} bytes", buffer.received());
                return Ok(StopReason::Closed);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                let reason = if Instant::now() >= deadline {
                    StopReason::Deadline
                } else {
                    StopReason::Idle
                };
                debug!(
                    "collection stopped ({}) after {} bytes",
                    reason,
                    buffer.received()
                );
                return Ok(reason);
            }
        }

        if Instant::now() >= deadline {
            return Ok(StopReason::Deadline);
        }
    }
}

/// Upper bound on bytes dropped by one [`drain_available`].
pub const DRAIN_LIMIT: usize = 9999;

/// Read and drop whatever output is available right now.
///
/// Returns the number of bytes discarded. Does not wait for more data and
/// stops once [`DRAIN_LIMIT`] bytes have been dropped.
pub async fn drain_available<C: ShellChannel>(channel: &mut C) -> Result<usize> {
    let mut discarded = 0;
    while discarded < DRAIN_LIMIT {
        let Ok(read) = timeout(Duration::ZERO, channel.read()).await else {
            break;
        };
        match read? {
            Some(chunk) => discarded += chunk.len(),
            None => break,
        }
    }
    if discarded >= DRAIN_LIMIT {
        debug!("drain stopped at limit after {} bytes", discarded);
    }
    Ok(discarded)
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::testing::{Script, ScriptedChannel};

    fn budget() -> Budget {
        Budget::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_threshold_ends_collection() {
        let mut channel = ScriptedChannel::new(
            Script::new()
                .chunk(Duration::from_millis(100), b"{\"a\":")
                .chunk(Duration::from_millis(500), b"1}\r\n")
                .chunk(Duration::from_millis(300), b"vyos@fw1# "),
        );
        let mut buffer = OutputBuffer::new();

        let start = Instant::now();
        let reason = assert_ok!(collect(&mut channel, &mut buffer, budget()).await);

        assert_eq!(reason, StopReason::Idle);
        assert_eq!(buffer.as_str_lossy(), "{\"a\":1}\r\nvyos@fw1# ");
        // last chunk at 900ms, then 2s of silence
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2900), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3100), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_budget_caps_chatty_channel() {
        let mut channel = ScriptedChannel::new(Script::new().repeat(Duration::from_secs(1), b"."));
        let mut buffer = OutputBuffer::new();

        let start = Instant::now();
        let reason = assert_ok!(collect(&mut channel, &mut buffer, budget()).await);

        assert_eq!(reason, StopReason::Deadline);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(31), "{:?}", elapsed);
        assert!(buffer.len() >= 29);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_ends_collection_early() {
        let mut channel = ScriptedChannel::new(
            Script::new()
                .chunk(Duration::from_millis(10), b"{}")
                .eof(),
        );
        let mut buffer = OutputBuffer::new();

        let start = Instant::now();
        let reason = assert_ok!(collect(&mut channel, &mut buffer, budget()).await);

        assert_eq!(reason, StopReason::Closed);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(buffer.as_slice(), b"{}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_channel_stops_at_idle() {
        let mut channel = ScriptedChannel::new(Script::new());
        let mut buffer = OutputBuffer::new();

        let reason = assert_ok!(collect(&mut channel, &mut buffer, budget()).await);

        assert_eq!(reason, StopReason::Idle);
        assert!(buffer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_propagates() {
        let mut channel = ScriptedChannel::new(Script::new().chunk(Duration::ZERO, b"x").fail());
        let mut buffer = OutputBuffer::new();

        assert_err!(collect(&mut channel, &mut buffer, budget()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_discards_only_available_output() {
        let mut channel = ScriptedChannel::new(
            Script::new()
                .chunk(Duration::ZERO, b"Welcome to VyOS\r\n")
                .chunk(Duration::ZERO, b"vyos@fw1:~$ ")
                .chunk(Duration::from_secs(1), b"later"),
        );

        let discarded = assert_ok!(drain_available(&mut channel).await);
        assert_eq!(discarded, 29);

        // the delayed chunk is still there for the collector
        let mut buffer = OutputBuffer::new();
        assert_ok!(collect(&mut channel, &mut buffer, budget()).await);
        assert_eq!(buffer.as_slice(), b"later");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_stops_on_endless_output() {
        let mut channel = ScriptedChannel::new(Script::new().repeat(Duration::ZERO, b"x"));

        let start = Instant::now();
        let discarded = assert_ok!(drain_available(&mut channel).await);

        assert_eq!(discarded, DRAIN_LIMIT);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
