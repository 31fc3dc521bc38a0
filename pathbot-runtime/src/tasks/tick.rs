//! Control tick
//!
//! Signals the mission task once per control period with the time since
//! start in milliseconds. The timestamp is a `u32` and wraps after about
//! 49.7 days of uptime; consumers only compare timestamps with
//! `wrapping_sub`.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Ticker};

use crate::channels::RobotChannels;

/// Millisecond timestamp for an uptime, wrapping at `u32::MAX`
pub fn timestamp_ms(elapsed: Duration) -> u32 {
    elapsed.as_millis() as u32
}

/// Tick task - signals the timestamp every `period_ms`
pub async fn tick_task<M: RawMutex>(channels: &RobotChannels<M>, period_ms: u32) {
    info!("Tick task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));
    let start = Instant::now();

    loop {
        ticker.next().await;

        channels.tick.signal(timestamp_ms(start.elapsed()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_wraps() {
        assert_eq!(timestamp_ms(Duration::from_millis(1500)), 1500);

        let wrap = u32::MAX as u64 + 1;
        let before = timestamp_ms(Duration::from_millis(wrap - 10));
        let after = timestamp_ms(Duration::from_millis(wrap + 20));
        assert_eq!(after, 20);
        assert_eq!(after.wrapping_sub(before), 30);
    }
}
