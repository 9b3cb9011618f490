use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::{task::JoinHandle, time};

/// Terminal countdown string once the deadline has passed.
pub const FINISHED: &str = "Auction finished";

/// Seconds since the Unix epoch.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Render the time remaining until `end_time`, or the terminal string.
pub fn time_left(now: u64, end_time: u64) -> String {
    if now >= end_time {
        return FINISHED.to_string();
    }
    format_remaining(end_time - now)
}

fn format_remaining(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}

/// A repeating one-second tick against a fixed deadline.
///
/// Dropping the handle aborts the task, so a subscription cannot leak its
/// timer past a proposal change or teardown. The task also exits on its own
/// after delivering the terminal tick.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Tick once per second until the deadline passes, handing `on_tick`
    /// the rendered remaining time. The final invocation carries the
    /// terminal string and `finished = true`; no further ticks follow.
    pub fn spawn<F>(end_time: u64, mut on_tick: F) -> Self
    where
        F: FnMut(String, bool) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(Duration::from_secs(1));
            // The interval's first tick completes immediately; consume it
            // so the countdown starts one full second after spawn.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let now = now_unix();
                if now >= end_time {
                    on_tick(FINISHED.to_string(), true);
                    break;
                }
                on_tick(format_remaining(end_time - now), false);
            }
        });

        Self { handle }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
