//! Periodic refresh scheduling.
//!
//! A [`RefreshTimer`] runs a tick callback every period until the returned
//! [`PendingRefresh`] is cancelled or dropped. The scheduler keeps at most one
//! pending refresh alive, so cancelling it is the only thing needed to stop
//! all future ticks.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Callback invoked on every refresh.
pub type RefreshTick = Arc<dyn Fn() + Send + Sync>;

/// Handle to a scheduled repeating refresh.
///
/// Dropping the handle has the same effect as [`cancel`](Self::cancel).
pub trait PendingRefresh: Send {
    /// Stop all future ticks. A tick already running is allowed to finish.
    fn cancel(self: Box<Self>);
}

/// Something that can call a tick repeatedly.
pub trait RefreshTimer: Send {
    fn schedule_repeating(
        &mut self,
        period: Duration,
        tick: RefreshTick,
    ) -> Result<Box<dyn PendingRefresh>>;
}

/// Runs each refresh on its own background thread.
///
/// The thread waits on a channel with a timeout of one period; a timeout is a
/// tick, anything else (an explicit cancel or the sender being dropped) ends
/// the loop. Cancelling never joins the thread, so it is safe to cancel while
/// holding a lock the tick also takes.
#[derive(Debug, Default)]
pub struct ThreadRefreshTimer;

struct ThreadRefresh {
    cancel_tx: Sender<()>,
}

impl PendingRefresh for ThreadRefresh {
    fn cancel(self: Box<Self>) {
        let _ = self.cancel_tx.send(());
    }
}

impl RefreshTimer for ThreadRefreshTimer {
    fn schedule_repeating(
        &mut self,
        period: Duration,
        tick: RefreshTick,
    ) -> Result<Box<dyn PendingRefresh>> {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("lightly-refresh".to_string())
            .spawn(move || {
                loop {
                    match cancel_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => tick(),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .context("Failed to spawn overlay refresh thread")?;

        Ok(Box::new(ThreadRefresh { cancel_tx }))
    }
}

struct ManualEntry {
    id: u64,
    period: Duration,
    tick: RefreshTick,
}

#[derive(Default)]
struct ManualTimerState {
    next_id: u64,
    scheduled_total: usize,
    live: Vec<ManualEntry>,
}

/// Timer that only ticks when [`fire`](Self::fire) is called.
///
/// Drives the scheduler from a simulated clock. Clones share the same
/// schedule, so the caller keeps one handle while the scheduler owns another.
#[derive(Clone, Default)]
pub struct ManualRefreshTimer {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualRefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualTimerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of refreshes scheduled and not yet cancelled.
    pub fn pending_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of refreshes ever scheduled.
    pub fn scheduled_total(&self) -> usize {
        self.lock().scheduled_total
    }

    pub fn periods(&self) -> Vec<Duration> {
        self.lock().live.iter().map(|entry| entry.period).collect()
    }

    /// Run one tick of every live refresh. Returns how many ticks ran.
    pub fn fire(&self) -> usize {
        // Ticks may schedule or cancel, so run them without holding the lock.
        let ticks: Vec<RefreshTick> = self
            .lock()
            .live
            .iter()
            .map(|entry| Arc::clone(&entry.tick))
            .collect();
        for tick in &ticks {
            tick();
        }
        ticks.len()
    }
}

struct ManualRefresh {
    id: u64,
    state: Arc<Mutex<ManualTimerState>>,
}

impl PendingRefresh for ManualRefresh {
    // Unregistering happens in Drop.
    fn cancel(self: Box<Self>) {}
}

impl Drop for ManualRefresh {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.live.retain(|entry| entry.id != self.id);
    }
}

impl RefreshTimer for ManualRefreshTimer {
    fn schedule_repeating(
        &mut self,
        period: Duration,
        tick: RefreshTick,
    ) -> Result<Box<dyn PendingRefresh>> {
        let mut state = self.lock();
        state.next_id += 1;
        state.scheduled_total += 1;
        let id = state.next_id;
        state.live.push(ManualEntry { id, period, tick });

        Ok(Box::new(ManualRefresh {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_thread_timer_ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut timer = ThreadRefreshTimer;

        let pending = timer
            .schedule_repeating(
                Duration::from_millis(10),
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(count.load(Ordering::SeqCst) >= 2);

        pending.cancel();
        // Let an in-flight tick settle, then make sure nothing else arrives.
        thread::sleep(Duration::from_millis(30));
        let settled = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn test_dropping_handle_stops_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut timer = ThreadRefreshTimer;

        let pending = timer
            .schedule_repeating(
                Duration::from_millis(50),
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        drop(pending);

        thread::sleep(Duration::from_millis(120));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_manual_timer_fires_only_live_refreshes() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut timer = ManualRefreshTimer::new();

        let make_tick = |count: &Arc<AtomicUsize>| -> RefreshTick {
            let count = Arc::clone(count);
            Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        let first = timer
            .schedule_repeating(Duration::from_secs(60), make_tick(&count))
            .unwrap();
        let _second = timer
            .schedule_repeating(Duration::from_secs(120), make_tick(&count))
            .unwrap();
        assert_eq!(timer.pending_count(), 2);
        assert_eq!(timer.fire(), 2);

        first.cancel();
        assert_eq!(timer.pending_count(), 1);
        assert_eq!(timer.periods(), vec![Duration::from_secs(120)]);
        assert_eq!(timer.fire(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(timer.scheduled_total(), 2);
    }
}
