use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Default quiescence window before the trailing search fires.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Single-slot trailing timer.
///
/// Arming aborts whatever was pending. Every arm gets a fresh generation
/// number that is handed to the fire callback; the owner confirms a fire with
/// [`Debouncer::accept_fire`], which rejects generations that were replaced
/// after their timer had already elapsed.
pub struct Debouncer {
    window: Duration,
    generation: u64,
    pending: Option<Pending>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            pending: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm the timer; `on_fire` runs on the runtime once the window elapses
    /// without another `arm` or `cancel`. Must be called within a tokio runtime.
    pub fn arm<F>(&mut self, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            on_fire(generation);
        });
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        trace!(generation, window_ms, "debounce armed");
        self.pending = Some(Pending { generation, handle });
        generation
    }

    /// Abort the pending fire, if any. Returns whether something was armed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(p) => {
                p.handle.abort();
                trace!(generation = p.generation, "debounce cancelled");
                true
            }
            None => false,
        }
    }

    /// Confirm a delivered fire. Only the currently armed generation is
    /// accepted; accepting it disarms the timer.
    pub fn accept_fire(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some(p) if p.generation == generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
