//! Debounced volume dispatch.
//!
//! Slider input arrives far faster than the Web API tolerates. The
//! dispatcher keeps only the latest requested value, sends it after a quiet
//! window (or immediately on release/click), and serializes sends so at most
//! one request cycle is in flight. A send still waiting for the lock when a
//! newer one is requested is dropped.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::VolumeClient;
use crate::error::VolumeError;
use crate::types::VolumeWarning;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const WARNING_CHANNEL_CAPACITY: usize = 16;

/// Boxed future returned by [`VolumeSender::send_volume`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), VolumeError>> + Send + 'a>>;

/// Transport that applies a volume value.
pub trait VolumeSender: Send + Sync + 'static {
    fn send_volume(&self, percent: u8) -> SendFuture<'_>;
}

impl VolumeSender for VolumeClient {
    fn send_volume(&self, percent: u8) -> SendFuture<'_> {
        Box::pin(self.set_volume(percent))
    }
}

struct Inner {
    sender: Arc<dyn VolumeSender>,
    value: AtomicU8,
    /// Ticket of the most recently requested send.
    generation: AtomicU64,
    /// Held for one full send-or-retry cycle.
    send_lock: tokio::sync::Mutex<()>,
    pending: Mutex<Option<CancellationToken>>,
    warnings: mpsc::Sender<VolumeWarning>,
}

impl Inner {
    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Sends the value current once the lock is held, unless a newer send
    /// was requested in the meantime.
    async fn send_latest(&self, ticket: u64) -> Result<(), VolumeError> {
        let _guard = self.send_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "volume send superseded, skipping");
            return Ok(());
        }

        let percent = self.value.load(Ordering::SeqCst);
        debug!(value = percent, "dispatching volume");

        let result = self.sender.send_volume(percent).await;
        if let Err(e) = &result {
            warn!(value = percent, error = %e, "failed to set volume");
            let warning = VolumeWarning {
                value: percent,
                message: e.to_string(),
            };
            if self.warnings.try_send(warning).is_err() {
                debug!("volume warning dropped, channel full or closed");
            }
        }
        result
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_pending(&self) {
        if let Some(token) = self.lock_pending().take() {
            token.cancel();
        }
    }
}

/// Coalesces slider input into volume requests.
pub struct VolumeDispatcher {
    inner: Arc<Inner>,
    debounce: Duration,
}

impl VolumeDispatcher {
    /// Creates a dispatcher reflecting `initial` and the receiver for its
    /// send-failure warnings.
    pub fn new(
        sender: Arc<dyn VolumeSender>,
        initial: u8,
    ) -> (Self, mpsc::Receiver<VolumeWarning>) {
        let (warnings, rx) = mpsc::channel(WARNING_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            sender,
            value: AtomicU8::new(initial.min(100)),
            generation: AtomicU64::new(0),
            send_lock: tokio::sync::Mutex::new(()),
            pending: Mutex::new(None),
            warnings,
        });
        (
            Self {
                inner,
                debounce: DEFAULT_DEBOUNCE,
            },
            rx,
        )
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Last requested value.
    pub fn value(&self) -> u8 {
        self.inner.value.load(Ordering::SeqCst)
    }

    /// Whether a debounce window is open.
    pub fn has_pending(&self) -> bool {
        self.inner
            .lock_pending()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Whether a send cycle currently holds the send lock.
    pub fn is_sending(&self) -> bool {
        self.inner.send_lock.try_lock().is_err()
    }

    /// Records a new slider position without any I/O.
    pub fn on_slider_moved(&self, value: i32) -> u8 {
        let clamped = value.clamp(0, 100) as u8;
        self.inner.value.store(clamped, Ordering::SeqCst);
        clamped
    }

    /// Records a slider position and restarts the debounce window.
    ///
    /// When the window elapses without another move, the then-current value
    /// is sent.
    pub fn on_slider_moved_debounced(&self, value: i32) -> u8 {
        let clamped = self.on_slider_moved(value);

        let token = CancellationToken::new();
        if let Some(previous) = self.inner.lock_pending().replace(token.clone()) {
            previous.cancel();
        }

        let inner = self.inner.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    // Closes this window; a newer one has its own token.
                    token.cancel();
                    let ticket = inner.next_ticket();
                    let _ = inner.send_latest(ticket).await;
                }
            }
        });

        clamped
    }

    /// Final position after a drag: cancels the debounce and sends now.
    pub fn on_slider_released(&self, value: i32) -> JoinHandle<()> {
        self.send_now(value)
    }

    /// Click on the track: cancels the debounce and sends now.
    pub fn on_slider_clicked(&self, value: i32) -> JoinHandle<()> {
        self.send_now(value)
    }

    /// Records `percent` and sends it under the send lock, reporting
    /// failures as warnings. Returns `Ok` without I/O when a newer send
    /// supersedes this one while it waits for the lock.
    pub async fn send_volume(&self, percent: u8) -> Result<(), VolumeError> {
        self.on_slider_moved(i32::from(percent));
        let ticket = self.inner.next_ticket();
        self.inner.send_latest(ticket).await
    }

    fn send_now(&self, value: i32) -> JoinHandle<()> {
        self.on_slider_moved(value);
        self.inner.cancel_pending();

        let ticket = self.inner.next_ticket();
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let _ = inner.send_latest(ticket).await;
        })
    }
}

impl Drop for VolumeDispatcher {
    fn drop(&mut self) {
        self.inner.cancel_pending();
    }
}
