//! Double-buffered batching and the flush dispatcher
//!
//! Two fixed-capacity slots alternate: one active and accepting appends,
//! the other idle or in flight to disk. A full slot is handed to the
//! dispatcher over a zero-capacity channel; the send completes only when
//! the dispatcher takes it, which is the backpressure point — a slow disk
//! stalls producers rather than being outrun by them.

use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use crate::retention;
use crate::writer::MuxWriter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Idle flush interval bounding the staleness of unflushed data.
pub(crate) const IDLE_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Policy applied when an asynchronous flush fails.
///
/// Whether failed flushes should block, retry, or surface a counter is
/// left to the embedder; [`ReportAndContinue`] is the default.
pub trait FlushErrorPolicy: Send + Sync + 'static {
    /// Invoked once per failed flush, on the dispatcher task.
    fn on_flush_error(&self, error: &Error);
}

/// Default policy: report through `tracing` and keep going.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAndContinue;

impl FlushErrorPolicy for ReportAndContinue {
    fn on_flush_error(&self, error: &Error) {
        tracing::error!(%error, "async log flush failed");
    }
}

struct ActiveSlot {
    buf: Vec<u8>,
}

/// Producer side of the double buffer.
pub(crate) struct DoubleBuffer {
    capacity: usize,
    active: Mutex<ActiveSlot>,
    /// Full slots travel to the dispatcher; zero capacity makes the send
    /// a rendezvous.
    full_tx: flume::Sender<Vec<u8>>,
    /// Cleaned slots travel back; the companion slot is the only thing
    /// ever in here.
    clean_rx: flume::Receiver<Vec<u8>>,
}

impl DoubleBuffer {
    /// Append one rendered message, handing the active slot off first if
    /// it would overflow.
    pub(crate) fn append(&self, bytes: &[u8]) -> Result<()> {
        let mut active = self.active.lock();
        if active.buf.len() + bytes.len() > self.capacity {
            // Handoff: the send completes only when the dispatcher takes
            // the slot, and the swap happens before the new message is
            // appended.
            let full = std::mem::take(&mut active.buf);
            self.full_tx.send(full).map_err(|_| Error::ChannelClosed)?;
            // Once the dispatcher has accepted, the recycled companion
            // slot is already waiting.
            active.buf = self.clean_rx.recv().map_err(|_| Error::ChannelClosed)?;
        }
        active.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write the active slot through the writer in place; used by the
    /// flush and shutdown paths. Returns whether the write rotated the
    /// file. On error the slot keeps its contents.
    pub(crate) fn drain_through(
        &self,
        writer: &MuxWriter,
        config: &FileLoggerConfig,
    ) -> Result<bool> {
        let mut active = self.active.lock();
        if active.buf.is_empty() {
            return Ok(false);
        }
        let rotated = writer.write(&active.buf, config)?;
        active.buf.clear();
        Ok(rotated)
    }
}

/// The single background task draining handed-off slots.
pub(crate) struct Dispatcher {
    writer: Arc<MuxWriter>,
    config: Arc<FileLoggerConfig>,
    buffer: Arc<DoubleBuffer>,
    full_rx: flume::Receiver<Vec<u8>>,
    clean_tx: flume::Sender<Vec<u8>>,
    cancel: CancellationToken,
    policy: Arc<dyn FlushErrorPolicy>,
}

/// Build the two slots, the channels between them, and the dispatcher.
pub(crate) fn pair(
    writer: Arc<MuxWriter>,
    config: Arc<FileLoggerConfig>,
    cancel: CancellationToken,
    policy: Arc<dyn FlushErrorPolicy>,
) -> (Arc<DoubleBuffer>, Dispatcher) {
    let capacity = config.buffer_size;
    let (full_tx, full_rx) = flume::bounded(0);
    let (clean_tx, clean_rx) = flume::bounded(1);
    clean_tx
        .send(Vec::with_capacity(capacity))
        .expect("fresh return channel has room");

    let buffer = Arc::new(DoubleBuffer {
        capacity,
        active: Mutex::new(ActiveSlot {
            buf: Vec::with_capacity(capacity),
        }),
        full_tx,
        clean_rx,
    });
    let dispatcher = Dispatcher {
        writer,
        config,
        buffer: Arc::clone(&buffer),
        full_rx,
        clean_tx,
        cancel,
        policy,
    };
    (buffer, dispatcher)
}

impl Dispatcher {
    /// Service handoffs, idle flushes, and cancellation until shut down.
    pub(crate) async fn run(self) {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.drain();
                    break;
                }
                result = self.full_rx.recv_async() => match result {
                    Ok(full) => self.flush_slot(full),
                    // Producers dropped the buffer; flush what is left.
                    Err(_) => {
                        self.drain();
                        break;
                    }
                },
                () = tokio::time::sleep(IDLE_FLUSH_INTERVAL) => self.idle_flush(),
            }
        }
    }

    fn flush_slot(&self, mut full: Vec<u8>) {
        self.write_through(&full);
        full.clear();
        // The companion slot is the only one circulating, so the
        // capacity-1 return channel always has room.
        let _ = self.clean_tx.try_send(full);
    }

    fn idle_flush(&self) {
        // A contended tick is skipped: the lock holder is either
        // appending (fast) or handing off (which flushes anyway).
        let Some(mut active) = self.buffer.active.try_lock() else {
            return;
        };
        if active.buf.is_empty() {
            return;
        }
        let Ok(clean) = self.buffer.clean_rx.try_recv() else {
            return;
        };
        let full = std::mem::replace(&mut active.buf, clean);
        drop(active);
        self.flush_slot(full);
    }

    /// Drain-and-flush on shutdown. A sink closed without a flush keeps
    /// its contract: buffered data is abandoned.
    fn drain(&self) {
        if self.writer.is_closed() {
            return;
        }
        while let Ok(full) = self.full_rx.try_recv() {
            self.flush_slot(full);
        }
        let pending = {
            let mut active = self.buffer.active.lock();
            std::mem::take(&mut active.buf)
        };
        if !pending.is_empty() {
            self.write_through(&pending);
        }
        if let Err(error) = self.writer.sync() {
            self.policy.on_flush_error(&error);
        }
    }

    fn write_through(&self, bytes: &[u8]) {
        match self.writer.write(bytes, &self.config) {
            Ok(true) => {
                retention::spawn_sweep(self.writer.path().to_path_buf(), self.config.max_days);
            }
            Ok(false) => {}
            Err(error) => self.policy.on_flush_error(&error),
        }
    }
}
