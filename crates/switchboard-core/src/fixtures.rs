//! Test fixtures for Switchboard development and testing.
//!
//! [`MockTransport`] is an in-memory [`Transport`] with scripted inbound
//! frames, recorded writes and injectable failures. Clones share state, so a
//! test keeps one handle while the hub owns the other.
//!
//! # Example
//!
//! ```
//! use switchboard_core::fixtures::MockTransport;
//! use switchboard_core::{Frame, Hub, HubConfig, RequestContext};
//!
//! # tokio_test::block_on(async {
//! let hub = Hub::new(HubConfig::default());
//! let transport = MockTransport::new();
//! let conn = hub
//!     .accept(transport.clone(), RequestContext::new(), |_| {})
//!     .await
//!     .unwrap();
//!
//! conn.emit("hello").await.unwrap();
//! let written = transport.wait_for_writes(1).await;
//! assert_eq!(written[0], Frame::text("hello"));
//! # });
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::error::TransportError;
use crate::frame::Frame;
use crate::transport::Transport;

type Inbound = Result<Frame, TransportError>;

/// An in-memory transport for tests.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Inbound>>,
    written: Mutex<Vec<Frame>>,
    write_count: watch::Sender<usize>,
    writes_open: watch::Sender<bool>,
    fail_writes: AtomicBool,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MockTransport {
    /// Create a transport with nothing scripted.
    ///
    /// Reads wait until a frame is pushed.
    #[must_use]
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MockInner {
                inbound_tx,
                inbound_rx: tokio::sync::Mutex::new(inbound_rx),
                written: Mutex::new(Vec::new()),
                write_count: watch::Sender::new(0),
                writes_open: watch::Sender::new(true),
                fail_writes: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                close_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Script an inbound frame.
    pub fn push(&self, frame: Frame) {
        let _ = self.inner.inbound_tx.send(Ok(frame));
    }

    /// Script an inbound text frame.
    pub fn push_text(&self, text: &str) {
        self.push(Frame::text(text));
    }

    /// Make the next read fail with `error`.
    pub fn fail_read(&self, error: TransportError) {
        let _ = self.inner.inbound_tx.send(Err(error));
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self) {
        self.inner.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Hold writes until [`resume_writes`](Self::resume_writes) is called.
    pub fn pause_writes(&self) {
        self.inner.writes_open.send_replace(false);
    }

    /// Release held writes.
    pub fn resume_writes(&self) {
        self.inner.writes_open.send_replace(true);
    }

    /// Every frame written so far, in write order.
    #[must_use]
    pub fn written(&self) -> Vec<Frame> {
        self.inner.written.lock().clone()
    }

    /// The text payloads written so far, in write order.
    #[must_use]
    pub fn written_text(&self) -> Vec<String> {
        self.inner
            .written
            .lock()
            .iter()
            .filter_map(|f| f.as_text().map(str::to_string))
            .collect()
    }

    /// Wait until at least `count` frames have been written.
    pub async fn wait_for_writes(&self, count: usize) -> Vec<Frame> {
        let mut rx = self.inner.write_count.subscribe();
        let _ = rx.wait_for(|written| *written >= count).await;
        self.written()
    }

    /// Check if [`Transport::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Number of times [`Transport::close`] has been called.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.inner.close_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("written", &self.inner.written.lock().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn read_frame(&self) -> Result<Frame, TransportError> {
        let mut inbound = self.inner.inbound_rx.lock().await;
        inbound.recv().await.unwrap_or(Err(TransportError::Closed))
    }

    async fn write_frame(&self, frame: Frame) -> Result<(), TransportError> {
        let mut open = self.inner.writes_open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        self.inner.written.lock().push(frame);
        self.inner.write_count.send_modify(|count| *count += 1);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
