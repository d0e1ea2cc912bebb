//! Speech output queue.
//!
//! [`Voice`] decouples "something wants to say X" from "the speech engine is
//! busy": producers enqueue utterances without blocking, and exactly one
//! worker thread drains the queue, rendering one utterance at a time through
//! a blocking [`SpeechEngine`]. FIFO order holds across all producers, and
//! identical text enqueued twice is spoken twice.

mod engines;

pub use engines::{CommandEngine, ConsoleEngine, RecordingEngine};

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::join_with_timeout;

const WORKER_POLL: Duration = Duration::from_millis(500);
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Speech rendering collaborator.
///
/// `render` blocks the calling worker until the utterance is audible. Errors
/// are logged by the worker and never terminate it.
pub trait SpeechEngine: Send {
    /// Engine identifier for logs.
    fn name(&self) -> &'static str;

    /// Render one utterance, blocking until done.
    fn render(&mut self, text: &str) -> Result<()>;
}

struct Shared {
    queue: Mutex<VecDeque<String>>,
    wake: Condvar,
    running: AtomicBool,
}

/// Asynchronous speech queue with a single draining worker.
///
/// Lifecycle is `new -> speak... -> stop`; there is no process-wide engine
/// instance, callers share one `Voice` explicitly (typically via `Arc`).
pub struct Voice {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    drain_timeout: Duration,
}

impl Voice {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self::with_drain_timeout(engine, DEFAULT_DRAIN_TIMEOUT)
    }

    /// As [`Voice::new`] with a custom `stop()` drain grace period.
    pub fn with_drain_timeout(engine: Box<dyn SpeechEngine>, drain_timeout: Duration) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            wake: Condvar::new(),
            running: AtomicBool::new(true),
        });
        log::info!("voice worker starting (engine: {})", engine.name());
        let worker_shared = shared.clone();
        let worker = std::thread::spawn(move || worker_loop(engine, worker_shared));
        Self {
            shared,
            worker: Mutex::new(Some(worker)),
            drain_timeout,
        }
    }

    /// Enqueue an utterance and return immediately.
    ///
    /// Empty text is a no-op. After `stop()` the text is discarded.
    pub fn speak(&self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if !self.shared.running.load(Ordering::SeqCst) {
            log::debug!("voice stopped; discarding utterance: {}", text);
            return;
        }
        let mut queue = self.shared.queue.lock().unwrap();
        queue.push_back(text);
        self.shared.wake.notify_one();
    }

    /// Utterances waiting to be rendered (the one currently rendering is not
    /// counted).
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().unwrap().len()
    }

    /// Stop the worker.
    ///
    /// Waits up to the drain timeout for queued utterances to be spoken,
    /// then stops regardless; whatever is still queued past the timeout is
    /// dropped, not spoken. Safe to call more than once.
    pub fn stop(&self) {
        if !self.shared.running.load(Ordering::SeqCst) {
            return;
        }

        let deadline = Instant::now() + self.drain_timeout;
        while Instant::now() < deadline {
            if self.shared.queue.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        let dropped: usize = self.shared.queue.lock().unwrap().drain(..).count();
        if dropped > 0 {
            log::warn!("dropping {} unspoken utterances at shutdown", dropped);
        }

        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.wake.notify_all();
        if let Some(handle) = self.worker.lock().unwrap().take() {
            join_with_timeout(handle, WORKER_JOIN_TIMEOUT, "voice worker");
        }
    }
}

fn worker_loop(mut engine: Box<dyn SpeechEngine>, shared: Arc<Shared>) {
    loop {
        let text = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if !shared.running.load(Ordering::SeqCst) {
                    return;
                }
                if let Some(text) = queue.pop_front() {
                    break text;
                }
                let (guard, _) = shared.wake.wait_timeout(queue, WORKER_POLL).unwrap();
                queue = guard;
            }
        };
        // The render call may block for a user-noticeable duration; the lock
        // is released so producers never wait on the engine.
        if let Err(err) = engine.render(&text) {
            log::warn!("speech engine '{}' failed: {}", engine.name(), err);
        }
    }
}
