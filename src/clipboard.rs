//! Clipboard bridge: synchronizes text between the local pasteboard and
//! remote VNC clients, suppressing the echo a local write would otherwise
//! cause.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::interfaces::{ChangeSubscription, PasteboardProvider};
use crate::logging::Logger;

type ChangeHandler = Box<dyn FnMut(Option<String>) + Send>;

struct Inner {
    last_fingerprint: Option<u64>,
    handler: Option<ChangeHandler>,
    subscription: Option<ChangeSubscription>,
}

/// Bridges a local [`PasteboardProvider`] and remote clients, each of which
/// can push text in either direction, without looping a remote write back
/// to itself as a spurious local change notification.
pub struct ClipboardBridge {
    pasteboard: Arc<dyn PasteboardProvider>,
    skip_next_notification: Arc<AtomicBool>,
    inner: Mutex<Inner>,
    logger: Logger,
}

impl ClipboardBridge {
    /// Builds a bridge over `pasteboard`, not yet subscribed.
    #[must_use]
    pub fn new(pasteboard: Arc<dyn PasteboardProvider>, logger: Logger) -> Self {
        Self {
            pasteboard,
            skip_next_notification: Arc::new(AtomicBool::new(false)),
            inner: Mutex::new(Inner { last_fingerprint: None, handler: None, subscription: None }),
            logger,
        }
    }

    /// Subscribes to pasteboard changes and registers `handler` to be
    /// invoked with `Some(text)` for UTF-8 text changes or `None` for
    /// non-text contents. Idempotent: replaces the handler without
    /// re-subscribing if already started.
    pub async fn start(self: &Arc<Self>, handler: ChangeHandler) {
        let mut inner = self.inner.lock().await;
        inner.handler = Some(handler);
        if inner.subscription.is_some() {
            return;
        }

        let this = Arc::clone(self);
        let subscription = self.pasteboard.subscribe(Box::new(move || {
            let this = Arc::clone(&this);
            tokio::spawn(async move {
                this.handle_pasteboard_change().await;
            });
        }));
        inner.subscription = Some(subscription);
    }

    /// Unsubscribes and clears the handler. Idempotent.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(subscription) = inner.subscription.take() {
            subscription();
        }
        inner.handler = None;
    }

    /// Writes `text` to the pasteboard on behalf of a remote client,
    /// suppressing exactly the next change notification this write causes.
    pub async fn set_from_remote(&self, text: &str) {
        self.skip_next_notification.store(true, Ordering::SeqCst);
        self.pasteboard.write_utf8(text);
        let mut inner = self.inner.lock().await;
        inner.last_fingerprint = Some(fingerprint(text));
    }

    async fn handle_pasteboard_change(&self) {
        if self.skip_next_notification.swap(false, Ordering::SeqCst) {
            return;
        }

        let text = self.pasteboard.read_utf8();
        let mut inner = self.inner.lock().await;

        let current_fingerprint = text.as_deref().map(fingerprint);
        if current_fingerprint == inner.last_fingerprint {
            return;
        }
        inner.last_fingerprint = current_fingerprint;

        if let Some(handler) = inner.handler.as_mut() {
            self.logger.debug("clipboard bridge dispatching local change");
            handler(text);
        }
    }
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct FakePasteboard {
        text: StdMutex<Option<String>>,
        callback: StdMutex<Option<Box<dyn Fn() + Send + Sync>>>,
    }

    impl FakePasteboard {
        fn new() -> Arc<Self> {
            Arc::new(Self { text: StdMutex::new(None), callback: StdMutex::new(None) })
        }

        fn simulate_external_write(&self, text: &str) {
            *self.text.lock().unwrap() = Some(text.to_string());
            if let Some(callback) = self.callback.lock().unwrap().as_ref() {
                callback();
            }
        }
    }

    impl PasteboardProvider for FakePasteboard {
        fn read_utf8(&self) -> Option<String> {
            self.text.lock().unwrap().clone()
        }

        fn write_utf8(&self, text: &str) {
            *self.text.lock().unwrap() = Some(text.to_string());
        }

        fn subscribe(&self, callback: Box<dyn Fn() + Send + Sync>) -> ChangeSubscription {
            *self.callback.lock().unwrap() = Some(callback);
            Box::new(|| {})
        }
    }

    #[tokio::test]
    async fn set_from_remote_does_not_invoke_handler() {
        let pasteboard = FakePasteboard::new();
        let bridge = Arc::new(ClipboardBridge::new(pasteboard.clone(), Logger::default()));
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        bridge.start(Box::new(move |_| fired_clone.store(true, Ordering::SeqCst))).await;

        bridge.set_from_remote("hi").await;
        pasteboard.simulate_external_write("hi");
        tokio::task::yield_now().await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn external_change_after_remote_write_invokes_handler() {
        let pasteboard = FakePasteboard::new();
        let bridge = Arc::new(ClipboardBridge::new(pasteboard.clone(), Logger::default()));
        let last = Arc::new(Mutex::new(None));
        let last_clone = Arc::clone(&last);
        bridge
            .start(Box::new(move |text| {
                let last_clone = Arc::clone(&last_clone);
                let text = text.clone();
                tokio::spawn(async move {
                    *last_clone.lock().await = text;
                });
            }))
            .await;

        bridge.set_from_remote("hi").await;
        pasteboard.simulate_external_write("bye");
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(*last.lock().await, Some("bye".to_string()));
    }

    #[tokio::test]
    async fn repeated_identical_change_is_suppressed_by_fingerprint() {
        let pasteboard = FakePasteboard::new();
        let bridge = Arc::new(ClipboardBridge::new(pasteboard.clone(), Logger::default()));
        let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let count_clone = Arc::clone(&count);
        bridge.start(Box::new(move |_| { count_clone.fetch_add(1, Ordering::SeqCst); })).await;

        pasteboard.simulate_external_write("same");
        tokio::task::yield_now().await;
        pasteboard.simulate_external_write("same");
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_then_stop_is_a_noop() {
        let pasteboard = FakePasteboard::new();
        let bridge = Arc::new(ClipboardBridge::new(pasteboard, Logger::default()));
        bridge.start(Box::new(|_| {})).await;
        bridge.stop().await;
        bridge.stop().await;
    }
}
