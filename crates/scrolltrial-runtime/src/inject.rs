#![forbid(unsafe_code)]

//! Wheel-delta injection seam.
//!
//! The continuous-scroll loop runs off the UI thread, so it must never touch
//! the [`ScrollSession`](scrolltrial_core::ScrollSession) directly. Instead
//! it calls a [`WheelInjector`] once per tick. The stock injector,
//! [`ChannelInjector`], turns each call into a [`ScrollMsg`] on an mpsc
//! channel; the UI side drains the paired [`ScrollInbox`] and applies the
//! deltas on its own thread.
//!
//! Other injectors (an OS-level pointer-wheel synthesizer, a test recorder)
//! plug in through the same trait.

use std::sync::mpsc;

use thiserror::Error;

/// Failure of the injection primitive. Fatal to the job that hit it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    /// The receiving side is gone.
    #[error("scroll receiver disconnected")]
    Disconnected,
    /// The platform primitive could not be used.
    #[error("wheel injection unavailable: {0}")]
    Unavailable(String),
}

/// Message delivered to the thread that owns the scroll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMsg {
    /// One pointer-wheel event of `delta` notches.
    Wheel { delta: i64 },
}

/// Synchronous single-event wheel primitive.
pub trait WheelInjector: Send + 'static {
    /// Inject one wheel event of `delta` notches.
    fn inject(&mut self, delta: i64) -> Result<(), InjectError>;
}

impl<F> WheelInjector for F
where
    F: FnMut(i64) -> Result<(), InjectError> + Send + 'static,
{
    fn inject(&mut self, delta: i64) -> Result<(), InjectError> {
        self(delta)
    }
}

/// Injector that forwards wheel events over an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelInjector {
    sender: mpsc::Sender<ScrollMsg>,
}

impl WheelInjector for ChannelInjector {
    fn inject(&mut self, delta: i64) -> Result<(), InjectError> {
        self.sender
            .send(ScrollMsg::Wheel { delta })
            .map_err(|_| InjectError::Disconnected)
    }
}

/// UI-side end of a [`ChannelInjector`].
#[derive(Debug)]
pub struct ScrollInbox {
    receiver: mpsc::Receiver<ScrollMsg>,
}

impl ScrollInbox {
    /// Collect every pending message without blocking.
    pub fn drain(&self) -> Vec<ScrollMsg> {
        self.receiver.try_iter().collect()
    }

    /// Next pending message, if any.
    pub fn try_next(&self) -> Option<ScrollMsg> {
        self.receiver.try_recv().ok()
    }
}

/// Create a connected injector/inbox pair.
#[must_use]
pub fn scroll_channel() -> (ChannelInjector, ScrollInbox) {
    let (sender, receiver) = mpsc::channel();
    (ChannelInjector { sender }, ScrollInbox { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_delivers_in_order() {
        let (mut injector, inbox) = scroll_channel();
        injector.inject(1).unwrap();
        injector.inject(-2).unwrap();
        assert_eq!(
            inbox.drain(),
            vec![ScrollMsg::Wheel { delta: 1 }, ScrollMsg::Wheel { delta: -2 }]
        );
        assert_eq!(inbox.try_next(), None);
    }

    #[test]
    fn dropped_inbox_is_disconnected() {
        let (mut injector, inbox) = scroll_channel();
        drop(inbox);
        assert_eq!(injector.inject(1), Err(InjectError::Disconnected));
    }

    #[test]
    fn closures_are_injectors() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicI64, Ordering};

        let total = Arc::new(AtomicI64::new(0));
        let sink = Arc::clone(&total);
        let mut add = move |d: i64| {
            sink.fetch_add(d, Ordering::SeqCst);
            Ok::<(), InjectError>(())
        };
        add.inject(3).unwrap();
        add.inject(4).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 7);
    }
}
