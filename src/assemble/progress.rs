//! Progress reporting and cancellation for the assembly loop.

use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives a percentage after each input file has been parsed.
///
/// Values are strictly increasing and lie in `[0, 100)`: the percentage is
/// computed from the index of the file that just finished, so a final 100 is
/// never reported by the assembler.
pub trait ProgressObserver {
    fn report(&mut self, percent: f64);
}

impl<F: FnMut(f64)> ProgressObserver for F {
    fn report(&mut self, percent: f64) {
        self(percent)
    }
}

/// Observer that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&mut self, _percent: f64) {}
}

/// Observer that forwards updates to a consumer on another thread.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<f64>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<f64>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl ProgressObserver for ChannelObserver {
    fn report(&mut self, percent: f64) {
        // A consumer that hung up only loses progress display
        if self.sender.send(percent).is_err() {
            log::debug!("Progress receiver dropped");
        }
    }
}

/// Shared flag checked by the assembler before each file parse.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next file is parsed.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |p: f64| seen.push(p);
            observer.report(0.0);
            observer.report(50.0);
        }
        assert_eq!(seen, vec![0.0, 50.0]);
    }

    #[test]
    fn test_channel_observer() {
        let (mut observer, receiver) = ChannelObserver::channel();
        observer.report(25.0);
        observer.report(75.0);
        drop(observer);

        let values: Vec<f64> = receiver.iter().collect();
        assert_eq!(values, vec![25.0, 75.0]);
    }

    #[test]
    fn test_channel_observer_without_receiver() {
        let (mut observer, receiver) = ChannelObserver::channel();
        drop(receiver);
        observer.report(10.0);
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
