// FILE: src/playback.rs
// Single-shot completion signal for a playback

use crate::state::CompletionStatus;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Resolves when the playback it belongs to reaches its natural end
///
/// If the playback is interrupted the signal is abandoned: awaiting it never
/// resolves, and `status()` reports `Abandoned`.
#[derive(Debug)]
pub struct Completion {
    rx: Option<oneshot::Receiver<()>>,
    status: CompletionStatus,
}

impl Completion {
    pub(crate) fn new(rx: oneshot::Receiver<()>) -> Self {
        Self {
            rx: Some(rx),
            status: CompletionStatus::Pending,
        }
    }

    /// Checks the outcome without waiting
    pub fn status(&mut self) -> CompletionStatus {
        if let Some(rx) = self.rx.as_mut() {
            match rx.try_recv() {
                Ok(()) => self.settle(CompletionStatus::Finished),
                Err(TryRecvError::Closed) => self.settle(CompletionStatus::Abandoned),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.status
    }

    fn settle(&mut self, status: CompletionStatus) {
        self.status = status;
        self.rx = None;
    }
}

impl Future for Completion {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        match this.status {
            CompletionStatus::Finished => return Poll::Ready(()),
            CompletionStatus::Abandoned => return Poll::Pending,
            CompletionStatus::Pending => {}
        }

        let Some(rx) = this.rx.as_mut() else {
            return Poll::Pending;
        };

        match Pin::new(rx).poll(cx) {
            Poll::Ready(Ok(())) => {
                this.settle(CompletionStatus::Finished);
                Poll::Ready(())
            }
            Poll::Ready(Err(_)) => {
                this.settle(CompletionStatus::Abandoned);
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
