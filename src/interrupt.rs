//! Operator interrupt
//!
//! One SIGINT listener for the whole process, installed at startup. The
//! flag latches: a Ctrl-C that arrives while nothing is waiting (engine
//! probe, sampling, printing) is still seen by the next waiter.

use std::future;
use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Raises the paired [`Interrupt`].
#[derive(Debug)]
pub struct InterruptTrigger(watch::Sender<bool>);

impl InterruptTrigger {
    pub fn fire(&self) {
        self.0.send_replace(true);
    }
}

impl Interrupt {
    pub fn channel() -> (InterruptTrigger, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger(tx), Interrupt { rx })
    }

    /// Listen for SIGINT. The handler is registered before this returns.
    pub fn ctrl_c() -> io::Result<Self> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let (trigger, interrupt) = Self::channel();
        tokio::spawn(async move {
            match sigint.recv().await {
                Some(()) => {
                    tracing::debug!("interrupt received");
                    trigger.fire();
                }
                // Keep the trigger alive so waiters stay pending.
                None => future::pending::<()>().await,
            }
        });
        Ok(interrupt)
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt fired, immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|&set| set).await.is_err() {
            // Trigger dropped without firing.
            future::pending::<()>().await
        }
    }
}
