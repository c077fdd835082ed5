//! Background task plumbing for the driver.
//!
//! Each collaborator call runs on its own thread and reports back through the
//! driver's message queue. A [`TaskHandle`] pairs the task's generation with a
//! [`CancelToken`] so the driver can signal the task it superseded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::message::Message;

/// Cooperative cancellation flag shared between the driver and a task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The primary task currently in flight.
#[derive(Debug)]
pub struct TaskHandle {
    pub generation: u64,
    pub token: CancelToken,
}

/// Run `work` on a new thread and post its single result message.
///
/// A closed queue means the driver already finished; the result is dropped.
pub fn spawn_task<F>(
    name: &str,
    generation: u64,
    tx: Sender<Message>,
    work: F,
) -> Result<TaskHandle>
where
    F: FnOnce(&CancelToken) -> Message + Send + 'static,
{
    let token = CancelToken::new();
    let task_token = token.clone();
    let task_name = name.to_string();
    thread::Builder::new()
        .name(format!("gemmit-{name}"))
        .spawn(move || {
            let message = work(&task_token);
            if tx.send(message).is_err() {
                debug!(task = %task_name, generation, "driver gone, dropping task result");
            }
        })
        .with_context(|| format!("spawn {name} task"))?;
    Ok(TaskHandle { generation, token })
}

/// Repeating spinner timer. Stops on drop.
#[derive(Debug)]
pub struct Ticker {
    token: CancelToken,
}

impl Ticker {
    pub fn start(tx: Sender<Message>, interval: Duration) -> Self {
        let token = CancelToken::new();
        let stop = token.clone();
        let spawned = thread::Builder::new()
            .name("gemmit-ticker".to_string())
            .spawn(move || {
                loop {
                    thread::sleep(interval);
                    if stop.is_cancelled() || tx.send(Message::Tick).is_err() {
                        break;
                    }
                }
            });
        if let Err(err) = spawned {
            warn!(err = %err, "failed to spawn ticker thread");
        }
        Self { token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
