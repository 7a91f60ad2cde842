//! Dispatcher: one sequential worker per user.
//!
//! Messages from the same user are handled strictly in arrival order by
//! that user's worker task; different users' workers run concurrently.
//! An idle worker closes its queue, drains what is already queued, and
//! exits; the next message for that user spawns a new one. Each user's
//! workers share a gate held for the worker's whole life, so a new worker
//! waits until the previous one has finished draining.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::channels::{ChannelManager, IncomingMessage};

use super::handler::ConversationHandler;

pub struct Dispatcher {
    handler: Arc<ConversationHandler>,
    channels: Arc<ChannelManager>,
    idle_timeout: Duration,
    workers: HashMap<String, WorkerHandle>,
    tasks: JoinSet<()>,
}

struct WorkerHandle {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    gate: Arc<Mutex<()>>,
}

impl Dispatcher {
    pub fn new(
        handler: Arc<ConversationHandler>,
        channels: Arc<ChannelManager>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            handler,
            channels,
            idle_timeout,
            workers: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Queue a message on its user's worker, starting one if needed.
    pub fn dispatch(&mut self, msg: IncomingMessage) {
        let msg = match self.workers.get(&msg.user_id) {
            Some(worker) => match worker.tx.send(msg) {
                Ok(()) => return,
                // Worker went idle and closed its queue.
                Err(mpsc::error::SendError(msg)) => msg,
            },
            None => msg,
        };

        self.reap();

        let (tx, rx) = mpsc::unbounded_channel();
        let user_id = msg.user_id.clone();
        // Fresh channel with a live receiver: this send cannot fail.
        let _ = tx.send(msg);
        // A previous worker may still be draining; reuse its gate.
        let gate = self
            .workers
            .remove(&user_id)
            .map(|old| old.gate)
            .unwrap_or_default();
        self.workers.insert(
            user_id.clone(),
            WorkerHandle {
                tx,
                gate: Arc::clone(&gate),
            },
        );

        debug!(user_id = %user_id, workers = self.workers.len(), "Worker spawned");
        self.tasks.spawn(run_worker(
            user_id,
            rx,
            gate,
            Arc::clone(&self.handler),
            Arc::clone(&self.channels),
            self.idle_timeout,
        ));
    }

    /// Number of users with a live worker.
    pub fn active_workers(&self) -> usize {
        self.workers.values().filter(|w| !w.tx.is_closed()).count()
    }

    /// Stop accepting messages and wait for every queued message to be handled.
    pub async fn shutdown(mut self) {
        self.workers.clear();
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "Worker task failed");
            }
        }
    }

    /// Forget exited workers. A closed worker that is still draining keeps
    /// its entry so its gate is handed to the next worker.
    fn reap(&mut self) {
        self.workers
            .retain(|_, w| !w.tx.is_closed() || Arc::strong_count(&w.gate) > 1);
        while let Some(res) = self.tasks.try_join_next() {
            if let Err(e) = res {
                warn!(error = %e, "Worker task failed");
            }
        }
    }
}

async fn run_worker(
    user_id: String,
    mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
    gate: Arc<Mutex<()>>,
    handler: Arc<ConversationHandler>,
    channels: Arc<ChannelManager>,
    idle_timeout: Duration,
) {
    let _turn = gate.lock().await;
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(msg)) => process(&handler, &channels, &msg).await,
            Ok(None) => break,
            Err(_) => {
                rx.close();
                while let Some(msg) = rx.recv().await {
                    process(&handler, &channels, &msg).await;
                }
                debug!(user_id = %user_id, "Worker idle, exiting");
                break;
            }
        }
    }
}

async fn process(handler: &ConversationHandler, channels: &ChannelManager, msg: &IncomingMessage) {
    let queued_ms = (Utc::now() - msg.received_at).num_milliseconds();
    debug!(user_id = %msg.user_id, queued_ms, "Handling message");
    let Some(response) = handler.handle(msg).await else {
        return;
    };
    if let Err(e) = channels.respond(msg, response).await {
        warn!(
            user_id = %msg.user_id,
            channel = %msg.channel,
            error = %e,
            "Failed to deliver reply"
        );
    }
}
