use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use athena_client::ChatClient;

use crate::aggregator::Aggregator;
use crate::error::PipelineResult;
use crate::notifications::{self, notify_summary_ready};
use crate::prompts::{PromptBuilder, SummaryKind, summarize_text};
use crate::state::{SummaryState, SummaryStatus};
use crate::store::NotificationCenter;

/// Finished jobs kept for status queries before the oldest are dropped.
pub const DEFAULT_FINISHED_LIMIT: usize = 32;

/// Runs aggregator, prompt builder and chat client end to end, either inline
/// or as cancellable background jobs.
#[derive(Clone)]
pub struct SummaryService {
    aggregator: Aggregator,
    chat: Arc<dyn ChatClient>,
    notifications: Arc<dyn NotificationCenter>,
    prompts: PromptBuilder,
    summaries: Arc<Mutex<HashMap<String, SummaryStatus>>>,
    cancel_senders: Arc<Mutex<HashMap<String, watch::Sender<bool>>>>,
    finished: Arc<Mutex<VecDeque<String>>>,
    finished_limit: usize,
}

/// Resolves once cancellation is requested. Never resolves if the sender is
/// gone without having cancelled.
async fn cancelled(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

impl SummaryService {
    pub fn new(
        aggregator: Aggregator,
        chat: Arc<dyn ChatClient>,
        notifications: Arc<dyn NotificationCenter>,
    ) -> Self {
        let prompts = PromptBuilder::from_config(aggregator.config());
        Self {
            aggregator,
            chat,
            notifications,
            prompts,
            summaries: Arc::new(Mutex::new(HashMap::new())),
            cancel_senders: Arc::new(Mutex::new(HashMap::new())),
            finished: Arc::new(Mutex::new(VecDeque::new())),
            finished_limit: DEFAULT_FINISHED_LIMIT,
        }
    }

    /// Keep at most `limit` finished jobs. Running jobs are never dropped.
    pub fn with_finished_limit(mut self, limit: usize) -> Self {
        self.finished_limit = limit;
        self
    }

    /// Record `id` as finished and forget the oldest finished jobs over the limit.
    async fn retire(&self, id: &str) {
        let mut finished = self.finished.lock().await;
        finished.push_back(id.to_string());
        if finished.len() <= self.finished_limit {
            return;
        }
        let mut map = self.summaries.lock().await;
        while finished.len() > self.finished_limit {
            if let Some(old) = finished.pop_front() {
                map.remove(&old);
            }
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    async fn run(&self, kind: SummaryKind) -> PipelineResult<String> {
        let snapshot = self.aggregator.refresh().await?;
        let messages = self.prompts.messages_for(&snapshot, kind);
        let text = self.chat.send(&messages).await?;
        tracing::info!(?kind, chars = text.len(), "summary generated");
        Ok(text)
    }

    /// Fetch, render and send in one go, then announce the result.
    pub async fn generate(&self, kind: SummaryKind) -> PipelineResult<String> {
        let text = self.run(kind).await?;
        notify_summary_ready(self.notifications.as_ref()).await;
        Ok(text)
    }

    /// Replace the repeating daily reminder with one at the configured time.
    pub async fn schedule_daily_reminder(&self) -> bool {
        let time = self.aggregator.config().reminder_time;
        notifications::schedule_daily_reminder(self.notifications.as_ref(), time).await
    }

    /// Summarize arbitrary text in `paragraphs` paragraphs (clamped to 2..=5).
    pub async fn summarize_text(&self, text: &str, paragraphs: u8) -> PipelineResult<String> {
        let messages = summarize_text(text, paragraphs);
        Ok(self.chat.send(&messages).await?)
    }

    pub async fn start_summary(&self, kind: SummaryKind) -> String {
        let id = Uuid::new_v4().to_string();

        {
            let mut map = self.summaries.lock().await;
            map.insert(
                id.clone(),
                SummaryStatus {
                    id: id.clone(),
                    kind,
                    state: SummaryState::Pending,
                },
            );
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut canc = self.cancel_senders.lock().await;
            canc.insert(id.clone(), cancel_tx);
        }

        let service = self.clone();
        let id_for_task = id.clone();
        tokio::spawn(async move {
            {
                let mut map = service.summaries.lock().await;
                if let Some(s) = map.get_mut(&id_for_task) {
                    if s.state == SummaryState::Pending {
                        s.state = SummaryState::InProgress;
                    }
                }
            }

            let outcome = tokio::select! {
                res = service.run(kind) => Some(res),
                _ = cancelled(cancel_rx) => None,
            };

            let completed = {
                let mut map = service.summaries.lock().await;
                match (map.get_mut(&id_for_task), outcome) {
                    (Some(s), _) if s.state == SummaryState::Cancelled => {
                        tracing::debug!(
                            id = %id_for_task,
                            "discarding result of cancelled summary"
                        );
                        false
                    }
                    (Some(s), Some(Ok(text))) => {
                        s.state = SummaryState::Completed { text };
                        true
                    }
                    (Some(s), Some(Err(e))) => {
                        tracing::warn!(id = %id_for_task, error = %e, "summary failed");
                        s.state = SummaryState::Failed {
                            message: e.user_message(),
                        };
                        false
                    }
                    (Some(s), None) => {
                        s.state = SummaryState::Cancelled;
                        false
                    }
                    (None, _) => false,
                }
            };

            service.cancel_senders.lock().await.remove(&id_for_task);
            service.retire(&id_for_task).await;
            if completed {
                notify_summary_ready(service.notifications.as_ref()).await;
            }
        });

        id
    }

    pub async fn get_status(&self, summary_id: &str) -> Option<SummaryStatus> {
        let map = self.summaries.lock().await;
        map.get(summary_id).cloned()
    }

    pub async fn list_summaries(&self) -> Vec<SummaryStatus> {
        let map = self.summaries.lock().await;
        map.values().cloned().collect()
    }

    /// Request cancellation. Returns `false` for unknown or finished jobs.
    pub async fn cancel_summary(&self, summary_id: &str) -> bool {
        let canc = self.cancel_senders.lock().await;
        let Some(tx) = canc.get(summary_id) else {
            return false;
        };
        let mut map = self.summaries.lock().await;
        match map.get_mut(summary_id) {
            Some(s) if !s.state.is_terminal() => {
                s.state = SummaryState::Cancelled;
                let _ = tx.send(true);
                true
            }
            _ => false,
        }
    }
}
