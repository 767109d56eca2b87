use anyhow::{anyhow, bail, Result};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::Instrument;
use worldview_persist::ThreadStore;
use worldview_types::{AgentEvent, GraphConfig, StreamEvent, TurnInput, TurnState};

use crate::stage::Stage;

/// Runs turns through a fixed list of stages against one thread store
///
/// Cheap to clone; every turn gets its own task and channel.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Stage>]>,
    store: Arc<dyn ThreadStore>,
    config: GraphConfig,
}

impl Pipeline {
    pub(crate) fn new(
        stages: Vec<Arc<dyn Stage>>,
        store: Arc<dyn ThreadStore>,
        config: GraphConfig,
    ) -> Self {
        Self {
            stages: stages.into(),
            store,
            config,
        }
    }

    pub fn builder() -> crate::builder::PipelineBuilder {
        crate::builder::PipelineBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        &self.store
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Spawn the turn in the background and return its event stream.
    ///
    /// The stream is zero or more `Update`s, then an optional `Error`, then
    /// exactly one `Done`. History is committed only when the turn succeeds;
    /// dropping the receiver aborts the turn without committing.
    pub fn spawn_run(&self, input: TurnInput) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));

        let stages = Arc::clone(&self.stages);
        let store = Arc::clone(&self.store);
        let timeout = self.config.turn_timeout;
        let span = tracing::info_span!("turn", thread_id = %input.thread_id);

        tokio::spawn(
            async move {
                let turn = AssertUnwindSafe(Self::execute_turn(input, tx.clone(), stages, store))
                    .catch_unwind();

                let outcome = tokio::select! {
                    biased;
                    result = tokio::time::timeout(timeout, turn) => result,
                    _ = tx.closed() => {
                        tracing::info!("receiver dropped, turn aborted without commit");
                        return;
                    }
                };

                let failure = match outcome {
                    Ok(Ok(Ok(()))) => None,
                    Ok(Ok(Err(e))) => Some(e.to_string()),
                    Ok(Err(panic)) => Some(format!("turn panicked: {}", panic_message(&*panic))),
                    Err(_) => Some(format!("turn timed out after {}s", timeout.as_secs())),
                };

                if let Some(message) = failure {
                    tracing::error!(error = %message, "turn failed");
                    let _ = tx.send(StreamEvent::Error { message }).await;
                }
                let _ = tx.send(StreamEvent::Done).await;
            }
            .instrument(span),
        );

        rx
    }

    async fn execute_turn(
        input: TurnInput,
        event_tx: mpsc::Sender<StreamEvent>,
        stages: Arc<[Arc<dyn Stage>]>,
        store: Arc<dyn ThreadStore>,
    ) -> Result<()> {
        let start_time = Instant::now();

        let history = store
            .load(&input.thread_id)
            .await?
            .map(|record| record.messages)
            .unwrap_or_default();

        let mut state = TurnState::new(input, history);
        tracing::info!(run_id = %state.run_id, history = state.messages.len(), "turn started");

        event_tx.send(StreamEvent::Update(state.snapshot())).await?;

        for stage in stages.iter() {
            let stage_name = stage.stage_type().name();
            tracing::debug!(stage = stage_name, "executing stage");

            stage.execute(&mut state, event_tx.clone()).await?;

            event_tx.send(StreamEvent::Update(state.snapshot())).await?;
        }

        let record = store.save(&state.thread_id, state.messages.clone()).await?;

        tracing::info!(
            run_id = %state.run_id,
            turns = record.turns,
            duration_ms = start_time.elapsed().as_millis() as u64,
            "turn committed"
        );
        Ok(())
    }

    /// Run a turn to completion and return the final snapshot
    pub async fn run(&self, input: TurnInput) -> Result<AgentEvent> {
        let mut rx = self.spawn_run(input);
        let mut last = None;
        let mut error = None;
        let mut done = false;

        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::Update(snapshot) => last = Some(snapshot),
                StreamEvent::Error { message } => error = Some(message),
                StreamEvent::Done => {
                    done = true;
                    break;
                }
            }
        }

        if let Some(message) = error {
            bail!(message);
        }
        if !done {
            bail!("turn ended without done");
        }
        last.ok_or_else(|| anyhow!("turn ended without producing state"))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
