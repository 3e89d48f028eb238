//! services/recycle_job.rs
//! Job periódico que elimina las sesiones inactivas.

use std::time::Duration;
use tokio::{sync::oneshot, task::JoinHandle, time::MissedTickBehavior};

use crate::services::conversation_service::{now_ms, ConversationService};

pub struct RecycleJob {
    cease_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RecycleJob {
    /// Detiene el loop y espera a que termine.
    pub async fn cease(mut self) {
        if let Some(tx) = self.cease_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.handle.await {
            log::error!("[recycle] el job terminó con error: {:?}", e);
        }
    }
}

pub fn run_scheduled_job_continuously(
    conversation_service: ConversationService,
    interval: Duration,
) -> RecycleJob {
    let (cease_tx, mut cease_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // el primer tick es inmediato
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = conversation_service.recycle_conversations(now_ms()).await;
                    log::info!(
                        "[recycle] {} sesiones eliminadas, {} activas",
                        removed.len(),
                        conversation_service.session_count().await
                    );
                }
                _ = &mut cease_rx => {
                    log::info!("[recycle] job detenido");
                    break;
                }
            }
        }
    });

    RecycleJob {
        cease_tx: Some(cease_tx),
        handle,
    }
}
