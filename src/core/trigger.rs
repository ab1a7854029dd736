//! Per-death orchestration: pause the game, load the config, build the
//! request, hand it to the dispatcher, and surface the outcome.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::config::ConfigManager;
use super::dispatch::{DispatchEvent, ShockDispatcher};
use super::request::build_request;

const SHOCK_PENDING_MESSAGE: &str = "Shocking...";
const CANCELLED_MESSAGE: &str = "Request was cancelled.";

/// Modal message collaborator (the host's popup layer).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Pauses running game actions. Invoked once per trigger, before any I/O;
/// resuming is the host's business.
pub trait GamePauser: Send + Sync {
    fn pause(&self);
}

/// Lifecycle of a single trigger. Terminal states end that trigger only;
/// the controller accepts the next death event immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Loading,
    Building,
    Dispatching,
    Succeeded,
    Cancelled,
    Failed,
}

/// Orchestrates one load -> build -> dispatch sequence per death event.
/// All collaborators are explicit references handed in at construction;
/// no engine singleton is consulted.
pub struct TriggerController {
    config_manager: ConfigManager,
    dispatcher: Arc<dyn ShockDispatcher>,
    notifier: Arc<dyn NotificationSink>,
    pauser: Arc<dyn GamePauser>,
    runtime: tokio::runtime::Handle,
}

impl TriggerController {
    pub fn new(
        config_manager: ConfigManager,
        dispatcher: Arc<dyn ShockDispatcher>,
        notifier: Arc<dyn NotificationSink>,
        pauser: Arc<dyn GamePauser>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            config_manager,
            dispatcher,
            notifier,
            pauser,
            runtime,
        }
    }

    /// Death-hook entry point. Runs the synchronous half of the trigger
    /// (pause, config read, request build, hand-off to the dispatcher)
    /// on the caller's thread and leaves a spawned listener waiting on
    /// the outcome, so the host thread never blocks on network I/O.
    ///
    /// Each call owns its own event subscription; rapid repeated deaths
    /// run as independent triggers with no serialization.
    pub fn on_player_death(&self) {
        if let Ok(events) = self.begin_trigger() {
            let notifier = Arc::clone(&self.notifier);
            self.runtime.spawn(async move {
                await_outcome(events, notifier.as_ref()).await;
            });
        }
    }

    /// The full trigger lifecycle as one awaitable unit, returning the
    /// terminal state. [`TriggerController::on_player_death`] is the
    /// fire-and-forget form of this.
    pub async fn run_trigger(&self) -> TriggerState {
        match self.begin_trigger() {
            Ok(events) => await_outcome(events, self.notifier.as_ref()).await,
            Err(state) => state,
        }
    }

    fn begin_trigger(&self) -> Result<mpsc::Receiver<DispatchEvent>, TriggerState> {
        // Freeze the game before any I/O so the death visibly halts.
        self.pauser.pause();
        self.notifier.notify(SHOCK_PENDING_MESSAGE);

        log::debug!("trigger: {:?} -> {:?}", TriggerState::Idle, TriggerState::Loading);
        let config = match self.config_manager.load() {
            Ok(config) => config,
            Err(e) => {
                log::error!("Config load failed: {}", e);
                self.notifier.notify(e.popup_message());
                return Err(TriggerState::Failed);
            }
        };

        log::debug!("trigger: {:?} -> {:?}", TriggerState::Loading, TriggerState::Building);
        let request = build_request(&config, &mut rand::thread_rng());
        self.notifier.notify(&format!(
            "Duration: {}s     Intensity: {}",
            request.duration_ms / 1000,
            request.intensity
        ));

        log::debug!(
            "trigger: {:?} -> {:?}",
            TriggerState::Building,
            TriggerState::Dispatching
        );
        Ok(self.dispatcher.dispatch(request))
    }
}

/// Drains one trigger's event channel. Exactly one terminal notification
/// is surfaced; anything after the first terminal event is ignored.
async fn await_outcome(
    mut events: mpsc::Receiver<DispatchEvent>,
    notifier: &dyn NotificationSink,
) -> TriggerState {
    while let Some(event) = events.recv().await {
        match event {
            DispatchEvent::Progress(pct) => {
                let message =
                    format!("Request in progress... Download progress: {:.0}%", pct);
                log::info!("{}", message);
                notifier.notify(&message);
            }
            DispatchEvent::Completed(text) => {
                notifier.notify(&text);
                return TriggerState::Succeeded;
            }
            DispatchEvent::Cancelled => {
                notifier.notify(CANCELLED_MESSAGE);
                return TriggerState::Cancelled;
            }
        }
    }
    // The dispatcher went away without reporting a terminal event.
    TriggerState::Failed
}
