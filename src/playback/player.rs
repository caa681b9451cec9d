use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::EngineConfig;
use crate::ingest::IngestionPort;
use crate::playback::controller::{Mode, PlaybackController};
use crate::playback::projector::RenderSnapshot;
use crate::timeline::record::{ActionDraft, ActionKind, ActionStatus};
use crate::timeline::{TimelineError, TimelineLog};

/// Wires the log and the playback controller together and exposes the
/// rendering port: a watch channel carrying the current [`RenderSnapshot`],
/// republished after every append, status change, or scrub input.
///
/// All engine operations are synchronous; the only async surface is the
/// snapshot channel and the optional follow task over a shared log.
pub struct Player {
    log: Arc<TimelineLog>,
    state: Mutex<PlayerState>,
    snapshot_tx: watch::Sender<RenderSnapshot>,
    config: EngineConfig,
}

struct PlayerState {
    ctrl: PlaybackController,
    /// Document the observer explicitly opened, overriding the derived
    /// active path
    pinned_path: Option<String>,
}

impl Player {
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let log = Arc::new(TimelineLog::with_notify_capacity(config.notify_capacity));
        Self::over_log(log, config)
    }

    /// Build a player over an existing log (e.g. one rebuilt from a tape).
    /// Playback starts live at the current tip.
    pub fn over_log(log: Arc<TimelineLog>, config: EngineConfig) -> Arc<Self> {
        let ctrl = PlaybackController::new(log.len());
        let state = PlayerState {
            ctrl,
            pinned_path: None,
        };
        let initial =
            RenderSnapshot::project(&log.snapshot(), log.len(), Mode::Live, 0, false, None);
        let (snapshot_tx, _) = watch::channel(initial);
        Arc::new(Self {
            log,
            state: Mutex::new(state),
            snapshot_tx,
            config,
        })
    }

    pub fn log(&self) -> &Arc<TimelineLog> {
        &self.log
    }

    /// Register a view: each receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RenderSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current snapshot without subscribing.
    pub fn snapshot(&self) -> RenderSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Spawn a task that follows appends made to the log by other handles
    /// (producers writing through `log().append` directly rather than this
    /// player's ingestion port). Lagged receivers just re-read the length.
    pub fn spawn_follow_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let player = Arc::clone(self);
        let mut rx = self.log.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(new_len) => player.on_append(new_len),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        let len = player.log.len();
                        player.on_append(len);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn on_append(&self, new_len: u64) {
        let mut state = self.state.lock();
        state.ctrl.on_append(new_len);
        self.publish(&state);
    }

    fn publish(&self, state: &PlayerState) {
        let snapshot = RenderSnapshot::project(
            &self.log.snapshot(),
            state.ctrl.position(),
            state.ctrl.mode(),
            state.ctrl.unseen(),
            state.ctrl.is_forked(),
            state.pinned_path.as_deref(),
        );
        // send_replace never fails; views come and go freely.
        self.snapshot_tx.send_replace(snapshot);
    }

    fn with_state(&self, f: impl FnOnce(&mut PlayerState)) {
        let mut state = self.state.lock();
        f(&mut state);
        self.publish(&state);
    }

    // Scrub inputs. All total: numeric targets clamp, nothing fails.

    pub fn step_back(&self) {
        self.with_state(|s| s.ctrl.step_back());
    }

    pub fn step_forward(&self) {
        self.with_state(|s| s.ctrl.step_forward());
    }

    pub fn skip_to_start(&self) {
        self.with_state(|s| s.ctrl.skip_to_start());
    }

    pub fn skip_to_live(&self) {
        self.with_state(|s| s.ctrl.skip_to_live());
    }

    pub fn seek(&self, target: u64) {
        self.with_state(|s| s.ctrl.seek(target));
    }

    pub fn resume_live(&self) {
        self.with_state(|s| s.ctrl.resume_live());
    }

    /// Keep the document pane on one path regardless of which file the
    /// agent touches next; `None` goes back to following the latest touch.
    pub fn pin_path(&self, path: Option<String>) {
        self.with_state(|s| s.pinned_path = path);
    }

    /// A user edit arriving through the rendering port. History is never
    /// rewritten: the edit is appended at the live tip, and if playback
    /// was paused the configured fork policy decides what the cursor does.
    pub fn submit_edit(&self, path: impl Into<String>, content: impl Into<String>) -> u64 {
        let path = path.into();
        let draft = ActionDraft::new(
            ActionKind::FileEdit {
                path: path.clone(),
                content: content.into(),
            },
            format!("Editing file: {path}"),
        );
        let mut state = self.state.lock();
        let was_paused = state.ctrl.mode() == Mode::Paused;
        let seq = self.log.append(draft);
        state.ctrl.on_append(self.log.len());
        if was_paused {
            tracing::debug!(seq, policy = ?self.config.fork_policy, "edit while paused");
            state.ctrl.on_fork(self.config.fork_policy);
        }
        self.publish(&state);
        seq
    }

    /// A command typed by the user: appended pending, resolved later via
    /// [`IngestionPort::update_status`].
    pub fn submit_typed_command(&self, command: impl Into<String>) -> u64 {
        let command = command.into();
        self.submit(
            ActionDraft::new(
                ActionKind::Command {
                    command: command.clone(),
                    output: Vec::new(),
                    exit_code: None,
                },
                format!("Executing command: {command}"),
            )
            .with_status(ActionStatus::Pending),
        )
    }
}

impl IngestionPort for Player {
    fn submit(&self, draft: ActionDraft) -> u64 {
        let mut state = self.state.lock();
        let seq = self.log.append(draft);
        state.ctrl.on_append(self.log.len());
        self.publish(&state);
        seq
    }

    fn update_status(&self, seq: u64, status: ActionStatus) -> Result<(), TimelineError> {
        let result = self.log.update_status(seq, status);
        if let Err(err) = &result {
            // Rejected updates are user-visible no-ops, never fatal.
            tracing::debug!(seq, ?status, error = %err, "status update rejected");
        }
        // Republish either way so views waiting on a resolution wake up
        // even when the update was rejected.
        let state = self.state.lock();
        self.publish(&state);
        result
    }
}
