use serde::{Deserialize, Serialize};

/// Whether the observer is tracking the live tip or holding a fixed
/// position while the log grows behind the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Live,
    Paused,
}

/// What happens when an edit is submitted while playback is paused.
///
/// The edit always lands at the live tip; the policy only decides what
/// the cursor does about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForkPolicy {
    /// Jump the cursor back to live so the observer sees their own edit.
    #[default]
    AutoResume,
    /// Stay paused and raise the `forked` flag until an explicit resume.
    FlagFork,
}

/// State machine over `(position, mode)`.
///
/// Position ranges over `0..=log_len`, where `position == log_len` means
/// caught up to the live tip. Every transition is total: numeric inputs
/// are clamped, and there is no terminal state.
///
/// The controller never touches the log; callers feed it the current
/// length via [`PlaybackController::on_append`] and the scrub inputs.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    position: u64,
    mode: Mode,
    log_len: u64,
    forked: bool,
}

impl PlaybackController {
    /// Starts live at the tip of a log of the given length.
    pub fn new(log_len: u64) -> Self {
        Self {
            position: log_len,
            mode: Mode::Live,
            log_len,
            forked: false,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Records appended past the cursor while paused.
    pub fn unseen(&self) -> u64 {
        self.log_len.saturating_sub(self.position)
    }

    /// Whether a paused-edit fork is pending an explicit resume.
    pub fn is_forked(&self) -> bool {
        self.forked
    }

    /// Progress ratio for the scrub bar, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        self.position as f64 / self.log_len.max(1) as f64
    }

    pub fn step_back(&mut self) {
        self.mode = Mode::Paused;
        self.position = self.position.saturating_sub(1);
    }

    pub fn step_forward(&mut self) {
        self.mode = Mode::Paused;
        self.position = (self.position + 1).min(self.log_len);
    }

    pub fn skip_to_start(&mut self) {
        self.mode = Mode::Paused;
        self.position = 0;
    }

    /// Jump to the tip and keep following it.
    pub fn skip_to_live(&mut self) {
        self.resume_live();
    }

    /// Scrub to an arbitrary target. Out-of-range targets clamp silently:
    /// dragging past either end is a normal user action, not an error.
    /// Reaching the tip this way does NOT resume live.
    pub fn seek(&mut self, target: u64) {
        self.mode = Mode::Paused;
        self.position = target.min(self.log_len);
    }

    pub fn resume_live(&mut self) {
        self.mode = Mode::Live;
        self.position = self.log_len;
        self.forked = false;
    }

    /// React to the log growing to `new_len`. Live mode follows the tip;
    /// paused mode holds position and the gap shows up in [`Self::unseen`].
    /// Idempotent on duplicate or stale notifications.
    pub fn on_append(&mut self, new_len: u64) {
        self.log_len = self.log_len.max(new_len);
        if self.mode == Mode::Live {
            self.position = self.log_len;
        }
    }

    /// Apply the fork policy after an edit landed at the tip while paused.
    pub fn on_fork(&mut self, policy: ForkPolicy) {
        match policy {
            ForkPolicy::AutoResume => self.resume_live(),
            ForkPolicy::FlagFork => self.forked = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_live_at_tip() {
        let ctrl = PlaybackController::new(3);
        assert_eq!(ctrl.mode(), Mode::Live);
        assert_eq!(ctrl.position(), 3);
        assert_eq!(ctrl.unseen(), 0);
    }

    #[test]
    fn stepping_pauses_and_clamps() {
        let mut ctrl = PlaybackController::new(2);
        ctrl.step_back();
        assert_eq!(ctrl.mode(), Mode::Paused);
        assert_eq!(ctrl.position(), 1);

        ctrl.step_back();
        ctrl.step_back(); // clamped at 0
        assert_eq!(ctrl.position(), 0);

        ctrl.step_forward();
        ctrl.step_forward();
        ctrl.step_forward(); // clamped at tip
        assert_eq!(ctrl.position(), 2);
        assert_eq!(ctrl.mode(), Mode::Paused, "reaching tip must not resume");
    }

    #[test]
    fn seek_clamps_both_ends() {
        let mut ctrl = PlaybackController::new(5);
        ctrl.seek(99);
        assert_eq!(ctrl.position(), 5);
        ctrl.seek(0);
        assert_eq!(ctrl.position(), 0);
        assert_eq!(ctrl.mode(), Mode::Paused);
    }

    #[test]
    fn live_follows_appends_paused_holds() {
        let mut ctrl = PlaybackController::new(0);
        ctrl.on_append(1);
        ctrl.on_append(2);
        assert_eq!(ctrl.position(), 2);

        ctrl.seek(1);
        ctrl.on_append(3);
        ctrl.on_append(4);
        assert_eq!(ctrl.position(), 1);
        assert_eq!(ctrl.unseen(), 3);

        ctrl.resume_live();
        assert_eq!(ctrl.mode(), Mode::Live);
        assert_eq!(ctrl.position(), 4);
        assert_eq!(ctrl.unseen(), 0);
    }

    #[test]
    fn duplicate_append_notifications_are_idempotent() {
        let mut ctrl = PlaybackController::new(0);
        ctrl.on_append(2);
        ctrl.on_append(2);
        ctrl.on_append(1); // stale, ignored
        assert_eq!(ctrl.position(), 2);
    }

    #[test]
    fn fork_policy_branches() {
        let mut ctrl = PlaybackController::new(3);
        ctrl.seek(1);
        ctrl.on_append(4);

        let mut auto = ctrl.clone();
        auto.on_fork(ForkPolicy::AutoResume);
        assert_eq!(auto.mode(), Mode::Live);
        assert_eq!(auto.position(), 4);
        assert!(!auto.is_forked());

        let mut flagged = ctrl;
        flagged.on_fork(ForkPolicy::FlagFork);
        assert_eq!(flagged.mode(), Mode::Paused);
        assert_eq!(flagged.position(), 1);
        assert!(flagged.is_forked());

        flagged.resume_live();
        assert!(!flagged.is_forked());
    }

    #[test]
    fn progress_handles_empty_log() {
        let ctrl = PlaybackController::new(0);
        assert_eq!(ctrl.progress(), 0.0);

        let mut ctrl = PlaybackController::new(4);
        ctrl.seek(1);
        assert!((ctrl.progress() - 0.25).abs() < f64::EPSILON);
    }
}
