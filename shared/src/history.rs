use crate::snapshot::Snapshot;

/// Linear undo/redo stack of canvas snapshots.
///
/// `step` is `None` in the cleared state and otherwise indexes the snapshot
/// currently on screen. Pushing after an undo discards the redo branch.
#[derive(Clone, Debug, Default)]
pub struct CanvasHistory {
    snapshots: Vec<Snapshot>,
    step: Option<usize>,
}

/// What the caller must do to the surface after a history move.
#[derive(Clone, Debug, PartialEq)]
pub enum HistoryMove {
    Restore(Snapshot),
    Clear,
    Stay,
}

impl CanvasHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn step(&self) -> Option<usize> {
        self.step
    }

    /// Signed position where `-1` is the cleared state.
    pub fn step_index(&self) -> isize {
        self.step.map_or(-1, |step| step as isize)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.step.and_then(|step| self.snapshots.get(step))
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn can_undo(&self) -> bool {
        self.step.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.snapshots.len() > self.next_step()
    }

    fn next_step(&self) -> usize {
        self.step.map_or(0, |step| step + 1)
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        let next = self.next_step();
        self.snapshots.truncate(next);
        self.snapshots.push(snapshot);
        self.step = Some(next);
    }

    pub fn undo(&mut self) -> HistoryMove {
        match self.step {
            None => HistoryMove::Stay,
            Some(0) => {
                self.step = None;
                HistoryMove::Clear
            }
            Some(step) => {
                self.step = Some(step - 1);
                HistoryMove::Restore(self.snapshots[step - 1].clone())
            }
        }
    }

    pub fn redo(&mut self) -> HistoryMove {
        let next = self.next_step();
        match self.snapshots.get(next) {
            Some(snapshot) => {
                self.step = Some(next);
                HistoryMove::Restore(snapshot.clone())
            }
            None => HistoryMove::Stay,
        }
    }

    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.step = None;
    }

    /// Replaces the whole stack with a single entry at step zero.
    pub fn prime(&mut self, snapshot: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.step = Some(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tag: &str) -> Snapshot {
        Snapshot::from_data_url(format!("data:text/plain,{tag}")).unwrap()
    }

    fn assert_in_bounds(history: &CanvasHistory) {
        let step = history.step_index();
        assert!(step >= -1 && step < history.len() as isize, "step {step} out of bounds");
    }

    #[test]
    fn redo_after_fresh_push_is_noop() {
        let mut history = CanvasHistory::new();
        history.push(snap("a"));
        assert_eq!(history.redo(), HistoryMove::Stay);
        assert_eq!(history.step(), Some(0));
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut history = CanvasHistory::new();
        history.push(snap("a"));
        history.push(snap("b"));
        history.push(snap("c"));
        assert_eq!(history.step_index(), 2);

        assert_eq!(history.undo(), HistoryMove::Restore(snap("b")));
        assert_eq!(history.undo(), HistoryMove::Restore(snap("a")));
        assert_eq!(history.step_index(), 0);

        history.push(snap("d"));
        assert_eq!(history.snapshots(), &[snap("a"), snap("d")]);
        assert_eq!(history.step_index(), 1);
        assert_eq!(history.redo(), HistoryMove::Stay);
    }

    #[test]
    fn undo_from_first_step_clears_then_stops() {
        let mut history = CanvasHistory::new();
        history.push(snap("a"));
        assert_eq!(history.undo(), HistoryMove::Clear);
        assert_eq!(history.step_index(), -1);
        assert_eq!(history.undo(), HistoryMove::Stay);
        assert_eq!(history.step_index(), -1);
        assert_eq!(history.len(), 1);

        assert_eq!(history.redo(), HistoryMove::Restore(snap("a")));
        assert_eq!(history.step_index(), 0);
    }

    #[test]
    fn push_from_cleared_state_replaces_everything() {
        let mut history = CanvasHistory::new();
        history.push(snap("a"));
        history.push(snap("b"));
        history.undo();
        history.undo();
        history.push(snap("c"));
        assert_eq!(history.snapshots(), &[snap("c")]);
        assert_eq!(history.step(), Some(0));
    }

    #[test]
    fn step_stays_in_bounds_for_mixed_sequences() {
        let mut history = CanvasHistory::new();
        // 0 = push, 1 = undo, 2 = redo
        let script = [0, 0, 1, 1, 1, 2, 0, 2, 2, 1, 0, 0, 1, 2, 1, 1, 1, 1, 2, 2, 2, 0];
        for (index, op) in script.into_iter().enumerate() {
            match op {
                0 => history.push(snap(&index.to_string())),
                1 => {
                    history.undo();
                }
                _ => {
                    history.redo();
                }
            }
            assert_in_bounds(&history);
        }
    }

    #[test]
    fn prime_and_reset() {
        let mut history = CanvasHistory::new();
        history.push(snap("a"));
        history.push(snap("b"));
        history.prime(snap("saved"));
        assert_eq!(history.snapshots(), &[snap("saved")]);
        assert_eq!(history.current(), Some(&snap("saved")));

        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.step_index(), -1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
