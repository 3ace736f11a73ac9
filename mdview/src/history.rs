//! Back and forward navigation stacks

use std::path::{Path, PathBuf};

/// How a navigation affects the history stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// Push the current document onto `back` and clear `forward`
    PushCurrent,
    /// Clear both stacks
    Reset,
    /// Leave both stacks alone (back/forward traversal)
    Preserve,
}

/// Documents reachable with back and forward
///
/// The stacks never hold fragments; anchors are not part of history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationHistory {
    back: Vec<PathBuf>,
    forward: Vec<PathBuf>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a navigation from `current` according to `action`
    pub fn apply(&mut self, action: HistoryAction, current: Option<&Path>) {
        match action {
            HistoryAction::PushCurrent => {
                if let Some(current) = current {
                    self.back.push(current.to_path_buf());
                }
                self.forward.clear();
            }
            HistoryAction::Reset => self.reset(),
            HistoryAction::Preserve => {}
        }
    }

    /// Pop the previous document, moving `current` onto `forward`
    pub fn step_back(&mut self, current: Option<&Path>) -> Option<PathBuf> {
        let previous = self.back.pop()?;
        if let Some(current) = current {
            self.forward.push(current.to_path_buf());
        }
        Some(previous)
    }

    /// Pop the next document, moving `current` onto `back`
    pub fn step_forward(&mut self, current: Option<&Path>) -> Option<PathBuf> {
        let next = self.forward.pop()?;
        if let Some(current) = current {
            self.back.push(current.to_path_buf());
        }
        Some(next)
    }

    pub fn reset(&mut self) {
        self.back.clear();
        self.forward.clear();
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Back stack, oldest first
    pub fn back(&self) -> &[PathBuf] {
        &self.back
    }

    /// Forward stack, farthest first
    pub fn forward(&self) -> &[PathBuf] {
        &self.forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(format!("/repo/{}.md", name))
    }

    #[test]
    fn test_push_current_clears_forward() {
        let mut history = NavigationHistory::new();
        history.apply(HistoryAction::PushCurrent, Some(&p("a")));
        history.apply(HistoryAction::PushCurrent, Some(&p("b")));
        assert_eq!(history.step_back(Some(&p("c"))), Some(p("b")));
        assert!(history.can_go_forward());

        history.apply(HistoryAction::PushCurrent, Some(&p("b")));
        assert!(!history.can_go_forward());
        assert_eq!(history.back(), &[p("a"), p("b")]);
    }

    #[test]
    fn test_push_without_current_only_clears_forward() {
        let mut history = NavigationHistory::new();
        history.apply(HistoryAction::PushCurrent, None);
        assert!(!history.can_go_back());
    }

    #[test]
    fn test_back_then_forward_restores_sizes() {
        let mut history = NavigationHistory::new();
        history.apply(HistoryAction::PushCurrent, Some(&p("a")));
        history.apply(HistoryAction::PushCurrent, Some(&p("b")));
        let before = history.clone();

        let previous = history.step_back(Some(&p("c"))).unwrap();
        assert_eq!(previous, p("b"));
        let next = history.step_forward(Some(&previous)).unwrap();
        assert_eq!(next, p("c"));

        assert_eq!(history, before);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = NavigationHistory::new();
        assert_eq!(history.step_back(Some(&p("a"))), None);
        assert_eq!(history.step_forward(Some(&p("a"))), None);
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_reset_and_preserve() {
        let mut history = NavigationHistory::new();
        history.apply(HistoryAction::PushCurrent, Some(&p("a")));
        history.apply(HistoryAction::Preserve, Some(&p("b")));
        assert_eq!(history.back().len(), 1);

        history.apply(HistoryAction::Reset, Some(&p("b")));
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }
}
