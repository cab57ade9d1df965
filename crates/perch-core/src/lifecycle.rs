//! Overlay lifecycle state machine.
//!
//! The controller only decides transitions; the indicator carries out their side
//! effects. Clicks that land while a transition is in flight (`Appearing`,
//! `Dismissing`) are ignored. An explicit `Show` during `Dismissing` cancels the
//! fade and restarts the appearance.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Hidden,
    Appearing,
    Visible,
    Dismissing,
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelState::Hidden => "hidden",
            PanelState::Appearing => "appearing",
            PanelState::Visible => "visible",
            PanelState::Dismissing => "dismissing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Host asked for the overlay.
    Show,
    /// Host asked to close the overlay.
    Dismiss,
    /// Primary click on the indicator.
    Toggle,
    FocusGained,
    FocusLost,
    OutsideClick,
    FadeFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PanelState,
    pub to: PanelState,
}

#[derive(Debug, Default)]
pub struct LifecycleController {
    state: PanelState,
}

impl LifecycleController {
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Applies `trigger`, returning the transition taken, or `None` when it is ignored.
    pub fn fire(&mut self, trigger: Trigger) -> Option<Transition> {
        use PanelState::*;
        use Trigger::*;

        let to = match (self.state, trigger) {
            (Hidden, Show | Toggle) => Appearing,
            (Dismissing, Show) => Appearing,
            (Appearing, FocusGained) => Visible,
            (Appearing, Dismiss | FocusLost) => Dismissing,
            (Visible, Dismiss | Toggle | FocusLost | OutsideClick) => Dismissing,
            (Dismissing, FadeFinished) => Hidden,
            _ => return None,
        };
        let transition = Transition {
            from: self.state,
            to,
        };
        self.state = to;
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGGERS: [Trigger; 7] = [
        Trigger::Show,
        Trigger::Dismiss,
        Trigger::Toggle,
        Trigger::FocusGained,
        Trigger::FocusLost,
        Trigger::OutsideClick,
        Trigger::FadeFinished,
    ];

    fn controller_in(state: PanelState) -> LifecycleController {
        LifecycleController { state }
    }

    fn reachable_from(state: PanelState) -> Vec<PanelState> {
        TRIGGERS
            .iter()
            .filter_map(|&trigger| controller_in(state).fire(trigger).map(|t| t.to))
            .collect()
    }

    #[test]
    fn hidden_only_reaches_appearing() {
        let reachable = reachable_from(PanelState::Hidden);
        assert!(!reachable.is_empty());
        assert!(reachable.iter().all(|&s| s == PanelState::Appearing));
    }

    #[test]
    fn visible_only_reaches_dismissing() {
        let reachable = reachable_from(PanelState::Visible);
        assert_eq!(reachable.len(), 4);
        assert!(reachable.iter().all(|&s| s == PanelState::Dismissing));
    }

    #[test]
    fn dismissing_completes_to_hidden() {
        let mut controller = controller_in(PanelState::Dismissing);
        let transition = controller.fire(Trigger::FadeFinished).unwrap();
        assert_eq!(transition.to, PanelState::Hidden);
    }

    #[test]
    fn clicks_during_transitions_are_ignored() {
        for state in [PanelState::Appearing, PanelState::Dismissing] {
            let mut controller = controller_in(state);
            assert_eq!(controller.fire(Trigger::Toggle), None);
            assert_eq!(controller.state(), state);
        }
    }

    #[test]
    fn show_restarts_a_running_dismissal() {
        let mut controller = controller_in(PanelState::Dismissing);
        let transition = controller.fire(Trigger::Show).unwrap();
        assert_eq!(transition.from, PanelState::Dismissing);
        assert_eq!(transition.to, PanelState::Appearing);
    }

    #[test]
    fn show_and_dismiss_are_idempotent() {
        assert_eq!(controller_in(PanelState::Visible).fire(Trigger::Show), None);
        assert_eq!(controller_in(PanelState::Appearing).fire(Trigger::Show), None);
        assert_eq!(controller_in(PanelState::Hidden).fire(Trigger::Dismiss), None);
        assert_eq!(controller_in(PanelState::Dismissing).fire(Trigger::Dismiss), None);
    }

    #[test]
    fn visible_is_never_left_straight_to_hidden() {
        for trigger in TRIGGERS {
            let mut controller = controller_in(PanelState::Visible);
            if let Some(transition) = controller.fire(trigger) {
                assert_ne!(transition.to, PanelState::Hidden);
            }
        }
    }
}
