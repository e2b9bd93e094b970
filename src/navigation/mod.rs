//! Navigation state and the controller poll loop feeding it
//!
//! [`NavigationState`] is owned by the UI and mutated only there. The
//! [`poll_loop`] task never touches it directly; it sends [`ViewerCommand`]s
//! which the UI applies at the start of the next frame.

pub mod debounce;
pub mod poll_loop;

use crate::config::NavigationConfig;
use crate::controller::{BindingChange, ControllerSnapshot};
use tracing::debug;

pub use debounce::DebounceClock;
pub use poll_loop::{LoopSettings, NavigationLoop, PollLoopHandle};

/// A single discrete change to the display state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    NextPage,
    PreviousPage,
    ZoomIn,
    ZoomOut,
    PanUp,
    PanDown,
}

impl NavAction {
    /// First held input in priority order: right, left, A, B, up, down
    pub fn from_snapshot(snapshot: &ControllerSnapshot) -> Option<Self> {
        if snapshot.dpad_right {
            Some(NavAction::NextPage)
        } else if snapshot.dpad_left {
            Some(NavAction::PreviousPage)
        } else if snapshot.a {
            Some(NavAction::ZoomIn)
        } else if snapshot.b {
            Some(NavAction::ZoomOut)
        } else if snapshot.dpad_up {
            Some(NavAction::PanUp)
        } else if snapshot.dpad_down {
            Some(NavAction::PanDown)
        } else {
            None
        }
    }
}

/// Messages from background tasks to the UI context
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    Navigate(NavAction),
    OpenPicker,
    Controller(BindingChange),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationState {
    current_index: usize,
    pub scale: f32,
    pub vertical_offset: f32,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current_index: 0,
            scale: 1.0,
            vertical_offset: 0.0,
        }
    }
}

impl NavigationState {
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Applies `action` against a list of `page_count` pages. Returns whether
    /// anything changed.
    ///
    /// Paging forward stops at the last page; paging back stops at 0. Scale and
    /// offset are unbounded.
    pub fn apply(
        &mut self,
        action: NavAction,
        page_count: usize,
        settings: &NavigationConfig,
    ) -> bool {
        let before = *self;
        match action {
            NavAction::NextPage => {
                self.current_index = (self.current_index + 1).min(page_count.saturating_sub(1));
            }
            NavAction::PreviousPage => {
                self.current_index = self.current_index.saturating_sub(1);
            }
            NavAction::ZoomIn => self.scale *= settings.zoom_factor,
            NavAction::ZoomOut => self.scale /= settings.zoom_factor,
            NavAction::PanUp => self.vertical_offset += settings.pan_step,
            NavAction::PanDown => self.vertical_offset -= settings.pan_step,
        }
        debug!("Applied {:?}: {:?} -> {:?}", action, before, self);
        before != *self
    }

    /// Multiplies the scale directly, used for pinch gestures
    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Re-establishes the index invariant after the list changed length
    pub fn clamp_to(&mut self, page_count: usize) {
        self.current_index = self.current_index.min(page_count.saturating_sub(1));
    }

    /// Back to the first page at 100%, used when the content is replaced
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> NavigationConfig {
        NavigationConfig::default()
    }

    #[test]
    fn right_has_priority_over_everything_else() {
        let all = ControllerSnapshot {
            dpad_up: true,
            dpad_down: true,
            dpad_left: true,
            dpad_right: true,
            a: true,
            b: true,
            start: true,
        };
        assert_eq!(NavAction::from_snapshot(&all), Some(NavAction::NextPage));

        let face_and_pan = ControllerSnapshot {
            a: true,
            b: true,
            dpad_up: true,
            ..Default::default()
        };
        assert_eq!(
            NavAction::from_snapshot(&face_and_pan),
            Some(NavAction::ZoomIn)
        );

        let pan = ControllerSnapshot {
            dpad_up: true,
            dpad_down: true,
            ..Default::default()
        };
        assert_eq!(NavAction::from_snapshot(&pan), Some(NavAction::PanUp));
    }

    #[test]
    fn start_alone_is_not_a_navigation_action() {
        let start = ControllerSnapshot {
            start: true,
            ..Default::default()
        };
        assert_eq!(NavAction::from_snapshot(&start), None);
        assert_eq!(NavAction::from_snapshot(&ControllerSnapshot::default()), None);
    }

    #[test]
    fn forward_paging_clamps_at_the_last_page() {
        let mut state = NavigationState::default();
        assert!(state.apply(NavAction::NextPage, 3, &settings()));
        assert!(state.apply(NavAction::NextPage, 3, &settings()));
        assert_eq!(state.current_index(), 2);

        assert!(!state.apply(NavAction::NextPage, 3, &settings()));
        assert_eq!(state.current_index(), 2);
    }

    #[test]
    fn backward_paging_never_goes_below_zero() {
        let mut state = NavigationState::default();
        for _ in 0..5 {
            state.apply(NavAction::PreviousPage, 4, &settings());
        }
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn empty_list_keeps_index_at_zero() {
        let mut state = NavigationState::default();
        assert!(!state.apply(NavAction::NextPage, 0, &settings()));
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn zoom_in_is_undone_by_the_same_number_of_zoom_outs() {
        let mut state = NavigationState::default();
        for _ in 0..7 {
            state.apply(NavAction::ZoomIn, 1, &settings());
        }
        assert!((state.scale - 1.1f32.powi(7)).abs() < 1e-4);

        for _ in 0..7 {
            state.apply(NavAction::ZoomOut, 1, &settings());
        }
        assert!((state.scale - 1.0).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_by_fixed_steps() {
        let mut state = NavigationState::default();
        state.apply(NavAction::PanUp, 1, &settings());
        state.apply(NavAction::PanUp, 1, &settings());
        state.apply(NavAction::PanDown, 1, &settings());
        assert_eq!(state.vertical_offset, 50.0);
    }

    #[test]
    fn clamp_follows_a_shrinking_list() {
        let mut state = NavigationState::default();
        state.apply(NavAction::NextPage, 10, &settings());
        state.apply(NavAction::NextPage, 10, &settings());
        state.clamp_to(1);
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn pinch_ignores_degenerate_factors() {
        let mut state = NavigationState::default();
        state.zoom_by(0.0);
        state.zoom_by(f32::NAN);
        state.zoom_by(2.0);
        assert_eq!(state.scale, 2.0);
    }
}
