//! Keyboard, swipe and pinch input
//!
//! Direct user input maps onto the same [`ViewerCommand`]s the controller loop
//! produces, but is applied immediately without the debounce.

use egui::{InputState, Key, Response};

use crate::navigation::{NavAction, ViewerCommand};

/// Horizontal drag distance in points that turns a drag into a page turn
pub const SWIPE_THRESHOLD: f32 = 80.0;

pub fn key_command(key: Key) -> Option<ViewerCommand> {
    let action = match key {
        Key::ArrowRight | Key::PageDown => NavAction::NextPage,
        Key::ArrowLeft | Key::PageUp => NavAction::PreviousPage,
        Key::Plus | Key::Equals => NavAction::ZoomIn,
        Key::Minus => NavAction::ZoomOut,
        Key::ArrowUp => NavAction::PanUp,
        Key::ArrowDown => NavAction::PanDown,
        Key::O => return Some(ViewerCommand::OpenPicker),
        _ => return None,
    };
    Some(ViewerCommand::Navigate(action))
}

/// Commands for every key pressed this frame, in press order
pub fn keyboard_commands(input: &InputState) -> Vec<ViewerCommand> {
    input
        .events
        .iter()
        .filter_map(|event| match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } if !modifiers.ctrl && !modifiers.command => key_command(*key),
            _ => None,
        })
        .collect()
}

/// Accumulates horizontal drag until it is released
#[derive(Debug, Default)]
pub struct SwipeTracker {
    travelled: f32,
}

impl SwipeTracker {
    pub fn drag(&mut self, delta_x: f32) {
        self.travelled += delta_x;
    }

    /// Dragging content to the left reveals the next page
    pub fn release(&mut self) -> Option<NavAction> {
        let travelled = std::mem::take(&mut self.travelled);
        if travelled <= -SWIPE_THRESHOLD {
            Some(NavAction::NextPage)
        } else if travelled >= SWIPE_THRESHOLD {
            Some(NavAction::PreviousPage)
        } else {
            None
        }
    }

    /// Feeds a frame's drag response, returns a page turn once the drag ends
    pub fn track(&mut self, response: &Response) -> Option<NavAction> {
        if response.dragged() {
            self.drag(response.drag_delta().x);
        }
        if response.drag_stopped() {
            return self.release();
        }
        None
    }
}

/// Pinch or ctrl+scroll zoom factor for this frame, `None` when unchanged
pub fn pinch_factor(input: &InputState) -> Option<f32> {
    let factor = input.zoom_delta();
    ((factor - 1.0).abs() > f32::EPSILON).then_some(factor)
}
