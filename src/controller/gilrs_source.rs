//! gilrs backed [`InputSource`]

use chrono::Local;
use gilrs::{Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use super::input::{ButtonType, ControllerId, ControllerInfo, ControllerSnapshot, InputEvent, InputSource};
use super::ControllerError;

pub struct GilrsSource {
    gilrs: Gilrs,
}

impl std::fmt::Debug for GilrsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GilrsSource")
            .field("gamepads", &self.gilrs.gamepads().count())
            .finish()
    }
}

impl GilrsSource {
    pub fn new() -> Result<Self, ControllerError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(ControllerError::InitializationError(e.to_string()));
            }
        };

        let source = Self { gilrs };
        let gamepads = source.connected();
        if gamepads.is_empty() {
            warn!("No gamepad connected, continuing in idle mode");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, gamepad) in gamepads.iter().enumerate() {
                info!("  [{}] {}", idx, gamepad);
            }
        }
        Ok(source)
    }

    fn gamepad(&self, id: ControllerId) -> Option<Gamepad<'_>> {
        self.gilrs
            .gamepads()
            .find(|(gamepad_id, _)| usize::from(*gamepad_id) == id.0)
            .map(|(_, gamepad)| gamepad)
    }
}

fn controller_id(id: GamepadId) -> ControllerId {
    ControllerId(usize::from(id))
}

impl InputSource for GilrsSource {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let id = controller_id(id);
            match event {
                EventType::ButtonPressed(button, _) => {
                    debug!(
                        "Button pressed: {:?} on {} at {}",
                        button,
                        id,
                        Local::now().format("%H:%M:%S.%3f")
                    );
                    if let Some(button) = map_button(button) {
                        events.push(InputEvent::ButtonPressed { id, button });
                    }
                }
                EventType::Connected => {
                    info!("Controller {} connected", id);
                }
                EventType::Disconnected => {
                    warn!("Controller {} disconnected", id);
                    events.push(InputEvent::Disconnected(id));
                }
                _ => {}
            }
        }

        events
    }

    fn connected(&self) -> Vec<ControllerInfo> {
        self.gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| ControllerInfo {
                id: controller_id(id),
                name: gamepad.name().to_string(),
            })
            .collect()
    }

    fn is_connected(&self, id: ControllerId) -> bool {
        self.gamepad(id)
            .map(|gamepad| gamepad.is_connected())
            .unwrap_or(false)
    }

    fn sample(&self, id: ControllerId) -> ControllerSnapshot {
        let Some(gamepad) = self.gamepad(id).filter(|g| g.is_connected()) else {
            return ControllerSnapshot::default();
        };

        ControllerSnapshot {
            dpad_up: gamepad.is_pressed(Button::DPadUp),
            dpad_down: gamepad.is_pressed(Button::DPadDown),
            dpad_left: gamepad.is_pressed(Button::DPadLeft),
            dpad_right: gamepad.is_pressed(Button::DPadRight),
            a: gamepad.is_pressed(Button::South),
            b: gamepad.is_pressed(Button::East),
            start: gamepad.is_pressed(Button::Start),
        }
    }
}

// Helper function to map gilrs Button to our ButtonType
fn map_button(button: Button) -> Option<ButtonType> {
    match button {
        Button::South => Some(ButtonType::A),
        Button::East => Some(ButtonType::B),
        Button::Start => Some(ButtonType::Start),
        Button::DPadUp => Some(ButtonType::DPadUp),
        Button::DPadDown => Some(ButtonType::DPadDown),
        Button::DPadLeft => Some(ButtonType::DPadLeft),
        Button::DPadRight => Some(ButtonType::DPadRight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_follow_the_south_east_layout() {
        assert_eq!(map_button(Button::South), Some(ButtonType::A));
        assert_eq!(map_button(Button::East), Some(ButtonType::B));
        assert_eq!(map_button(Button::Start), Some(ButtonType::Start));
    }

    #[test]
    fn buttons_without_a_viewer_action_are_ignored() {
        assert_eq!(map_button(Button::North), None);
        assert_eq!(map_button(Button::West), None);
        assert_eq!(map_button(Button::Select), None);
        assert_eq!(map_button(Button::Mode), None);
        assert_eq!(map_button(Button::LeftTrigger2), None);
        assert_eq!(map_button(Button::Unknown), None);
    }
}
