//! Types shared between controller backends and the poll loop

use std::fmt;

/// Backend-independent controller identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(pub usize);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerInfo {
    pub id: ControllerId,
    pub name: String,
}

impl fmt::Display for ControllerInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Buttons the viewer reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonType {
    A,
    B,
    Start,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

/// Discrete notifications reported by a backend between two ticks
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Disconnected(ControllerId),
    ButtonPressed {
        id: ControllerId,
        button: ButtonType,
    },
}

/// Buttons held at the moment of sampling. `Default` is the neutral state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
}

impl ControllerSnapshot {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Marks `button` as held
    pub fn with(mut self, button: ButtonType) -> Self {
        match button {
            ButtonType::DPadUp => self.dpad_up = true,
            ButtonType::DPadDown => self.dpad_down = true,
            ButtonType::DPadLeft => self.dpad_left = true,
            ButtonType::DPadRight => self.dpad_right = true,
            ButtonType::A => self.a = true,
            ButtonType::B => self.b = true,
            ButtonType::Start => self.start = true,
        }
        self
    }
}

/// Seam between the poll loop and a controller backend.
///
/// `poll_events` is called once at the start of every tick and must be called
/// before `sample`, since backends such as gilrs only update their cached button
/// state while events are drained. Reads for an unknown or disconnected
/// controller return the neutral snapshot.
pub trait InputSource: fmt::Debug {
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Currently connected controllers in discovery order
    fn connected(&self) -> Vec<ControllerInfo>;

    fn is_connected(&self, id: ControllerId) -> bool;

    fn sample(&self, id: ControllerId) -> ControllerSnapshot;
}

#[cfg(test)]
pub(crate) mod scripted {
    //! Test double replaying a prepared controller timeline.
    //!
    //! Clones share one script, so a test keeps a clone while the poll loop owns
    //! the boxed source.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Script {
        controllers: Vec<(ControllerInfo, bool)>,
        held: ControllerSnapshot,
        pending: VecDeque<InputEvent>,
    }

    #[derive(Debug, Default, Clone)]
    pub struct ScriptedSource {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedSource {
        pub fn with_controller(name: &str) -> Self {
            let source = Self::default();
            source.plug(0, name);
            source
        }

        pub fn plug(&self, id: usize, name: &str) {
            let info = ControllerInfo {
                id: ControllerId(id),
                name: name.to_string(),
            };
            let mut script = self.script.lock().unwrap();
            script.controllers.retain(|(c, _)| c.id != info.id);
            script.controllers.push((info, true));
        }

        pub fn unplug(&self, id: usize) {
            let mut script = self.script.lock().unwrap();
            for (info, connected) in &mut script.controllers {
                if info.id == ControllerId(id) {
                    *connected = false;
                }
            }
            script
                .pending
                .push_back(InputEvent::Disconnected(ControllerId(id)));
        }

        pub fn hold(&self, buttons: &[ButtonType]) {
            self.script.lock().unwrap().held = buttons
                .iter()
                .fold(ControllerSnapshot::default(), |s, b| s.with(*b));
        }

        pub fn release_all(&self) {
            self.script.lock().unwrap().held = ControllerSnapshot::default();
        }

        pub fn press(&self, id: usize, button: ButtonType) {
            self.script
                .lock()
                .unwrap()
                .pending
                .push_back(InputEvent::ButtonPressed {
                    id: ControllerId(id),
                    button,
                });
        }
    }

    impl InputSource for ScriptedSource {
        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.script.lock().unwrap().pending.drain(..).collect()
        }

        fn connected(&self) -> Vec<ControllerInfo> {
            self.script
                .lock()
                .unwrap()
                .controllers
                .iter()
                .filter(|(_, connected)| *connected)
                .map(|(info, _)| info.clone())
                .collect()
        }

        fn is_connected(&self, id: ControllerId) -> bool {
            self.script
                .lock()
                .unwrap()
                .controllers
                .iter()
                .any(|(info, connected)| info.id == id && *connected)
        }

        fn sample(&self, id: ControllerId) -> ControllerSnapshot {
            if self.is_connected(id) {
                self.script.lock().unwrap().held
            } else {
                ControllerSnapshot::default()
            }
        }
    }
}
