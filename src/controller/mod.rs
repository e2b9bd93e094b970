//! Controller subsystem for gamepad input
//!
//! 1. [`input`] - Backend independent types and the [`InputSource`] seam
//! 2. [`gilrs_source`] - gilrs implementation of the seam
//! 3. [`binding`] - Lazy acquisition of the first connected controller
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► GilrsSource ──► NavigationLoop ──► ViewerCommand ──► UI
//!             (events + held buttons)  (one action per tick)
//! ```
//!
//! The source is polled rather than subscribed to. The only event the loop
//! reacts to directly is the Start (menu) button press.

pub mod binding;
pub mod gilrs_source;
pub mod input;

pub use binding::{BindingChange, ControllerBinding, DisconnectPolicy};
pub use gilrs_source::GilrsSource;
pub use input::{ButtonType, ControllerId, ControllerInfo, ControllerSnapshot, InputEvent, InputSource};

/// Errors that can occur while setting up a controller backend
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Backend could not be created, e.g. no input subsystem on this platform
    #[error("Initialization error: {0}")]
    InitializationError(String),
}
