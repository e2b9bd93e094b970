//! # UI Common Components
//!
//! Shared colors and small layout helpers for the viewer panels.

use eframe::egui::{Color32, Frame, Stroke};

/// Centralized color palette for the viewer's dark theme.
///
/// Background colors go from darkest to lightest: EXTREME_BG → INNER_BG → MAIN_BG.
/// ACTIVE and INACTIVE mark the controller connection state.
pub struct UiColors;

impl UiColors {
    /// Primary background color for panels (RGB: 30, 30, 30)
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Secondary background color for nested components (RGB: 25, 25, 25)
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);

    /// Page area background (RGB: 20, 20, 20)
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);

    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Controller connected (RGB: 50, 200, 20)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// No controller bound (RGB: 200, 50, 20)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

/// Frame used for the top and bottom bars
pub fn bar_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .fill(UiColors::INNER_BG)
        .inner_margin(4)
        .outer_margin(2)
}

/// Status dot shown next to the controller name
pub fn connection_indicator(connected: bool) -> (&'static str, Color32) {
    if connected {
        ("🟢", UiColors::ACTIVE)
    } else {
        ("🔴", UiColors::INACTIVE)
    }
}
