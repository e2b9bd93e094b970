//! # padview User Interface
//!
//! The eframe application owning all viewer state. Every frame it:
//!
//! 1. drains [`ViewerCommand`]s from the controller poll loop,
//! 2. drains finished import sessions,
//! 3. applies keyboard, swipe and pinch input,
//! 4. renders the top bar, the current page and the status bar.
//!
//! Steps 1-3 are the only places [`ViewerState`] changes, so every mutation is
//! rendered in the same frame it is applied in.
//!
//! ## Lifecycle
//! The poll loop is started when the app is created and stopped when it is
//! dropped; [`PollLoopHandle`] cancels the timer on drop, which covers window
//! close and unwinding alike.

pub mod common;
pub mod gestures;
pub mod state;
pub mod viewer;

use eframe::egui::{self, Button, CentralPanel, RichText, TopBottomPanel, Vec2};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::acquisition::{spawn_import, FilePicker, ImportEvent, PickRequest, RfdPicker};
use crate::config::ViewerConfig;
use crate::controller::{GilrsSource, InputSource};
use crate::navigation::poll_loop::RepaintSignal;
use crate::navigation::{LoopSettings, PollLoopHandle, ViewerCommand};

use self::common::{bar_frame, connection_indicator, UiColors};
use self::gestures::SwipeTracker;
use self::state::{Effect, ViewerState};
use self::viewer::PageView;

const COMMAND_QUEUE: usize = 64;

pub struct ViewerApp {
    state: ViewerState,
    config: ViewerConfig,
    command_receiver: mpsc::Receiver<ViewerCommand>,
    import_sender: mpsc::Sender<ImportEvent>,
    import_receiver: mpsc::Receiver<ImportEvent>,
    picker: Arc<dyn FilePicker>,
    page_view: PageView,
    swipe: SwipeTracker,
    runtime: Handle,
    repaint: RepaintSignal,
    /// Dropping this stops the controller timer
    _poll_loop: PollLoopHandle,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig, runtime: Handle) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        let repaint = RepaintSignal::new(cc.egui_ctx.clone());

        let (command_sender, command_receiver) = mpsc::channel(COMMAND_QUEUE);
        let (import_sender, import_receiver) = mpsc::channel(4);

        info!("Starting controller poll loop");
        let poll_loop = PollLoopHandle::spawn(
            &runtime,
            || GilrsSource::new().map(|source| Box::new(source) as Box<dyn InputSource>),
            LoopSettings::from(&config.controller),
            command_sender,
            repaint.clone(),
        );

        Self {
            state: ViewerState::new(config.navigation.clone(), config.import.mode),
            page_view: PageView::new(runtime.clone(), repaint.clone()),
            picker: Arc::new(RfdPicker),
            command_receiver,
            import_sender,
            import_receiver,
            swipe: SwipeTracker::default(),
            config,
            runtime,
            repaint,
            _poll_loop: poll_loop,
        }
    }

    fn apply(&mut self, command: ViewerCommand) {
        if let Some(Effect::OpenPicker) = self.state.handle_command(command) {
            self.open_picker();
        }
    }

    /// Starts a picker session; the state must already be marked as picking
    fn open_picker(&self) {
        let request = PickRequest {
            filter: self.config.import.filter,
            allow_multiple: self.config.import.allow_multiple,
        };
        spawn_import(
            &self.runtime,
            self.picker.clone(),
            request,
            self.import_sender.clone(),
            self.repaint.clone(),
        );
    }

    fn drain_background(&mut self) {
        while let Ok(command) = self.command_receiver.try_recv() {
            debug!("Controller command: {:?}", command);
            self.apply(command);
        }
        while let Ok(event) = self.import_receiver.try_recv() {
            self.state.handle_import(event);
        }
    }

    fn handle_direct_input(&mut self, ctx: &egui::Context) {
        let (commands, pinch) =
            ctx.input(|input| (gestures::keyboard_commands(input), gestures::pinch_factor(input)));

        for command in commands {
            self.apply(command);
        }
        if let Some(factor) = pinch {
            self.state.navigation.zoom_by(factor);
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        bar_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                let import = Button::new(RichText::new("📂 Import").size(20.0))
                    .min_size(Vec2::new(120.0, 32.0));
                let clicked = ui
                    .add_enabled(!self.state.picker_open(), import)
                    .on_hover_text("Open files (O, or Start on the controller)")
                    .clicked();
                if clicked && self.state.request_picker() {
                    self.open_picker();
                }

                if let Some(page) = self.state.current_page() {
                    ui.label(RichText::new(page.label()).strong());
                }
            });
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        bar_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                let (dot, color) = connection_indicator(self.state.controller.is_some());
                let name = self
                    .state
                    .controller
                    .as_ref()
                    .map(|info| info.name.as_str())
                    .unwrap_or("No controller");
                ui.label(RichText::new(format!("{} {}", name, dot)).color(color));
                ui.separator();
                ui.label(format!("Page {}", self.state.position_label()));
                ui.separator();
                ui.label(format!("Zoom {}", self.state.zoom_label()));
                if let Some(status) = &self.state.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_background();
        self.handle_direct_input(ctx);

        TopBottomPanel::top("top_panel")
            .show_separator_line(false)
            .show(ctx, |ui| self.top_bar(ui));

        TopBottomPanel::bottom("bottom_panel")
            .show_separator_line(false)
            .show(ctx, |ui| self.status_bar(ui));

        CentralPanel::default()
            .frame(egui::Frame::new().fill(UiColors::MAIN_BG))
            .show(ctx, |ui| {
                let response = self.page_view.show(ui, &self.state);
                if let Some(action) = self.swipe.track(&response) {
                    self.state.navigate(action);
                }
            });

        ctx.request_repaint_after(Duration::from_millis(self.config.ui.repaint_ms));
    }
}
