//! Controller poll loop
//!
//! A recurring timer samples the bound controller and turns held buttons into
//! at most one [`NavAction`] per tick, rate limited by the [`DebounceClock`].
//! Resulting [`ViewerCommand`]s go to the UI over a bounded channel; the loop
//! itself never mutates display state.
//!
//! ```text
//! Idle ──start()──► Polling ──run() until cancelled──► Stopped
//! ```
//!
//! The loop runs on a blocking-pool thread because gilrs contexts are not
//! `Send` on every platform. [`PollLoopHandle`] owns the cancellation token and
//! cancels it when dropped.

use statum::{machine, state};
use std::fmt;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use super::{DebounceClock, NavAction, ViewerCommand};
use crate::config::ControllerConfig;
use crate::controller::{
    ButtonType, ControllerBinding, ControllerError, DisconnectPolicy, InputEvent, InputSource,
};

#[derive(Clone, Debug, PartialEq)]
pub struct LoopSettings {
    pub interval: Duration,
    pub tolerance: Duration,
    pub debounce: Duration,
    pub disconnect_policy: DisconnectPolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&ControllerConfig::default())
    }
}

impl From<&ControllerConfig> for LoopSettings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            tolerance: config.poll_tolerance(),
            debounce: config.debounce(),
            disconnect_policy: config.disconnect_policy,
        }
    }
}

/// Wakes the UI after a command was queued so it renders before the next tick
#[derive(Clone, Default)]
pub struct RepaintSignal(Option<egui::Context>);

impl RepaintSignal {
    pub fn new(ctx: egui::Context) -> Self {
        Self(Some(ctx))
    }

    pub fn request(&self) {
        if let Some(ctx) = &self.0 {
            ctx.request_repaint();
        }
    }
}

impl fmt::Debug for RepaintSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RepaintSignal")
            .field(&self.0.is_some())
            .finish()
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum LoopState {
    Idle,
    Polling,
    Stopped,
}

#[machine]
#[derive(Debug)]
pub struct NavigationLoop<S: LoopState> {
    source: Box<dyn InputSource>,
    settings: LoopSettings,
    binding: ControllerBinding,
    debounce: DebounceClock,
    command_sender: mpsc::Sender<ViewerCommand>,
    repaint: RepaintSignal,
}

impl<S: LoopState> NavigationLoop<S> {
    pub fn binding(&self) -> &ControllerBinding {
        &self.binding
    }
}

impl NavigationLoop<Idle> {
    pub fn create(
        source: Box<dyn InputSource>,
        settings: LoopSettings,
        command_sender: mpsc::Sender<ViewerCommand>,
        repaint: RepaintSignal,
    ) -> Self {
        debug!("Creating navigation loop with settings: {:?}", settings);
        let debounce = DebounceClock::new(settings.debounce);
        Self::new(
            source,
            settings,
            ControllerBinding::Unbound,
            debounce,
            command_sender,
            repaint,
        )
    }

    pub fn start(self) -> NavigationLoop<Polling> {
        info!(
            "Navigation loop polling every {:?} (debounce {:?})",
            self.settings.interval, self.settings.debounce
        );
        self.transition()
    }
}

impl NavigationLoop<Polling> {
    /// One poll step. Returns the commands for the UI in the order they should
    /// be applied; at most one of them is a [`ViewerCommand::Navigate`].
    pub fn tick(&mut self, now: std::time::Instant) -> Vec<ViewerCommand> {
        let mut commands = Vec::new();
        let events = self.source.poll_events();

        if let Some(change) =
            self.binding
                .refresh(self.source.as_ref(), &events, self.settings.disconnect_policy)
        {
            commands.push(ViewerCommand::Controller(change));
        }

        let Some(id) = self.binding.id() else {
            return commands;
        };

        // Menu hook, event driven and not subject to the debounce
        let menu_pressed = events.iter().any(|event| {
            matches!(
                event,
                InputEvent::ButtonPressed { id: pressed, button: ButtonType::Start } if *pressed == id
            )
        });
        if menu_pressed {
            info!("Menu button pressed on {}, requesting picker", id);
            commands.push(ViewerCommand::OpenPicker);
        }

        if !self.debounce.is_ready(now) {
            return commands;
        }

        let snapshot = self.source.sample(id);
        if let Some(action) = NavAction::from_snapshot(&snapshot) {
            debug!("Accepted {:?} from {}", action, id);
            self.debounce.accept(now);
            commands.push(ViewerCommand::Navigate(action));
        }

        commands
    }

    /// Queues commands without blocking. Returns false once the UI is gone.
    fn dispatch(&self, commands: Vec<ViewerCommand>) -> bool {
        if commands.is_empty() {
            return true;
        }

        for command in commands {
            match self.command_sender.try_send(command) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(command)) => {
                    warn!("UI command queue full, dropping {:?}", command);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    info!("UI command receiver closed");
                    return false;
                }
            }
        }
        self.repaint.request();
        true
    }

    pub async fn run(mut self, cancel: CancellationToken) -> NavigationLoop<Stopped> {
        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let scheduled = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Navigation loop cancelled");
                    break;
                }
                scheduled = ticker.tick() => scheduled,
            };

            let now = Instant::now();
            let lateness = now.saturating_duration_since(scheduled);
            if lateness > self.settings.tolerance {
                debug!("Poll tick late by {:?}", lateness);
            }

            let commands = self.tick(now.into_std());
            if !self.dispatch(commands) {
                break;
            }
        }

        self.transition()
    }
}

/// Running poll loop. Dropping the handle stops the timer.
pub struct PollLoopHandle {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<()>,
}

impl PollLoopHandle {
    /// Spawns the loop on the blocking pool of `runtime`. The source is built on
    /// that thread by `make_source`; if that fails the loop ends immediately and
    /// the viewer keeps working without a controller.
    pub fn spawn<F>(
        runtime: &Handle,
        make_source: F,
        settings: LoopSettings,
        command_sender: mpsc::Sender<ViewerCommand>,
        repaint: RepaintSignal,
    ) -> Self
    where
        F: FnOnce() -> Result<Box<dyn InputSource>, ControllerError> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = runtime.clone();

        let task = runtime.spawn_blocking(move || {
            let source = match make_source() {
                Ok(source) => source,
                Err(e) => {
                    error!("Controller input unavailable: {}", e);
                    return;
                }
            };

            let nav_loop = NavigationLoop::create(source, settings, command_sender, repaint).start();
            let _stopped = handle.block_on(nav_loop.run(token));
            info!("Navigation loop stopped");
        });

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

impl fmt::Debug for PollLoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollLoopHandle")
            .field("running", &self.is_running())
            .finish()
    }
}
