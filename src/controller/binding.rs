use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::input::{ControllerId, ControllerInfo, InputEvent, InputSource};

/// What happens to a bound controller once the backend reports it gone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectPolicy {
    /// Drop the binding and look for the first connected controller again
    #[default]
    Rebind,
    /// Keep the stale binding, reads stay neutral until it comes back
    KeepStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingChange {
    Bound(ControllerInfo),
    Released(ControllerInfo),
}

/// Handle on the controller the poll loop reads from.
///
/// `Unbound -> Bound` happens lazily on the first tick that finds a connected
/// controller. `Bound -> Unbound` only happens under [`DisconnectPolicy::Rebind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ControllerBinding {
    #[default]
    Unbound,
    Bound(ControllerInfo),
}

impl ControllerBinding {
    pub fn id(&self) -> Option<ControllerId> {
        match self {
            ControllerBinding::Unbound => None,
            ControllerBinding::Bound(info) => Some(info.id),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, ControllerBinding::Bound(_))
    }

    /// Brings the binding up to date with this tick's events and the backend's
    /// connection list. At most one change is reported per call; a release and a
    /// rebind to another controller take two ticks.
    pub fn refresh(
        &mut self,
        source: &dyn InputSource,
        events: &[InputEvent],
        policy: DisconnectPolicy,
    ) -> Option<BindingChange> {
        match self {
            ControllerBinding::Bound(info) => {
                let lost = events
                    .iter()
                    .any(|e| matches!(e, InputEvent::Disconnected(id) if *id == info.id))
                    || !source.is_connected(info.id);

                if !lost {
                    return None;
                }

                match policy {
                    DisconnectPolicy::Rebind => {
                        warn!("Controller {} lost, releasing binding", info);
                        let info = info.clone();
                        *self = ControllerBinding::Unbound;
                        Some(BindingChange::Released(info))
                    }
                    DisconnectPolicy::KeepStale => {
                        debug!("Controller {} lost, keeping stale binding", info);
                        None
                    }
                }
            }
            ControllerBinding::Unbound => {
                let first = source.connected().into_iter().next()?;
                info!("Bound controller {}", first);
                *self = ControllerBinding::Bound(first.clone());
                Some(BindingChange::Bound(first))
            }
        }
    }
}
