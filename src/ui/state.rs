//! Viewer state owned by the UI thread
//!
//! All display state mutations go through [`ViewerState`]. Background tasks
//! only ever reach it through the commands and import events the UI drains at
//! the start of a frame.

use tracing::{debug, info};

use crate::acquisition::ImportEvent;
use crate::config::NavigationConfig;
use crate::content::{ContentPage, ImportMode, ImportedContentList, ListChange};
use crate::controller::{BindingChange, ControllerInfo};
use crate::navigation::{NavAction, NavigationState, ViewerCommand};

pub const NO_CONTENT: &str = "No content imported";

/// Side effects the UI has to carry out after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenPicker,
}

#[derive(Debug)]
pub struct ViewerState {
    pub content: ImportedContentList,
    pub navigation: NavigationState,
    pub controller: Option<ControllerInfo>,
    pub status: Option<String>,
    picker_open: bool,
    settings: NavigationConfig,
    import_mode: ImportMode,
}

impl ViewerState {
    pub fn new(settings: NavigationConfig, import_mode: ImportMode) -> Self {
        Self {
            content: ImportedContentList::default(),
            navigation: NavigationState::default(),
            controller: None,
            status: None,
            picker_open: false,
            settings,
            import_mode,
        }
    }

    pub fn handle_command(&mut self, command: ViewerCommand) -> Option<Effect> {
        match command {
            ViewerCommand::Navigate(action) => {
                self.navigate(action);
                None
            }
            ViewerCommand::OpenPicker => self.request_picker().then_some(Effect::OpenPicker),
            ViewerCommand::Controller(BindingChange::Bound(info)) => {
                self.status = Some(format!("Controller connected: {}", info.name));
                self.controller = Some(info);
                None
            }
            ViewerCommand::Controller(BindingChange::Released(info)) => {
                self.status = Some(format!("Controller disconnected: {}", info.name));
                self.controller = None;
                None
            }
        }
    }

    pub fn navigate(&mut self, action: NavAction) -> bool {
        self.navigation
            .apply(action, self.content.len(), &self.settings)
    }

    /// Marks the picker as open. Returns false while another session is running.
    pub fn request_picker(&mut self) -> bool {
        if self.picker_open {
            debug!("Picker already open, ignoring request");
            return false;
        }
        self.picker_open = true;
        true
    }

    pub fn picker_open(&self) -> bool {
        self.picker_open
    }

    pub fn handle_import(&mut self, event: ImportEvent) {
        self.picker_open = false;

        let batch = match event {
            ImportEvent::Cancelled => return,
            ImportEvent::Loaded(batch) => batch,
        };

        let failed = batch.files_failed();
        match self.content.apply(batch.pages, self.import_mode) {
            ListChange::Replaced { pages } => {
                self.navigation.reset();
                self.status = Some(import_summary(pages, failed));
            }
            ListChange::Appended { added } => {
                self.navigation.clamp_to(self.content.len());
                self.status = Some(import_summary(added, failed));
            }
            ListChange::Unchanged => {
                self.status = Some(format!("Nothing imported, {} files skipped", failed));
            }
        }
        info!(
            "Content now has {} pages from {} files",
            self.content.len(),
            self.content.file_count()
        );
    }

    pub fn current_page(&self) -> Option<&ContentPage> {
        self.content.get(self.navigation.current_index())
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.content.is_empty().then_some(NO_CONTENT)
    }

    pub fn position_label(&self) -> String {
        if self.content.is_empty() {
            "0 / 0".to_string()
        } else {
            format!(
                "{} / {}",
                self.navigation.current_index() + 1,
                self.content.len()
            )
        }
    }

    pub fn zoom_label(&self) -> String {
        format!("{:.0}%", self.navigation.scale * 100.0)
    }
}

fn import_summary(pages: usize, failed: usize) -> String {
    if failed == 0 {
        format!("Imported {} pages", pages)
    } else {
        format!("Imported {} pages, {} files skipped", pages, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::{ImportBatch, ImportError};
    use crate::content::tests::test_image;
    use crate::controller::ControllerId;
    use std::path::PathBuf;

    fn state(mode: ImportMode) -> ViewerState {
        ViewerState::new(NavigationConfig::default(), mode)
    }

    fn loaded(names: &[&str]) -> ImportEvent {
        ImportEvent::Loaded(ImportBatch {
            pages: names.iter().map(|n| test_image(n)).collect(),
            failures: Vec::new(),
        })
    }

    fn right() -> ViewerCommand {
        ViewerCommand::Navigate(NavAction::NextPage)
    }

    #[test]
    fn cancelled_picker_on_empty_list_shows_placeholder() {
        let mut state = state(ImportMode::Replace);
        assert!(state.request_picker());

        state.handle_import(ImportEvent::Cancelled);

        assert!(!state.picker_open());
        assert_eq!(state.navigation.current_index(), 0);
        assert_eq!(state.placeholder(), Some(NO_CONTENT));
        assert!(state.current_page().is_none());
        assert_eq!(state.position_label(), "0 / 0");
    }

    #[test]
    fn import_three_then_page_to_the_end() {
        let mut state = state(ImportMode::Replace);
        state.handle_import(loaded(&["1.png", "2.png", "3.png"]));
        assert_eq!(state.content.len(), 3);
        assert_eq!(state.navigation.current_index(), 0);

        state.handle_command(right());
        state.handle_command(right());
        assert_eq!(state.navigation.current_index(), 2);

        state.handle_command(right());
        assert_eq!(state.navigation.current_index(), 2);
        assert_eq!(state.position_label(), "3 / 3");
    }

    #[test]
    fn replace_resets_navigation_but_append_keeps_it() {
        let mut replacing = state(ImportMode::Replace);
        replacing.handle_import(loaded(&["a.png", "b.png"]));
        replacing.handle_command(right());
        replacing.handle_command(ViewerCommand::Navigate(NavAction::ZoomIn));
        replacing.handle_import(loaded(&["c.png", "d.png"]));
        assert_eq!(replacing.navigation, NavigationState::default());

        let mut appending = state(ImportMode::Append);
        appending.handle_import(loaded(&["a.png", "b.png"]));
        appending.handle_command(right());
        appending.handle_import(loaded(&["c.png"]));
        assert_eq!(appending.navigation.current_index(), 1);
        assert_eq!(appending.content.len(), 3);
    }

    #[test]
    fn menu_requests_do_not_stack_pickers() {
        let mut state = state(ImportMode::Replace);
        assert_eq!(
            state.handle_command(ViewerCommand::OpenPicker),
            Some(Effect::OpenPicker)
        );
        assert_eq!(state.handle_command(ViewerCommand::OpenPicker), None);

        state.handle_import(ImportEvent::Cancelled);
        assert_eq!(
            state.handle_command(ViewerCommand::OpenPicker),
            Some(Effect::OpenPicker)
        );
    }

    #[test]
    fn failed_import_keeps_previous_content() {
        let mut state = state(ImportMode::Replace);
        state.handle_import(loaded(&["a.png"]));

        state.handle_import(ImportEvent::Loaded(ImportBatch {
            pages: Vec::new(),
            failures: vec![ImportError::Unsupported(PathBuf::from("x.txt"))],
        }));

        assert_eq!(state.content.len(), 1);
        assert_eq!(
            state.status.as_deref(),
            Some("Nothing imported, 1 files skipped")
        );
    }

    #[test]
    fn controller_changes_are_tracked() {
        let mut state = state(ImportMode::Replace);
        let info = ControllerInfo {
            id: ControllerId(4),
            name: "pad".into(),
        };

        state.handle_command(ViewerCommand::Controller(BindingChange::Bound(info.clone())));
        assert_eq!(state.controller, Some(info.clone()));

        state.handle_command(ViewerCommand::Controller(BindingChange::Released(info)));
        assert_eq!(state.controller, None);
    }

    #[test]
    fn zoom_label_rounds_to_percent() {
        let mut state = state(ImportMode::Replace);
        state.handle_import(loaded(&["a.png"]));
        state.handle_command(ViewerCommand::Navigate(NavAction::ZoomIn));
        assert_eq!(state.zoom_label(), "110%");
    }
}
