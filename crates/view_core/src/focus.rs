//! Focus and keyboard contract of the fullscreen image viewer.
//!
//! The manager models the document's active element explicitly so that focus
//! capture, restoration and the Tab trap can run without a real DOM.

use crate::gallery::GalleryModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    pub id: String,
    /// Text inputs swallow the global viewer shortcut.
    pub text_entry: bool,
}

impl FocusTarget {
    pub fn control(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text_entry: false,
        }
    }

    pub fn text_input(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text_entry: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Tab,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open { index: usize },
}

/// Gallery-level effect requested by a key press; executed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalCommand {
    Open { index: usize },
    Close,
    ShowPrev,
    ShowNext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    FocusMoved(String),
    Command(ModalCommand),
}

#[derive(Debug, Clone)]
pub struct ModalFocusManager {
    state: ModalState,
    close_control: String,
    focusables: Vec<String>,
    focused: Option<FocusTarget>,
    restore_to: Option<FocusTarget>,
}

impl ModalFocusManager {
    /// `focusables` lists the modal's focusable descendants in tab order and
    /// must contain `close_control`.
    pub fn new(close_control: impl Into<String>, focusables: Vec<String>) -> Self {
        let close_control = close_control.into();
        let mut focusables = focusables;
        if !focusables.contains(&close_control) {
            focusables.insert(0, close_control.clone());
        }
        Self {
            state: ModalState::Closed,
            close_control,
            focusables,
            focused: None,
            restore_to: None,
        }
    }

    /// Close, previous and next controls, in that tab order.
    pub fn image_viewer() -> Self {
        Self::new(
            "viewer-close",
            vec![
                "viewer-close".to_string(),
                "viewer-prev".to_string(),
                "viewer-next".to_string(),
            ],
        )
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self.state {
            ModalState::Open { index } => Some(index),
            ModalState::Closed => None,
        }
    }

    /// Background content is hidden from assistive technology while open.
    pub fn background_inert(&self) -> bool {
        self.is_open()
    }

    pub fn focused(&self) -> Option<&FocusTarget> {
        self.focused.as_ref()
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_ref().map(|target| target.id.as_str())
    }

    pub fn focusables(&self) -> &[String] {
        &self.focusables
    }

    /// Records a focus change made outside the modal logic (pointer, script).
    /// While open, focus cannot leave the modal.
    pub fn focus(&mut self, target: FocusTarget) -> bool {
        if self.is_open() && !self.focusables.contains(&target.id) {
            return false;
        }
        self.focused = Some(target);
        true
    }

    pub fn open(&mut self, index: usize) {
        if let ModalState::Open { .. } = self.state {
            self.state = ModalState::Open { index };
            return;
        }
        self.restore_to = self.focused.take();
        self.state = ModalState::Open { index };
        self.focused = Some(FocusTarget::control(self.close_control.clone()));
    }

    pub fn set_index(&mut self, index: usize) {
        if self.is_open() {
            self.state = ModalState::Open { index };
        }
    }

    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.state = ModalState::Closed;
        self.focused = self.restore_to.take();
    }

    pub fn handle_key(&mut self, input: KeyInput) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match input.key {
            Key::Escape => KeyOutcome::Command(ModalCommand::Close),
            Key::ArrowLeft => KeyOutcome::Command(ModalCommand::ShowPrev),
            Key::ArrowRight => KeyOutcome::Command(ModalCommand::ShowNext),
            Key::Tab => self.cycle_focus(input.shift),
            _ => KeyOutcome::Ignored,
        }
    }

    fn cycle_focus(&mut self, backwards: bool) -> KeyOutcome {
        let count = self.focusables.len();
        if count == 0 {
            return KeyOutcome::Ignored;
        }
        let current = self
            .focused_id()
            .and_then(|id| self.focusables.iter().position(|candidate| candidate == id));
        let next = match (current, backwards) {
            (Some(idx), false) => (idx + 1) % count,
            (Some(idx), true) => (idx + count - 1) % count,
            (None, false) => 0,
            (None, true) => count - 1,
        };
        let id = self.focusables[next].clone();
        self.focused = Some(FocusTarget::control(id.clone()));
        KeyOutcome::FocusMoved(id)
    }
}

/// Window-level key dispatch with an explicit lifecycle. Detached routers
/// ignore every key.
#[derive(Debug, Clone, Default)]
pub struct KeyRouter {
    attached: bool,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn route(
        &self,
        input: KeyInput,
        modal: &mut ModalFocusManager,
        gallery: &GalleryModel,
    ) -> KeyOutcome {
        if !self.attached {
            return KeyOutcome::Ignored;
        }
        if modal.is_open() {
            return modal.handle_key(input);
        }
        match input.key {
            Key::Char('f') | Key::Char('F') => {
                let typing = modal.focused().is_some_and(|target| target.text_entry);
                if typing || gallery.is_empty() {
                    return KeyOutcome::Ignored;
                }
                let index = gallery.selected_index().unwrap_or(0);
                KeyOutcome::Command(ModalCommand::Open { index })
            }
            _ => KeyOutcome::Ignored,
        }
    }
}

#[cfg(test)]
#[path = "tests/focus_tests.rs"]
mod tests;
