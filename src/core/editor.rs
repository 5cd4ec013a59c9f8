//! Interactive edit session state machine.
//!
//! Models the keypress-driven mode switching of an interactive session as
//! an explicit finite-state machine. Rendering and input capture are
//! external collaborators; this layer only tracks which mode is active,
//! what text is pending, and which action a committed input produces.

/// Input modes of an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    AddKey,
    AddValue,
    EditValue,
    Filter,
    ImportPath,
    ExportPath,
    PageSelect,
}

/// Pages selectable from page-select mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Project,
    Settings,
}

/// An effect the frontend applies after a committed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Insert or update a secret in the current bundle.
    UpsertSecret { key: String, value: String },
    /// Replace the value of an existing secret.
    EditSecret { key: String, value: String },
    /// Apply a filter query to the secret list.
    Filter(String),
    /// Import a `.env` file from the given path.
    Import(String),
    /// Export the current project to the given path.
    Export(String),
    /// Switch to another page.
    SwitchPage(Page),
    /// Nothing to do.
    None,
}

/// The state machine itself.
#[derive(Debug, Default)]
pub struct EditorState {
    mode: InputMode,
    buffer: String,
    pending_key: Option<String>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// The text being typed in the current mode.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether the session currently captures text input.
    pub fn is_editing(&self) -> bool {
        !matches!(self.mode, InputMode::Normal | InputMode::PageSelect)
    }

    fn enter(&mut self, mode: InputMode, prefill: &str) {
        self.mode = mode;
        self.buffer = prefill.to_string();
    }

    /// Begin adding a new secret (key first, then value).
    pub fn begin_add(&mut self) {
        self.pending_key = None;
        self.enter(InputMode::AddKey, "");
    }

    /// Begin editing the value of an existing secret.
    pub fn begin_edit(&mut self, key: &str, current_value: &str) {
        self.pending_key = Some(key.to_string());
        self.enter(InputMode::EditValue, current_value);
    }

    pub fn begin_filter(&mut self) {
        self.enter(InputMode::Filter, "");
    }

    pub fn begin_import(&mut self) {
        self.enter(InputMode::ImportPath, "");
    }

    pub fn begin_export(&mut self) {
        self.enter(InputMode::ExportPath, "");
    }

    pub fn begin_page_select(&mut self) {
        self.enter(InputMode::PageSelect, "");
    }

    /// Append typed text to the active buffer.
    pub fn input(&mut self, text: &str) {
        if self.is_editing() {
            self.buffer.push_str(text);
        }
    }

    pub fn backspace(&mut self) {
        if self.is_editing() {
            self.buffer.pop();
        }
    }

    /// Cancel back to normal mode, discarding pending input. No side
    /// effects: the caller sees `Action::None`.
    pub fn cancel(&mut self) -> Action {
        self.mode = InputMode::Normal;
        self.buffer.clear();
        self.pending_key = None;
        Action::None
    }

    /// Resolve a page-select keypress. Unknown keys cancel the selection.
    pub fn select_page(&mut self, key: char) -> Action {
        self.mode = InputMode::Normal;
        match key {
            'h' => Action::SwitchPage(Page::Home),
            'p' => Action::SwitchPage(Page::Project),
            's' => Action::SwitchPage(Page::Settings),
            _ => Action::None,
        }
    }

    /// Commit the active buffer.
    ///
    /// Add-key chains into add-value; every other mode returns to normal,
    /// yielding the action the frontend should apply.
    pub fn commit(&mut self) -> Action {
        let text = std::mem::take(&mut self.buffer);
        match self.mode {
            InputMode::Normal | InputMode::PageSelect => Action::None,
            InputMode::AddKey => {
                let key = text.trim().to_string();
                if key.is_empty() {
                    self.mode = InputMode::Normal;
                    return Action::None;
                }
                self.pending_key = Some(key);
                self.mode = InputMode::AddValue;
                Action::None
            }
            InputMode::AddValue => {
                self.mode = InputMode::Normal;
                match self.pending_key.take() {
                    Some(key) => Action::UpsertSecret { key, value: text },
                    None => Action::None,
                }
            }
            InputMode::EditValue => {
                self.mode = InputMode::Normal;
                match self.pending_key.take() {
                    Some(key) => Action::EditSecret { key, value: text },
                    None => Action::None,
                }
            }
            InputMode::Filter => {
                self.mode = InputMode::Normal;
                Action::Filter(text)
            }
            InputMode::ImportPath => {
                self.mode = InputMode::Normal;
                let path = text.trim().to_string();
                if path.is_empty() {
                    Action::None
                } else {
                    Action::Import(path)
                }
            }
            InputMode::ExportPath => {
                self.mode = InputMode::Normal;
                let path = text.trim().to_string();
                if path.is_empty() {
                    Action::None
                } else {
                    Action::Export(path)
                }
            }
        }
    }
}
