use super::results::AggregatedResultSet;
use serde::Serialize;

/// Everything the dropdown renders from. Owned by one widget instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetState {
    pub query_text: String,
    pub is_open: bool,
    pub is_loading: bool,
    pub last_results: AggregatedResultSet,
}

impl WidgetState {
    /// Idle: closed, empty text, nothing loading, no results.
    pub fn is_idle(&self) -> bool {
        !self.is_open
            && self.query_text.is_empty()
            && !self.is_loading
            && self.last_results.is_empty()
    }
}

/// Owns the input text and the open flag.
///
/// Closing always resets the text, the loading flag and the results. Input
/// focus is tracked separately from `is_open`: after `clear` the widget is
/// closed but the input keeps keyboard focus, so the next character reopens it.
#[derive(Debug, Default)]
pub struct QueryController {
    state: WidgetState,
    input_focused: bool,
}

impl QueryController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    /// Replace the text. Non-empty text opens the widget when the input has
    /// focus. Returns whether the text or the open flag changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let was_open = self.state.is_open;
        let changed = self.state.query_text != text;
        self.state.query_text = text;
        if !self.state.query_text.is_empty() && self.input_focused {
            self.state.is_open = true;
        }
        changed || was_open != self.state.is_open
    }

    /// Focus gained opens the widget, focus lost closes it. Returns whether
    /// the open flag changed.
    pub fn set_focused(&mut self, focused: bool) -> bool {
        self.input_focused = focused;
        if focused {
            let changed = !self.state.is_open;
            self.state.is_open = true;
            changed
        } else {
            self.close()
        }
    }

    /// Empty the text and close, handing keyboard focus back to the input.
    pub fn clear(&mut self) {
        self.close();
        self.input_focused = true;
    }

    /// Close and reset; leaves input focus as it was. Returns whether the
    /// widget was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.state.is_open;
        self.state.is_open = false;
        self.state.query_text.clear();
        self.state.is_loading = false;
        self.state.last_results = AggregatedResultSet::default();
        was_open
    }

    pub fn blur(&mut self) {
        self.input_focused = false;
    }
}
