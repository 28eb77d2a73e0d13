//! Per-cell edit state machine
//!
//! A cell is either being viewed or edited. Editing buffers a draft apart
//! from the committed value; only a commit with a changed draft reaches the
//! [`RowStore`].
//!
//! ```text
//! Viewing --begin_edit--> Editing --commit/cancel--> Viewing
//! ```

use crate::error::EditError;
use crate::store::RowStore;
use crate::template::display_value;
use serde_json::Value;

/// Cell edit states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Showing the committed value
    Viewing,
    /// Buffering a draft
    Editing,
}

/// Validate a state transition
///
/// # Errors
/// - `EditError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(
    from: CellState,
    to: CellState,
    action: &'static str,
) -> Result<(), EditError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(EditError::IllegalTransition {
            state: from,
            action,
        })
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: CellState) -> Vec<CellState> {
    match from {
        CellState::Viewing => vec![CellState::Editing],
        CellState::Editing => vec![CellState::Viewing],
    }
}

/// Editor for a single cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEditor {
    row: usize,
    key: String,
    state: CellState,
    committed: String,
    draft: Option<String>,
}

impl CellEditor {
    /// Create editor in `Viewing`
    #[inline]
    #[must_use]
    pub fn new(row: usize, key: impl Into<String>) -> Self {
        Self {
            row,
            key: key.into(),
            state: CellState::Viewing,
            committed: String::new(),
            draft: None,
        }
    }

    /// Enter `Editing` with a draft of the committed value's text
    ///
    /// # Errors
    /// - `EditError::IllegalTransition` if already editing
    /// - `EditError::Store` if the row no longer exists
    pub fn begin_edit(&mut self, store: &RowStore) -> Result<(), EditError> {
        validate_transition(self.state, CellState::Editing, "begin_edit")?;
        self.committed = store
            .get_cell(self.row, &self.key)?
            .map(display_value)
            .unwrap_or_default();
        self.draft = Some(self.committed.clone());
        self.state = CellState::Editing;
        Ok(())
    }

    /// Replace the draft text
    ///
    /// # Errors
    /// - `EditError::IllegalTransition` if not editing
    pub fn update_draft(&mut self, text: impl Into<String>) -> Result<(), EditError> {
        match self.draft.as_mut() {
            Some(draft) if self.state == CellState::Editing => {
                *draft = text.into();
                Ok(())
            }
            _ => Err(EditError::IllegalTransition {
                state: self.state,
                action: "update_draft",
            }),
        }
    }

    /// Return to `Viewing`, writing the draft if it changed
    ///
    /// Returns `true` when the store was mutated. On a store error the editor
    /// stays in `Editing` with its draft intact.
    ///
    /// # Errors
    /// - `EditError::IllegalTransition` if not editing
    /// - `EditError::Store` if the write fails
    pub fn commit(&mut self, store: &mut RowStore) -> Result<bool, EditError> {
        validate_transition(self.state, CellState::Viewing, "commit")?;
        let draft = self.draft.clone().unwrap_or_default();
        let changed = draft != self.committed;
        if changed {
            store.set_cell(self.row, &self.key, Value::String(draft.clone()))?;
            self.committed = draft;
        }
        self.draft = None;
        self.state = CellState::Viewing;
        Ok(changed)
    }

    /// Discard the draft and return to `Viewing`
    ///
    /// # Errors
    /// - `EditError::IllegalTransition` if not editing
    pub fn cancel(&mut self) -> Result<(), EditError> {
        validate_transition(self.state, CellState::Viewing, "cancel")?;
        self.draft = None;
        self.state = CellState::Viewing;
        Ok(())
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> CellState {
        self.state
    }

    /// Draft text while editing
    #[inline]
    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Row index this editor targets
    #[inline]
    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column key this editor targets
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}
