use shared::domain::{AreaId, AreaRecord};

use crate::{
    error::{ClientError, ClientResult},
    store::AreaListStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        target: AreaId,
        candidate: String,
        /// Set by the first text change; confirm stays disabled until then.
        touched: bool,
    },
}

/// How an edit session ended. Either way the session is back in `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Committed(AreaRecord),
    Discarded,
}

/// Rename flow for a single area. The target is held by id and resolved against the
/// store only when the edit is committed.
#[derive(Debug, Default)]
pub struct AreaEditSession {
    state: EditState,
}

impl AreaEditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    pub fn target(&self) -> Option<AreaId> {
        match &self.state {
            EditState::Editing { target, .. } => Some(*target),
            EditState::Idle => None,
        }
    }

    pub fn candidate(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { candidate, .. } => Some(candidate.as_str()),
            EditState::Idle => None,
        }
    }

    /// Whether confirm is currently allowed: the text has been edited at least once
    /// and is not blank.
    pub fn is_valid(&self) -> bool {
        match &self.state {
            EditState::Editing {
                candidate, touched, ..
            } => *touched && is_valid_name(candidate),
            EditState::Idle => false,
        }
    }

    pub fn begin(&mut self, record: &AreaRecord) -> ClientResult<()> {
        if let EditState::Editing { target, .. } = &self.state {
            return Err(ClientError::validation(format!(
                "area {} is already being edited",
                target.0
            )));
        }
        self.state = EditState::Editing {
            target: record.id,
            candidate: record.name.clone(),
            touched: false,
        };
        Ok(())
    }

    /// Replaces the candidate text and returns the recomputed validity.
    pub fn set_candidate(&mut self, text: impl Into<String>) -> ClientResult<bool> {
        match &mut self.state {
            EditState::Editing {
                candidate, touched, ..
            } => {
                *candidate = text.into();
                *touched = true;
                Ok(is_valid_name(candidate))
            }
            EditState::Idle => Err(no_session()),
        }
    }

    pub fn confirm(&mut self, store: &mut AreaListStore) -> ClientResult<EditOutcome> {
        let EditState::Editing {
            target,
            candidate,
            touched,
        } = &self.state
        else {
            return Err(no_session());
        };
        if !touched {
            return Err(ClientError::validation("area name has not been edited"));
        }
        if !is_valid_name(candidate) {
            return Err(ClientError::validation("area name must not be empty"));
        }

        match store.rename(*target, candidate) {
            Ok(record) => {
                self.state = EditState::Idle;
                Ok(EditOutcome::Committed(record))
            }
            // The area vanished underneath the session; nothing left to edit.
            Err(err @ ClientError::NotFound { .. }) => {
                self.state = EditState::Idle;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub fn dismiss(&mut self) -> ClientResult<EditOutcome> {
        if !self.is_active() {
            return Err(no_session());
        }
        self.state = EditState::Idle;
        Ok(EditOutcome::Discarded)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
}

fn no_session() -> ClientError {
    ClientError::validation("no area edit in progress")
}

#[cfg(test)]
#[path = "tests/edit_tests.rs"]
mod tests;
