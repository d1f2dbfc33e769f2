//! Engine lifecycle: Idle -> Running -> Completed

use std::fmt;

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
}

impl EngineState {
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (EngineState::Idle, EngineState::Running) | (EngineState::Running, EngineState::Completed)
        )
    }

    pub fn try_transition(&self, next: EngineState) -> HarnessResult<EngineState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarnessError::InvalidState(format!("{self} -> {next}")))
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Running => write!(f, "running"),
            EngineState::Completed => write!(f, "completed"),
        }
    }
}
