// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporal index trait for time-window candidate lookup.

use async_trait::async_trait;

use crate::error::ReverieError;
use crate::memory::{Memory, TimeWindow};

/// Collaborator that resolves a time window to the memories whose events
/// fall inside it.
///
/// Failures here degrade retrieval rather than abort it: the orchestrator
/// treats an error as an empty candidate list.
#[async_trait]
pub trait TemporalIndex: Send + Sync {
    /// Returns the memories whose timestamps fall inside the window.
    async fn memories_in_window(&self, window: &TimeWindow) -> Result<Vec<Memory>, ReverieError>;
}
