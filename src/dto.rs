//! DTOs for REST API requests/responses.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::candidates::Shortage;
use crate::constraints::{Mode, Proposal, ReasonCode, Rejection, Workspace};
use crate::domain::{Day, Id, Room, Teacher};
use crate::index::{ConflictIndex, RoomScope, Slot};
use crate::report::GridFilter;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub room_scope: RoomScope,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCandidatesResponse {
    pub candidates: Vec<Teacher>,
    pub shortages: Vec<Shortage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCandidatesResponse {
    pub candidates: Vec<Room>,
    pub shortages: Vec<Shortage>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictIndexRequest {
    #[serde(rename = "dayOfWeek")]
    pub day: Day,
    pub block_id: Id,
    #[serde(default)]
    pub period_id: Option<Id>,
    #[serde(default)]
    pub exclude_entry_id: Option<Id>,
}

impl ConflictIndexRequest {
    pub fn slot(&self) -> Slot {
        Slot {
            day: self.day,
            block_id: self.block_id,
            period_id: self.period_id,
        }
    }
}

/// Conflict index with sorted id lists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictIndexDto {
    pub busy_teacher_ids: Vec<Id>,
    pub busy_room_ids: Vec<Id>,
    pub available_teacher_ids: Vec<Id>,
}

fn sorted(ids: &HashSet<Id>) -> Vec<Id> {
    let mut ids: Vec<Id> = ids.iter().copied().collect();
    ids.sort_unstable();
    ids
}

impl From<&ConflictIndex> for ConflictIndexDto {
    fn from(index: &ConflictIndex) -> Self {
        Self {
            busy_teacher_ids: sorted(&index.busy_teacher_ids),
            busy_room_ids: sorted(&index.busy_room_ids),
            available_teacher_ids: sorted(&index.available_teacher_ids),
        }
    }
}

/// A proposal plus the context it is validated in.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(flatten)]
    pub proposal: Proposal,
    /// Set when editing an existing entry.
    #[serde(default)]
    pub edit_entry_id: Option<Id>,
    #[serde(default)]
    pub workspace: Workspace,
}

impl ValidateRequest {
    pub fn mode(&self) -> Mode {
        match self.edit_entry_id {
            Some(entry_id) => Mode::Edit { entry_id },
            None => Mode::Create,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<(), Rejection>> for ValidationResponse {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                reason: None,
                message: None,
            },
            Err(rejection) => Self {
                ok: false,
                reason: Some(rejection.code()),
                message: Some(rejection.to_string()),
            },
        }
    }
}

/// `?period=&group=&teacher=&room=`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GridQuery {
    pub period: Id,
    pub group: Option<Id>,
    pub teacher: Option<Id>,
    pub room: Option<Id>,
}

impl GridQuery {
    pub fn filter(&self) -> GridFilter {
        GridFilter {
            group_id: self.group,
            teacher_id: self.teacher,
            room_id: self.room,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProgressQuery {
    pub period: Id,
}
