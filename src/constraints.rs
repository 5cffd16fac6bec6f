//! Assignment validator: the last client-side gate before a schedule entry
//! is submitted to the API.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. Completeness
//! 2. Duplicate slot for the group
//! 3. Teacher availability
//! 4. Teacher or room double booking
//! 5. Shift window of the group
//! 6. Cycle window (manual workspace only)
//!
//! Rejections are values. Nothing here mutates the snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Day, HourWindow, Id, Shift, TimetableSnapshot};
use crate::index::{self, ConflictPolicy, Slot};

// ============================================================================
// Inputs
// ============================================================================

/// A proposed assignment as selected by the user. Every field may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub group_id: Option<Id>,
    pub teacher_id: Option<Id>,
    pub room_id: Option<Id>,
    #[serde(rename = "dayOfWeek")]
    pub day: Option<Day>,
    pub block_id: Option<Id>,
    pub period_id: Option<Id>,
}

/// A proposal with every field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteProposal {
    pub group_id: Id,
    pub teacher_id: Id,
    pub room_id: Id,
    pub day: Day,
    pub block_id: Id,
    pub period_id: Id,
}

impl CompleteProposal {
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.block_id, self.period_id)
    }
}

impl Proposal {
    /// Checks rule 1, naming every unset field.
    pub fn complete(&self) -> Result<CompleteProposal, Rejection> {
        let mut fields = Vec::new();
        if self.group_id.is_none() {
            fields.push("groupId");
        }
        if self.teacher_id.is_none() {
            fields.push("teacherId");
        }
        if self.room_id.is_none() {
            fields.push("roomId");
        }
        if self.day.is_none() {
            fields.push("dayOfWeek");
        }
        if self.block_id.is_none() {
            fields.push("blockId");
        }
        if self.period_id.is_none() {
            fields.push("periodId");
        }

        match (
            self.group_id,
            self.teacher_id,
            self.room_id,
            self.day,
            self.block_id,
            self.period_id,
        ) {
            (Some(group_id), Some(teacher_id), Some(room_id), Some(day), Some(block_id), Some(period_id)) => {
                Ok(CompleteProposal {
                    group_id,
                    teacher_id,
                    room_id,
                    day,
                    block_id,
                    period_id,
                })
            }
            _ => Err(Rejection::MissingFields { fields }),
        }
    }
}

/// Whether the proposal creates a new entry or edits an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Create,
    Edit { entry_id: Id },
}

impl Mode {
    pub fn exclude_entry_id(self) -> Option<Id> {
        match self {
            Mode::Create => None,
            Mode::Edit { entry_id } => Some(entry_id),
        }
    }
}

/// Which assignment screen is asking. The cycle rule only applies to `Manual`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workspace {
    #[default]
    Modal,
    Manual,
}

// ============================================================================
// Rejections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    MissingFields,
    DuplicateSlot,
    TeacherUnavailable,
    ResourceConflict,
    ShiftMismatch,
    CycleWindow,
    NotACandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Teacher,
    Room,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Teacher => f.write_str("teacher"),
            Resource::Room => f.write_str("room"),
        }
    }
}

/// Coarse academic level used by the cycle rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleBand {
    /// Cycles 1 to 3 (and 0).
    Early,
    /// Cycles 4 to 6.
    Intermediate,
    /// Cycle 7 and above.
    Senior,
}

impl CycleBand {
    pub fn of(cycle: u32) -> Self {
        match cycle {
            0..=3 => CycleBand::Early,
            4..=6 => CycleBand::Intermediate,
            _ => CycleBand::Senior,
        }
    }

    pub fn window(self) -> HourWindow {
        match self {
            CycleBand::Early => HourWindow::closed(7, 13),
            CycleBand::Intermediate => HourWindow::closed(13, 18),
            CycleBand::Senior => HourWindow::closed(18, 22),
        }
    }
}

impl fmt::Display for CycleBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleBand::Early => f.write_str("cycles 1-3"),
            CycleBand::Intermediate => f.write_str("cycles 4-6"),
            CycleBand::Senior => f.write_str("cycles 7+"),
        }
    }
}

/// Why a proposal was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("all fields are required, missing: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("group {group_id} already has an entry on {day} in block {block_id}")]
    DuplicateSlot { group_id: Id, day: Day, block_id: Id },

    #[error("teacher {teacher_id} is not available on {day} in block {block_id}")]
    TeacherUnavailable { teacher_id: Id, day: Day, block_id: Id },

    #[error("{resource} {id} is already assigned on {day} in block {block_id}")]
    ResourceConflict {
        resource: Resource,
        id: Id,
        day: Day,
        block_id: Id,
    },

    #[error("shift conflict: block starts at {start_hour:02}:00, outside the group's preferred {expected} shift {}", .expected.window())]
    ShiftMismatch { expected: Shift, start_hour: u32 },

    #[error("{band} may only hold classes starting within {}, block starts at {start_hour:02}:00 (cycle {cycle})", .band.window())]
    CycleWindow {
        cycle: u32,
        band: CycleBand,
        start_hour: u32,
    },

    /// Raised by a session when the selected teacher or room lacks the
    /// subject's specialty or room type.
    #[error("{resource} {id} is not a candidate for subject {subject_id}")]
    NotACandidate { resource: Resource, id: Id, subject_id: Id },
}

impl Rejection {
    pub fn code(&self) -> ReasonCode {
        match self {
            Rejection::MissingFields { .. } => ReasonCode::MissingFields,
            Rejection::DuplicateSlot { .. } => ReasonCode::DuplicateSlot,
            Rejection::TeacherUnavailable { .. } => ReasonCode::TeacherUnavailable,
            Rejection::ResourceConflict { .. } => ReasonCode::ResourceConflict,
            Rejection::ShiftMismatch { .. } => ReasonCode::ShiftMismatch,
            Rejection::CycleWindow { .. } => ReasonCode::CycleWindow,
            Rejection::NotACandidate { .. } => ReasonCode::NotACandidate,
        }
    }
}

// ============================================================================
// Window rules
// ============================================================================

/// Rule 5 on its own.
pub fn check_shift(shift: Shift, start_hour: u32) -> Result<(), Rejection> {
    if shift.window().contains(start_hour) {
        Ok(())
    } else {
        Err(Rejection::ShiftMismatch {
            expected: shift,
            start_hour,
        })
    }
}

/// Coarse cycle number: half the career's total curriculum hours, rounded up.
pub fn cycle_from_curriculum_hours(total_curriculum_hours: u32) -> u32 {
    total_curriculum_hours.div_ceil(2)
}

/// Rule 6 on its own.
pub fn check_cycle(total_curriculum_hours: u32, start_hour: u32) -> Result<(), Rejection> {
    let cycle = cycle_from_curriculum_hours(total_curriculum_hours);
    let band = CycleBand::of(cycle);
    if band.window().contains(start_hour) {
        Ok(())
    } else {
        Err(Rejection::CycleWindow {
            cycle,
            band,
            start_hour,
        })
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Runs rules 1 to 6 against `snapshot`.
///
/// Rules 5 and 6 are skipped when the group or block is not in the snapshot
/// or the block start time does not parse; rule 6 also needs the group's
/// career.
pub fn validate_assignment(
    proposal: &Proposal,
    snapshot: &TimetableSnapshot,
    mode: Mode,
    workspace: Workspace,
    policy: &ConflictPolicy,
) -> Result<(), Rejection> {
    let p = proposal.complete()?;
    let exclude = mode.exclude_entry_id();
    let slot = p.slot();

    let duplicate = snapshot.entries.iter().any(|e| {
        e.group_id == p.group_id
            && e.period_id == p.period_id
            && e.occupies(p.day, p.block_id)
            && exclude != Some(e.id)
    });
    if duplicate {
        return Err(Rejection::DuplicateSlot {
            group_id: p.group_id,
            day: p.day,
            block_id: p.block_id,
        });
    }

    if !index::available_teacher_ids(&snapshot.availabilities, &slot).contains(&p.teacher_id) {
        return Err(Rejection::TeacherUnavailable {
            teacher_id: p.teacher_id,
            day: p.day,
            block_id: p.block_id,
        });
    }

    if index::busy_teacher_ids(&snapshot.entries, &slot, exclude).contains(&p.teacher_id) {
        return Err(Rejection::ResourceConflict {
            resource: Resource::Teacher,
            id: p.teacher_id,
            day: p.day,
            block_id: p.block_id,
        });
    }
    if index::busy_room_ids(&snapshot.entries, &slot, exclude, policy.room_scope).contains(&p.room_id) {
        return Err(Rejection::ResourceConflict {
            resource: Resource::Room,
            id: p.room_id,
            day: p.day,
            block_id: p.block_id,
        });
    }

    let group = snapshot.group(p.group_id);
    let start_hour = snapshot.block(p.block_id).and_then(|b| b.start_hour());
    let (Some(group), Some(start_hour)) = (group, start_hour) else {
        return Ok(());
    };

    check_shift(group.preferred_shift, start_hour)?;

    if workspace == Workspace::Manual {
        if let Some(career) = group.career_id.and_then(|id| snapshot.career(id)) {
            check_cycle(career.total_curriculum_hours, start_hour)?;
        }
    }

    Ok(())
}
