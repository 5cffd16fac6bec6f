//! Conflict index: lookup sets derived from a snapshot for one slot.
//!
//! Each function is a linear scan over the supplied collections. Nothing is
//! cached between calls; hosts rebuild on every interaction.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::domain::{Day, Id, ScheduleEntry, TeacherAvailability, TimetableSnapshot};

/// How room occupancy is scoped when looking for double bookings.
///
/// Teachers are always scoped by period. Rooms are scoped by day and block
/// only unless [`RoomScope::Period`] is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomScope {
    /// A room booked on the same day and block in any period is busy.
    #[default]
    #[serde(rename = "day-block")]
    DayAndBlock,
    #[serde(rename = "period")]
    Period,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room scope {0:?}, expected \"day-block\" or \"period\"")]
pub struct UnknownRoomScope(pub String);

impl FromStr for RoomScope {
    type Err = UnknownRoomScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day-block" | "day_block" | "dayblock" => Ok(RoomScope::DayAndBlock),
            "period" => Ok(RoomScope::Period),
            _ => Err(UnknownRoomScope(s.to_string())),
        }
    }
}

/// Resolver-wide policy knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPolicy {
    pub room_scope: RoomScope,
}

/// The `(day, block, period)` coordinates being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(rename = "dayOfWeek")]
    pub day: Day,
    pub block_id: Id,
    /// `None` matches no period-scoped record.
    pub period_id: Option<Id>,
}

impl Slot {
    pub fn new(day: Day, block_id: Id, period_id: Id) -> Self {
        Self {
            day,
            block_id,
            period_id: Some(period_id),
        }
    }
}

fn not_excluded(entry: &ScheduleEntry, exclude_entry_id: Option<Id>) -> bool {
    exclude_entry_id != Some(entry.id)
}

/// Teachers holding an entry at `slot` in the slot's period.
pub fn busy_teacher_ids(
    entries: &[ScheduleEntry],
    slot: &Slot,
    exclude_entry_id: Option<Id>,
) -> HashSet<Id> {
    entries
        .iter()
        .filter(|e| e.occupies(slot.day, slot.block_id) && Some(e.period_id) == slot.period_id)
        .filter(|e| not_excluded(e, exclude_entry_id))
        .map(|e| e.teacher_id)
        .collect()
}

/// Rooms holding an entry at `slot`, scoped according to `scope`.
pub fn busy_room_ids(
    entries: &[ScheduleEntry],
    slot: &Slot,
    exclude_entry_id: Option<Id>,
    scope: RoomScope,
) -> HashSet<Id> {
    entries
        .iter()
        .filter(|e| e.occupies(slot.day, slot.block_id))
        .filter(|e| match scope {
            RoomScope::DayAndBlock => true,
            RoomScope::Period => Some(e.period_id) == slot.period_id,
        })
        .filter(|e| not_excluded(e, exclude_entry_id))
        .map(|e| e.room_id)
        .collect()
}

/// Teachers with an explicit `is_available = true` record for `slot`.
pub fn available_teacher_ids(availabilities: &[TeacherAvailability], slot: &Slot) -> HashSet<Id> {
    availabilities
        .iter()
        .filter(|a| {
            a.is_available
                && a.day == slot.day
                && a.block_id == slot.block_id
                && Some(a.period_id) == slot.period_id
        })
        .map(|a| a.teacher_id)
        .collect()
}

/// All three lookup sets for one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictIndex {
    pub busy_teacher_ids: HashSet<Id>,
    pub busy_room_ids: HashSet<Id>,
    pub available_teacher_ids: HashSet<Id>,
}

impl ConflictIndex {
    pub fn build(
        snapshot: &TimetableSnapshot,
        slot: &Slot,
        exclude_entry_id: Option<Id>,
        policy: &ConflictPolicy,
    ) -> Self {
        Self {
            busy_teacher_ids: busy_teacher_ids(&snapshot.entries, slot, exclude_entry_id),
            busy_room_ids: busy_room_ids(&snapshot.entries, slot, exclude_entry_id, policy.room_scope),
            available_teacher_ids: available_teacher_ids(&snapshot.availabilities, slot),
        }
    }

    pub fn is_teacher_busy(&self, teacher_id: Id) -> bool {
        self.busy_teacher_ids.contains(&teacher_id)
    }

    pub fn is_room_busy(&self, room_id: Id) -> bool {
        self.busy_room_ids.contains(&room_id)
    }

    pub fn is_teacher_available(&self, teacher_id: Id) -> bool {
        self.available_teacher_ids.contains(&teacher_id)
    }
}
