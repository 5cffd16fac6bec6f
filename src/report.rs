//! Read-only views over a snapshot: the weekly grid, per-group assignment
//! progress and dangling references.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{parse_clock, Day, Id, ScheduleEntry, TimetableSnapshot};

// ============================================================================
// Timetable grid
// ============================================================================

/// Restricts the grid to one group, teacher or room. Unset fields match all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFilter {
    pub group_id: Option<Id>,
    pub teacher_id: Option<Id>,
    pub room_id: Option<Id>,
}

impl GridFilter {
    fn matches(&self, entry: &ScheduleEntry) -> bool {
        self.group_id.map_or(true, |id| entry.group_id == id)
            && self.teacher_id.map_or(true, |id| entry.teacher_id == id)
            && self.room_id.map_or(true, |id| entry.room_id == id)
    }
}

/// An entry as shown in a grid cell. Names are `None` when the referenced
/// record is not in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellEntry {
    pub entry_id: Id,
    pub subject_code: Option<String>,
    pub group_code: Option<String>,
    pub room_name: Option<String>,
    pub teacher_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    #[serde(rename = "dayOfWeek")]
    pub day: Day,
    /// Blocks at this row's hours on this day. Usually zero or one.
    pub block_ids: Vec<Id>,
    pub entries: Vec<CellEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub start_time: String,
    pub end_time: String,
    /// One cell per day, Monday through Saturday.
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableGrid {
    pub period_id: Id,
    pub rows: Vec<GridRow>,
}

impl TimetableGrid {
    pub fn entry_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| &r.cells)
            .map(|c| c.entries.len())
            .sum()
    }
}

fn cell_entry(snapshot: &TimetableSnapshot, entry: &ScheduleEntry) -> CellEntry {
    CellEntry {
        entry_id: entry.id,
        subject_code: snapshot.subject(entry.subject_id).map(|s| s.code.clone()),
        group_code: snapshot.group(entry.group_id).map(|g| g.code.clone()),
        room_name: snapshot.room(entry.room_id).map(|r| r.name.clone()),
        teacher_name: snapshot.teacher(entry.teacher_id).map(|t| t.full_name()),
    }
}

/// Lays out the entries of `period_id` as a day-by-block grid.
///
/// Rows are the distinct block hour ranges, ordered by the smallest
/// `order_index` sharing that range, then by start time.
pub fn timetable_grid(snapshot: &TimetableSnapshot, period_id: Id, filter: &GridFilter) -> TimetableGrid {
    // (start, end) -> smallest order index
    let mut ranges: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    for block in &snapshot.blocks {
        ranges
            .entry((block.start_time.as_str(), block.end_time.as_str()))
            .and_modify(|order| *order = (*order).min(block.order_index))
            .or_insert(block.order_index);
    }

    let mut ordered: Vec<((&str, &str), u32, Option<NaiveTime>)> = ranges
        .into_iter()
        .map(|(range, order)| (range, order, parse_clock(range.0)))
        .collect();
    ordered.sort_by(|a, b| (a.1, a.2, a.0).cmp(&(b.1, b.2, b.0)));

    let matching: Vec<&ScheduleEntry> = snapshot
        .entries_in_period(period_id)
        .filter(|e| filter.matches(e))
        .collect();

    let rows = ordered
        .into_iter()
        .map(|((start, end), _, _)| {
            let cells = Day::ALL
                .iter()
                .map(|&day| {
                    let block_ids: Vec<Id> = snapshot
                        .blocks
                        .iter()
                        .filter(|b| b.day == day && b.start_time == start && b.end_time == end)
                        .map(|b| b.id)
                        .collect();
                    let entries = matching
                        .iter()
                        .filter(|e| e.day == day && block_ids.contains(&e.block_id))
                        .map(|e| cell_entry(snapshot, e))
                        .collect();
                    GridCell { day, block_ids, entries }
                })
                .collect();
            GridRow {
                start_time: start.to_string(),
                end_time: end.to_string(),
                cells,
            }
        })
        .collect();

    TimetableGrid { period_id, rows }
}

// ============================================================================
// Group progress
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject_id: Id,
    pub code: String,
    pub name: String,
    /// Weekly theory plus practice hours.
    pub required_hours: u32,
    /// Blocks already scheduled for this group and subject.
    pub assigned_blocks: u32,
    pub remaining: u32,
}

impl SubjectProgress {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProgress {
    pub group_id: Id,
    pub period_id: Id,
    pub subjects: Vec<SubjectProgress>,
    pub total_required: u32,
    pub total_assigned: u32,
}

/// How far each subject of a group is from its weekly hours.
///
/// `None` if the group is unknown. Subjects not in the snapshot are skipped.
pub fn group_progress(snapshot: &TimetableSnapshot, group_id: Id, period_id: Id) -> Option<GroupProgress> {
    let group = snapshot.group(group_id)?;

    let subjects: Vec<SubjectProgress> = group
        .subject_ids
        .iter()
        .filter_map(|&id| snapshot.subject(id))
        .map(|subject| {
            let assigned_blocks = snapshot
                .entries_in_period(period_id)
                .filter(|e| e.group_id == group_id && e.subject_id == subject.id)
                .count() as u32;
            let required_hours = subject.weekly_hours();
            SubjectProgress {
                subject_id: subject.id,
                code: subject.code.clone(),
                name: subject.name.clone(),
                required_hours,
                assigned_blocks,
                remaining: required_hours.saturating_sub(assigned_blocks),
            }
        })
        .collect();

    Some(GroupProgress {
        group_id,
        period_id,
        total_required: subjects.iter().map(|s| s.required_hours).sum(),
        total_assigned: subjects.iter().map(|s| s.assigned_blocks).sum(),
        subjects,
    })
}

// ============================================================================
// Missing references
// ============================================================================

/// Ids referenced by entries that the snapshot does not contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingReferences {
    pub teacher_ids: Vec<Id>,
    pub room_ids: Vec<Id>,
    pub subject_ids: Vec<Id>,
    pub block_ids: Vec<Id>,
}

impl MissingReferences {
    pub fn is_empty(&self) -> bool {
        self.teacher_ids.is_empty()
            && self.room_ids.is_empty()
            && self.subject_ids.is_empty()
            && self.block_ids.is_empty()
    }
}

pub fn missing_references(snapshot: &TimetableSnapshot) -> MissingReferences {
    let mut teachers = BTreeSet::new();
    let mut rooms = BTreeSet::new();
    let mut subjects = BTreeSet::new();
    let mut blocks = BTreeSet::new();

    for e in &snapshot.entries {
        if snapshot.teacher(e.teacher_id).is_none() {
            teachers.insert(e.teacher_id);
        }
        if snapshot.room(e.room_id).is_none() {
            rooms.insert(e.room_id);
        }
        if snapshot.subject(e.subject_id).is_none() {
            subjects.insert(e.subject_id);
        }
        if snapshot.block(e.block_id).is_none() {
            blocks.insert(e.block_id);
        }
    }

    MissingReferences {
        teacher_ids: teachers.into_iter().collect(),
        room_ids: rooms.into_iter().collect(),
        subject_ids: subjects.into_iter().collect(),
        block_ids: blocks.into_iter().collect(),
    }
}
