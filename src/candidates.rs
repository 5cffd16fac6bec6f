//! Candidate filters for a pending assignment.
//!
//! Both filters fail closed: an incomplete query yields an empty list, the
//! same shape as "nobody fits". Results keep snapshot order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Day, Id, Room, Teacher, TimetableSnapshot};
use crate::index::{self, ConflictPolicy, Slot};

/// What the host has selected so far for a pending assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuery {
    pub subject_id: Option<Id>,
    pub block_id: Option<Id>,
    #[serde(rename = "dayOfWeek")]
    pub day: Option<Day>,
    pub period_id: Option<Id>,
    /// Entry under edit; it never conflicts with itself.
    pub exclude_entry_id: Option<Id>,
}

impl CandidateQuery {
    /// The subject and slot, when subject, block and day are all selected.
    fn target(&self) -> Option<(Id, Slot)> {
        let subject_id = self.subject_id?;
        let slot = Slot {
            day: self.day?,
            block_id: self.block_id?,
            period_id: self.period_id,
        };
        Some((subject_id, slot))
    }

    pub fn is_complete(&self) -> bool {
        self.target().is_some()
    }
}

/// Teachers that are declared available, not booked elsewhere in the slot,
/// and hold one of the subject's required specialties (if any).
pub fn candidate_teachers<'a>(query: &CandidateQuery, snapshot: &'a TimetableSnapshot) -> Vec<&'a Teacher> {
    let Some((subject_id, slot)) = query.target() else {
        return Vec::new();
    };
    let Some(subject) = snapshot.subject(subject_id) else {
        return Vec::new();
    };

    let required = &subject.required_specialty_ids;
    let available = index::available_teacher_ids(&snapshot.availabilities, &slot);
    let busy = index::busy_teacher_ids(&snapshot.entries, &slot, query.exclude_entry_id);

    let teachers: Vec<&Teacher> = snapshot
        .teachers
        .iter()
        .filter(|t| available.contains(&t.id) && !busy.contains(&t.id))
        .filter(|t| required.is_empty() || !t.specialty_ids.is_disjoint(required))
        .collect();

    debug!(
        subject_id,
        block_id = slot.block_id,
        day = slot.day.number(),
        candidates = teachers.len(),
        "teacher candidates computed"
    );
    teachers
}

/// Rooms free in the slot whose type matches the subject's required type (if any).
pub fn candidate_rooms<'a>(
    query: &CandidateQuery,
    snapshot: &'a TimetableSnapshot,
    policy: &ConflictPolicy,
) -> Vec<&'a Room> {
    let Some((subject_id, slot)) = query.target() else {
        return Vec::new();
    };
    let Some(subject) = snapshot.subject(subject_id) else {
        return Vec::new();
    };

    let busy = index::busy_room_ids(&snapshot.entries, &slot, query.exclude_entry_id, policy.room_scope);

    let rooms: Vec<&Room> = snapshot
        .rooms
        .iter()
        .filter(|r| !busy.contains(&r.id))
        .filter(|r| {
            subject
                .required_room_type_id
                .map_or(true, |required| r.room_type_id == required)
        })
        .collect();

    debug!(
        subject_id,
        block_id = slot.block_id,
        day = slot.day.number(),
        candidates = rooms.len(),
        "room candidates computed"
    );
    rooms
}

/// Why a complete query produced no candidates for a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Shortage {
    #[serde(rename_all = "camelCase")]
    NoRoomOfRequiredType {
        room_type_id: Id,
        room_type_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    NoSpecialistTeacher { specialty_ids: Vec<Id> },
}

/// Explains empty candidate lists caused by subject requirements.
///
/// Empty for incomplete queries and for subjects without requirements.
pub fn shortages(
    query: &CandidateQuery,
    snapshot: &TimetableSnapshot,
    teachers: &[&Teacher],
    rooms: &[&Room],
) -> Vec<Shortage> {
    let Some((subject_id, _)) = query.target() else {
        return Vec::new();
    };
    let Some(subject) = snapshot.subject(subject_id) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    if let Some(room_type_id) = subject.required_room_type_id {
        if rooms.is_empty() {
            found.push(Shortage::NoRoomOfRequiredType {
                room_type_id,
                room_type_name: subject.required_room_type_name.clone(),
            });
        }
    }
    if !subject.required_specialty_ids.is_empty() && teachers.is_empty() {
        let mut specialty_ids: Vec<Id> = subject.required_specialty_ids.iter().copied().collect();
        specialty_ids.sort_unstable();
        found.push(Shortage::NoSpecialistTeacher { specialty_ids });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScheduleEntry, Subject, TeacherAvailability};
    use crate::index::RoomScope;

    const PERIOD: Id = 1;
    const BLOCK: Id = 7;
    const LAB: Id = 2;
    const CLASSROOM: Id = 1;

    fn entry(id: Id, teacher_id: Id, room_id: Id, period_id: Id) -> ScheduleEntry {
        ScheduleEntry {
            id,
            group_id: 1,
            subject_id: 1,
            teacher_id,
            room_id,
            period_id,
            day: Day::Monday,
            block_id: BLOCK,
        }
    }

    fn snapshot() -> TimetableSnapshot {
        TimetableSnapshot {
            subjects: vec![
                Subject::new(1, "GEN100", "General Studies"),
                Subject::new(2, "CHE200", "Chemistry").with_room_type(LAB, "LAB"),
                Subject::new(3, "PRG300", "Programming").with_specialties([50, 51]),
            ],
            teachers: vec![
                Teacher::new(10, "Ada", "Lovelace").with_specialties([50]),
                Teacher::new(11, "Alan", "Turing"),
                Teacher::new(12, "Grace", "Hopper").with_specialties([51, 52]),
                Teacher::new(13, "Edsger", "Dijkstra").with_specialties([50]),
            ],
            rooms: vec![
                Room::new(100, "A-101", 40, CLASSROOM),
                Room::new(101, "LAB-1", 25, LAB),
                Room::new(102, "LAB-2", 25, LAB),
            ],
            availabilities: vec![
                TeacherAvailability::available(10, PERIOD, Day::Monday, BLOCK),
                TeacherAvailability::available(11, PERIOD, Day::Monday, BLOCK),
                TeacherAvailability::available(12, PERIOD, Day::Monday, BLOCK),
            ],
            ..Default::default()
        }
    }

    fn query(subject_id: Id) -> CandidateQuery {
        CandidateQuery {
            subject_id: Some(subject_id),
            block_id: Some(BLOCK),
            day: Some(Day::Monday),
            period_id: Some(PERIOD),
            exclude_entry_id: None,
        }
    }

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> Id) -> Vec<Id> {
        items.iter().map(|&t| id(t)).collect()
    }

    #[test]
    fn test_incomplete_query_fails_closed() {
        let snapshot = snapshot();
        let policy = ConflictPolicy::default();
        for q in [
            CandidateQuery { subject_id: None, ..query(1) },
            CandidateQuery { block_id: None, ..query(1) },
            CandidateQuery { day: None, ..query(1) },
        ] {
            assert!(candidate_teachers(&q, &snapshot).is_empty());
            assert!(candidate_rooms(&q, &snapshot, &policy).is_empty());
            assert!(!q.is_complete());
        }
    }

    #[test]
    fn test_unknown_subject_yields_nothing() {
        let snapshot = snapshot();
        assert!(candidate_teachers(&query(99), &snapshot).is_empty());
        assert!(candidate_rooms(&query(99), &snapshot, &ConflictPolicy::default()).is_empty());
    }

    #[test]
    fn test_no_specialty_requirement_is_wildcard() {
        let snapshot = snapshot();
        let teachers = candidate_teachers(&query(1), &snapshot);
        // 13 has no availability record at all.
        assert_eq!(ids(&teachers, |t| t.id), vec![10, 11, 12]);
    }

    #[test]
    fn test_specialty_requirement_needs_intersection() {
        let snapshot = snapshot();
        let teachers = candidate_teachers(&query(3), &snapshot);
        assert_eq!(ids(&teachers, |t| t.id), vec![10, 12]);
    }

    #[test]
    fn test_busy_teacher_excluded_unless_edited_entry() {
        let mut snapshot = snapshot();
        snapshot.entries.push(entry(500, 10, 100, PERIOD));

        let teachers = candidate_teachers(&query(1), &snapshot);
        assert_eq!(ids(&teachers, |t| t.id), vec![11, 12]);

        let editing = CandidateQuery {
            exclude_entry_id: Some(500),
            ..query(1)
        };
        let teachers = candidate_teachers(&editing, &snapshot);
        assert_eq!(ids(&teachers, |t| t.id), vec![10, 11, 12]);
    }

    #[test]
    fn test_teacher_busy_in_other_period_is_still_candidate() {
        let mut snapshot = snapshot();
        snapshot.entries.push(entry(500, 10, 100, PERIOD + 1));
        let teachers = candidate_teachers(&query(1), &snapshot);
        assert_eq!(ids(&teachers, |t| t.id), vec![10, 11, 12]);
    }

    #[test]
    fn test_required_room_type_returns_only_free_matching_rooms() {
        let mut snapshot = snapshot();
        snapshot.entries.push(entry(500, 11, 102, PERIOD));

        let rooms = candidate_rooms(&query(2), &snapshot, &ConflictPolicy::default());
        assert_eq!(ids(&rooms, |r| r.id), vec![101]);
        assert!(rooms.iter().all(|r| r.room_type_id == LAB));
    }

    #[test]
    fn test_no_room_type_requirement_is_wildcard() {
        let snapshot = snapshot();
        let rooms = candidate_rooms(&query(1), &snapshot, &ConflictPolicy::default());
        assert_eq!(ids(&rooms, |r| r.id), vec![100, 101, 102]);
    }

    #[test]
    fn test_room_busy_in_other_period_depends_on_scope() {
        let mut snapshot = snapshot();
        snapshot.entries.push(entry(500, 11, 101, PERIOD + 1));

        let rooms = candidate_rooms(&query(2), &snapshot, &ConflictPolicy::default());
        assert_eq!(ids(&rooms, |r| r.id), vec![102]);

        let scoped = ConflictPolicy {
            room_scope: RoomScope::Period,
        };
        let rooms = candidate_rooms(&query(2), &snapshot, &scoped);
        assert_eq!(ids(&rooms, |r| r.id), vec![101, 102]);
    }

    #[test]
    fn test_filters_are_idempotent() {
        let mut snapshot = snapshot();
        snapshot.entries.push(entry(500, 12, 100, PERIOD));
        let policy = ConflictPolicy::default();

        let first = candidate_teachers(&query(1), &snapshot);
        let second = candidate_teachers(&query(1), &snapshot);
        assert_eq!(first, second);

        let first = candidate_rooms(&query(1), &snapshot, &policy);
        let second = candidate_rooms(&query(1), &snapshot, &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_shortages_report_unmet_requirements() {
        let mut snapshot = snapshot();
        snapshot.entries.push(entry(500, 10, 101, PERIOD));
        snapshot.entries.push(entry(501, 12, 102, PERIOD));

        let q = query(2);
        let rooms = candidate_rooms(&q, &snapshot, &ConflictPolicy::default());
        let teachers = candidate_teachers(&q, &snapshot);
        assert_eq!(
            shortages(&q, &snapshot, &teachers, &rooms),
            vec![Shortage::NoRoomOfRequiredType {
                room_type_id: LAB,
                room_type_name: Some("LAB".to_string()),
            }]
        );

        let q = query(3);
        let rooms = candidate_rooms(&q, &snapshot, &ConflictPolicy::default());
        let teachers = candidate_teachers(&q, &snapshot);
        assert_eq!(
            shortages(&q, &snapshot, &teachers, &rooms),
            vec![Shortage::NoSpecialistTeacher {
                specialty_ids: vec![50, 51],
            }]
        );
    }
}
