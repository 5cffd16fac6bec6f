//! Property tests for the candidate filters, the conflict index and the
//! validator over randomly generated snapshots.

use std::collections::HashSet;

use proptest::prelude::*;

use timetable_scheduling::candidates::{candidate_rooms, candidate_teachers, CandidateQuery};
use timetable_scheduling::constraints::{validate_assignment, Mode, Proposal, Workspace};
use timetable_scheduling::domain::{
    Day, Group, Id, Room, ScheduleEntry, Shift, Subject, Teacher, TeacherAvailability, TimeBlock,
    TimetableSnapshot,
};
use timetable_scheduling::index::{ConflictIndex, ConflictPolicy, RoomScope, Slot};

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const TEACHERS: Id = 6;
const ROOMS: Id = 5;
const SUBJECTS: Id = 3;
const GROUPS: Id = 3;

fn blocks() -> Vec<TimeBlock> {
    vec![
        TimeBlock::new(1, Day::Monday, "08:00", "09:30"),
        TimeBlock::new(2, Day::Monday, "14:00", "15:30").with_order(1),
        TimeBlock::new(3, Day::Tuesday, "08:00", "09:30"),
        TimeBlock::new(4, Day::Tuesday, "19:00", "20:30").with_order(1),
    ]
}

/// (day, block id) of one of the fixed blocks.
fn slot_strategy() -> impl Strategy<Value = (Day, Id)> {
    prop::sample::select(blocks().into_iter().map(|b| (b.day, b.id)).collect::<Vec<_>>())
}

fn specialties() -> impl Strategy<Value = Vec<Id>> {
    prop::collection::vec(1..=3 as Id, 0..=2)
}

fn shift() -> impl Strategy<Value = Shift> {
    prop::sample::select(vec![Shift::Morning, Shift::Afternoon, Shift::Evening])
}

fn availability() -> impl Strategy<Value = TeacherAvailability> {
    (1..=TEACHERS, 1..=2 as Id, slot_strategy(), any::<bool>()).prop_map(|(teacher_id, period_id, (day, block_id), on)| {
        TeacherAvailability {
            is_available: on,
            ..TeacherAvailability::available(teacher_id, period_id, day, block_id)
        }
    })
}

fn entry_fields() -> impl Strategy<Value = (Id, Id, Id, Id, Id, (Day, Id))> {
    (1..=GROUPS, 1..=SUBJECTS, 1..=TEACHERS, 1..=ROOMS, 1..=2 as Id, slot_strategy())
}

fn snapshot() -> impl Strategy<Value = TimetableSnapshot> {
    (
        prop::collection::vec(specialties(), TEACHERS as usize),
        prop::collection::vec(1..=2 as Id, ROOMS as usize),
        prop::collection::vec((specialties(), prop::option::of(1..=2 as Id)), SUBJECTS as usize),
        prop::collection::vec(shift(), GROUPS as usize),
        prop::collection::vec(availability(), 0..40),
        prop::collection::vec(entry_fields(), 0..12),
    )
        .prop_map(|(teacher_specs, room_types, subject_reqs, shifts, availabilities, entries)| {
            let teachers = teacher_specs
                .into_iter()
                .enumerate()
                .map(|(i, specs)| Teacher::new(i as Id + 1, "T", format!("{}", i + 1)).with_specialties(specs))
                .collect();
            let rooms = room_types
                .into_iter()
                .enumerate()
                .map(|(i, room_type)| Room::new(i as Id + 1, format!("R{}", i + 1), 30, room_type))
                .collect();
            let subjects = subject_reqs
                .into_iter()
                .enumerate()
                .map(|(i, (specs, room_type))| {
                    let subject = Subject::new(i as Id + 1, format!("S{}", i + 1), "Subject").with_specialties(specs);
                    match room_type {
                        Some(id) => subject.with_room_type(id, "TYPE"),
                        None => subject,
                    }
                })
                .collect();
            let groups = shifts
                .into_iter()
                .enumerate()
                .map(|(i, shift)| Group::new(i as Id + 1, format!("G{}", i + 1), shift))
                .collect();
            let entries = entries
                .into_iter()
                .enumerate()
                .map(|(i, (group_id, subject_id, teacher_id, room_id, period_id, (day, block_id)))| ScheduleEntry {
                    id: i as Id + 1,
                    group_id,
                    subject_id,
                    teacher_id,
                    room_id,
                    period_id,
                    day,
                    block_id,
                })
                .collect();

            TimetableSnapshot {
                blocks: blocks(),
                subjects,
                teachers,
                rooms,
                groups,
                availabilities,
                entries,
                ..Default::default()
            }
        })
}

/// Subject 4 does not exist in generated snapshots.
fn query() -> impl Strategy<Value = CandidateQuery> {
    (1..=SUBJECTS + 1, slot_strategy(), 1..=2 as Id, prop::option::of(1..=12 as Id)).prop_map(
        |(subject_id, (day, block_id), period_id, exclude_entry_id)| CandidateQuery {
            subject_id: Some(subject_id),
            block_id: Some(block_id),
            day: Some(day),
            period_id: Some(period_id),
            exclude_entry_id,
        },
    )
}

fn policy() -> impl Strategy<Value = ConflictPolicy> {
    prop::sample::select(vec![RoomScope::DayAndBlock, RoomScope::Period]).prop_map(|room_scope| ConflictPolicy { room_scope })
}

fn is_subsequence(ids: &[Id], order: &[Id]) -> bool {
    let mut rest = order.iter();
    ids.iter().all(|id| rest.any(|o| o == id))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_teacher_candidates_match_their_definition(s in snapshot(), q in query()) {
        let found: Vec<Id> = candidate_teachers(&q, &s).iter().map(|t| t.id).collect();
        let (day, block_id, period_id) = (q.day.unwrap(), q.block_id.unwrap(), q.period_id.unwrap());

        let expected: Vec<Id> = match s.subject(q.subject_id.unwrap()) {
            None => Vec::new(),
            Some(subject) => s
                .teachers
                .iter()
                .filter(|t| {
                    s.availabilities.iter().any(|a| {
                        a.is_available
                            && a.teacher_id == t.id
                            && a.day == day
                            && a.block_id == block_id
                            && a.period_id == period_id
                    })
                })
                .filter(|t| {
                    !s.entries.iter().any(|e| {
                        e.teacher_id == t.id
                            && e.occupies(day, block_id)
                            && e.period_id == period_id
                            && Some(e.id) != q.exclude_entry_id
                    })
                })
                .filter(|t| {
                    subject.required_specialty_ids.is_empty()
                        || t.specialty_ids.iter().any(|id| subject.required_specialty_ids.contains(id))
                })
                .map(|t| t.id)
                .collect(),
        };
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_empty_specialty_never_excludes_by_specialty(mut s in snapshot(), q in query()) {
        for subject in &mut s.subjects {
            subject.required_specialty_ids.clear();
        }
        let with_wildcard: HashSet<Id> = candidate_teachers(&q, &s).iter().map(|t| t.id).collect();

        for t in &mut s.teachers {
            t.specialty_ids.clear();
        }
        let without_specialties: HashSet<Id> = candidate_teachers(&q, &s).iter().map(|t| t.id).collect();
        prop_assert_eq!(with_wildcard, without_specialties);
    }

    #[test]
    fn prop_teacher_without_availability_is_never_a_candidate(s in snapshot(), q in query()) {
        let slot = Slot::new(q.day.unwrap(), q.block_id.unwrap(), q.period_id.unwrap());
        for teacher in candidate_teachers(&q, &s) {
            prop_assert!(s.availabilities.iter().any(|a| {
                a.teacher_id == teacher.id
                    && a.is_available
                    && a.day == slot.day
                    && a.block_id == slot.block_id
                    && Some(a.period_id) == slot.period_id
            }), "candidate teacher has no matching availability");
        }
    }

    #[test]
    fn prop_room_candidates_match_type_and_are_free(s in snapshot(), q in query(), p in policy()) {
        let rooms = candidate_rooms(&q, &s, &p);
        let ids: Vec<Id> = rooms.iter().map(|r| r.id).collect();
        let order: Vec<Id> = s.rooms.iter().map(|r| r.id).collect();
        prop_assert!(is_subsequence(&ids, &order));

        let Some(subject) = s.subject(q.subject_id.unwrap()) else {
            prop_assert!(rooms.is_empty());
            return Ok(());
        };
        let slot = Slot::new(q.day.unwrap(), q.block_id.unwrap(), q.period_id.unwrap());
        let index = ConflictIndex::build(&s, &slot, q.exclude_entry_id, &p);
        for room in rooms {
            prop_assert!(subject.required_room_type_id.map_or(true, |t| t == room.room_type_id));
            prop_assert!(!index.is_room_busy(room.id));
        }
    }

    #[test]
    fn prop_incomplete_query_fails_closed(s in snapshot(), q in query(), p in policy(), missing in 0..3usize) {
        let mut q = q;
        match missing {
            0 => q.subject_id = None,
            1 => q.block_id = None,
            _ => q.day = None,
        }
        prop_assert!(candidate_teachers(&q, &s).is_empty());
        prop_assert!(candidate_rooms(&q, &s, &p).is_empty());
    }

    #[test]
    fn prop_excluded_entry_is_invisible(s in snapshot(), q in query(), p in policy()) {
        let Some(exclude) = q.exclude_entry_id else { return Ok(()); };
        let slot = Slot::new(q.day.unwrap(), q.block_id.unwrap(), q.period_id.unwrap());

        let mut without = s.clone();
        without.remove_entry(exclude);
        prop_assert_eq!(
            ConflictIndex::build(&s, &slot, Some(exclude), &p),
            ConflictIndex::build(&without, &slot, None, &p)
        );
    }

    #[test]
    fn prop_resolver_is_idempotent(s in snapshot(), q in query(), p in policy(), teacher_id in 1..=TEACHERS, room_id in 1..=ROOMS, group_id in 1..=GROUPS) {
        let first: Vec<Id> = candidate_teachers(&q, &s).iter().map(|t| t.id).collect();
        let second: Vec<Id> = candidate_teachers(&q, &s).iter().map(|t| t.id).collect();
        prop_assert_eq!(first, second);

        let first: Vec<Id> = candidate_rooms(&q, &s, &p).iter().map(|r| r.id).collect();
        let second: Vec<Id> = candidate_rooms(&q, &s, &p).iter().map(|r| r.id).collect();
        prop_assert_eq!(first, second);

        let proposal = Proposal {
            group_id: Some(group_id),
            teacher_id: Some(teacher_id),
            room_id: Some(room_id),
            day: q.day,
            block_id: q.block_id,
            period_id: q.period_id,
        };
        prop_assert_eq!(
            validate_assignment(&proposal, &s, Mode::Create, Workspace::Manual, &p),
            validate_assignment(&proposal, &s, Mode::Create, Workspace::Manual, &p)
        );
    }

    #[test]
    fn prop_accepted_entries_never_double_book(
        s in snapshot(),
        attempts in prop::collection::vec(entry_fields(), 1..30),
        p in policy(),
    ) {
        let mut s = TimetableSnapshot { entries: Vec::new(), ..s };

        for (n, (group_id, subject_id, teacher_id, room_id, period_id, (day, block_id))) in attempts.into_iter().enumerate() {
            let proposal = Proposal {
                group_id: Some(group_id),
                teacher_id: Some(teacher_id),
                room_id: Some(room_id),
                day: Some(day),
                block_id: Some(block_id),
                period_id: Some(period_id),
            };
            if validate_assignment(&proposal, &s, Mode::Create, Workspace::Modal, &p).is_ok() {
                s.upsert_entry(ScheduleEntry {
                    id: n as Id + 1,
                    group_id,
                    subject_id,
                    teacher_id,
                    room_id,
                    period_id,
                    day,
                    block_id,
                });
            }
        }

        let mut teachers = HashSet::new();
        let mut groups = HashSet::new();
        let mut rooms = HashSet::new();
        for e in &s.entries {
            prop_assert!(teachers.insert((e.teacher_id, e.day, e.block_id, e.period_id)));
            prop_assert!(groups.insert((e.group_id, e.day, e.block_id, e.period_id)));
            let room_key = match p.room_scope {
                RoomScope::DayAndBlock => (e.room_id, e.day, e.block_id, 0),
                RoomScope::Period => (e.room_id, e.day, e.block_id, e.period_id),
            };
            prop_assert!(rooms.insert(room_key));
        }
    }
}
