//! Demo data generators for Timetable Scheduling.
//!
//! Snapshots are deterministic for a given size. Entries are seeded through
//! the candidate filters and the validator, so a demo snapshot never holds a
//! double booking or a shift violation.

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::candidates::{candidate_rooms, candidate_teachers, CandidateQuery};
use crate::constraints::{cycle_from_curriculum_hours, validate_assignment, CycleBand, Mode, Proposal, Workspace};
use crate::domain::{
    Career, Day, Group, Id, Period, Room, ScheduleEntry, Shift, Subject, Teacher, TeacherAvailability,
    TimeBlock, TimetableSnapshot,
};
use crate::index::ConflictPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                career_count: 2,
                groups_per_career: 2,
                subjects_per_career: 6,
                teacher_count: 15,
                classroom_count: 6,
                lab_count: 2,
                days: 5,
                specialty_distribution: vec![(1, 3.0), (2, 1.0)],
                availability_ratio: 0.7,
                fill_ratio: 0.6,
            },
            DemoData::Large => DemoDataParameters {
                career_count: 4,
                groups_per_career: 4,
                subjects_per_career: 10,
                teacher_count: 60,
                classroom_count: 20,
                lab_count: 6,
                days: 6,
                specialty_distribution: vec![(1, 2.0), (2, 2.0), (3, 1.0)],
                availability_ratio: 0.6,
                fill_ratio: 0.6,
            },
        }
    }
}

struct DemoDataParameters {
    career_count: usize,
    groups_per_career: usize,
    subjects_per_career: usize,
    teacher_count: usize,
    classroom_count: usize,
    lab_count: usize,
    days: usize,
    specialty_distribution: Vec<(usize, f64)>,
    /// Chance that a teacher declares a given block available.
    availability_ratio: f64,
    /// Share of each subject's weekly hours that gets pre-assigned.
    fill_ratio: f64,
}

const PERIOD_ID: Id = 1;
const CLASSROOM: Id = 1;
const LAB: Id = 2;

const BLOCK_TIMES: &[(&str, &str)] = &[
    ("07:00", "08:30"),
    ("08:30", "10:00"),
    ("10:15", "11:45"),
    ("11:45", "13:15"),
    ("13:30", "15:00"),
    ("15:00", "16:30"),
    ("16:30", "18:00"),
    ("18:00", "19:30"),
    ("19:30", "21:00"),
];

/// (code, name, total curriculum hours)
const CAREERS: &[(&str, &str, u32)] = &[
    ("SYS", "Systems Engineering", 4),
    ("IND", "Industrial Engineering", 10),
    ("ACC", "Accounting", 14),
    ("NUR", "Nursing", 6),
];

const SPECIALTIES: &[&str] = &[
    "Mathematics",
    "Programming",
    "Networks",
    "Chemistry",
    "Physics",
    "Management",
    "Accounting",
    "Health Sciences",
];

/// (name, required specialty id, needs a lab)
const SUBJECT_CATALOG: &[(&str, Option<Id>, bool)] = &[
    ("Calculus", Some(1), false),
    ("Linear Algebra", Some(1), false),
    ("Programming Fundamentals", Some(2), true),
    ("Data Structures", Some(2), true),
    ("Computer Networks", Some(3), true),
    ("General Chemistry", Some(4), true),
    ("Physics I", Some(5), true),
    ("Project Management", Some(6), false),
    ("Financial Accounting", Some(7), false),
    ("Anatomy", Some(8), true),
    ("Statistics", Some(1), false),
    ("Communication Skills", None, false),
    ("Ethics", None, false),
    ("English I", None, false),
];

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates a demo snapshot for the given size.
pub fn generate(demo: DemoData) -> TimetableSnapshot {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let period = Period {
        id: PERIOD_ID,
        name: "2024-I".to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap_or(NaiveDate::MIN),
        end_date: NaiveDate::from_ymd_opt(2024, 7, 26).unwrap_or(NaiveDate::MIN),
        active: true,
    };

    let mut blocks = Vec::new();
    for &day in Day::ALL.iter().take(params.days) {
        for (order, (start, end)) in BLOCK_TIMES.iter().enumerate() {
            let id = blocks.len() as Id + 1;
            blocks.push(TimeBlock::new(id, day, *start, *end).with_order(order as u32));
        }
    }

    let careers: Vec<Career> = CAREERS
        .iter()
        .take(params.career_count)
        .enumerate()
        .map(|(i, (_, name, hours))| Career {
            id: i as Id + 1,
            name: name.to_string(),
            total_curriculum_hours: *hours,
        })
        .collect();

    // Subjects and groups per career
    let mut subjects = Vec::new();
    let mut groups = Vec::new();
    for (career, (code, _, _)) in careers.iter().zip(CAREERS) {
        let picked: Vec<&(&str, Option<Id>, bool)> = SUBJECT_CATALOG
            .choose_multiple(&mut rng, params.subjects_per_career.min(SUBJECT_CATALOG.len()))
            .collect();

        let mut subject_ids = Vec::new();
        for (n, (name, specialty, needs_lab)) in picked.into_iter().enumerate() {
            let id = subjects.len() as Id + 1;
            let mut subject = Subject::new(id, format!("{}{}", code, 101 + n), *name)
                .with_hours(rng.gen_range(2..=3), rng.gen_range(0..=1), if *needs_lab { 2 } else { 0 })
                .with_specialties(*specialty);
            if *needs_lab {
                subject = subject.with_room_type(LAB, "LAB");
            }
            subject_ids.push(id);
            subjects.push(subject);
        }

        let shift = shift_for_career(career);
        for g in 0..params.groups_per_career {
            let id = groups.len() as Id + 1;
            let letter = (b'A' + g as u8) as char;
            let mut group = Group::new(id, format!("{}-1{}", code, letter), shift)
                .with_career(career.id)
                .with_subjects(subject_ids.iter().copied());
            group.students_estimate = rng.gen_range(20..=40);
            groups.push(group);
        }
    }

    // Teachers
    let names = generate_name_permutations(&mut rng);
    let specialty_ids: Vec<Id> = (1..=SPECIALTIES.len() as Id).collect();
    let teachers: Vec<Teacher> = (0..params.teacher_count)
        .map(|i| {
            let (first, last) = &names[i % names.len()];
            let count = pick_count(&mut rng, &params.specialty_distribution);
            let specialties: Vec<Id> = specialty_ids
                .choose_multiple(&mut rng, count.min(specialty_ids.len()))
                .copied()
                .collect();
            Teacher::new(i as Id + 1, *first, *last).with_specialties(specialties)
        })
        .collect();

    // Rooms
    let mut rooms = Vec::new();
    for i in 0..params.classroom_count {
        let id = rooms.len() as Id + 1;
        let name = format!("A-{}{:02}", 1 + i / 10, 1 + i % 10);
        rooms.push(Room::new(id, name, rng.gen_range(30..=45), CLASSROOM));
    }
    for i in 0..params.lab_count {
        let id = rooms.len() as Id + 1;
        rooms.push(Room::new(id, format!("LAB-{}", i + 1), rng.gen_range(20..=30), LAB));
    }

    // Availability declarations
    let mut availabilities = Vec::new();
    for teacher in &teachers {
        for block in &blocks {
            if rng.gen_bool(params.availability_ratio) {
                availabilities.push(TeacherAvailability::available(teacher.id, PERIOD_ID, block.day, block.id));
            } else if rng.gen_bool(0.3) {
                availabilities.push(TeacherAvailability {
                    is_available: false,
                    ..TeacherAvailability::available(teacher.id, PERIOD_ID, block.day, block.id)
                });
            }
        }
    }

    let mut snapshot = TimetableSnapshot {
        periods: vec![period],
        blocks,
        careers,
        subjects,
        teachers,
        rooms,
        groups,
        availabilities,
        entries: Vec::new(),
    };
    seed_entries(&mut snapshot, &mut rng, params.fill_ratio, &ConflictPolicy::default());
    snapshot
}

/// Preferred shift matching the career's cycle band, so manual placements fit.
fn shift_for_career(career: &Career) -> Shift {
    match CycleBand::of(cycle_from_curriculum_hours(career.total_curriculum_hours)) {
        CycleBand::Early => Shift::Morning,
        CycleBand::Intermediate => Shift::Afternoon,
        CycleBand::Senior => Shift::Evening,
    }
}

/// Places part of each subject's weekly hours, the way a user would: pick a
/// block in the group's shift, pick among the candidates, save only if the
/// validator accepts.
fn seed_entries(snapshot: &mut TimetableSnapshot, rng: &mut StdRng, fill_ratio: f64, policy: &ConflictPolicy) {
    let groups = snapshot.groups.clone();
    let mut next_id: Id = 1;

    for group in &groups {
        let window = group.preferred_shift.window();
        let slots: Vec<(Day, Id)> = snapshot
            .blocks
            .iter()
            .filter(|b| b.start_hour().is_some_and(|h| window.contains(h)))
            .map(|b| (b.day, b.id))
            .collect();

        for &subject_id in &group.subject_ids {
            let target = match snapshot.subject(subject_id) {
                Some(subject) => (subject.weekly_hours() as f64 * fill_ratio).round() as usize,
                None => continue,
            };

            let mut shuffled = slots.clone();
            shuffled.shuffle(rng);
            let mut placed = 0;

            for (day, block_id) in shuffled {
                if placed >= target {
                    break;
                }
                let query = CandidateQuery {
                    subject_id: Some(subject_id),
                    block_id: Some(block_id),
                    day: Some(day),
                    period_id: Some(PERIOD_ID),
                    exclude_entry_id: None,
                };
                let teacher_id = candidate_teachers(&query, snapshot).choose(rng).map(|t| t.id);
                let room_id = candidate_rooms(&query, snapshot, policy).first().map(|r| r.id);
                let (Some(teacher_id), Some(room_id)) = (teacher_id, room_id) else {
                    continue;
                };

                let proposal = Proposal {
                    group_id: Some(group.id),
                    teacher_id: Some(teacher_id),
                    room_id: Some(room_id),
                    day: Some(day),
                    block_id: Some(block_id),
                    period_id: Some(PERIOD_ID),
                };
                if validate_assignment(&proposal, snapshot, Mode::Create, Workspace::Manual, policy).is_err() {
                    continue;
                }

                snapshot.entries.push(ScheduleEntry {
                    id: next_id,
                    group_id: group.id,
                    subject_id,
                    teacher_id,
                    room_id,
                    period_id: PERIOD_ID,
                    day,
                    block_id,
                });
                next_id += 1;
                placed += 1;
            }
        }
    }
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(1)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<(&'static str, &'static str)> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push((*first, *last));
        }
    }
    names.shuffle(rng);
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::group_progress;
    use std::collections::HashSet;

    #[test]
    fn test_generate_small() {
        let snapshot = generate(DemoData::Small);

        assert_eq!(snapshot.teachers.len(), 15);
        assert_eq!(snapshot.rooms.len(), 8);
        assert_eq!(snapshot.groups.len(), 4);
        assert_eq!(snapshot.subjects.len(), 12);
        assert_eq!(snapshot.blocks.len(), 5 * BLOCK_TIMES.len());
        assert!(!snapshot.entries.is_empty());
    }

    #[test]
    fn test_generate_large() {
        let snapshot = generate(DemoData::Large);

        assert_eq!(snapshot.teachers.len(), 60);
        assert_eq!(snapshot.groups.len(), 16);
        assert_eq!(snapshot.blocks.len(), 6 * BLOCK_TIMES.len());
        assert!(
            snapshot.entries.len() >= 50,
            "Expected >= 50 entries, got {}",
            snapshot.entries.len()
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(generate(DemoData::Small), generate(DemoData::Small));
    }

    #[test]
    fn test_seeded_entries_pass_validation() {
        let snapshot = generate(DemoData::Small);
        let policy = ConflictPolicy::default();

        for entry in &snapshot.entries {
            let proposal = Proposal {
                group_id: Some(entry.group_id),
                teacher_id: Some(entry.teacher_id),
                room_id: Some(entry.room_id),
                day: Some(entry.day),
                block_id: Some(entry.block_id),
                period_id: Some(entry.period_id),
            };
            let result = validate_assignment(
                &proposal,
                &snapshot,
                Mode::Edit { entry_id: entry.id },
                Workspace::Manual,
                &policy,
            );
            assert_eq!(result, Ok(()), "entry {} failed validation", entry.id);
        }
    }

    #[test]
    fn test_no_double_booking() {
        let snapshot = generate(DemoData::Large);
        let mut teachers = HashSet::new();
        let mut rooms = HashSet::new();
        let mut groups = HashSet::new();

        for e in &snapshot.entries {
            assert!(teachers.insert((e.teacher_id, e.day, e.block_id)));
            assert!(rooms.insert((e.room_id, e.day, e.block_id)));
            assert!(groups.insert((e.group_id, e.day, e.block_id)));
        }
    }

    #[test]
    fn test_subjects_are_left_partially_assigned() {
        let snapshot = generate(DemoData::Small);
        for group in &snapshot.groups {
            let progress = group_progress(&snapshot, group.id, PERIOD_ID).unwrap();
            assert!(progress.subjects.iter().all(|s| s.remaining > 0));
        }
    }

    #[test]
    fn test_group_shift_follows_career_cycle() {
        let snapshot = generate(DemoData::Large);
        let shifts: HashSet<Shift> = snapshot.groups.iter().map(|g| g.preferred_shift).collect();
        assert_eq!(shifts.len(), 3);
    }

    #[test]
    fn test_demo_data_from_str() {
        assert_eq!("SMALL".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("invalid".parse::<DemoData>().is_err());
    }
}
