//! Domain model for timetable assignment.
//!
//! All records are owned by the remote scheduling API. The types here are
//! read views that the host loads for one period and hands to the resolver
//! as a [`TimetableSnapshot`].

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Identifier assigned by the remote API.
pub type Id = i64;

/// Day of the teaching week, serialized as 1 (Monday) through 6 (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Day {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl Day {
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("day of week must be between 1 and 6, got {0}")]
pub struct InvalidDay(pub u8);

impl TryFrom<u8> for Day {
    type Error = InvalidDay;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Day::ALL
            .iter()
            .copied()
            .find(|d| d.number() == value)
            .ok_or(InvalidDay(value))
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.number()
    }
}

/// Range of start hours.
///
/// `to_inclusive` distinguishes `[from, to)` from `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourWindow {
    pub from: u32,
    pub to: u32,
    pub to_inclusive: bool,
}

impl HourWindow {
    pub const fn half_open(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            to_inclusive: false,
        }
    }

    pub const fn closed(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            to_inclusive: true,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if hour < self.from {
            return false;
        }
        if self.to_inclusive {
            hour <= self.to
        } else {
            hour < self.to
        }
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.to_inclusive { ']' } else { ')' };
        write!(f, "[{:02}:00, {:02}:00{}", self.from, self.to, close)
    }
}

/// Coarse daypart preference of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
}

impl Shift {
    /// Legal block start hours for this shift.
    pub fn window(self) -> HourWindow {
        match self {
            Shift::Morning => HourWindow::half_open(7, 13),
            Shift::Afternoon => HourWindow::half_open(13, 18),
            Shift::Evening => HourWindow::closed(18, 22),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Afternoon => "afternoon",
            Shift::Evening => "evening",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shift {0:?}")]
pub struct UnknownShift(pub String);

impl FromStr for Shift {
    type Err = UnknownShift;

    /// Accepts the single-letter codes stored by the API (`M`, `T`, `N`) as
    /// well as English and Spanish names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "morning" | "mañana" | "manana" => Ok(Shift::Morning),
            "t" | "a" | "afternoon" | "tarde" => Ok(Shift::Afternoon),
            "n" | "e" | "evening" | "night" | "noche" => Ok(Shift::Evening),
            _ => Err(UnknownShift(s.to_string())),
        }
    }
}

impl TryFrom<String> for Shift {
    type Error = UnknownShift;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parses a stored clock string, `"HH:MM"` or `"HH:MM:SS"`.
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// A named time interval within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: Id,
    #[serde(rename = "dayOfWeek")]
    pub day: Day,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub order_index: u32,
    #[serde(default)]
    pub label: String,
}

impl TimeBlock {
    pub fn new(id: Id, day: Day, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        let start_time = start_time.into();
        let end_time = end_time.into();
        Self {
            id,
            day,
            label: format!("{}-{}", start_time, end_time),
            start_time,
            end_time,
            order_index: 0,
        }
    }

    pub fn with_order(mut self, order_index: u32) -> Self {
        self.order_index = order_index;
        self
    }

    pub fn start(&self) -> Option<NaiveTime> {
        parse_clock(&self.start_time)
    }

    /// Hour component of the start time, `None` when it cannot be parsed.
    pub fn start_hour(&self) -> Option<u32> {
        self.start().map(|t| t.hour())
    }
}

/// An academic term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: Id,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub total_curriculum_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Id,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub theory_hours: u32,
    #[serde(default)]
    pub practice_hours: u32,
    #[serde(default)]
    pub lab_hours: u32,
    /// `None` accepts any room type.
    #[serde(default)]
    pub required_room_type_id: Option<Id>,
    #[serde(default)]
    pub required_room_type_name: Option<String>,
    /// Empty accepts any available teacher.
    #[serde(default)]
    pub required_specialty_ids: HashSet<Id>,
}

impl Subject {
    pub fn new(id: Id, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            theory_hours: 0,
            practice_hours: 0,
            lab_hours: 0,
            required_room_type_id: None,
            required_room_type_name: None,
            required_specialty_ids: HashSet::new(),
        }
    }

    pub fn with_hours(mut self, theory: u32, practice: u32, lab: u32) -> Self {
        self.theory_hours = theory;
        self.practice_hours = practice;
        self.lab_hours = lab;
        self
    }

    pub fn with_room_type(mut self, room_type_id: Id, name: impl Into<String>) -> Self {
        self.required_room_type_id = Some(room_type_id);
        self.required_room_type_name = Some(name.into());
        self
    }

    pub fn with_specialties(mut self, specialty_ids: impl IntoIterator<Item = Id>) -> Self {
        self.required_specialty_ids.extend(specialty_ids);
        self
    }

    /// Weekly academic hours counted for assignment progress (theory + practice).
    pub fn weekly_hours(&self) -> u32 {
        self.theory_hours + self.practice_hours
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: Id,
    pub names: String,
    pub last_names: String,
    #[serde(default)]
    pub specialty_ids: HashSet<Id>,
}

impl Teacher {
    pub fn new(id: Id, names: impl Into<String>, last_names: impl Into<String>) -> Self {
        Self {
            id,
            names: names.into(),
            last_names: last_names.into(),
            specialty_ids: HashSet::new(),
        }
    }

    pub fn with_specialties(mut self, specialty_ids: impl IntoIterator<Item = Id>) -> Self {
        self.specialty_ids.extend(specialty_ids);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.names, self.last_names)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub capacity: u32,
    pub room_type_id: Id,
}

impl Room {
    pub fn new(id: Id, name: impl Into<String>, capacity: u32, room_type_id: Id) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            room_type_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Id,
    pub code: String,
    #[serde(default)]
    pub career_id: Option<Id>,
    #[serde(default)]
    pub subject_ids: Vec<Id>,
    pub preferred_shift: Shift,
    #[serde(default)]
    pub students_estimate: u32,
}

impl Group {
    pub fn new(id: Id, code: impl Into<String>, preferred_shift: Shift) -> Self {
        Self {
            id,
            code: code.into(),
            career_id: None,
            subject_ids: Vec::new(),
            preferred_shift,
            students_estimate: 0,
        }
    }

    pub fn with_career(mut self, career_id: Id) -> Self {
        self.career_id = Some(career_id);
        self
    }

    pub fn with_subjects(mut self, subject_ids: impl IntoIterator<Item = Id>) -> Self {
        self.subject_ids.extend(subject_ids);
        self
    }
}

/// Explicit availability declaration. A missing record means unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAvailability {
    pub teacher_id: Id,
    pub period_id: Id,
    #[serde(rename = "dayOfWeek")]
    pub day: Day,
    pub block_id: Id,
    pub is_available: bool,
}

impl TeacherAvailability {
    pub fn available(teacher_id: Id, period_id: Id, day: Day, block_id: Id) -> Self {
        Self {
            teacher_id,
            period_id,
            day,
            block_id,
            is_available: true,
        }
    }

    fn same_slot(&self, other: &TeacherAvailability) -> bool {
        self.teacher_id == other.teacher_id
            && self.period_id == other.period_id
            && self.day == other.day
            && self.block_id == other.block_id
    }
}

/// One group/subject taught by one teacher in one room during one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Id,
    pub group_id: Id,
    pub subject_id: Id,
    pub teacher_id: Id,
    pub room_id: Id,
    pub period_id: Id,
    #[serde(rename = "dayOfWeek")]
    pub day: Day,
    pub block_id: Id,
}

impl ScheduleEntry {
    /// True if this entry sits on `(day, block_id)`, regardless of period.
    pub fn occupies(&self, day: Day, block_id: Id) -> bool {
        self.day == day && self.block_id == block_id
    }
}

/// The collections a host loads for one period and passes to the resolver.
///
/// Missing collections deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimetableSnapshot {
    pub periods: Vec<Period>,
    pub blocks: Vec<TimeBlock>,
    pub careers: Vec<Career>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub rooms: Vec<Room>,
    pub groups: Vec<Group>,
    pub availabilities: Vec<TeacherAvailability>,
    pub entries: Vec<ScheduleEntry>,
}

impl TimetableSnapshot {
    pub fn block(&self, id: Id) -> Option<&TimeBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn career(&self, id: Id) -> Option<&Career> {
        self.careers.iter().find(|c| c.id == id)
    }

    pub fn subject(&self, id: Id) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn teacher(&self, id: Id) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn room(&self, id: Id) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn group(&self, id: Id) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn entry(&self, id: Id) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries_in_period(&self, period_id: Id) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(move |e| e.period_id == period_id)
    }

    /// Merges a record returned by the API after a create or update.
    ///
    /// Returns the replaced entry, if one with the same id existed.
    pub fn upsert_entry(&mut self, entry: ScheduleEntry) -> Option<ScheduleEntry> {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn remove_entry(&mut self, id: Id) -> Option<ScheduleEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Replaces the declaration for the same teacher/period/day/block, or appends it.
    pub fn upsert_availability(&mut self, availability: TeacherAvailability) {
        match self
            .availabilities
            .iter_mut()
            .find(|a| a.same_slot(&availability))
        {
            Some(existing) => *existing = availability,
            None => self.availabilities.push(availability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_round_trips_through_number() {
        assert_eq!(Day::try_from(1u8), Ok(Day::Monday));
        assert_eq!(Day::try_from(6u8), Ok(Day::Saturday));
        assert_eq!(Day::try_from(0u8), Err(InvalidDay(0)));
        assert_eq!(Day::try_from(7u8), Err(InvalidDay(7)));
        assert_eq!(u8::from(Day::Wednesday), 3);
    }

    #[test]
    fn test_day_rejects_sunday_on_the_wire() {
        assert!(serde_json::from_str::<Day>("7").is_err());
        assert_eq!(serde_json::from_str::<Day>("2").unwrap(), Day::Tuesday);
    }

    #[test]
    fn test_shift_parsing_accepts_codes_and_names() {
        assert_eq!("M".parse::<Shift>(), Ok(Shift::Morning));
        assert_eq!("Mañana".parse::<Shift>(), Ok(Shift::Morning));
        assert_eq!("T".parse::<Shift>(), Ok(Shift::Afternoon));
        assert_eq!("noche".parse::<Shift>(), Ok(Shift::Evening));
        assert_eq!("Evening".parse::<Shift>(), Ok(Shift::Evening));
        assert!("brunch".parse::<Shift>().is_err());

        let shift: Shift = serde_json::from_str("\"N\"").unwrap();
        assert_eq!(shift, Shift::Evening);
        assert_eq!(serde_json::to_string(&Shift::Afternoon).unwrap(), "\"afternoon\"");
    }

    #[test]
    fn test_shift_windows() {
        assert!(Shift::Morning.window().contains(7));
        assert!(Shift::Morning.window().contains(12));
        assert!(!Shift::Morning.window().contains(13));
        assert!(Shift::Afternoon.window().contains(13));
        assert!(!Shift::Afternoon.window().contains(18));
        assert!(Shift::Evening.window().contains(22));
        assert!(!Shift::Evening.window().contains(23));
        assert!(!Shift::Evening.window().contains(6));
    }

    #[test]
    fn test_block_start_hour() {
        let block = TimeBlock::new(1, Day::Monday, "08:30", "10:00");
        assert_eq!(block.start_hour(), Some(8));
        assert_eq!(block.label, "08:30-10:00");

        let with_seconds = TimeBlock::new(2, Day::Monday, "14:00:00", "15:30:00");
        assert_eq!(with_seconds.start_hour(), Some(14));

        let garbage = TimeBlock::new(3, Day::Monday, "soon", "later");
        assert_eq!(garbage.start_hour(), None);
    }

    #[test]
    fn test_snapshot_defaults_missing_collections() {
        let snapshot: TimetableSnapshot = serde_json::from_str(r#"{"teachers": []}"#).unwrap();
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.blocks.is_empty());
    }

    #[test]
    fn test_subject_without_specialties_deserializes_empty() {
        let subject: Subject =
            serde_json::from_str(r#"{"id": 1, "code": "MAT101", "name": "Calculus"}"#).unwrap();
        assert!(subject.required_specialty_ids.is_empty());
        assert_eq!(subject.required_room_type_id, None);
    }

    #[test]
    fn test_upsert_entry_replaces_by_id() {
        let mut snapshot = TimetableSnapshot::default();
        let entry = ScheduleEntry {
            id: 10,
            group_id: 1,
            subject_id: 2,
            teacher_id: 3,
            room_id: 4,
            period_id: 5,
            day: Day::Monday,
            block_id: 6,
        };
        assert!(snapshot.upsert_entry(entry.clone()).is_none());

        let moved = ScheduleEntry {
            day: Day::Friday,
            ..entry.clone()
        };
        assert_eq!(snapshot.upsert_entry(moved), Some(entry));
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].day, Day::Friday);

        assert!(snapshot.remove_entry(10).is_some());
        assert!(snapshot.remove_entry(10).is_none());
    }

    #[test]
    fn test_upsert_availability_replaces_same_slot() {
        let mut snapshot = TimetableSnapshot::default();
        snapshot.upsert_availability(TeacherAvailability::available(1, 1, Day::Monday, 1));
        snapshot.upsert_availability(TeacherAvailability {
            is_available: false,
            ..TeacherAvailability::available(1, 1, Day::Monday, 1)
        });
        snapshot.upsert_availability(TeacherAvailability::available(1, 1, Day::Monday, 2));

        assert_eq!(snapshot.availabilities.len(), 2);
        assert!(!snapshot.availabilities[0].is_available);
    }
}
