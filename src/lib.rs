//! Timetable Scheduling: manual assignment conflict resolver.
//!
//! This library provides the domain model, the conflict index, the candidate
//! filters and the assignment validator used when a subject is dropped onto a
//! timetable cell or an existing entry is edited.
//!
//! # Domain Model
//!
//! - [`TimeBlock`](domain::TimeBlock): Named interval within a day
//! - [`ScheduleEntry`](domain::ScheduleEntry): One group/subject/teacher/room in one slot
//! - [`TeacherAvailability`](domain::TeacherAvailability): Explicit availability declaration
//! - [`TimetableSnapshot`](domain::TimetableSnapshot): Collections supplied by the host
//!
//! # Rules
//!
//! - **No double booking**: a teacher or room holds one entry per slot
//! - **Availability**: teachers must have declared the slot available
//! - **Specialty / room type**: subject requirements, empty means wildcard
//! - **Shift window**: block start hour must match the group's preferred shift
//! - **Cycle window**: manual workspace only, bounded by the career cycle
//!
//! Every operation is a pure function over a snapshot passed by reference.

pub mod api;
pub mod candidates;
pub mod config;
pub mod console;
pub mod constraints;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod index;
pub mod report;
pub mod session;
