//! Benchmark for candidate filter and validator throughput.
//!
//! Run with: cargo run --release --bin bench

use std::time::Instant;
use timetable_scheduling::candidates::{candidate_rooms, candidate_teachers, CandidateQuery};
use timetable_scheduling::console;
use timetable_scheduling::constraints::{validate_assignment, Mode, Proposal, Workspace};
use timetable_scheduling::demo_data::{self, DemoData};
use timetable_scheduling::index::{ConflictIndex, ConflictPolicy, Slot};

fn main() {
    let snapshot = demo_data::generate(DemoData::Large);
    let policy = ConflictPolicy::default();
    let period_id = snapshot.periods.first().map(|p| p.id);

    console::print_banner();
    console::print_snapshot_summary("LARGE", &snapshot);
    println!();

    // Every (subject, block) pair, as a user sweeping the grid would.
    let queries: Vec<CandidateQuery> = snapshot
        .subjects
        .iter()
        .flat_map(|subject| {
            snapshot.blocks.iter().map(move |block| CandidateQuery {
                subject_id: Some(subject.id),
                block_id: Some(block.id),
                day: Some(block.day),
                period_id,
                exclude_entry_id: None,
            })
        })
        .collect();

    let start = Instant::now();
    let mut found: u64 = 0;
    for query in &queries {
        found += candidate_teachers(query, &snapshot).len() as u64;
    }
    console::print_throughput("candidate teachers", queries.len() as u64, start.elapsed());

    let start = Instant::now();
    for query in &queries {
        found += candidate_rooms(query, &snapshot, &policy).len() as u64;
    }
    console::print_throughput("candidate rooms", queries.len() as u64, start.elapsed());

    let start = Instant::now();
    let mut calls: u64 = 0;
    if let Some(period_id) = period_id {
        for block in &snapshot.blocks {
            let index = ConflictIndex::build(&snapshot, &Slot::new(block.day, block.id, period_id), None, &policy);
            found += index.busy_teacher_ids.len() as u64;
            calls += 1;
        }
    }
    console::print_throughput("conflict index", calls, start.elapsed());

    // Re-validate every seeded entry against itself.
    let start = Instant::now();
    let mut rejected: u64 = 0;
    for entry in &snapshot.entries {
        let proposal = Proposal {
            group_id: Some(entry.group_id),
            teacher_id: Some(entry.teacher_id),
            room_id: Some(entry.room_id),
            day: Some(entry.day),
            block_id: Some(entry.block_id),
            period_id: Some(entry.period_id),
        };
        let mode = Mode::Edit { entry_id: entry.id };
        if validate_assignment(&proposal, &snapshot, mode, Workspace::Manual, &policy).is_err() {
            rejected += 1;
        }
    }
    console::print_throughput("validator", snapshot.entries.len() as u64, start.elapsed());

    println!();
    println!("  Candidates found: {}", found);
    println!("  Seeded entries rejected: {}", rejected);
    assert_eq!(rejected, 0, "Seeded entries must validate!");
}
