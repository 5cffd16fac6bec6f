//! Pending-assignment state machine.
//!
//! One session per open assignment modal or manual drop. Selections feed the
//! candidate filters; saving runs the validator and either accepts the
//! proposal for submission or records the rejection until the host
//! acknowledges it.
//!
//! ```text
//! Idle <-> CandidatesComputed --attempt_save--> Accepted --mark_submitted--> Submitted
//!                  |
//!                  +--attempt_save--> Rejected --acknowledge--> Idle
//! ```
//!
//! Saving also rejects a teacher or room outside the candidate lists, so a
//! subject's specialty and room-type requirements hold for accepted entries.

use tracing::{debug, info};

use crate::candidates::{candidate_rooms, candidate_teachers, CandidateQuery};
use crate::constraints::{
    validate_assignment, CompleteProposal, Mode, Proposal, Rejection, Resource, Workspace,
};
use crate::domain::{Day, Id, ScheduleEntry, TimetableSnapshot};
use crate::index::ConflictPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Selection incomplete, no candidates.
    Idle,
    CandidatesComputed {
        teacher_ids: Vec<Id>,
        room_ids: Vec<Id>,
    },
    /// Validated and ready to be sent to the API.
    Accepted {
        subject_id: Id,
        proposal: CompleteProposal,
    },
    Submitted,
    Rejected(Rejection),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::CandidatesComputed { .. } => "candidates-computed",
            SessionState::Accepted { .. } => "accepted",
            SessionState::Submitted => "submitted",
            SessionState::Rejected(_) => "rejected",
        }
    }

    fn accepts_selection(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::CandidatesComputed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {state}")]
    IllegalTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Selections and state of one pending assignment.
#[derive(Debug, Clone)]
pub struct AssignmentSession {
    group_id: Id,
    subject_id: Option<Id>,
    day: Option<Day>,
    block_id: Option<Id>,
    period_id: Option<Id>,
    teacher_id: Option<Id>,
    room_id: Option<Id>,
    mode: Mode,
    workspace: Workspace,
    state: SessionState,
}

impl AssignmentSession {
    /// A fresh session for creating an entry for `group_id`.
    pub fn create(group_id: Id, workspace: Workspace) -> Self {
        Self {
            group_id,
            subject_id: None,
            day: None,
            block_id: None,
            period_id: None,
            teacher_id: None,
            room_id: None,
            mode: Mode::Create,
            workspace,
            state: SessionState::Idle,
        }
    }

    /// A session preloaded from an existing entry.
    ///
    /// Candidates are computed right away with the entry itself excluded.
    pub fn edit(
        entry: &ScheduleEntry,
        workspace: Workspace,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Self {
        let mut session = Self {
            group_id: entry.group_id,
            subject_id: Some(entry.subject_id),
            day: Some(entry.day),
            block_id: Some(entry.block_id),
            period_id: Some(entry.period_id),
            teacher_id: Some(entry.teacher_id),
            room_id: Some(entry.room_id),
            mode: Mode::Edit { entry_id: entry.id },
            workspace,
            state: SessionState::Idle,
        };
        session.recompute(snapshot, policy);
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn workspace(&self) -> Workspace {
        self.workspace
    }

    pub fn selected_teacher(&self) -> Option<Id> {
        self.teacher_id
    }

    pub fn selected_room(&self) -> Option<Id> {
        self.room_id
    }

    pub fn query(&self) -> CandidateQuery {
        CandidateQuery {
            subject_id: self.subject_id,
            block_id: self.block_id,
            day: self.day,
            period_id: self.period_id,
            exclude_entry_id: self.mode.exclude_entry_id(),
        }
    }

    pub fn proposal(&self) -> Proposal {
        Proposal {
            group_id: Some(self.group_id),
            teacher_id: self.teacher_id,
            room_id: self.room_id,
            day: self.day,
            block_id: self.block_id,
            period_id: self.period_id,
        }
    }

    fn guard(&self, action: &'static str) -> Result<(), SessionError> {
        if self.state.accepts_selection() {
            Ok(())
        } else {
            Err(SessionError::IllegalTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    pub fn select_subject(
        &mut self,
        subject_id: Option<Id>,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<&SessionState, SessionError> {
        self.guard("change the subject")?;
        self.subject_id = subject_id;
        Ok(self.recompute(snapshot, policy))
    }

    /// Changing the day clears the block, since blocks belong to one day.
    pub fn select_day(
        &mut self,
        day: Option<Day>,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<&SessionState, SessionError> {
        self.guard("change the day")?;
        if self.day != day {
            self.block_id = None;
        }
        self.day = day;
        Ok(self.recompute(snapshot, policy))
    }

    pub fn select_block(
        &mut self,
        block_id: Option<Id>,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<&SessionState, SessionError> {
        self.guard("change the block")?;
        self.block_id = block_id;
        Ok(self.recompute(snapshot, policy))
    }

    pub fn select_period(
        &mut self,
        period_id: Option<Id>,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<&SessionState, SessionError> {
        self.guard("change the period")?;
        self.period_id = period_id;
        Ok(self.recompute(snapshot, policy))
    }

    pub fn select_teacher(&mut self, teacher_id: Option<Id>) -> Result<(), SessionError> {
        self.guard("change the teacher")?;
        self.teacher_id = teacher_id;
        Ok(())
    }

    pub fn select_room(&mut self, room_id: Option<Id>) -> Result<(), SessionError> {
        self.guard("change the room")?;
        self.room_id = room_id;
        Ok(())
    }

    /// Recomputes the candidate lists after the underlying collections
    /// changed, e.g. once another session's entry was merged.
    pub fn refresh(
        &mut self,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<&SessionState, SessionError> {
        self.guard("refresh")?;
        Ok(self.recompute(snapshot, policy))
    }

    /// A selected teacher or room that is no longer a candidate is cleared.
    fn recompute(&mut self, snapshot: &TimetableSnapshot, policy: &ConflictPolicy) -> &SessionState {
        let query = self.query();
        if !query.is_complete() {
            self.state = SessionState::Idle;
            return &self.state;
        }

        let teacher_ids: Vec<Id> = candidate_teachers(&query, snapshot).iter().map(|t| t.id).collect();
        let room_ids: Vec<Id> = candidate_rooms(&query, snapshot, policy).iter().map(|r| r.id).collect();

        if self.teacher_id.is_some_and(|id| !teacher_ids.contains(&id)) {
            self.teacher_id = None;
        }
        if self.room_id.is_some_and(|id| !room_ids.contains(&id)) {
            self.room_id = None;
        }

        self.state = SessionState::CandidatesComputed { teacher_ids, room_ids };
        &self.state
    }

    /// Validates the current selections.
    ///
    /// Moves to `Accepted` on success or `Rejected` with the first failing
    /// rule. A missing subject is reported alongside the proposal's fields.
    pub fn attempt_save(
        &mut self,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<&SessionState, SessionError> {
        self.guard("save")?;

        let proposal = self.proposal();
        let verdict = match self.subject_id {
            Some(subject_id) => validate_assignment(&proposal, snapshot, self.mode, self.workspace, policy)
                .and_then(|()| proposal.complete())
                .and_then(|complete| self.check_candidates(subject_id, &complete, snapshot, policy))
                .map(|complete| (subject_id, complete)),
            None => {
                let mut fields = vec!["subjectId"];
                if let Err(Rejection::MissingFields { fields: rest }) = proposal.complete() {
                    fields.extend(rest);
                }
                Err(Rejection::MissingFields { fields })
            }
        };

        self.state = match verdict {
            Ok((subject_id, proposal)) => {
                debug!(group_id = self.group_id, subject_id, "assignment accepted");
                SessionState::Accepted { subject_id, proposal }
            }
            Err(rejection) => {
                info!(group_id = self.group_id, code = ?rejection.code(), %rejection, "assignment rejected");
                SessionState::Rejected(rejection)
            }
        };
        Ok(&self.state)
    }

    /// The validator has already ruled out busy and unavailable resources, so
    /// what is left here is the subject's specialty and room-type gates.
    fn check_candidates(
        &self,
        subject_id: Id,
        complete: &CompleteProposal,
        snapshot: &TimetableSnapshot,
        policy: &ConflictPolicy,
    ) -> Result<CompleteProposal, Rejection> {
        let query = self.query();
        if !candidate_teachers(&query, snapshot).iter().any(|t| t.id == complete.teacher_id) {
            return Err(Rejection::NotACandidate {
                resource: Resource::Teacher,
                id: complete.teacher_id,
                subject_id,
            });
        }
        if !candidate_rooms(&query, snapshot, policy).iter().any(|r| r.id == complete.room_id) {
            return Err(Rejection::NotACandidate {
                resource: Resource::Room,
                id: complete.room_id,
                subject_id,
            });
        }
        Ok(*complete)
    }

    /// Builds the record to send to the API. Only valid once accepted.
    pub fn pending_entry(&self) -> Result<ScheduleEntry, SessionError> {
        match &self.state {
            SessionState::Accepted { subject_id, proposal } => Ok(ScheduleEntry {
                id: self.mode.exclude_entry_id().unwrap_or_default(),
                group_id: proposal.group_id,
                subject_id: *subject_id,
                teacher_id: proposal.teacher_id,
                room_id: proposal.room_id,
                period_id: proposal.period_id,
                day: proposal.day,
                block_id: proposal.block_id,
            }),
            other => Err(SessionError::IllegalTransition {
                action: "build the entry",
                state: other.name(),
            }),
        }
    }

    /// Records a successful API round trip and merges the returned entry.
    pub fn mark_submitted(
        &mut self,
        saved: ScheduleEntry,
        snapshot: &mut TimetableSnapshot,
    ) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Accepted { .. }) {
            return Err(SessionError::IllegalTransition {
                action: "mark as submitted",
                state: self.state.name(),
            });
        }
        info!(entry_id = saved.id, group_id = saved.group_id, "assignment submitted");
        snapshot.upsert_entry(saved);
        self.state = SessionState::Submitted;
        Ok(())
    }

    /// Dismisses a rejection. Selections are kept.
    pub fn acknowledge(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Rejected(_) => {
                self.state = SessionState::Idle;
                Ok(())
            }
            ref other => Err(SessionError::IllegalTransition {
                action: "acknowledge",
                state: other.name(),
            }),
        }
    }
}
