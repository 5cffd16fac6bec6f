//! REST API handlers for Timetable Scheduling.
//!
//! Snapshots are uploaded once and kept in memory under a generated id.
//! Every resolver call reads the stored snapshot; only the merge endpoints
//! mutate it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::candidates::{self, CandidateQuery};
use crate::constraints;
use crate::demo_data::{self, DemoData};
use crate::domain::{Id, ScheduleEntry, TeacherAvailability, TimetableSnapshot};
use crate::dto::{
    ConflictIndexDto, ConflictIndexRequest, GridQuery, HealthResponse, InfoResponse, ProgressQuery,
    RoomCandidatesResponse, TeacherCandidatesResponse, ValidateRequest, ValidationResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::index::{ConflictIndex, ConflictPolicy};
use crate::report::{self, GroupProgress, MissingReferences, TimetableGrid};

/// Application state shared across handlers.
pub struct AppState {
    snapshots: RwLock<HashMap<String, TimetableSnapshot>>,
    policy: ConflictPolicy,
}

impl AppState {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Stores a snapshot and returns its id.
    pub fn insert(&self, snapshot: TimetableSnapshot) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.snapshots.write().insert(id.clone(), snapshot);
        id
    }

    fn read<R>(&self, id: &str, f: impl FnOnce(&TimetableSnapshot) -> R) -> ApiResult<R> {
        let snapshots = self.snapshots.read();
        let snapshot = snapshots
            .get(id)
            .ok_or_else(|| ApiError::SnapshotNotFound(id.to_string()))?;
        Ok(f(snapshot))
    }

    fn write<R>(&self, id: &str, f: impl FnOnce(&mut TimetableSnapshot) -> R) -> ApiResult<R> {
        let mut snapshots = self.snapshots.write();
        let snapshot = snapshots
            .get_mut(id)
            .ok_or_else(|| ApiError::SnapshotNotFound(id.to_string()))?;
        Ok(f(snapshot))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ConflictPolicy::default())
    }
}

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        // Snapshots
        .route("/snapshots", post(create_snapshot).get(list_snapshots))
        .route("/snapshots/{id}", get(get_snapshot).delete(delete_snapshot))
        // Resolver
        .route("/snapshots/{id}/candidates/teachers", post(teacher_candidates))
        .route("/snapshots/{id}/candidates/rooms", post(room_candidates))
        .route("/snapshots/{id}/conflict-index", post(conflict_index))
        .route("/snapshots/{id}/validate", post(validate))
        // Merges after API round trips
        .route("/snapshots/{id}/entries", put(upsert_entry))
        .route("/snapshots/{id}/entries/{entry_id}", delete(remove_entry))
        .route("/snapshots/{id}/availabilities", put(upsert_availability))
        // Reports
        .route("/snapshots/{id}/grid", get(grid))
        .route("/snapshots/{id}/groups/{group_id}/progress", get(group_progress))
        .route("/snapshots/{id}/missing-references", get(missing_references))
        .with_state(state)
}

// ============================================================================
// Health & Info
// ============================================================================

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Timetable Scheduling",
        version: env!("CARGO_PKG_VERSION"),
        room_scope: state.policy.room_scope,
    })
}

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - Get a specific demo snapshot.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<TimetableSnapshot>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => Ok(Json(demo_data::generate(demo))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// POST /snapshots - Store a snapshot. Returns its id as plain text.
async fn create_snapshot(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<TimetableSnapshot>,
) -> String {
    let entries = snapshot.entries.len();
    let id = state.insert(snapshot);
    info!(snapshot_id = %id, entries, "snapshot stored");
    id
}

/// GET /snapshots - List all snapshot ids.
async fn list_snapshots(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.snapshots.read().keys().cloned().collect())
}

/// GET /snapshots/{id}
async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TimetableSnapshot>> {
    state.read(&id, |s| Json(s.clone()))
}

/// DELETE /snapshots/{id}
async fn delete_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = state.snapshots.write().remove(&id);
    match removed {
        Some(_) => {
            info!(snapshot_id = %id, "snapshot removed");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::SnapshotNotFound(id)),
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// POST /snapshots/{id}/candidates/teachers
async fn teacher_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(query): Json<CandidateQuery>,
) -> ApiResult<Json<TeacherCandidatesResponse>> {
    state.read(&id, |snapshot| {
        let teachers = candidates::candidate_teachers(&query, snapshot);
        let rooms = candidates::candidate_rooms(&query, snapshot, &state.policy);
        let shortages: Vec<_> = candidates::shortages(&query, snapshot, &teachers, &rooms)
            .into_iter()
            .filter(|s| matches!(s, candidates::Shortage::NoSpecialistTeacher { .. }))
            .collect();
        Json(TeacherCandidatesResponse {
            candidates: teachers.into_iter().cloned().collect(),
            shortages,
        })
    })
}

/// POST /snapshots/{id}/candidates/rooms
async fn room_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(query): Json<CandidateQuery>,
) -> ApiResult<Json<RoomCandidatesResponse>> {
    state.read(&id, |snapshot| {
        let teachers = candidates::candidate_teachers(&query, snapshot);
        let rooms = candidates::candidate_rooms(&query, snapshot, &state.policy);
        let shortages: Vec<_> = candidates::shortages(&query, snapshot, &teachers, &rooms)
            .into_iter()
            .filter(|s| matches!(s, candidates::Shortage::NoRoomOfRequiredType { .. }))
            .collect();
        Json(RoomCandidatesResponse {
            candidates: rooms.into_iter().cloned().collect(),
            shortages,
        })
    })
}

/// POST /snapshots/{id}/conflict-index
async fn conflict_index(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ConflictIndexRequest>,
) -> ApiResult<Json<ConflictIndexDto>> {
    state.read(&id, |snapshot| {
        let index = ConflictIndex::build(snapshot, &request.slot(), request.exclude_entry_id, &state.policy);
        Json(ConflictIndexDto::from(&index))
    })
}

/// POST /snapshots/{id}/validate - Always 200; a rejection is data.
async fn validate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ValidateRequest>,
) -> ApiResult<Json<ValidationResponse>> {
    state.read(&id, |snapshot| {
        let result = constraints::validate_assignment(
            &request.proposal,
            snapshot,
            request.mode(),
            request.workspace,
            &state.policy,
        );
        if let Err(rejection) = &result {
            debug!(snapshot_id = %id, code = ?rejection.code(), "proposal rejected");
        }
        Json(ValidationResponse::from(result))
    })
}

// ============================================================================
// Merges
// ============================================================================

/// PUT /snapshots/{id}/entries - Merge a saved entry. 201 when new, 200 when replaced.
async fn upsert_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(entry): Json<ScheduleEntry>,
) -> ApiResult<(StatusCode, Json<ScheduleEntry>)> {
    state.write(&id, |snapshot| {
        let status = match snapshot.upsert_entry(entry.clone()) {
            Some(_) => StatusCode::OK,
            None => StatusCode::CREATED,
        };
        (status, Json(entry))
    })
}

/// DELETE /snapshots/{id}/entries/{entry_id}
async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path((id, entry_id)): Path<(String, Id)>,
) -> ApiResult<StatusCode> {
    state
        .write(&id, |snapshot| snapshot.remove_entry(entry_id))?
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ApiError::NotFound {
            entity: "entry",
            id: entry_id,
        })
}

/// PUT /snapshots/{id}/availabilities
async fn upsert_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(availability): Json<TeacherAvailability>,
) -> ApiResult<StatusCode> {
    state.write(&id, |snapshot| snapshot.upsert_availability(availability))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Reports
// ============================================================================

/// GET /snapshots/{id}/grid?period=&group=&teacher=&room=
async fn grid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<GridQuery>,
) -> ApiResult<Json<TimetableGrid>> {
    state.read(&id, |snapshot| {
        Json(report::timetable_grid(snapshot, query.period, &query.filter()))
    })
}

/// GET /snapshots/{id}/groups/{group_id}/progress?period=
async fn group_progress(
    State(state): State<Arc<AppState>>,
    Path((id, group_id)): Path<(String, Id)>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Json<GroupProgress>> {
    state
        .read(&id, |snapshot| report::group_progress(snapshot, group_id, query.period))?
        .map(Json)
        .ok_or(ApiError::NotFound {
            entity: "group",
            id: group_id,
        })
}

/// GET /snapshots/{id}/missing-references
async fn missing_references(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MissingReferences>> {
    state.read(&id, |snapshot| Json(report::missing_references(snapshot)))
}
