use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, task};

use schedule_core::{
    export_file_name, export_json, Event, EventDraft, Filters, InstructorFilter, Schedule,
    ScheduleDocument, ScheduleStore, Storage, Timestamp,
};

pub const SCHEDULE_PATH: &str = "/api/schedule";

/// Changes are made on a copy of `schedule` and only swapped in once the
/// store has accepted them.
pub struct AppState<S> {
    pub schedule: RwLock<Schedule>,
    pub store: Arc<Mutex<ScheduleStore<S>>>,
}

impl<S: Storage + Send + 'static> AppState<S> {
    pub fn new(schedule: Schedule, store: ScheduleStore<S>) -> Arc<Self> {
        Arc::new(Self {
            schedule: RwLock::new(schedule),
            store: Arc::new(Mutex::new(store)),
        })
    }

    async fn persist(&self, events: Vec<Event>, now: DateTime<Utc>) -> Result<(), ApiError> {
        let store = Arc::clone(&self.store);

        task::spawn_blocking(move || -> schedule_core::Result<()> {
            let mut guard = store
                .lock()
                .map_err(|_| io::Error::other("schedule store lock poisoned"))?;
            guard.save(&events, now)
        })
        .await
        .map_err(|err| ApiError::Save(io::Error::other(err).into()))?
        .map_err(ApiError::Save)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Event ID is required")]
    MissingId,

    #[error("{0}")]
    Schedule(#[from] schedule_core::Error),

    #[error("Failed to save schedule data")]
    Save(#[source] schedule_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use schedule_core::Error;

        let status = match &self {
            Self::MissingId
            | Self::Schedule(Error::MissingField(_) | Error::UnknownKind(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Schedule(Error::UnknownEvent(_)) => StatusCode::NOT_FOUND,
            Self::Schedule(_) | Self::Save(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let Self::Save(err) = &self {
            error!("{self}: {err}");
        }

        (status, [(header::CONTENT_TYPE, "text/plain")], self.to_string()).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    instructor: Option<String>,
    q: Option<String>,
    #[serde(default)]
    ics: bool,
}

impl ScheduleQuery {
    fn filters(&self) -> Result<Filters, ApiError> {
        Ok(Filters {
            kind: match &self.kind {
                Some(kind) => kind.parse()?,
                None => Default::default(),
            },
            instructor: self
                .instructor
                .as_deref()
                .map_or(InstructorFilter::All, InstructorFilter::from),
            query: self.q.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
    timestamp: Timestamp,
}

impl SaveResponse {
    fn new(message: &'static str, event_id: Option<String>, now: DateTime<Utc>) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            event_id,
            timestamp: Timestamp::Valid(now),
        })
    }
}

pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: Storage + Send + 'static,
{
    Router::new()
        .route(
            SCHEDULE_PATH,
            get(get_schedule::<S>)
                .post(save_schedule::<S>)
                .put(update_event::<S>)
                .delete(delete_event::<S>),
        )
        .route("/api/schedule/instructors", get(instructors::<S>))
        .route("/api/schedule/calendar", get(calendar::<S>))
        .route("/api/schedule/export", get(export::<S>))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
        .with_state(state)
}

async fn get_schedule<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Response, ApiError> {
    let filters = query.filters()?;
    let document = ScheduleDocument::new(state.schedule.read().await.view(&filters), Utc::now());

    if query.ics {
        return Ok((
            [(header::CONTENT_TYPE, "text/calendar")],
            document.to_ics().to_string(),
        )
            .into_response());
    }

    Ok(Json(document).into_response())
}

async fn save_schedule<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(document): Json<ScheduleDocument>,
) -> Result<Json<SaveResponse>, ApiError> {
    let now = Utc::now();
    let mut schedule = state.schedule.write().await;

    let mut updated = schedule.clone();
    updated.replace_all(document.classes, now);
    state.persist(updated.events().to_vec(), now).await?;
    *schedule = updated;

    info!("Replaced schedule with {} events", schedule.events().len());
    Ok(SaveResponse::new("Schedule data saved successfully", None, now))
}

async fn update_event<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(draft): Json<EventDraft>,
) -> Result<Json<SaveResponse>, ApiError> {
    let now = Utc::now();
    let mut schedule = state.schedule.write().await;

    let mut updated = schedule.clone();
    let id = updated.save(draft, now)?.id.clone();
    state.persist(updated.events().to_vec(), now).await?;
    *schedule = updated;

    info!("Saved event {id}");
    Ok(SaveResponse::new(
        "Schedule data updated successfully",
        Some(id),
        now,
    ))
}

async fn delete_event<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<SaveResponse>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::MissingId)?;

    let now = Utc::now();
    let mut schedule = state.schedule.write().await;

    let mut updated = schedule.clone();
    updated.delete(&id)?;
    state.persist(updated.events().to_vec(), now).await?;
    *schedule = updated;

    info!("Deleted event {id}");
    Ok(SaveResponse::new("Event deleted successfully", Some(id), now))
}

async fn instructors<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<InstructorFilter>> {
    Json(state.schedule.read().await.instructors())
}

async fn calendar<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Response, ApiError> {
    let filters = query.filters()?;
    Ok(Json(state.schedule.read().await.calendar(&filters)).into_response())
}

async fn export<S: Storage + Send + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let exported = export_json(state.schedule.read().await.events(), now)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_file_name(now)),
            ),
        ],
        exported,
    )
        .into_response())
}
