//! Route handlers for all API endpoints.
//!
//! Each handler extracts the shared [`AppState`] and returns JSON or an
//! SSE stream. Errors go through [`ApiError`].

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chime_core::types::EntryId;
use chime_engine::{Action, EntrySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Interpreted action name, e.g. "set_timer".
    pub action: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
    /// Active entries after the command ran.
    pub timers: Vec<EntrySnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimersResponse {
    pub timers: Vec<EntrySnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
    pub timer_id: EntryId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelAllResponse {
    pub cancelled: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_entries: usize,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_entries: state.scheduler.active_count(),
        timestamp: Utc::now(),
    })
}

/// POST /commands - interpret a text command and carry it out.
pub async fn process_command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let text = req.command.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Empty command received".to_string()));
    }

    let action = state.interpreter.process_command(text);
    let mut message = action.describe();

    let entry_id = match &action {
        Action::SetTimer { duration, name } => {
            Some(state.scheduler.create_timer(*duration, name.clone(), state.fire_listener())?)
        }
        Action::SetAlarm { target_time, name } => Some(state.scheduler.create_alarm(
            target_time.with_timezone(&Utc),
            name.clone(),
            state.fire_listener(),
        )?),
        Action::CancelAll => {
            let count = state.scheduler.cancel_all();
            message = format!("Cancelled {} timer(s)", count);
            None
        }
        Action::ListTimers => None,
        Action::Unknown { reason } => {
            info!(command = %text, "Command not understood");
            return Err(ApiError::UnprocessableEntity(reason.clone()));
        }
    };

    Ok(Json(CommandResponse {
        action: action.name().to_string(),
        message,
        entry_id,
        timers: state.scheduler.list_active(),
    }))
}

/// GET /timers
pub async fn list_timers(State(state): State<AppState>) -> Json<TimersResponse> {
    Json(TimersResponse {
        timers: state.scheduler.list_active(),
    })
}

/// DELETE /timers/{id}
pub async fn cancel_timer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let id: EntryId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid timer id: {}", id)))?;

    if state.scheduler.cancel(id) {
        Ok(Json(CancelResponse {
            message: "Timer cancelled".to_string(),
            timer_id: id,
        }))
    } else {
        Err(ApiError::NotFound(
            "Timer not found or already completed".to_string(),
        ))
    }
}

/// DELETE /timers
pub async fn cancel_all(State(state): State<AppState>) -> Json<CancelAllResponse> {
    Json(CancelAllResponse {
        cancelled: state.scheduler.cancel_all(),
    })
}

/// GET /stream - SSE stream of fire notifications.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.kind.to_string()).data(data)))
        }
        Err(e) => {
            warn!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
