use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{delete, get, post},
    Json, Router,
};
use time::{format_description::FormatItem, macros::format_description, Date};
use tracing::{error, info, instrument, warn};

use super::dto::{DayView, HistoryResponse, LogFoodRequest};
use super::repo_types::{LogDate, UserLogs};
use super::services::{daily_total, suggestions, trailing_average};
use crate::{nutrition::LookupError, session::CurrentUser, state::AppState};

const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[weekday], [month repr:long] [day], [year]");

type ApiError = (StatusCode, String);

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/day", get(get_today).post(log_food))
        .route("/day/:date", get(get_day).delete(clear_day))
        .route("/day/:date/entries/:index", delete(delete_entry))
        .route("/history", get(history))
        .route("/undo", post(undo))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn get_today(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(HeaderMap, Json<DayView>), ApiError> {
    let now = state.local_now();
    let logs = state.logs.load(user.id, now).await.map_err(internal)?;
    let view = day_view(&state, &logs, LogDate(now.date()), now.date(), None);
    Ok((user.cookie_headers(), Json(view)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn get_day(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<LogDate>,
) -> Result<(HeaderMap, Json<DayView>), ApiError> {
    let now = state.local_now();
    let logs = state.logs.load(user.id, now).await.map_err(internal)?;
    let view = day_view(&state, &logs, date, now.date(), None);
    Ok((user.cookie_headers(), Json(view)))
}

/// POST /day { food_query }. Looks the query up and appends every match to today.
/// Lookup failures come back in `error` and leave the logs untouched.
#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn log_food(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<LogFoodRequest>,
) -> Result<(HeaderMap, Json<DayView>), ApiError> {
    let now = state.local_now();
    let today = LogDate(now.date());
    let mut logs = state.logs.load(user.id, now).await.map_err(internal)?;

    let mut lookup_error = None;
    let query = body.food_query.trim();
    if !query.is_empty() {
        match state.nutrition.lookup(query).await {
            Ok(entries) => {
                let count = entries.len();
                if logs.append(today, entries) {
                    state.logs.save(user.id, &logs).await.map_err(internal)?;
                }
                info!(count, %today, "foods logged");
            }
            Err(e @ LookupError::NotFound) => {
                info!(query, "no foods matched");
                lookup_error = Some(e.to_string());
            }
            Err(e) => {
                warn!(error = %e, query, "lookup failed");
                lookup_error = Some(e.to_string());
            }
        }
    }

    let view = day_view(&state, &logs, today, now.date(), lookup_error);
    Ok((user.cookie_headers(), Json(view)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(HeaderMap, Json<HistoryResponse>), ApiError> {
    let logs = state
        .logs
        .load(user.id, state.local_now())
        .await
        .map_err(internal)?;
    Ok((
        user.cookie_headers(),
        Json(HistoryResponse {
            dates: logs.dates_desc(),
        }),
    ))
}

/// Removes the most recent entry logged today.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn undo(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(HeaderMap, Redirect), ApiError> {
    let now = state.local_now();
    let mut logs = state.logs.load(user.id, now).await.map_err(internal)?;
    if logs.undo_last(LogDate(now.date())) {
        state.logs.save(user.id, &logs).await.map_err(internal)?;
    }
    Ok((user.cookie_headers(), Redirect::to("/api/v1/day")))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn clear_day(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<LogDate>,
) -> Result<(HeaderMap, Redirect), ApiError> {
    let mut logs = state
        .logs
        .load(user.id, state.local_now())
        .await
        .map_err(internal)?;
    if logs.clear_day(date) {
        state.logs.save(user.id, &logs).await.map_err(internal)?;
        info!(%date, "day cleared");
    }
    Ok((user.cookie_headers(), Redirect::to("/api/v1/history")))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((date, index)): Path<(LogDate, usize)>,
) -> Result<(HeaderMap, Redirect), ApiError> {
    let mut logs = state
        .logs
        .load(user.id, state.local_now())
        .await
        .map_err(internal)?;
    if logs.remove_entry(date, index) {
        state.logs.save(user.id, &logs).await.map_err(internal)?;
    }
    Ok((
        user.cookie_headers(),
        Redirect::to(&format!("/api/v1/day/{}", date)),
    ))
}

fn day_view(
    state: &AppState,
    logs: &UserLogs,
    date: LogDate,
    today: Date,
    error: Option<String>,
) -> DayView {
    let entries = logs.day(date).to_vec();
    let window_days = state.config.average_window_days;
    DayView {
        date,
        display_date: date
            .date()
            .format(DISPLAY_FORMAT)
            .unwrap_or_else(|_| date.to_string()),
        viewing_today: date.date() == today,
        total_carbs: daily_total(&entries),
        trailing_average: trailing_average(logs, today, window_days),
        window_days,
        suggestions: suggestions(logs, state.config.suggestion_limit),
        entries,
        error,
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    error!(error = %format!("{:#}", e), "storage failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
