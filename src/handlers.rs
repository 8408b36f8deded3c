use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, Json, Redirect},
    Form,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    csrf,
    services::{Ledger, StoreError, Totals},
    types::{
        AddRequest, AddResponse, ApiError, DeleteResponse, JsonOrForm, LedgerResponse, TokenForm,
    },
    views, AppState,
};

/// Runs a ledger operation on the blocking pool so the ledger lock is never
/// held across an await point.
async fn with_ledger<F, R>(ledger: &Arc<Ledger>, op: F) -> Result<R, ApiError>
where
    F: FnOnce(&Ledger) -> Result<R, StoreError> + Send + 'static,
    R: Send + 'static,
{
    let ledger = Arc::clone(ledger);
    tokio::task::spawn_blocking(move || op(&ledger))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn check_token(state: &AppState, token: Option<&str>) -> Result<(), ApiError> {
    if state.csrf.verify(token) {
        Ok(())
    } else {
        warn!("rejected request with missing or unknown csrf token");
        Err(ApiError::Forbidden)
    }
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(csrf::HEADER).and_then(|v| v.to_str().ok())
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let (entries, warning) = match with_ledger(&state.ledger, |l| l.load()).await {
        Ok(entries) => (entries, None),
        Err(ApiError::Store(StoreError::Corrupt { path, source })) => {
            error!(path = %path.display(), error = %source, "ledger file is corrupt, rendering empty");
            (Vec::new(), Some("The score file could not be read. Showing an empty ledger."))
        }
        Err(e) => {
            error!(error = ?e, "failed to load ledger, rendering empty");
            (Vec::new(), Some("The score file is unavailable. Showing an empty ledger."))
        }
    };
    let totals = Totals::from_entries(&entries);
    let token = state.csrf.mint();
    Html(views::render_index(&entries, &totals, &token, warning))
}

pub async fn add_round(
    State(state): State<Arc<AppState>>,
    Form(req): Form<AddRequest>,
) -> Result<Redirect, ApiError> {
    check_token(&state, req.csrf.as_deref())?;
    let points = req.points.points();
    with_ledger(&state.ledger, move |l| l.add_round(&req.player, points)).await?;
    Ok(Redirect::to("/"))
}

pub async fn api_add_round(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonOrForm(req): JsonOrForm<AddRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    check_token(&state, header_token(&headers).or(req.csrf.as_deref()))?;
    let points = req.points.points();
    let entry = with_ledger(&state.ledger, move |l| l.add_round(&req.player, points)).await?;
    Ok(Json(AddResponse {
        success: true,
        entry,
    }))
}

pub async fn api_delete_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    check_token(&state, header_token(&headers))?;
    let removal = with_ledger(&state.ledger, move |l| l.remove_by_id(&id)).await?;
    if removal.removed {
        Ok(Json(DeleteResponse { success: true }))
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn wipe(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TokenForm>,
) -> Result<Redirect, ApiError> {
    check_token(&state, form.csrf.as_deref())?;
    with_ledger(&state.ledger, |l| l.wipe()).await?;
    Ok(Redirect::to("/"))
}

pub async fn api_entries(State(state): State<Arc<AppState>>) -> Result<Json<LedgerResponse>, ApiError> {
    let entries = with_ledger(&state.ledger, |l| l.load()).await?;
    let totals = Totals::from_entries(&entries);
    Ok(Json(LedgerResponse { entries, totals }))
}
