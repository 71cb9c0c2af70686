//! Stats route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::repo::CounterSnapshot;
use crate::state::AppState;

/// All three usage counters.
///
/// Counters read as stored - they may drift from the true recipe/favorite
/// population when paired counter writes failed, and that drift is shown,
/// not reconciled.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<CounterSnapshot>> {
    let snapshot = state.counters().read_all().await?;
    Ok(Json(snapshot))
}
