//! Request handlers, one module per resource

pub mod annotations;
pub mod documents;
pub mod export;
pub mod projects;
pub mod uploads;

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::error::ApiResult;
use crate::state::AppState;

/// Body of a successful delete
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Run a store call that touches many rows on the blocking pool
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppState) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| anyhow::anyhow!("Blocking task failed: {}", e))?
}

pub async fn healthz_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::blocking;
    use super::test_support::TestApp;
    use crate::api::error::ApiError;
    use crate::database::Project;

    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_runs_store_calls_off_the_runtime() {
        let app = TestApp::new();
        let project = Project::new("Letters".to_string(), None);
        let id = project.id.clone();

        blocking(&app.state, move |state| Ok(state.db().create_project(&project)?))
            .await
            .unwrap();
        let found = blocking(&app.state, move |state| Ok(state.db().get_project(&id)?))
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "Letters");

        let err = blocking(&app.state, |_| -> Result<(), ApiError> { Err(ApiError::NotFound("Document")) })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Document")));
    }

    #[tokio::test]
    async fn test_blocking_panic_becomes_internal_error() {
        let app = TestApp::new();
        let err = blocking(&app.state, |_| -> Result<(), ApiError> { panic!("store call panicked") })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
