//! HTTP API handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::generation::GenerationStats;
use crate::slots::SlotIndex;
use crate::web::server::AppState;

/// API response wrapper
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(msg))).into_response()
}

/// Generation side of the status report
#[derive(serde::Serialize)]
pub struct GenerationStatus {
    pub enabled: bool,
    pub endpoint: Option<String>,
    #[serde(flatten)]
    pub stats: GenerationStats,
}

/// Station status
#[derive(serde::Serialize)]
pub struct StationStatus {
    pub current_index: Option<SlotIndex>,
    pub ticks: u64,
    pub connections: usize,
    pub active_listeners: usize,
    pub generation: GenerationStatus,
}

/// Get station status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StationStatus>> {
    let status = StationStatus {
        current_index: state.rotation.current_index(),
        ticks: state.rotation.ticks(),
        connections: state.presence.connection_count(),
        active_listeners: state.presence.active_count(),
        generation: GenerationStatus {
            enabled: state.generation.is_enabled(),
            endpoint: state.generation.endpoint().map(|e| e.to_string()),
            stats: state.generation.stats(),
        },
    };

    Json(ApiResponse::ok(status))
}

/// Serve the blob in the current slot
pub async fn get_current_audio(State(state): State<Arc<AppState>>) -> Response {
    let Some(index) = state.rotation.current_index() else {
        return error_response(StatusCode::NOT_FOUND, "Station has not started yet");
    };

    let store = state.store.clone();
    let read = tokio::task::spawn_blocking(move || store.read(index)).await;

    match read {
        Ok(Ok(Some(audio))) => (
            [
                (header::CONTENT_TYPE, "audio/mpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            audio,
        )
            .into_response(),
        Ok(Ok(None)) => error_response(StatusCode::NOT_FOUND, format!("Slot {} is empty", index)),
        Ok(Err(e)) => {
            tracing::warn!("Failed to read slot {}: {}", index, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            tracing::warn!("Slot read task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Slot read failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, ListenerIdentity, ServerConfig};
    use crate::generation::GenerationClient;
    use crate::presence::Presence;
    use crate::rotation::RotationHandle;
    use crate::slots::{MemorySlotStore, SlotStore};
    use crate::web::WebServer;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bytes::Bytes;
    use tower::ServiceExt;

    fn state() -> (Arc<AppState>, Arc<MemorySlotStore>) {
        let store = Arc::new(MemorySlotStore::new());
        let config = GenerationConfig {
            endpoint: String::new(),
            ..Default::default()
        };
        let state = Arc::new(AppState {
            rotation: RotationHandle::new(),
            store: store.clone(),
            presence: Arc::new(Presence::new(ListenerIdentity::Address)),
            generation: GenerationClient::new(&config, store.clone()).unwrap(),
        });
        (state, store)
    }

    fn app(state: Arc<AppState>) -> axum::Router {
        WebServer::new(ServerConfig::default(), state).router()
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Bytes) {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_current_audio_before_start() {
        let (state, _store) = state();
        let (status, _) = get(state, "/current.mp3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_current_audio_follows_rotation() {
        let (state, store) = state();
        store.write(SlotIndex::new(0).unwrap(), Bytes::from_static(b"zero")).unwrap();
        store.write(SlotIndex::new(1).unwrap(), Bytes::from_static(b"one")).unwrap();

        state.rotation.advance();
        let (status, body) = get(state.clone(), "/current.mp3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"zero");

        state.rotation.advance();
        let (_, body) = get(state.clone(), "/current.mp3").await;
        assert_eq!(&body[..], b"one");

        // slot 2 was never written
        state.rotation.advance();
        let (status, body) = get(state, "/current.mp3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_status_report() {
        let (state, _store) = state();
        state.rotation.advance();

        let (status, body) = get(state, "/api/status").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["current_index"], 0);
        assert_eq!(json["data"]["ticks"], 1);
        assert_eq!(json["data"]["active_listeners"], 0);
        assert_eq!(json["data"]["generation"]["enabled"], false);
        assert_eq!(json["data"]["generation"]["batches_failed"], 0);
    }
}
