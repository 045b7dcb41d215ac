use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use crate::request::{self, ErrorResponse, GetModelRequest, GetUserRequest, Request, Response};
use crate::server::AppState;
use crate::{Error, Outcome};

type Reply = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct UserParams {
    pub username: String,
}

#[derive(Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub version: String,
}

pub async fn handle_request(State(state): State<Arc<AppState>>, body: String) -> Reply {
    match Request::from_json(&body) {
        Ok(req) => run(state, req).await,
        Err(e) => error_reply(&e),
    }
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Reply {
    run(state, Request::GetUser(GetUserRequest { username: params.username })).await
}

pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ModelParams>,
) -> Reply {
    let req = Request::GetModel(GetModelRequest {
        model: params.model,
        version: params.version,
    });
    run(state, req).await
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Reply {
    run(state, Request::Stats).await
}

/// Run one request on the blocking pool and shape the reply
async fn run(state: Arc<AppState>, req: Request) -> Reply {
    tracing::info!("{} request", req.op());
    let store = Arc::clone(&state.store);

    match tokio::task::spawn_blocking(move || request::dispatch(&store, req)).await {
        Ok(Ok(response)) => success_reply(&response),
        Ok(Err(e)) => error_reply(&e),
        Err(e) => {
            tracing::error!("registry task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string(), "kind": "storage" })),
            )
        }
    }
}

fn success_reply(response: &Response) -> Reply {
    let status = match response {
        Response::Added(added) if added.outcome == Outcome::Created => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    match serde_json::to_value(response) {
        Ok(body) => (status, Json(body)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string(), "kind": "storage" })),
        ),
    }
}

fn error_reply(err: &Error) -> Reply {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_storage() {
        tracing::error!("registry failure: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    let body = serde_json::to_value(ErrorResponse::from(err)).unwrap_or(Value::Null);
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use crate::storage::RegistryStore;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    async fn call(app: axum::Router, req: HttpRequest<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(body: &str) -> HttpRequest<Body> {
        HttpRequest::post("/api/registry")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> HttpRequest<Body> {
        HttpRequest::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_created_then_already_exists() {
        let app = router(Arc::new(RegistryStore::open_in_memory().unwrap()));

        let (status, body) = call(app.clone(), post(r#"{"op":"add_role","name":"admin"}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["outcome"], "created");

        let (status, body) = call(app, post(r#"{"op":"add_role","name":"admin"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "already_exists");
    }

    #[tokio::test]
    async fn test_bad_payload_is_400() {
        let app = router(Arc::new(RegistryStore::open_in_memory().unwrap()));

        let (status, body) = call(app.clone(), post("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_request");

        let (status, _) = call(app, post(r#"{"op":"add_user","username":"alice"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_reply_status() {
        let (status, _) = error_reply(&Error::Lock);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let io = Error::Io(std::io::Error::other("disk gone"));
        let (status, body) = error_reply(&io);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0["kind"], "storage");

        let (status, _) = error_reply(&Error::InvalidRequest("x".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_info_routes() {
        let store = Arc::new(RegistryStore::open_in_memory().unwrap());
        store.add_role("admin").unwrap();
        store.add_user("alice", "admin").unwrap();
        store.add_task("cv").unwrap();
        store.add_model("resnet", "cv").unwrap();
        store.add_model_version("resnet", "v1", "alice").unwrap();
        let app = router(store);

        let (status, body) = call(app.clone(), get("/api/info/user?username=alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"username": "alice", "role": "admin"}));

        let (status, _) = call(app.clone(), get("/api/info/user?username=bob")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(app.clone(), get("/api/info/model?model=resnet&version=v1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"model": "resnet", "task": "cv", "version": "v1"}));

        let (status, body) = call(app.clone(), get("/api/info/model?model=resnet&version=v2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "version_not_found");

        let (status, body) = call(app.clone(), get("/api/info/model?model=ghost&version=v1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) = call(app, get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_versions"], 1);
    }
}
