use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use policy::Rank;
use runtime::{
    ContentSource, Error, FetchOutcome, ListError, MemberSource, RestSource, ViewState, Viewer,
};
use serde_json::json;
use storage::MaterialId;
use tokio::net::TcpListener;

const TOKEN: &str = "secret";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn list_handler(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let items = [
        json!({"id": 1, "title": "Pernapasan Dasar", "type": "video", "requiredRank": "Belum punya"}),
        json!({"id": 2, "title": "Jurus Putih", "type": "pdf", "requiredRank": "Sabuk Putih"}),
        json!({"id": 3, "title": "Jurus Wiraga", "type": "video", "requiredRank": "Sabuk Hitam Wiraga 1"}),
    ];
    let search = params.get("search").map(|s| s.to_lowercase());
    let items: Vec<_> = items
        .into_iter()
        .filter(|item| match &search {
            Some(q) => item["title"]
                .as_str()
                .is_some_and(|t| t.to_lowercase().contains(q)),
            None => true,
        })
        .collect();

    Json(json!({ "data": items })).into_response()
}

async fn detail_handler(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }

    match id.as_str() {
        "1" => Json(json!({
            "id": 1,
            "title": "Pernapasan Dasar",
            "type": "video",
            "requiredRank": "Belum punya",
            "url": "https://videos.example/1",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .into_response(),
        "2" => Json(json!({
            "data": {
                "id": 2,
                "title": "Jurus Putih",
                "type": "pdf",
                "requiredRank": "Sabuk Putih",
                "url": "https://docs.example/2.pdf"
            }
        }))
        .into_response(),
        "500" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn me_handler(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"username": "budi", "displayName": "Budi", "rank": "Sabuk Putih"})).into_response()
}

async fn serve() -> String {
    let app = Router::new()
        .route("/api/materials", get(list_handler))
        .route("/api/materials/{id}", get(detail_handler))
        .route("/api/auth/me", get(me_handler));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{address}/api")
}

#[tokio::test]
async fn lists_and_fetches_with_token() {
    let base = serve().await;
    let source = RestSource::builder(&base).token(TOKEN).build().unwrap();

    let items = source.list(None).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2].required_rank, Rank::BlackWiraga1);

    let items = source.list(Some("jurus")).await.unwrap();
    assert_eq!(items.len(), 2);

    let bare = source.fetch(&MaterialId::from("1")).await.unwrap();
    assert_eq!(bare.url, "https://videos.example/1");
    assert_eq!(bare.created_at, bare.updated_at);

    let wrapped = source.fetch(&MaterialId::from("2")).await.unwrap();
    assert_eq!(wrapped.required_rank, Rank::White);
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let base = serve().await;

    let anonymous = RestSource::builder(&base).build().unwrap();
    assert!(anonymous.list(None).await.unwrap_err().is_unauthorized());
    assert!(
        anonymous
            .fetch(&MaterialId::from("1"))
            .await
            .unwrap_err()
            .is_unauthorized()
    );
    assert!(anonymous.current_member().await.unwrap_err().is_unauthorized());

    let source = RestSource::builder(&base).token(TOKEN).build().unwrap();
    assert!(matches!(
        source.fetch(&MaterialId::from("99")).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        source.fetch(&MaterialId::from("500")).await,
        Err(Error::Api(msg)) if msg.contains("boom")
    ));
}

#[tokio::test]
async fn network_failure_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let source = RestSource::builder(format!("http://{address}")).build().unwrap();
    assert!(matches!(source.list(None).await, Err(Error::Network(_))));
}

#[tokio::test]
async fn viewer_over_rest_gates_by_member_rank() {
    let base = serve().await;
    let source = RestSource::builder(&base).token(TOKEN).build().unwrap();
    let member = source.current_member().await.unwrap();
    assert_eq!(member.display_name, "Budi");

    let viewer = Viewer::for_member(source, &member);
    let pending = viewer.load_list(None).await.unwrap().unwrap();
    assert_eq!(pending.run().await, FetchOutcome::Applied);

    assert!(viewer.select(&MaterialId::from("3")).is_err());
    let pending = viewer.select(&MaterialId::from("2")).unwrap();
    pending.run().await;
    assert!(matches!(viewer.view(), ViewState::Loaded(m) if m.url.ends_with("2.pdf")));
}

#[tokio::test]
async fn viewer_reports_login_prompt() {
    let base = serve().await;
    let viewer = Viewer::new(RestSource::builder(&base).build().unwrap(), None);
    assert_eq!(
        viewer.load_list(None).await.err(),
        Some(ListError::Unauthorized)
    );
}
