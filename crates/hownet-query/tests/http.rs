use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use hownet_kb::HowNet;
use hownet_query::{AppState, router};

fn make_state() -> AppState {
    let tempdir = tempfile::tempdir().unwrap();
    std::fs::write(
        tempdir.path().join("sememe_all.txt"),
        "human|人 23210\nable|能 1456\ndie|死 829\nalive|活着 120\n",
    )
    .unwrap();
    std::fs::write(
        tempdir.path().join("sememe_triples_taxonomy.txt"),
        "die|死 antonym alive|活着\n",
    )
    .unwrap();
    std::fs::write(
        tempdir.path().join("hownet_dict.tsv"),
        concat!(
            "000000000366\table\tADJ\t能干\tADJ\t{able|能:scope={human|人}}\n",
            "000000002110\tdie\tV\t死\tV\t{die|死}\n",
        ),
    )
    .unwrap();
    let dict = HowNet::load(tempdir.path()).unwrap();
    AppState {
        dict: Arc::new(dict),
        disable_cache: false,
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn healthz_ok() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn senses_endpoint_returns_results() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/senses?word=die")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["word"], "die");
    assert_eq!(body["total"], 1);
    assert_eq!(body["senses"][0]["no"], "000000002110");
    assert_eq!(body["senses"][0]["zh_word"], "死");
}

#[tokio::test]
async fn senses_endpoint_rejects_unknown_language() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/senses?word=die&lang=fr")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("language")
    );
}

#[tokio::test]
async fn exists_endpoint_honors_language_filter() {
    let app = router(make_state());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/exists?word=die&lang=zh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["exists"], false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/exists?word=die&lang=en")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["exists"], true);
}

#[tokio::test]
async fn sememes_endpoint_merges_across_senses() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sememes?word=able&merge=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let sememes: Vec<&str> = body["sememes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(sememes, vec!["able|能", "human|人"]);
}

#[tokio::test]
async fn sememes_endpoint_lists_per_sense() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sememes?word=able&depth=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["depth"], 2);
    let senses = body["senses"].as_array().unwrap();
    assert_eq!(senses.len(), 1);
    assert_eq!(senses[0]["sense"]["no"], "000000000366");
}

#[tokio::test]
async fn tree_endpoint_returns_record() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/tree?sense=000000000366")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "000000000366");
    assert_eq!(body["role"], "sense");
    assert_eq!(body["children"][0]["name"], "able|能");
    assert_eq!(body["children"][0]["children"][0]["role"], "scope");
}

#[tokio::test]
async fn tree_endpoint_404s_on_unknown_sense() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/tree?sense=999999999999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trees_endpoint_rejects_language_param() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/trees?word=die&lang=en")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn render_endpoint_returns_plain_text() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/render?word=die")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(body_bytes.to_vec()).unwrap();
    assert!(text.contains("Found 1 result(s)"));
    assert!(text.contains("die|死"));
}

#[tokio::test]
async fn cache_headers_follow_state_flag() {
    let mut state = make_state();
    state.disable_cache = true;
    let app = router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/senses?word=die")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(
        response
            .headers()
            .get(axum::http::header::CACHE_CONTROL)
            .is_none()
    );
}
