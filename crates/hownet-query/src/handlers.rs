use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use hownet_kb::{HowNet, TreeRecord};
use hownet_types::{Language, Sense};

#[derive(Clone)]
pub struct AppState {
    pub dict: Arc<HowNet>,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct WordQuery {
    pub word: String,
    pub lang: Option<String>,
}

#[derive(Deserialize)]
pub struct SememesQuery {
    pub word: String,
    pub depth: Option<i32>,
    pub merge: Option<bool>,
}

#[derive(Deserialize)]
pub struct TreeQuery {
    pub sense: String,
}

#[derive(Deserialize)]
pub struct RenderQuery {
    pub word: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct SenseDto {
    no: String,
    en_word: String,
    en_grammar: String,
    zh_word: String,
    zh_grammar: String,
    def: String,
}

impl From<&Sense> for SenseDto {
    fn from(sense: &Sense) -> Self {
        SenseDto {
            no: sense.no.clone(),
            en_word: sense.en_word.clone(),
            en_grammar: sense.en_grammar.clone(),
            zh_word: sense.zh_word.clone(),
            zh_grammar: sense.zh_grammar.clone(),
            def: sense.def.clone(),
        }
    }
}

#[derive(Serialize)]
struct SensesResponse {
    word: String,
    total: usize,
    senses: Vec<SenseDto>,
}

#[derive(Serialize)]
struct ExistsResponse {
    word: String,
    exists: bool,
}

#[derive(Serialize)]
struct SenseSememes {
    sense: SenseDto,
    sememes: Vec<String>,
}

#[derive(Serialize)]
struct SememesResponse {
    word: String,
    depth: i32,
    senses: Vec<SenseSememes>,
}

#[derive(Serialize)]
struct MergedSememesResponse {
    word: String,
    depth: i32,
    sememes: Vec<String>,
}

#[derive(Serialize)]
struct TreesResponse {
    word: String,
    trees: Vec<SenseTree>,
}

#[derive(Serialize)]
struct SenseTree {
    sense: SenseDto,
    tree: TreeRecord,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/senses", get(senses))
        .route("/v1/exists", get(exists))
        .route("/v1/sememes", get(sememes))
        .route("/v1/tree", get(tree))
        .route("/v1/trees", get(trees))
        .route("/v1/render", get(render))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

fn parse_lang(lang: Option<&str>) -> Result<Option<Language>, ApiError> {
    match lang {
        None => Ok(None),
        Some(code) => Language::from_code(code)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("unknown language {code:?}"))),
    }
}

async fn senses(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<WordQuery>,
) -> Result<Response, ApiError> {
    let lang = parse_lang(params.lang.as_deref())?;
    let hits = state.dict.get(&params.word, lang);
    let response = SensesResponse {
        total: hits.len(),
        senses: hits.iter().map(|s| SenseDto::from(*s)).collect(),
        word: params.word,
    };
    Ok(cached_json(&state, response))
}

async fn exists(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<WordQuery>,
) -> Result<Response, ApiError> {
    let lang = parse_lang(params.lang.as_deref())?;
    let response = ExistsResponse {
        exists: state.dict.has(&params.word, lang),
        word: params.word,
    };
    Ok(cached_json(&state, response))
}

async fn sememes(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<SememesQuery>,
) -> Result<Response, ApiError> {
    let depth = params.depth.unwrap_or(-1);
    if params.merge.unwrap_or(false) {
        let mut sememes: Vec<String> = state
            .dict
            .merged_sememes(&params.word, depth)
            .into_iter()
            .collect();
        sememes.sort();
        return Ok(cached_json(
            &state,
            MergedSememesResponse {
                word: params.word,
                depth,
                sememes,
            },
        ));
    }

    let senses = state
        .dict
        .sememe_lists(&params.word, depth)
        .into_iter()
        .map(|(sense, set)| {
            let mut sememes: Vec<String> = set.into_iter().collect();
            sememes.sort();
            SenseSememes {
                sense: sense.into(),
                sememes,
            }
        })
        .collect();
    Ok(cached_json(
        &state,
        SememesResponse {
            word: params.word,
            depth,
            senses,
        },
    ))
}

async fn tree(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<TreeQuery>,
) -> Result<Response, ApiError> {
    let sense = state
        .dict
        .sense_by_no(&params.sense)
        .ok_or_else(|| ApiError::NotFound(format!("no sense {:?}", params.sense)))?;
    // Single-sense calls surface the parse failure instead of skipping.
    let tree = state
        .dict
        .sememe_tree(sense)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    Ok(cached_json(&state, state.dict.tree_record(&tree)))
}

async fn trees(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<WordQuery>,
) -> Result<Response, ApiError> {
    if params.lang.is_some() {
        return Err(ApiError::bad_request("trees does not take a language"));
    }
    let trees = state
        .dict
        .sememe_records(&params.word)
        .into_iter()
        .map(|(sense, tree)| SenseTree {
            sense: sense.into(),
            tree,
        })
        .collect();
    Ok(cached_json(
        &state,
        TreesResponse {
            word: params.word,
            trees,
        },
    ))
}

async fn render(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<RenderQuery>,
) -> Result<Response, ApiError> {
    let dump = state.dict.render_word(&params.word, params.limit);
    let headers = [(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    )];
    Ok((headers, dump).into_response())
}

fn cached_json<T: Serialize>(state: &AppState, body: T) -> Response {
    if state.disable_cache {
        Json(body).into_response()
    } else {
        (
            [(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=300"),
            )],
            Json(body),
        )
            .into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::NotFound(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
