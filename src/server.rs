use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use coverage_codes::cms::CmsClient;
use coverage_codes::search::{Direction, SearchQuery, search_codes};
use coverage_codes::{
    ExtractOptions, FallbackPolicy, MAX_RANGE_EXPANSION, MappingOptions, extract_codes_with,
    reverse_mapping,
};

use crate::cli::ServeArgs;

#[derive(Clone)]
struct AppState {
    cms: Arc<CmsClient>,
    concurrency: usize,
}

pub async fn run(opts: ServeArgs, cms: CmsClient, concurrency: usize) -> anyhow::Result<()> {
    let state = AppState {
        cms: Arc::new(cms),
        concurrency,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/extract", get(api_extract))
        .route("/api/articles/:id/mapping", get(api_article_mapping))
        .route("/api/articles/:id/reverse", get(api_article_reverse))
        .route("/api/codes/search", get(api_code_search))
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ExtractParams {
    text: String,
    max_range: Option<usize>,
    standalone_hcpcs: Option<bool>,
}

async fn api_extract(Query(p): Query<ExtractParams>) -> impl IntoResponse {
    Json(extract_codes_with(&p.text, &extract_options(&p)))
}

/// `max_range` may only lower the range cap.
fn extract_options(p: &ExtractParams) -> ExtractOptions {
    let defaults = ExtractOptions::default();
    ExtractOptions {
        max_range_expansion: p
            .max_range
            .map_or(defaults.max_range_expansion, |n| n.min(MAX_RANGE_EXPANSION)),
        standalone_hcpcs: p.standalone_hcpcs.unwrap_or(defaults.standalone_hcpcs),
    }
}

#[derive(Debug, Deserialize)]
struct ArticleParams {
    version: Option<String>,
    fallback: Option<String>,
}

async fn api_article_mapping(
    State(st): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(p): Query<ArticleParams>,
) -> impl IntoResponse {
    let opts = match mapping_options(p.fallback.as_deref()) {
        Ok(o) => o,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    match fetch_article(&st, &id, p.version.as_deref()).await {
        Ok(codes) => Json(codes.build(&opts)).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, format!("{e:#}")).into_response(),
    }
}

async fn api_article_reverse(
    State(st): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(p): Query<ArticleParams>,
) -> impl IntoResponse {
    let opts = match mapping_options(p.fallback.as_deref()) {
        Ok(o) => o,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    match fetch_article(&st, &id, p.version.as_deref()).await {
        Ok(codes) => Json(reverse_mapping(&codes.build(&opts).by_cpt)).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, format!("{e:#}")).into_response(),
    }
}

async fn fetch_article(
    st: &AppState,
    id: &str,
    version: Option<&str>,
) -> anyhow::Result<coverage_codes::records::ArticleCodes> {
    let requested = version.unwrap_or("1");
    let version = st.cms.current_version(id, requested).await?;
    st.cms.article_codes(id, &version).await
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    code: String,
    direction: Option<String>,
    keyword: Option<String>,
    fallback: Option<String>,
}

async fn api_code_search(
    State(st): State<AppState>,
    Query(p): Query<SearchParams>,
) -> impl IntoResponse {
    let code = p.code.trim();
    if code.is_empty() {
        return (StatusCode::BAD_REQUEST, "Please enter a code to search.".to_string())
            .into_response();
    }
    let direction = match p.direction.as_deref().unwrap_or("cpt_to_icd").parse::<Direction>() {
        Ok(d) => d,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    let mapping = match mapping_options(p.fallback.as_deref()) {
        Ok(o) => o,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let query = SearchQuery {
        code: code.to_string(),
        direction,
        keyword: p.keyword.clone(),
        concurrency: st.concurrency,
        mapping,
    };
    match search_codes(&st.cms, &query).await {
        Ok(hits) => Json(hits).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, format!("{e:#}")).into_response(),
    }
}

fn mapping_options(fallback: Option<&str>) -> Result<MappingOptions, String> {
    let fallback = match fallback.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("all") => FallbackPolicy::AllProcedureCodes,
        Some("none") => FallbackPolicy::NoAssociation,
        Some(other) => return Err(format!("unknown fallback '{other}' (expected all or none)")),
    };
    Ok(MappingOptions {
        fallback,
        ..MappingOptions::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_parameter() {
        assert_eq!(
            mapping_options(None).unwrap().fallback,
            FallbackPolicy::AllProcedureCodes
        );
        assert_eq!(
            mapping_options(Some("NONE")).unwrap().fallback,
            FallbackPolicy::NoAssociation
        );
        assert!(mapping_options(Some("some")).is_err());
    }

    #[test]
    fn max_range_parameter_is_clamped() {
        let params = |max_range| ExtractParams {
            text: "CPT codes 0-2000000".to_string(),
            max_range,
            standalone_hcpcs: None,
        };

        let unbounded = extract_options(&params(Some(usize::MAX)));
        assert_eq!(unbounded.max_range_expansion, MAX_RANGE_EXPANSION);
        assert_eq!(
            extract_codes_with("CPT codes 0-2000000", &unbounded).len(),
            MAX_RANGE_EXPANSION
        );

        assert_eq!(extract_options(&params(Some(3))).max_range_expansion, 3);
        assert_eq!(
            extract_options(&params(None)).max_range_expansion,
            MAX_RANGE_EXPANSION
        );
    }
}
