//! Code lookup across coverage articles.

use std::str::FromStr;

use anyhow::Result;
use futures_util::{StreamExt, stream};
use serde::Serialize;

use crate::cms::{ArticleSummary, CmsClient};
use crate::codes::{DiagnosisRef, ProcedureRef, normalize_code};
use crate::constants::MAX_SEARCH_ARTICLES;
use crate::mapping::MappingOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    CptToIcd,
    IcdToCpt,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cpt_to_icd" => Ok(Self::CptToIcd),
            "icd_to_cpt" => Ok(Self::IcdToCpt),
            other => Err(format!(
                "unknown direction '{other}' (expected cpt-to-icd or icd-to-cpt)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub code: String,
    pub direction: Direction,
    pub keyword: Option<String>,
    pub concurrency: usize,
    pub mapping: MappingOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleRef {
    pub article_id: String,
    pub article_version: String,
    pub article_title: String,
    pub contractor: String,
}

impl From<&ArticleSummary> for ArticleRef {
    fn from(a: &ArticleSummary) -> Self {
        Self {
            article_id: a.document_id.clone(),
            article_version: a.version().to_string(),
            article_title: a.title.clone(),
            contractor: a.contractor(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub article: ArticleRef,
    #[serde(flatten)]
    pub detail: HitDetail,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HitDetail {
    CptToIcd {
        cpt_code: String,
        cpt_description: String,
        icd10_codes: Vec<DiagnosisRef>,
    },
    IcdToCpt {
        icd10_code: String,
        icd10_description: String,
        cpt_codes: Vec<ProcedureRef>,
    },
}

/// Articles worth inspecting: billing/coding articles first, all articles if
/// none of them are, capped at [`MAX_SEARCH_ARTICLES`].
pub fn candidate_articles(articles: Vec<ArticleSummary>) -> Vec<ArticleSummary> {
    let billing: Vec<ArticleSummary> = articles
        .iter()
        .filter(|a| a.title_contains("billing") || a.title_contains("coding"))
        .cloned()
        .collect();
    let mut candidates = if billing.is_empty() { articles } else { billing };
    candidates.truncate(MAX_SEARCH_ARTICLES);
    candidates
}

pub async fn search_codes(client: &CmsClient, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    let code = match query.direction {
        Direction::CptToIcd => normalize_code(&query.code),
        Direction::IcdToCpt => query.code.trim().to_ascii_uppercase(),
    };
    let articles = candidate_articles(client.search_articles(query.keyword.as_deref()).await?);
    tracing::info!(
        "Searching {} articles for {} ({:?})",
        articles.len(),
        code,
        query.direction
    );

    let code = code.as_str();
    let hits: Vec<Option<SearchHit>> = stream::iter(articles)
        .map(|article| async move { check_article(client, &article, code, query).await })
        .buffered(query.concurrency.max(1))
        .collect()
        .await;

    Ok(hits.into_iter().flatten().collect())
}

async fn check_article(
    client: &CmsClient,
    article: &ArticleSummary,
    code: &str,
    query: &SearchQuery,
) -> Option<SearchHit> {
    let codes = match client
        .article_codes(&article.document_id, article.version())
        .await
    {
        Ok(codes) => codes,
        Err(err) => {
            tracing::warn!("Skipping article {}: {:#}", article.document_id, err);
            return None;
        }
    };

    match query.direction {
        Direction::CptToIcd => {
            if !codes.lists_procedure(code) {
                return None;
            }
            let report = codes.build(&query.mapping);
            let entry = report.by_cpt.get(code)?;
            if entry.icd10_codes.is_empty() {
                return None;
            }
            Some(SearchHit {
                article: ArticleRef::from(article),
                detail: HitDetail::CptToIcd {
                    cpt_code: entry.code.clone(),
                    cpt_description: entry.description.clone(),
                    icd10_codes: entry.icd10_codes.clone(),
                },
            })
        }
        Direction::IcdToCpt => {
            let dx = codes
                .diagnosis_codes
                .iter()
                .find(|d| d.code.eq_ignore_ascii_case(code))?;
            let report = codes.build(&query.mapping);
            let cpt_codes: Vec<ProcedureRef> = report
                .by_cpt
                .iter()
                .filter(|e| e.icd10_codes.iter().any(|d| d.code.eq_ignore_ascii_case(code)))
                .map(|e| ProcedureRef {
                    code: e.code.clone(),
                    description: e.description.clone(),
                })
                .collect();
            if cpt_codes.is_empty() {
                return None;
            }
            Some(SearchHit {
                article: ArticleRef::from(article),
                detail: HitDetail::IcdToCpt {
                    icd10_code: dx.code.clone(),
                    icd10_description: dx.description.clone(),
                    cpt_codes,
                },
            })
        }
    }
}
