//! Client for the CMS Coverage API (`api.coverage.cms.gov`).
//!
//! Owns every cache in the system: the license token, the article report and
//! the per-article code lists. The mapping core never sees any of it.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, header::RETRY_AFTER};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cache::{ArticleKey, SubResource, TtlCache};
use crate::common::{is_retryable_status, next_backoff, parse_retry_after, truncate_for_log};
use crate::constants::{
    ARTICLE_CODES_TTL_SECS, ARTICLE_LIST_TTL_SECS, DEFAULT_CMS_API_BASE_URL,
    LICENSE_TOKEN_TTL_SECS, REQUEST_TIMEOUT_SECS, USER_AGENT,
};
use crate::records::{ArticleCodes, ArticlePayloads};

#[derive(Debug, Clone)]
pub struct CmsConfig {
    pub base_url: String,
    pub max_retries: u32,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CMS_API_BASE_URL.to_string(),
            max_retries: 5,
        }
    }
}

/// One row of the local coverage articles report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    pub document_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub document_version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contractor_name_type: String,
}

impl ArticleSummary {
    pub fn version(&self) -> &str {
        if self.document_version.is_empty() {
            "1"
        } else {
            &self.document_version
        }
    }

    pub fn contractor(&self) -> String {
        self.contractor_name_type.replace("\r\n", " / ")
    }

    pub fn title_contains(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => value.to_string(),
    }
}

pub struct CmsClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    token: TtlCache<(), String>,
    articles: TtlCache<(), Vec<ArticleSummary>>,
    article_codes: TtlCache<ArticleKey, Value>,
}

impl CmsClient {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed creating HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
            token: TtlCache::new(Duration::from_secs(LICENSE_TOKEN_TTL_SECS)),
            articles: TtlCache::new(Duration::from_secs(ARTICLE_LIST_TTL_SECS)),
            article_codes: TtlCache::new(Duration::from_secs(ARTICLE_CODES_TTL_SECS)),
        })
    }

    /// License-agreement token required by the `/v1/data/article*` endpoints.
    pub async fn license_token(&self) -> Result<String> {
        if let Some(token) = self.token.get(&()).await {
            return Ok(token);
        }

        let body = self
            .get_json("/v1/metadata/license-agreement", &[], None)
            .await?;
        let token = body
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|row| row.get("Token"))
            .map(value_to_string)
            .unwrap_or_default();
        if token.is_empty() {
            tracing::warn!("License agreement response carried no token");
        }

        self.token.insert((), token.clone()).await;
        Ok(token)
    }

    /// The full local coverage articles report.
    pub async fn articles(&self) -> Result<Vec<ArticleSummary>> {
        if let Some(articles) = self.articles.get(&()).await {
            return Ok(articles);
        }

        let body = self
            .get_json("/v1/reports/local-coverage-articles", &[], None)
            .await?;
        let data = body.get("data").cloned().unwrap_or(Value::Array(Vec::new()));
        let articles: Vec<ArticleSummary> =
            serde_json::from_value(data).context("Invalid local coverage articles report")?;
        tracing::info!("Loaded {} coverage articles", articles.len());

        self.articles.insert((), articles.clone()).await;
        Ok(articles)
    }

    /// Articles whose title contains `keyword` (case-insensitive); all articles
    /// when no keyword is given.
    pub async fn search_articles(&self, keyword: Option<&str>) -> Result<Vec<ArticleSummary>> {
        let articles = self.articles().await?;
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        Ok(match keyword {
            Some(k) => {
                let k = k.to_lowercase();
                articles.into_iter().filter(|a| a.title_contains(&k)).collect()
            }
            None => articles,
        })
    }

    pub async fn article_detail(&self, article_id: &str, version: &str) -> Result<Value> {
        let token = self.license_token().await?;
        self.get_json(
            "/v1/data/article",
            &[("articleid", article_id), ("articlever", version)],
            Some(&token),
        )
        .await
    }

    /// The version the API actually serves for an article; it may answer a
    /// request for an old version with the latest one.
    pub async fn current_version(&self, article_id: &str, requested: &str) -> Result<String> {
        let detail = self.article_detail(article_id, requested).await?;
        let data = detail.get("data").unwrap_or(&Value::Null);
        let article = match data {
            Value::Array(rows) => rows.first().unwrap_or(&Value::Null),
            other => other,
        };
        let version = article
            .get("article_version")
            .map(value_to_string)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| requested.to_string());
        Ok(version)
    }

    /// Rows of one article sub-resource, cached per (resource, article, version).
    pub async fn article_sub(
        &self,
        resource: SubResource,
        article_id: &str,
        version: &str,
    ) -> Result<Value> {
        let key = ArticleKey::new(resource, article_id, version);
        if let Some(rows) = self.article_codes.get(&key).await {
            return Ok(rows);
        }

        let token = self.license_token().await?;
        let path = format!("/v1/data/article/{}", resource.path());
        let body = self
            .get_json(&path, &[("articleid", article_id), ("ver", version)], Some(&token))
            .await?;
        let rows = body.get("data").cloned().unwrap_or(Value::Array(Vec::new()));

        self.article_codes.insert(key, rows.clone()).await;
        Ok(rows)
    }

    /// Every code list of an article, ready for mapping.
    pub async fn article_codes(&self, article_id: &str, version: &str) -> Result<ArticleCodes> {
        let (
            hcpc_codes,
            hcpc_code_groups,
            icd10_covered,
            icd10_covered_groups,
            icd10_noncovered,
            icd10_noncovered_groups,
        ) = tokio::try_join!(
            self.article_sub(SubResource::HcpcCode, article_id, version),
            self.article_sub(SubResource::HcpcCodeGroup, article_id, version),
            self.article_sub(SubResource::Icd10Covered, article_id, version),
            self.article_sub(SubResource::Icd10CoveredGroup, article_id, version),
            self.article_sub(SubResource::Icd10Noncovered, article_id, version),
            self.article_sub(SubResource::Icd10NoncoveredGroup, article_id, version),
        )?;
        let payloads = ArticlePayloads {
            hcpc_codes,
            hcpc_code_groups,
            icd10_covered,
            icd10_covered_groups,
            icd10_noncovered,
            icd10_noncovered_groups,
        };
        ArticleCodes::from_article_payloads(&payloads)
            .with_context(|| format!("Failed reading code lists of article {article_id} v{version}"))
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let attempts = self.max_retries;
        let mut backoff = Duration::from_secs(1);

        for attempt in 1..=attempts {
            let mut request = self.http.get(&url).query(query);
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<Value>()
                            .await
                            .with_context(|| format!("Invalid CMS API JSON from {path}"));
                    }

                    let retry_after = parse_retry_after(resp.headers().get(RETRY_AFTER));
                    let body = resp.text().await.unwrap_or_default();
                    if is_retryable_status(status) {
                        if attempt == attempts {
                            return Err(anyhow!(
                                "CMS API retryable status {} for {} after {} attempts. Body: {}",
                                status,
                                path,
                                attempts,
                                truncate_for_log(&body)
                            ));
                        }
                        let wait = retry_after.unwrap_or(backoff);
                        tracing::warn!(
                            "CMS API status {} for {}; retrying in {:.1}s",
                            status,
                            path,
                            wait.as_secs_f64()
                        );
                        tokio::time::sleep(wait).await;
                        backoff = next_backoff(backoff);
                        continue;
                    }

                    return Err(anyhow!(
                        "CMS API non-retryable status {} for {}. Body: {}",
                        status,
                        path,
                        truncate_for_log(&body)
                    ));
                }
                Err(err) => {
                    if attempt == attempts {
                        return Err(anyhow!("CMS API request failed for {path}: {err}"));
                    }
                    tracing::warn!("CMS API request failed for {}: {}; retrying", path, err);
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
            }
        }

        Err(anyhow!("Unexpected CMS API flow for {path}"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn article_summaries_accept_numeric_ids() {
        let rows = json!([
            {"document_id": 52458, "document_version": 12, "title": "Billing and Coding: Genetic Testing", "contractor_name_type": "Noridian\r\nMAC A"},
            {"document_id": "57326", "title": null}
        ]);
        let articles: Vec<ArticleSummary> = serde_json::from_value(rows).unwrap();

        assert_eq!(articles[0].document_id, "52458");
        assert_eq!(articles[0].version(), "12");
        assert_eq!(articles[0].contractor(), "Noridian / MAC A");
        assert!(articles[0].title_contains("billing"));
        assert_eq!(articles[1].version(), "1");
        assert_eq!(articles[1].title, "");
    }

    #[test]
    fn client_trims_base_url() {
        let client = CmsClient::new(&CmsConfig {
            base_url: "https://example.test/".to_string(),
            max_retries: 0,
        })
        .unwrap();
        assert_eq!(client.base_url, "https://example.test");
        assert_eq!(client.max_retries, 1);
    }
}
