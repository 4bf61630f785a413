pub const DEFAULT_CMS_API_BASE_URL: &str = "https://api.coverage.cms.gov";
pub const CMS_API_DOC_URL: &str = "https://api.coverage.cms.gov/docs/";

pub const USER_AGENT: &str = "coverage-codes/0.1";

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const LICENSE_TOKEN_TTL_SECS: u64 = 3500;
pub const ARTICLE_CODES_TTL_SECS: u64 = 3600;
pub const ARTICLE_LIST_TTL_SECS: u64 = 3600;

/// Articles inspected per cross-article code search.
pub const MAX_SEARCH_ARTICLES: usize = 50;
