//! CPT/HCPCS -> ICD-10 mappings recovered from coverage article code lists.
//!
//! [`extract`] and [`mapping`] are pure and synchronous. [`cms`], [`cache`]
//! and [`search`] fetch and cache the article lists they consume.

pub mod cache;
pub mod cms;
pub mod codes;
pub mod common;
pub mod constants;
pub mod error;
pub mod extract;
pub mod html;
pub mod mapping;
pub mod records;
pub mod search;

pub use codes::{DiagnosisCode, GroupId, GroupParagraph, ProcedureCode};
pub use error::RecordError;
pub use extract::{ExtractOptions, MAX_RANGE_EXPANSION, extract_codes, extract_codes_with};
pub use mapping::{
    ArticleMapping, CodeGroup, DEFAULT_FALLBACK_POLICY, FallbackPolicy, Mapping, MappingOptions,
    ReverseMapping, build_article_mapping, build_article_mapping_with, build_mapping,
    build_mapping_with, group_listing, reverse_mapping,
};
