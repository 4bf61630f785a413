mod cli;
mod server;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;

use coverage_codes::cms::{CmsClient, CmsConfig};
use coverage_codes::constants::CMS_API_DOC_URL;
use coverage_codes::records::{ArticleCodes, ArticlePayloads};
use coverage_codes::search::{SearchQuery, search_codes};
use coverage_codes::{ArticleMapping, extract_codes_with, reverse_mapping};

use cli::{ArticleArgs, Command, ExtractArgs, MapArgs, SearchArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let cms_config = CmsConfig {
        base_url: args.api_base_url.clone(),
        max_retries: args.max_retries,
    };

    match args.cmd {
        Command::Extract(cmd) => run_extract(&cmd).context("extract failed"),
        Command::Map(cmd) => run_map(&cmd).context("map failed"),
        Command::Article(cmd) => {
            let cms = CmsClient::new(&cms_config)?;
            run_article(&cms, &cmd).await.context("article failed")
        }
        Command::Search(cmd) => {
            let cms = CmsClient::new(&cms_config)?;
            run_search(&cms, &cmd, args.concurrency)
                .await
                .context("search failed")
        }
        Command::Serve(cmd) => {
            tracing::info!("CMS Coverage API reference: {}", CMS_API_DOC_URL);
            let cms = CmsClient::new(&cms_config)?;
            server::run(cmd, cms, args.concurrency)
                .await
                .context("serve failed")
        }
    }
}

fn run_extract(cmd: &ExtractArgs) -> Result<()> {
    let text = match (&cmd.text, &cmd.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed reading {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed reading paragraph from stdin")?;
            buf
        }
    };
    print_json(&extract_codes_with(&text, &cmd.extract.options()))
}

fn run_map(cmd: &MapArgs) -> Result<()> {
    let payloads = ArticlePayloads {
        hcpc_codes: read_payload(&cmd.hcpc_codes)?,
        hcpc_code_groups: read_optional_payload(cmd.hcpc_code_groups.as_deref())?,
        icd10_covered: read_payload(&cmd.icd10_covered)?,
        icd10_covered_groups: read_payload(&cmd.icd10_groups)?,
        icd10_noncovered: read_optional_payload(cmd.icd10_noncovered.as_deref())?,
        icd10_noncovered_groups: read_optional_payload(cmd.icd10_noncovered_groups.as_deref())?,
    };

    let codes = ArticleCodes::from_article_payloads(&payloads)?;
    let mapping = codes.build(&cmd.mapping.options());
    log_summary("local payloads", &mapping);
    print_mapping(&mapping, cmd.reverse)
}

async fn run_article(cms: &CmsClient, cmd: &ArticleArgs) -> Result<()> {
    let version = cms.current_version(&cmd.article_id, &cmd.version).await?;
    if version != cmd.version {
        tracing::info!(
            "Article {} served as version {} (requested {})",
            cmd.article_id,
            version,
            cmd.version
        );
    }

    let codes = cms.article_codes(&cmd.article_id, &version).await?;
    let mapping = codes.build(&cmd.mapping.options());
    log_summary(&format!("article {} v{}", cmd.article_id, version), &mapping);
    print_mapping(&mapping, cmd.reverse)
}

async fn run_search(cms: &CmsClient, cmd: &SearchArgs, concurrency: usize) -> Result<()> {
    let query = SearchQuery {
        code: cmd.code.clone(),
        direction: cmd.direction,
        keyword: cmd.keyword.clone(),
        concurrency,
        mapping: cmd.mapping.options(),
    };
    let hits = search_codes(cms, &query).await?;
    tracing::info!("{} matching articles", hits.len());
    print_json(&hits)
}

fn read_payload(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_optional_payload(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => read_payload(path),
        None => Ok(Value::Null),
    }
}

fn log_summary(source: &str, mapping: &ArticleMapping) {
    let fallback_groups = mapping
        .groups
        .iter()
        .filter(|g| g.resolution == coverage_codes::mapping::Resolution::Fallback)
        .count();
    tracing::info!(
        "Mapped {}: {} procedure codes, {} groups ({} via fallback), {} unmapped ICD-10 codes",
        source,
        mapping.by_cpt.len(),
        mapping.groups.len(),
        fallback_groups,
        mapping.unmapped_icd10.len()
    );
}

fn print_mapping(mapping: &ArticleMapping, reverse: bool) -> Result<()> {
    if reverse {
        print_json(&reverse_mapping(&mapping.by_cpt))
    } else {
        print_json(mapping)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed serializing output")?;
    println!("{out}");
    Ok(())
}
