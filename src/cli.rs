use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use coverage_codes::constants::DEFAULT_CMS_API_BASE_URL;
use coverage_codes::search::Direction;
use coverage_codes::{ExtractOptions, FallbackPolicy, MAX_RANGE_EXPANSION, MappingOptions};

#[derive(Parser, Debug)]
#[command(name = "coverage-codes")]
#[command(about = "CPT/HCPCS <-> ICD-10 mappings from CMS coverage articles", long_about = None)]
pub struct Args {
    /// CMS Coverage API base URL.
    #[arg(long, global = true, default_value = DEFAULT_CMS_API_BASE_URL)]
    pub api_base_url: String,

    /// Max attempts for transient API failures.
    #[arg(long, global = true, default_value_t = 5)]
    pub max_retries: u32,

    /// Max articles fetched concurrently during a code search.
    #[arg(long, global = true, default_value_t = 8)]
    pub concurrency: usize,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the procedure codes referenced by one paragraph.
    Extract(ExtractArgs),
    /// Build a mapping from locally saved API payloads.
    Map(MapArgs),
    /// Fetch one article and print its mapping.
    Article(ArticleArgs),
    /// Find a code across billing and coding articles.
    Search(SearchArgs),
    /// Serve the JSON API.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackArg {
    /// Attach unresolved groups to every procedure code of the article.
    All,
    /// Leave unresolved groups unattached.
    None,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::All => FallbackPolicy::AllProcedureCodes,
            FallbackArg::None => FallbackPolicy::NoAssociation,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExtractOpts {
    /// Max codes a single range may expand to; values above 500 are clamped.
    #[arg(long, default_value_t = MAX_RANGE_EXPANSION)]
    pub max_range: usize,

    /// Collect bare HCPCS-shaped tokens when no "CPT/HCPCS code" phrase matches.
    #[arg(long)]
    pub standalone_hcpcs: bool,
}

impl ExtractOpts {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            max_range_expansion: self.max_range.min(MAX_RANGE_EXPANSION),
            standalone_hcpcs: self.standalone_hcpcs,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct MappingOpts {
    /// Policy for groups whose paragraph names no known procedure code.
    #[arg(long, value_enum, default_value_t = FallbackArg::All)]
    pub fallback: FallbackArg,

    #[command(flatten)]
    pub extract: ExtractOpts,
}

impl MappingOpts {
    pub fn options(&self) -> MappingOptions {
        MappingOptions {
            fallback: self.fallback.into(),
            extract: self.extract.options(),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Paragraph text (HTML allowed).
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the paragraph from a file; stdin when neither is given.
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub extract: ExtractOpts,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MapArgs {
    /// hcpc-code payload (JSON array or {"data": [...]}).
    #[arg(long)]
    pub hcpc_codes: PathBuf,

    /// icd10-covered payload.
    #[arg(long)]
    pub icd10_covered: PathBuf,

    /// icd10-covered-group payload.
    #[arg(long)]
    pub icd10_groups: PathBuf,

    /// hcpc-code-group payload, reported next to the mapping.
    #[arg(long)]
    pub hcpc_code_groups: Option<PathBuf>,

    /// icd10-noncovered payload.
    #[arg(long)]
    pub icd10_noncovered: Option<PathBuf>,

    /// icd10-noncovered-group payload.
    #[arg(long)]
    pub icd10_noncovered_groups: Option<PathBuf>,

    /// Print the ICD-10 -> procedure view instead.
    #[arg(long)]
    pub reverse: bool,

    #[command(flatten)]
    pub mapping: MappingOpts,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ArticleArgs {
    #[arg(long)]
    pub article_id: String,

    /// Requested version; the API may serve a newer one.
    #[arg(long, default_value = "1")]
    pub version: String,

    /// Print the ICD-10 -> procedure view instead.
    #[arg(long)]
    pub reverse: bool,

    #[command(flatten)]
    pub mapping: MappingOpts,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Procedure or diagnosis code to look up.
    #[arg(long)]
    pub code: String,

    #[arg(long, default_value = "cpt-to-icd")]
    pub direction: Direction,

    /// Only consider articles whose title contains this keyword.
    #[arg(long)]
    pub keyword: Option<String>,

    #[command(flatten)]
    pub mapping: MappingOpts,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8787)]
    pub port: u16,
}
