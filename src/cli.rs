use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "catalog-translate",
    about = "Bulk-translate string catalogs and JSON file specifications with an LLM",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Translate every untranslated string at a path.
    Translate(TranslateArgs),

    /// Translate a single literal string into each requested language.
    #[command(name = "translate-text")]
    TranslateText(TranslateTextArgs),

    /// Re-evaluate translations marked as needing review.
    Review(ReviewArgs),
}

#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// A string catalog, a JSON specification, or a directory of either.
    pub path: PathBuf,

    /// Target language code; repeat for multiple. Empty means every
    /// language already present in the catalog.
    #[arg(long = "lang")]
    pub languages: Vec<String>,

    /// Restrict the JSON-specification driver to these basenames.
    #[arg(long = "only-files")]
    pub only_files: Vec<String>,

    /// Write translations back into the input file.
    #[arg(long)]
    pub overwrite: bool,

    /// Mark every new translation as needing review.
    #[arg(long = "needs-review")]
    pub needs_review: bool,

    /// Skip the confirmation prompt for large runs.
    #[arg(long = "skip-confirm")]
    pub skip_confirm: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct TranslateTextArgs {
    /// The text to translate.
    pub text: String,

    /// Target language code; repeat for multiple.
    #[arg(long = "lang", required = true)]
    pub languages: Vec<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// A string catalog or a directory of string catalogs.
    pub path: PathBuf,

    /// Only review translations for these language codes.
    #[arg(long = "lang")]
    pub languages: Vec<String>,

    /// Write state changes back into the input file.
    #[arg(long)]
    pub overwrite: bool,

    /// Skip the confirmation prompt for large runs.
    #[arg(long = "skip-confirm")]
    pub skip_confirm: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Commands {
    /// Whether debug logging was requested for this invocation.
    pub fn verbose(&self) -> bool {
        match self {
            Commands::Translate(args) => args.verbose,
            Commands::TranslateText(args) => args.verbose,
            Commands::Review(args) => args.verbose,
        }
    }
}
