use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tabrecon",
    version,
    about = "Stitch extracted table fragments and recognize learned statement formats"
)]
pub struct Cli {
    /// JSON file overriding thresholds, weights and sample sizes.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Group and merge the fragments of one document.
    Stitch(StitchArgs),
    /// Print the order-insensitive format signature of a table.
    Signature(SignatureArgs),
    /// Look a table up among an owner's learned formats.
    Recognize(RecognizeArgs),
    /// Store a confirmed field mapping for a table layout.
    Learn(LearnArgs),
    /// List an owner's learned formats.
    Profiles(ProfilesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StitchArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SignatureArgs {
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RecognizeArgs {
    #[arg(long, default_value = ".cache/tabrecon/profiles.sqlite")]
    pub db: PathBuf,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LearnArgs {
    #[arg(long, default_value = ".cache/tabrecon/profiles.sqlite")]
    pub db: PathBuf,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub input: PathBuf,

    /// JSON object from source header to target field name.
    #[arg(long)]
    pub mapping: PathBuf,

    /// Inline JSON correction payload carried with the profile.
    #[arg(long)]
    pub corrections: Option<String>,

    #[arg(long, default_value_t = 100.0)]
    pub confidence: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ProfilesArgs {
    #[arg(long, default_value = ".cache/tabrecon/profiles.sqlite")]
    pub db: PathBuf,

    #[arg(long)]
    pub owner: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
