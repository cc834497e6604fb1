use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nenga")]
#[command(version, about = "New Year card address book", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// SQLite database file (env: NENGA_DB)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Directory for rotating log files (env: NENGA_LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (env: NENGA_LOG_LEVEL)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Do not echo executed SQL to the debug log
    #[arg(long, global = true)]
    pub nodbecho: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize database schema
    Initdb {
        /// Drop every table first. All data is lost.
        #[arg(long)]
        drop_create: bool,
    },

    /// Initialize nenga data for next year
    Nextyear,

    /// Export genenga compatible csv
    Genenga(GenengaArgs),

    /// Run as web application
    Webapp(WebappArgs),
}

#[derive(Args, Debug)]
pub struct GenengaArgs {
    /// Output file
    #[arg(short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    /// Output encoding label (utf-8, shift_jis, euc-jp, ...)
    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    /// Year to export. Defaults to this year in January, next year otherwise.
    #[arg(long)]
    pub year: Option<i32>,

    /// Print only cards sent as a reply
    #[arg(long)]
    pub later_only: bool,

    /// Print households in mourning too
    #[arg(long)]
    pub include_mourning: bool,

    /// Write the zipcode as one column
    #[arg(long)]
    pub nosplit_zipcode: bool,
}

#[derive(Args, Debug)]
pub struct WebappArgs {
    #[arg(long, default_value = "localhost")]
    pub host: String,

    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Hide storage error details from responses
    #[arg(long)]
    pub nodebug: bool,

    /// Accepted for compatibility; the server never reloads
    #[arg(long)]
    pub noreload: bool,
}
