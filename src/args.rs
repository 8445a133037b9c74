use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Convert Billit, Erelonen and Rappels exports into an accounting import workbook.
#[derive(Parser, Debug)]
pub struct Args {
    /// Config file; defaults apply if it doesn't exist
    #[arg(long, global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Folder to create the conversion folders in
    #[arg(long, global = true)]
    pub output_folder: Option<PathBuf>,

    /// Name to relation code table
    #[arg(long, global = true)]
    pub relation_codes: Option<PathBuf>,

    /// Relation code to ledger account table
    #[arg(long, global = true)]
    pub ledger_accounts: Option<PathBuf>,

    /// YAML file with answers for missing codes, instead of asking on the terminal
    #[arg(long, global = true)]
    pub answers: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a Billit export
    Billit {
        #[arg(long)]
        input: PathBuf,
    },

    /// Convert an Erelonen export
    Erelonen {
        #[arg(long)]
        input: PathBuf,

        /// Only keep documents of this year (requires --month)
        #[arg(long, requires = "month")]
        year: Option<i32>,

        /// Only keep documents of this month, 1-12 (requires --year)
        #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },

    /// Convert a Rappels export
    Rappels {
        #[arg(long)]
        input: PathBuf,
    },

    /// Print a reference table, optionally filtered
    ListReference {
        #[command(flatten)]
        table: TableArg,

        /// Only entries whose name contains this text
        #[arg(long)]
        name: Option<String>,

        /// Only entries whose code contains this text
        #[arg(long)]
        code: Option<String>,
    },

    /// Edit a reference table in $EDITOR
    EditReference {
        #[command(flatten)]
        table: TableArg,
    },

    /// Remove duplicate rows from a reference table
    CleanReference {
        #[command(flatten)]
        table: TableArg,
    },
}

#[derive(Debug, ClapArgs)]
pub struct TableArg {
    /// Use the ledger account table instead of the relation code table
    #[arg(long)]
    pub ledger: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
