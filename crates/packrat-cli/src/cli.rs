use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "packrat",
    version,
    about = "Staged pull backups with bucketed retention rotation",
    after_help = "\
Configuration file lookup order:
  1. --config <path>             (explicit flag)
  2. $PACKRAT_CONFIG             (environment variable)
  3. ./packrat.yaml              (project)
  4. Platform user config dir + /packrat/config.yaml (e.g. ~/.config or %APPDATA%)
  5. Platform system config path (Unix: /etc/packrat/config.yaml, Windows: %PROGRAMDATA%/packrat/config.yaml)

Environment variables:
  PACKRAT_CONFIG    Path to configuration file (overrides default search)"
)]
pub(crate) struct Cli {
    /// Path to configuration file (overrides PACKRAT_CONFIG and default search)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Stage remote sources, build an archive, clean staging, rotate the store
    Run,

    /// Apply the retention rotation to the backup store
    Rotate {
        /// Only show what would be deleted, don't actually delete
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show each archive with its bucket and keep/delete decision
        #[arg(long)]
        list: bool,
    },

    /// Generate a starter configuration file
    Config {
        /// Destination path (defaults to an interactive choice)
        dest: Option<String>,
    },
}
