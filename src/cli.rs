// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every `serve` setting can also come from an environment variable, which is
// handy inside containers. Flags win over environment variables.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "title-harvester",
    version,
    about = "Fetch page titles for batches of URLs and store them",
    long_about = "title-harvester accepts batches of URLs over HTTP, fetches every page at most once \
                  with a pool of concurrent workers, extracts its <title> and stores the result."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion workers and the HTTP API
    ///
    /// Example: title-harvester serve --workers 20 --database titles.db
    Serve(ServeArgs),

    /// Print every stored title
    ///
    /// Example: title-harvester titles --json
    Titles {
        /// SQLite database file to read
        #[arg(long, env = "TITLE_HARVESTER_DATABASE", default_value = "titles.db")]
        database: PathBuf,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address the HTTP API listens on
    #[arg(long, env = "TITLE_HARVESTER_BIND", default_value = "127.0.0.1:8888")]
    pub bind: SocketAddr,

    /// Number of concurrent fetch workers
    #[arg(
        long,
        env = "TITLE_HARVESTER_WORKERS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub workers: u16,

    /// SQLite database file for fetched titles (":memory:" for a throwaway one)
    #[arg(long, env = "TITLE_HARVESTER_DATABASE", default_value = "titles.db")]
    pub database: PathBuf,

    /// Seconds before a single page fetch is abandoned
    #[arg(long, env = "TITLE_HARVESTER_FETCH_TIMEOUT", default_value_t = 20)]
    pub fetch_timeout_secs: u64,

    /// Seconds allowed for establishing a connection
    #[arg(long, env = "TITLE_HARVESTER_CONNECT_TIMEOUT", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every fetch
    #[arg(long, env = "TITLE_HARVESTER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Maximum redirects followed per fetch
    #[arg(long, default_value_t = 10)]
    pub max_redirects: usize,

    /// When storing a fetched title fails, allow the URL to be fetched again
    ///
    /// By default the URL stays marked as done even though nothing was stored.
    #[arg(long)]
    pub release_on_store_failure: bool,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why split ServeArgs out of the enum?
//    - #[derive(clap::Args)] lets a plain struct hold a subcommand's flags
//    - main() can then pass the whole struct around instead of 8 fields
//
// 2. What does env = "..." do?
//    - If the flag is not given, clap reads that environment variable
//    - If neither is set, default_value is used
//
// 3. What is value_parser!(u16).range(1..)?
//    - Parses the flag as u16 and rejects 0 before our code ever runs
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["title-harvester", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.workers, 15);
        assert_eq!(args.fetch_timeout_secs, 20);
        assert_eq!(args.bind, "127.0.0.1:8888".parse().unwrap());
        assert!(!args.release_on_store_failure);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Cli::try_parse_from(["title-harvester", "serve", "--workers", "0"]).is_err());
    }

    #[test]
    fn test_titles_json_flag() {
        let cli = Cli::try_parse_from(["title-harvester", "titles", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Titles { json: true, .. }));
    }
}
