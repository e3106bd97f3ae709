pub mod retention;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "steamboard", version, about = "Player-population tracker backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server and the collection scheduler (default).
    Serve,
    /// Watchlist and retention maintenance without the server.
    Retention {
        #[command(subcommand)]
        cmd: RetentionCommand,
    },
}

#[derive(Subcommand)]
pub enum RetentionCommand {
    /// Initialize the schema; seed the watchlist if empty.
    Init,
    /// Seed the watchlist with the top most-played games.
    WatchSeedTop {
        #[arg(long, default_value_t = 150)]
        limit: usize,
    },
    /// Add one appid to the watchlist.
    WatchAdd {
        appid: i32,
        #[arg(long)]
        title: Option<String>,
    },
    /// Remove an appid from the watchlist.
    WatchRm { appid: i32 },
    /// Print the watchlist.
    WatchList,
    /// Re-fetch storefront detail for every watched game.
    WatchRefreshTags,
    /// Collect one sample per watched appid, roll up, and purge.
    CollectOnce,
}
