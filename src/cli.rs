mod heartbeat;
mod scout;
mod serve;
mod tibber;

use clap::{Parser, Subcommand};

pub use self::{scout::ScoutArgs, serve::ServeArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: keep the prices fresh and serve the scheduling API.
    #[clap(name = "serve")]
    Serve(Box<ServeArgs>),

    /// Fetch the prices once and show the cheapest hours, without scheduling anything.
    #[clap(name = "scout")]
    Scout(Box<ScoutArgs>),
}
