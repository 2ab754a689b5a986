//! Command dispatch: bridges CLI args -> hub calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod likes;
pub mod playlists;
pub mod sheets;
pub mod util;

use sheetly_core::Hub;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(hub, args, global).await,
        Command::Likes(args) => likes::handle(hub, args, global).await,
        Command::Sheets(args) => sheets::handle(hub, args, global).await,
        Command::Playlists(args) => playlists::handle(hub, args, global).await,
        // Config and Completions are handled before a hub exists
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
