//! Auth command handlers.

use serde::Serialize;

use sheetly_core::Hub;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct WhoAmI {
    user_id: String,
    email: Option<String>,
}

pub async fn handle(hub: &Hub, args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Whoami => {
            util::require_user(hub)?;
            let (user_id, email) = hub.fetch_user().await?;
            let me = WhoAmI {
                user_id: user_id.to_string(),
                email,
            };
            let out = output::render_single(
                &global.output,
                &me,
                |m| {
                    format!(
                        "User:  {}\nEmail: {}",
                        m.user_id,
                        m.email.as_deref().unwrap_or("-")
                    )
                },
                |m| m.user_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
