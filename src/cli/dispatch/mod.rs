//! Maps parsed CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{cookies, provider, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or blank.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let provider_opts = provider::Options::parse(matches)?;
    let cookie_opts = cookies::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        project_id: provider_opts.project_id,
        api_key: provider_opts.api_key,
        identity_url: provider_opts.identity_url,
        token_url: provider_opts.token_url,
        request_timeout_seconds: provider_opts.request_timeout_seconds,
        remember_ttl_seconds: cookie_opts.remember_ttl_seconds,
        secure_cookies: cookie_opts.secure,
    }))
}
