use crate::cli::{
    actions::{server::Args, Action},
    commands::{auth, http},
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth = auth::Options::parse(matches)?;
    let http = http::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        jwt_secret: auth.jwt_secret,
        token_ttl_seconds: auth.token_ttl_seconds,
        cookie_same_site: auth.cookie_same_site,
        cookie_secure: auth.cookie_secure,
        cors_origins: http.cors_origins,
        frontend_dir: http.frontend_dir,
    }))
}
