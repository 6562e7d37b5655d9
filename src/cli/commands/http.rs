use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;

pub const ARG_CORS_ORIGINS: &str = "cors-origins";
pub const ARG_FRONTEND_DIR: &str = "frontend-dir";

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CORS_ORIGINS)
                .long(ARG_CORS_ORIGINS)
                .help("Comma-separated list of browser origins allowed to call the API")
                .env("TASKDECK_CORS_ORIGINS")
                .default_value(DEFAULT_CORS_ORIGINS),
        )
        .arg(
            Arg::new(ARG_FRONTEND_DIR)
                .long(ARG_FRONTEND_DIR)
                .help("Directory with the built frontend, served for every non-API path")
                .env("TASKDECK_FRONTEND_DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub cors_origins: Vec<String>,
    pub frontend_dir: Option<PathBuf>,
}

impl Options {
    /// Read HTTP surface options from validated matches.
    ///
    /// # Errors
    /// Never fails today; kept fallible to match the other option groups.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let raw = matches
            .get_one::<String>(ARG_CORS_ORIGINS)
            .map_or(DEFAULT_CORS_ORIGINS, String::as_str);

        Ok(Self {
            cors_origins: split_origins(raw),
            frontend_dir: matches.get_one::<PathBuf>(ARG_FRONTEND_DIR).cloned(),
        })
    }
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
/// Origins are compared case-insensitively by browsers, so they are lowercased.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_lowercase())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_origins_normalizes() {
        assert_eq!(
            split_origins(" https://App.Example.com/ ,, http://localhost:3000"),
            vec![
                "https://app.example.com".to_string(),
                "http://localhost:3000".to_string()
            ]
        );
    }

    #[test]
    fn parse_defaults() -> Result<()> {
        temp_env::with_vars(
            [
                ("TASKDECK_CORS_ORIGINS", None::<&str>),
                ("TASKDECK_FRONTEND_DIR", None),
            ],
            || {
                let matches = with_args(Command::new("test")).get_matches_from(["test"]);
                let options = Options::parse(&matches)?;
                assert_eq!(
                    options.cors_origins,
                    vec![
                        "http://localhost:3000".to_string(),
                        "http://127.0.0.1:3000".to_string()
                    ]
                );
                assert!(options.frontend_dir.is_none());
                Ok(())
            },
        )
    }

    #[test]
    fn parse_frontend_dir() -> Result<()> {
        let matches = with_args(Command::new("test")).get_matches_from([
            "test",
            "--frontend-dir",
            "/srv/taskdeck",
        ]);
        let options = Options::parse(&matches)?;
        assert_eq!(options.frontend_dir, Some(PathBuf::from("/srv/taskdeck")));
        Ok(())
    }
}
