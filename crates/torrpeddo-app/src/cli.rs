use clap::{Parser, Subcommand};

use torrpeddo_config::FrontendMode;

/// Arguments accepted by the `torrpeddo` binary.
#[derive(Debug, Parser)]
#[command(name = "torrpeddo", version, about = "Torrpeddo transfer coordinator")]
pub struct Cli {
    /// Front-end to run; defaults to `TORRPEDDO_FRONTEND`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Front-end subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the JSON HTTP API.
    Serve,
    /// Speak line-delimited JSON commands on stdin/stdout.
    Bridge,
}

impl Cli {
    /// Front-end forced by the subcommand, if any.
    #[must_use]
    pub const fn frontend_override(&self) -> Option<FrontendMode> {
        match self.command {
            Some(Command::Serve) => Some(FrontendMode::Http),
            Some(Command::Bridge) => Some(FrontendMode::Stdio),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommands_select_the_frontend() {
        let cases = [
            (vec!["torrpeddo"], None),
            (vec!["torrpeddo", "serve"], Some(FrontendMode::Http)),
            (vec!["torrpeddo", "bridge"], Some(FrontendMode::Stdio)),
        ];
        for (args, expected) in cases {
            let cli = Cli::try_parse_from(&args).expect("parse");
            assert_eq!(cli.frontend_override(), expected, "{args:?}");
        }
        assert!(Cli::try_parse_from(["torrpeddo", "fly"]).is_err());
    }
}
