use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tokenward")]
#[command(about = "tokenward CLI: issue, refresh and revoke access/refresh token pairs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (defaults to ./tokenward.toml)
    #[arg(short, long, global = true, env = "TOKENWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage backend (overrides storage.backend from config)
    #[arg(short, long, global = true)]
    pub backend: Option<BackendArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Process-local store, discarded on exit
    Memory,
    /// PostgreSQL (storage.postgres.url)
    Postgres,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// Issue a new token pair for an authenticated user
    Issue(UserArgs),
    /// Exchange an access token and its refresh token for a current pair
    Refresh(RefreshArgs),
    /// Rotate a refresh token if it is close to expiry
    Rotate(RotateArgs),
    /// Check an access token as a request would
    Authenticate(AuthenticateArgs),
    /// End one session
    Logout(RotateArgs),
    /// End every session of a user
    LogoutAll(UserArgs),
    /// List a user's active sessions
    Sessions(SessionsArgs),
    /// Print the effective configuration
    Config,
    /// Walk through a token lifecycle against a simulated clock
    Demo(UserArgs),
}

#[derive(clap::Args)]
pub struct UserArgs {
    /// User id
    #[arg(short, long)]
    pub user: String,
}

#[derive(clap::Args)]
pub struct RefreshArgs {
    /// User id
    #[arg(short, long)]
    pub user: String,
    /// Access token presented by the client (may be expired)
    #[arg(long)]
    pub access: String,
    /// Refresh token presented by the client
    #[arg(long)]
    pub refresh: String,
}

#[derive(clap::Args)]
pub struct RotateArgs {
    /// User id
    #[arg(short, long)]
    pub user: String,
    /// Refresh token presented by the client
    #[arg(long)]
    pub refresh: String,
}

#[derive(clap::Args)]
pub struct AuthenticateArgs {
    /// User id
    #[arg(short, long)]
    pub user: String,
    /// Access token presented by the client
    #[arg(long)]
    pub access: String,
}

#[derive(clap::Args)]
pub struct SessionsArgs {
    /// User id
    #[arg(short, long)]
    pub user: String,
    /// Maximum number of refresh tokens to inspect
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refresh() {
        let cli = Cli::try_parse_from([
            "tokenward",
            "refresh",
            "--user",
            "alice",
            "--access",
            "aaa",
            "--refresh",
            "rrr",
        ])
        .unwrap();

        match cli.command {
            Commands::Refresh(args) => {
                assert_eq!(args.user, "alice");
                assert_eq!(args.access, "aaa");
                assert_eq!(args.refresh, "rrr");
            }
            _ => panic!("expected refresh command"),
        }
    }

    #[test]
    fn test_global_backend_flag() {
        let cli =
            Cli::try_parse_from(["tokenward", "logout-all", "-u", "bob", "--backend", "postgres"])
                .unwrap();
        assert_eq!(cli.backend, Some(BackendArg::Postgres));
        assert!(matches!(cli.command, Commands::LogoutAll(_)));
    }

    #[test]
    fn test_sessions_default_limit() {
        let cli = Cli::try_parse_from(["tokenward", "sessions", "--user", "carol"]).unwrap();
        match cli.command {
            Commands::Sessions(args) => assert_eq!(args.limit, 20),
            _ => panic!("expected sessions command"),
        }
    }

    #[test]
    fn test_missing_user_is_rejected() {
        assert!(Cli::try_parse_from(["tokenward", "issue"]).is_err());
    }
}
