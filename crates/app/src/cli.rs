//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use drupal_auth_domain::{Header, HttpMethod};

/// Log in to a Drupal site over OAuth and call its API with the token.
#[derive(Debug, Parser)]
#[command(name = "drupal-auth", version, about)]
pub struct Cli {
    /// JSON file with client settings. `DRUPAL_*` variables override it.
    #[arg(long, global = true, env = "DRUPAL_AUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the token file.
    #[arg(long, global = true, env = "DRUPAL_AUTH_TOKEN_DIR")]
    pub token_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange a username and password for a token.
    Login {
        /// Drupal user name.
        username: String,

        /// Password; read from the environment when omitted.
        #[arg(long, env = "DRUPAL_AUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored token.
    Logout,

    /// Show whether a token is stored and when it expires.
    Status,

    /// Print a usable access token, refreshing it if needed.
    Token,

    /// Exchange the stored refresh token for a new token now.
    Refresh,

    /// Send a request to the site with the stored token.
    Fetch {
        /// Path relative to the site, e.g. `/jsonapi/node/article`.
        path: String,

        /// HTTP method.
        #[arg(short = 'X', long, default_value = "GET")]
        method: HttpMethod,

        /// Extra header as `Name: value`. Repeatable.
        #[arg(short = 'H', long = "header")]
        headers: Vec<Header>,

        /// Request body.
        #[arg(short, long)]
        data: Option<String>,

        /// Add an `X-CSRF-Token` from the session token endpoint.
        #[arg(long)]
        csrf: bool,
    },

    /// Show who the site thinks the token belongs to.
    Debug,
}
