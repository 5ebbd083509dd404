//! Drupal Auth - command line entry point
//!
//! Loads the client configuration, wires the adapters into an
//! `AuthClient` and runs one command against the site.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use drupal_auth_application::ports::HttpClientError;
use drupal_auth_application::{ApplicationError, AuthClient};
use drupal_auth_domain::{AuthError, JSON_API, RefreshOutcome, RequestOptions};
use drupal_auth_infrastructure::{
    ConfigError, FileTokenStorage, ReqwestHttpClient, SystemClock, default_token_dir,
    load_client_config,
};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("no data directory on this platform; pass --token-dir")]
    NoTokenDir,
}

impl From<AuthError> for CliError {
    fn from(error: AuthError) -> Self {
        Self::Application(error.into())
    }
}

impl From<HttpClientError> for CliError {
    fn from(error: HttpClientError) -> Self {
        Self::Application(error.into())
    }
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            Self::Application(error) => error.user_message(),
            other => other.to_string(),
        }
    }

    const fn requires_login(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::Auth(error)) if error.requires_login())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so command output can be piped.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "command failed");
            eprintln!("error: {}", error.user_message());
            if error.requires_login() {
                eprintln!("hint: run `drupal-auth login <username>`");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_client_config(cli.config.as_deref()).await?;
    let token_dir = cli
        .token_dir
        .or_else(default_token_dir)
        .ok_or(CliError::NoTokenDir)?;
    let http = ReqwestHttpClient::new()?;

    let client = AuthClient::new(
        config,
        Arc::new(http),
        Arc::new(FileTokenStorage::new(token_dir)),
        Arc::new(SystemClock::new()),
    );

    match cli.command {
        Command::Login { username, password } => {
            let token = client.login(&username, &password).await?;
            println!("Logged in as {username}; token expires in {}s", token.expires_in);
        }
        Command::Logout => {
            client.logout().await;
            println!("Logged out");
        }
        Command::Status => {
            let status = client.token_store().status().await?;
            println!("{}", status.display_message());
        }
        Command::Token => {
            let token = client.get_token().await?;
            println!("{}", token.access_token);
        }
        Command::Refresh => refresh(&client).await?,
        Command::Fetch {
            path,
            method,
            headers,
            data,
            csrf,
        } => {
            let mut options = RequestOptions::new(method);
            for header in headers {
                options.headers.append(header.name, header.value);
            }
            if !options.headers.contains("Accept") {
                options.headers.append("Accept", JSON_API);
            }
            if let Some(body) = data {
                if !options.headers.contains("Content-Type") {
                    options.headers.append("Content-Type", JSON_API);
                }
                options.body = Some(body);
            }

            let response = if csrf {
                client.fetch_with_csrf(&path, options).await?
            } else {
                client.fetch_with_authentication(&path, options).await?
            };
            eprintln!("HTTP {}", response.status);
            println!("{}", response.text());
        }
        Command::Debug => {
            let identity = client.debug().await.map_err(CliError::Application)?;
            let pretty = serde_json::to_string_pretty(&identity)
                .map_err(|e| ApplicationError::UnexpectedResponse(e.to_string()))?;
            println!("{pretty}");
        }
    }
    Ok(())
}

async fn refresh(client: &AuthClient) -> Result<(), CliError> {
    let token = client
        .token_store()
        .load()
        .await?
        .ok_or(AuthError::NoToken)?;
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or(AuthError::TokenExpiredNoRefresh)?;

    match client.refresh_token(refresh_token).await? {
        RefreshOutcome::Refreshed(token) => {
            println!("Token refreshed; expires in {}s", token.expires_in);
            Ok(())
        }
        RefreshOutcome::Rejected { code, message } => {
            Err(AuthError::Rejected { code, message }.into())
        }
    }
}
