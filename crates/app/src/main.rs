//! BeeTime CLI - Main Entry Point
//!
//! Wires the auth context to the file-backed client storage and the HTTP
//! backend, then runs one command.

mod config;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use beetime_application::{
    AuthContext, CredentialStore, KeyValueStorage, LoginMethod, LoginOutcome,
    RequestAuthInterceptor,
};
use beetime_infrastructure::{FileStorage, ReqwestBackendClient};

use config::ClientConfig;

/// BeeTime auth client
#[derive(Parser, Debug)]
#[command(name = "beetime", version, about = "Sign in to a BeeTime backend")]
struct Args {
    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Backend base address (overrides BEETIME_BACKEND_URL)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Client storage file (overrides BEETIME_STORAGE_PATH)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the login methods the backend offers
    Providers,

    /// Sign in with username and password
    Login {
        /// Login name
        username: String,

        /// Password; read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Sign out and clear the client storage
    Logout,

    /// Show the Microsoft tenant configuration
    Tenant,

    /// Authenticated GET of any backend endpoint
    Get {
        /// Path below /api/v1, e.g. /user/me
        path: String,
    },
}

fn read_password() -> io::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = ClientConfig::from_env()?.with_overrides(args.backend, args.storage);
    tracing::debug!(?config, "configuration loaded");

    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open(&config.storage_path)?);
    let credentials = CredentialStore::new(storage);
    let backend = Arc::new(ReqwestBackendClient::new(
        &config.backend_url,
        RequestAuthInterceptor::new(credentials.clone()),
    )?);
    let ctx = AuthContext::new(credentials, backend.clone());

    match args.command {
        Command::Providers => {
            let capabilities = ctx.providers().fetch_or_all().await;
            for provider in capabilities.login_options() {
                println!("{provider}");
            }
        }

        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let outcome = ctx
                .session()
                .login(LoginMethod::Local { username, password })
                .await?;
            match outcome {
                LoginOutcome::Authenticated(profile) => {
                    println!("Signed in as {}", profile.display_name());
                }
                LoginOutcome::AuthenticatedWithoutProfile(e) => {
                    println!("Signed in, but the profile could not be loaded: {e}");
                }
                LoginOutcome::RedirectStarted => {
                    println!("Continue sign-in in the browser");
                }
            }
        }

        Command::Whoami => {
            if !ctx.session().is_logged_in() {
                println!("Not signed in");
                return Ok(());
            }
            let profile = ctx.session().load_session().await?;
            println!("{} ({})", profile.display_name(), profile.username);
            println!("access level: {}", profile.access_level);
            println!("administrator: {}", ctx.session().is_administrator());
        }

        Command::Logout => {
            ctx.session().logout()?;
            println!("Signed out");
        }

        Command::Tenant => {
            let tenant = ctx
                .identity()
                .configure(backend.as_ref(), Some(config.app_url))
                .await?;
            println!("client id: {}", tenant.client_id);
            println!("authority: {}", tenant.authority);
            if let Some(redirect_uri) = &tenant.redirect_uri {
                println!("redirect uri: {redirect_uri}");
            }
        }

        Command::Get { path } => {
            let data: serde_json::Value = backend.get_json(&path).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}
