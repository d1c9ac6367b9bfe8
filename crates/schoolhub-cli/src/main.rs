//! SchoolHub CLI - a terminal front end for the SchoolHub session pipeline.
//!
//! Resolves the stored session on startup the same way the app does and
//! offers login, signup, logout and a few authenticated lookups.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schoolhub_core::models::RegisterRequest;
use schoolhub_core::{ApiClient, Config, Root, SessionManager, SessionState};

/// Log file name inside `SCHOOLHUB_LOG_DIR`
const LOG_FILE_PREFIX: &str = "schoolhub.log";

const USAGE: &str = "\
Usage: schoolhub [COMMAND]

Commands:
  status              Show which root the app would mount (default)
  login [USERNAME]    Sign in and store the session
  signup              Create an account and sign in
  logout              Forget the session token
  whoami              Show the cached profile
  profile USERNAME    Fetch a user's profile from the API
  avatar USERNAME     Fetch a user's avatar and report its size
  ping                Send an online-status notification
  help                Show this message";

/// A parsed command line
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Status,
    Login(Option<String>),
    Signup,
    Logout,
    Whoami,
    Profile(String),
    Avatar(String),
    Ping,
    Help,
}

impl Command {
    /// Parse the arguments after the program name. Defaults to `status`.
    fn parse(args: &[String]) -> Result<Self> {
        let Some(command) = args.first() else {
            return Ok(Command::Status);
        };
        let operand = args.get(1).cloned();

        Ok(match command.as_str() {
            "status" => Command::Status,
            "login" => Command::Login(operand),
            "signup" => Command::Signup,
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "profile" => Command::Profile(required_arg(operand, "USERNAME")?),
            "avatar" => Command::Avatar(required_arg(operand, "USERNAME")?),
            "ping" => Command::Ping,
            "help" | "--help" | "-h" => Command::Help,
            other => anyhow::bail!("Unknown command: {}\n\n{}", other, USAGE),
        })
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var("SCHOOLHUB_LOG_DIR") {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    info!("SchoolHub CLI starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    let credentials = config.credential_store()?;
    let api = ApiClient::from_config(&config, credentials)
        .context("Failed to create API client")?;
    let session = SessionManager::new(api, SessionState::new())
        .forget_profile_on_logout(config.forget_profile_on_logout);

    let status = session.bootstrap().await;
    info!(%status, backend = session.api().credentials().backend_name(), "Session bootstrapped");

    match command {
        Command::Status => show_status(&session).await,
        Command::Login(username) => login(&session, &mut config, username).await,
        Command::Signup => signup(&session, &mut config).await,
        Command::Logout => {
            session.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => whoami(&session).await,
        Command::Profile(username) => {
            let profile = session
                .api()
                .fetch_profile(&username)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{} ({})", profile.display_name(), profile.handle());
            if let Some(school) = profile.school {
                println!("School: {}", school);
            }
            Ok(())
        }
        Command::Avatar(username) => {
            let bytes = session
                .api()
                .fetch_avatar(&username)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Avatar for {}: {} bytes", username, bytes.len());
            Ok(())
        }
        Command::Ping => {
            session
                .api()
                .notify_online()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Online status sent.");
            Ok(())
        }
        Command::Help => Ok(()),
    }
}

fn required_arg(operand: Option<String>, name: &str) -> Result<String> {
    operand
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing {}\n\n{}", name, USAGE))
}

async fn show_status(session: &SessionManager) -> Result<()> {
    let status = session.state().status();
    let root = Root::for_status(status);
    println!("Session: {}", status);
    match root.initial_screen() {
        Some(screen) => println!("Root: {:?} (starts at {})", root, screen.title()),
        None => println!("Root: {:?}", root),
    }
    if status.is_authenticated() {
        if let Some(profile) = session.current_profile().await {
            println!("Signed in as {} ({})", profile.display_name(), profile.handle());
        }
    }
    Ok(())
}

async fn whoami(session: &SessionManager) -> Result<()> {
    match session.current_profile().await {
        Some(profile) => {
            println!("{} ({})", profile.display_name(), profile.handle());
            if let Some(email) = profile.email {
                println!("Email: {}", email);
            }
            if !session.state().is_authenticated() {
                println!("(cached from a previous session; not signed in)");
            }
        }
        None => println!("No profile stored."),
    }
    Ok(())
}

async fn login(session: &SessionManager, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt_with_default("Username", config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");
    let profile = session
        .login(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    remember_username(config, &profile.username);
    println!("Welcome, {}!", profile.display_name());
    Ok(())
}

async fn signup(session: &SessionManager, config: &mut Config) -> Result<()> {
    let profile_name = prompt("Display name")?;
    let username = prompt("Username")?;
    let email = prompt("Email")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        return Err(anyhow::anyhow!("Passwords do not match"));
    }

    let request = RegisterRequest {
        profile_name,
        username,
        email,
        password,
    };
    let profile = session
        .signup(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    remember_username(config, &profile.username);
    println!("Account created. Welcome, {}!", profile.display_name());
    Ok(())
}

fn remember_username(config: &mut Config, username: &str) {
    config.last_username = Some(username.to_string());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    let Some(default) = default else {
        return prompt(label);
    };
    let input = prompt(&format!("{} [{}]", label, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}
