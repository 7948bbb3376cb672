//! RecTelevision podcast CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! podcast-cli migrate
//!
//! # Create an account
//! podcast-cli user create -e admin@example.com -n "Admin" -r admin -p admin123
//!
//! # Log in from this machine, inspect, log out
//! podcast-cli session login -e admin@example.com -p admin123
//! podcast-cli session show
//! podcast-cli session logout
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create accounts
//! - `session` - Local login state

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;
mod storage;

#[derive(Parser)]
#[command(name = "podcast-cli")]
#[command(author, version, about = "RecTelevision podcast CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the local session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name (also the source of the public slug for creators)
        #[arg(short, long)]
        name: String,

        /// Role (`admin` or `user`)
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Password
        #[arg(short, long, env = "PODCAST_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Profile image URL
        #[arg(long)]
        image: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Verify credentials and remember the account on this machine
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "PODCAST_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the remembered account
    Show,
    /// Forget the remembered account
    Logout,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
                image,
            } => {
                let id =
                    commands::user::create(&email, &name, &role, &password, image.as_deref())
                        .await?;
                println!("{id}");
            }
        },
        Commands::Session { action } => match action {
            SessionAction::Login { email, password } => {
                let user = commands::session::login(&email, &password).await?;
                println!("Logged in as {} <{}> ({})", user.name, user.email, user.role);
            }
            SessionAction::Show => match commands::session::show() {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None => println!("Not logged in"),
            },
            SessionAction::Logout => commands::session::logout()?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
