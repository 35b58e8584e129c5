//! CLI commands

use anyhow::{Context, Result, bail};
use chrono::DateTime;
use clap::Subcommand;
use hrdesk_core::{
    ActivationRequest, MenuItem, ProfileUpdateRequest, RegisterRequest, TokenState, User,
    UserSummary, now_timestamp,
};
use hrdesk_core::validation::validators;
use hrdesk_http::session::LOGIN_ROUTE;
use hrdesk_http::{Session, SessionConfig, UserQuery};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "HRDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the local session
    Logout,

    /// Show the signed-in user, fetching it from the backend
    Whoami,

    /// Show the local session state without contacting the backend
    Status,

    /// Show the navigation menu for the signed-in user
    Menu,

    /// Submit a registration request from a JSON file
    Register {
        #[arg(long)]
        file: PathBuf,
    },

    /// Send the activation email again
    ResendActivation {
        #[arg(long)]
        email: String,
    },

    /// Check an activation token
    ValidateActivation { token: String },

    /// Activate an approved account
    Activate {
        #[arg(long)]
        token: String,

        #[arg(long)]
        username: String,

        #[arg(long, env = "HRDESK_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Users administration
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },

    /// Self-service profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Keep the session alive, refreshing the token until interrupted
    Watch,

    /// Configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users
    List {
        #[arg(long, default_value = "0")]
        page: u32,

        #[arg(long, default_value = "10")]
        size: u32,

        #[arg(long)]
        search: Option<String>,
    },

    /// Show a user's full record
    Get { id: i64 },

    /// Update a user from a JSON file holding the changed fields
    Update {
        id: i64,

        #[arg(long)]
        file: PathBuf,
    },

    /// Account counts by status
    Stats,

    Enable { id: i64 },

    Disable { id: i64 },

    /// Send a password reset email
    ResetPassword { id: i64 },

    /// Approve a pending registration
    Approve { id: i64 },

    /// Reject a pending registration
    Reject { id: i64 },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Update profile fields; omitted fields are left unchanged
    Update {
        id: i64,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        marital_status: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Output file path (defaults to <state-dir>/hrdesk.toml)
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

impl Commands {
    /// Whether the command runs until interrupted
    pub const fn is_long_running(&self) -> bool {
        matches!(self, Self::Watch)
    }

    pub async fn execute(self, config: SessionConfig) -> Result<()> {
        if let Self::Config { command } = self {
            return command.execute(&config);
        }

        let session = Session::builder(config)
            .build()
            .context("Failed to open session")?;
        let auth = session.auth();

        match self {
            Self::Login { email, password } => {
                validators::validate_email(&email, "email")?;
                validators::validate_not_empty(&password, "password")?;
                if !auth.login(&email, &password).await? {
                    bail!("Login did not produce a usable token");
                }
                let user = auth.current_user();
                println!(
                    "Signed in as {}",
                    user.as_ref().map_or(email, User::display_name)
                );
                Ok(())
            }
            Self::Logout => {
                auth.logout().await?;
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => {
                require_session(&session)?;
                match auth.resolve_user().await {
                    Some(user) => print_json(&user),
                    None => bail!("Not signed in"),
                }
            }
            Self::Status => {
                print_status(&session);
                Ok(())
            }
            Self::Menu => {
                require_session(&session)?;
                print_menu(&auth.menu().await?, 0);
                Ok(())
            }
            Self::Register { file } => {
                let request: RegisterRequest = read_json(&file)?;
                let response = auth.register(&request).await?;
                print_json(&response)
            }
            Self::ResendActivation { email } => {
                let response = auth.resend_activation_email(&email).await?;
                print_json(&response)
            }
            Self::ValidateActivation { token } => {
                let status = auth.validate_activation_token(&token).await?;
                print_json(&status)
            }
            Self::Activate {
                token,
                username,
                password,
            } => {
                let request = ActivationRequest::new(token, username, password);
                let response = auth.activate_account(&request).await?;
                print_json(&response)
            }
            Self::Users { command } => {
                require_session(&session)?;
                command.execute(&session).await
            }
            Self::Profile { command } => {
                require_session(&session)?;
                command.execute(&session).await
            }
            Self::Watch => watch(&session).await,
            Self::Config { .. } => Ok(()),
        }
    }
}

impl UsersCommands {
    pub async fn execute(self, session: &Session) -> Result<()> {
        let client = session.client();

        match self {
            Self::List { page, size, search } => {
                let page = client
                    .list_users(&UserQuery { page, size, search })
                    .await?;
                for user in &page.content {
                    print_user_row(user);
                }
                println!(
                    "page {}/{} ({} users)",
                    page.number + 1,
                    page.total_pages.max(1),
                    page.total_elements
                );
                Ok(())
            }
            Self::Get { id } => print_json(&client.get_user(id).await?),
            Self::Update { id, file } => {
                let changes: serde_json::Value = read_json(&file)?;
                print_json(&client.update_user(id, &changes).await?)
            }
            Self::Stats => print_json(&client.user_stats().await?),
            Self::Enable { id } => {
                client.enable_user(id).await?;
                println!("User {id} enabled");
                Ok(())
            }
            Self::Disable { id } => {
                client.disable_user(id).await?;
                println!("User {id} disabled");
                Ok(())
            }
            Self::ResetPassword { id } => {
                client.reset_password(id).await?;
                println!("Password reset sent for user {id}");
                Ok(())
            }
            Self::Approve { id } => {
                client.approve_registration(id).await?;
                println!("Registration {id} approved");
                Ok(())
            }
            Self::Reject { id } => {
                client.reject_registration(id).await?;
                println!("Registration {id} rejected");
                Ok(())
            }
        }
    }
}

impl ProfileCommands {
    pub async fn execute(self, session: &Session) -> Result<()> {
        match self {
            Self::Update {
                id,
                first_name,
                last_name,
                phone,
                address,
                marital_status,
                description,
            } => {
                let update = ProfileUpdateRequest {
                    first_name,
                    last_name,
                    phone,
                    address,
                    marital_status,
                    description,
                };
                if update.is_empty() {
                    bail!("Nothing to update");
                }
                session.auth().update_profile(id, &update).await?;
                println!("Profile {id} updated");
                Ok(())
            }
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, session_config: &SessionConfig) -> Result<()> {
        match self {
            Self::Init { output } => {
                let config_path =
                    output.unwrap_or_else(|| session_config.state_dir.join("hrdesk.toml"));

                if let Some(parent) = config_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                config::generate_default_config(&config_path)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
            Self::Show => print_json(session_config),
        }
    }
}

/// Run the session loop until Ctrl-C or until the backend ends the session
async fn watch(session: &Session) -> Result<()> {
    watch_until(session, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Keep the session alive until `shutdown` resolves.
///
/// An expired token is accepted while it carries a refresh token; the loop
/// refreshes it at once and only fails once the session is lost.
async fn watch_until(session: &Session, shutdown: impl Future<Output = ()>) -> Result<()> {
    if !session.auth().check() && session.tokens().refresh_token().is_none() {
        bail!("Not signed in, run `hrdesk login` first");
    }

    let cancel = CancellationToken::new();
    let auth = session.auth().clone();
    let loop_cancel = cancel.clone();
    let session_loop = tokio::spawn(async move { auth.run(loop_cancel).await });

    let mut user = session.auth().user();
    let mut token = session.tokens().subscribe();
    let mut route = session.router().subscribe();
    info!("watching session, press Ctrl-C to stop");

    tokio::pin!(shutdown);
    let outcome = loop {
        tokio::select! {
            () = &mut shutdown => break Ok(()),
            changed = user.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                match user.borrow_and_update().as_ref() {
                    Some(user) => println!("Signed in as {}", user.display_name()),
                    None => println!("Signed out"),
                }
            }
            changed = token.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                if token.borrow_and_update().is_none() {
                    break Err(anyhow::anyhow!("Session ended, sign in again"));
                }
            }
            changed = route.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                if *route.borrow_and_update() == LOGIN_ROUTE {
                    break Err(anyhow::anyhow!("Session ended, sign in again"));
                }
            }
        }
    };

    cancel.cancel();
    session_loop.await?;
    outcome
}

fn require_session(session: &Session) -> Result<()> {
    if !session.auth().check() {
        bail!("Not signed in, run `hrdesk login` first");
    }
    Ok(())
}

fn print_status(session: &Session) {
    let token = session.tokens().token();
    let state = session.tokens().state();

    let state_label = match state {
        TokenState::Absent => "signed out",
        TokenState::Valid => "signed in",
        TokenState::ExpiringSoon => "signed in (refresh due)",
        TokenState::Expired => "expired",
    };
    println!("session:  {state_label}");
    println!("backend:  {}", session.config().base_url);

    if let Some(exp) = token.as_ref().and_then(|token| token.exp) {
        let remaining = exp - now_timestamp();
        let at = DateTime::from_timestamp(exp, 0)
            .map_or_else(|| exp.to_string(), |at| at.to_rfc3339());
        println!("expires:  {at} ({remaining}s)");
    }
    if let Some(user) = session.auth().current_user() {
        println!("user:     {}", user.display_name());
        if !user.roles.is_empty() {
            println!("roles:    {}", user.roles.join(", "));
        }
    }
}

fn print_menu(items: &[MenuItem], depth: usize) {
    for item in items {
        println!("{:indent$}{}  {}", "", item.name, item.route, indent = depth * 2);
        print_menu(&item.children, depth + 1);
    }
}

fn print_user_row(user: &UserSummary) {
    println!(
        "{:>6}  {:<28}  {:<32}  {:?}",
        user.id,
        format!("{} {}", user.first_name, user.last_name),
        user.email,
        user.status()
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
