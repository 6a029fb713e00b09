use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AvatarImage, InMemoryProfileCache, ProfileView, ProfileViewState, SignedOutSession,
    ViewerSession, XrpcAgent,
};
use shared::{
    domain::Did,
    protocol::{ProfileQuery, ProfileUpdate},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_service_url, DEFAULT_SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(about = "Inspect and act on an actor profile")]
struct Cli {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    service_url: Option<String>,
    #[arg(long)]
    identifier: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a profile and print its view state.
    Show { actor: String },
    /// Follow the actor, or unfollow when already following.
    ToggleFollow { actor: String },
    /// Update the signed-in viewer's own profile.
    Update {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, requires = "avatar_mime")]
        avatar: Option<PathBuf>,
        #[arg(long, requires = "avatar")]
        avatar_mime: Option<String>,
        #[arg(long)]
        banner: Option<String>,
    },
}

impl Command {
    fn needs_session(&self) -> bool {
        !matches!(self, Command::Show { .. })
    }

    /// The actor the view is bound to. `update` always targets the viewer.
    fn target_actor(&self, viewer: Option<&Did>) -> Result<String> {
        match self {
            Command::Show { actor } | Command::ToggleFollow { actor } => Ok(actor.clone()),
            Command::Update { .. } => viewer
                .map(|did| did.to_string())
                .context("update needs a signed-in viewer"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config);
    if let Some(v) = cli.service_url {
        settings.service_url = v;
    }
    if let Some(v) = cli.identifier {
        settings.identifier = Some(v);
    }
    if let Some(v) = cli.password {
        settings.password = Some(v);
    }

    let service_url = normalize_service_url(&settings.service_url)?;
    let agent = Arc::new(XrpcAgent::new(service_url, settings.http_timeout)?);

    let viewer = match (&settings.identifier, &settings.password) {
        (Some(identifier), Some(password)) => Some(agent.login(identifier, password).await?),
        _ if cli.command.needs_session() => {
            bail!("this command needs a session: pass --identifier and --password");
        }
        _ => {
            info!("profile_cli: continuing without a session");
            None
        }
    };
    let session: Arc<dyn ViewerSession> = match viewer {
        Some(_) => agent.clone(),
        None => Arc::new(SignedOutSession),
    };

    let actor = cli.command.target_actor(viewer.as_ref())?;
    let cache = Arc::new(InMemoryProfileCache::new());
    let view = ProfileView::new(ProfileQuery::new(actor), agent.clone(), session, cache);

    view.setup().await;
    let loaded = view.state();
    if loaded.has_error() {
        bail!("failed to load {}: {}", view.actor(), loaded.error);
    }

    match cli.command {
        Command::Show { .. } => {}
        Command::ToggleFollow { .. } => {
            view.toggle_following().await?;
        }
        Command::Update {
            display_name,
            description,
            avatar,
            avatar_mime,
            banner,
            ..
        } => {
            let new_avatar = avatar
                .zip(avatar_mime)
                .map(|(path, mime)| AvatarImage { path, mime });
            view.update_profile(
                ProfileUpdate {
                    display_name,
                    description,
                    avatar: None,
                },
                new_avatar,
                banner,
            )
            .await?;
        }
    }

    print_state(&view.state())
}

fn print_state(state: &ProfileViewState) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
