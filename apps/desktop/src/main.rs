use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{AreaListScreen, HttpBackend, ScreenArgs, ScreenBackend, ScreenNotice};
use shared::{
    domain::{AreaId, LotId},
    error::ApiError,
};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(about = "Area list and lot commands for one parking lot")]
struct Args {
    #[arg(long, allow_negative_numbers = true, default_value_t = LotId::UNRESOLVED.0)]
    lot_id: i64,
    #[arg(long, default_value = "")]
    lot_name: String,
    /// Overrides `server_url` from settings.
    #[arg(long)]
    server_url: Option<String>,
    /// Overrides `username` from settings.
    #[arg(long)]
    username: Option<String>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Fetch and print the lot's areas.
    List,
    /// Rename one area.
    Rename {
        #[arg(long)]
        area_id: i64,
        #[arg(long)]
        name: String,
    },
    /// Send a lot command: reserve, cancel or checkin.
    Command { verb: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (mut settings, settings_problem) = config::load_settings();
    if let Some(url) = args.server_url.clone() {
        settings.server_url = url;
    }
    if let Some(username) = args.username.clone() {
        settings.username = username;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(problem) = settings_problem {
        tracing::warn!("{problem}");
    }

    let backend = HttpBackend::with_timeout(
        &settings.server_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let mut screen = AreaListScreen::new(
        ScreenArgs {
            lot_id: LotId(args.lot_id),
            lot_name: args.lot_name,
        },
        settings.username,
        ScreenBackend::from_shared(Arc::new(backend)),
    );

    let result = run(&mut screen, args.action).await;
    screen.teardown();
    if let Err(err) = &result {
        if let Some(client_err) = err.downcast_ref::<client_core::ClientError>() {
            eprintln!("{}", serde_json::to_string(&ApiError::from(client_err))?);
        }
    }
    result
}

async fn run(screen: &mut AreaListScreen, action: Action) -> Result<()> {
    match action {
        Action::List => {
            load_areas(screen).await?;
            println!("{}", screen.title());
            for area in screen.areas() {
                println!("{:>6}  {}", area.id.0, area.name);
            }
        }
        Action::Rename { area_id, name } => {
            load_areas(screen).await?;
            let mut notices = screen.subscribe_notices();
            screen.begin_edit(AreaId(area_id))?;
            if !screen.edit_text(name)? {
                screen.dismiss_edit()?;
                bail!("area name must not be empty");
            }
            let record = screen.confirm_edit()?;
            screen.settle().await;
            if let Ok(ScreenNotice::RemoteUpdateFailed { message, .. }) = notices.try_recv() {
                eprintln!("renamed locally, but the server update failed: {message}");
            }
            println!("{}", serde_json::to_string(&record)?);
        }
        Action::Command { verb } => {
            let envelope = screen.dispatch(&verb).await?;
            println!("{}", serde_json::to_string(&envelope)?);
        }
    }
    Ok(())
}

/// Runs the initial sync; Ctrl-C tears the screen down instead of retrying forever.
async fn load_areas(screen: &mut AreaListScreen) -> Result<()> {
    if !screen.enter() {
        bail!("no lot selected; pass --lot-id");
    }

    let mut notices = screen.subscribe_notices();
    let outcome = tokio::select! {
        outcome = screen.next_sync_outcome() => outcome?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted; abandoning area sync");
            None
        }
    };

    if outcome.is_none() {
        bail!("area sync did not complete");
    }
    if let Ok(ScreenNotice::SyncRejected { lot_id }) = notices.try_recv() {
        bail!("server declined to list areas for lot {}", lot_id.0);
    }
    Ok(())
}
