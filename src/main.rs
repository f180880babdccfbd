use chrono::Utc;
use clap::Parser;
use classdesk::api::SyncBackend;
use classdesk::api::models::{
    CalendarData, ClassroomData, DataKind, SyncableEntity, WebsiteStatus,
};
use classdesk::cli::{Args, Command};
use classdesk::config::Config;
use classdesk::logging::setup_logging;
use classdesk::state::AppState;
use classdesk::sync::{GroupSyncOutcome, SyncOutcome, classify};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        backend = %config.api_base_url,
        "starting classdesk"
    );

    match run(args.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(config).await?;

    match command {
        Command::Status => {
            let health = state.api.health().await?;
            println!(
                "classdesk {} ({})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_COMMIT_SHORT")
            );
            println!("scheduler: {}", health.scheduler);
            match health.next_sync {
                Some(next) => println!("next sync: {}", next.to_rfc3339()),
                None => println!("next sync: not scheduled"),
            }
        }
        Command::Fetch { kind, refresh } => {
            if kind == DataKind::Website && config.site_url.is_none() {
                anyhow::bail!(
                    "site_url is not configured; set CLASSDESK_SITE_URL or add it to classdesk.toml"
                );
            }
            let payload = if refresh {
                state.coordinator.refresh(kind).await?
            } else {
                state.coordinator.fetch_with_cache(kind).await?
            };
            render_dataset(kind, &payload)?;
        }
        Command::Sync { kind, id } => match state.coordinator.sync_entity(kind, &id).await? {
            SyncOutcome::Completed(message) => println!("{message}"),
            SyncOutcome::AlreadyRunning => println!("a sync for {kind}-{id} is already running"),
            SyncOutcome::Cancelled => println!("sync cancelled before completion"),
            SyncOutcome::Unsupported => {
                anyhow::bail!("{kind} entities cannot be synced on demand")
            }
        },
        Command::SyncGrade { grade, services } => {
            match state.coordinator.sync_group(&grade, &services).await {
                GroupSyncOutcome::Report(report) => print!("{report}"),
                GroupSyncOutcome::AlreadyRunning => {
                    println!("a group sync for {grade} is already running")
                }
                GroupSyncOutcome::Cancelled => println!("group sync cancelled before completion"),
            }
        }
        Command::ClearCache => {
            let scope = state.coordinator.scope().to_owned();
            state.logout().await;
            if scope.is_empty() {
                println!("cleared anonymous cache");
            } else {
                println!("cleared cache for {scope}");
            }
        }
    }

    Ok(())
}

/// Print one dataset with a freshness tier per entity.
fn render_dataset(kind: DataKind, payload: &serde_json::Value) -> anyhow::Result<()> {
    let now = Utc::now();
    match kind {
        DataKind::Classroom => {
            let data: ClassroomData = serde_json::from_value(payload.clone())?;
            if data.courses.is_empty() {
                println!("no courses");
            }
            for course in data.courses {
                let name = course.name.clone().unwrap_or_else(|| "(unnamed)".into());
                let entity = SyncableEntity::from(course);
                println!(
                    "{:10} {:30} [{}]",
                    entity.id,
                    name,
                    classify(entity.last_synced, now)
                );
            }
        }
        DataKind::Calendar => {
            let data: CalendarData = serde_json::from_value(payload.clone())?;
            if data.events.is_empty() {
                println!("no events");
            }
            for event in data.events {
                let summary = event.summary.clone().unwrap_or_else(|| "(untitled)".into());
                let entity = SyncableEntity::from(event);
                println!(
                    "{:10} {:30} [{}]",
                    entity.id,
                    summary,
                    classify(entity.last_synced, now)
                );
            }
        }
        DataKind::Website => {
            let status: WebsiteStatus = serde_json::from_value(payload.clone())?;
            println!(
                "{} [{}]",
                status.title,
                classify(status.crawled_at, now)
            );
            match status.crawled_at {
                Some(at) => println!("last crawled: {}", at.to_rfc3339()),
                None => println!("never crawled"),
            }
        }
    }
    Ok(())
}
