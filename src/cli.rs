//! Command-line interface definitions.

use crate::api::models::{DataKind, EntityKind, ServiceName};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "classdesk",
    version,
    about = "Sync and cache coordinator for the school-admin dashboard"
)]
pub struct Args {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = TracingFormat::Pretty)]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show backend and background-scheduler health.
    Status,
    /// Fetch one dashboard dataset, with a freshness tier per entity.
    Fetch {
        #[arg(value_enum)]
        kind: DataKind,
        /// Drop the cached copy first and force a refetch.
        #[arg(long)]
        refresh: bool,
    },
    /// Trigger a one-shot sync for a single entity.
    Sync {
        #[arg(value_enum)]
        kind: EntityKind,
        /// Admin email (course/event) or page URL (page).
        id: String,
    },
    /// Sync a whole grade across services, sequentially.
    SyncGrade {
        grade: String,
        /// Services to run, in order.
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            default_values_t = [ServiceName::Classroom, ServiceName::Calendar]
        )]
        services: Vec<ServiceName>,
    },
    /// Wipe the current admin's cache namespace.
    ClearCache,
}
