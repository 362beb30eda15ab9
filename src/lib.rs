mod app;
mod config;
mod db;
mod errors;
mod listing;
mod models;
mod paginator;
mod refresh;
mod session;

pub use crate::app::MySpaceCore;
pub use crate::config::Config;
pub use crate::db::Database;
pub use crate::errors::{AppError, AppResult};
pub use crate::listing::{DetailsCursor, DetailsListState, DetailsListing, DetailsPage, SpaceListState, SpaceListing};
pub use crate::models::{
    display_or_placeholder, format_timestamp, now_millis, ChildCounts, DeleteSummary, EntityKind, FavoriteTarget,
    File, Folder, ListFilesFilters, ListFoldersFilters, ListSpacesFilters, ParentRef, SortOption, SortOrder, Space,
    DEFAULT_PAGE_SIZE, NOT_AVAILABLE,
};
pub use crate::paginator::Paginator;
pub use crate::refresh::{channel as refresh_channel, RefreshEvent, RefreshReceiver, RefreshSender, RefreshSet};
pub use crate::session::{AuthOutcome, IdentityFuture, IdentityProvider, SessionManager, UserSession};

use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Creates the data directory, starts file logging and opens the store.
pub fn bootstrap(config: Config, provider: Arc<dyn IdentityProvider>) -> AppResult<Arc<MySpaceCore>> {
    config.validate()?;
    std::fs::create_dir_all(&config.data_dir)?;
    init_tracing(&config.log_dir(), &config.log_filter)?;
    MySpaceCore::new(config, provider)
}

pub fn init_tracing(log_dir: &Path, fallback_filter: &str) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "myspace.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_filter)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}
