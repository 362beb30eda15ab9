use crate::config::Config;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::listing::{DetailsListing, SpaceListing};
use crate::models::{
    now_millis, ChildCounts, DeleteSummary, EntityKind, FavoriteTarget, File, Folder, ParentRef, SortOrder, Space,
};
use crate::refresh::{RefreshEvent, RefreshSender};
use crate::session::{IdentityProvider, SessionManager, UserSession};
use std::sync::Arc;

fn require_text(value: &str, message: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

/// Entry point for hosts: validates input, talks to the store and session, and tells
/// the opening screen what to refresh.
pub struct MySpaceCore {
    config: Config,
    db: Arc<Database>,
    sessions: SessionManager,
}

impl MySpaceCore {
    pub fn new(config: Config, provider: Arc<dyn IdentityProvider>) -> AppResult<Arc<Self>> {
        config.validate()?;
        let db = Arc::new(Database::new(&config.database_path())?);
        tracing::info!(path = %config.database_path().display(), "store opened");
        Ok(Self::with_database(config, db, provider))
    }

    pub fn with_database(config: Config, db: Arc<Database>, provider: Arc<dyn IdentityProvider>) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            sessions: SessionManager::new(provider),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<UserSession> {
        self.sessions.sign_in(email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<UserSession> {
        self.sessions.sign_up(email, password).await
    }

    pub async fn resume_session(&self, session: UserSession) {
        self.sessions.resume(session).await;
    }

    pub async fn logout(&self) {
        self.sessions.sign_out().await;
    }

    pub async fn current_user(&self) -> Option<UserSession> {
        self.sessions.current_user().await
    }

    pub async fn space_listing(&self, sort: SortOrder) -> AppResult<SpaceListing> {
        let user = self.sessions.require_user().await?;
        Ok(SpaceListing::new(self.db.clone(), &user.user_id, sort, self.config.page_size))
    }

    pub fn details_listing(&self, parent: ParentRef, sort: SortOrder) -> DetailsListing {
        DetailsListing::new(self.db.clone(), parent, sort, self.config.page_size)
    }

    pub async fn create_space(&self, name: &str, refresh: &mut RefreshSender) -> AppResult<Space> {
        require_text(name, "Enter Space Name")?;
        let user = self.sessions.require_user().await?;
        let space = self.db.create_space(name, &user.user_id, now_millis())?;
        refresh.mark(RefreshEvent::Spaces);
        Ok(space)
    }

    pub fn create_folder(&self, parent: ParentRef, name: &str, refresh: &mut RefreshSender) -> AppResult<Folder> {
        require_text(name, "Enter Folder Name")?;
        let folder = self.db.create_folder(parent, name, now_millis())?;
        refresh.mark(RefreshEvent::Folders);
        refresh.mark(RefreshEvent::Spaces);
        Ok(folder)
    }

    pub fn create_file(
        &self,
        parent: ParentRef,
        file_name: &str,
        title: &str,
        description: &str,
        refresh: &mut RefreshSender,
    ) -> AppResult<File> {
        validate_file(file_name, title, description)?;
        let file = self
            .db
            .create_file(parent, file_name, title, description, now_millis())?;
        mark_file_change(refresh);
        Ok(file)
    }

    pub fn update_file(
        &self,
        id: i64,
        file_name: &str,
        title: &str,
        description: &str,
        refresh: &mut RefreshSender,
    ) -> AppResult<Option<File>> {
        validate_file(file_name, title, description)?;
        let updated = self
            .db
            .update_file(id, file_name, title, description, now_millis())?;
        if updated.is_some() {
            mark_file_change(refresh);
        }
        Ok(updated)
    }

    pub fn delete_spaces(&self, ids: &[i64], refresh: &mut RefreshSender) -> AppResult<DeleteSummary> {
        let summary = self.db.delete_spaces(ids)?;
        refresh.mark(RefreshEvent::Spaces);
        Ok(summary)
    }

    pub fn delete_folders(&self, ids: &[i64], refresh: &mut RefreshSender) -> AppResult<DeleteSummary> {
        let summary = self.db.delete_folders(ids)?;
        refresh.mark(RefreshEvent::Folders);
        refresh.mark(RefreshEvent::Files);
        Ok(summary)
    }

    pub fn delete_files(&self, ids: &[i64], refresh: &mut RefreshSender) -> AppResult<DeleteSummary> {
        let summary = self.db.delete_files(ids)?;
        refresh.mark(RefreshEvent::Files);
        Ok(summary)
    }

    pub fn toggle_favorite(&self, target: FavoriteTarget, refresh: &mut RefreshSender) -> AppResult<Option<bool>> {
        let toggled = self.db.toggle_favorite(target)?;
        if toggled.is_some() {
            refresh.mark(match target {
                FavoriteTarget::Space(_) => RefreshEvent::Spaces,
                FavoriteTarget::File(_) => RefreshEvent::Files,
            });
        }
        Ok(toggled)
    }

    /// Counts a view and returns the record as it is after the increment.
    pub fn open_space(&self, id: i64) -> AppResult<Option<Space>> {
        if self.db.increment_view_count(EntityKind::Space, id)?.is_none() {
            return Ok(None);
        }
        self.db.get_space(id)
    }

    pub fn open_folder(&self, id: i64) -> AppResult<Option<Folder>> {
        if self.db.increment_view_count(EntityKind::Folder, id)?.is_none() {
            return Ok(None);
        }
        self.db.get_folder(id)
    }

    pub fn open_file(&self, id: i64) -> AppResult<Option<File>> {
        if self.db.increment_view_count(EntityKind::File, id)?.is_none() {
            return Ok(None);
        }
        self.db.get_file(id)
    }

    pub fn details_title(&self, parent: ParentRef) -> AppResult<String> {
        self.db.title_for(parent)
    }

    pub fn child_counts(&self, parent: ParentRef) -> AppResult<ChildCounts> {
        self.db.count_children(parent)
    }
}

fn validate_file(file_name: &str, title: &str, description: &str) -> AppResult<()> {
    require_text(file_name, "Enter File Name")?;
    require_text(title, "Enter File Title")?;
    require_text(description, "Enter File Description")
}

// Files bump every ancestor's updatedAt, so each list above them is stale.
fn mark_file_change(refresh: &mut RefreshSender) {
    refresh.mark(RefreshEvent::Files);
    refresh.mark(RefreshEvent::Folders);
    refresh.mark(RefreshEvent::Spaces);
}
