//! Paged list state for the space list and the space/folder details list.
//!
//! Both listings fetch the first page eagerly on `refresh` and leave later pages to a
//! [`Paginator`]. The details listing pages through folders first and then files with a
//! single paginator.

use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    FavoriteTarget, File, Folder, ListFilesFilters, ListFoldersFilters, ListSpacesFilters, ParentRef, SortOrder,
    Space,
};
use crate::paginator::Paginator;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock_state<S>(state: &Mutex<S>) -> AppResult<MutexGuard<'_, S>> {
    state
        .lock()
        .map_err(|_| AppError::Internal("listing state mutex poisoned".to_string()))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct SpaceListState {
    pub owner_id: String,
    pub sort: SortOrder,
    pub favorites_only: bool,
    /// Next page the paginator will request.
    pub page: u32,
    pub end_reached: bool,
    pub is_refreshing: bool,
    pub spaces: Vec<Space>,
    pub search_query: String,
    pub search_results: Vec<Space>,
}

pub struct SpaceListing {
    db: Arc<Database>,
    page_size: u32,
    state: Arc<Mutex<SpaceListState>>,
    paginator: Paginator<u32, Space>,
}

impl SpaceListing {
    pub fn new(db: Arc<Database>, owner_id: &str, sort: SortOrder, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let state = Arc::new(Mutex::new(SpaceListState {
            owner_id: owner_id.to_string(),
            sort,
            page: 1,
            ..SpaceListState::default()
        }));

        let loading_state = state.clone();
        let request_state = state.clone();
        let request_db = db.clone();
        let next_state = state.clone();
        let success_state = state.clone();
        let paginator = Paginator::<u32, Space>::new(
            2,
            move |is_loading| {
                if let Ok(mut state) = loading_state.lock() {
                    state.is_refreshing = is_loading;
                }
            },
            move |page| {
                let filters = lock_state(&request_state).map(|state| ListSpacesFilters {
                    owner_id: state.owner_id.clone(),
                    sort: state.sort,
                    page,
                    page_size,
                    query: None,
                    favorites_only: state.favorites_only,
                });
                let db = request_db.clone();
                async move {
                    let filters = filters.map_err(|error| error.to_string())?;
                    db.list_spaces(&filters).map_err(|error| error.to_string())
                }
            },
            move || {
                let next = lock_state(&next_state).map(|state| state.page + 1).unwrap_or(1);
                async move { next }
            },
            move |items: Vec<Space>, next_page: u32| {
                if let Ok(mut state) = success_state.lock() {
                    let fetched = items.len();
                    for space in items {
                        if !state.spaces.iter().any(|existing| existing.id == space.id) {
                            state.spaces.push(space);
                        }
                    }
                    state.page = next_page;
                    state.end_reached = fetched < page_size as usize;
                }
                async {}
            },
        );

        Self {
            db,
            page_size,
            state,
            paginator,
        }
    }

    pub fn snapshot(&self) -> AppResult<SpaceListState> {
        Ok(lock_state(&self.state)?.clone())
    }

    /// Reloads page one and rewinds the paginator.
    pub fn refresh(&self) -> AppResult<()> {
        let filters = {
            let state = lock_state(&self.state)?;
            ListSpacesFilters {
                owner_id: state.owner_id.clone(),
                sort: state.sort,
                page: 1,
                page_size: self.page_size,
                query: None,
                favorites_only: state.favorites_only,
            }
        };
        let spaces = self.db.list_spaces(&filters)?;

        let mut state = lock_state(&self.state)?;
        state.end_reached = spaces.len() < self.page_size as usize;
        state.spaces = spaces;
        state.page = 2;
        drop(state);
        self.paginator.reset();
        Ok(())
    }

    pub async fn load_next(&self) -> AppResult<()> {
        if lock_state(&self.state)?.end_reached {
            return Ok(());
        }
        self.paginator.load_next_items().await;
        Ok(())
    }

    pub fn set_sort(&self, sort: SortOrder) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.sort = sort;
        sort.sort_spaces(&mut state.spaces);
        sort.sort_spaces(&mut state.search_results);
        Ok(())
    }

    pub fn set_favorites_only(&self, favorites_only: bool) -> AppResult<()> {
        lock_state(&self.state)?.favorites_only = favorites_only;
        self.refresh()
    }

    /// Filters loaded spaces first and only asks the store when nothing local matches
    /// and more pages remain.
    pub fn search(&self, query: &str) -> AppResult<Vec<Space>> {
        let (local, end_reached, filters) = {
            let state = lock_state(&self.state)?;
            let local = if query.is_empty() {
                state.spaces.clone()
            } else {
                state
                    .spaces
                    .iter()
                    .filter(|space| contains_ignore_case(&space.name, query))
                    .cloned()
                    .collect::<Vec<_>>()
            };
            let filters = ListSpacesFilters {
                owner_id: state.owner_id.clone(),
                sort: state.sort,
                page: 1,
                page_size: self.page_size,
                query: Some(query.to_string()),
                favorites_only: state.favorites_only,
            };
            (local, state.end_reached, filters)
        };

        let results = if query.is_empty() || !local.is_empty() || end_reached {
            local
        } else {
            let found = self.db.list_spaces(&filters)?;
            let mut state = lock_state(&self.state)?;
            for space in &found {
                if !state.spaces.iter().any(|existing| existing.id == space.id) {
                    state.spaces.push(space.clone());
                }
            }
            let sort = state.sort;
            sort.sort_spaces(&mut state.spaces);
            found
        };

        let mut state = lock_state(&self.state)?;
        state.search_query = query.to_string();
        state.search_results = results.clone();
        Ok(results)
    }

    pub fn toggle_favorite(&self, space_id: i64) -> AppResult<Option<bool>> {
        let toggled = self.db.toggle_favorite(FavoriteTarget::Space(space_id))?;
        if let Some(is_favorite) = toggled {
            let mut state = lock_state(&self.state)?;
            for space in state.spaces.iter_mut().filter(|space| space.id == space_id) {
                space.is_favorite = is_favorite;
            }
            if state.favorites_only && !is_favorite {
                state.spaces.retain(|space| space.id != space_id);
            }
        }
        Ok(toggled)
    }

    pub fn insert(&self, space: Space) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.spaces.retain(|existing| existing.id != space.id);
        state.spaces.push(space);
        let sort = state.sort;
        sort.sort_spaces(&mut state.spaces);
        Ok(())
    }

    pub fn remove(&self, space_ids: &[i64]) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.spaces.retain(|space| !space_ids.contains(&space.id));
        state.search_results.retain(|space| !space_ids.contains(&space.id));
        Ok(())
    }
}

/// Cursor for the combined folder and file pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsCursor {
    Folders(u32),
    Files(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsPage {
    Folders(Vec<Folder>),
    Files(Vec<File>),
}

enum PageRequest {
    Folders(ListFoldersFilters),
    Files(ListFilesFilters),
}

#[derive(Debug, Clone)]
pub struct DetailsListState {
    pub parent: ParentRef,
    pub sort: SortOrder,
    pub favorites_only: bool,
    /// `Some(false)` shows files only: no folder page is fetched.
    pub show_folders: Option<bool>,
    pub folders: Vec<Folder>,
    pub files: Vec<File>,
    pub folder_page: u32,
    pub file_page: u32,
    pub folders_end_reached: bool,
    pub files_end_reached: bool,
    pub is_refreshing: bool,
    pub search_query: String,
    pub folder_search_results: Vec<Folder>,
    pub file_search_results: Vec<File>,
}

impl DetailsListState {
    fn new(parent: ParentRef, sort: SortOrder) -> Self {
        Self {
            parent,
            sort,
            favorites_only: false,
            show_folders: None,
            folders: Vec::new(),
            files: Vec::new(),
            folder_page: 1,
            file_page: 1,
            folders_end_reached: false,
            files_end_reached: false,
            is_refreshing: false,
            search_query: String::new(),
            folder_search_results: Vec::new(),
            file_search_results: Vec::new(),
        }
    }

    /// The page to fetch comes from state, so a cursor left over from the last folder
    /// page or from before a file reload still lands on the right page.
    fn resolve(&self, cursor: DetailsCursor) -> DetailsCursor {
        match cursor {
            DetailsCursor::Folders(_) if !self.folders_end_reached => DetailsCursor::Folders(self.folder_page),
            _ => DetailsCursor::Files(self.file_page),
        }
    }

    fn next_cursor(&self) -> DetailsCursor {
        if self.folders_end_reached {
            DetailsCursor::Files(self.file_page + 1)
        } else {
            DetailsCursor::Folders(self.folder_page + 1)
        }
    }

    fn apply(&mut self, page: DetailsPage, page_size: u32) {
        match page {
            DetailsPage::Folders(folders) => {
                self.folders_end_reached = folders.len() < page_size as usize;
                for folder in folders {
                    if !self.folders.iter().any(|existing| existing.id == folder.id) {
                        self.folders.push(folder);
                    }
                }
                self.folder_page += 1;
            }
            DetailsPage::Files(files) => {
                self.files_end_reached = files.len() < page_size as usize;
                for file in files {
                    if !self.files.iter().any(|existing| existing.id == file.id) {
                        self.files.push(file);
                    }
                }
                self.file_page += 1;
            }
        }
    }

    fn folder_filters(&self, page: u32, page_size: u32, query: Option<String>) -> ListFoldersFilters {
        ListFoldersFilters {
            parent: self.parent,
            sort: self.sort,
            page,
            page_size,
            query,
        }
    }

    fn file_filters(&self, page: u32, page_size: u32, query: Option<String>) -> ListFilesFilters {
        ListFilesFilters {
            parent: self.parent,
            sort: self.sort,
            page,
            page_size,
            query,
            favorites_only: self.favorites_only,
        }
    }
}

pub struct DetailsListing {
    db: Arc<Database>,
    page_size: u32,
    state: Arc<Mutex<DetailsListState>>,
    paginator: Paginator<DetailsCursor, DetailsPage>,
}

impl DetailsListing {
    pub fn new(db: Arc<Database>, parent: ParentRef, sort: SortOrder, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let state = Arc::new(Mutex::new(DetailsListState::new(parent, sort)));

        let loading_state = state.clone();
        let request_state = state.clone();
        let request_db = db.clone();
        let next_state = state.clone();
        let success_state = state.clone();
        let paginator = Paginator::<DetailsCursor, DetailsPage>::new(
            DetailsCursor::Folders(2),
            move |is_loading| {
                if let Ok(mut state) = loading_state.lock() {
                    state.is_refreshing = is_loading;
                }
            },
            move |cursor| {
                let request = lock_state(&request_state).map(|state| match state.resolve(cursor) {
                    DetailsCursor::Folders(page) => PageRequest::Folders(state.folder_filters(page, page_size, None)),
                    DetailsCursor::Files(page) => PageRequest::Files(state.file_filters(page, page_size, None)),
                });
                let db = request_db.clone();
                async move {
                    let page = match request.map_err(|error| error.to_string())? {
                        PageRequest::Folders(filters) => {
                            DetailsPage::Folders(db.list_folders(&filters).map_err(|error| error.to_string())?)
                        }
                        PageRequest::Files(filters) => {
                            DetailsPage::Files(db.list_files(&filters).map_err(|error| error.to_string())?)
                        }
                    };
                    Ok(vec![page])
                }
            },
            move || {
                let next = lock_state(&next_state)
                    .map(|state| state.next_cursor())
                    .unwrap_or(DetailsCursor::Folders(1));
                async move { next }
            },
            move |pages: Vec<DetailsPage>, _: DetailsCursor| {
                if let Ok(mut state) = success_state.lock() {
                    for page in pages {
                        state.apply(page, page_size);
                    }
                }
                async {}
            },
        );

        Self {
            db,
            page_size,
            state,
            paginator,
        }
    }

    pub fn snapshot(&self) -> AppResult<DetailsListState> {
        Ok(lock_state(&self.state)?.clone())
    }

    pub fn parent(&self) -> AppResult<ParentRef> {
        Ok(lock_state(&self.state)?.parent)
    }

    /// Reloads the first folder page, plus the first file page when folders already
    /// fit on one page or folders are hidden.
    pub fn refresh(&self) -> AppResult<()> {
        let (folder_filters, file_filters, show_folders) = {
            let state = lock_state(&self.state)?;
            (
                state.folder_filters(1, self.page_size, None),
                state.file_filters(1, self.page_size, None),
                state.show_folders,
            )
        };

        let folders = if show_folders == Some(false) {
            Vec::new()
        } else {
            self.db.list_folders(&folder_filters)?
        };
        let folders_end_reached = show_folders == Some(false) || folders.len() < self.page_size as usize;
        let files = if folders_end_reached {
            Some(self.db.list_files(&file_filters)?)
        } else {
            None
        };

        let mut state = lock_state(&self.state)?;
        state.folders = folders;
        state.folder_page = 2;
        state.folders_end_reached = folders_end_reached;
        match files {
            Some(files) => {
                state.files_end_reached = files.len() < self.page_size as usize;
                state.files = files;
                state.file_page = 2;
            }
            None => {
                state.files = Vec::new();
                state.file_page = 1;
                state.files_end_reached = false;
            }
        }
        drop(state);
        self.paginator.reset();
        Ok(())
    }

    pub async fn load_next(&self) -> AppResult<()> {
        {
            let state = lock_state(&self.state)?;
            if state.folders_end_reached && state.files_end_reached {
                return Ok(());
            }
        }
        self.paginator.load_next_items().await;
        Ok(())
    }

    /// Reloads only the files, e.g. after the favorites filter changes.
    pub fn refresh_files(&self) -> AppResult<()> {
        let filters = lock_state(&self.state)?.file_filters(1, self.page_size, None);
        let files = self.db.list_files(&filters)?;

        let mut state = lock_state(&self.state)?;
        let matches = if state.search_query.is_empty() {
            Vec::new()
        } else {
            files
                .iter()
                .filter(|file| contains_ignore_case(&file.title, &state.search_query))
                .cloned()
                .collect()
        };
        state.files_end_reached = files.len() < self.page_size as usize;
        state.file_page = 2;
        state.file_search_results = matches;
        state.files = files;
        Ok(())
    }

    pub fn set_favorites_only(&self, favorites_only: bool) -> AppResult<()> {
        lock_state(&self.state)?.favorites_only = favorites_only;
        self.refresh_files()
    }

    pub fn set_show_folders(&self, show_folders: Option<bool>) -> AppResult<()> {
        {
            let mut state = lock_state(&self.state)?;
            state.show_folders = show_folders;
            if show_folders == Some(true) {
                state.favorites_only = false;
            }
        }
        self.refresh()
    }

    pub fn set_sort(&self, sort: SortOrder) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.sort = sort;
        sort.sort_folders(&mut state.folders);
        sort.sort_files(&mut state.files);
        Ok(())
    }

    pub fn search(&self, query: &str) -> AppResult<(Vec<Folder>, Vec<File>)> {
        let (folders, files, files_end_reached, folder_filters, file_filters) = {
            let state = lock_state(&self.state)?;
            let folders = state
                .folders
                .iter()
                .filter(|folder| contains_ignore_case(&folder.name, query))
                .cloned()
                .collect::<Vec<_>>();
            let files = state
                .files
                .iter()
                .filter(|file| contains_ignore_case(&file.title, query))
                .cloned()
                .collect::<Vec<_>>();
            (
                folders,
                files,
                state.files_end_reached,
                state.folder_filters(1, self.page_size, Some(query.to_string())),
                state.file_filters(1, self.page_size, Some(query.to_string())),
            )
        };

        let (folders, files) =
            if query.is_empty() || files_end_reached || !folders.is_empty() || !files.is_empty() {
                (folders, files)
            } else {
                let found_folders = self.db.list_folders(&folder_filters)?;
                let found_files = self.db.list_files(&file_filters)?;
                let mut state = lock_state(&self.state)?;
                for folder in &found_folders {
                    if !state.folders.iter().any(|existing| existing.id == folder.id) {
                        state.folders.push(folder.clone());
                    }
                }
                for file in &found_files {
                    if !state.files.iter().any(|existing| existing.id == file.id) {
                        state.files.push(file.clone());
                    }
                }
                let sort = state.sort;
                sort.sort_folders(&mut state.folders);
                sort.sort_files(&mut state.files);
                (found_folders, found_files)
            };

        let mut state = lock_state(&self.state)?;
        state.search_query = query.to_string();
        state.folder_search_results = folders.clone();
        state.file_search_results = files.clone();
        Ok((folders, files))
    }

    pub fn toggle_file_favorite(&self, file_id: i64) -> AppResult<Option<bool>> {
        let toggled = self.db.toggle_favorite(FavoriteTarget::File(file_id))?;
        if let Some(is_favorite) = toggled {
            let mut state = lock_state(&self.state)?;
            for file in state.files.iter_mut().filter(|file| file.id == file_id) {
                file.is_favorite = is_favorite;
            }
        }
        Ok(toggled)
    }

    pub fn insert_folder(&self, folder: Folder) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.folders.retain(|existing| existing.id != folder.id);
        state.folders.push(folder);
        let sort = state.sort;
        sort.sort_folders(&mut state.folders);
        Ok(())
    }

    pub fn insert_file(&self, file: File) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.files.retain(|existing| existing.id != file.id);
        state.files.push(file);
        let sort = state.sort;
        sort.sort_files(&mut state.files);
        Ok(())
    }

    pub fn remove(&self, folder_ids: &[i64], file_ids: &[i64]) -> AppResult<()> {
        let mut state = lock_state(&self.state)?;
        state.folders.retain(|folder| !folder_ids.contains(&folder.id));
        state.files.retain(|file| !file_ids.contains(&file.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DetailsCursor, DetailsListing, SpaceListing};
    use crate::db::Database;
    use crate::models::{ParentRef, SortOrder};
    use std::sync::Arc;

    fn seeded_spaces(count: i64) -> Arc<Database> {
        let db = Arc::new(Database::in_memory().expect("db"));
        for index in 1..=count {
            db.create_space(&format!("space-{index:02}"), "owner", index).expect("space");
        }
        db
    }

    #[tokio::test]
    async fn space_listing_pages_until_short_page() {
        let db = seeded_spaces(5);
        let listing = SpaceListing::new(db, "owner", SortOrder::CreatedAtAsc, 2);
        listing.refresh().expect("refresh");
        assert_eq!(listing.snapshot().expect("state").spaces.len(), 2);

        listing.load_next().await.expect("page two");
        listing.load_next().await.expect("page three");
        let state = listing.snapshot().expect("state");
        assert_eq!(state.spaces.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert!(state.end_reached);
        assert!(!state.is_refreshing);

        listing.load_next().await.expect("past the end");
        assert_eq!(listing.snapshot().expect("state").spaces.len(), 5);
    }

    #[tokio::test]
    async fn space_search_falls_back_to_store_when_nothing_is_loaded() {
        let db = seeded_spaces(6);
        let listing = SpaceListing::new(db, "owner", SortOrder::CreatedAtAsc, 2);
        listing.refresh().expect("refresh");

        let hits = listing.search("SPACE-06").expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 6);
        let state = listing.snapshot().expect("state");
        assert!(state.spaces.iter().any(|space| space.id == 6));
        assert_eq!(state.search_query, "SPACE-06");

        let local = listing.search("space-01").expect("local search");
        assert_eq!(local.len(), 1);
    }

    #[tokio::test]
    async fn favorites_only_listing_drops_unfavorited_space() {
        let db = seeded_spaces(3);
        db.toggle_favorite(crate::models::FavoriteTarget::Space(2)).expect("favorite");
        let listing = SpaceListing::new(db, "owner", SortOrder::default(), 10);
        listing.set_favorites_only(true).expect("favorites");
        assert_eq!(listing.snapshot().expect("state").spaces.len(), 1);

        assert_eq!(listing.toggle_favorite(2).expect("toggle"), Some(false));
        assert!(listing.snapshot().expect("state").spaces.is_empty());
    }

    #[tokio::test]
    async fn details_listing_switches_from_folders_to_files() {
        let db = Arc::new(Database::in_memory().expect("db"));
        let space = db.create_space("S", "owner", 1).expect("space");
        let parent = ParentRef::Space(space.id);
        for index in 0..3 {
            db.create_folder(parent, &format!("folder-{index}"), 10 + index).expect("folder");
        }
        for index in 0..3 {
            db.create_file(parent, "f", &format!("file-{index}"), "d", 20 + index).expect("file");
        }

        let listing = DetailsListing::new(db, parent, SortOrder::CreatedAtAsc, 2);
        listing.refresh().expect("refresh");
        let state = listing.snapshot().expect("state");
        assert_eq!(state.folders.len(), 2);
        assert!(state.files.is_empty());
        assert!(!state.folders_end_reached);

        listing.load_next().await.expect("folder page two");
        let state = listing.snapshot().expect("state");
        assert_eq!(state.folders.len(), 3);
        assert!(state.folders_end_reached);

        listing.load_next().await.expect("file page one");
        listing.load_next().await.expect("file page two");
        let state = listing.snapshot().expect("state");
        assert_eq!(state.files.len(), 3);
        assert!(state.files_end_reached);
        assert_eq!(state.file_page, 3);
        assert_eq!(listing.paginator.current_key(), DetailsCursor::Files(3));
    }

    #[tokio::test]
    async fn details_refresh_loads_files_when_folders_fit_one_page() {
        let db = Arc::new(Database::in_memory().expect("db"));
        let space = db.create_space("S", "owner", 1).expect("space");
        let parent = ParentRef::Space(space.id);
        db.create_folder(parent, "only", 2).expect("folder");
        let file = db.create_file(parent, "f", "Notes", "d", 3).expect("file");

        let listing = DetailsListing::new(db, parent, SortOrder::default(), 10);
        listing.refresh().expect("refresh");
        let state = listing.snapshot().expect("state");
        assert_eq!(state.folders.len(), 1);
        assert_eq!(state.files.len(), 1);
        assert!(state.folders_end_reached && state.files_end_reached);

        assert_eq!(listing.toggle_file_favorite(file.id).expect("toggle"), Some(true));
        listing.set_favorites_only(true).expect("favorites");
        assert_eq!(listing.snapshot().expect("state").files.len(), 1);

        let (folders, files) = listing.search("note").expect("search");
        assert!(folders.is_empty());
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn favorites_filter_change_restarts_file_paging() {
        let db = Arc::new(Database::in_memory().expect("db"));
        let space = db.create_space("S", "owner", 1).expect("space");
        let parent = ParentRef::Space(space.id);
        for index in 0..9 {
            let file = db
                .create_file(parent, "f", &format!("file-{index}"), "d", 10 + index)
                .expect("file");
            db.toggle_favorite(crate::models::FavoriteTarget::File(file.id)).expect("favorite");
        }

        let listing = DetailsListing::new(db, parent, SortOrder::CreatedAtAsc, 2);
        listing.refresh().expect("refresh");
        listing.load_next().await.expect("file page two");
        listing.load_next().await.expect("file page three");
        assert_eq!(listing.snapshot().expect("state").files.len(), 6);

        listing.set_favorites_only(true).expect("favorites");
        listing.load_next().await.expect("file page two again");
        let titles = listing
            .snapshot()
            .expect("state")
            .files
            .iter()
            .map(|file| file.title.clone())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["file-0", "file-1", "file-2", "file-3"]);
    }

    #[tokio::test]
    async fn hidden_folders_are_never_fetched() {
        let db = Arc::new(Database::in_memory().expect("db"));
        let space = db.create_space("S", "owner", 1).expect("space");
        let parent = ParentRef::Space(space.id);
        for index in 0..3 {
            db.create_folder(parent, &format!("folder-{index}"), 10 + index).expect("folder");
            db.create_file(parent, "f", &format!("file-{index}"), "d", 20 + index).expect("file");
        }

        let listing = DetailsListing::new(db, parent, SortOrder::CreatedAtAsc, 2);
        listing.set_show_folders(Some(false)).expect("files only");
        let state = listing.snapshot().expect("state");
        assert!(state.folders.is_empty());
        assert!(state.folders_end_reached);
        assert_eq!(state.files.len(), 2);

        listing.load_next().await.expect("file page two");
        let state = listing.snapshot().expect("state");
        assert!(state.folders.is_empty());
        assert_eq!(state.files.len(), 3);
        assert!(state.files_end_reached);

        listing.set_show_folders(None).expect("show folders");
        assert_eq!(listing.snapshot().expect("state").folders.len(), 2);
    }
}
