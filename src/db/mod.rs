use crate::errors::{AppError, AppResult};
use crate::models::{
    ChildCounts, DeleteSummary, EntityKind, FavoriteTarget, File, Folder, ListFilesFilters, ListFoldersFilters,
    ListSpacesFilters, ParentRef, Space,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("schema.sql");

const SPACE_COLUMNS: &str = "id, owner_id, name, created_at, updated_at, view_count, is_favorite";
const FOLDER_COLUMNS: &str = "id, parent_id, is_root_parent, name, created_at, updated_at, view_count";
const FILE_COLUMNS: &str =
    "id, parent_id, is_root_parent, file_name, title, description, created_at, updated_at, view_count, is_favorite";

const SPACE_DETAILS_TITLE: &str = "Space Details";
const FOLDER_DETAILS_TITLE: &str = "Folder Details";

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::from)?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> AppResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&conn)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn connection(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    pub fn list_spaces(&self, filters: &ListSpacesFilters) -> AppResult<Vec<Space>> {
        let conn = self.connection()?;
        let mut query = format!("SELECT {SPACE_COLUMNS} FROM spaces WHERE owner_id = ?");
        let mut params_vec: Vec<Value> = vec![Value::Text(filters.owner_id.clone())];

        if filters.favorites_only {
            query.push_str(" AND is_favorite = 1");
        }
        let search = non_empty_query(filters.query.as_deref());
        if let Some(search) = search {
            query.push_str(" AND lower_unicode(name) LIKE ? ESCAPE '\\'");
            params_vec.push(Value::Text(like_pattern(search)));
        }

        query.push_str(" ORDER BY ");
        query.push_str(&filters.sort.order_by("name"));
        if search.is_none() {
            push_window(&mut query, &mut params_vec, filters.page, filters.page_size);
        }

        let mut statement = conn.prepare(&query)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), parse_space_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn list_folders(&self, filters: &ListFoldersFilters) -> AppResult<Vec<Folder>> {
        let conn = self.connection()?;
        let mut query = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id = ? AND is_root_parent = ?");
        let mut params_vec: Vec<Value> = vec![
            Value::Integer(filters.parent.id()),
            Value::Integer(i64::from(filters.parent.is_root_parent())),
        ];

        let search = non_empty_query(filters.query.as_deref());
        if let Some(search) = search {
            query.push_str(" AND lower_unicode(name) LIKE ? ESCAPE '\\'");
            params_vec.push(Value::Text(like_pattern(search)));
        }

        query.push_str(" ORDER BY ");
        query.push_str(&filters.sort.order_by("name"));
        if search.is_none() {
            push_window(&mut query, &mut params_vec, filters.page, filters.page_size);
        }

        let mut statement = conn.prepare(&query)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), parse_folder_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Files are searched and name-sorted by `title`, the field the file list displays.
    pub fn list_files(&self, filters: &ListFilesFilters) -> AppResult<Vec<File>> {
        let conn = self.connection()?;
        let mut query = format!("SELECT {FILE_COLUMNS} FROM files WHERE parent_id = ? AND is_root_parent = ?");
        let mut params_vec: Vec<Value> = vec![
            Value::Integer(filters.parent.id()),
            Value::Integer(i64::from(filters.parent.is_root_parent())),
        ];

        if filters.favorites_only {
            query.push_str(" AND is_favorite = 1");
        }
        let search = non_empty_query(filters.query.as_deref());
        if let Some(search) = search {
            query.push_str(" AND lower_unicode(title) LIKE ? ESCAPE '\\'");
            params_vec.push(Value::Text(like_pattern(search)));
        }

        query.push_str(" ORDER BY ");
        query.push_str(&filters.sort.order_by("title"));
        if search.is_none() {
            push_window(&mut query, &mut params_vec, filters.page, filters.page_size);
        }

        let mut statement = conn.prepare(&query)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), parse_file_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn get_space(&self, id: i64) -> AppResult<Option<Space>> {
        let conn = self.connection()?;
        fetch_space(&conn, id).map_err(AppError::from)
    }

    pub fn get_folder(&self, id: i64) -> AppResult<Option<Folder>> {
        let conn = self.connection()?;
        fetch_folder(&conn, id).map_err(AppError::from)
    }

    pub fn get_file(&self, id: i64) -> AppResult<Option<File>> {
        let conn = self.connection()?;
        fetch_file(&conn, id).map_err(AppError::from)
    }

    /// Screen title for a parent, with a generic fallback when the record is gone.
    pub fn title_for(&self, parent: ParentRef) -> AppResult<String> {
        let conn = self.connection()?;
        let title = match parent {
            ParentRef::Space(id) => fetch_space(&conn, id)?
                .map(|space| space.name)
                .unwrap_or_else(|| SPACE_DETAILS_TITLE.to_string()),
            ParentRef::Folder(id) => fetch_folder(&conn, id)?
                .map(|folder| folder.name)
                .unwrap_or_else(|| FOLDER_DETAILS_TITLE.to_string()),
        };
        Ok(title)
    }

    pub fn count_children(&self, parent: ParentRef) -> AppResult<ChildCounts> {
        let conn = self.connection()?;
        let folders: i64 = conn.query_row(
            "SELECT COUNT(1) FROM folders WHERE parent_id = ?1 AND is_root_parent = ?2",
            params![parent.id(), parent.is_root_parent()],
            |row| row.get(0),
        )?;
        let files: i64 = conn.query_row(
            "SELECT COUNT(1) FROM files WHERE parent_id = ?1 AND is_root_parent = ?2",
            params![parent.id(), parent.is_root_parent()],
            |row| row.get(0),
        )?;
        Ok(ChildCounts {
            folders: usize::try_from(folders).unwrap_or_default(),
            files: usize::try_from(files).unwrap_or_default(),
        })
    }

    /// Chain of existing ancestors starting at `parent`, nearest first, ending at the owning space.
    pub fn ancestor_chain(&self, parent: ParentRef) -> AppResult<Vec<ParentRef>> {
        let conn = self.connection()?;
        ancestor_chain_with_conn(&conn, parent).map_err(AppError::from)
    }

    pub fn create_space(&self, name: &str, owner_id: &str, now: i64) -> AppResult<Space> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let id = next_id(&tx, EntityKind::Space)?;
        let name = name.trim();
        tx.execute(
            "INSERT INTO spaces (id, owner_id, name, created_at, updated_at, view_count, is_favorite)
             VALUES (?1, ?2, ?3, ?4, ?4, 0, 0)",
            params![id, owner_id, name, now],
        )?;
        tx.commit()?;
        tracing::debug!(space_id = id, "space created");

        Ok(Space {
            id,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            view_count: 0,
            is_favorite: false,
        })
    }

    pub fn create_folder(&self, parent: ParentRef, name: &str, now: i64) -> AppResult<Folder> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        require_parent(&tx, parent)?;
        let id = next_id(&tx, EntityKind::Folder)?;
        let name = name.trim();
        tx.execute(
            "INSERT INTO folders (id, parent_id, is_root_parent, name, created_at, updated_at, view_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0)",
            params![id, parent.id(), parent.is_root_parent(), name, now],
        )?;
        propagate_updated_at(&tx, parent, now)?;
        tx.commit()?;
        tracing::debug!(folder_id = id, parent = ?parent, "folder created");

        Ok(Folder {
            id,
            parent_id: Some(parent.id()),
            is_root_parent: parent.is_root_parent(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            view_count: 0,
        })
    }

    pub fn create_file(
        &self,
        parent: ParentRef,
        file_name: &str,
        title: &str,
        description: &str,
        now: i64,
    ) -> AppResult<File> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        require_parent(&tx, parent)?;
        let id = next_id(&tx, EntityKind::File)?;
        let (file_name, title, description) = (file_name.trim(), title.trim(), description.trim());
        tx.execute(
            "INSERT INTO files (
               id, parent_id, is_root_parent, file_name, title, description, created_at, updated_at, view_count, is_favorite
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 0, 0)",
            params![id, parent.id(), parent.is_root_parent(), file_name, title, description, now],
        )?;
        propagate_updated_at(&tx, parent, now)?;
        tx.commit()?;
        tracing::debug!(file_id = id, parent = ?parent, "file created");

        Ok(File {
            id,
            parent_id: Some(parent.id()),
            is_root_parent: parent.is_root_parent(),
            file_name: file_name.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
            view_count: 0,
            is_favorite: false,
        })
    }

    /// Returns `None` without touching anything when the file does not exist.
    pub fn update_file(
        &self,
        id: i64,
        file_name: &str,
        title: &str,
        description: &str,
        now: i64,
    ) -> AppResult<Option<File>> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE files SET file_name = ?1, title = ?2, description = ?3, updated_at = ?4 WHERE id = ?5",
            params![file_name.trim(), title.trim(), description.trim(), now, id],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        let updated = fetch_file(&tx, id)?;
        if let Some(parent) = updated.as_ref().and_then(File::parent) {
            propagate_updated_at(&tx, parent, now)?;
        }
        tx.commit()?;
        tracing::debug!(file_id = id, "file updated");
        Ok(updated)
    }

    /// Flips the favorite flag and returns the new value, or `None` if the record is missing.
    pub fn toggle_favorite(&self, target: FavoriteTarget) -> AppResult<Option<bool>> {
        let conn = self.connection()?;
        let (table, id) = match target {
            FavoriteTarget::Space(id) => (EntityKind::Space.table(), id),
            FavoriteTarget::File(id) => (EntityKind::File.table(), id),
        };
        let sql = format!("UPDATE {table} SET is_favorite = 1 - is_favorite WHERE id = ?1 RETURNING is_favorite");
        conn.query_row(&sql, [id], |row| row.get::<_, bool>(0))
            .optional()
            .map_err(AppError::from)
    }

    /// Returns the new count, or `None` if the record is missing.
    pub fn increment_view_count(&self, kind: EntityKind, id: i64) -> AppResult<Option<i64>> {
        let conn = self.connection()?;
        let sql = format!(
            "UPDATE {} SET view_count = view_count + 1 WHERE id = ?1 RETURNING view_count",
            kind.table()
        );
        conn.query_row(&sql, [id], |row| row.get::<_, i64>(0))
            .optional()
            .map_err(AppError::from)
    }

    pub fn delete_spaces(&self, ids: &[i64]) -> AppResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();
        if ids.is_empty() {
            return Ok(summary);
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        summary.files += execute_for_ids(
            &tx,
            "DELETE FROM files WHERE is_root_parent = 1 AND parent_id IN",
            ids,
        )?;
        let root_folders = select_ids(
            &tx,
            "SELECT id FROM folders WHERE is_root_parent = 1 AND parent_id IN",
            ids,
        )?;
        delete_folder_tree(&tx, root_folders, &mut summary)?;
        summary.spaces += execute_for_ids(&tx, "DELETE FROM spaces WHERE id IN", ids)?;
        tx.commit()?;

        tracing::info!(
            spaces = summary.spaces,
            folders = summary.folders,
            files = summary.files,
            "deleted spaces"
        );
        Ok(summary)
    }

    pub fn delete_folders(&self, ids: &[i64]) -> AppResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();
        if ids.is_empty() {
            return Ok(summary);
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        delete_folder_tree(&tx, ids.to_vec(), &mut summary)?;
        tx.commit()?;

        tracing::info!(folders = summary.folders, files = summary.files, "deleted folders");
        Ok(summary)
    }

    pub fn delete_files(&self, ids: &[i64]) -> AppResult<DeleteSummary> {
        let mut summary = DeleteSummary::default();
        if ids.is_empty() {
            return Ok(summary);
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        summary.files += execute_for_ids(&tx, "DELETE FROM files WHERE id IN", ids)?;
        tx.commit()?;

        tracing::info!(files = summary.files, "deleted files");
        Ok(summary)
    }
}

/// Breadth-first removal: each level drops the files under the frontier, then the frontier
/// folders, then descends into their child folders.
fn delete_folder_tree(tx: &Transaction<'_>, roots: Vec<i64>, summary: &mut DeleteSummary) -> AppResult<()> {
    let mut visited = HashSet::new();
    let mut frontier = roots;

    loop {
        frontier.retain(|id| visited.insert(*id));
        if frontier.is_empty() {
            return Ok(());
        }

        let children = select_ids(
            tx,
            "SELECT id FROM folders WHERE is_root_parent = 0 AND parent_id IN",
            &frontier,
        )?;
        summary.files += execute_for_ids(
            tx,
            "DELETE FROM files WHERE is_root_parent = 0 AND parent_id IN",
            &frontier,
        )?;
        summary.folders += execute_for_ids(tx, "DELETE FROM folders WHERE id IN", &frontier)?;
        frontier = children;
    }
}

fn propagate_updated_at(conn: &Connection, parent: ParentRef, now: i64) -> AppResult<()> {
    for ancestor in ancestor_chain_with_conn(conn, parent)? {
        match ancestor {
            ParentRef::Space(id) => {
                conn.execute("UPDATE spaces SET updated_at = ?1 WHERE id = ?2", params![now, id])?;
            }
            ParentRef::Folder(id) => {
                conn.execute("UPDATE folders SET updated_at = ?1 WHERE id = ?2", params![now, id])?;
            }
        }
    }
    Ok(())
}

fn ancestor_chain_with_conn(conn: &Connection, parent: ParentRef) -> rusqlite::Result<Vec<ParentRef>> {
    let mut current = match parent {
        ParentRef::Space(id) => return Ok(vec![ParentRef::Space(id)]),
        ParentRef::Folder(id) => id,
    };

    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    loop {
        if !visited.insert(current) {
            tracing::warn!(folder_id = current, "folder chain loops back on itself; stopping walk");
            return Ok(chain);
        }

        let row = conn
            .query_row(
                "SELECT parent_id, is_root_parent FROM folders WHERE id = ?1",
                [current],
                |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, bool>(1)?)),
            )
            .optional()?;
        let Some((parent_id, is_root_parent)) = row else {
            tracing::debug!(folder_id = current, "ancestor folder missing; stopping walk");
            return Ok(chain);
        };

        chain.push(ParentRef::Folder(current));
        match (parent_id, is_root_parent) {
            (Some(space_id), true) => {
                chain.push(ParentRef::Space(space_id));
                return Ok(chain);
            }
            (Some(folder_id), false) => current = folder_id,
            (None, _) => return Ok(chain),
        }
    }
}

/// Next id for a record kind. Tracks the highest id ever handed out so deleted ids are never reused.
fn next_id(tx: &Transaction<'_>, kind: EntityKind) -> AppResult<i64> {
    let sql = format!(
        "SELECT MAX(
           COALESCE((SELECT last_id FROM id_sequences WHERE kind = ?1), 0),
           COALESCE((SELECT MAX(id) FROM {}), 0)
         ) + 1",
        kind.table()
    );
    let id: i64 = tx.query_row(&sql, [kind.table()], |row| row.get(0))?;
    tx.execute(
        "INSERT INTO id_sequences (kind, last_id) VALUES (?1, ?2)
         ON CONFLICT(kind) DO UPDATE SET last_id = excluded.last_id",
        params![kind.table(), id],
    )?;
    Ok(id)
}

fn select_ids(conn: &Connection, prefix: &str, ids: &[i64]) -> AppResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{prefix} ({})", placeholders(ids.len()));
    let mut statement = conn.prepare(&sql)?;
    let rows = statement
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn execute_for_ids(conn: &Connection, prefix: &str, ids: &[i64]) -> AppResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!("{prefix} ({})", placeholders(ids.len()));
    Ok(conn.execute(&sql, rusqlite::params_from_iter(ids.iter()))?)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn push_window(query: &mut String, params_vec: &mut Vec<Value>, page: u32, page_size: u32) {
    let page = page.max(1);
    query.push_str(" LIMIT ? OFFSET ?");
    params_vec.push(Value::Integer(i64::from(page_size)));
    params_vec.push(Value::Integer(i64::from(page - 1) * i64::from(page_size)));
}

// SQLite's LIKE only folds ASCII case, so search compares Unicode-lowercased text.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "lower_unicode",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

/// New children may only hang off a space or folder that already exists. The new row's id is
/// always above every existing id, so this also rules out a folder parented to itself.
fn require_parent(tx: &Transaction<'_>, parent: ParentRef) -> AppResult<()> {
    let (table, label) = match parent {
        ParentRef::Space(_) => (EntityKind::Space.table(), "space"),
        ParentRef::Folder(_) => (EntityKind::Folder.table(), "folder"),
    };
    let exists: bool = tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        [parent.id()],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound(format!("parent {label} {} does not exist", parent.id())));
    }
    Ok(())
}

fn non_empty_query(query: Option<&str>) -> Option<&str> {
    query.filter(|query| !query.is_empty())
}

/// `%query%` with LIKE wildcards escaped, lowercased to match `lower_unicode` columns.
fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn fetch_space(conn: &Connection, id: i64) -> rusqlite::Result<Option<Space>> {
    conn.query_row(
        &format!("SELECT {SPACE_COLUMNS} FROM spaces WHERE id = ?1"),
        [id],
        parse_space_row,
    )
    .optional()
}

fn fetch_folder(conn: &Connection, id: i64) -> rusqlite::Result<Option<Folder>> {
    conn.query_row(
        &format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?1"),
        [id],
        parse_folder_row,
    )
    .optional()
}

fn fetch_file(conn: &Connection, id: i64) -> rusqlite::Result<Option<File>> {
    conn.query_row(
        &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
        [id],
        parse_file_row,
    )
    .optional()
}

fn parse_space_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Space> {
    Ok(Space {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        view_count: row.get(5)?,
        is_favorite: row.get(6)?,
    })
}

fn parse_folder_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        is_root_parent: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        view_count: row.get(6)?,
    })
}

fn parse_file_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<File> {
    Ok(File {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        is_root_parent: row.get(2)?,
        file_name: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        view_count: row.get(8)?,
        is_favorite: row.get(9)?,
    })
}
