use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub view_count: i64,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub is_root_parent: bool,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub view_count: i64,
}

impl Folder {
    pub fn parent(&self) -> Option<ParentRef> {
        ParentRef::from_columns(self.parent_id, self.is_root_parent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub is_root_parent: bool,
    pub file_name: String,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub view_count: i64,
    pub is_favorite: bool,
}

impl File {
    pub fn parent(&self) -> Option<ParentRef> {
        ParentRef::from_columns(self.parent_id, self.is_root_parent)
    }
}

/// Typed form of the `(parent_id, is_root_parent)` column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum ParentRef {
    Space(i64),
    Folder(i64),
}

impl ParentRef {
    pub fn from_columns(parent_id: Option<i64>, is_root_parent: bool) -> Option<Self> {
        parent_id.map(|id| if is_root_parent { Self::Space(id) } else { Self::Folder(id) })
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Space(id) | Self::Folder(id) => id,
        }
    }

    pub fn is_root_parent(self) -> bool {
        matches!(self, Self::Space(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Space,
    Folder,
    File,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::Space => "spaces",
            Self::Folder => "folders",
            Self::File => "files",
        }
    }
}

/// Folders carry no favorite flag, so only these two can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum FavoriteTarget {
    Space(i64),
    File(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "NAME_ASC")]
    NameAsc,
    #[serde(rename = "NAME_DES")]
    NameDesc,
    #[serde(rename = "CREATED_AT_ASC")]
    CreatedAtAsc,
    #[serde(rename = "CREATED_AT_DES")]
    CreatedAtDesc,
    #[serde(rename = "UPDATED_AT_ASC")]
    UpdatedAtAsc,
    #[default]
    #[serde(rename = "UPDATED_AT_DES")]
    UpdatedAtDesc,
    #[serde(rename = "COUNT_ASC")]
    ViewCountAsc,
    #[serde(rename = "COUNT_DES")]
    ViewCountDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortField {
    Name,
    CreatedAt,
    UpdatedAt,
    ViewCount,
}

impl SortOrder {
    pub const ALL: [SortOrder; 8] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::CreatedAtAsc,
        Self::CreatedAtDesc,
        Self::UpdatedAtAsc,
        Self::UpdatedAtDesc,
        Self::ViewCountAsc,
        Self::ViewCountDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "NAME_ASC",
            Self::NameDesc => "NAME_DES",
            Self::CreatedAtAsc => "CREATED_AT_ASC",
            Self::CreatedAtDesc => "CREATED_AT_DES",
            Self::UpdatedAtAsc => "UPDATED_AT_ASC",
            Self::UpdatedAtDesc => "UPDATED_AT_DES",
            Self::ViewCountAsc => "COUNT_ASC",
            Self::ViewCountDesc => "COUNT_DES",
        }
    }

    /// Unknown names fall back to the default order.
    pub fn parse(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == raw)
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name ASC",
            Self::NameDesc => "Name DES",
            Self::CreatedAtAsc => "Created At ASC",
            Self::CreatedAtDesc => "Created At DES",
            Self::UpdatedAtAsc => "Updated At ASC",
            Self::UpdatedAtDesc => "Updated At DES",
            Self::ViewCountAsc => "View Count ASC",
            Self::ViewCountDesc => "View Count DES",
        }
    }

    pub fn options(selected: SortOrder) -> Vec<SortOption> {
        Self::ALL
            .into_iter()
            .map(|order| SortOption {
                label: order.label().to_string(),
                value: order,
                is_selected: order == selected,
            })
            .collect()
    }

    pub fn is_ascending(self) -> bool {
        matches!(
            self,
            Self::NameAsc | Self::CreatedAtAsc | Self::UpdatedAtAsc | Self::ViewCountAsc
        )
    }

    fn field(self) -> SortField {
        match self {
            Self::NameAsc | Self::NameDesc => SortField::Name,
            Self::CreatedAtAsc | Self::CreatedAtDesc => SortField::CreatedAt,
            Self::UpdatedAtAsc | Self::UpdatedAtDesc => SortField::UpdatedAt,
            Self::ViewCountAsc | Self::ViewCountDesc => SortField::ViewCount,
        }
    }

    /// `ORDER BY` body; `name_column` is `name` for spaces and folders and `title` for files.
    pub fn order_by(self, name_column: &str) -> String {
        let column = match self.field() {
            SortField::Name => name_column,
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::ViewCount => "view_count",
        };
        let direction = if self.is_ascending() { "ASC" } else { "DESC" };
        format!("{column} {direction}, id {direction}")
    }

    fn compare(self, left: SortKey<'_>, right: SortKey<'_>) -> Ordering {
        let ordering = match self.field() {
            SortField::Name => left.name.cmp(right.name),
            SortField::CreatedAt => left.created_at.cmp(&right.created_at),
            SortField::UpdatedAt => left.updated_at.cmp(&right.updated_at),
            SortField::ViewCount => left.view_count.cmp(&right.view_count),
        }
        .then(left.id.cmp(&right.id));
        if self.is_ascending() {
            ordering
        } else {
            ordering.reverse()
        }
    }

    pub fn sort_spaces(self, spaces: &mut [Space]) {
        spaces.sort_by(|a, b| self.compare(SortKey::space(a), SortKey::space(b)));
    }

    pub fn sort_folders(self, folders: &mut [Folder]) {
        folders.sort_by(|a, b| self.compare(SortKey::folder(a), SortKey::folder(b)));
    }

    pub fn sort_files(self, files: &mut [File]) {
        files.sort_by(|a, b| self.compare(SortKey::file(a), SortKey::file(b)));
    }
}

struct SortKey<'a> {
    id: i64,
    name: &'a str,
    created_at: i64,
    updated_at: i64,
    view_count: i64,
}

impl<'a> SortKey<'a> {
    fn space(space: &'a Space) -> Self {
        Self {
            id: space.id,
            name: &space.name,
            created_at: space.created_at,
            updated_at: space.updated_at,
            view_count: space.view_count,
        }
    }

    fn folder(folder: &'a Folder) -> Self {
        Self {
            id: folder.id,
            name: &folder.name,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
            view_count: folder.view_count,
        }
    }

    fn file(file: &'a File) -> Self {
        Self {
            id: file.id,
            name: &file.title,
            created_at: file.created_at,
            updated_at: file.updated_at,
            view_count: file.view_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOption {
    pub label: String,
    pub value: SortOrder,
    pub is_selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSpacesFilters {
    pub owner_id: String,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: u32,
    pub page_size: u32,
    pub query: Option<String>,
    #[serde(default)]
    pub favorites_only: bool,
}

impl ListSpacesFilters {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            sort: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            favorites_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFoldersFilters {
    pub parent: ParentRef,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: u32,
    pub page_size: u32,
    pub query: Option<String>,
}

impl ListFoldersFilters {
    pub fn new(parent: ParentRef) -> Self {
        Self {
            parent,
            sort: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesFilters {
    pub parent: ParentRef,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: u32,
    pub page_size: u32,
    pub query: Option<String>,
    #[serde(default)]
    pub favorites_only: bool,
}

impl ListFilesFilters {
    pub fn new(parent: ParentRef) -> Self {
        Self {
            parent,
            sort: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            favorites_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub spaces: usize,
    pub folders: usize,
    pub files: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildCounts {
    pub folders: usize,
    pub files: usize,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `dd/MM/yyyy hh:mm:ss AM` in UTC, or `N/A` when there is no timestamp.
pub fn format_timestamp(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.format("%d/%m/%Y %I:%M:%S %p").to_string().to_uppercase())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Placeholder used wherever a looked-up record turned out to be absent.
pub fn display_or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(id: i64, name: &str, updated_at: i64, view_count: i64) -> Space {
        Space {
            id,
            owner_id: "u".to_string(),
            name: name.to_string(),
            created_at: id,
            updated_at,
            view_count,
            is_favorite: false,
        }
    }

    #[test]
    fn sort_order_parses_persisted_names_and_defaults() {
        assert_eq!(SortOrder::parse("NAME_DES"), SortOrder::NameDesc);
        assert_eq!(SortOrder::parse("COUNT_ASC"), SortOrder::ViewCountAsc);
        assert_eq!(SortOrder::parse(""), SortOrder::UpdatedAtDesc);
        assert_eq!(SortOrder::parse("bogus"), SortOrder::UpdatedAtDesc);
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::parse(order.as_str()), order);
        }
    }

    #[test]
    fn sort_order_serializes_with_persisted_names() {
        let raw = serde_json::to_string(&SortOrder::CreatedAtDesc).expect("serialize");
        assert_eq!(raw, "\"CREATED_AT_DES\"");
    }

    #[test]
    fn options_mark_only_the_selected_order() {
        let options = SortOrder::options(SortOrder::NameAsc);
        assert_eq!(options.len(), 8);
        assert_eq!(options.iter().filter(|option| option.is_selected).count(), 1);
        assert_eq!(options[0].label, "Name ASC");
        assert!(options[0].is_selected);
    }

    #[test]
    fn order_by_uses_name_column_and_id_tiebreak() {
        assert_eq!(SortOrder::NameAsc.order_by("title"), "title ASC, id ASC");
        assert_eq!(SortOrder::ViewCountDesc.order_by("name"), "view_count DESC, id DESC");
    }

    #[test]
    fn in_memory_sort_matches_requested_order() {
        let mut spaces = vec![space(1, "b", 10, 3), space(2, "a", 30, 1), space(3, "c", 20, 2)];

        SortOrder::UpdatedAtDesc.sort_spaces(&mut spaces);
        assert_eq!(spaces.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        SortOrder::NameAsc.sort_spaces(&mut spaces);
        assert_eq!(spaces.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        SortOrder::ViewCountAsc.sort_spaces(&mut spaces);
        assert_eq!(spaces.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn parent_ref_round_trips_through_columns() {
        assert_eq!(ParentRef::from_columns(Some(4), true), Some(ParentRef::Space(4)));
        assert_eq!(ParentRef::from_columns(Some(4), false), Some(ParentRef::Folder(4)));
        assert_eq!(ParentRef::from_columns(None, true), None);
        assert!(ParentRef::Space(1).is_root_parent());
        assert_eq!(ParentRef::Folder(9).id(), 9);
    }

    #[test]
    fn timestamps_format_or_fall_back_to_placeholder() {
        assert_eq!(format_timestamp(Some(0)), "01/01/1970 12:00:00 AM");
        assert_eq!(format_timestamp(Some(13 * 3_600_000 + 5_000)), "01/01/1970 01:00:05 PM");
        assert_eq!(format_timestamp(None), "N/A");
        assert_eq!(display_or_placeholder(None), "N/A");
        assert_eq!(display_or_placeholder(Some("  ")), "N/A");
        assert_eq!(display_or_placeholder(Some("Work")), "Work");
    }
}
