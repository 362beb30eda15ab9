use myspace_core::{
    Database, FavoriteTarget, ListFilesFilters, ListFoldersFilters, ParentRef, SortOrder,
};

fn open_store() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::new(&dir.path().join("store.sqlite")).expect("open store");
    (dir, db)
}

#[test]
fn work_docs_scenario_propagates_and_cascades() {
    let (_dir, db) = open_store();

    let space = db.create_space("Work", "u1", 100).expect("space");
    assert_eq!(space.id, 1);
    assert_eq!((space.created_at, space.updated_at), (100, 100));

    let folder = db.create_folder(ParentRef::Space(space.id), "Docs", 200).expect("folder");
    assert_eq!(folder.id, 1);
    assert!(folder.is_root_parent);
    assert_eq!(db.get_space(1).expect("get").expect("space").updated_at, 200);

    let file = db
        .create_file(ParentRef::Folder(folder.id), "f.txt", "F", "d", 300)
        .expect("file");
    assert_eq!(file.id, 1);
    assert!(!file.is_root_parent);
    assert_eq!(db.get_folder(1).expect("get").expect("folder").updated_at, 300);
    assert_eq!(db.get_space(1).expect("get").expect("space").updated_at, 300);

    db.delete_folders(&[1]).expect("delete");
    assert!(db.get_folder(1).expect("get").is_none());
    assert!(db.get_file(1).expect("get").is_none());
    assert!(db.get_space(1).expect("get").is_some());
}

#[test]
fn deleting_a_space_leaves_no_descendants() {
    let (_dir, db) = open_store();
    let space = db.create_space("S", "u1", 1).expect("space");
    let other = db.create_space("Other", "u1", 1).expect("other space");

    let mut parent = ParentRef::Space(space.id);
    let mut folder_ids = Vec::new();
    for depth in 0..6 {
        let folder = db.create_folder(parent, &format!("level-{depth}"), 10 + depth).expect("folder");
        db.create_file(ParentRef::Folder(folder.id), "x", &format!("file-{depth}"), "d", 20 + depth)
            .expect("file");
        folder_ids.push(folder.id);
        parent = ParentRef::Folder(folder.id);
    }
    db.create_file(ParentRef::Space(space.id), "root", "root file", "d", 30).expect("root file");
    let kept = db.create_file(ParentRef::Space(other.id), "keep", "kept", "d", 40).expect("kept file");

    let summary = db.delete_spaces(&[space.id]).expect("delete");
    assert_eq!(summary.spaces, 1);
    assert_eq!(summary.folders, 6);
    assert_eq!(summary.files, 7);

    for id in folder_ids {
        assert!(db.get_folder(id).expect("get").is_none());
    }
    assert!(db.get_file(kept.id).expect("get").is_some());
    let remaining = db
        .list_files(&ListFilesFilters::new(ParentRef::Space(other.id)))
        .expect("list");
    assert_eq!(remaining.len(), 1);
}

#[test]
fn deleted_ids_are_not_handed_out_again() {
    let (_dir, db) = open_store();
    db.create_space("a", "u1", 1).expect("a");
    let b = db.create_space("b", "u1", 2).expect("b");
    db.delete_spaces(&[b.id]).expect("delete");
    let c = db.create_space("c", "u1", 3).expect("c");
    assert_eq!(c.id, 3);
}

#[test]
fn favorite_toggled_twice_is_restored() {
    let (_dir, db) = open_store();
    let space = db.create_space("S", "u1", 1).expect("space");
    let file = db.create_file(ParentRef::Space(space.id), "f", "t", "d", 2).expect("file");

    assert_eq!(db.toggle_favorite(FavoriteTarget::File(file.id)).expect("on"), Some(true));
    assert_eq!(db.toggle_favorite(FavoriteTarget::File(file.id)).expect("off"), Some(false));
    assert!(!db.get_file(file.id).expect("get").expect("file").is_favorite);
    assert_eq!(db.toggle_favorite(FavoriteTarget::File(404)).expect("missing"), None);
}

#[test]
fn store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("store.sqlite");
    {
        let db = Database::new(&path).expect("open");
        let space = db.create_space("S", "u1", 1).expect("space");
        db.create_folder(ParentRef::Space(space.id), "B", 2).expect("folder");
        db.create_folder(ParentRef::Space(space.id), "a", 3).expect("folder");
    }

    let db = Database::new(&path).expect("reopen");
    let folders = db
        .list_folders(&ListFoldersFilters {
            sort: SortOrder::NameAsc,
            ..ListFoldersFilters::new(ParentRef::Space(1))
        })
        .expect("list");
    assert_eq!(folders.len(), 2);
    assert_eq!(db.title_for(ParentRef::Folder(folders[0].id)).expect("title"), folders[0].name);
}
