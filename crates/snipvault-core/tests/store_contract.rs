use std::path::PathBuf;

use snipvault_core::models::{SnippetChanges, SnippetDraft, TagType};
use snipvault_core::store::SqliteStore;
use tempfile::TempDir;

fn scratch_store(dir: &TempDir, name: &str) -> SqliteStore {
    SqliteStore::open(dir.path().join(name)).expect("open scratch store")
}

fn draft(name: &str, code: &str, tag_ids: Vec<i64>) -> SnippetDraft {
    SnippetDraft {
        name: name.to_string(),
        code: code.to_string(),
        language: Some("python".to_string()),
        description: None,
        tag_ids,
    }
}

// Seeds a row the creation API cannot produce: one carried over from a
// secondary store.
fn seed_secondary_row(dir: &TempDir, name: &str, store_file: &str) -> i64 {
    let path: PathBuf = dir.path().join(store_file);
    let conn = rusqlite::Connection::open(path).expect("open raw connection");
    conn.execute(
        r"
        INSERT INTO snippets(name, code, origin, created_at, updated_at)
        VALUES (?1, 'code', 'secondary', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')
        ",
        rusqlite::params![name],
    )
    .expect("seed secondary row");
    conn.last_insert_rowid()
}

#[test]
fn get_or_create_tag_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let python = store
        .get_or_create_tag("Python", None, TagType::Folder)
        .expect("create root tag");
    let django_first = store
        .get_or_create_tag("Django", Some(python), TagType::Folder)
        .expect("create child tag");
    let django_second = store
        .get_or_create_tag("Django", Some(python), TagType::Folder)
        .expect("re-create child tag");

    assert_eq!(python, 1);
    assert_eq!(django_first, 2);
    assert_eq!(django_second, 2);
    assert_eq!(store.tag_count().expect("count"), 2);
}

#[test]
fn tag_lookup_is_case_sensitive() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let lower = store
        .get_or_create_tag("python", None, TagType::Folder)
        .expect("lower");
    let upper = store
        .get_or_create_tag("Python", None, TagType::Folder)
        .expect("upper");

    assert_ne!(lower, upper);
    assert_eq!(store.tag_count().expect("count"), 2);
}

#[test]
fn same_name_under_different_parents_is_distinct() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let python = store
        .get_or_create_tag("Python", None, TagType::Folder)
        .expect("python");
    let rust = store
        .get_or_create_tag("Rust", None, TagType::Folder)
        .expect("rust");
    let web_py = store
        .get_or_create_tag("Web", Some(python), TagType::Folder)
        .expect("web under python");
    let web_rs = store
        .get_or_create_tag("Web", Some(rust), TagType::Folder)
        .expect("web under rust");

    assert_ne!(web_py, web_rs);
}

#[test]
fn create_tag_rejects_blank_name() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let err = store
        .get_or_create_tag("   ", None, TagType::Folder)
        .expect_err("blank name must fail");
    assert_eq!(err.code(), "VALIDATION_FAILED");
}

#[test]
fn create_tag_rejects_missing_parent() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let err = store
        .get_or_create_tag("Orphan", Some(42), TagType::Folder)
        .expect_err("missing parent must fail");
    assert_eq!(err.code(), "CONSISTENCY_VIOLATION");
    assert_eq!(store.tag_count().expect("count"), 0);
}

#[test]
fn create_snippet_writes_row_and_associations() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let tag = store
        .get_or_create_tag("Python", None, TagType::Folder)
        .expect("tag");
    // Duplicate tag ids collapse to one association.
    let id = store
        .create_snippet(&draft("hello", "print('hi')", vec![tag, tag]))
        .expect("create snippet");

    assert_eq!(store.tag_ids_for(id).expect("associations"), vec![tag]);
    let by_tag = store.snippets_by_tag(tag).expect("snippets by tag");
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].name, "hello");
    assert_eq!(by_tag[0].usage_count, 0);
    assert!(!by_tag[0].is_favorite);
}

#[test]
fn create_snippet_rejects_blank_required_fields() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let err = store
        .create_snippet(&draft("", "code", vec![]))
        .expect_err("blank name must fail");
    assert_eq!(err.code(), "VALIDATION_FAILED");

    let err = store
        .create_snippet(&draft("name", "  \n", vec![]))
        .expect_err("blank code must fail");
    assert_eq!(err.code(), "VALIDATION_FAILED");
    assert_eq!(store.snippet_count().expect("count"), 0);
}

#[test]
fn create_snippet_with_unknown_tag_rolls_back_entirely() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let err = store
        .create_snippet(&draft("hello", "code", vec![42]))
        .expect_err("unknown tag must fail");
    assert_eq!(err.code(), "CONSISTENCY_VIOLATION");
    // The snippet row inserted before the association check must be gone.
    assert_eq!(store.snippet_count().expect("count"), 0);
}

#[test]
fn update_snippet_applies_only_provided_fields() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let id = store
        .create_snippet(&draft("hello", "print('hi')", vec![]))
        .expect("create");
    store
        .update_snippet(
            id,
            &SnippetChanges {
                name: Some("hello v2".to_string()),
                ..SnippetChanges::default()
            },
        )
        .expect("update");

    let snippet = store.get_snippet(id).expect("fetch");
    assert_eq!(snippet.name, "hello v2");
    assert_eq!(snippet.code, "print('hi')");
    assert_eq!(snippet.language.as_deref(), Some("python"));
    assert!(snippet.updated_at >= snippet.created_at);
}

#[test]
fn update_snippet_unknown_id_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let err = store
        .update_snippet(7, &SnippetChanges::default())
        .expect_err("unknown id must fail");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn secondary_origin_rows_reject_writes() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");
    let id = seed_secondary_row(&dir, "vendored", "store.db");

    let err = store
        .update_snippet(
            id,
            &SnippetChanges {
                name: Some("renamed".to_string()),
                ..SnippetChanges::default()
            },
        )
        .expect_err("update must fail");
    assert_eq!(err.code(), "IMMUTABLE_ORIGIN");

    let err = store.delete_snippet(id).expect_err("delete must fail");
    assert_eq!(err.code(), "IMMUTABLE_ORIGIN");
    assert_eq!(store.snippet_count().expect("count"), 1);

    let err = store.toggle_favorite(id).expect_err("toggle must fail");
    assert_eq!(err.code(), "IMMUTABLE_ORIGIN");
}

#[test]
fn delete_snippet_cascades_associations() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let tag = store
        .get_or_create_tag("Python", None, TagType::Folder)
        .expect("tag");
    let id = store
        .create_snippet(&draft("hello", "code", vec![tag]))
        .expect("create");

    store.delete_snippet(id).expect("delete");
    assert_eq!(store.snippet_count().expect("count"), 0);
    assert!(store.snippets_by_tag(tag).expect("by tag").is_empty());
    assert!(store.tag_ids_for(id).expect("associations").is_empty());
}

#[test]
fn toggle_favorite_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let id = store
        .create_snippet(&draft("hello", "code", vec![]))
        .expect("create");
    assert!(store.toggle_favorite(id).expect("first toggle"));
    assert_eq!(store.favorite_snippets().expect("favorites").len(), 1);
    assert!(!store.toggle_favorite(id).expect("second toggle"));
    assert!(store.favorite_snippets().expect("favorites").is_empty());
}

#[test]
fn record_usage_bumps_counter_and_timestamp() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    let id = store
        .create_snippet(&draft("hello", "code", vec![]))
        .expect("create");
    store.record_usage(id).expect("first use");
    store.record_usage(id).expect("second use");

    let snippet = store.get_snippet(id).expect("fetch");
    assert_eq!(snippet.usage_count, 2);
    assert!(snippet.last_used.is_some());
}

#[test]
fn filter_snippets_matches_name_and_description_case_insensitively() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    store
        .create_snippet(&draft("Flask Route", "code", vec![]))
        .expect("create first");
    store
        .create_snippet(&SnippetDraft {
            name: "list helper".to_string(),
            code: "code".to_string(),
            language: Some("rust".to_string()),
            description: Some("FLASK middleware notes".to_string()),
            tag_ids: vec![],
        })
        .expect("create second");
    store
        .create_snippet(&draft("unrelated", "code", vec![]))
        .expect("create third");

    let hits = store.filter_snippets("flask", None).expect("filter");
    assert_eq!(hits.len(), 2);

    let hits = store
        .filter_snippets("flask", Some("rust"))
        .expect("filter with language");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "list helper");
}

#[test]
fn filter_snippets_treats_like_wildcards_literally() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    store
        .create_snippet(&draft("percent % trick", "code", vec![]))
        .expect("create");
    store
        .create_snippet(&draft("plain", "code", vec![]))
        .expect("create");

    let hits = store.filter_snippets("%", None).expect("filter");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "percent % trick");
}

#[test]
fn filter_snippets_orders_by_usage() {
    let dir = TempDir::new().expect("tempdir");
    let store = scratch_store(&dir, "store.db");

    store
        .create_snippet(&draft("flask cold", "code", vec![]))
        .expect("create cold");
    let hot = store
        .create_snippet(&draft("flask hot", "code", vec![]))
        .expect("create hot");
    store.record_usage(hot).expect("use hot");

    let hits = store.filter_snippets("flask", None).expect("filter");
    assert_eq!(hits[0].name, "flask hot");
    assert_eq!(hits[1].name, "flask cold");
}

#[test]
fn open_read_only_rejects_missing_file() {
    let dir = TempDir::new().expect("tempdir");
    let err = SqliteStore::open_read_only(dir.path().join("absent.db"))
        .expect_err("missing file must fail");
    assert_eq!(err.code(), "STORE_UNAVAILABLE");
}

#[test]
fn open_read_only_rejects_foreign_schema() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("foreign.db");
    let conn = rusqlite::Connection::open(&path).expect("create foreign db");
    conn.execute_batch("CREATE TABLE unrelated (id INTEGER PRIMARY KEY);")
        .expect("create unrelated table");
    drop(conn);

    let err = SqliteStore::open_read_only(&path).expect_err("foreign schema must fail");
    assert_eq!(err.code(), "STORE_UNAVAILABLE");
}

#[test]
fn open_read_only_rejects_writes_at_the_sqlite_level() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("readonly.db");
    scratch_store(&dir, "readonly.db")
        .get_or_create_tag("Python", None, TagType::Folder)
        .expect("seed tag");

    let store = SqliteStore::open_read_only(&path).expect("open read-only");
    assert_eq!(store.tag_count().expect("count"), 1);
    let err = store
        .get_or_create_tag("Rust", None, TagType::Folder)
        .expect_err("write must fail");
    assert_eq!(err.code(), "SQLITE_ERROR");
}
