// End-to-end coverage of the parse-level state machine, change detection,
// and the search pipeline, with a fake filesystem-metadata source so file
// changes are simulated deterministically.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use loglens_engine::{Engine, FileMeta, FileStat, SearchOptions};
use loglens_index::{Database, SessionFilter};
use loglens_ingest::Classifier;
use loglens_types::{ParseLevel, SourceKind, VisibilityKind};

#[derive(Default)]
struct FakeMeta {
    stats: Mutex<HashMap<PathBuf, FileStat>>,
}

impl FakeMeta {
    fn set(&self, path: &Path, size: u64, mtime_secs: i64) {
        let stat = FileStat {
            size,
            mtime: Utc.timestamp_opt(mtime_secs, 0).unwrap(),
        };
        self.stats.lock().unwrap().insert(path.to_path_buf(), stat);
    }

    fn set_real(&self, path: &Path) {
        let metadata = std::fs::metadata(path).unwrap();
        self.set(path, metadata.len(), 1_700_000_000);
    }
}

struct SharedMeta(Arc<FakeMeta>);

impl FileMeta for SharedMeta {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        self.0
            .stats
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

fn write_session(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn engine_with_fake_meta(meta: Arc<FakeMeta>) -> Engine {
    Engine::with_file_meta(
        Database::open_in_memory().unwrap(),
        Classifier::default(),
        Box::new(SharedMeta(meta)),
    )
}

const USER_LINE: &str =
    r#"{"type":"event_msg","payload":{"type":"user_message","message":"Add web api handler"}}"#;
const ASSISTANT_LINE: &str = r#"{"type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"Added the handler."}]}}"#;
const SECOND_USER_LINE: &str =
    r#"{"type":"event_msg","payload":{"type":"user_message","message":"Fix api bug"}}"#;

#[test]
fn parse_level_advances_and_never_regresses_while_unchanged() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(dir.path(), "a.jsonl", &[USER_LINE, ASSISTANT_LINE]);
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));

    let session = engine
        .index_session(&path, ParseLevel::Metadata, false)
        .unwrap();
    assert_eq!(session.parse_level, ParseLevel::Metadata);

    let session = engine
        .index_session(&path, ParseLevel::Preview, false)
        .unwrap();
    assert_eq!(session.parse_level, ParseLevel::Preview);

    let session = engine.index_session(&path, ParseLevel::Full, false).unwrap();
    assert_eq!(session.parse_level, ParseLevel::Full);
    assert_eq!(session.user_message_count, 1);
    assert_eq!(session.assistant_message_count, 1);

    // Asking for a lesser level on an unchanged file keeps the higher one
    let session = engine
        .index_session(&path, ParseLevel::Metadata, false)
        .unwrap();
    assert_eq!(session.parse_level, ParseLevel::Full);
}

#[test]
fn file_change_resets_before_reindex() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(dir.path(), "a.jsonl", &[USER_LINE]);
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    engine.index_session(&path, ParseLevel::Full, false).unwrap();

    // The file grows: a new message lands
    write_session(dir.path(), "a.jsonl", &[USER_LINE, ASSISTANT_LINE, SECOND_USER_LINE]);
    let new_size = std::fs::metadata(&path).unwrap().len();
    meta.set(&path, new_size, 1_700_000_500);

    // Metadata-level request on a changed file resets: messages are wiped
    let session = engine
        .index_session(&path, ParseLevel::Metadata, false)
        .unwrap();
    assert_eq!(session.parse_level, ParseLevel::Metadata);

    let session = engine.index_session(&path, ParseLevel::Full, false).unwrap();
    assert_eq!(session.parse_level, ParseLevel::Full);
    assert_eq!(session.user_message_count, 2);
}

#[test]
fn reindexing_unchanged_session_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(dir.path(), "a.jsonl", &[USER_LINE, ASSISTANT_LINE]);
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));

    let first = engine.index_session(&path, ParseLevel::Full, false).unwrap();
    let second = engine.index_session(&path, ParseLevel::Full, false).unwrap();
    let forced = engine.index_session(&path, ParseLevel::Full, true).unwrap();

    for session in [&second, &forced] {
        assert_eq!(session.id, first.id);
        assert_eq!(session.user_message_count, first.user_message_count);
        assert_eq!(
            session.assistant_message_count,
            first.assistant_message_count
        );
    }

    let hits = engine
        .search("web api", SearchOptions::default(), &[])
        .unwrap();
    assert_eq!(hits.len(), 1, "no duplicated messages after re-index");
}

#[test]
fn zero_byte_session_indexes_vacuously_full() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = dir.path().join("empty.jsonl");
    std::fs::write(&path, "").unwrap();
    meta.set(&path, 0, 1_700_000_000);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    let session = engine.index_session(&path, ParseLevel::Full, false).unwrap();

    assert_eq!(session.parse_level, ParseLevel::Full);
    assert_eq!(session.user_message_count, 0);
    assert_eq!(session.assistant_message_count, 0);
    assert!(engine.timeline(&session.id).unwrap().is_empty());
}

#[test]
fn vanished_file_aborts_without_commit() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(dir.path(), "a.jsonl", &[USER_LINE]);
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    let before = engine.index_session(&path, ParseLevel::Full, false).unwrap();

    // File disappears but the stat source has not noticed yet (vanished
    // mid-index): the pass fails, the committed state stays
    std::fs::remove_file(&path).unwrap();
    meta.set(&path, 9999, 1_700_009_999);

    assert!(engine.index_session(&path, ParseLevel::Full, true).is_err());

    let stored = engine.get_session(&before.id).unwrap().unwrap();
    assert_eq!(stored.parse_level, ParseLevel::Full);
    assert_eq!(stored.user_message_count, before.user_message_count);
}

#[test]
fn session_id_comes_from_meta_record_or_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());

    let with_meta = write_session(
        dir.path(),
        "meta.jsonl",
        &[
            r#"{"type":"session_meta","payload":{"id":"sess-named","cwd":"/work"}}"#,
            USER_LINE,
        ],
    );
    let without_meta = write_session(dir.path(), "anon.jsonl", &[USER_LINE]);
    meta.set_real(&with_meta);
    meta.set_real(&without_meta);

    let engine = engine_with_fake_meta(Arc::clone(&meta));

    let named = engine
        .index_session(&with_meta, ParseLevel::Metadata, false)
        .unwrap();
    assert_eq!(named.id, "sess-named");
    assert_eq!(named.cwd.as_deref(), Some("/work"));

    let anon = engine
        .index_session(&without_meta, ParseLevel::Metadata, false)
        .unwrap();
    assert!(anon.id.starts_with("file-"));
}

#[test]
fn timeline_groups_turns_schema_on_read() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(
        dir.path(),
        "a.jsonl",
        &[
            USER_LINE,
            r#"{"type":"response_item","payload":{"type":"function_call","name":"shell","arguments":"{\"command\":[\"cargo\",\"test\"]}","call_id":"c1"}}"#,
            ASSISTANT_LINE,
            SECOND_USER_LINE,
        ],
    );
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    let session = engine.index_session(&path, ParseLevel::Full, false).unwrap();

    let turns = engine.timeline(&session.id).unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].outputs.len(), 2);
    assert_eq!(turns[0].outputs[0].kind, VisibilityKind::Tool);
    assert!(turns[1].outputs.is_empty());

    // Prefix resolution reaches the same session
    let prefix = &session.id[..4];
    assert_eq!(engine.timeline(prefix).unwrap().len(), 2);
}

#[test]
fn search_is_conjunctive_and_capped() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(
        dir.path(),
        "a.jsonl",
        &[
            r#"{"type":"session_meta","payload":{"id":"sess-search"}}"#,
            USER_LINE,
            SECOND_USER_LINE,
        ],
    );
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    engine.index_session(&path, ParseLevel::Full, false).unwrap();

    // "web api": only the first message contains both tokens
    let hits = engine
        .search("web api", SearchOptions::default(), &[])
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Add web api handler");
    assert!(!hits[0].from_fallback);

    // "api" alone matches both
    let hits = engine.search("api", SearchOptions::default(), &[]).unwrap();
    assert_eq!(hits.len(), 2);

    // Per-session cap of one keeps the dominant session in check
    let hits = engine
        .search(
            "api",
            SearchOptions {
                total_limit: 160,
                per_session_limit: 1,
            },
            &[],
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn search_falls_back_to_raw_scan_when_index_is_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let root = dir.path().join("sessions");
    std::fs::create_dir_all(&root).unwrap();
    write_session(&root, "unindexed.jsonl", &[USER_LINE, ASSISTANT_LINE]);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    let roots = vec![(SourceKind::Codex, root)];

    let hits = engine
        .search("web api", SearchOptions::default(), &roots)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].from_fallback);
    assert_eq!(hits[0].text, "Add web api handler");

    // Tokens are matched case-insensitively in the fallback too
    let hits = engine
        .search("WEB API", SearchOptions::default(), &roots)
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn index_all_reports_failures_without_aborting() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let root = dir.path().join("sessions");
    std::fs::create_dir_all(&root).unwrap();

    let good = write_session(&root, "good.jsonl", &[USER_LINE]);
    let ghost = write_session(&root, "ghost.jsonl", &[USER_LINE]);
    meta.set_real(&good);
    // ghost has no stat entry: the fake filesystem says it vanished

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    let roots = vec![(SourceKind::Codex, root)];

    let mut failures = Vec::new();
    let summary = engine
        .index_all(&roots, ParseLevel::Full, false, |progress| {
            if let loglens_engine::IndexProgress::SessionFailed { path, .. } = progress {
                failures.push(path);
            }
        })
        .unwrap();

    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(failures, vec![ghost]);

    let sessions = engine.list_sessions(&SessionFilter::default()).unwrap();
    assert_eq!(sessions.len(), 1);
}

#[test]
fn prune_removes_sessions_whose_files_are_gone() {
    let dir = tempfile::TempDir::new().unwrap();
    let meta = Arc::new(FakeMeta::default());
    let path = write_session(dir.path(), "a.jsonl", &[USER_LINE]);
    meta.set_real(&path);

    let engine = engine_with_fake_meta(Arc::clone(&meta));
    engine.index_session(&path, ParseLevel::Full, false).unwrap();

    std::fs::remove_file(&path).unwrap();

    assert_eq!(engine.prune_missing().unwrap(), 1);
    assert!(engine.list_sessions(&SessionFilter::default()).unwrap().is_empty());
}
