use exterm_cache::{ResponseCache, DEFAULT_RETENTION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    thoughts: String,
    commands: Vec<String>,
}

fn payload(cmd: &str) -> Payload {
    Payload {
        thoughts: "t".to_string(),
        commands: vec![format!("EXECUTE: {}", cmd)],
    }
}

#[test]
fn test_put_then_get_case_insensitive() {
    let cache = ResponseCache::in_memory().unwrap();
    cache.put("List Files", &payload("ls")).unwrap();

    let hit: Option<Payload> = cache.get("list files").unwrap();
    assert_eq!(hit, Some(payload("ls")));

    let hit: Option<Payload> = cache.get("LIST FILES").unwrap();
    assert_eq!(hit, Some(payload("ls")));
}

#[test]
fn test_overwrite_is_silent() {
    let cache = ResponseCache::in_memory().unwrap();
    cache.put("k", &payload("ls")).unwrap();
    cache.put("K", &payload("ls -la")).unwrap();

    assert_eq!(cache.len().unwrap(), 1);
    let hit: Option<Payload> = cache.get("k").unwrap();
    assert_eq!(hit, Some(payload("ls -la")));
}

#[test]
fn test_evict_removes_strictly_older_entries() {
    let cache = ResponseCache::in_memory().unwrap();
    let retention = Duration::from_secs(100);
    let now = 1_000;

    cache.put_at("older", &payload("a"), now - 101).unwrap();
    cache.put_at("boundary", &payload("b"), now - 100).unwrap();
    cache.put_at("fresh", &payload("c"), now - 99).unwrap();

    let removed = cache.evict_older_than_at(retention, now).unwrap();

    assert_eq!(removed, 1);
    assert_eq!(cache.last_accessed("older").unwrap(), None);
    assert_eq!(cache.last_accessed("boundary").unwrap(), Some(now - 100));
    assert_eq!(cache.last_accessed("fresh").unwrap(), Some(now - 99));
}

#[test]
fn test_evict_one_second_past_boundary_removes_entry() {
    let cache = ResponseCache::in_memory().unwrap();
    let retention = Duration::from_secs(100);

    cache.put_at("entry", &payload("a"), 900).unwrap();
    assert_eq!(cache.evict_older_than_at(retention, 1_000).unwrap(), 0);
    assert_eq!(cache.evict_older_than_at(retention, 1_001).unwrap(), 1);
}

#[test]
fn test_evict_on_empty_cache() {
    let cache = ResponseCache::in_memory().unwrap();
    assert_eq!(cache.evict_older_than(DEFAULT_RETENTION).unwrap(), 0);
}

#[test]
fn test_read_refresh_protects_from_eviction() {
    let cache = ResponseCache::in_memory().unwrap();
    let retention = Duration::from_secs(10);

    cache.put_at("k", &payload("ls"), 0).unwrap();
    let _: Option<Payload> = cache.get_at("k", 95).unwrap();

    assert_eq!(cache.evict_older_than_at(retention, 100).unwrap(), 0);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_persistence() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("nested").join("cache.db");

    {
        let cache = ResponseCache::open(&db_path).unwrap();
        cache.put("persistent", &payload("pwd")).unwrap();
    }

    let cache = ResponseCache::open(&db_path).unwrap();
    let hit: Option<Payload> = cache.get("persistent").unwrap();
    assert_eq!(hit, Some(payload("pwd")));
}

#[test]
fn test_open_fails_loudly_on_bad_path() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let result = ResponseCache::open(blocker.join("cache.db"));
    assert!(result.is_err());
}

#[test]
fn test_corrupted_value_is_an_error() {
    let cache = ResponseCache::in_memory().unwrap();
    cache.put("k", &"just a string").unwrap();

    let result: Result<Option<Payload>, _> = cache.get("k");
    assert!(result.is_err());
}

#[test]
fn test_corrupted_value_is_not_refreshed() {
    let cache = ResponseCache::in_memory().unwrap();
    cache.put_at("k", &"just a string", 100).unwrap();

    let result: Result<Option<Payload>, _> = cache.get_at("k", 5_000);
    assert!(result.is_err());
    assert_eq!(cache.last_accessed("k").unwrap(), Some(100));

    let removed = cache
        .evict_older_than_at(Duration::from_secs(1_000), 5_000)
        .unwrap();
    assert_eq!(removed, 1);
    assert!(cache.is_empty().unwrap());
}

#[test]
fn test_sql_injection_in_key_is_inert() {
    let cache = ResponseCache::in_memory().unwrap();
    cache.put("safe", &payload("ls")).unwrap();
    cache.put("'; DROP TABLE response_cache; --", &payload("x")).unwrap();

    assert_eq!(cache.len().unwrap(), 2);
}
