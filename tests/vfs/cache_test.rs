/*!
 * Scope Cache Tests
 * TTL staleness, write-through invalidation and concurrent readers
 */

use std::io::{Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scopefs::vfs::{FileSystem, ScopeConfig, ScopedFs, WriteFileSystem};
use tempfile::TempDir;

fn cached_scope(ttl: Duration) -> (TempDir, ScopedFs) {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("docs")).unwrap();
    std::fs::write(temp.path().join("docs/readme.txt"), b"v1").unwrap();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::new(1024 * 1024, ttl)).unwrap();
    (temp, fs)
}

#[test]
fn test_external_change_visible_after_ttl() {
    let (temp, fs) = cached_scope(Duration::from_millis(100));
    let name = Path::new("docs/readme.txt");

    assert_eq!(fs.read_file(name).unwrap(), b"v1");
    std::fs::write(temp.path().join("docs/readme.txt"), b"v2").unwrap();

    // Served from cache within the TTL
    assert_eq!(fs.read_file(name).unwrap(), b"v1");

    thread::sleep(Duration::from_millis(250));
    assert_eq!(fs.read_file(name).unwrap(), b"v2");
}

#[test]
fn test_write_through_scope_is_read_back() {
    let (_temp, fs) = cached_scope(Duration::from_secs(60));
    let name = Path::new("docs/readme.txt");

    assert_eq!(fs.read_file(name).unwrap(), b"v1");
    assert_eq!(fs.read_dir(Path::new("docs")).unwrap().len(), 1);

    let mut file = fs.create(name).unwrap();
    file.write_all(b"v2, longer").unwrap();
    drop(file);
    assert_eq!(fs.read_file(name).unwrap(), b"v2, longer");

    fs.write_file(Path::new("docs/new.txt"), b"fresh").unwrap();
    let names: Vec<String> = fs
        .read_dir(Path::new("docs"))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["new.txt", "readme.txt"]);
}

#[test]
fn test_equivalent_names_share_entries() {
    let (_temp, fs) = cached_scope(Duration::from_secs(60));
    fs.read_file(Path::new("docs/readme.txt")).unwrap();
    fs.read_file(Path::new("./docs//readme.txt")).unwrap();
    fs.read_file(Path::new("/docs/../docs/readme.txt")).unwrap();

    let stats = fs.cache_stats().unwrap();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_rejected_operations_never_reach_storage() {
    let (temp, fs) = cached_scope(Duration::from_secs(60));
    let sub = fs.sub(Path::new("docs")).unwrap();

    assert!(sub.read_file(Path::new("../docs/readme.txt")).is_err());
    assert!(sub.stat(Path::new("../../etc")).is_err());
    assert!(sub.read_dir(Path::new("..")).is_err());
    assert!(sub.create(Path::new("../escape.txt")).is_err());

    let stats = fs.cache_stats().unwrap();
    assert_eq!(stats.hits + stats.misses, 0);
    assert!(!temp.path().join("escape.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_write_visible_through_symlink_alias() {
    let (temp, fs) = cached_scope(Duration::from_secs(60));
    std::os::unix::fs::symlink(
        temp.path().join("docs/readme.txt"),
        temp.path().join("docs/alias"),
    )
    .unwrap();

    assert_eq!(fs.read_file(Path::new("docs/alias")).unwrap(), b"v1");
    fs.write_file(Path::new("docs/readme.txt"), b"v2").unwrap();
    assert_eq!(fs.read_file(Path::new("docs/alias")).unwrap(), b"v2");

    // Writing through the alias invalidates the target as well
    fs.write_file(Path::new("docs/alias"), b"v3").unwrap();
    assert_eq!(fs.read_file(Path::new("docs/readme.txt")).unwrap(), b"v3");
}

#[test]
fn test_file_larger_than_budget_streams() {
    let temp = TempDir::new().unwrap();
    let sparse = std::fs::File::create(temp.path().join("sparse.bin")).unwrap();
    sparse.set_len(1 << 36).unwrap();
    drop(sparse);
    let fs = ScopedFs::new(temp.path(), ScopeConfig::new(1024, Duration::from_secs(60))).unwrap();

    let mut file = fs.open(Path::new("sparse.bin")).unwrap();
    assert_eq!(file.metadata().unwrap().size, 1 << 36);
    let mut head = [0xFFu8; 512];
    file.read_exact(&mut head).unwrap();
    assert!(head.iter().all(|b| *b == 0));
    assert_eq!(fs.cache_stats().unwrap().entries, 0);
}

#[test]
fn test_uncached_scope_reports_no_stats() {
    let temp = TempDir::new().unwrap();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();
    assert!(fs.cache_stats().is_none());
}

#[test]
fn test_concurrent_readers_share_one_scope() {
    let (temp, fs) = cached_scope(Duration::from_secs(60));
    for i in 0..8 {
        std::fs::write(
            temp.path().join(format!("docs/file{}.txt", i)),
            format!("content {}", i),
        )
        .unwrap();
    }

    thread::scope(|s| {
        for t in 0..4 {
            let fs = &fs;
            s.spawn(move || {
                for round in 0..50 {
                    let i = (t + round) % 8;
                    let name = format!("docs/file{}.txt", i);
                    let data = fs.read_file(Path::new(&name)).unwrap();
                    assert_eq!(data, format!("content {}", i).into_bytes());
                    assert!(fs.read_file(Path::new("../outside")).is_err());
                }
            });
        }
    });

    let stats = fs.cache_stats().unwrap();
    assert_eq!(stats.hits + stats.misses, 200);
    assert!(stats.hits >= 200 - 4 * 8);
}
