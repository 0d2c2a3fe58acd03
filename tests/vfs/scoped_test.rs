/*!
 * Scoped Filesystem Tests
 * Traversal confinement, sub-scopes and write-then-read through a scope
 */

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use scopefs::vfs::{walk, FileSystem, ScopeConfig, ScopedFs, VfsError};
use tempfile::TempDir;

/// Tree used across the scenario tests:
///
/// subfolder1/{dir11/, dir12/friend.txt, hello.txt}
/// subfolder2/{dir21/, goodbye.txt}
fn tenant_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let p = temp.path();
    std::fs::create_dir_all(p.join("subfolder1/dir11")).unwrap();
    std::fs::create_dir_all(p.join("subfolder1/dir12")).unwrap();
    std::fs::create_dir_all(p.join("subfolder2/dir21")).unwrap();
    std::fs::write(p.join("subfolder1/hello.txt"), b"hello").unwrap();
    std::fs::write(p.join("subfolder1/dir12/friend.txt"), b"friend").unwrap();
    std::fs::write(p.join("subfolder2/goodbye.txt"), b"goodbye").unwrap();
    temp
}

fn count_host_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            if e.file_type().unwrap().is_dir() {
                1 + count_host_entries(&e.path())
            } else {
                1
            }
        })
        .sum()
}

fn read_all(fs: &dyn FileSystem, name: &str) -> Vec<u8> {
    let mut file = fs.open(Path::new(name)).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

#[test]
fn test_walk_sees_whole_tree() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();

    let paths = walk(&fs, Path::new(".")).unwrap();
    // "." plus every host entry
    assert_eq!(paths.len(), 1 + count_host_entries(temp.path()));
    assert_eq!(paths[0], PathBuf::from("."));
    assert!(paths.contains(&PathBuf::from("subfolder1/dir12/friend.txt")));
}

#[test]
fn test_tenant_scenario() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();

    assert_eq!(read_all(&fs, "subfolder1/hello.txt"), b"hello");

    let sub = fs.sub(Path::new("subfolder1")).unwrap();
    assert_eq!(read_all(&sub, "dir12/friend.txt"), b"friend");

    // Traversal out of the sub-scope
    let err = sub.open(Path::new("../subfolder2/goodbye.txt")).unwrap_err();
    assert!(err.is_security_violation(), "got {:?}", err);

    // Absent entry inside the scope is a plain NotFound
    let err = sub.open(Path::new("new.txt")).unwrap_err();
    assert!(matches!(err, VfsError::NotFound(_)), "got {:?}", err);

    let writer = sub.as_writable().expect("read-write scope");
    let mut file = writer.create(Path::new("new.txt")).unwrap();
    file.write_all(b"new sensation").unwrap();
    drop(file);

    assert_eq!(read_all(&sub, "new.txt"), b"new sensation");
    assert_eq!(
        std::fs::read(temp.path().join("subfolder1/new.txt")).unwrap(),
        b"new sensation"
    );
}

#[test]
fn test_sub_scope_narrows_what_parent_allows() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();
    let sub = fs.sub(Path::new("subfolder1")).unwrap();

    // Same target, reached from each scope
    assert_eq!(
        fs.read_file(Path::new("subfolder1/../subfolder2/goodbye.txt")).unwrap(),
        b"goodbye"
    );
    assert!(sub
        .read_file(Path::new("../subfolder2/goodbye.txt"))
        .unwrap_err()
        .is_security_violation());

    // Grandchild cannot climb back into the child either
    let grandchild = sub.sub(Path::new("dir12")).unwrap();
    assert_eq!(grandchild.read_file(Path::new("friend.txt")).unwrap(), b"friend");
    assert!(grandchild
        .read_file(Path::new("../hello.txt"))
        .unwrap_err()
        .is_security_violation());
    assert!(grandchild
        .sub(Path::new("../../subfolder2"))
        .unwrap_err()
        .is_security_violation());
}

#[test]
fn test_every_operation_rejects_traversal() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path().join("subfolder1"), ScopeConfig::uncached()).unwrap();
    let escape = Path::new("dir12/../../subfolder2/goodbye.txt");

    assert!(fs.open(escape).unwrap_err().is_security_violation());
    assert!(fs.read_file(escape).unwrap_err().is_security_violation());
    assert!(fs.stat(escape).unwrap_err().is_security_violation());
    assert!(fs.read_dir(Path::new("..")).unwrap_err().is_security_violation());
    assert!(fs.sub(Path::new("../subfolder2")).unwrap_err().is_security_violation());
    assert!(fs
        .as_writable()
        .unwrap()
        .create(Path::new("../planted.txt"))
        .unwrap_err()
        .is_security_violation());
    assert!(!temp.path().join("planted.txt").exists());
}

#[test]
fn test_absolute_names_stay_inside() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();

    assert_eq!(fs.read_file(Path::new("/subfolder1/hello.txt")).unwrap(), b"hello");
    // Resolves under the root, where no etc/ exists
    assert!(fs.read_file(Path::new("/etc/hostname")).unwrap_err().is_not_found());
}

#[test]
fn test_relative_root_resolved_against_cwd() {
    let temp = tenant_tree();
    let cwd = std::env::current_dir().unwrap();
    let relative = pathdiff(temp.path(), &cwd);

    let fs = ScopedFs::new(&relative, ScopeConfig::uncached()).unwrap();
    assert!(fs.trusted_root().is_absolute());
    assert_eq!(fs.read_file(Path::new("subfolder1/hello.txt")).unwrap(), b"hello");
}

/// `target` expressed relative to `base` with `..` hops
fn pathdiff(target: &Path, base: &Path) -> PathBuf {
    let target = std::fs::canonicalize(target).unwrap();
    let base = std::fs::canonicalize(base).unwrap();
    let common = base
        .components()
        .zip(target.components())
        .take_while(|(a, b)| a == b)
        .count();
    let mut rel = PathBuf::new();
    for _ in base.components().skip(common) {
        rel.push("..");
    }
    for part in target.components().skip(common) {
        rel.push(part);
    }
    rel
}

#[test]
fn test_stat_and_read_dir() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();

    let md = fs.stat(Path::new("subfolder1/hello.txt")).unwrap();
    assert_eq!(md.name, "hello.txt");
    assert_eq!(md.size, 5);
    assert!(md.is_file());

    let root_md = fs.stat(Path::new(".")).unwrap();
    assert!(root_md.is_dir());

    let names: Vec<String> = fs
        .read_dir(Path::new("subfolder1"))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["dir11", "dir12", "hello.txt"]);
}

#[test]
fn test_create_needs_existing_parent() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();
    let err = fs
        .as_writable()
        .unwrap()
        .create(Path::new("missing/dir/file.txt"))
        .unwrap_err();
    assert!(err.is_not_found(), "got {:?}", err);
}

#[test]
fn test_write_file_roundtrip_through_sub_fs() {
    let temp = tenant_tree();
    let fs = ScopedFs::new(temp.path(), ScopeConfig::uncached()).unwrap();
    let sub = fs.sub_fs(Path::new("subfolder2")).unwrap();

    let writer = sub.as_writable().expect("sub-scope keeps write capability");
    writer.write_file(Path::new("dir21/notes.md"), b"# notes").unwrap();
    assert_eq!(fs.read_file(Path::new("subfolder2/dir21/notes.md")).unwrap(), b"# notes");
}
