/*!
 * Trusted Root Path Validation
 * Lexical canonicalization plus symlink-aware containment checks
 *
 * Every scoped operation passes two gates before touching storage:
 * the lexically cleaned candidate must sit under the trusted root, and,
 * once symlinks are resolved on the host, so must the real path.
 */

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;
use tracing::debug;

use super::types::{VfsError, VfsResult};

/// Same bound the kernel applies before returning ELOOP
const MAX_SYMLINK_HOPS: usize = 40;

/// Canonicalize a path without touching the filesystem
///
/// Resolves `.` and `..` and collapses separators. `..` at the root stays
/// at the root.
#[inline]
pub fn clean(path: &Path) -> PathBuf {
    path.clean()
}

/// Join an untrusted relative name onto a root and clean the result
///
/// A leading `/` (or drive prefix) in `requested` does not replace the
/// root; the name is always interpreted underneath it. `..` segments are
/// kept so that the containment check can see them.
pub fn join_under(root: &Path, requested: &Path) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in requested.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => joined.push(other),
        }
    }
    joined.clean()
}

/// Segment-wise ancestor check: is `path` equal to `root` or below it?
///
/// Both arguments must already be cleaned. Compares whole components, so
/// `/data2` is never considered inside `/data`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.ancestors().any(|ancestor| ancestor == root)
}

/// Validate an untrusted name against a trusted root
///
/// Returns the symlink-resolved real path when the target exists. For a
/// missing target, returns its resolved parent joined with its name, or the
/// cleaned candidate when the parent is missing as well. A missing target is still checked
/// through its deepest existing ancestor, so a dangling or escaping link
/// in the middle of the path cannot be used to create entries elsewhere.
pub fn validate(requested: &Path, trusted_root: &Path) -> VfsResult<PathBuf> {
    let root = trusted_root.clean();
    let candidate = join_under(&root, requested);

    if !is_within(&candidate, &root) {
        return Err(reject(requested, &candidate));
    }

    match fs::canonicalize(&candidate) {
        Ok(real) => {
            if is_within(&real, &root) {
                Ok(real)
            } else {
                Err(reject(requested, &real))
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            check_missing(&candidate, &root, requested, 0)?;
            resolve_parent(&candidate, &root, requested)
        }
        Err(e) => Err(VfsError::from_io(
            e,
            format!("resolve symlinks for {}", requested.display()),
        )),
    }
}

/// Containment check for a path with no filesystem entry at its end
fn check_missing(
    candidate: &Path,
    root: &Path,
    requested: &Path,
    hops: usize,
) -> VfsResult<()> {
    if hops > MAX_SYMLINK_HOPS {
        return Err(VfsError::Io(format!(
            "too many levels of symbolic links: {}",
            requested.display()
        )));
    }

    let existing = candidate
        .ancestors()
        .find(|a| fs::symlink_metadata(a).is_ok())
        .unwrap_or(candidate);

    match fs::canonicalize(existing) {
        Ok(real) if is_within(&real, root) => Ok(()),
        Ok(real) => Err(reject(requested, &real)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // `existing` is a dangling symlink: follow it by hand
            let target = fs::read_link(existing).map_err(|e| {
                VfsError::from_io(e, format!("read link for {}", requested.display()))
            })?;
            let base = existing.parent().unwrap_or(existing);
            let mut next = base.join(target);
            match candidate.strip_prefix(existing) {
                Ok(rest) if !rest.as_os_str().is_empty() => next.push(rest),
                _ => {}
            }
            check_missing(&next.clean(), root, requested, hops + 1)
        }
        Err(e) => Err(VfsError::from_io(
            e,
            format!("resolve symlinks for {}", requested.display()),
        )),
    }
}

/// Real path of a missing target: its parent resolved, its name kept
///
/// Falls back to the cleaned candidate when the parent is missing too.
fn resolve_parent(candidate: &Path, root: &Path, requested: &Path) -> VfsResult<PathBuf> {
    let (Some(parent), Some(file_name)) = (candidate.parent(), candidate.file_name()) else {
        return Ok(candidate.to_path_buf());
    };
    match fs::canonicalize(parent) {
        Ok(real) if is_within(&real, root) => Ok(real.join(file_name)),
        Ok(real) => Err(reject(requested, &real)),
        Err(_) => Ok(candidate.to_path_buf()),
    }
}

fn reject(requested: &Path, resolved: &Path) -> VfsError {
    debug!(
        requested = %requested.display(),
        resolved = %resolved.display(),
        "path rejected: outside of trusted root"
    );
    VfsError::OutsideTrustedRoot(format!(
        "unsafe or invalid path specified: {}",
        requested.display()
    ))
}
