/*!
 * Directory Walk
 * Depth-first traversal through any `FileSystem`
 */

use std::path::{Path, PathBuf};

use super::traits::FileSystem;
use super::types::VfsResult;

/// Every path reachable from `root` in pre-order, `root` itself first
///
/// Children are visited in name order. Symlinked directories are listed
/// but not descended into, so a walk cannot loop.
pub fn walk(fs: &dyn FileSystem, root: &Path) -> VfsResult<Vec<PathBuf>> {
    let mut visited = vec![root.to_path_buf()];
    walk_into(fs, root, &mut visited)?;
    Ok(visited)
}

fn walk_into(fs: &dyn FileSystem, dir: &Path, visited: &mut Vec<PathBuf>) -> VfsResult<()> {
    for entry in fs.read_dir(dir)? {
        let path = if dir == Path::new(".") {
            PathBuf::from(&entry.name)
        } else {
            dir.join(&entry.name)
        };
        visited.push(path.clone());
        if entry.is_dir() {
            walk_into(fs, &path, visited)?;
        }
    }
    Ok(())
}
