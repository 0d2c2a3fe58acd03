/*!
 * scopefs - Command Line Entry Point
 *
 * Inspect or write into a directory through a sandboxed scope:
 *
 *   scopefs <root> ls [dir]
 *   scopefs <root> cat <file>
 *   scopefs <root> stat <path>
 *   scopefs <root> tree [dir]
 *   scopefs <root> put <file>     (contents from stdin)
 *
 * Cache settings come from SCOPEFS_CACHE_SIZE / SCOPEFS_CACHE_TTL_MS.
 */

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use scopefs::{init_tracing, walk, FileSystem, ScopeConfig, ScopedFs};

const USAGE: &str = "usage: scopefs <root> <ls|cat|stat|tree|put> [path]";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (root, command) = match (args.first(), args.get(1)) {
        (Some(root), Some(command)) => (root.as_str(), command.as_str()),
        _ => bail!(USAGE),
    };
    let target = Path::new(args.get(2).map(String::as_str).unwrap_or("."));

    let config = ScopeConfig::from_env()?;
    let fs = ScopedFs::new(root, config)?;
    info!(root = %fs.trusted_root().display(), command, path = %target.display(), "scope opened");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        "ls" => {
            for entry in fs.read_dir(target)? {
                writeln!(out, "{:<10} {}", entry.file_type.to_string(), entry.name)?;
            }
        }
        "cat" => {
            let data = fs.read_file(target)?;
            out.write_all(&data)?;
        }
        "stat" => {
            let md = fs.stat(target)?;
            serde_json::to_writer_pretty(&mut out, &md)?;
            writeln!(out)?;
        }
        "tree" => {
            for path in walk(&fs, target)? {
                writeln!(out, "{}", path.display())?;
            }
        }
        "put" => {
            let writer = fs
                .as_writable()
                .ok_or_else(|| anyhow!("scope does not support writes"))?;
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("read stdin")?;
            writer.write_file(target, &data)?;
            info!(bytes = data.len(), path = %target.display(), "file written");
        }
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }

    out.flush()?;
    Ok(())
}
