//! Append-only catalog ledger.
//!
//! Maps a formatted folder ancestry (`Wood/Hard Wood`) to a stable random
//! identifier, persisted one `<id>:<path>` line per entry. Lines are only
//! ever appended. Every lookup-or-insert holds an exclusive advisory lock on
//! the ledger file from the read through the append, so concurrent callers
//! (threads or processes) cannot mint two identifiers for one path.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use fd_lock::RwLock;
use indexmap::IndexMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::core::naming::NameFormat;

/// Default ledger file name inside the library directory
pub const DEFAULT_LEDGER_FILE: &str = "assets.cats.txt";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError
{
    /// No library directory has been established for the ledger
    #[error("no base location for the catalog ledger: {0}")]
    NoLedgerContext(String),

    #[error("{path} is not inside {base}")]
    OutsideBase
    {
        path: PathBuf,
        base: PathBuf,
    },

    #[error("catalog ledger I/O on {path}: {source}")]
    Io
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One persisted ledger line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CatalogEntry
{
    pub id: String,
    pub path: String,
}

/// Parse ledger text. Lines without a colon and `#` comments are skipped;
/// the first colon separates id from path. Only the line terminator is
/// removed, so a path keeps any surrounding spaces it was written with.
/// If a path repeats, the later id wins but the entry keeps the position
/// of its first appearance.
pub fn parse_ledger(text: &str) -> Vec<CatalogEntry>
{
    let mut by_path: IndexMap<&str, &str> = IndexMap::new();
    for line in text.lines()
    {
        if line.trim().is_empty() || line.starts_with('#')
        {
            continue;
        }
        let Some((id, path)) = line.split_once(':')
        else
        {
            continue;
        };
        by_path.insert(path, id.trim());
    }
    by_path
        .into_iter()
        .map(|(path, id)| CatalogEntry { id: id.to_string(), path: path.to_string() })
        .collect()
}

/// Catalog path for a folder: its ancestry relative to `base`, each segment
/// formatted, joined by `/`. `None` for folders directly under `base`.
pub fn catalog_path(
    full_path: &Path,
    base_path: &Path,
    format: &NameFormat,
) -> Result<Option<String>, CatalogError>
{
    let relative = full_path
        .strip_prefix(base_path)
        .map_err(|_| CatalogError::OutsideBase {
            path: full_path.to_path_buf(),
            base: base_path.to_path_buf(),
        })?;

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c
        {
            // A line break would split the ledger line
            Component::Normal(s) => Some(
                format
                    .apply(&s.to_string_lossy())
                    .replace(['\r', '\n'], " "),
            ),
            _ => None,
        })
        .collect();

    // The folder's own name is not part of its catalog path
    segments.pop();
    if segments.is_empty()
    {
        return Ok(None);
    }
    Ok(Some(segments.join("/")))
}

/// Handle on one ledger file. Cheap to clone; holds no open file.
#[derive(Debug, Clone)]
pub struct CatalogLedger
{
    library_dir: Option<PathBuf>,
    file_name: String,
    format: NameFormat,
}

impl CatalogLedger
{
    pub fn new(
        library_dir: Option<PathBuf>,
        file_name: impl Into<String>,
        format: NameFormat,
    ) -> Self
    {
        Self {
            library_dir,
            file_name: file_name.into(),
            format,
        }
    }

    /// Ledger file location, or `NoLedgerContext` when no usable library
    /// directory exists.
    pub fn ledger_path(&self) -> Result<PathBuf, CatalogError>
    {
        let dir = self
            .library_dir
            .as_deref()
            .ok_or_else(|| CatalogError::NoLedgerContext("no library directory set".into()))?;
        if !dir.is_dir()
        {
            return Err(CatalogError::NoLedgerContext(format!(
                "library directory {} does not exist",
                dir.display()
            )));
        }
        Ok(dir.join(&self.file_name))
    }

    /// Return the identifier for `full_path`'s catalog path, minting and
    /// appending a new one on first sight. `Ok(None)` for top-level folders.
    #[instrument(level = "debug", skip(self), fields(full = %full_path.display()))]
    pub fn get_or_create(
        &self,
        full_path: &Path,
        base_path: &Path,
    ) -> Result<Option<String>, CatalogError>
    {
        let Some(path) = catalog_path(full_path, base_path, &self.format)?
        else
        {
            debug!("top-level folder, no catalog entry");
            return Ok(None);
        };
        let ledger = self.ledger_path()?;
        let io_err = |source| CatalogError::Io { path: ledger.clone(), source };

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&ledger)
            .map_err(io_err)?;
        let mut lock = RwLock::new(file);
        let mut guard = lock
            .write()
            .map_err(io_err)?;

        let mut text = String::new();
        guard
            .read_to_string(&mut text)
            .map_err(io_err)?;

        if let Some(entry) = parse_ledger(&text)
            .into_iter()
            .find(|e| e.path == path)
        {
            debug!(id = %entry.id, %path, "catalog entry found");
            return Ok(Some(entry.id));
        }

        let id = Uuid::new_v4().to_string();
        let mut line = String::new();
        // A hand-edited ledger may lack a trailing newline
        if !text.is_empty() && !text.ends_with('\n')
        {
            line.push('\n');
        }
        line.push_str(&format!("{id}:{path}\n"));
        guard
            .write_all(line.as_bytes())
            .map_err(io_err)?;
        guard
            .flush()
            .map_err(io_err)?;

        info!(%id, %path, "catalog entry created");
        Ok(Some(id))
    }

    /// All entries in file order. A missing ledger file reads as empty.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>, CatalogError>
    {
        let ledger = self.ledger_path()?;
        if !ledger.exists()
        {
            return Ok(Vec::new());
        }
        let io_err = |source| CatalogError::Io { path: ledger.clone(), source };

        let file = File::open(&ledger).map_err(io_err)?;
        let lock = RwLock::new(file);
        let guard = lock
            .read()
            .map_err(io_err)?;
        let mut text = String::new();
        // read() guards only hand out shared refs; &File implements Read
        (&*guard)
            .read_to_string(&mut text)
            .map_err(io_err)?;
        drop(guard);

        Ok(parse_ledger(&text))
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    fn ledger(dir: &Path) -> CatalogLedger
    {
        CatalogLedger::new(Some(dir.to_path_buf()), DEFAULT_LEDGER_FILE, NameFormat::default())
    }

    #[test]
    fn catalog_path_drops_own_segment_and_formats()
    {
        let base = Path::new("/lib");
        let f = NameFormat::default();
        assert_eq!(
            catalog_path(Path::new("/lib/HardWood/dark_oak/Oak2"), base, &f).unwrap(),
            Some("Hard Wood/dark oak".to_string())
        );
        assert_eq!(catalog_path(Path::new("/lib/Oak"), base, &f).unwrap(), None);
        assert!(matches!(
            catalog_path(Path::new("/elsewhere/Oak"), base, &f),
            Err(CatalogError::OutsideBase { .. })
        ));
    }

    #[test]
    fn parse_splits_on_first_colon_only()
    {
        let entries = parse_ledger("VERSION 1\n# comment: ignored\nabc:Wood/Oak: Old\n\nxyz:Stone\n");
        assert_eq!(
            entries,
            vec![
                CatalogEntry { id: "abc".into(), path: "Wood/Oak: Old".into() },
                CatalogEntry { id: "xyz".into(), path: "Stone".into() },
            ]
        );
    }

    #[test]
    fn repeated_path_takes_the_later_id()
    {
        let entries = parse_ledger("old:Wood\nxyz:Stone\nnew:Wood\n");
        assert_eq!(
            entries,
            vec![
                CatalogEntry { id: "new".into(), path: "Wood".into() },
                CatalogEntry { id: "xyz".into(), path: "Stone".into() },
            ]
        );
    }

    #[test]
    fn unformatted_whitespace_survives_the_round_trip() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        let l = CatalogLedger::new(
            Some(lib.path().to_path_buf()),
            DEFAULT_LEDGER_FILE,
            NameFormat::disabled(),
        );
        let base = Path::new("/tex");

        let first = l.get_or_create(Path::new("/tex/Wood /Oak"), base)?;
        let again = l.get_or_create(Path::new("/tex/Wood /Oak"), base)?;
        assert_eq!(first, again);

        let text = fs::read_to_string(lib.path().join(DEFAULT_LEDGER_FILE))?;
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with(":Wood \n"));
        Ok(())
    }

    #[test]
    fn line_breaks_in_segments_stay_on_one_line() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        let l = CatalogLedger::new(
            Some(lib.path().to_path_buf()),
            DEFAULT_LEDGER_FILE,
            NameFormat::disabled(),
        );
        let base = Path::new("/tex");

        let first = l.get_or_create(Path::new("/tex/Wo\nod/Oak"), base)?;
        let again = l.get_or_create(Path::new("/tex/Wo\nod/Oak"), base)?;
        assert_eq!(first, again);

        let entries = l.entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "Wo od");
        Ok(())
    }

    #[test]
    fn unopenable_ledger_is_an_io_error() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        // Ledger name taken by a directory
        fs::create_dir(lib.path().join(DEFAULT_LEDGER_FILE))?;
        let err = ledger(lib.path())
            .get_or_create(Path::new("/a/Wood/Oak"), Path::new("/a"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        Ok(())
    }

    #[test]
    fn same_path_returns_same_id() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        let base = Path::new("/assets");
        let l = ledger(lib.path());

        let first = l.get_or_create(Path::new("/assets/Wood/Oak"), base)?;
        let again = l.get_or_create(Path::new("/assets/Wood/Pine"), base)?;
        assert!(first.is_some());
        assert_eq!(first, again);

        let other = l.get_or_create(Path::new("/assets/Stone/Slate"), base)?;
        assert_ne!(first, other);

        let text = fs::read_to_string(lib.path().join(DEFAULT_LEDGER_FILE))?;
        assert_eq!(text.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn reopened_ledger_keeps_identifiers() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        let base = Path::new("/assets");
        let id = ledger(lib.path()).get_or_create(Path::new("/assets/Wood/Oak"), base)?;
        let reopened = ledger(lib.path()).get_or_create(Path::new("/assets/Wood/Oak"), base)?;
        assert_eq!(id, reopened);
        Ok(())
    }

    #[test]
    fn existing_entry_without_trailing_newline_is_respected() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        fs::write(lib.path().join(DEFAULT_LEDGER_FILE), "fixed-id:Wood")?;
        let l = ledger(lib.path());
        let base = Path::new("/a");
        assert_eq!(l.get_or_create(Path::new("/a/Wood/Oak"), base)?, Some("fixed-id".into()));

        let stone = l.get_or_create(Path::new("/a/Stone/Slate"), base)?;
        let entries = l.entries()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(Some(entries[1].id.clone()), stone);
        Ok(())
    }

    #[test]
    fn missing_library_is_no_ledger_context()
    {
        let l = CatalogLedger::new(None, DEFAULT_LEDGER_FILE, NameFormat::default());
        let err = l
            .get_or_create(Path::new("/a/Wood/Oak"), Path::new("/a"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::NoLedgerContext(_)));

        let gone = CatalogLedger::new(
            Some(PathBuf::from("/definitely/not/here")),
            DEFAULT_LEDGER_FILE,
            NameFormat::default(),
        );
        assert!(matches!(gone.entries(), Err(CatalogError::NoLedgerContext(_))));
    }

    #[test]
    fn top_level_folder_needs_no_ledger()
    {
        let l = CatalogLedger::new(None, DEFAULT_LEDGER_FILE, NameFormat::default());
        assert!(matches!(l.get_or_create(Path::new("/a/Oak"), Path::new("/a")), Ok(None)));
    }

    #[test]
    fn concurrent_callers_agree_on_one_identifier() -> anyhow::Result<()>
    {
        let lib = TempDir::new()?;
        let l = Arc::new(ledger(lib.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let l = Arc::clone(&l);
                thread::spawn(move || {
                    l.get_or_create(Path::new("/a/Metal/Rusty/Plate"), Path::new("/a"))
                        .unwrap()
                })
            })
            .collect();

        let ids: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        assert!(ids.iter().all(|id| id == &ids[0]));

        let entries = l.entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "Metal/Rusty");
        Ok(())
    }
}
