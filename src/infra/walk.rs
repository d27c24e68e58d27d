//! Filepath: src/infra/walk.rs
//! Texture-library walker.
//! - Enumerates every sub-folder of a root (root excluded)
//! - Lists the image files directly inside one folder
//! - Extra ignore globs, matched on root-relative paths
//! - Optional hidden-entry policy, symlink following and max depth
//! - Deterministic ordering: folders and files come back sorted
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};

/// Library walker with optional extra ignore globs.
/// Extra globs prune directories during traversal and filter files late.
pub struct FolderWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Include hidden (dot) entries; default false
    include_hidden: bool,

    /// Honor .gitignore/.ignore files; default true
    respect_gitignore: bool,

    /// Follow symbolic links; default false
    follow_symlinks: bool,

    /// Maximum folder depth below the root; default None (unbounded)
    max_depth: Option<usize>,
}

impl FolderWalker
{
    /// Build a walker with additional ignore patterns (e.g. "**/previews",
    /// "**/_old/**"). Patterns match on paths relative to the walked root.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            include_hidden: false,
            respect_gitignore: true,
            follow_symlinks: false,
            max_depth: None,
        })
    }

    /// (Optional) Include or exclude hidden entries (dotfiles and dot-folders).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// (Optional) Honor or skip ignore files found in the library.
    pub fn with_gitignore(
        mut self,
        respect: bool,
    ) -> Self
    {
        self.respect_gitignore = respect;
        self
    }

    /// (Optional) Follow or skip symbolic links (default false).
    pub fn with_follow_symlinks(
        mut self,
        follow: bool,
    ) -> Self
    {
        self.follow_symlinks = follow;
        self
    }

    /// (Optional) Limit folder depth (`None` = unbounded).
    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    /// Internal: construct a configured WalkBuilder for `start`, matching
    /// extra globs relative to `root`.
    fn build_walk(
        &self,
        root: &Path,
        start: &Path,
        max_depth: Option<usize>,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(start);

        // WalkBuilder::hidden(true) => *skip* dotfiles
        b.hidden(!self.include_hidden);

        b.git_ignore(self.respect_gitignore);
        b.git_global(self.respect_gitignore);
        b.git_exclude(self.respect_gitignore);
        b.ignore(self.respect_gitignore);
        // Texture libraries are rarely git checkouts
        b.require_git(false);

        b.follow_links(self.follow_symlinks);
        b.max_depth(max_depth);

        // Early directory pruning using extra ignores
        let extra = self
            .ignore_patterns
            .clone();
        let root = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);
            if !is_dir
            {
                return true;
            }
            let rel = ent
                .path()
                .strip_prefix(&root)
                .unwrap_or(ent.path());
            rel.as_os_str()
                .is_empty()
                || !extra.is_match(rel)
        });

        b
    }

    /// Every folder below `root`, sorted. The root itself is not included.
    pub fn walk_folders<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root_path = root.as_ref();
        let walker = self
            .build_walk(root_path, root_path, self.max_depth)
            .build();

        let mut out: Vec<PathBuf> = walker
            // Drop entries with IO errors
            .filter_map(|res| res.ok())
            .filter(|entry| entry.depth() > 0)
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_dir())
            })
            .map(|entry| entry.into_path())
            .collect();

        // Deterministic order (stable manifests & tests)
        out.sort();

        out
    }

    /// Regular files directly inside `folder` whose extension is in
    /// `extensions` (case-insensitive), sorted by name.
    pub fn list_images(
        &self,
        root: &Path,
        folder: &Path,
        extensions: &[String],
    ) -> Vec<PathBuf>
    {
        let walker = self
            .build_walk(root, folder, Some(1))
            .build();

        let mut out: Vec<PathBuf> = walker
            .filter_map(|res| res.ok())
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            .filter(|p| has_extension(p, extensions))
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        out.sort();

        out
    }
}

/// Case-insensitive extension allow-list check.
pub fn has_extension(
    path: &Path,
    extensions: &[String],
) -> bool
{
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}
