//! Filename tokenizer and affix reducer.
//!
//! `tokenize` turns `WallTexture_diff_2k.002.jpg` into
//! `["wall", "texture", "diff", "k"]`. `reduce` then strips tokens that every
//! candidate in a batch shares at the front or back (a project or material
//! name baked into all files) and drops candidates that cannot match any
//! keyword, repeating until nothing changes.

use std::collections::BTreeSet;
use std::hash::Hash;
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// Characters treated as word separators inside a filename.
const SEPARATORS: [&str; 6] = ["_", ".", "-", "__", "--", "#"];

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex"));

/// Split a filename into lowercase word tokens.
///
/// Order is preserved and duplicates are kept. Pieces that end up empty
/// after separator replacement are dropped on purpose, so
/// `WallTexture_diff_2k.002.jpg` yields exactly four tokens and a name made
/// only of digits yields an empty list.
pub fn tokenize(file_name: &str) -> Vec<String>
{
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| {
            s.to_string_lossy()
                .into_owned()
        })
        .unwrap_or_default();

    let without_digits: String = stem
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect();

    let mut spaced = CAMEL_BOUNDARY
        .replace_all(&without_digits, "$1 $2")
        .into_owned();

    for sep in SEPARATORS
    {
        spaced = spaced.replace(sep, " ");
    }

    spaced
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Strip the first token when every list starts with the same one.
/// A single empty list or disagreement leaves the set untouched.
fn strip_common_prefix<K>(candidates: &mut IndexMap<K, Vec<String>>) -> bool
where
    K: Hash + Eq,
{
    let Some(first) = candidates
        .values()
        .next()
        .and_then(|t| t.first())
        .cloned()
    else
    {
        return false;
    };

    let shared = candidates
        .values()
        .all(|t| t.first() == Some(&first));
    if !shared
    {
        return false;
    }

    for tokens in candidates.values_mut()
    {
        tokens.remove(0);
    }
    true
}

/// Mirror of [`strip_common_prefix`] for the last token.
fn strip_common_suffix<K>(candidates: &mut IndexMap<K, Vec<String>>) -> bool
where
    K: Hash + Eq,
{
    let Some(last) = candidates
        .values()
        .next()
        .and_then(|t| t.last())
        .cloned()
    else
    {
        return false;
    };

    let shared = candidates
        .values()
        .all(|t| t.last() == Some(&last));
    if !shared
    {
        return false;
    }

    for tokens in candidates.values_mut()
    {
        tokens.pop();
    }
    true
}

/// Remove candidates whose tokens hit no keyword at all.
///
/// The doomed keys are collected first and removed in a second pass;
/// `shift_remove` keeps the enumeration order of the survivors.
fn prune_dead<K>(
    candidates: &mut IndexMap<K, Vec<String>>,
    keywords: &BTreeSet<String>,
) -> bool
where
    K: Hash + Eq + Clone,
{
    let dead: Vec<K> = candidates
        .iter()
        .filter(|(_, tokens)| {
            !tokens
                .iter()
                .any(|t| keywords.contains(t))
        })
        .map(|(k, _)| k.clone())
        .collect();

    for key in &dead
    {
        candidates.shift_remove(key);
    }
    !dead.is_empty()
}

/// Reduce a candidate set to its discriminating tokens.
///
/// Runs prefix strip, suffix strip and dead-candidate pruning until a pass
/// changes nothing or fewer than two candidates remain.
pub fn reduce<K>(
    mut candidates: IndexMap<K, Vec<String>>,
    keywords: &BTreeSet<String>,
) -> IndexMap<K, Vec<String>>
where
    K: Hash + Eq + Clone,
{
    while candidates.len() > 1
    {
        let mut changed = strip_common_prefix(&mut candidates);
        changed |= strip_common_suffix(&mut candidates);
        changed |= prune_dead(&mut candidates, keywords);

        if !changed
        {
            break;
        }
    }
    candidates
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn kw(words: &[&str]) -> BTreeSet<String>
    {
        words
            .iter()
            .map(|w| w.to_string())
            .collect()
    }

    fn set(entries: &[(&'static str, &[&str])]) -> IndexMap<&'static str, Vec<String>>
    {
        entries
            .iter()
            .map(|(k, toks)| {
                (
                    *k,
                    toks.iter()
                        .map(|t| t.to_string())
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn tokenize_drops_digits_and_splits_camel_case()
    {
        insta::assert_debug_snapshot!(tokenize("WallTexture_diff_2k.002.jpg"), @r#"
        [
            "wall",
            "texture",
            "diff",
            "k",
        ]
        "#);
    }

    #[test]
    fn tokenize_handles_every_separator()
    {
        assert_eq!(
            tokenize("a-b--c__d#e.f.png"),
            vec!["a", "b", "c", "d", "e", "f"]
        );
    }

    #[test]
    fn tokenize_is_pure()
    {
        let name = "Rock03_NRM-GL_4K.tif";
        assert_eq!(tokenize(name), tokenize(name));
        assert_eq!(tokenize(name), vec!["rock", "nrm", "gl", "k"]);
    }

    #[test]
    fn tokenize_digits_only_is_empty()
    {
        assert!(tokenize("0001.png").is_empty());
    }

    #[test]
    fn shared_prefix_is_stripped()
    {
        let c = set(&[
            ("a_rough.png", &["a", "rough"]),
            ("a_normal.png", &["a", "normal"]),
        ]);
        let out = reduce(c, &kw(&["rough", "normal"]));
        assert_eq!(out["a_rough.png"], vec!["rough"]);
        assert_eq!(out["a_normal.png"], vec!["normal"]);
    }

    #[test]
    fn shared_suffix_is_stripped_repeatedly()
    {
        let c = set(&[
            ("x", &["diff", "oak", "k"]),
            ("y", &["rough", "oak", "k"]),
        ]);
        let out = reduce(c, &kw(&["diff", "rough", "oak"]));
        assert_eq!(out["x"], vec!["diff"]);
        assert_eq!(out["y"], vec!["rough"]);
    }

    #[test]
    fn disagreement_blocks_partial_strip()
    {
        let c = set(&[
            ("x", &["a", "diff"]),
            ("y", &["a", "rough"]),
            ("z", &["b", "normal"]),
        ]);
        let out = reduce(c, &kw(&["diff", "rough", "normal"]));
        assert_eq!(out["x"], vec!["a", "diff"]);
        assert_eq!(out["z"], vec!["b", "normal"]);
    }

    #[test]
    fn empty_list_blocks_prefix_strip()
    {
        let c = set(&[("x", &[]), ("y", &["rough"])]);
        let out = reduce(c, &kw(&["rough"]));
        // x is pruned as dead, y is alone and keeps its token
        assert_eq!(out.len(), 1);
        assert_eq!(out["y"], vec!["rough"]);
    }

    #[test]
    fn dead_candidates_are_pruned_in_order()
    {
        let c = set(&[
            ("preview", &["preview", "render"]),
            ("d", &["stone", "diff"]),
            ("r", &["stone", "rough"]),
        ]);
        let out = reduce(c, &kw(&["diff", "rough"]));
        let keys: Vec<_> = out
            .keys()
            .copied()
            .collect();
        assert_eq!(keys, vec!["d", "r"]);
        assert_eq!(out["d"], vec!["diff"]);
    }

    #[test]
    fn single_candidate_is_left_alone()
    {
        let c = set(&[("only", &["only", "thing"])]);
        let out = reduce(c, &kw(&["diff"]));
        assert_eq!(out["only"], vec!["only", "thing"]);
    }
}
