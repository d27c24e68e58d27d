//! `matcat catalog <LIBRARY>`: print the ledger as a tree of catalog paths.

use std::collections::BTreeMap;

use anyhow::Result;
use owo_colors::OwoColorize;
use ptree::TreeBuilder;

use crate::cli::{AppContext, CatalogArgs};
use crate::core::catalog::{CatalogEntry, CatalogLedger};
use crate::core::generate::{expand_path, load_config_or_default};

#[derive(Debug, Default)]
struct CatalogNode
{
    id: Option<String>,
    children: BTreeMap<String, CatalogNode>,
}

/// Fold flat `a/b/c` entries into a tree. Intermediate segments without a
/// ledger line of their own carry no id.
fn build_tree(entries: &[CatalogEntry]) -> CatalogNode
{
    let mut root = CatalogNode::default();
    for entry in entries
    {
        let mut node = &mut root;
        for seg in entry.path.split('/')
        {
            node = node
                .children
                .entry(seg.to_string())
                .or_default();
        }
        node.id = Some(entry.id.clone());
    }
    root
}

fn label(
    name: &str,
    node: &CatalogNode,
    color: bool,
) -> String
{
    match (&node.id, color)
    {
        (Some(id), true) => format!("{} {}", name.blue(), id.dimmed()),
        (Some(id), false) => format!("{name} {id}"),
        (None, _) => name.to_string(),
    }
}

fn add_children(
    builder: &mut TreeBuilder,
    children: &BTreeMap<String, CatalogNode>,
    color: bool,
)
{
    for (name, child) in children
    {
        if child.children.is_empty()
        {
            builder.add_empty_child(label(name, child, color));
        }
        else
        {
            builder.begin_child(label(name, child, color));
            add_children(builder, &child.children, color);
            builder.end_child();
        }
    }
}

pub fn run(
    args: CatalogArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = load_config_or_default();
    let library = expand_path(&args.library);
    let ledger = CatalogLedger::new(
        Some(library.clone()),
        config.catalog.file_name,
        config.name_format,
    );
    let entries = ledger.entries()?;

    if ctx.quiet
    {
        return Ok(());
    }
    if entries.is_empty()
    {
        println!("No catalog entries in {}", library.display());
        return Ok(());
    }

    let tree = build_tree(&entries);
    let mut builder = TreeBuilder::new(library.display().to_string());
    add_children(&mut builder, &tree.children, !ctx.no_color);
    ptree::print_tree(&builder.build())?;
    Ok(())
}
