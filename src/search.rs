//! Command Palette Search
//!
//! Ranks the items of a tree against a query. Matching is case-insensitive;
//! title matches beat content matches.

use crate::domain::Item;
use crate::hierarchy::{breadcrumb, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Content,
    TitleSubstring,
    TitlePrefix,
    TitleExact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub item: Item,
    pub kind: MatchKind,
    /// Ancestor titles, root first
    pub breadcrumb: Vec<String>,
}

fn match_kind(item: &Item, needle: &str) -> Option<MatchKind> {
    let title = item.title.to_lowercase();
    if title == needle {
        Some(MatchKind::TitleExact)
    } else if title.starts_with(needle) {
        Some(MatchKind::TitlePrefix)
    } else if title.contains(needle) {
        Some(MatchKind::TitleSubstring)
    } else if item
        .content
        .as_deref()
        .is_some_and(|c| strip_markup(c).to_lowercase().contains(needle))
    {
        Some(MatchKind::Content)
    } else {
        None
    }
}

/// Text of an HTML fragment, tags dropped
fn strip_markup(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text
}

fn collect<'a>(nodes: &'a [TreeNode], needle: &str, out: &mut Vec<(&'a Item, MatchKind)>) {
    for node in nodes {
        if let Some(kind) = match_kind(&node.item, needle) {
            out.push((&node.item, kind));
        }
        collect(&node.children, needle, out);
    }
}

/// Best matches first, at most `limit`. An empty query matches nothing.
pub fn search(tree: &[TreeNode], query: &str, limit: usize) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut matches = Vec::new();
    collect(tree, &needle, &mut matches);
    matches.sort_by(|(a, ka), (b, kb)| {
        kb.cmp(ka)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });

    matches
        .into_iter()
        .take(limit)
        .map(|(item, kind)| SearchHit {
            item: item.clone(),
            kind,
            breadcrumb: breadcrumb(tree, &item.id),
        })
        .collect()
}
