use super::xml::{attr, child_value_opt, children_named, expect_tag, parse_attr, required_child};
use crate::Result;
use roxmltree::Node;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub total: u32,
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    pub kind: String,
    pub id: u64,
    pub name: String,
    /// `primary` or `alternate`: which of the thing's names matched.
    pub name_kind: String,
    pub year_published: Option<i32>,
}

pub fn parse_search_results(root: Node<'_, '_>) -> Result<SearchResults> {
    expect_tag(root, "items")?;
    let items = children_named(root, "item")
        .map(|item| -> Result<SearchItem> {
            let name = required_child(item, "name")?;
            Ok(SearchItem {
                kind: attr(item, "type")?.to_string(),
                id: parse_attr(item, "id")?,
                name: attr(name, "value")?.to_string(),
                name_kind: attr(name, "type")?.to_string(),
                year_published: child_value_opt(item, "yearpublished")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SearchResults {
        total: parse_attr(root, "total")?,
        items,
    })
}
