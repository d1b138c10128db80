use super::xml::{
    attr, children_named, expect_tag, optional_id, parse_attr, parse_child_text,
    required_child_text,
};
use crate::{Error, ErrorContext, Result};
use chrono::{DateTime, Utc};
use roxmltree::Node;
use serde::Serialize;

/// A user-curated list of things (XML API v1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeekList {
    pub id: u64,
    pub post_date: DateTime<Utc>,
    pub edit_date: DateTime<Utc>,
    pub thumbs: u32,
    pub num_items: u32,
    pub username: String,
    pub title: String,
    pub description: String,
    pub items: Vec<GeekListItem>,
    pub comments: Vec<GeekListComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeekListItem {
    pub id: u64,
    pub object_type: String,
    pub subtype: String,
    pub object_id: u64,
    pub object_name: String,
    pub username: String,
    pub post_date: DateTime<Utc>,
    pub edit_date: DateTime<Utc>,
    pub thumbs: u32,
    pub image_id: Option<u64>,
    pub body: String,
    pub comments: Vec<GeekListComment>,
}

/// Present only when the list was requested with comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeekListComment {
    pub username: String,
    pub thumbs: u32,
    pub text: String,
}

impl GeekList {
    /// Items of one `(objecttype, subtype)`, e.g. `("thing", "boardgame")`.
    pub fn items_of<'a>(
        &'a self,
        object_type: &'a str,
        subtype: &'a str,
    ) -> impl Iterator<Item = &'a GeekListItem> + 'a {
        self.items
            .iter()
            .filter(move |i| i.object_type == object_type && i.subtype == subtype)
    }
}

pub fn parse_geeklist(root: Node<'_, '_>) -> Result<GeekList> {
    expect_tag(root, "geeklist")?;
    Ok(GeekList {
        id: parse_attr(root, "id")?,
        post_date: timestamp(root, "postdate_timestamp")?,
        edit_date: timestamp(root, "editdate_timestamp")?,
        thumbs: parse_child_text(root, "thumbs")?,
        num_items: parse_child_text(root, "numitems")?,
        username: required_child_text(root, "username")?,
        title: required_child_text(root, "title")?,
        description: required_child_text(root, "description")?,
        items: children_named(root, "item")
            .map(parse_item)
            .collect::<Result<Vec<_>>>()?,
        comments: parse_comments(root)?,
    })
}

fn parse_item(node: Node<'_, '_>) -> Result<GeekListItem> {
    Ok(GeekListItem {
        id: parse_attr(node, "id")?,
        object_type: attr(node, "objecttype")?.to_string(),
        subtype: attr(node, "subtype")?.to_string(),
        object_id: parse_attr(node, "objectid")?,
        object_name: attr(node, "objectname")?.to_string(),
        username: attr(node, "username")?.to_string(),
        post_date: rfc2822(node, "postdate")?,
        edit_date: rfc2822(node, "editdate")?,
        thumbs: parse_attr(node, "thumbs")?,
        image_id: optional_id(node, "imageid")?,
        body: required_child_text(node, "body")?,
        comments: parse_comments(node)?,
    })
}

fn parse_comments(node: Node<'_, '_>) -> Result<Vec<GeekListComment>> {
    children_named(node, "comment")
        .map(|c| -> Result<GeekListComment> {
            Ok(GeekListComment {
                username: attr(c, "username")?.to_string(),
                thumbs: parse_attr(c, "thumbs")?,
                text: c.text().map(str::trim).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn timestamp(node: Node<'_, '_>, tag: &str) -> Result<DateTime<Utc>> {
    let secs: i64 = parse_child_text(node, tag)?;
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        Error::malformed_with_context(
            "timestamp out of range",
            ErrorContext::new()
                .with_field_path(format!("geeklist/{}", tag))
                .with_details(secs.to_string()),
        )
    })
}

/// Item dates look like `Sat, 06 Jan 2018 16:51:15 +0000`.
fn rfc2822(node: Node<'_, '_>, name: &str) -> Result<DateTime<Utc>> {
    let raw = attr(node, name)?;
    DateTime::parse_from_rfc2822(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            Error::malformed_with_context(
                "invalid date",
                ErrorContext::new()
                    .with_field_path(format!("item@{}", name))
                    .with_details(format!("{:?}: {}", raw, e)),
            )
        })
}
