//! Accessors over `roxmltree` nodes that turn missing or unparsable data into
//! [`Error::Malformed`] with the offending path attached.

use crate::{Error, ErrorContext, Result};
use roxmltree::Node;
use std::str::FromStr;

/// Placeholder the API emits for plays without a recorded date.
pub const MISSING_DATE: &str = "0000-00-00";

fn path_of(node: Node<'_, '_>, attr: Option<&str>) -> String {
    let tag = node.tag_name().name();
    match attr {
        Some(a) => format!("{}@{}", tag, a),
        None => tag.to_string(),
    }
}

fn malformed(node: Node<'_, '_>, attr: Option<&str>, details: String) -> Error {
    Error::malformed_with_context(
        "unexpected document content",
        ErrorContext::new()
            .with_field_path(path_of(node, attr))
            .with_details(details)
            .with_source("xml_model"),
    )
}

/// Fail unless `node` is an element named `tag`.
pub fn expect_tag(node: Node<'_, '_>, tag: &str) -> Result<()> {
    if node.is_element() && node.tag_name().name() == tag {
        return Ok(());
    }
    Err(Error::malformed_with_context(
        format!("unexpected root tag '{}'", node.tag_name().name()),
        ErrorContext::new()
            .with_field_path(tag)
            .with_details(format!("expected '{}'", tag))
            .with_source("xml_model"),
    ))
}

/// Child elements, skipping text and comments.
pub fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(|n| n.is_element())
}

pub fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    elements(node).filter(move |n| n.tag_name().name() == tag)
}

pub fn child<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|n| n.tag_name().name() == tag)
}

pub fn required_child<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Result<Node<'a, 'input>> {
    child(node, tag).ok_or_else(|| malformed(node, None, format!("missing <{}>", tag)))
}

pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name)
        .ok_or_else(|| malformed(node, Some(name), "missing attribute".into()))
}

pub fn parse_attr<T>(node: Node<'_, '_>, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = attr(node, name)?;
    raw.trim()
        .parse()
        .map_err(|e| malformed(node, Some(name), format!("{:?}: {}", raw, e)))
}

/// Like [`parse_attr`] but an absent attribute is `None`.
pub fn parse_attr_opt<T>(node: Node<'_, '_>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match node.attribute(name) {
        None => Ok(None),
        Some(_) => parse_attr(node, name).map(Some),
    }
}

/// `"0"` / `"1"` flag attribute.
pub fn flag_attr(node: Node<'_, '_>, name: &str) -> Result<bool> {
    match attr(node, name)? {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(malformed(
            node,
            Some(name),
            format!("expected 0 or 1, got {:?}", other),
        )),
    }
}

/// String attribute where the empty string means "not set".
pub fn optional_str(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric id attribute where `""` and `"0"` mean "not set".
pub fn optional_id(node: Node<'_, '_>, name: &str) -> Result<Option<u64>> {
    match node.attribute(name) {
        None | Some("") | Some("0") => Ok(None),
        Some(_) => parse_attr(node, name).map(Some),
    }
}

/// The `value` attribute of the child `tag`, e.g. `<yearpublished value="1995"/>`.
pub fn child_value<T>(node: Node<'_, '_>, tag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_attr(required_child(node, tag)?, "value")
}

/// Like [`child_value`], but an absent child is `None`.
pub fn child_value_opt<T>(node: Node<'_, '_>, tag: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match child(node, tag) {
        None => Ok(None),
        Some(c) => parse_attr(c, "value").map(Some),
    }
}

/// Text content of the child `tag`; `None` when the child is absent or empty.
pub fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn required_child_text(node: Node<'_, '_>, tag: &str) -> Result<String> {
    let c = required_child(node, tag)?;
    Ok(c.text().map(str::trim).unwrap_or_default().to_string())
}

/// Parse the text of the child `tag`.
pub fn parse_child_text<T>(node: Node<'_, '_>, tag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let c = required_child(node, tag)?;
    let raw = c.text().unwrap_or_default().trim();
    raw.parse()
        .map_err(|e| malformed(c, None, format!("{:?}: {}", raw, e)))
}
