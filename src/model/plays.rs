use super::xml::{
    attr, child, child_text, children_named, elements, expect_tag, flag_attr, optional_id,
    optional_str, parse_attr, MISSING_DATE,
};
use crate::paging::Page;
use crate::Result;
use chrono::NaiveDate;
use roxmltree::Node;
use serde::Serialize;

/// One page of a `<plays>` response.
pub type PlaysPage = Page<Play>;

/// A logged play session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Play {
    pub id: u64,
    pub user_id: u64,
    /// `None` for the `0000-00-00` placeholder and unparsable dates.
    pub date: Option<NaiveDate>,
    pub quantity: u32,
    pub length_minutes: u32,
    pub incomplete: bool,
    pub now_in_stats: bool,
    pub location: Option<String>,
    pub item: PlayItem,
    pub comments: Option<String>,
    pub players: Vec<Player>,
}

/// The thing a play was logged against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayItem {
    pub name: String,
    pub object_type: String,
    pub object_id: u64,
    pub subtypes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub username: Option<String>,
    pub user_id: Option<u64>,
    pub name: String,
    pub start_position: Option<String>,
    pub color: Option<String>,
    pub score: Option<String>,
    pub new: bool,
    pub rating: f64,
    pub win: bool,
}

pub fn parse_plays_page(root: Node<'_, '_>) -> Result<PlaysPage> {
    expect_tag(root, "plays")?;
    let total = parse_attr(root, "total")?;
    let page = parse_attr(root, "page")?;
    let items = children_named(root, "play")
        .map(parse_play)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page { items, total, page })
}

pub fn parse_play(node: Node<'_, '_>) -> Result<Play> {
    expect_tag(node, "play")?;
    let date = match attr(node, "date")? {
        MISSING_DATE => None,
        raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
    };
    let item = child(node, "item")
        .ok_or_else(|| crate::Error::malformed("play without <item>"))
        .and_then(parse_play_item)?;
    let players = match child(node, "players") {
        Some(players) => children_named(players, "player")
            .map(parse_player)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Play {
        id: parse_attr(node, "id")?,
        user_id: parse_attr(node, "userid")?,
        date,
        quantity: parse_attr(node, "quantity")?,
        length_minutes: parse_attr(node, "length")?,
        incomplete: flag_attr(node, "incomplete")?,
        now_in_stats: flag_attr(node, "nowinstats")?,
        location: optional_str(node, "location"),
        item,
        comments: child_text(node, "comments"),
        players,
    })
}

fn parse_play_item(node: Node<'_, '_>) -> Result<PlayItem> {
    let subtypes = match child(node, "subtypes") {
        Some(s) => elements(s)
            .map(|st| attr(st, "value").map(str::to_string))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(PlayItem {
        name: attr(node, "name")?.to_string(),
        object_type: attr(node, "objecttype")?.to_string(),
        object_id: parse_attr(node, "objectid")?,
        subtypes,
    })
}

fn parse_player(node: Node<'_, '_>) -> Result<Player> {
    let rating = match node.attribute("rating") {
        None | Some("") => 0.0,
        Some(_) => parse_attr(node, "rating")?,
    };
    Ok(Player {
        username: optional_str(node, "username"),
        user_id: optional_id(node, "userid")?,
        name: attr(node, "name")?.to_string(),
        start_position: optional_str(node, "startposition"),
        color: optional_str(node, "color"),
        score: optional_str(node, "score"),
        new: flag_attr(node, "new")?,
        rating,
        win: flag_attr(node, "win")?,
    })
}
