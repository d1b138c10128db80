use super::xml::{
    attr, child, child_text, child_value_opt, children_named, elements, expect_tag, parse_attr,
    parse_attr_opt,
};
use crate::{Error, ErrorContext, Result};
use roxmltree::Node;
use serde::Serialize;

/// Value the API uses for unranked games in `<rank>`.
const NOT_RANKED: &str = "Not Ranked";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Name {
    /// `primary` or `alternate`.
    pub kind: String,
    pub sort_index: Option<u32>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    /// e.g. `boardgamecategory`, `boardgamefamily`, `boardgamedesigner`.
    pub kind: String,
    pub id: u64,
    pub value: String,
    pub inbound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResult {
    pub value: String,
    pub num_votes: u32,
    /// Only present in the language dependence poll.
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResults {
    /// Only present in the player count poll.
    pub num_players: Option<String>,
    pub results: Vec<PollResult>,
}

impl PollResults {
    pub fn votes_for(&self, value: &str) -> Option<u32> {
        self.results
            .iter()
            .find(|r| r.value == value)
            .map(|r| r.num_votes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poll {
    pub name: String,
    pub title: String,
    pub total_votes: u32,
    pub results: Vec<PollResults>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rank {
    /// `subtype` for the overall rank, `family` for category ranks.
    pub kind: String,
    pub id: u64,
    pub name: String,
    pub friendly_name: String,
    pub value: Option<u32>,
    pub bayes_average: Option<f64>,
}

/// Community statistics, present when the request asked for `stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratings {
    pub users_rated: u32,
    pub average: f64,
    pub bayes_average: f64,
    pub stddev: f64,
    pub median: f64,
    pub ranks: Vec<Rank>,
    pub owned: u32,
    pub trading: u32,
    pub wanting: u32,
    pub wishing: u32,
    pub num_comments: u32,
    pub num_weights: u32,
    pub average_weight: f64,
}

/// An entry of the things database: a game, expansion, accessory or version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thing {
    pub kind: String,
    pub id: u64,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub names: Vec<Name>,
    pub description: Option<String>,
    pub year_published: Option<i32>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub min_playtime: Option<u32>,
    pub max_playtime: Option<u32>,
    pub min_age: Option<u32>,
    pub product_code: Option<String>,
    pub links: Vec<Link>,
    pub polls: Vec<Poll>,
    pub ratings: Option<Ratings>,
    /// Published versions, present when the request asked for `versions`.
    pub versions: Vec<Thing>,
}

impl Thing {
    pub fn primary_name(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.kind == "primary")
            .map(|n| n.value.as_str())
    }

    pub fn links_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.kind == kind)
    }

    /// Published `(min, max)` player count.
    pub fn player_count(&self) -> Option<(u32, u32)> {
        Some((self.min_players?, self.max_players?))
    }

    pub fn poll(&self, name: &str) -> Option<&Poll> {
        self.polls.iter().find(|p| p.name == name)
    }

    /// Rank within the thing's own subtype, e.g. the overall board game rank.
    pub fn overall_rank(&self) -> Option<u32> {
        self.ratings
            .as_ref()?
            .ranks
            .iter()
            .find(|r| r.name == self.kind)
            .and_then(|r| r.value)
    }

    /// Category names ordered by the thing's rank in each, best first.
    pub fn categories(&self) -> Vec<String> {
        let Some(ratings) = &self.ratings else {
            return Vec::new();
        };
        let mut family: Vec<&Rank> = ratings.ranks.iter().filter(|r| r.kind == "family").collect();
        family.sort_by_key(|r| r.value.unwrap_or(u32::MAX));
        family
            .into_iter()
            .map(|r| {
                r.friendly_name
                    .split(' ')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    pub fn primary_category(&self) -> Option<String> {
        self.categories().into_iter().next()
    }
}

/// Parse a `<items>` document of things.
pub fn parse_things(root: Node<'_, '_>) -> Result<Vec<Thing>> {
    expect_tag(root, "items")?;
    children_named(root, "item").map(parse_thing).collect()
}

pub fn parse_thing(node: Node<'_, '_>) -> Result<Thing> {
    expect_tag(node, "item")?;

    let versions = match child(node, "versions") {
        Some(v) => children_named(v, "item")
            .map(|version| -> Result<Thing> {
                let parsed = parse_thing(version)?;
                if parsed.kind != "boardgameversion" {
                    return Err(Error::malformed_with_context(
                        format!("unexpected type '{}' in versions list", parsed.kind),
                        ErrorContext::new().with_field_path("item/versions/item@type"),
                    ));
                }
                Ok(parsed)
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let ratings = match child(node, "statistics").and_then(|s| child(s, "ratings")) {
        Some(r) => Some(parse_ratings(r)?),
        None => None,
    };

    Ok(Thing {
        kind: attr(node, "type")?.to_string(),
        id: parse_attr(node, "id")?,
        thumbnail: child_text(node, "thumbnail"),
        image: child_text(node, "image"),
        names: parse_names(node)?,
        description: child_text(node, "description"),
        year_published: child_value_opt(node, "yearpublished")?,
        min_players: child_value_opt(node, "minplayers")?,
        max_players: child_value_opt(node, "maxplayers")?,
        min_playtime: child_value_opt(node, "minplaytime")?,
        max_playtime: child_value_opt(node, "maxplaytime")?,
        min_age: child_value_opt(node, "minage")?,
        product_code: child(node, "productcode")
            .and_then(|c| c.attribute("value"))
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        links: parse_links(node)?,
        polls: children_named(node, "poll")
            .map(parse_poll)
            .collect::<Result<Vec<_>>>()?,
        ratings,
        versions,
    })
}

pub(crate) fn parse_names(node: Node<'_, '_>) -> Result<Vec<Name>> {
    children_named(node, "name")
        .map(|n| -> Result<Name> {
            Ok(Name {
                kind: attr(n, "type")?.to_string(),
                sort_index: parse_attr_opt(n, "sortindex")?,
                value: attr(n, "value")?.to_string(),
            })
        })
        .collect()
}

pub(crate) fn parse_links(node: Node<'_, '_>) -> Result<Vec<Link>> {
    children_named(node, "link")
        .map(|l| -> Result<Link> {
            Ok(Link {
                kind: attr(l, "type")?.to_string(),
                id: parse_attr(l, "id")?,
                value: attr(l, "value")?.to_string(),
                inbound: l.attribute("inbound") == Some("true"),
            })
        })
        .collect()
}

fn parse_poll(node: Node<'_, '_>) -> Result<Poll> {
    let results = children_named(node, "results")
        .map(|rs| -> Result<PollResults> {
            let results = children_named(rs, "result")
                .map(|r| -> Result<PollResult> {
                    Ok(PollResult {
                        value: attr(r, "value")?.to_string(),
                        num_votes: parse_attr(r, "numvotes")?,
                        level: parse_attr_opt(r, "level")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(PollResults {
                num_players: rs.attribute("numplayers").map(str::to_string),
                results,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Poll {
        name: attr(node, "name")?.to_string(),
        title: attr(node, "title")?.to_string(),
        total_votes: parse_attr(node, "totalvotes")?,
        results,
    })
}

fn parse_rank(node: Node<'_, '_>) -> Result<Rank> {
    let value = match attr(node, "value")? {
        NOT_RANKED => None,
        _ => Some(parse_attr(node, "value")?),
    };
    let bayes_average = match attr(node, "bayesaverage")? {
        NOT_RANKED => None,
        _ => Some(parse_attr(node, "bayesaverage")?),
    };
    Ok(Rank {
        kind: attr(node, "type")?.to_string(),
        id: parse_attr(node, "id")?,
        name: attr(node, "name")?.to_string(),
        friendly_name: attr(node, "friendlyname")?.to_string(),
        value,
        bayes_average,
    })
}

fn parse_ratings(node: Node<'_, '_>) -> Result<Ratings> {
    use super::xml::child_value as v;

    let ranks = match child(node, "ranks") {
        Some(r) => elements(r).map(parse_rank).collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Ratings {
        users_rated: v(node, "usersrated")?,
        average: v(node, "average")?,
        bayes_average: v(node, "bayesaverage")?,
        stddev: v(node, "stddev")?,
        median: v(node, "median")?,
        ranks,
        owned: v(node, "owned")?,
        trading: v(node, "trading")?,
        wanting: v(node, "wanting")?,
        wishing: v(node, "wishing")?,
        num_comments: v(node, "numcomments")?,
        num_weights: v(node, "numweights")?,
        average_weight: v(node, "averageweight")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const CATAN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <item type="boardgame" id="13">
    <thumbnail>https://cf.geekdo-images.com/thumb.jpg</thumbnail>
    <image>https://cf.geekdo-images.com/full.jpg</image>
    <name type="primary" sortindex="1" value="CATAN" />
    <name type="alternate" sortindex="1" value="Die Siedler von Catan" />
    <description>Trade, build, settle.</description>
    <yearpublished value="1995" />
    <minplayers value="3" />
    <maxplayers value="4" />
    <poll name="suggested_numplayers" title="User Suggested Number of Players" totalvotes="2">
      <results numplayers="3">
        <result value="Best" numvotes="1" />
        <result value="Recommended" numvotes="1" />
        <result value="Not Recommended" numvotes="0" />
      </results>
    </poll>
    <playingtime value="120" />
    <minplaytime value="60" />
    <maxplaytime value="120" />
    <minage value="10" />
    <link type="boardgamecategory" id="1021" value="Economic" />
    <link type="boardgamefamily" id="3" value="Catan" />
    <statistics page="1">
      <ratings>
        <usersrated value="120000" />
        <average value="7.1" />
        <bayesaverage value="6.9" />
        <ranks>
          <rank type="subtype" id="1" name="boardgame" friendlyname="Board Game Rank" value="500" bayesaverage="6.9" />
          <rank type="family" id="5499" name="familygames" friendlyname="Family Game Rank" value="120" bayesaverage="6.8" />
          <rank type="family" id="5497" name="strategygames" friendlyname="Strategy Game Rank" value="Not Ranked" bayesaverage="Not Ranked" />
        </ranks>
        <stddev value="1.4" />
        <median value="0" />
        <owned value="200000" />
        <trading value="2000" />
        <wanting value="500" />
        <wishing value="6000" />
        <numcomments value="20000" />
        <numweights value="7000" />
        <averageweight value="2.3" />
      </ratings>
    </statistics>
  </item>
</items>"#;

    #[test]
    fn parses_thing_with_stats() {
        let doc = Document::parse(CATAN).unwrap();
        let things = parse_things(doc.root_element()).unwrap();
        assert_eq!(things.len(), 1);

        let catan = &things[0];
        assert_eq!(catan.kind, "boardgame");
        assert_eq!(catan.primary_name(), Some("CATAN"));
        assert_eq!(catan.year_published, Some(1995));
        assert_eq!(catan.player_count(), Some((3, 4)));
        assert_eq!(catan.min_age, Some(10));
        assert_eq!(catan.links_of("boardgamefamily").count(), 1);

        let ratings = catan.ratings.as_ref().unwrap();
        assert_eq!(ratings.users_rated, 120_000);
        assert_eq!(ratings.owned, 200_000);
        assert_eq!(ratings.ranks[2].value, None);
        assert_eq!(catan.overall_rank(), Some(500));
        assert_eq!(catan.primary_category().as_deref(), Some("Family"));
    }

    #[test]
    fn parses_polls() {
        let doc = Document::parse(CATAN).unwrap();
        let catan = parse_things(doc.root_element()).unwrap().remove(0);
        let poll = catan.poll("suggested_numplayers").unwrap();
        assert_eq!(poll.total_votes, 2);
        assert_eq!(poll.results[0].num_players.as_deref(), Some("3"));
        assert_eq!(poll.results[0].votes_for("Best"), Some(1));
    }

    #[test]
    fn thing_without_stats_has_no_rank() {
        let doc = Document::parse(
            r#"<items><item type="boardgameexpansion" id="926"><name type="primary" sortindex="1" value="Seafarers"/></item></items>"#,
        )
        .unwrap();
        let things = parse_things(doc.root_element()).unwrap();
        assert_eq!(things[0].ratings, None);
        assert_eq!(things[0].overall_rank(), None);
        assert!(things[0].categories().is_empty());
        assert_eq!(things[0].player_count(), None);
    }

    #[test]
    fn versions_must_be_versions() {
        let doc = Document::parse(
            r#"<items><item type="boardgame" id="1"><versions><item type="boardgame" id="2"/></versions></item></items>"#,
        )
        .unwrap();
        assert!(parse_things(doc.root_element()).is_err());
    }
}
