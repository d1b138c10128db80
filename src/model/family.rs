use super::thing::{parse_links, parse_names, Name};
use super::xml::{attr, child_text, children_named, expect_tag, parse_attr};
use crate::{Error, ErrorContext, Result};
use roxmltree::Node;
use serde::Serialize;

/// A family groups things sharing a commonality (a series, a theme).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyItem {
    pub kind: String,
    pub id: u64,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub names: Vec<Name>,
    pub description: Option<String>,
    pub members: Vec<FamilyMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyMember {
    pub id: u64,
    pub name: String,
}

impl FamilyItem {
    pub fn primary_name(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.kind == "primary")
            .map(|n| n.value.as_str())
    }
}

pub fn parse_families(root: Node<'_, '_>) -> Result<Vec<FamilyItem>> {
    expect_tag(root, "items")?;
    children_named(root, "item").map(parse_family).collect()
}

fn parse_family(node: Node<'_, '_>) -> Result<FamilyItem> {
    let id = parse_attr(node, "id")?;
    let members = parse_links(node)?
        .into_iter()
        .map(|link| {
            // Members are listed as inbound family links.
            if link.kind != "boardgamefamily" || !link.inbound {
                return Err(Error::malformed_with_context(
                    "unexpected family member link",
                    ErrorContext::new()
                        .with_field_path("item/link")
                        .with_details(format!(
                            "family {}: type '{}', inbound {}",
                            id, link.kind, link.inbound
                        )),
                ));
            }
            Ok(FamilyMember {
                id: link.id,
                name: link.value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FamilyItem {
        kind: attr(node, "type")?.to_string(),
        id,
        thumbnail: child_text(node, "thumbnail"),
        image: child_text(node, "image"),
        names: parse_names(node)?,
        description: child_text(node, "description"),
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn parses_family_members() {
        let doc = Document::parse(
            r#"<items>
  <item type="boardgamefamily" id="3">
    <name type="primary" sortindex="1" value="Catan"/>
    <description>Games in the Catan series.</description>
    <link type="boardgamefamily" id="13" value="CATAN" inbound="true"/>
    <link type="boardgamefamily" id="926" value="Seafarers" inbound="true"/>
  </item>
</items>"#,
        )
        .unwrap();
        let families = parse_families(doc.root_element()).unwrap();
        let catan = &families[0];
        assert_eq!(catan.primary_name(), Some("Catan"));
        assert_eq!(catan.thumbnail, None);
        let ids: Vec<u64> = catan.members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![13, 926]);
    }

    #[test]
    fn outbound_links_are_rejected() {
        let doc = Document::parse(
            r#"<items><item type="boardgamefamily" id="3"><link type="boardgamefamily" id="13" value="CATAN"/></item></items>"#,
        )
        .unwrap();
        assert!(parse_families(doc.root_element()).is_err());
    }
}
