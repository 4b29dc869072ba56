//! Public registration link
//!
//! Link format: <base>?owner=<owner-id>&property=<property-id>

use std::str::FromStr;

use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Parsed public link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicLink {
    pub owner_id: Uuid,
    /// Absent for links made before multi-property support
    pub property_id: Option<Uuid>,
}

impl PublicLink {
    pub fn new(owner_id: Uuid, property_id: Option<Uuid>) -> Self {
        Self {
            owner_id,
            property_id,
        }
    }

    /// Format against the public page base URL, keeping its other query parameters
    pub fn to_url(&self, base: &str) -> Result<String> {
        let mut url = Url::parse(base)
            .map_err(|e| Error::InvalidLink(format!("bad base URL '{}': {}", base, e)))?;

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "owner" && k != "property")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (k, v) in &kept {
                query.append_pair(k, v);
            }
            query.append_pair("owner", &self.owner_id.to_string());
            if let Some(property_id) = self.property_id {
                query.append_pair("property", &property_id.to_string());
            }
        }

        Ok(url.into())
    }

    /// Parse a visitor link. An unreadable property id counts as absent.
    pub fn parse(s: &str) -> Result<Self> {
        let url = Url::parse(s.trim())
            .map_err(|e| Error::InvalidLink(format!("'{}': {}", s, e)))?;

        let mut owner = None;
        let mut property = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "owner" => owner = Some(value.into_owned()),
                "property" => property = Some(value.into_owned()),
                _ => {}
            }
        }

        let owner = owner.ok_or_else(|| Error::InvalidLink("missing owner".into()))?;
        let owner_id = Uuid::from_str(&owner)
            .map_err(|_| Error::InvalidLink(format!("bad owner id '{}'", owner)))?;
        let property_id = property.and_then(|p| Uuid::from_str(&p).ok());

        Ok(Self {
            owner_id,
            property_id,
        })
    }
}

impl FromStr for PublicLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_roundtrip() {
        let link = PublicLink::new(Uuid::new_v4(), Some(Uuid::new_v4()));
        let url = link.to_url("https://openhouse.example.com/").unwrap();

        assert_eq!(
            url,
            format!(
                "https://openhouse.example.com/?owner={}&property={}",
                link.owner_id,
                link.property_id.unwrap()
            )
        );
        assert_eq!(PublicLink::parse(&url).unwrap(), link);
    }

    #[test]
    fn test_base_query_is_kept() {
        let link = PublicLink::new(Uuid::new_v4(), None);
        let url = link
            .to_url("https://example.com/visit?lang=en&owner=stale")
            .unwrap();
        assert_eq!(
            url,
            format!("https://example.com/visit?lang=en&owner={}", link.owner_id)
        );
    }

    #[test]
    fn test_parse_rejects_missing_owner() {
        assert!(matches!(
            PublicLink::parse("https://example.com/?property=abc"),
            Err(Error::InvalidLink(_))
        ));
        assert!(PublicLink::parse("https://example.com/?owner=not-a-uuid").is_err());
        assert!(PublicLink::parse("not a url").is_err());
    }

    #[test]
    fn test_bad_property_is_absent() {
        let owner = Uuid::new_v4();
        let link: PublicLink = format!("https://example.com/?owner={}&property=oops", owner)
            .parse()
            .unwrap();
        assert_eq!(link, PublicLink::new(owner, None));
    }
}
