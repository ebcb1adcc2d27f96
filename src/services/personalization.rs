//! Reader preferences for the article listing
//!
//! A logged-in reader with stored preferences always wins; otherwise the
//! `jcpe_prefs` cookie token is used. The token is URL-safe base64 (no
//! padding) of `{"categories":[slug...],"tags":[name...]}`.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{finish_form, push_error};
use crate::errors::{FieldErrors, Result};
use crate::storage::{PreferenceIds, SeaOrmStorage};

/// Preferences by public identifiers (category slugs, tag names)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Preference {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.tags.is_empty()
    }

    /// Trim, drop blanks and duplicates, keep first-seen order
    pub fn normalized(self) -> Self {
        fn clean(items: Vec<String>) -> Vec<String> {
            let mut out: Vec<String> = Vec::new();
            for item in items {
                let item = item.trim().to_string();
                if !item.is_empty() && !out.contains(&item) {
                    out.push(item);
                }
            }
            out
        }
        Self {
            categories: clean(self.categories),
            tags: clean(self.tags),
        }
    }
}

/// Where the effective preference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceSource {
    Account,
    Token,
    None,
}

pub fn encode_token(pref: &Preference) -> String {
    // Serializing two Vec<String> cannot fail
    let json = serde_json::to_vec(pref).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a cookie token; malformed input yields `None`
pub fn decode_token(token: &str) -> Option<Preference> {
    let bytes = match URL_SAFE_NO_PAD.decode(token.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Ignoring preference token (base64): {}", e);
            return None;
        }
    };
    match serde_json::from_slice::<Preference>(&bytes) {
        Ok(pref) => Some(pref.normalized()),
        Err(e) => {
            debug!("Ignoring preference token (json): {}", e);
            None
        }
    }
}

pub struct PersonalizationService {
    storage: Arc<SeaOrmStorage>,
}

impl PersonalizationService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Map slugs and names to ids; unknown entries are dropped
    pub async fn to_ids(&self, pref: &Preference) -> Result<PreferenceIds> {
        let categories = self.storage.find_categories_by_slugs(&pref.categories).await?;
        let tags = self.storage.find_tags_by_names(&pref.tags).await?;
        Ok(PreferenceIds {
            category_ids: categories.into_iter().map(|c| c.id).collect(),
            tag_ids: tags.into_iter().map(|t| t.id).collect(),
        })
    }

    /// Stored preference of an account, by public identifiers
    pub async fn for_user(&self, user_id: i64) -> Result<Preference> {
        let ids = self.storage.user_preferences(user_id).await?;

        let mut categories = Vec::new();
        for id in &ids.category_ids {
            if let Some(c) = self.storage.find_category(*id).await? {
                categories.push(c.slug);
            }
        }

        let all_tags = if ids.tag_ids.is_empty() {
            Vec::new()
        } else {
            self.storage.list_tags().await?
        };
        let tags = all_tags
            .into_iter()
            .filter(|t| ids.tag_ids.contains(&t.id))
            .map(|t| t.name)
            .collect();

        Ok(Preference { categories, tags })
    }

    /// Effective preference for a request
    pub async fn resolve(
        &self,
        user_id: Option<i64>,
        token: Option<&str>,
    ) -> Result<(PreferenceSource, Option<PreferenceIds>)> {
        if let Some(user_id) = user_id {
            let stored = self.storage.user_preferences(user_id).await?;
            if !stored.is_empty() {
                return Ok((PreferenceSource::Account, Some(stored)));
            }
        }

        if let Some(pref) = token.and_then(decode_token)
            && !pref.is_empty()
        {
            let ids = self.to_ids(&pref).await?;
            if !ids.is_empty() {
                return Ok((PreferenceSource::Token, Some(ids)));
            }
        }

        Ok((PreferenceSource::None, None))
    }

    /// Replace the account's stored preference; every entry must exist
    pub async fn save_for_user(&self, user_id: i64, pref: Preference) -> Result<Preference> {
        let pref = pref.normalized();
        let ids = self.to_ids(&pref).await?;

        let mut errors = FieldErrors::new();
        if ids.category_ids.len() != pref.categories.len() {
            push_error(&mut errors, "categories", "Categoria desconhecida.");
        }
        if ids.tag_ids.len() != pref.tags.len() {
            push_error(&mut errors, "tags", "Tag desconhecida.");
        }
        finish_form(errors)?;

        self.storage.replace_user_preferences(user_id, &ids).await?;
        debug!(
            "PersonalizationService: user {} stored {} categories / {} tags",
            user_id,
            ids.category_ids.len(),
            ids.tag_ids.len()
        );
        Ok(pref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let pref = Preference {
            categories: vec!["esportes".into(), "politica".into()],
            tags: vec!["Recife".into()],
        };
        let token = encode_token(&pref);
        assert!(!token.contains('='));
        assert_eq!(decode_token(&token), Some(pref));
    }

    #[test]
    fn test_known_token_value() {
        // {"categories":["economia"],"tags":[]}
        let token = URL_SAFE_NO_PAD.encode(br#"{"categories":["economia"],"tags":[]}"#);
        let pref = decode_token(&token).unwrap();
        assert_eq!(pref.categories, vec!["economia".to_string()]);
        assert!(pref.tags.is_empty());
    }

    #[test]
    fn test_malformed_tokens_are_ignored() {
        assert_eq!(decode_token("!!!not-base64!!!"), None);
        assert_eq!(decode_token(&URL_SAFE_NO_PAD.encode(b"not json")), None);
        assert_eq!(decode_token(&URL_SAFE_NO_PAD.encode(b"[1,2,3]")), None);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let pref = decode_token(&URL_SAFE_NO_PAD.encode(br#"{"tags":["Copa"]}"#)).unwrap();
        assert!(pref.categories.is_empty());
        assert_eq!(pref.tags, vec!["Copa".to_string()]);
    }

    #[test]
    fn test_normalized_drops_blanks_and_duplicates() {
        let pref = Preference {
            categories: vec![" esportes ".into(), "esportes".into(), "".into()],
            tags: vec![],
        }
        .normalized();
        assert_eq!(pref.categories, vec!["esportes".to_string()]);
    }
}
