//! Identifier resolver - catalog lookup followed by a chain of tag rules.

use std::sync::Arc;

use log::debug;

use crate::catalog::ItemCatalog;
use crate::errors::MarketDataError;
use crate::models::{ItemIdentifier, ItemTag};

use super::rules_resolver::RuneTagRule;
use super::traits::{ItemResolver, TagRule};

/// Maps display names to upstream tags.
///
/// Resolution order:
/// 1. Exact, case-sensitive catalog lookup of the display name
/// 2. Tag rules in order (rune rewrite by default); first match wins
/// 3. No rule matched: the catalog tag is used verbatim
///
/// # Example
///
/// ```ignore
/// let resolver = IdentifierResolver::new(catalog);
/// let id = resolver.resolve("◆ Jerry Rune III")?;
/// // id.primary_tag = "UNIQUE_RUNE_JERRY"
/// // id.alternate_tag = Some("RUNE_JERRY")
/// ```
pub struct IdentifierResolver {
    catalog: Arc<dyn ItemCatalog>,
    rules: Vec<Box<dyn TagRule>>,
}

impl IdentifierResolver {
    /// Create a resolver with the default rule set.
    pub fn new(catalog: Arc<dyn ItemCatalog>) -> Self {
        Self {
            catalog,
            rules: vec![Box::new(RuneTagRule::new())],
        }
    }

    /// Append a rule after the existing ones.
    pub fn add_rule(&mut self, rule: Box<dyn TagRule>) {
        self.rules.push(rule);
    }
}

impl ItemResolver for IdentifierResolver {
    fn resolve(&self, display_name: &str) -> Result<ItemIdentifier, MarketDataError> {
        let internal_tag = self
            .catalog
            .lookup_tag(display_name)
            .ok_or_else(|| MarketDataError::UnknownItem(display_name.to_string()))?;

        for rule in &self.rules {
            if let Some(forms) = rule.apply(&internal_tag) {
                debug!(
                    "Resolved '{}' ({}) to {} (alternate: {:?})",
                    display_name, internal_tag, forms.primary, forms.alternate
                );
                return Ok(ItemIdentifier {
                    display_name: display_name.to_string(),
                    internal_tag: ItemTag::from(internal_tag),
                    primary_tag: forms.primary,
                    alternate_tag: forms.alternate,
                });
            }
        }

        Ok(ItemIdentifier::plain(display_name, internal_tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, CatalogSnapshot};
    use crate::resolver::TagForms;

    fn catalog() -> Arc<dyn ItemCatalog> {
        Arc::new(CatalogSnapshot::new(vec![
            CatalogEntry {
                name: "◆ Jerry Rune III".to_string(),
                internal_id: "JERRY_RUNE;3".to_string(),
                npc_sell_price: Some(500.0),
            },
            CatalogEntry {
                name: "Hyperion".to_string(),
                internal_id: "HYPERION".to_string(),
                npc_sell_price: None,
            },
        ]))
    }

    #[test]
    fn test_rune_resolution() {
        let resolver = IdentifierResolver::new(catalog());
        let id = resolver.resolve("◆ Jerry Rune III").unwrap();

        assert_eq!(id.internal_tag.as_ref(), "JERRY_RUNE;3");
        assert_eq!(id.primary_tag.as_ref(), "UNIQUE_RUNE_JERRY");
        assert_eq!(id.alternate_tag.as_deref(), Some("RUNE_JERRY"));
        assert!(id.is_rune());
    }

    #[test]
    fn test_plain_item_uses_tag_verbatim() {
        let resolver = IdentifierResolver::new(catalog());
        let id = resolver.resolve("Hyperion").unwrap();

        assert_eq!(id.primary_tag.as_ref(), "HYPERION");
        assert!(id.alternate_tag.is_none());
    }

    #[test]
    fn test_unknown_item() {
        let resolver = IdentifierResolver::new(catalog());
        match resolver.resolve("Definitely Not A Real Item") {
            Err(MarketDataError::UnknownItem(name)) => {
                assert_eq!(name, "Definitely Not A Real Item");
            }
            other => panic!("Expected UnknownItem, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let resolver = IdentifierResolver::new(catalog());
        assert!(resolver.resolve("hyperion").is_err());
    }

    struct SuffixRule;

    impl TagRule for SuffixRule {
        fn apply(&self, internal_tag: &str) -> Option<TagForms> {
            internal_tag.strip_suffix("_OLD").map(|base| TagForms {
                primary: Arc::from(base),
                alternate: None,
            })
        }
    }

    #[test]
    fn test_custom_rule_runs_after_defaults() {
        let catalog: Arc<dyn ItemCatalog> = Arc::new(CatalogSnapshot::new(vec![CatalogEntry {
            name: "Old Sword".to_string(),
            internal_id: "SWORD_OLD".to_string(),
            npc_sell_price: None,
        }]));
        let mut resolver = IdentifierResolver::new(catalog);
        resolver.add_rule(Box::new(SuffixRule));

        let id = resolver.resolve("Old Sword").unwrap();
        assert_eq!(id.primary_tag.as_ref(), "SWORD");
        assert_eq!(id.internal_tag.as_ref(), "SWORD_OLD");
    }
}
