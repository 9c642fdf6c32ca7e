// src/assemble.rs
//! # Ranking Assembler
//! Turns one fetched page into ordered, translated ranking records for a rule.
//!
//! Fragments without a name are skipped and do not consume a rank, so ranks
//! are always dense `1..=n`. The limit is applied after that filter.

use serde::{Deserialize, Serialize};

use crate::config::CompiledRule;
use crate::extract::{first_match, segment};
use crate::translate::{TranslationCache, Translations};

pub const UNKNOWN_BRAND: &str = "Unknown";

/// One ranked product, serialized with the snapshot's camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRecord {
    pub rank: u32,
    pub source: String,
    pub category: String,
    pub category_translations: Translations,
    pub brand: String,
    pub brand_translations: Translations,
    pub name: String,
    pub name_translations: Translations,
    /// Digits and commas as scraped, or empty.
    pub price: String,
    pub image_url: String,
    pub link: String,
}

pub async fn assemble(
    rule: &CompiledRule,
    page: &str,
    cache: &mut TranslationCache,
    limit: usize,
) -> Vec<RankingRecord> {
    let mut out: Vec<RankingRecord> = Vec::new();
    if limit == 0 {
        return out;
    }
    let mut category_tr: Option<Translations> = None;

    for fragment in segment(&rule.item, page) {
        let name = first_match(&rule.name, fragment, "");
        if name.is_empty() {
            continue;
        }
        let brand = first_match(&rule.brand, fragment, UNKNOWN_BRAND);
        let price = first_match(&rule.price, fragment, "");
        let image_url = first_match(&rule.image, fragment, "");

        let category_translations = match &category_tr {
            Some(t) => t.clone(),
            None => {
                let t = cache.resolve(&rule.rule.category).await;
                category_tr = Some(t.clone());
                t
            }
        };
        let brand_translations = cache.resolve(&brand).await;
        let name_translations = cache.resolve(&name).await;

        out.push(RankingRecord {
            rank: (out.len() + 1) as u32,
            source: rule.rule.source.clone(),
            category: rule.rule.category.clone(),
            category_translations,
            brand,
            brand_translations,
            name,
            name_translations,
            price,
            image_url,
            link: rule.rule.endpoint.clone(),
        });

        if out.len() >= limit {
            break;
        }
    }

    out
}
