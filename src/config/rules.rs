// src/config/rules.rs
//! # Source Rules
//!
//! Declarative per-(site, category) extraction rules. Each rule names the
//! page to fetch and the regex patterns used to slice it into item fragments
//! and fields. The segmentation/extraction logic lives once in `extract` and
//! is parameterized by this table.
//!
//! - Loads from TOML (`[[rules]]`) or JSON (array of rules).
//! - Fallback order: `$HARVEST_RULES_PATH` → `config/rules.toml` →
//!   `config/rules.json` → built-in `default_rules()`.
//! - Patterns are compiled case-insensitive and dot-matches-newline.

use anyhow::{anyhow, bail, Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_RULES_PATH: &str = "HARVEST_RULES_PATH";
pub const DEFAULT_RULES_TOML: &str = "config/rules.toml";
pub const DEFAULT_RULES_JSON: &str = "config/rules.json";

/// Immutable extraction rule for one (source, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRule {
    pub source: String,
    pub category: String,
    pub endpoint: String,
    pub item_pattern: String,
    pub brand_pattern: String,
    pub name_pattern: String,
    pub price_pattern: String,
    pub image_pattern: String,
}

/// A rule whose patterns have been validated and compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: SourceRule,
    pub item: Regex,
    pub brand: Regex,
    pub name: Regex,
    pub price: Regex,
    pub image: Regex,
}

/// Compile a rule pattern the way every rule pattern is matched:
/// case-insensitive, `.` spans newlines, at most one capture group.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .with_context(|| format!("compiling pattern {pattern:?}"))?;
    // captures_len counts the implicit whole-match group.
    if re.captures_len() > 2 {
        bail!(
            "pattern {pattern:?} has {} capture groups, expected at most one",
            re.captures_len() - 1
        );
    }
    Ok(re)
}

impl SourceRule {
    /// Short "source - category" label used in logs.
    pub fn label(&self) -> String {
        format!("{} - {}", self.source, self.category)
    }

    pub fn compile(&self) -> Result<CompiledRule> {
        if self.source.trim().is_empty() || self.category.trim().is_empty() {
            bail!("rule is missing source or category");
        }
        if self.endpoint.trim().is_empty() {
            bail!("rule [{}] has an empty endpoint", self.label());
        }
        if self.item_pattern.is_empty() {
            bail!("rule [{}] has an empty item pattern", self.label());
        }
        let ctx = || format!("rule [{}]", self.label());
        Ok(CompiledRule {
            rule: self.clone(),
            item: compile_pattern(&self.item_pattern).with_context(ctx)?,
            brand: compile_pattern(&self.brand_pattern).with_context(ctx)?,
            name: compile_pattern(&self.name_pattern).with_context(ctx)?,
            price: compile_pattern(&self.price_pattern).with_context(ctx)?,
            image: compile_pattern(&self.image_pattern).with_context(ctx)?,
        })
    }
}

/// Load rules from an explicit path. Supports TOML or JSON formats.
pub fn load_rules_from(path: &Path) -> Result<Vec<SourceRule>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading rules from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_rules(&content, ext.as_str())
        .with_context(|| format!("parsing rules from {}", path.display()))
}

/// Load rules using env var + fallbacks:
/// 1) $HARVEST_RULES_PATH
/// 2) config/rules.toml
/// 3) config/rules.json
/// 4) built-in table
pub fn load_rules_default() -> Result<Vec<SourceRule>> {
    if let Ok(p) = std::env::var(ENV_RULES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_rules_from(&pb);
        } else {
            return Err(anyhow!("{ENV_RULES_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_RULES_TOML);
    if toml_p.exists() {
        return load_rules_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_RULES_JSON);
    if json_p.exists() {
        return load_rules_from(&json_p);
    }
    Ok(default_rules())
}

fn parse_rules(s: &str, hint_ext: &str) -> Result<Vec<SourceRule>> {
    let try_toml = hint_ext == "toml" || s.contains("[[rules]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported rules format"))
}

fn parse_toml(s: &str) -> Result<Vec<SourceRule>> {
    #[derive(Deserialize)]
    struct TomlRules {
        rules: Vec<SourceRule>,
    }
    let v: TomlRules = toml::from_str(s)?;
    Ok(v.rules)
}

fn parse_json(s: &str) -> Result<Vec<SourceRule>> {
    let v: Vec<SourceRule> = serde_json::from_str(s)?;
    Ok(v)
}

const OLIVE_YOUNG_ITEM: &str = r#"<li[^>]*class="[^"]*(?:prd|flag)[^"]*"[^>]*>(.*?)</li>"#;
const OLIVE_YOUNG_BRAND: &str = r#"class="tx_brand"[^>]*>(.*?)<"#;
const OLIVE_YOUNG_NAME: &str = r#"class="tx_name"[^>]*>(.*?)<"#;
const OLIVE_YOUNG_PRICE: &str = r#"class="tx_num"[^>]*>([\d,]+)<"#;
const OLIVE_YOUNG_IMAGE: &str = r#"<img[^>]+(?:data-original|src)="([^"]+)""#;

const DAISO_ITEM: &str = r#"<li[^>]*>(.*?)</li>"#;
const DAISO_BRAND: &str = r#"class="item-brand"[^>]*>(.*?)<"#;
const DAISO_NAME: &str = r#"class="item-name"[^>]*>(.*?)<"#;
const DAISO_PRICE: &str = r#"class="(?:num|price)[^"]*"[^>]*>([\d,]+)<"#;
const DAISO_IMAGE: &str = r#"<img[^>]+src="([^"]+)""#;

fn olive_young(category: &str, disp_cat_no: &str) -> SourceRule {
    SourceRule {
        source: "Olive Young".to_string(),
        category: category.to_string(),
        endpoint: format!(
            "https://www.oliveyoung.co.kr/store/main/getBestList.do?dispCatNo={disp_cat_no}"
        ),
        item_pattern: OLIVE_YOUNG_ITEM.to_string(),
        brand_pattern: OLIVE_YOUNG_BRAND.to_string(),
        name_pattern: OLIVE_YOUNG_NAME.to_string(),
        price_pattern: OLIVE_YOUNG_PRICE.to_string(),
        image_pattern: OLIVE_YOUNG_IMAGE.to_string(),
    }
}

fn daiso(category: &str, rank_code: &str) -> SourceRule {
    SourceRule {
        source: "Daiso".to_string(),
        category: category.to_string(),
        endpoint: format!("https://www.daisomall.co.kr/ds/rank/{rank_code}"),
        item_pattern: DAISO_ITEM.to_string(),
        brand_pattern: DAISO_BRAND.to_string(),
        name_pattern: DAISO_NAME.to_string(),
        price_pattern: DAISO_PRICE.to_string(),
        image_pattern: DAISO_IMAGE.to_string(),
    }
}

/// Built-in rule table, in harvest order.
pub fn default_rules() -> Vec<SourceRule> {
    vec![
        olive_young("스킨케어", "10000010001"),
        olive_young("메이크업", "10000010002"),
        olive_young("헬스/푸드", "10000010003"),
        daiso("리빙", "C105"),
        daiso("뷰티", "C103"),
        daiso("주방/식기", "C101"),
    ]
}
