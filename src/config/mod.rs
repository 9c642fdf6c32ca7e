// src/config/mod.rs
pub mod rules;
pub mod settings;

pub use rules::{default_rules, load_rules_default, load_rules_from, CompiledRule, SourceRule};
pub use settings::HarvestSettings;
