// src/translate/providers/mod.rs
pub mod deepl;
pub mod gemini;

pub use deepl::DeeplTranslator;
pub use gemini::GeminiTranslator;
