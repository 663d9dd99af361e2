//! Static page translation
//!
//! Pages are lists of blocks; blocks tagged `translate` are sent to
//! `POST /translate` in one batch and replaced positionally. Any failure leaves
//! the page as it was.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::BestEffort;
use crate::models::TranslationRequest;
use crate::remote::AlertService;
use crate::session::LanguageCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub text: String,
    pub translate: bool,
}

impl Block {
    pub fn tagged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translate: true,
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPage {
    pub title: Block,
    pub blocks: Vec<Block>,
}

impl StaticPage {
    fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        std::iter::once(&self.title).chain(self.blocks.iter())
    }

    fn all_blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        std::iter::once(&mut self.title).chain(self.blocks.iter_mut())
    }

    pub fn tagged_texts(&self) -> Vec<String> {
        self.all_blocks()
            .filter(|b| b.translate)
            .map(|b| b.text.clone())
            .collect()
    }

    /// Replaces tagged blocks in order; empty or missing entries keep the original text
    pub fn apply_translations(&mut self, translations: &[String]) {
        let tagged = self.all_blocks_mut().filter(|b| b.translate);
        for (block, translated) in tagged.zip(translations) {
            if !translated.is_empty() {
                block.text = translated.clone();
            }
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!("=== {} ===\n", self.title.text);
        for block in &self.blocks {
            text.push_str(&block.text);
            text.push('\n');
        }
        text
    }
}

/// Built-in static pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageId {
    About,
    Rights,
}

impl PageId {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "about" => Some(PageId::About),
            "rights" | "know-your-rights" => Some(PageId::Rights),
            _ => None,
        }
    }

    pub fn page(self) -> StaticPage {
        match self {
            PageId::About => StaticPage {
                title: Block::tagged("About Us"),
                blocks: vec![
                    Block::tagged("Unicast delivers official emergency alerts in the language you choose."),
                    Block::tagged("Alerts come from public warning systems and are translated automatically."),
                    Block::tagged("Always follow the instructions of local authorities."),
                    Block::fixed("https://unicasttranslations.onrender.com"),
                ],
            },
            PageId::Rights => StaticPage {
                title: Block::tagged("Know Your Rights"),
                blocks: vec![
                    Block::tagged("You have the right to receive emergency information in a language you understand."),
                    Block::tagged("You have the right to ask for an interpreter at shelters and aid centers."),
                    Block::tagged("Emergency help does not depend on your immigration status."),
                    Block::tagged("Keep a copy of important documents in a safe, waterproof place."),
                ],
            },
        }
    }
}

#[derive(Clone)]
pub struct StaticTranslator {
    service: Arc<dyn AlertService>,
}

impl StaticTranslator {
    pub fn new(service: Arc<dyn AlertService>) -> Self {
        Self { service }
    }

    /// One batch request, translations come back in input order
    pub async fn translate_texts(&self, texts: &[String], target: &LanguageCode) -> BestEffort<Vec<String>> {
        let request = TranslationRequest {
            texts: texts.to_vec(),
            target_lang: target.clone(),
        };
        match self.service.translate(&request).await {
            Ok(response) => {
                if response.translations.len() != texts.len() {
                    warn!(
                        "Translation returned {} entries for {} texts",
                        response.translations.len(),
                        texts.len()
                    );
                }
                BestEffort::Completed(response.translations)
            }
            Err(e) => {
                warn!("Failed to translate page content: {}", e);
                BestEffort::Failed(e.kind())
            }
        }
    }

    /// Page in `language`, untouched for the default language or on failure
    pub async fn localize(&self, mut page: StaticPage, language: &LanguageCode) -> StaticPage {
        if language.is_default() {
            return page;
        }
        let texts = page.tagged_texts();
        if texts.is_empty() {
            return page;
        }
        if let BestEffort::Completed(translations) = self.translate_texts(&texts, language).await {
            debug!("Translated {} blocks to {}", texts.len(), language);
            page.apply_translations(&translations);
        }
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> StaticPage {
        StaticPage {
            title: Block::tagged("Hello"),
            blocks: vec![Block::fixed("v1.0"), Block::tagged("World")],
        }
    }

    #[test]
    fn test_tagged_texts_in_order() {
        assert_eq!(page().tagged_texts(), vec!["Hello".to_string(), "World".to_string()]);
    }

    #[test]
    fn test_positional_replacement() {
        let mut page = page();
        page.apply_translations(&["Hola".to_string(), "Mundo".to_string()]);
        assert_eq!(page.title.text, "Hola");
        assert_eq!(page.blocks[0].text, "v1.0");
        assert_eq!(page.blocks[1].text, "Mundo");
    }

    #[test]
    fn test_short_or_empty_translations_keep_original() {
        let mut page = page();
        page.apply_translations(&["".to_string()]);
        assert_eq!(page.title.text, "Hello");
        assert_eq!(page.blocks[1].text, "World");
    }

    #[test]
    fn test_page_ids() {
        assert_eq!(PageId::parse("About"), Some(PageId::About));
        assert_eq!(PageId::parse("know-your-rights"), Some(PageId::Rights));
        assert_eq!(PageId::parse("faq"), None);
        assert!(!PageId::Rights.page().tagged_texts().is_empty());
        assert!(PageId::About.page().to_text().starts_with("=== About Us ==="));
    }
}
