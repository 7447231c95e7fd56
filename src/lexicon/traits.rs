// Keyword extractor trait: swap-ready abstraction.
//
// The ingestion loop only needs "text in, keywords out". The default
// implementation is the rule-table heuristic; a dictionary-backed
// morphological analyzer could slot in here without touching the loop.

/// Trait for pulling content words out of a single post's text.
pub trait KeywordExtractor: Send + Sync {
    /// Extract keywords in text order.
    ///
    /// A word that occurs several times in the text is returned once per
    /// occurrence; callers that count frequencies rely on this.
    fn extract(&self, text: &str) -> Vec<String>;
}
