use unicode_segmentation::UnicodeSegmentation;

/// Standard Unicode word tokenizer used by the text collections
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl StandardTokenizer {
    /// Raw tokens in reading order; over-long words are skipped
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter(|word| word.len() <= self.max_token_length)
            .map(str::to_string)
            .collect()
    }
}
