//! Tokenization of segment text into layout-like tokens.
//!
//! Word runs (letters, digits, underscore) form one token, every whitespace
//! character is its own token, and every other character is a single
//! punctuation token. Concatenating the token texts restores the input.

use crate::model::Token;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"[\p{L}\p{N}_]+|\s|[^\p{L}\p{N}_\s]").unwrap();
}

/// Split `text` into tokens whose offsets start at `base_offset`.
pub fn tokenize(text: &str, base_offset: usize) -> Vec<Token> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| Token::new(m.as_str(), base_offset + m.start()))
        .collect()
}

/// Token texts only, for term preparation.
pub fn token_texts(text: &str) -> Vec<String> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Concatenate the texts of a token slice.
pub fn tokens_to_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_roundtrip_and_offsets() {
        let text = "The GSE12345 dataset, see https://osf.io/abc123.";
        let tokens = tokenize(text, 10);
        assert_eq!(tokens_to_text(&tokens), text);
        assert_eq!(tokens[0].text, "The");
        assert_eq!(tokens[0].offset, 10);
        assert_eq!(tokens[1].text, " ");
        assert_eq!(tokens[2].text, "GSE12345");
        assert_eq!(tokens[2].offset, 14);
        assert!(tokens.iter().any(|t| t.text == ","));
    }

    #[test]
    fn test_newlines_are_single_tokens() {
        let texts = token_texts("a\n\nb");
        assert_eq!(texts, vec!["a", "\n", "\n", "b"]);
    }
}
