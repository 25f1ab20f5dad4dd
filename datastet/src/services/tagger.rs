//! A tagger that replays labels computed ahead of time.

use super::Tagger;
use crate::Result;
use crate::extraction::labels::OTHER_LABEL;
use async_trait::async_trait;
use std::sync::Mutex;

/// Replays fixed label blocks, one block per input block, in order.
///
/// Tokens beyond the end of the available labels are labelled `<other>`, so
/// `FixedTagger::new()` labels everything `<other>`.
#[derive(Debug, Default)]
pub struct FixedTagger {
    blocks: Mutex<Vec<Vec<String>>>,
}

impl FixedTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay `blocks` for the next calls; consumed blocks are not replayed again.
    pub fn with_blocks(blocks: Vec<Vec<String>>) -> Self {
        Self {
            blocks: Mutex::new(blocks),
        }
    }
}

#[async_trait]
impl Tagger for FixedTagger {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn label(&self, input: &str) -> Result<String> {
        let mut pending = match self.blocks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut output = Vec::new();
        for block in input.split("\n\n") {
            let tokens: Vec<&str> = block.lines().filter(|line| !line.trim().is_empty()).collect();
            if tokens.is_empty() {
                continue;
            }
            let labels = if pending.is_empty() {
                Vec::new()
            } else {
                pending.remove(0)
            };
            let lines: Vec<String> = tokens
                .iter()
                .enumerate()
                .map(|(index, token)| {
                    let label = labels.get(index).map(String::as_str).unwrap_or(OTHER_LABEL);
                    format!("{}\t{}", token, label)
                })
                .collect();
            output.push(lines.join("\n"));
        }
        Ok(output.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::labels::parse_label_blocks;

    #[tokio::test]
    async fn test_replays_blocks_in_order() {
        let tagger = FixedTagger::with_blocks(vec![
            vec!["<other>".to_string(), "I-<dataset-name>".to_string()],
            vec!["I-<dataset>".to_string()],
        ]);
        let output = tagger.label("The\nGSE1\n\ndata\nhere").await.unwrap();
        let blocks = parse_label_blocks(&output);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], vec!["<other>", "I-<dataset-name>"]);
        assert_eq!(blocks[1], vec!["I-<dataset>", "<other>"]);
    }

    #[tokio::test]
    async fn test_default_labels_everything_other() {
        let output = FixedTagger::new().label("a\nb").await.unwrap();
        assert_eq!(output, "a\t<other>\nb\t<other>");
    }
}
