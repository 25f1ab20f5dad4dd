//! URL detection inside a sequence.
//!
//! URLs are found with a regular expression over the sequence text. When a
//! PDF link annotation covers the last token of a detected URL, the span is
//! extended over the following tokens as long as they can be aligned with the
//! link destination, which recovers URLs broken by line wrapping.

use crate::model::{
    AnnotationType, Component, ComponentType, DocumentSequence, OffsetSpan, PdfAnnotation,
    floor_char_boundary, overlaps_any,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref URL_PATTERN: Regex =
        Regex::new(r"(?i)(https?|ftp)\s?:\s?//\s?[-A-Z0-9+&@#/%=~_:.]*[-A-Z0-9+&@#/%=~_]").unwrap();
}

/// Local spans of URL-shaped substrings.
pub fn url_spans(text: &str) -> Vec<OffsetSpan> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| OffsetSpan::new(m.start(), m.end()))
        .collect()
}

/// Detect URL components in a sequence.
///
/// Hyperlinks carried by the input come first; detected URLs overlapping one
/// of them are skipped.
pub fn detect_urls(sequence: &DocumentSequence, annotations: &[PdfAnnotation]) -> Vec<Component> {
    let text = sequence.text.as_str();
    let offsets = sequence.local_token_offsets();
    let mut components: Vec<Component> = Vec::new();

    for reference in &sequence.url_references {
        let span = OffsetSpan::new(reference.start, reference.end).clamp_to(text);
        if span.is_empty() {
            debug!(start = reference.start, end = reference.end, "Skipping empty hyperlink span");
            continue;
        }
        let mut component = url_component(sequence, &offsets, span);
        if let Some(target) = &reference.target {
            component = component.with_destination(target.clone());
        }
        components.push(component);
    }

    let taken: Vec<OffsetSpan> = components.iter().map(|c| c.offsets).collect();
    for detected in url_spans(text) {
        if overlaps_any(&taken, &detected) {
            continue;
        }

        let (first, mut last) = match covered_tokens(&offsets, sequence, detected) {
            Some(range) => range,
            None => continue,
        };
        let mut end = detected.end;

        let annotation = annotations.iter().find(|annotation| {
            annotation.annotation_type == AnnotationType::Uri
                && annotation.covers(&sequence.tokens[last])
        });

        if let Some(annotation) = annotation {
            let destination = annotation.destination.as_str();
            let url_text = &text[detected.start..detected.end];
            let mut cursor = destination
                .find(url_text)
                .map(|pos| pos + url_text.len())
                .unwrap_or(0);

            for (index, token) in sequence.tokens.iter().enumerate().skip(last + 1) {
                if token.text.is_empty() || token.text == " " || token.text == "\n" {
                    last = index;
                    continue;
                }
                match destination.get(cursor..).and_then(|rest| rest.find(&token.text)) {
                    Some(pos) => {
                        cursor += pos + token.text.len();
                        last = index;
                    }
                    None => break,
                }
            }
            // The match may stop inside a token; the span ends with the last aligned token.
            end = end.max(offsets[last] + sequence.tokens[last].text.len());
        }

        let end = trim_url_end(text, detected.start, end);
        let span = OffsetSpan::new(detected.start, end).clamp_to(text);
        let mut component = url_component(sequence, &offsets, span);
        if let Some(annotation) = annotation {
            component = component.with_destination(annotation.destination.clone());
        }
        debug!(url = %component.raw_form, first_token = first, last_token = last, "Detected URL");
        components.push(component);
    }

    components.sort_by(|a, b| a.offsets.cmp(&b.offsets));
    components
}

/// A URL never ends on whitespace or on a trailing period.
fn trim_url_end(text: &str, start: usize, end: usize) -> usize {
    let end = floor_char_boundary(text, end).max(start);
    let trimmed = text[start..end].trim_end();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    start + trimmed.len()
}

/// Indices of the first and last token fully inside `span`.
fn covered_tokens(
    offsets: &[usize],
    sequence: &DocumentSequence,
    span: OffsetSpan,
) -> Option<(usize, usize)> {
    let mut range: Option<(usize, usize)> = None;
    for (index, (offset, token)) in offsets.iter().zip(&sequence.tokens).enumerate() {
        if *offset >= span.start && offset + token.text.len() <= span.end {
            range = Some(match range {
                Some((first, _)) => (first, index),
                None => (index, index),
            });
        }
        if *offset > span.end {
            break;
        }
    }
    range
}

fn url_component(sequence: &DocumentSequence, offsets: &[usize], span: OffsetSpan) -> Component {
    let tokens = offsets
        .iter()
        .zip(&sequence.tokens)
        .filter(|(offset, token)| **offset >= span.start && **offset + token.text.len() <= span.end)
        .map(|(_, token)| token.clone())
        .collect();

    Component::new(ComponentType::Url, span.slice(&sequence.text), span)
        .with_tokens(tokens)
        .with_sequence_id(sequence.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, UrlReference};
    use crate::tokenizer::tokenize;

    fn sequence(text: &str) -> DocumentSequence {
        let mut sequence = DocumentSequence::new(text);
        sequence.tokens = tokenize(text, 0);
        sequence
    }

    #[test]
    fn test_url_without_trailing_period() {
        let seq = sequence("The GSE12345 dataset is available at https://osf.io/abc123.");
        let urls = detect_urls(&seq, &[]);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].raw_form, "https://osf.io/abc123");
        assert_eq!(urls[0].normalized_form, "https://osf.io/abc123");
        assert_eq!(urls[0].component_type, ComponentType::Url);
    }

    #[test]
    fn test_url_extended_by_annotation() {
        let text = "See https://zenodo.org/rec\nord/12345 for data";
        let mut seq = sequence(text);
        let link_box = BoundingBox {
            page: 1,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 20.0,
        };
        for token in seq.tokens.iter_mut() {
            if token.text == "rec" {
                token.bounding_box = Some(link_box);
            }
        }
        let annotation = PdfAnnotation {
            annotation_type: AnnotationType::Uri,
            destination: "https://zenodo.org/record/12345".to_string(),
            boxes: vec![link_box],
        };

        let urls = detect_urls(&seq, &[annotation]);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].raw_form, "https://zenodo.org/rec\nord/12345");
        assert_eq!(urls[0].normalized_form, "https://zenodo.org/record/12345");
    }

    #[test]
    fn test_hyperlink_reference_wins() {
        let text = "Data at https://osf.io/abc123 here.";
        let seq = sequence(text).with_url_reference(UrlReference {
            start: 8,
            end: 29,
            target: Some("https://osf.io/abc123/".to_string()),
        });

        let urls = detect_urls(&seq, &[]);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].destination.as_deref(), Some("https://osf.io/abc123/"));
    }

    fn annotate_last_slash(seq: &mut DocumentSequence, destination: &str) -> PdfAnnotation {
        let link_box = BoundingBox {
            page: 1,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 20.0,
        };
        for token in seq.tokens.iter_mut().filter(|t| t.text == "/") {
            token.bounding_box = Some(link_box);
        }
        PdfAnnotation {
            annotation_type: AnnotationType::Uri,
            destination: destination.to_string(),
            boxes: vec![link_box],
        }
    }

    #[test]
    fn test_annotation_extension_ends_with_last_aligned_token() {
        // The pattern stops inside "abé", which is then aligned as a whole.
        let mut seq = sequence("See https://zenodo.org/abé/x zz tail");
        let annotation = annotate_last_slash(&mut seq, "https://zenodo.org/ababé/x");

        let urls = detect_urls(&seq, &[annotation]);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].raw_form, "https://zenodo.org/abé/x");
        assert_eq!(urls[0].normalized_form, "https://zenodo.org/ababé/x");
    }

    #[test]
    fn test_annotation_extension_before_multibyte_character() {
        let mut seq = sequence("See https://zenodo.org/abé/x\u{2014}tail");
        let annotation = annotate_last_slash(&mut seq, "https://zenodo.org/ababé/x");

        let urls = detect_urls(&seq, &[annotation]);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].raw_form, "https://zenodo.org/abé/x");
    }

    #[test]
    fn test_trim_url_end() {
        assert_eq!(trim_url_end("http://a.org. ", 0, 14), 12);
        assert_eq!(trim_url_end("http://a.org", 0, 99), 12);
        // index 10 falls inside the dash
        assert_eq!(trim_url_end("http://é\u{2014}", 0, 10), 9);
    }
}
