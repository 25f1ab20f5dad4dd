//! URL re-attachment after the record set of a sequence changed.

use crate::extraction::detect_urls;
use crate::model::{
    Component, ComponentType, Dataset, DocumentSequence, OffsetSpan, PdfAnnotation, overlaps_any,
};
use tracing::debug;

/// One entry of the flattened, offset-sorted sweep
#[derive(Debug)]
enum Stop {
    Anchor(usize),
    Url(Component),
}

/// Recompute the URL attachments of the records of one sequence.
///
/// URLs are detected again; those overlapping a component of a record are
/// ignored. Each URL is given to the nearest anchor preceding it, a later URL
/// replacing an earlier one on the same record. Previous attachments are
/// always cleared, even when nothing is detected. Returns the number of URLs
/// attached.
pub fn reattach_urls(
    records: &mut [Dataset],
    sequence: &DocumentSequence,
    annotations: &[PdfAnnotation],
) -> usize {
    for record in records.iter_mut() {
        record.url = None;
    }

    let taken: Vec<OffsetSpan> = records
        .iter()
        .flat_map(|record| record.components())
        .filter(|component| component.component_type != ComponentType::Url)
        .map(|component| component.offsets.local())
        .collect();

    let urls: Vec<Component> = detect_urls(sequence, annotations)
        .into_iter()
        .filter(|url| !overlaps_any(&taken, &url.offsets))
        .collect();
    if urls.is_empty() {
        return 0;
    }

    let mut stops: Vec<(OffsetSpan, Stop)> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| record.anchor().map(|a| (a.offsets.local(), Stop::Anchor(index))))
        .collect();
    stops.extend(urls.into_iter().map(|url| (url.offsets, Stop::Url(url))));
    stops.sort_by(|a, b| a.0.cmp(&b.0));

    let mut owner: Option<usize> = None;
    let mut attached = 0;
    for (_, stop) in stops {
        match stop {
            Stop::Anchor(index) => owner = Some(index),
            Stop::Url(url) => match owner {
                Some(index) => {
                    if records[index].url.is_none() {
                        attached += 1;
                    }
                    records[index].set_url(url.with_sequence_id(sequence.id.clone()));
                }
                None => debug!(url = %url.raw_form, "URL precedes every anchor"),
            },
        }
    }
    attached
}
