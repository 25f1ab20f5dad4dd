//! Citation markers attached to named dataset mentions.

use crate::model::{BiblioComponent, BiblioItem, Dataset};
use crate::services::CitationConsolidator;
use crate::{DatastetError, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// Attaches, consolidates and propagates citations over the records of a document
#[derive(Debug, Clone, Copy)]
pub struct CitationAttacher {
    /// Characters allowed between the end of the attached material and the next marker
    window: usize,
}

impl Default for CitationAttacher {
    fn default() -> Self {
        Self { window: 5 }
    }
}

impl CitationAttacher {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Attach the markers following each dataset name.
    ///
    /// A marker attaches when it starts in `[name end, bound + window]`, where
    /// the bound starts at the name end and moves to the end of every attached
    /// marker, so that "GSE1 [3, 4] [7]" picks up all three. Offsets are
    /// compared in the document frame. Returns the number of attachments.
    pub fn attach(&self, records: &mut [Dataset], citations: &[BiblioComponent]) -> usize {
        let mut markers: Vec<&BiblioComponent> = citations.iter().collect();
        markers.sort_by_key(|marker| marker.offsets);

        let mut attached = 0;
        for record in records.iter_mut() {
            let Some(name) = &record.dataset_name else {
                continue;
            };
            let anchor_end = name.offsets.global_end();
            let mut bound = anchor_end;

            for marker in &markers {
                let start = marker.offsets.global_start();
                if start < anchor_end || start > bound + self.window {
                    continue;
                }
                bound = bound.max(marker.offsets.global_end());
                let known = record
                    .citations
                    .iter()
                    .any(|c| c.ref_key == marker.ref_key && c.offsets == marker.offsets);
                if !known {
                    record.citations.push((*marker).clone());
                    attached += 1;
                }
            }
        }
        attached
    }

    /// Consolidate the metadata of the attached citations, once per key.
    ///
    /// Only citations carrying an item are looked up. Every citation sharing a
    /// key receives the same corrected item. Returns the number of keys the
    /// service found.
    pub async fn consolidate(
        &self,
        records: &mut [Dataset],
        consolidator: &dyn CitationConsolidator,
    ) -> Result<usize> {
        let mut keys: Vec<String> = Vec::new();
        let mut items: Vec<BiblioItem> = Vec::new();
        for citation in records.iter().flat_map(|record| record.citations.iter()) {
            let Some(item) = &citation.item else {
                continue;
            };
            if !keys.contains(&citation.ref_key) {
                keys.push(citation.ref_key.clone());
                items.push(item.clone());
            }
        }
        if items.is_empty() {
            return Ok(0);
        }

        debug!(count = items.len(), service = consolidator.name(), "Consolidating citations");
        let results = consolidator.consolidate(&items).await?;
        if results.len() != items.len() {
            return Err(DatastetError::MalformedResponse(format!(
                "{} answered {} items for {} requested",
                consolidator.name(),
                results.len(),
                items.len()
            )));
        }

        let mut corrected: HashMap<String, BiblioItem> = HashMap::new();
        let mut found = 0;
        for ((key, mut item), result) in keys.into_iter().zip(items).zip(results) {
            if let Some(consolidated) = result {
                item.correct(&consolidated);
                found += 1;
            }
            corrected.insert(key, item);
        }

        for citation in records.iter_mut().flat_map(|record| record.citations.iter_mut()) {
            if let Some(item) = corrected.get(&citation.ref_key) {
                citation.item = Some(item.clone());
            }
        }
        info!(found, "Consolidated citations");
        Ok(found)
    }

    /// Give records without citations the citations of another record with
    /// the same dataset name, compared by raw or by normalized form.
    ///
    /// Donors are the records holding citations before the call, first donor
    /// in document order wins. Returns the number of records that received
    /// citations.
    pub fn propagate_citations(&self, records: &mut [Dataset]) -> usize {
        let donors: Vec<(String, String, Vec<BiblioComponent>)> = records
            .iter()
            .filter(|record| !record.citations.is_empty())
            .filter_map(|record| {
                let name = record.dataset_name.as_ref()?;
                Some((
                    name.raw_form.clone(),
                    name.normalized_form.clone(),
                    record.citations.clone(),
                ))
            })
            .collect();
        if donors.is_empty() {
            return 0;
        }

        let mut received = 0;
        for record in records.iter_mut().filter(|record| record.citations.is_empty()) {
            let Some(name) = &record.dataset_name else {
                continue;
            };
            let donor = donors
                .iter()
                .find(|(raw, normalized, _)| *raw == name.raw_form || *normalized == name.normalized_form);
            if let Some((_, _, citations)) = donor {
                record.citations = citations.clone();
                received += 1;
            }
        }
        received
    }
}
