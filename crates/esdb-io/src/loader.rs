//! Loader: persisted document to [`SegmentMap`].
//!
//! Segments are declared first and cross-referenced by ID from the symbol
//! table. A symbol whose segment ID is never declared is fatal: the document
//! is inconsistent and nothing downstream can trust it.

use std::collections::BTreeMap;
use std::path::Path;

use esdb_types::{Address, Segment, SegmentKind, SegmentMap};
use tracing::{debug, warn};

use crate::document::RawDocument;
use crate::error::{DocumentError, DocumentResult};

/// Read and load the document at `path`.
pub fn load_segment_map(path: &Path) -> DocumentResult<SegmentMap> {
    let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_segment_map(&text, &path.display().to_string())
}

/// Parse YAML text into a [`SegmentMap`].
///
/// `origin` names the source in error messages (usually the file path).
pub fn parse_segment_map(text: &str, origin: &str) -> DocumentResult<SegmentMap> {
    let doc: RawDocument = serde_saphyr::from_str(text).map_err(|e| DocumentError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;
    build_segment_map(doc, origin)
}

/// Resolve a parsed document's cross references into a [`SegmentMap`].
pub fn build_segment_map(doc: RawDocument, origin: &str) -> DocumentResult<SegmentMap> {
    let (raw_segments, raw_symbols) = match (doc.segments, doc.symbols) {
        (Some(segments), Some(symbols)) => (segments, symbols),
        _ => {
            warn!(origin, "document lacks a Segments or Symbols table; loading as empty");
            return Ok(SegmentMap::new());
        }
    };

    let mut map = SegmentMap::new();
    let mut names_by_id: BTreeMap<u64, String> = BTreeMap::new();

    for raw in raw_segments {
        if names_by_id.contains_key(&raw.id) {
            return Err(DocumentError::DuplicateSegmentId {
                origin: origin.to_string(),
                id: raw.id,
            });
        }
        if map.contains(&raw.name) {
            return Err(DocumentError::DuplicateSegmentName {
                origin: origin.to_string(),
                name: raw.name,
            });
        }
        names_by_id.insert(raw.id, raw.name.clone());
        map.insert(Segment::new(raw.name, SegmentKind::new(raw.kind)));
    }

    for raw in raw_symbols {
        let segment = names_by_id
            .get(&raw.segment)
            .and_then(|name| map.get_mut(name))
            .ok_or_else(|| DocumentError::DanglingSegment {
                origin: origin.to_string(),
                symbol: raw.name.clone(),
                segment: raw.segment,
            })?;

        let address = Address::new(raw.address);
        if let Some(previous) = segment.insert_symbol(raw.name.clone(), address) {
            if previous != address {
                warn!(
                    origin,
                    segment = %segment.name,
                    symbol = %raw.name,
                    %previous,
                    %address,
                    "symbol declared twice in one segment; keeping the later address"
                );
            }
        }
    }

    debug!(
        origin,
        segments = map.len(),
        symbols = map.symbol_count(),
        "loaded segment map"
    );
    Ok(map)
}
