//! Writer: [`SegmentMap`] to persisted document.
//!
//! Segments receive fresh zero-based IDs in map iteration order. The IDs only
//! link `Symbols` entries to their segment inside one file; they carry no
//! meaning across merges.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use esdb_types::{Address, SegmentMap};
use tempfile::NamedTempFile;
use tracing::info;

use crate::document::{ExportDocument, ExportSegment, ExportSymbol};
use crate::error::{DocumentError, DocumentResult};

/// Formatting options local to one writer invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Render `ID`, `Segment` and `Address` values as `0x` hexadecimal.
    pub hex: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { hex: true }
    }
}

impl WriteOptions {
    /// Options that render every integer in decimal.
    pub fn decimal() -> Self {
        Self { hex: false }
    }

    fn id(&self, id: u64) -> String {
        if self.hex {
            format!("{id:#x}")
        } else {
            id.to_string()
        }
    }

    fn address(&self, address: Address) -> String {
        if self.hex {
            format!("{address:#x}")
        } else {
            address.to_decimal()
        }
    }
}

/// Assign fresh segment IDs and flatten the map into export records.
///
/// Symbols of each segment are emitted in address order.
pub fn to_document(map: &SegmentMap) -> ExportDocument {
    let mut doc = ExportDocument::default();
    for (id, segment) in (0u64..).zip(map.iter()) {
        doc.segments.push(ExportSegment {
            id,
            name: segment.name.clone(),
            kind: segment.kind.clone(),
        });
        for (name, address) in segment.symbols_by_address() {
            doc.symbols.push(ExportSymbol {
                address,
                name: name.to_string(),
                segment: id,
            });
        }
    }
    doc
}

/// Render a map as YAML text.
///
/// Integers are written as plain scalars in the chosen radix. Names and
/// segment kinds are written as JSON flow scalars, so a name such as `true`
/// or `0x30` stays a string and a kind of any shape reads back unchanged.
pub fn render_segment_map(map: &SegmentMap, options: &WriteOptions) -> DocumentResult<String> {
    render_document(&to_document(map), options)
}

fn render_document(doc: &ExportDocument, options: &WriteOptions) -> DocumentResult<String> {
    let mut out = String::new();

    if doc.segments.is_empty() {
        out.push_str("Segments: []\n");
    } else {
        out.push_str("Segments:\n");
        for seg in &doc.segments {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "- ID: {}", options.id(seg.id));
            let _ = writeln!(out, "  Name: {}", serde_json::to_string(&seg.name)?);
            let _ = writeln!(out, "  Type: {}", serde_json::to_string(&seg.kind)?);
        }
    }

    if doc.symbols.is_empty() {
        out.push_str("Symbols: []\n");
    } else {
        out.push_str("Symbols:\n");
        for sym in &doc.symbols {
            let _ = writeln!(out, "- Address: {}", options.address(sym.address));
            let _ = writeln!(out, "  Name: {}", serde_json::to_string(&sym.name)?);
            let _ = writeln!(out, "  Segment: {}", options.id(sym.segment));
        }
    }

    Ok(out)
}

/// Write `map` to `path`.
///
/// The document is rendered completely before the filesystem is touched, then
/// written to a temporary file beside `path` and renamed into place, so a
/// failure never leaves a partial output file. The result has the permissions
/// of the file it replaces, or the usual create mode if `path` is new.
pub fn write_segment_map(path: &Path, map: &SegmentMap, options: &WriteOptions) -> DocumentResult<()> {
    let rendered = render_segment_map(map, options)?;
    let io_err = |source: std::io::Error| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_beside(dir, path).map_err(io_err)?;
    tmp.write_all(rendered.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!(
        path = %path.display(),
        segments = map.len(),
        symbols = map.symbol_count(),
        "wrote segment map"
    );
    Ok(())
}

/// A temporary file in `dir` whose permissions match what a plain create of
/// `target` would give: those of an existing `target`, otherwise 0o666 less
/// the process umask.
fn temp_file_beside(dir: &Path, target: &Path) -> std::io::Result<NamedTempFile> {
    #[allow(unused_mut)]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // The umask applies to the mode given at creation.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir)?;

    if let Ok(existing) = std::fs::metadata(target) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    Ok(tmp)
}
