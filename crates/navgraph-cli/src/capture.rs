//! Capture files: the sensor side's JSON-lines hand-over, one tap per line.
//!
//! ```text
//! {"plane":[1,0,0,0, 0,1,0,0, 0,0,1,0, 2,0,0,1],"depth_pose":[...16],"timestamp":3.5,"kind":"WALL"}
//! {"plane":[...],"depth_pose":[...],"timestamp":4.0,"kind":"ENTRY","label":"Main door","entry_kind":"DOOR"}
//! ```
//!
//! Matrices are column-major. Blank lines and lines starting with `#` are
//! skipped.

use std::fs;
use std::path::{Path, PathBuf};

use navgraph_geometry::Mat4;
use navgraph_model::Measurement;
use navgraph_types::{EntryKind, MeasurementKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("cannot read capture file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: entry_kind is only valid on ENTRY captures")]
    StrayEntryKind { line: usize },
}

/// One tap as written by the sensor side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureRecord {
    pub plane: [f32; 16],
    pub depth_pose: [f32; 16],
    pub timestamp: f64,
    pub kind: MeasurementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_kind: Option<EntryKind>,
}

impl CaptureRecord {
    pub fn into_measurement(self) -> Measurement {
        let mut m = Measurement::new(
            Mat4::from_cols_array(self.plane),
            Mat4::from_cols_array(self.depth_pose),
            self.timestamp,
            self.kind,
        );
        if let Some(label) = self.label {
            m = m.with_label(label);
        }
        if let Some(kind) = self.entry_kind {
            m = m.with_entry_kind(kind);
        }
        m
    }
}

/// Parse capture text. Line numbers in errors are 1-based.
pub fn parse(text: &str) -> Result<Vec<Measurement>, CaptureError> {
    let mut out = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record: CaptureRecord =
            serde_json::from_str(line).map_err(|source| CaptureError::Parse { line: i + 1, source })?;
        if record.entry_kind.is_some() && record.kind != MeasurementKind::Entry {
            return Err(CaptureError::StrayEntryKind { line: i + 1 });
        }
        out.push(record.into_measurement());
    }
    Ok(out)
}

pub fn read(path: &Path) -> Result<Vec<Measurement>, CaptureError> {
    let text = fs::read_to_string(path).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}
