//! ESRI ASCII grid text format.
//!
//! ```text
//! ncols W
//! nrows H
//! xllcorner 0.0
//! yllcorner 0.0
//! cellsize 1.0
//! NODATA_value -9999
//! v00 v01 ...
//! ```
//! One line per row, top row first, each value with six decimals.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use ndarray::Array2;
use tracing::debug;

use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::encoder::ArtifactEncoder;
use crate::dem_pipeline::export::types::{ArtifactKind, JobTarget, OutputArtifact};

pub const ASCII_GRID_SUFFIX: &str = "_dem.asc";
pub const NODATA_VALUE: f64 = -9999.0;

const HEADER_KEYS: [&str; 6] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "cellsize",
    "NODATA_value",
];

/// Header of a parsed grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AsciiGridHeader {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata_value: f64,
}

/// Byte-reproducible serialization of `grid`.
pub fn encode_ascii_grid(grid: &ElevationGrid) -> String {
    let mut out = String::with_capacity(grid.len() * 12 + 128);
    out.push_str(&format!("ncols {}\n", grid.width()));
    out.push_str(&format!("nrows {}\n", grid.height()));
    out.push_str("xllcorner 0.0\n");
    out.push_str("yllcorner 0.0\n");
    out.push_str("cellsize 1.0\n");
    out.push_str("NODATA_value -9999\n");

    for row in grid.view().rows() {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{:.6}", value);
        }
        out.push('\n');
    }
    out
}

fn parse_error(msg: impl Into<String>) -> DemError {
    DemError::DecodeError(format!("ASCII grid: {}", msg.into()))
}

fn header_value<'a>(line: Option<&'a str>, key: &str) -> Result<&'a str> {
    let line = line.ok_or_else(|| parse_error(format!("missing `{}` line", key)))?;
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(k), Some(v)) if k.eq_ignore_ascii_case(key) => Ok(v),
        _ => Err(parse_error(format!("expected `{}`, found {:?}", key, line))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| parse_error(format!("bad value for `{}`: {:?}", key, raw)))
}

/// Parses text produced by [`encode_ascii_grid`] (or any grid with the same header).
pub fn parse_ascii_grid(text: &str) -> Result<(AsciiGridHeader, ElevationGrid)> {
    let mut lines = text.lines();

    let mut raw = [""; 6];
    for (slot, key) in raw.iter_mut().zip(HEADER_KEYS) {
        *slot = header_value(lines.next(), key)?;
    }

    let header = AsciiGridHeader {
        ncols: parse_number(HEADER_KEYS[0], raw[0])?,
        nrows: parse_number(HEADER_KEYS[1], raw[1])?,
        xllcorner: parse_number(HEADER_KEYS[2], raw[2])?,
        yllcorner: parse_number(HEADER_KEYS[3], raw[3])?,
        cellsize: parse_number(HEADER_KEYS[4], raw[4])?,
        nodata_value: parse_number(HEADER_KEYS[5], raw[5])?,
    };

    let mut values = Vec::with_capacity(header.ncols * header.nrows);
    for (row, line) in lines.filter(|l| !l.trim().is_empty()).enumerate() {
        let before = values.len();
        for token in line.split_whitespace() {
            values.push(parse_number::<f64>("cell", token)?);
        }
        if values.len() - before != header.ncols {
            return Err(parse_error(format!(
                "row {} has {} values, expected {}",
                row,
                values.len() - before,
                header.ncols
            )));
        }
    }

    if values.len() != header.ncols * header.nrows {
        return Err(parse_error(format!(
            "expected {} rows, found {}",
            header.nrows,
            values.len() / header.ncols.max(1)
        )));
    }

    let data = Array2::from_shape_vec((header.nrows, header.ncols), values)
        .map_err(|e| parse_error(e.to_string()))?;
    let grid = ElevationGrid::new(data)?;
    Ok((header, grid))
}

pub fn read_ascii_grid(path: &Path) -> Result<(AsciiGridHeader, ElevationGrid)> {
    let text = fs::read_to_string(path)
        .map_err(|e| DemError::InputReadError(format!("{}: {}", path.display(), e)))?;
    parse_ascii_grid(&text)
}

pub struct AsciiGridEncoder;

impl ArtifactEncoder for AsciiGridEncoder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::AsciiGrid
    }

    fn stage_message(&self) -> String {
        "Saving DEM as ASCII Grid...".to_string()
    }

    fn encode(&self, grid: &ElevationGrid, target: &JobTarget) -> Result<Vec<OutputArtifact>> {
        let path = target.path(ASCII_GRID_SUFFIX);
        fs::write(&path, encode_ascii_grid(grid))
            .map_err(|e| DemError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        debug!("Wrote {}", path.display());
        Ok(vec![OutputArtifact::new(ArtifactKind::AsciiGrid, "dem_ascii", path)])
    }
}
