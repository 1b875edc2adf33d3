use crate::core::models::{Decoy, DecoySet, ModelError};
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in '{path}' on line {line}: {kind}")]
    Parse {
        path: PathBuf,
        line: usize,
        kind: PdbParseErrorKind,
    },

    #[error("No C-alpha atoms matched in '{path}'")]
    NoCaAtoms { path: PathBuf },

    #[error("Decoy list '{path}' names no files")]
    EmptyList { path: PathBuf },

    #[error("Decoy set validation failed: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid float in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("ATOM/HETATM record is too short to carry coordinates")]
    LineTooShort,
}

/// Controls which C-alpha atoms a reader keeps.
#[derive(Debug, Clone)]
pub struct PdbReadOptions {
    /// Chain identifiers to include; a space accepts atoms with no chain.
    pub chains: String,
    /// 1-based index of the first C-alpha to keep.
    pub first_ca: usize,
    /// 1-based index of the last C-alpha to keep; `None` keeps to the end.
    pub last_ca: Option<usize>,
}

impl Default for PdbReadOptions {
    fn default() -> Self {
        Self {
            chains: "AC ".to_string(),
            first_ca: 1,
            last_ca: None,
        }
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_coord(
    line: &str,
    start: usize,
    end: usize,
    path: &Path,
    line_num: usize,
) -> Result<f64, PdbError> {
    let raw = slice_and_trim(line, start, end);
    raw.parse::<f64>().map_err(|_| PdbError::Parse {
        path: path.to_path_buf(),
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: raw.to_string(),
        },
    })
}

/// Reads the C-alpha trace from one PDB file.
///
/// Keeps `ATOM`/`HETATM` records whose atom name is `CA`, whose chain is
/// listed in the options, and whose C-alpha ordinal falls in the configured
/// range. Consecutive records sharing a residue id (alternate locations)
/// contribute one point. Reading stops at `ENDMDL`, or at `TER` once at
/// least one C-alpha has been accepted.
pub fn read_ca_trace(
    reader: impl BufRead,
    path: &Path,
    options: &PdbReadOptions,
) -> Result<Vec<Point3<f64>>, PdbError> {
    let mut coords = Vec::new();
    let mut prev_residue: Option<String> = None;
    let mut ca_ordinal = 0usize;

    for (idx, line_res) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line_res.map_err(|source| PdbError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if line.starts_with("TER") && !coords.is_empty() {
            break;
        }
        if line.starts_with("ENDMDL") {
            break;
        }
        if !line.starts_with("ATOM") && !line.starts_with("HETATM") {
            continue;
        }
        if slice_and_trim(&line, 12, 16) != "CA" {
            continue;
        }

        // Alternate-location records repeat the residue id; they contribute
        // no point and do not advance the C-alpha ordinal, while
        // chain-excluded and out-of-range C-alphas still do.
        let residue_id = slice_and_trim(&line, 22, 28);
        if prev_residue.as_deref() == Some(residue_id) {
            continue;
        }
        prev_residue = Some(residue_id.to_string());

        ca_ordinal += 1;

        let chain = line.as_bytes().get(21).copied().unwrap_or(b' ') as char;
        let included = options
            .chains
            .chars()
            .any(|c| c.eq_ignore_ascii_case(&chain));
        if !included {
            continue;
        }

        if ca_ordinal < options.first_ca {
            continue;
        }
        if let Some(last) = options.last_ca {
            if ca_ordinal > last {
                break;
            }
        }

        if line.len() < 54 {
            return Err(PdbError::Parse {
                path: path.to_path_buf(),
                line: line_num,
                kind: PdbParseErrorKind::LineTooShort,
            });
        }

        let x = parse_coord(&line, 30, 38, path, line_num)?;
        let y = parse_coord(&line, 38, 46, path, line_num)?;
        let z = parse_coord(&line, 46, 54, path, line_num)?;
        coords.push(Point3::new(x, y, z));
    }

    if coords.is_empty() {
        return Err(PdbError::NoCaAtoms {
            path: path.to_path_buf(),
        });
    }
    Ok(coords)
}

/// Loads one decoy from a PDB file, centering it on construction.
pub fn load_decoy(path: &Path, options: &PdbReadOptions) -> Result<Decoy, PdbError> {
    let file = File::open(path).map_err(|source| PdbError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let coords = read_ca_trace(BufReader::new(file), path, options)?;
    Ok(Decoy::new(path.to_string_lossy().into_owned(), coords))
}

/// Loads a complete decoy set from a list file naming one PDB path per line.
///
/// Relative paths are resolved against the list file's directory. Every file
/// is read exactly once, up front; the resulting set is validated for a
/// uniform residue count before it is returned.
pub fn load_decoy_list(list_path: &Path, options: &PdbReadOptions) -> Result<DecoySet, PdbError> {
    let file = File::open(list_path).map_err(|source| PdbError::Io {
        path: list_path.to_path_buf(),
        source,
    })?;
    let base = list_path.parent().unwrap_or_else(|| Path::new("."));

    let mut decoys = Vec::new();
    for line_res in BufReader::new(file).lines() {
        let line = line_res.map_err(|source| PdbError::Io {
            path: list_path.to_path_buf(),
            source,
        })?;
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let path = if Path::new(entry).is_absolute() {
            PathBuf::from(entry)
        } else {
            base.join(entry)
        };
        decoys.push(load_decoy(&path, options)?);
    }

    if decoys.is_empty() {
        return Err(PdbError::EmptyList {
            path: list_path.to_path_buf(),
        });
    }
    Ok(DecoySet::new(decoys)?)
}
