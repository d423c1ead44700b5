//! Parser for the `--info` block printed by transmission-remote.
//!
//! A block looks like:
//!
//! ```text
//! NAME
//!   Id: 149
//!   Name: Sample.Torrent.Name
//!   ...
//! TRANSFER
//!   State: Idle
//!   Location: /downloads/complete/sonarr
//!   Percent Done: 100%
//!   ...
//!   Ratio: 0.1
//!   ...
//! ```
//!
//! Each of the five fields used by the removal workflow must appear on exactly one
//! line. Anything else means the daemon's output format has drifted, and the whole
//! block is rejected before any torrent is touched.

use crate::models::TorrentRecord;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// A field extracted from the info block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Ratio,
    Progress,
    StopLocation,
    State,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Ratio,
        Field::Progress,
        Field::StopLocation,
        Field::State,
    ];

    /// Label that marks this field's line in the info block
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name:",
            Field::Ratio => "Ratio:",
            Field::Progress => "Percent Done:",
            Field::StopLocation => "Location:",
            Field::State => "State:",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Ratio => "ratio",
            Field::Progress => "progress",
            Field::StopLocation => "stop_location",
            Field::State => "state",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field whose label did not match exactly one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: Field,
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (expected {}, found {})",
            self.field, self.expected, self.found
        )
    }
}

/// Errors raised while parsing an info block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("The torrent info did not return exactly one entry for {}", join_mismatches(.0))]
    Cardinality(Vec<FieldMismatch>),

    #[error("The torrent 'ratio' line is not a float-formatted value: {0:?}")]
    RatioNotFloat(String),

    #[error("The torrent 'ratio' value is not a valid non-negative number: {0:?}")]
    InvalidRatio(String),
}

impl ParseError {
    /// Fields named by this error
    pub fn fields(&self) -> Vec<Field> {
        match self {
            ParseError::Cardinality(mismatches) => mismatches.iter().map(|m| m.field).collect(),
            ParseError::RatioNotFloat(_) | ParseError::InvalidRatio(_) => vec![Field::Ratio],
        }
    }
}

fn join_mismatches(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse one torrent's info block.
///
/// Returns `Ok(None)` when the daemon printed nothing for the torrent, which the
/// caller treats as "skip", not as an error.
///
/// # Errors
///
/// - [`ParseError::Cardinality`] if any field's label matched zero or several lines.
///   All five fields are checked first so every offending field is reported.
/// - [`ParseError::RatioNotFloat`] if the ratio value has no decimal point.
/// - [`ParseError::InvalidRatio`] if it has one but is not a non-negative number.
pub fn parse_torrent_info<S: AsRef<str>>(
    lines: &[S],
) -> Result<Option<TorrentRecord>, ParseError> {
    if lines.is_empty() {
        return Ok(None);
    }

    let mut matches: IndexMap<Field, Vec<&str>> =
        Field::ALL.iter().map(|field| (*field, Vec::new())).collect();

    for line in lines {
        let line = line.as_ref();
        for (field, found) in matches.iter_mut() {
            if let Some((_, value)) = line.split_once(field.label()) {
                found.push(value.trim());
            }
        }
    }

    let mismatches: Vec<FieldMismatch> = matches
        .iter()
        .filter(|(_, found)| found.len() != 1)
        .map(|(field, found)| FieldMismatch {
            field: *field,
            expected: 1,
            found: found.len(),
        })
        .collect();

    if !mismatches.is_empty() {
        return Err(ParseError::Cardinality(mismatches));
    }

    let value = |field: Field| matches[&field][0].to_string();

    let ratio = parse_ratio(matches[&Field::Ratio][0])?;

    let record = TorrentRecord {
        name: value(Field::Name),
        ratio,
        progress: value(Field::Progress),
        state: value(Field::State),
        stop_location: value(Field::StopLocation),
    };

    tracing::debug!(
        "A torrent entry was discovered - Name: {}, Ratio: {}, Progress: {}, Stop Location: {}, State: {}",
        record.name,
        record.ratio,
        record.progress,
        record.stop_location,
        record.state
    );

    Ok(Some(record))
}

fn parse_ratio(raw: &str) -> Result<f64, ParseError> {
    if !raw.contains('.') {
        return Err(ParseError::RatioNotFloat(raw.to_string()));
    }

    match raw.parse::<f64>() {
        Ok(ratio) if ratio.is_finite() && ratio >= 0.0 => Ok(ratio),
        _ => Err(ParseError::InvalidRatio(raw.to_string())),
    }
}
