// Reading node records from files.
//
// Two formats are supported:
// - reports, one line per node:
//   "Valve AA has flow rate=0; tunnels lead to valves DD, II, BB"
// - JSON, an array of records: [{"id": "AA", "value": 0, "neighborIds": ["DD"]}]

use clap::ValueEnum;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::Error as JSONError;
use std::path::Path;
use thiserror::Error;

use crate::graph::NodeRecord;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// One "Valve XX has flow rate=N; tunnels lead to valves ..." per line.
    Report,
    /// JSON array of {"id", "value", "neighborIds"} records.
    Json,
}

impl InputFormat {
    /// Guesses the format from the file extension, reports by default.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Report,
        }
    }
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed reading the input")]
    Io(#[from] std::io::Error),
    #[error("Failed parsing the JSON input")]
    Json(#[from] JSONError),
    #[error("line {line}: can't parse {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("line {line}: invalid value {value:?}")]
    InvalidValue { line: usize, value: String },
}

pub fn parse_report(text: &str) -> Result<Vec<NodeRecord>, InputError> {
    lazy_static! {
        static ref REPORT_LINE: Regex = Regex::new(
            r"^Valve (\w+) has flow rate=([^;]*); tunnels? leads? to valves? (.*)$")
            .unwrap();
    }
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let caps = REPORT_LINE.captures(line).ok_or_else(|| InputError::MalformedLine {
            line: line_number,
            text: line.to_string(),
        })?;
        let value = caps[2].trim().parse::<u32>().map_err(|_| InputError::InvalidValue {
            line: line_number,
            value: caps[2].to_string(),
        })?;
        let neighbors = caps[3].split(',')
            .map(|neighbor| neighbor.trim().to_string())
            .filter(|neighbor| !neighbor.is_empty())
            .collect();
        records.push(NodeRecord { id: caps[1].to_string(), value, neighbors });
    }
    debug!("Parsed {} report lines", records.len());
    Ok(records)
}

pub fn parse_json(text: &str) -> Result<Vec<NodeRecord>, InputError> {
    Ok(serde_json::from_str(text)?)
}

pub fn parse(text: &str, format: InputFormat) -> Result<Vec<NodeRecord>, InputError> {
    match format {
        InputFormat::Report => parse_report(text),
        InputFormat::Json => parse_json(text),
    }
}

pub fn load<P: AsRef<Path>>(path: P,
                            format: InputFormat) -> Result<Vec<NodeRecord>, InputError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text, format)
}
