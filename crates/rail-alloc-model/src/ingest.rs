// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Turning loosely typed tabular rows into validated [`Train`] records.
//!
//! Input columns are matched against a fixed list of aliases per field, so
//! `total_mileage`, `mileage_total` and `mileage` all feed the same value.
//! Missing or blank cells take the documented defaults of [`TrainBuilder`].

use crate::{
    err::{FieldOutOfRangeError, IngestError},
    train::{Certificate, MaintenanceState, Train, TrainBuilder},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{collections::BTreeMap, fmt::Display};

/// A single auto-typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl RawValue {
    /// Types a cell: finite numbers first, then `true`/`false` in any case,
    /// everything else stays text.
    pub fn parse_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if let Ok(n) = cell.parse::<f64>()
            && n.is_finite()
        {
            return RawValue::Number(n);
        }
        if cell.eq_ignore_ascii_case("true") {
            RawValue::Bool(true)
        } else if cell.eq_ignore_ascii_case("false") {
            RawValue::Bool(false)
        } else {
            RawValue::Text(cell.to_owned())
        }
    }

    #[inline]
    pub fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(t) if t.is_empty())
    }

    /// Truthiness of a fitness flag. Numbers are true unless zero, text is
    /// true unless empty.
    pub fn truthy(&self) -> bool {
        match self {
            RawValue::Number(n) => *n != 0.0,
            RawValue::Bool(b) => *b,
            RawValue::Text(t) => !t.is_empty(),
        }
    }
}

impl Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_owned())
    }
}

pub type RawRow = BTreeMap<String, RawValue>;

/// Rows of a delimited text, plus the 1-based line numbers that were dropped
/// because their column count did not match the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub rows: Vec<RawRow>,
    pub dropped_lines: Vec<usize>,
}

/// Parses comma separated text with a header row. Quoted cells may contain
/// commas, surrounding whitespace is trimmed and blank lines are skipped.
pub fn parse_delimited(text: &str) -> ParsedTable {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_owned).collect(),
        Err(_) => return ParsedTable::default(),
    };

    let mut table = ParsedTable::default();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                if let Some(pos) = e.position() {
                    table.dropped_lines.push(pos.line() as usize);
                }
                continue;
            }
        };
        if is_blank_record(&record) {
            continue;
        }
        if record.len() != headers.len() {
            if let Some(pos) = record.position() {
                table.dropped_lines.push(pos.line() as usize);
            }
            continue;
        }
        let row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(RawValue::parse_cell))
            .collect();
        table.rows.push(row);
    }
    table
}

// Whitespace-only lines come through as a single empty field.
fn is_blank_record(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(str::is_empty)
}

const ID: &[&str] = &["id", "ID"];
const MILEAGE_TOTAL: &[&str] = &["mileage_total", "total_mileage", "mileage"];
const SINCE_A: &[&str] = &["since_A", "a_inspection", "since_a"];
const SINCE_B: &[&str] = &["since_B", "b_inspection", "since_b"];
const STATE: &[&str] = &["state", "status"];
const P_FAIL: &[&str] = &["p_fail", "failure_prob", "prob_fail"];
const POS: &[&str] = &["pos", "position"];
const DAYS_SINCE_CLEAN: &[&str] = &["days_since_clean", "cleaning_days", "clean_days"];
const BRANDING_HOURS: &[&str] = &["branding_hours", "branding"];

fn certificate_aliases(certificate: Certificate) -> [&'static str; 2] {
    match certificate {
        Certificate::RollingStock => ["fitness_RS", "RS"],
        Certificate::Signalling => ["fitness_SIG", "SIG"],
        Certificate::Telecom => ["fitness_TEL", "TEL"],
    }
}

fn lookup<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a RawValue> {
    aliases
        .iter()
        .filter_map(|a| row.get(*a))
        .find(|v| !v.is_blank())
}

struct RowReader<'a> {
    row: &'a RawRow,
    line: usize,
}

impl<'a> RowReader<'a> {
    fn number(&self, field: &'static str, aliases: &[&str]) -> Result<Option<f64>, IngestError> {
        match lookup(self.row, aliases) {
            None => Ok(None),
            Some(RawValue::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(IngestError::NotANumber {
                row: self.line,
                field,
                value: other.to_string(),
            }),
        }
    }

    fn non_negative(
        &self,
        field: &'static str,
        aliases: &[&str],
    ) -> Result<Option<f64>, IngestError> {
        match self.number(field, aliases)? {
            Some(v) if v < 0.0 => Err(FieldOutOfRangeError::new(self.line, field, v).into()),
            v => Ok(v),
        }
    }

    fn count(&self, field: &'static str, aliases: &[&str]) -> Result<Option<u32>, IngestError> {
        match self.non_negative(field, aliases)? {
            None => Ok(None),
            Some(v) if v.fract() == 0.0 && v <= f64::from(u32::MAX) => Ok(Some(v as u32)),
            Some(v) => Err(FieldOutOfRangeError::new(self.line, field, v).into()),
        }
    }
}

/// Builds a train from one raw row. `index` is the 0-based position of the
/// row among the data rows and supplies the default id and stabling position.
pub fn train_from_row(row: &RawRow, index: usize) -> Result<Train, IngestError> {
    let line = index + 1;
    let reader = RowReader { row, line };

    let id = match lookup(row, ID) {
        Some(v) => v.to_string(),
        None => format!("T{:02}", index + 1),
    };
    let mut builder = TrainBuilder::new(id);

    if let Some(v) = reader.non_negative("mileage_total", MILEAGE_TOTAL)? {
        builder = builder.mileage_total(v);
    }
    if let Some(v) = reader.non_negative("since_A", SINCE_A)? {
        builder = builder.since_a(v);
    }
    if let Some(v) = reader.non_negative("since_B", SINCE_B)? {
        builder = builder.since_b(v);
    }
    if let Some(v) = lookup(row, STATE) {
        let state = v
            .to_string()
            .parse::<MaintenanceState>()
            .map_err(|source| IngestError::UnknownState { row: line, source })?;
        builder = builder.state(state);
    }
    if let Some(p) = reader.number("p_fail", P_FAIL)? {
        if !(0.0..=1.0).contains(&p) {
            return Err(FieldOutOfRangeError::new(line, "p_fail", p).into());
        }
        builder = builder.p_fail(p);
    }
    let pos = match reader.count("pos", POS)? {
        Some(p) => p,
        None => u32::try_from(index)
            .map_err(|_| FieldOutOfRangeError::new(line, "pos", index as f64))?,
    };
    builder = builder.pos(pos);
    if let Some(d) = reader.count("days_since_clean", DAYS_SINCE_CLEAN)? {
        builder = builder.days_since_clean(d);
    }
    for certificate in Certificate::ALL {
        if let Some(v) = lookup(row, &certificate_aliases(certificate)) {
            builder = builder.certificate(certificate, v.truthy());
        }
    }
    if let Some(h) = reader.non_negative("branding_hours", BRANDING_HOURS)? {
        builder = builder.branding_hours(h);
    }

    Ok(builder.build())
}

/// Validates every row; the first invalid row aborts ingestion.
pub fn ingest_rows(rows: &[RawRow]) -> Result<Vec<Train>, IngestError> {
    if rows.is_empty() {
        return Err(IngestError::Empty);
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| train_from_row(row, i))
        .collect()
}

/// Parses and validates a comma separated fleet listing.
pub fn ingest_csv(text: &str) -> Result<(Vec<Train>, Vec<usize>), IngestError> {
    let table = parse_delimited(text);
    let trains = ingest_rows(&table.rows)?;
    Ok((trains, table.dropped_lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(RawValue::parse_cell(" 42 "), RawValue::Number(42.0));
        assert_eq!(RawValue::parse_cell("TRUE"), RawValue::Bool(true));
        assert_eq!(RawValue::parse_cell("false"), RawValue::Bool(false));
        assert_eq!(RawValue::parse_cell("POH"), RawValue::Text("POH".into()));
        assert_eq!(RawValue::parse_cell("NaN"), RawValue::Text("NaN".into()));
    }

    #[test]
    fn test_parse_delimited_drops_mismatched_rows_and_blank_lines() {
        let text = "id,mileage\n\"T01\",100\n\nT02,200,extra\nT03,300\n";
        let table = parse_delimited(text);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.dropped_lines, vec![4]);
        assert_eq!(table.rows[0]["id"], RawValue::Text("T01".into()));
        assert_eq!(table.rows[1]["mileage"], RawValue::Number(300.0));
    }

    #[test]
    fn test_parse_delimited_keeps_quoted_commas() {
        let text = "id,state,mileage\nT01,\"OK, pending review\",100\n   \nT02,OK,200\n";
        let table = parse_delimited(text);
        assert!(table.dropped_lines.is_empty());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0]["state"],
            RawValue::Text("OK, pending review".into())
        );
        assert_eq!(table.rows[1]["mileage"], RawValue::Number(200.0));
    }

    #[test]
    fn test_aliases_and_defaults() {
        let text = "ID,total_mileage,a_inspection,status,failure_prob,RS,branding\n\
                    X1,250000,5200,ioh,0.2,false,12\n\
                    ,1000,,,,,\n";
        let (trains, dropped) = ingest_csv(text).unwrap();
        assert!(dropped.is_empty());
        let t = &trains[0];
        assert_eq!(t.id().as_str(), "X1");
        assert_eq!(t.mileage_total().value(), 250_000.0);
        assert_eq!(t.since_a().value(), 5_200.0);
        assert_eq!(t.state(), MaintenanceState::Ioh);
        assert_eq!(t.p_fail(), 0.2);
        assert!(!t.fitness().is_valid(Certificate::RollingStock));
        assert!(t.fitness().is_valid(Certificate::Telecom));
        assert_eq!(t.branding_hours(), 12.0);
        assert_eq!(t.pos(), 0);

        let d = &trains[1];
        assert_eq!(d.id().as_str(), "T02");
        assert_eq!(d.pos(), 1);
        assert_eq!(d.since_b().value(), TrainBuilder::DEFAULT_SINCE_B);
        assert_eq!(d.days_since_clean(), TrainBuilder::DEFAULT_DAYS_SINCE_CLEAN);
        assert_eq!(d.state(), MaintenanceState::Ok);
        assert!(d.fitness().all_passed());
    }

    #[test]
    fn test_rejects_unknown_state() {
        let err = ingest_csv("id,state\nT01,SCRAPPED\n").unwrap_err();
        assert!(matches!(err, IngestError::UnknownState { row: 1, .. }));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let err = ingest_csv("id,p_fail\nT01,1.5\n").unwrap_err();
        assert!(matches!(err, IngestError::OutOfRange(_)));
        let err = ingest_csv("id,mileage\nT01,-5\n").unwrap_err();
        assert!(matches!(err, IngestError::OutOfRange(_)));
        let err = ingest_csv("id,pos\nT01,2.5\n").unwrap_err();
        assert!(matches!(err, IngestError::OutOfRange(_)));
    }

    #[test]
    fn test_rejects_text_in_numeric_field() {
        let err = ingest_csv("id,since_A\nT01,lots\n").unwrap_err();
        assert_eq!(
            err,
            IngestError::NotANumber {
                row: 1,
                field: "since_A",
                value: "lots".into()
            }
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(ingest_csv("").unwrap_err(), IngestError::Empty);
        assert_eq!(ingest_csv("id,mileage\n").unwrap_err(), IngestError::Empty);
    }

    #[test]
    fn test_ingest_rows_from_records() {
        let mut row = RawRow::new();
        row.insert("id".into(), "T42".into());
        row.insert("fitness_SIG".into(), RawValue::Number(0.0));
        let trains = ingest_rows(&[row]).unwrap();
        assert!(!trains[0].fitness().is_valid(Certificate::Signalling));
    }
}
