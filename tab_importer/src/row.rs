use std::io::Read;

use csv::StringRecord;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One physical line of an input file, keyed by column header.
///
/// Cells are typed the way they are read: booleans and numerals become JSON
/// booleans and numbers, empty cells become `null`, everything else a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: Map<String, Value>,
}

lazy_static! {
    static ref NUMERAL: Regex = Regex::new(r"^-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?$").unwrap();
}

pub fn parse_cell(raw: &str) -> Value {
    let raw = raw.trim();
    match raw {
        "" => Value::Null,
        "true" | "TRUE" | "True" => Value::Bool(true),
        "false" | "FALSE" | "False" => Value::Bool(false),
        _ if NUMERAL.is_match(raw) => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Number(i.into())
            } else {
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(raw.to_string()))
            }
        }
        _ => Value::String(raw.to_string()),
    }
}

/// The textual form of a cell, used for tokens and cross-reference keys.
/// `null` (and non-scalar values) read as absent.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Some(n.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl Row {
    pub fn new() -> Self {
        Row { cells: Map::new() }
    }

    pub fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let cells = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.to_string(), parse_cell(cell)))
            .collect();
        Row { cells }
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column).filter(|v| !v.is_null())
    }

    pub fn take(&mut self, column: &str) -> Option<Value> {
        self.cells.remove(column).filter(|v| !v.is_null())
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(cell_text)
    }

    pub fn take_text(&mut self, column: &str) -> Option<String> {
        self.take(column).as_ref().and_then(cell_text)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(|v| v.is_null())
    }
}

impl From<Map<String, Value>> for Row {
    fn from(cells: Map<String, Value>) -> Self {
        Row { cells }
    }
}

/// Lazily reads [`Row`]s from delimited text with a header line.
pub struct RowReader<R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
}

impl<R: Read> RowReader<R> {
    pub fn new(reader: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        Ok(RowReader { reader, headers })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<Row, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        loop {
            match self.reader.read_record(&mut record) {
                Ok(false) => return None,
                Ok(true) => {
                    let row = Row::from_record(&self.headers, &record);
                    // Lines made only of delimiters and whitespace carry no data
                    if !row.is_empty() {
                        return Some(Ok(row));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dynamic_typing() {
        assert_eq!(parse_cell("12"), json!(12));
        assert_eq!(parse_cell("-3"), json!(-3));
        assert_eq!(parse_cell("1.5"), json!(1.5));
        assert_eq!(parse_cell("TRUE"), json!(true));
        assert_eq!(parse_cell("false"), json!(false));
        assert_eq!(parse_cell("yes"), json!("yes"));
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("  "), Value::Null);
        assert_eq!(parse_cell("R1"), json!("R1"));
        assert_eq!(parse_cell("1e3"), json!(1000.0));
        assert_eq!(parse_cell("inf"), json!("inf"));
    }

    #[test]
    fn test_cell_text_round_numbers_have_no_fraction() {
        assert_eq!(cell_text(&json!(7)), Some("7".into()));
        assert_eq!(cell_text(&json!(7.0)), Some("7".into()));
        assert_eq!(cell_text(&json!(7.25)), Some("7.25".into()));
        assert_eq!(cell_text(&json!(true)), Some("true".into()));
        assert_eq!(cell_text(&Value::Null), None);
    }

    #[test]
    fn test_read_rows_skips_blank_lines() -> Result<(), anyhow::Error> {
        let test_file = "name,code,region
Alpha University,ALP,North
,,
Beta College,12,
";
        let rows = RowReader::new(test_file.as_bytes())?.collect::<Result<Vec<_>, _>>()?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("name"), Some("Alpha University".into()));
        assert_eq!(rows[1].get("code"), Some(&json!(12)));
        assert_eq!(rows[1].get("region"), None);
        assert!(!rows[1].contains("region"));
        Ok(())
    }

    #[test]
    fn test_short_records_leave_columns_absent() -> Result<(), anyhow::Error> {
        let test_file = "reference,speaker1_name,speaker2_name
Team A,Ann
";
        let rows = RowReader::new(test_file.as_bytes())?.collect::<Result<Vec<_>, _>>()?;

        assert_eq!(rows[0].text("speaker1_name"), Some("Ann".into()));
        assert_eq!(rows[0].text("speaker2_name"), None);
        Ok(())
    }

    #[test]
    fn test_take_removes_column() {
        let mut row = Row::new().with("seq", 2).with("rounds", "R1");
        assert_eq!(row.take_text("seq"), Some("2".into()));
        assert!(!row.contains("seq"));
        assert_eq!(serde_json::to_value(&row).unwrap(), json!({"rounds": "R1"}));
    }
}
