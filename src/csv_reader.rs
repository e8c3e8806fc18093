// CSV loading with per-column type inference

use crate::data::{Column, Table, Value};
use anyhow::{Context, Result};
use std::io::{self, Read};

/// Read CSV data from stdin
pub fn read_csv_from_stdin() -> Result<Table> {
    let stdin = io::stdin();
    read_csv(stdin.lock())
}

/// Read CSV data with headers from any reader.
///
/// Each column gets the narrowest type that fits every non-empty cell:
/// int, then float, then bool, else string. Empty cells are null.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV record {}", line + 1))?;
        if record.len() != headers.len() {
            anyhow::bail!(
                "CSV record {} has {} fields, expected {}",
                line + 1,
                record.len(),
                headers.len()
            );
        }
        for (col, field) in record.iter().enumerate() {
            cells[col].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer_values(&raw)))
        .collect();

    Ok(Table::new(columns)?)
}

fn infer_values(raw: &[String]) -> Vec<Value> {
    let present = || raw.iter().filter(|s| !s.is_empty());

    let convert = |parse: &dyn Fn(&str) -> Value| -> Vec<Value> {
        raw.iter()
            .map(|s| if s.is_empty() { Value::Null } else { parse(s) })
            .collect()
    };

    if present().all(|s| s.parse::<i64>().is_ok()) {
        convert(&|s| s.parse::<i64>().map_or(Value::Null, Value::Int))
    } else if present().all(|s| s.parse::<f64>().is_ok()) {
        convert(&|s| s.parse::<f64>().map_or(Value::Null, Value::float))
    } else if present().all(|s| s.parse::<bool>().is_ok()) {
        convert(&|s| s.parse::<bool>().map_or(Value::Null, Value::Bool))
    } else {
        convert(&|s| Value::Str(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataType;

    #[test]
    fn test_read_csv_infers_types() {
        let data = "a,b,c,d\n1,1.5,true,x\n2,2,false,y\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.column("a").unwrap().dtype, DataType::Int);
        assert_eq!(table.column("b").unwrap().dtype, DataType::Float);
        assert_eq!(table.column("c").unwrap().dtype, DataType::Bool);
        assert_eq!(table.column("d").unwrap().dtype, DataType::Str);
        assert_eq!(table.column("b").unwrap().values[1], Value::float(2.0));
    }

    #[test]
    fn test_read_csv_empty_cells_are_null() {
        let data = "a,b\n1,\n,x\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.column("a").unwrap().values, vec![Value::Int(1), Value::Null]);
        assert_eq!(table.column("b").unwrap().values, vec![Value::Null, Value::from("x")]);
        assert_eq!(table.column("a").unwrap().dtype, DataType::Int);
    }

    #[test]
    fn test_read_csv_headers_only() {
        let table = read_csv("a,b\n".as_bytes()).unwrap();
        assert_eq!(table.height(), 0);
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_read_csv_trims_whitespace() {
        let table = read_csv("x, y\n1, 2\n".as_bytes()).unwrap();
        assert!(table.has_column("y"));
        assert_eq!(table.column("y").unwrap().values, vec![Value::Int(2)]);
    }

    #[test]
    fn test_read_csv_ragged_row() {
        assert!(read_csv("a,b\n1,2\n3\n".as_bytes()).is_err());
    }
}
