use crate::error::{PlotError, Result};
use anyhow::anyhow;
use ordered_float::OrderedFloat;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;

/// A single table cell.
///
/// Equality and hashing are structural, so `Int(1)` and `Float(1.0)` are
/// different group keys. Floats are totally ordered, which makes NaN groupable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

impl Value {
    pub fn float(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Str(_) => DataType::Str,
        }
    }

    /// Numeric view of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(f.into_inner()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a non-null cell to `dtype`, as chosen by [`unify`]
    fn cast(self, dtype: DataType) -> Value {
        match (self, dtype) {
            (Value::Null, _) => Value::Null,
            (Value::Int(i), DataType::Float) => Value::float(i as f64),
            (v @ Value::Str(_), DataType::Str) => v,
            (v, DataType::Str) => Value::Str(v.to_string()),
            (v, _) => v,
        }
    }
}

/// Common type of two cell types
fn unify(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (a, b) if a == b => a,
        (DataType::Int, DataType::Float) | (DataType::Float, DataType::Int) => DataType::Float,
        _ => DataType::Str,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            // Debug keeps the decimal point, so 2.0 never reads as an int
            Value::Float(v) => write!(f, "{:?}", v.into_inner()),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub values: Vec<Value>,
}

impl Column {
    /// Build a column whose non-null cells all share one type.
    ///
    /// Mixed int and float cells are promoted to float. Any other mix is
    /// stored as strings.
    pub fn new<V: Into<Value>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let dtype = values
            .iter()
            .filter(|v| !v.is_null())
            .map(Value::dtype)
            .reduce(unify)
            .unwrap_or(DataType::Null);
        let values = values.into_iter().map(|v| v.cast(dtype)).collect();
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Schema-only column with no rows
    pub fn empty(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn take(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }
}

/// An immutable, columnar table.
///
/// The row count is stored separately from the columns so that a table with
/// zero columns can still have rows (the key table of an ungrouped partition
/// has no columns and exactly one row).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for col in &columns {
            if col.len() != height {
                return Err(PlotError::LengthMismatch {
                    name: col.name.clone(),
                    len: col.len(),
                    expected: height,
                });
            }
            if !seen.insert(col.name.as_str()) {
                return Err(PlotError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns, height })
    }

    /// Zero columns, one row
    pub fn unit() -> Self {
        Self {
            columns: Vec::new(),
            height: 1,
        }
    }

    /// Typed columns, zero rows
    pub fn empty(schema: impl IntoIterator<Item = (String, DataType)>) -> Self {
        Self {
            columns: schema
                .into_iter()
                .map(|(name, dtype)| Column::empty(name, dtype))
                .collect(),
            height: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn schema(&self) -> Vec<(String, DataType)> {
        self.columns.iter().map(|c| (c.name.clone(), c.dtype)).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PlotError::UnknownColumn(name.to_string()))
    }

    /// Resolve several columns at once, failing on the first unknown name
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Column>> {
        names.iter().map(|n| self.column(n.as_ref())).collect()
    }

    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = self.resolve(names)?.into_iter().cloned().collect();
        Table::new(columns)
    }

    /// The values of one row projected onto the given columns
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.values[row].clone()).collect()
    }

    /// Materialize a subset of rows, in the given order
    pub fn take(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            height: rows.len(),
        }
    }

    /// Return a new table with `column` appended, or replacing a column of the same name
    pub fn with_column(&self, column: Column) -> Result<Table> {
        if column.len() != self.height {
            return Err(PlotError::LengthMismatch {
                len: column.len(),
                name: column.name,
                expected: self.height,
            });
        }
        let mut columns = self.columns.clone();
        match columns.iter().position(|c| c.name == column.name) {
            Some(pos) => columns[pos] = column,
            None => columns.push(column),
        }
        Ok(Table {
            columns,
            height: self.height,
        })
    }

    /// Create a table from a JSON array of objects.
    /// Headers come from the first object; missing fields become null.
    pub fn from_json(value: &JsonValue) -> anyhow::Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let Some(first) = array.first() else {
            return Ok(Table::empty(Vec::new()));
        };
        let first_obj = first
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(array.len()); headers.len()];
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            for (header, values) in headers.iter().zip(columns.iter_mut()) {
                let val = match obj.get(header) {
                    Some(JsonValue::String(s)) => Value::Str(s.clone()),
                    Some(JsonValue::Number(n)) => match n.as_i64() {
                        Some(i) => Value::Int(i),
                        None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
                    },
                    Some(JsonValue::Bool(b)) => Value::Bool(*b),
                    Some(JsonValue::Null) | None => Value::Null,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                values.push(val);
            }
        }

        let columns = headers
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Ok(Table::new(columns)?)
    }
}
