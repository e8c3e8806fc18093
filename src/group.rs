// Grouping engine and dense-index assignment

use crate::data::{Column, DataType, Table, Value};
use crate::error::Result;
use indexmap::IndexMap;
use tracing::debug;

/// Distinct key tuples of `columns` in first-occurrence order, each with the
/// rows (in table order) that carry it.
///
/// An empty column list yields a single empty key covering every row.
pub fn distinct_keys<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
) -> Result<IndexMap<Vec<Value>, Vec<usize>>> {
    let cols = table.resolve(columns)?;
    let mut buckets: IndexMap<Vec<Value>, Vec<usize>> = IndexMap::new();
    for row in 0..table.height() {
        let key: Vec<Value> = cols.iter().map(|c| c.values[row].clone()).collect();
        buckets.entry(key).or_default().push(row);
    }
    Ok(buckets)
}

/// Partition `table` by `by`, returning the key table and one row subset per group.
///
/// - No key columns: a single group holding the whole table, even when the
///   table is empty; the key table has no columns and one row.
/// - Zero rows with key columns: no groups; the key table carries the key
///   schema with zero rows. Key columns the empty table lacks are typed null.
/// - Otherwise groups follow the first occurrence of each key, scanning top down.
pub fn group_by<S: AsRef<str>>(table: &Table, by: &[S]) -> Result<(Table, Vec<Table>)> {
    if by.is_empty() {
        return Ok((Table::unit(), vec![table.clone()]));
    }

    if table.is_empty() {
        let schema = by.iter().map(|name| {
            let name = name.as_ref();
            let dtype = table.column(name).map_or(DataType::Null, |c| c.dtype);
            (name.to_string(), dtype)
        });
        return Ok((Table::empty(schema), Vec::new()));
    }

    let dtypes: Vec<DataType> = table.resolve(by)?.iter().map(|c| c.dtype).collect();
    let buckets = distinct_keys(table, by)?;

    let mut key_columns: Vec<Vec<Value>> = vec![Vec::with_capacity(buckets.len()); by.len()];
    let mut subsets = Vec::with_capacity(buckets.len());
    for (key, rows) in &buckets {
        for (values, value) in key_columns.iter_mut().zip(key) {
            values.push(value.clone());
        }
        subsets.push(table.take(rows));
    }

    let columns = by
        .iter()
        .zip(dtypes)
        .zip(key_columns)
        .map(|((name, dtype), values)| Column {
            name: name.as_ref().to_string(),
            dtype,
            values,
        })
        .collect();

    debug!(groups = subsets.len(), keys = by.len(), "grouped table");
    Ok((Table::new(columns)?, subsets))
}

/// Append an integer column `name` holding each row's dense rank over `columns`.
///
/// Ranks are 0-based in order of first appearance. Only `columns` are read, so
/// index columns appended by earlier calls never influence later ones. An
/// empty column list ranks every row 0.
pub fn with_index<S: AsRef<str>>(key_table: &Table, columns: &[S], name: &str) -> Result<Table> {
    let ranks: Vec<Value> = if columns.is_empty() {
        vec![Value::Int(0); key_table.height()]
    } else {
        // Distinct projections first, then join every row back to its rank.
        let distinct = distinct_keys(key_table, columns)?;
        let mut ranks = vec![Value::Null; key_table.height()];
        for (rank, rows) in distinct.values().enumerate() {
            for &row in rows {
                ranks[row] = Value::Int(rank as i64);
            }
        }
        ranks
    };

    key_table.with_column(Column {
        name: name.to_string(),
        dtype: DataType::Int,
        values: ranks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data() -> Table {
        Table::new(vec![
            Column::new("a", [1, 1, 1, 2, 2, 2]),
            Column::new("b", [3, 3, 4, 4, 5, 5]),
            Column::new("x", [0, 1, 2, 3, 4, 5]),
        ])
        .unwrap()
    }

    fn ints(col: &Column) -> Vec<i64> {
        col.values.iter().map(|v| v.as_i64().unwrap()).collect()
    }

    #[test]
    fn test_group_by_no_by() {
        let data = Table::new(vec![Column::new("x", [1, 2, 3])]).unwrap();
        let (group, dfs) = group_by::<&str>(&data, &[]).unwrap();
        assert_eq!(group, Table::unit());
        assert_eq!(dfs.len(), 1);
        assert_eq!(dfs[0], data);
    }

    #[test]
    fn test_group_by_no_by_on_empty_table_is_one_group() {
        let data = Table::empty(vec![("x".to_string(), DataType::Int)]);
        let (group, dfs) = group_by::<&str>(&data, &[]).unwrap();
        assert_eq!(group.height(), 1);
        assert_eq!(dfs.len(), 1);
        assert!(dfs[0].is_empty());
    }

    #[test]
    fn test_group_by_empty() {
        let (group, dfs) = group_by(&Table::empty(Vec::new()), &["x"]).unwrap();
        assert_eq!(group.column_names(), vec!["x"]);
        assert_eq!(group.height(), 0);
        assert!(dfs.is_empty());
    }

    #[test]
    fn test_group_by_no_data_keeps_dtype() {
        let data = Table::empty(vec![("x".to_string(), DataType::Float)]);
        let (group, dfs) = group_by(&data, &["x"]).unwrap();
        assert_eq!(group.schema(), vec![("x".to_string(), DataType::Float)]);
        assert!(dfs.is_empty());
    }

    #[test]
    fn test_group_by_first_occurrence_order() {
        let data = Table::new(vec![
            Column::new("g", ["c", "a", "c", "b", "a"]),
            Column::new("v", [1, 2, 3, 4, 5]),
        ])
        .unwrap();
        let (group, dfs) = group_by(&data, &["g"]).unwrap();
        assert_eq!(
            group.column("g").unwrap().values,
            vec![Value::from("c"), Value::from("a"), Value::from("b")]
        );
        assert_eq!(ints(dfs[0].column("v").unwrap()), vec![1, 3]);
        assert_eq!(ints(dfs[1].column("v").unwrap()), vec![2, 5]);
        assert_eq!(ints(dfs[2].column("v").unwrap()), vec![4]);
    }

    #[test]
    fn test_group_by_partition_is_complete() {
        let data = make_data();
        let (group, dfs) = group_by(&data, &["a", "b"]).unwrap();
        assert_eq!(group.height(), dfs.len());
        let total: usize = dfs.iter().map(Table::height).sum();
        assert_eq!(total, data.height());

        let mut seen: Vec<i64> = dfs.iter().flat_map(|d| ints(d.column("x").unwrap())).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_group_by_unknown_column() {
        let res = group_by(&make_data(), &["nope"]);
        assert!(matches!(res, Err(crate::error::PlotError::UnknownColumn(_))));
    }

    #[test]
    fn test_with_index_dense_and_row_order() {
        let (group, _) = group_by(&make_data(), &["a", "b"]).unwrap();
        let indexed = with_index(&group, &["b"], "b_idx").unwrap();
        assert_eq!(ints(indexed.column("b_idx").unwrap()), vec![0, 1, 1, 2]);
        assert_eq!(ints(indexed.column("a").unwrap()), vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_with_index_empty_columns_is_zero() {
        let (group, _) = group_by(&make_data(), &["a"]).unwrap();
        let indexed = with_index::<&str>(&group, &[], "none").unwrap();
        assert_eq!(ints(indexed.column("none").unwrap()), vec![0, 0]);
    }

    #[test]
    fn test_with_index_repeated_calls_are_independent() {
        let (group, _) = group_by(&make_data(), &["a", "b"]).unwrap();
        let t = with_index(&group, &["a"], "first").unwrap();
        let t = with_index(&t, &["a", "b"], "second").unwrap();
        let t = with_index(&t, &["a"], "third").unwrap();
        assert_eq!(ints(t.column("first").unwrap()), vec![0, 0, 1, 1]);
        assert_eq!(ints(t.column("second").unwrap()), vec![0, 1, 2, 3]);
        assert_eq!(ints(t.column("third").unwrap()), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_with_index_on_empty_key_table() {
        let (group, _) = group_by(&Table::empty(Vec::new()), &["x"]).unwrap();
        let t = with_index(&group, &["x"], "x_idx").unwrap();
        assert_eq!(t.height(), 0);
        assert!(t.has_column("x_idx"));
    }
}
