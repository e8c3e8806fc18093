// Grouped-dimension index: facet and aesthetic dimensions over one partition

use crate::columns::union;
use crate::data::{Column, Table, Value};
use crate::error::{PlotError, Result};
use crate::group::{group_by, with_index};
use indexmap::IndexMap;
use tracing::debug;

/// Name of the dense-index column for a dimension in the key table
pub fn index_column(dimension: &str) -> String {
    format!("{}_idx", dimension)
}

/// One grouping pass over the union of every dimension's columns, plus one
/// dense index per dimension.
///
/// Because all dimensions share the same partition, a row can never land in
/// inconsistent groups for, say, the row facet and the color aesthetic.
#[derive(Debug, Clone)]
pub struct GroupedDimensionIndex {
    dimensions: IndexMap<String, Vec<String>>,
    keys: Table,
    groups: Vec<Table>,
}

impl GroupedDimensionIndex {
    pub fn new<I, K>(table: &Table, dimensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        let dimensions: IndexMap<String, Vec<String>> = dimensions
            .into_iter()
            .map(|(name, cols)| (name.into(), cols))
            .collect();

        let by = union(dimensions.values().map(Vec::as_slice));
        for name in dimensions.keys() {
            let idx = index_column(name);
            if by.contains(&idx) {
                return Err(PlotError::DuplicateColumn(idx));
            }
        }

        // An empty table has no groups at all, even for dimensions without columns.
        let (mut keys, groups) = if table.is_empty() {
            let (keys, _) = group_by(table, &by)?;
            let keys = if by.is_empty() { Table::empty(Vec::new()) } else { keys };
            (keys, Vec::new())
        } else {
            group_by(table, &by)?
        };

        for (name, cols) in &dimensions {
            keys = with_index(&keys, cols, &index_column(name))?;
        }

        debug!(
            groups = groups.len(),
            dimensions = dimensions.len(),
            key_columns = by.len(),
            "built grouped dimension index"
        );
        Ok(Self {
            dimensions,
            keys,
            groups,
        })
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Key table: raw key columns followed by one `{name}_idx` column per dimension
    pub fn key_table(&self) -> &Table {
        &self.keys
    }

    pub fn groups(&self) -> &[Table] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Result<&Table> {
        self.groups.get(index).ok_or_else(|| PlotError::GroupOutOfRange {
            index,
            len: self.groups.len(),
        })
    }

    pub fn columns(&self, name: &str) -> Result<&[String]> {
        self.dimensions
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PlotError::UnknownDimension(name.to_string()))
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    fn index_values(&self, name: &str) -> Result<&Column> {
        self.columns(name)?;
        self.keys.column(&index_column(name))
    }

    /// Number of distinct values of a dimension, 0 when there are no groups
    pub fn n_unique(&self, name: &str) -> Result<usize> {
        let max = self
            .index_values(name)?
            .values
            .iter()
            .filter_map(Value::as_i64)
            .max();
        Ok(max.map_or(0, |m| m as usize + 1))
    }

    /// Dense index of a group within one dimension
    pub fn index(&self, group: usize, name: &str) -> Result<usize> {
        let values = self.index_values(name)?;
        self.group(group)?;
        let idx = values.values[group].as_i64().unwrap_or(0);
        Ok(idx as usize)
    }

    /// Raw key values of a dimension for one group, in column order
    pub fn item(&self, group: usize, name: &str) -> Result<Vec<Value>> {
        let columns = self.columns(name)?;
        self.group(group)?;
        columns
            .iter()
            .map(|c| Ok(self.keys.column(c)?.values[group].clone()))
            .collect()
    }

    /// Like [`item`](Self::item), keyed by column name
    pub fn item_named(&self, group: usize, name: &str) -> Result<IndexMap<String, Value>> {
        let columns = self.columns(name)?;
        let values = self.item(group, name)?;
        Ok(columns.iter().cloned().zip(values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::normalize;
    use crate::data::DataType;

    fn make_data() -> Table {
        Table::new(vec![
            Column::new("a", [1, 1, 1, 2, 2, 2]),
            Column::new("b", [3, 3, 4, 4, 5, 5]),
            Column::new("x", [0, 1, 2, 3, 4, 5]),
        ])
        .unwrap()
    }

    fn ints(t: &Table, name: &str) -> Vec<i64> {
        t.column(name)
            .unwrap()
            .values
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect()
    }

    fn facet(row: Vec<String>, col: Vec<String>) -> GroupedDimensionIndex {
        GroupedDimensionIndex::new(&make_data(), [("row", row), ("col", col)]).unwrap()
    }

    #[test]
    fn test_row_col() {
        let result = facet(normalize("a"), normalize("b"));
        let keys = result.key_table();
        assert_eq!(keys.column_names(), vec!["a", "b", "row_idx", "col_idx"]);
        assert_eq!(ints(keys, "a"), vec![1, 1, 2, 2]);
        assert_eq!(ints(keys, "b"), vec![3, 4, 4, 5]);
        assert_eq!(ints(keys, "row_idx"), vec![0, 0, 1, 1]);
        assert_eq!(ints(keys, "col_idx"), vec![0, 1, 1, 2]);
        assert_eq!(result.len(), 4);
        assert_eq!(result.n_unique("row").unwrap(), 2);
        assert_eq!(result.n_unique("col").unwrap(), 3);
    }

    #[test]
    fn test_row_only() {
        let result = facet(normalize("a"), normalize(None::<&str>));
        assert_eq!(ints(result.key_table(), "row_idx"), vec![0, 1]);
        assert_eq!(ints(result.key_table(), "col_idx"), vec![0, 0]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.n_unique("row").unwrap(), 2);
        assert_eq!(result.n_unique("col").unwrap(), 1);
    }

    #[test]
    fn test_col_only() {
        let result = facet(Vec::new(), normalize("b"));
        assert_eq!(ints(result.key_table(), "row_idx"), vec![0, 0, 0]);
        assert_eq!(ints(result.key_table(), "col_idx"), vec![0, 1, 2]);
        assert_eq!(result.n_unique("row").unwrap(), 1);
        assert_eq!(result.n_unique("col").unwrap(), 3);
    }

    #[test]
    fn test_row_list() {
        let result = facet(normalize(["a", "b"]), Vec::new());
        assert_eq!(ints(result.key_table(), "row_idx"), vec![0, 1, 2, 3]);
        assert_eq!(result.len(), 4);
        assert_eq!(result.n_unique("row").unwrap(), 4);
        assert_eq!(result.n_unique("col").unwrap(), 1);
    }

    #[test]
    fn test_no_facet() {
        let result = facet(Vec::new(), Vec::new());
        assert_eq!(result.key_table().column_names(), vec!["row_idx", "col_idx"]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.group(0).unwrap().height(), 6);
        assert_eq!(result.n_unique("row").unwrap(), 1);
        assert_eq!(result.n_unique("col").unwrap(), 1);
    }

    #[test]
    fn test_n_unique_on_empty_table_is_zero() {
        let empty = Table::empty(vec![("a".to_string(), DataType::Int)]);
        let result =
            GroupedDimensionIndex::new(&empty, [("row", normalize("a")), ("col", Vec::new())])
                .unwrap();
        assert_eq!(result.len(), 0);
        assert_eq!(result.n_unique("row").unwrap(), 0);
        assert_eq!(result.n_unique("col").unwrap(), 0);
    }

    #[test]
    fn test_n_unique_on_empty_table_without_columns_is_zero() {
        let empty = Table::empty(Vec::new());
        let result = GroupedDimensionIndex::new(&empty, [("color", Vec::new())]).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.n_unique("color").unwrap(), 0);
    }

    #[test]
    fn test_item_positional_and_named() {
        let result = GroupedDimensionIndex::new(
            &make_data(),
            [("row", normalize("a")), ("color", normalize(["b", "a"]))],
        )
        .unwrap();
        assert_eq!(result.item(2, "row").unwrap(), vec![Value::Int(2)]);
        assert_eq!(result.item(2, "color").unwrap(), vec![Value::Int(4), Value::Int(2)]);

        let named = result.item_named(2, "color").unwrap();
        let keys: Vec<&String> = named.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(named["b"], Value::Int(4));
    }

    #[test]
    fn test_item_errors() {
        let result = facet(normalize("a"), Vec::new());
        assert!(matches!(
            result.item(5, "row"),
            Err(PlotError::GroupOutOfRange { index: 5, len: 2 })
        ));
        assert!(matches!(result.item(0, "shape"), Err(PlotError::UnknownDimension(_))));
        assert!(matches!(result.n_unique("shape"), Err(PlotError::UnknownDimension(_))));
    }

    #[test]
    fn test_overlapping_dimensions_share_partition() {
        let result = GroupedDimensionIndex::new(
            &make_data(),
            [("row", normalize("a")), ("color", normalize("a")), ("shape", normalize("b"))],
        )
        .unwrap();
        assert_eq!(result.len(), 4);
        for g in 0..result.len() {
            assert_eq!(result.index(g, "row").unwrap(), result.index(g, "color").unwrap());
        }
        assert_eq!(result.n_unique("shape").unwrap(), 3);
    }

    #[test]
    fn test_index_column_collision() {
        let data = Table::new(vec![Column::new("row_idx", [1])]).unwrap();
        let res = GroupedDimensionIndex::new(&data, [("row", normalize("row_idx"))]);
        assert!(matches!(res, Err(PlotError::DuplicateColumn(_))));
    }
}
