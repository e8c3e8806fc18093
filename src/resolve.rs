use crate::data::Table;
use crate::encoding::{Channel, Encoding};
use crate::error::Result;
use crate::ir::ResolvedEncoding;
use crate::parser::evaluate;
use tracing::debug;

/// Materialize computed channels as columns and reduce every channel to a column name.
///
/// Runs once, before any grouping. Column references are not checked here;
/// they fail where they are first used.
pub fn resolve_encoding(encoding: &Encoding, data: &Table) -> Result<(Table, ResolvedEncoding)> {
    let mut table = data.clone();

    // 1. Evaluate computed channels against the source data
    for channel in encoding.all_channels() {
        if let Channel::Computed { source, expr } = channel {
            if table.has_column(source) && !data.has_column(source) {
                // Already materialized by another channel with the same source
                continue;
            }
            let column = evaluate(expr, data, source)?;
            debug!(expr = %source, "materialized computed channel");
            table = table.with_column(column)?;
        }
    }

    // 2. Reduce channels to names
    let name = |c: &Channel| c.name().to_string();
    let names = |cs: &Vec<Channel>| cs.iter().map(name).collect::<Vec<_>>();

    let resolved = ResolvedEncoding {
        x: encoding.x.as_ref().map(name),
        y: encoding.y.as_ref().map(name),
        color: encoding.color.as_ref().map(names),
        size: encoding.size.as_ref().map(names),
        shape: encoding.shape.as_ref().map(names),
    };
    Ok((table, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Value};

    fn make_data() -> Table {
        Table::new(vec![
            Column::new("x", [1, 2, 3]),
            Column::new("y", [2.0, 4.0, 6.0]),
            Column::new("g", ["a", "b", "a"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_simple() {
        let enc = Encoding::new().x("x").y("y").color("g");
        let (table, resolved) = resolve_encoding(&enc, &make_data()).unwrap();
        assert_eq!(table, make_data());
        assert_eq!(resolved.x, Some("x".to_string()));
        assert_eq!(resolved.y, Some("y".to_string()));
        assert_eq!(resolved.color, Some(vec!["g".to_string()]));
        assert_eq!(resolved.size, None);
    }

    #[test]
    fn test_resolve_computed() {
        let enc = Encoding::new().x("x").y(Channel::expr("y / x").unwrap());
        let (table, resolved) = resolve_encoding(&enc, &make_data()).unwrap();
        assert_eq!(resolved.y, Some("y / x".to_string()));
        assert_eq!(
            table.column("y / x").unwrap().values,
            vec![Value::float(2.0), Value::float(2.0), Value::float(2.0)]
        );
    }

    #[test]
    fn test_resolve_computed_aesthetic_shared() {
        let ch = Channel::expr("x * 2").unwrap();
        let enc = Encoding::new()
            .color_channels(vec![ch.clone()])
            .size_channels(vec![ch]);
        let (table, resolved) = resolve_encoding(&enc, &make_data()).unwrap();
        assert_eq!(table.width(), 4);
        assert_eq!(resolved.color, resolved.size);
    }

    #[test]
    fn test_resolve_computed_unknown_column() {
        let enc = Encoding::new().y(Channel::expr("nope + 1").unwrap());
        assert!(resolve_encoding(&enc, &make_data()).is_err());
    }

    #[test]
    fn test_resolve_leaves_unknown_references_for_later() {
        let enc = Encoding::new().x("missing");
        let (_, resolved) = resolve_encoding(&enc, &make_data()).unwrap();
        assert_eq!(resolved.x, Some("missing".to_string()));
    }
}
