// Expression parser and row-wise evaluator for computed channels

use super::ast::{BinaryOp, Expr};
use super::lexer::{identifier, number_literal, string_literal, ws};
use crate::data::{Column, DataType, Table, Value};
use crate::error::{PlotError, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, one_of},
    combinator::{all_consuming, map},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

/// Parse a complete expression.
/// Grammar: sum := product (('+' | '-') product)*
///          product := unary (('*' | '/') unary)*
///          unary := '-' unary | atom
///          atom := '(' sum ')' | col("name") | identifier | number
pub fn parse_expression(input: &str) -> Result<Expr> {
    match all_consuming(ws(sum))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(e) => Err(PlotError::Parse(format!("invalid expression '{}': {}", input, e))),
    }
}

fn sum(input: &str) -> IResult<&str, Expr> {
    let (input, first) = product(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), product))(input)?;
    Ok((input, fold(first, rest)))
}

fn product(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), unary))(input)?;
    Ok((input, fold(first, rest)))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |e| Expr::Neg(Box::new(e))),
        atom,
    ))(input)
}

fn atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        delimited(char('('), ws(sum), char(')')),
        map(
            delimited(ws(tag("col(")), ws(string_literal), char(')')),
            Expr::Column,
        ),
        // Identifiers first so names like `inf_rate` are not read as numbers
        map(identifier, Expr::Column),
        map(number_literal, Expr::Number),
    )))(input)
}

fn fold(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        let op = match op {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Sub,
            '*' => BinaryOp::Mul,
            _ => BinaryOp::Div,
        };
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    })
}

/// Evaluate `expr` for every row of `table`, producing a float column `name`.
/// Null cells propagate; non-numeric cells are an error.
pub fn evaluate(expr: &Expr, table: &Table, name: &str) -> Result<Column> {
    let mut values = Vec::with_capacity(table.height());
    for row in 0..table.height() {
        let v = eval_row(expr, table, row, name)?;
        values.push(v.map_or(Value::Null, Value::float));
    }
    Ok(Column {
        name: name.to_string(),
        dtype: DataType::Float,
        values,
    })
}

fn eval_row(expr: &Expr, table: &Table, row: usize, source: &str) -> Result<Option<f64>> {
    Ok(match expr {
        Expr::Number(n) => Some(*n),
        Expr::Column(col) => {
            let value = &table.column(col)?.values[row];
            match value {
                Value::Null => None,
                v => Some(v.as_f64().ok_or_else(|| PlotError::Expression {
                    expr: source.to_string(),
                    reason: format!("column '{}' has non-numeric value '{}'", col, v),
                })?),
            }
        }
        Expr::Neg(inner) => eval_row(inner, table, row, source)?.map(|v| -v),
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_row(lhs, table, row, source)?;
            let r = eval_row(rhs, table, row, source)?;
            match (l, r) {
                (Some(l), Some(r)) => Some(op.apply(l, r)),
                _ => None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Box<Expr> {
        Box::new(Expr::Column(name.to_string()))
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(parse_expression("height").unwrap(), Expr::Column("height".to_string()));
    }

    #[test]
    fn test_parse_quoted_column() {
        assert_eq!(
            parse_expression(r#"col("body mass (g)")"#).unwrap(),
            Expr::Column("body mass (g)".to_string())
        );
    }

    #[test]
    fn test_parse_precedence() {
        let e = parse_expression("a + b * 2").unwrap();
        assert_eq!(
            e,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: col("a"),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: col("b"),
                    rhs: Box::new(Expr::Number(2.0)),
                }),
            }
        );
        assert_eq!(e.to_string(), "(a + (b * 2))");
    }

    #[test]
    fn test_parse_left_associative() {
        let e = parse_expression("a - b - c").unwrap();
        assert_eq!(e.to_string(), "((a - b) - c)");
    }

    #[test]
    fn test_parse_parens_and_unary() {
        let e = parse_expression(" -(a + 1) / 2 ").unwrap();
        assert_eq!(e.to_string(), "(-(a + 1) / 2)");
        assert_eq!(e.columns(), vec!["a"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_expression("a +").is_err());
        assert!(parse_expression("(a").is_err());
        assert!(parse_expression("").is_err());
        assert!(parse_expression("a b").is_err());
    }

    #[test]
    fn test_evaluate() {
        let t = Table::new(vec![
            Column::new("w", [Some(10.0), Some(20.0), None]),
            Column::new("h", [2, 4, 5]),
        ])
        .unwrap();
        let e = parse_expression("w / h + 1").unwrap();
        let out = evaluate(&e, &t, "ratio").unwrap();
        assert_eq!(out.name, "ratio");
        assert_eq!(out.values, vec![Value::float(6.0), Value::float(6.0), Value::Null]);
    }

    #[test]
    fn test_evaluate_non_numeric() {
        let t = Table::new(vec![Column::new("s", ["a"])]).unwrap();
        let e = parse_expression("s * 2").unwrap();
        assert!(matches!(evaluate(&e, &t, "x"), Err(PlotError::Expression { .. })));
    }

    #[test]
    fn test_evaluate_unknown_column() {
        let t = Table::new(vec![Column::new("s", [1])]).unwrap();
        let e = parse_expression("z + 1").unwrap();
        assert!(matches!(evaluate(&e, &t, "x"), Err(PlotError::UnknownColumn(_))));
    }
}
