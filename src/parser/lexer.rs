// Token-level parsers shared by the expression grammar

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize, value},
    multi::many0_count,
    number::complete::double,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it tolerates surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier: a letter or `_` followed by letters, digits or `_`
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, nom::bytes::complete::tag("_"))),
            many0_count(alt((alphanumeric1, nom::bytes::complete::tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Parse a double-quoted string with `\"` and `\\` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        map(nom::bytes::complete::tag("\"\""), |_| String::new()),
        delimited(
            char('"'),
            escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", char('\\')), value("\"", char('"')))),
            ),
            char('"'),
        ),
    ))(input)
}

/// Parse a floating point literal
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("bill_length_mm rest"), Ok((" rest", "bill_length_mm".to_string())));
        assert_eq!(identifier("_x1"), Ok(("", "_x1".to_string())));
        assert!(identifier("1abc").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""body mass (g)""#), Ok(("", "body mass (g)".to_string())));
        assert_eq!(string_literal(r#""a \"b\"""#), Ok(("", "a \"b\"".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal("2.5"), Ok(("", 2.5)));
        assert_eq!(number_literal("10"), Ok(("", 10.0)));
    }

    #[test]
    fn test_ws() {
        let mut p = ws(identifier);
        assert_eq!(p("  abc  "), Ok(("", "abc".to_string())));
    }
}
