//! Lexical helpers for header values
//!
//! A header value is consumed left to right through an advancing `&str`
//! cursor: each helper strips leading whitespace, takes one token, and
//! leaves the cursor on whatever follows it.

use nom::bytes::complete::take_till1;

use crate::query::error::{QueryError, QueryResult};

/// Take the next whitespace-separated token, advancing the cursor past it.
///
/// The whitespace *after* the token is left in place; callers that need the
/// raw remainder (e.g. filter right-hand sides) strip it themselves.
pub fn next_string<'a>(line: &mut &'a str) -> QueryResult<&'a str> {
    *line = line.trim_start();
    let (rest, token) = take_till1::<_, _, nom::error::Error<&str>>(char::is_whitespace)(*line)
        .map_err(|_| QueryError::MissingArgument)?;
    *line = rest;
    Ok(token)
}

/// Take the next token and parse it as a non-negative integer.
///
/// The token must parse in full; a minus sign, trailing garbage, or a value
/// outside `i32` all fail the same way.
pub fn next_non_negative_int(line: &mut &str) -> QueryResult<i32> {
    let token = next_string(line)?;
    token
        .parse::<i32>()
        .ok()
        .filter(|value| *value >= 0)
        .ok_or(QueryError::ExpectedNonNegativeInteger)
}

/// Fail if anything is left on the line.
pub fn expect_no_arguments(line: &str) -> QueryResult<()> {
    if line.is_empty() {
        Ok(())
    } else {
        Err(QueryError::SuperfluousArguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_string_advances() {
        let mut line = "  name   =   web";
        assert_eq!(next_string(&mut line).unwrap(), "name");
        assert_eq!(line, "   =   web");
        assert_eq!(next_string(&mut line).unwrap(), "=");
        assert_eq!(line, "   web");
        assert_eq!(next_string(&mut line).unwrap(), "web");
        assert_eq!(line, "");
    }

    #[test]
    fn test_next_string_empty() {
        let mut line = "";
        assert_eq!(next_string(&mut line), Err(QueryError::MissingArgument));

        let mut line = "   \t ";
        assert_eq!(next_string(&mut line), Err(QueryError::MissingArgument));
    }

    #[test]
    fn test_next_non_negative_int() {
        let mut line = "42 rest";
        assert_eq!(next_non_negative_int(&mut line).unwrap(), 42);
        assert_eq!(line, " rest");

        let mut line = "0";
        assert_eq!(next_non_negative_int(&mut line).unwrap(), 0);
    }

    #[test]
    fn test_next_non_negative_int_rejects() {
        for bad in ["-1", "12x", "x12", "4.5", "99999999999999999999"] {
            let mut line = bad;
            assert_eq!(
                next_non_negative_int(&mut line),
                Err(QueryError::ExpectedNonNegativeInteger),
                "{bad} should not parse"
            );
        }

        let mut line = "";
        assert_eq!(
            next_non_negative_int(&mut line),
            Err(QueryError::MissingArgument)
        );
    }

    #[test]
    fn test_expect_no_arguments() {
        assert_eq!(expect_no_arguments(""), Ok(()));
        assert_eq!(
            expect_no_arguments("x"),
            Err(QueryError::SuperfluousArguments)
        );
        assert_eq!(
            expect_no_arguments("  "),
            Err(QueryError::SuperfluousArguments)
        );
    }
}
