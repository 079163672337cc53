//! Textual S-expression reader: raw text into the generic [`Sexp`]
//! structure consumed by the parser.
//!
//! The reader is deliberately token-level: it distinguishes atoms,
//! string literals, and lists, and expands the `'x` quote shorthand to
//! `(quote x)`. Classifying atoms as numbers, booleans, primitive
//! operators, or identifiers is the parser's job, so tokens like `#t`,
//! `42`, and `.` all come out as plain atoms here.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, multispace1},
    error::ErrorKind,
    multi::separated_list0,
    sequence::{preceded, terminated},
};

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::sexp::Sexp;

/// Convert nom reading errors to user-friendly messages
fn read_error_to_message(input: &str, error: nom::Err<nom::error::Error<&str>>) -> String {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::Char => format!("expected character at position {position}"),
                ErrorKind::TooLarge => {
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})")
                }
                _ => {
                    if position < input.len() {
                        let remaining: String = input.chars().skip(position).take(10).collect();
                        format!("invalid syntax near '{remaining}'")
                    } else {
                        "unexpected end of input".to_owned()
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => "incomplete input".to_owned(),
    }
}

/// Atom characters: everything except whitespace and the four
/// structural characters.
fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && !"()'\"".contains(c)
}

/// Read a bare atom token
fn read_atom(input: &str) -> IResult<&str, Sexp> {
    take_while1(is_atom_char)
        .map(Sexp::atom)
        .parse(input)
}

/// Read a string literal with escape sequences
fn read_string(input: &str) -> IResult<&str, Sexp> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = Vec::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                return Ok((char_iter.as_str(), Sexp::Str(chars.into_iter().collect())));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    // Unknown or incomplete escape sequence
                    _ => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            nom::error::ErrorKind::Char,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            // End of input without a closing quote
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

/// Read a parenthesized list
fn read_list(input: &str, depth: usize) -> IResult<&str, Sexp> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;

    let (input, elements) =
        separated_list0(multispace1, |input| read_sexp(input, depth + 1)).parse(input)?;

    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char(')').parse(input)?;

    Ok((input, Sexp::List(elements)))
}

/// Read a quoted expression: 'expr reads as (quote expr)
fn read_quoted(input: &str, depth: usize) -> IResult<&str, Sexp> {
    let (input, _) = char('\'').parse(input)?;
    let (input, inner) = read_sexp(input, depth + 1)?;
    Ok((input, Sexp::list([Sexp::atom("quote"), inner])))
}

fn read_sexp(input: &str, depth: usize) -> IResult<&str, Sexp> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        )));
    }
    preceded(
        multispace0,
        alt((
            |input| read_quoted(input, depth),
            |input| read_list(input, depth),
            read_string,
            read_atom,
        )),
    )
    .parse(input)
}

/// Read one complete S-expression from input.
pub fn read(input: &str) -> Result<Sexp, Error> {
    match terminated(|input| read_sexp(input, 0), multispace0).parse(input) {
        Ok(("", sexp)) => Ok(sexp),
        Ok((remaining, _)) => Err(Error::ParseError(format!(
            "unexpected remaining input: '{remaining}'"
        ))),
        Err(e) => Err(Error::ParseError(read_error_to_message(input, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expected outcome of one reader test
    enum ReadExpect {
        Success(Sexp),
        SpecificError(&'static str),
        Error,
    }
    use ReadExpect::*;

    fn run_read_tests(cases: Vec<(&str, ReadExpect)>) {
        for (i, (input, expected)) in cases.iter().enumerate() {
            let test_id = format!("read test #{}", i + 1);
            let result = read(input);
            match (result, expected) {
                (Ok(actual), Success(want)) => {
                    assert_eq!(actual, *want, "{test_id}: mismatch for '{input}'");
                }
                (Err(_), Error) => {}
                (Err(err), SpecificError(text)) => {
                    let msg = err.to_string();
                    assert!(
                        msg.contains(text),
                        "{test_id}: error for '{input}' should contain '{text}', got: {msg}"
                    );
                }
                (Ok(actual), Error | SpecificError(_)) => {
                    panic!("{test_id}: expected an error for '{input}', got {actual:?}")
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: unexpected error for '{input}': {err}")
                }
            }
        }
    }

    #[test]
    fn test_read_atoms() {
        run_read_tests(vec![
            ("foo", Success(Sexp::atom("foo"))),
            ("foo?", Success(Sexp::atom("foo?"))),
            ("#t", Success(Sexp::atom("#t"))),
            ("42", Success(Sexp::atom("42"))),
            ("-5.5", Success(Sexp::atom("-5.5"))),
            ("+", Success(Sexp::atom("+"))),
            (".", Success(Sexp::atom("."))),
            ("string=?", Success(Sexp::atom("string=?"))),
            // Whitespace around a token is fine
            ("  42  ", Success(Sexp::atom("42"))),
            ("\t#t\n", Success(Sexp::atom("#t"))),
        ]);
    }

    #[test]
    fn test_read_strings() {
        run_read_tests(vec![
            ("\"hello\"", Success(Sexp::string("hello"))),
            ("\"hello world\"", Success(Sexp::string("hello world"))),
            ("\"\"", Success(Sexp::string(""))),
            (r#""a\nb""#, Success(Sexp::string("a\nb"))),
            (r#""tab\there""#, Success(Sexp::string("tab\there"))),
            (r#""quote\"end""#, Success(Sexp::string("quote\"end"))),
            (r#""back\\slash""#, Success(Sexp::string("back\\slash"))),
            // Unknown escape sequences fail
            (r#""bad\xescape""#, Error),
            // Unterminated strings fail
            (r#""unterminated"#, Error),
            (r#""ends with escape\"#, Error),
        ]);
    }

    #[test]
    fn test_read_lists() {
        run_read_tests(vec![
            ("()", Success(Sexp::list([]))),
            ("(   )", Success(Sexp::list([]))),
            (
                "(1 2 3)",
                Success(Sexp::list([
                    Sexp::atom("1"),
                    Sexp::atom("2"),
                    Sexp::atom("3"),
                ])),
            ),
            (
                "( a  b\t\nc )",
                Success(Sexp::list([
                    Sexp::atom("a"),
                    Sexp::atom("b"),
                    Sexp::atom("c"),
                ])),
            ),
            (
                "(f \"x\" #t)",
                Success(Sexp::list([
                    Sexp::atom("f"),
                    Sexp::string("x"),
                    Sexp::atom("#t"),
                ])),
            ),
            (
                "((1 2) (3))",
                Success(Sexp::list([
                    Sexp::list([Sexp::atom("1"), Sexp::atom("2")]),
                    Sexp::list([Sexp::atom("3")]),
                ])),
            ),
            (
                "(1 . 2)",
                Success(Sexp::list([
                    Sexp::atom("1"),
                    Sexp::atom("."),
                    Sexp::atom("2"),
                ])),
            ),
        ]);
    }

    #[test]
    fn test_read_quote_shorthand() {
        run_read_tests(vec![
            (
                "'foo",
                Success(Sexp::list([Sexp::atom("quote"), Sexp::atom("foo")])),
            ),
            (
                "'()",
                Success(Sexp::list([Sexp::atom("quote"), Sexp::list([])])),
            ),
            (
                "'(1 2)",
                Success(Sexp::list([
                    Sexp::atom("quote"),
                    Sexp::list([Sexp::atom("1"), Sexp::atom("2")]),
                ])),
            ),
            (
                "''x",
                Success(Sexp::list([
                    Sexp::atom("quote"),
                    Sexp::list([Sexp::atom("quote"), Sexp::atom("x")]),
                ])),
            ),
            (
                "(a 'b)",
                Success(Sexp::list([
                    Sexp::atom("a"),
                    Sexp::list([Sexp::atom("quote"), Sexp::atom("b")]),
                ])),
            ),
        ]);
    }

    #[test]
    fn test_read_errors() {
        run_read_tests(vec![
            ("", Error),
            ("   ", Error),
            (")", Error),
            ("(1 2", Error),
            ("((1 2)", Error),
            ("(1 2))", SpecificError("remaining input")),
            ("1 2", SpecificError("remaining input")),
            ("(+ 1 2) (+ 3 4)", SpecificError("remaining input")),
        ]);
    }

    #[test]
    fn test_read_depth_limits() {
        let under_limit = format!(
            "{}x{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let at_limit = format!(
            "{}x{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        let quotes_at_limit = format!("{}x", "'".repeat(MAX_PARSE_DEPTH));

        assert!(read(&under_limit).is_ok());
        run_read_tests(vec![
            (at_limit.as_str(), SpecificError("deeply nested")),
            (quotes_at_limit.as_str(), SpecificError("deeply nested")),
        ]);
    }
}
