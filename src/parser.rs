//! Reader for program text.
//!
//! The grammar, informally:
//!
//! ```text
//! number  : -?[0-9]+
//! symbol  : [a-zA-Z0-9_+\-*/%\\=<>!&]+
//! sexpr   : '(' expr* ')'
//! qexpr   : '{' expr* '}'
//! expr    : number | symbol | sexpr | qexpr
//! program : expr*
//! ```
//!
//! Parsing produces a [`Syntax`] tree tagged by production. Literal text is kept
//! as borrowed slices of the input; numbers are converted by the
//! tree-constructor ([`crate::ast::Value::read`]), which is where out-of-range
//! literals turn into error values.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{cut, map, opt, recognize, value},
    error::ErrorKind,
    multi::many0,
    sequence::{pair, preceded, terminated},
};

use crate::ast::is_symbol_char;
use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// One node of the parse tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syntax<'a> {
    Number(&'a str),
    Symbol(&'a str),
    SExpr(Vec<Syntax<'a>>),
    QExpr(Vec<Syntax<'a>>),
}

impl Syntax<'_> {
    /// Name of the grammar production that produced this node
    pub fn tag(&self) -> &'static str {
        match self {
            Syntax::Number(_) => "number",
            Syntax::Symbol(_) => "symbol",
            Syntax::SExpr(_) => "sexpr",
            Syntax::QExpr(_) => "qexpr",
        }
    }
}

/// Reader settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Treat `;` up to the end of the line as a comment
    pub handle_comments: bool,
    /// Deepest list nesting accepted before failing with `TooDeeplyNested`
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            handle_comments: true,
            max_depth: MAX_PARSE_DEPTH,
        }
    }
}

/// Convert nom parsing errors to structured parse errors
fn to_parse_error(
    input: &str,
    error: nom::Err<nom::error::Error<&str>>,
    config: ParseConfig,
) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            let found = e.input.chars().next().map(String::from);
            match (e.code, found) {
                (ErrorKind::TooLarge, _) => ParseError::with_context(
                    ParseErrorKind::TooDeeplyNested,
                    format!(
                        "Expression too deeply nested (max depth: {})",
                        config.max_depth
                    ),
                    input,
                    position,
                ),
                (_, None) => ParseError::with_context(
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input",
                    input,
                    position,
                ),
                (_, Some(found)) => ParseError::with_context_and_found(
                    ParseErrorKind::InvalidSyntax,
                    format!("Unexpected token at position {position}"),
                    input,
                    position,
                    Some(found),
                ),
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "Incomplete input")
        }
    }
}

/// Parse a line comment, without the line break
fn parse_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), take_while(|c: char| c != '\n' && c != '\r'))).parse(input)
}

/// Skip whitespace, and comments when enabled
fn skip(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    if config.handle_comments {
        value((), many0(alt((multispace1, parse_comment)))).parse(input)
    } else {
        value((), multispace0).parse(input)
    }
}

/// Parse a number: optional minus sign, then digits
fn parse_number(input: &str) -> IResult<&str, Syntax<'_>> {
    map(recognize(pair(opt(char('-')), digit1)), Syntax::Number).parse(input)
}

/// Parse a symbol (identifier or operator)
fn parse_symbol(input: &str) -> IResult<&str, Syntax<'_>> {
    map(take_while1(is_symbol_char), Syntax::Symbol).parse(input)
}

/// Parse a delimited list. Once the opening delimiter is seen, failing to find
/// the closing one is a hard failure rather than a backtrack.
fn parse_list(
    input: &str,
    config: ParseConfig,
    depth: usize,
    open: char,
    close: char,
) -> IResult<&str, Vec<Syntax<'_>>> {
    let (input, _) = char(open).parse(input)?;
    let (input, children) = many0(|input| parse_expr(input, config, depth + 1)).parse(input)?;
    let (input, _) = cut(preceded(|input| skip(input, config), char(close))).parse(input)?;
    Ok((input, children))
}

/// Parse one expression, after any leading whitespace
fn parse_expr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Syntax<'_>> {
    if depth >= config.max_depth {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        |input| skip(input, config),
        alt((
            parse_number,
            parse_symbol,
            map(
                |input| parse_list(input, config, depth, '(', ')'),
                Syntax::SExpr,
            ),
            map(
                |input| parse_list(input, config, depth, '{', '}'),
                Syntax::QExpr,
            ),
        )),
    )
    .parse(input)
}

/// Parse a complete program: zero or more top-level expressions.
pub fn parse_program(input: &str) -> Result<Vec<Syntax<'_>>, ParseError> {
    parse_program_with_config(input, ParseConfig::default())
}

/// [`parse_program`] with explicit settings
pub fn parse_program_with_config(
    input: &str,
    config: ParseConfig,
) -> Result<Vec<Syntax<'_>>, ParseError> {
    match terminated(
        many0(|input| parse_expr(input, config, 0)),
        |input| skip(input, config),
    )
    .parse(input)
    {
        Ok(("", nodes)) => Ok(nodes),
        Ok((remaining, _)) => {
            let position = input.len() - remaining.len();
            Err(ParseError::with_context_and_found(
                ParseErrorKind::InvalidSyntax,
                format!("Unexpected token at position {position}"),
                input,
                position,
                remaining.chars().next().map(String::from),
            ))
        }
        Err(e) => Err(to_parse_error(input, e, config)),
    }
}
