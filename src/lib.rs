//! Caballa - a small Q-expression Lisp
//!
//! This crate reads symbolic-expression programs, builds an owned value tree from
//! them and evaluates it against a chain of environment frames. The language has
//! integers, symbols, evaluated S-expressions, quoted Q-expressions, builtin
//! functions and closures with partial application and variadic binding.
//!
//! ```text
//! caballa> + 1 2 3
//! 6
//! caballa> def {add} (\ {x y} {+ x y})
//! ()
//! caballa> def {inc} (add 1)
//! ()
//! caballa> inc 41
//! 42
//! caballa> (\ {x & xs} {xs}) 1 2 3
//! {2 3}
//! ```
//!
//! ## Errors are values
//!
//! Evaluation never fails out of band. A failing operation produces an `Error`
//! value, which short-circuits the S-expression containing it and travels upward
//! like any other result. Only reading can fail with a Rust error
//! ([`ParseError`]), since malformed input never becomes a value tree.
//!
//! ## Modules
//!
//! - `parser`: reads program text into a tagged [`parser::Syntax`] tree
//! - `ast`: the [`ast::Value`] model, rendering, equality, and the tree-constructor
//! - `evaluator`: environment frames, evaluation and function application
//! - `builtinops`: the fixed catalogue of native operations

use crate::ast::{Kind, Value};
use crate::builtinops::Arity;
use crate::evaluator::Environment;
use crate::parser::ParseConfig;

/// Maximum parsing depth to prevent stack overflow attacks
/// This limits deeply nested lists in the reader
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum evaluation depth, counted in nested S-expression evaluations.
/// Set well above parse depth so that recursive closures have room to work.
pub const MAX_EVAL_DEPTH: usize = 10_000;

/// Longest message an `Error` value will carry, in bytes
pub const MAX_ERROR_LEN: usize = 511;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, mismatched delimiters)
    InvalidSyntax,
    /// Input ended before a list was closed
    Incomplete,
    /// List nesting exceeded the configured parse depth
    TooDeeplyNested,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("ParseError: {message}{}", render_details(.found, .context))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    /// Create a ParseError with all fields
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        Self::with_context_and_found(kind, message, input, error_offset, None)
    }

    /// Create a ParseError with context and found token
    pub fn with_context_and_found(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Show some input before the error, counted in chars
        let error_char = input
            .char_indices()
            .take_while(|(offset, _)| *offset < error_offset)
            .count();
        let context_start = error_char.saturating_sub(20);

        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        // Replace newlines with visible markers for better error display
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

fn render_details(found: &Option<String>, context: &Option<String>) -> String {
    let mut details = String::new();
    if let Some(found) = found {
        details.push_str(&format!("\nFound: {found}"));
    }
    if let Some(context) = context {
        details.push_str(&format!("\nContext: {context}"));
    }
    details
}

/// Everything that can go wrong while evaluating.
///
/// These never escape evaluation as `Err`: the apply step turns each one into
/// an `Error` value (see `impl From<EvalError> for Value`), and the `Display`
/// text becomes that value's message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unbound symbol: '{0}'")]
    UnboundSymbol(String),

    #[error(
        "Function '{func}' passed incorrect type for argument {index}. Got {got}, Expected {expected}."
    )]
    TypeMismatch {
        func: &'static str,
        index: usize,
        got: Kind,
        expected: Kind,
    },

    #[error("Function '{func}' passed incorrect number of arguments. Got {got}, Expected {expected}.")]
    WrongArity {
        func: &'static str,
        got: usize,
        expected: Arity,
    },

    /// A closure received more arguments than it has formals
    #[error("Function passed too many arguments. Got {got}, Expected {expected}.")]
    TooManyArguments { got: usize, expected: usize },

    #[error("Function format invalid. Symbol '&' not followed by single symbol.")]
    VariadicFormat,

    #[error("Division by zero!")]
    DivisionByZero,

    #[error("Function '{func}' passed {{}} for argument 0.")]
    EmptyList { func: &'static str },

    #[error("S-Expression starts with incorrect type. Got {got}, Expected Function.")]
    NotAFunction { got: Kind },

    #[error("Function '{func}' cannot define non-symbol. Got {got}, Expected Symbol.")]
    NonSymbol { func: &'static str, got: Kind },

    #[error(
        "Function '{func}' passed incorrect number of values for symbols. Got {values}, Expected {symbols}."
    )]
    SymbolCountMismatch {
        func: &'static str,
        symbols: usize,
        values: usize,
    },

    #[error("Integer overflow in {operation}")]
    Overflow { operation: &'static str },

    #[error("Evaluation depth limit exceeded (max: {max})")]
    DepthExceeded { max: usize },
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;

/// Read a whole program and evaluate it in `env`.
///
/// All top-level expressions are wrapped in a single S-expression, so
/// `+ 1 2` and `(+ 1 2)` mean the same thing.
pub fn read_eval(input: &str, env: &mut Environment) -> Result<Value, ParseError> {
    read_eval_with_config(input, env, ParseConfig::default())
}

/// [`read_eval`] with explicit reader settings
pub fn read_eval_with_config(
    input: &str,
    env: &mut Environment,
    config: ParseConfig,
) -> Result<Value, ParseError> {
    let program = parser::parse_program_with_config(input, config)?;
    Ok(evaluator::eval(env, Value::read_program(&program)))
}
