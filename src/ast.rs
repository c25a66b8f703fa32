//! This module defines the value tree manipulated by every other part of the
//! interpreter. The main enum, [`Value`], covers numbers, error values, symbols,
//! evaluated S-expressions, quoted Q-expressions and functions. Every container
//! owns its children outright: there is no sharing between values, so cloning a
//! `Value` is a deep copy and dropping one releases the whole subtree.
//!
//! Ergonomic helper functions such as [`val`], [`sym`], [`qexpr`] and [`sexpr`]
//! are provided for building trees in code and tests. The tree-constructor
//! [`Value::read`] turns a parsed [`Syntax`] tree into values.

use crate::builtinops::Builtin;
use crate::evaluator::Frame;
use crate::parser::Syntax;
use crate::{EvalError, MAX_ERROR_LEN};
use std::fmt;

/// Type alias for number values in interpreter
pub type NumberType = i64;

/// Allowed non-alphanumeric characters in symbol names
pub const SYMBOL_SPECIAL_CHARS: &str = "_+-*/%\\=<>!&";

/// Formal parameter that captures all remaining arguments
pub const VARIADIC_MARKER: &str = "&";

/// Check if a character may appear in a symbol
pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// The variant of a [`Value`], used in type error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Number,
    Error,
    Symbol,
    SExpr,
    QExpr,
    Function,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Number => "Number",
            Kind::Error => "Error",
            Kind::Symbol => "Symbol",
            Kind::SExpr => "S-Expression",
            Kind::QExpr => "Q-Expression",
            Kind::Function => "Function",
        };
        f.write_str(name)
    }
}

/// Core value type in interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numbers (integers only)
    Number(NumberType),
    /// Error values carrying a diagnostic; see [`Value::error`]
    Error(String),
    /// Symbols (identifiers, looked up on evaluation)
    Symbol(String),
    /// Evaluated lists: children are reduced, then the first is applied
    SExpr(Vec<Value>),
    /// Quoted lists, never evaluated automatically
    QExpr(Vec<Value>),
    /// Builtins and closures
    Function(Function),
}

/// A callable value
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// Native operation, identified by its catalogue entry
    Builtin(Builtin),
    /// User-defined function
    Closure(Closure),
}

/// User-defined function with its own binding frame.
///
/// A closure whose formals are not all bound yet is a partially applied
/// function; `formals` holds only the parameters still waiting for arguments,
/// while `env` holds the bindings already made.
#[derive(Debug, Clone)]
pub struct Closure {
    pub(crate) formals: Vec<String>,
    pub(crate) body: Vec<Value>,
    pub(crate) env: Frame,
}

impl Closure {
    /// Create a closure with an empty binding frame
    pub fn new(formals: Vec<String>, body: Vec<Value>) -> Self {
        Closure {
            formals,
            body,
            env: Frame::new(),
        }
    }

    /// Parameters not yet bound
    pub fn formals(&self) -> &[String] {
        &self.formals
    }

    /// Unevaluated body code
    pub fn body(&self) -> &[Value] {
        &self.body
    }

    /// Bindings made so far by partial application
    pub fn env(&self) -> &Frame {
        &self.env
    }
}

/// Closures compare by formals and body only; the bound frame is ignored.
/// `(\ {x} {x})` and `(\ {y} {y})` are therefore different functions.
impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        self.formals == other.formals && self.body == other.body
    }
}

// From trait implementations for Value - enables .into() conversion

/// Booleans become the language's truth values, 1 and 0
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Number(NumberType::from(b))
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

/// Rust sequences become Q-expressions, the language's literal lists
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::QExpr(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::QExpr(arr.into_iter().map(Into::into).collect())
    }
}

impl From<Builtin> for Value {
    fn from(builtin: Builtin) -> Self {
        Value::Function(Function::Builtin(builtin))
    }
}

impl From<Closure> for Value {
    fn from(closure: Closure) -> Self {
        Value::Function(Function::Closure(closure))
    }
}

impl From<EvalError> for Value {
    fn from(error: EvalError) -> Self {
        Value::error(error.to_string())
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from Rust literals
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating Q-expressions from mixed values
pub fn qexpr(cells: Vec<Value>) -> Value {
    Value::QExpr(cells)
}

/// Helper function for creating S-expressions from mixed values
pub fn sexpr(cells: Vec<Value>) -> Value {
    Value::SExpr(cells)
}

impl Value {
    /// Create an error value. Messages longer than [`MAX_ERROR_LEN`] bytes are
    /// cut at the last character boundary that fits.
    pub fn error(message: impl Into<String>) -> Value {
        let mut message = message.into();
        if message.len() > MAX_ERROR_LEN {
            let mut end = MAX_ERROR_LEN;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        Value::Error(message)
    }

    /// The empty S-expression, returned by forms that have no useful result
    pub fn unit() -> Value {
        Value::SExpr(Vec::new())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Number(_) => Kind::Number,
            Value::Error(_) => Kind::Error,
            Value::Symbol(_) => Kind::Symbol,
            Value::SExpr(_) => Kind::SExpr,
            Value::QExpr(_) => Kind::QExpr,
            Value::Function(_) => Kind::Function,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Build a value from one node of the syntax tree.
    ///
    /// Number literals that do not fit in [`NumberType`] become
    /// `Error: invalid number` rather than failing the read.
    pub fn read(node: &Syntax<'_>) -> Value {
        match node {
            Syntax::Number(text) => text
                .parse::<NumberType>()
                .map_or_else(|_| Value::error("invalid number"), Value::Number),
            Syntax::Symbol(name) => Value::Symbol((*name).to_owned()),
            Syntax::SExpr(children) => Value::SExpr(children.iter().map(Value::read).collect()),
            Syntax::QExpr(children) => Value::QExpr(children.iter().map(Value::read).collect()),
        }
    }

    /// Build the root S-expression holding every top-level expression of a program
    pub fn read_program(nodes: &[Syntax<'_>]) -> Value {
        Value::SExpr(nodes.iter().map(Value::read).collect())
    }
}

fn write_cells(f: &mut fmt::Formatter<'_>, open: char, cells: &[Value], close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{cell}")?;
    }
    write!(f, "{close}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Error(message) => write!(f, "Error: {message}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::SExpr(cells) => write_cells(f, '(', cells, ')'),
            Value::QExpr(cells) => write_cells(f, '{', cells, '}'),
            Value::Function(function) => write!(f, "{function}"),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(_) => write!(f, "<function>"),
            Function::Closure(closure) => {
                write!(f, "(\\ {{{}}} ", closure.formals.join(" "))?;
                write_cells(f, '{', &closure.body, '}')?;
                write!(f, ")")
            }
        }
    }
}
