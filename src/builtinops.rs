//! The fixed catalogue of native operations.
//!
//! Every builtin receives its arguments already evaluated, as an owned `Vec`.
//! Arity is checked against [`Builtin::arity`] before the implementation runs,
//! and argument types are checked strictly: there is no coercion between
//! numbers and lists.
//!
//! ```text
//! list 1 2 3           ; {1 2 3}
//! head {1 2 3}         ; {1}
//! join {1} {2 3}       ; {1 2 3}
//! eval {+ 1 2}         ; 3
//! def {x y} 1 2        ; binds globally
//! \ {x y} {+ x y}      ; a closure
//! if (> x 0) {x} {0}   ; evaluates one branch
//! ```
//!
//! ## Adding New Operations
//!
//! 1. Add a variant to [`Builtin`] and list it in [`Builtin::ALL`]
//! 2. Give it a name and an [`Arity`]
//! 3. Dispatch to its implementation in `Builtin::call`
//! 4. Add test cases covering edge cases and error conditions

use crate::EvalError;
use crate::ast::{Closure, Kind, NumberType, Value};
use crate::evaluator::{self, Environment};
use std::fmt;
use std::io::{self, Write};
use std::vec;

/// Expected number of arguments for a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments
    Exact(usize),
    /// At least n arguments
    AtLeast(usize),
    /// Between min and max arguments (inclusive)
    Range(usize, usize),
    /// Any number of arguments, including none
    Any,
}

impl Arity {
    /// Check an argument count, naming `func` in the error
    pub fn validate(self, func: &'static str, count: usize) -> Result<(), EvalError> {
        let accepted = match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::Any => true,
        };
        if accepted {
            Ok(())
        } else {
            Err(EvalError::WrongArity {
                func,
                got: count,
                expected: self,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any"),
        }
    }
}

/// A native operation. Builtins compare equal exactly when they are the same
/// catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    List,
    Head,
    Tail,
    Join,
    Eval,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// `def`: bind in the global frame
    Def,
    /// `=`: bind in the current frame
    Put,
    /// `\`: construct a closure
    Lambda,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Not,
    And,
    Or,
    If,
    Exit,
    GetEnv,
}

impl Builtin {
    /// Every builtin, in the order they are bound in a new global environment
    pub const ALL: [Builtin; 24] = [
        Builtin::List,
        Builtin::Head,
        Builtin::Tail,
        Builtin::Join,
        Builtin::Eval,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Rem,
        Builtin::Def,
        Builtin::Put,
        Builtin::Lambda,
        Builtin::Lt,
        Builtin::Le,
        Builtin::Gt,
        Builtin::Ge,
        Builtin::Eq,
        Builtin::Not,
        Builtin::And,
        Builtin::Or,
        Builtin::If,
        Builtin::Exit,
        Builtin::GetEnv,
    ];

    /// The symbol this builtin is bound to
    pub fn name(self) -> &'static str {
        match self {
            Builtin::List => "list",
            Builtin::Head => "head",
            Builtin::Tail => "tail",
            Builtin::Join => "join",
            Builtin::Eval => "eval",
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Rem => "%",
            Builtin::Def => "def",
            Builtin::Put => "=",
            Builtin::Lambda => "\\",
            Builtin::Lt => "<",
            Builtin::Le => "<=",
            Builtin::Gt => ">",
            Builtin::Ge => ">=",
            Builtin::Eq => "eq",
            Builtin::Not => "not",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::If => "if",
            Builtin::Exit => "exit",
            Builtin::GetEnv => "getenv",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::List | Builtin::Join => Arity::Any,
            Builtin::Head | Builtin::Tail | Builtin::Eval | Builtin::Not => Arity::Exact(1),
            Builtin::Add
            | Builtin::Sub
            | Builtin::Mul
            | Builtin::Div
            | Builtin::Rem
            | Builtin::And
            | Builtin::Or => Arity::AtLeast(1),
            Builtin::Def | Builtin::Put => Arity::AtLeast(2),
            Builtin::Lambda
            | Builtin::Lt
            | Builtin::Le
            | Builtin::Gt
            | Builtin::Ge
            | Builtin::Eq => Arity::Exact(2),
            Builtin::If => Arity::Range(2, 3),
            Builtin::Exit | Builtin::GetEnv => Arity::Range(0, 1),
        }
    }

    /// Run the builtin on evaluated arguments
    pub(crate) fn call(self, env: &mut Environment, args: Vec<Value>) -> Result<Value, EvalError> {
        let func = self.name();
        self.arity().validate(func, args.len())?;

        match self {
            Builtin::List => Ok(Value::QExpr(args)),
            Builtin::Head => builtin_head(self, args),
            Builtin::Tail => builtin_tail(self, args),
            Builtin::Join => builtin_join(args),
            Builtin::Eval => {
                let [code] = fixed(self, args)?;
                let cells = expect_qexpr(func, 0, code)?;
                Ok(evaluator::eval(env, Value::SExpr(cells)))
            }
            Builtin::Add => numeric_fold(self, args, builtin_add),
            Builtin::Sub => numeric_fold(self, args, builtin_sub),
            Builtin::Mul => numeric_fold(self, args, builtin_mul),
            Builtin::Div => numeric_fold(self, args, builtin_div),
            Builtin::Rem => numeric_fold(self, args, builtin_rem),
            Builtin::Def => define(env, self, args, Scope::Global),
            Builtin::Put => define(env, self, args, Scope::Local),
            Builtin::Lambda => builtin_lambda(self, args),
            Builtin::Lt => builtin_lt(self, args),
            Builtin::Le => builtin_le(self, args),
            Builtin::Gt => builtin_gt(self, args),
            Builtin::Ge => builtin_ge(self, args),
            Builtin::Eq => {
                let [lhs, rhs] = fixed(self, args)?;
                Ok(Value::from(lhs == rhs))
            }
            Builtin::Not => {
                let [n] = fixed(self, args)?;
                Ok(Value::from(number(func, 0, n)? == 0))
            }
            Builtin::And => numbers(func, args).map(|nums| Value::Number(builtin_and(&nums))),
            Builtin::Or => numbers(func, args).map(|nums| Value::Number(builtin_or(&nums))),
            Builtin::If => builtin_if(env, self, args),
            Builtin::Exit => builtin_exit(args),
            Builtin::GetEnv => {
                builtin_getenv(env);
                Ok(Value::unit())
            }
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//
// Argument helpers
//

type Numbers = vec::IntoIter<NumberType>;

fn type_mismatch(func: &'static str, index: usize, got: &Value, expected: Kind) -> EvalError {
    EvalError::TypeMismatch {
        func,
        index,
        got: got.kind(),
        expected,
    }
}

/// Arguments of a fixed-arity builtin as an array
fn fixed<const N: usize>(builtin: Builtin, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    <[Value; N]>::try_from(args).map_err(|args| EvalError::WrongArity {
        func: builtin.name(),
        got: args.len(),
        expected: builtin.arity(),
    })
}

/// First argument and the rest, for builtins that need at least one
fn split_first(builtin: Builtin, args: Vec<Value>) -> Result<(Value, vec::IntoIter<Value>), EvalError> {
    let mut args = args.into_iter();
    match args.next() {
        Some(first) => Ok((first, args)),
        None => Err(EvalError::WrongArity {
            func: builtin.name(),
            got: 0,
            expected: builtin.arity(),
        }),
    }
}

fn number(func: &'static str, index: usize, value: Value) -> Result<NumberType, EvalError> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(type_mismatch(func, index, &other, Kind::Number)),
    }
}

fn numbers(func: &'static str, args: Vec<Value>) -> Result<Vec<NumberType>, EvalError> {
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| number(func, index, arg))
        .collect()
}

fn expect_qexpr(func: &'static str, index: usize, value: Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::QExpr(cells) => Ok(cells),
        other => Err(type_mismatch(func, index, &other, Kind::QExpr)),
    }
}

/// Names from a Q-expression that must hold only symbols
fn symbol_names(func: &'static str, cells: Vec<Value>) -> Result<Vec<String>, EvalError> {
    cells
        .into_iter()
        .map(|cell| match cell {
            Value::Symbol(name) => Ok(name),
            other => Err(EvalError::NonSymbol {
                func,
                got: other.kind(),
            }),
        })
        .collect()
}

/// A non-empty Q-expression argument, for `head` and `tail`
fn non_empty_list(builtin: Builtin, args: Vec<Value>) -> Result<Vec<Value>, EvalError> {
    let func = builtin.name();
    let [list] = fixed(builtin, args)?;
    let cells = expect_qexpr(func, 0, list)?;
    if cells.is_empty() {
        return Err(EvalError::EmptyList { func });
    }
    Ok(cells)
}

//
// Builtin Function Implementations
//

fn builtin_head(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut cells = non_empty_list(builtin, args)?;
    cells.truncate(1);
    Ok(Value::QExpr(cells))
}

fn builtin_tail(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut cells = non_empty_list(builtin, args)?;
    cells.remove(0);
    Ok(Value::QExpr(cells))
}

fn builtin_join(args: Vec<Value>) -> Result<Value, EvalError> {
    let mut joined = Vec::new();
    for (index, arg) in args.into_iter().enumerate() {
        joined.extend(expect_qexpr(Builtin::Join.name(), index, arg)?);
    }
    Ok(Value::QExpr(joined))
}

fn numeric_fold(
    builtin: Builtin,
    args: Vec<Value>,
    op: fn(NumberType, Numbers) -> Result<NumberType, EvalError>,
) -> Result<Value, EvalError> {
    let mut nums = numbers(builtin.name(), args)?.into_iter();
    let Some(first) = nums.next() else {
        return Err(EvalError::WrongArity {
            func: builtin.name(),
            got: 0,
            expected: builtin.arity(),
        });
    };
    op(first, nums).map(Value::Number)
}

fn builtin_add(first: NumberType, mut rest: Numbers) -> Result<NumberType, EvalError> {
    rest.try_fold(first, |sum, n| {
        sum.checked_add(n).ok_or(EvalError::Overflow {
            operation: "addition",
        })
    })
}

fn builtin_sub(first: NumberType, rest: Numbers) -> Result<NumberType, EvalError> {
    let mut rest = rest.peekable();

    if rest.peek().is_none() {
        return first.checked_neg().ok_or(EvalError::Overflow {
            operation: "negation",
        });
    }

    rest.try_fold(first, |result, n| {
        result.checked_sub(n).ok_or(EvalError::Overflow {
            operation: "subtraction",
        })
    })
}

fn builtin_mul(first: NumberType, mut rest: Numbers) -> Result<NumberType, EvalError> {
    rest.try_fold(first, |product, n| {
        product.checked_mul(n).ok_or(EvalError::Overflow {
            operation: "multiplication",
        })
    })
}

// Truncates toward zero
fn builtin_div(first: NumberType, mut rest: Numbers) -> Result<NumberType, EvalError> {
    rest.try_fold(first, |quotient, n| {
        if n == 0 {
            return Err(EvalError::DivisionByZero);
        }
        quotient.checked_div(n).ok_or(EvalError::Overflow {
            operation: "division",
        })
    })
}

fn builtin_rem(first: NumberType, mut rest: Numbers) -> Result<NumberType, EvalError> {
    rest.try_fold(first, |remainder, n| {
        if n == 0 {
            return Err(EvalError::DivisionByZero);
        }
        remainder.checked_rem(n).ok_or(EvalError::Overflow {
            operation: "remainder",
        })
    })
}

// Macro to generate numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
            let func = builtin.name();
            let [lhs, rhs] = fixed(builtin, args)?;
            let (lhs, rhs) = (number(func, 0, lhs)?, number(func, 1, rhs)?);
            Ok(Value::from(lhs $op rhs))
        }
    };
}

numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_ge, >=);

/// First zero, otherwise the last value
fn builtin_and(nums: &[NumberType]) -> NumberType {
    nums.iter()
        .copied()
        .find(|&n| n == 0)
        .or_else(|| nums.last().copied())
        .unwrap_or(1)
}

/// First nonzero, otherwise zero
fn builtin_or(nums: &[NumberType]) -> NumberType {
    nums.iter().copied().find(|&n| n != 0).unwrap_or(0)
}

/// Which frame `def` and `=` write to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Local,
}

fn define(
    env: &mut Environment,
    builtin: Builtin,
    args: Vec<Value>,
    scope: Scope,
) -> Result<Value, EvalError> {
    let func = builtin.name();
    let (symbols, values) = split_first(builtin, args)?;
    let names = symbol_names(func, expect_qexpr(func, 0, symbols)?)?;
    let values: Vec<Value> = values.collect();

    if names.len() != values.len() {
        return Err(EvalError::SymbolCountMismatch {
            func,
            symbols: names.len(),
            values: values.len(),
        });
    }

    for (name, value) in names.iter().zip(values) {
        tracing::debug!(%name, ?scope, "binding");
        match scope {
            Scope::Global => env.bind_global(name, value),
            Scope::Local => env.bind_local(name, value),
        }
    }
    Ok(Value::unit())
}

fn builtin_lambda(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let func = builtin.name();
    let [formals, body] = fixed(builtin, args)?;
    let formals = expect_qexpr(func, 0, formals)?;
    let body = expect_qexpr(func, 1, body)?;
    let formals = symbol_names(func, formals)?;
    Ok(Closure::new(formals, body).into())
}

/// Evaluate the then-branch on a nonzero condition, otherwise the else-branch
/// when one is given
fn builtin_if(env: &mut Environment, builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let func = builtin.name();
    let (condition, branches) = split_first(builtin, args)?;
    let condition = number(func, 0, condition)?;
    let mut branches = branches
        .enumerate()
        .map(|(index, branch)| expect_qexpr(func, index + 1, branch))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    let then_branch = branches.next();
    let else_branch = branches.next();
    let chosen = if condition != 0 { then_branch } else { else_branch };

    Ok(chosen.map_or_else(Value::unit, |cells| {
        evaluator::eval(env, Value::SExpr(cells))
    }))
}

fn builtin_exit(args: Vec<Value>) -> Result<Value, EvalError> {
    let status = match args.into_iter().next() {
        Some(status) => number(Builtin::Exit.name(), 0, status)?,
        None => 0,
    };
    let code = i32::try_from(status.clamp(NumberType::from(i32::MIN), NumberType::from(i32::MAX)))
        .unwrap_or_default();

    tracing::info!(code, "exit requested");
    // Output printed before exit must not be lost with the process
    let _ = io::stdout().flush();
    std::process::exit(code)
}

/// Print every binding of the current frame
fn builtin_getenv(env: &Environment) {
    for (name, value) in env.current_frame().bindings() {
        println!("{name} = {value}");
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{qexpr, sexpr, sym, val};
    use crate::evaluator::create_global_env;
    use std::collections::HashSet;

    /// Micro-helper for success cases
    fn success<T: Into<Value>>(value: T) -> Result<Value, EvalError> {
        Ok(val(value))
    }

    /// Invoke a builtin against a fresh global environment
    fn call_builtin(builtin: Builtin, args: &[Value]) -> Result<Value, EvalError> {
        let mut env = create_global_env();
        builtin.call(&mut env, args.to_vec())
    }

    /// Macro to create test cases, invoking builtins directly
    macro_rules! test {
        ($builtin:expr, $args:expr, $expected:expr) => {
            ($builtin, call_builtin($builtin, $args), $expected)
        };
    }

    fn mismatch(func: &'static str, index: usize, got: Kind, expected: Kind) -> Result<Value, EvalError> {
        Err(EvalError::TypeMismatch {
            func,
            index,
            got,
            expected,
        })
    }

    #[test]
    fn test_builtin_registry() {
        let names: HashSet<&str> = Builtin::ALL.iter().map(|b| b.name()).collect();
        assert_eq!(names.len(), Builtin::ALL.len(), "builtin names must be unique");

        assert_eq!(Builtin::Lambda.name(), "\\");
        assert_eq!(Builtin::Put.name(), "=");
        assert_eq!(Builtin::Eq.name(), "eq");
        assert_eq!(Builtin::Not.arity(), Arity::Exact(1));
        assert_eq!(Builtin::If.arity(), Arity::Range(2, 3));
        assert_eq!(Builtin::Join.arity(), Arity::Any);
        assert_eq!(Builtin::GetEnv.arity(), Arity::Range(0, 1));
        assert_eq!(format!("{}", Builtin::GetEnv), "getenv");
    }

    #[test]
    fn test_arity_validation() {
        let test_cases = vec![
            (Arity::Exact(2), 2, true),
            (Arity::Exact(2), 1, false),
            (Arity::Exact(0), 0, true),
            (Arity::AtLeast(1), 1, true),
            (Arity::AtLeast(1), 10, true),
            (Arity::AtLeast(1), 0, false),
            (Arity::Range(2, 3), 2, true),
            (Arity::Range(2, 3), 3, true),
            (Arity::Range(2, 3), 4, false),
            (Arity::Any, 0, true),
            (Arity::Any, 100, true),
        ];

        for (i, (arity, count, accepted)) in test_cases.into_iter().enumerate() {
            assert_eq!(
                arity.validate("f", count).is_ok(),
                accepted,
                "Arity case {} failed: {arity:?} with {count}",
                i + 1
            );
        }

        assert_eq!(format!("{}", Arity::Exact(1)), "1");
        assert_eq!(format!("{}", Arity::AtLeast(2)), "at least 2");
        assert_eq!(format!("{}", Arity::Range(0, 1)), "0 to 1");
        assert_eq!(
            Arity::Exact(1).validate("head", 2).unwrap_err().to_string(),
            "Function 'head' passed incorrect number of arguments. Got 2, Expected 1."
        );
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_builtin_function_implementations() {
        type TestCase = (Builtin, Result<Value, EvalError>, Result<Value, EvalError>);
        use Builtin::*;

        let many_ones: Vec<Value> = (0..100).map(|_| val(1)).collect();
        let nested = val([val([val([1])])]);

        let test_cases: Vec<TestCase> = vec![
            // =================================================================
            // ARITHMETIC
            // =================================================================
            test!(Add, &[val(1), val(2), val(3)], success(6)),
            test!(Add, &[val(-4)], success(-4)),
            test!(Add, &many_ones, success(100)),
            test!(Add, &[val(NumberType::MAX), val(1)], Err(EvalError::Overflow { operation: "addition" })),
            test!(Add, &[], Err(EvalError::WrongArity { func: "+", got: 0, expected: Arity::AtLeast(1) })),
            test!(Add, &[val(1), val([2])], mismatch("+", 1, Kind::QExpr, Kind::Number)),
            test!(Sub, &[val(10), val(1), val(2)], success(7)),
            test!(Sub, &[val(3)], success(-3)),
            test!(Sub, &[val(NumberType::MIN)], Err(EvalError::Overflow { operation: "negation" })),
            test!(Sub, &[val(NumberType::MIN), val(1)], Err(EvalError::Overflow { operation: "subtraction" })),
            test!(Mul, &[val(2), val(-3), val(4)], success(-24)),
            test!(Mul, &[val(7)], success(7)),
            test!(Mul, &[val(NumberType::MAX), val(2)], Err(EvalError::Overflow { operation: "multiplication" })),
            test!(Div, &[val(20), val(2), val(5)], success(2)),
            test!(Div, &[val(7), val(-2)], success(-3)),
            test!(Div, &[val(9)], success(9)),
            test!(Div, &[val(1), val(0)], Err(EvalError::DivisionByZero)),
            test!(Div, &[val(NumberType::MIN), val(-1)], Err(EvalError::Overflow { operation: "division" })),
            test!(Rem, &[val(17), val(5)], success(2)),
            test!(Rem, &[val(17), val(5), val(2)], success(0)),
            test!(Rem, &[val(1), val(0)], Err(EvalError::DivisionByZero)),
            test!(Rem, &[sym("x"), val(2)], mismatch("%", 0, Kind::Symbol, Kind::Number)),
            // =================================================================
            // LIST OPERATIONS
            // =================================================================
            test!(List, &[], success(Vec::<Value>::new())),
            test!(List, &[val(1), sym("a"), val([2])], Ok(qexpr(vec![val(1), sym("a"), val([2])]))),
            test!(Head, &[val([1, 2, 3])], success([1])),
            test!(Head, std::slice::from_ref(&nested), Ok(nested.clone())),
            test!(Head, &[qexpr(vec![])], Err(EvalError::EmptyList { func: "head" })),
            test!(Head, &[val(1)], mismatch("head", 0, Kind::Number, Kind::QExpr)),
            test!(Head, &[val([1]), val([2])], Err(EvalError::WrongArity { func: "head", got: 2, expected: Arity::Exact(1) })),
            test!(Tail, &[val([1, 2, 3])], success([2, 3])),
            test!(Tail, &[val([1])], Ok(qexpr(vec![]))),
            test!(Tail, &[qexpr(vec![])], Err(EvalError::EmptyList { func: "tail" })),
            test!(Tail, &[Value::unit()], mismatch("tail", 0, Kind::SExpr, Kind::QExpr)),
            test!(Join, &[], Ok(qexpr(vec![]))),
            test!(Join, &[val([1]), qexpr(vec![]), val([2, 3])], success([1, 2, 3])),
            test!(Join, &[val([1]), val(2)], mismatch("join", 1, Kind::Number, Kind::QExpr)),
            // =================================================================
            // EVALUATION
            // =================================================================
            test!(Eval, &[qexpr(vec![sym("+"), val(1), val(2)])], success(3)),
            test!(Eval, &[qexpr(vec![val(5)])], success(5)),
            test!(Eval, &[qexpr(vec![])], Ok(Value::unit())),
            test!(Eval, &[val(1)], mismatch("eval", 0, Kind::Number, Kind::QExpr)),
            // Errors surface as values from the evaluated code
            test!(Eval, &[qexpr(vec![sym("/"), val(1), val(0)])], Ok(Value::error("Division by zero!"))),
            // =================================================================
            // COMPARISON AND LOGIC
            // =================================================================
            test!(Lt, &[val(1), val(2)], success(1)),
            test!(Lt, &[val(2), val(2)], success(0)),
            test!(Le, &[val(2), val(2)], success(1)),
            test!(Gt, &[val(-1), val(-2)], success(1)),
            test!(Ge, &[val(1), val(2)], success(0)),
            test!(Gt, &[val(1), val([2])], mismatch(">", 1, Kind::QExpr, Kind::Number)),
            test!(Ge, &[val(1)], Err(EvalError::WrongArity { func: ">=", got: 1, expected: Arity::Exact(2) })),
            test!(Eq, &[val(1), val(1)], success(1)),
            test!(Eq, &[val([1, 2]), val([1, 2])], success(1)),
            test!(Eq, &[val([1, 2]), sexpr(vec![val(1), val(2)])], success(0)),
            test!(Eq, &[sym("a"), sym("a")], success(1)),
            test!(Eq, &[Value::error("x"), Value::error("x")], success(1)),
            test!(Eq, &[val(Builtin::Add), val(Builtin::Sub)], success(0)),
            test!(Not, &[val(0)], success(1)),
            test!(Not, &[val(-3)], success(0)),
            test!(Not, &[val([0])], mismatch("not", 0, Kind::QExpr, Kind::Number)),
            test!(And, &[val(1), val(2)], success(2)),
            test!(And, &[val(3), val(0), val(4)], success(0)),
            test!(And, &[val(5)], success(5)),
            test!(Or, &[val(0), val(0)], success(0)),
            test!(Or, &[val(0), val(-2), val(3)], success(-2)),
            test!(Or, &[val(0), sym("x")], mismatch("or", 1, Kind::Symbol, Kind::Number)),
            // =================================================================
            // CONTROL AND DEFINITION
            // =================================================================
            test!(If, &[val(1), val([1]), val([2])], success(1)),
            test!(If, &[val(0), val([1]), val([2])], success(2)),
            test!(If, &[val(0), val([1])], Ok(Value::unit())),
            test!(If, &[val(1), val([1]), val(2)], mismatch("if", 2, Kind::Number, Kind::QExpr)),
            test!(If, &[val([1]), val([1])], mismatch("if", 0, Kind::QExpr, Kind::Number)),
            test!(Def, &[val(Vec::<Value>::new()), val(1)], Err(EvalError::SymbolCountMismatch { func: "def", symbols: 0, values: 1 })),
            test!(Def, &[qexpr(vec![sym("a"), sym("b")]), val(1), val(2)], Ok(Value::unit())),
            test!(Def, &[qexpr(vec![val(1)]), val(1)], Err(EvalError::NonSymbol { func: "def", got: Kind::Number })),
            test!(Put, &[sym("a"), val(1)], mismatch("=", 0, Kind::Symbol, Kind::QExpr)),
            test!(Lambda, &[qexpr(vec![sym("x")]), qexpr(vec![sym("x")])], Ok(Closure::new(vec!["x".into()], vec![sym("x")]).into())),
            test!(Lambda, &[qexpr(vec![val(1)]), qexpr(vec![])], Err(EvalError::NonSymbol { func: "\\", got: Kind::Number })),
            test!(Lambda, &[qexpr(vec![]), val(1)], mismatch("\\", 1, Kind::Number, Kind::QExpr)),
            test!(Exit, &[val([1])], mismatch("exit", 0, Kind::QExpr, Kind::Number)),
            test!(Exit, &[val(1), val(2)], Err(EvalError::WrongArity { func: "exit", got: 2, expected: Arity::Range(0, 1) })),
            test!(GetEnv, &[], Ok(Value::unit())),
            test!(GetEnv, &[val(0)], Ok(Value::unit())),
            test!(GetEnv, &[val(1), val(2)], Err(EvalError::WrongArity { func: "getenv", got: 2, expected: Arity::Range(0, 1) })),
        ];

        for (i, (builtin, actual, expected)) in test_cases.into_iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} ({builtin}) failed", i + 1);
        }
    }

    #[test]
    fn test_def_and_put_scopes() {
        let mut env = create_global_env();
        env.push_frame(crate::evaluator::Frame::new());

        Builtin::Def
            .call(&mut env, vec![qexpr(vec![sym("g")]), val(1)])
            .unwrap();
        Builtin::Put
            .call(&mut env, vec![qexpr(vec![sym("l")]), val(2)])
            .unwrap();

        assert_eq!(env.global_frame().get("g"), Some(&val(1)));
        assert_eq!(env.global_frame().get("l"), None);
        assert_eq!(env.current_frame().get("l"), Some(&val(2)));

        env.pop_frame();
        assert_eq!(env.lookup("g").unwrap(), val(1));
        assert!(env.lookup("l").is_err());
    }

    #[test]
    fn test_list_takes_arguments_without_copying_structure() {
        let args = vec![Value::unit(), qexpr(vec![sym("x")])];
        assert_eq!(call_builtin(Builtin::List, &args).unwrap(), qexpr(args));
    }
}
