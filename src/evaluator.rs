//! Evaluation and function application.
//!
//! [`eval`] reduces a value: symbols are looked up, S-expressions have every
//! child evaluated and the first one applied to the rest, and everything else
//! evaluates to itself. [`apply`] runs a builtin or binds arguments to a
//! closure's formals, returning a partially applied closure while formals
//! remain.
//!
//! # Scoping is dynamic
//!
//! A closure does not remember where it was created. When its last formal is
//! bound, its frame is pushed on top of whatever frame is current at the call
//! site, so free symbols in the body resolve through the *caller's* bindings:
//!
//! ```text
//! caballa> def {getx} (\ {_} {x})
//! caballa> def {callwith} (\ {x} {getx 0})
//! caballa> callwith 5
//! 5
//! ```

mod environment;

pub use environment::{Environment, Frame};

use crate::EvalError;
use crate::ast::{Closure, Function, VARIADIC_MARKER, Value};
use crate::builtinops::Builtin;
use std::iter;

/// Remaining stack below which evaluation switches to a fresh segment
const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each segment allocated by [`stacker::maybe_grow`]
const STACK_SEGMENT: usize = 1024 * 1024;

/// Evaluate a value in `env`. Failures come back as `Error` values.
pub fn eval(env: &mut Environment, value: Value) -> Value {
    match value {
        Value::Symbol(name) => env.lookup(&name).unwrap_or_else(Value::from),
        Value::SExpr(cells) => eval_sexpr(env, cells),
        other => other,
    }
}

fn eval_sexpr(env: &mut Environment, cells: Vec<Value>) -> Value {
    if let Err(err) = env.enter() {
        tracing::debug!(%err, "evaluation depth guard tripped");
        return err.into();
    }
    let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || eval_cells(env, cells));
    env.leave();
    result
}

fn eval_cells(env: &mut Environment, cells: Vec<Value>) -> Value {
    tracing::trace!(len = cells.len(), "evaluating S-expression");
    let mut cells: Vec<Value> = cells.into_iter().map(|cell| eval(env, cell)).collect();

    // The first error wins; the other children are dropped with the list
    if let Some(index) = cells.iter().position(Value::is_error) {
        return cells.swap_remove(index);
    }

    if cells.len() <= 1 {
        return cells.pop().unwrap_or_else(Value::unit);
    }

    let mut cells = cells.into_iter();
    match cells.next() {
        Some(Value::Function(function)) => apply(env, function, cells.collect()),
        Some(other) => EvalError::NotAFunction { got: other.kind() }.into(),
        None => Value::unit(),
    }
}

/// Apply `function` to already evaluated arguments
pub fn apply(env: &mut Environment, function: Function, args: Vec<Value>) -> Value {
    let result = match function {
        Function::Builtin(builtin) => {
            tracing::trace!(builtin = builtin.name(), args = args.len(), "applying builtin");
            builtin.call(env, args)
        }
        Function::Closure(closure) => {
            tracing::trace!(formals = closure.formals.len(), args = args.len(), "applying closure");
            apply_closure(env, closure, args)
        }
    };
    result.unwrap_or_else(Value::from)
}

/// Bind `args` to the closure's formals in order.
///
/// `& rest` gathers every remaining argument into a Q-expression and must be
/// the last two formals. Once all formals are bound the body runs in the
/// closure's frame; otherwise the partially applied closure is returned.
fn apply_closure(
    env: &mut Environment,
    mut closure: Closure,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    let given = args.len();
    let total = closure.formals.len();
    let mut formals = std::mem::take(&mut closure.formals).into_iter();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let Some(formal) = formals.next() else {
            return Err(EvalError::TooManyArguments {
                got: given,
                expected: total,
            });
        };

        if formal == VARIADIC_MARKER {
            let (Some(rest), None) = (formals.next(), formals.next()) else {
                return Err(EvalError::VariadicFormat);
            };
            let gathered = iter::once(arg).chain(args.by_ref()).collect();
            closure.env.bind(&rest, Value::QExpr(gathered));
            break;
        }

        closure.env.bind(&formal, arg);
    }

    let mut remaining: Vec<String> = formals.collect();

    // A variadic tail with nothing left to gather binds the empty list
    if remaining.first().is_some_and(|formal| formal == VARIADIC_MARKER) {
        let [_, rest] = <[String; 2]>::try_from(remaining).map_err(|_| EvalError::VariadicFormat)?;
        closure.env.bind(&rest, Value::QExpr(Vec::new()));
        remaining = Vec::new();
    }

    if !remaining.is_empty() {
        tracing::debug!(bound = closure.env.len(), remaining = remaining.len(), "partial application");
        closure.formals = remaining;
        return Ok(closure.into());
    }

    env.push_frame(closure.env);
    let result = eval(env, Value::SExpr(closure.body));
    env.pop_frame();
    tracing::debug!(result = %result, "closure returned");
    Ok(result)
}

/// Create an environment whose global frame binds every builtin by name
pub fn create_global_env() -> Environment {
    let mut env = Environment::new();
    for builtin in Builtin::ALL {
        env.bind_global(builtin.name(), builtin.into());
    }
    env
}
