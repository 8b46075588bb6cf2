// Copyright 2014 Nick Fitzgerald
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The primitives table: every special form and every strict built-in
//! procedure, looked up by name at bootstrap and dispatched by table
//! index at every call site (`Value::Primitive(idx)`).
//!
//! Two kinds share one table and one function signature:
//!
//! - [`PrimitiveKind::Special`]: the evaluator hands the implementation
//!   the call's *unevaluated* argument forms, so it can choose what (and
//!   whether) to evaluate, and in what order. `if`, `cond`, `and`, `or`,
//!   and `let*` also use this to return a [`crate::eval::Step::TailCall`]
//!   rather than recursing, keeping the evaluator's tail-call guarantee.
//! - [`PrimitiveKind::Strict`]: the evaluator evaluates every argument
//!   left-to-right first, then hands the implementation the resulting
//!   value list. The vast majority of built-ins are this kind.
//!
//! Arity is checked once, centrally, by the evaluator before dispatch
//! (see `eval::eval`'s `Value::Primitive` arm), so none of the
//! implementations below re-check it.

use crate::context::Context;
use crate::copy;
use crate::environment::{self, list_to_vec, vec_to_list};
use crate::eval::{self, Step, StepResult};
use crate::value::{are_equal, is_proper_list, Value};

/// How many arguments a primitive or special form accepts.
#[derive(Clone, Copy, Debug)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
    Unbounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Special,
    Strict,
}

pub type PrimitiveFn = fn(&mut Context, Value, Value) -> StepResult;

pub struct PrimitiveEntry {
    pub name: &'static str,
    pub arity: Arity,
    pub kind: PrimitiveKind,
    pub func: PrimitiveFn,
}

/// Check `actual` against `arity`, producing a uniform
/// `"<name> expects ..., but got <actual>"` message on mismatch.
pub fn check_arity(name: &str, arity: Arity, actual: usize) -> Result<(), String> {
    let ok = match arity {
        Arity::Exact(n) => actual == n,
        Arity::AtLeast(n) => actual >= n,
        Arity::Range(lo, hi) => actual >= lo && actual <= hi,
        Arity::Unbounded => true,
    };
    if ok {
        return Ok(());
    }
    let expected = match arity {
        Arity::Exact(n) => format!("exactly {} argument(s)", n),
        Arity::AtLeast(n) => format!("at least {} argument(s)", n),
        Arity::Range(lo, hi) => format!("between {} and {} arguments", lo, hi),
        Arity::Unbounded => unreachable!(),
    };
    Err(format!("{} expects {}, but got {}", name, expected, actual))
}

macro_rules! table {
    ($($name:literal, $arity:expr, $kind:ident, $func:path;)*) => {
        pub static PRIMITIVES: &[PrimitiveEntry] = &[
            $(PrimitiveEntry { name: $name, arity: $arity, kind: PrimitiveKind::$kind, func: $func },)*
        ];
    };
}

table! {
    // Special forms.
    "quote",     Arity::Exact(1),      Special, quote;
    "backquote", Arity::Exact(1),      Special, backquote;
    "if",        Arity::Exact(3),      Special, if_form;
    "cond",      Arity::Unbounded,     Special, cond;
    "and",       Arity::Unbounded,     Special, and_form;
    "or",        Arity::Unbounded,     Special, or_form;
    "lambda",    Arity::Exact(2),      Special, lambda;
    "macro",     Arity::Exact(2),      Special, macro_form;
    "define",    Arity::Exact(2),      Special, define;
    "set!",      Arity::Exact(2),      Special, set_bang;
    "undefine!", Arity::Exact(1),      Special, undefine_bang;
    "let*",      Arity::AtLeast(2),    Special, let_star;

    // Arithmetic.
    "+", Arity::Unbounded,  Strict, add;
    "-", Arity::AtLeast(1), Strict, subtract;
    "*", Arity::Unbounded,  Strict, multiply;
    "/", Arity::AtLeast(1), Strict, divide;
    "%", Arity::Exact(2),   Strict, modulo;

    // Comparisons.
    "<",  Arity::Exact(2), Strict, less_than;
    ">",  Arity::Exact(2), Strict, greater_than;
    "<=", Arity::Exact(2), Strict, less_or_equal;
    ">=", Arity::Exact(2), Strict, greater_or_equal;
    "=",  Arity::Exact(2), Strict, numeric_equal;
    "eq?", Arity::Exact(2), Strict, eq_predicate;

    // Predicates.
    "not",     Arity::Exact(1),  Strict, not_predicate;
    "pair?",   Arity::Exact(1),  Strict, pair_predicate;
    "list?",   Arity::Exact(1),  Strict, list_predicate;
    "number?", Arity::Unbounded, Strict, number_predicate;

    // Constructors and accessors.
    "cons"    , Arity::Exact(2), Strict, cons_prim;
    "list"    , Arity::Unbounded, Strict, list_prim;
    "car"     , Arity::Exact(1), Strict, car_prim;
    "cdr"     , Arity::Exact(1), Strict, cdr_prim;
    "reverse" , Arity::Exact(1), Strict, reverse_prim;
    "len"     , Arity::Exact(1), Strict, len_prim;

    // Higher-order.
    "mapcar" , Arity::Exact(2),      Strict, mapcar;
    "filter" , Arity::Exact(2),      Strict, filter;
    "reduce" , Arity::Range(2, 3),   Strict, reduce;

    // Meta.
    "apply" , Arity::Exact(2), Strict, apply_prim;
    "eval"  , Arity::Exact(1), Strict, eval_prim;

    // I/O.
    "display" , Arity::Unbounded,    Strict, display;
    "tap"     , Arity::Range(1, 2),  Strict, tap;
}

/// Look up a primitive's table index by name, used by bootstrap to build
/// the `name -> Value::Primitive(idx)` global bindings.
pub fn index_of(name: &str) -> Option<usize> {
    PRIMITIVES.iter().position(|e| e.name == name)
}

fn type_error(ctx: &mut Context, expected: &str, got: Value) -> Value {
    ctx.make_scratch_error(format!("expected {}, got {}", expected, got.type_name()))
}

fn numbers(ctx: &mut Context, args: Value) -> Result<Vec<f64>, Value> {
    let items = list_to_vec(ctx, args);
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item.as_number() {
            Some(n) => out.push(n),
            None => return Err(type_error(ctx, "number", item)),
        }
    }
    Ok(out)
}

// --- Special forms ---------------------------------------------------

fn quote(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let x = environment::car(ctx, args).map_err(|m| ctx.make_scratch_error(m))?;
    Ok(Step::Done(x))
}

/// `comma_operand` recognizes a reader-desugared `,expr` form: a two
/// element list whose head is the atom `comma`. Returns the wrapped
/// expression.
fn comma_operand(ctx: &Context, template: Value) -> Option<Value> {
    if let Value::Cons(ptr) = template {
        let cell = ctx.resolve_cons(ptr);
        if cell.car.as_atom_name(ctx) == Some("comma") {
            if let Value::Cons(rest_ptr) = cell.cdr {
                let rest = ctx.resolve_cons(rest_ptr);
                if matches!(rest.cdr, Value::Nil) {
                    return Some(rest.car);
                }
            }
        }
    }
    None
}

/// Walk `template`, replacing every `,expr` with the result of
/// evaluating `expr` in `env`. Subtrees with no comma anywhere inside
/// them are returned by address, unchanged: quasiquoting a list with no
/// unquotes allocates nothing new.
fn quasi_template(ctx: &mut Context, env: Value, template: Value) -> Result<Value, Value> {
    if let Some(e) = comma_operand(ctx, template) {
        return eval::eval(ctx, e, env);
    }
    match template {
        Value::Cons(ptr) => {
            let (car, cdr) = {
                let cell = ctx.resolve_cons(ptr);
                (cell.car, cell.cdr)
            };
            let new_car = quasi_template(ctx, env, car)?;
            let new_cdr = quasi_template(ctx, env, cdr)?;
            if new_car == car && new_cdr == cdr {
                Ok(template)
            } else {
                Ok(ctx.scratch_cons(new_car, new_cdr))
            }
        }
        other => Ok(other),
    }
}

fn backquote(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let template = environment::car(ctx, args).map_err(|m| ctx.make_scratch_error(m))?;
    let expanded = quasi_template(ctx, env, template)?;
    Ok(Step::Done(expanded))
}

fn if_form(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let cond = eval::eval(ctx, items[0], env)?;
    let branch = if cond.is_truthy() { items[1] } else { items[2] };
    Ok(Step::TailCall { expr: branch, env })
}

fn cond(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    for clause in list_to_vec(ctx, args) {
        let parts = list_to_vec(ctx, clause);
        if parts.len() != 2 {
            return Err(ctx.make_scratch_error("malformed cond clause"));
        }
        let test = eval::eval(ctx, parts[0], env)?;
        if test.is_truthy() {
            return Ok(Step::TailCall { expr: parts[1], env });
        }
    }
    Ok(Step::Done(Value::Nil))
}

fn and_form(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    if items.is_empty() {
        return Ok(Step::Done(ctx.make_scratch_atom("#t")));
    }
    for item in &items[..items.len() - 1] {
        let v = eval::eval(ctx, *item, env)?;
        if !v.is_truthy() {
            return Ok(Step::Done(Value::Nil));
        }
    }
    Ok(Step::TailCall {
        expr: items[items.len() - 1],
        env,
    })
}

fn or_form(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    if items.is_empty() {
        return Ok(Step::Done(Value::Nil));
    }
    for item in &items[..items.len() - 1] {
        let v = eval::eval(ctx, *item, env)?;
        if v.is_truthy() {
            return Ok(Step::Done(v));
        }
    }
    Ok(Step::TailCall {
        expr: items[items.len() - 1],
        env,
    })
}

fn lambda(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    Ok(Step::Done(
        ctx.make_scratch_closure(items[0], items[1], env, false),
    ))
}

fn macro_form(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    Ok(Step::Done(
        ctx.make_scratch_closure(items[0], items[1], env, true),
    ))
}

fn define(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let name = items[0]
        .as_atom_name(ctx)
        .map(str::to_owned)
        .ok_or_else(|| type_error(ctx, "symbol", items[0]))?;
    let existing_frame = environment::find_frame(ctx, ctx.global_env, &name);
    let value = eval::eval(ctx, items[1], env)?;
    let permanent_value = copy::copy_to(ctx, value);
    match existing_frame {
        Value::Nil => {
            let name_atom = ctx.make_permanent_atom(&name);
            environment::global_define(ctx, name_atom, permanent_value);
            Ok(Step::Done(name_atom))
        }
        Value::Cons(frame_ptr) => {
            let current = ctx.resolve_cons(frame_ptr).cdr;
            if matches!(current, Value::Undefined) {
                ctx.resolve_cons_mut(frame_ptr).cdr = permanent_value;
                let name_atom = ctx.resolve_cons(frame_ptr).car;
                Ok(Step::Done(name_atom))
            } else {
                Err(ctx.make_scratch_error(format!(
                    "redefinition of already-bound variable: {}",
                    name
                )))
            }
        }
        _ => unreachable!("find_frame only returns Nil or Cons"),
    }
}

fn set_bang(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let name = items[0]
        .as_atom_name(ctx)
        .map(str::to_owned)
        .ok_or_else(|| type_error(ctx, "symbol", items[0]))?;
    match environment::find_frame(ctx, ctx.global_env, &name) {
        Value::Nil => Err(ctx.make_scratch_error(format!("undefined variable: {}", name))),
        Value::Cons(frame_ptr) => {
            let value = eval::eval(ctx, items[1], env)?;
            let permanent_value = copy::copy_to(ctx, value);
            ctx.resolve_cons_mut(frame_ptr).cdr = permanent_value;
            let name_atom = ctx.resolve_cons(frame_ptr).car;
            Ok(Step::Done(name_atom))
        }
        _ => unreachable!("find_frame only returns Nil or Cons"),
    }
}

fn undefine_bang(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let name = items[0]
        .as_atom_name(ctx)
        .map(str::to_owned)
        .ok_or_else(|| type_error(ctx, "symbol", items[0]))?;
    match environment::find_frame(ctx, ctx.global_env, &name) {
        Value::Nil => Err(ctx.make_scratch_error(format!("undefined variable: {}", name))),
        Value::Cons(frame_ptr) => {
            ctx.resolve_cons_mut(frame_ptr).cdr = Value::Undefined;
            let name_atom = ctx.resolve_cons(frame_ptr).car;
            Ok(Step::Done(name_atom))
        }
        _ => unreachable!("find_frame only returns Nil or Cons"),
    }
}

fn is_lambda_form(ctx: &Context, expr: Value) -> bool {
    matches!(expr, Value::Cons(ptr) if ctx.resolve_cons(ptr).car.as_atom_name(ctx) == Some("lambda"))
}

fn let_star(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let bindings = environment::car(ctx, args).map_err(|m| ctx.make_scratch_error(m))?;
    let body = environment::cdr(ctx, args).map_err(|m| ctx.make_scratch_error(m))?;

    let mut cur_env = env;
    for binding in list_to_vec(ctx, bindings) {
        let parts = list_to_vec(ctx, binding);
        if parts.len() != 2 {
            return Err(ctx.make_scratch_error("malformed let* binding"));
        }
        let var = parts[0];
        if var.as_atom_name(ctx).is_none() {
            return Err(type_error(ctx, "symbol", var));
        }
        if is_lambda_form(ctx, parts[1]) {
            // Self-referential binding: extend with a placeholder first
            // so the closure's captured env already contains its own
            // name, then patch the placeholder once the closure exists.
            let placeholder_env = environment::extend(ctx, cur_env, var, Value::Undefined, false);
            let value = eval::eval(ctx, parts[1], placeholder_env)?;
            if let Value::Cons(frame_ptr) = placeholder_env {
                if let Value::Cons(binding_ptr) = ctx.resolve_cons(frame_ptr).car {
                    ctx.resolve_cons_mut(binding_ptr).cdr = value;
                }
            }
            cur_env = placeholder_env;
        } else {
            let value = eval::eval(ctx, parts[1], cur_env)?;
            cur_env = environment::extend(ctx, cur_env, var, value, false);
        }
    }

    let body_items = list_to_vec(ctx, body);
    if body_items.is_empty() {
        return Err(ctx.make_scratch_error("let* requires at least one body expression"));
    }
    for item in &body_items[..body_items.len() - 1] {
        eval::eval(ctx, *item, cur_env)?;
    }
    Ok(Step::TailCall {
        expr: body_items[body_items.len() - 1],
        env: cur_env,
    })
}

// --- Strict primitives -------------------------------------------------

fn add(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(Value::Number(ns.iter().sum())))
}

fn subtract(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    let result = if ns.len() == 1 {
        -ns[0]
    } else {
        ns[1..].iter().fold(ns[0], |acc, n| acc - n)
    };
    Ok(Step::Done(Value::Number(result)))
}

fn multiply(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(Value::Number(ns.iter().product())))
}

fn divide(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    if ns.len() == 1 {
        if ns[0] == 0.0 {
            return Err(ctx.make_scratch_error("division by zero"));
        }
        return Ok(Step::Done(Value::Number(1.0 / ns[0])));
    }
    let mut acc = ns[0];
    for n in &ns[1..] {
        if *n == 0.0 {
            return Err(ctx.make_scratch_error("division by zero"));
        }
        acc /= n;
    }
    Ok(Step::Done(Value::Number(acc)))
}

fn modulo(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    let divisor = ns[1].trunc();
    if divisor == 0.0 {
        return Err(ctx.make_scratch_error("division by zero"));
    }
    Ok(Step::Done(Value::Number(ns[0].trunc() % divisor)))
}

fn less_than(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(bool_value(ctx, ns[0] < ns[1])))
}

fn greater_than(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(bool_value(ctx, ns[0] > ns[1])))
}

fn less_or_equal(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(bool_value(ctx, ns[0] <= ns[1])))
}

fn greater_or_equal(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(bool_value(ctx, ns[0] >= ns[1])))
}

fn numeric_equal(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let ns = numbers(ctx, args)?;
    Ok(Step::Done(bool_value(ctx, ns[0] == ns[1])))
}

fn eq_predicate(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let result = are_equal(ctx, items[0], items[1]);
    Ok(Step::Done(bool_value(ctx, result)))
}

/// The canonical truthy value: a fresh `#t` atom, name-equal to (but not
/// address-equal to) the one seeded into `global_env` at bootstrap.
fn bool_value(ctx: &mut Context, b: bool) -> Value {
    if b {
        ctx.make_scratch_atom("#t")
    } else {
        Value::Nil
    }
}

fn not_predicate(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    Ok(Step::Done(bool_value(ctx, !items[0].is_truthy())))
}

fn pair_predicate(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    Ok(Step::Done(bool_value(ctx, items[0].is_cons())))
}

fn list_predicate(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let result = is_proper_list(ctx, items[0]);
    Ok(Step::Done(bool_value(ctx, result)))
}

fn number_predicate(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let all = items.iter().all(|v| v.as_number().is_some());
    Ok(Step::Done(bool_value(ctx, all)))
}

fn cons_prim(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    Ok(Step::Done(ctx.scratch_cons(items[0], items[1])))
}

fn list_prim(_ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    // `args` is already the freshly-built, evaluated-argument list.
    Ok(Step::Done(args))
}

fn car_prim(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let v = environment::car(ctx, items[0]).map_err(|m| ctx.make_scratch_error(m))?;
    Ok(Step::Done(v))
}

fn cdr_prim(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let v = environment::cdr(ctx, items[0]).map_err(|m| ctx.make_scratch_error(m))?;
    Ok(Step::Done(v))
}

fn reverse_prim(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    if !is_proper_list(ctx, items[0]) {
        return Err(type_error(ctx, "proper list", items[0]));
    }
    let mut elems = list_to_vec(ctx, items[0]);
    elems.reverse();
    Ok(Step::Done(vec_to_list(ctx, &elems)))
}

fn len_prim(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    Ok(Step::Done(Value::Number(
        environment::list_len(ctx, items[0]) as f64,
    )))
}

fn mapcar(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let (func, list) = (items[0], items[1]);
    let mut out = Vec::new();
    for elem in list_to_vec(ctx, list) {
        out.push(eval::apply(ctx, func, vec![elem])?);
    }
    Ok(Step::Done(vec_to_list(ctx, &out)))
}

fn filter(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let (func, list) = (items[0], items[1]);
    let mut out = Vec::new();
    for elem in list_to_vec(ctx, list) {
        if eval::apply(ctx, func, vec![elem])?.is_truthy() {
            out.push(elem);
        }
    }
    Ok(Step::Done(vec_to_list(ctx, &out)))
}

fn reduce(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let func = items[0];
    let (mut acc, rest) = if items.len() == 3 {
        (items[1], list_to_vec(ctx, items[2]))
    } else {
        let elems = list_to_vec(ctx, items[1]);
        if elems.is_empty() {
            return Err(ctx.make_scratch_error("reduce of an empty list with no seed"));
        }
        (elems[0], elems[1..].to_vec())
    };
    for elem in rest {
        acc = eval::apply(ctx, func, vec![acc, elem])?;
    }
    Ok(Step::Done(acc))
}

fn apply_prim(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let (func, arg_list) = (items[0], items[1]);
    if !is_proper_list(ctx, arg_list) {
        return Err(type_error(ctx, "proper list", arg_list));
    }
    let args_vec = list_to_vec(ctx, arg_list);
    let result = eval::apply(ctx, func, args_vec)?;
    Ok(Step::Done(result))
}

/// Evaluating `eval`'s own argument (performed by the generic
/// strict-primitive argument-evaluation step before this function is
/// ever called) produces a value; this function evaluates that value a
/// second time, treating it as code. `(eval '(+ 1 2))` therefore
/// evaluates `(+ 1 2)` twice: once implicitly by the strict-call
/// machinery (`'(+ 1 2)` evaluates to the list `(+ 1 2)`), once here.
fn eval_prim(ctx: &mut Context, args: Value, env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let result = eval::eval(ctx, items[0], env)?;
    Ok(Step::Done(result))
}

fn display(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    for item in list_to_vec(ctx, args) {
        print!("{}", crate::print::format_value(ctx, item));
    }
    Ok(Step::Done(Value::Nil))
}

fn tap(ctx: &mut Context, args: Value, _env: Value) -> StepResult {
    let items = list_to_vec(ctx, args);
    let (label, value) = if items.len() == 2 {
        (Some(items[0]), items[1])
    } else {
        (None, items[0])
    };
    if let Some(label) = label {
        println!(
            "{}: {}",
            crate::print::format_value(ctx, label),
            crate::print::format_value(ctx, value)
        );
    } else {
        println!("{}", crate::print::format_value(ctx, value));
    }
    Ok(Step::Done(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn call(ctx: &mut Context, name: &str, args: Vec<Value>) -> Value {
        let idx = index_of(name).unwrap();
        let entry = &PRIMITIVES[idx];
        let args_list = vec_to_list(ctx, &args);
        let env = ctx.global_env;
        match (entry.func)(ctx, args_list, env).unwrap() {
            Step::Done(v) => v,
            Step::TailCall { expr, env } => eval::eval(ctx, expr, env).unwrap(),
        }
    }

    #[test]
    fn add_sums_all_arguments() {
        let mut ctx = Context::new();
        let result = call(
            &mut ctx,
            "+",
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)],
        );
        assert_eq!(result.as_number(), Some(6.0));
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let mut ctx = Context::new();
        let idx = index_of("/").unwrap();
        let entry = &PRIMITIVES[idx];
        let args = vec_to_list(&mut ctx, &[Value::Number(1.0), Value::Number(0.0)]);
        let env = ctx.global_env;
        let result = (entry.func)(&mut ctx, args, env);
        assert!(result.is_err());
    }

    #[test]
    fn list_predicate_detects_improper_lists() {
        let mut ctx = Context::new();
        let improper = ctx.scratch_cons(Value::Number(1.0), Value::Number(2.0));
        let result = call(&mut ctx, "list?", vec![improper]);
        assert!(result.is_nil());
    }

    #[test]
    fn reduce_uses_list_head_as_seed_in_two_arg_form() {
        let mut ctx = Context::new();
        let idx = index_of("+").unwrap();
        let plus = Value::Primitive(idx);
        let list = vec_to_list(&mut ctx, &[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        let result = call(&mut ctx, "reduce", vec![plus, list]);
        assert_eq!(result.as_number(), Some(6.0));
    }

    fn run(ctx: &mut Context, src: &str) -> Value {
        let expr = crate::read::read_one(ctx, src).unwrap().unwrap();
        let env = ctx.global_env;
        eval::eval(ctx, expr, env).unwrap()
    }

    #[test]
    fn let_star_sees_earlier_bindings() {
        let mut ctx = crate::bootstrap::new_context();
        let result = run(&mut ctx, "(let* ((x 10) (y (+ x 1))) (* x y))");
        assert_eq!(result.as_number(), Some(110.0));
    }

    #[test]
    fn recursive_factorial_via_let_star_self_reference() {
        let mut ctx = crate::bootstrap::new_context();
        let result = run(
            &mut ctx,
            "(let* ((fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))) (fact 5))",
        );
        assert_eq!(result.as_number(), Some(120.0));
    }

    #[test]
    fn backquote_splices_in_evaluated_comma_expressions() {
        let mut ctx = crate::bootstrap::new_context();
        let result = run(&mut ctx, "`(1 ,(+ 2 3) 4)");
        let items = list_to_vec(&ctx, result);
        let nums: Vec<f64> = items.iter().map(|v| v.as_number().unwrap()).collect();
        assert_eq!(nums, vec![1.0, 5.0, 4.0]);
    }

    #[test]
    fn macro_expansion_is_reevaluated_as_code() {
        let mut ctx = crate::bootstrap::new_context();
        run(&mut ctx, "(define m (macro (a b) `(+ ,a ,b)))");
        assert_eq!(run(&mut ctx, "(m 1 2)").as_number(), Some(3.0));
    }

    #[test]
    fn car_of_non_pair_is_an_error_value() {
        let mut ctx = crate::bootstrap::new_context();
        let expr = crate::read::read_one(&mut ctx, "(car '())").unwrap().unwrap();
        let env = ctx.global_env;
        let result = eval::eval(&mut ctx, expr, env).unwrap_err();
        assert!(result.is_error());
    }

    #[test]
    fn undefine_then_lookup_is_an_error() {
        let mut ctx = crate::bootstrap::new_context();
        run(&mut ctx, "(define x 1)");
        run(&mut ctx, "(undefine! x)");
        let expr = crate::read::read_one(&mut ctx, "x").unwrap().unwrap();
        let env = ctx.global_env;
        assert!(eval::eval(&mut ctx, expr, env).is_err());
    }
}
