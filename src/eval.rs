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

//! The evaluator: a trampolined `eval` that never grows the Rust stack for
//! a tail call, plus the shared `apply` entry point primitives use to
//! invoke a value as a procedure.
//!
//! Every special form and every strict primitive can also return an
//! "error value" rather than panicking or crashing the interpreter — see
//! [`StepResult`]. Errors are threaded through `?` via `Result`'s `Err`
//! arm, but the payload is always a first-class `Value::Error`, so by the
//! time a top-level driver sees an `Err(e)` there's no difference between
//! that and an `Ok(Value::Error(..))`: both just get printed.

use crate::context::Context;
use crate::environment;
use crate::primitives::{self, PrimitiveKind, PRIMITIVES};
use crate::value::Value;

/// What a special form's implementation hands back to the trampoline: a
/// finished value, or an unevaluated `(expr, env)` pair to continue
/// evaluating in tail position without growing the call stack.
pub enum Step {
    Done(Value),
    TailCall { expr: Value, env: Value },
}

pub type StepResult = Result<Step, Value>;

/// Evaluate `expr` in `env`, looping rather than recursing through tail
/// positions (closure bodies, `if`/`cond` branches, `and`/`or`'s last
/// operand, `let*`'s final body expression).
pub fn eval(ctx: &mut Context, mut expr: Value, mut env: Value) -> Result<Value, Value> {
    loop {
        match expr {
            Value::Nil
            | Value::Number(_)
            | Value::Str(_)
            | Value::Primitive(_)
            | Value::Error(_)
            | Value::Closure(_)
            | Value::Macro(_)
            | Value::Undefined => return Ok(expr),
            Value::Atom(_) => {
                let name = expr.as_atom_name(ctx).unwrap().to_owned();
                return environment::lookup(ctx, env, &name).map_err(|m| ctx.make_scratch_error(m));
            }
            Value::Cons(ptr) => {
                let (head_form, args_forms) = {
                    let cell = ctx.resolve_cons(ptr);
                    (cell.car, cell.cdr)
                };
                let head = eval(ctx, head_form, env)?;
                match head {
                    Value::Macro(mptr) => {
                        let data = *ctx.resolve_closure(mptr);
                        let bound_env = environment::bind(ctx, data.params, args_forms, data.env)
                            .map_err(|m| ctx.make_scratch_error(m))?;
                        let expansion = eval(ctx, data.body, bound_env)?;
                        log::trace!(
                            "eval: macro expanded {} -> {}",
                            crate::print::format_value(ctx, expr),
                            crate::print::format_value(ctx, expansion)
                        );
                        // The expansion is re-evaluated in the macro's own
                        // expansion env, not the caller's.
                        expr = expansion;
                        env = bound_env;
                        continue;
                    }
                    Value::Primitive(idx) => {
                        let entry = &PRIMITIVES[idx];
                        let actual = environment::list_len(ctx, args_forms) as usize;
                        primitives::check_arity(entry.name, entry.arity, actual)
                            .map_err(|m| ctx.make_scratch_error(m))?;
                        let step = match entry.kind {
                            PrimitiveKind::Special => (entry.func)(ctx, args_forms, env)?,
                            PrimitiveKind::Strict => {
                                let evaluated = eval_list(ctx, args_forms, env)?;
                                let args = environment::vec_to_list(ctx, &evaluated);
                                (entry.func)(ctx, args, env)?
                            }
                        };
                        match step {
                            Step::Done(v) => return Ok(v),
                            Step::TailCall { expr: e, env: ev } => {
                                expr = e;
                                env = ev;
                                continue;
                            }
                        }
                    }
                    Value::Closure(cptr) => {
                        let data = *ctx.resolve_closure(cptr);
                        let evaluated = eval_list(ctx, args_forms, env)?;
                        check_closure_arity(ctx, data.params, evaluated.len())
                            .map_err(|m| ctx.make_scratch_error(m))?;
                        let args = environment::vec_to_list(ctx, &evaluated);
                        let new_env = environment::bind(ctx, data.params, args, data.env)
                            .map_err(|m| ctx.make_scratch_error(m))?;
                        expr = data.body;
                        env = new_env;
                        continue;
                    }
                    other => {
                        return Err(ctx.make_scratch_error(format!(
                            "cannot apply a non-function value: {}",
                            other.type_name()
                        )))
                    }
                }
            }
        }
    }
}

/// Evaluate each element of the proper list `forms` in order, left to
/// right, short-circuiting on the first error.
fn eval_list(ctx: &mut Context, forms: Value, env: Value) -> Result<Vec<Value>, Value> {
    let forms = environment::list_to_vec(ctx, forms);
    let mut out = Vec::with_capacity(forms.len());
    for form in forms {
        out.push(eval(ctx, form, env)?);
    }
    Ok(out)
}

/// Count a closure's formal parameters and check `actual` against them:
/// an exact match unless the parameter list ends in a bare atom (the
/// dotted rest-parameter convention), which only requires at least the
/// fixed prefix to be supplied.
fn check_closure_arity(ctx: &Context, params: Value, actual: usize) -> Result<(), String> {
    let mut fixed = 0usize;
    let mut rest = params;
    loop {
        match rest {
            Value::Nil => {
                return if actual == fixed {
                    Ok(())
                } else {
                    Err(format!(
                        "closure expects exactly {} argument(s), but got {}",
                        fixed, actual
                    ))
                }
            }
            Value::Cons(ptr) => {
                fixed += 1;
                rest = ctx.resolve_cons(ptr).cdr;
            }
            Value::Atom(_) => {
                return if actual >= fixed {
                    Ok(())
                } else {
                    Err(format!(
                        "closure expects at least {} argument(s), but got {}",
                        fixed, actual
                    ))
                }
            }
            _ => return Err("malformed parameter list".to_string()),
        }
    }
}

/// Apply an already-evaluated `func` to already-evaluated `args`. Used by
/// the primitives that take a procedure as data (`apply`, `mapcar`,
/// `filter`, `reduce`) rather than by ordinary call-site evaluation (see
/// `eval`'s `Value::Closure` arm above), which inlines the tail call
/// instead of recursing through here.
pub fn apply(ctx: &mut Context, func: Value, args: Vec<Value>) -> Result<Value, Value> {
    match func {
        Value::Closure(cptr) => {
            let data = *ctx.resolve_closure(cptr);
            check_closure_arity(ctx, data.params, args.len())
                .map_err(|m| ctx.make_scratch_error(m))?;
            let args_list = environment::vec_to_list(ctx, &args);
            let new_env = environment::bind(ctx, data.params, args_list, data.env)
                .map_err(|m| ctx.make_scratch_error(m))?;
            eval(ctx, data.body, new_env)
        }
        Value::Primitive(idx) => {
            let entry = &PRIMITIVES[idx];
            primitives::check_arity(entry.name, entry.arity, args.len())
                .map_err(|m| ctx.make_scratch_error(m))?;
            let args_list = environment::vec_to_list(ctx, &args);
            let env = ctx.global_env;
            match (entry.func)(ctx, args_list, env)? {
                Step::Done(v) => Ok(v),
                Step::TailCall { expr, env } => eval(ctx, expr, env),
            }
        }
        other => Err(ctx.make_scratch_error(format!(
            "cannot apply a non-function value: {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::read_one;

    fn eval_str(ctx: &mut Context, src: &str) -> Value {
        let expr = read_one(ctx, src).unwrap().unwrap();
        eval(ctx, expr, ctx.global_env).unwrap()
    }

    fn fresh_ctx() -> Context {
        crate::bootstrap::new_context()
    }

    #[test]
    fn self_evaluating_forms() {
        let mut ctx = fresh_ctx();
        assert_eq!(eval_str(&mut ctx, "42").as_number(), Some(42.0));
    }

    #[test]
    fn arithmetic() {
        let mut ctx = fresh_ctx();
        assert_eq!(eval_str(&mut ctx, "(+ 1 2 3)").as_number(), Some(6.0));
    }

    #[test]
    fn if_picks_a_branch() {
        let mut ctx = fresh_ctx();
        assert_eq!(eval_str(&mut ctx, "(if (< 1 2) 10 20)").as_number(), Some(10.0));
        assert_eq!(eval_str(&mut ctx, "(if (< 2 1) 10 20)").as_number(), Some(20.0));
    }

    #[test]
    fn define_then_call() {
        let mut ctx = fresh_ctx();
        eval_str(&mut ctx, "(define square (lambda (x) (* x x)))");
        assert_eq!(eval_str(&mut ctx, "(square 5)").as_number(), Some(25.0));
    }

    #[test]
    fn deep_tail_recursion_does_not_overflow() {
        let mut ctx = fresh_ctx();
        eval_str(
            &mut ctx,
            "(define count (lambda (n acc) (if (eq? n 0) acc (count (- n 1) (+ acc 1)))))",
        );
        assert_eq!(
            eval_str(&mut ctx, "(count 100000 0)").as_number(),
            Some(100000.0)
        );
    }

    #[test]
    fn quote_returns_unevaluated_structure() {
        let mut ctx = fresh_ctx();
        let v = eval_str(&mut ctx, "(quote (+ 1 2))");
        assert!(v.is_cons());
    }

    /// A closure defined before one of its free variables is itself
    /// `define`d must still see that variable once it exists: the global
    /// environment's identity never moves, so later bindings are visible
    /// through a pointer captured earlier.
    #[test]
    fn forward_references_between_top_level_definitions_resolve() {
        let mut ctx = fresh_ctx();
        eval_str(&mut ctx, "(define f (lambda (x) (+ x y)))");
        eval_str(&mut ctx, "(define y 100)");
        assert_eq!(eval_str(&mut ctx, "(f 1)").as_number(), Some(101.0));
    }
}
