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

//! Environment and list utilities.
//!
//! An environment is nothing more than an ordinary Scheme list of frames,
//! each frame a `Cons(variable_atom, bound_value)`. There is no dedicated
//! "environment" heap type: shadowing is prepending a frame, and the
//! global environment is just the shared tail every extension bottoms out
//! at. This file also carries the small list utilities (`car`, `cdr`,
//! `list_len`) that the evaluator and primitives lean on, since they are
//! one short structural walk away from the frame-lookup code right below
//! them.

use crate::context::Context;
use crate::value::Value;

/// Walk `env` looking for a frame bound to `name`. Returns the bound
/// value, or an `Err` with a human-readable message (not yet wrapped in a
/// `Value::Error`, since callers differ in which arena they want the
/// error allocated into) when the variable is unbound or has been
/// `undefine!`d.
pub fn lookup(ctx: &Context, env: Value, name: &str) -> Result<Value, String> {
    let mut frame = env;
    loop {
        match frame {
            Value::Nil => return Err(format!("undefined variable: {}", name)),
            Value::Cons(ptr) => {
                let cell = ctx.resolve_cons(ptr);
                let (binding_name, binding_value) = match cell.car {
                    Value::Cons(binding_ptr) => {
                        let binding = ctx.resolve_cons(binding_ptr);
                        (binding.car, binding.cdr)
                    }
                    _ => {
                        frame = cell.cdr;
                        continue;
                    }
                };
                if binding_name.as_atom_name(ctx) == Some(name) {
                    return match binding_value {
                        Value::Undefined => Err(format!("undefined variable: {}", name)),
                        other => Ok(other),
                    };
                }
                frame = cell.cdr;
            }
            _ => return Err(format!("undefined variable: {}", name)),
        }
    }
}

/// Walk `env` looking for the frame (the `Cons(name, value)` binding cell
/// itself, not its value) bound to `name`. Returns `Value::Nil` if no such
/// frame exists. Used by `set!` and `undefine!`, which mutate a binding's
/// `cdr` in place rather than prepending a new frame.
pub fn find_frame(ctx: &Context, env: Value, name: &str) -> Value {
    let mut frame = env;
    loop {
        match frame {
            Value::Nil => return Value::Nil,
            Value::Cons(ptr) => {
                let cell = ctx.resolve_cons(ptr);
                if let Value::Cons(binding_ptr) = cell.car {
                    let binding = ctx.resolve_cons(binding_ptr);
                    if binding.car.as_atom_name(ctx) == Some(name) {
                        return cell.car;
                    }
                }
                frame = cell.cdr;
            }
            _ => return Value::Nil,
        }
    }
}

/// Add a brand new global binding by mutating `ctx.global_env`'s sentinel
/// cell's `cdr` in place, rather than prepending a new head and
/// reassigning `ctx.global_env` the way `extend` does for ordinary lexical
/// frames.
///
/// `ctx.global_env`'s identity is fixed for the lifetime of the `Context`
/// (see `Context::new`), so any closure or macro that has captured it —
/// directly, or as the eventual tail of a lexical chain built on top of
/// it — sees this binding the moment it is added, with no need to rewire
/// any already-created closure's captured environment. This is what makes
/// forward references between top-level definitions resolve: a closure
/// defined before `y` exists still sees `y` once it is defined, because
/// looking up `y` walks through the same sentinel cell whose `cdr` now
/// includes it.
pub fn global_define(ctx: &mut Context, name: Value, value: Value) {
    let sentinel_ptr = ctx
        .global_env
        .as_cons()
        .expect("global_env is always a sentinel cons cell");
    let old_tail = ctx.resolve_cons(sentinel_ptr).cdr;
    let binding = ctx.permanent_cons(name, value);
    let new_frame = ctx.permanent_cons(binding, old_tail);
    ctx.resolve_cons_mut(sentinel_ptr).cdr = new_frame;
}

/// Prepend a new frame binding `name` to `value`, in `arena`, on top of
/// `env`. Never mutates `env`'s tail: this is how variable shadowing is
/// expressed.
pub fn extend(ctx: &mut Context, env: Value, name: Value, value: Value, permanent: bool) -> Value {
    let binding = if permanent {
        ctx.permanent_cons(name, value)
    } else {
        ctx.scratch_cons(name, value)
    };
    if permanent {
        ctx.permanent_cons(binding, env)
    } else {
        ctx.scratch_cons(binding, env)
    }
}

/// Recursive parallel descent binding each formal in `params` to the
/// corresponding actual in `args`, prepending one frame per pair onto
/// `env`. If `params` bottoms out in a bare atom rather than `Nil` (the
/// dotted rest-parameter convention), that atom is bound to whatever of
/// `args` remains. Mismatched lengths with no rest-parameter are an
/// arity error, but `bind` itself only ever produces that error for a
/// `params` tail that is neither `Nil`, `Cons`, nor an atom — ordinary
/// arity checking is the evaluator's job (see `eval::apply`), performed
/// before `bind` is ever called, so that the error message can name the
/// offending closure.
pub fn bind(ctx: &mut Context, params: Value, args: Value, env: Value) -> Result<Value, String> {
    match (params, args) {
        (Value::Nil, Value::Nil) => Ok(env),
        (Value::Nil, _) => Err("too many arguments".to_string()),
        (Value::Cons(p_ptr), Value::Cons(a_ptr)) => {
            let (p_car, p_cdr) = {
                let p = ctx.resolve_cons(p_ptr);
                (p.car, p.cdr)
            };
            let (a_car, a_cdr) = {
                let a = ctx.resolve_cons(a_ptr);
                (a.car, a.cdr)
            };
            let binding = ctx.scratch_cons(p_car, a_car);
            let extended = ctx.scratch_cons(binding, env);
            bind(ctx, p_cdr, a_cdr, extended)
        }
        (Value::Cons(_), Value::Nil) => Err("too few arguments".to_string()),
        (Value::Atom(_), rest) => {
            // Dotted rest-parameter: bind the remaining (possibly empty)
            // argument tail directly.
            let binding = ctx.scratch_cons(params, rest);
            Ok(ctx.scratch_cons(binding, env))
        }
        _ => Err("malformed parameter list".to_string()),
    }
}

/// The `car` of a cons cell, or a type error if `v` is not a pair.
pub fn car(ctx: &Context, v: Value) -> Result<Value, String> {
    match v {
        Value::Cons(ptr) => Ok(ctx.resolve_cons(ptr).car),
        other => Err(format!(
            "cannot take car of non-pair: {}",
            other.type_name()
        )),
    }
}

/// The `cdr` of a cons cell, or a type error if `v` is not a pair.
pub fn cdr(ctx: &Context, v: Value) -> Result<Value, String> {
    match v {
        Value::Cons(ptr) => Ok(ctx.resolve_cons(ptr).cdr),
        other => Err(format!(
            "cannot take cdr of non-pair: {}",
            other.type_name()
        )),
    }
}

/// The number of cons cells traversed before reaching a non-cons tail.
/// Matches `len`'s contract of "number of cons cells traversed", so it is
/// meaningful (if perhaps unexpected) on improper lists too.
pub fn list_len(ctx: &Context, list: Value) -> u64 {
    let mut n = 0u64;
    let mut rest = list;
    while let Value::Cons(ptr) = rest {
        n += 1;
        rest = ctx.resolve_cons(ptr).cdr;
    }
    n
}

/// Collect a proper list into a `Vec<Value>` in order. Stops (without
/// error) at the first non-cons tail; callers that care whether the list
/// was proper should check with `value::is_proper_list` first.
pub fn list_to_vec(ctx: &Context, list: Value) -> Vec<Value> {
    let mut items = Vec::new();
    let mut rest = list;
    while let Value::Cons(ptr) = rest {
        let cell = ctx.resolve_cons(ptr);
        items.push(cell.car);
        rest = cell.cdr;
    }
    items
}

/// Build a proper list (in the scratch arena) from a slice of values, in
/// order, terminated by `Nil`.
pub fn vec_to_list(ctx: &mut Context, items: &[Value]) -> Value {
    let mut list = Value::Nil;
    for item in items.iter().rev() {
        list = ctx.scratch_cons(*item, list);
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn lookup_finds_innermost_binding() {
        let mut ctx = Context::new();
        let name = ctx.make_scratch_atom("x");
        let env = extend(&mut ctx, Value::Nil, name, Value::Number(1.0), false);
        let name2 = ctx.make_scratch_atom("x");
        let env = extend(&mut ctx, env, name2, Value::Number(2.0), false);
        assert_eq!(lookup(&ctx, env, "x").unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn lookup_missing_is_error() {
        let ctx = Context::new();
        assert!(lookup(&ctx, Value::Nil, "x").is_err());
    }

    #[test]
    fn bind_handles_rest_parameter() {
        let mut ctx = Context::new();
        let a = ctx.make_scratch_atom("a");
        let rest = ctx.make_scratch_atom("rest");
        let params = ctx.scratch_cons(a, rest);
        let one = Value::Number(1.0);
        let two = Value::Number(2.0);
        let three = Value::Number(3.0);
        let tail = ctx.scratch_cons(three, Value::Nil);
        let tail = ctx.scratch_cons(two, tail);
        let args = ctx.scratch_cons(one, tail);
        let env = bind(&mut ctx, params, args, Value::Nil).unwrap();
        let rest_val = lookup(&ctx, env, "rest").unwrap();
        assert_eq!(list_len(&ctx, rest_val), 2);
    }

    #[test]
    fn bind_arity_mismatch_errors() {
        let mut ctx = Context::new();
        let a = ctx.make_scratch_atom("a");
        let params = ctx.scratch_cons(a, Value::Nil);
        assert!(bind(&mut ctx, params, Value::Nil, Value::Nil).is_err());
    }

    #[test]
    fn vec_to_list_and_back_roundtrip() {
        let mut ctx = Context::new();
        let items = vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)];
        let list = vec_to_list(&mut ctx, &items);
        let back = list_to_vec(&ctx, list);
        let nums: Vec<f64> = back.iter().map(|v| v.as_number().unwrap()).collect();
        assert_eq!(nums, vec![1.0, 2.0, 3.0]);
    }
}
