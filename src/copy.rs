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

//! Cross-arena deep copy: promoting a value out of the scratch arena and
//! into the permanent one.
//!
//! This is the hinge the whole two-arena discipline swings on. `define`
//! and `set!` are the only callers: both are about to make a value
//! reachable from `global_env`, which lives in the permanent arena and
//! survives every scratch reset, so whatever they bind must be copied out
//! of scratch first.

use crate::context::Context;
use crate::value::{ArenaId, Value};

/// Recursively reconstruct `v` in the permanent arena.
///
/// - Atomic variants (`Nil`, `Number`, `Primitive`, `Undefined`) are
///   returned verbatim — they carry no arena-bound payload.
/// - `Atom`/`Str`/`Error` duplicate their text into the permanent arena.
/// - `Cons` recursively copies `car` and `cdr`.
/// - `Closure`/`Macro` copy `params` and `body`, but **not** the captured
///   environment: it is shared by reference, typically because it already
///   *is* (or soon will be) the permanent `global_env`.
///
/// Values already resident in the permanent arena are copied again
/// rather than recognized as already-safe and passed through: the
/// contract of `copy_to` is "produce an equivalent permanent-arena value"
/// without promising pointer-identity preservation across arenas, and the
/// two call sites (`define`, `set!`) only ever invoke it on a
/// freshly-evaluated scratch result. This keeps the function a pure
/// structural descent with no extra arena-membership branch to get wrong.
pub fn copy_to(ctx: &mut Context, v: Value) -> Value {
    match v {
        Value::Nil | Value::Number(_) | Value::Primitive(_) | Value::Undefined => v,
        Value::Atom(ptr) => {
            let text = ctx.resolve_string(ptr).to_owned();
            ctx.make_permanent_atom(&text)
        }
        Value::Str(ptr) => {
            let text = ctx.resolve_string(ptr).to_owned();
            Value::make_string(ArenaId::Permanent, ctx.permanent_mut(), &text)
        }
        Value::Error(ptr) => {
            let text = ctx.resolve_string(ptr).to_owned();
            Value::make_error(ArenaId::Permanent, ctx.permanent_mut(), &text)
        }
        Value::Cons(ptr) => {
            let (car, cdr) = {
                let cell = ctx.resolve_cons(ptr);
                (cell.car, cell.cdr)
            };
            let car = copy_to(ctx, car);
            let cdr = copy_to(ctx, cdr);
            ctx.permanent_cons(car, cdr)
        }
        Value::Closure(ptr) | Value::Macro(ptr) => {
            let is_macro = matches!(v, Value::Macro(_));
            let (params, body, env) = {
                let data = ctx.resolve_closure(ptr);
                (data.params, data.body, data.env)
            };
            let params = copy_to(ctx, params);
            let body = copy_to(ctx, body);
            Value::closure(ArenaId::Permanent, ctx.permanent_mut(), params, body, env, is_macro)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::list_to_vec;

    #[test]
    fn copies_atom_text() {
        let mut ctx = Context::new();
        let atom = ctx.make_scratch_atom("hello");
        let copied = copy_to(&mut ctx, atom);
        assert!(matches!(copied, Value::Atom(p) if p.arena == ArenaId::Permanent));
        assert_eq!(copied.as_atom_name(&ctx), Some("hello"));
    }

    #[test]
    fn copies_list_structure() {
        let mut ctx = Context::new();
        let inner = ctx.scratch_cons(Value::Number(2.0), Value::Nil);
        let list = ctx.scratch_cons(Value::Number(1.0), inner);
        let copied = copy_to(&mut ctx, list);
        match copied {
            Value::Cons(ptr) => assert_eq!(ptr.arena, ArenaId::Permanent),
            _ => panic!("expected a cons"),
        }
        let items = list_to_vec(&ctx, copied);
        let nums: Vec<f64> = items.iter().map(|v| v.as_number().unwrap()).collect();
        assert_eq!(nums, vec![1.0, 2.0]);
    }

    #[test]
    fn closure_env_is_shared_not_copied() {
        let mut ctx = Context::new();
        let env_marker = ctx.make_scratch_atom("env-marker");
        let env = ctx.scratch_cons(env_marker, Value::Nil);
        let params = Value::Nil;
        let body = ctx.scratch_cons(Value::Number(1.0), Value::Nil);
        let closure = ctx.make_scratch_closure(params, body, env, false);
        let copied = copy_to(&mut ctx, closure);
        let data = match copied {
            Value::Closure(ptr) => *ctx.resolve_closure(ptr),
            _ => panic!("expected a closure"),
        };
        // The environment pointer is passed through untouched: same
        // arena, same slot as the original scratch env.
        match (data.env, env) {
            (Value::Cons(a), Value::Cons(b)) => assert_eq!(a, b),
            _ => panic!("expected cons envs"),
        }
    }
}
