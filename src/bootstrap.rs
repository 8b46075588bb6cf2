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

//! Building a ready-to-use [`Context`]: seed `#t`, then register every
//! entry of the primitives table as a global binding.

use crate::context::Context;
use crate::environment;
use crate::primitives::PRIMITIVES;
use crate::value::Value;

/// Create a `Context` with `#t` and every primitive already bound in
/// `global_env`. This is the only way production code should obtain a
/// `Context` with a usable standard library; `Context::new` alone is
/// deliberately bare, for tests that want an empty environment.
pub fn new_context() -> Context {
    let mut ctx = Context::new();

    let true_name = ctx.make_permanent_atom(crate::context::TRUE_ATOM_NAME);
    environment::global_define(&mut ctx, true_name, true_name);

    let mut registered = 0usize;
    for (idx, entry) in PRIMITIVES.iter().enumerate() {
        let name = ctx.make_permanent_atom(entry.name);
        let value = Value::Primitive(idx);
        environment::global_define(&mut ctx, name, value);
        registered += 1;
    }
    log::debug!(
        "bootstrap: registered {} primitives (cons arena capacity {}, closures arena capacity {})",
        registered,
        ctx.arenas(crate::value::ArenaId::Permanent).cons.capacity(),
        ctx.arenas(crate::value::ArenaId::Permanent).closures.capacity(),
    );

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::lookup;

    #[test]
    fn seeds_true_binding() {
        let ctx = new_context();
        let v = lookup(&ctx, ctx.global_env, "#t").unwrap();
        assert_eq!(v.as_atom_name(&ctx), Some("#t"));
    }

    #[test]
    fn registers_every_primitive_by_name() {
        let ctx = new_context();
        for entry in PRIMITIVES {
            assert!(
                lookup(&ctx, ctx.global_env, entry.name).is_ok(),
                "missing primitive binding: {}",
                entry.name
            );
        }
    }
}
