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

//! The `Context` bundles the two arenas and the global environment that
//! every allocation site and every primitive needs. Creating a `Context`
//! is the first step to running a Scheme program.
//!
//! This plays the role that a pile of process-global statics would play in
//! a simpler implementation: grouping them into one struct passed
//! explicitly makes allocation-site decisions visible in every function
//! signature, and makes multiple independent interpreters (handy in tests)
//! trivial.

use crate::arena::Arena;
use crate::value::{ArenaId, ClosureData, ClosurePtr, Cons, ConsPtr, StrPtr, Value};

/// The three arenas that back a single memory region (permanent or
/// scratch): cons cells, strings (used for atoms, strings, and error
/// messages alike), and closures/macros.
#[derive(Default)]
pub struct Arenas {
    pub cons: Arena<Cons>,
    pub strings: Arena<String>,
    pub closures: Arena<ClosureData>,
}

impl Arenas {
    fn new() -> Arenas {
        Arenas::default()
    }
}

/// The name of the well-known `#t` binding, seeded at bootstrap.
pub const TRUE_ATOM_NAME: &str = "#t";

/// All process-wide interpreter state: the permanent arena, the scratch
/// arena, and the global environment (itself a cons chain living in the
/// permanent arena).
pub struct Context {
    permanent: Arenas,
    scratch: Arenas,
    /// Head of the global environment's frame list. Mutated in place only
    /// by `define`, `set!`, and `undefine!` (see `environment`).
    pub global_env: Value,
}

impl Context {
    /// Create a new `Context` with empty arenas and an empty global
    /// environment. Primitive registration and the `#t` binding are the
    /// bootstrap driver's job (see `main`), not the `Context`'s — a bare
    /// `Context` is useful on its own in tests that don't need the
    /// standard library.
    ///
    /// `global_env` starts life as a sentinel cons cell (`Nil . Nil`)
    /// rather than `Nil` itself. Its identity never changes afterward —
    /// `environment::global_define` mutates its `cdr` in place instead of
    /// prepending a new head and reassigning `global_env` — so any
    /// closure that has ever captured `global_env` keeps seeing every
    /// global binding added after it was created, including ones that
    /// did not exist yet at capture time. See `environment::global_define`.
    pub fn new() -> Context {
        let mut permanent = Arenas::new();
        let sentinel = Value::cons(ArenaId::Permanent, &mut permanent, Value::Nil, Value::Nil);
        Context {
            permanent,
            scratch: Arenas::new(),
            global_env: sentinel,
        }
    }

    pub fn arenas(&self, id: ArenaId) -> &Arenas {
        match id {
            ArenaId::Permanent => &self.permanent,
            ArenaId::Scratch => &self.scratch,
        }
    }

    pub fn arenas_mut(&mut self, id: ArenaId) -> &mut Arenas {
        match id {
            ArenaId::Permanent => &mut self.permanent,
            ArenaId::Scratch => &mut self.scratch,
        }
    }

    pub fn permanent_mut(&mut self) -> &mut Arenas {
        &mut self.permanent
    }

    pub fn scratch_mut(&mut self) -> &mut Arenas {
        &mut self.scratch
    }

    /// Reset the scratch arena. Per the arena discipline invariant, every
    /// value still reachable from `global_env` must already live in the
    /// permanent arena before this is called; `define`/`set!`'s
    /// deep-copy-on-write is what guarantees that.
    pub fn reset_scratch(&mut self) {
        self.scratch.cons.reset();
        self.scratch.strings.reset();
        self.scratch.closures.reset();
        log::trace!("context: scratch arena reset");
    }

    pub fn resolve_string(&self, ptr: StrPtr) -> &str {
        self.arenas(ptr.arena).strings.get(ptr.index).as_str()
    }

    pub fn resolve_cons(&self, ptr: ConsPtr) -> &Cons {
        self.arenas(ptr.arena).cons.get(ptr.index)
    }

    pub fn resolve_cons_mut(&mut self, ptr: ConsPtr) -> &mut Cons {
        self.arenas_mut(ptr.arena).cons.get_mut(ptr.index)
    }

    pub fn resolve_closure(&self, ptr: ClosurePtr) -> &ClosureData {
        self.arenas(ptr.arena).closures.get(ptr.index)
    }

    pub fn resolve_closure_mut(&mut self, ptr: ClosurePtr) -> &mut ClosureData {
        self.arenas_mut(ptr.arena).closures.get_mut(ptr.index)
    }

    /// Allocate a new cons cell in the scratch arena. Almost everything
    /// produced during reading and evaluation lives here.
    pub fn scratch_cons(&mut self, car: Value, cdr: Value) -> Value {
        Value::cons(ArenaId::Scratch, &mut self.scratch, car, cdr)
    }

    /// Allocate a new cons cell in the permanent arena. Used by
    /// `copy_to` and by bootstrap.
    pub fn permanent_cons(&mut self, car: Value, cdr: Value) -> Value {
        Value::cons(ArenaId::Permanent, &mut self.permanent, car, cdr)
    }

    pub fn make_scratch_atom(&mut self, text: &str) -> Value {
        Value::make_atom(ArenaId::Scratch, &mut self.scratch, text)
    }

    pub fn make_permanent_atom(&mut self, text: &str) -> Value {
        Value::make_atom(ArenaId::Permanent, &mut self.permanent, text)
    }

    pub fn make_scratch_string(&mut self, text: &str) -> Value {
        Value::make_string(ArenaId::Scratch, &mut self.scratch, text)
    }

    pub fn make_scratch_error(&mut self, message: impl AsRef<str>) -> Value {
        Value::make_error(ArenaId::Scratch, &mut self.scratch, message)
    }

    pub fn make_scratch_closure(
        &mut self,
        params: Value,
        body: Value,
        env: Value,
        is_macro: bool,
    ) -> Value {
        Value::closure(
            ArenaId::Scratch,
            &mut self.scratch,
            params,
            body,
            env,
            is_macro,
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
