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

//! The Scheme value representation: a tagged union of every runtime kind,
//! plus the constructors and predicates that only need a single arena to
//! do their work. Operations that must walk a value's *structure* (list
//! length, proper-list checking, structural equality) live here too, since
//! they only need read access to the arenas a [`crate::context::Context`]
//! owns, not its environment or primitive table.

use crate::arena::Index;
use crate::context::{Arenas, Context};

/// Which of the two arenas a pointer-bearing value was allocated in.
///
/// This is carried alongside every arena index because pointer identity
/// (`eq?`) must distinguish "the cons cell at slot 3 of the permanent
/// arena" from "the cons cell at slot 3 of the scratch arena" — they are
/// unrelated objects that merely share a slot number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ArenaId {
    Permanent,
    Scratch,
}

/// A cons cell: the sole compound constructor. Lists are right-nested
/// chains of cons cells terminated by `Value::Nil`.
#[derive(Clone, Copy, Debug)]
pub struct Cons {
    pub car: Value,
    pub cdr: Value,
}

/// The shared payload of `Closure` and `Macro` values: formal parameters,
/// an unevaluated body, and the environment captured at creation time.
/// Macros and closures differ only in how the evaluator treats their
/// arguments (see `eval`), so they share this representation and are
/// distinguished purely by the `Value` tag that wraps them.
#[derive(Clone, Copy, Debug)]
pub struct ClosureData {
    pub params: Value,
    pub body: Value,
    pub env: Value,
}

/// A pointer to a `T` allocated in one of the two arenas.
#[derive(Debug)]
pub struct Ptr<T> {
    pub arena: ArenaId,
    pub index: Index<T>,
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ptr<T> {}

impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.arena == other.arena && self.index == other.index
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> std::hash::Hash for Ptr<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.arena.hash(state);
        self.index.hash(state);
    }
}

pub type ConsPtr = Ptr<Cons>;
pub type StrPtr = Ptr<String>;
pub type ClosurePtr = Ptr<ClosureData>;

/// A Scheme runtime value.
///
/// Every variant is `Copy`: pointer variants carry only an arena tag plus
/// a slot index, so copying a `Value` never duplicates the underlying
/// payload, only the (cheap) reference to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// The empty list; also the only falsy value.
    Nil,
    /// The sole numeric type.
    Number(f64),
    /// A symbol; identity is by name, not address.
    Atom(StrPtr),
    /// A self-evaluating character sequence.
    Str(StrPtr),
    /// An index into the static primitives table (`crate::primitives`).
    Primitive(usize),
    /// A pair; the universal compound constructor.
    Cons(ConsPtr),
    /// A user-defined function: unevaluated arguments are bound, then the
    /// body is evaluated in an environment extending the captured one.
    Closure(ClosurePtr),
    /// Like `Closure`, but the evaluator passes unevaluated arguments and
    /// re-evaluates the result.
    Macro(ClosurePtr),
    /// A propagating failure. Never stored in a binding.
    Error(StrPtr),
    /// The sentinel left behind by `undefine!`; looking it up is an error.
    Undefined,
}

/// Maximum length, in bytes, of an `Error` value's message. Longer
/// messages are truncated with a trailing ellipsis marker.
const MAX_ERROR_MESSAGE: usize = 256;

impl Value {
    /// Intern `text` into `arena_id`'s string pool and return an `Atom`
    /// wrapping it. Symbol equality is by name, so no actual interning
    /// (deduplication) is required for correctness, only for the copy
    /// semantics described by `copy_to` — each call allocates fresh
    /// storage, matching the "duplicate the input text" contract of 4.B.
    pub fn make_atom(arena_id: ArenaId, arenas: &mut Arenas, text: &str) -> Value {
        let index = arenas.strings.alloc(text.to_owned());
        Value::Atom(Ptr {
            arena: arena_id,
            index,
        })
    }

    /// Allocate a new self-evaluating string value.
    pub fn make_string(arena_id: ArenaId, arenas: &mut Arenas, text: &str) -> Value {
        let index = arenas.strings.alloc(text.to_owned());
        Value::Str(Ptr {
            arena: arena_id,
            index,
        })
    }

    /// Allocate a bounded error value. Messages longer than
    /// [`MAX_ERROR_MESSAGE`] bytes are truncated with a trailing `"..."`
    /// so a runaway format string cannot grow the arena unboundedly.
    pub fn make_error(arena_id: ArenaId, arenas: &mut Arenas, message: impl AsRef<str>) -> Value {
        let message = message.as_ref();
        let bounded = if message.len() > MAX_ERROR_MESSAGE {
            let mut truncated = message
                .char_indices()
                .take_while(|(i, _)| *i < MAX_ERROR_MESSAGE - 3)
                .map(|(_, c)| c)
                .collect::<String>();
            truncated.push_str("...");
            truncated
        } else {
            message.to_owned()
        };
        let index = arenas.strings.alloc(bounded);
        Value::Error(Ptr {
            arena: arena_id,
            index,
        })
    }

    /// Allocate a new cons cell.
    pub fn cons(arena_id: ArenaId, arenas: &mut Arenas, car: Value, cdr: Value) -> Value {
        let index = arenas.cons.alloc(Cons { car, cdr });
        Value::Cons(Ptr {
            arena: arena_id,
            index,
        })
    }

    /// Allocate a new closure or macro (selected by `is_macro`).
    pub fn closure(
        arena_id: ArenaId,
        arenas: &mut Arenas,
        params: Value,
        body: Value,
        env: Value,
        is_macro: bool,
    ) -> Value {
        let index = arenas.closures.alloc(ClosureData { params, body, env });
        let ptr = Ptr {
            arena: arena_id,
            index,
        };
        if is_macro {
            Value::Macro(ptr)
        } else {
            Value::Closure(ptr)
        }
    }

    /// The empty list is the only falsy value; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_cons(&self) -> bool {
        matches!(self, Value::Cons(_))
    }

    /// The scheme-facing type name, used to build uniform type-error
    /// messages (e.g. `"expected number, got atom"`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::Atom(_) => "atom",
            Value::Str(_) => "string",
            Value::Primitive(_) => "primitive",
            Value::Cons(_) => "pair",
            Value::Closure(_) => "closure",
            Value::Macro(_) => "macro",
            Value::Error(_) => "error",
            Value::Undefined => "undefined",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_cons(&self) -> Option<ConsPtr> {
        match self {
            Value::Cons(ptr) => Some(*ptr),
            _ => None,
        }
    }

    pub fn as_atom_name<'a>(&self, ctx: &'a Context) -> Option<&'a str> {
        match self {
            Value::Atom(ptr) => Some(ctx.resolve_string(*ptr)),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

/// Structural equality per the variant-specific rules of 4.B: numbers by
/// value, strings/atoms/error messages by content, pairs/closures/macros
/// by address, primitives by table index, `Nil`/`Undefined` trivially
/// equal to their own kind.
pub fn are_equal(ctx: &Context, a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Undefined, Value::Undefined) => true,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Atom(x), Value::Atom(y)) => ctx.resolve_string(x) == ctx.resolve_string(y),
        (Value::Str(x), Value::Str(y)) => ctx.resolve_string(x) == ctx.resolve_string(y),
        (Value::Error(x), Value::Error(y)) => ctx.resolve_string(x) == ctx.resolve_string(y),
        (Value::Primitive(x), Value::Primitive(y)) => x == y,
        (Value::Cons(x), Value::Cons(y)) => x == y,
        (Value::Closure(x), Value::Closure(y)) => x == y,
        (Value::Macro(x), Value::Macro(y)) => x == y,
        _ => false,
    }
}

/// Tortoise-and-hare cycle detection: `true` if `list` terminates in
/// `Nil`, `false` if it terminates in a non-`Cons` tail or revisits a
/// node it has already passed (i.e. is circular).
pub fn is_proper_list(ctx: &Context, list: Value) -> bool {
    let mut slow = list;
    let mut fast = list;
    loop {
        match fast {
            Value::Nil => return true,
            Value::Cons(fast_ptr) => {
                let fast_cdr = ctx.resolve_cons(fast_ptr).cdr;
                match fast_cdr {
                    Value::Nil => return true,
                    Value::Cons(fast_ptr2) => {
                        fast = ctx.resolve_cons(fast_ptr2).cdr;
                        slow = match slow {
                            Value::Cons(slow_ptr) => ctx.resolve_cons(slow_ptr).cdr,
                            _ => return false,
                        };
                        if let (Value::Cons(a), Value::Cons(b)) = (slow, fast) {
                            if a == b {
                                return false;
                            }
                        }
                    }
                    _ => return false,
                }
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn numbers_equal_by_value() {
        let ctx = Context::new();
        assert!(are_equal(&ctx, Value::Number(1.0), Value::Number(1.0)));
        assert!(!are_equal(&ctx, Value::Number(1.0), Value::Number(2.0)));
    }

    #[test]
    fn atoms_equal_by_name_not_address() {
        let mut ctx = Context::new();
        let a = ctx.make_scratch_atom("foo");
        let b = ctx.make_scratch_atom("foo");
        assert!(are_equal(&ctx, a, b));
    }

    #[test]
    fn conses_equal_only_by_address() {
        let mut ctx = Context::new();
        let a = ctx.scratch_cons(Value::Number(1.0), Value::Nil);
        let b = ctx.scratch_cons(Value::Number(1.0), Value::Nil);
        assert!(!are_equal(&ctx, a, b));
        assert!(are_equal(&ctx, a, a));
    }

    #[test]
    fn nil_is_proper_list() {
        let ctx = Context::new();
        assert!(is_proper_list(&ctx, Value::Nil));
    }

    #[test]
    fn dotted_pair_is_not_a_proper_list() {
        let mut ctx = Context::new();
        let improper = ctx.scratch_cons(Value::Number(1.0), Value::Number(2.0));
        assert!(!is_proper_list(&ctx, improper));
    }

    #[test]
    fn cyclic_list_is_not_a_proper_list() {
        let mut ctx = Context::new();
        let cons = ctx
            .scratch_cons(Value::Number(1.0), Value::Nil)
            .as_cons()
            .unwrap();
        ctx.scratch_mut().cons.get_mut(cons.index).cdr = Value::Cons(cons);
        assert!(!is_proper_list(&ctx, Value::Cons(cons)));
    }
}