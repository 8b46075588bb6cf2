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

//! Printing values' text representations.

use crate::context::Context;
use crate::value::Value;

/// Render `value`'s text representation.
pub fn format_value(ctx: &Context, value: Value) -> String {
    let mut out = String::new();
    write_value(ctx, value, &mut out);
    out
}

fn write_value(ctx: &Context, value: Value, out: &mut String) {
    match value {
        Value::Nil => out.push_str("()"),
        Value::Number(n) => write_number(n, out),
        Value::Atom(_) => out.push_str(value.as_atom_name(ctx).unwrap()),
        Value::Str(ptr) => {
            out.push('"');
            for c in ctx.resolve_string(ptr).chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }
        Value::Primitive(idx) => {
            out.push_str("<primitive:");
            out.push_str(crate::primitives::PRIMITIVES[idx].name);
            out.push('>');
        }
        Value::Cons(ptr) => {
            out.push('(');
            let cell = ctx.resolve_cons(ptr);
            write_value(ctx, cell.car, out);
            write_tail(ctx, cell.cdr, out);
            out.push(')');
        }
        Value::Closure(_) => out.push_str("<closure>"),
        Value::Macro(_) => out.push_str("<macro>"),
        Value::Error(ptr) => {
            out.push_str("Error: ");
            out.push_str(ctx.resolve_string(ptr));
        }
        Value::Undefined => out.push_str("<undefined>"),
    }
}

fn write_tail(ctx: &Context, tail: Value, out: &mut String) {
    match tail {
        Value::Nil => {}
        Value::Cons(ptr) => {
            out.push(' ');
            let cell = ctx.resolve_cons(ptr);
            write_value(ctx, cell.car, out);
            write_tail(ctx, cell.cdr, out);
        }
        other => {
            out.push_str(" . ");
            write_value(ctx, other, out);
        }
    }
}

/// Numbers print without a trailing `.0` when they represent an integral
/// value, matching the convention most Schemes use for exact-looking
/// results (`(+ 1 2)` prints `3`, not `3.0`), while still showing full
/// precision for genuinely fractional results.
fn write_number(n: f64, out: &mut String) {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        out.push_str(&format!("{}", n as i64));
    } else {
        out.push_str(&format!("{}", n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn integral_numbers_print_without_decimal() {
        let ctx = Context::new();
        assert_eq!(format_value(&ctx, Value::Number(3.0)), "3");
    }

    #[test]
    fn fractional_numbers_keep_precision() {
        let ctx = Context::new();
        assert_eq!(format_value(&ctx, Value::Number(1.5)), "1.5");
    }

    #[test]
    fn nil_prints_as_empty_list() {
        let ctx = Context::new();
        assert_eq!(format_value(&ctx, Value::Nil), "()");
    }

    #[test]
    fn lists_print_space_separated() {
        let mut ctx = Context::new();
        let inner = ctx.scratch_cons(Value::Number(2.0), Value::Nil);
        let list = ctx.scratch_cons(Value::Number(1.0), inner);
        assert_eq!(format_value(&ctx, list), "(1 2)");
    }

    #[test]
    fn dotted_pairs_print_with_a_dot() {
        let mut ctx = Context::new();
        let pair = ctx.scratch_cons(Value::Number(1.0), Value::Number(2.0));
        assert_eq!(format_value(&ctx, pair), "(1 . 2)");
    }

    #[test]
    fn strings_print_quoted_and_escaped() {
        let mut ctx = Context::new();
        let s = ctx.make_scratch_string("a\"b");
        assert_eq!(format_value(&ctx, s), "\"a\\\"b\"");
    }
}
