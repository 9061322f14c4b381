//! The reference kernel table: every operator and function word the
//! compiler knows about out of the box.
//!
//! Math kernels are dispatched through a small enum (trig, hyperbolic,
//! exponential and comparison functions) rather than a trait object per
//! call; call-argument evaluation reads its operands as a plain slice of
//! already-computed values, matching how the rest of this crate evaluates
//! a node's children before the node itself.

use crate::error::MathError;
use crate::word::{FunctionSpec, Kernel, Word};
use std::rc::Rc;

/// Operator precedence (lower binds tighter).
pub mod precedence {
    pub const UNARY: u16 = 10;
    pub const POWER: u16 = 20;
    pub const MUL_DIV: u16 = 30;
    pub const ADD_SUB: u16 = 40;
    pub const COMPARISON: u16 = 50;
    pub const NOT: u16 = 60;
    pub const OR_AND_XOR: u16 = 70;
    pub const ASSIGN: u16 = 200;
}

fn func(name: &str, kernel: Kernel, precedence: u16, is_operator: bool, can_vary: bool) -> Rc<Word> {
    Rc::new(Word::Function {
        name: name.to_string(),
        spec: FunctionSpec {
            kernel,
            precedence,
            is_operator,
            can_vary,
        },
    })
}

fn bool_func(name: &str, kernel: Kernel, precedence: u16, is_operator: bool) -> Rc<Word> {
    Rc::new(Word::BooleanFunction {
        name: name.to_string(),
        spec: FunctionSpec {
            kernel,
            precedence,
            is_operator,
            can_vary: false,
        },
    })
}

fn round(x: f64) -> i64 {
    x.round() as i64
}

fn domain(message: impl Into<String>) -> MathError {
    MathError::Domain(message.into())
}

// --- unary math --------------------------------------------------------

fn k_sin(x: f64) -> Result<f64, MathError> {
    Ok(x.sin())
}
fn k_cos(x: f64) -> Result<f64, MathError> {
    Ok(x.cos())
}
fn k_tan(x: f64) -> Result<f64, MathError> {
    Ok(x.tan())
}
fn k_asin(x: f64) -> Result<f64, MathError> {
    if !(-1.0..=1.0).contains(&x) {
        return Err(domain("asin argument out of [-1, 1]"));
    }
    Ok(x.asin())
}
fn k_acos(x: f64) -> Result<f64, MathError> {
    if !(-1.0..=1.0).contains(&x) {
        return Err(domain("acos argument out of [-1, 1]"));
    }
    Ok(x.acos())
}
fn k_atan(x: f64) -> Result<f64, MathError> {
    Ok(x.atan())
}
fn k_sqrt(x: f64) -> Result<f64, MathError> {
    if x < 0.0 {
        return Err(domain("sqrt of negative number"));
    }
    Ok(x.sqrt())
}
fn k_abs(x: f64) -> Result<f64, MathError> {
    Ok(x.abs())
}
fn k_floor(x: f64) -> Result<f64, MathError> {
    Ok(x.floor())
}
fn k_ceil(x: f64) -> Result<f64, MathError> {
    Ok(x.ceil())
}
fn k_ln(x: f64) -> Result<f64, MathError> {
    if x <= 0.0 {
        return Err(domain("ln of non-positive number"));
    }
    Ok(x.ln())
}
fn k_log10(x: f64) -> Result<f64, MathError> {
    if x <= 0.0 {
        return Err(domain("log10 of non-positive number"));
    }
    Ok(x.log10())
}
fn k_exp(x: f64) -> Result<f64, MathError> {
    Ok(x.exp())
}

/// Postfix `%`: multiply by 0.01.
fn k_percent(x: f64) -> Result<f64, MathError> {
    Ok(x * 0.01)
}

/// Postfix `!`: recursive factorial, base case `x <= 1.1 -> 1`.
fn k_factorial(x: f64) -> Result<f64, MathError> {
    if x < 0.0 {
        return Err(domain("factorial of negative number"));
    }
    if x <= 1.1 {
        return Ok(1.0);
    }
    Ok(x * k_factorial(x - 1.0)?)
}

fn k_neg(x: f64) -> Result<f64, MathError> {
    Ok(-x)
}
fn k_pos(x: f64) -> Result<f64, MathError> {
    Ok(x)
}

/// Prefix `not`: bitwise complement over the rounded integer, truthiness
/// via nonzero. Logical ops here are all bitwise over rounded integers.
fn k_not(x: f64) -> Result<f64, MathError> {
    Ok(if round(x) == 0 { 1.0 } else { 0.0 })
}

// --- binary math ---------------------------------------------------------

fn k_add(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(a + b)
}
fn k_sub(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(a - b)
}
fn k_mul(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(a * b)
}
fn k_div_real(a: f64, b: f64) -> Result<f64, MathError> {
    if b == 0.0 {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}
fn k_pow(a: f64, b: f64) -> Result<f64, MathError> {
    let result = a.powf(b);
    if result.is_infinite() {
        return Err(MathError::Overflow);
    }
    Ok(result)
}
fn k_atan2(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(a.atan2(b))
}
fn k_min(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(a.min(b))
}
fn k_max(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(a.max(b))
}

/// Integer division on rounded operands.
fn k_int_div(a: f64, b: f64) -> Result<f64, MathError> {
    let (a, b) = (round(a), round(b));
    if b == 0 {
        return Err(MathError::DivisionByZero);
    }
    Ok((a / b) as f64)
}

/// `mod` on rounded operands.
fn k_int_mod(a: f64, b: f64) -> Result<f64, MathError> {
    let (a, b) = (round(a), round(b));
    if b == 0 {
        return Err(MathError::DivisionByZero);
    }
    Ok((a % b) as f64)
}

fn k_bit_or(a: f64, b: f64) -> Result<f64, MathError> {
    Ok((round(a) | round(b)) as f64)
}
fn k_bit_and(a: f64, b: f64) -> Result<f64, MathError> {
    Ok((round(a) & round(b)) as f64)
}
fn k_bit_xor(a: f64, b: f64) -> Result<f64, MathError> {
    Ok((round(a) ^ round(b)) as f64)
}

/// Numeric equality/order comparisons fold to 0.0/1.0, each with its own
/// tolerance.
fn k_eq(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(if (a - b).abs() < 1e-30 { 1.0 } else { 0.0 })
}
fn k_ne(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(if (a - b).abs() < 1e-30 { 0.0 } else { 1.0 })
}
fn k_lt(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(if a < b { 1.0 } else { 0.0 })
}
fn k_gt(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(if a > b { 1.0 } else { 0.0 })
}
/// `>=` carries a bias so that values within `1e-30` still compare equal.
fn k_ge(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(if a + 1e-30 >= b { 1.0 } else { 0.0 })
}
fn k_le(a: f64, b: f64) -> Result<f64, MathError> {
    Ok(if a - 1e-30 <= b { 1.0 } else { 0.0 })
}

/// `x in y`: membership restricted to the string path at shaping time
/// (see `shaper.rs`); the numeric form never reaches evaluation, so this
/// kernel exists only to give `in` a word/precedence before shaping
/// decides whether the operands are strings.
fn k_in_unsupported(_a: f64, _b: f64) -> Result<f64, MathError> {
    Err(domain(
        "'in' is only defined between two string operands",
    ))
}

// --- ternary / nullary ----------------------------------------------------

/// Non-short-circuit 3-arg `if`: both branches are always evaluated before
/// this kernel runs, since the linearizer has already computed both
/// `args` slots.
fn k_if(cond: f64, then_branch: f64, else_branch: f64) -> Result<f64, MathError> {
    Ok(if round(cond) != 0 { then_branch } else { else_branch })
}

/// The one nondeterministic builtin: uniform `[0, 1)`, seeded from ambient
/// timing entropy rather than pulling in a dependency for a single call
/// site.
fn k_rand() -> Result<f64, MathError> {
    use std::cell::Cell;
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hash, Hasher};

    thread_local! {
        static STATE: Cell<u64> = Cell::new(0);
    }
    STATE.with(|state| {
        let mut value = state.get();
        if value == 0 {
            let mut hasher = RandomState::new().build_hasher();
            std::time::Instant::now().hash(&mut hasher);
            value = hasher.finish() | 1;
        }
        // xorshift64
        value ^= value << 13;
        value ^= value >> 7;
        value ^= value << 17;
        state.set(value);
        Ok((value >> 11) as f64 / (1u64 << 53) as f64)
    })
}

/// Build the starting dictionary contents: every builtin operator and
/// named function, keyed in lowercase.
pub fn builtin_words() -> Vec<(&'static str, Rc<Word>)> {
    use precedence::*;
    vec![
        // unary prefix/postfix operators
        ("!", func("!", Kernel::Unary(k_factorial), UNARY, true, false)),
        ("%", func("%", Kernel::Unary(k_percent), UNARY, true, false)),
        ("-@", func("-@", Kernel::Unary(k_neg), UNARY, true, false)),
        ("+@", func("+@", Kernel::Unary(k_pos), UNARY, true, false)),
        ("in", func("in", Kernel::Binary(k_in_unsupported), UNARY, true, false)),
        // power
        ("^", func("^", Kernel::Binary(k_pow), POWER, true, false)),
        ("^@", func("^@", Kernel::Binary(k_pow), POWER, true, false)),
        // multiplicative
        ("*", func("*", Kernel::Binary(k_mul), MUL_DIV, true, false)),
        ("/", func("/", Kernel::Binary(k_div_real), MUL_DIV, true, false)),
        ("div", func("div", Kernel::Binary(k_int_div), MUL_DIV, true, false)),
        ("mod", func("mod", Kernel::Binary(k_int_mod), MUL_DIV, true, false)),
        // additive
        ("+", func("+", Kernel::Binary(k_add), ADD_SUB, true, false)),
        ("-", func("-", Kernel::Binary(k_sub), ADD_SUB, true, false)),
        // comparisons (boolean-typed)
        ("=", bool_func("=", Kernel::Binary(k_eq), COMPARISON, true)),
        ("<>", bool_func("<>", Kernel::Binary(k_ne), COMPARISON, true)),
        ("<", bool_func("<", Kernel::Binary(k_lt), COMPARISON, true)),
        (">", bool_func(">", Kernel::Binary(k_gt), COMPARISON, true)),
        (">=", bool_func(">=", Kernel::Binary(k_ge), COMPARISON, true)),
        ("<=", bool_func("<=", Kernel::Binary(k_le), COMPARISON, true)),
        // not
        ("not", bool_func("not", Kernel::Unary(k_not), NOT, true)),
        // or/and/xor (bitwise over rounded integers)
        ("or", func("or", Kernel::Binary(k_bit_or), OR_AND_XOR, true, false)),
        ("and", func("and", Kernel::Binary(k_bit_and), OR_AND_XOR, true, false)),
        ("xor", func("xor", Kernel::Binary(k_bit_xor), OR_AND_XOR, true, false)),
        // assignment: evaluated specially (writes through the lvalue's
        // cell, see program.rs); this kernel is a placeholder never called.
        (":=", func(":=", Kernel::Binary(|_lvalue, value| Ok(value)), ASSIGN, true, true)),
        // named math functions
        ("sin", func("sin", Kernel::Unary(k_sin), 0, false, false)),
        ("cos", func("cos", Kernel::Unary(k_cos), 0, false, false)),
        ("tan", func("tan", Kernel::Unary(k_tan), 0, false, false)),
        ("asin", func("asin", Kernel::Unary(k_asin), 0, false, false)),
        ("acos", func("acos", Kernel::Unary(k_acos), 0, false, false)),
        ("atan", func("atan", Kernel::Unary(k_atan), 0, false, false)),
        ("sqrt", func("sqrt", Kernel::Unary(k_sqrt), 0, false, false)),
        ("abs", func("abs", Kernel::Unary(k_abs), 0, false, false)),
        ("floor", func("floor", Kernel::Unary(k_floor), 0, false, false)),
        ("ceil", func("ceil", Kernel::Unary(k_ceil), 0, false, false)),
        ("round", func("round", Kernel::Unary(|x| Ok(x.round())), 0, false, false)),
        ("ln", func("ln", Kernel::Unary(k_ln), 0, false, false)),
        ("log10", func("log10", Kernel::Unary(k_log10), 0, false, false)),
        ("exp", func("exp", Kernel::Unary(k_exp), 0, false, false)),
        ("atan2", func("atan2", Kernel::Binary(k_atan2), 0, false, false)),
        ("pow", func("pow", Kernel::Binary(k_pow), 0, false, false)),
        ("min", func("min", Kernel::Binary(k_min), 0, false, false)),
        ("max", func("max", Kernel::Binary(k_max), 0, false, false)),
        ("if", func("if", Kernel::Ternary(k_if), 0, false, false)),
        ("rand", func("rand", Kernel::Nullary(k_rand), 0, false, true)),
        (
            "true",
            Rc::new(Word::BooleanConstant {
                name: "true".into(),
                value: 1.0,
            }),
        ),
        (
            "false",
            Rc::new(Word::BooleanConstant {
                name: "false".into(),
                value: 0.0,
            }),
        ),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_base_case_matches_tolerance() {
        assert_eq!(k_factorial(1.0).unwrap(), 1.0);
        assert_eq!(k_factorial(5.0).unwrap(), 120.0);
    }

    #[test]
    fn ge_tolerates_epsilon_below() {
        assert_eq!(k_ge(5.0 - 1e-31, 5.0).unwrap(), 1.0);
    }

    #[test]
    fn int_div_and_mod_round_operands_first() {
        assert_eq!(k_int_div(7.4, 2.0).unwrap(), 3.0);
        assert_eq!(k_int_mod(7.4, 2.0).unwrap(), 1.0);
    }

    #[test]
    fn div_by_zero_is_rejected() {
        assert!(k_div_real(1.0, 0.0).is_err());
        assert!(k_int_div(1.0, 0.0).is_err());
    }

    #[test]
    fn rand_is_marked_can_vary() {
        let words = builtin_words();
        let (_, rand_word) = words.iter().find(|(name, _)| *name == "rand").unwrap();
        assert!(rand_word.can_vary());
    }

    #[test]
    fn builtin_words_cover_full_precedence_table() {
        let words = builtin_words();
        for op in ["!", "^", "*", "+", "=", "not", "or"] {
            assert!(words.iter().any(|(name, _)| *name == op), "missing {op}");
        }
    }
}
