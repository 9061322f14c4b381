//! Shaping pass: rewrites the token stream in place before tree-building,
//! doing sign collapsing, `not not` collapsing, adjacency validation, and
//! integer-power promotion, then a second pass fusing string-vs-string
//! comparisons into a single `LogicalStringOper` word.

use crate::dictionary::Dictionary;
use crate::error::CompileError;
use crate::word::Word;
use std::rc::Rc;

/// Comparison operator names eligible for string-compare fusion. `in` is
/// included deliberately and routed exclusively through this string path,
/// rather than reusing the numeric-equality kernel.
const COMPARISON_NAMES: &[&str] = &["=", "<>", "<", ">", "<=", ">=", "in"];

/// Operand-like words: constants and variables, as opposed to operators,
/// functions, and punctuation. Used by the adjacency checks.
fn is_value(word: &Word) -> bool {
    matches!(
        word,
        Word::DoubleConstant { .. }
            | Word::StringConstant { .. }
            | Word::BooleanConstant { .. }
            | Word::DoubleVariable { .. }
            | Word::StringVariable { .. }
            | Word::GeneratedVariable { .. }
    )
}

fn is_context_start(prev: Option<&Rc<Word>>) -> bool {
    match prev {
        None => true,
        Some(word) => matches!(**word, Word::LeftBracket | Word::Comma) || word.is_operator(),
    }
}

pub fn shape(tokens: Vec<Rc<Word>>, dict: &Dictionary) -> Result<Vec<Rc<Word>>, CompileError> {
    let collapsed = collapse_signs_and_nots(tokens, dict)?;
    let promoted = promote_integer_powers(collapsed, dict)?;
    check_adjacency(&promoted)?;
    let fused = fuse_string_comparisons(promoted);
    reject_bare_strings(&fused)?;
    Ok(fused)
}

/// Sign collapsing and double-`not` collapsing share the same "preceding
/// context" rule, so one forward pass handles both.
fn collapse_signs_and_nots(
    tokens: Vec<Rc<Word>>,
    dict: &Dictionary,
) -> Result<Vec<Rc<Word>>, CompileError> {
    let mut out: Vec<Rc<Word>> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let name = tokens[i].name();
        if (name == "+" || name == "-") && is_context_start(out.last()) {
            let mut sign = 1i32;
            let mut j = i;
            while j < tokens.len() && (tokens[j].name() == "+" || tokens[j].name() == "-") {
                if tokens[j].name() == "-" {
                    sign = -sign;
                }
                j += 1;
            }
            let unary_name = if sign < 0 { "-@" } else { "+@" };
            out.push(
                dict.search(unary_name)
                    .expect("builtin unary sign operator is always registered"),
            );
            i = j;
            continue;
        }
        if name == "not" && is_context_start(out.last()) {
            let mut count = 0usize;
            let mut j = i;
            while j < tokens.len() && tokens[j].name() == "not" {
                count += 1;
                j += 1;
            }
            if count % 2 != 0 {
                out.push(tokens[i].clone());
            }
            i = j;
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    Ok(out)
}

/// `^` with a decimal-point-free numeric constant on its right is rewritten
/// to the cheaper integer-power operator `^@`.
fn promote_integer_powers(
    tokens: Vec<Rc<Word>>,
    dict: &Dictionary,
) -> Result<Vec<Rc<Word>>, CompileError> {
    let mut out: Vec<Rc<Word>> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].name() == "^" {
            if let Some(next) = tokens.get(i + 1) {
                if let Word::DoubleConstant { name, .. } = &**next {
                    if !name.contains('.') && !name.contains('e') {
                        out.push(
                            dict.search("^@")
                                .expect("builtin integer-power operator is always registered"),
                        );
                        i += 1;
                        continue;
                    }
                }
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    Ok(out)
}

fn check_adjacency(tokens: &[Rc<Word>]) -> Result<(), CompileError> {
    for window in tokens.windows(2) {
        let (a, b) = (&*window[0], &*window[1]);
        if is_value(a) && is_value(b) {
            return Err(CompileError::Syntax(format!(
                "missing operator between '{}' and '{}'",
                a.name(),
                b.name()
            )));
        }
        if matches!(a, Word::GeneratedVariable { .. }) && matches!(b, Word::LeftBracket) {
            return Err(CompileError::Syntax(format!(
                "unknown function '{}'",
                a.name()
            )));
        }
        if is_value(a) && matches!(b, Word::LeftBracket) {
            return Err(CompileError::Syntax(format!(
                "'{}' cannot be called like a function",
                a.name()
            )));
        }
        if matches!(a, Word::LeftBracket) && matches!(b, Word::RightBracket) {
            return Err(CompileError::Syntax("empty argument list '()'".into()));
        }
        if matches!(a, Word::RightBracket) && matches!(b, Word::LeftBracket) {
            return Err(CompileError::Syntax(
                "missing operand between ) and (".into(),
            ));
        }
        if matches!(a, Word::RightBracket) && is_value(b) {
            return Err(CompileError::Syntax(format!(
                "missing operand between ) and {}",
                b.name()
            )));
        }
    }
    Ok(())
}

/// A `StringConstant`/`StringVariable` that survives fusion was never part
/// of a string comparison (a bare string, or one used with a non-comparison
/// operator like `+`). Such a word has no numeric meaning and must not
/// reach the tree builder.
fn reject_bare_strings(tokens: &[Rc<Word>]) -> Result<(), CompileError> {
    for token in tokens {
        if token.is_string_typed() {
            return Err(CompileError::Syntax(format!(
                "'{}' is a string and can only appear in a string comparison",
                token.name()
            )));
        }
    }
    Ok(())
}

fn fuse_string_comparisons(tokens: Vec<Rc<Word>>) -> Vec<Rc<Word>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 2 < tokens.len() {
            let left = &tokens[i];
            let op = &tokens[i + 1];
            let right = &tokens[i + 2];
            if left.is_string_typed()
                && right.is_string_typed()
                && COMPARISON_NAMES.contains(&op.name())
            {
                let fused = Rc::new(Word::LogicalStringOper {
                    name: format!("{}{}{}", left.name(), op.name(), right.name()),
                    op_name: op.name().to_string(),
                    left: left.clone(),
                    right: right.clone(),
                });
                out.push(fused);
                i += 3;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}
