//! The public façade: compile cache, expression indexing by text,
//! variable/function registration, result formatting. This is the one
//! type most callers touch; everything else in the crate is a
//! collaborator it drives.

use crate::builtins::{builtin_words, precedence};
use crate::cache::CompileCache;
use crate::config::ParserConfig;
use crate::dictionary::Dictionary;
use crate::error::{CompileError, EvalError, Error};
use crate::fold::fold_constants;
use crate::lexer::tokenize;
use crate::program::{linearize, Program};
use crate::shaper::shape;
use crate::tree::build_tree;
use crate::util::Log;
use crate::word::{new_double_cell, DoubleCell, FunctionSpec, Kernel, StringCell, Word};
use std::rc::Rc;

struct CompiledExpression {
    #[allow(dead_code)] // kept for parity with the cache key / debugging
    source: String,
    program: Program,
    result_cell: DoubleCell,
}

/// The compile-and-evaluate surface. Owns the word dictionary, the
/// compile cache, and every compiled program.
pub struct ExpressionTable {
    dict: Dictionary,
    config: ParserConfig,
    cache: CompileCache,
    expressions: Vec<CompiledExpression>,
    current: Option<usize>,
    log: Log<&'static str>,
}

impl ExpressionTable {
    pub fn new(config: ParserConfig) -> Self {
        let mut dict = Dictionary::new();
        for (name, word) in builtin_words() {
            dict.add(name, word);
        }
        Self {
            dict,
            config,
            cache: CompileCache::new(),
            expressions: Vec::new(),
            current: None,
            log: Log::None,
        }
    }

    /// The C-style variant: same pipeline, different operator spellings.
    /// Built by renaming builtins in place before any expression is
    /// compiled, so no program ever needs patching.
    pub fn new_c_style(config: ParserConfig) -> Result<Self, Error> {
        let mut table = Self::new(config);
        // Free "=" and "!" from their default meanings before reassigning
        // them, so later renames don't clobber an entry still in use.
        table.rename_builtin("=", "==", true, precedence::COMPARISON)?;
        table.rename_builtin(":=", "=", true, precedence::ASSIGN)?;
        table.rename_builtin("<>", "!=", true, precedence::COMPARISON)?;
        table.rename_builtin("!", "fact", false, 0)?;
        table.rename_builtin("%", "perc", false, 0)?;
        table.rename_builtin("mod", "%", true, precedence::MUL_DIV)?;
        table.rename_builtin("div", "div", false, 0)?;
        table.rename_builtin("or", "||", true, precedence::OR_AND_XOR)?;
        // `&&` binds to the `and` kernel, not `or`.
        table.rename_builtin("and", "&&", true, precedence::OR_AND_XOR)?;
        table.rename_builtin("not", "!", true, precedence::NOT)?;
        Ok(table)
    }

    fn rename_builtin(
        &mut self,
        old_name: &str,
        new_name: &str,
        is_operator: bool,
        op_precedence: u16,
    ) -> Result<(), Error> {
        let old = self.dict.search(old_name).ok_or_else(|| {
            Error::Compile(CompileError::Syntax(format!(
                "no builtin named '{}' to rename",
                old_name
            )))
        })?;
        let (kernel, can_vary) = match &*old {
            Word::Function { spec, .. } | Word::BooleanFunction { spec, .. } => {
                (spec.kernel, spec.can_vary)
            }
            _ => {
                return Err(Error::Compile(CompileError::Syntax(format!(
                    "'{}' is not a function or operator",
                    old_name
                ))))
            }
        };
        let spec = FunctionSpec {
            kernel,
            precedence: op_precedence,
            is_operator,
            can_vary,
        };
        let renamed = if matches!(*old, Word::BooleanFunction { .. }) {
            Rc::new(Word::BooleanFunction {
                name: new_name.to_string(),
                spec,
            })
        } else {
            Rc::new(Word::Function {
                name: new_name.to_string(),
                spec,
            })
        };
        if old_name != new_name {
            self.dict.remove(old_name);
        }
        self.dict.add(new_name, renamed);
        Ok(())
    }

    pub fn set_log(&mut self, log: Log<&'static str>) {
        self.log = log;
    }

    /// Register (or replace) an externally-owned numeric variable. The
    /// caller keeps its own clone of `cell` and mutates it with `.set()`;
    /// every compiled program that reads the variable observes the new
    /// value on its next `evaluate`, without recompiling.
    pub fn define_variable(&mut self, name: &str, cell: DoubleCell) -> Result<(), Error> {
        let key = name.to_lowercase();
        let new_word = Rc::new(Word::DoubleVariable {
            name: key.clone(),
            cell,
        });
        self.replace_word(&key, new_word)
    }

    pub fn define_string_variable(&mut self, name: &str, cell: StringCell) -> Result<(), Error> {
        let key = name.to_lowercase();
        let new_word = Rc::new(Word::StringVariable {
            name: key.clone(),
            cell,
        });
        self.replace_word(&key, new_word)
    }

    pub fn define_function(&mut self, name: &str, kernel: Kernel) -> Result<(), Error> {
        let key = name.to_lowercase();
        let new_word = Rc::new(Word::Function {
            name: key.clone(),
            spec: FunctionSpec {
                kernel,
                precedence: 0,
                is_operator: false,
                can_vary: false,
            },
        });
        self.replace_word(&key, new_word)
    }

    /// Equivalent to `define_function`, but takes a fully preconstructed
    /// word (lets a caller register an operator, a boolean-typed
    /// function, or a nondeterministic one).
    pub fn replace_function(&mut self, old_name: &str, new_word: Rc<Word>) -> Result<(), Error> {
        self.replace_word(&old_name.to_lowercase(), new_word)
    }

    fn replace_word(&mut self, key: &str, new_word: Rc<Word>) -> Result<(), Error> {
        if let Some(old_word) = self.dict.search(key) {
            Dictionary::check_replacement_arity(&old_word, &new_word)?;
            patch_programs(&mut self.expressions, &old_word, &new_word);
        }
        self.dict.add(key, new_word);
        Ok(())
    }

    /// Compile `text` (or return its cached index) and make it current.
    pub fn add_expression(&mut self, text: &str) -> Result<usize, Error> {
        if let Some(index) = self.cache.get(text) {
            self.current = Some(index);
            return Ok(index);
        }

        self.log.trace(Log::Default(()), "registry", format!("compiling '{}'", text));

        let entry = if text.trim().is_empty() {
            // Empty input is a sentinel NaN, not an error.
            CompiledExpression {
                source: text.to_string(),
                program: Program { nodes: Vec::new() },
                result_cell: new_double_cell(f64::NAN),
            }
        } else {
            let tokens = tokenize(text, &self.config, &mut self.dict)?;
            let shaped = shape(tokens, &self.dict)?;
            let tree = build_tree(&shaped)?;
            let folded = fold_constants(tree)?;
            let (program, result_cell) = linearize(&folded);
            CompiledExpression {
                source: text.to_string(),
                program,
                result_cell,
            }
        };

        let index = self.expressions.len();
        self.expressions.push(entry);
        self.cache.insert(text.to_string(), index);
        self.current = Some(index);
        Ok(index)
    }

    pub fn evaluate(&mut self, text: &str) -> Result<f64, Error> {
        let index = self.add_expression(text)?;
        self.evaluate_index(index)
    }

    pub fn evaluate_current(&mut self) -> Result<f64, Error> {
        let index = self.current_index()?;
        self.evaluate_index(index)
    }

    fn evaluate_index(&mut self, index: usize) -> Result<f64, Error> {
        let entry = &self.expressions[index];
        entry.program.run()?;
        Ok(entry.result_cell.get())
    }

    pub fn result(&self, index: usize) -> Result<f64, Error> {
        self.entry(index).map(|entry| entry.result_cell.get())
    }

    pub fn as_string(&self, index: usize) -> Result<String, Error> {
        let entry = self.entry(index)?;
        if entry.program.is_boolean() {
            Ok(if entry.result_cell.get() != 0.0 {
                "True".to_string()
            } else {
                "False".to_string()
            })
        } else {
            Ok(entry.result_cell.get().to_string())
        }
    }

    pub fn as_boolean(&self, index: usize) -> Result<bool, Error> {
        let entry = self.entry(index)?;
        if !entry.program.is_boolean() {
            return Err(Error::Eval(EvalError::not_boolean()));
        }
        Ok(entry.result_cell.get() != 0.0)
    }

    pub fn as_hex(&self, index: usize) -> Result<String, Error> {
        let entry = self.entry(index)?;
        Ok(format!("{:X}", entry.result_cell.get().round() as i64))
    }

    /// Every `GeneratedVariable` currently in the dictionary: identifiers
    /// the expressions introduced rather than ones the caller declared.
    pub fn get_generated_vars(&self) -> Vec<String> {
        self.dict.generated_variable_names()
    }

    pub fn clear_expressions(&mut self) {
        self.expressions.clear();
        self.cache.clear();
        self.current = None;
    }

    /// Pretty-print `text`'s parse tree (post-shaping, pre-folding) to
    /// stdout. A debugging aid only; gated behind the `debug-tree` feature.
    #[cfg(feature = "debug-tree")]
    pub fn print_tree(&mut self, text: &str) -> Result<(), Error> {
        let tokens = tokenize(text, &self.config, &mut self.dict)?;
        let shaped = shape(tokens, &self.dict)?;
        let tree = build_tree(&shaped)?;
        tree.print().map_err(|e| {
            Error::Compile(CompileError::Syntax(format!("failed to print tree: {}", e)))
        })
    }

    fn current_index(&self) -> Result<usize, Error> {
        self.current.ok_or_else(|| {
            Error::Compile(CompileError::Syntax("no current expression".into()))
        })
    }

    fn entry(&self, index: usize) -> Result<&CompiledExpression, Error> {
        self.expressions.get(index).ok_or_else(|| {
            Error::Compile(CompileError::Syntax(format!(
                "no compiled expression at index {}",
                index
            )))
        })
    }
}

/// `ReplaceExprWord`: for every compiled program, swap any node whose word
/// is `old` to `new`, and redirect any input slot that reads `old`'s
/// backing cell to `new`'s.
///
/// One known gap: a `LogicalStringOper` node captured `old` as its
/// embedded left/right operand at shaping time; replacing a
/// `StringVariable` does not reach into that snapshot (see DESIGN.md).
fn patch_programs(expressions: &mut [CompiledExpression], old: &Rc<Word>, new: &Rc<Word>) {
    let old_cell = old.double_cell();
    let new_cell = new.double_cell();

    for expr in expressions.iter_mut() {
        if let (Some(old_c), Some(new_c)) = (&old_cell, &new_cell) {
            if Rc::ptr_eq(&expr.result_cell, old_c) {
                expr.result_cell = new_c.clone();
            }
        }
        for node in expr.program.nodes.iter_mut() {
            if Rc::ptr_eq(&node.word, old) {
                node.word = new.clone();
            }
            if let (Some(old_c), Some(new_c)) = (&old_cell, &new_cell) {
                for slot in node.args.iter_mut() {
                    if Rc::ptr_eq(slot, old_c) {
                        *slot = new_c.clone();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::new_double_cell;

    #[test]
    fn repeat_compilation_hits_the_cache() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let first = table.add_expression("1+1").unwrap();
        table.add_expression("2+2").unwrap();
        let repeat = table.add_expression("1+1").unwrap();
        assert_eq!(first, repeat);
    }

    #[test]
    fn empty_expression_evaluates_to_nan() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let value = table.evaluate("").unwrap();
        assert!(value.is_nan());
    }

    #[test]
    fn variable_update_is_observed_without_recompiling() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let cell = new_double_cell(1.0);
        table.define_variable("x", cell.clone()).unwrap();
        table.add_expression("x*2").unwrap();
        assert_eq!(table.evaluate_current().unwrap(), 2.0);
        cell.set(5.0);
        assert_eq!(table.evaluate_current().unwrap(), 10.0);
    }

    #[test]
    fn scenario_if_branch_selects_on_sign() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let cell = new_double_cell(-7.0);
        table.define_variable("x", cell).unwrap();
        assert_eq!(table.evaluate("if(x>0, x, -x)").unwrap(), 7.0);
    }

    #[test]
    fn shared_variable_across_two_expressions() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let cell = new_double_cell(5.0);
        table.define_variable("x", cell).unwrap();
        assert_eq!(table.evaluate("y := x*2").unwrap(), 10.0);
        assert_eq!(table.evaluate("y+1").unwrap(), 11.0);
    }

    #[test]
    fn as_boolean_rejects_non_boolean_expression() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let index = table.add_expression("1+1").unwrap();
        assert!(table.as_boolean(index).is_err());
    }

    #[test]
    fn as_hex_renders_uppercase() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let index = table.add_expression("$ff + 1").unwrap();
        table.evaluate_current().unwrap();
        assert_eq!(table.as_hex(index).unwrap(), "100");
    }

    #[test]
    fn generated_variables_are_reported() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        table.add_expression("foo+bar").unwrap();
        let mut generated = table.get_generated_vars();
        generated.sort();
        assert_eq!(generated, vec!["bar".to_string(), "foo".to_string()]);
    }

    #[test]
    fn define_function_replacement_rejects_arity_mismatch() {
        let mut table = ExpressionTable::new(ParserConfig::default());
        let result = table.define_function("sin", Kernel::Binary(|a, b| Ok(a + b)));
        assert!(result.is_err());
    }

    #[test]
    fn c_style_parser_uses_double_equals_for_comparison() {
        let mut table = ExpressionTable::new_c_style(ParserConfig::default()).unwrap();
        assert_eq!(table.evaluate("1==1").unwrap(), 1.0);
    }

    #[test]
    fn c_style_parser_binds_double_ampersand_to_and() {
        let mut table = ExpressionTable::new_c_style(ParserConfig::default()).unwrap();
        // 2 && 1 == 2 AND 1 bitwise => 0, not the bitwise-or value (3).
        assert_eq!(table.evaluate("2&&1").unwrap(), 0.0);
    }
}
