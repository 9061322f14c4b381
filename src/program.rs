//! Linearizer and evaluator: flattens a `TreeNode` into a sequence of
//! `ExprRec`s in post-order (= evaluation) order, and walks that sequence
//! calling one kernel per node.
//!
//! The program is a flat `Vec<ExprRec>` built in post-order rather than a
//! linked list of nodes: index order already *is* evaluation order, so no
//! explicit next-pointer is needed for each node to be visited exactly
//! once; iterating the `Vec` does that for free.

use crate::error::MathError;
use crate::tree::TreeNode;
use crate::word::{new_double_cell, DoubleCell, Word};
use std::rc::Rc;

/// One node of the linear program: an input list, a scratch output cell,
/// and (implicitly, via `word`) the kernel to run.
pub struct ExprRec {
    pub word: Rc<Word>,
    pub args: Vec<DoubleCell>,
    pub res: DoubleCell,
}

impl ExprRec {
    /// Run this node's operation, reading `args` and writing `res`.
    fn eval(&self) -> Result<(), MathError> {
        match &*self.word {
            Word::DoubleConstant { value, .. } | Word::BooleanConstant { value, .. } => {
                self.res.set(*value);
            }
            Word::LogicalStringOper {
                op_name,
                left,
                right,
                ..
            } => {
                self.res.set(eval_string_comparison(op_name, left, right)?);
            }
            Word::Function { name, .. } if name == ":=" => {
                let value = self.args[1].get();
                self.args[0].set(value);
                self.res.set(value);
            }
            Word::Function { spec, .. } | Word::BooleanFunction { spec, .. } => {
                let values: Vec<f64> = self.args.iter().map(|cell| cell.get()).collect();
                self.res.set(spec.kernel.call(&values)?);
            }
            other => unreachable!("word {:?} cannot appear in a linear program", other),
        }
        Ok(())
    }
}

/// A "pseudo-compiled" program: every node but the last feeds some later
/// node's input; the last node's `res` is the whole expression's value.
pub struct Program {
    pub nodes: Vec<ExprRec>,
}

impl Program {
    /// Run every node in order, aborting on the first math error.
    pub fn run(&self) -> Result<(), MathError> {
        for node in &self.nodes {
            node.eval()?;
        }
        Ok(())
    }

    /// Whether the compiled expression's result should be interpreted as
    /// boolean: true when the program is non-empty and its last node's
    /// word is boolean-typed.
    pub fn is_boolean(&self) -> bool {
        self.nodes.last().is_some_and(|node| node.word.is_boolean())
    }
}

/// Flatten `tree` into a [`Program`] plus the cell holding the whole
/// expression's result. That cell is either the last node's `res`, or,
/// when the entire tree folded to a single variable, the variable's own
/// backing cell, with an empty `Program`.
pub fn linearize(tree: &TreeNode) -> (Program, DoubleCell) {
    let mut nodes = Vec::new();
    let result_cell = linearize_node(tree, &mut nodes);
    (Program { nodes }, result_cell)
}

fn linearize_node(node: &TreeNode, nodes: &mut Vec<ExprRec>) -> DoubleCell {
    if let Some(cell) = node.word.double_cell() {
        // Variable leaf: vanishes, its backing cell propagates to the
        // parent directly.
        return cell;
    }

    let args: Vec<DoubleCell> = node
        .children
        .iter()
        .map(|child| linearize_node(child, nodes))
        .collect();

    let res = match &*node.word {
        Word::DoubleConstant { value, .. } | Word::BooleanConstant { value, .. } => {
            new_double_cell(*value)
        }
        _ => new_double_cell(0.0),
    };

    nodes.push(ExprRec {
        word: node.word.clone(),
        args,
        res: res.clone(),
    });
    res
}

fn eval_string_comparison(op_name: &str, left: &Word, right: &Word) -> Result<f64, MathError> {
    let left_value = left
        .string_value()
        .ok_or_else(|| MathError::Domain("string comparison operand is not a string".into()))?;
    let right_value = right
        .string_value()
        .ok_or_else(|| MathError::Domain("string comparison operand is not a string".into()))?;

    let truthy = match op_name {
        "=" => left_value.eq_ignore_ascii_case(&right_value),
        "<>" => !left_value.eq_ignore_ascii_case(&right_value),
        "<" => left_value.to_lowercase() < right_value.to_lowercase(),
        ">" => left_value.to_lowercase() > right_value.to_lowercase(),
        "<=" => left_value.to_lowercase() <= right_value.to_lowercase(),
        ">=" => left_value.to_lowercase() >= right_value.to_lowercase(),
        // `x in y`: substring membership, comma-list or otherwise
        // (e.g. `'a' in 'dasad,sdsd,a,sds'` is true).
        "in" => right_value
            .to_lowercase()
            .split(',')
            .any(|part| part == left_value.to_lowercase()),
        _ => {
            return Err(MathError::Domain(format!(
                "'{}' is not a string comparison operator",
                op_name
            )))
        }
    };
    Ok(if truthy { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::builtin_words;
    use crate::config::ParserConfig;
    use crate::dictionary::Dictionary;
    use crate::fold::fold_constants;
    use crate::lexer::tokenize;
    use crate::shaper::shape;
    use crate::tree::build_tree;

    fn compile(source: &str, dict: &mut Dictionary) -> (Program, DoubleCell) {
        let config = ParserConfig::default();
        let tokens = tokenize(source, &config, dict).unwrap();
        let shaped = shape(tokens, dict).unwrap();
        let tree = build_tree(&shaped).unwrap();
        let folded = fold_constants(tree).unwrap();
        linearize(&folded)
    }

    fn dict() -> Dictionary {
        let mut dict = Dictionary::new();
        for (name, word) in builtin_words() {
            dict.add(name, word);
        }
        dict
    }

    #[test]
    fn folded_multiplication_runs_one_node() {
        let mut dict = dict();
        let x_cell = new_double_cell(3.0);
        dict.add(
            "x",
            Rc::new(Word::DoubleVariable {
                name: "x".into(),
                cell: x_cell.clone(),
            }),
        );
        let (program, result) = compile("4*4*x", &mut dict);
        program.run().unwrap();
        assert_eq!(result.get(), 48.0);
        let mul_nodes = program
            .nodes
            .iter()
            .filter(|n| n.word.name() == "*")
            .count();
        assert_eq!(mul_nodes, 1);
    }

    #[test]
    fn string_in_membership() {
        let mut dict = dict();
        let (program, result) = compile("'a' in 'dasad,sdsd,a,sds'", &mut dict);
        program.run().unwrap();
        assert_eq!(result.get(), 1.0);
    }

    #[test]
    fn assignment_writes_through_shared_cell() {
        let mut dict = dict();
        let x_cell = new_double_cell(5.0);
        dict.add(
            "x",
            Rc::new(Word::DoubleVariable {
                name: "x".into(),
                cell: x_cell.clone(),
            }),
        );
        let (program, _result) = compile("y:=x*2", &mut dict);
        program.run().unwrap();
        let y = dict.search("y").unwrap();
        assert_eq!(y.double_value(), Some(10.0));
    }
}
