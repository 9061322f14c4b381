//! Constant folding: collapses any subtree whose leaves are all constants
//! into a single freshly synthesized constant leaf, run once through the
//! same linearizer/evaluator the final program uses.

use crate::error::Error;
use crate::program::linearize;
use crate::tree::TreeNode;
use crate::word::Word;
use std::rc::Rc;

/// `can_vary(node) = node.word.can_vary() || any(can_vary(child))`,
/// evaluated over an already-folded subtree.
fn subtree_can_vary(node: &TreeNode) -> bool {
    node.word.can_vary() || node.children.iter().any(subtree_can_vary)
}

pub fn fold_constants(tree: TreeNode) -> Result<TreeNode, Error> {
    fold(tree)
}

fn fold(node: TreeNode) -> Result<TreeNode, Error> {
    let TreeNode { word, children } = node;
    let mut folded_children = Vec::with_capacity(children.len());
    for child in children {
        folded_children.push(fold(child)?);
    }

    // Leaves (including variables and already-atomic words like
    // `LogicalStringOper`) have nothing left to fold; a node that still
    // varies, likewise, is left as-is.
    if folded_children.is_empty()
        || word.is_variable()
        || word.can_vary()
        || folded_children.iter().any(subtree_can_vary)
    {
        return Ok(TreeNode {
            word,
            children: folded_children,
        });
    }

    let candidate = TreeNode {
        word,
        children: folded_children,
    };
    let (program, result_cell) = linearize(&candidate);
    program.run()?;
    let value = result_cell.get();
    let is_boolean = program.is_boolean();

    let folded_word: Rc<Word> = if is_boolean {
        Rc::new(Word::BooleanConstant {
            name: value.to_string(),
            value,
        })
    } else {
        Rc::new(Word::DoubleConstant {
            name: value.to_string(),
            value,
        })
    };

    Ok(TreeNode {
        word: folded_word,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::builtin_words;
    use crate::config::ParserConfig;
    use crate::dictionary::Dictionary;
    use crate::lexer::tokenize;
    use crate::shaper::shape;
    use crate::tree::build_tree;
    use crate::word::new_double_cell;

    fn dict() -> Dictionary {
        let mut dict = Dictionary::new();
        for (name, word) in builtin_words() {
            dict.add(name, word);
        }
        dict
    }

    fn build(source: &str, dict: &mut Dictionary) -> TreeNode {
        let config = ParserConfig::default();
        let tokens = tokenize(source, &config, dict).unwrap();
        let shaped = shape(tokens, dict).unwrap();
        build_tree(&shaped).unwrap()
    }

    #[test]
    fn pure_constant_subtree_folds_to_one_leaf() {
        let mut dict = dict();
        dict.add(
            "x",
            Rc::new(Word::DoubleVariable {
                name: "x".into(),
                cell: new_double_cell(3.0),
            }),
        );
        let tree = build("4*4*x", &mut dict);
        let folded = fold_constants(tree).unwrap();
        // Root stays `*`, but its left child (`4*4`) is now a single leaf.
        assert_eq!(folded.word.name(), "*");
        assert_eq!(folded.children[0].children.len(), 0);
        assert_eq!(folded.children[0].word.double_value(), Some(16.0));
    }

    #[test]
    fn variable_containing_subtree_is_not_folded() {
        let mut dict = dict();
        dict.add(
            "x",
            Rc::new(Word::DoubleVariable {
                name: "x".into(),
                cell: new_double_cell(2.0),
            }),
        );
        let tree = build("3*x", &mut dict);
        let folded = fold_constants(tree).unwrap();
        assert_eq!(folded.word.name(), "*");
        assert_eq!(folded.children.len(), 2);
    }

    #[test]
    fn boolean_typed_fold_preserves_boolean_constant() {
        let mut dict = dict();
        let tree = build("1=1", &mut dict);
        let folded = fold_constants(tree).unwrap();
        assert!(matches!(*folded.word, Word::BooleanConstant { .. }));
    }

    #[test]
    fn division_by_zero_during_folding_is_an_error() {
        let mut dict = dict();
        let tree = build("1/0", &mut dict);
        assert!(fold_constants(tree).is_err());
    }
}
