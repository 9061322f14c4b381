//! A small expression compiler and evaluator: parse an arithmetic/boolean/
//! string expression once, linearize it into a flat sequence of numeric
//! operations, and re-run that sequence cheaply whenever its variables
//! change.
//!
//! # Overview
//!
//! The pipeline is five stages, each its own module: [`lexer`] turns source
//! text into a flat token list against a [`dictionary::Dictionary`] of
//! known words, [`shaper`] rewrites ambiguous runs (repeated signs, `not
//! not`, string comparisons) before structure is imposed, [`tree`] builds
//! an operator-precedence expression tree, [`fold`] collapses constant
//! subtrees, and [`program`] flattens the result into a [`program::Program`]
//! that [`registry::ExpressionTable`] can run directly.
//!
//! Callers only need [`ExpressionTable`]:
//!
//! ```
//! use exprcalc::{ExpressionTable, ParserConfig};
//!
//! let mut table = ExpressionTable::new(ParserConfig::default());
//! assert_eq!(table.evaluate("1 + 2 * 3").unwrap(), 7.0);
//! ```
//!
//! # License
//! Provided under the MIT license.

mod builtins;
mod cache;
mod config;
mod dictionary;
mod error;
mod fold;
mod lexer;
mod program;
mod registry;
mod shaper;
mod tree;
mod util;
mod word;

pub use config::ParserConfig;
pub use error::{CompileError, Error, EvalError, MathError};
pub use registry::ExpressionTable;
pub use util::Log;
pub use word::{new_double_cell, new_string_cell, DoubleCell, Kernel, StringCell, Word};
