//! End-to-end scenarios run through the public façade, the way a consumer
//! of the crate would.

use exprcalc::{new_double_cell, ExpressionTable, ParserConfig};

#[test]
fn folds_constant_half_of_a_product() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(3.0)).unwrap();
    assert_eq!(table.evaluate("4*4*x").unwrap(), 48.0);
}

#[test]
fn folds_ln_of_a_constant() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(2.0)).unwrap();
    let result = table.evaluate("ln(5)+3*x").unwrap();
    assert!((result - 7.6094379124341).abs() < 1e-10);
}

#[test]
fn parenthesized_operands_evaluate_left_to_right() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(4.0)).unwrap();
    assert_eq!(table.evaluate("(x+1)*(24-3)").unwrap(), 105.0);
}

#[test]
fn if_selects_the_matching_branch() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(-7.0)).unwrap();
    assert_eq!(table.evaluate("if(x>0, x, -x)").unwrap(), 7.0);
}

#[test]
fn string_in_tests_comma_list_membership() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert_eq!(
        table.evaluate("'a' in 'dasad,sdsd,a,sds'").unwrap(),
        1.0
    );
}

#[test]
fn hex_literal_plus_one() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert_eq!(table.evaluate("$FF + 1").unwrap(), 256.0);
}

#[test]
fn factorial_of_five() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert_eq!(table.evaluate("5!").unwrap(), 120.0);
}

#[test]
fn missing_operator_between_parens_is_a_syntax_error() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(4.0)).unwrap();
    assert!(table.evaluate("(x+1)(24-3)").is_err());
}

#[test]
fn double_not_collapses_to_no_op() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(1.0)).unwrap();
    assert_eq!(table.evaluate("not not x").unwrap(), 1.0);
}

#[test]
fn shared_variable_observed_across_two_compiled_expressions() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(5.0)).unwrap();
    assert_eq!(table.evaluate("y := x*2").unwrap(), 10.0);
    assert_eq!(table.evaluate("y+1").unwrap(), 11.0);
}

#[test]
fn sign_collapsing_tracks_parity_of_dash_runs() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    table.define_variable("x", new_double_cell(3.0)).unwrap();
    assert_eq!(table.evaluate("--x").unwrap(), 3.0);
    assert_eq!(table.evaluate("---x").unwrap(), -3.0);
    assert_eq!(table.evaluate("----x").unwrap(), 3.0);
}

#[test]
fn case_insensitive_function_names() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert_eq!(table.evaluate("SIN(0)").unwrap(), table.evaluate("sin(0)").unwrap());
}

#[test]
fn string_equality_is_case_insensitive() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert_eq!(table.evaluate("'A'='a'").unwrap(), 1.0);
}

#[test]
fn repeat_compiles_of_the_same_text_hit_the_cache() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    let first = table.add_expression("1+1").unwrap();
    table.add_expression("9*9").unwrap();
    let repeat = table.add_expression("1+1").unwrap();
    assert_eq!(first, repeat);
}

#[test]
fn variable_mutation_is_observed_without_recompiling() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    let cell = new_double_cell(1.0);
    table.define_variable("x", cell.clone()).unwrap();
    table.add_expression("x*x").unwrap();
    assert_eq!(table.evaluate_current().unwrap(), 1.0);
    cell.set(4.0);
    assert_eq!(table.evaluate_current().unwrap(), 16.0);
}

#[test]
fn empty_expression_is_a_nan_sentinel_not_an_error() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert!(table.evaluate("").unwrap().is_nan());
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    assert!(table.evaluate("1/0").is_err());
}

#[test]
fn as_boolean_reads_a_comparison_result() {
    let mut table = ExpressionTable::new(ParserConfig::default());
    let index = table.add_expression("3>2").unwrap();
    table.evaluate_current().unwrap();
    assert!(table.as_boolean(index).unwrap());
}
