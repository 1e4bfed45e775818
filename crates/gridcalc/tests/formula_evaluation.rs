//! Tests for formula evaluation with cell references

use gridcalc::prelude::*;
use gridcalc::{CellKey, ComparisonOperator, FormulaValue};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn sheet_with(cells: &[(&str, &str)]) -> Workbook {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    for (address, content) in cells {
        if content.starts_with('=') {
            sheet.set_cell_formula(address, content).unwrap();
        } else if let Ok(n) = content.parse::<f64>() {
            sheet.set_cell_value(address, n).unwrap();
        } else {
            sheet.set_cell_value(address, *content).unwrap();
        }
    }
    wb
}

/// A2 = 5, A1 = A2+1
#[test]
fn test_formula_chain_populates_cache() {
    let wb = sheet_with(&[("A2", "5"), ("A1", "=A2+1")]);
    let mut evaluator = FormulaEvaluator::new();

    assert_eq!(
        evaluator.evaluate(&wb, 0, 0, 0).unwrap(),
        Some(CalculatedValue::Numeric(6.0))
    );
    assert_eq!(
        evaluator.cache().get(&CellKey::new(0, 1, 0)),
        Some(&FormulaValue::Number(5.0))
    );
}

#[test]
fn test_evaluate_with_cell_references() {
    let wb = sheet_with(&[
        ("A1", "10"),
        ("A2", "20"),
        ("A3", "30"),
        ("B1", "5"),
        ("C1", "=SUM(A1:A3)"),
        ("C2", "=AVERAGE(A1:A3)*B1"),
        ("C3", "=IF(C1>50,\"big\",\"small\")"),
        ("C4", "=MAX(A1:A3)-MIN(A1:A3)"),
    ]);
    let mut evaluator = FormulaEvaluator::new();
    let at = |e: &mut FormulaEvaluator, row| e.evaluate(&wb, 0, row, 2).unwrap();

    assert_eq!(at(&mut evaluator, 0), Some(CalculatedValue::Numeric(60.0)));
    assert_eq!(at(&mut evaluator, 1), Some(CalculatedValue::Numeric(100.0)));
    assert_eq!(at(&mut evaluator, 2), Some(CalculatedValue::Text("big".into())));
    assert_eq!(at(&mut evaluator, 3), Some(CalculatedValue::Numeric(20.0)));
}

#[test]
fn test_blank_semantics() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.create_cell(0, 0).unwrap();

    let cell = sheet.cell("A1").unwrap().unwrap();
    assert_eq!(cell.cell_type(), CellType::Blank);
    assert_eq!(cell.numeric_value().unwrap(), 0.0);
    assert_eq!(cell.text_value().unwrap(), "");
    assert!(!cell.boolean_value().unwrap());

    let mut evaluator = FormulaEvaluator::new();
    assert_eq!(evaluator.evaluate(&wb, 0, 0, 0).unwrap(), None);
    assert_eq!(evaluator.evaluate(&wb, 0, 100, 3).unwrap(), None);
}

#[test]
fn test_evaluate_in_cell_gives_plain_numeric() {
    let mut wb = sheet_with(&[("A1", "2"), ("B1", "=A1*21")]);
    let mut evaluator = FormulaEvaluator::new();

    let cell = evaluator.evaluate_in_cell(&mut wb, 0, 0, 1).unwrap().unwrap();
    assert_eq!(cell.cell_type(), CellType::Numeric);
    assert_eq!(cell.numeric_value().unwrap(), 42.0);
    assert!(matches!(cell.formula_tokens(), Err(Error::TypeMismatch { .. })));
    assert_eq!(wb.worksheet(0).unwrap().cell_formula("B1").unwrap(), None);
}

#[test]
fn test_division_by_zero_is_a_value() {
    let mut wb = sheet_with(&[("A1", "10"), ("B1", "=A1/0")]);
    let mut evaluator = FormulaEvaluator::new();

    assert_eq!(
        evaluator.evaluate(&wb, 0, 0, 1).unwrap(),
        Some(CalculatedValue::Error(CellError::Div0))
    );
    assert_eq!(
        evaluator.evaluate_formula_cell(&mut wb, 0, 0, 1).unwrap(),
        Some(CellType::Error)
    );
    let cell = wb.worksheet(0).unwrap().cell("B1").unwrap().unwrap();
    assert_eq!(cell.error_value().unwrap(), Some(CellError::Div0));
    assert_eq!(cell.error_value().unwrap().map(|e| e.to_string()).as_deref(), Some("#DIV/0!"));
}

#[test]
fn test_explicit_list_on_non_list_constraint() {
    let mut constraint = DvConstraint::numeric(
        ValidationType::Integer,
        ComparisonOperator::Between,
        "1",
        Some("10".to_string()),
    )
    .unwrap();
    let err = constraint
        .set_explicit_list_values(vec!["a".to_string()])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[test]
fn test_circular_reference() {
    let wb = sheet_with(&[("A1", "=B1"), ("B1", "=A1")]);
    let mut evaluator = FormulaEvaluator::new();

    let err = evaluator.evaluate(&wb, 0, 0, 0).unwrap_err();
    assert!(matches!(err, FormulaError::CircularReference(_)));
}

#[test]
fn test_mutation_invalidates_cache() {
    let mut wb = sheet_with(&[("A2", "5"), ("A1", "=A2+1")]);
    let mut evaluator = FormulaEvaluator::new();
    assert_eq!(
        evaluator.evaluate(&wb, 0, 0, 0).unwrap(),
        Some(CalculatedValue::Numeric(6.0))
    );

    // No hook called: the workbook generation alone drops the stale values
    wb.worksheet_mut(0).unwrap().set_cell_value("A2", 41.0).unwrap();
    assert_eq!(
        evaluator.evaluate(&wb, 0, 0, 0).unwrap(),
        Some(CalculatedValue::Numeric(42.0))
    );

    // Renaming a sheet changes what cross-sheet references resolve to
    wb.add_worksheet_with_name("Other").unwrap();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_formula("B1", "=Other!A1+1")
        .unwrap();
    assert_eq!(
        evaluator.evaluate(&wb, 0, 0, 1).unwrap(),
        Some(CalculatedValue::Numeric(1.0))
    );
    wb.rename_worksheet(1, "Renamed").unwrap();
    assert_eq!(
        evaluator.evaluate(&wb, 0, 0, 1).unwrap(),
        Some(CalculatedValue::Error(CellError::Ref))
    );
}

#[test]
fn test_calculate_whole_workbook() {
    let mut wb = sheet_with(&[
        ("A1", "3"),
        ("A2", "=A1*A1"),
        ("A3", "=A2&\" squared\""),
        ("A4", "=NOT(ISBLANK(Z99))"),
    ]);

    let stats = wb.calculate().unwrap();
    assert_eq!(
        stats,
        EvaluationStats {
            formula_count: 3,
            cells_evaluated: 3,
            error_values: 0,
            failures: 0,
        }
    );

    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(sheet.cell("A2").unwrap().unwrap().numeric_value().unwrap(), 9.0);
    assert_eq!(sheet.cell("A3").unwrap().unwrap().text_value().unwrap(), "9 squared");
    assert!(!sheet.cell("A4").unwrap().unwrap().boolean_value().unwrap());
    assert_eq!(sheet.cell_formula("A3").unwrap().as_deref(), Some("A2&\" squared\""));
}

#[test]
fn test_compile_then_render_normalizes() {
    for (input, rendered) in [
        ("=1 + 2*3", "1+2*3"),
        ("=sum(a1:b2 , 'My Data'!$C$1)", "SUM(A1:B2,'My Data'!$C$1)"),
        ("=-(A1%)", "-(A1%)"),
        ("=\"a\"\"b\"&TRUE", "\"a\"\"b\"&TRUE"),
    ] {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_formula("A1", input).unwrap();
        assert_eq!(sheet.cell_formula("A1").unwrap().as_deref(), Some(rendered), "{}", input);
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn evaluation_is_deterministic(values in prop::collection::vec(-1000i32..1000, 1..10)) {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        for (row, v) in values.iter().enumerate() {
            sheet.set_cell_value_at(row as u32, 0, *v).unwrap();
        }
        sheet.set_cell_formula("B1", &format!("=SUM(A1:A{})/COUNT(A1:A{})", values.len(), values.len())).unwrap();

        let mut evaluator = FormulaEvaluator::new();
        let first = evaluator.evaluate(&wb, 0, 0, 1).unwrap();
        evaluator.clear_all_cached_result_values();
        let second = evaluator.evaluate(&wb, 0, 0, 1).unwrap();
        prop_assert_eq!(&first, &second);

        let expected = values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64;
        prop_assert_eq!(first, Some(CalculatedValue::Numeric(expected)));
    }
}
