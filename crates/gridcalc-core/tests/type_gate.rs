// Property tests for the cell type transition gate.
// PROPTEST_CASES overrides the case count.

use gridcalc_core::{Cell, CellError, CellType, CellValue, Token, Transition};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

#[derive(Debug, Clone)]
enum Op {
    SetType(CellType, bool),
    Numeric(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
    Formula(u16),
    Blank,
}

fn arb_cell_type() -> impl Strategy<Value = CellType> {
    prop::sample::select(CellType::ALL.to_vec())
}

fn arb_error() -> impl Strategy<Value = CellError> {
    prop::sample::select(vec![
        CellError::Null,
        CellError::Div0,
        CellError::Value,
        CellError::Ref,
        CellError::Name,
        CellError::Num,
        CellError::Na,
    ])
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_cell_type(), any::<bool>()).prop_map(|(t, p)| Op::SetType(t, p)),
        2 => (-1e6..1e6f64).prop_map(Op::Numeric),
        1 => r"-?[0-9]{1,4}".prop_map(Op::Text),
        1 => r"[a-zA-Z ]{0,8}".prop_map(Op::Text),
        1 => any::<bool>().prop_map(Op::Boolean),
        1 => arb_error().prop_map(Op::Error),
        1 => any::<u16>().prop_map(Op::Formula),
        1 => Just(Op::Blank),
    ]
}

fn apply(cell: &mut Cell, op: &Op) -> gridcalc_core::Result<Transition> {
    match op {
        Op::SetType(ty, preserve) => cell.set_cell_type(*ty, *preserve),
        Op::Numeric(n) => cell.set_numeric_value(*n),
        Op::Text(s) => cell.set_text_value(Some(s)),
        Op::Boolean(b) => cell.set_boolean_value(*b),
        Op::Error(e) => cell.set_error_value(*e),
        Op::Formula(n) => cell.set_formula_tokens(vec![Token::Int(*n)]),
        Op::Blank => cell.set_blank(),
    }
}

/// The accessor matching the cell's type always succeeds
fn assert_consistent(cell: &Cell) {
    match cell.cell_type() {
        CellType::Blank => {
            assert_eq!(cell.numeric_value().unwrap(), 0.0);
            assert_eq!(cell.text_value().unwrap(), "");
            assert!(!cell.boolean_value().unwrap());
        }
        CellType::Numeric => {
            cell.numeric_value().unwrap();
        }
        CellType::Text => {
            assert!(cell.rich_text_value().unwrap().is_some());
        }
        CellType::Boolean => {
            cell.boolean_value().unwrap();
        }
        CellType::Error => {
            assert!(cell.error_value().unwrap().is_some());
        }
        CellType::Formula => {
            cell.formula_tokens().unwrap();
            assert_ne!(cell.cached_formula_result_type().unwrap(), CellType::Formula);
        }
    }
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn type_gate_keeps_cell_consistent(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut cell = Cell::new(3, 2).unwrap();
        for op in &ops {
            let before = cell.clone();
            match apply(&mut cell, op) {
                Ok(t) => {
                    prop_assert_eq!(t.previous, before.cell_type());
                    prop_assert_eq!(t.current, cell.cell_type());
                    prop_assert_eq!(
                        t.formula_discarded,
                        before.cell_type() == CellType::Formula && cell.cell_type() != CellType::Formula
                    );
                }
                Err(_) => {
                    prop_assert_eq!(&cell, &before);
                }
            }
            assert_consistent(&cell);
            prop_assert_eq!((cell.row(), cell.col()), (3, 2));
        }
    }

    #[test]
    fn set_cell_type_lands_on_target(
        start in arb_op(),
        target in arb_cell_type(),
        preserve in any::<bool>(),
    ) {
        let mut cell = Cell::new(0, 0).unwrap();
        apply(&mut cell, &start).unwrap();
        let was_formula_without_result = cell.cell_type() == CellType::Formula
            && cell.cached_formula_result_type().unwrap() == CellType::Blank;

        if let Ok(t) = cell.set_cell_type(target, preserve) {
            if preserve && target == CellType::Text && was_formula_without_result {
                prop_assert_eq!(cell.cell_type(), CellType::Blank);
            } else {
                prop_assert_eq!(cell.cell_type(), target);
            }
            prop_assert_eq!(t.current, cell.cell_type());
        }
    }

    #[test]
    fn reentering_same_type_is_noop(op in arb_op(), preserve in any::<bool>()) {
        let mut cell = Cell::new(0, 0).unwrap();
        apply(&mut cell, &op).unwrap();
        let before = cell.clone();
        let t = cell.set_cell_type(before.cell_type(), preserve).unwrap();
        prop_assert!(!t.type_changed());
        prop_assert_eq!(cell, before);
    }

    #[test]
    fn numeric_text_converts_back(n in -100_000i64..100_000) {
        let mut cell = Cell::new(0, 0).unwrap();
        cell.set_numeric_value(n as f64).unwrap();
        cell.set_cell_type(CellType::Text, true).unwrap();
        prop_assert_eq!(cell.text_value().unwrap(), n.to_string());
        cell.set_cell_type(CellType::Numeric, true).unwrap();
        prop_assert_eq!(cell.value(), &CellValue::Numeric(n as f64));
    }
}
