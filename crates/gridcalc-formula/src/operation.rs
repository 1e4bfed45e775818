//! Operation dispatch table
//!
//! Maps each operator or function token to the operation that combines its
//! operands. Relational operators carry no per-token data and are shared
//! `static` instances; the rest are built per token.

use std::cmp::Ordering;

use gridcalc_core::{CellError, FunctionId, OperatorKind, Token};

use crate::error::{FormulaError, FormulaResult};
use crate::functions;
use crate::value::FormulaValue;

/// An operation applied to values popped from the evaluation stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Relational(&'static RelationalOperator),
    Arithmetic(ArithmeticOperator),
    Unary(UnaryOperator),
    Concat,
    Function(FunctionOperation),
}

impl Operation {
    /// Look up the operation for an operator or function token.
    ///
    /// Operand tokens have no operation. Unions, array constants, defined
    /// names and the range operator between non-references are not
    /// supported by the evaluator.
    pub fn for_token(token: &Token) -> FormulaResult<Operation> {
        match token {
            Token::Op(op) => Self::for_operator(*op),
            Token::Func { id, argc } => Ok(Operation::Function(FunctionOperation {
                id: *id,
                arg_count: *argc as usize,
            })),
            other => Err(FormulaError::UnsupportedToken(format!(
                "no operation for {} token",
                other.kind_name()
            ))),
        }
    }

    fn for_operator(op: OperatorKind) -> FormulaResult<Operation> {
        Ok(match op {
            OperatorKind::Eq => Operation::Relational(&EQUAL),
            OperatorKind::Ne => Operation::Relational(&NOT_EQUAL),
            OperatorKind::Lt => Operation::Relational(&LESS_THAN),
            OperatorKind::Le => Operation::Relational(&LESS_EQUAL),
            OperatorKind::Gt => Operation::Relational(&GREATER_THAN),
            OperatorKind::Ge => Operation::Relational(&GREATER_EQUAL),
            OperatorKind::Add => Operation::Arithmetic(ArithmeticOperator::Add),
            OperatorKind::Sub => Operation::Arithmetic(ArithmeticOperator::Subtract),
            OperatorKind::Mul => Operation::Arithmetic(ArithmeticOperator::Multiply),
            OperatorKind::Div => Operation::Arithmetic(ArithmeticOperator::Divide),
            OperatorKind::Power => Operation::Arithmetic(ArithmeticOperator::Power),
            OperatorKind::UnaryPlus => Operation::Unary(UnaryOperator::Plus),
            OperatorKind::UnaryMinus => Operation::Unary(UnaryOperator::Negate),
            OperatorKind::Percent => Operation::Unary(UnaryOperator::Percent),
            OperatorKind::Concat => Operation::Concat,
            OperatorKind::Range => {
                return Err(FormulaError::UnsupportedToken(
                    "range operator between non-reference operands".into(),
                ))
            }
        })
    }

    /// Number of operands consumed from the stack
    pub fn operand_count(&self) -> usize {
        match self {
            Operation::Unary(_) => 1,
            Operation::Function(f) => f.arg_count,
            Operation::Relational(_) | Operation::Arithmetic(_) | Operation::Concat => 2,
        }
    }

    /// Apply the operation to its operands, given left to right
    pub fn evaluate(&self, args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
        if args.len() != self.operand_count() {
            return Err(FormulaError::Evaluation(format!(
                "{:?} expects {} operands, got {}",
                self,
                self.operand_count(),
                args.len()
            )));
        }
        match self {
            Operation::Relational(op) => Ok(op.evaluate(&args[0], &args[1])),
            Operation::Arithmetic(op) => Ok(op.evaluate(&args[0], &args[1])),
            Operation::Unary(op) => Ok(op.evaluate(&args[0])),
            Operation::Concat => Ok(concat(&args[0], &args[1])),
            Operation::Function(f) => f.evaluate(args),
        }
    }
}

/// Comparison operator
#[derive(Debug)]
pub struct RelationalOperator {
    kind: OperatorKind,
    accepts: fn(Ordering) -> bool,
}

// Compared by kind; each kind has exactly one test
impl PartialEq for RelationalOperator {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for RelationalOperator {}

static EQUAL: RelationalOperator = RelationalOperator {
    kind: OperatorKind::Eq,
    accepts: Ordering::is_eq,
};
static NOT_EQUAL: RelationalOperator = RelationalOperator {
    kind: OperatorKind::Ne,
    accepts: Ordering::is_ne,
};
static LESS_THAN: RelationalOperator = RelationalOperator {
    kind: OperatorKind::Lt,
    accepts: Ordering::is_lt,
};
static LESS_EQUAL: RelationalOperator = RelationalOperator {
    kind: OperatorKind::Le,
    accepts: Ordering::is_le,
};
static GREATER_THAN: RelationalOperator = RelationalOperator {
    kind: OperatorKind::Gt,
    accepts: Ordering::is_gt,
};
static GREATER_EQUAL: RelationalOperator = RelationalOperator {
    kind: OperatorKind::Ge,
    accepts: Ordering::is_ge,
};

impl RelationalOperator {
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Compare two values. Errors propagate, left first.
    pub fn evaluate(&self, left: &FormulaValue, right: &FormulaValue) -> FormulaValue {
        if let Some(e) = first_error(left, right) {
            return FormulaValue::Error(e);
        }
        match compare_values(left, right) {
            Some(ordering) => FormulaValue::Boolean((self.accepts)(ordering)),
            None => FormulaValue::Error(CellError::Value),
        }
    }
}

/// Compare two values Excel-style: numbers < text < booleans, text is
/// compared case-insensitively and blank takes the other side's type.
/// Arrays have no ordering.
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Option<Ordering> {
    use FormulaValue::*;

    let blank_as = |other: &FormulaValue| match other {
        Text(_) => Text(String::new()),
        Boolean(_) => Boolean(false),
        _ => Number(0.0),
    };
    let (left, right) = match (left, right) {
        (Blank, Blank) => return Some(Ordering::Equal),
        (Blank, r) => (blank_as(r), r.clone()),
        (l, Blank) => (l.clone(), blank_as(l)),
        (l, r) => (l.clone(), r.clone()),
    };

    let rank = |v: &FormulaValue| match v {
        Number(_) => 0,
        Text(_) => 1,
        Boolean(_) => 2,
        _ => 3,
    };

    match (&left, &right) {
        (Number(l), Number(r)) => Some(l.partial_cmp(r).unwrap_or(Ordering::Equal)),
        (Text(l), Text(r)) => Some(l.to_lowercase().cmp(&r.to_lowercase())),
        (Boolean(l), Boolean(r)) => Some(l.cmp(r)),
        (Array(_), _) | (_, Array(_)) => None,
        (l, r) => Some(rank(l).cmp(&rank(r))),
    }
}

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl ArithmeticOperator {
    pub fn evaluate(self, left: &FormulaValue, right: &FormulaValue) -> FormulaValue {
        if let Some(e) = first_error(left, right) {
            return FormulaValue::Error(e);
        }
        let (l, r) = match (arithmetic_operand(left), arithmetic_operand(right)) {
            (Some(l), Some(r)) => (l, r),
            _ => return FormulaValue::Error(CellError::Value),
        };

        let result = match self {
            ArithmeticOperator::Add => l + r,
            ArithmeticOperator::Subtract => l - r,
            ArithmeticOperator::Multiply => l * r,
            ArithmeticOperator::Divide => {
                if r == 0.0 {
                    return FormulaValue::Error(CellError::Div0);
                }
                l / r
            }
            ArithmeticOperator::Power => l.powf(r),
        };

        if result.is_finite() {
            FormulaValue::Number(result)
        } else {
            FormulaValue::Error(CellError::Num)
        }
    }
}

/// Prefix and postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Negate,
    Percent,
}

impl UnaryOperator {
    pub fn evaluate(self, operand: &FormulaValue) -> FormulaValue {
        if let Some(e) = operand.error() {
            return FormulaValue::Error(e);
        }
        match (self, operand) {
            (UnaryOperator::Plus, FormulaValue::Blank) => FormulaValue::Number(0.0),
            (UnaryOperator::Plus, FormulaValue::Array(_)) => FormulaValue::Error(CellError::Value),
            (UnaryOperator::Plus, value) => value.clone(),
            (op, value) => match arithmetic_operand(value) {
                Some(n) if op == UnaryOperator::Negate => FormulaValue::Number(-n),
                Some(n) => FormulaValue::Number(n / 100.0),
                None => FormulaValue::Error(CellError::Value),
            },
        }
    }
}

/// A built-in function call with the argument count of its token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionOperation {
    pub id: FunctionId,
    pub arg_count: usize,
}

impl FunctionOperation {
    pub fn evaluate(&self, args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
        if !self.id.accepts(args.len()) {
            let (min, max) = self.id.arity();
            return Err(FormulaError::ArgumentCount {
                function: self.id.name().to_string(),
                expected: format!("{} to {}", min, max),
                actual: args.len(),
            });
        }
        (functions::implementation(self.id))(args)
    }
}

fn concat(left: &FormulaValue, right: &FormulaValue) -> FormulaValue {
    if let Some(e) = first_error(left, right) {
        return FormulaValue::Error(e);
    }
    if matches!(left, FormulaValue::Array(_)) || matches!(right, FormulaValue::Array(_)) {
        return FormulaValue::Error(CellError::Value);
    }
    FormulaValue::Text(left.as_text() + &right.as_text())
}

fn first_error(left: &FormulaValue, right: &FormulaValue) -> Option<CellError> {
    left.error().or_else(|| right.error())
}

/// Arrays never take part in scalar arithmetic
fn arithmetic_operand(value: &FormulaValue) -> Option<f64> {
    match value {
        FormulaValue::Array(_) => None,
        other => other.as_number(),
    }
}
