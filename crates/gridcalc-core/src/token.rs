//! Compiled formula tokens
//!
//! A formula is stored as a sequence of [`Token`]s in reverse Polish order:
//! operands come before the operator or function that consumes them.
//! `1+A2*2` compiles to `Int(1) Ref(A2) Int(2) Op(Mul) Op(Add)`.

use std::fmt;

use crate::cell::{CellAddress, CellError, CellRange};

/// A single formula token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Floating point literal
    Number(f64),
    /// Small integer literal (0..=65535)
    Int(u16),
    /// String literal
    Str(String),
    /// Boolean literal
    Bool(bool),
    /// Error literal
    Error(CellError),
    /// Omitted function argument (`IF(A1,,2)`)
    MissingArg,
    /// Single cell reference, optionally on another sheet
    Ref {
        sheet: Option<String>,
        address: CellAddress,
    },
    /// Area reference, optionally on another sheet
    Area {
        sheet: Option<String>,
        range: CellRange,
    },
    /// Operator applied to the top one or two operands
    Op(OperatorKind),
    /// Function call consuming `argc` operands
    Func { id: FunctionId, argc: u8 },
    /// Parenthesised expression marker (display only)
    Paren,
    /// Defined name reference
    Name(String),
    /// Union of two references (`A1:A2,B1:B2`)
    Union,
    /// Inline array constant
    Array(Vec<Vec<Token>>),
}

impl Token {
    /// Short name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Number(_) => "number",
            Token::Int(_) => "int",
            Token::Str(_) => "string",
            Token::Bool(_) => "bool",
            Token::Error(_) => "error",
            Token::MissingArg => "missing argument",
            Token::Ref { .. } => "reference",
            Token::Area { .. } => "area",
            Token::Op(_) => "operator",
            Token::Func { .. } => "function",
            Token::Paren => "parenthesis",
            Token::Name(_) => "name",
            Token::Union => "union",
            Token::Array(_) => "array",
        }
    }

    /// Whether the token refers to other cells
    pub fn is_reference(&self) -> bool {
        matches!(self, Token::Ref { .. } | Token::Area { .. })
    }
}

/// Built-in operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    UnaryPlus,
    UnaryMinus,
    Percent,
    /// Range operator between two non-literal references
    Range,
}

impl OperatorKind {
    /// Number of operands consumed
    pub fn operand_count(self) -> usize {
        match self {
            OperatorKind::UnaryPlus | OperatorKind::UnaryMinus | OperatorKind::Percent => 1,
            _ => 2,
        }
    }

    /// Operator symbol as written in formula text
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Add | OperatorKind::UnaryPlus => "+",
            OperatorKind::Sub | OperatorKind::UnaryMinus => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::Power => "^",
            OperatorKind::Concat => "&",
            OperatorKind::Eq => "=",
            OperatorKind::Ne => "<>",
            OperatorKind::Lt => "<",
            OperatorKind::Le => "<=",
            OperatorKind::Gt => ">",
            OperatorKind::Ge => ">=",
            OperatorKind::Percent => "%",
            OperatorKind::Range => ":",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

macro_rules! functions {
    ($( $variant:ident = $index:literal, $name:literal, $min:literal ..= $max:literal; )*) => {
        /// Built-in functions, identified by their BIFF function index
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FunctionId {
            $( $variant, )*
        }

        impl FunctionId {
            /// Every supported function
            pub const ALL: &'static [FunctionId] = &[$( FunctionId::$variant, )*];

            /// BIFF function index
            pub fn index(self) -> u16 {
                match self {
                    $( FunctionId::$variant => $index, )*
                }
            }

            /// Look up a function by BIFF index
            pub fn from_index(index: u16) -> Option<Self> {
                match index {
                    $( $index => Some(FunctionId::$variant), )*
                    _ => None,
                }
            }

            /// Upper-case function name
            pub fn name(self) -> &'static str {
                match self {
                    $( FunctionId::$variant => $name, )*
                }
            }

            /// Look up a function by name (case-insensitive)
            pub fn from_name(name: &str) -> Option<Self> {
                let upper = name.to_ascii_uppercase();
                match upper.as_str() {
                    $( $name => Some(FunctionId::$variant), )*
                    _ => None,
                }
            }

            /// Minimum and maximum argument counts
            pub fn arity(self) -> (u8, u8) {
                match self {
                    $( FunctionId::$variant => ($min, $max), )*
                }
            }
        }
    };
}

functions! {
    Count = 0, "COUNT", 0..=30;
    If = 1, "IF", 1..=3;
    IsNa = 2, "ISNA", 1..=1;
    IsError = 3, "ISERROR", 1..=1;
    Sum = 4, "SUM", 0..=30;
    Average = 5, "AVERAGE", 1..=30;
    Min = 6, "MIN", 0..=30;
    Max = 7, "MAX", 0..=30;
    Sqrt = 20, "SQRT", 1..=1;
    Abs = 24, "ABS", 1..=1;
    Int = 25, "INT", 1..=1;
    Round = 27, "ROUND", 2..=2;
    Len = 32, "LEN", 1..=1;
    True = 34, "TRUE", 0..=0;
    False = 35, "FALSE", 0..=0;
    And = 36, "AND", 1..=30;
    Or = 37, "OR", 1..=30;
    Not = 38, "NOT", 1..=1;
    Mod = 39, "MOD", 2..=2;
    Lower = 112, "LOWER", 1..=1;
    Upper = 113, "UPPER", 1..=1;
    IsBlank = 129, "ISBLANK", 1..=1;
    Product = 183, "PRODUCT", 0..=30;
    Concatenate = 336, "CONCATENATE", 0..=30;
}

impl FunctionId {
    /// Whether `argc` is within the function's accepted range
    pub fn accepts(self, argc: usize) -> bool {
        let (min, max) = self.arity();
        argc >= min as usize && argc <= max as usize
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_function_indexes() {
        assert_eq!(FunctionId::Sum.index(), 4);
        assert_eq!(FunctionId::Concatenate.index(), 336);
        assert_eq!(FunctionId::from_index(1), Some(FunctionId::If));
        assert_eq!(FunctionId::from_index(9999), None);
        for id in FunctionId::ALL {
            assert_eq!(FunctionId::from_index(id.index()), Some(*id));
            assert_eq!(FunctionId::from_name(id.name()), Some(*id));
        }
    }

    #[test]
    fn test_function_names_case_insensitive() {
        assert_eq!(FunctionId::from_name("sum"), Some(FunctionId::Sum));
        assert_eq!(FunctionId::from_name("IsBlank"), Some(FunctionId::IsBlank));
        assert_eq!(FunctionId::from_name("VLOOKUP"), None);
    }

    #[test]
    fn test_arity() {
        assert!(FunctionId::If.accepts(2));
        assert!(!FunctionId::If.accepts(4));
        assert!(FunctionId::True.accepts(0));
        assert!(!FunctionId::Round.accepts(1));
    }

    #[test]
    fn test_operator_operands() {
        assert_eq!(OperatorKind::UnaryMinus.operand_count(), 1);
        assert_eq!(OperatorKind::Concat.operand_count(), 2);
        assert_eq!(OperatorKind::Ne.to_string(), "<>");
    }
}
