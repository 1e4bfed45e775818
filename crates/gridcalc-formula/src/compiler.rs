//! Formula compiler
//!
//! A recursive descent parser for Excel formulas with Excel operator
//! precedence. Instead of building a tree it writes tokens in reverse Polish
//! order, the form formula cells store. [`render_formula`] goes the other
//! way.

use gridcalc_core::cell::format_number;
use gridcalc_core::{CellAddress, CellError, CellRange, FunctionId, OperatorKind, Token};

use crate::error::{FormulaError, FormulaResult};

/// Deepest nesting of parentheses and function calls, as in Excel
pub const MAX_NESTING: usize = 64;

/// Compile formula text into RPN tokens. A leading `=` is optional.
///
/// # Example
/// ```rust
/// use gridcalc_core::{OperatorKind, Token};
/// use gridcalc_formula::compile_formula;
///
/// let tokens = compile_formula("=1+2").unwrap();
/// assert_eq!(tokens, vec![Token::Int(1), Token::Int(2), Token::Op(OperatorKind::Add)]);
///
/// assert!(compile_formula("=SUM(A1:A10)").is_ok());
/// assert!(compile_formula("IF(A1>0,\"Yes\",\"No\")").is_ok());
/// ```
pub fn compile_formula(formula: &str) -> FormulaResult<Vec<Token>> {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);
    if formula.trim().is_empty() {
        return Err(FormulaError::Parse("Formula is empty".into()));
    }

    let mut compiler = Compiler::new(formula)?;
    compiler.parse_expression()?;

    if compiler.current != Lexeme::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            compiler.current
        )));
    }

    Ok(compiler.output)
}

/// Lexical units of formula text
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    Identifier(String), // Function name or defined name
    CellRef(String),    // A1, $A$1
    SheetRef(String),   // Sheet1! or 'My Sheet'!

    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    Eof,
}

struct Compiler<'a> {
    input: &'a str,
    pos: usize,
    current: Lexeme,
    output: Vec<Token>,
    depth: usize,
}

impl<'a> Compiler<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut compiler = Self {
            input,
            pos: 0,
            current: Lexeme::Eof,
            output: Vec::new(),
            depth: 0,
        };
        compiler.advance_lexeme()?;
        Ok(compiler)
    }

    // === Scanning ===

    fn advance_lexeme(&mut self) -> FormulaResult<()> {
        self.current = self.scan()?;
        Ok(())
    }

    fn scan(&mut self) -> FormulaResult<Lexeme> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Lexeme::Eof),
        };

        let single = match c {
            '+' => Some(Lexeme::Plus),
            '-' => Some(Lexeme::Minus),
            '*' => Some(Lexeme::Star),
            '/' => Some(Lexeme::Slash),
            '^' => Some(Lexeme::Caret),
            '%' => Some(Lexeme::Percent),
            '&' => Some(Lexeme::Ampersand),
            ':' => Some(Lexeme::Colon),
            ',' => Some(Lexeme::Comma),
            ';' => Some(Lexeme::Semicolon),
            '(' => Some(Lexeme::LeftParen),
            ')' => Some(Lexeme::RightParen),
            '{' => Some(Lexeme::LeftBrace),
            '}' => Some(Lexeme::RightBrace),
            '=' => Some(Lexeme::Equal),
            _ => None,
        };
        if let Some(lexeme) = single {
            self.advance();
            return Ok(lexeme);
        }

        match c {
            '<' => {
                self.advance();
                if self.eat('=') {
                    Ok(Lexeme::LessEqual)
                } else if self.eat('>') {
                    Ok(Lexeme::NotEqual)
                } else {
                    Ok(Lexeme::LessThan)
                }
            }
            '>' => {
                self.advance();
                if self.eat('=') {
                    Ok(Lexeme::GreaterEqual)
                } else {
                    Ok(Lexeme::GreaterThan)
                }
            }
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_sheet(),
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '#' => {
                Ok(self.scan_identifier_or_ref())
            }
            other => Err(FormulaError::Parse(format!(
                "Unexpected character '{}' at {}",
                other, self.pos
            ))),
        }
    }

    fn scan_string(&mut self) -> FormulaResult<Lexeme> {
        self.advance(); // opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') if self.peek_char_at(1) == Some('"') => {
                    s.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(Lexeme::String(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse("Unterminated string literal".into())),
            }
        }
    }

    fn scan_quoted_sheet(&mut self) -> FormulaResult<Lexeme> {
        self.advance(); // opening quote

        let mut name = String::new();
        loop {
            match self.peek_char() {
                Some('\'') if self.peek_char_at(1) == Some('\'') => {
                    name.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse("Unterminated sheet name".into())),
            }
        }

        if !self.eat('!') {
            return Err(FormulaError::Parse(format!(
                "Expected '!' after sheet name '{}'",
                name
            )));
        }
        Ok(Lexeme::SheetRef(name))
    }

    fn scan_number(&mut self) -> FormulaResult<Lexeme> {
        let start = self.pos;

        self.skip_digits();
        if self.eat('.') {
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.skip_digits();
        }

        let text = &self.input[start..self.pos];
        text.parse()
            .map(Lexeme::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", text)))
    }

    fn scan_identifier_or_ref(&mut self) -> Lexeme {
        // Error literals (#VALUE!, #DIV/0!, #N/A ...)
        if self.peek_char() == Some('#') {
            let start = self.pos;
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?'
            }) {
                self.advance();
            }
            let text = &self.input[start..self.pos];
            return match CellError::from_str(text) {
                Some(err) => Lexeme::Error(err),
                None => Lexeme::Identifier(text.to_string()),
            };
        }

        let start = self.pos;
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        if self.eat('!') {
            return Lexeme::SheetRef(text.to_string());
        }

        // TRUE( and FALSE( are function calls
        let before_paren = self.peek_char() == Some('(');
        if !before_paren {
            if text.eq_ignore_ascii_case("TRUE") {
                return Lexeme::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Lexeme::Boolean(false);
            }
            if is_cell_reference(text) {
                return Lexeme::CellRef(text.to_string());
            }
        }

        Lexeme::Identifier(text.to_string())
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn consume(&mut self) -> FormulaResult<Lexeme> {
        let lexeme = std::mem::replace(&mut self.current, Lexeme::Eof);
        self.advance_lexeme()?;
        Ok(lexeme)
    }

    fn expect(&mut self, expected: &Lexeme) -> FormulaResult<()> {
        if &self.current == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected, self.current
            )))
        }
    }

    fn emit(&mut self, token: Token) {
        self.output.push(token);
    }

    // === Expressions ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, +, %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::Parse(format!(
                "formula nested too deeply (more than {} levels)",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let parsed = self.parse_comparison();
        self.depth -= 1;
        parsed
    }

    fn parse_comparison(&mut self) -> FormulaResult<()> {
        self.parse_concatenation()?;

        loop {
            let op = match self.current {
                Lexeme::Equal => OperatorKind::Eq,
                Lexeme::NotEqual => OperatorKind::Ne,
                Lexeme::LessThan => OperatorKind::Lt,
                Lexeme::LessEqual => OperatorKind::Le,
                Lexeme::GreaterThan => OperatorKind::Gt,
                Lexeme::GreaterEqual => OperatorKind::Ge,
                _ => return Ok(()),
            };
            self.consume()?;
            self.parse_concatenation()?;
            self.emit(Token::Op(op));
        }
    }

    fn parse_concatenation(&mut self) -> FormulaResult<()> {
        self.parse_additive()?;

        while self.current == Lexeme::Ampersand {
            self.consume()?;
            self.parse_additive()?;
            self.emit(Token::Op(OperatorKind::Concat));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> FormulaResult<()> {
        self.parse_multiplicative()?;

        loop {
            let op = match self.current {
                Lexeme::Plus => OperatorKind::Add,
                Lexeme::Minus => OperatorKind::Sub,
                _ => return Ok(()),
            };
            self.consume()?;
            self.parse_multiplicative()?;
            self.emit(Token::Op(op));
        }
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<()> {
        self.parse_power()?;

        loop {
            let op = match self.current {
                Lexeme::Star => OperatorKind::Mul,
                Lexeme::Slash => OperatorKind::Div,
                _ => return Ok(()),
            };
            self.consume()?;
            self.parse_power()?;
            self.emit(Token::Op(op));
        }
    }

    /// `^` is left associative in Excel: `2^3^2` is 64
    fn parse_power(&mut self) -> FormulaResult<()> {
        self.parse_unary()?;

        while self.current == Lexeme::Caret {
            self.consume()?;
            self.parse_unary()?;
            self.emit(Token::Op(OperatorKind::Power));
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> FormulaResult<()> {
        let mut prefixes = Vec::new();
        loop {
            let op = match self.current {
                Lexeme::Minus => OperatorKind::UnaryMinus,
                Lexeme::Plus => OperatorKind::UnaryPlus,
                _ => break,
            };
            self.consume()?;
            prefixes.push(op);
        }

        self.parse_range()?;

        while self.current == Lexeme::Percent {
            self.consume()?;
            self.emit(Token::Op(OperatorKind::Percent));
        }
        // Innermost sign applies first
        for op in prefixes.into_iter().rev() {
            self.emit(Token::Op(op));
        }
        Ok(())
    }

    fn parse_range(&mut self) -> FormulaResult<()> {
        let left_start = self.output.len();
        self.parse_primary()?;

        while self.current == Lexeme::Colon {
            self.consume()?;
            let right_start = self.output.len();
            self.parse_primary()?;

            // Two plain references fold into one area token
            if right_start == left_start + 1 && self.output.len() == right_start + 1 {
                if let Some(area) = fold_area(&self.output[left_start], &self.output[right_start])? {
                    self.output.truncate(left_start);
                    self.emit(area);
                    continue;
                }
            }
            self.emit(Token::Op(OperatorKind::Range));
        }
        Ok(())
    }

    fn parse_primary(&mut self) -> FormulaResult<()> {
        match self.consume()? {
            Lexeme::Number(n) => self.emit(number_token(n)),
            Lexeme::String(s) => self.emit(Token::Str(s)),
            Lexeme::Boolean(b) => self.emit(Token::Bool(b)),
            Lexeme::Error(e) => self.emit(Token::Error(e)),

            Lexeme::LeftParen => {
                self.parse_expression()?;
                self.expect(&Lexeme::RightParen)?;
                self.emit(Token::Paren);
            }

            Lexeme::LeftBrace => self.parse_array()?,

            Lexeme::SheetRef(sheet) => match self.consume()? {
                Lexeme::CellRef(text) => {
                    let address = parse_address(&text)?;
                    self.emit(Token::Ref {
                        sheet: Some(sheet),
                        address,
                    });
                }
                other => {
                    return Err(FormulaError::Parse(format!(
                        "Expected cell reference after '{}!', got {:?}",
                        sheet, other
                    )))
                }
            },

            Lexeme::CellRef(text) => {
                let address = parse_address(&text)?;
                self.emit(Token::Ref {
                    sheet: None,
                    address,
                });
            }

            Lexeme::Identifier(name) => {
                if self.current == Lexeme::LeftParen {
                    self.parse_function_call(&name)?;
                } else {
                    self.emit(Token::Name(name));
                }
            }

            other => {
                return Err(FormulaError::Parse(format!("Unexpected token: {:?}", other)));
            }
        }
        Ok(())
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<()> {
        let id = FunctionId::from_name(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_ascii_uppercase()))?;
        self.expect(&Lexeme::LeftParen)?;

        let mut argc = 0usize;
        if self.current != Lexeme::RightParen {
            loop {
                if matches!(self.current, Lexeme::Comma | Lexeme::RightParen) {
                    self.emit(Token::MissingArg);
                } else {
                    self.parse_expression()?;
                }
                argc += 1;

                if self.current == Lexeme::Comma {
                    self.consume()?;
                } else {
                    break;
                }
            }
        }
        self.expect(&Lexeme::RightParen)?;

        check_arity(id, argc)?;
        self.emit(Token::Func {
            id,
            argc: argc as u8,
        });
        Ok(())
    }

    fn parse_array(&mut self) -> FormulaResult<()> {
        let mut rows = Vec::new();
        let mut row = Vec::new();

        loop {
            row.push(self.parse_array_element()?);
            match self.consume()? {
                Lexeme::Comma => {}
                Lexeme::Semicolon => rows.push(std::mem::take(&mut row)),
                Lexeme::RightBrace => break,
                other => {
                    return Err(FormulaError::Parse(format!(
                        "Expected ',' ';' or '}}' in array, got {:?}",
                        other
                    )))
                }
            }
        }
        rows.push(row);

        if rows.iter().any(|r| r.len() != rows[0].len()) {
            return Err(FormulaError::Parse("Array rows differ in length".into()));
        }
        self.emit(Token::Array(rows));
        Ok(())
    }

    fn parse_array_element(&mut self) -> FormulaResult<Token> {
        let negative = self.current == Lexeme::Minus;
        if negative {
            self.consume()?;
        }
        match self.consume()? {
            Lexeme::Number(n) if negative => Ok(Token::Number(-n)),
            Lexeme::Number(n) => Ok(number_token(n)),
            Lexeme::String(s) if !negative => Ok(Token::Str(s)),
            Lexeme::Boolean(b) if !negative => Ok(Token::Bool(b)),
            Lexeme::Error(e) if !negative => Ok(Token::Error(e)),
            other => Err(FormulaError::Parse(format!(
                "Array constants may only hold literals, got {:?}",
                other
            ))),
        }
    }
}

fn is_cell_reference(text: &str) -> bool {
    let rest = text.strip_prefix('$').unwrap_or(text);
    let letters = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if letters == 0 {
        return false;
    }
    let rest = &rest[letters..];
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

fn parse_address(text: &str) -> FormulaResult<CellAddress> {
    CellAddress::parse(text)
        .map_err(|e| FormulaError::Parse(format!("Invalid cell reference '{}': {}", text, e)))
}

fn number_token(n: f64) -> Token {
    if n.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(&n) {
        Token::Int(n as u16)
    } else {
        Token::Number(n)
    }
}

fn fold_area(left: &Token, right: &Token) -> FormulaResult<Option<Token>> {
    match (left, right) {
        (
            Token::Ref {
                sheet,
                address: start,
            },
            Token::Ref {
                sheet: end_sheet,
                address: end,
            },
        ) => {
            if end_sheet.is_some() && end_sheet != sheet {
                return Err(FormulaError::Parse(
                    "Range references must be on the same sheet".into(),
                ));
            }
            Ok(Some(Token::Area {
                sheet: sheet.clone(),
                range: CellRange::new(*start, *end),
            }))
        }
        _ => Ok(None),
    }
}

fn check_arity(id: FunctionId, argc: usize) -> FormulaResult<()> {
    if id.accepts(argc) {
        return Ok(());
    }
    let (min, max) = id.arity();
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{} to {}", min, max)
    };
    Err(FormulaError::ArgumentCount {
        function: id.name().to_string(),
        expected,
        actual: argc,
    })
}

// === Rendering ===

/// Rebuild formula text (without the leading `=`) from RPN tokens.
///
/// Fails if the tokens do not form a single expression.
pub fn render_formula(tokens: &[Token]) -> FormulaResult<String> {
    let mut stack: Vec<String> = Vec::new();

    for token in tokens {
        let text = match token {
            Token::Op(op) if op.operand_count() == 2 => {
                let right = pop(&mut stack, token)?;
                let left = pop(&mut stack, token)?;
                format!("{}{}{}", left, op.symbol(), right)
            }
            Token::Op(OperatorKind::Percent) => format!("{}%", pop(&mut stack, token)?),
            Token::Op(op) => format!("{}{}", op.symbol(), pop(&mut stack, token)?),
            Token::Func { id, argc } => {
                let at = stack
                    .len()
                    .checked_sub(*argc as usize)
                    .ok_or_else(|| underflow(token))?;
                let args = stack.split_off(at);
                format!("{}({})", id.name(), args.join(","))
            }
            Token::Paren => format!("({})", pop(&mut stack, token)?),
            Token::Union => {
                let right = pop(&mut stack, token)?;
                let left = pop(&mut stack, token)?;
                format!("{},{}", left, right)
            }
            operand => render_operand(operand),
        };
        stack.push(text);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(text), true) => Ok(text),
        _ => Err(FormulaError::Parse(format!(
            "Tokens do not form a single expression ({} left over)",
            stack.len() + 1
        ))),
    }
}

fn render_operand(token: &Token) -> String {
    match token {
        Token::Number(n) => format_number(*n),
        Token::Int(n) => n.to_string(),
        Token::Str(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        Token::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Token::Error(e) => e.as_str().to_string(),
        Token::MissingArg => String::new(),
        Token::Ref { sheet, address } => format!("{}{}", sheet_prefix(sheet), address),
        Token::Area { sheet, range } => format!(
            "{}{}:{}",
            sheet_prefix(sheet),
            range.start.to_a1_string(),
            range.end.to_a1_string()
        ),
        Token::Name(name) => name.clone(),
        Token::Array(rows) => {
            let rows: Vec<String> = rows
                .iter()
                .map(|row| row.iter().map(render_operand).collect::<Vec<_>>().join(","))
                .collect();
            format!("{{{}}}", rows.join(";"))
        }
        // Operators are handled by the caller
        other => other.kind_name().to_string(),
    }
}

fn sheet_prefix(sheet: &Option<String>) -> String {
    match sheet {
        None => String::new(),
        Some(name) => {
            let plain = name
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if plain {
                format!("{}!", name)
            } else {
                format!("'{}'!", name.replace('\'', "''"))
            }
        }
    }
}

fn pop(stack: &mut Vec<String>, token: &Token) -> FormulaResult<String> {
    stack.pop().ok_or_else(|| underflow(token))
}

fn underflow(token: &Token) -> FormulaError {
    FormulaError::Parse(format!("Missing operand for {}", token.kind_name()))
}
