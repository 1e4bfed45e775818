//! Workbook evaluator
//!
//! Walks compiled token sequences with a value stack. Every referenced cell,
//! formula or plain, is resolved through the [`EvaluationCache`], so each
//! cell is computed at most once per cache lifetime.

use ahash::AHashSet;
use gridcalc_core::{CellAddress, CellError, CellRange, CellValue, Error, Token, Workbook};

use crate::cache::{CellKey, EvaluationCache};
use crate::error::{FormulaError, FormulaResult};
use crate::operation::Operation;
use crate::value::{CalculatedValue, FormulaValue};

/// Evaluator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// Deepest chain of cell references followed before giving up
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self { max_depth: 1024 }
    }
}

impl EvaluatorOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A value on the evaluation stack
#[derive(Debug)]
struct Operand {
    value: FormulaValue,
    /// Came from a single-cell reference
    reference: bool,
}

impl Operand {
    fn literal(value: FormulaValue) -> Self {
        Self {
            value,
            reference: false,
        }
    }

    /// Value as a function argument: referenced scalars are passed as 1x1
    /// arrays so aggregates skip referenced text and booleans
    fn into_argument(self) -> FormulaValue {
        if self.reference {
            FormulaValue::Array(vec![vec![self.value]])
        } else {
            self.value
        }
    }
}

/// Evaluates cells of a workbook, caching every computed value
///
/// The cache is dropped automatically whenever the workbook's
/// [generation](Workbook::generation) differs from the one it was built
/// against.
#[derive(Debug, Default)]
pub struct WorkbookEvaluator {
    cache: EvaluationCache,
    options: EvaluatorOptions,
    seen_generation: Option<u64>,
    in_progress: AHashSet<CellKey>,
}

impl WorkbookEvaluator {
    /// Create an evaluator with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Drop every cached value
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Record that the cache is current for `generation`.
    ///
    /// Used after the caller itself wrote evaluation results into the
    /// workbook, which moves the generation without invalidating anything.
    pub fn sync_generation(&mut self, generation: u64) {
        self.seen_generation = Some(generation);
    }

    /// Evaluate one cell.
    ///
    /// Missing and blank cells give `None`; plain values are returned as
    /// they are and formulas are evaluated.
    pub fn evaluate(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> FormulaResult<Option<CalculatedValue>> {
        self.check_generation(workbook);
        let worksheet = workbook
            .worksheet(sheet)
            .ok_or(Error::SheetOutOfBounds(sheet, workbook.sheet_count()))?;

        match worksheet.cell_at(row, col) {
            None => Ok(None),
            Some(cell) if cell.value().is_blank() => Ok(None),
            Some(_) => {
                let value = self.cell_value(workbook, CellKey::new(sheet, row, col))?;
                Ok(Some(CalculatedValue::from_value(value)))
            }
        }
    }

    /// Evaluate a token sequence in the context of `sheet` without it
    /// belonging to any cell
    pub fn evaluate_tokens(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        tokens: &[Token],
    ) -> FormulaResult<CalculatedValue> {
        self.check_generation(workbook);
        if workbook.worksheet(sheet).is_none() {
            return Err(Error::SheetOutOfBounds(sheet, workbook.sheet_count()).into());
        }
        let value = self.walk(workbook, sheet, tokens)?;
        Ok(CalculatedValue::from_value(value))
    }

    fn check_generation(&mut self, workbook: &Workbook) {
        let current = workbook.generation();
        match self.seen_generation {
            Some(seen) if seen == current => {}
            Some(seen) => {
                log::debug!("workbook changed (generation {} -> {})", seen, current);
                self.cache.clear();
                self.seen_generation = Some(current);
            }
            None => self.seen_generation = Some(current),
        }
    }

    /// Value of a cell through the cache. A miss computes and stores it.
    fn cell_value(&mut self, workbook: &Workbook, key: CellKey) -> FormulaResult<FormulaValue> {
        if let Some(value) = self.cache.get(&key) {
            return Ok(value.clone());
        }
        self.resolve(workbook, key)?;
        self.cache
            .get(&key)
            .cloned()
            .ok_or_else(|| FormulaError::Evaluation(format!("{} was not cached", key)))
    }

    /// Compute `key` and everything it references, deepest first.
    ///
    /// References are followed with an explicit work stack, so by the time a
    /// cell's tokens are walked every cell they reference is already cached
    /// and the walk never recurses. `in_progress` holds the chain of cells
    /// whose references are still being resolved.
    fn resolve(&mut self, workbook: &Workbook, key: CellKey) -> FormulaResult<()> {
        let mut work = vec![Pending::Visit(key)];
        let resolved = self.drain(workbook, &mut work);
        if resolved.is_err() {
            self.in_progress.clear();
        }
        resolved
    }

    fn drain(&mut self, workbook: &Workbook, work: &mut Vec<Pending>) -> FormulaResult<()> {
        while let Some(next) = work.pop() {
            match next {
                Pending::Visit(key) => {
                    if self.cache.contains(&key) {
                        continue;
                    }
                    if self.in_progress.contains(&key) {
                        return Err(FormulaError::CircularReference(key));
                    }
                    if self.in_progress.len() >= self.options.max_depth {
                        return Err(FormulaError::RecursionLimit(self.options.max_depth));
                    }
                    self.in_progress.insert(key);
                    work.push(Pending::Compute(key));
                    // Pushed in reverse so references resolve left to right
                    let references = precedents(workbook, key);
                    work.extend(references.into_iter().rev().map(Pending::Visit));
                }
                Pending::Compute(key) => {
                    self.in_progress.remove(&key);
                    let value = self.compute(workbook, key)?;
                    self.cache.set(key, value)?;
                }
            }
        }
        Ok(())
    }

    fn compute(&mut self, workbook: &Workbook, key: CellKey) -> FormulaResult<FormulaValue> {
        let cell = workbook
            .worksheet(key.sheet)
            .and_then(|ws| ws.cell_at(key.row, key.col));

        match cell.map(|c| c.value()) {
            None => Ok(FormulaValue::Blank),
            Some(CellValue::Formula(formula)) => {
                let result = self.walk(workbook, key.sheet, formula.tokens())?;
                // A formula cell holds a packaged scalar
                Ok(CalculatedValue::from_value(result).into())
            }
            Some(plain) => Ok(FormulaValue::from(plain)),
        }
    }

    /// Run the token sequence on a value stack
    fn walk(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        tokens: &[Token],
    ) -> FormulaResult<FormulaValue> {
        if tokens.is_empty() {
            return Ok(FormulaValue::Blank);
        }

        let mut stack: Vec<Operand> = Vec::with_capacity(tokens.len());

        for token in tokens {
            match token {
                Token::Number(n) => stack.push(Operand::literal(FormulaValue::Number(*n))),
                Token::Int(n) => stack.push(Operand::literal(FormulaValue::Number(*n as f64))),
                Token::Str(s) => stack.push(Operand::literal(FormulaValue::Text(s.clone()))),
                Token::Bool(b) => stack.push(Operand::literal(FormulaValue::Boolean(*b))),
                Token::Error(e) => stack.push(Operand::literal(FormulaValue::Error(*e))),
                Token::MissingArg => stack.push(Operand::literal(FormulaValue::Blank)),
                Token::Paren => {}
                Token::Ref {
                    sheet: sheet_name,
                    address,
                } => {
                    let operand = match resolve_sheet(workbook, sheet, sheet_name.as_deref()) {
                        Some(target) => Operand {
                            value: self.reference_value(workbook, target, address)?,
                            reference: true,
                        },
                        None => Operand::literal(FormulaValue::Error(CellError::Ref)),
                    };
                    stack.push(operand);
                }
                Token::Area {
                    sheet: sheet_name,
                    range,
                } => {
                    let value = match resolve_sheet(workbook, sheet, sheet_name.as_deref()) {
                        Some(target) => self.area_value(workbook, target, range)?,
                        None => FormulaValue::Error(CellError::Ref),
                    };
                    stack.push(Operand::literal(value));
                }
                other => {
                    let operation = Operation::for_token(other)?;
                    let count = operation.operand_count();
                    if stack.len() < count {
                        return Err(FormulaError::Evaluation(format!(
                            "{} needs {} operands, stack has {}",
                            other.kind_name(),
                            count,
                            stack.len()
                        )));
                    }
                    let popped = stack.split_off(stack.len() - count);
                    let result = match operation {
                        Operation::Function(_) => {
                            let args: Vec<FormulaValue> =
                                popped.into_iter().map(Operand::into_argument).collect();
                            collapse_single(operation.evaluate(&args)?)
                        }
                        _ => {
                            let args: Vec<FormulaValue> =
                                popped.into_iter().map(|o| o.value).collect();
                            operation.evaluate(&args)?
                        }
                    };
                    stack.push(Operand::literal(result));
                }
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(result), true) => Ok(result.value),
            _ => Err(FormulaError::Evaluation(format!(
                "formula left {} values on the stack",
                stack.len() + 1
            ))),
        }
    }

    fn reference_value(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        address: &CellAddress,
    ) -> FormulaResult<FormulaValue> {
        self.cell_value(workbook, CellKey::new(sheet, address.row, address.col))
    }

    fn area_value(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        range: &CellRange,
    ) -> FormulaResult<FormulaValue> {
        let worksheet = workbook.worksheet(sheet);
        let mut rows = Vec::with_capacity(range.row_count() as usize);
        for row in range.start.row..=range.end.row {
            let mut values = Vec::with_capacity(range.col_count() as usize);
            for col in range.start.col..=range.end.col {
                // Absent cells are blank and never cached
                let stored = worksheet.and_then(|ws| ws.cell_at(row, col)).is_some();
                values.push(if stored {
                    self.cell_value(workbook, CellKey::new(sheet, row, col))?
                } else {
                    FormulaValue::Blank
                });
            }
            rows.push(values);
        }
        Ok(FormulaValue::Array(rows))
    }
}

/// Step of [`WorkbookEvaluator::resolve`]
#[derive(Debug, Clone, Copy)]
enum Pending {
    /// Queue the cell's references ahead of the cell itself
    Visit(CellKey),
    /// All references are cached; walk the cell's tokens
    Compute(CellKey),
}

/// Cells a formula cell reads: single references, plus the stored cells of
/// each area
fn precedents(workbook: &Workbook, key: CellKey) -> Vec<CellKey> {
    let tokens = match workbook
        .worksheet(key.sheet)
        .and_then(|ws| ws.cell_at(key.row, key.col))
        .map(|cell| cell.value())
    {
        Some(CellValue::Formula(formula)) => formula.tokens(),
        _ => return Vec::new(),
    };

    let mut keys = Vec::new();
    for token in tokens {
        match token {
            Token::Ref { sheet, address } => {
                if let Some(target) = resolve_sheet(workbook, key.sheet, sheet.as_deref()) {
                    keys.push(CellKey::new(target, address.row, address.col));
                }
            }
            Token::Area { sheet, range } => {
                let target = resolve_sheet(workbook, key.sheet, sheet.as_deref());
                if let Some((target, ws)) =
                    target.and_then(|t| workbook.worksheet(t).map(|ws| (t, ws)))
                {
                    keys.extend(
                        ws.cells_in(range)
                            .map(|cell| CellKey::new(target, cell.row(), cell.col())),
                    );
                }
            }
            _ => {}
        }
    }
    keys
}

/// Sheet a reference points at: its own sheet name, or the formula's sheet
fn resolve_sheet(workbook: &Workbook, current: usize, name: Option<&str>) -> Option<usize> {
    match name {
        None => Some(current),
        Some(name) => workbook.sheet_index(name),
    }
}

/// A function returning a single referenced value gives that value
fn collapse_single(value: FormulaValue) -> FormulaValue {
    match value {
        FormulaValue::Array(mut rows) if rows.len() == 1 && rows[0].len() == 1 => {
            rows.remove(0).remove(0)
        }
        other => other,
    }
}
