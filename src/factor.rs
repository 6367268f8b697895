//! Raw tabular rows and categorical factor encoding.
//!
//! [`DataTable`] holds already-parsed cells; value cleanup of spreadsheet
//! text is the caller's concern. [`FactorEncoding`] maps each distinct level
//! of a column to a dense integer code for the duration of one test
//! invocation.
//!
//! # Examples
//!
//! ```
//! use u_hypothesis::factor::{group_one_way, Cell, DataTable};
//!
//! let table = DataTable::new(
//!     vec!["dose".into(), "response".into()],
//!     vec![
//!         vec![Cell::Number(2.0), Cell::Number(7.5)],
//!         vec![Cell::Number(1.0), Cell::Number(4.0)],
//!         vec![Cell::Number(2.0), Cell::Number(8.5)],
//!         vec![Cell::Number(1.0), Cell::Number(5.0)],
//!     ],
//! );
//! let g = group_one_way(&table, "dose", "response").unwrap();
//! assert_eq!(g.labels(), vec!["1", "2"]);
//! assert_eq!(g.groups, vec![vec![4.0, 5.0], vec![7.5, 8.5]]);
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{Result, StatError};

// ── Cells and tables ─────────────────────────────────────────────────

/// A single already-parsed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Missing value.
    Empty,
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Finite numeric value of the cell; text is accepted when it parses as
    /// a plain number.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Empty => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Categorical level of the cell; `None` for missing or blank cells.
    pub fn level(&self) -> Option<Level> {
        match self {
            Self::Number(v) if v.is_finite() => Some(Level::number(*v)),
            Self::Text(s) if !s.trim().is_empty() => Some(Level::Text(s.trim().to_string())),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Row-major table of cells with a header row.
///
/// Rows shorter than the header are padded with [`Cell::Empty`] on access.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Creates a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Header names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of the column named `name`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StatError::input(format!("there is no column named '{name}'")))
    }

    /// All cells of the column named `name`, one per row.
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row.get(idx).unwrap_or(&EMPTY)).collect())
    }

    /// Finite numeric values of a column; empty and non-numeric cells are
    /// dropped.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .column(name)?
            .into_iter()
            .filter_map(Cell::as_f64)
            .collect())
    }
}

// ── Levels and encodings ─────────────────────────────────────────────

/// Hashable categorical level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    /// Numeric level stored by bit pattern (−0 folded into +0).
    Number(u64),
    /// Text level, trimmed.
    Text(String),
}

impl Level {
    /// Numeric level.
    pub fn number(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        Self::Number(v.to_bits())
    }

    /// Numeric value of a [`Level::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(bits) => Some(f64::from_bits(*bits)),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Bijection between the observed levels of one column and `0..len()`.
///
/// Codes are assigned in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FactorEncoding {
    levels: Vec<Level>,
    codes: HashMap<Level, usize>,
}

impl FactorEncoding {
    /// Empty encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes every level present in `cells`, skipping missing cells.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut enc = Self::new();
        for level in cells.into_iter().filter_map(Cell::level) {
            enc.encode(level);
        }
        enc
    }

    /// Code for `level`, assigning the next free code if unseen.
    pub fn encode(&mut self, level: Level) -> usize {
        if let Some(&code) = self.codes.get(&level) {
            return code;
        }
        let code = self.levels.len();
        self.codes.insert(level.clone(), code);
        self.levels.push(level);
        code
    }

    /// Code of an already-encoded level.
    pub fn code(&self, level: &Level) -> Option<usize> {
        self.codes.get(level).copied()
    }

    /// Level for `code`.
    pub fn decode(&self, code: usize) -> Option<&Level> {
        self.levels.get(code)
    }

    /// Levels in code order.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of distinct levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// `true` if no level has been encoded.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Reorders codes by numeric level value when every level is numeric.
    fn sort_numeric(&mut self) {
        if !self.levels.iter().all(|l| l.as_f64().is_some()) {
            return;
        }
        self.levels.sort_by(|a, b| {
            let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        });
        self.codes = self
            .levels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
    }

    fn labels(&self) -> Vec<String> {
        self.levels.iter().map(Level::to_string).collect()
    }
}

// ── Grouping ─────────────────────────────────────────────────────────

/// Values of one numeric column grouped by the levels of one factor.
#[derive(Debug, Clone)]
pub struct OneWayGroups {
    /// Factor encoding; `groups[c]` belongs to `encoding.decode(c)`.
    pub encoding: FactorEncoding,
    /// One group per level.
    pub groups: Vec<Vec<f64>>,
}

impl OneWayGroups {
    /// Level labels in group order.
    pub fn labels(&self) -> Vec<String> {
        self.encoding.labels()
    }
}

/// Values of one numeric column grouped by the levels of two factors.
#[derive(Debug, Clone)]
pub struct TwoWayGroups {
    /// Encoding of factor A (rows of `cells`).
    pub a: FactorEncoding,
    /// Encoding of factor B (columns of `cells`).
    pub b: FactorEncoding,
    /// `cells[i][j]` holds the values at A-level `i`, B-level `j`.
    pub cells: Vec<Vec<Vec<f64>>>,
}

impl TwoWayGroups {
    /// Factor A level labels.
    pub fn a_labels(&self) -> Vec<String> {
        self.a.labels()
    }

    /// Factor B level labels.
    pub fn b_labels(&self) -> Vec<String> {
        self.b.labels()
    }
}

/// Groups the finite values of `value` by the level of `factor`.
///
/// Rows with a missing factor level or a non-numeric value are skipped.
/// Groups are ordered by numeric level when every level is a number,
/// otherwise by first appearance.
///
/// # Errors
///
/// [`StatError::Input`] if either column does not exist.
pub fn group_one_way(table: &DataTable, factor: &str, value: &str) -> Result<OneWayGroups> {
    let levels = table.column(factor)?;
    let values = table.column(value)?;

    let mut encoding = FactorEncoding::new();
    let mut pairs = Vec::new();
    for (level, cell) in levels.into_iter().zip(values) {
        if let (Some(level), Some(v)) = (level.level(), cell.as_f64()) {
            encoding.encode(level.clone());
            pairs.push((level, v));
        }
    }
    encoding.sort_numeric();

    let mut groups = vec![Vec::new(); encoding.len()];
    for (level, v) in pairs {
        if let Some(code) = encoding.code(&level) {
            groups[code].push(v);
        }
    }

    debug!(factor, value, levels = encoding.len(), "grouped by one factor");
    Ok(OneWayGroups { encoding, groups })
}

/// Groups the finite values of `value` by the levels of `factor_a` and
/// `factor_b`.
///
/// Levels are encoded in first-seen order over complete rows (both factors
/// present and a numeric value), so every level has at least one
/// observation; an unobserved level combination yields an empty cell.
///
/// # Errors
///
/// [`StatError::Input`] if any column does not exist or both factors name
/// the same column.
pub fn group_two_way(
    table: &DataTable,
    factor_a: &str,
    factor_b: &str,
    value: &str,
) -> Result<TwoWayGroups> {
    if factor_a == factor_b {
        return Err(StatError::input(
            "two-way grouping needs two different factor columns",
        ));
    }
    let col_a = table.column(factor_a)?;
    let col_b = table.column(factor_b)?;
    let values = table.column(value)?;

    let mut a = FactorEncoding::new();
    let mut b = FactorEncoding::new();
    let mut coded = Vec::new();
    for ((la, lb), cell) in col_a.iter().zip(&col_b).zip(values) {
        if let (Some(la), Some(lb), Some(v)) = (la.level(), lb.level(), cell.as_f64()) {
            coded.push((a.encode(la), b.encode(lb), v));
        }
    }

    let mut cells = vec![vec![Vec::new(); b.len()]; a.len()];
    for (i, j, v) in coded {
        cells[i][j].push(v);
    }

    debug!(
        factor_a,
        factor_b,
        a_levels = a.len(),
        b_levels = b.len(),
        "grouped by two factors"
    );
    Ok(TwoWayGroups { a, b, cells })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::new(
            vec!["fert".into(), "water".into(), "yield".into()],
            vec![
                vec!["B".into(), "low".into(), 5.0.into()],
                vec!["A".into(), "low".into(), 4.0.into()],
                vec!["B".into(), "high".into(), 7.0.into()],
                vec!["A".into(), "high".into(), "6.5".into()],
                vec![Cell::Empty, "high".into(), 9.0.into()],
                vec!["A".into(), "low".into(), "n/a".into()],
                vec!["B".into()],
            ],
        )
    }

    #[test]
    fn cell_conversions() {
        assert_eq!(Cell::Text(" 3.5 ".into()).as_f64(), Some(3.5));
        assert_eq!(Cell::Text("abc".into()).as_f64(), None);
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);
        assert_eq!(Cell::Text("  ".into()).level(), None);
        assert_eq!(Cell::Number(-0.0).level(), Some(Level::number(0.0)));
    }

    #[test]
    fn encoding_is_bijective() {
        let cells: Vec<Cell> = vec!["x".into(), "y".into(), "x".into(), 1.0.into(), Cell::Empty];
        let enc = FactorEncoding::from_cells(&cells);
        assert_eq!(enc.len(), 3);
        for code in 0..enc.len() {
            let level = enc.decode(code).expect("code in range");
            assert_eq!(enc.code(level), Some(code));
        }
        assert_eq!(enc.code(&Level::Text("x".into())), Some(0));
        assert!(enc.decode(3).is_none());
    }

    #[test]
    fn unknown_column() {
        let t = table();
        assert!(matches!(t.column("nope"), Err(StatError::Input(_))));
        assert!(group_one_way(&t, "fert", "nope").is_err());
    }

    #[test]
    fn numeric_column_drops_missing() {
        let t = table();
        assert_eq!(t.numeric_column("yield").unwrap(), vec![5.0, 4.0, 7.0, 6.5, 9.0]);
    }

    #[test]
    fn one_way_first_seen_text_order() {
        let g = group_one_way(&table(), "fert", "yield").expect("should group");
        assert_eq!(g.labels(), vec!["B", "A"]);
        assert_eq!(g.groups, vec![vec![5.0, 7.0], vec![4.0, 6.5]]);
    }

    #[test]
    fn one_way_numeric_levels_sorted() {
        let t = DataTable::new(
            vec!["g".into(), "v".into()],
            vec![
                vec![10.0.into(), 1.0.into()],
                vec![2.0.into(), 2.0.into()],
                vec![10.0.into(), 3.0.into()],
            ],
        );
        let g = group_one_way(&t, "g", "v").expect("should group");
        assert_eq!(g.labels(), vec!["2", "10"]);
        assert_eq!(g.groups, vec![vec![2.0], vec![1.0, 3.0]]);
    }

    #[test]
    fn two_way_cells() {
        let g = group_two_way(&table(), "fert", "water", "yield").expect("should group");
        assert_eq!(g.a_labels(), vec!["B", "A"]);
        assert_eq!(g.b_labels(), vec!["low", "high"]);
        assert_eq!(g.cells[0][0], vec![5.0]);
        assert_eq!(g.cells[0][1], vec![7.0]);
        assert_eq!(g.cells[1][0], vec![4.0]);
        assert_eq!(g.cells[1][1], vec![6.5]);
        assert!(group_two_way(&table(), "fert", "fert", "yield").is_err());
    }

    #[test]
    fn two_way_ignores_levels_without_values() {
        let mut t = table();
        t.rows.push(vec!["C".into(), "dry".into(), "n/a".into()]);
        let g = group_two_way(&t, "fert", "water", "yield").expect("should group");
        assert_eq!(g.a_labels(), vec!["B", "A"]);
        assert_eq!(g.b_labels(), vec!["low", "high"]);
        assert!(g.cells.iter().flatten().all(|c| !c.is_empty()));
    }
}
