//! The in-memory tabular value passed between all components.
//!
//! Both backends materialize query results into a [`DataTable`]: an ordered
//! sequence of typed, named columns plus row-major cells. Tables are created
//! fresh per request and never mutated after construction; every operation
//! returns a new table.

use serde_json::{Map, Number};

/// Logical type of a [`DataTable`] column.
///
/// Tagged once when the table is built (see [`DataTable::with_inferred_types`])
/// and carried with the table, rather than re-derived by each consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// UTF-8 text.
    Text,
}

/// A single named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A single cell value in a [`DataTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty cell.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

impl Value {
    /// Canonical text form of a value.
    ///
    /// Integer-valued floats lose their trailing `.0` so that `1992.0` and
    /// `1992` render identically. `Null` renders as the empty string.
    pub fn canonical_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Text(s) => s.clone(),
        }
    }

    /// String-equality comparison used by [`DataTable::filter_equals`].
    ///
    /// `Null` never matches, not even the empty string.
    pub fn eq_str(&self, other: &str) -> bool {
        match self {
            Value::Null => false,
            _ => self.canonical_text() == other,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::Number(Number::from(*i)),
            Value::Float(f) => match Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => serde_json::Value::Null,
            },
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Immutable in-memory table: ordered named columns plus row-major cells.
///
/// Invariant: every row has exactly as many cells as there are columns, and
/// column names are unique within a table. Construction sites are expected to
/// uphold name uniqueness; row width is asserted.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Create a table from typed columns and rows.
    ///
    /// # Panics
    ///
    /// Panics if any row's length differs from the column count.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        for row in &rows {
            assert!(
                row.len() == columns.len(),
                "row length {} does not match column count {}",
                row.len(),
                columns.len()
            );
        }
        Self { columns, rows }
    }

    /// Build a table from raw rows, inferring each column's type from its
    /// cells and coercing every cell to the inferred type.
    ///
    /// Inference per column, looking at non-null cells only:
    ///
    /// - all numeric and integer-valued → [`ColumnType::Integer`]
    /// - all numeric → [`ColumnType::Float`]
    /// - anything else (or no cells at all) → [`ColumnType::Text`]
    pub fn with_inferred_types(names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let columns: Vec<Column> = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells = rows.iter().map(|row| &row[idx]);
                Column::new(name, infer_column_type(cells))
            })
            .collect();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(columns.iter())
                    .map(|(value, column)| coerce(value, column.column_type))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows as cell slices, in column order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|row| row.as_slice())
    }

    /// Returns the subset of rows where `column` equals `value` exactly,
    /// compared by canonical string form.
    ///
    /// If `column` does not exist, the result has the same columns and zero
    /// rows; callers that need to distinguish a missing column check
    /// [`DataTable::index_of`] first.
    pub fn filter_equals(&self, column: &str, value: &str) -> Self {
        let Some(idx) = self.index_of(column) else {
            return Self {
                columns: self.columns.clone(),
                rows: Vec::new(),
            };
        };
        let rows = self
            .rows
            .iter()
            .filter(|row| row[idx].eq_str(value))
            .cloned()
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Returns a new table without the named columns.
    ///
    /// Used to drop internal filter columns before serialization. Names that
    /// are not present are ignored.
    pub fn project_out(&self, drop: &[&str]) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !drop.contains(&self.columns[i].name.as_str()))
            .collect();
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Serialize rows as JSON objects keyed by column name, in row order.
    pub fn to_records(&self) -> Vec<Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, value)| (column.name.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }
}

fn infer_column_type<'a>(cells: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut saw_value = false;
    let mut all_integer = true;
    let mut all_numeric = true;

    for cell in cells {
        match cell {
            Value::Null => {}
            Value::Integer(_) => saw_value = true,
            Value::Float(f) => {
                saw_value = true;
                if f.fract() != 0.0 || !f.is_finite() {
                    all_integer = false;
                }
            }
            Value::Text(_) => {
                saw_value = true;
                all_integer = false;
                all_numeric = false;
            }
        }
    }

    if !saw_value {
        ColumnType::Text
    } else if !all_numeric {
        ColumnType::Text
    } else if all_integer {
        ColumnType::Integer
    } else {
        ColumnType::Float
    }
}

fn coerce(value: Value, column_type: ColumnType) -> Value {
    match (&value, column_type) {
        (Value::Null, _) => Value::Null,
        (Value::Float(f), ColumnType::Integer) => Value::Integer(*f as i64),
        (Value::Integer(i), ColumnType::Float) => Value::Float(*i as f64),
        (Value::Integer(_), ColumnType::Text) | (Value::Float(_), ColumnType::Text) => {
            Value::Text(value.canonical_text())
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, ColumnType, DataTable, Value};

    fn sample_table() -> DataTable {
        let columns = vec![
            Column::new("Land", ColumnType::Text),
            Column::new("NUTS 1", ColumnType::Text),
            Column::new("1992", ColumnType::Float),
        ];
        let rows = vec![
            vec![
                Value::Text("Baden-Württemberg".to_string()),
                Value::Text("1".to_string()),
                Value::Float(254.5),
            ],
            vec![
                Value::Text("Bayern".to_string()),
                Value::Text("1".to_string()),
                Value::Float(312.25),
            ],
            vec![
                Value::Text("Stuttgart".to_string()),
                Value::Text("2".to_string()),
                Value::Null,
            ],
        ];
        DataTable::new(columns, rows)
    }

    #[test]
    fn filter_equals_keeps_matching_rows_only() {
        let table = sample_table();
        let out = table.filter_equals("NUTS 1", "1");

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.columns(), table.columns());
        // Original unchanged
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn filter_equals_on_missing_column_is_empty() {
        let table = sample_table();
        let out = table.filter_equals("NUTS 9", "1");
        assert!(out.is_empty());
        assert_eq!(out.columns(), table.columns());
    }

    #[test]
    fn filter_equals_compares_numeric_cells_by_canonical_text() {
        let table = DataTable::new(
            vec![Column::new("NUTS 2", ColumnType::Integer)],
            vec![vec![Value::Integer(2)], vec![Value::Integer(3)]],
        );
        assert_eq!(table.filter_equals("NUTS 2", "2").row_count(), 1);
    }

    #[test]
    fn project_out_drops_named_columns_and_cells() {
        let table = sample_table();
        let out = table.project_out(&["NUTS 1", "not-there"]);

        assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["Land", "1992"]);
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.rows().next().unwrap().len(), 2);
    }

    #[test]
    fn with_inferred_types_tags_and_coerces_columns() {
        let names = vec!["id".to_string(), "value".to_string(), "code".to_string()];
        let rows = vec![
            vec![
                Value::Float(1.0),
                Value::Float(10.5),
                Value::Text("DE1".to_string()),
            ],
            vec![Value::Float(2.0), Value::Integer(4), Value::Null],
        ];
        let table = DataTable::with_inferred_types(names, rows);

        let types: Vec<_> = table.columns().iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![ColumnType::Integer, ColumnType::Float, ColumnType::Text]
        );
        // Whole-number floats become integers, integers in float columns widen.
        assert_eq!(table.rows().next().unwrap()[0], Value::Integer(1));
        assert_eq!(table.rows().nth(1).unwrap()[1], Value::Float(4.0));
    }

    #[test]
    fn null_never_matches_filter() {
        let table = DataTable::new(
            vec![Column::new("NUTS 3", ColumnType::Text)],
            vec![vec![Value::Null]],
        );
        assert!(table.filter_equals("NUTS 3", "").is_empty());
    }

    #[test]
    fn to_records_emits_one_object_per_row() {
        let table = sample_table();
        let records = table.to_records();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].get("Land"),
            Some(&serde_json::Value::String("Baden-Württemberg".to_string()))
        );
        assert_eq!(records[2].get("1992"), Some(&serde_json::Value::Null));
    }
}
