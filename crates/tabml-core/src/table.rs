use crate::error::{MlError, MlResult};
use crate::row::{Row, Value};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// A single typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
    /// Fixed-width numeric vectors, shape `[rows, width]`.
    Vector(Tensor<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Vector(t) => t.rows().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
            Column::Vector(_) => "vector",
        }
    }

    /// Number of feature slots one row contributes (1 for scalars).
    pub fn width(&self) -> usize {
        match self {
            Column::Vector(t) => t.cols().unwrap_or(0),
            _ => 1,
        }
    }

    /// Gather rows by index in the given order.
    pub fn select(&self, indices: &[usize]) -> MlResult<Column> {
        let n = self.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(MlError::IndexOutOfBounds { index: bad, axis: 0, size: n });
        }
        Ok(match self {
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(indices.iter().map(|&i| v[i].clone()).collect()),
            Column::Vector(t) => Column::Vector(t.select_rows(indices)?),
        })
    }
}

/// Columnar, immutable in-memory table. Every operation that changes the
/// column set returns a new table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Column)>) -> MlResult<Self> {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push(name, column)?;
        }
        Ok(table)
    }

    /// Build a one-row table from a prediction input.
    pub fn from_row(row: &Row) -> Self {
        let mut table = Table::new();
        for (name, value) in row.iter() {
            let column = match value {
                Value::Number(v) => Column::Numeric(vec![*v]),
                Value::Text(s) => Column::Text(vec![s.clone()]),
            };
            table.names.push(name.to_string());
            table.columns.push(column);
        }
        table.n_rows = if table.columns.is_empty() { 0 } else { 1 };
        table
    }

    fn push(&mut self, name: String, column: Column) -> MlResult<()> {
        if self.names.contains(&name) {
            return Err(MlError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(MlError::RowCount {
                column: name,
                expected: self.n_rows,
                found: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Return a copy with `column` added, replacing any column of the same name.
    pub fn with_column(&self, name: &str, column: Column) -> MlResult<Table> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(MlError::RowCount {
                column: name.to_string(),
                expected: self.n_rows,
                found: column.len(),
            });
        }
        let mut out = self.clone();
        match out.names.iter().position(|n| n == name) {
            Some(i) => out.columns[i] = column,
            None => out.push(name.to_string(), column)?,
        }
        Ok(out)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterate `(name, column)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> MlResult<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| MlError::MissingColumn {
                column: name.to_string(),
                available: self.names.clone(),
            })
    }

    pub fn numeric(&self, name: &str) -> MlResult<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            other => Err(type_error(name, "numeric", other)),
        }
    }

    pub fn text(&self, name: &str) -> MlResult<&[String]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            other => Err(type_error(name, "text", other)),
        }
    }

    /// A numeric or vector column as a `[rows, width]` matrix.
    pub fn matrix(&self, name: &str) -> MlResult<Tensor<f64>> {
        match self.column(name)? {
            Column::Numeric(v) => Tensor::new(v.clone(), vec![v.len(), 1]),
            Column::Vector(t) => Ok(t.clone()),
            other => Err(type_error(name, "numeric or vector", other)),
        }
    }

    /// Gather rows by index, keeping every column.
    pub fn select_rows(&self, indices: &[usize]) -> MlResult<Table> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.select(indices))
            .collect::<MlResult<Vec<_>>>()?;
        Ok(Table {
            names: self.names.clone(),
            columns,
            n_rows: indices.len(),
        })
    }
}

fn type_error(name: &str, expected: &'static str, found: &Column) -> MlError {
    MlError::ColumnType {
        column: name.to_string(),
        expected,
        found: found.kind_name(),
    }
}
