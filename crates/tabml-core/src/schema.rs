use crate::error::{MlError, MlResult};
use serde::{Deserialize, Serialize};

/// Canonical name of the label column.
pub const LABEL_COLUMN: &str = "Label";

/// Type of a field in a delimited source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Parsed as `f64`.
    Numeric,
    /// Taken verbatim.
    Text,
    /// Parsed from `true/false`, `1/0`, `yes/no` or `spam/ham`; stored as 1.0 / 0.0.
    Boolean,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// One positional column of the source file mapped to a named table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Zero-based position in each record.
    pub index: usize,
    /// Column name in the loaded table.
    pub name: String,
    pub kind: FieldKind,
}

/// Declared record layout: which source positions become which columns,
/// and which one is the label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
    label: Option<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, index: usize, name: &str, kind: FieldKind) -> Self {
        self.fields.push(Field {
            index,
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn numeric(self, index: usize, name: &str) -> Self {
        self.push(index, name, FieldKind::Numeric)
    }

    pub fn text(self, index: usize, name: &str) -> Self {
        self.push(index, name, FieldKind::Text)
    }

    pub fn boolean(self, index: usize, name: &str) -> Self {
        self.push(index, name, FieldKind::Boolean)
    }

    /// Designate the field at `index` as the label, stored under [`LABEL_COLUMN`].
    pub fn label(self, index: usize, kind: FieldKind) -> Self {
        self.label_named(index, LABEL_COLUMN, kind)
    }

    /// Designate the field at `index` as the label under an explicit name.
    pub fn label_named(mut self, index: usize, name: &str, kind: FieldKind) -> Self {
        self.label = Some(name.to_string());
        self.push(index, name, kind)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Name of the label column, if one was declared.
    pub fn label_column(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Highest source position referenced; records must be at least this wide.
    pub fn max_index(&self) -> Option<usize> {
        self.fields.iter().map(|f| f.index).max()
    }

    /// Reject empty schemas and duplicate names or positions.
    pub fn validate(&self) -> MlResult<()> {
        if self.fields.is_empty() {
            return Err(MlError::InvalidConfig("schema declares no fields".into()));
        }
        for (i, f) in self.fields.iter().enumerate() {
            for other in &self.fields[i + 1..] {
                if other.name == f.name {
                    return Err(MlError::DuplicateColumn(f.name.clone()));
                }
                if other.index == f.index {
                    return Err(MlError::InvalidConfig(format!(
                        "fields '{}' and '{}' both read column {}",
                        f.name, other.name, f.index
                    )));
                }
            }
        }
        Ok(())
    }
}
