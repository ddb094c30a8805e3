use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tabml_core::{Column, FieldKind, MlError, MlResult, Schema, Table};
use tracing::{debug, info};

/// Loads delimited text into a [`Table`] according to a positional [`Schema`].
///
/// The first bad value aborts the whole load; nothing is skipped.
#[derive(Debug, Clone)]
pub struct TextLoader {
    schema: Schema,
    delimiter: u8,
    has_header: bool,
}

impl TextLoader {
    pub fn new(schema: Schema) -> Self {
        TextLoader {
            schema,
            delimiter: b',',
            has_header: true,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Whether the first line is a header. Header names are ignored; columns
    /// are always taken by position.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn load(&self, path: impl AsRef<Path>) -> MlResult<Table> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = self.read(file, path)?;
        info!(path = %path.display(), rows = table.n_rows(), cols = table.n_cols(), "loaded table");
        Ok(table)
    }

    pub fn load_from_reader<R: Read>(&self, reader: R) -> MlResult<Table> {
        self.read(reader, Path::new("<reader>"))
    }

    fn read<R: Read>(&self, reader: R, source: &Path) -> MlResult<Table> {
        self.schema.validate()?;
        let min_width = self.schema.max_index().map_or(0, |i| i + 1);
        let fields = self.schema.fields();

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut columns: Vec<Column> = fields
            .iter()
            .map(|f| match f.kind {
                FieldKind::Text => Column::Text(Vec::new()),
                FieldKind::Numeric | FieldKind::Boolean => Column::Numeric(Vec::new()),
            })
            .collect();

        let mut record = csv::StringRecord::new();
        loop {
            match rdr.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => return Err(csv_error(e, source)),
            }
            let line = record.position().map_or(0, |p| p.line());
            if record.len() < min_width {
                return Err(MlError::Malformed {
                    line: Some(line),
                    message: format!("expected at least {} fields, found {}", min_width, record.len()),
                });
            }

            for (field, column) in fields.iter().zip(columns.iter_mut()) {
                let raw = &record[field.index];
                match column {
                    Column::Text(values) => values.push(raw.to_string()),
                    Column::Numeric(values) => {
                        let parsed = match field.kind {
                            FieldKind::Boolean => parse_bool(raw),
                            _ => raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
                        };
                        let value = parsed.ok_or_else(|| MlError::Parse {
                            line,
                            column: field.index,
                            field: field.name.clone(),
                            value: raw.to_string(),
                        })?;
                        values.push(value);
                    }
                    Column::Vector(_) => {}
                }
            }
        }

        let table = Table::from_columns(
            fields
                .iter()
                .map(|f| f.name.clone())
                .zip(columns)
                .collect(),
        )?;
        debug!(source = %source.display(), rows = table.n_rows(), "parsed records");
        Ok(table)
    }
}

fn parse_bool(raw: &str) -> Option<f64> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "spam" => Some(1.0),
        "false" | "0" | "no" | "ham" => Some(0.0),
        _ => None,
    }
}

fn csv_error(err: csv::Error, source: &Path) -> MlError {
    let line = err.position().map(|p| p.line());
    match err.into_kind() {
        csv::ErrorKind::Io(e) => MlError::Io {
            path: source.to_path_buf(),
            source: e,
        },
        csv::ErrorKind::Utf8 { err, .. } => MlError::Malformed {
            line,
            message: format!("invalid UTF-8: {}", err),
        },
        other => MlError::Malformed {
            line,
            message: format!("{:?}", other),
        },
    }
}

/// Write the scalar columns of `table` as delimited text with a header row.
/// Vector columns have no scalar representation and are skipped.
pub fn write_csv<W: Write>(table: &Table, writer: W, delimiter: u8) -> MlResult<()> {
    let target = PathBuf::from("<writer>");
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    let scalar: Vec<(&str, &Column)> = table
        .iter()
        .filter(|(_, c)| !matches!(c, Column::Vector(_)))
        .collect();

    wtr.write_record(scalar.iter().map(|(name, _)| *name))
        .map_err(|e| csv_error(e, &target))?;
    for i in 0..table.n_rows() {
        let row = scalar.iter().map(|(_, column)| match column {
            Column::Numeric(v) => v[i].to_string(),
            Column::Text(v) => v[i].clone(),
            Column::Vector(_) => String::new(),
        });
        wtr.write_record(row).map_err(|e| csv_error(e, &target))?;
    }
    wtr.flush().map_err(|source| MlError::Io { path: target, source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn houses_schema() -> Schema {
        Schema::new()
            .numeric(1, "Bathrooms")
            .numeric(2, "Bedrooms")
            .label(3, FieldKind::Numeric)
            .text(4, "UseCode")
    }

    const HOUSES: &str = "\
Id,Bathrooms,Bedrooms,LastSoldPrice,UseCode
1,1,1,665000,Condominium
2, 2.5 ,3,1200000,\"Single, Family\"
";

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HOUSES.as_bytes()).unwrap();

        let table = TextLoader::new(houses_schema()).load(file.path()).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column_names(), &["Bathrooms", "Bedrooms", "Label", "UseCode"]);
        assert_eq!(table.numeric("Bathrooms").unwrap(), &[1.0, 2.5]);
        assert_eq!(table.numeric("Label").unwrap(), &[665000.0, 1200000.0]);
        assert_eq!(table.text("UseCode").unwrap()[1], "Single, Family");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        match TextLoader::new(houses_schema()).load(&missing) {
            Err(MlError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_aborts_load() {
        let data = "Id,Bathrooms,Bedrooms,LastSoldPrice,UseCode\n1,1,1,665000,Condo\n2,two,3,1,Condo\n";
        match TextLoader::new(houses_schema()).load_from_reader(data.as_bytes()) {
            Err(MlError::Parse { line, column, field, value }) => {
                assert_eq!(line, 3);
                assert_eq!(column, 1);
                assert_eq!(field, "Bathrooms");
                assert_eq!(value, "two");
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_numbers_abort_load() {
        for cell in ["NaN", "inf", "-inf"] {
            let data = format!("Id,Bathrooms,Bedrooms,LastSoldPrice,UseCode\n1,1,1,665000,Condo\n2,1,1,{},Condo\n", cell);
            match TextLoader::new(houses_schema()).load_from_reader(data.as_bytes()) {
                Err(MlError::Parse { line, field, value, .. }) => {
                    assert_eq!(line, 3);
                    assert_eq!(field, "Label");
                    assert_eq!(value, cell);
                }
                other => panic!("expected Parse error for {}, got {:?}", cell, other),
            }
        }
    }

    #[test]
    fn test_short_record_is_malformed() {
        let data = "Id,Bathrooms,Bedrooms,LastSoldPrice,UseCode\n1,1,1\n";
        assert!(matches!(
            TextLoader::new(houses_schema()).load_from_reader(data.as_bytes()),
            Err(MlError::Malformed { line: Some(2), .. })
        ));
    }

    #[test]
    fn test_boolean_labels_and_no_header() {
        let schema = Schema::new().label(0, FieldKind::Boolean).text(1, "Text");
        let data = "spam;Win cash now\nham;Lunch?\nTRUE;Free $$$\n0;ok\n";
        let table = TextLoader::new(schema)
            .delimiter(b';')
            .has_header(false)
            .load_from_reader(data.as_bytes())
            .unwrap();
        assert_eq!(table.numeric("Label").unwrap(), &[1.0, 0.0, 1.0, 0.0]);
        assert_eq!(table.text("Text").unwrap()[2], "Free $$$");

        let bad = Schema::new().label(0, FieldKind::Boolean);
        assert!(matches!(
            TextLoader::new(bad).has_header(false).load_from_reader("maybe\n".as_bytes()),
            Err(MlError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let schema = Schema::new().numeric(0, "A").numeric(0, "B");
        assert!(TextLoader::new(schema).load_from_reader("1\n".as_bytes()).is_err());
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let table = TextLoader::new(houses_schema())
            .load_from_reader(HOUSES.as_bytes())
            .unwrap()
            .with_column("Extra", Column::Vector(tabml_core::Tensor::zeros(vec![2, 3])))
            .unwrap();

        let mut file = NamedTempFile::new().unwrap();
        write_csv(&table, &mut file, b',').unwrap();
        file.flush().unwrap();

        let schema = Schema::new()
            .numeric(0, "Bathrooms")
            .numeric(1, "Bedrooms")
            .label(2, FieldKind::Numeric)
            .text(3, "UseCode");
        let reloaded = TextLoader::new(schema).load(file.path()).unwrap();
        assert!(!reloaded.has_column("Extra"));
        for name in ["Bathrooms", "Bedrooms", "Label"] {
            for (a, b) in table.numeric(name).unwrap().iter().zip(reloaded.numeric(name).unwrap()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
        assert_eq!(table.text("UseCode").unwrap(), reloaded.text("UseCode").unwrap());
    }
}
