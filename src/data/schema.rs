use csv::StringRecord;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SeqError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered, named and typed columns of a tabular record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnMeta>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { columns: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns.iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SeqError::Schema(format!("unknown column '{name}'")))
    }

    pub fn column_type(&self, index: usize) -> ColumnType {
        self.columns[index].column_type
    }

    /// Schema with the named columns dropped, plus the indices that remain.
    pub fn without(&self, names: &[String]) -> Result<(Schema, Vec<usize>)> {
        for name in names {
            self.index_of(name)?;
        }
        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].name))
            .collect();
        let columns = kept.iter().map(|&i| self.columns[i].clone()).collect();
        Ok((Schema { columns }, kept))
    }

    /// Parses one raw record, enforcing the column count and integer columns.
    pub fn parse_record(&self, record: &StringRecord) -> Result<Vec<f64>> {
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.len() != self.columns.len() {
            return Err(SeqError::Schema(format!(
                "line {line}: expected {} columns, found {}",
                self.columns.len(),
                record.len()
            )));
        }

        record.iter().zip(self.columns.iter())
            .map(|(raw, meta)| {
                let value = raw.trim();
                let parsed = match meta.column_type {
                    ColumnType::Integer => value.parse::<i64>().map(|v| v as f64).ok(),
                    ColumnType::Double => value.parse::<f64>().ok(),
                };
                parsed.ok_or_else(|| SeqError::Parse {
                    line,
                    column: meta.name.clone(),
                    value: value.to_string(),
                })
            })
            .collect()
    }

    pub fn parse_records(&self, records: &[StringRecord]) -> Result<Vec<Vec<f64>>> {
        records.iter().map(|r| self.parse_record(r)).collect()
    }
}

pub struct SchemaBuilder {
    columns: Vec<ColumnMeta>,
}

impl SchemaBuilder {
    pub fn add_columns_integer(self, names: &[&str]) -> Self {
        self.add_columns(names, ColumnType::Integer)
    }

    pub fn add_columns_double(self, names: &[&str]) -> Self {
        self.add_columns(names, ColumnType::Double)
    }

    fn add_columns(mut self, names: &[&str], column_type: ColumnType) -> Self {
        self.columns.extend(names.iter().map(|name| ColumnMeta { name: name.to_string(), column_type }));
        self
    }

    pub fn build(self) -> Result<Schema> {
        for (i, c) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|other| other.name == c.name) {
                return Err(SeqError::Schema(format!("duplicate column '{}'", c.name)));
            }
        }
        Ok(Schema { columns: self.columns })
    }
}
