use std::collections::BTreeMap;

use tracing::debug;

use crate::data::schema::{ColumnType, Schema};
use crate::error::{Result, SeqError};

/// Ordered sequence of record-level operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    RemoveColumns(Vec<String>),
    /// Groups rows sharing `key` into one sequence per key, ordered by the
    /// numeric `sort_by` column.
    ConvertToSequence { key: String, sort_by: String },
}

/// A validated list of transform steps bound to an input schema.
#[derive(Debug, Clone)]
pub struct TransformProcess {
    initial_schema: Schema,
    final_schema: Schema,
    steps: Vec<TransformStep>,
    /// Column indices (into the initial schema) that survive removal.
    kept: Vec<usize>,
    /// Key and sort column indices in the final schema.
    sequence: Option<(usize, usize)>,
}

pub struct TransformProcessBuilder {
    schema: Schema,
    steps: Vec<TransformStep>,
}

impl TransformProcess {
    pub fn builder(schema: Schema) -> TransformProcessBuilder {
        TransformProcessBuilder { schema, steps: Vec::new() }
    }

    pub fn initial_schema(&self) -> &Schema {
        &self.initial_schema
    }

    pub fn final_schema(&self) -> &Schema {
        &self.final_schema
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Applies the column steps to every record.
    pub fn execute(&self, records: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        records.iter()
            .enumerate()
            .map(|(row, record)| {
                if record.len() != self.initial_schema.len() {
                    return Err(SeqError::Schema(format!(
                        "record {row}: expected {} values, found {}",
                        self.initial_schema.len(),
                        record.len()
                    )));
                }
                Ok(self.kept.iter().map(|&i| record[i]).collect())
            })
            .collect()
    }

    /// Applies the column steps, then groups rows into one sequence per key.
    /// Sequences come out in ascending key order; rows within a sequence are
    /// stably sorted by the sort column.
    pub fn execute_to_sequence(&self, records: &[Vec<f64>]) -> Result<Vec<Vec<Vec<f64>>>> {
        let Some((key_idx, sort_idx)) = self.sequence else {
            return Err(SeqError::Schema("transform process has no convert-to-sequence step".into()));
        };

        let mut groups: BTreeMap<i64, Vec<Vec<f64>>> = BTreeMap::new();
        for row in self.execute(records)? {
            groups.entry(row[key_idx] as i64).or_default().push(row);
        }

        let sequences: Vec<Vec<Vec<f64>>> = groups.into_values()
            .map(|mut rows| {
                rows.sort_by(|a, b| a[sort_idx].total_cmp(&b[sort_idx]));
                rows
            })
            .collect();
        debug!(records = records.len(), sequences = sequences.len(), "converted records to sequences");
        Ok(sequences)
    }
}

impl TransformProcessBuilder {
    pub fn remove_columns(mut self, names: &[&str]) -> Self {
        self.steps.push(TransformStep::RemoveColumns(names.iter().map(|n| n.to_string()).collect()));
        self
    }

    pub fn convert_to_sequence(mut self, key: &str, sort_by: &str) -> Self {
        self.steps.push(TransformStep::ConvertToSequence { key: key.to_string(), sort_by: sort_by.to_string() });
        self
    }

    /// Resolves every step against the evolving schema.
    pub fn build(self) -> Result<TransformProcess> {
        let mut schema = self.schema.clone();
        let mut kept: Vec<usize> = (0..schema.len()).collect();
        let mut sequence = None;

        for (idx, step) in self.steps.iter().enumerate() {
            if sequence.is_some() {
                return Err(SeqError::Schema(format!(
                    "step {idx}: no steps may follow convert-to-sequence"
                )));
            }
            match step {
                TransformStep::RemoveColumns(names) => {
                    let (reduced, local_kept) = schema.without(names)?;
                    kept = local_kept.into_iter().map(|i| kept[i]).collect();
                    schema = reduced;
                }
                TransformStep::ConvertToSequence { key, sort_by } => {
                    let key_idx = schema.index_of(key)?;
                    if schema.column_type(key_idx) != ColumnType::Integer {
                        return Err(SeqError::Schema(format!("sequence key '{key}' must be an integer column")));
                    }
                    sequence = Some((key_idx, schema.index_of(sort_by)?));
                }
            }
        }

        Ok(TransformProcess {
            initial_schema: self.schema,
            final_schema: schema,
            steps: self.steps,
            kept,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process() -> TransformProcess {
        let schema = Schema::builder()
            .add_columns_integer(&["id", "cycle"])
            .add_columns_double(&["a", "b", "c"])
            .add_columns_integer(&["label"])
            .build()
            .unwrap();
        TransformProcess::builder(schema)
            .remove_columns(&["b"])
            .remove_columns(&["c"])
            .convert_to_sequence("id", "cycle")
            .build()
            .unwrap()
    }

    #[test]
    fn removes_columns_across_steps() {
        let tp = process();
        assert_eq!(tp.final_schema().names(), vec!["id", "cycle", "a", "label"]);
        assert_eq!(tp.steps().len(), 3);
        assert_eq!(
            tp.steps()[2],
            TransformStep::ConvertToSequence { key: "id".into(), sort_by: "cycle".into() }
        );
        let out = tp.execute(&[vec![1.0, 1.0, 0.1, 0.2, 0.3, 0.0]]).unwrap();
        assert_eq!(out, vec![vec![1.0, 1.0, 0.1, 0.0]]);
    }

    #[test]
    fn groups_by_key_and_sorts_by_cycle() {
        let records = vec![
            vec![2.0, 2.0, 0.4, 0.0, 0.0, 1.0],
            vec![1.0, 2.0, 0.2, 0.0, 0.0, 0.0],
            vec![2.0, 1.0, 0.3, 0.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.1, 0.0, 0.0, 0.0],
        ];
        let sequences = process().execute_to_sequence(&records).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0], vec![vec![1.0, 1.0, 0.1, 0.0], vec![1.0, 2.0, 0.2, 0.0]]);
        assert_eq!(sequences[1][1], vec![2.0, 2.0, 0.4, 1.0]);
    }

    #[test]
    fn build_rejects_unknown_or_non_integer_keys() {
        let schema = Schema::builder()
            .add_columns_double(&["id", "cycle"])
            .build()
            .unwrap();
        assert!(TransformProcess::builder(schema.clone()).remove_columns(&["x"]).build().is_err());
        assert!(TransformProcess::builder(schema).convert_to_sequence("id", "cycle").build().is_err());
    }

    #[test]
    fn execute_to_sequence_needs_a_sequence_step() {
        let schema = Schema::builder().add_columns_integer(&["id"]).build().unwrap();
        let tp = TransformProcess::builder(schema).build().unwrap();
        assert!(tp.execute_to_sequence(&[vec![1.0]]).is_err());
    }
}
