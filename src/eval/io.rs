// Reader/writer capability. Concrete I/O format adapters (CSV, TSV,
// custom) are an external collaborator -- this module only defines the
// capability boundary the evaluator's `Load`/`Store` statements call
// through, plus the directive vocabulary those statements carry, and an
// in-memory capability used by tests and as a default for hosts that
// haven't wired a real adapter yet.

use crate::eval::relation::StoredTuple;
use crate::models::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum IoKind {
    File,
    Stdin,
    Stdout,
    StdoutPrintSize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DirectiveOperation {
    Input,
    Output,
    PrintSize,
}

/// One column's type descriptor, enough to tell a reader whether to parse
/// a field as a symbol or a number (and recurse for record sub-schemas).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ColumnTypeDescriptor {
    Signed,
    Unsigned,
    Float,
    Symbol,
    Record(Vec<ColumnTypeDescriptor>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Directives {
    pub io: IoKind,
    pub filename: Option<String>,
    pub name: String,
    pub delimiter: String,
    pub headers: bool,
    pub types: Vec<ColumnTypeDescriptor>,
    pub operation: DirectiveOperation,
    pub attribute_names: Vec<String>,
}

impl Directives {
    pub fn from_json(params: &str) -> serde_json::Result<Self> {
        serde_json::from_str(params)
    }
}

/// External capability: given directives, produce or consume a stream of
/// tuples for one relation. A host embeds a concrete file/CSV adapter
/// behind this trait; `Statement::Load`/`Statement::Store` only see the
/// trait object.
pub trait ReaderWriter: Send + Sync {
    fn read(&self, directives: &Directives) -> std::io::Result<Vec<Vec<Value>>>;
    fn write(&self, directives: &Directives, rows: &[StoredTuple]) -> std::io::Result<()>;
}

/// In-memory capability keyed by relation name -- used by tests and as a
/// placeholder default so `Load`/`Store` are exercisable without wiring a
/// real file adapter.
#[derive(Default)]
pub struct InMemoryReaderWriter {
    tables: Mutex<HashMap<String, Vec<Vec<Value>>>>,
}

impl InMemoryReaderWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, name: &str, rows: Vec<Vec<Value>>) {
        self.tables.lock().unwrap().insert(name.to_string(), rows);
    }

    pub fn take(&self, name: &str) -> Vec<Vec<Value>> {
        self.tables.lock().unwrap().get(name).cloned().unwrap_or_default()
    }
}

impl ReaderWriter for InMemoryReaderWriter {
    fn read(&self, directives: &Directives) -> std::io::Result<Vec<Vec<Value>>> {
        Ok(self.tables.lock().unwrap().get(&directives.name).cloned().unwrap_or_default())
    }

    fn write(&self, directives: &Directives, rows: &[StoredTuple]) -> std::io::Result<()> {
        let materialized: Vec<Vec<Value>> = rows.iter().map(|t| t.to_vec()).collect();
        self.tables.lock().unwrap().insert(directives.name.clone(), materialized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_capability_round_trips_seeded_rows() {
        let capability = InMemoryReaderWriter::new();
        capability.seed("edge", vec![vec![Value::Signed(1), Value::Signed(2)]]);
        let directives = Directives {
            io: IoKind::File,
            filename: None,
            name: "edge".to_string(),
            delimiter: "\t".to_string(),
            headers: false,
            types: vec![ColumnTypeDescriptor::Signed, ColumnTypeDescriptor::Signed],
            operation: DirectiveOperation::Input,
            attribute_names: vec!["a".to_string(), "b".to_string()],
        };
        let rows = capability.read(&directives).unwrap();
        assert_eq!(rows, vec![vec![Value::Signed(1), Value::Signed(2)]]);
    }

    #[test]
    fn directives_parse_from_json() {
        let json = r#"{
            "io": "File", "filename": "edge.facts", "name": "edge",
            "delimiter": "\t", "headers": false,
            "types": ["Signed", "Signed"], "operation": "Input",
            "attribute_names": ["a", "b"]
        }"#;
        let directives = Directives::from_json(json).unwrap();
        assert_eq!(directives.name, "edge");
    }
}
