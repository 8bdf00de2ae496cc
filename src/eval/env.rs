// Run-time relation environment: owns every relation (including the
// `@delta_`/`@new_` auxiliaries a recursive SCC needs), the process-wide
// symbol and record tables, and the diagnostics sink. Plays the same
// "owns every relation plus the shared interning tables" role as a
// fixed-schema reasoner instance, generalized here to IR-R's explicit
// relation-reference model instead of a fixed positive-Datalog schema.

use crate::config::Config;
use crate::error::Diagnostics;
use crate::eval::functors::{NoUserFunctors, UserFunctors};
use crate::eval::io::{InMemoryReaderWriter, ReaderWriter};
use crate::eval::relation::Relation;
use crate::models::record_table::RecordTable;
use crate::models::relation::RelationId;
use crate::models::symbol_table::SymbolTable;
use dashmap::DashMap;
use std::sync::Arc;

pub struct RelationEnv {
    relations: DashMap<RelationId, Arc<Relation>, ahash::RandomState>,
    pub symbols: SymbolTable,
    pub records: RecordTable,
    pub config: Config,
    pub diagnostics: Diagnostics,
    pub user_functors: Arc<dyn UserFunctors>,
    pub reader_writer: Arc<dyn ReaderWriter>,
}

impl RelationEnv {
    pub fn new(config: Config) -> Self {
        Self {
            relations: DashMap::default(),
            symbols: SymbolTable::new(),
            records: RecordTable::new(),
            config,
            diagnostics: Diagnostics::new(),
            user_functors: Arc::new(NoUserFunctors),
            reader_writer: Arc::new(InMemoryReaderWriter::new()),
        }
    }

    pub fn with_user_functors(mut self, table: Arc<dyn UserFunctors>) -> Self {
        self.user_functors = table;
        self
    }

    pub fn with_reader_writer(mut self, reader_writer: Arc<dyn ReaderWriter>) -> Self {
        self.reader_writer = reader_writer;
        self
    }

    /// Registers `relation`, building one `Spine` index per order in
    /// `orders` (falling back to a single full-arity order when empty --
    /// a relation that never participates in a search still needs at
    /// least one index to iterate).
    pub fn create(&self, relation: crate::models::relation::RelationRef, orders: Vec<Vec<usize>>) {
        let name = relation.name.clone();
        self.relations.insert(name, Arc::new(Relation::new(relation, orders)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Relation>> {
        self.relations.get(name).map(|r| r.clone())
    }

    pub fn drop_relation(&self, name: &str) {
        self.relations.remove(name);
    }

    pub fn names(&self) -> Vec<RelationId> {
        self.relations.iter().map(|e| e.key().clone()).collect()
    }
}
