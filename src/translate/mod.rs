pub mod clause;
pub mod program;

pub use clause::{body_respects_grounding_order, partition_body, translate_clause, translate_subproof};
pub use program::translate_program;
