// Evaluator: turns IR-R statements into mutations over materialized
// relation storage.

pub mod context;
pub mod env;
pub mod exec;
pub mod expr;
pub mod functors;
pub mod io;
pub mod relation;
pub mod subroutine;

pub use context::Context;
pub use env::RelationEnv;
pub use exec::eval_statement;
pub use subroutine::SubroutineTable;
