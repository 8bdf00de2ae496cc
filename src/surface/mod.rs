// Surface-syntax test fixture builder. Not part of the production
// contract -- only `tests/` and this module's own unit tests should
// construct a `Program` this way.

pub mod lexer;
pub mod parser;

pub use lexer::SurfaceToken;
pub use parser::parse_program;
