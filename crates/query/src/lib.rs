//! Splits annotated query files into `-- name: X :verb` blocks and parses
//! each block's SQL into a verb, parameter list, result-column list, and
//! CTE names.

mod offset;
mod parser;
mod slicer;
mod verb;

pub use offset::byte_offset;
pub use parser::{is_simple_column_ref, parse_query, ParamStyle, Parameter, QueryModel, ResultColumn};
pub use slicer::{slice_blocks, Block};
pub use verb::{BlockVerb, StatementVerb};
