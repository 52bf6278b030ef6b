//! Condition expression language
//!
//! Rule premises are comma-separated lists of facts and parenthesized groups
//! joined by AND / OR / NOT (Russian spellings И / ИЛИ / НЕТ also accepted).
//!
//! ```ignore
//! use cfreason::condition::{parse_condition_text, evaluate_conditions};
//!
//! let premise = parse_condition_text("fever, (cough, sneeze, OR)")?;
//! let cf = evaluate_conditions(&premise, &facts)?;
//! ```

mod ast;
mod evaluator;
mod parser;

pub use ast::{render_conditions, Condition, Operator};
pub use evaluator::{evaluate, evaluate_conditions, is_negated, is_required};
pub use parser::{parse_condition_text, parse_conditions, split_top_level, split_trailing_operator};
