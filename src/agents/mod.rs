//! Agent System
//!
//! The two LLM-backed collaborators of the question pipeline:
//!
//! - **SQL agent**: question + schema context → one SQL statement (or a refusal)
//! - **Analyst agent**: question + query result table → short analytical report
//!
//! Both are reached through capability traits so the orchestrator can be
//! driven by any provider, including test doubles.

pub mod analyst;
pub mod sql;

pub use analyst::{AnalystAgent, ReportSynthesizer};
pub use sql::{build_instruction, is_refusal, LlmSqlAgent, SqlAgent, REFUSAL_MARKER, REFUSAL_PHRASE};
