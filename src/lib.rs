//! Problem Coach - guided problem-statement interviews
//!
//! A stage-graph engine that walks a manager from a vague complaint to a
//! scored problem statement, a cross-department resource plan and an
//! exportable strategy report. Each user turn is one run of the graph over
//! an explicit state value; hosting and persistence sit outside the engine.

pub mod api;
pub mod config;
pub mod db;
pub mod llm;
pub mod oracle;
pub mod prompts;
pub mod runtime;
pub mod stages;
pub mod state_machine;
pub mod tools;
