pub mod analyzer;
pub mod handlers;
pub mod prompts;

pub use analyzer::{AnalysisError, AnalysisReport, JobAnalyzer};
