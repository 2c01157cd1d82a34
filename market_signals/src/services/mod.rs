pub mod export;
pub mod forecast;
pub mod indicators;
pub mod pipeline;
pub mod regression;
pub mod sentiment;
pub mod signals;
pub mod statistics;

pub use pipeline::{AnalysisPipeline, PipelineSettings};
pub use sentiment::{LexiconScorer, PolarityScorer};
