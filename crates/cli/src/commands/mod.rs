//! CLI commands for the prediction pipeline.

pub mod predict;

pub use predict::{run_predict, PredictArgs};
