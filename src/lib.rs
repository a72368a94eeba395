//! Rusty Predictor: raw tabular text in, trained model evaluation out.
//!
//! ```text
//!  raw text ─▶ data::loader::classify ─▶ data::encoder::encode
//!           ─▶ models::resolve ─▶ predictor::split_and_fit
//!           ─▶ predictor::evaluate ─▶ predictor::render ─▶ Markdown
//! ```
//!
//! Free text and malformed tables skip training and come back tagged.

mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod predictor;

pub use config::TrainOptions;
pub use error::{PredictorError, Result};
pub use pipeline::{load_and_train, run_content, train_model, PipelineOutcome};
