/// Training and scoring: split and fit, evaluate, render.
///
/// ```text
///  FeatureMatrix + target
///        │
///        ▼
///   ┌──────────┐
///   │ training  │  seeded split → fit on train rows → predict test rows
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ evaluation │  classification / regression metrics (+ plot)
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  report   │  Markdown text
///   └──────────┘
/// ```

pub mod evaluation;
pub mod plot;
pub mod report;
pub mod training;

pub use evaluation::{evaluate, EvaluationResult};
pub use report::render;
pub use training::{split_and_fit, FitOutcome, TrainTestSplit};
