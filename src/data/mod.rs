/// Data layer: raw content, classification, typed tables and feature encoding.
///
/// Architecture:
/// ```text
///  file / inline text
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sniff delimiter → Tabular(Table) | Text | Malformed
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  typed columns (Numeric | Categorical)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ encoder   │  numeric pass-through + one-hot → FeatureMatrix, target
///   └──────────┘
/// ```

pub mod encoder;
pub mod loader;
pub mod model;
pub mod sample;
pub mod source;
