/// Data layer: core types, loading, selection and validation.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ResultTable
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ ResultTable │  typed columns, unique-value index
///   └─────────────┘
///        │                      │
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │ dataset   │          │  select   │  metadata values → feature ids
///   └──────────┘          └──────────┘
///   validated effect / significance / mean arrays
/// ```

pub mod dataset;
pub mod loader;
pub mod model;
pub mod select;
