/// Data layer: plot records, directory listing, and filtering.
///
/// Architecture:
/// ```text
///  <root>/<use_case>/*.svg  (+ optional <stem>.json sidecars)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  list use cases, derive PlotRecord per file
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ PlotRecord  │  image path, outlier flag, std, sorted by name
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  search / outlier / zero-std predicates → PageResult
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
