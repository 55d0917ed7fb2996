//! Transformation module.
//!
//! - Dates: permissive date coercion to `MM/DD/YYYY`
//! - Grouper: first-seen grouping and header synthesis
//! - Restructure: the Header/Lumpsum restructuring engine
//! - Pipeline: per-file and batch processing around the engine

pub mod dates;
pub mod grouper;
pub mod pipeline;
pub mod restructure;

pub use dates::{normalize_date, parse_date, ParsedDate, CANONICAL_FORMAT};
pub use grouper::{synthesize_headers, Groups};
pub use restructure::{normalize_dates, restructure, restructure_with, GroupOrder, RestructureOptions, Restructured};
