//! Subway delay dataset cleaning and aggregation.
//!
//! [`parser`] reads the raw export, [`cleaner`] normalizes column names and
//! recodes line codes, and [`analyzers`] derives the report tables that
//! [`output`] hands to the presentation layer.

pub mod analyzers;
pub mod cleaner;
pub mod error;
pub mod fetch;
pub mod lines;
pub mod output;
pub mod parser;
pub mod record;
