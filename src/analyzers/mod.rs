//! Delay aggregation.
//!
//! Each table in [`aggregate`] is a pure function of the cleaned record set;
//! [`analyzer::analyze`] runs them all and collects the outcomes into a
//! [`types::DelayReport`].

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;
