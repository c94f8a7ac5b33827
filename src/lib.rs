//! Ordered, literal find/replace over a cell range of one worksheet in an
//! `.xlsx` workbook, written back to the same file.
pub mod config;
pub mod engine;
pub mod error;
pub mod excel;
pub mod logging;
pub mod path_policy;
pub mod range;
pub mod rules;
pub mod substitute;
