//! Report rendering.

pub mod charts;

pub use charts::ReportRenderer;
