//! Data types for the grid model, style bundles and analysis reports.

mod cell;
mod report;
mod style;
mod workbook;

pub use cell::*;
pub use report::*;
pub use style::*;
pub use workbook::*;
