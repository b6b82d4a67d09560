//! FILENAME: src/conditional/mod.rs
//! PURPOSE: The conditional-formatting engine.

pub mod dates;
pub mod engine;
pub mod rules;

pub use dates::{date_in_bucket, excel_serial_to_date, DateBucket};
pub use engine::{ComputedCellFormat, ConditionalFormattingEngine, RuleId};
pub use rules::{
    CellValueOperator, ColorScalePoint, DataBarDirection, DataBarRule, IconSetRule, RangeStats, Rule, RuleKind,
    TopBottomKind,
};
