pub mod convert;
pub mod rates;
pub mod report;
pub mod ui;
