pub mod sheet;

pub use sheet::TipSheet;
