pub mod probability;
pub mod settlement;

pub use probability::line_probability;
pub use settlement::grade;
