//! Quality trend, dashboard metrics and the composed trend report

mod builder;
mod dashboard;
mod quality;
mod scorer;

pub use builder::*;
pub use dashboard::*;
pub use quality::*;
pub use scorer::*;
