pub mod locate;
pub mod report;
pub mod symbols;

pub use locate::*;
pub use report::*;
pub use symbols::*;
