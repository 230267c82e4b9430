// Pure domain rules, no I/O

pub mod leveling;
pub mod pricing;
pub mod rewards;

pub use leveling::*;
pub use pricing::*;
pub use rewards::*;
