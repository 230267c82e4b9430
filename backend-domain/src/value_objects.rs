// Domain value objects
pub mod currency_kind;
pub mod identifiers;
pub mod item_status;

pub use currency_kind::*;
pub use identifiers::*;
pub use item_status::*;
