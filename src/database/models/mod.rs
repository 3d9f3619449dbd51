pub mod order;
pub mod reference;

pub use order::{Order, OrderState};
pub use reference::ReferenceRecord;
