pub mod cursor;
pub mod key;
pub mod sort;
pub mod step;
