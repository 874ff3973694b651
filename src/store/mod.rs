pub mod diary;
pub mod weather;

pub use diary::*;
pub use weather::*;
