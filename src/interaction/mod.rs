pub mod expansion;
pub mod presenter;
