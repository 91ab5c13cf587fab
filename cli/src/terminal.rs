pub mod colors;
pub mod print;
