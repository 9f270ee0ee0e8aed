pub mod align;
pub mod command;
pub mod matrix;
