pub mod io;
pub mod orientation;
pub mod stats;
pub mod version;
