pub mod canonical;
pub mod fs;
