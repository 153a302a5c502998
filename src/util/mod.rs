// Utility modules

pub mod sink;
