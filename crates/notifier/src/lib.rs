pub mod render;
pub mod transport;
pub mod worker;
