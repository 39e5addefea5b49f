pub mod ecb;

pub use ecb::EcbSource;
