pub mod markdown;
pub mod net;
