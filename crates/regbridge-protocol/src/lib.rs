pub mod checksum;
pub mod frame;
pub mod response;

pub use checksum::{checksum, hex_dump};
pub use frame::{RequestFrame, RequestKind};
pub use response::Response;
