pub mod client;
pub mod multipart;
pub mod presign;
pub mod store;

pub use client::S3Client;
pub use presign::{DEFAULT_PRESIGN_TTL, MAX_PRESIGN_TTL};
pub use store::ObjectStore;
