//! Maven repository protocol: POM fetch/parse/merge, version metadata,
//! repository host discovery, artifact transfer, and checksum verification.

pub mod checksum;
pub mod download;
pub mod effective;
pub mod metadata;
pub mod pom;
pub mod registry;
