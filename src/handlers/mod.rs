//! The S3 event handlers behind each Lambda binary.

pub mod rasterize;
pub mod submit;

#[cfg(test)]
pub mod testing;
