//! OCR intake for uploaded PDFs.
//!
//! This crate builds two S3-triggered Lambda functions that share most of
//! their plumbing: `rasterizer` renders each uploaded PDF to one JPEG per
//! page, and `ocr-submitter` starts an asynchronous Textract job per upload
//! and publishes a JSON listing of the rendered pages.

pub mod aws;
pub mod config;
pub mod handlers;
pub mod naming;
pub mod pages;
pub mod prelude;
pub mod response;
pub mod storage;
pub mod textract;
