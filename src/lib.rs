//! SmartRead - technical paper reader core.
//!
//! Submits a paper URL to an extraction backend, keeps the paginated document
//! session in a local single-slot cache, and turns each page into sanitized
//! markup with rendered math and clickable highlight regions.

pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod navigation;
pub mod ocr;
pub mod repository;
pub mod services;

pub use error::{Error, Result};

/// Papers offered as one-click examples, by display name.
pub const EXAMPLE_PAPERS: &[(&str, &str)] = &[
    (
        "AlexNet",
        "https://proceedings.neurips.cc/paper_files/paper/2012/file/c399862d3b9d6b76c8436e924a68c45b-Paper.pdf",
    ),
    ("Attention Is All You Need", "https://arxiv.org/pdf/1706.03762"),
    ("DeepSeek-R1", "https://arxiv.org/pdf/2501.12948"),
];
