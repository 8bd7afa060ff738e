// src/pdf/mod.rs
pub mod cmap;
pub mod content;
pub mod fonts;
pub mod layout;
pub mod models;
pub mod reader;

#[cfg(test)]
pub mod testutil;

pub use layout::LayoutSettings;
pub use models::{PageContent, Table, TextSpan};
pub use reader::{LopdfReader, PageSource};
