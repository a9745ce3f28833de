//! Core library for hatena-md
//!
//! This crate implements the **Functional Core** of the hatena-md
//! application: pure transformation functions with zero I/O. The companion
//! `hatena-md` crate is the Imperative Shell that performs the file system
//! and network operations and orchestrates the functions defined here.
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`frontmatter`]: YAML front-matter split/compose for Markdown files
//! - [`entry`]: the blog entry document model and output-path derivation
//! - [`images`]: Markdown image reference and Fotolife embed-token scanning
//! - [`tex`]: display-math transcoding between `$$` blocks and `[tex:]` embeds
//! - [`atom`]: AtomPub entry payload construction and response parsing
//! - [`wsse`]: WSSE authentication header derivation

pub mod atom;
pub mod entry;
pub mod error;
pub mod frontmatter;
pub mod images;
pub mod tex;
pub mod wsse;

pub use error::Error;
