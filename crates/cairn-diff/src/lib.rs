//! Line delta engine for cairn.
//!
//! Aligns two tokenized text files with a longest-common-subsequence table,
//! backtraces the table into a structured result, and renders that result as
//! text.
//!
//! # Key Types
//!
//! - [`DeltaFile`] / [`FileSpec`] -- a file as a sequence of lines
//! - [`DeltaInput`] -- the two sides of one delta
//! - [`DeltaTable`] / [`Arrow`] -- the dynamic-programming grid
//! - [`BasicDeltaResult`] / [`DeltaLine`] / [`Edit`] -- the backtraced delta
//!
//! # Example
//!
//! ```
//! use cairn_diff::{delta, render_minimal, DeltaInput};
//!
//! let input = DeltaInput::from_bytes("a", b"a\nb\nc\n", "b", b"a\nx\nc\n");
//! let result = delta(&input).unwrap();
//! assert_eq!(result.common, 2);
//! assert_eq!(render_minimal(&result), "-b\n+x\n");
//! ```

pub mod config;
pub mod deltafile;
pub mod error;
pub mod input;
pub mod render;
pub mod result;
pub mod table;

pub use config::{DeltaConfig, RenderMode};
pub use deltafile::{DeltaFile, FileSpec, DELIM};
pub use error::{DiffError, DiffResult};
pub use input::DeltaInput;
pub use render::{render, render_enhanced, render_minimal, stat, summary};
pub use result::{delta, BasicDeltaResult, Change, DeltaCounts, DeltaLine, Edit};
pub use table::{Arrow, DeltaTable};
