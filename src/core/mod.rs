//! # Core Value Model
//!
//! Plain-data descriptions of the things the selection engine reasons about.
//! Nothing in here talks to a device or a database.
//!
//! - **[`types`]:** Element types and their byte widths.
//! - **[`layout`]:** Layout tags, vector factors, and stride derivation.
//! - **[`tensor`]:** The shape/stride descriptor, indexing and packedness.
//! - **[`problem`]:** One convolution instance plus its signature string.
//! - **[`solution`]:** Kernel launch plans produced by solvers.

pub mod layout;
pub mod problem;
pub mod solution;
pub mod tensor;
pub mod types;
