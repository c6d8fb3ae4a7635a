//! # Selectra: Convolution Solver Selection Engine
//!
//! Selectra answers one question: given a convolution problem, which kernel
//! should run it, and with which parameters? Solvers describe themselves
//! through traits, a type-erased handle lets heterogeneous solvers share one
//! registry, and tuned configurations round-trip through a JSON database so
//! a search paid for once keeps paying off.
//!
//! ## Core Modules
//!
//! - **[`core`]**: Tensor descriptors, layouts, problems and solutions. Plain data.
//! - **[`solver`]**: The solver traits, the [`AnySolver`] handle, generic
//!   find/tune routines and the stock solvers.
//! - **[`perfdb`]**: The tuning database, in-memory and JSON-file backed.
//!
//! ## A Find in Five Lines
//!
//! ```
//! use selectra::{default_solvers, find_best, ConvolutionDescriptor, DataType,
//!                InvokeParams, MemPerfDb, ProblemDescriptor, TensorLayout};
//!
//! let problem = ProblemDescriptor::conv2d_fwd(
//!     DataType::Float, TensorLayout::NCHW,
//!     1, 32, 30, 30, 64, 3, 3,
//!     ConvolutionDescriptor::new_2d(1, 1, 1),
//! ).unwrap();
//! let solution = find_best(&default_solvers(), &problem, &MemPerfDb::new(), &InvokeParams::default());
//! assert!(solution.is_some());
//! ```

pub mod core;
pub mod perfdb;
pub mod solver;

pub use crate::core::layout::{layout_to_strides, TensorLayout};
pub use crate::core::problem::{ConvolutionDescriptor, Direction, ProblemDescriptor};
pub use crate::core::solution::{ConvSolution, InvokeParams, KernelInfo};
pub use crate::core::tensor::TensorDescriptor;
pub use crate::core::types::DataType;
pub use crate::perfdb::{DbRecord, FilePerfDb, MemPerfDb, PerfDb};
pub use crate::solver::any::AnySolver;
pub use crate::solver::direct::DirectFwdNaive;
pub use crate::solver::gemm::{GemmFwd, GemmFwdConfig};
pub use crate::solver::registry::{default_solvers, solver_for_id, SOLVER_IDS};
pub use crate::solver::search::{find_best, rank_applicable, search_and_update, SearchMode};
pub use crate::solver::winograd::WinogradFwdF2x3;
pub use crate::solver::{
    ConvSolver, LegacyPerfConfig, LegacySolver, SearchSpace, SolverCapability, TunableSolver,
    WTI_UNKNOWN,
};
