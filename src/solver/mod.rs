//! # Solver Layer
//!
//! Every convolution algorithm lives behind the [`ConvSolver`] trait. Solvers
//! that expose tuning knobs add [`TunableSolver`]; solvers that still read
//! the old fixed nine-field config add [`LegacySolver`]. The [`any`] module
//! erases those capabilities behind a uniform handle so registries and find
//! loops can hold every solver in one collection, and [`search`] holds the
//! generic routines (enumeration, database lookup, tuning) that run against
//! the traits.
//!
//! - **[`any`]:** The type-erased [`AnySolver`](any::AnySolver) handle.
//! - **[`search`]:** Generic find/tune routines shared by all solvers.
//! - **[`gemm`], [`direct`], [`winograd`]:** The stock solvers.
//! - **[`registry`]:** The stock solver collection, priority-ordered.

pub mod any;
pub mod direct;
pub mod gemm;
pub mod registry;
pub mod search;
pub mod winograd;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::core::problem::ProblemDescriptor;
use crate::core::solution::ConvSolution;

/// Speedup score reported by solvers that cannot estimate one. Any real
/// estimate is expected to land above this.
pub const WTI_UNKNOWN: f32 = -2.0;

/// Base capability every convolution solver implements.
///
/// A solver is a stateless recipe: it can say whether it handles a problem,
/// describe its cost, and produce a launch-ready [`ConvSolution`]. Methods
/// other than applicability and the default solution have conservative
/// defaults so simple solvers stay short.
pub trait ConvSolver: Send + Sync {
    /// Stable id this solver stores tuning results under. Also the id
    /// stamped into the solutions it produces.
    fn solver_db_id(&self) -> &'static str;

    /// Secondary database id consulted when nothing is stored under the
    /// primary. Empty means no alternate. Lets a renamed solver keep reading
    /// records written under its old name.
    fn alt_solver_db_id(&self) -> &'static str {
        ""
    }

    /// Fast gate: can this solver handle `problem` at all? Everything else
    /// may assume this returned true.
    fn is_applicable(&self, problem: &ProblemDescriptor) -> bool;

    /// The solution this solver produces without any tuning knowledge.
    fn default_solution(&self, problem: &ProblemDescriptor) -> Result<ConvSolution, String>;

    /// Whether one compiled kernel serves many shapes. Dynamic solvers skip
    /// per-shape compilation.
    fn is_dynamic(&self) -> bool {
        false
    }

    /// Work-time-improvement estimate, the solver's own guess at its speedup
    /// over a naive baseline, used to order applicable solvers before any of
    /// them run. Higher is better; [`WTI_UNKNOWN`] when the solver cannot
    /// guess.
    fn wti(&self, _problem: &ProblemDescriptor) -> f32 {
        WTI_UNKNOWN
    }

    /// Scratch bytes the solution will ask for. 0 when none.
    fn workspace_size(&self, _problem: &ProblemDescriptor) -> usize {
        0
    }

    /// Cheap static companion to [`workspace_size`](ConvSolver::workspace_size):
    /// false promises the solver never needs scratch memory.
    fn may_need_workspace(&self) -> bool {
        false
    }
}

/// A set of candidate configs to explore, in evaluation order.
pub struct SearchSpace<C> {
    pub candidates: Vec<C>,
}

impl<C> SearchSpace<C> {
    pub fn new(candidates: Vec<C>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Capability for solvers with tuning knobs.
///
/// The config type is solver-private; the rest of the engine only ever sees
/// it serialized. Validation is per-problem: a config read back from the
/// database may be stale for the problem at hand and must be checked before
/// use.
pub trait TunableSolver: ConvSolver {
    type PerfConfig: Clone + Serialize + DeserializeOwned + Debug + PartialEq + Send + Sync;

    /// Reasonable starting config for `problem`, used when the database has
    /// nothing. Must validate for any problem the solver is applicable to.
    fn default_perf_config(&self, problem: &ProblemDescriptor) -> Self::PerfConfig;

    /// Whether `config` can actually run `problem`.
    fn is_valid_perf_config(&self, problem: &ProblemDescriptor, config: &Self::PerfConfig) -> bool;

    /// Every config worth trying for `problem`. May contain entries that
    /// fail validation; downstream filters them.
    fn search_space(&self, problem: &ProblemDescriptor) -> SearchSpace<Self::PerfConfig>;

    /// Builds the launch plan for one concrete config.
    fn solution_from_config(
        &self,
        problem: &ProblemDescriptor,
        config: &Self::PerfConfig,
    ) -> Result<ConvSolution, String>;
}

/// The fixed nine-field tile config older solvers were tuned against. Kept
/// as a shared concrete type so their database records stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPerfConfig {
    pub grp_tile1: usize,
    pub grp_tile0: usize,
    pub in_tile1: usize,
    pub in_tile0: usize,
    pub out_pix_tile1: usize,
    pub out_pix_tile0: usize,
    pub n_out_pix_tiles: usize,
    pub n_in_data_tiles: usize,
    pub n_stacks: usize,
}

impl Default for LegacyPerfConfig {
    fn default() -> Self {
        Self {
            grp_tile1: 8,
            grp_tile0: 8,
            in_tile1: 4,
            in_tile0: 4,
            out_pix_tile1: 2,
            out_pix_tile0: 2,
            n_out_pix_tiles: 2,
            n_in_data_tiles: 2,
            n_stacks: 1,
        }
    }
}

/// Capability for solvers that consume [`LegacyPerfConfig`] records instead
/// of a config type of their own.
pub trait LegacySolver: ConvSolver {
    fn solution_from_legacy_config(
        &self,
        problem: &ProblemDescriptor,
        config: &LegacyPerfConfig,
    ) -> Result<ConvSolution, String>;
}

/// What a solver declared itself capable of when its handle was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverCapability {
    pub tunable: bool,
    pub legacy: bool,
}

impl SolverCapability {
    pub const PLAIN: Self = Self {
        tunable: false,
        legacy: false,
    };
    pub const TUNABLE: Self = Self {
        tunable: true,
        legacy: false,
    };
    pub const LEGACY: Self = Self {
        tunable: false,
        legacy: true,
    };
    pub const TUNABLE_LEGACY: Self = Self {
        tunable: true,
        legacy: true,
    };
}
