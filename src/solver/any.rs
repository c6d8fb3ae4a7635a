//! The type-erased solver handle.
//!
//! Registries and find loops need to hold solvers of different concrete
//! types, with different config types, in one collection. [`AnySolver`]
//! erases the concrete type behind an object-safe view and pins down the
//! capability story at construction: the constructor a solver is wrapped
//! with (`plain`, `tunable`, `legacy`, `tunable_legacy`) decides which
//! branch of every capability-dependent operation it gets, not any
//! inspection of the type afterwards. Wrapping a solver with a constructor
//! whose trait it does not implement simply fails to compile.

use std::any::TypeId;
use std::fmt;

use crate::core::problem::ProblemDescriptor;
use crate::core::solution::{ConvSolution, InvokeParams};
use crate::perfdb::{DbRecord, PerfDb};
use crate::solver::search;
use crate::solver::{ConvSolver, LegacySolver, SolverCapability, TunableSolver};

/// Object-safe view over one wrapped solver. The four adapter impls below
/// route capability-dependent operations to the right generic routine.
trait ErasedSolver: Send + Sync {
    fn capability(&self) -> SolverCapability;
    fn solver_type(&self) -> TypeId;
    fn solver_type_name(&self) -> &'static str;
    fn solver_db_id(&self) -> &'static str;
    fn alt_solver_db_id(&self) -> &'static str;
    fn is_applicable(&self, problem: &ProblemDescriptor) -> bool;
    fn is_dynamic(&self) -> bool;
    fn wti(&self, problem: &ProblemDescriptor) -> f32;
    fn workspace_size(&self, problem: &ProblemDescriptor) -> usize;
    fn may_need_workspace(&self) -> bool;
    fn all_solutions(&self, problem: &ProblemDescriptor) -> Result<Vec<ConvSolution>, String>;
    fn test_db_record(&self, problem: &ProblemDescriptor, record: &DbRecord) -> bool;
    fn perf_cfg_params(&self, problem: &ProblemDescriptor, db: &dyn PerfDb) -> String;
    fn find_solution(
        &self,
        problem: &ProblemDescriptor,
        db: &dyn PerfDb,
        invoke: &InvokeParams,
        override_cfg: Option<&str>,
    ) -> Result<ConvSolution, String>;
}

// The capability-independent half of ErasedSolver is identical in all four
// adapters; only the last four methods differ per capability.
macro_rules! delegate_base {
    () => {
        fn solver_type(&self) -> TypeId {
            TypeId::of::<S>()
        }

        fn solver_type_name(&self) -> &'static str {
            std::any::type_name::<S>()
        }

        fn solver_db_id(&self) -> &'static str {
            self.0.solver_db_id()
        }

        fn alt_solver_db_id(&self) -> &'static str {
            self.0.alt_solver_db_id()
        }

        fn is_applicable(&self, problem: &ProblemDescriptor) -> bool {
            self.0.is_applicable(problem)
        }

        fn is_dynamic(&self) -> bool {
            self.0.is_dynamic()
        }

        fn wti(&self, problem: &ProblemDescriptor) -> f32 {
            self.0.wti(problem)
        }

        fn workspace_size(&self, problem: &ProblemDescriptor) -> usize {
            self.0.workspace_size(problem)
        }

        fn may_need_workspace(&self) -> bool {
            self.0.may_need_workspace()
        }
    };
}

struct PlainEntry<S>(S);

impl<S: ConvSolver + 'static> ErasedSolver for PlainEntry<S> {
    delegate_base!();

    fn capability(&self) -> SolverCapability {
        SolverCapability::PLAIN
    }

    fn all_solutions(&self, problem: &ProblemDescriptor) -> Result<Vec<ConvSolution>, String> {
        Ok(vec![search::find_plain(&self.0, problem)?])
    }

    fn test_db_record(&self, _problem: &ProblemDescriptor, _record: &DbRecord) -> bool {
        false
    }

    fn perf_cfg_params(&self, _problem: &ProblemDescriptor, _db: &dyn PerfDb) -> String {
        String::new()
    }

    fn find_solution(
        &self,
        problem: &ProblemDescriptor,
        _db: &dyn PerfDb,
        _invoke: &InvokeParams,
        _override_cfg: Option<&str>,
    ) -> Result<ConvSolution, String> {
        search::find_plain(&self.0, problem)
    }
}

struct TunableEntry<S>(S);

impl<S: TunableSolver + 'static> ErasedSolver for TunableEntry<S> {
    delegate_base!();

    fn capability(&self) -> SolverCapability {
        SolverCapability::TUNABLE
    }

    fn all_solutions(&self, problem: &ProblemDescriptor) -> Result<Vec<ConvSolution>, String> {
        search::all_solutions(&self.0, problem)
    }

    fn test_db_record(&self, problem: &ProblemDescriptor, record: &DbRecord) -> bool {
        search::test_db_record(&self.0, problem, record)
    }

    fn perf_cfg_params(&self, problem: &ProblemDescriptor, db: &dyn PerfDb) -> String {
        search::perf_cfg_params(&self.0, problem, db)
    }

    fn find_solution(
        &self,
        problem: &ProblemDescriptor,
        db: &dyn PerfDb,
        invoke: &InvokeParams,
        override_cfg: Option<&str>,
    ) -> Result<ConvSolution, String> {
        search::find_tunable(&self.0, problem, db, invoke, override_cfg)
    }
}

struct LegacyEntry<S>(S);

impl<S: LegacySolver + 'static> ErasedSolver for LegacyEntry<S> {
    delegate_base!();

    fn capability(&self) -> SolverCapability {
        SolverCapability::LEGACY
    }

    fn all_solutions(&self, problem: &ProblemDescriptor) -> Result<Vec<ConvSolution>, String> {
        Ok(vec![search::find_plain(&self.0, problem)?])
    }

    fn test_db_record(&self, _problem: &ProblemDescriptor, _record: &DbRecord) -> bool {
        false
    }

    fn perf_cfg_params(&self, _problem: &ProblemDescriptor, _db: &dyn PerfDb) -> String {
        String::new()
    }

    fn find_solution(
        &self,
        problem: &ProblemDescriptor,
        db: &dyn PerfDb,
        invoke: &InvokeParams,
        _override_cfg: Option<&str>,
    ) -> Result<ConvSolution, String> {
        search::find_legacy(&self.0, problem, db, invoke)
    }
}

struct TunableLegacyEntry<S>(S);

impl<S: TunableSolver + LegacySolver + 'static> ErasedSolver for TunableLegacyEntry<S> {
    delegate_base!();

    fn capability(&self) -> SolverCapability {
        SolverCapability::TUNABLE_LEGACY
    }

    // A solver that is both tunable and legacy has two config formats in
    // play and no single enumerable space, so enumeration is refused
    // outright rather than returning something half-true.
    fn all_solutions(&self, _problem: &ProblemDescriptor) -> Result<Vec<ConvSolution>, String> {
        Err(format!(
            "{}: solutions cannot be enumerated for legacy tunable solvers",
            self.0.solver_db_id()
        ))
    }

    fn test_db_record(&self, problem: &ProblemDescriptor, record: &DbRecord) -> bool {
        search::test_db_record(&self.0, problem, record)
    }

    fn perf_cfg_params(&self, problem: &ProblemDescriptor, db: &dyn PerfDb) -> String {
        search::perf_cfg_params(&self.0, problem, db)
    }

    fn find_solution(
        &self,
        problem: &ProblemDescriptor,
        db: &dyn PerfDb,
        invoke: &InvokeParams,
        override_cfg: Option<&str>,
    ) -> Result<ConvSolution, String> {
        search::find_tunable(&self.0, problem, db, invoke, override_cfg)
    }
}

/// A solver of any concrete type behind one uniform handle.
///
/// Handles are cheap to move, `Send + Sync`, and carry the capability their
/// constructor declared. The empty handle exists as a registry placeholder:
/// `is_empty` is the only operation it answers, everything else panics,
/// since asking an absent solver anything is a caller bug rather than a
/// recoverable condition.
pub struct AnySolver {
    inner: Option<Box<dyn ErasedSolver>>,
}

impl AnySolver {
    /// Placeholder handle holding no solver.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Wraps a solver with no tuning knobs.
    pub fn plain<S: ConvSolver + 'static>(solver: S) -> Self {
        Self {
            inner: Some(Box::new(PlainEntry(solver))),
        }
    }

    /// Wraps a tunable solver.
    pub fn tunable<S: TunableSolver + 'static>(solver: S) -> Self {
        Self {
            inner: Some(Box::new(TunableEntry(solver))),
        }
    }

    /// Wraps a solver that reads the fixed legacy config format.
    pub fn legacy<S: LegacySolver + 'static>(solver: S) -> Self {
        Self {
            inner: Some(Box::new(LegacyEntry(solver))),
        }
    }

    /// Wraps a solver that is both tunable and legacy.
    pub fn tunable_legacy<S: TunableSolver + LegacySolver + 'static>(solver: S) -> Self {
        Self {
            inner: Some(Box::new(TunableLegacyEntry(solver))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    fn bound(&self) -> &dyn ErasedSolver {
        match self.inner.as_deref() {
            Some(solver) => solver,
            None => panic!("operation invoked on an empty solver handle"),
        }
    }

    /// The capability declared at construction.
    pub fn capability(&self) -> SolverCapability {
        self.bound().capability()
    }

    pub fn is_tunable(&self) -> bool {
        self.bound().capability().tunable
    }

    /// Runtime type of the wrapped solver. Two handles wrap the same solver
    /// exactly when their types match.
    pub fn solver_type(&self) -> TypeId {
        self.bound().solver_type()
    }

    pub fn solver_db_id(&self) -> &'static str {
        self.bound().solver_db_id()
    }

    pub fn alt_solver_db_id(&self) -> &'static str {
        self.bound().alt_solver_db_id()
    }

    pub fn is_applicable(&self, problem: &ProblemDescriptor) -> bool {
        self.bound().is_applicable(problem)
    }

    pub fn is_dynamic(&self) -> bool {
        self.bound().is_dynamic()
    }

    pub fn wti(&self, problem: &ProblemDescriptor) -> f32 {
        self.bound().wti(problem)
    }

    pub fn workspace_size(&self, problem: &ProblemDescriptor) -> usize {
        self.bound().workspace_size(problem)
    }

    pub fn may_need_workspace(&self) -> bool {
        self.bound().may_need_workspace()
    }

    /// Every solution the wrapped solver can produce for `problem`. One
    /// default solution for plain and legacy solvers, the full validated
    /// sweep for tunable ones, an error for tunable-legacy hybrids.
    pub fn all_solutions(&self, problem: &ProblemDescriptor) -> Result<Vec<ConvSolution>, String> {
        self.bound().all_solutions(problem)
    }

    /// Whether `record` carries a usable entry for this solver. Always false
    /// for solvers without tuning knobs; they own no record entries.
    pub fn test_db_record(&self, problem: &ProblemDescriptor, record: &DbRecord) -> bool {
        self.bound().test_db_record(problem, record)
    }

    /// Serialized tuned config for `problem`, or an empty string when the
    /// database has nothing usable or the solver is not tunable.
    pub fn perf_cfg_params(&self, problem: &ProblemDescriptor, db: &dyn PerfDb) -> String {
        self.bound().perf_cfg_params(problem, db)
    }

    /// Resolves a launch-ready solution, consulting the database as the
    /// capability dictates. `override_cfg` short-circuits the database for
    /// tunable solvers and is ignored by plain and legacy ones.
    pub fn find_solution(
        &self,
        problem: &ProblemDescriptor,
        db: &dyn PerfDb,
        invoke: &InvokeParams,
        override_cfg: Option<&str>,
    ) -> Result<ConvSolution, String> {
        self.bound().find_solution(problem, db, invoke, override_cfg)
    }
}

impl Default for AnySolver {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AnySolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(solver) => f
                .debug_struct("AnySolver")
                .field("id", &solver.solver_db_id())
                .field("type", &solver.solver_type_name())
                .field("capability", &solver.capability())
                .finish(),
            None => f.write_str("AnySolver(empty)"),
        }
    }
}
