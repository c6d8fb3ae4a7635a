//! Generic find and tune routines.
//!
//! Everything here is driven through the solver traits, so a new solver gets
//! enumeration, database lookup and search for free. Perf configs cross the
//! database boundary as JSON; decode failures are treated the same as a
//! missing record.

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::problem::ProblemDescriptor;
use crate::core::solution::{ConvSolution, InvokeParams};
use crate::perfdb::{DbRecord, PerfDb};
use crate::solver::any::AnySolver;
use crate::solver::{ConvSolver, LegacyPerfConfig, LegacySolver, TunableSolver};

fn decode<C: DeserializeOwned>(params: &str) -> Option<C> {
    serde_json::from_str(params).ok()
}

fn encode<C: Serialize>(config: &C) -> String {
    serde_json::to_string(config).unwrap_or_default()
}

/// Walks the primary-then-alternate id ladder and returns the first stored
/// config that decodes and validates for `problem`.
fn load_valid_config<S: TunableSolver>(
    solver: &S,
    problem: &ProblemDescriptor,
    db: &dyn PerfDb,
) -> Option<S::PerfConfig> {
    let sig = problem.signature();
    for key in [solver.solver_db_id(), solver.alt_solver_db_id()] {
        if key.is_empty() {
            continue;
        }
        if let Some(config) = db.load(&sig, key).and_then(|p| decode::<S::PerfConfig>(&p)) {
            if solver.is_valid_perf_config(problem, &config) {
                return Some(config);
            }
        }
    }
    None
}

/// Every solution a tunable solver can produce for `problem`: one per config
/// in the search space that validates. Infeasible candidates are skipped,
/// but a config that validates and then fails to build is an error.
pub fn all_solutions<S: TunableSolver>(
    solver: &S,
    problem: &ProblemDescriptor,
) -> Result<Vec<ConvSolution>, String> {
    let space = solver.search_space(problem);
    let mut solutions = Vec::with_capacity(space.len());
    for config in &space.candidates {
        if !solver.is_valid_perf_config(problem, config) {
            continue;
        }
        solutions.push(
            solver
                .solution_from_config(problem, config)?
                .with_solver_id(solver.solver_db_id()),
        );
    }
    Ok(solutions)
}

/// Whether `record` holds an entry under this solver's id that decodes into
/// its config type and validates for `problem`.
pub fn test_db_record<S: TunableSolver>(
    solver: &S,
    problem: &ProblemDescriptor,
    record: &DbRecord,
) -> bool {
    match record
        .get(solver.solver_db_id())
        .and_then(decode::<S::PerfConfig>)
    {
        Some(config) => solver.is_valid_perf_config(problem, &config),
        None => false,
    }
}

/// Serialized perf config for `problem`, re-encoded in canonical form.
/// Tries the primary id, then the alternate, and returns an empty string
/// when neither yields a config that validates. One log line per outcome.
pub fn perf_cfg_params<S: TunableSolver>(
    solver: &S,
    problem: &ProblemDescriptor,
    db: &dyn PerfDb,
) -> String {
    let sig = problem.signature();
    let id = solver.solver_db_id();

    if let Some(config) = db.load(&sig, id).and_then(|p| decode::<S::PerfConfig>(&p)) {
        if solver.is_valid_perf_config(problem, &config) {
            eprintln!("[PerfDb] record loaded: {}", id);
            return encode(&config);
        }
        eprintln!("[PerfDb] invalid record: {}", id);
    }

    let alt = solver.alt_solver_db_id();
    if !alt.is_empty() {
        if let Some(config) = db.load(&sig, alt).and_then(|p| decode::<S::PerfConfig>(&p)) {
            if solver.is_valid_perf_config(problem, &config) {
                eprintln!("[PerfDb] alternate record loaded: {} (for {})", alt, id);
                return encode(&config);
            }
            eprintln!("[PerfDb] invalid alternate record: {} (for {})", alt, id);
        }
    }

    eprintln!("[PerfDb] no usable record: {}", id);
    String::new()
}

/// Find for solvers without tuning knobs: the default solution, stamped.
pub fn find_plain<S: ConvSolver>(
    solver: &S,
    problem: &ProblemDescriptor,
) -> Result<ConvSolution, String> {
    Ok(solver
        .default_solution(problem)?
        .with_solver_id(solver.solver_db_id()))
}

/// Find for tunable solvers.
///
/// Config resolution order: a caller-supplied serialized override (which
/// must decode and validate, anything else is an error), then the database
/// under primary/alternate ids, then the solver's default config. No
/// measurement happens here; live tuning is [`search_and_update`].
pub fn find_tunable<S: TunableSolver>(
    solver: &S,
    problem: &ProblemDescriptor,
    db: &dyn PerfDb,
    _invoke: &InvokeParams,
    override_cfg: Option<&str>,
) -> Result<ConvSolution, String> {
    let id = solver.solver_db_id();
    let config = match override_cfg {
        Some(raw) => {
            let config: S::PerfConfig = serde_json::from_str(raw)
                .map_err(|e| format!("{}: malformed config override: {}", id, e))?;
            if !solver.is_valid_perf_config(problem, &config) {
                return Err(format!("{}: config override rejected for this problem", id));
            }
            config
        }
        None => match load_valid_config(solver, problem, db) {
            Some(config) => config,
            None => solver.default_perf_config(problem),
        },
    };
    Ok(solver
        .solution_from_config(problem, &config)?
        .with_solver_id(id))
}

/// Find for legacy solvers: the stored nine-field config when one decodes,
/// the default solution otherwise. Overrides do not apply to the legacy
/// record format.
pub fn find_legacy<S: LegacySolver>(
    solver: &S,
    problem: &ProblemDescriptor,
    db: &dyn PerfDb,
    _invoke: &InvokeParams,
) -> Result<ConvSolution, String> {
    let id = solver.solver_db_id();
    let solution = match db
        .load(&problem.signature(), id)
        .and_then(|p| decode::<LegacyPerfConfig>(&p))
    {
        Some(config) => solver.solution_from_legacy_config(problem, &config)?,
        None => solver.default_solution(problem)?,
    };
    Ok(solution.with_solver_id(id))
}

/// How much of the search space a tuning run visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Every candidate.
    Full,
    /// A uniform random subset of at most this many candidates.
    Sampled(usize),
}

/// Runs a measured search for the best config and stores the winner in the
/// database under the solver's primary id.
///
/// A config already stored and valid for `problem` short-circuits the whole
/// search. The `benchmark` callback scores one candidate solution (higher is
/// better) and returns `None` for candidates that fail at runtime. Errors
/// out when no candidate produces a score.
pub fn search_and_update<S, F>(
    solver: &S,
    problem: &ProblemDescriptor,
    db: &mut dyn PerfDb,
    mode: SearchMode,
    mut benchmark: F,
) -> Result<S::PerfConfig, String>
where
    S: TunableSolver,
    F: FnMut(&ConvSolution) -> Option<f32>,
{
    let id = solver.solver_db_id();

    if let Some(config) = load_valid_config(solver, problem, db) {
        eprintln!("[Tuner] already tuned: {}", id);
        return Ok(config);
    }

    let mut candidates = solver.search_space(problem).candidates;
    if let SearchMode::Sampled(n) = mode {
        let mut rng = rand::thread_rng();
        candidates.shuffle(&mut rng);
        candidates.truncate(n);
    }
    let total = candidates.len();
    eprintln!("[Tuner] searching {} ({} candidates)", id, total);

    let mut best: Option<(f32, S::PerfConfig)> = None;
    for (i, config) in candidates.into_iter().enumerate() {
        if !solver.is_valid_perf_config(problem, &config) {
            eprintln!("[Tuner] [{}/{}] skipping invalid: {:?}", i + 1, total, config);
            continue;
        }
        let solution = solver
            .solution_from_config(problem, &config)?
            .with_solver_id(id);
        match benchmark(&solution) {
            Some(score) => {
                eprintln!("[Tuner] [{}/{}] {:?} -> {:.2}", i + 1, total, config, score);
                if best.as_ref().map_or(true, |(b, _)| score > *b) {
                    best = Some((score, config));
                }
            }
            None => eprintln!("[Tuner] [{}/{}] {:?} -> failed", i + 1, total, config),
        }
    }

    match best {
        Some((score, config)) => {
            eprintln!("[Tuner] best for {}: {:?} ({:.2})", id, config, score);
            db.store(&problem.signature(), id, &encode(&config));
            Ok(config)
        }
        None => Err(format!(
            "{}: search produced no usable config for {}",
            id, problem
        )),
    }
}

/// Applicable handles ordered best-first: solvers with a tuned record ahead
/// of untuned ones, ties broken by the wti estimate. Empty handles are
/// dropped.
pub fn rank_applicable<'a>(
    handles: &'a [AnySolver],
    problem: &ProblemDescriptor,
    db: &dyn PerfDb,
) -> Vec<&'a AnySolver> {
    let mut ranked: Vec<(bool, f32, &AnySolver)> = handles
        .iter()
        .filter(|h| !h.is_empty() && h.is_applicable(problem))
        .map(|h| {
            let tuned = h.capability().tunable && !h.perf_cfg_params(problem, db).is_empty();
            (tuned, h.wti(problem), h)
        })
        .collect();
    ranked.sort_by(|a, b| {
        (b.0, b.1)
            .partial_cmp(&(a.0, a.1))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.into_iter().map(|(_, _, h)| h).collect()
}

/// Picks a solution for `problem` from `handles`: rank the applicable ones,
/// take the first whose find succeeds. A solver that errors is logged and
/// skipped, it never aborts the loop. `None` when nothing applies or
/// everything fails.
pub fn find_best(
    handles: &[AnySolver],
    problem: &ProblemDescriptor,
    db: &dyn PerfDb,
    invoke: &InvokeParams,
) -> Option<ConvSolution> {
    for handle in rank_applicable(handles, problem, db) {
        match handle.find_solution(problem, db, invoke, None) {
            Ok(solution) => {
                eprintln!("[Find] selected {} for {}", solution.solver_id, problem);
                return Some(solution);
            }
            Err(e) => eprintln!("[Find] {} failed: {}", handle.solver_db_id(), e),
        }
    }
    None
}
