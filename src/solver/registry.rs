use crate::solver::any::AnySolver;
use crate::solver::direct::DirectFwdNaive;
use crate::solver::gemm::GemmFwd;
use crate::solver::winograd::WinogradFwdF2x3;

/// Ids of the stock solvers, in registry order.
pub const SOLVER_IDS: &[&str] = &["winograd_fwd_f2x3", "gemm_fwd", "direct_fwd_naive"];

/// The stock solver collection, fastest-first. The order only matters as a
/// tie-break; the find loop re-ranks by tuned-record presence and wti.
pub fn default_solvers() -> Vec<AnySolver> {
    vec![
        AnySolver::legacy(WinogradFwdF2x3),
        AnySolver::tunable(GemmFwd),
        AnySolver::plain(DirectFwdNaive),
    ]
}

/// Handle for one stock solver by its database id. `None` for ids this
/// build does not know.
pub fn solver_for_id(id: &str) -> Option<AnySolver> {
    match id {
        "winograd_fwd_f2x3" => Some(AnySolver::legacy(WinogradFwdF2x3)),
        "gemm_fwd" | "im2col_gemm" => Some(AnySolver::tunable(GemmFwd)),
        "direct_fwd_naive" => Some(AnySolver::plain(DirectFwdNaive)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_ids_resolve() {
        for &id in SOLVER_IDS {
            let handle = solver_for_id(id).unwrap();
            assert_eq!(handle.solver_db_id(), id);
        }
        assert!(solver_for_id("no_such_solver").is_none());
    }

    #[test]
    fn alternate_gemm_id_resolves_to_primary() {
        let handle = solver_for_id("im2col_gemm").unwrap();
        assert_eq!(handle.solver_db_id(), "gemm_fwd");
    }
}
