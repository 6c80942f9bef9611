// crates/gf_physics/src/solvers/poisson.rs

//! 带浸入边界的泊松/拉普拉斯求解
//!
//! 求解 −∇·(γ∇u) = 0：
//!
//! 1. 流体单元组装隐式扩散算子，域边界为 Dirichlet
//! 2. 浸入边界对象给出界面和固体单元的行，覆盖对应行
//! 3. 分布式求解，写回本进程单元，最后做光环交换
//!
//! 浸入边界的分类需要调用方事先更新。

use glam::DVec2;

use gf_config::SparseSolverSettings;
use gf_foundation::error::GfResult;

use crate::fields::ScalarField;
use crate::immersed::ImmersedBoundary;
use crate::mesh::GridTopology;
use crate::numerics::linear_algebra::SolverResult;
use crate::numerics::operators::laplacian;
use crate::parallel::{exchange_halo, Communicator, DistributedSparseSolver};

/// 泊松求解器
#[derive(Debug)]
pub struct PoissonSolver {
    gamma: f64,
    solver: DistributedSparseSolver,
}

impl PoissonSolver {
    /// 创建求解器，扩散系数为 1
    pub fn new(settings: SparseSolverSettings) -> Self {
        Self {
            gamma: 1.0,
            solver: DistributedSparseSolver::new(settings),
        }
    }

    /// 设置扩散系数
    pub fn with_diffusivity(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// 内部的分布式求解器
    pub fn sparse_solver(&self) -> &DistributedSparseSolver {
        &self.solver
    }

    /// 求解并写回 `field`（集合操作）
    ///
    /// `domain_value` 给出域边界面中心的 Dirichlet 值。浸入边界条件按
    /// `field` 的名字从各对象的注册类型中查找。
    pub fn solve<C, G, F>(
        &mut self,
        comm: &C,
        grid: &G,
        ib: &ImmersedBoundary,
        field: &mut ScalarField,
        domain_value: F,
    ) -> GfResult<SolverResult>
    where
        C: Communicator + ?Sized,
        G: GridTopology + ?Sized,
        F: Fn(DVec2) -> f64,
    {
        let cells = ib.fluid_cells(grid);
        let mut eqn = laplacian(grid, &cells, self.gamma, domain_value);
        eqn.override_rows(&ib.bcs(grid, field)?);

        self.solver.set_rank(comm, grid.n_local_cells());
        self.solver.set_equation(&eqn)?;
        let result = self.solver.solve_with_status(comm);
        self.solver.print_status(comm, field.name());

        self.solver.map_solution(comm, grid, field)?;
        exchange_halo(comm, grid, field);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::immersed::ImmersedBoundaryObject;
    use crate::mesh::{CellSearch, RectilinearGrid};
    use crate::parallel::SerialComm;
    use gf_geo::Shape;

    #[test]
    fn test_uniform_solution() {
        // 边界值全部为 2，解应处处为 2
        let grid = RectilinearGrid::new(12, 12, 1.0 / 12.0, 1.0 / 12.0).unwrap();
        let search = CellSearch::new(&grid);
        let mut obj = ImmersedBoundaryObject::new(
            0,
            "disk",
            Shape::circle(DVec2::new(0.5, 0.5), 0.2).unwrap(),
        );
        obj.add_boundary_type("phi", "fixed").unwrap();
        obj.set_ref_value("phi", 2.0);
        let mut ib = ImmersedBoundary::new();
        ib.push(obj);
        ib.update_cells(&grid, &search);

        let mut field = ScalarField::new("phi", grid.n_cells());
        let settings = SparseSolverSettings {
            tolerance: 1e-12,
            ..Default::default()
        };
        let mut solver = PoissonSolver::new(settings);
        let result = solver
            .solve(&SerialComm, &grid, &ib, &mut field, |_| 2.0)
            .unwrap();
        assert!(result.is_converged());
        for &c in &ib.fluid_cells(&grid) {
            assert!((field[c] - 2.0).abs() < 1e-8, "单元 {c}: {}", field[c]);
        }
    }
}
