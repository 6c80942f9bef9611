// crates/gf_physics/src/parallel/sparse_solver.rs

//! 分布式稀疏求解器
//!
//! 每个进程拥有全局未知量的一段连续区间 `[lower, upper)`，存储这些行的
//! CSR 矩阵（列为全局编号）和右端项。求解使用 BiCGStab：
//!
//! - 内积先算本地部分再全局求和
//! - 矩阵-向量乘法前收集全局向量
//! - 预条件为块 Jacobi，块内使用 ILU(0) / Jacobi / Identity
//!
//! # 使用流程
//!
//! ```text
//! set_rank(comm, n_local)   确定分区
//! set_equation(eqn)         组装本地行和右端项
//! solve(comm)               求解，返回相对残差
//! map_solution(comm, grid, field) 写回本进程单元
//! ```

use std::fmt;
use std::ops::Range;

use gf_config::SparseSolverSettings;
use gf_foundation::error::{GfError, GfResult};
use gf_foundation::float::count_non_finite;

use crate::equation::Equation;
use crate::fields::{ScalarField, VectorField};
use crate::mesh::{GridTopology, IndexSet};
use crate::numerics::linear_algebra::{
    build_preconditioner, dot, BiCgStabSolver, CsrBuilder, CsrMatrix, LinearOperator,
    Preconditioner, SolverConfig, SolverResult,
};

use super::comm::Communicator;

// ============================================================
// 分区
// ============================================================

/// 本进程的全局行区间 `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Partition {
    lower: usize,
    upper: usize,
    n_global: usize,
}

impl Partition {
    /// 由各进程行数的前缀和确定区间
    ///
    /// # Panics
    /// `rank >= sizes.len()`
    pub fn from_sizes(sizes: &[usize], rank: usize) -> Self {
        let lower: usize = sizes[..rank].iter().sum();
        Self {
            lower,
            upper: lower + sizes[rank],
            n_global: sizes.iter().sum(),
        }
    }

    /// 起始行（含）
    #[inline]
    pub fn lower(&self) -> usize {
        self.lower
    }

    /// 结束行（不含）
    #[inline]
    pub fn upper(&self) -> usize {
        self.upper
    }

    /// 本地行数
    #[inline]
    pub fn len(&self) -> usize {
        self.upper - self.lower
    }

    /// 是否没有行
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.upper == self.lower
    }

    /// 全局行数
    #[inline]
    pub fn n_global(&self) -> usize {
        self.n_global
    }

    /// 行区间
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.lower..self.upper
    }

    /// 全局行是否属于本进程
    #[inline]
    pub fn contains(&self, row: usize) -> bool {
        self.range().contains(&row)
    }
}

// ============================================================
// 分布式算子
// ============================================================

/// 按行分布的矩阵算子
pub struct DistributedOperator<'a, C: ?Sized> {
    matrix: &'a CsrMatrix,
    comm: &'a C,
}

impl<'a, C: Communicator + ?Sized> DistributedOperator<'a, C> {
    /// 包装本地行矩阵（列为全局编号）
    pub fn new(matrix: &'a CsrMatrix, comm: &'a C) -> Self {
        Self { matrix, comm }
    }
}

impl<C: Communicator + ?Sized> LinearOperator for DistributedOperator<'_, C> {
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let global = self.comm.all_gather(x).concat();
        self.matrix.mul_vec(&global, y);
    }

    fn dot(&self, a: &[f64], b: &[f64]) -> f64 {
        self.comm.sum(dot(a, b))
    }
}

// ============================================================
// 求解器
// ============================================================

/// 分布式稀疏求解器
pub struct DistributedSparseSolver {
    settings: SparseSolverSettings,
    partition: Partition,
    matrix: CsrMatrix,
    rhs: Vec<f64>,
    x: Vec<f64>,
    warm_start: bool,
    precond: Option<Box<dyn Preconditioner>>,
    n_precon_uses: usize,
    bicgstab: BiCgStabSolver,
    result: Option<SolverResult>,
}

impl fmt::Debug for DistributedSparseSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedSparseSolver")
            .field("partition", &self.partition)
            .field("nnz", &self.matrix.nnz())
            .field("preconditioner", &self.precond.as_ref().map(|p| p.name()))
            .field("n_precon_uses", &self.n_precon_uses)
            .field("result", &self.result)
            .finish()
    }
}

impl DistributedSparseSolver {
    /// 创建求解器，预条件子类型在此选定
    pub fn new(settings: SparseSolverSettings) -> Self {
        let mut config = SolverConfig::new(settings.tolerance, settings.max_iterations);
        if settings.verbose {
            config = config.verbose();
        }
        Self {
            n_precon_uses: settings.max_precon_uses,
            settings,
            partition: Partition::default(),
            matrix: CsrBuilder::new(0, 0).build(),
            rhs: Vec::new(),
            x: Vec::new(),
            warm_start: false,
            precond: None,
            bicgstab: BiCgStabSolver::new(config),
            result: None,
        }
    }

    /// 求解器配置
    pub fn settings(&self) -> &SparseSolverSettings {
        &self.settings
    }

    // ========== 分区 ==========

    /// 设置本进程未知量个数（集合操作）
    ///
    /// 分区变化时重新初始化全部存储并强制重建预条件子。
    pub fn set_rank<C>(&mut self, comm: &C, n_local: usize)
    where
        C: Communicator + ?Sized,
    {
        let sizes = comm.all_gather_usize(n_local);
        let partition = Partition::from_sizes(&sizes, comm.rank());
        if partition == self.partition && self.matrix.n_cols() == partition.n_global() {
            return;
        }

        log::debug!(
            "进程 {} 分区 [{}, {})，全局 {} 行",
            comm.rank(),
            partition.lower(),
            partition.upper(),
            partition.n_global()
        );
        self.partition = partition;
        self.matrix = CsrBuilder::new(n_local, partition.n_global()).build();
        self.rhs = vec![0.0; n_local];
        self.x = vec![0.0; n_local];
        self.warm_start = false;
        self.precond = None;
        self.n_precon_uses = self.settings.max_precon_uses;
        self.result = None;
    }

    /// 当前分区
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// 本进程第一行（含），没有行时为 None
    pub fn i_lower(&self) -> Option<usize> {
        (!self.partition.is_empty()).then_some(self.partition.lower())
    }

    /// 本进程最后一行（含），没有行时为 None
    pub fn i_upper(&self) -> Option<usize> {
        (!self.partition.is_empty()).then(|| self.partition.upper() - 1)
    }

    // ========== 组装 ==========

    /// 从方程组装本地矩阵
    ///
    /// 分区外的行被忽略；没有系数的行设为单位行。
    pub fn set(&mut self, eqn: &Equation) -> GfResult<()> {
        let (rows, _) = eqn.local_system(self.partition.range());
        self.set_rows(&rows)
    }

    fn set_rows(&mut self, rows: &[Vec<(usize, f64)>]) -> GfResult<()> {
        let n_global = self.partition.n_global();
        let mut builder = CsrBuilder::new(self.partition.len(), n_global);
        let mut n_empty = 0;

        for (i, row) in rows.iter().enumerate() {
            if row.is_empty() {
                builder.set(i, self.partition.lower() + i, 1.0);
                n_empty += 1;
                continue;
            }
            for &(col, a) in row {
                if col >= n_global {
                    return Err(GfError::index_out_of_bounds("global column", col, n_global));
                }
                builder.add(i, col, a);
            }
        }

        if n_empty > 0 {
            log::warn!("{n_empty} 行没有系数，已设为单位行");
        }
        self.matrix = builder.build();
        Ok(())
    }

    /// 设置本地右端项
    pub fn set_rhs(&mut self, b: &[f64]) -> GfResult<()> {
        if b.len() != self.partition.len() {
            return Err(GfError::size_mismatch("rhs", self.partition.len(), b.len()));
        }
        self.rhs.copy_from_slice(b);
        Ok(())
    }

    /// 组装矩阵并设置右端项 `b = -source`
    pub fn set_equation(&mut self, eqn: &Equation) -> GfResult<()> {
        let (rows, rhs) = eqn.local_system(self.partition.range());
        self.set_rows(&rows)?;
        self.set_rhs(&rhs)
    }

    /// 为下一次求解提供初值（默认初值为零）
    pub fn set_guess(&mut self, x0: &[f64]) -> GfResult<()> {
        if x0.len() != self.partition.len() {
            return Err(GfError::size_mismatch("guess", self.partition.len(), x0.len()));
        }
        self.x.copy_from_slice(x0);
        self.warm_start = true;
        Ok(())
    }

    /// 本地矩阵
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// 本地右端项
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    // ========== 求解 ==========

    /// 求解（集合操作），返回最终相对残差
    ///
    /// 不收敛不是错误，状态见 [`Self::result`]。
    pub fn solve<C>(&mut self, comm: &C) -> f64
    where
        C: Communicator + ?Sized,
    {
        self.solve_with_status(comm).relative_residual
    }

    /// 求解（集合操作），返回完整的求解结果
    pub fn solve_with_status<C>(&mut self, comm: &C) -> SolverResult
    where
        C: Communicator + ?Sized,
    {
        let precond = match self.precond.take() {
            Some(p) if self.n_precon_uses < self.settings.max_precon_uses => {
                self.n_precon_uses += 1;
                p
            }
            _ => {
                comm.info("正在计算预条件子...");
                let block = self.matrix.diagonal_block(self.partition.range());
                self.n_precon_uses = 0;
                build_preconditioner(
                    self.settings.preconditioner,
                    &block,
                    self.settings.drop_tolerance,
                )
            }
        };

        if !self.warm_start {
            self.x.fill(0.0);
        }
        self.warm_start = false;

        let op = DistributedOperator::new(&self.matrix, comm);
        let result = self.bicgstab.solve(&op, &self.rhs, &mut self.x, &*precond);
        self.precond = Some(precond);
        self.result = Some(result);
        result
    }

    /// 最近一次求解结果
    pub fn result(&self) -> Option<&SolverResult> {
        self.result.as_ref()
    }

    /// 最近一次求解的迭代次数
    pub fn iterations(&self) -> usize {
        self.result.map_or(0, |r| r.iterations)
    }

    /// 最近一次求解的相对残差
    pub fn residual(&self) -> f64 {
        self.result.map_or(0.0, |r| r.relative_residual)
    }

    /// 预条件子自上次重建以来的复用次数
    pub fn precon_uses(&self) -> usize {
        self.n_precon_uses
    }

    /// 本地解向量
    pub fn solution(&self) -> &[f64] {
        &self.x
    }

    // ========== 写回 ==========

    /// 把解写回标量场的本进程单元（集合操作）
    ///
    /// 任一进程的解含 NaN/Inf 时，所有进程都返回同一个错误且不修改场。
    pub fn map_solution<C, G>(
        &self,
        comm: &C,
        grid: &G,
        field: &mut ScalarField,
    ) -> GfResult<()>
    where
        C: Communicator + ?Sized,
        G: GridTopology + ?Sized,
    {
        self.check_finite(comm, field.name())?;

        let local = self.local_slots(grid, IndexSet::Scalar)?;
        for (&cell, slot) in grid.local_active_cells().iter().zip(local) {
            field[cell] = self.x[slot];
        }
        Ok(())
    }

    /// 把解写回矢量场的本进程单元（集合操作）
    pub fn map_solution_vector<C, G>(
        &self,
        comm: &C,
        grid: &G,
        field: &mut VectorField,
    ) -> GfResult<()>
    where
        C: Communicator + ?Sized,
        G: GridTopology + ?Sized,
    {
        self.check_finite(comm, field.name())?;

        let xs = self.local_slots(grid, IndexSet::VectorX)?;
        let ys = self.local_slots(grid, IndexSet::VectorY)?;
        for ((&cell, ix), iy) in grid.local_active_cells().iter().zip(xs).zip(ys) {
            field[cell].x = self.x[ix];
            field[cell].y = self.x[iy];
        }
        Ok(())
    }

    /// 全局统计非有限值，各进程得到相同结论
    fn check_finite<C>(&self, comm: &C, name: &str) -> GfResult<()>
    where
        C: Communicator + ?Sized,
    {
        let bad = comm.sum(count_non_finite(&self.x) as f64) as usize;
        if bad > 0 {
            return Err(GfError::non_finite(name, bad));
        }
        Ok(())
    }

    /// 本进程单元在解向量中的位置
    fn local_slots<G>(&self, grid: &G, set: IndexSet) -> GfResult<Vec<usize>>
    where
        G: GridTopology + ?Sized,
    {
        grid.local_active_cells()
            .iter()
            .map(|&cell| {
                let row = grid.global_index(cell, set);
                if self.partition.contains(row) {
                    Ok(row - self.partition.lower())
                } else {
                    Err(GfError::index_out_of_bounds(
                        "solution row",
                        row,
                        self.partition.upper(),
                    ))
                }
            })
            .collect()
    }

    /// 主进程输出求解状态
    pub fn print_status<C>(&self, comm: &C, msg: &str)
    where
        C: Communicator + ?Sized,
    {
        comm.info(&format!(
            "{msg} 迭代次数 = {}, 残差 = {:.6e}",
            self.iterations(),
            self.residual()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectilinearGrid;
    use crate::parallel::SerialComm;
    use gf_foundation::ErrorKind;

    fn tridiagonal(n: usize) -> Equation {
        let mut eqn = Equation::new();
        for i in 0..n {
            eqn.add(i, i, 2.0);
            if i > 0 {
                eqn.add(i, i - 1, -1.0);
            }
            if i + 1 < n {
                eqn.add(i, i + 1, -1.0);
            }
            eqn.add_source(i, -1.0);
        }
        eqn
    }

    #[test]
    fn test_partition_from_sizes() {
        let sizes = [3, 0, 4, 2];
        let parts: Vec<_> = (0..4).map(|r| Partition::from_sizes(&sizes, r)).collect();
        assert_eq!(parts[0].range(), 0..3);
        assert!(parts[1].is_empty());
        assert_eq!(parts[2].range(), 3..7);
        assert_eq!(parts[3].range(), 7..9);
        assert!(parts.iter().all(|p| p.n_global() == 9));
    }

    #[test]
    fn test_serial_solve() {
        let comm = SerialComm;
        let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
        solver.set_rank(&comm, 6);
        assert_eq!(solver.i_lower(), Some(0));
        assert_eq!(solver.i_upper(), Some(5));

        let eqn = tridiagonal(6);
        solver.set_equation(&eqn).unwrap();
        let res = solver.solve(&comm);
        assert!(res < 1e-10);
        assert!(solver.result().unwrap().is_converged());
        for i in 0..6 {
            let r = eqn.row_residual(i, |j| solver.solution()[j]);
            assert!(r.abs() < 1e-8);
        }
    }

    #[test]
    fn test_set_equation_matches_set_and_rhs() {
        let comm = SerialComm;
        let eqn = tridiagonal(5);

        let mut a = DistributedSparseSolver::new(SparseSolverSettings::default());
        a.set_rank(&comm, 5);
        a.set_equation(&eqn).unwrap();

        let mut b = DistributedSparseSolver::new(SparseSolverSettings::default());
        b.set_rank(&comm, 5);
        b.set(&eqn).unwrap();
        let rhs: Vec<f64> = (0..5).map(|i| -eqn.source(i)).collect();
        b.set_rhs(&rhs).unwrap();

        assert_eq!(a.matrix().row_ptr(), b.matrix().row_ptr());
        assert_eq!(a.matrix().col_idx(), b.matrix().col_idx());
        assert_eq!(a.matrix().values(), b.matrix().values());
        assert_eq!(a.rhs(), b.rhs());
    }

    #[test]
    fn test_empty_row_becomes_identity() {
        let comm = SerialComm;
        let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
        solver.set_rank(&comm, 3);
        let mut eqn = Equation::new();
        eqn.add(0, 0, 1.0);
        eqn.add(2, 2, 1.0);
        solver.set(&eqn).unwrap();
        assert_eq!(solver.matrix().get(1, 1), 1.0);
    }

    #[test]
    fn test_rhs_size_mismatch() {
        let comm = SerialComm;
        let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
        solver.set_rank(&comm, 3);
        let err = solver.set_rhs(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, GfError::SizeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_preconditioner_reuse_counter() {
        let comm = SerialComm;
        let settings = SparseSolverSettings {
            max_precon_uses: 2,
            ..Default::default()
        };
        let mut solver = DistributedSparseSolver::new(settings);
        solver.set_rank(&comm, 4);
        solver.set_equation(&tridiagonal(4)).unwrap();

        let mut uses = Vec::new();
        for _ in 0..5 {
            solver.solve(&comm);
            uses.push(solver.precon_uses());
        }
        assert_eq!(uses, vec![0, 1, 2, 0, 1]);

        // 分区不变时 set_rank 不重置计数
        solver.set_rank(&comm, 4);
        assert_eq!(solver.precon_uses(), 1);
        solver.set_rank(&comm, 5);
        assert_eq!(solver.precon_uses(), 2);
    }

    #[test]
    fn test_map_solution_rejects_nan() {
        let comm = SerialComm;
        let grid = RectilinearGrid::new(2, 2, 1.0, 1.0).unwrap();
        let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
        solver.set_rank(&comm, 4);
        solver.set_guess(&[1.0, f64::NAN, 3.0, 4.0]).unwrap();

        let mut field = ScalarField::uniform("T", 4, 7.0);
        let err = solver.map_solution(&comm, &grid, &mut field).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Numerical);
        assert!(field.values().iter().all(|&v| v == 7.0));
    }
}
