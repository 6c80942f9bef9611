// crates/gf_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! [`BiCgStabSolver`] 求解非对称稀疏系统 Ax = b。矩阵-向量乘法与内积都经过
//! [`LinearOperator`]，因此同一实现既可串行使用（直接用 [`CsrMatrix`]），
//! 也可在分布式系统上使用（内积做全局规约，乘法前收集全局向量）。
//!
//! 不收敛不是错误：结果通过 [`SolverResult::status`] 返回。
//!
//! # 使用示例
//!
//! ```
//! use gf_physics::numerics::linear_algebra::{
//!     BiCgStabSolver, CsrBuilder, JacobiPreconditioner, SolverConfig,
//! };
//!
//! let mut builder = CsrBuilder::new_square(2);
//! builder.set(0, 0, 2.0);
//! builder.set(1, 1, 4.0);
//! let matrix = builder.build();
//!
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//! let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 50));
//! let mut x = vec![0.0; 2];
//! let result = solver.solve(&matrix, &[2.0, 4.0], &mut x, &precond);
//! assert!(result.is_converged());
//! assert!((x[1] - 1.0).abs() < 1e-10);
//! ```

use serde::{Deserialize, Serialize};

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot};

// ============================================================================
// 配置与结果
// ============================================================================

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否输出每步残差（trace 级别）
    pub verbose: bool,
    /// 残差超过初始残差的该倍数时判为发散并提前返回；`None` 时迭代到上限
    #[serde(default = "default_divergence_factor")]
    pub divergence_factor: Option<f64>,
}

fn default_divergence_factor() -> Option<f64> {
    Some(1e6)
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-14,
            max_iter: 1000,
            verbose: false,
            divergence_factor: default_divergence_factor(),
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置绝对容差
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// 启用详细输出
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// 设置发散判据，`None` 关闭发散检测
    pub fn with_divergence_factor(mut self, factor: Option<f64>) -> Self {
        self.divergence_factor = factor;
        self
    }
}

/// 求解器状态
///
/// 除 `MaxIterationsReached` 外，`Diverged` 和 `Stagnated` 也会在达到迭代上限前
/// 结束求解：前者由 [`SolverConfig::divergence_factor`] 控制，后者在
/// BiCGStab 的内积退化（|ρ|、|r0·v| 或 |ω| 小于 1e-30）时出现，继续迭代只会
/// 产生 NaN。三者都不是错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 相对残差
    pub relative_residual: f64,
}

impl SolverResult {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    fn new(status: SolverStatus, iterations: usize, residual: f64, initial: f64) -> Self {
        Self {
            status,
            iterations,
            residual_norm: residual,
            initial_residual_norm: initial,
            relative_residual: if initial > 0.0 { residual / initial } else { 0.0 },
        }
    }
}

// ============================================================================
// 线性算子
// ============================================================================

/// 线性算子
///
/// 向量都是本进程的片段；`dot` 返回全局内积。
pub trait LinearOperator {
    /// y = A * x
    fn apply(&self, x: &[f64], y: &mut [f64]);

    /// 全局内积
    fn dot(&self, a: &[f64], b: &[f64]) -> f64;

    /// 全局 2-范数
    fn norm2(&self, a: &[f64]) -> f64 {
        self.dot(a, a).sqrt()
    }
}

impl LinearOperator for CsrMatrix {
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.mul_vec(x, y);
    }

    fn dot(&self, a: &[f64], b: &[f64]) -> f64 {
        dot(a, b)
    }
}

// ============================================================================
// BiCGStab
// ============================================================================

/// 双共轭梯度稳定法求解器
///
/// 适用于非对称矩阵。工作向量在多次求解间复用。
pub struct BiCgStabSolver {
    config: SolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    z: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建 BiCGStab 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            z: Vec::new(),
        }
    }

    /// 配置
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 确保工作向量大小正确
    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.z = vec![0.0; n];
        }
    }

    /// 求解 A x = b，`x` 为初值并被原地更新
    pub fn solve<A, P>(&mut self, op: &A, b: &[f64], x: &mut [f64], precond: &P) -> SolverResult
    where
        A: LinearOperator + ?Sized,
        P: Preconditioner + ?Sized,
    {
        let n = b.len();
        self.ensure_workspace(n);
        let rtol = self.config.rtol;
        let atol = self.config.atol;
        let stag_tol = 1e-30;

        // r = b - A*x
        op.apply(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = op.norm2(&self.r);
        if initial_norm < atol {
            return SolverResult::new(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;

        self.v.fill(0.0);
        self.p.fill(0.0);

        for iter in 0..self.config.max_iter {
            let rho = op.dot(&self.r0, &self.r);
            if rho.abs() < stag_tol {
                let res = op.norm2(&self.r);
                return SolverResult::new(SolverStatus::Stagnated, iter, res, initial_norm);
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta * (p - omega * v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            // v = A * M⁻¹ p
            precond.apply(&self.p, &mut self.z);
            op.apply(&self.z, &mut self.v);

            let r0v = op.dot(&self.r0, &self.v);
            if r0v.abs() < stag_tol {
                let res = op.norm2(&self.r);
                return SolverResult::new(SolverStatus::Stagnated, iter, res, initial_norm);
            }
            alpha = rho / r0v;

            // s = r - alpha * v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = op.norm2(&self.s);
            if s_norm < atol || s_norm / initial_norm < rtol {
                axpy(alpha, &self.z, x);
                return SolverResult::new(SolverStatus::Converged, iter + 1, s_norm, initial_norm);
            }

            // 保存 M⁻¹ p 到 x 的贡献
            axpy(alpha, &self.z, x);

            // t = A * M⁻¹ s
            precond.apply(&self.s, &mut self.z);
            op.apply(&self.z, &mut self.t);

            let tt = op.dot(&self.t, &self.t);
            omega = if tt.abs() < stag_tol {
                1.0
            } else {
                op.dot(&self.t, &self.s) / tt
            };

            if omega.abs() < stag_tol {
                return SolverResult::new(SolverStatus::Stagnated, iter + 1, s_norm, initial_norm);
            }

            axpy(omega, &self.z, x);

            // r = s - omega * t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = op.norm2(&self.r);
            let rel_res = res_norm / initial_norm;

            if self.config.verbose {
                log::trace!("BiCGStab 迭代 {}: 残差 = {:.6e}", iter + 1, res_norm);
            }

            if res_norm < atol || rel_res < rtol {
                return SolverResult::new(SolverStatus::Converged, iter + 1, res_norm, initial_norm);
            }

            if matches!(self.config.divergence_factor, Some(f) if res_norm > initial_norm * f) {
                return SolverResult::new(SolverStatus::Diverged, iter + 1, res_norm, initial_norm);
            }
        }

        let res = op.norm2(&self.r);
        SolverResult::new(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            res,
            initial_norm,
        )
    }

    /// 求解器名称
    pub fn name(&self) -> &'static str {
        "BiCGStab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::csr::CsrBuilder;
    use crate::numerics::linear_algebra::preconditioner::{
        IdentityPreconditioner, Ilu0Preconditioner, JacobiPreconditioner,
    };

    fn create_spd_matrix(n: usize) -> CsrMatrix {
        let mut builder = CsrBuilder::new_square(n);
        for i in 0..n {
            builder.set(i, i, 4.0);
            if i > 0 {
                builder.set(i, i - 1, -1.0);
            }
            if i < n - 1 {
                builder.set(i, i + 1, -1.0);
            }
        }
        builder.build()
    }

    fn create_nonsymmetric_matrix(n: usize) -> CsrMatrix {
        let mut builder = CsrBuilder::new_square(n);
        for i in 0..n {
            builder.set(i, i, 3.0);
            if i > 0 {
                builder.set(i, i - 1, -2.0);
            }
            if i < n - 1 {
                builder.set(i, i + 1, -0.5);
            }
        }
        builder.build()
    }

    #[test]
    fn test_bicgstab_simple() {
        let matrix = create_spd_matrix(10);
        let b = vec![1.0; 10];
        let mut x = vec![0.0; 10];

        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 100));
        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let result = solver.solve(&matrix, &b, &mut x, &precond);

        assert!(result.is_converged());
        assert!(result.relative_residual < 1e-8);

        let mut ax = vec![0.0; 10];
        matrix.mul_vec(&x, &mut ax);
        for (lhs, rhs) in ax.iter().zip(&b) {
            assert!((lhs - rhs).abs() < 1e-8);
        }
    }

    #[test]
    fn test_bicgstab_nonsymmetric_all_preconditioners() {
        let matrix = create_nonsymmetric_matrix(20);
        let x_exact: Vec<f64> = (0..20).map(|i| (i as f64 * 0.3).sin()).collect();
        let mut b = vec![0.0; 20];
        matrix.mul_vec(&x_exact, &mut b);

        let preconds: Vec<Box<dyn Preconditioner>> = vec![
            Box::new(IdentityPreconditioner),
            Box::new(JacobiPreconditioner::from_matrix(&matrix)),
            Box::new(Ilu0Preconditioner::new(&matrix)),
        ];
        for p in &preconds {
            let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-12, 200));
            let mut x = vec![0.0; 20];
            let result = solver.solve(&matrix, &b, &mut x, p.as_ref());
            assert!(result.is_converged(), "{} 未收敛: {:?}", p.name(), result);
            for (xi, ei) in x.iter().zip(&x_exact) {
                assert!((xi - ei).abs() < 1e-8, "{}", p.name());
            }
        }
    }

    #[test]
    fn test_already_converged() {
        let matrix = create_spd_matrix(3);
        let x_exact = vec![0.25, 0.25, 0.25];
        let mut b = vec![0.0; 3];
        matrix.mul_vec(&x_exact, &mut b);
        let mut x = x_exact.clone();

        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 100));
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner);
        assert!(result.is_converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_max_iterations_is_not_error() {
        let matrix = create_nonsymmetric_matrix(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];
        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-30, 2).with_atol(0.0));
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner);
        assert_eq!(result.status, SolverStatus::MaxIterationsReached);
        assert_eq!(result.iterations, 2);
        assert!(result.relative_residual > 0.0);
    }

    #[test]
    fn test_divergence_factor_controls_early_exit() {
        let matrix = create_nonsymmetric_matrix(50);
        let b = vec![1.0; 50];
        let config = SolverConfig::new(1e-30, 2).with_atol(0.0);
        assert_eq!(config.divergence_factor, Some(1e6));

        // 判据为 0 时任何非零残差都算发散
        let mut x = vec![0.0; 50];
        let mut solver = BiCgStabSolver::new(config.clone().with_divergence_factor(Some(0.0)));
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner);
        assert_eq!(result.status, SolverStatus::Diverged);
        assert_eq!(result.iterations, 1);

        // 关闭发散检测后迭代到上限
        let mut x = vec![0.0; 50];
        let mut solver = BiCgStabSolver::new(config.with_divergence_factor(None));
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner);
        assert_eq!(result.status, SolverStatus::MaxIterationsReached);
        assert_eq!(result.iterations, 2);
    }
}
