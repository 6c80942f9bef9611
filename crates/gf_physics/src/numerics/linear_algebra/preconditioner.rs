// crates/gf_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件子
//!
//! 预条件子用于加速迭代求解器的收敛，把 Ax = b 转换为条件数更好的
//! M⁻¹Ax = M⁻¹b。分布式求解时它们作用在本进程的对角块上（块 Jacobi）。
//!
//! - [`IdentityPreconditioner`]: 无预条件
//! - [`JacobiPreconditioner`]: 对角预条件
//! - [`Ilu0Preconditioner`]: 不完全 LU 分解，可选丢弃容差

use gf_config::PreconditionerKind;

use super::csr::CsrMatrix;

/// 预条件子 trait
///
/// 核心操作是 `apply`: z = M⁻¹ * r
pub trait Preconditioner: Send + Sync {
    /// 应用预条件子: z = M⁻¹ * r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 名称
    fn name(&self) -> &'static str;

    /// 矩阵值变化但结构不变时重新计算
    fn update(&mut self, matrix: &CsrMatrix);
}

/// 按配置创建对角块预条件子
pub fn build_preconditioner(
    kind: PreconditionerKind,
    block: &CsrMatrix,
    drop_tolerance: f64,
) -> Box<dyn Preconditioner> {
    match kind {
        PreconditionerKind::Ilu0 => Box::new(Ilu0Preconditioner::with_drop_tolerance(
            block,
            drop_tolerance,
        )),
        PreconditionerKind::Jacobi => Box::new(JacobiPreconditioner::from_matrix(block)),
        PreconditionerKind::None => Box::new(IdentityPreconditioner),
    }
}

/// 恒等预条件子
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &CsrMatrix) {}
}

/// Jacobi 预条件子
///
/// M = diag(A)，即 z_i = r_i / A_ii。对角元接近零的行不缩放。
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    const ZERO_THRESHOLD: f64 = 1e-14;

    /// 从矩阵创建
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        let mut p = Self {
            inv_diag: vec![1.0; matrix.n_rows()],
        };
        p.update(matrix);
        p
    }

    /// 对角元倒数
    pub fn inv_diagonal(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        debug_assert_eq!(r.len(), z.len());
        debug_assert_eq!(r.len(), self.inv_diag.len());
        for ((zi, &ri), &inv_d) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * inv_d;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        self.inv_diag.resize(matrix.n_rows(), 1.0);
        for (i, inv) in self.inv_diag.iter_mut().enumerate() {
            *inv = match matrix.diagonal_value(i) {
                Some(d) if d.abs() > Self::ZERO_THRESHOLD => 1.0 / d,
                _ => 1.0,
            };
        }
    }
}

/// ILU(0) 不完全 LU 分解预条件子
///
/// 保持原矩阵稀疏模式。`drop_tolerance > 0` 时，
/// 绝对值小于容差的下三角因子被丢弃。
#[derive(Debug, Clone)]
pub struct Ilu0Preconditioner {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    /// L 和 U 共用存储
    lu_values: Vec<f64>,
    /// 对角元位置
    diag_ptr: Vec<usize>,
    drop_tolerance: f64,
}

impl Ilu0Preconditioner {
    /// 从方阵创建（每行必须有对角位置）
    pub fn new(matrix: &CsrMatrix) -> Self {
        Self::with_drop_tolerance(matrix, 0.0)
    }

    /// 带丢弃容差创建
    pub fn with_drop_tolerance(matrix: &CsrMatrix, drop_tolerance: f64) -> Self {
        let n = matrix.n_rows();
        let row_ptr = matrix.row_ptr().to_vec();
        let col_idx = matrix.col_idx().to_vec();

        let diag_ptr = (0..n)
            .map(|i| {
                (row_ptr[i]..row_ptr[i + 1])
                    .find(|&k| col_idx[k] == i)
                    .unwrap_or(row_ptr[i])
            })
            .collect();

        let mut p = Self {
            n,
            row_ptr,
            col_idx,
            lu_values: matrix.values().to_vec(),
            diag_ptr,
            drop_tolerance,
        };
        p.factorize();
        p
    }

    /// 原地分解
    ///
    /// 使用主元正则化和增长因子限制提高数值稳定性。
    fn factorize(&mut self) {
        let pivot_tol = 1e-10;
        let growth_limit = 1e3;
        let (row_ptr, col_idx, diag_ptr) = (&self.row_ptr, &self.col_idx, &self.diag_ptr);
        let lu = &mut self.lu_values;

        for i in 1..self.n {
            for k_idx in row_ptr[i]..row_ptr[i + 1] {
                let k = col_idx[k_idx];
                if k >= i {
                    break;
                }

                // 主元正则化
                let mut diag_k = lu[diag_ptr[k]];
                if diag_k.abs() < pivot_tol {
                    diag_k = if diag_k < 0.0 { -pivot_tol } else { pivot_tol };
                    lu[diag_ptr[k]] = diag_k;
                }

                let factor = (lu[k_idx] / diag_k).clamp(-growth_limit, growth_limit);
                if factor.abs() < self.drop_tolerance {
                    lu[k_idx] = 0.0;
                    continue;
                }
                lu[k_idx] = factor;

                for j_idx in (k_idx + 1)..row_ptr[i + 1] {
                    let j = col_idx[j_idx];
                    if let Ok(m) = col_idx[row_ptr[k]..row_ptr[k + 1]].binary_search(&j) {
                        let update = factor * lu[row_ptr[k] + m];
                        lu[j_idx] -= update.clamp(-growth_limit, growth_limit);
                    }
                }
            }
        }
    }

    /// 前向替换: L * y = r
    fn forward_solve(&self, r: &[f64], y: &mut [f64]) {
        y.copy_from_slice(r);
        for i in 0..self.n {
            for k_idx in self.row_ptr[i]..self.diag_ptr[i] {
                let j = self.col_idx[k_idx];
                y[i] -= self.lu_values[k_idx] * y[j];
            }
        }
    }

    /// 后向替换: U * z = y
    fn backward_solve(&self, y: &[f64], z: &mut [f64]) {
        z.copy_from_slice(y);
        for i in (0..self.n).rev() {
            for k_idx in (self.diag_ptr[i] + 1)..self.row_ptr[i + 1] {
                let j = self.col_idx[k_idx];
                z[i] -= self.lu_values[k_idx] * z[j];
            }
            let diag = self.lu_values[self.diag_ptr[i]];
            if diag.abs() > 1e-14 {
                z[i] /= diag;
            }
        }
    }
}

impl Preconditioner for Ilu0Preconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        let mut y = vec![0.0; self.n];
        self.forward_solve(r, &mut y);
        self.backward_solve(&y, z);
    }

    fn name(&self) -> &'static str {
        "ILU(0)"
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        self.lu_values.copy_from_slice(matrix.values());
        self.factorize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::csr::CsrBuilder;

    fn tridiagonal(n: usize) -> CsrMatrix {
        let mut b = CsrBuilder::new_square(n);
        for i in 0..n {
            b.set(i, i, 4.0);
            if i > 0 {
                b.set(i, i - 1, -1.0);
            }
            if i + 1 < n {
                b.set(i, i + 1, -1.0);
            }
        }
        b.build()
    }

    #[test]
    fn test_jacobi() {
        let m = tridiagonal(3);
        let p = JacobiPreconditioner::from_matrix(&m);
        let mut z = vec![0.0; 3];
        p.apply(&[4.0, 8.0, 2.0], &mut z);
        assert_eq!(z, vec![1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_ilu0_exact_for_tridiagonal() {
        // 三对角矩阵的 ILU(0) 没有填充，等于完全 LU
        let m = tridiagonal(5);
        let p = Ilu0Preconditioner::new(&m);
        let x = vec![1.0, -2.0, 0.5, 3.0, 1.0];
        let mut b = vec![0.0; 5];
        m.mul_vec(&x, &mut b);
        let mut z = vec![0.0; 5];
        p.apply(&b, &mut z);
        for (zi, xi) in z.iter().zip(&x) {
            assert!((zi - xi).abs() < 1e-12);
        }
        assert_eq!(p.name(), "ILU(0)");
    }

    #[test]
    fn test_build_by_kind() {
        let m = tridiagonal(4);
        assert_eq!(build_preconditioner(PreconditionerKind::None, &m, 0.0).name(), "Identity");
        assert_eq!(build_preconditioner(PreconditionerKind::Jacobi, &m, 0.0).name(), "Jacobi");
        assert_eq!(build_preconditioner(PreconditionerKind::Ilu0, &m, 1e-3).name(), "ILU(0)");
    }
}
