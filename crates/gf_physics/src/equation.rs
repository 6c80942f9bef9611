// crates/gf_physics/src/equation.rs

//! 稀疏方程
//!
//! `Equation` 按全局未知量编号存储稀疏行与源项，表示
//!
//! ```text
//! Σ_j a_ij x_j + s_i = 0
//! ```
//!
//! 因此线性系统右端项为 `b_i = -s_i`。
//!
//! 内部离散、边界条件和浸入边界各自生成 `Equation`，再通过 `+` 累加：
//! 同一 (行, 列) 的贡献直接求和，与累加顺序无关。
//! 浸入边界的钉扎行需要覆盖内部离散时使用 [`Equation::override_rows`]。
//!
//! # 示例
//!
//! ```
//! use gf_physics::equation::Equation;
//!
//! let mut a = Equation::new();
//! a.add(0, 0, 2.0);
//! a.add_source(0, -1.0);
//!
//! let mut b = Equation::new();
//! b.add(0, 0, 1.0);
//! b.add(0, 1, -1.0);
//!
//! let sum = a + b;
//! assert_eq!(sum.coefficient(0, 0), 3.0);
//! assert_eq!(sum.coefficient(0, 1), -1.0);
//! assert_eq!(sum.source(0), -1.0);
//! ```

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Range};

/// 稀疏行
pub type SparseRow = BTreeMap<usize, f64>;

/// 稀疏方程
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equation {
    rows: BTreeMap<usize, SparseRow>,
    sources: BTreeMap<usize, f64>,
}

impl Equation {
    /// 创建空方程
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加系数 a(row, col) += coeff
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, coeff: f64) {
        *self.rows.entry(row).or_default().entry(col).or_insert(0.0) += coeff;
    }

    /// 累加一整行
    pub fn add_row(&mut self, row: usize, cols: &[usize], coeffs: &[f64]) {
        debug_assert_eq!(cols.len(), coeffs.len());
        let r = self.rows.entry(row).or_default();
        for (&c, &a) in cols.iter().zip(coeffs) {
            *r.entry(c).or_insert(0.0) += a;
        }
    }

    /// 累加源项 s(row) += source
    #[inline]
    pub fn add_source(&mut self, row: usize, source: f64) {
        self.rows.entry(row).or_default();
        *self.sources.entry(row).or_insert(0.0) += source;
    }

    /// 把 `row` 替换为单位行 `x_row + source = 0`
    pub fn pin(&mut self, row: usize, source: f64) {
        let mut r = SparseRow::new();
        r.insert(row, 1.0);
        self.rows.insert(row, r);
        self.sources.insert(row, source);
    }

    /// 系数（不存在时为 0）
    #[inline]
    pub fn coefficient(&self, row: usize, col: usize) -> f64 {
        self.rows
            .get(&row)
            .and_then(|r| r.get(&col))
            .copied()
            .unwrap_or(0.0)
    }

    /// 源项（不存在时为 0）
    #[inline]
    pub fn source(&self, row: usize) -> f64 {
        self.sources.get(&row).copied().unwrap_or(0.0)
    }

    /// 稀疏行
    #[inline]
    pub fn row(&self, row: usize) -> Option<&SparseRow> {
        self.rows.get(&row)
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 全部行号（升序）
    pub fn row_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.keys().copied()
    }

    /// 用 `other` 中出现的行整行替换本方程对应行
    pub fn override_rows(&mut self, other: &Equation) {
        for (&row, r) in &other.rows {
            self.rows.insert(row, r.clone());
            match other.sources.get(&row) {
                Some(&s) => {
                    self.sources.insert(row, s);
                }
                None => {
                    self.sources.remove(&row);
                }
            }
        }
    }

    /// 用 `other` 的第 `row` 行替换本方程对应行，`other` 没有该行时不变
    pub fn copy_row(&mut self, other: &Equation, row: usize) {
        let Some(r) = other.rows.get(&row) else {
            return;
        };
        self.rows.insert(row, r.clone());
        match other.sources.get(&row) {
            Some(&s) => {
                self.sources.insert(row, s);
            }
            None => {
                self.sources.remove(&row);
            }
        }
    }

    /// 计算某行残量 `Σ a_ij x_j + s_i`
    pub fn row_residual<F>(&self, row: usize, x: F) -> f64
    where
        F: Fn(usize) -> f64,
    {
        let lhs: f64 = self
            .rows
            .get(&row)
            .map_or(0.0, |r| r.iter().map(|(&c, &a)| a * x(c)).sum());
        lhs + self.source(row)
    }

    /// 提取 `range` 内的行，返回 (稀疏行, 右端项 b = -s)
    ///
    /// 缺失的行返回空行，由调用方处理。
    pub fn local_system(&self, range: Range<usize>) -> (Vec<Vec<(usize, f64)>>, Vec<f64>) {
        let n = range.len();
        let mut rows = vec![Vec::new(); n];
        let mut rhs = vec![0.0; n];
        for (&row, r) in self.rows.range(range.clone()) {
            let local = row - range.start;
            rows[local] = r.iter().map(|(&c, &a)| (c, a)).collect();
            rhs[local] = -self.source(row);
        }
        (rows, rhs)
    }
}

impl AddAssign<&Equation> for Equation {
    fn add_assign(&mut self, rhs: &Equation) {
        for (&row, r) in &rhs.rows {
            let dst = self.rows.entry(row).or_default();
            for (&c, &a) in r {
                *dst.entry(c).or_insert(0.0) += a;
            }
        }
        for (&row, &s) in &rhs.sources {
            *self.sources.entry(row).or_insert(0.0) += s;
        }
    }
}

impl AddAssign for Equation {
    fn add_assign(&mut self, rhs: Equation) {
        *self += &rhs;
    }
}

impl Add for Equation {
    type Output = Equation;

    fn add(mut self, rhs: Equation) -> Equation {
        self += &rhs;
        self
    }
}
