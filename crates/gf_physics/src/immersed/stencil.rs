// crates/gf_physics/src/immersed/stencil.rs

//! 鬼单元模板
//!
//! 对每个界面单元 `c`（形心在形状内部），取边界点 `bp` 和流体侧镜像点 `ip`：
//!
//! ```text
//!      c ────l1──── bp ────l2──── ip
//!   (内部)        (边界)       (流体)
//! ```
//!
//! `u(ip)` 由 `ip` 附近的非固体单元插值得到，于是
//!
//! - Dirichlet: `u(bp) ≈ (l2·u_c + l1·u_ip) / (l1 + l2)`
//! - Neumann:   `∂u/∂n(bp) ≈ (u_ip − u_c) / (l1 + l2)`
//!
//! 两组系数与 `cells()` 对齐，下标 0 是锚单元本身。

use glam::DVec2;

use gf_foundation::float::GEOMETRY_EPSILON;
use gf_geo::Shape;

use crate::fields::ScalarField;
use crate::mesh::{CellSearch, GridTopology};

use super::interpolation::InterpolationChain;

/// 鬼单元模板（构建后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct GhostCellStencil {
    cell: usize,
    boundary_point: DVec2,
    image_point: DVec2,
    normal: DVec2,
    l1: f64,
    l2: f64,
    cells: Vec<usize>,
    ip_weights: Vec<f64>,
    dirichlet_coeffs: Vec<f64>,
    neumann_coeffs: Vec<f64>,
    basis: &'static str,
}

impl GhostCellStencil {
    /// 以最近边界点为 `bp` 构建
    ///
    /// `is_candidate` 决定哪些单元可参与镜像点插值（通常排除固体单元）。
    pub fn build<G, F>(
        grid: &G,
        search: &CellSearch,
        shape: &Shape,
        cell: usize,
        is_candidate: F,
        chain: &InterpolationChain,
    ) -> Self
    where
        G: GridTopology + ?Sized,
        F: Fn(usize) -> bool,
    {
        let bp = shape.nearest_intersect(grid.centroid(cell));
        Self::towards(grid, search, shape, cell, bp, is_candidate, chain)
    }

    /// 以给定边界点构建单侧模板
    ///
    /// 接触线条件沿倾斜射线取边界点时使用。
    pub fn towards<G, F>(
        grid: &G,
        search: &CellSearch,
        shape: &Shape,
        cell: usize,
        boundary_point: DVec2,
        is_candidate: F,
        chain: &InterpolationChain,
    ) -> Self
    where
        G: GridTopology + ?Sized,
        F: Fn(usize) -> bool,
    {
        let c = grid.centroid(cell);
        let h = grid.length_scale(cell);
        let l1 = (boundary_point - c).length();
        let normal = if l1 > GEOMETRY_EPSILON * h.max(1.0) {
            (boundary_point - c) / l1
        } else {
            shape.outward_normal(boundary_point)
        };
        let l2 = l1.max(0.5 * h);
        let image_point = boundary_point + normal * l2;

        let candidates = search.nearest(image_point, chain.max_points(), is_candidate);
        let points: Vec<DVec2> = candidates.iter().map(|&n| grid.centroid(n)).collect();

        let (mut basis, cells, mut ip_weights) = match chain.interpolate(&points, image_point, h) {
            Some((basis, w)) => {
                let mut cells = vec![cell];
                let mut weights = vec![0.0];
                for (&n, &wk) in candidates.iter().zip(&w) {
                    if n == cell {
                        weights[0] += wk;
                    } else {
                        cells.push(n);
                        weights.push(wk);
                    }
                }
                (basis, cells, weights)
            }
            None => ("identity", vec![cell], vec![1.0]),
        };

        // 只剩锚单元时 Neumann 行全零，退化为单位模板
        let (dirichlet_coeffs, neumann_coeffs) = if cells.len() == 1 {
            basis = "identity";
            ip_weights = vec![1.0];
            (vec![1.0], vec![1.0])
        } else {
            let total = l1 + l2;
            let mut dirichlet: Vec<f64> = ip_weights.iter().map(|w| l1 / total * w).collect();
            dirichlet[0] += l2 / total;
            let mut neumann: Vec<f64> = ip_weights.iter().map(|w| w / total).collect();
            neumann[0] -= 1.0 / total;
            (dirichlet, neumann)
        };

        Self {
            cell,
            boundary_point,
            image_point,
            normal,
            l1,
            l2,
            cells,
            ip_weights,
            dirichlet_coeffs,
            neumann_coeffs,
            basis,
        }
    }

    /// 锚单元
    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// 边界点
    #[inline]
    pub fn boundary_point(&self) -> DVec2 {
        self.boundary_point
    }

    /// 镜像点
    #[inline]
    pub fn image_point(&self) -> DVec2 {
        self.image_point
    }

    /// 由锚单元指向镜像点的单位方向
    #[inline]
    pub fn normal(&self) -> DVec2 {
        self.normal
    }

    /// 形心到边界点距离
    #[inline]
    pub fn l1(&self) -> f64 {
        self.l1
    }

    /// 边界点到镜像点距离
    #[inline]
    pub fn l2(&self) -> f64 {
        self.l2
    }

    /// 参与单元，下标 0 为锚单元
    #[inline]
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// 除锚单元外的插值单元
    #[inline]
    pub fn neighbours(&self) -> &[usize] {
        &self.cells[1..]
    }

    /// 镜像点插值权重
    #[inline]
    pub fn ip_weights(&self) -> &[f64] {
        &self.ip_weights
    }

    /// Dirichlet 系数
    #[inline]
    pub fn dirichlet_coeffs(&self) -> &[f64] {
        &self.dirichlet_coeffs
    }

    /// Neumann 系数
    #[inline]
    pub fn neumann_coeffs(&self) -> &[f64] {
        &self.neumann_coeffs
    }

    /// 所用插值基名称
    #[inline]
    pub fn basis_name(&self) -> &'static str {
        self.basis
    }

    /// 是否退化为单位模板
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.basis == "identity"
    }

    /// 镜像点插值值
    pub fn image_value(&self, field: &ScalarField) -> f64 {
        dot(&self.cells, &self.ip_weights, field)
    }

    /// 模板给出的边界值
    pub fn boundary_value(&self, field: &ScalarField) -> f64 {
        dot(&self.cells, &self.dirichlet_coeffs, field)
    }

    /// 模板给出的边界法向梯度
    pub fn normal_gradient(&self, field: &ScalarField) -> f64 {
        dot(&self.cells, &self.neumann_coeffs, field)
    }
}

fn dot(cells: &[usize], coeffs: &[f64], field: &ScalarField) -> f64 {
    cells.iter().zip(coeffs).map(|(&c, &a)| a * field[c]).sum()
}
