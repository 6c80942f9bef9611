// crates/gf_physics/src/immersed/interpolation.rs

//! 插值基
//!
//! 给定若干支撑点（按到目标点的距离升序）和目标点，求权重 `w_k`，
//! 使 `Σ w_k f(p_k)` 逼近 `f(target)`。
//!
//! | 基 | 支撑点数 | 精确再现 |
//! |----|---------|---------|
//! | [`Bilinear`] | 4 | 常数、线性、xy |
//! | [`LinearLeastSquares`] | 3..=6 | 常数、线性 |
//! | [`InverseDistance`] | 1..=4 | 常数 |
//!
//! [`InterpolationChain`] 依次尝试各基，第一个非奇异的结果被采用。
//! 反距离加权只在支撑点退化（全部共线）时才会被用到。

use std::fmt::Debug;

use glam::{DMat3, DMat4, DVec2, DVec3, DVec4};

/// 插值矩阵奇异判据（局部无量纲坐标下）
const SINGULAR_TOL: f64 = 1e-8;

/// 权重幅值上限，超过视为过度外插
const MAX_WEIGHT: f64 = 1e3;

/// 插值基
pub trait InterpolationBasis: Send + Sync + Debug {
    /// 名称
    fn name(&self) -> &'static str;

    /// 所需最少支撑点数
    fn min_points(&self) -> usize;

    /// 使用的最多支撑点数
    fn max_points(&self) -> usize;

    /// 计算权重
    ///
    /// `scale` 为局部长度尺度，用于无量纲化。支撑点退化时返回 `None`。
    fn weights(&self, points: &[DVec2], target: DVec2, scale: f64) -> Option<Vec<f64>>;
}

/// 双线性插值 `[1, x, y, xy]`
#[derive(Debug, Clone, Copy, Default)]
pub struct Bilinear;

impl InterpolationBasis for Bilinear {
    fn name(&self) -> &'static str {
        "bilinear"
    }

    fn min_points(&self) -> usize {
        4
    }

    fn max_points(&self) -> usize {
        4
    }

    fn weights(&self, points: &[DVec2], target: DVec2, scale: f64) -> Option<Vec<f64>> {
        if points.len() != 4 {
            return None;
        }
        let col = |p: DVec2| {
            let q = (p - target) / scale;
            DVec4::new(1.0, q.x, q.y, q.x * q.y)
        };
        // 第 k 列为第 k 个点的基函数值，即 A^T
        let m = DMat4::from_cols(col(points[0]), col(points[1]), col(points[2]), col(points[3]));
        if m.determinant().abs() < SINGULAR_TOL {
            return None;
        }
        // A^T w = φ(target) = e1
        let w = m.inverse().x_axis.to_array().to_vec();
        accept(w)
    }
}

/// 线性最小二乘 `[1, x, y]`，取最小范数权重
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearLeastSquares;

impl InterpolationBasis for LinearLeastSquares {
    fn name(&self) -> &'static str {
        "linear_lsq"
    }

    fn min_points(&self) -> usize {
        3
    }

    fn max_points(&self) -> usize {
        6
    }

    fn weights(&self, points: &[DVec2], target: DVec2, scale: f64) -> Option<Vec<f64>> {
        if points.len() < 3 {
            return None;
        }
        let rows: Vec<DVec3> = points
            .iter()
            .map(|&p| {
                let q = (p - target) / scale;
                DVec3::new(1.0, q.x, q.y)
            })
            .collect();
        let normal = rows.iter().fold(DMat3::ZERO, |acc, a| {
            acc + DMat3::from_cols(*a * a.x, *a * a.y, *a * a.z)
        });
        if normal.determinant().abs() < SINGULAR_TOL {
            return None;
        }
        let g = normal.inverse().x_axis;
        accept(rows.iter().map(|a| a.dot(g)).collect())
    }
}

/// 反距离加权
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseDistance;

impl InterpolationBasis for InverseDistance {
    fn name(&self) -> &'static str {
        "inverse_distance"
    }

    fn min_points(&self) -> usize {
        1
    }

    fn max_points(&self) -> usize {
        4
    }

    fn weights(&self, points: &[DVec2], target: DVec2, scale: f64) -> Option<Vec<f64>> {
        if points.is_empty() {
            return None;
        }
        let eps = 1e-12 * scale;
        if let Some(k) = points.iter().position(|&p| (p - target).length() < eps) {
            let mut w = vec![0.0; points.len()];
            w[k] = 1.0;
            return Some(w);
        }
        let inv: Vec<f64> = points.iter().map(|&p| 1.0 / (p - target).length()).collect();
        let total: f64 = inv.iter().sum();
        Some(inv.into_iter().map(|v| v / total).collect())
    }
}

fn accept(w: Vec<f64>) -> Option<Vec<f64>> {
    if w.iter().all(|v| v.is_finite() && v.abs() <= MAX_WEIGHT) {
        Some(w)
    } else {
        None
    }
}

/// 插值基链
#[derive(Debug)]
pub struct InterpolationChain {
    bases: Vec<Box<dyn InterpolationBasis>>,
}

impl Default for InterpolationChain {
    fn default() -> Self {
        Self {
            bases: vec![
                Box::new(Bilinear),
                Box::new(LinearLeastSquares),
                Box::new(InverseDistance),
            ],
        }
    }
}

impl InterpolationChain {
    /// 自定义基链
    pub fn new(bases: Vec<Box<dyn InterpolationBasis>>) -> Self {
        Self { bases }
    }

    /// 任一基使用的最多支撑点数
    pub fn max_points(&self) -> usize {
        self.bases.iter().map(|b| b.max_points()).max().unwrap_or(0)
    }

    /// 依次尝试各基
    ///
    /// 返回 (所用基名称, 使用的前 k 个点的权重)。
    pub fn interpolate(
        &self,
        points: &[DVec2],
        target: DVec2,
        scale: f64,
    ) -> Option<(&'static str, Vec<f64>)> {
        self.bases.iter().find_map(|basis| {
            let k = basis.max_points().min(points.len());
            if k < basis.min_points() {
                return None;
            }
            basis
                .weights(&points[..k], target, scale)
                .map(|w| (basis.name(), w))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_linear(points: &[DVec2], target: DVec2, w: &[f64]) {
        let f = |p: DVec2| 2.0 - 3.0 * p.x + 0.5 * p.y;
        let sum_w: f64 = w.iter().sum();
        assert!((sum_w - 1.0).abs() < 1e-12, "常数再现: {sum_w}");
        let val: f64 = points.iter().zip(w).map(|(&p, &wk)| wk * f(p)).sum();
        assert!((val - f(target)).abs() < 1e-12, "线性再现: {val} vs {}", f(target));
    }

    #[test]
    fn test_bilinear_square() {
        let pts = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ];
        let target = DVec2::new(0.25, 0.5);
        let w = Bilinear.weights(&pts, target, 1.0).unwrap();
        check_linear(&pts, target, &w);
        // 双线性还再现 xy
        let xy: f64 = pts.iter().zip(&w).map(|(p, wk)| wk * p.x * p.y).sum();
        assert!((xy - 0.125).abs() < 1e-12);
        assert!(w.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_bilinear_rejects_collinear() {
        let pts = [
            DVec2::new(0.0, 0.0),
            DVec2::new(-1.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        assert!(Bilinear.weights(&pts, DVec2::ZERO, 1.0).is_none());
        // 最小二乘可以处理
        let w = LinearLeastSquares.weights(&pts, DVec2::new(0.1, 0.2), 1.0).unwrap();
        check_linear(&pts, DVec2::new(0.1, 0.2), &w);
    }

    #[test]
    fn test_chain_falls_back_to_inverse_distance() {
        let chain = InterpolationChain::default();
        assert_eq!(chain.max_points(), 6);
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0), DVec2::new(2.0, 0.0)];
        let (name, w) = chain.interpolate(&pts, DVec2::new(0.5, 0.5), 1.0).unwrap();
        assert_eq!(name, "inverse_distance");
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_chain_prefers_bilinear() {
        let chain = InterpolationChain::default();
        let pts = [
            DVec2::new(0.0, 0.0),
            DVec2::new(0.1, 0.0),
            DVec2::new(0.0, 0.1),
            DVec2::new(0.1, 0.1),
            DVec2::new(0.2, 0.0),
        ];
        let target = DVec2::new(0.04, 0.07);
        let (name, w) = chain.interpolate(&pts, target, 0.1).unwrap();
        assert_eq!(name, "bilinear");
        assert_eq!(w.len(), 4);
        check_linear(&pts[..4], target, &w);
    }

    #[test]
    fn test_inverse_distance_coincident_point() {
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0)];
        let w = InverseDistance.weights(&pts, DVec2::new(1.0, 0.0), 1.0).unwrap();
        assert_eq!(w, vec![0.0, 1.0]);
    }
}
