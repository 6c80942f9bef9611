// crates/gf_geo/src/polygon.rs

//! 简单多边形
//!
//! 顶点在构造时统一为逆时针顺序。所有查询按边逐一计算，
//! 复杂度 O(顶点数)。

use glam::DVec2;
use serde::{Deserialize, Serialize};

use gf_foundation::error::{GfError, GfResult};
use gf_foundation::float::GEOMETRY_EPSILON;

use crate::primitives::{rotate_about, Ray2D, Segment2D};

/// 简单多边形（逆时针）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<DVec2>,
}

impl Polygon {
    /// 从顶点创建多边形
    ///
    /// 顺时针输入会被反转；少于 3 个顶点或面积为零时返回 `DegenerateGeometry`。
    pub fn new(mut vertices: Vec<DVec2>) -> GfResult<Self> {
        if vertices.len() < 3 {
            return Err(GfError::degenerate(format!(
                "多边形至少需要 3 个顶点, 实际 {}",
                vertices.len()
            )));
        }
        let area = signed_area(&vertices);
        if area.abs() < GEOMETRY_EPSILON {
            return Err(GfError::degenerate("多边形面积为零"));
        }
        if area < 0.0 {
            vertices.reverse();
        }
        Ok(Self { vertices })
    }

    /// 从已知逆时针、非退化的顶点直接构造
    pub(crate) fn from_ccw(vertices: Vec<DVec2>) -> Self {
        Self { vertices }
    }

    /// 顶点
    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// 边迭代器（首尾闭合）
    pub fn edges(&self) -> impl Iterator<Item = Segment2D> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| Segment2D::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// 面积
    #[inline]
    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// 形心
    pub fn centroid(&self) -> DVec2 {
        let a = signed_area(&self.vertices);
        let mut c = DVec2::ZERO;
        for e in self.edges() {
            let cross = e.a.perp_dot(e.b);
            c += (e.a + e.b) * cross;
        }
        c / (6.0 * a)
    }

    /// 包围盒 (min, max)
    pub fn bounding_box(&self) -> (DVec2, DVec2) {
        self.vertices.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
    }

    /// 点是否在边上
    pub fn is_on_edge(&self, p: DVec2, tol: f64) -> bool {
        self.edges().any(|e| e.contains_point(p, tol))
    }

    /// 点是否在多边形内（边界视为内部）
    pub fn is_inside(&self, p: DVec2) -> bool {
        if self.is_on_edge(p, GEOMETRY_EPSILON) {
            return true;
        }
        // 交叉数法：沿 +x 方向计数
        let mut inside = false;
        for e in self.edges() {
            let (a, b) = (e.a, e.b);
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// 距 `p` 最近的边
    pub fn nearest_edge(&self, p: DVec2) -> Segment2D {
        let mut best = Segment2D::new(self.vertices[0], self.vertices[1]);
        let mut best_d = f64::INFINITY;
        for e in self.edges() {
            let d = e.distance_to(p);
            if d < best_d {
                best_d = d;
                best = e;
            }
        }
        best
    }

    /// 边界上距 `p` 最近的点
    #[inline]
    pub fn nearest_intersect(&self, p: DVec2) -> DVec2 {
        self.nearest_edge(p).closest_point(p)
    }

    /// 最近边的外法向
    #[inline]
    pub fn nearest_edge_normal(&self, p: DVec2) -> DVec2 {
        self.nearest_edge(p).outward_normal()
    }

    /// 射线与边界的全部交点，按射线参数升序
    pub fn intersections(&self, ray: &Ray2D) -> Vec<DVec2> {
        let mut ts: Vec<f64> = self.edges().filter_map(|e| e.intersect_ray(ray)).collect();
        ts.sort_by(|a, b| a.total_cmp(b));
        // 射线穿过顶点时相邻两条边给出同一交点
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        ts.into_iter().map(|t| ray.point_at(t)).collect()
    }

    /// 平移
    pub fn translate(&mut self, delta: DVec2) {
        for v in &mut self.vertices {
            *v += delta;
        }
    }

    /// 绕 `about` 旋转
    pub fn rotate(&mut self, theta: f64, about: DVec2) {
        for v in &mut self.vertices {
            *v = rotate_about(*v, theta, about);
        }
    }

    /// 绕形心缩放
    pub fn scale(&mut self, factor: f64) {
        let c = self.centroid();
        for v in &mut self.vertices {
            *v = c + (*v - c) * factor;
        }
    }
}

/// 鞋带公式有符号面积（逆时针为正）
fn signed_area(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    0.5 * (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum::<f64>()
}
