// crates/gf_geo/src/shape.rs

//! 嵌入形状
//!
//! [`Shape`] 是带标签的形状描述：圆、轴对齐矩形、多边形三种内建类型，
//! 以及通过 [`ShapeQuery`] trait 对象接入的自定义形状。
//!
//! 所有形状提供同一组查询：
//!
//! - 点是否在内部 (`is_inside`)
//! - 边界上距给定点最近的点 (`nearest_intersect`)
//! - 边界外法向 (`outward_normal`)
//! - 射线与边界的交点 (`intersections`)
//!
//! 内建类型在 `match` 分支中使用闭式公式；自定义形状走通用实现。
//!
//! # 示例
//!
//! ```
//! use gf_geo::shape::Shape;
//! use glam::DVec2;
//!
//! let circle = Shape::circle(DVec2::new(0.5, 0.5), 0.3).unwrap();
//! assert!(circle.is_inside(DVec2::new(0.5, 0.6)));
//! let bp = circle.nearest_intersect(DVec2::new(0.5, 0.6));
//! assert!((bp - DVec2::new(0.5, 0.8)).length() < 1e-12);
//! ```

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use gf_foundation::error::{GfError, GfResult};
use gf_foundation::float::GEOMETRY_EPSILON;

use crate::polygon::Polygon;
use crate::primitives::{rotate_about, Ray2D};

// ============================================================================
// 通用查询接口
// ============================================================================

/// 形状查询能力
///
/// 自定义形状实现此 trait 后以 [`Shape::Custom`] 接入。
pub trait ShapeQuery: Send + Sync + fmt::Debug {
    /// 形状类型名
    fn kind_name(&self) -> &str;

    /// 点是否在内部（含边界）
    fn is_inside(&self, p: DVec2) -> bool;

    /// 边界上距 `p` 最近的点
    fn nearest_intersect(&self, p: DVec2) -> DVec2;

    /// 射线与边界交点，按射线参数升序
    fn intersections(&self, ray: &Ray2D) -> Vec<DVec2>;

    /// 包围盒 (min, max)
    fn bounding_box(&self) -> (DVec2, DVec2);

    /// 形心
    fn centroid(&self) -> DVec2;

    /// 平移
    fn translate(&mut self, delta: DVec2);

    /// 绕 `about` 旋转
    fn rotate(&mut self, theta: f64, about: DVec2);

    /// 克隆为 trait 对象
    fn clone_box(&self) -> Box<dyn ShapeQuery>;

    /// 边界外法向（单位向量）
    ///
    /// 默认实现由最近边界点推得：点在外部时指向该点，在内部时反向；
    /// 点恰在边界上时退化为形心到边界点的方向。
    fn outward_normal(&self, p: DVec2) -> DVec2 {
        let q = self.nearest_intersect(p);
        let d = p - q;
        if d.length() > GEOMETRY_EPSILON {
            let n = d.normalize();
            if self.is_inside(p) {
                -n
            } else {
                n
            }
        } else {
            (q - self.centroid()).try_normalize().unwrap_or(DVec2::X)
        }
    }
}

// ============================================================================
// Circle
// ============================================================================

/// 圆
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// 圆心
    pub center: DVec2,
    /// 半径
    pub radius: f64,
}

impl Circle {
    /// 点是否在圆内（含边界）
    #[inline]
    pub fn is_inside(&self, p: DVec2) -> bool {
        (p - self.center).length_squared() <= self.radius * self.radius
    }

    /// 外法向
    #[inline]
    pub fn outward_normal(&self, p: DVec2) -> DVec2 {
        (p - self.center).try_normalize().unwrap_or(DVec2::X)
    }

    /// 边界上最近点
    #[inline]
    pub fn nearest_intersect(&self, p: DVec2) -> DVec2 {
        self.center + self.outward_normal(p) * self.radius
    }

    /// 射线交点
    pub fn intersections(&self, ray: &Ray2D) -> Vec<DVec2> {
        if !ray.is_valid() {
            return Vec::new();
        }
        // |m + t d|^2 = r^2, |d| = 1
        let m = ray.origin() - self.center;
        let b = ray.dir().dot(m);
        let c = m.length_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return Vec::new();
        }
        let sq = disc.sqrt();
        let mut out = Vec::with_capacity(2);
        for t in [-b - sq, -b + sq] {
            if t >= 0.0 && out.iter().all(|&q: &DVec2| (q - ray.point_at(t)).length() > 1e-12) {
                out.push(ray.point_at(t));
            }
        }
        out
    }

    /// 包围盒
    #[inline]
    pub fn bounding_box(&self) -> (DVec2, DVec2) {
        let r = DVec2::splat(self.radius);
        (self.center - r, self.center + r)
    }
}

// ============================================================================
// BoxShape
// ============================================================================

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    /// 左下角
    pub min: DVec2,
    /// 右上角
    pub max: DVec2,
}

impl BoxShape {
    /// 点是否在矩形内（含边界）
    #[inline]
    pub fn is_inside(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// 中心
    #[inline]
    pub fn center(&self) -> DVec2 {
        0.5 * (self.min + self.max)
    }

    /// 内部点最近的面：返回 (面上投影点, 外法向)
    fn nearest_face(&self, p: DVec2) -> (DVec2, DVec2) {
        let candidates = [
            (p.x - self.min.x, DVec2::new(self.min.x, p.y), -DVec2::X),
            (self.max.x - p.x, DVec2::new(self.max.x, p.y), DVec2::X),
            (p.y - self.min.y, DVec2::new(p.x, self.min.y), -DVec2::Y),
            (self.max.y - p.y, DVec2::new(p.x, self.max.y), DVec2::Y),
        ];
        let mut best = candidates[0];
        for c in &candidates[1..] {
            if c.0 < best.0 {
                best = *c;
            }
        }
        (best.1, best.2)
    }

    /// 边界上最近点
    pub fn nearest_intersect(&self, p: DVec2) -> DVec2 {
        if self.is_inside(p) {
            self.nearest_face(p).0
        } else {
            p.clamp(self.min, self.max)
        }
    }

    /// 外法向
    pub fn outward_normal(&self, p: DVec2) -> DVec2 {
        if self.is_inside(p) {
            self.nearest_face(p).1
        } else {
            (p - p.clamp(self.min, self.max))
                .try_normalize()
                .unwrap_or(DVec2::X)
        }
    }

    /// 射线交点（平板法）
    pub fn intersections(&self, ray: &Ray2D) -> Vec<DVec2> {
        if !ray.is_valid() {
            return Vec::new();
        }
        let o = ray.origin();
        let d = ray.dir();
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for (oi, di, lo, hi) in [
            (o.x, d.x, self.min.x, self.max.x),
            (o.y, d.y, self.min.y, self.max.y),
        ] {
            if di.abs() < GEOMETRY_EPSILON {
                if oi < lo || oi > hi {
                    return Vec::new();
                }
            } else {
                let t1 = (lo - oi) / di;
                let t2 = (hi - oi) / di;
                t_min = t_min.max(t1.min(t2));
                t_max = t_max.min(t1.max(t2));
            }
        }
        if t_min > t_max {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2);
        if t_min >= 0.0 {
            out.push(ray.point_at(t_min));
        }
        if t_max >= 0.0 && (t_max - t_min).abs() > 1e-12 {
            out.push(ray.point_at(t_max));
        }
        out
    }

    /// 转换为逆时针多边形
    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_ccw(vec![
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ])
    }
}

// ============================================================================
// Shape
// ============================================================================

/// 嵌入形状
#[derive(Debug)]
pub enum Shape {
    /// 圆
    Circle(Circle),
    /// 轴对齐矩形
    Box(BoxShape),
    /// 多边形
    Polygon(Polygon),
    /// 自定义形状
    Custom(Box<dyn ShapeQuery>),
}

impl Clone for Shape {
    fn clone(&self) -> Self {
        match self {
            Self::Circle(c) => Self::Circle(*c),
            Self::Box(b) => Self::Box(*b),
            Self::Polygon(p) => Self::Polygon(p.clone()),
            Self::Custom(q) => Self::Custom(q.clone_box()),
        }
    }
}

impl Shape {
    /// 创建圆
    pub fn circle(center: DVec2, radius: f64) -> GfResult<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(GfError::degenerate(format!("圆半径必须为正, 实际 {radius}")));
        }
        Ok(Self::Circle(Circle { center, radius }))
    }

    /// 创建轴对齐矩形
    pub fn rectangle(min: DVec2, max: DVec2) -> GfResult<Self> {
        if !(max.x > min.x && max.y > min.y) {
            return Err(GfError::degenerate(format!(
                "矩形范围无效: min={min}, max={max}"
            )));
        }
        Ok(Self::Box(BoxShape { min, max }))
    }

    /// 创建多边形
    pub fn polygon(vertices: Vec<DVec2>) -> GfResult<Self> {
        Polygon::new(vertices).map(Self::Polygon)
    }

    /// 接入自定义形状
    pub fn custom(query: impl ShapeQuery + 'static) -> Self {
        Self::Custom(Box::new(query))
    }

    /// 形状类型名
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Circle(_) => "circle",
            Self::Box(_) => "box",
            Self::Polygon(_) => "polygon",
            Self::Custom(q) => q.kind_name(),
        }
    }

    /// 点是否在内部（含边界）
    pub fn is_inside(&self, p: DVec2) -> bool {
        match self {
            Self::Circle(c) => c.is_inside(p),
            Self::Box(b) => b.is_inside(p),
            Self::Polygon(poly) => poly.is_inside(p),
            Self::Custom(q) => q.is_inside(p),
        }
    }

    /// 边界上距 `p` 最近的点
    pub fn nearest_intersect(&self, p: DVec2) -> DVec2 {
        match self {
            Self::Circle(c) => c.nearest_intersect(p),
            Self::Box(b) => b.nearest_intersect(p),
            Self::Polygon(poly) => poly.nearest_intersect(p),
            Self::Custom(q) => q.nearest_intersect(p),
        }
    }

    /// 外法向（单位向量，指向形状外部）
    pub fn outward_normal(&self, p: DVec2) -> DVec2 {
        match self {
            Self::Circle(c) => c.outward_normal(p),
            Self::Box(b) => b.outward_normal(p),
            Self::Polygon(poly) => poly.nearest_edge_normal(p),
            Self::Custom(q) => q.outward_normal(p),
        }
    }

    /// 射线与边界的全部交点，按射线参数升序
    pub fn intersections(&self, ray: &Ray2D) -> Vec<DVec2> {
        match self {
            Self::Circle(c) => c.intersections(ray),
            Self::Box(b) => b.intersections(ray),
            Self::Polygon(poly) => poly.intersections(ray),
            Self::Custom(q) => q.intersections(ray),
        }
    }

    /// 射线与边界的第一个交点
    pub fn first_intersection(&self, ray: &Ray2D) -> Option<DVec2> {
        self.intersections(ray).into_iter().next()
    }

    /// 包围盒 (min, max)
    pub fn bounding_box(&self) -> (DVec2, DVec2) {
        match self {
            Self::Circle(c) => c.bounding_box(),
            Self::Box(b) => (b.min, b.max),
            Self::Polygon(poly) => poly.bounding_box(),
            Self::Custom(q) => q.bounding_box(),
        }
    }

    /// 形心
    pub fn centroid(&self) -> DVec2 {
        match self {
            Self::Circle(c) => c.center,
            Self::Box(b) => b.center(),
            Self::Polygon(poly) => poly.centroid(),
            Self::Custom(q) => q.centroid(),
        }
    }

    /// 平移
    pub fn translate(&mut self, delta: DVec2) {
        match self {
            Self::Circle(c) => c.center += delta,
            Self::Box(b) => {
                b.min += delta;
                b.max += delta;
            }
            Self::Polygon(poly) => poly.translate(delta),
            Self::Custom(q) => q.translate(delta),
        }
    }

    /// 绕 `about` 旋转
    ///
    /// 矩形旋转后不再轴对齐，转为多边形。
    pub fn rotate(&mut self, theta: f64, about: DVec2) {
        match self {
            Self::Circle(c) => c.center = rotate_about(c.center, theta, about),
            Self::Box(b) => {
                let mut poly = b.to_polygon();
                poly.rotate(theta, about);
                *self = Self::Polygon(poly);
            }
            Self::Polygon(poly) => poly.rotate(theta, about),
            Self::Custom(q) => q.rotate(theta, about),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circle(c) => write!(f, "circle(center={}, r={})", c.center, c.radius),
            Self::Box(b) => write!(f, "box(min={}, max={})", b.min, b.max),
            Self::Polygon(p) => write!(f, "polygon({} vertices)", p.vertices().len()),
            Self::Custom(q) => write!(f, "{}", q.kind_name()),
        }
    }
}
