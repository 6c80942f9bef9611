// crates/gf_geo/src/primitives.rs

//! 基础几何图元：射线与线段

use glam::DVec2;
use serde::{Deserialize, Serialize};

use gf_foundation::float::GEOMETRY_EPSILON;

/// 二维点
pub type Point2D = DVec2;

/// 二维向量
pub type Vector2D = DVec2;

/// 绕 `about` 旋转 `theta` 弧度
#[inline]
pub fn rotate_about(p: DVec2, theta: f64, about: DVec2) -> DVec2 {
    about + DVec2::from_angle(theta).rotate(p - about)
}

// ============================================================================
// Ray2D
// ============================================================================

/// 二维射线 `origin + t * dir, t >= 0`
///
/// 方向在构造时归一化；零方向的射线与任何形状都不相交。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray2D {
    origin: DVec2,
    dir: DVec2,
}

impl Ray2D {
    /// 创建射线
    pub fn new(origin: DVec2, dir: DVec2) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    /// 起点
    #[inline]
    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    /// 单位方向
    #[inline]
    pub fn dir(&self) -> DVec2 {
        self.dir
    }

    /// 参数 t 处的点
    #[inline]
    pub fn point_at(&self, t: f64) -> DVec2 {
        self.origin + self.dir * t
    }

    /// 点在射线上的投影参数
    #[inline]
    pub fn project(&self, p: DVec2) -> f64 {
        (p - self.origin).dot(self.dir)
    }

    /// 方向是否有效
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.dir != DVec2::ZERO
    }
}

// ============================================================================
// Segment2D
// ============================================================================

/// 二维线段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment2D {
    /// 起点
    pub a: DVec2,
    /// 终点
    pub b: DVec2,
}

impl Segment2D {
    /// 创建线段
    #[inline]
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    /// 长度
    #[inline]
    pub fn length(&self) -> f64 {
        (self.b - self.a).length()
    }

    /// 中点
    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        0.5 * (self.a + self.b)
    }

    /// 线段上距 `p` 最近的点
    pub fn closest_point(&self, p: DVec2) -> DVec2 {
        let e = self.b - self.a;
        let len2 = e.length_squared();
        if len2 < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return self.a;
        }
        let s = ((p - self.a).dot(e) / len2).clamp(0.0, 1.0);
        self.a + e * s
    }

    /// 点到线段的距离
    #[inline]
    pub fn distance_to(&self, p: DVec2) -> f64 {
        (p - self.closest_point(p)).length()
    }

    /// 点是否在线段上（容差 `tol`）
    #[inline]
    pub fn contains_point(&self, p: DVec2, tol: f64) -> bool {
        self.distance_to(p) <= tol
    }

    /// 逆时针多边形边的外法向
    ///
    /// 逆时针顺序下内部在边的左侧，外法向为方向向量顺时针旋转 90°。
    #[inline]
    pub fn outward_normal(&self) -> DVec2 {
        let e = (self.b - self.a).normalize_or_zero();
        DVec2::new(e.y, -e.x)
    }

    /// 射线与线段的交点参数 t
    ///
    /// 平行或不相交时返回 `None`。
    pub fn intersect_ray(&self, ray: &Ray2D) -> Option<f64> {
        let d = ray.dir();
        let e = self.b - self.a;
        let denom = d.perp_dot(e);
        if denom.abs() < GEOMETRY_EPSILON {
            return None;
        }
        let w = self.a - ray.origin();
        let t = w.perp_dot(e) / denom;
        let s = w.perp_dot(d) / denom;
        let tol = 1e-12;
        if t >= -tol && (-tol..=1.0 + tol).contains(&s) {
            Some(t.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray2D::new(DVec2::ZERO, DVec2::new(3.0, 4.0));
        assert!((ray.dir().length() - 1.0).abs() < 1e-14);
        let p = ray.point_at(5.0);
        assert!((p - DVec2::new(3.0, 4.0)).length() < 1e-12);
        assert!(!Ray2D::new(DVec2::ZERO, DVec2::ZERO).is_valid());
    }

    #[test]
    fn test_segment_closest_point() {
        let seg = Segment2D::new(DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0));
        let q = seg.closest_point(DVec2::new(0.3, 2.0));
        assert!((q - DVec2::new(0.3, 0.0)).length() < 1e-14);
        let q = seg.closest_point(DVec2::new(-1.0, 1.0));
        assert!((q - DVec2::ZERO).length() < 1e-14);
        assert!(seg.contains_point(DVec2::new(0.5, 1e-13), 1e-12));
    }

    #[test]
    fn test_segment_ray_intersection() {
        let seg = Segment2D::new(DVec2::new(1.0, -1.0), DVec2::new(1.0, 1.0));
        let ray = Ray2D::new(DVec2::ZERO, DVec2::X);
        let t = seg.intersect_ray(&ray);
        assert!(matches!(t, Some(t) if (t - 1.0).abs() < 1e-12));

        // 反向射线不相交
        let ray = Ray2D::new(DVec2::ZERO, -DVec2::X);
        assert!(seg.intersect_ray(&ray).is_none());

        // 平行
        let ray = Ray2D::new(DVec2::ZERO, DVec2::Y);
        assert!(seg.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_outward_normal_ccw() {
        // 单位正方形底边 (0,0)->(1,0)，外法向朝 -y
        let seg = Segment2D::new(DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0));
        let n = seg.outward_normal();
        assert!((n - DVec2::new(0.0, -1.0)).length() < 1e-14);
    }

    #[test]
    fn test_rotate_about() {
        let p = rotate_about(DVec2::new(2.0, 1.0), std::f64::consts::FRAC_PI_2, DVec2::new(1.0, 1.0));
        assert!((p - DVec2::new(1.0, 2.0)).length() < 1e-12);
    }
}
