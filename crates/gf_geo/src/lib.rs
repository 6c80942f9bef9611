// crates/gf_geo/src/lib.rs

//! GhostFlow 几何层
//!
//! 为浸入边界提供形状查询：点包含、最近边界点、外法向与射线求交。
//!
//! # 模块
//!
//! - [`primitives`]: 射线、线段
//! - [`polygon`]: 简单多边形
//! - [`shape`]: 带标签的形状描述 [`Shape`] 与自定义形状接口 [`ShapeQuery`]

#![warn(missing_docs)]

pub mod polygon;
pub mod primitives;
pub mod shape;

pub use polygon::Polygon;
pub use primitives::{Point2D, Ray2D, Segment2D, Vector2D};
pub use shape::{BoxShape, Circle, Shape, ShapeQuery};
