// crates/gf_physics/src/immersed/mod.rs

//! 浸入边界（鬼单元法）
//!
//! 形状不与网格贴合。每个对象把单元分为流体、界面、固体三类，
//! 为界面单元构建鬼单元模板，再把边界条件写成方程行交给分布式求解器。
//!
//! # 模块
//!
//! - [`types`]: 边界类型与单元分类
//! - [`motion`]: 刚体运动
//! - [`interpolation`]: 镜像点插值基链
//! - [`stencil`]: 鬼单元模板
//! - [`object`]: 单个浸入边界对象（分类与模板）
//! - `assembly`: 对象上的方程组装方法
//! - [`collection`]: 对象集合

mod assembly;
pub mod collection;
pub mod interpolation;
pub mod motion;
pub mod object;
pub mod stencil;
pub mod types;

pub use collection::ImmersedBoundary;
pub use interpolation::{
    Bilinear, InterpolationBasis, InterpolationChain, InverseDistance, LinearLeastSquares,
};
pub use motion::Motion;
pub use object::ImmersedBoundaryObject;
pub use stencil::GhostCellStencil;
pub use types::{BoundaryType, CellStatus};
