// crates/gf_foundation/src/lib.rs

//! GhostFlow Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型和数值工具。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型与错误类别
//! - [`float`]: 数值常量和有限性检查

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod float;

// 重导出常用类型
pub use error::{ErrorKind, GfError, GfResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{ErrorKind, GfError, GfResult};
    pub use crate::float::{approx_eq, count_non_finite, safe_div};
}
