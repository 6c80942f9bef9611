// crates/gf_config/src/lib.rs

//! GhostFlow 配置层
//!
//! 纯数据配置类型（全 f64），通过 serde 从 JSON 读取。
//! 字符串形式的形状、运动与边界类型在物理层解析。

#![warn(missing_docs)]

pub mod case_config;
pub mod error;

pub use case_config::{
    AnalyticConfig, CaseConfig, FieldBoundaryConfig, GeometryConfig, GridConfig,
    ImmersedBoundaryConfig, MotionConfig, PreconditionerKind, SparseSolverSettings,
};
pub use error::ConfigError;
