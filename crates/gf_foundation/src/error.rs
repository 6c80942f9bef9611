// crates/gf_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `GfError` 枚举和 `GfResult` 类型别名。所有错误均为致命错误，
//! 由调用方通过 `?` 向上传播，本层不做本地恢复。
//!
//! 求解器不收敛 **不是** 错误，而是以残差和迭代次数的形式报告，
//! 见 `gf_physics::numerics::linear_algebra::SolverResult`。
//!
//! # 示例
//!
//! ```
//! use gf_foundation::error::{ErrorKind, GfError, GfResult};
//!
//! fn parse_type(s: &str) -> GfResult<()> {
//!     Err(GfError::unsupported_boundary_type("gamma", s))
//! }
//!
//! let err = parse_type("bogus").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type GfResult<T> = Result<T, GfError>;

/// 错误类别
///
/// 用于调用方区分配置问题与数值发散。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 配置错误（不支持的边界类型、未识别的形状等）
    Configuration,
    /// 数值错误（求解结果含 NaN/Inf）
    Numerical,
    /// 几何误用（例如少于 3 个顶点的多边形）
    Geometry,
    /// 内部错误（尺寸不匹配、索引越界、IO）
    Internal,
}

/// GhostFlow 错误类型
#[derive(Error, Debug)]
pub enum GfError {
    // ========================================================================
    // 配置错误
    // ========================================================================

    /// 字段的边界类型不受支持
    #[error("不支持的边界类型: 字段 '{field}' 的类型 '{kind}'")]
    UnsupportedBoundaryType {
        /// 出错的字段名
        field: String,
        /// 出错的类型名
        kind: String,
    },

    /// 未识别的形状类型
    #[error("未识别的形状类型: '{kind}'")]
    UnsupportedShape {
        /// 形状类型名
        kind: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 无效原因
        reason: String,
    },

    /// 一般配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 数值错误
    // ========================================================================

    /// 求解后的场含有非有限值
    #[error("数值错误: 场 '{field}' 含有 {count} 个 NaN/Inf 值")]
    NonFinite {
        /// 场名
        field: String,
        /// 非有限值个数
        count: usize,
    },

    // ========================================================================
    // 几何错误
    // ========================================================================

    /// 退化几何
    #[error("退化几何: {message}")]
    DegenerateGeometry {
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 内部错误
    // ========================================================================

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数组名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类型
        index_type: &'static str,
        /// 索引值
        index: usize,
        /// 容器长度
        len: usize,
    },

    /// 无效网格
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 错误信息
        message: String,
    },

    /// IO 错误
    #[error("IO错误: {path}: {source}")]
    Io {
        /// 相关路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 错误信息
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl GfError {
    /// 不支持的边界类型
    pub fn unsupported_boundary_type(field: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedBoundaryType {
            field: field.into(),
            kind: kind.into(),
        }
    }

    /// 未识别的形状
    pub fn unsupported_shape(kind: impl Into<String>) -> Self {
        Self::UnsupportedShape { kind: kind.into() }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 非有限值
    pub fn non_finite(field: impl Into<String>, count: usize) -> Self {
        Self::NonFinite {
            field: field.into(),
            count,
        }
    }

    /// 退化几何
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedBoundaryType { .. }
            | Self::UnsupportedShape { .. }
            | Self::InvalidConfig { .. }
            | Self::Config { .. } => ErrorKind::Configuration,
            Self::NonFinite { .. } => ErrorKind::Numerical,
            Self::DegenerateGeometry { .. } => ErrorKind::Geometry,
            Self::SizeMismatch { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::InvalidMesh { .. }
            | Self::Io { .. }
            | Self::Serialization { .. } => ErrorKind::Internal,
        }
    }

    /// 是否为配置错误
    pub fn is_config_error(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// 是否为数值错误
    pub fn is_numerical_error(&self) -> bool {
        self.kind() == ErrorKind::Numerical
    }

    /// 是否致命
    ///
    /// 本层所有错误都终止运行；可恢复的求解统计量不经过此类型。
    pub fn is_fatal(&self) -> bool {
        true
    }
}
