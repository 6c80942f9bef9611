// crates/gf_physics/src/immersed/types.rs

//! 浸入边界类型定义
//!
//! - [`BoundaryType`]: 浸入边界上每个场的边界条件类型
//! - [`CellStatus`]: 单元相对浸入形状的分类

use serde::{Deserialize, Serialize};

use gf_foundation::error::{GfError, GfResult};

// ============================================================
// 边界类型枚举
// ============================================================

/// 浸入边界条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BoundaryType {
    /// 给定值（Dirichlet）
    Fixed = 0,

    /// 给定法向梯度（Neumann）
    NormalGradient = 1,

    /// 部分滑移
    ///
    /// 目前不生成浸入边界行，见 [`crate::immersed::ImmersedBoundaryObject::assemble`]。
    PartialSlip = 2,

    /// 给定接触角，仅用于界面场
    ContactAngle = 3,
}

impl BoundaryType {
    /// 解析类型字符串（不区分大小写）
    ///
    /// 未识别的字符串返回 `UnsupportedBoundaryType`，错误中带有字段名。
    pub fn parse(field: &str, s: &str) -> GfResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "normal_gradient" => Ok(Self::NormalGradient),
            "partial_slip" => Ok(Self::PartialSlip),
            "contact_angle" => Ok(Self::ContactAngle),
            _ => Err(GfError::unsupported_boundary_type(field, s)),
        }
    }

    /// 类型字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::NormalGradient => "normal_gradient",
            Self::PartialSlip => "partial_slip",
            Self::ContactAngle => "contact_angle",
        }
    }
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// 单元分类
// ============================================================

/// 单元分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellStatus {
    /// 流体单元
    #[default]
    Fluid = 0,
    /// 界面单元（形状内部且至少有一个邻居在外部）
    Ib = 1,
    /// 固体单元
    Solid = 2,
}

impl CellStatus {
    /// 转换为 u8 值
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 单字符表示，用于终端输出
    pub fn symbol(self) -> char {
        match self {
            Self::Fluid => '.',
            Self::Ib => 'o',
            Self::Solid => '#',
        }
    }
}
