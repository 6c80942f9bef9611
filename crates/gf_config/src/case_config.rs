// crates/gf_config/src/case_config.rs

//! CaseConfig - 算例配置
//!
//! 描述一个嵌入边界算例：网格、稀疏求解器参数以及各浸入边界对象。
//! 形状、运动和边界类型以字符串给出，由物理层在构建对象时解析，
//! 未识别的类型在那里报告为配置错误。
//!
//! # JSON 示例
//!
//! ```json
//! {
//!   "grid": { "nx": 40, "ny": 40, "dx": 0.025, "dy": 0.025 },
//!   "solver": { "tolerance": 1e-10, "preconditioner": "ilu0" },
//!   "immersed_boundaries": [
//!     {
//!       "name": "cylinder",
//!       "geometry": { "type": "circle", "center": [0.5, 0.5], "radius": 0.2 },
//!       "fields": { "phi": { "type": "fixed", "value": 0.0 } }
//!     }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 算例配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    /// 网格配置
    #[serde(default)]
    pub grid: GridConfig,

    /// 稀疏求解器配置
    #[serde(default)]
    pub solver: SparseSolverSettings,

    /// 求解的标量场名
    #[serde(default = "default_field")]
    pub field: String,

    /// 外边界 Dirichlet 值（无解析解时使用）
    #[serde(default)]
    pub domain_value: f64,

    /// 解析解（用于外边界条件和误差评估）
    #[serde(default)]
    pub analytic: Option<AnalyticConfig>,

    /// 浸入边界对象
    #[serde(default)]
    pub immersed_boundaries: Vec<ImmersedBoundaryConfig>,
}

fn default_field() -> String {
    "phi".to_string()
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            solver: SparseSolverSettings::default(),
            field: default_field(),
            domain_value: 0.0,
            analytic: None,
            immersed_boundaries: Vec::new(),
        }
    }
}

impl CaseConfig {
    /// 从 JSON 字符串加载
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.solver.validate()?;

        let mut names = HashSet::new();
        for ib in &self.immersed_boundaries {
            if ib.name.trim().is_empty() {
                return Err(ConfigError::invalid("immersed_boundaries.name", "", "名称不能为空"));
            }
            if !names.insert(ib.name.as_str()) {
                return Err(ConfigError::invalid(
                    "immersed_boundaries.name",
                    &ib.name,
                    "名称重复",
                ));
            }
            if !(ib.contact_angle > 0.0 && ib.contact_angle < 180.0) {
                return Err(ConfigError::invalid(
                    format!("{}.contact_angle", ib.name),
                    ib.contact_angle,
                    "接触角必须在 (0, 180) 度之间",
                ));
            }
        }

        if let Some(analytic) = &self.analytic {
            if !(analytic.r0 > 0.0) {
                return Err(ConfigError::invalid("analytic.r0", analytic.r0, "必须为正"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// 网格
// ============================================================================

/// 均匀矩形网格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// x 方向单元数
    #[serde(default = "default_n")]
    pub nx: usize,
    /// y 方向单元数
    #[serde(default = "default_n")]
    pub ny: usize,
    /// x 方向单元尺寸
    #[serde(default = "default_h")]
    pub dx: f64,
    /// y 方向单元尺寸
    #[serde(default = "default_h")]
    pub dy: f64,
}

fn default_n() -> usize {
    20
}
fn default_h() -> f64 {
    0.05
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            nx: default_n(),
            ny: default_n(),
            dx: default_h(),
            dy: default_h(),
        }
    }
}

impl GridConfig {
    /// 验证
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx == 0 || self.ny == 0 {
            return Err(ConfigError::invalid(
                "grid",
                format!("{}x{}", self.nx, self.ny),
                "单元数必须为正",
            ));
        }
        if !(self.dx > 0.0) || !(self.dy > 0.0) {
            return Err(ConfigError::invalid(
                "grid",
                format!("dx={}, dy={}", self.dx, self.dy),
                "单元尺寸必须为正",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// 稀疏求解器
// ============================================================================

/// 预条件子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreconditionerKind {
    /// 局部块 ILU(0)
    #[default]
    Ilu0,
    /// Jacobi（对角）
    Jacobi,
    /// 不使用预条件
    None,
}

/// 分布式稀疏求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseSolverSettings {
    /// 相对收敛容差
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// 最大迭代次数
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// 预条件子类型（构造时选定）
    #[serde(default)]
    pub preconditioner: PreconditionerKind,

    /// 预条件子复用次数，每隔这么多次求解重建一次
    #[serde(default = "default_max_precon_uses")]
    pub max_precon_uses: usize,

    /// ILU 丢弃容差
    #[serde(default)]
    pub drop_tolerance: f64,

    /// 逐次迭代输出残差
    #[serde(default)]
    pub verbose: bool,
}

fn default_tolerance() -> f64 {
    1e-10
}
fn default_max_iterations() -> usize {
    500
}
fn default_max_precon_uses() -> usize {
    1
}

impl Default for SparseSolverSettings {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            preconditioner: PreconditionerKind::default(),
            max_precon_uses: default_max_precon_uses(),
            drop_tolerance: 0.0,
            verbose: false,
        }
    }
}

impl SparseSolverSettings {
    /// 设置最大迭代次数
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// 设置收敛容差
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 设置预条件子
    pub fn with_preconditioner(mut self, kind: PreconditionerKind) -> Self {
        self.preconditioner = kind;
        self
    }

    /// 设置预条件子复用次数
    pub fn with_max_precon_uses(mut self, uses: usize) -> Self {
        self.max_precon_uses = uses;
        self
    }

    /// 设置 ILU 丢弃容差
    pub fn with_drop_tolerance(mut self, drop_tolerance: f64) -> Self {
        self.drop_tolerance = drop_tolerance;
        self
    }

    /// 验证
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance > 0.0) {
            return Err(ConfigError::invalid("solver.tolerance", self.tolerance, "必须为正"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid("solver.max_iterations", 0, "必须为正"));
        }
        if self.max_precon_uses == 0 {
            return Err(ConfigError::invalid("solver.max_precon_uses", 0, "至少为 1"));
        }
        if !(self.drop_tolerance >= 0.0) {
            return Err(ConfigError::invalid(
                "solver.drop_tolerance",
                self.drop_tolerance,
                "不能为负",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// 浸入边界
// ============================================================================

/// 浸入边界对象配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmersedBoundaryConfig {
    /// 对象名
    pub name: String,

    /// 几何
    pub geometry: GeometryConfig,

    /// 运动（可选）
    #[serde(default)]
    pub motion: Option<MotionConfig>,

    /// 各场的边界条件
    #[serde(default)]
    pub fields: BTreeMap<String, FieldBoundaryConfig>,

    /// 接触角 [度]
    #[serde(default = "default_contact_angle")]
    pub contact_angle: f64,
}

fn default_contact_angle() -> f64 {
    90.0
}

/// 几何配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// 形状类型: circle / box / polygon
    #[serde(rename = "type")]
    pub kind: String,
    /// 圆心
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    /// 半径
    #[serde(default)]
    pub radius: Option<f64>,
    /// 矩形左下角
    #[serde(default)]
    pub min: Option<[f64; 2]>,
    /// 矩形右上角
    #[serde(default)]
    pub max: Option<[f64; 2]>,
    /// 多边形顶点
    #[serde(default)]
    pub vertices: Option<Vec<[f64; 2]>>,
}

/// 运动配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotionConfig {
    /// 运动类型: translation / oscillation / rotation
    #[serde(rename = "type")]
    pub kind: String,
    /// 初始速度
    #[serde(default)]
    pub velocity: Option<[f64; 2]>,
    /// 加速度
    #[serde(default)]
    pub acceleration: Option<[f64; 2]>,
    /// 振幅
    #[serde(default)]
    pub amplitude: Option<[f64; 2]>,
    /// 角频率
    #[serde(default)]
    pub omega: Option<f64>,
}

/// 单个场的边界条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldBoundaryConfig {
    /// 边界类型: fixed / normal_gradient / partial_slip / contact_angle
    #[serde(rename = "type")]
    pub kind: String,
    /// 标量参考值
    #[serde(default)]
    pub value: Option<f64>,
    /// 矢量参考值
    #[serde(default)]
    pub vector_value: Option<[f64; 2]>,
}

/// 解析解配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticConfig {
    /// 解析解类型，目前支持 log_radial: phi = ln(r / r0)
    #[serde(rename = "type")]
    pub kind: String,
    /// 中心
    pub center: [f64; 2],
    /// 参考半径
    pub r0: f64,
}
