// crates/gf_physics/src/mesh/topology.rs

//! 网格拓扑抽象
//!
//! 浸入边界子系统只读取网格，不构建网格。本 trait 描述它需要的全部查询：
//! 单元几何、内部/对角邻居、域边界面、本进程活动单元以及全局未知量编号。

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 全局未知量编号集合
///
/// 标量场每个单元一个编号；矢量场每个单元两个编号（x、y 分量）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexSet {
    /// 标量
    Scalar,
    /// 矢量 x 分量
    VectorX,
    /// 矢量 y 分量
    VectorY,
}

impl IndexSet {
    /// 矢量分量集合
    pub const VECTOR: [IndexSet; 2] = [IndexSet::VectorX, IndexSet::VectorY];
}

/// 内部邻居链接
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteriorLink {
    /// 邻居单元
    pub cell: usize,
    /// 共享面长度
    pub face_length: f64,
}

/// 域边界面链接
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryLink {
    /// 面中心
    pub face_center: DVec2,
    /// 面长度
    pub face_length: f64,
    /// 所属边界 patch 编号
    pub patch: usize,
}

/// 网格拓扑 trait
pub trait GridTopology: Send + Sync {
    // ========== 基本信息 ==========

    /// 单元数量（含非本进程单元）
    fn n_cells(&self) -> usize;

    /// 本进程编号
    fn rank(&self) -> usize;

    /// 边界 patch 名称
    fn patches(&self) -> &[String];

    // ========== 几何数据 ==========

    /// 单元形心
    fn centroid(&self, cell: usize) -> DVec2;

    /// 单元体积（二维为面积）
    fn volume(&self, cell: usize) -> f64;

    /// 单元特征长度
    fn length_scale(&self, cell: usize) -> f64 {
        self.volume(cell).sqrt()
    }

    // ========== 拓扑数据 ==========

    /// 共面邻居
    fn neighbours(&self, cell: usize) -> &[InteriorLink];

    /// 共点（对角）邻居
    fn diagonals(&self, cell: usize) -> &[usize];

    /// 域边界面
    fn boundary_links(&self, cell: usize) -> &[BoundaryLink];

    // ========== 并行分区 ==========

    /// 本进程拥有的活动单元
    fn local_active_cells(&self) -> &[usize];

    /// 单元所属进程
    fn owner(&self, cell: usize) -> usize;

    /// 单元是否属于本进程
    fn is_local(&self, cell: usize) -> bool {
        self.owner(cell) == self.rank()
    }

    /// 本进程活动单元数
    fn n_local_cells(&self) -> usize {
        self.local_active_cells().len()
    }

    /// 全局未知量编号
    fn global_index(&self, cell: usize, set: IndexSet) -> usize;
}
