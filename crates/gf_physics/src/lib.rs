// crates/gf_physics/src/lib.rs

//! GhostFlow 物理层
//!
//! 嵌入边界（鬼单元）子系统，包括：
//! - 网格接口与矩形网格实现 (mesh)
//! - 场存储 (fields)
//! - 稀疏方程 (equation)
//! - 浸入边界分类、鬼单元模板与边界方程组装 (immersed)
//! - 稀疏线性代数与扩散算子 (numerics)
//! - 通信器、光环交换与分布式求解器 (parallel)
//! - 泊松求解驱动 (solvers)
//!
//! # 典型流程
//!
//! ```text
//! ImmersedBoundary::update_cells  分类并构建模板
//! ImmersedBoundary::bcs           生成界面/固体行
//! DistributedSparseSolver         set_rank → set_equation → solve → map_solution
//! exchange_halo                   同步非本进程单元
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod equation;
pub mod fields;
pub mod immersed;
pub mod mesh;
pub mod numerics;
pub mod parallel;
pub mod solvers;

pub use equation::Equation;
pub use fields::{ScalarField, VectorField};
pub use immersed::{
    BoundaryType, CellStatus, GhostCellStencil, ImmersedBoundary, ImmersedBoundaryObject, Motion,
};
pub use mesh::{CellSearch, GridTopology, IndexSet, RectilinearGrid};
pub use parallel::{
    Communicator, DistributedSparseSolver, Partition, SerialComm, ThreadComm,
};
pub use solvers::PoissonSolver;

/// 常用导入
pub mod prelude {
    pub use crate::equation::Equation;
    pub use crate::fields::{ScalarField, VectorField};
    pub use crate::immersed::{
        BoundaryType, CellStatus, GhostCellStencil, ImmersedBoundary, ImmersedBoundaryObject,
        Motion,
    };
    pub use crate::mesh::{CellSearch, GridTopology, IndexSet, RectilinearGrid};
    pub use crate::numerics::linear_algebra::{SolverResult, SolverStatus};
    pub use crate::parallel::{
        exchange_halo, exchange_halo_vector, field_extrema, Communicator,
        DistributedSparseSolver, Partition, SerialComm, ThreadComm,
    };
    pub use crate::solvers::PoissonSolver;
    pub use gf_foundation::error::{ErrorKind, GfError, GfResult};
}
