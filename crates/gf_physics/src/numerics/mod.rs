// crates/gf_physics/src/numerics/mod.rs

//! 数值方法模块
//!
//! 包含：
//! - linear_algebra/ - 稀疏线性代数 (CSR, BiCGStab, 预条件子)
//! - operators/ - 数值算子 (隐式扩散)

pub mod linear_algebra;
pub mod operators;

pub use linear_algebra::{
    BiCgStabSolver, CsrBuilder, CsrMatrix, LinearOperator, Preconditioner, SolverConfig,
    SolverResult, SolverStatus,
};
pub use operators::laplacian;
