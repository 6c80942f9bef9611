// crates/gf_physics/src/numerics/linear_algebra/mod.rs

//! 稀疏线性代数
//!
//! - [`csr`]: CSR 矩阵与构建器
//! - [`preconditioner`]: Identity / Jacobi / ILU(0) 预条件子
//! - [`solver`]: BiCGStab 迭代求解器与 [`LinearOperator`] 抽象
//! - [`vector_ops`]: 本地向量运算

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern, RowView};
pub use preconditioner::{
    build_preconditioner, IdentityPreconditioner, Ilu0Preconditioner, JacobiPreconditioner,
    Preconditioner,
};
pub use solver::{BiCgStabSolver, LinearOperator, SolverConfig, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, norm2, norm_inf, sub};
