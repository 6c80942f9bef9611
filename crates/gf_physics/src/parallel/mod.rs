// crates/gf_physics/src/parallel/mod.rs

//! 并行：通信器、光环交换与分布式稀疏求解器
//!
//! 通信器总是作为显式参数传入，不存在全局状态。

pub mod comm;
pub mod halo;
pub mod sparse_solver;

pub use comm::{Communicator, SerialComm, ThreadComm};
pub use halo::{exchange_halo, exchange_halo_vector, field_extrema};
pub use sparse_solver::{DistributedOperator, DistributedSparseSolver, Partition};
