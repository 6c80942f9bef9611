// crates/gf_physics/src/solvers/mod.rs

//! 求解驱动

pub mod poisson;

pub use poisson::PoissonSolver;
