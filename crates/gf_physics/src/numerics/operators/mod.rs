// crates/gf_physics/src/numerics/operators/mod.rs

//! 数值算子

pub mod diffusion;

pub use diffusion::laplacian;
