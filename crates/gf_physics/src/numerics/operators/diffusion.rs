// crates/gf_physics/src/numerics/operators/diffusion.rs

//! 隐式扩散算子
//!
//! 组装正定形式的有限体积算子 −∇·(γ∇u)：
//!
//! ```text
//! Σ_f γ L_f (u_P − u_N) / d_PN  +  Σ_b γ L_b (u_P − g_b) / d_Pb  =  0
//! ```
//!
//! 内部面使用两形心距离，域边界面使用形心到面中心距离并施加 Dirichlet 值 `g`。
//! 结果写入 [`Equation`]，浸入边界行由调用方另行覆盖。

use glam::DVec2;

use crate::equation::Equation;
use crate::mesh::{GridTopology, IndexSet};

/// 组装 `cells` 各行的扩散算子
///
/// `boundary_value` 给出域边界面中心处的 Dirichlet 值。
pub fn laplacian<G, F>(grid: &G, cells: &[usize], gamma: f64, boundary_value: F) -> Equation
where
    G: GridTopology + ?Sized,
    F: Fn(DVec2) -> f64,
{
    let mut eqn = Equation::new();
    for &cell in cells {
        let row = grid.global_index(cell, IndexSet::Scalar);
        let cp = grid.centroid(cell);

        for link in grid.neighbours(cell) {
            let d = (grid.centroid(link.cell) - cp).length();
            let coef = gamma * link.face_length / d;
            eqn.add(row, row, coef);
            eqn.add(row, grid.global_index(link.cell, IndexSet::Scalar), -coef);
        }

        for link in grid.boundary_links(cell) {
            let d = (link.face_center - cp).length();
            let coef = gamma * link.face_length / d;
            eqn.add(row, row, coef);
            eqn.add_source(row, -coef * boundary_value(link.face_center));
        }
    }
    eqn
}
