// crates/gf_physics/src/immersed/assembly.rs

//! 浸入边界方程组装
//!
//! 把鬼单元模板写成 [`Equation`] 行：界面单元一行模板系数，固体单元一行单位钉扎。
//! 行号与列号都取网格的全局未知量编号。
//!
//! | 边界类型 | 界面单元行 | 源项 |
//! |---------|-----------|------|
//! | `Fixed` | Dirichlet 系数 | `-ref` |
//! | `NormalGradient` | Neumann 系数 | `-ref` |
//! | `PartialSlip` | 不生成 | - |
//! | `ContactAngle` | 只能经 [`ImmersedBoundaryObject::contact_line_bcs`] | - |

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;
use log::debug;

use gf_foundation::error::{GfError, GfResult};
use gf_geo::Ray2D;

use crate::equation::Equation;
use crate::fields::{ScalarField, VectorField};
use crate::mesh::{CellSearch, GridTopology, IndexSet};

use super::object::{is_solid, ImmersedBoundaryObject};
use super::stencil::GhostCellStencil;
use super::types::BoundaryType;

/// 未注册边界类型时错误中的类型名
const UNSET: &str = "<unset>";

type CoeffFn = fn(&GhostCellStencil) -> &[f64];

impl ImmersedBoundaryObject {
    // =========================================================================
    // 通用场
    // =========================================================================

    /// 组装标量场的浸入边界方程
    ///
    /// `ContactAngle` 在生成任何行之前返回 `UnsupportedBoundaryType`。
    pub fn assemble<G>(
        &self,
        grid: &G,
        field: &str,
        bt: BoundaryType,
        ref_value: f64,
    ) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        self.assemble_sets(grid, field, bt, &[(IndexSet::Scalar, ref_value)])
    }

    /// 组装矢量场的浸入边界方程，两个分量共用系数
    pub fn assemble_vector<G>(
        &self,
        grid: &G,
        field: &str,
        bt: BoundaryType,
        ref_value: DVec2,
    ) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        self.assemble_sets(
            grid,
            field,
            bt,
            &[(IndexSet::VectorX, ref_value.x), (IndexSet::VectorY, ref_value.y)],
        )
    }

    /// 按场上注册的边界类型和参考值组装
    pub fn bcs<G>(&self, grid: &G, field: &ScalarField) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        let name = field.name();
        let bt = self.registered_type(name)?;
        self.assemble(grid, name, bt, self.ref_value(name))
    }

    /// 矢量场版本的 [`Self::bcs`]
    pub fn bcs_vector<G>(&self, grid: &G, field: &VectorField) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        let name = field.name();
        let bt = self.registered_type(name)?;
        self.assemble_vector(grid, name, bt, self.vector_ref_value(name))
    }

    fn registered_type(&self, field: &str) -> GfResult<BoundaryType> {
        self.boundary_type(field)
            .ok_or_else(|| GfError::unsupported_boundary_type(field, UNSET))
    }

    fn assemble_sets<G>(
        &self,
        grid: &G,
        field: &str,
        bt: BoundaryType,
        sets: &[(IndexSet, f64)],
    ) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        let coeffs: Option<CoeffFn> = match bt {
            BoundaryType::Fixed => Some(GhostCellStencil::dirichlet_coeffs),
            BoundaryType::NormalGradient => Some(GhostCellStencil::neumann_coeffs),
            BoundaryType::PartialSlip => {
                debug!("场 {field} 在浸入边界 {} 上为部分滑移，不生成界面行", self.name());
                None
            }
            BoundaryType::ContactAngle => {
                return Err(GfError::unsupported_boundary_type(field, bt.as_str()));
            }
        };

        let mut eqn = Equation::new();
        if let Some(coeffs) = coeffs {
            for st in self.stencils() {
                for &(set, value) in sets {
                    add_stencil_row(&mut eqn, grid, st, coeffs(st), set, -value);
                }
            }
        }
        for &(set, value) in sets {
            self.pin_solid(&mut eqn, grid, set, |_| -value);
        }
        Ok(eqn)
    }

    fn pin_solid<G, F>(&self, eqn: &mut Equation, grid: &G, set: IndexSet, source: F)
    where
        G: GridTopology + ?Sized,
        F: Fn(usize) -> f64,
    {
        for &cell in self.solid_cells() {
            eqn.pin(grid.global_index(cell, set), source(cell));
        }
    }

    // =========================================================================
    // 专用条件
    // =========================================================================

    /// 速度场的固体速度条件
    ///
    /// `Fixed` 使界面单元满足 `u(bp) = V(bp)`，其中 `V` 为形状运动速度；
    /// 固体单元钉扎为 `V(形心)`。`PartialSlip` 只钉扎固体单元。
    pub fn solid_velocity<G>(&self, grid: &G, u: &VectorField) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        let name = u.name();
        let bt = self.registered_type(name)?;
        let mut eqn = Equation::new();
        match bt {
            BoundaryType::Fixed => {
                for st in self.stencils() {
                    let v = self.velocity_at(st.boundary_point());
                    let [set_x, set_y] = IndexSet::VECTOR;
                    add_stencil_row(&mut eqn, grid, st, st.dirichlet_coeffs(), set_x, -v.x);
                    add_stencil_row(&mut eqn, grid, st, st.dirichlet_coeffs(), set_y, -v.y);
                }
            }
            BoundaryType::PartialSlip => {
                debug!("场 {name} 在浸入边界 {} 上为部分滑移，不生成界面行", self.name());
            }
            other => return Err(GfError::unsupported_boundary_type(name, other.as_str())),
        }
        self.pin_solid(&mut eqn, grid, IndexSet::VectorX, |c| {
            -self.velocity_at(grid.centroid(c)).x
        });
        self.pin_solid(&mut eqn, grid, IndexSet::VectorY, |c| {
            -self.velocity_at(grid.centroid(c)).y
        });
        Ok(eqn)
    }

    /// 压力条件
    ///
    /// 界面单元为 Neumann 行。形状运动时 `∂p/∂n = -ρ a·n̂`，
    /// 即源项为 `ρ a(bp)·n̂(bp)`。固体单元钉扎为 0。
    pub fn pressure_bcs<G>(&self, grid: &G, rho: f64, p: &ScalarField) -> Equation
    where
        G: GridTopology + ?Sized,
    {
        let mut eqn = Equation::new();
        for st in self.stencils() {
            let bp = st.boundary_point();
            let source = match self.motion() {
                Some(_) => rho * self.acceleration_at(bp).dot(self.shape().outward_normal(bp)),
                None => 0.0,
            };
            add_stencil_row(&mut eqn, grid, st, st.neumann_coeffs(), IndexSet::Scalar, source);
        }
        self.pin_solid(&mut eqn, grid, IndexSet::Scalar, |_| 0.0);
        debug!("浸入边界 {} 组装压力条件 {}: {} 行", self.name(), p.name(), eqn.n_rows());
        eqn
    }

    /// 界面场 `gamma` 的接触线条件
    ///
    /// 对每个界面单元，将壁面外法向旋转 ±(π/2 − θ) 得到两条射线，
    /// 沿各射线与边界的交点构建单侧模板，比较两者镜像点插值值：
    /// θ < π/2 取较大者，否则取较小者，再写入其 Neumann 行。
    /// 任一射线没有交点时退回该单元的普通模板。
    pub fn contact_line_bcs<G>(
        &self,
        grid: &G,
        search: &CellSearch,
        gamma: &ScalarField,
        theta: f64,
    ) -> Equation
    where
        G: GridTopology + ?Sized,
    {
        let shape = self.shape();
        let tilt = FRAC_PI_2 - theta;
        let mut eqn = Equation::new();
        let mut fallbacks = 0usize;

        for st in self.stencils() {
            let cell = st.cell();
            let origin = grid.centroid(cell);
            let wall_normal = shape.outward_normal(st.boundary_point());

            let one_sided = |angle: f64| {
                let dir = DVec2::from_angle(angle).rotate(wall_normal);
                shape.first_intersection(&Ray2D::new(origin, dir)).map(|bp| {
                    GhostCellStencil::towards(
                        grid,
                        search,
                        shape,
                        cell,
                        bp,
                        |n| !is_solid(grid, shape, n),
                        self.interpolation(),
                    )
                })
            };

            let chosen = match (one_sided(tilt), one_sided(-tilt)) {
                (Some(a), Some(b)) => {
                    let (va, vb) = (a.image_value(gamma), b.image_value(gamma));
                    if prefers_first(theta, va, vb) { a } else { b }
                }
                _ => {
                    fallbacks += 1;
                    st.clone()
                }
            };
            add_stencil_row(&mut eqn, grid, &chosen, chosen.neumann_coeffs(), IndexSet::Scalar, 0.0);
        }

        self.pin_solid(&mut eqn, grid, IndexSet::Scalar, |_| 0.0);
        if fallbacks > 0 {
            debug!(
                "浸入边界 {} 接触线: {} 个单元射线无交点，使用普通模板",
                self.name(),
                fallbacks
            );
        }
        eqn
    }
}

/// θ < π/2 时第一条射线的镜像值严格更大才选它，否则要求严格更小；相等时取第二条
fn prefers_first(theta: f64, va: f64, vb: f64) -> bool {
    if theta < FRAC_PI_2 {
        va > vb
    } else {
        va < vb
    }
}

fn add_stencil_row<G>(
    eqn: &mut Equation,
    grid: &G,
    st: &GhostCellStencil,
    coeffs: &[f64],
    set: IndexSet,
    source: f64,
) where
    G: GridTopology + ?Sized,
{
    let row = grid.global_index(st.cell(), set);
    for (&c, &a) in st.cells().iter().zip(coeffs) {
        eqn.add(row, grid.global_index(c, set), a);
    }
    eqn.add_source(row, source);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectilinearGrid;
    use gf_geo::Shape;

    fn setup() -> (RectilinearGrid, ImmersedBoundaryObject) {
        let grid = RectilinearGrid::new(10, 10, 0.1, 0.1).unwrap();
        let search = CellSearch::new(&grid);
        let shape = Shape::circle(DVec2::new(0.5, 0.5), 0.3).unwrap();
        let mut obj = ImmersedBoundaryObject::new(0, "cylinder", shape);
        obj.update_cells(&grid, &search);
        (grid, obj)
    }

    #[test]
    fn test_fixed_rows() {
        let (grid, obj) = setup();
        let eqn = obj.assemble(&grid, "phi", BoundaryType::Fixed, 2.0).unwrap();
        assert_eq!(eqn.n_rows(), 32);
        for &c in obj.ib_cells() {
            // 常数场 2 代入后残量为 0
            assert!(eqn.row_residual(c, |_| 2.0).abs() < 1e-12);
        }
        for &c in obj.solid_cells() {
            assert_eq!(eqn.coefficient(c, c), 1.0);
            assert_eq!(eqn.source(c), -2.0);
        }
    }

    #[test]
    fn test_contact_angle_rejected() {
        let (grid, obj) = setup();
        let err = obj
            .assemble(&grid, "gamma", BoundaryType::ContactAngle, 0.0)
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_unset_field() {
        let (grid, obj) = setup();
        let field = ScalarField::new("T", grid.n_cells());
        match obj.bcs(&grid, &field).unwrap_err() {
            GfError::UnsupportedBoundaryType { field, kind } => {
                assert_eq!(field, "T");
                assert_eq!(kind, UNSET);
            }
            other => panic!("意外的错误: {other}"),
        }
    }

    #[test]
    fn test_vector_rows_use_both_index_sets() {
        let (grid, obj) = setup();
        let eqn = obj
            .assemble_vector(&grid, "u", BoundaryType::Fixed, DVec2::new(1.0, -1.0))
            .unwrap();
        assert_eq!(eqn.n_rows(), 64);
        let c = *obj.solid_cells().iter().next().unwrap();
        let ry = grid.global_index(c, IndexSet::VectorY);
        assert_eq!(eqn.source(ry), 1.0);
    }

    #[test]
    fn test_contact_line_tie_takes_second_ray() {
        assert!(prefers_first(0.5, 2.0, 1.0));
        assert!(!prefers_first(0.5, 1.0, 1.0));
        assert!(prefers_first(2.0, 1.0, 2.0));
        assert!(!prefers_first(2.0, 1.0, 1.0));

        // 零场下两侧镜像值相同，每行都应来自 -(π/2 − θ) 方向的模板
        let grid = RectilinearGrid::new(20, 20, 0.05, 0.05).unwrap();
        let search = CellSearch::new(&grid);
        let shape = Shape::circle(DVec2::new(0.5, 0.5), 0.27).unwrap();
        let mut obj = ImmersedBoundaryObject::new(0, "drop", shape);
        obj.update_cells(&grid, &search);

        let theta = 60f64.to_radians();
        let gamma = ScalarField::new("gamma", grid.n_cells());
        let eqn = obj.contact_line_bcs(&grid, &search, &gamma, theta);

        let shape = obj.shape();
        let mut checked = 0;
        for st in obj.stencils() {
            let cell = st.cell();
            let normal = shape.outward_normal(st.boundary_point());
            let ray = |angle: f64| {
                let dir = DVec2::from_angle(angle).rotate(normal);
                shape.first_intersection(&Ray2D::new(grid.centroid(cell), dir))
            };
            let tilt = FRAC_PI_2 - theta;
            let (Some(_), Some(bp)) = (ray(tilt), ray(-tilt)) else {
                continue;
            };
            let second = GhostCellStencil::towards(
                &grid,
                &search,
                shape,
                cell,
                bp,
                |n| !is_solid(&grid, shape, n),
                obj.interpolation(),
            );
            let mut expected = Equation::new();
            add_stencil_row(
                &mut expected,
                &grid,
                &second,
                second.neumann_coeffs(),
                IndexSet::Scalar,
                0.0,
            );
            assert_eq!(eqn.row(cell), expected.row(cell), "单元 {cell}");
            checked += 1;
        }
        assert!(checked > 0);
    }
}
