// crates/gf_physics/src/immersed/collection.rs

//! 浸入边界集合
//!
//! 管理同一网格上的多个浸入边界对象，提供逐单元分类和合并后的边界方程。

use glam::DVec2;

use gf_config::ImmersedBoundaryConfig;
use gf_foundation::error::GfResult;

use crate::equation::Equation;
use crate::fields::{ScalarField, VectorField};
use crate::mesh::{CellSearch, GridTopology, IndexSet};
use crate::parallel::Communicator;

use super::object::ImmersedBoundaryObject;
use super::types::CellStatus;

/// 浸入边界集合
#[derive(Debug, Default)]
pub struct ImmersedBoundary {
    objects: Vec<ImmersedBoundaryObject>,
}

impl ImmersedBoundary {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 从配置创建，对象编号按配置顺序
    pub fn from_config(configs: &[ImmersedBoundaryConfig]) -> GfResult<Self> {
        let objects = configs
            .iter()
            .enumerate()
            .map(|(id, cfg)| ImmersedBoundaryObject::from_config(id, cfg))
            .collect::<GfResult<Vec<_>>>()?;
        Ok(Self { objects })
    }

    /// 添加对象
    pub fn push(&mut self, obj: ImmersedBoundaryObject) {
        self.objects.push(obj);
    }

    /// 对象数
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 全部对象
    #[inline]
    pub fn objects(&self) -> &[ImmersedBoundaryObject] {
        &self.objects
    }

    /// 全部对象（可变）
    #[inline]
    pub fn objects_mut(&mut self) -> &mut [ImmersedBoundaryObject] {
        &mut self.objects
    }

    /// 按名称查找对象
    pub fn find(&self, name: &str) -> Option<&ImmersedBoundaryObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    /// 推进所有对象并重新分类
    pub fn update<G>(&mut self, grid: &G, search: &CellSearch, dt: f64)
    where
        G: GridTopology + ?Sized,
    {
        for obj in &mut self.objects {
            obj.update(grid, search, dt);
        }
    }

    /// 重新分类所有对象
    pub fn update_cells<G>(&mut self, grid: &G, search: &CellSearch)
    where
        G: GridTopology + ?Sized,
    {
        for obj in &mut self.objects {
            obj.update_cells(grid, search);
        }
    }

    /// 形状包含 `p` 的第一个对象
    pub fn ib_obj(&self, p: DVec2) -> Option<&ImmersedBoundaryObject> {
        self.objects.iter().find(|o| o.shape().is_inside(p))
    }

    /// 逐单元分类
    ///
    /// 多个对象重叠时固体优先于界面。非本进程单元为 `Fluid`。
    pub fn cell_status<G>(&self, grid: &G) -> Vec<CellStatus>
    where
        G: GridTopology + ?Sized,
    {
        let mut status = vec![CellStatus::Fluid; grid.n_cells()];
        for obj in &self.objects {
            for &c in obj.ib_cells() {
                if status[c] == CellStatus::Fluid {
                    status[c] = CellStatus::Ib;
                }
            }
            for &c in obj.solid_cells() {
                status[c] = CellStatus::Solid;
            }
        }
        status
    }

    /// 不在任何对象内部的本进程活动单元，升序
    pub fn fluid_cells<G>(&self, grid: &G) -> Vec<usize>
    where
        G: GridTopology + ?Sized,
    {
        let status = self.cell_status(grid);
        let mut cells: Vec<usize> = grid
            .local_active_cells()
            .iter()
            .copied()
            .filter(|&c| status[c] == CellStatus::Fluid)
            .collect();
        cells.sort_unstable();
        cells
    }

    /// 各对象的标量方程
    ///
    /// 每个单元只取一个对象的行：固体优先于界面，同类重叠时取靠前的对象。
    pub fn bcs<G>(&self, grid: &G, field: &ScalarField) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        self.merge(grid, &[IndexSet::Scalar], |obj| obj.bcs(grid, field))
    }

    /// 各对象的矢量方程，合并规则同 [`Self::bcs`]
    pub fn bcs_vector<G>(&self, grid: &G, field: &VectorField) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
    {
        self.merge(grid, &IndexSet::VECTOR, |obj| obj.bcs_vector(grid, field))
    }

    /// 按 [`Self::cell_status`] 为每个单元挑选负责的对象，只拷贝该对象的行
    fn merge<G, F>(&self, grid: &G, sets: &[IndexSet], mut assemble: F) -> GfResult<Equation>
    where
        G: GridTopology + ?Sized,
        F: FnMut(&ImmersedBoundaryObject) -> GfResult<Equation>,
    {
        let status = self.cell_status(grid);
        let mut owner: Vec<Option<usize>> = vec![None; grid.n_cells()];
        for (k, obj) in self.objects.iter().enumerate() {
            let solid = obj.solid_cells().iter().filter(|&&c| status[c] == CellStatus::Solid);
            let ib = obj.ib_cells().iter().filter(|&&c| status[c] == CellStatus::Ib);
            for &c in solid.chain(ib) {
                owner[c].get_or_insert(k);
            }
        }

        let mut eqn = Equation::new();
        for (k, obj) in self.objects.iter().enumerate() {
            let rows = assemble(obj)?;
            for (c, _) in owner.iter().enumerate().filter(|(_, o)| **o == Some(k)) {
                for &set in sets {
                    eqn.copy_row(&rows, grid.global_index(c, set));
                }
            }
        }
        Ok(eqn)
    }

    /// 全局 (界面单元数, 固体单元数)
    pub fn global_counts<C>(&self, comm: &C) -> (usize, usize)
    where
        C: Communicator + ?Sized,
    {
        let (ib, solid) = self.objects.iter().fold((0, 0), |(i, s), o| {
            (i + o.ib_cells().len(), s + o.solid_cells().len())
        });
        let ib = comm.sum(ib as f64).round() as usize;
        let solid = comm.sum(solid as f64).round() as usize;
        (ib, solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectilinearGrid;
    use crate::parallel::SerialComm;
    use gf_geo::Shape;

    #[test]
    fn test_two_objects() {
        let grid = RectilinearGrid::new(20, 10, 0.1, 0.1).unwrap();
        let search = CellSearch::new(&grid);
        let mut ib = ImmersedBoundary::new();
        ib.push(ImmersedBoundaryObject::new(
            0,
            "left",
            Shape::circle(DVec2::new(0.5, 0.5), 0.3).unwrap(),
        ));
        ib.push(ImmersedBoundaryObject::new(
            1,
            "right",
            Shape::rectangle(DVec2::new(1.2, 0.2), DVec2::new(1.8, 0.8)).unwrap(),
        ));
        ib.update_cells(&grid, &search);

        assert_eq!(ib.ib_obj(DVec2::new(0.5, 0.5)).unwrap().name(), "left");
        assert_eq!(ib.ib_obj(DVec2::new(1.5, 0.5)).unwrap().name(), "right");
        assert!(ib.ib_obj(DVec2::new(1.0, 0.5)).is_none());

        let status = ib.cell_status(&grid);
        let inside = status.iter().filter(|s| **s != CellStatus::Fluid).count();
        let fluid = ib.fluid_cells(&grid);
        assert_eq!(inside + fluid.len(), grid.n_cells());

        let (n_ib, n_solid) = ib.global_counts(&SerialComm);
        assert_eq!(n_ib + n_solid, inside);
    }

    fn overlapping_disks(grid: &RectilinearGrid) -> ImmersedBoundary {
        let search = CellSearch::new(grid);
        let mut ib = ImmersedBoundary::new();
        for (id, (x, value)) in [(0.4, 1.0), (0.6, 3.0)].into_iter().enumerate() {
            let mut obj = ImmersedBoundaryObject::new(
                id,
                format!("disk{id}"),
                Shape::circle(DVec2::new(x, 0.5), 0.2).unwrap(),
            );
            obj.add_boundary_type("phi", "fixed").unwrap();
            obj.set_ref_value("phi", value);
            obj.add_boundary_type("U", "fixed").unwrap();
            obj.set_vector_ref_value("U", DVec2::new(value, -value));
            ib.push(obj);
        }
        ib.update_cells(grid, &search);
        ib
    }

    #[test]
    fn test_overlap_solid_row_is_single_pin() {
        let grid = RectilinearGrid::new(20, 20, 0.05, 0.05).unwrap();
        let ib = overlapping_disks(&grid);
        let status = ib.cell_status(&grid);

        // 左圆内部的固体单元同时是右圆的界面单元
        let c = grid.cell_id(8, 8);
        assert!(ib.objects()[0].solid_cells().contains(&c));
        assert!(ib.objects()[1].ib_cells().contains(&c));
        assert_eq!(status[c], CellStatus::Solid);

        let eqn = ib.bcs(&grid, &ScalarField::new("phi", grid.n_cells())).unwrap();
        assert_eq!(eqn.row(c).unwrap().len(), 1);
        assert_eq!(eqn.coefficient(c, c), 1.0);
        assert_eq!(eqn.source(c), -1.0);

        for cell in 0..grid.n_cells() {
            let Some(row) = eqn.row(cell) else {
                assert_eq!(status[cell], CellStatus::Fluid);
                continue;
            };
            // 每行只来自一个对象：系数和为 1，源项为单个参考值
            let sum: f64 = row.values().sum();
            assert!((sum - 1.0).abs() < 1e-12, "单元 {cell}: 系数和 {sum}");
            let s = eqn.source(cell);
            assert!(s == -1.0 || s == -3.0, "单元 {cell}: 源项 {s}");
            if status[cell] == CellStatus::Solid {
                assert_eq!(row.len(), 1);
            }
        }

        let u = VectorField::new("U", grid.n_cells());
        let eqn = ib.bcs_vector(&grid, &u).unwrap();
        let (rx, ry) = (
            grid.global_index(c, IndexSet::VectorX),
            grid.global_index(c, IndexSet::VectorY),
        );
        assert_eq!(eqn.row(rx).unwrap().len(), 1);
        assert_eq!(eqn.source(rx), -1.0);
        assert_eq!(eqn.row(ry).unwrap().len(), 1);
        assert_eq!(eqn.source(ry), 1.0);
    }
}
