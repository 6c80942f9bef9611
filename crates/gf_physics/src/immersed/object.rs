// crates/gf_physics/src/immersed/object.rs

//! 浸入边界对象
//!
//! 一个对象持有一个形状及其运动、各场的边界类型与参考值，
//! 以及随形状移动而重算的单元分类和鬼单元模板。
//!
//! # 分类规则
//!
//! 1. 上一次分类中留下的新释放单元归还流体
//! 2. 形心在形状内部的本进程活动单元记为内部单元
//! 3. 内部单元若有任一共面或共点邻居的形心在形状外，则为界面单元，否则为固体单元
//! 4. 之前在内部、现在在外部的单元记为新释放单元，并入流体
//!
//! 分类只读取网格和形状，未移动时重复分类得到相同结果。

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec2;
use log::debug;

use gf_config::{GeometryConfig, ImmersedBoundaryConfig};
use gf_foundation::error::{GfError, GfResult};
use gf_geo::Shape;

use crate::mesh::{CellSearch, GridTopology};

use super::interpolation::InterpolationChain;
use super::motion::Motion;
use super::stencil::GhostCellStencil;
use super::types::{BoundaryType, CellStatus};

/// 压力修正场与压力场共享边界类型
const PRESSURE_ALIASES: [(&str, &str); 1] = [("p", "p_corr")];

/// 浸入边界对象
#[derive(Debug)]
pub struct ImmersedBoundaryObject {
    id: usize,
    name: String,
    shape: Shape,
    motion: Option<Motion>,
    time: f64,

    boundary_types: BTreeMap<String, BoundaryType>,
    ref_values: BTreeMap<String, f64>,
    vector_ref_values: BTreeMap<String, DVec2>,
    /// 接触角（弧度）
    contact_angle: f64,

    fluid_cells: Vec<usize>,
    ib_cells: BTreeSet<usize>,
    solid_cells: BTreeSet<usize>,
    fresh_cells: BTreeSet<usize>,

    stencils: BTreeMap<usize, GhostCellStencil>,
    shape_moved: bool,
    chain: InterpolationChain,
}

impl ImmersedBoundaryObject {
    /// 创建静止对象
    pub fn new(id: usize, name: impl Into<String>, shape: Shape) -> Self {
        Self {
            id,
            name: name.into(),
            shape,
            motion: None,
            time: 0.0,
            boundary_types: BTreeMap::new(),
            ref_values: BTreeMap::new(),
            vector_ref_values: BTreeMap::new(),
            contact_angle: std::f64::consts::FRAC_PI_2,
            fluid_cells: Vec::new(),
            ib_cells: BTreeSet::new(),
            solid_cells: BTreeSet::new(),
            fresh_cells: BTreeSet::new(),
            stencils: BTreeMap::new(),
            shape_moved: true,
            chain: InterpolationChain::default(),
        }
    }

    /// 从配置创建
    ///
    /// 几何类型未知时返回 `UnsupportedShape`，边界类型未知时返回
    /// `UnsupportedBoundaryType`。
    pub fn from_config(id: usize, config: &ImmersedBoundaryConfig) -> GfResult<Self> {
        let shape = shape_from_config(&config.geometry)?;
        let mut obj = Self::new(id, config.name.clone(), shape);

        if let Some(motion) = &config.motion {
            obj.motion = Some(Motion::from_config(motion)?);
        }

        for (field, bc) in &config.fields {
            obj.add_boundary_type(field, &bc.kind)?;
            if let Some(v) = bc.value {
                obj.set_ref_value(field, v);
            }
            if let Some([x, y]) = bc.vector_value {
                obj.set_vector_ref_value(field, DVec2::new(x, y));
            }
        }

        obj.set_contact_angle(config.contact_angle.to_radians());
        Ok(obj)
    }

    /// 设置运动
    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    /// 替换插值基链
    pub fn with_interpolation(mut self, chain: InterpolationChain) -> Self {
        self.chain = chain;
        self.shape_moved = true;
        self
    }

    // =========================================================================
    // 边界类型与参考值
    // =========================================================================

    /// 按类型字符串注册边界类型
    ///
    /// 为 `p` 注册时同时注册 `p_corr`。
    pub fn add_boundary_type(&mut self, field: &str, kind: &str) -> GfResult<()> {
        let bt = BoundaryType::parse(field, kind)?;
        self.set_boundary_type(field, bt);
        Ok(())
    }

    /// 注册边界类型
    pub fn set_boundary_type(&mut self, field: &str, bt: BoundaryType) {
        self.boundary_types.insert(field.to_string(), bt);
        for (from, to) in PRESSURE_ALIASES {
            if field == from {
                self.boundary_types.insert(to.to_string(), bt);
            }
        }
    }

    /// 场的边界类型
    pub fn boundary_type(&self, field: &str) -> Option<BoundaryType> {
        self.boundary_types.get(field).copied()
    }

    /// 设置标量参考值
    pub fn set_ref_value(&mut self, field: &str, value: f64) {
        self.ref_values.insert(field.to_string(), value);
    }

    /// 标量参考值（未设置为 0）
    pub fn ref_value(&self, field: &str) -> f64 {
        self.ref_values.get(field).copied().unwrap_or(0.0)
    }

    /// 设置矢量参考值
    pub fn set_vector_ref_value(&mut self, field: &str, value: DVec2) {
        self.vector_ref_values.insert(field.to_string(), value);
    }

    /// 矢量参考值（未设置为零向量）
    pub fn vector_ref_value(&self, field: &str) -> DVec2 {
        self.vector_ref_values
            .get(field)
            .copied()
            .unwrap_or(DVec2::ZERO)
    }

    /// 设置接触角（弧度）
    pub fn set_contact_angle(&mut self, theta: f64) {
        self.contact_angle = theta;
    }

    /// 接触角（弧度）
    #[inline]
    pub fn contact_angle(&self) -> f64 {
        self.contact_angle
    }

    // =========================================================================
    // 形状与运动
    // =========================================================================

    /// 对象编号
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// 对象名
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 形状
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// 运动
    #[inline]
    pub fn motion(&self) -> Option<&Motion> {
        self.motion.as_ref()
    }

    /// 当前时刻
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 平移形状，下次分类时重建全部模板
    pub fn translate(&mut self, delta: DVec2) {
        self.shape.translate(delta);
        self.shape_moved = true;
    }

    /// 绕形心旋转形状
    pub fn rotate(&mut self, theta: f64) {
        let c = self.shape.centroid();
        self.shape.rotate(theta, c);
        self.shape_moved = true;
    }

    /// 形状上一点的运动速度（静止为零）
    pub fn velocity_at(&self, p: DVec2) -> DVec2 {
        self.motion
            .map_or(DVec2::ZERO, |m| m.velocity(p, self.shape.centroid(), self.time))
    }

    /// 形状上一点的运动加速度（静止为零）
    pub fn acceleration_at(&self, p: DVec2) -> DVec2 {
        self.motion
            .map_or(DVec2::ZERO, |m| m.acceleration(p, self.shape.centroid(), self.time))
    }

    /// 推进 `dt`，移动形状并重新分类
    pub fn update<G>(&mut self, grid: &G, search: &CellSearch, dt: f64)
    where
        G: GridTopology + ?Sized,
    {
        let (t0, t1) = (self.time, self.time + dt);
        if let Some(motion) = self.motion {
            let delta = motion.displacement(t0, t1);
            if delta != DVec2::ZERO {
                self.translate(delta);
            }
            let theta = motion.rotation_angle(t0, t1);
            if theta != 0.0 {
                self.rotate(theta);
            }
        }
        self.time = t1;
        self.update_cells(grid, search);
    }

    // =========================================================================
    // 单元分类
    // =========================================================================

    /// 重新分类单元并更新模板
    pub fn update_cells<G>(&mut self, grid: &G, search: &CellSearch)
    where
        G: GridTopology + ?Sized,
    {
        self.fresh_cells.clear();

        let active: BTreeSet<usize> = grid.local_active_cells().iter().copied().collect();
        let inside: BTreeSet<usize> = search
            .within_shape(&self.shape)
            .into_iter()
            .filter(|c| active.contains(c))
            .collect();

        let previous: BTreeSet<usize> = self.ib_cells.union(&self.solid_cells).copied().collect();

        let shape = &self.shape;
        let outside = |n: usize| !shape.is_inside(grid.centroid(n));
        let (ib, solid): (BTreeSet<usize>, BTreeSet<usize>) = inside.iter().partition(|&&c| {
            grid.neighbours(c).iter().any(|link| outside(link.cell))
                || grid.diagonals(c).iter().any(|&d| outside(d))
        });

        self.fresh_cells = previous.difference(&inside).copied().collect();
        self.fluid_cells = active.difference(&inside).copied().collect();
        self.ib_cells = ib;
        self.solid_cells = solid;

        self.update_stencils(grid, search);

        debug!(
            "浸入边界 {}: 内部 {} 个单元 (界面 {}, 固体 {}), 新释放 {} 个",
            self.name,
            inside.len(),
            self.ib_cells.len(),
            self.solid_cells.len(),
            self.fresh_cells.len()
        );
    }

    fn update_stencils<G>(&mut self, grid: &G, search: &CellSearch)
    where
        G: GridTopology + ?Sized,
    {
        if self.shape_moved {
            self.stencils.clear();
        }
        let ib = &self.ib_cells;
        self.stencils.retain(|cell, _| ib.contains(cell));

        let (shape, chain) = (&self.shape, &self.chain);
        for &cell in ib {
            self.stencils.entry(cell).or_insert_with(|| {
                let candidate = |n: usize| !is_solid(grid, shape, n);
                GhostCellStencil::build(grid, search, shape, cell, candidate, chain)
            });
        }
        self.shape_moved = false;
    }

    // =========================================================================
    // 查询
    // =========================================================================

    /// 流体单元（本进程活动单元中不在形状内部者），升序
    #[inline]
    pub fn fluid_cells(&self) -> &[usize] {
        &self.fluid_cells
    }

    /// 界面单元
    #[inline]
    pub fn ib_cells(&self) -> &BTreeSet<usize> {
        &self.ib_cells
    }

    /// 固体单元
    #[inline]
    pub fn solid_cells(&self) -> &BTreeSet<usize> {
        &self.solid_cells
    }

    /// 本次分类中新释放的单元
    #[inline]
    pub fn fresh_cells(&self) -> &BTreeSet<usize> {
        &self.fresh_cells
    }

    /// 单元分类
    pub fn status(&self, cell: usize) -> CellStatus {
        if self.ib_cells.contains(&cell) {
            CellStatus::Ib
        } else if self.solid_cells.contains(&cell) {
            CellStatus::Solid
        } else {
            CellStatus::Fluid
        }
    }

    /// 全部模板，按锚单元升序
    pub fn stencils(&self) -> impl Iterator<Item = &GhostCellStencil> + '_ {
        self.stencils.values()
    }

    /// 单元的模板
    pub fn stencil(&self, cell: usize) -> Option<&GhostCellStencil> {
        self.stencils.get(&cell)
    }

    /// 插值基链
    #[inline]
    pub fn interpolation(&self) -> &InterpolationChain {
        &self.chain
    }
}

fn shape_from_config(geometry: &GeometryConfig) -> GfResult<Shape> {
    let vec2 = |v: Option<[f64; 2]>, key: &str| {
        v.map(DVec2::from_array)
            .ok_or_else(|| GfError::invalid_config(key, "", "缺少该字段"))
    };
    match geometry.kind.trim().to_ascii_lowercase().as_str() {
        "circle" => {
            let center = vec2(geometry.center, "geometry.center")?;
            let radius = geometry
                .radius
                .ok_or_else(|| GfError::invalid_config("geometry.radius", "", "缺少该字段"))?;
            Shape::circle(center, radius)
        }
        "box" => Shape::rectangle(
            vec2(geometry.min, "geometry.min")?,
            vec2(geometry.max, "geometry.max")?,
        ),
        "polygon" => {
            let vertices = geometry
                .vertices
                .as_ref()
                .ok_or_else(|| GfError::invalid_config("geometry.vertices", "", "缺少该字段"))?;
            Shape::polygon(vertices.iter().copied().map(DVec2::from_array).collect())
        }
        _ => Err(GfError::unsupported_shape(&geometry.kind)),
    }
}

/// 单元是否为固体：形心及全部邻居、对角邻居形心都在形状内
///
/// 只依赖几何，非本进程单元同样适用。
pub(super) fn is_solid<G>(grid: &G, shape: &Shape, cell: usize) -> bool
where
    G: GridTopology + ?Sized,
{
    let inside = |c: usize| shape.is_inside(grid.centroid(c));
    inside(cell)
        && grid.neighbours(cell).iter().all(|l| inside(l.cell))
        && grid.diagonals(cell).iter().all(|&d| inside(d))
}
