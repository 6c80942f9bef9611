// crates/gf_physics/src/fields.rs

//! 单元中心场
//!
//! 场按单元 id 存储（含非本进程单元的 halo 值）。浸入边界对象从不持有场，
//! 只在每次调用时借用。

use std::ops::{Index, IndexMut};

use glam::DVec2;

use gf_foundation::float::count_non_finite;

use crate::mesh::GridTopology;

/// 标量场
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    name: String,
    values: Vec<f64>,
}

impl ScalarField {
    /// 创建全零场
    pub fn new(name: impl Into<String>, n_cells: usize) -> Self {
        Self::uniform(name, n_cells, 0.0)
    }

    /// 创建常值场
    pub fn uniform(name: impl Into<String>, n_cells: usize, value: f64) -> Self {
        Self {
            name: name.into(),
            values: vec![value; n_cells],
        }
    }

    /// 按形心函数初始化
    pub fn from_fn<G, F>(name: impl Into<String>, grid: &G, f: F) -> Self
    where
        G: GridTopology + ?Sized,
        F: Fn(DVec2) -> f64,
    {
        Self {
            name: name.into(),
            values: (0..grid.n_cells()).map(|c| f(grid.centroid(c))).collect(),
        }
    }

    /// 场名
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 全部值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 全部值（可变）
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// 非有限值个数
    pub fn count_non_finite(&self) -> usize {
        count_non_finite(&self.values)
    }
}

impl Index<usize> for ScalarField {
    type Output = f64;

    #[inline]
    fn index(&self, cell: usize) -> &f64 {
        &self.values[cell]
    }
}

impl IndexMut<usize> for ScalarField {
    #[inline]
    fn index_mut(&mut self, cell: usize) -> &mut f64 {
        &mut self.values[cell]
    }
}

/// 二维矢量场
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    name: String,
    values: Vec<DVec2>,
}

impl VectorField {
    /// 创建全零场
    pub fn new(name: impl Into<String>, n_cells: usize) -> Self {
        Self {
            name: name.into(),
            values: vec![DVec2::ZERO; n_cells],
        }
    }

    /// 按形心函数初始化
    pub fn from_fn<G, F>(name: impl Into<String>, grid: &G, f: F) -> Self
    where
        G: GridTopology + ?Sized,
        F: Fn(DVec2) -> DVec2,
    {
        Self {
            name: name.into(),
            values: (0..grid.n_cells()).map(|c| f(grid.centroid(c))).collect(),
        }
    }

    /// 场名
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 全部值
    #[inline]
    pub fn values(&self) -> &[DVec2] {
        &self.values
    }

    /// 全部值（可变）
    #[inline]
    pub fn values_mut(&mut self) -> &mut [DVec2] {
        &mut self.values
    }

    /// 非有限值个数（按分量计）
    pub fn count_non_finite(&self) -> usize {
        self.values
            .iter()
            .map(|v| usize::from(!v.x.is_finite()) + usize::from(!v.y.is_finite()))
            .sum()
    }
}

impl Index<usize> for VectorField {
    type Output = DVec2;

    #[inline]
    fn index(&self, cell: usize) -> &DVec2 {
        &self.values[cell]
    }
}

impl IndexMut<usize> for VectorField {
    #[inline]
    fn index_mut(&mut self, cell: usize) -> &mut DVec2 {
        &mut self.values[cell]
    }
}
