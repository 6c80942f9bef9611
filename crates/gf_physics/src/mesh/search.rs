// crates/gf_physics/src/mesh/search.rs

//! 单元形心空间索引
//!
//! 基于 R-Tree 的单元检索，用于：
//!
//! - 查找形状内部的单元（按形状类型选择最快的查询）
//! - 为鬼单元模板的镜像点查找最近的 k 个单元

use glam::DVec2;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use gf_geo::Shape;

use super::topology::GridTopology;

/// R-Tree 中的单元形心
#[derive(Debug, Clone, Copy)]
struct CellPoint {
    cell: usize,
    point: [f64; 2],
}

impl RTreeObject for CellPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for CellPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// 单元形心空间索引
#[derive(Debug)]
pub struct CellSearch {
    tree: RTree<CellPoint>,
    positions: Vec<DVec2>,
}

impl CellSearch {
    /// 从网格的全部单元构建
    pub fn new<G: GridTopology + ?Sized>(grid: &G) -> Self {
        let positions: Vec<DVec2> = (0..grid.n_cells()).map(|c| grid.centroid(c)).collect();
        let points = positions
            .iter()
            .enumerate()
            .map(|(cell, c)| CellPoint {
                cell,
                point: [c.x, c.y],
            })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
            positions,
        }
    }

    /// 索引中的单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// 形心在圆内（含边界）的单元
    pub fn within_radius(&self, center: DVec2, radius: f64) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .tree
            .locate_within_distance([center.x, center.y], radius * radius)
            .map(|p| p.cell)
            .collect();
        out.sort_unstable();
        out
    }

    /// 形心在矩形内（含边界）的单元
    pub fn within_box(&self, min: DVec2, max: DVec2) -> Vec<usize> {
        let envelope = AABB::from_corners([min.x, min.y], [max.x, max.y]);
        let mut out: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|p| p.cell)
            .collect();
        out.sort_unstable();
        out
    }

    /// 形心在形状内的单元，升序
    ///
    /// 圆和矩形用专用查询；其余形状先按包围盒粗筛。
    /// 候选单元最终都用 `Shape::is_inside` 确认，保证与逐点判断一致。
    pub fn within_shape(&self, shape: &Shape) -> Vec<usize> {
        let candidates = match shape {
            Shape::Circle(c) => self.within_radius(c.center, c.radius),
            Shape::Box(b) => self.within_box(b.min, b.max),
            _ => {
                let (min, max) = shape.bounding_box();
                self.within_box(min, max)
            }
        };
        candidates
            .into_iter()
            .filter(|&cell| shape.is_inside(self.positions[cell]))
            .collect()
    }

    /// 距 `p` 最近、满足 `filter` 的 k 个单元，按距离升序
    pub fn nearest<F>(&self, p: DVec2, k: usize, filter: F) -> Vec<usize>
    where
        F: Fn(usize) -> bool,
    {
        self.tree
            .nearest_neighbor_iter(&[p.x, p.y])
            .filter(|cp| filter(cp.cell))
            .take(k)
            .map(|cp| cp.cell)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectilinearGrid;

    fn grid_10x10() -> RectilinearGrid {
        RectilinearGrid::new(10, 10, 0.1, 0.1).unwrap()
    }

    #[test]
    fn test_within_radius() {
        let grid = grid_10x10();
        let search = CellSearch::new(&grid);
        assert_eq!(search.len(), 100);
        let cells = search.within_radius(DVec2::new(0.5, 0.5), 0.3);
        assert_eq!(cells.len(), 32);
        for &c in &cells {
            assert!((grid.centroid(c) - DVec2::splat(0.5)).length() <= 0.3);
        }
    }

    #[test]
    fn test_within_shape_dispatch_agrees() {
        let grid = grid_10x10();
        let search = CellSearch::new(&grid);
        let circle = Shape::circle(DVec2::new(0.5, 0.5), 0.3).unwrap();
        let rect = Shape::rectangle(DVec2::new(0.2, 0.2), DVec2::new(0.6, 0.4)).unwrap();
        let poly = Shape::polygon(vec![
            DVec2::new(0.2, 0.2),
            DVec2::new(0.6, 0.2),
            DVec2::new(0.6, 0.4),
            DVec2::new(0.2, 0.4),
        ])
        .unwrap();

        for shape in [&circle, &rect, &poly] {
            let brute: Vec<usize> = (0..grid.n_cells())
                .filter(|&c| shape.is_inside(grid.centroid(c)))
                .collect();
            assert_eq!(search.within_shape(shape), brute, "{}", shape);
        }
        assert_eq!(search.within_shape(&rect), search.within_shape(&poly));
    }

    #[test]
    fn test_nearest_with_filter() {
        let grid = grid_10x10();
        let search = CellSearch::new(&grid);
        let p = DVec2::new(0.1, 0.1);
        let near = search.nearest(p, 4, |_| true);
        let mut sorted = near.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 10, 11]);

        let near = search.nearest(p, 4, |c| c != 0);
        assert_eq!(near.len(), 4);
        assert!(!near.contains(&0));
    }
}
