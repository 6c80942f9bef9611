// crates/gf_physics/src/mesh/rectilinear.rs

//! 均匀矩形网格
//!
//! 单元按行主序编号 `id = j * nx + i`。并行时按行条带划分给各进程，
//! 每个进程持有全部几何，只有自己条带内的单元是活动单元。
//!
//! 全局未知量编号：
//!
//! - 标量：条带在行主序下连续，编号等于单元 id
//! - 矢量：每个进程两段连续编号，先全部 x 分量，再全部 y 分量

use std::ops::Range;

use glam::DVec2;

use gf_config::GridConfig;
use gf_foundation::error::{GfError, GfResult};

use super::topology::{BoundaryLink, GridTopology, IndexSet, InteriorLink};

/// 边界 patch 编号
pub mod patch {
    /// x = x_min
    pub const WEST: usize = 0;
    /// x = x_max
    pub const EAST: usize = 1;
    /// y = y_min
    pub const SOUTH: usize = 2;
    /// y = y_max
    pub const NORTH: usize = 3;
}

/// 均匀矩形网格
#[derive(Debug, Clone)]
pub struct RectilinearGrid {
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    rank: usize,
    /// 各进程拥有的行范围
    row_ranges: Vec<Range<usize>>,
    patches: Vec<String>,
    neighbours: Vec<Vec<InteriorLink>>,
    diagonals: Vec<Vec<usize>>,
    boundary: Vec<Vec<BoundaryLink>>,
    owners: Vec<usize>,
    local_cells: Vec<usize>,
}

impl RectilinearGrid {
    /// 创建单进程网格，原点在 (0, 0)
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64) -> GfResult<Self> {
        Self::partitioned(nx, ny, dx, dy, 0, 1)
    }

    /// 从配置创建
    pub fn from_config(config: &GridConfig, rank: usize, n_ranks: usize) -> GfResult<Self> {
        Self::partitioned(config.nx, config.ny, config.dx, config.dy, rank, n_ranks)
    }

    /// 创建按行条带划分的网格
    ///
    /// 进程数多于行数时，多余进程拥有空条带。
    pub fn partitioned(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        rank: usize,
        n_ranks: usize,
    ) -> GfResult<Self> {
        if nx == 0 || ny == 0 {
            return Err(GfError::invalid_mesh(format!("网格尺寸无效: {nx}x{ny}")));
        }
        if !(dx > 0.0 && dy > 0.0) {
            return Err(GfError::invalid_mesh(format!("单元尺寸无效: dx={dx}, dy={dy}")));
        }
        if n_ranks == 0 || rank >= n_ranks {
            return Err(GfError::invalid_mesh(format!(
                "进程编号无效: rank={rank}, n_ranks={n_ranks}"
            )));
        }

        let row_ranges = decompose_rows(ny, n_ranks);
        let n = nx * ny;
        let mut owners = vec![0; n];
        for (r, rows) in row_ranges.iter().enumerate() {
            for cell in rows.start * nx..rows.end * nx {
                owners[cell] = r;
            }
        }

        let id = |i: usize, j: usize| j * nx + i;
        let mut neighbours = Vec::with_capacity(n);
        let mut diagonals = Vec::with_capacity(n);
        let mut boundary = Vec::with_capacity(n);

        for j in 0..ny {
            for i in 0..nx {
                let c = DVec2::new((i as f64 + 0.5) * dx, (j as f64 + 0.5) * dy);
                let mut nb = Vec::with_capacity(4);
                let mut bl = Vec::new();

                if i > 0 {
                    nb.push(InteriorLink { cell: id(i - 1, j), face_length: dy });
                } else {
                    bl.push(BoundaryLink {
                        face_center: c - DVec2::new(0.5 * dx, 0.0),
                        face_length: dy,
                        patch: patch::WEST,
                    });
                }
                if i + 1 < nx {
                    nb.push(InteriorLink { cell: id(i + 1, j), face_length: dy });
                } else {
                    bl.push(BoundaryLink {
                        face_center: c + DVec2::new(0.5 * dx, 0.0),
                        face_length: dy,
                        patch: patch::EAST,
                    });
                }
                if j > 0 {
                    nb.push(InteriorLink { cell: id(i, j - 1), face_length: dx });
                } else {
                    bl.push(BoundaryLink {
                        face_center: c - DVec2::new(0.0, 0.5 * dy),
                        face_length: dx,
                        patch: patch::SOUTH,
                    });
                }
                if j + 1 < ny {
                    nb.push(InteriorLink { cell: id(i, j + 1), face_length: dx });
                } else {
                    bl.push(BoundaryLink {
                        face_center: c + DVec2::new(0.0, 0.5 * dy),
                        face_length: dx,
                        patch: patch::NORTH,
                    });
                }

                let mut diag = Vec::with_capacity(4);
                for (di, dj) in [(-1i64, -1i64), (1, -1), (-1, 1), (1, 1)] {
                    let (ii, jj) = (i as i64 + di, j as i64 + dj);
                    if ii >= 0 && jj >= 0 && (ii as usize) < nx && (jj as usize) < ny {
                        diag.push(id(ii as usize, jj as usize));
                    }
                }

                neighbours.push(nb);
                diagonals.push(diag);
                boundary.push(bl);
            }
        }

        let local_cells: Vec<usize> =
            (row_ranges[rank].start * nx..row_ranges[rank].end * nx).collect();

        Ok(Self {
            nx,
            ny,
            dx,
            dy,
            rank,
            row_ranges,
            patches: ["x0", "x1", "y0", "y1"].iter().map(|s| s.to_string()).collect(),
            neighbours,
            diagonals,
            boundary,
            owners,
            local_cells,
        })
    }

    /// x 方向单元数
    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// y 方向单元数
    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// 单元尺寸 (dx, dy)
    #[inline]
    pub fn spacing(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// 进程数
    #[inline]
    pub fn n_ranks(&self) -> usize {
        self.row_ranges.len()
    }

    /// 行列号转单元 id
    #[inline]
    pub fn cell_id(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// 单元 id 转行列号
    #[inline]
    pub fn ij(&self, cell: usize) -> (usize, usize) {
        (cell % self.nx, cell / self.nx)
    }

    /// 进程 `r` 拥有的单元数
    #[inline]
    fn owned_count(&self, r: usize) -> usize {
        self.row_ranges[r].len() * self.nx
    }
}

/// 把 `ny` 行尽量均匀地分给 `n` 个进程
fn decompose_rows(ny: usize, n: usize) -> Vec<Range<usize>> {
    let base = ny / n;
    let rem = ny % n;
    let mut start = 0;
    (0..n)
        .map(|r| {
            let len = base + usize::from(r < rem);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

impl GridTopology for RectilinearGrid {
    fn n_cells(&self) -> usize {
        self.nx * self.ny
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn patches(&self) -> &[String] {
        &self.patches
    }

    fn centroid(&self, cell: usize) -> DVec2 {
        let (i, j) = self.ij(cell);
        DVec2::new((i as f64 + 0.5) * self.dx, (j as f64 + 0.5) * self.dy)
    }

    fn volume(&self, _cell: usize) -> f64 {
        self.dx * self.dy
    }

    fn neighbours(&self, cell: usize) -> &[InteriorLink] {
        &self.neighbours[cell]
    }

    fn diagonals(&self, cell: usize) -> &[usize] {
        &self.diagonals[cell]
    }

    fn boundary_links(&self, cell: usize) -> &[BoundaryLink] {
        &self.boundary[cell]
    }

    fn local_active_cells(&self) -> &[usize] {
        &self.local_cells
    }

    fn owner(&self, cell: usize) -> usize {
        self.owners[cell]
    }

    fn global_index(&self, cell: usize, set: IndexSet) -> usize {
        match set {
            IndexSet::Scalar => cell,
            IndexSet::VectorX | IndexSet::VectorY => {
                let r = self.owners[cell];
                let first = self.row_ranges[r].start * self.nx;
                let offset = 2 * first + (cell - first);
                if set == IndexSet::VectorX {
                    offset
                } else {
                    offset + self.owned_count(r)
                }
            }
        }
    }
}
