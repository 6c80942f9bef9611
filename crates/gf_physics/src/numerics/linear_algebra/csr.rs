// crates/gf_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! 分布式求解时每个进程持有 `n_local × n_global` 的矩形矩阵：
//! 行为本进程未知量，列为全局编号。预条件子只作用在对角块上，
//! 由 [`CsrMatrix::diagonal_block`] 提取。
//!
//! # 格式说明
//!
//! CSR 使用三个数组存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的索引
//! - `col_idx`: 列索引，每行内升序
//! - `values`: 非零元值
//!
//! # 使用示例
//!
//! ```
//! use gf_physics::numerics::linear_algebra::CsrBuilder;
//!
//! let mut builder = CsrBuilder::new_square(3);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, -1.0);
//! builder.set(1, 0, -1.0);
//! builder.set(1, 1, 4.0);
//! builder.set(1, 2, -1.0);
//! builder.set(2, 1, -1.0);
//! builder.set(2, 2, 4.0);
//!
//! let matrix = builder.build();
//! let x = vec![1.0, 2.0, 3.0];
//! let mut y = vec![0.0; 3];
//! matrix.mul_vec(&x, &mut y);
//! assert_eq!(y, vec![2.0, 4.0, 10.0]);
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

// =============================================================================
// 稀疏模式
// =============================================================================

/// CSR 矩阵的稀疏模式
#[derive(Debug, Clone, PartialEq)]
pub struct CsrPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 第 row 行的非零元列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 (row, col) 对应的值索引
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        self.row_indices(row)
            .binary_search(&col)
            .ok()
            .map(|local| start + local)
    }
}

// =============================================================================
// CSR 矩阵主体
// =============================================================================

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pattern: CsrPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 从原始 CSR 数据创建矩阵
    ///
    /// 调用方保证 `row_ptr` 长度为 `n_rows + 1`，末元素等于 `col_idx.len()`，
    /// 每行列索引升序且小于 `n_cols`。
    pub fn from_raw(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), n_rows + 1, "row_ptr 长度必须为 n_rows + 1");
        debug_assert_eq!(col_idx.len(), values.len(), "col_idx 和 values 长度必须相等");
        debug_assert_eq!(row_ptr[n_rows], col_idx.len(), "row_ptr 末尾必须等于 nnz");

        Self {
            pattern: CsrPattern {
                n_rows,
                n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }

    /// 单位矩阵
    pub fn identity(n: usize) -> Self {
        let mut builder = CsrBuilder::new_square(n);
        for i in 0..n {
            builder.set(i, i, 1.0);
        }
        builder.build()
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows()
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols()
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 值切片
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 行指针
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.pattern.row_ptr
    }

    /// 列索引
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.pattern.col_idx
    }

    /// (row, col) 的值，不存在时为 0
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern
            .find_index(row, col)
            .map_or(0.0, |idx| self.values[idx])
    }

    /// 第 row 行的非零元视图
    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        RowView {
            col_idx: &self.pattern.col_idx[start..end],
            values: &self.values[start..end],
        }
    }

    /// 第 row 行的对角元
    #[inline]
    pub fn diagonal_value(&self, row: usize) -> Option<f64> {
        self.pattern.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 矩阵-向量乘法 y = A * x
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    /// - `y.len() != self.n_rows()`
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        for (row, out) in y.iter_mut().enumerate() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.pattern.col_idx[idx]];
            }
            *out = sum;
        }
    }

    /// 提取对角块
    ///
    /// 本进程的行对应全局编号 `cols.start..cols.end`。返回方阵只保留该范围内的列，
    /// 列号平移为局部编号。缺失的对角元补 0，保证每行都有对角位置。
    pub fn diagonal_block(&self, cols: Range<usize>) -> CsrMatrix {
        let n = self.n_rows();
        debug_assert_eq!(cols.len(), n, "对角块必须为方阵");

        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);

        for row in 0..n {
            let mut has_diag = false;
            for (col, val) in self.row(row).iter() {
                if !cols.contains(&col) {
                    continue;
                }
                let local = col - cols.start;
                if !has_diag && local > row {
                    col_idx.push(row);
                    values.push(0.0);
                    has_diag = true;
                }
                has_diag |= local == row;
                col_idx.push(local);
                values.push(val);
            }
            if !has_diag {
                col_idx.push(row);
                values.push(0.0);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix::from_raw(n, n, row_ptr, col_idx, values)
    }

    /// 无穷范数（最大行绝对值和）
    pub fn infinity_norm(&self) -> f64 {
        (0..self.n_rows())
            .map(|r| self.row(r).values().iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

// =============================================================================
// 行视图
// =============================================================================

/// 行视图：矩阵某一行非零元的只读访问
pub struct RowView<'a> {
    col_idx: &'a [usize],
    values: &'a [f64],
}

impl<'a> RowView<'a> {
    /// 列索引切片
    #[inline]
    pub fn col_indices(&self) -> &'a [usize] {
        self.col_idx
    }

    /// 值切片
    #[inline]
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 迭代 (列索引, 值)
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.col_idx.iter().copied().zip(self.values.iter().copied())
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 使用 BTreeMap 临时存储，构建时转换为紧凑 CSR 格式。
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 构建器，允许 0 行（进程未分到未知量）
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// - `row >= n_rows`
    /// - `col >= n_cols`
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// - `row >= n_rows`
    /// - `col >= n_cols`
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 当前 (row, col) 的值
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row].get(&col).copied().unwrap_or(0.0)
    }

    /// 第 row 行是否没有任何元素
    #[inline]
    pub fn is_row_empty(&self, row: usize) -> bool {
        self.rows[row].is_empty()
    }

    /// 当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix {
        let nnz = self.nnz();
        let n_rows = self.rows.len();
        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptr.push(0);

        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix::from_raw(n_rows, self.n_cols, row_ptr, col_idx, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matrix() {
        let m = CsrMatrix::identity(3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get(1, 1), 1.0);
        assert_eq!(m.get(0, 1), 0.0);
    }

    #[test]
    fn test_builder_accumulates() {
        let mut b = CsrBuilder::new(2, 4);
        b.add(0, 3, 1.0);
        b.add(0, 3, 2.0);
        b.set(1, 0, -1.0);
        assert!(!b.is_row_empty(0));
        let m = b.build();
        assert_eq!(m.get(0, 3), 3.0);
        assert_eq!(m.row(1).iter().collect::<Vec<_>>(), vec![(0, -1.0)]);
        assert_eq!(m.infinity_norm(), 3.0);
    }

    #[test]
    fn test_rectangular_mul() {
        // 本进程持有全局第 2、3 行
        let mut b = CsrBuilder::new(2, 5);
        b.set(0, 1, -1.0);
        b.set(0, 2, 2.0);
        b.set(0, 3, -1.0);
        b.set(1, 3, 2.0);
        b.set(1, 4, -1.0);
        let m = b.build();
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut y = vec![0.0; 2];
        m.mul_vec(&x, &mut y);
        assert_eq!(y, vec![0.0, 3.0]);
    }

    #[test]
    fn test_diagonal_block() {
        let mut b = CsrBuilder::new(2, 5);
        b.set(0, 1, -1.0);
        b.set(0, 2, 2.0);
        b.set(0, 3, -1.0);
        // 第二行缺少对角元
        b.set(1, 4, -1.0);
        b.set(1, 2, 0.5);
        let block = b.build().diagonal_block(2..4);
        assert_eq!(block.n_rows(), 2);
        assert_eq!(block.n_cols(), 2);
        assert_eq!(block.get(0, 0), 2.0);
        assert_eq!(block.get(0, 1), -1.0);
        assert_eq!(block.get(1, 0), 0.5);
        assert_eq!(block.diagonal_value(1), Some(0.0));
    }
}
