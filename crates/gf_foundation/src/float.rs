// crates/gf_foundation/src/float.rs

//! 数值常量与有限性检查

// ============================================================================
// 数值常量
// ============================================================================

/// 浮点数相等性比较的默认容差
pub const DEFAULT_EPSILON: f64 = 1e-14;

/// 安全除法的最小分母阈值
pub const SAFE_DIV_EPSILON: f64 = 1e-14;

/// 几何长度容差
pub const GEOMETRY_EPSILON: f64 = 1e-12;

/// 迭代求解器的默认最大迭代次数
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// 迭代求解器的默认收敛容差
pub const DEFAULT_CONVERGENCE_TOL: f64 = 1e-10;

// ============================================================================
// 辅助函数
// ============================================================================

/// 安全除法，分母过小时返回 `fallback`
#[inline]
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() < SAFE_DIV_EPSILON {
        fallback
    } else {
        num / den
    }
}

/// 统计切片中的非有限值（NaN 或 Inf）个数
#[inline]
pub fn count_non_finite(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_finite()).count()
}

/// 判断两个浮点数是否近似相等
#[inline]
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * (1.0 + a.abs().max(b.abs()))
}
