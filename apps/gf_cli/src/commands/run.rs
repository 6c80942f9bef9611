// apps/gf_cli/src/commands/run.rs

//! 求解算例命令
//!
//! 按配置构建网格和浸入边界，求解泊松问题并报告迭代次数、残差、
//! 解的极值；配置了解析解时同时报告流体单元上的最大误差。
//! `--ranks N` 以 N 个线程模拟分布式运行。

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use glam::DVec2;
use serde::Serialize;
use tracing::{info, warn};

use gf_config::{AnalyticConfig, CaseConfig};
use gf_foundation::error::{GfError, GfResult};
use gf_physics::fields::ScalarField;
use gf_physics::immersed::ImmersedBoundary;
use gf_physics::mesh::{CellSearch, GridTopology, RectilinearGrid};
use gf_physics::numerics::linear_algebra::SolverResult;
use gf_physics::parallel::{field_extrema, Communicator, SerialComm, ThreadComm};
use gf_physics::solvers::PoissonSolver;

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 进程数（线程模拟）
    #[arg(short = 'n', long, default_value = "1")]
    pub ranks: usize,

    /// JSON 摘要输出路径
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 运行摘要
#[derive(Debug, Serialize)]
struct RunSummary {
    field: String,
    ranks: usize,
    cells: usize,
    ib_cells: usize,
    solid_cells: usize,
    solver: SolverResult,
    min: f64,
    max: f64,
    max_error: Option<f64>,
    elapsed_seconds: f64,
}

/// 解析解 `ln(r / r0)`
#[derive(Debug, Clone, Copy)]
struct LogRadial {
    center: DVec2,
    r0: f64,
}

impl LogRadial {
    fn from_config(config: &AnalyticConfig) -> GfResult<Self> {
        if config.kind != "log_radial" {
            return Err(GfError::invalid_config(
                "analytic.type",
                config.kind.clone(),
                "仅支持 log_radial",
            ));
        }
        Ok(Self {
            center: DVec2::from_array(config.center),
            r0: config.r0,
        })
    }

    fn value(&self, p: DVec2) -> f64 {
        ((p - self.center).length() / self.r0).ln()
    }
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== GhostFlow 算例运行 ===");

    let config = CaseConfig::from_file(&args.config)
        .with_context(|| format!("无法读取配置文件: {}", args.config.display()))?;
    config.validate().context("配置校验失败")?;

    if args.ranks == 0 {
        bail!("进程数必须大于 0");
    }
    if args.ranks > config.grid.ny {
        warn!("进程数 {} 多于网格行数 {}，部分进程没有单元", args.ranks, config.grid.ny);
    }
    info!(
        "网格 {}x{}，浸入边界 {} 个，进程数 {}",
        config.grid.nx,
        config.grid.ny,
        config.immersed_boundaries.len(),
        args.ranks
    );

    let start = Instant::now();
    let reports = if args.ranks == 1 {
        vec![run_rank(&SerialComm, &config)]
    } else {
        ThreadComm::run(args.ranks, |comm| run_rank(&comm, &config))
    };
    let reports = reports
        .into_iter()
        .collect::<GfResult<Vec<_>>>()
        .context("求解失败")?;
    let Some(mut summary) = reports.into_iter().next() else {
        bail!("没有进程返回结果");
    };
    summary.elapsed_seconds = start.elapsed().as_secs_f64();

    info!(
        "求解状态 {:?}: 迭代 {} 次，相对残差 {:.3e}",
        summary.solver.status, summary.solver.iterations, summary.solver.relative_residual
    );
    if !summary.solver.is_converged() {
        warn!("线性求解未收敛");
    }
    info!("{} 范围: [{:.6}, {:.6}]", summary.field, summary.min, summary.max);
    if let Some(err) = summary.max_error {
        info!("相对解析解的最大误差: {:.3e}", err);
    }
    info!("耗时 {:.3} s", summary.elapsed_seconds);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&summary).context("无法序列化运行摘要")?;
        std::fs::write(path, json)
            .with_context(|| format!("无法写入摘要文件: {}", path.display()))?;
        info!("摘要已写入 {}", path.display());
    }

    Ok(())
}

/// 单个进程上的完整流程（集合操作顺序在各进程一致）
fn run_rank<C: Communicator>(comm: &C, config: &CaseConfig) -> GfResult<RunSummary> {
    let grid = RectilinearGrid::from_config(&config.grid, comm.rank(), comm.size())?;
    let search = CellSearch::new(&grid);

    let mut ib = ImmersedBoundary::from_config(&config.immersed_boundaries)?;
    ib.update_cells(&grid, &search);
    let (ib_cells, solid_cells) = ib.global_counts(comm);

    let analytic = config.analytic.as_ref().map(LogRadial::from_config).transpose()?;
    let domain_value = config.domain_value;
    let boundary = |p: DVec2| analytic.map_or(domain_value, |a| a.value(p));

    let mut field = ScalarField::new(config.field.as_str(), grid.n_cells());
    let mut solver = PoissonSolver::new(config.solver.clone());
    let result = solver.solve(comm, &grid, &ib, &mut field, boundary)?;

    let (min, max) = field_extrema(comm, &grid, &field);
    let max_error = analytic.map(|a| {
        let local = ib
            .fluid_cells(&grid)
            .iter()
            .map(|&c| (field[c] - a.value(grid.centroid(c))).abs())
            .fold(0.0, f64::max);
        comm.max(local)
    });

    Ok(RunSummary {
        field: config.field.clone(),
        ranks: comm.size(),
        cells: grid.n_cells(),
        ib_cells,
        solid_cells,
        solver: result,
        min,
        max,
        max_error,
        elapsed_seconds: 0.0,
    })
}
