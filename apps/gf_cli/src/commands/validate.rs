// apps/gf_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 检查算例文件能否解析、数值是否合法、浸入边界的几何与边界类型能否构建，
//! 并在单进程上试做一次分类。

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use tracing::{error, info, warn};

use gf_config::{CaseConfig, PreconditionerKind};
use gf_physics::immersed::ImmersedBoundaryObject;
use gf_physics::mesh::{CellSearch, RectilinearGrid};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== GhostFlow 配置验证 ===");

    let mut result = ValidationResult::default();
    if let Some(config) = load_config(&args.config, &mut result) {
        validate_case(&config, &mut result);
    }
    print_validation_result(&result, args.strict)
}

fn load_config(path: &Path, result: &mut ValidationResult) -> Option<CaseConfig> {
    println!("\n检查配置文件: {}", path.display());

    if !path.exists() {
        result.add_error(format!("配置文件不存在: {}", path.display()));
        return None;
    }

    match CaseConfig::from_file(path) {
        Ok(config) => {
            println!("  ✓ JSON 格式有效");
            Some(config)
        }
        Err(e) => {
            result.add_error(e.to_string());
            None
        }
    }
}

fn validate_case(config: &CaseConfig, result: &mut ValidationResult) {
    if let Err(e) = config.validate() {
        result.add_error(e.to_string());
        return;
    }

    let solver = &config.solver;
    if solver.drop_tolerance > 0.0 && solver.preconditioner != PreconditionerKind::Ilu0 {
        result.add_warning("drop_tolerance 只对 ILU(0) 预条件子生效");
    }
    if solver.tolerance > 1e-4 {
        result.add_warning(format!("收敛容差 {} 较大，可能影响精度", solver.tolerance));
    }
    if config.immersed_boundaries.is_empty() {
        result.add_warning("没有浸入边界对象");
    }

    let grid = &config.grid;
    let extent = [grid.nx as f64 * grid.dx, grid.ny as f64 * grid.dy];
    let mut objects = Vec::new();
    for (id, ib) in config.immersed_boundaries.iter().enumerate() {
        match ImmersedBoundaryObject::from_config(id, ib) {
            Ok(obj) => objects.push(obj),
            Err(e) => result.add_error(format!("浸入边界 '{}': {}", ib.name, e)),
        }
    }

    let mesh = match RectilinearGrid::from_config(grid, 0, 1) {
        Ok(mesh) => mesh,
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };
    let search = CellSearch::new(&mesh);

    for obj in &mut objects {
        let (lo, hi) = obj.shape().bounding_box();
        if lo.x < 0.0 || lo.y < 0.0 || hi.x > extent[0] || hi.y > extent[1] {
            result.add_warning(format!("浸入边界 '{}' 超出计算域", obj.name()));
        }

        obj.update_cells(&mesh, &search);
        if obj.ib_cells().is_empty() {
            result.add_warning(format!("浸入边界 '{}' 没有覆盖任何单元中心", obj.name()));
        }
        if obj.boundary_type(&config.field).is_none() {
            result.add_error(format!(
                "浸入边界 '{}' 未给场 '{}' 指定边界类型",
                obj.name(),
                config.field
            ));
        }
        println!(
            "  ✓ {} [{}]: 界面 {} 个单元, 固体 {} 个单元",
            obj.name(),
            obj.shape().kind_name(),
            obj.ib_cells().len(),
            obj.solid_cells().len()
        );
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    if result.is_ok(strict) {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
