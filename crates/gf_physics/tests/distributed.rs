// crates/gf_physics/tests/distributed.rs

//! 分布式求解器集成测试
//!
//! 以线程通信组模拟多进程，检查分区、求解一致性、矢量写回、
//! 预条件子复用和非有限解的处理。

use glam::DVec2;

use gf_config::{PreconditionerKind, SparseSolverSettings};
use gf_foundation::{ErrorKind, GfError};
use gf_physics::equation::Equation;
use gf_physics::fields::{ScalarField, VectorField};
use gf_physics::immersed::ImmersedBoundary;
use gf_physics::mesh::{GridTopology, IndexSet, RectilinearGrid};
use gf_physics::numerics::laplacian;
use gf_physics::parallel::{
    Communicator, DistributedSparseSolver, Partition, SerialComm, ThreadComm,
};
use gf_physics::solvers::PoissonSolver;

fn settings(kind: PreconditionerKind) -> SparseSolverSettings {
    SparseSolverSettings {
        tolerance: 1e-12,
        max_iterations: 1000,
        preconditioner: kind,
        ..Default::default()
    }
}

#[test]
fn test_partition_covers_range() {
    let counts = [5, 0, 3, 7, 1];
    let total: usize = counts.iter().sum();
    let mut covered = vec![0u8; total];
    for rank in 0..counts.len() {
        let p = Partition::from_sizes(&counts, rank);
        assert_eq!(p.len(), counts[rank]);
        for i in p.range() {
            covered[i] += 1;
        }
    }
    assert!(covered.iter().all(|&n| n == 1));

    let parts = ThreadComm::run(4, |comm| {
        let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
        solver.set_rank(&comm, 2 * comm.rank() + 1);
        (solver.partition(), solver.i_lower(), solver.i_upper())
    });
    let ranges: Vec<_> = parts.iter().map(|(p, _, _)| p.range()).collect();
    assert_eq!(ranges, vec![0..1, 1..4, 4..9, 9..16]);
    assert_eq!(parts[2].1, Some(4));
    assert_eq!(parts[2].2, Some(8));
}

/// 带 Dirichlet 边界的网格拉普拉斯方程，源项非零
fn poisson_system(grid: &RectilinearGrid) -> Equation {
    let cells = grid.local_active_cells().to_vec();
    let mut eqn = laplacian(grid, &cells, 1.0, |p| p.x - p.y);
    for &c in &cells {
        eqn.add_source(grid.global_index(c, IndexSet::Scalar), grid.volume(c));
    }
    eqn
}

fn solve_scalar<C: Communicator>(comm: &C, kind: PreconditionerKind) -> ScalarField {
    let grid = RectilinearGrid::partitioned(8, 9, 0.125, 0.1, comm.rank(), comm.size()).unwrap();
    let mut solver = DistributedSparseSolver::new(settings(kind));
    solver.set_rank(comm, grid.n_local_cells());
    solver.set_equation(&poisson_system(&grid)).unwrap();
    let residual = solver.solve(comm);
    assert!(residual < 1e-12);
    solver.print_status(comm, "poisson");

    let mut field = ScalarField::new("T", grid.n_cells());
    solver.map_solution(comm, &grid, &mut field).unwrap();
    gf_physics::parallel::exchange_halo(comm, &grid, &mut field);
    field
}

#[test]
fn test_ranks_reproduce_serial_solution() {
    for kind in [PreconditionerKind::Ilu0, PreconditionerKind::Jacobi, PreconditionerKind::None] {
        let serial = solve_scalar(&SerialComm, kind);
        for n_ranks in [2, 3] {
            for field in ThreadComm::run(n_ranks, |comm| solve_scalar(&comm, kind)) {
                for (a, b) in field.values().iter().zip(serial.values()) {
                    assert!((a - b).abs() < 1e-8, "{kind:?} x{n_ranks}: {a} vs {b}");
                }
            }
        }
    }
}

#[test]
fn test_rank_without_rows() {
    // 4 行分给 5 个进程，最后一个进程没有单元
    let fields = ThreadComm::run(5, |comm| {
        let grid = RectilinearGrid::partitioned(3, 4, 1.0, 1.0, comm.rank(), 5).unwrap();
        let mut solver = DistributedSparseSolver::new(settings(PreconditionerKind::Ilu0));
        solver.set_rank(&comm, grid.n_local_cells());
        if comm.rank() == 4 {
            assert_eq!(solver.i_lower(), None);
            assert_eq!(solver.i_upper(), None);
        }
        solver.set_equation(&poisson_system(&grid)).unwrap();
        solver.solve(&comm);
        assert!(solver.result().unwrap().is_converged());

        let mut field = ScalarField::new("T", grid.n_cells());
        solver.map_solution(&comm, &grid, &mut field).unwrap();
        gf_physics::parallel::exchange_halo(&comm, &grid, &mut field);
        field
    });
    let serial = {
        let grid = RectilinearGrid::new(3, 4, 1.0, 1.0).unwrap();
        let mut solver = DistributedSparseSolver::new(settings(PreconditionerKind::Ilu0));
        solver.set_rank(&SerialComm, grid.n_local_cells());
        solver.set_equation(&poisson_system(&grid)).unwrap();
        solver.solve(&SerialComm);
        let mut field = ScalarField::new("T", grid.n_cells());
        solver.map_solution(&SerialComm, &grid, &mut field).unwrap();
        field
    };
    for field in fields {
        for (a, b) in field.values().iter().zip(serial.values()) {
            assert!((a - b).abs() < 1e-8);
        }
    }
}

#[test]
fn test_vector_solution_mapping() {
    let fields = ThreadComm::run(2, |comm| {
        let grid = RectilinearGrid::partitioned(4, 4, 1.0, 1.0, comm.rank(), 2).unwrap();
        let mut eqn = Equation::new();
        for &c in grid.local_active_cells() {
            let target = DVec2::new(c as f64, -2.0 * c as f64);
            for (set, v) in IndexSet::VECTOR.into_iter().zip([target.x, target.y]) {
                eqn.pin(grid.global_index(c, set), -v);
            }
        }

        let mut solver = DistributedSparseSolver::new(settings(PreconditionerKind::Jacobi));
        solver.set_rank(&comm, 2 * grid.n_local_cells());
        solver.set_equation(&eqn).unwrap();
        solver.solve(&comm);

        let mut u = VectorField::new("U", grid.n_cells());
        solver.map_solution_vector(&comm, &grid, &mut u).unwrap();
        gf_physics::parallel::exchange_halo_vector(&comm, &grid, &mut u);
        u
    });
    for u in fields {
        for c in 0..16 {
            assert!((u[c] - DVec2::new(c as f64, -2.0 * c as f64)).length() < 1e-10);
        }
    }
}

#[test]
fn test_preconditioner_reuse() {
    let comm = SerialComm;
    let grid = RectilinearGrid::new(6, 6, 1.0, 1.0).unwrap();
    let settings = SparseSolverSettings {
        max_precon_uses: 3,
        ..settings(PreconditionerKind::Ilu0)
    };
    let mut solver = DistributedSparseSolver::new(settings);
    solver.set_rank(&comm, grid.n_local_cells());

    let mut counter = Vec::new();
    for step in 0..6 {
        // 系数随步数变化，复用旧分解仍须收敛
        let eqn = laplacian(&grid, grid.local_active_cells(), 1.0 + 0.1 * step as f64, |_| 1.0);
        solver.set_equation(&eqn).unwrap();
        solver.solve(&comm);
        assert!(solver.result().unwrap().is_converged());
        counter.push(solver.precon_uses());
    }
    assert_eq!(counter, vec![0, 1, 2, 3, 0, 1]);
}

#[test]
fn test_non_finite_solution_leaves_field_untouched() {
    let comm = SerialComm;
    let grid = RectilinearGrid::new(3, 3, 1.0, 1.0).unwrap();
    let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
    solver.set_rank(&comm, 9);

    let mut guess = vec![0.0; 9];
    guess[4] = f64::NAN;
    guess[7] = f64::INFINITY;
    solver.set_guess(&guess).unwrap();

    let mut field = ScalarField::from_fn("T", &grid, |p| p.x);
    let before = field.clone();
    let err = solver.map_solution(&comm, &grid, &mut field).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numerical);
    assert!(matches!(err, GfError::NonFinite { count: 2, .. }));
    assert_eq!(field.values(), before.values());

    let mut u = VectorField::new("U", 9);
    let err = solver.map_solution_vector(&comm, &grid, &mut u).unwrap_err();
    assert!(err.is_numerical_error());
}

#[test]
fn test_non_finite_reported_by_every_rank() {
    // 只有进程 0 持有 NaN，没有行的进程 1 也必须返回同一个错误
    let outcomes = ThreadComm::run(2, |comm| {
        let grid = RectilinearGrid::partitioned(3, 1, 1.0, 1.0, comm.rank(), 2).unwrap();
        let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
        solver.set_rank(&comm, grid.n_local_cells());
        if comm.rank() == 0 {
            solver.set_guess(&[0.0, f64::NAN, 0.0]).unwrap();
        }

        let mut field = ScalarField::uniform("T", grid.n_cells(), 5.0);
        let err = solver.map_solution(&comm, &grid, &mut field).unwrap_err();
        let mut u = VectorField::new("U", grid.n_cells());
        let vector_err = solver.map_solution_vector(&comm, &grid, &mut u).unwrap_err();
        (grid.n_local_cells(), err, vector_err.is_numerical_error(), field)
    });

    assert_eq!(outcomes[1].0, 0);
    for (_, err, vector_failed, field) in outcomes {
        assert!(matches!(err, GfError::NonFinite { count: 1, .. }), "{err:?}");
        assert!(vector_failed);
        assert!(field.values().iter().all(|&v| v == 5.0));
    }
}

#[test]
fn test_poisson_with_nan_boundary_fails_on_every_rank() {
    let outcomes = ThreadComm::run(2, |comm| {
        let grid = RectilinearGrid::partitioned(3, 1, 1.0, 1.0, comm.rank(), 2).unwrap();
        let ib = ImmersedBoundary::new();
        let mut field = ScalarField::uniform("T", grid.n_cells(), 5.0);
        let mut solver = PoissonSolver::new(settings(PreconditionerKind::Jacobi));
        let err = solver
            .solve(&comm, &grid, &ib, &mut field, |_| f64::NAN)
            .unwrap_err();
        (err, field)
    });

    let counts: Vec<usize> = outcomes
        .iter()
        .map(|(err, _)| match err {
            GfError::NonFinite { count, .. } => *count,
            other => panic!("意外的错误: {other:?}"),
        })
        .collect();
    assert!(counts[0] > 0);
    assert_eq!(counts[0], counts[1]);
    for (_, field) in outcomes {
        assert!(field.values().iter().all(|&v| v == 5.0));
    }
}

#[test]
fn test_size_errors() {
    let comm = SerialComm;
    let mut solver = DistributedSparseSolver::new(SparseSolverSettings::default());
    solver.set_rank(&comm, 4);
    assert!(solver.set_rhs(&[0.0; 3]).is_err());
    assert!(solver.set_guess(&[0.0; 5]).is_err());

    let mut eqn = Equation::new();
    eqn.add(0, 9, 1.0);
    let err = solver.set(&eqn).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}
