// crates/gf_physics/src/parallel/halo.rs

//! 光环交换与全局诊断
//!
//! 每个进程持有全部单元的场数组，只有本进程单元的值是权威的。
//! 交换时各进程广播 `(单元, 值)` 对，接收方用其覆盖非本进程单元。

use crate::fields::{ScalarField, VectorField};
use crate::mesh::GridTopology;

use super::comm::Communicator;

/// 标量场光环交换
pub fn exchange_halo<C, G>(comm: &C, grid: &G, field: &mut ScalarField)
where
    C: Communicator + ?Sized,
    G: GridTopology + ?Sized,
{
    let mut packed = Vec::with_capacity(2 * grid.n_local_cells());
    for &cell in grid.local_active_cells() {
        packed.push(cell as f64);
        packed.push(field[cell]);
    }

    let values = field.values_mut();
    for (rank, data) in comm.all_gather(&packed).iter().enumerate() {
        if rank == comm.rank() {
            continue;
        }
        for pair in data.chunks_exact(2) {
            values[pair[0] as usize] = pair[1];
        }
    }
}

/// 矢量场光环交换
pub fn exchange_halo_vector<C, G>(comm: &C, grid: &G, field: &mut VectorField)
where
    C: Communicator + ?Sized,
    G: GridTopology + ?Sized,
{
    let mut packed = Vec::with_capacity(3 * grid.n_local_cells());
    for &cell in grid.local_active_cells() {
        let v = field[cell];
        packed.extend_from_slice(&[cell as f64, v.x, v.y]);
    }

    let values = field.values_mut();
    for (rank, data) in comm.all_gather(&packed).iter().enumerate() {
        if rank == comm.rank() {
            continue;
        }
        for triple in data.chunks_exact(3) {
            let v = &mut values[triple[0] as usize];
            v.x = triple[1];
            v.y = triple[2];
        }
    }
}

/// 本进程单元上场的全局 (最小值, 最大值)
///
/// 所有进程都没有单元时返回 (+∞, -∞)。
pub fn field_extrema<C, G>(comm: &C, grid: &G, field: &ScalarField) -> (f64, f64)
where
    C: Communicator + ?Sized,
    G: GridTopology + ?Sized,
{
    let (lo, hi) = grid
        .local_active_cells()
        .iter()
        .map(|&c| field[c])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    (comm.min(lo), comm.max(hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectilinearGrid;
    use crate::parallel::{SerialComm, ThreadComm};
    use glam::DVec2;

    #[test]
    fn test_exchange_fills_remote_cells() {
        let results = ThreadComm::run(2, |comm| {
            let grid = RectilinearGrid::partitioned(3, 4, 1.0, 1.0, comm.rank(), 2).unwrap();
            let mut field = ScalarField::new("phi", grid.n_cells());
            let mut vel = VectorField::new("U", grid.n_cells());
            for &c in grid.local_active_cells() {
                field[c] = c as f64 + 0.5;
                vel[c] = DVec2::new(c as f64, -(c as f64));
            }
            exchange_halo(&comm, &grid, &mut field);
            exchange_halo_vector(&comm, &grid, &mut vel);
            let extrema = field_extrema(&comm, &grid, &field);
            (field, vel, extrema)
        });

        for (field, vel, extrema) in results {
            for c in 0..12 {
                assert_eq!(field[c], c as f64 + 0.5);
                assert_eq!(vel[c], DVec2::new(c as f64, -(c as f64)));
            }
            assert_eq!(extrema, (0.5, 11.5));
        }
    }

    #[test]
    fn test_serial_is_noop() {
        let grid = RectilinearGrid::new(2, 2, 1.0, 1.0).unwrap();
        let mut field = ScalarField::uniform("phi", 4, 3.0);
        exchange_halo(&SerialComm, &grid, &mut field);
        assert!(field.values().iter().all(|&v| v == 3.0));
        assert_eq!(field_extrema(&SerialComm, &grid, &field), (3.0, 3.0));
    }
}
