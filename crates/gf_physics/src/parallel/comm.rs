// crates/gf_physics/src/parallel/comm.rs

//! 进程间通信抽象
//!
//! 分布式内存由 [`Communicator`] 建模。所有集合操作必须由组内每个进程
//! 以相同顺序调用。规约按进程编号顺序求和，保证各进程得到逐位相同的结果。
//!
//! - [`SerialComm`]: 单进程
//! - [`ThreadComm`]: 以线程模拟多进程，共享会合点

use std::sync::{Arc, Barrier};

use parking_lot::Mutex;

/// 通信器 trait
pub trait Communicator: Send + Sync {
    /// 本进程编号
    fn rank(&self) -> usize;

    /// 进程总数
    fn size(&self) -> usize;

    /// 变长收集：返回按进程编号排列的各进程数据
    fn all_gather(&self, local: &[f64]) -> Vec<Vec<f64>>;

    /// 收集每个进程的一个整数
    fn all_gather_usize(&self, value: usize) -> Vec<usize> {
        self.all_gather(&[value as f64])
            .iter()
            .map(|v| v.first().copied().unwrap_or(0.0) as usize)
            .collect()
    }

    /// 全局求和
    fn sum(&self, value: f64) -> f64 {
        self.all_gather(&[value])
            .iter()
            .filter_map(|v| v.first())
            .fold(0.0, |acc, &x| acc + x)
    }

    /// 全局最小值
    fn min(&self, value: f64) -> f64 {
        self.all_gather(&[value])
            .iter()
            .filter_map(|v| v.first())
            .fold(f64::INFINITY, |acc, &x| acc.min(x))
    }

    /// 全局最大值
    fn max(&self, value: f64) -> f64 {
        self.all_gather(&[value])
            .iter()
            .filter_map(|v| v.first())
            .fold(f64::NEG_INFINITY, |acc, &x| acc.max(x))
    }

    /// 同步点
    fn barrier(&self);

    /// 是否主进程
    fn is_main(&self) -> bool {
        self.rank() == 0
    }

    /// 主进程输出诊断信息
    fn info(&self, msg: &str) {
        if self.is_main() {
            log::info!("{msg}");
        }
    }
}

// ============================================================
// 单进程
// ============================================================

/// 单进程通信器
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather(&self, local: &[f64]) -> Vec<Vec<f64>> {
        vec![local.to_vec()]
    }

    fn barrier(&self) {}
}

// ============================================================
// 线程组
// ============================================================

#[derive(Debug)]
struct Shared {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// 线程通信器
///
/// 同一组的每个成员在各自线程中使用。收集操作先写入自己的槽位，
/// 在屏障处会合后复制全部槽位，再次会合后才允许下一次写入。
#[derive(Debug, Clone)]
pub struct ThreadComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// 创建 `n` 个成员的通信组，第 i 个元素的编号为 i
    pub fn group(n: usize) -> Vec<ThreadComm> {
        let shared = Arc::new(Shared {
            size: n,
            barrier: Barrier::new(n),
            slots: Mutex::new(vec![Vec::new(); n]),
        });
        (0..n)
            .map(|rank| ThreadComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// 在 `n` 个线程上运行 `f`，返回按编号排列的结果
    ///
    /// # Panics
    /// 任一线程 panic 时向调用方传播。
    pub fn run<T, F>(n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(ThreadComm) -> T + Sync,
    {
        let f = &f;
        std::thread::scope(|s| {
            let handles: Vec<_> = Self::group(n)
                .into_iter()
                .map(|comm| s.spawn(move || f(comm)))
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(v) => v,
                    Err(e) => std::panic::resume_unwind(e),
                })
                .collect()
        })
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn all_gather(&self, local: &[f64]) -> Vec<Vec<f64>> {
        self.shared.slots.lock()[self.rank] = local.to_vec();
        self.shared.barrier.wait();
        let gathered = self.shared.slots.lock().clone();
        self.shared.barrier.wait();
        gathered
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial() {
        let comm = SerialComm;
        assert_eq!(comm.sum(2.5), 2.5);
        assert_eq!(comm.min(-1.0), -1.0);
        assert_eq!(comm.all_gather_usize(7), vec![7]);
        assert!(comm.is_main());
    }

    #[test]
    fn test_thread_group_collectives() {
        let results = ThreadComm::run(3, |comm| {
            let r = comm.rank() as f64;
            let gathered = comm.all_gather(&vec![r; comm.rank() + 1]);
            let sizes: Vec<usize> = gathered.iter().map(|v| v.len()).collect();
            (comm.sum(r), comm.max(r), comm.min(r), sizes)
        });
        for (sum, max, min, sizes) in results {
            assert_eq!(sum, 3.0);
            assert_eq!(max, 2.0);
            assert_eq!(min, 0.0);
            assert_eq!(sizes, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_reduction_is_bit_identical() {
        let values = [0.1, 0.2, 0.3, 1e-17];
        let sums = ThreadComm::run(4, |comm| comm.sum(values[comm.rank()]));
        assert!(sums.windows(2).all(|w| w[0].to_bits() == w[1].to_bits()));
    }
}
