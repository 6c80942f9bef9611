// crates/gf_physics/src/mesh/mod.rs

//! 网格接口与实现
//!
//! - [`GridTopology`]: 浸入边界子系统读取的网格查询
//! - [`RectilinearGrid`]: 按行条带分区的均匀矩形网格
//! - [`CellSearch`]: 单元形心 R-Tree 索引

mod rectilinear;
mod search;
mod topology;

pub use rectilinear::{patch, RectilinearGrid};
pub use search::CellSearch;
pub use topology::{BoundaryLink, GridTopology, IndexSet, InteriorLink};
