//! Cubism 模型运行时管理

pub mod parameter;
mod runtime;

pub use parameter::{find_by_id, find_part_by_id, CubismParameter, CubismParameterStore, CubismPart};
pub use runtime::CubismModel;
