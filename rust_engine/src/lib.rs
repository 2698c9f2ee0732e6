//! Cubism Engine - Rust 实现的 Live2D Cubism 运行时子系统
//!
//! 提供：
//! - physics3.json 解析和物理装配构建
//! - 摆动物理模拟（粒子链、输入归一化、输出写回参数）
//! - 关键帧曲线求值
//! - 动作淡入淡出混合（多层、参数级淡入淡出、循环）
//! - 参数 / 部件存储与运行时模型

pub mod animation;
pub mod model;
pub mod physics;

pub use animation::{
    AnimationCurve, CubismFadeController, CubismFadeMotionData, CubismFadeMotionList,
    CubismFadeState, Keyframe,
};
pub use model::{CubismModel, CubismParameter, CubismParameterStore, CubismPart};
pub use physics::{CubismPhysics3Json, CubismPhysicsController, CubismPhysicsRig, PhysicsConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CubismError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Physics JSON error: {0}")]
    PhysicsJson(String),

    #[error("Fade motion error: {0}")]
    FadeMotion(String),
}

pub type Result<T> = std::result::Result<T, CubismError>;
