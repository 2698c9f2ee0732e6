//! Cubism 物理系统模块
//!
//! 每条子物理链是一串由刚性杆连接的粒子：
//! 输入参数驱动链首，粒子在重力与风的作用下跟随，
//! 链上各段的方向再写回输出参数。
//!
//! ## 每帧数据流
//! | 阶段 | 说明 |
//! |------|------|
//! | 输入 | 参数归一化后累加为平移 / 角度 |
//! | 积分 | `update_particles`，以 30 FPS 为延迟基准 |
//! | 输出 | 粒子段方向换算为参数值并按权重混合 |

pub mod config;
mod input;
mod json;
pub mod math;
mod output;
mod particle;
mod rig;
mod sub_rig;

pub use config::{get_config, reset_config, set_config, PhysicsConfig};
pub use input::{CubismPhysicsInput, CubismPhysicsSourceComponent, NormalizedParameterValueGetter};
pub use json::CubismPhysics3Json;
pub use math::NormalizedValue;
pub use output::{CubismPhysicsOutput, OutputScaleGetter, OutputValueGetter};
pub use particle::{
    CubismPhysicsNormalization, CubismPhysicsNormalizationTuplet, CubismPhysicsParticle,
};
pub use rig::{CubismPhysicsController, CubismPhysicsRig};
pub use sub_rig::{CubismPhysicsEnvironment, CubismPhysicsSubRig};
