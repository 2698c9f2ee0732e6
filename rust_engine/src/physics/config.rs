//! Cubism 物理配置
//!
//! 所有参数扁平化，默认值与 Cubism 编辑器的物理计算保持一致。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 物理配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    // ========== 模拟常量 ==========
    /// 空气阻力，默认 5.0
    /// 用于削弱重力方向变化带来的角度修正
    pub air_resistance: f32,
    /// 权重上限，默认 100.0
    /// 输入/输出权重都除以此值换算到 [0, 1]
    pub maximum_weight: f32,
    /// 位移阈值系数，默认 0.001
    /// 乘以位置归一化最大值后得到 x 坐标归零的阈值
    pub movement_threshold: f32,
    /// 是否启用角度修正，默认 true
    /// 启用后，角度输出以前两个粒子的方向作为父级重力
    pub use_angle_correction: bool,

    // ========== 时间 ==========
    /// 延迟项的参考帧率，默认 30.0
    /// **编辑器按 30 FPS 计算物理，修改会导致与编辑器预览不一致**
    pub simulation_fps: f32,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            air_resistance: 5.0,
            maximum_weight: 100.0,
            movement_threshold: 0.001,
            use_angle_correction: true,
            simulation_fps: 30.0,
            debug_log: false,
        }
    }
}

/// 全局配置实例
static PHYSICS_CONFIG: Lazy<RwLock<PhysicsConfig>> =
    Lazy::new(|| RwLock::new(PhysicsConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> PhysicsConfig {
    match PHYSICS_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: PhysicsConfig) {
    match PHYSICS_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(PhysicsConfig::default());
}
