//! 物理装配
//!
//! 由多条互相独立的子物理链组成，共享重力与风。

use glam::Vec2;

use crate::model::CubismParameter;

use super::config::{get_config, PhysicsConfig};
use super::sub_rig::{CubismPhysicsEnvironment, CubismPhysicsSubRig};

/// 物理装配
///
/// `sub_rigs` 中的 `None` 表示已删除的物理设置，求值时直接跳过。
#[derive(Clone, Debug)]
pub struct CubismPhysicsRig {
    pub sub_rigs: Vec<Option<CubismPhysicsSubRig>>,
    pub gravity: Vec2,
    pub wind: Vec2,
    config: PhysicsConfig,
}

impl CubismPhysicsRig {
    /// 创建空装配（读取当前全局配置）
    pub fn new() -> Self {
        Self::with_config(get_config())
    }

    /// 使用指定配置创建
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            sub_rigs: Vec::new(),
            gravity: Vec2::new(0.0, -1.0),
            wind: Vec2::ZERO,
            config,
        }
    }

    /// 添加子物理链，返回其索引
    pub fn add_sub_rig(&mut self, sub_rig: CubismPhysicsSubRig) -> usize {
        self.sub_rigs.push(Some(sub_rig));
        self.sub_rigs.len() - 1
    }

    /// 移除子物理链，保留占位
    pub fn remove_sub_rig(&mut self, index: usize) -> Option<CubismPhysicsSubRig> {
        self.sub_rigs.get_mut(index).and_then(Option::take)
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config;
    }

    pub fn environment(&self) -> CubismPhysicsEnvironment {
        CubismPhysicsEnvironment {
            gravity: self.gravity,
            wind: self.wind,
        }
    }

    /// 初始化所有子物理链
    pub fn initialize(&mut self) {
        let gravity = self.gravity;
        for sub_rig in self.sub_rigs.iter_mut().flatten() {
            sub_rig.initialize(gravity);
        }

        if self.config.debug_log {
            log::info!(
                "[物理] 初始化完成: {} 条子物理链, {} 个粒子, {} 个输入, {} 个输出",
                self.sub_rig_count(),
                self.particle_count(),
                self.sub_rigs.iter().flatten().map(|r| r.inputs.len()).sum::<usize>(),
                self.sub_rigs.iter().flatten().map(|r| r.outputs.len()).sum::<usize>(),
            );
        }
    }

    /// 推进一帧
    pub fn evaluate(&mut self, parameters: &mut [CubismParameter], delta_time: f32) {
        if delta_time <= 0.0 {
            log::debug!("[物理] delta_time={} 不为正，跳过", delta_time);
            return;
        }

        let environment = self.environment();
        let config = &self.config;
        for sub_rig in self.sub_rigs.iter_mut().flatten() {
            sub_rig.evaluate(parameters, &environment, config, delta_time);
        }
    }

    /// 有效子物理链数量（不含占位）
    pub fn sub_rig_count(&self) -> usize {
        self.sub_rigs.iter().flatten().count()
    }

    /// 粒子总数
    pub fn particle_count(&self) -> usize {
        self.sub_rigs.iter().flatten().map(|r| r.particles.len()).sum()
    }
}

impl Default for CubismPhysicsRig {
    fn default() -> Self {
        Self::new()
    }
}

/// 物理控制器
///
/// 持有可选的物理装配，每帧由宿主驱动。
#[derive(Clone, Debug, Default)]
pub struct CubismPhysicsController {
    rig: Option<CubismPhysicsRig>,
}

impl CubismPhysicsController {
    pub fn new(rig: Option<CubismPhysicsRig>) -> Self {
        Self { rig }
    }

    pub fn rig(&self) -> Option<&CubismPhysicsRig> {
        self.rig.as_ref()
    }

    pub fn rig_mut(&mut self) -> Option<&mut CubismPhysicsRig> {
        self.rig.as_mut()
    }

    /// 替换物理装配并初始化
    pub fn set_rig(&mut self, rig: Option<CubismPhysicsRig>) {
        self.rig = rig;
        self.initialize();
    }

    pub fn initialize(&mut self) {
        if let Some(rig) = self.rig.as_mut() {
            rig.initialize();
        }
    }

    /// 每帧更新
    pub fn update(&mut self, parameters: &mut [CubismParameter], delta_time: f32) {
        let Some(rig) = self.rig.as_mut() else {
            log::debug!("[物理] 未加载物理装配，跳过");
            return;
        };
        rig.evaluate(parameters, delta_time);
    }
}
