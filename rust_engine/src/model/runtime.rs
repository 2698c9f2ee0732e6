//! Cubism 运行时模型
//!
//! 每帧顺序：推进内部时钟 -> 恢复基准快照 -> 淡入淡出混合 -> 未淡入层的动作 -> 物理。
//! 物理读取的是动画后的参数，并把输出写回同一组参数。

use std::sync::Arc;

use crate::animation::{CubismFadeController, CubismFadeMotionData};
use crate::physics::{CubismPhysicsController, CubismPhysicsRig};
use crate::Result;

use super::{CubismParameter, CubismParameterStore, CubismPart};

/// 默认动画层数
const DEFAULT_LAYER_COUNT: usize = 1;

/// Cubism 运行时模型
#[derive(Clone, Debug)]
pub struct CubismModel {
    pub name: String,

    // 参数与部件
    parameter_store: CubismParameterStore,

    // 子系统
    fade_controller: CubismFadeController,
    physics: CubismPhysicsController,
    physics_enabled: bool,

    // 内部时钟（秒）
    time: f32,
}

impl CubismModel {
    /// 创建模型，当前参数值作为淡入淡出的基准快照
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<CubismParameter>,
        parts: Vec<CubismPart>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_store: CubismParameterStore::new(parameters, parts),
            fade_controller: CubismFadeController::new(DEFAULT_LAYER_COUNT),
            physics: CubismPhysicsController::default(),
            physics_enabled: false,
            time: 0.0,
        }
    }

    /// 设置动画层数（清空正在播放的动作）
    pub fn with_layer_count(mut self, layer_count: usize) -> Self {
        self.fade_controller = CubismFadeController::new(layer_count);
        self
    }

    pub fn parameter_store(&self) -> &CubismParameterStore {
        &self.parameter_store
    }

    pub fn parameter_store_mut(&mut self) -> &mut CubismParameterStore {
        &mut self.parameter_store
    }

    /// 读取参数值
    pub fn parameter_value(&self, id: &str) -> Option<f32> {
        self.parameter_store.parameter(id).map(|p| p.value)
    }

    /// 设置参数值
    ///
    /// 每帧开始时参数会恢复到基准快照，因此这里同时更新快照。
    pub fn set_parameter_value(&mut self, id: &str, value: f32) {
        self.parameter_store.set_baseline_value(id, value);
    }

    /// 读取部件不透明度
    pub fn part_opacity(&self, id: &str) -> Option<f32> {
        self.parameter_store.part(id).map(|p| p.opacity)
    }

    /// 把当前参数值保存为基准快照
    pub fn save_parameters(&mut self) {
        self.parameter_store.save_parameters();
    }

    /// 当前时钟
    pub fn time(&self) -> f32 {
        self.time
    }

    // ========== 淡入淡出 ==========

    pub fn fade_controller(&self) -> &CubismFadeController {
        &self.fade_controller
    }

    pub fn fade_controller_mut(&mut self) -> &mut CubismFadeController {
        &mut self.fade_controller
    }

    /// 在指定层以当前时钟开始播放动作
    pub fn play_motion(
        &mut self,
        layer_id: usize,
        motion: Arc<CubismFadeMotionData>,
        speed: f32,
        is_looping: bool,
    ) -> bool {
        self.fade_controller
            .play_motion(layer_id, motion, self.time, speed, is_looping)
    }

    /// 设置层权重
    pub fn set_layer_weight(&mut self, layer_id: usize, weight: f32) {
        self.fade_controller.set_layer_weight(layer_id, weight);
    }

    /// 停止指定层的全部动作
    pub fn stop_layer(&mut self, layer_id: usize) {
        if let Some(state) = self.fade_controller.fade_state_mut(layer_id) {
            state.stop_all();
        }
    }

    // ========== 物理 ==========

    /// 加载物理装配并初始化
    pub fn init_physics(&mut self, rig: CubismPhysicsRig) {
        self.physics.set_rig(Some(rig));
        self.physics_enabled = true;

        if let Some(rig) = self.physics.rig() {
            log::info!(
                "模型 '{}' 物理初始化完成: {} 条子物理链, {} 个粒子",
                self.name,
                rig.sub_rig_count(),
                rig.particle_count()
            );
        }
    }

    /// 从 physics3.json 文本加载物理
    pub fn load_physics_json(&mut self, json: &str) -> Result<()> {
        let rig = CubismPhysicsRig::from_json(json)?;
        self.init_physics(rig);
        Ok(())
    }

    /// 重置物理状态（粒子回到静止位置）
    pub fn reset_physics(&mut self) {
        self.physics.initialize();
    }

    /// 设置物理是否启用
    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.physics_enabled = enabled;
    }

    /// 物理是否启用（需要已加载）
    pub fn is_physics_enabled(&self) -> bool {
        self.physics_enabled && self.physics.rig().is_some()
    }

    /// 是否已加载物理
    pub fn has_physics(&self) -> bool {
        self.physics.rig().is_some()
    }

    pub fn physics(&self) -> &CubismPhysicsController {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut CubismPhysicsController {
        &mut self.physics
    }

    // ========== 每帧更新 ==========

    /// 推进一帧
    pub fn update(&mut self, delta_time: f32) {
        self.time += delta_time.max(0.0);

        // 每帧从基准快照开始，物理输出不会与上一帧的结果叠加
        self.parameter_store.restore_parameters();

        // 淡入中的层交叉混合，其余层直接播放最新动作
        self.fade_controller
            .update(&mut self.parameter_store, self.time);
        self.fade_controller
            .apply_settled_motions(&mut self.parameter_store, self.time);

        if self.physics_enabled {
            self.physics
                .update(self.parameter_store.parameters_mut(), delta_time);
        }
    }
}
