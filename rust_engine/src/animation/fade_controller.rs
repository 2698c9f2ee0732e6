//! 淡入淡出控制器
//!
//! 每帧检查各层是否处于淡入过程：
//! 1. 未淡入的层移除已结束的动作
//! 2. 没有任何层淡入时直接返回
//! 3. 否则先把参数恢复到基准快照，再逐层混合淡入中的动作

use std::sync::Arc;

use crate::model::{CubismParameter, CubismParameterStore, CubismPart};

use super::curve::AnimationCurve;
use super::fade_math::get_easing_sine;
use super::fade_motion::CubismFadeMotionData;
use super::fade_state::CubismFadeState;

/// 参数级淡入淡出时间低于此值时视为立即完成
const FADE_TIME_EPSILON: f32 = f32::EPSILON;

/// 动作级淡入淡出权重
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionFadeWeights {
    pub fade_in: f32,
    pub fade_out: f32,
    /// 合成后的动作权重（已考虑层权重）
    pub motion: f32,
}

/// 单条曲线求值所需的时间信息
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveFadeTiming {
    /// 曲线时间
    pub elapsed_time: f32,
    /// 自淡入开始经过的时间
    pub fade_in_elapsed_time: f32,
    /// 距结束的剩余时间
    pub remaining_time: f32,
}

/// 淡入淡出控制器
#[derive(Clone, Debug)]
pub struct CubismFadeController {
    fade_states: Vec<CubismFadeState>,
}

impl CubismFadeController {
    /// 创建指定层数的控制器
    pub fn new(layer_count: usize) -> Self {
        let fade_states = (0..layer_count)
            .map(|i| CubismFadeState::new(i, format!("Layer_{}", i)))
            .collect();
        Self { fade_states }
    }

    pub fn fade_states(&self) -> &[CubismFadeState] {
        &self.fade_states
    }

    pub fn fade_state(&self, layer_id: usize) -> Option<&CubismFadeState> {
        self.fade_states.get(layer_id)
    }

    pub fn fade_state_mut(&mut self, layer_id: usize) -> Option<&mut CubismFadeState> {
        self.fade_states.get_mut(layer_id)
    }

    pub fn layer_count(&self) -> usize {
        self.fade_states.len()
    }

    /// 在指定层播放动作
    pub fn play_motion(
        &mut self,
        layer_id: usize,
        motion: Arc<CubismFadeMotionData>,
        now: f32,
        speed: f32,
        is_looping: bool,
    ) -> bool {
        match self.fade_states.get_mut(layer_id) {
            Some(state) => {
                state.play_motion(motion, now, speed, is_looping);
                true
            }
            None => {
                log::warn!("淡入淡出层 {} 不存在", layer_id);
                false
            }
        }
    }

    /// 设置层权重
    pub fn set_layer_weight(&mut self, layer_id: usize, weight: f32) {
        if let Some(state) = self.fade_states.get_mut(layer_id) {
            state.set_layer_weight(weight);
        }
    }

    /// 每帧更新，返回本帧是否进行了混合
    pub fn update(&mut self, store: &mut CubismParameterStore, now: f32) -> bool {
        let is_fades: Vec<bool> = self.fade_states.iter().map(|s| s.is_fading(now)).collect();

        let mut is_fade_model = false;
        for (state, &is_fade) in self.fade_states.iter_mut().zip(&is_fades) {
            if is_fade {
                is_fade_model = true;
                continue;
            }
            state.retire_finished_motions(now);
            state.set_state_transition_finished(true);
        }

        if !is_fade_model {
            return false;
        }

        store.restore_parameters();
        let (parameters, parts) = store.split_mut();

        for (state, &is_fade) in self.fade_states.iter_mut().zip(&is_fades) {
            if is_fade {
                Self::update_fade(state, parameters, parts, now);
            }
        }

        true
    }

    /// 应用未淡入层上最新动作的曲线
    ///
    /// 默认层直接写入曲线值，其余层按层权重混合。
    /// 淡入中的层由 [`update`](Self::update) 负责，这里跳过。
    pub fn apply_settled_motions(&mut self, store: &mut CubismParameterStore, now: f32) {
        let (parameters, parts) = store.split_mut();

        for state in &mut self.fade_states {
            if state.is_fading(now) {
                continue;
            }
            state.update_looping_motion(now);

            let weight = if state.is_default_state() {
                1.0
            } else {
                state.layer_weight()
            };
            let Some(latest) = state.playing_motions_mut().last_mut() else {
                continue;
            };
            latest.weight = weight;

            let elapsed_time = latest.elapsed_time(now);
            let motion = &latest.motion;

            for parameter in parameters.iter_mut() {
                if let Some(curve) = Self::settled_curve(motion, &parameter.id) {
                    let target = curve.evaluate(elapsed_time);
                    parameter.value += (target - parameter.value) * weight;
                }
            }
            for part in parts.iter_mut() {
                if let Some(curve) = Self::settled_curve(motion, &part.id) {
                    let target = curve.evaluate(elapsed_time);
                    part.opacity += (target - part.opacity) * weight;
                }
            }
        }
    }

    fn settled_curve<'a>(motion: &'a CubismFadeMotionData, id: &str) -> Option<&'a AnimationCurve> {
        let curve = &motion.parameter_curves()[motion.find_curve_index(id)?];
        (!curve.is_empty()).then_some(curve)
    }

    /// 计算动作级权重
    ///
    /// 只有最早的动作不受层权重影响。
    pub fn motion_fade_weights(
        fade_in_time: f32,
        fade_out_time: f32,
        fade_in_elapsed_time: f32,
        remaining_time: Option<f32>,
        layer_weight: Option<f32>,
    ) -> MotionFadeWeights {
        let fade_in = if fade_in_time <= 0.0 {
            1.0
        } else {
            get_easing_sine(fade_in_elapsed_time / fade_in_time)
        };
        let fade_out = match remaining_time {
            Some(remaining) if fade_out_time > 0.0 => get_easing_sine(remaining / fade_out_time),
            _ => 1.0,
        };

        let mut motion = fade_in * fade_out;
        if let Some(layer_weight) = layer_weight {
            motion *= layer_weight;
        }

        MotionFadeWeights {
            fade_in,
            fade_out,
            motion,
        }
    }

    /// 混合一层上所有正在播放的动作
    pub fn update_fade(
        state: &mut CubismFadeState,
        parameters: &mut [CubismParameter],
        parts: &mut [CubismPart],
        now: f32,
    ) {
        state.update_looping_motion(now);

        let layer_weight = state.layer_weight();
        for (index, playing) in state.playing_motions_mut().iter_mut().enumerate() {
            let motion = Arc::clone(&playing.motion);

            let timing = CurveFadeTiming {
                elapsed_time: playing.elapsed_time(now),
                fade_in_elapsed_time: playing.fade_in_elapsed_time(now),
                remaining_time: playing.end_time - now,
            };
            let weights = Self::motion_fade_weights(
                motion.fade_in_time(),
                motion.fade_out_time(),
                timing.fade_in_elapsed_time,
                playing.has_end_time().then_some(timing.remaining_time),
                (index > 0).then_some(layer_weight),
            );
            playing.weight = weights.motion;

            for parameter in parameters.iter_mut() {
                let Some(curve_index) = motion.find_curve_index(&parameter.id) else {
                    continue;
                };
                parameter.value =
                    Self::evaluate_curve(&motion, curve_index, &timing, &weights, parameter.value);
            }

            for part in parts.iter_mut() {
                let Some(curve_index) = motion.find_curve_index(&part.id) else {
                    continue;
                };
                part.opacity =
                    Self::evaluate_curve(&motion, curve_index, &timing, &weights, part.opacity);
            }
        }
    }

    fn evaluate_curve(
        motion: &CubismFadeMotionData,
        curve_index: usize,
        timing: &CurveFadeTiming,
        weights: &MotionFadeWeights,
        current_value: f32,
    ) -> f32 {
        Self::evaluate(
            &motion.parameter_curves()[curve_index],
            timing,
            weights,
            motion.parameter_fade_in_times()[curve_index],
            motion.parameter_fade_out_times()[curve_index],
            current_value,
        )
    }

    /// 曲线求值并与当前值混合
    ///
    /// 参数级淡入淡出时间都未设置时按动作权重混合；
    /// 否则分别计算参数级淡入 / 淡出权重，未设置的一侧沿用动作级权重。
    pub fn evaluate(
        curve: &AnimationCurve,
        timing: &CurveFadeTiming,
        weights: &MotionFadeWeights,
        parameter_fade_in_time: f32,
        parameter_fade_out_time: f32,
        current_value: f32,
    ) -> f32 {
        if curve.is_empty() {
            return current_value;
        }

        let target = curve.evaluate(timing.elapsed_time);

        if parameter_fade_in_time < 0.0 && parameter_fade_out_time < 0.0 {
            return current_value + (target - current_value) * weights.motion;
        }

        let fade_in_weight = if parameter_fade_in_time < 0.0 {
            weights.fade_in
        } else if parameter_fade_in_time < FADE_TIME_EPSILON {
            1.0
        } else {
            get_easing_sine(timing.fade_in_elapsed_time / parameter_fade_in_time)
        };

        let fade_out_weight = if parameter_fade_out_time < 0.0 {
            weights.fade_out
        } else if parameter_fade_out_time < FADE_TIME_EPSILON {
            1.0
        } else {
            get_easing_sine(timing.remaining_time / parameter_fade_out_time)
        };

        let parameter_weight = fade_in_weight * fade_out_weight;
        current_value + (target - current_value) * parameter_weight
    }
}

impl Default for CubismFadeController {
    fn default() -> Self {
        Self::new(1)
    }
}
