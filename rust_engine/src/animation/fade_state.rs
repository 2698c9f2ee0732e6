//! 淡入淡出状态 - 单个动画层上同时播放的动作
//!
//! 每层按进入顺序保存正在播放的动作（最新的在最后）：
//! - 新动作进入时，旧动作的结束时间被提前到新动作淡入完成
//! - 循环动作在每次混合时延长结束时间
//! - 层权重作用于除最早动作外的所有动作

use std::sync::Arc;

use super::fade_motion::CubismFadeMotionData;

/// 正在播放的动作
#[derive(Clone, Debug)]
pub struct CubismFadePlayingMotion {
    /// 曲线时间起点（循环时按动作长度前移）
    pub start_time: f32,
    /// 结束时间，负数表示尚未确定
    pub end_time: f32,
    /// 淡入起点
    pub fade_in_start_time: f32,
    /// 播放速度倍率
    pub speed: f32,
    /// 是否循环
    pub is_looping: bool,
    /// 最近一次混合时的动作权重
    pub weight: f32,
    pub motion: Arc<CubismFadeMotionData>,
}

impl CubismFadePlayingMotion {
    /// 曲线求值时间
    pub fn elapsed_time(&self, now: f32) -> f32 {
        (now - self.start_time) * self.speed
    }

    /// 自淡入开始经过的时间
    pub fn fade_in_elapsed_time(&self, now: f32) -> f32 {
        now - self.fade_in_start_time
    }

    /// 是否已有结束时间
    pub fn has_end_time(&self) -> bool {
        self.end_time >= 0.0
    }

    /// 结束时间已过
    pub fn is_finished(&self, now: f32) -> bool {
        self.has_end_time() && now > self.end_time
    }

    /// 一个循环周期（实际时间）
    fn loop_period(&self) -> f32 {
        if self.speed > 0.0 {
            self.motion.motion_length() / self.speed
        } else {
            0.0
        }
    }
}

/// 单个动画层的淡入淡出状态
#[derive(Clone, Debug)]
pub struct CubismFadeState {
    /// 层ID
    pub id: usize,
    /// 层名称
    pub name: String,
    playing_motions: Vec<CubismFadePlayingMotion>,
    layer_weight: f32,
    is_state_transition_finished: bool,
    is_default_state: bool,
}

impl CubismFadeState {
    /// 创建新层
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            playing_motions: Vec::new(),
            layer_weight: 1.0,
            is_state_transition_finished: true,
            is_default_state: id == 0,
        }
    }

    /// 进入新的动作状态
    pub fn play_motion(
        &mut self,
        motion: Arc<CubismFadeMotionData>,
        now: f32,
        speed: f32,
        is_looping: bool,
    ) {
        // 旧动作在新动作淡入期间淡出
        let new_end_time = now + motion.fade_in_time();
        for playing in &mut self.playing_motions {
            if !playing.has_end_time() || new_end_time < playing.end_time {
                playing.end_time = new_end_time;
            }
        }

        let speed = speed.max(0.0);
        let end_time = if is_looping || motion.motion_length() <= 0.0 || speed <= 0.0 {
            -1.0
        } else {
            now + motion.motion_length() / speed
        };

        log::debug!(
            "层 {} 进入动作 '{}' (循环={}, 速度={})",
            self.id,
            motion.motion_name(),
            is_looping,
            speed
        );

        self.playing_motions.push(CubismFadePlayingMotion {
            start_time: now,
            end_time,
            fade_in_start_time: now,
            speed,
            is_looping,
            weight: 0.0,
            motion,
        });
        self.is_state_transition_finished = false;
    }

    /// 移除指定动作
    pub fn stop_animation(&mut self, index: usize) -> Option<CubismFadePlayingMotion> {
        if index < self.playing_motions.len() {
            Some(self.playing_motions.remove(index))
        } else {
            None
        }
    }

    /// 清空所有动作
    pub fn stop_all(&mut self) {
        self.playing_motions.clear();
        self.is_state_transition_finished = true;
    }

    /// 更新最新的循环动作
    ///
    /// 结束时间延长到 `now + fade_out_time`，
    /// 起点按整周期前移直到覆盖 `now`。
    pub fn update_looping_motion(&mut self, now: f32) {
        let Some(latest) = self.playing_motions.last_mut() else {
            return;
        };
        if !latest.is_looping {
            return;
        }

        latest.end_time = now + latest.motion.fade_out_time();

        let period = latest.loop_period();
        if period <= 0.0 {
            return;
        }
        if latest.start_time + period >= now {
            return;
        }
        // 一次跳过所有完整周期，落在 (now - period, now] 内
        let steps = ((now - latest.start_time) / period - 1.0).ceil().max(1.0);
        latest.start_time += steps * period;
        if latest.start_time > now {
            latest.start_time = (latest.start_time - period).min(now);
        }
    }

    /// 最新的动作是否仍在淡入
    ///
    /// 动作自身淡入时间或任一参数级淡入时间未结束都算作淡入中。
    /// 只有一个动作时不需要混合，视为未淡入。
    pub fn is_fading(&self, now: f32) -> bool {
        if self.playing_motions.len() <= 1 {
            return false;
        }
        let Some(latest) = self.playing_motions.last() else {
            return false;
        };

        let elapsed = latest.fade_in_elapsed_time(now);
        let motion = &latest.motion;
        if elapsed <= motion.fade_in_time() {
            return true;
        }

        motion
            .parameter_fade_in_times()
            .iter()
            .any(|&fade_in| fade_in >= 0.0 && elapsed <= fade_in)
    }

    /// 移除已结束的动作（从新到旧，至少保留一个）
    pub fn retire_finished_motions(&mut self, now: f32) -> usize {
        let mut removed = 0;
        for index in (0..self.playing_motions.len()).rev() {
            if self.playing_motions.len() <= 1 {
                break;
            }
            if !self.playing_motions[index].is_finished(now) {
                continue;
            }

            let retired = self.playing_motions.remove(index);
            log::debug!("层 {} 移除已结束动作 '{}'", self.id, retired.motion.motion_name());
            removed += 1;
        }
        removed
    }

    pub fn playing_motions(&self) -> &[CubismFadePlayingMotion] {
        &self.playing_motions
    }

    pub fn playing_motions_mut(&mut self) -> &mut [CubismFadePlayingMotion] {
        &mut self.playing_motions
    }

    pub fn latest_motion(&self) -> Option<&CubismFadePlayingMotion> {
        self.playing_motions.last()
    }

    /// 获取层权重
    pub fn layer_weight(&self) -> f32 {
        self.layer_weight
    }

    /// 设置层权重
    pub fn set_layer_weight(&mut self, weight: f32) {
        self.layer_weight = weight.clamp(0.0, 1.0);
    }

    pub fn is_state_transition_finished(&self) -> bool {
        self.is_state_transition_finished
    }

    pub fn set_state_transition_finished(&mut self, finished: bool) {
        self.is_state_transition_finished = finished;
    }

    pub fn is_default_state(&self) -> bool {
        self.is_default_state
    }

    pub fn set_default_state(&mut self, is_default: bool) {
        self.is_default_state = is_default;
    }
}
