//! 淡入淡出动作数据

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CubismError, Result};

use super::curve::AnimationCurve;

/// 未设置参数级淡入淡出时间
pub const UNSET_FADE_TIME: f32 = -1.0;

/// 单个动作的淡入淡出数据
///
/// 参数 ID、曲线、参数级淡入 / 淡出时间四个数组一一对应，
/// ID 同时用于匹配参数和部件。参数级时间为负表示未设置。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubismFadeMotionData {
    motion_name: String,
    fade_in_time: f32,
    fade_out_time: f32,
    parameter_ids: Vec<String>,
    parameter_curves: Vec<AnimationCurve>,
    parameter_fade_in_times: Vec<f32>,
    parameter_fade_out_times: Vec<f32>,
    motion_length: f32,
}

impl CubismFadeMotionData {
    /// 创建不含曲线的动作
    pub fn new(
        motion_name: impl Into<String>,
        fade_in_time: f32,
        fade_out_time: f32,
        motion_length: f32,
    ) -> Self {
        Self {
            motion_name: motion_name.into(),
            fade_in_time,
            fade_out_time,
            parameter_ids: Vec::new(),
            parameter_curves: Vec::new(),
            parameter_fade_in_times: Vec::new(),
            parameter_fade_out_times: Vec::new(),
            motion_length,
        }
    }

    /// 从并列数组创建，长度不一致时返回错误
    #[allow(clippy::too_many_arguments)]
    pub fn from_arrays(
        motion_name: impl Into<String>,
        fade_in_time: f32,
        fade_out_time: f32,
        parameter_ids: Vec<String>,
        parameter_curves: Vec<AnimationCurve>,
        parameter_fade_in_times: Vec<f32>,
        parameter_fade_out_times: Vec<f32>,
        motion_length: f32,
    ) -> Result<Self> {
        let motion_name = motion_name.into();
        let count = parameter_ids.len();
        if parameter_curves.len() != count
            || parameter_fade_in_times.len() != count
            || parameter_fade_out_times.len() != count
        {
            return Err(CubismError::FadeMotion(format!(
                "motion '{}': {} ids, {} curves, {} fade-in times, {} fade-out times",
                motion_name,
                count,
                parameter_curves.len(),
                parameter_fade_in_times.len(),
                parameter_fade_out_times.len()
            )));
        }

        Ok(Self {
            motion_name,
            fade_in_time,
            fade_out_time,
            parameter_ids,
            parameter_curves,
            parameter_fade_in_times,
            parameter_fade_out_times,
            motion_length,
        })
    }

    /// 添加曲线（不设置参数级淡入淡出）
    pub fn with_curve(self, id: impl Into<String>, curve: AnimationCurve) -> Self {
        self.with_faded_curve(id, curve, UNSET_FADE_TIME, UNSET_FADE_TIME)
    }

    /// 添加带参数级淡入淡出时间的曲线
    pub fn with_faded_curve(
        mut self,
        id: impl Into<String>,
        curve: AnimationCurve,
        fade_in_time: f32,
        fade_out_time: f32,
    ) -> Self {
        self.parameter_ids.push(id.into());
        self.parameter_curves.push(curve);
        self.parameter_fade_in_times.push(fade_in_time);
        self.parameter_fade_out_times.push(fade_out_time);
        self
    }

    /// 查找曲线索引（取第一个匹配）
    pub fn find_curve_index(&self, id: &str) -> Option<usize> {
        self.parameter_ids.iter().position(|p| p == id)
    }

    pub fn motion_name(&self) -> &str {
        &self.motion_name
    }

    pub fn fade_in_time(&self) -> f32 {
        self.fade_in_time
    }

    pub fn fade_out_time(&self) -> f32 {
        self.fade_out_time
    }

    pub fn motion_length(&self) -> f32 {
        self.motion_length
    }

    pub fn parameter_ids(&self) -> &[String] {
        &self.parameter_ids
    }

    pub fn parameter_curves(&self) -> &[AnimationCurve] {
        &self.parameter_curves
    }

    pub fn parameter_fade_in_times(&self) -> &[f32] {
        &self.parameter_fade_in_times
    }

    pub fn parameter_fade_out_times(&self) -> &[f32] {
        &self.parameter_fade_out_times
    }

    pub fn curve_count(&self) -> usize {
        self.parameter_ids.len()
    }
}

/// 动作列表（按名称查找）
#[derive(Clone, Debug, Default)]
pub struct CubismFadeMotionList {
    motions: Vec<Arc<CubismFadeMotionData>>,
    name_to_index: HashMap<String, usize>,
}

impl CubismFadeMotionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加动作，同名动作会被替换
    pub fn add_motion(&mut self, motion: CubismFadeMotionData) -> Arc<CubismFadeMotionData> {
        let motion = Arc::new(motion);
        match self.name_to_index.get(motion.motion_name()) {
            Some(&index) => self.motions[index] = Arc::clone(&motion),
            None => {
                self.name_to_index
                    .insert(motion.motion_name().to_string(), self.motions.len());
                self.motions.push(Arc::clone(&motion));
            }
        }
        motion
    }

    /// 通过名称查找动作
    pub fn find_by_name(&self, name: &str) -> Option<Arc<CubismFadeMotionData>> {
        self.name_to_index
            .get(name)
            .and_then(|&i| self.motions.get(i))
            .cloned()
    }

    pub fn motions(&self) -> &[Arc<CubismFadeMotionData>] {
        &self.motions
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}
