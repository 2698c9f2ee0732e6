//! 动画系统 - 动作淡入淡出混合
//!
//! 提供关键帧曲线、淡入淡出动作数据、动画层状态与混合控制器。
//! 每个动画层可同时播放多个动作，新动作淡入时旧动作淡出，
//! 混合结果写回模型参数和部件不透明度。

mod curve;
mod fade_controller;
mod fade_math;
mod fade_motion;
mod fade_state;

pub use curve::{AnimationCurve, Keyframe, WeightedMode, DEFAULT_TANGENT_WEIGHT};
pub use fade_controller::{CubismFadeController, CurveFadeTiming, MotionFadeWeights};
pub use fade_math::get_easing_sine;
pub use fade_motion::{CubismFadeMotionData, CubismFadeMotionList, UNSET_FADE_TIME};
pub use fade_state::{CubismFadePlayingMotion, CubismFadeState};
