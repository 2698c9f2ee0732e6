//! 物理数学工具
//!
//! 归一化、角度与方向换算。

use std::f32::consts::PI;

use glam::Vec2;

use crate::model::CubismParameter;

/// 归一化结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedValue {
    /// 归一化后的值（已按 `is_inverted` 处理符号）
    pub normalized: f32,
    /// 限制到参数范围内的原始值，需要写回参数
    pub clamped: f32,
}

/// 角度转弧度
pub fn degrees_to_radian(degrees: f32) -> f32 {
    degrees / 180.0 * PI
}

/// 弧度转角度
pub fn radian_to_degrees(radian: f32) -> f32 {
    radian * 180.0 / PI
}

/// 弧度转方向向量
///
/// 0 弧度对应 (0, 1)。
pub fn radian_to_direction(total_angle: f32) -> Vec2 {
    Vec2::new(total_angle.sin(), total_angle.cos())
}

/// 两个方向之间的夹角，范围 (-π, π]
pub fn direction_to_radian(from: Vec2, to: Vec2) -> f32 {
    let q1 = to.y.atan2(to.x);
    let q2 = from.y.atan2(from.x);
    get_angle_diff(q1, q2)
}

/// 角度差，按 2π 折回 (-π, π]
fn get_angle_diff(q1: f32, q2: f32) -> f32 {
    let mut ret = q1 - q2;

    while ret < -PI {
        ret += PI * 2.0;
    }
    while ret > PI {
        ret -= PI * 2.0;
    }

    ret
}

/// 区间中点
fn get_default_value(min: f32, max: f32) -> f32 {
    min + (max - min) / 2.0
}

/// 把参数值映射到归一化区间
///
/// 以参数范围中点为界，正负两侧分别线性缩放到
/// `[normalized_default, normalized_maximum]` / `[normalized_minimum, normalized_default]`。
/// 某侧参数长度为 0 时结果为 0（不加默认值）。
/// 未反转时结果取负。
pub fn normalize(
    parameter: &CubismParameter,
    parameter_value: f32,
    normalized_minimum: f32,
    normalized_maximum: f32,
    normalized_default: f32,
    is_inverted: bool,
) -> NormalizedValue {
    let max_value = parameter.maximum_value.max(parameter.minimum_value);
    let min_value = parameter.maximum_value.min(parameter.minimum_value);
    let clamped = parameter_value.clamp(min_value, max_value);

    let min_norm_value = normalized_minimum.min(normalized_maximum);
    let max_norm_value = normalized_minimum.max(normalized_maximum);
    let middle_norm_value = normalized_default;

    let middle_value = get_default_value(min_value, max_value);
    let param_value = clamped - middle_value;

    let mut result = 0.0;
    if param_value > 0.0 {
        let n_length = max_norm_value - middle_norm_value;
        let p_length = max_value - middle_value;
        if p_length != 0.0 {
            result = param_value * (n_length / p_length) + middle_norm_value;
        }
    } else if param_value < 0.0 {
        let n_length = min_norm_value - middle_norm_value;
        let p_length = min_value - middle_value;
        if p_length != 0.0 {
            result = param_value * (n_length / p_length) + middle_norm_value;
        }
    } else {
        result = middle_norm_value;
    }

    NormalizedValue {
        normalized: if is_inverted { result } else { -result },
        clamped,
    }
}
