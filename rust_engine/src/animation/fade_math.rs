//! 淡入淡出缓动

use std::f32::consts::PI;

/// 正弦缓动
///
/// 输入限制在 [0, 1]，输出为半余弦 S 曲线。
pub fn get_easing_sine(value: f32) -> f32 {
    if value < 0.0 {
        return 0.0;
    }
    if value > 1.0 {
        return 1.0;
    }

    0.5 - 0.5 * (value * PI).cos()
}
