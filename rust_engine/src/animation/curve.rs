//! 关键帧曲线
//!
//! 未加权的区间使用三次 Hermite 插值；任一侧加权时改用三次贝塞尔，
//! 以牛顿法从时间反求参数。

use serde::{Deserialize, Serialize};

/// 切线权重模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightedMode {
    #[default]
    None,
    In,
    Out,
    Both,
}

impl WeightedMode {
    fn is_in_weighted(self) -> bool {
        matches!(self, WeightedMode::In | WeightedMode::Both)
    }

    fn is_out_weighted(self) -> bool {
        matches!(self, WeightedMode::Out | WeightedMode::Both)
    }
}

/// 未加权时的默认切线权重
pub const DEFAULT_TANGENT_WEIGHT: f32 = 1.0 / 3.0;

/// 曲线关键帧
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
    pub in_weight: f32,
    pub out_weight: f32,
    pub weighted_mode: WeightedMode,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
            in_weight: DEFAULT_TANGENT_WEIGHT,
            out_weight: DEFAULT_TANGENT_WEIGHT,
            weighted_mode: WeightedMode::None,
        }
    }

    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }

    pub fn with_weights(mut self, in_weight: f32, out_weight: f32, mode: WeightedMode) -> Self {
        self.in_weight = in_weight;
        self.out_weight = out_weight;
        self.weighted_mode = mode;
        self
    }
}

/// 关键帧曲线
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    keys: Vec<Keyframe>,
}

impl AnimationCurve {
    /// 创建曲线（关键帧按时间排序）
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// 常量曲线
    pub fn constant(start_time: f32, end_time: f32, value: f32) -> Self {
        Self::new(vec![Keyframe::new(start_time, value), Keyframe::new(end_time, value)])
    }

    /// 线性曲线
    pub fn linear(start_time: f32, start_value: f32, end_time: f32, end_value: f32) -> Self {
        let duration = end_time - start_time;
        let tangent = if duration != 0.0 {
            (end_value - start_value) / duration
        } else {
            0.0
        };
        Self::new(vec![
            Keyframe::new(start_time, start_value).with_tangents(tangent, tangent),
            Keyframe::new(end_time, end_value).with_tangents(tangent, tangent),
        ])
    }

    /// 插入关键帧，保持时间顺序
    pub fn add_key(&mut self, key: Keyframe) -> usize {
        let index = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(index, key);
        index
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 最后一个关键帧的时间
    pub fn duration(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// 求值
    ///
    /// 超出首尾关键帧的时间取边界值；空曲线返回 0。
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let index = self.keys.partition_point(|k| k.time <= time);
        evaluate_segment(&self.keys[index - 1], &self.keys[index], time)
    }
}

fn evaluate_segment(left: &Keyframe, right: &Keyframe, time: f32) -> f32 {
    let dt = right.time - left.time;
    if dt <= 0.0 {
        return left.value;
    }

    // 无穷切线表示阶跃
    if !left.out_tangent.is_finite() || !right.in_tangent.is_finite() {
        return left.value;
    }

    let t = (time - left.time) / dt;
    let m0 = left.out_tangent * dt;
    let m1 = right.in_tangent * dt;

    let out_weighted = left.weighted_mode.is_out_weighted();
    let in_weighted = right.weighted_mode.is_in_weighted();
    if !out_weighted && !in_weighted {
        return hermite(t, left.value, m0, right.value, m1);
    }

    let w0 = if out_weighted {
        left.out_weight.clamp(0.0, 1.0)
    } else {
        DEFAULT_TANGENT_WEIGHT
    };
    let w1 = if in_weighted {
        right.in_weight.clamp(0.0, 1.0)
    } else {
        DEFAULT_TANGENT_WEIGHT
    };

    let curve = WeightedSegment {
        x1: w0,
        x2: 1.0 - w1,
        y0: left.value,
        y1: left.value + w0 * m0,
        y2: right.value - w1 * m1,
        y3: right.value,
    };
    curve.evaluate(t)
}

fn hermite(t: f32, p0: f32, m0: f32, p1: f32, m1: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

/// 加权区间（时间已归一化到 [0, 1]）
struct WeightedSegment {
    x1: f32,
    x2: f32,
    y0: f32,
    y1: f32,
    y2: f32,
    y3: f32,
}

impl WeightedSegment {
    fn evaluate(&self, t: f32) -> f32 {
        // 使用牛顿法求解 x(s) = t 的 s 值
        let mut s = t;
        for _ in 0..15 {
            let x = self.bezier_x(s);
            let dx = self.bezier_dx(s);

            if dx.abs() < 1e-6 {
                break;
            }

            let new_s = (s - (x - t) / dx).clamp(0.0, 1.0);
            if (new_s - s).abs() < 1e-6 {
                s = new_s;
                break;
            }
            s = new_s;
        }

        self.bezier_y(s)
    }

    fn bezier_x(&self, s: f32) -> f32 {
        let s2 = s * s;
        let s3 = s2 * s;
        let t = 1.0 - s;
        let t2 = t * t;

        3.0 * t2 * s * self.x1 + 3.0 * t * s2 * self.x2 + s3
    }

    fn bezier_dx(&self, s: f32) -> f32 {
        let s2 = s * s;
        let t = 1.0 - s;

        3.0 * t * t * self.x1 + 6.0 * t * s * (self.x2 - self.x1) + 3.0 * s2 * (1.0 - self.x2)
    }

    fn bezier_y(&self, s: f32) -> f32 {
        let s2 = s * s;
        let s3 = s2 * s;
        let t = 1.0 - s;
        let t2 = t * t;
        let t3 = t2 * t;

        t3 * self.y0 + 3.0 * t2 * s * self.y1 + 3.0 * t * s2 * self.y2 + s3 * self.y3
    }
}
