//! 物理粒子与归一化数据

use glam::Vec2;

/// 物理链上的单个粒子
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CubismPhysicsParticle {
    /// 初始位置（初始化时计算）
    pub initial_position: Vec2,
    /// 移动性
    pub mobility: f32,
    /// 延迟
    pub delay: f32,
    /// 加速度
    pub acceleration: f32,
    /// 与前一个粒子的距离
    pub radius: f32,

    // 运行时状态
    pub position: Vec2,
    pub last_position: Vec2,
    pub last_gravity: Vec2,
    pub force: Vec2,
    pub velocity: Vec2,
}

impl CubismPhysicsParticle {
    pub fn new(mobility: f32, delay: f32, acceleration: f32, radius: f32) -> Self {
        Self {
            mobility,
            delay,
            acceleration,
            radius,
            ..Default::default()
        }
    }

    pub fn with_initial_position(mut self, position: Vec2) -> Self {
        self.initial_position = position;
        self.position = position;
        self.last_position = position;
        self
    }
}

/// 归一化区间（最小、默认、最大）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CubismPhysicsNormalizationTuplet {
    pub minimum: f32,
    pub maximum: f32,
    pub default: f32,
}

impl CubismPhysicsNormalizationTuplet {
    pub fn new(minimum: f32, default: f32, maximum: f32) -> Self {
        Self {
            minimum,
            maximum,
            default,
        }
    }
}

/// 子物理链的归一化设置
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CubismPhysicsNormalization {
    pub position: CubismPhysicsNormalizationTuplet,
    pub angle: CubismPhysicsNormalizationTuplet,
}
