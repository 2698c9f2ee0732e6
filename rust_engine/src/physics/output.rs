//! 物理输出
//!
//! 把粒子链状态转换回模型参数。

use glam::Vec2;

use crate::model::parameter::resolve_cached;
use crate::model::CubismParameter;

use super::input::CubismPhysicsSourceComponent;
use super::math::direction_to_radian;
use super::particle::CubismPhysicsParticle;

/// 输出取值函数
pub type OutputValueGetter = fn(
    translation: Vec2,
    particles: &[CubismPhysicsParticle],
    particle_index: usize,
    gravity: Vec2,
    use_angle_correction: bool,
    is_inverted: bool,
) -> f32;

/// 输出缩放函数
pub type OutputScaleGetter = fn(translation_scale: Vec2, angle_scale: f32) -> f32;

fn get_output_translation_x(
    translation: Vec2,
    _particles: &[CubismPhysicsParticle],
    _particle_index: usize,
    _gravity: Vec2,
    _use_angle_correction: bool,
    is_inverted: bool,
) -> f32 {
    if is_inverted {
        -translation.x
    } else {
        translation.x
    }
}

fn get_output_translation_y(
    translation: Vec2,
    _particles: &[CubismPhysicsParticle],
    _particle_index: usize,
    _gravity: Vec2,
    _use_angle_correction: bool,
    is_inverted: bool,
) -> f32 {
    if is_inverted {
        -translation.y
    } else {
        translation.y
    }
}

fn get_output_angle(
    translation: Vec2,
    particles: &[CubismPhysicsParticle],
    particle_index: usize,
    gravity: Vec2,
    use_angle_correction: bool,
    is_inverted: bool,
) -> f32 {
    let previous_segment = match particle_index.checked_sub(2) {
        Some(grandparent) if use_angle_correction => particles
            .get(grandparent)
            .zip(particles.get(grandparent + 1))
            .map(|(grandparent, parent)| parent.position - grandparent.position),
        _ => None,
    };
    // 缺少上一段时退回到翻转后的重力方向
    let parent_gravity = previous_segment.unwrap_or(Vec2::new(gravity.x, -gravity.y));

    let value = direction_to_radian(parent_gravity, translation);
    if is_inverted {
        -value
    } else {
        value
    }
}

fn get_output_scale_translation_x(translation_scale: Vec2, _angle_scale: f32) -> f32 {
    translation_scale.x
}

fn get_output_scale_translation_y(translation_scale: Vec2, _angle_scale: f32) -> f32 {
    translation_scale.y
}

fn get_output_scale_angle(_translation_scale: Vec2, angle_scale: f32) -> f32 {
    angle_scale
}

/// 物理输出
#[derive(Clone, Debug)]
pub struct CubismPhysicsOutput {
    /// 目标参数 ID
    pub destination_id: String,
    /// 对应粒子索引（有效范围 [1, 粒子数)）
    pub particle_index: usize,
    /// 平移缩放
    pub translation_scale: Vec2,
    /// 角度缩放
    pub angle_scale: f32,
    /// 权重（0 - 100）
    pub weight: f32,
    /// 作用分量
    pub source_component: CubismPhysicsSourceComponent,
    /// 是否反转
    pub is_inverted: bool,
    /// 低于最小值的最远值（诊断用，不会自动重置）
    pub value_below_minimum: f32,
    /// 超出最大值的最远值（诊断用，不会自动重置）
    pub value_exceeded_maximum: f32,
    /// 目标参数索引缓存
    destination: Option<usize>,
    get_value: Option<OutputValueGetter>,
    get_scale: Option<OutputScaleGetter>,
}

impl CubismPhysicsOutput {
    pub fn new(
        destination_id: impl Into<String>,
        particle_index: usize,
        source_component: CubismPhysicsSourceComponent,
        weight: f32,
        is_inverted: bool,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            particle_index,
            translation_scale: Vec2::ZERO,
            angle_scale: 0.0,
            weight,
            source_component,
            is_inverted,
            value_below_minimum: 0.0,
            value_exceeded_maximum: 0.0,
            destination: None,
            get_value: None,
            get_scale: None,
        }
    }

    /// 按分量设置缩放
    pub fn with_scale(mut self, scale: f32) -> Self {
        match self.source_component {
            CubismPhysicsSourceComponent::X => self.translation_scale.x = scale,
            CubismPhysicsSourceComponent::Y => self.translation_scale.y = scale,
            CubismPhysicsSourceComponent::Angle => self.angle_scale = scale,
        }
        self
    }

    /// 按分量绑定取值与缩放函数
    pub fn initialize_getter(&mut self) {
        let (get_value, get_scale): (OutputValueGetter, OutputScaleGetter) =
            match self.source_component {
                CubismPhysicsSourceComponent::X => {
                    (get_output_translation_x, get_output_scale_translation_x)
                }
                CubismPhysicsSourceComponent::Y => {
                    (get_output_translation_y, get_output_scale_translation_y)
                }
                CubismPhysicsSourceComponent::Angle => (get_output_angle, get_output_scale_angle),
            };
        self.get_value = Some(get_value);
        self.get_scale = Some(get_scale);
    }

    pub fn is_initialized(&self) -> bool {
        self.get_value.is_some() && self.get_scale.is_some()
    }

    /// 解析目标参数（首次命中后缓存）
    pub fn resolve_destination(&mut self, parameters: &[CubismParameter]) -> Option<usize> {
        resolve_cached(&mut self.destination, parameters, &self.destination_id)
    }

    /// 已缓存的目标参数索引
    pub fn destination(&self) -> Option<usize> {
        self.destination
    }

    /// 计算输出值（未初始化时返回 `None`）
    pub fn get_value(
        &self,
        translation: Vec2,
        particles: &[CubismPhysicsParticle],
        gravity: Vec2,
        use_angle_correction: bool,
    ) -> Option<f32> {
        let getter = self.get_value?;
        Some(getter(
            translation,
            particles,
            self.particle_index,
            gravity,
            use_angle_correction,
            self.is_inverted,
        ))
    }

    /// 当前分量的缩放（未初始化时返回 `None`）
    pub fn get_scale(&self) -> Option<f32> {
        let getter = self.get_scale?;
        Some(getter(self.translation_scale, self.angle_scale))
    }

    /// 把输出值写入目标参数
    ///
    /// 缩放后限制到参数范围并记录越界值，再按 `weight / maximum_weight` 混合。
    /// 权重 ≥ 1 时直接覆盖。
    pub fn update_output_parameter_value(
        &mut self,
        parameter: &mut CubismParameter,
        translation: f32,
        maximum_weight: f32,
    ) {
        let Some(output_scale) = self.get_scale() else {
            return;
        };

        let mut value = translation * output_scale;

        if value < parameter.minimum_value {
            if value < self.value_below_minimum {
                self.value_below_minimum = value;
            }
            value = parameter.minimum_value;
        } else if value > parameter.maximum_value {
            if value > self.value_exceeded_maximum {
                self.value_exceeded_maximum = value;
            }
            value = parameter.maximum_value;
        }

        let weight = self.weight / maximum_weight;
        if weight >= 1.0 {
            parameter.value = value;
        } else {
            parameter.value = parameter.value * (1.0 - weight) + value * weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn chain(positions: &[Vec2]) -> Vec<CubismPhysicsParticle> {
        positions
            .iter()
            .map(|p| CubismPhysicsParticle::default().with_initial_position(*p))
            .collect()
    }

    #[test]
    fn test_full_weight_replaces_value() {
        let mut output =
            CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::X, 100.0, false)
                .with_scale(2.0);
        output.initialize_getter();
        let mut parameter = CubismParameter::new("P", -10.0, 10.0, 0.0).with_value(-7.0);

        output.update_output_parameter_value(&mut parameter, 1.5, 100.0);
        assert_eq!(parameter.value, 3.0);
    }

    #[test]
    fn test_partial_weight_interpolates() {
        let mut output =
            CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::Y, 25.0, false)
                .with_scale(1.0);
        output.initialize_getter();
        let mut parameter = CubismParameter::new("P", -10.0, 10.0, 0.0).with_value(4.0);

        output.update_output_parameter_value(&mut parameter, 8.0, 100.0);
        assert!((parameter.value - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_tracks_breaches() {
        let mut output =
            CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::Angle, 100.0, false)
                .with_scale(10.0);
        output.initialize_getter();
        let mut parameter = CubismParameter::new("P", -1.0, 1.0, 0.0);

        output.update_output_parameter_value(&mut parameter, 0.5, 100.0);
        assert_eq!(parameter.value, 1.0);
        assert_eq!(output.value_exceeded_maximum, 5.0);

        output.update_output_parameter_value(&mut parameter, 0.2, 100.0);
        assert_eq!(output.value_exceeded_maximum, 5.0);

        output.update_output_parameter_value(&mut parameter, -0.3, 100.0);
        assert_eq!(parameter.value, -1.0);
        assert_eq!(output.value_below_minimum, -3.0);
        assert_eq!(output.value_exceeded_maximum, 5.0);
    }

    #[test]
    fn test_uninitialized_output_leaves_parameter() {
        let mut output =
            CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::X, 100.0, false);
        let mut parameter = CubismParameter::new("P", -10.0, 10.0, 0.0).with_value(2.0);
        output.update_output_parameter_value(&mut parameter, 5.0, 100.0);
        assert_eq!(parameter.value, 2.0);
        assert!(output.get_value(Vec2::ONE, &[], Vec2::ZERO, true).is_none());
    }

    #[test]
    fn test_translation_outputs_respect_inversion() {
        let mut x = CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::X, 100.0, true);
        let mut y = CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::Y, 100.0, false);
        x.initialize_getter();
        y.initialize_getter();
        let particles = chain(&[Vec2::ZERO, Vec2::new(0.5, 1.0)]);
        let translation = Vec2::new(0.5, 1.0);

        let gravity = Vec2::new(0.0, -1.0);

        assert_eq!(x.get_value(translation, &particles, gravity, true), Some(-0.5));
        assert_eq!(y.get_value(translation, &particles, gravity, true), Some(1.0));
    }

    #[test]
    fn test_angle_uses_rig_gravity_for_first_segment() {
        let mut output =
            CubismPhysicsOutput::new("P", 1, CubismPhysicsSourceComponent::Angle, 100.0, false);
        output.initialize_getter();
        let particles = chain(&[Vec2::ZERO, Vec2::new(1.0, 0.0)]);

        // 重力 (0, -1) 翻转后为 (0, 1)，到 (1, 0) 为 -90°
        let value = output
            .get_value(Vec2::new(1.0, 0.0), &particles, Vec2::new(0.0, -1.0), true)
            .unwrap();
        assert!((value + PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_angle_correction_uses_previous_segment() {
        let mut output =
            CubismPhysicsOutput::new("P", 2, CubismPhysicsSourceComponent::Angle, 100.0, false);
        output.initialize_getter();
        let particles = chain(&[Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]);
        let translation = particles[2].position - particles[1].position;

        let corrected = output
            .get_value(translation, &particles, Vec2::new(0.0, -1.0), true)
            .unwrap();
        assert!((corrected - PI / 2.0).abs() < 1e-5);

        let uncorrected = output
            .get_value(translation, &particles, Vec2::new(0.0, -1.0), false)
            .unwrap();
        assert!(uncorrected.abs() < 1e-5);
    }

    #[test]
    fn test_angle_with_short_slice_falls_back_to_gravity() {
        let mut output =
            CubismPhysicsOutput::new("P", 2, CubismPhysicsSourceComponent::Angle, 100.0, false);
        output.initialize_getter();
        let particles = chain(&[Vec2::ZERO]);

        // 缺少上一段，和未校正时一样使用翻转后的重力
        let corrected = output
            .get_value(Vec2::new(1.0, 0.0), &particles, Vec2::new(0.0, -1.0), true)
            .unwrap();
        let uncorrected = output
            .get_value(Vec2::new(1.0, 0.0), &particles, Vec2::new(0.0, -1.0), false)
            .unwrap();
        assert_eq!(corrected, uncorrected);
        assert!((corrected + PI / 2.0).abs() < 1e-5);
    }
}
