//! 物理输入
//!
//! 把模型参数转换为子物理链的平移 / 角度输入。

use glam::Vec2;

use crate::model::parameter::resolve_cached;
use crate::model::CubismParameter;

use super::math::normalize;
use super::particle::CubismPhysicsNormalization;

/// 输入 / 输出作用的分量
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubismPhysicsSourceComponent {
    X,
    Y,
    Angle,
}

/// 归一化取值函数
///
/// 把参数值累加到平移或角度上，返回限制后的参数值。
pub type NormalizedParameterValueGetter = fn(
    target_translation: &mut Vec2,
    target_angle: &mut f32,
    parameter: &CubismParameter,
    normalization: &CubismPhysicsNormalization,
    weight: f32,
    is_inverted: bool,
) -> f32;

fn get_input_translation_x_from_normalized_parameter_value(
    target_translation: &mut Vec2,
    _target_angle: &mut f32,
    parameter: &CubismParameter,
    normalization: &CubismPhysicsNormalization,
    weight: f32,
    is_inverted: bool,
) -> f32 {
    let position = &normalization.position;
    let result = normalize(
        parameter,
        parameter.value,
        position.minimum,
        position.maximum,
        position.default,
        is_inverted,
    );
    target_translation.x += result.normalized * weight;
    result.clamped
}

fn get_input_translation_y_from_normalized_parameter_value(
    target_translation: &mut Vec2,
    _target_angle: &mut f32,
    parameter: &CubismParameter,
    normalization: &CubismPhysicsNormalization,
    weight: f32,
    is_inverted: bool,
) -> f32 {
    let position = &normalization.position;
    let result = normalize(
        parameter,
        parameter.value,
        position.minimum,
        position.maximum,
        position.default,
        is_inverted,
    );
    target_translation.y += result.normalized * weight;
    result.clamped
}

fn get_input_angle_from_normalized_parameter_value(
    _target_translation: &mut Vec2,
    target_angle: &mut f32,
    parameter: &CubismParameter,
    normalization: &CubismPhysicsNormalization,
    weight: f32,
    is_inverted: bool,
) -> f32 {
    let angle = &normalization.angle;
    let result = normalize(
        parameter,
        parameter.value,
        angle.minimum,
        angle.maximum,
        angle.default,
        is_inverted,
    );
    *target_angle += result.normalized * weight;
    result.clamped
}

/// 物理输入
#[derive(Clone, Debug)]
pub struct CubismPhysicsInput {
    /// 源参数 ID
    pub source_id: String,
    /// 权重（0 - 100）
    pub weight: f32,
    /// 作用分量
    pub source_component: CubismPhysicsSourceComponent,
    /// 是否反转
    pub is_inverted: bool,
    /// 源参数索引缓存
    source: Option<usize>,
    get_normalized_parameter_value: Option<NormalizedParameterValueGetter>,
}

impl CubismPhysicsInput {
    pub fn new(
        source_id: impl Into<String>,
        weight: f32,
        source_component: CubismPhysicsSourceComponent,
        is_inverted: bool,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            weight,
            source_component,
            is_inverted,
            source: None,
            get_normalized_parameter_value: None,
        }
    }

    /// 按分量绑定取值函数
    pub fn initialize_getter(&mut self) {
        let getter: NormalizedParameterValueGetter = match self.source_component {
            CubismPhysicsSourceComponent::X => {
                get_input_translation_x_from_normalized_parameter_value
            }
            CubismPhysicsSourceComponent::Y => {
                get_input_translation_y_from_normalized_parameter_value
            }
            CubismPhysicsSourceComponent::Angle => get_input_angle_from_normalized_parameter_value,
        };
        self.get_normalized_parameter_value = Some(getter);
    }

    /// 是否已绑定取值函数
    pub fn is_initialized(&self) -> bool {
        self.get_normalized_parameter_value.is_some()
    }

    /// 解析源参数（首次命中后缓存）
    pub fn resolve_source(&mut self, parameters: &[CubismParameter]) -> Option<usize> {
        resolve_cached(&mut self.source, parameters, &self.source_id)
    }

    /// 已缓存的源参数索引
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// 累加输入，返回限制后的参数值
    ///
    /// 取值函数未绑定时返回 `None`，本帧跳过该输入。
    pub fn accumulate(
        &self,
        target_translation: &mut Vec2,
        target_angle: &mut f32,
        parameter: &CubismParameter,
        normalization: &CubismPhysicsNormalization,
        weight: f32,
    ) -> Option<f32> {
        let getter = self.get_normalized_parameter_value?;
        Some(getter(
            target_translation,
            target_angle,
            parameter,
            normalization,
            weight,
            self.is_inverted,
        ))
    }
}
