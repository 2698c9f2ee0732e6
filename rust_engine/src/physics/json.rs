//! physics3.json 解析
//!
//! 只负责把 JSON 转换为物理装配；格式不合法时返回错误，
//! 不会构造出部分可用的装配。

use glam::Vec2;
use serde::Deserialize;

use crate::{CubismError, Result};

use super::config::get_config;
use super::input::{CubismPhysicsInput, CubismPhysicsSourceComponent};
use super::output::CubismPhysicsOutput;
use super::particle::{
    CubismPhysicsNormalization, CubismPhysicsNormalizationTuplet, CubismPhysicsParticle,
};
use super::rig::CubismPhysicsRig;
use super::sub_rig::CubismPhysicsSubRig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableVector2 {
    pub x: f32,
    pub y: f32,
}

impl From<SerializableVector2> for Vec2 {
    fn from(v: SerializableVector2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableEffectiveForces {
    pub gravity: SerializableVector2,
    pub wind: SerializableVector2,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializablePhysicsDictionary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SerializableMeta {
    pub physics_setting_count: usize,
    pub total_input_count: usize,
    pub total_output_count: usize,
    pub vertex_count: usize,
    pub effective_forces: SerializableEffectiveForces,
    pub physics_dictionary: Vec<SerializablePhysicsDictionary>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableParameter {
    pub target: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableInput {
    pub source: SerializableParameter,
    pub weight: f32,
    #[serde(rename = "Type")]
    pub component: String,
    pub reflect: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableOutput {
    pub destination: SerializableParameter,
    pub vertex_index: usize,
    pub scale: f32,
    pub weight: f32,
    #[serde(rename = "Type")]
    pub component: String,
    pub reflect: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableVertex {
    pub position: SerializableVector2,
    pub mobility: f32,
    pub delay: f32,
    pub acceleration: f32,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableNormalizationValue {
    pub minimum: f32,
    pub default: f32,
    pub maximum: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializableNormalization {
    pub position: SerializableNormalizationValue,
    pub angle: SerializableNormalizationValue,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerializablePhysicsSettings {
    pub id: String,
    #[serde(default)]
    pub input: Vec<SerializableInput>,
    #[serde(default)]
    pub output: Vec<SerializableOutput>,
    pub vertices: Vec<SerializableVertex>,
    pub normalization: SerializableNormalization,
}

/// physics3.json 文件
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CubismPhysics3Json {
    pub version: u32,
    #[serde(default)]
    pub meta: SerializableMeta,
    pub physics_settings: Vec<SerializablePhysicsSettings>,
}

fn parse_component(value: &str) -> Result<CubismPhysicsSourceComponent> {
    match value {
        "X" => Ok(CubismPhysicsSourceComponent::X),
        "Y" => Ok(CubismPhysicsSourceComponent::Y),
        "Angle" => Ok(CubismPhysicsSourceComponent::Angle),
        other => Err(CubismError::PhysicsJson(format!(
            "unknown component type '{}'",
            other
        ))),
    }
}

impl From<SerializableNormalizationValue> for CubismPhysicsNormalizationTuplet {
    fn from(v: SerializableNormalizationValue) -> Self {
        CubismPhysicsNormalizationTuplet::new(v.minimum, v.default, v.maximum)
    }
}

impl CubismPhysics3Json {
    /// 解析 JSON 文本
    pub fn parse(json: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(json)?;
        Ok(parsed)
    }

    /// 转换为物理装配（未初始化）
    pub fn to_rig(&self) -> Result<CubismPhysicsRig> {
        let mut rig = CubismPhysicsRig::with_config(get_config());
        rig.gravity = self.meta.effective_forces.gravity.into();
        rig.wind = self.meta.effective_forces.wind.into();

        for setting in &self.physics_settings {
            rig.add_sub_rig(Self::to_sub_rig(setting)?);
        }

        if rig.config().debug_log {
            log::info!(
                "physics3.json 解析完成: {} 条子物理链, {} 个粒子",
                rig.sub_rig_count(),
                rig.particle_count()
            );
        }

        Ok(rig)
    }

    fn to_sub_rig(setting: &SerializablePhysicsSettings) -> Result<CubismPhysicsSubRig> {
        if setting.vertices.is_empty() {
            return Err(CubismError::PhysicsJson(format!(
                "physics setting '{}' has no vertices",
                setting.id
            )));
        }

        let mut sub_rig = CubismPhysicsSubRig::new(setting.id.clone());

        for input in &setting.input {
            sub_rig.inputs.push(CubismPhysicsInput::new(
                input.source.id.clone(),
                input.weight,
                parse_component(&input.component)?,
                input.reflect,
            ));
        }

        for output in &setting.output {
            sub_rig.outputs.push(
                CubismPhysicsOutput::new(
                    output.destination.id.clone(),
                    output.vertex_index,
                    parse_component(&output.component)?,
                    output.weight,
                    output.reflect,
                )
                .with_scale(output.scale),
            );
        }

        sub_rig.particles = setting
            .vertices
            .iter()
            .map(|v| {
                CubismPhysicsParticle::new(v.mobility, v.delay, v.acceleration, v.radius)
                    .with_initial_position(v.position.into())
            })
            .collect();

        sub_rig.normalization = Some(CubismPhysicsNormalization {
            position: setting.normalization.position.into(),
            angle: setting.normalization.angle.into(),
        });

        Ok(sub_rig)
    }
}

impl CubismPhysicsRig {
    /// 从 physics3.json 文本创建物理装配（未初始化）
    pub fn from_json(json: &str) -> Result<Self> {
        CubismPhysics3Json::parse(json)?.to_rig()
    }
}
