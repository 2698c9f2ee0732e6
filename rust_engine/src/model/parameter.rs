//! 参数 / 部件存储
//!
//! 模型参数与部件不透明度按 ID 存放，物理与淡入淡出子系统只保存索引，
//! 不持有引用。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 模型参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubismParameter {
    pub id: String,
    pub value: f32,
    pub minimum_value: f32,
    pub maximum_value: f32,
    pub default_value: f32,
}

impl CubismParameter {
    pub fn new(
        id: impl Into<String>,
        minimum_value: f32,
        maximum_value: f32,
        default_value: f32,
    ) -> Self {
        Self {
            id: id.into(),
            value: default_value,
            minimum_value,
            maximum_value,
            default_value,
        }
    }

    /// 设置当前值（不做范围限制，由调用方负责）
    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }

    /// 恢复默认值
    pub fn reset(&mut self) {
        self.value = self.default_value;
    }
}

/// 模型部件
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubismPart {
    pub id: String,
    pub opacity: f32,
}

impl CubismPart {
    pub fn new(id: impl Into<String>, opacity: f32) -> Self {
        Self {
            id: id.into(),
            opacity,
        }
    }
}

/// 按 ID 查找参数索引
pub fn find_by_id(parameters: &[CubismParameter], id: &str) -> Option<usize> {
    parameters.iter().position(|p| p.id == id)
}

/// 按 ID 查找部件索引
pub fn find_part_by_id(parts: &[CubismPart], id: &str) -> Option<usize> {
    parts.iter().position(|p| p.id == id)
}

/// 解析并缓存索引
///
/// 缓存的索引仍指向同一 ID 时直接复用，否则重新查找。
pub(crate) fn resolve_cached(
    cache: &mut Option<usize>,
    parameters: &[CubismParameter],
    id: &str,
) -> Option<usize> {
    if let Some(index) = *cache {
        if parameters.get(index).is_some_and(|p| p.id == id) {
            return Some(index);
        }
    }
    *cache = find_by_id(parameters, id);
    *cache
}

/// 参数存储
///
/// 持有模型的全部参数和部件，并保存一份基准快照，
/// 供淡入淡出混合前恢复到动画影响之前的状态。
#[derive(Clone, Debug)]
pub struct CubismParameterStore {
    parameters: Vec<CubismParameter>,
    parts: Vec<CubismPart>,
    parameter_index: HashMap<String, usize>,
    part_index: HashMap<String, usize>,
    saved_parameter_values: Vec<f32>,
    saved_part_opacities: Vec<f32>,
}

impl CubismParameterStore {
    pub fn new(parameters: Vec<CubismParameter>, parts: Vec<CubismPart>) -> Self {
        let parameter_index = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let part_index = parts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        let mut store = Self {
            parameters,
            parts,
            parameter_index,
            part_index,
            saved_parameter_values: Vec::new(),
            saved_part_opacities: Vec::new(),
        };
        store.save_parameters();
        store
    }

    /// 保存当前值为基准快照
    pub fn save_parameters(&mut self) {
        self.saved_parameter_values = self.parameters.iter().map(|p| p.value).collect();
        self.saved_part_opacities = self.parts.iter().map(|p| p.opacity).collect();
    }

    /// 恢复到基准快照
    pub fn restore_parameters(&mut self) {
        for (parameter, value) in self.parameters.iter_mut().zip(&self.saved_parameter_values) {
            parameter.value = *value;
        }
        for (part, opacity) in self.parts.iter_mut().zip(&self.saved_part_opacities) {
            part.opacity = *opacity;
        }
    }

    /// 通过 ID 查找参数
    pub fn find_parameter(&self, id: &str) -> Option<usize> {
        self.parameter_index.get(id).copied()
    }

    /// 通过 ID 查找部件
    pub fn find_part(&self, id: &str) -> Option<usize> {
        self.part_index.get(id).copied()
    }

    pub fn parameter(&self, id: &str) -> Option<&CubismParameter> {
        self.find_parameter(id).and_then(|i| self.parameters.get(i))
    }

    pub fn parameter_mut(&mut self, id: &str) -> Option<&mut CubismParameter> {
        let index = self.find_parameter(id)?;
        self.parameters.get_mut(index)
    }

    pub fn part(&self, id: &str) -> Option<&CubismPart> {
        self.find_part(id).and_then(|i| self.parts.get(i))
    }

    pub fn part_mut(&mut self, id: &str) -> Option<&mut CubismPart> {
        let index = self.find_part(id)?;
        self.parts.get_mut(index)
    }

    /// 设置参数值（找不到时忽略）
    pub fn set_parameter_value(&mut self, id: &str, value: f32) {
        if let Some(parameter) = self.parameter_mut(id) {
            parameter.value = value;
        }
    }

    /// 同时设置当前值和基准快照中的值（找不到时忽略）
    pub fn set_baseline_value(&mut self, id: &str, value: f32) {
        let Some(index) = self.find_parameter(id) else {
            return;
        };
        self.parameters[index].value = value;
        if let Some(saved) = self.saved_parameter_values.get_mut(index) {
            *saved = value;
        }
    }

    pub fn parameters(&self) -> &[CubismParameter] {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut [CubismParameter] {
        &mut self.parameters
    }

    pub fn parts(&self) -> &[CubismPart] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [CubismPart] {
        &mut self.parts
    }

    /// 同时借出参数和部件
    pub fn split_mut(&mut self) -> (&mut [CubismParameter], &mut [CubismPart]) {
        (&mut self.parameters, &mut self.parts)
    }

    /// 所有参数恢复默认值
    pub fn reset_all(&mut self) {
        for parameter in &mut self.parameters {
            parameter.reset();
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

impl Default for CubismParameterStore {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
