//! 子物理链
//!
//! 一条独立求值的粒子链，拥有自己的输入、输出和归一化设置。
//! 重力、风和参数列表由上层在求值时传入，不保存反向引用。

use glam::Vec2;

use crate::model::CubismParameter;

use super::config::PhysicsConfig;
use super::input::CubismPhysicsInput;
use super::math::{degrees_to_radian, direction_to_radian, radian_to_direction};
use super::output::CubismPhysicsOutput;
use super::particle::{CubismPhysicsNormalization, CubismPhysicsParticle};

/// 物理链共享的外力
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubismPhysicsEnvironment {
    pub gravity: Vec2,
    pub wind: Vec2,
}

impl Default for CubismPhysicsEnvironment {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -1.0),
            wind: Vec2::ZERO,
        }
    }
}

/// 子物理链
#[derive(Clone, Debug, Default)]
pub struct CubismPhysicsSubRig {
    /// 设置 ID（physics3.json 中的 `Id`）
    pub id: String,
    pub inputs: Vec<CubismPhysicsInput>,
    pub outputs: Vec<CubismPhysicsOutput>,
    pub particles: Vec<CubismPhysicsParticle>,
    pub normalization: Option<CubismPhysicsNormalization>,
}

impl CubismPhysicsSubRig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 初始化粒子链并绑定输入输出函数
    ///
    /// 粒子 0 位于原点，之后每个粒子位于前一个粒子 +Y 方向 `radius` 处。
    pub fn initialize(&mut self, gravity: Vec2) {
        let last_gravity = Vec2::new(gravity.x, -gravity.y);

        if let Some(first) = self.particles.first_mut() {
            first.initial_position = Vec2::ZERO;
            first.position = Vec2::ZERO;
            first.last_position = Vec2::ZERO;
            first.last_gravity = last_gravity;
            first.velocity = Vec2::ZERO;
            first.force = Vec2::ZERO;
        }

        for i in 1..self.particles.len() {
            let previous = self.particles[i - 1].initial_position;
            let particle = &mut self.particles[i];

            particle.initial_position = previous + Vec2::new(0.0, particle.radius);
            particle.position = particle.initial_position;
            particle.last_position = particle.initial_position;
            particle.last_gravity = last_gravity;
            particle.velocity = Vec2::ZERO;
            particle.force = Vec2::ZERO;
        }

        for input in &mut self.inputs {
            input.initialize_getter();
        }
        for output in &mut self.outputs {
            output.initialize_getter();
        }
    }

    /// 推进一帧
    pub fn evaluate(
        &mut self,
        parameters: &mut [CubismParameter],
        environment: &CubismPhysicsEnvironment,
        config: &PhysicsConfig,
        delta_time: f32,
    ) {
        let Some(normalization) = self.normalization else {
            log::warn!("子物理链 '{}' 缺少归一化设置，跳过", self.id);
            return;
        };
        if self.particles.is_empty() {
            log::debug!("子物理链 '{}' 没有粒子，跳过", self.id);
            return;
        }

        let mut total_translation = Vec2::ZERO;
        let mut total_angle = 0.0_f32;

        for input in &mut self.inputs {
            let weight = input.weight / config.maximum_weight;

            let Some(index) = input.resolve_source(parameters) else {
                log::debug!("物理输入参数未找到: {}", input.source_id);
                continue;
            };
            let parameter = &mut parameters[index];

            if let Some(clamped) = input.accumulate(
                &mut total_translation,
                &mut total_angle,
                parameter,
                &normalization,
                weight,
            ) {
                parameter.value = clamped;
            }
        }

        // 角度输入折算为平移（y 使用已旋转的 x）
        let (sin, cos) = degrees_to_radian(-total_angle).sin_cos();
        total_translation.x = total_translation.x * cos - total_translation.y * sin;
        total_translation.y = total_translation.x * sin + total_translation.y * cos;

        Self::update_particles(
            &mut self.particles,
            total_translation,
            total_angle,
            environment.wind,
            config.movement_threshold * normalization.position.maximum,
            delta_time,
            config,
        );

        let particle_count = self.particles.len();
        for output in self.outputs.iter_mut() {
            let particle_index = output.particle_index;

            // 越界即结束整个输出处理，后续输出本帧都不更新。
            // 可能原意是 continue，这里保持与编辑器运行时一致。
            if particle_index < 1 || particle_index >= particle_count {
                break;
            }

            let Some(index) = output.resolve_destination(parameters) else {
                log::debug!("物理输出参数未找到: {}", output.destination_id);
                continue;
            };

            let translation = self.particles[particle_index].position
                - self.particles[particle_index - 1].position;

            let Some(value) = output.get_value(
                translation,
                &self.particles,
                environment.gravity,
                config.use_angle_correction,
            ) else {
                continue;
            };

            output.update_output_parameter_value(
                &mut parameters[index],
                value,
                config.maximum_weight,
            );
        }
    }

    /// 粒子积分
    ///
    /// 粒子 0 固定在 `total_translation`，其余粒子在重力、风和延迟作用下移动，
    /// 最后被拉回到距前一个粒子恰好 `radius` 的位置。
    pub fn update_particles(
        strand: &mut [CubismPhysicsParticle],
        total_translation: Vec2,
        total_angle: f32,
        wind: Vec2,
        threshold_value: f32,
        delta_time: f32,
        config: &PhysicsConfig,
    ) {
        let Some(first) = strand.first_mut() else {
            return;
        };
        first.position = total_translation;

        let total_radian = degrees_to_radian(total_angle);
        let current_gravity = radian_to_direction(total_radian).normalize_or_zero();

        for i in 1..strand.len() {
            let previous_position = strand[i - 1].position;
            let particle = &mut strand[i];

            particle.force = current_gravity * particle.acceleration + wind;
            particle.last_position = particle.position;

            let delay = particle.delay * delta_time * config.simulation_fps;

            let mut direction = particle.position - previous_position;
            let radian =
                direction_to_radian(particle.last_gravity, current_gravity) / config.air_resistance;

            direction.x = radian.cos() * direction.x - direction.y * radian.sin();
            direction.y = radian.sin() * direction.x + direction.y * radian.cos();

            particle.position = previous_position + direction;

            let velocity = particle.velocity * delay;
            let force = particle.force * delay * delay;
            particle.position += velocity + force;

            let new_direction = (particle.position - previous_position).normalize_or_zero();
            particle.position = previous_position + new_direction * particle.radius;

            if particle.position.x.abs() < threshold_value {
                particle.position.x = 0.0;
            }

            if delay != 0.0 {
                particle.velocity =
                    (particle.position - particle.last_position) / delay * particle.mobility;
            }

            particle.force = Vec2::ZERO;
            particle.last_gravity = current_gravity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::input::CubismPhysicsSourceComponent;
    use crate::physics::particle::CubismPhysicsNormalizationTuplet;

    const DT: f32 = 1.0 / 30.0;

    fn normalization() -> CubismPhysicsNormalization {
        CubismPhysicsNormalization {
            position: CubismPhysicsNormalizationTuplet::new(-10.0, 0.0, 10.0),
            angle: CubismPhysicsNormalizationTuplet::new(-10.0, 0.0, 10.0),
        }
    }

    fn chain(radii: &[f32]) -> Vec<CubismPhysicsParticle> {
        radii
            .iter()
            .map(|r| CubismPhysicsParticle::new(0.9, 0.8, 1.5, *r))
            .collect()
    }

    fn sub_rig(radii: &[f32]) -> CubismPhysicsSubRig {
        let mut rig = CubismPhysicsSubRig::new("PhysicsSetting1");
        rig.particles = chain(radii);
        rig.normalization = Some(normalization());
        rig
    }

    fn y_output(id: &str, particle_index: usize) -> CubismPhysicsOutput {
        CubismPhysicsOutput::new(id, particle_index, CubismPhysicsSourceComponent::Y, 100.0, false)
            .with_scale(1.0)
    }

    fn assert_rigid(particles: &[CubismPhysicsParticle]) {
        for i in 1..particles.len() {
            let distance = particles[i].position.distance(particles[i - 1].position);
            assert!(
                (distance - particles[i].radius).abs() < 1e-3,
                "particle {} distance {} radius {}",
                i,
                distance,
                particles[i].radius
            );
        }
    }

    #[test]
    fn test_initialize_stacks_particles() {
        let mut rig = sub_rig(&[0.0, 1.0, 2.5]);
        rig.initialize(Vec2::new(0.0, -1.0));

        assert_eq!(rig.particles[0].position, Vec2::ZERO);
        assert_eq!(rig.particles[1].initial_position, Vec2::new(0.0, 1.0));
        assert_eq!(rig.particles[2].initial_position, Vec2::new(0.0, 3.5));
        assert_eq!(rig.particles[2].last_position, Vec2::new(0.0, 3.5));
        for particle in &rig.particles {
            assert_eq!(particle.last_gravity, Vec2::new(0.0, 1.0));
        }
    }

    #[test]
    fn test_single_tick_keeps_radius() {
        let environment = CubismPhysicsEnvironment {
            gravity: Vec2::new(0.0, 1.0),
            wind: Vec2::ZERO,
        };
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.initialize(environment.gravity);

        let mut parameters: Vec<CubismParameter> = Vec::new();
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);

        assert_eq!(rig.particles[0].position, Vec2::ZERO);
        let distance = rig.particles[1].position.distance(rig.particles[0].position);
        assert!((distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rigid_rod_under_motion_and_wind() {
        let environment = CubismPhysicsEnvironment {
            gravity: Vec2::new(0.0, -1.0),
            wind: Vec2::new(0.3, 0.0),
        };
        let config = PhysicsConfig::default();
        let mut rig = sub_rig(&[0.0, 3.0, 3.0, 1.5, 0.5]);
        rig.initialize(environment.gravity);

        for frame in 0..120 {
            let t = frame as f32 * DT;
            CubismPhysicsSubRig::update_particles(
                &mut rig.particles,
                Vec2::new((t * 3.0).sin() * 4.0, (t * 2.0).cos()),
                (t * 5.0).sin() * 8.0,
                environment.wind,
                config.movement_threshold * 10.0,
                DT,
                &config,
            );
            assert_rigid(&rig.particles);
        }
    }

    #[test]
    fn test_zero_delay_keeps_velocity() {
        let config = PhysicsConfig::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.particles[1].delay = 0.0;
        rig.initialize(Vec2::new(0.0, -1.0));
        rig.particles[1].velocity = Vec2::new(0.25, 0.0);

        CubismPhysicsSubRig::update_particles(
            &mut rig.particles,
            Vec2::new(1.0, 0.0),
            0.0,
            Vec2::ZERO,
            0.0,
            DT,
            &config,
        );
        assert_eq!(rig.particles[1].velocity, Vec2::new(0.25, 0.0));
        assert_rigid(&rig.particles);
    }

    #[test]
    fn test_small_x_snaps_to_zero() {
        let config = PhysicsConfig::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.initialize(Vec2::new(0.0, -1.0));

        CubismPhysicsSubRig::update_particles(
            &mut rig.particles,
            Vec2::new(0.005, 0.0),
            0.0,
            Vec2::ZERO,
            0.01,
            DT,
            &config,
        );
        assert_eq!(rig.particles[1].position.x, 0.0);
    }

    #[test]
    fn test_input_clamps_source_parameter() {
        let environment = CubismPhysicsEnvironment::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.inputs.push(CubismPhysicsInput::new(
            "ParamAngleX",
            100.0,
            CubismPhysicsSourceComponent::X,
            false,
        ));
        rig.initialize(environment.gravity);

        let mut parameters =
            vec![CubismParameter::new("ParamAngleX", -30.0, 30.0, 0.0).with_value(50.0)];
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);

        assert_eq!(parameters[0].value, 30.0);
        assert_eq!(rig.inputs[0].source(), Some(0));
        assert!((rig.particles[0].position.x + 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_normalization_is_noop() {
        let environment = CubismPhysicsEnvironment::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.normalization = None;
        rig.inputs
            .push(CubismPhysicsInput::new("P", 100.0, CubismPhysicsSourceComponent::X, false));
        rig.initialize(environment.gravity);
        let before = rig.particles.clone();

        let mut parameters = vec![CubismParameter::new("P", -1.0, 1.0, 0.0).with_value(5.0)];
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);

        assert_eq!(parameters[0].value, 5.0);
        assert_eq!(rig.particles, before);
    }

    #[test]
    fn test_out_of_range_output_stops_following_outputs() {
        let environment = CubismPhysicsEnvironment::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.outputs = vec![y_output("First", 1), y_output("Broken", 5), y_output("Third", 1)];
        rig.initialize(environment.gravity);

        let mut parameters = vec![
            CubismParameter::new("First", -10.0, 10.0, 0.0),
            CubismParameter::new("Broken", -10.0, 10.0, 0.0),
            CubismParameter::new("Third", -10.0, 10.0, 0.0),
        ];
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);

        assert!((parameters[0].value - 1.0).abs() < 1e-4);
        assert_eq!(parameters[1].value, 0.0);
        assert_eq!(parameters[2].value, 0.0);
        assert_eq!(rig.outputs[2].destination(), None);
    }

    #[test]
    fn test_output_index_zero_also_stops() {
        let environment = CubismPhysicsEnvironment::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.outputs = vec![y_output("A", 0), y_output("B", 1)];
        rig.initialize(environment.gravity);

        let mut parameters = vec![
            CubismParameter::new("A", -10.0, 10.0, 0.0),
            CubismParameter::new("B", -10.0, 10.0, 0.0),
        ];
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);
        assert_eq!(parameters[1].value, 0.0);
    }

    #[test]
    fn test_angle_input_rotates_translation_with_rotated_x() {
        let environment = CubismPhysicsEnvironment::default();
        let mut rig = sub_rig(&[0.0, 1.0]);
        rig.inputs = vec![
            CubismPhysicsInput::new("ParamAngleX", 100.0, CubismPhysicsSourceComponent::X, false),
            CubismPhysicsInput::new(
                "ParamAngleZ",
                100.0,
                CubismPhysicsSourceComponent::Angle,
                false,
            ),
        ];
        rig.initialize(environment.gravity);

        // 平移 x = -5，总角度 = -10
        let mut parameters = vec![
            CubismParameter::new("ParamAngleX", -30.0, 30.0, 0.0).with_value(15.0),
            CubismParameter::new("ParamAngleZ", -30.0, 30.0, 0.0).with_value(30.0),
        ];
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);

        let radian = degrees_to_radian(10.0);
        let x = -5.0 * radian.cos();
        let y = x * radian.sin();
        let position = rig.particles[0].position;
        assert!((position.x - x).abs() < 1e-5, "x {} expected {}", position.x, x);
        assert!((position.y - y).abs() < 1e-5, "y {} expected {}", position.y, y);
        // 与标准旋转 (-5 sin r) 不同
        assert!((position.y - -5.0 * radian.sin()).abs() > 1e-2);
    }

    #[test]
    fn test_particle_direction_rotates_with_rotated_x() {
        let config = PhysicsConfig::default();
        let mut rig = CubismPhysicsSubRig::new("Direction");
        rig.particles = vec![
            CubismPhysicsParticle::new(0.9, 0.8, 0.0, 0.0),
            CubismPhysicsParticle::new(0.9, 0.8, 0.0, 1.0),
        ];
        rig.initialize(Vec2::new(0.0, -1.0));
        assert_eq!(rig.particles[1].position, Vec2::new(0.0, 1.0));

        CubismPhysicsSubRig::update_particles(
            &mut rig.particles,
            Vec2::ZERO,
            90.0,
            Vec2::ZERO,
            0.0,
            DT,
            &config,
        );

        let gravity = radian_to_direction(degrees_to_radian(90.0)).normalize_or_zero();
        let radian = direction_to_radian(Vec2::new(0.0, 1.0), gravity) / config.air_resistance;
        let dx = -radian.sin();
        let dy = radian.sin() * dx + radian.cos();
        let expected = Vec2::new(dx, dy).normalize();

        let position = rig.particles[1].position;
        assert!(
            position.distance(expected) < 1e-5,
            "position {:?} expected {:?}",
            position,
            expected
        );
        assert_eq!(rig.particles[1].last_gravity, gravity);
    }

    #[test]
    fn test_swinging_input_moves_angle_output() {
        let environment = CubismPhysicsEnvironment::default();
        let mut rig = sub_rig(&[0.0, 3.0]);
        rig.inputs.push(CubismPhysicsInput::new(
            "ParamAngleX",
            100.0,
            CubismPhysicsSourceComponent::X,
            false,
        ));
        let angle = CubismPhysicsSourceComponent::Angle;
        let hair = CubismPhysicsOutput::new("ParamHair", 1, angle, 100.0, false);
        rig.outputs.push(hair.with_scale(10.0));
        rig.initialize(environment.gravity);

        let mut parameters = vec![
            CubismParameter::new("ParamAngleX", -30.0, 30.0, 0.0).with_value(30.0),
            CubismParameter::new("ParamHair", -30.0, 30.0, 0.0),
        ];
        rig.evaluate(&mut parameters, &environment, &PhysicsConfig::default(), DT);

        assert!(parameters[1].value.abs() > 1.0);
        assert_rigid(&rig.particles);
    }
}
