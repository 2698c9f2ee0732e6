//! 模型整帧更新测试：淡入淡出 -> 物理

use std::sync::Arc;

use cubism_engine::animation::get_easing_sine;
use cubism_engine::{
    AnimationCurve, CubismError, CubismFadeMotionData, CubismModel, CubismParameter, CubismPart,
};

const DT: f32 = 1.0 / 30.0;

const HAIR_PHYSICS: &str = r#"{
    "Version": 3,
    "Meta": {
        "PhysicsSettingCount": 1,
        "TotalInputCount": 2,
        "TotalOutputCount": 1,
        "VertexCount": 2,
        "EffectiveForces": {
            "Gravity": { "X": 0, "Y": -1 },
            "Wind": { "X": 0, "Y": 0 }
        },
        "PhysicsDictionary": [{ "Id": "PhysicsSetting1", "Name": "Front hair" }]
    },
    "PhysicsSettings": [{
        "Id": "PhysicsSetting1",
        "Input": [
            {
                "Source": { "Target": "Parameter", "Id": "ParamAngleX" },
                "Weight": 60,
                "Type": "X",
                "Reflect": false
            },
            {
                "Source": { "Target": "Parameter", "Id": "ParamAngleZ" },
                "Weight": 60,
                "Type": "Angle",
                "Reflect": false
            }
        ],
        "Output": [
            {
                "Destination": { "Target": "Parameter", "Id": "ParamHairFront" },
                "VertexIndex": 1,
                "Scale": 1.522,
                "Weight": 100,
                "Type": "Angle",
                "Reflect": false
            }
        ],
        "Vertices": [
            {
                "Position": { "X": 0, "Y": 0 },
                "Mobility": 1,
                "Delay": 1,
                "Acceleration": 1,
                "Radius": 0
            },
            {
                "Position": { "X": 0, "Y": 3 },
                "Mobility": 0.95,
                "Delay": 0.9,
                "Acceleration": 1.5,
                "Radius": 3
            }
        ],
        "Normalization": {
            "Position": { "Minimum": -10, "Default": 0, "Maximum": 10 },
            "Angle": { "Minimum": -10, "Default": 0, "Maximum": 10 }
        }
    }]
}"#;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn model() -> CubismModel {
    CubismModel::new(
        "Haru",
        vec![
            CubismParameter::new("ParamAngleX", -30.0, 30.0, 0.0),
            CubismParameter::new("ParamAngleZ", -30.0, 30.0, 0.0),
            CubismParameter::new("ParamHairFront", -1.0, 1.0, 0.0),
        ],
        vec![CubismPart::new("PartArmA", 1.0)],
    )
}

fn look(name: &str, fade_in: f32, value: f32) -> Arc<CubismFadeMotionData> {
    Arc::new(
        CubismFadeMotionData::new(name, fade_in, 1.0, 10.0)
            .with_curve("ParamAngleX", AnimationCurve::constant(0.0, 10.0, value))
            .with_curve("PartArmA", AnimationCurve::constant(0.0, 10.0, 0.0)),
    )
}

#[test]
fn test_rest_pose_stays_at_rest() {
    init_logger();
    let mut model = model();
    model.load_physics_json(HAIR_PHYSICS).unwrap();
    assert!(model.is_physics_enabled());

    for _ in 0..60 {
        model.update(DT);
    }
    assert_eq!(model.parameter_value("ParamHairFront"), Some(0.0));
}

#[test]
fn test_physics_reads_blended_parameters() {
    init_logger();
    let mut model = model();
    model.load_physics_json(HAIR_PHYSICS).unwrap();

    model.play_motion(0, look("LookA", 0.0, 0.0), 1.0, false);
    model.update(1.0);
    assert_eq!(model.parameter_value("ParamAngleX"), Some(0.0));
    assert_eq!(model.parameter_value("ParamHairFront"), Some(0.0));
    assert_eq!(model.part_opacity("PartArmA"), Some(0.0));

    model.play_motion(0, look("LookB", 1.0, 20000.0), 1.0, false);
    model.update(DT);

    // 淡入第一帧的权重很小，但混合结果仍超出参数范围，由物理输入限制回最大值
    assert!(20000.0 * get_easing_sine(DT) > 30.0);
    assert_eq!(model.parameter_value("ParamAngleX"), Some(30.0));
    let hair = model.parameter_value("ParamHairFront").unwrap();
    assert!(hair.abs() > 0.5, "hair = {}", hair);
    assert!(hair.abs() <= 1.0);

    // 淡入结束后新动作直接驱动参数
    for _ in 0..30 {
        model.update(DT);
    }
    assert_eq!(model.fade_controller().fade_state(0).unwrap().playing_motions().len(), 1);
    assert_eq!(model.parameter_value("ParamAngleX"), Some(30.0));
    assert_eq!(model.part_opacity("PartArmA"), Some(0.0));
}

#[test]
fn test_single_motion_drives_physics() {
    init_logger();
    let mut model = model();
    model.load_physics_json(HAIR_PHYSICS).unwrap();

    model.play_motion(0, look("Look", 0.0, 30.0), 1.0, false);
    model.update(DT);

    assert_eq!(model.parameter_value("ParamAngleX"), Some(30.0));
    let hair = model.parameter_value("ParamHairFront").unwrap();
    assert!(hair.abs() > 0.5, "hair = {}", hair);
}

#[test]
fn test_chain_stays_rigid_while_driven() {
    init_logger();
    let mut model = model();
    model.load_physics_json(HAIR_PHYSICS).unwrap();

    for frame in 0..90 {
        let t = frame as f32 * DT;
        model.set_parameter_value("ParamAngleX", (t * 4.0).sin() * 30.0);
        model.set_parameter_value("ParamAngleZ", (t * 3.0).cos() * 20.0);
        model.update(DT);

        let rig = model.physics().rig().unwrap();
        let particles = &rig.sub_rigs[0].as_ref().unwrap().particles;
        let distance = particles[1].position.distance(particles[0].position);
        assert!((distance - 3.0).abs() < 1e-3, "frame {} distance {}", frame, distance);

        let hair = model.parameter_value("ParamHairFront").unwrap();
        assert!((-1.0..=1.0).contains(&hair));
    }
}

#[test]
fn test_disabled_physics_leaves_parameters() {
    init_logger();
    let mut model = model();
    model.load_physics_json(HAIR_PHYSICS).unwrap();
    model.set_physics_enabled(false);

    model.set_parameter_value("ParamAngleX", 80.0);
    model.update(DT);
    assert_eq!(model.parameter_value("ParamAngleX"), Some(80.0));
    assert_eq!(model.parameter_value("ParamHairFront"), Some(0.0));
}

#[test]
fn test_invalid_physics_json_keeps_model_usable() {
    init_logger();
    let mut model = model();
    let result = model.load_physics_json(r#"{ "Version": 3 }"#);
    assert!(matches!(result, Err(CubismError::Json(_))));
    assert!(!model.has_physics());

    model.update(DT);
    assert_eq!(model.parameter_value("ParamAngleX"), Some(0.0));
}
