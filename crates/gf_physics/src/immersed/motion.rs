// crates/gf_physics/src/immersed/motion.rs

//! 浸入形状的刚体运动
//!
//! 运动描述给出任意时刻形状上任意点的速度与加速度，
//! 供固体速度边界和压力附加质量源项使用。

use glam::DVec2;
use serde::{Deserialize, Serialize};

use gf_config::MotionConfig;
use gf_foundation::error::{GfError, GfResult};

/// 刚体运动
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// 匀加速平移：`x(t) = v t + a t² / 2`
    Translation {
        /// 初始速度
        velocity: DVec2,
        /// 加速度
        acceleration: DVec2,
    },
    /// 简谐振荡：`x(t) = A sin(ω t)`
    Oscillation {
        /// 振幅
        amplitude: DVec2,
        /// 角频率
        omega: f64,
    },
    /// 绕形心匀速转动
    Rotation {
        /// 角速度（逆时针为正）
        omega: f64,
    },
}

impl Motion {
    /// 从配置创建
    pub fn from_config(config: &MotionConfig) -> GfResult<Self> {
        let vec2 = |v: Option<[f64; 2]>| v.map_or(DVec2::ZERO, DVec2::from_array);
        match config.kind.trim().to_ascii_lowercase().as_str() {
            "translation" => Ok(Self::Translation {
                velocity: vec2(config.velocity),
                acceleration: vec2(config.acceleration),
            }),
            "oscillation" => Ok(Self::Oscillation {
                amplitude: vec2(config.amplitude),
                omega: require_omega(config)?,
            }),
            "rotation" => Ok(Self::Rotation {
                omega: require_omega(config)?,
            }),
            other => Err(GfError::invalid_config(
                "motion.type",
                other,
                "支持 translation / oscillation / rotation",
            )),
        }
    }

    /// 形心在 [t0, t1] 内的平移量
    pub fn displacement(&self, t0: f64, t1: f64) -> DVec2 {
        match *self {
            Self::Translation {
                velocity,
                acceleration,
            } => velocity * (t1 - t0) + 0.5 * acceleration * (t1 * t1 - t0 * t0),
            Self::Oscillation { amplitude, omega } => {
                amplitude * ((omega * t1).sin() - (omega * t0).sin())
            }
            Self::Rotation { .. } => DVec2::ZERO,
        }
    }

    /// [t0, t1] 内绕形心的转角
    pub fn rotation_angle(&self, t0: f64, t1: f64) -> f64 {
        match *self {
            Self::Rotation { omega } => omega * (t1 - t0),
            _ => 0.0,
        }
    }

    /// 时刻 t 形状上点 `p` 的速度
    pub fn velocity(&self, p: DVec2, centroid: DVec2, t: f64) -> DVec2 {
        match *self {
            Self::Translation {
                velocity,
                acceleration,
            } => velocity + acceleration * t,
            Self::Oscillation { amplitude, omega } => amplitude * omega * (omega * t).cos(),
            Self::Rotation { omega } => omega * (p - centroid).perp(),
        }
    }

    /// 时刻 t 形状上点 `p` 的加速度
    pub fn acceleration(&self, p: DVec2, centroid: DVec2, t: f64) -> DVec2 {
        match *self {
            Self::Translation { acceleration, .. } => acceleration,
            Self::Oscillation { amplitude, omega } => {
                -amplitude * omega * omega * (omega * t).sin()
            }
            Self::Rotation { omega } => -omega * omega * (p - centroid),
        }
    }
}

fn require_omega(config: &MotionConfig) -> GfResult<f64> {
    config
        .omega
        .ok_or_else(|| GfError::invalid_config("motion.omega", "", "振荡和转动需要角频率"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation() {
        let m = Motion::Translation {
            velocity: DVec2::new(1.0, 0.0),
            acceleration: DVec2::new(0.0, 2.0),
        };
        let d = m.displacement(0.0, 1.0);
        assert!((d - DVec2::new(1.0, 1.0)).length() < 1e-14);
        let v = m.velocity(DVec2::ZERO, DVec2::ZERO, 0.5);
        assert!((v - DVec2::new(1.0, 1.0)).length() < 1e-14);
    }

    #[test]
    fn test_oscillation_consistency() {
        let m = Motion::Oscillation {
            amplitude: DVec2::new(0.1, 0.0),
            omega: 2.0,
        };
        // 速度近似为位移的时间导数
        let (t, dt) = (0.3, 1e-6);
        let fd = m.displacement(t, t + dt) / dt;
        let v = m.velocity(DVec2::ZERO, DVec2::ZERO, t);
        assert!((fd - v).length() < 1e-5);
        let a = m.acceleration(DVec2::ZERO, DVec2::ZERO, t);
        assert!((a.x + 0.4 * (0.6f64).sin()).abs() < 1e-12);
    }

    #[test]
    fn test_rotation() {
        let m = Motion::Rotation { omega: 2.0 };
        let v = m.velocity(DVec2::new(1.0, 0.0), DVec2::ZERO, 0.0);
        assert!((v - DVec2::new(0.0, 2.0)).length() < 1e-14);
        let a = m.acceleration(DVec2::new(1.0, 0.0), DVec2::ZERO, 0.0);
        assert!((a - DVec2::new(-4.0, 0.0)).length() < 1e-14);
        assert!((m.rotation_angle(0.0, 0.5) - 1.0).abs() < 1e-14);
        assert_eq!(m.displacement(0.0, 1.0), DVec2::ZERO);
    }

    #[test]
    fn test_from_config() {
        let config = MotionConfig {
            kind: "oscillation".into(),
            amplitude: Some([0.1, 0.0]),
            omega: Some(3.0),
            ..Default::default()
        };
        assert!(matches!(
            Motion::from_config(&config).unwrap(),
            Motion::Oscillation { omega, .. } if omega == 3.0
        ));

        let config = MotionConfig {
            kind: "rotation".into(),
            ..Default::default()
        };
        assert!(Motion::from_config(&config).unwrap_err().is_config_error());

        let config = MotionConfig {
            kind: "wobble".into(),
            ..Default::default()
        };
        assert!(Motion::from_config(&config).unwrap_err().is_config_error());
    }
}
