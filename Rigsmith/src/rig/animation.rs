//! Procedural Idle / Walk / Attack clips for the humanoid skeleton.

use glam::{Quat, Vec3};

use super::skeleton::{Skeleton, bones};

/// Samples per second for every clip. Both endpoints are sampled.
pub const FRAME_RATE: f32 = 30.0;

pub const IDLE_DURATION: f32 = 2.0;
pub const WALK_DURATION: f32 = 1.0;
pub const ATTACK_DURATION: f32 = 0.5;

/// Animated node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPath {
    Translation,
    Rotation,
}

impl ChannelPath {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Rotation => "rotation",
        }
    }
}

/// Keyframe values, one per sample time.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<[f32; 3]>),
    /// Unit quaternions, xyzw.
    Rotation(Vec<[f32; 4]>),
}

impl ChannelValues {
    #[must_use]
    pub fn path(&self) -> ChannelPath {
        match self {
            Self::Translation(_) => ChannelPath::Translation,
            Self::Rotation(_) => ChannelPath::Rotation,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Translation(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Components laid out element after element.
    #[must_use]
    pub fn flat(&self) -> &[f32] {
        match self {
            Self::Translation(v) => v.as_flattened(),
            Self::Rotation(v) => v.as_flattened(),
        }
    }
}

/// One animated bone property.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub bone: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: &'static str,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

/// Sample times `0, 1/30, ..., duration`.
#[must_use]
pub fn sample_times(duration: f32) -> Vec<f32> {
    let frames = (duration * FRAME_RATE).round() as usize;
    (0..=frames).map(|i| i as f32 / FRAME_RATE).collect()
}

/// Quaternion (xyzw) for Euler angles in radians, applied X, then Y, then Z.
#[must_use]
pub fn quat_from_euler(rx: f32, ry: f32, rz: f32) -> [f32; 4] {
    (Quat::from_rotation_z(rz) * Quat::from_rotation_y(ry) * Quat::from_rotation_x(rx)).to_array()
}

/// Build the three clips for `skeleton`, scaled to a mesh of `mesh_height`.
#[must_use]
pub fn synthesize(skeleton: &Skeleton, mesh_height: f32) -> Vec<AnimationClip> {
    vec![idle(), walk(skeleton, mesh_height), attack()]
}

fn rotation_channel(bone: usize, times: &[f32], angles: impl Fn(f32) -> [f32; 4]) -> Channel {
    Channel {
        bone,
        times: times.to_vec(),
        values: ChannelValues::Rotation(times.iter().map(|&t| angles(t)).collect()),
    }
}

/// Subtle breathing sway of the spine.
fn idle() -> AnimationClip {
    let times = sample_times(IDLE_DURATION);
    let spine = rotation_channel(bones::SPINE, &times, |t| {
        quat_from_euler((t * std::f32::consts::PI).sin() * 0.02, 0.0, 0.0)
    });

    AnimationClip {
        name: "Idle",
        duration: IDLE_DURATION,
        channels: vec![spine],
    }
}

/// One gait cycle: hip bob, opposed leg swing and counter-swinging arms.
fn walk(skeleton: &Skeleton, mesh_height: f32) -> AnimationClip {
    let times = sample_times(WALK_DURATION);
    let phase = |t: f32| t / WALK_DURATION * std::f32::consts::TAU;
    let pi = std::f32::consts::PI;

    let hips_rest = skeleton.local_translation(bones::HIPS);
    let hips = Channel {
        bone: bones::HIPS,
        times: times.clone(),
        values: ChannelValues::Translation(
            times
                .iter()
                .map(|&t| {
                    let bob = (phase(t) * 2.0).sin().abs() * 0.02 * mesh_height;
                    (hips_rest + Vec3::new(0.0, bob, 0.0)).to_array()
                })
                .collect(),
        ),
    };

    let channels = vec![
        hips,
        rotation_channel(bones::LEFT_UP_LEG, &times, |t| {
            quat_from_euler(phase(t).sin() * 0.5, 0.0, 0.0)
        }),
        rotation_channel(bones::RIGHT_UP_LEG, &times, |t| {
            quat_from_euler((phase(t) + pi).sin() * 0.5, 0.0, 0.0)
        }),
        rotation_channel(bones::LEFT_ARM, &times, |t| {
            quat_from_euler((phase(t) + pi).sin() * 0.3, 0.0, 0.0)
        }),
        rotation_channel(bones::RIGHT_ARM, &times, |t| {
            quat_from_euler(phase(t).sin() * 0.3, 0.0, 0.0)
        }),
    ];

    AnimationClip {
        name: "Walk",
        duration: WALK_DURATION,
        channels,
    }
}

/// Wind-up until 30% of the clip, swing until 50%, then ease back to rest.
fn attack_curve(progress: f32, amplitude: f32) -> f32 {
    if progress < 0.3 {
        -progress / 0.3 * amplitude
    } else if progress < 0.5 {
        let swing = (progress - 0.3) / 0.2;
        -amplitude + swing * 2.0 * amplitude
    } else {
        let back = (progress - 0.5) / 0.5;
        amplitude * (1.0 - back)
    }
}

/// Right-handed overhead swing with a slight torso twist.
fn attack() -> AnimationClip {
    let times = sample_times(ATTACK_DURATION);
    let progress = |t: f32| t / ATTACK_DURATION;

    let channels = vec![
        rotation_channel(bones::RIGHT_ARM, &times, |t| {
            quat_from_euler(attack_curve(progress(t), 1.5), 0.0, 0.0)
        }),
        rotation_channel(bones::RIGHT_FOREARM, &times, |t| {
            quat_from_euler(attack_curve(progress(t), 0.5), 0.0, 0.0)
        }),
        rotation_channel(bones::CHEST, &times, |t| {
            quat_from_euler(0.0, attack_curve(progress(t), 0.3), 0.0)
        }),
    ];

    AnimationClip {
        name: "Attack",
        duration: ATTACK_DURATION,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> Skeleton {
        Skeleton::humanoid(Vec3::new(-0.5, 0.0, -0.25), Vec3::new(0.5, 1.8, 0.25))
    }

    #[test]
    fn test_sample_counts() {
        assert_eq!(sample_times(IDLE_DURATION).len(), 61);
        assert_eq!(sample_times(WALK_DURATION).len(), 31);
        assert_eq!(sample_times(ATTACK_DURATION).len(), 16);
    }

    #[test]
    fn test_times_strictly_increasing() {
        for clip in synthesize(&skeleton(), 1.8) {
            for channel in &clip.channels {
                assert_eq!(channel.times[0], 0.0);
                assert!(channel.times.windows(2).all(|w| w[0] < w[1]), "{}", clip.name);
                let last = channel.times[channel.times.len() - 1];
                assert!((last - clip.duration).abs() < 1e-6);
                assert_eq!(channel.values.len(), channel.times.len());
            }
        }
    }

    #[test]
    fn test_clip_names_and_targets() {
        let clips = synthesize(&skeleton(), 1.8);
        let names: Vec<_> = clips.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Idle", "Walk", "Attack"]);

        let walk = &clips[1];
        assert_eq!(walk.channels[0].bone, bones::HIPS);
        assert_eq!(walk.channels[0].values.path(), ChannelPath::Translation);
        assert!(
            walk.channels[1..]
                .iter()
                .all(|c| c.values.path() == ChannelPath::Rotation)
        );
        let attack_bones: Vec<_> = clips[2].channels.iter().map(|c| c.bone).collect();
        assert_eq!(
            attack_bones,
            vec![bones::RIGHT_ARM, bones::RIGHT_FOREARM, bones::CHEST]
        );
    }

    #[test]
    fn test_rotations_are_unit() {
        for clip in synthesize(&skeleton(), 1.8) {
            for channel in &clip.channels {
                if let ChannelValues::Rotation(quats) = &channel.values {
                    for q in quats {
                        let len = Quat::from_array(*q).length();
                        assert!((len - 1.0).abs() < 1e-5);
                    }
                }
            }
        }
    }

    #[test]
    fn test_quat_matches_half_angle_form() {
        let (rx, ry, rz) = (0.4_f32, -0.7_f32, 1.1_f32);
        let (sx, cx) = (rx / 2.0).sin_cos();
        let (sy, cy) = (ry / 2.0).sin_cos();
        let (sz, cz) = (rz / 2.0).sin_cos();
        let expected = [
            sx * cy * cz - cx * sy * sz,
            cx * sy * cz + sx * cy * sz,
            cx * cy * sz - sx * sy * cz,
            cx * cy * cz + sx * sy * sz,
        ];
        let actual = quat_from_euler(rx, ry, rz);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_hips_bob_rides_on_rest_pose() {
        let skeleton = skeleton();
        let rest = skeleton.local_translation(bones::HIPS).to_array();
        let clips = synthesize(&skeleton, 1.8);
        let ChannelValues::Translation(values) = &clips[1].channels[0].values else {
            panic!("hips channel is not a translation");
        };
        assert_eq!(values[0], rest);
        let peak = values.iter().map(|v| v[1] - rest[1]).fold(0.0_f32, f32::max);
        assert!(peak > 0.0 && peak <= 0.02 * 1.8 + 1e-6);
        assert!(values.iter().all(|v| v[0] == rest[0] && v[2] == rest[2]));
    }

    #[test]
    fn test_attack_curve_phases() {
        assert_eq!(attack_curve(0.0, 1.5), 0.0);
        assert!((attack_curve(0.29999, 1.5) + 1.5).abs() < 1e-3);
        assert!(attack_curve(0.4, 1.5).abs() < 1e-5);
        assert!((attack_curve(0.5, 1.5) - 1.5).abs() < 1e-6);
        assert!(attack_curve(1.0, 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_flat_values() {
        let clips = synthesize(&skeleton(), 1.8);
        let spine = &clips[0].channels[0].values;
        assert_eq!(spine.flat().len(), 61 * 4);
        assert_eq!(&spine.flat()[0..4], &[0.0, 0.0, 0.0, 1.0]);
    }
}
