//! Per-frame formation animation core.
//!
//! Given a flat instance index, a frame time, and a [`FormationConfig`], this
//! crate derives a grid coordinate, a centered planar position, and finally a
//! swinging pose plus a color for one instanced "stick" proxy: a seated
//! concert audience or a drill formation, depending on the configured style.
//! [`evaluate`] runs that derivation for every index in parallel and fills two
//! index-aligned output arrays that an external GPU-instanced renderer
//! consumes directly.
//!
//! Every instance is a pure function of `(index, config, world, time)`; no
//! state survives between frames, so batches can be re-run, chunked, or
//! discarded freely.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2, Vec2, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::ops::Range;
use stickfield_noise::{perlin2, perlin3, SeededStream};
use thiserror::Error;

/// Draws discarded right after seeding a per-stick stream, before the first
/// draw that feeds the animation. Part of the reproducibility contract.
const WARMUP_DRAWS: u64 = 4;

/// Seed salt of the default audience preset.
const DEFAULT_SEED_SALT: u64 = 123;

// Seeded swing tuning (audience preset).
const NOISE_DRAW_SPAN: f32 = 1000.0;
const PHASE_NOISE_RATE: f32 = 0.27;
const AXIS_NOISE_RATE: f32 = 0.23;
const AXIS_NOISE_SHIFT: f32 = 100.0;
const SHOULDER_JITTER: f32 = 0.3;
const LIFT_JITTER: f32 = 0.2;
const AMPLITUDE_MIN: f32 = 0.3;
const AMPLITUDE_MAX: f32 = 1.0;
const ARM_SCALE_MIN: f32 = 0.75;
const ARM_SCALE_MAX: f32 = 1.25;

// Coherent swing tuning (parade preset).
const COHERENT_NOISE_RATE: f32 = 0.234;

// Wave color tuning: brightness ripples outward from a fixed point in the
// house while each stick's hue drifts from a seeded offset.
const WAVE_CENTER: Vec2 = Vec2::new(0.0, 16.0);
const WAVE_DENSITY: f32 = 0.53;
const WAVE_SPEED: f32 = 2.8;
const HUE_DRIFT_RATE: f32 = 0.83;
const WAVE_BRIGHTNESS_GAIN: f32 = 50.0;
const WAVE_BRIGHTNESS_FLOOR: f32 = 0.1;

// Positional color tuning (parade preset).
const GRID_HUE_X: f32 = 23.13;
const GRID_HUE_Z: f32 = 134.782;
const GRID_HUE_GAIN: f32 = 44.583;
const GRID_BRIGHTNESS: f32 = 30.0;

/// Errors emitted when a batch cannot start.
#[derive(Debug, Error)]
pub enum FormationError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// An output slice cannot hold the whole formation.
    #[error("output buffer too small: need {required}, got {provided}")]
    OutputTooSmall {
        /// Entries the formation requires.
        required: usize,
        /// Entries the caller provided.
        provided: usize,
    },
}

/// Animation and color flavor of a formation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SwingStyle {
    /// Every stick gets its own randomized phase offset, motion profile,
    /// amplitude, and reach, with colors riding a seeded hue wave. The
    /// concert-audience look.
    Seeded {
        /// Base folded into every per-index seed, so two formations can
        /// coexist without sharing random sequences.
        seed_salt: u64,
    },
    /// Sticks sway together, desynchronized only by the noise field, with a
    /// fixed positional color hash. The drill-formation look.
    Coherent,
}

impl Default for SwingStyle {
    fn default() -> Self {
        Self::Seeded {
            seed_salt: DEFAULT_SEED_SALT,
        }
    }
}

/// Static description of one formation: how a group is gridded, how groups
/// tile the plane, and how the sticks swing.
///
/// Immutable during a batch; editing it between frames is the only way the
/// output changes shape. All counts must be positive; see
/// [`FormationConfig::validate`]. Negative spacing is permitted and mirrors
/// the layout; that is the caller's call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormationConfig {
    /// Sticks per group along each grid axis.
    pub member_count: UVec2,
    /// Distance between adjacent members along each axis.
    pub member_spacing: Vec2,
    /// Number of groups along each axis.
    pub group_count: UVec2,
    /// Extra spacing inserted between neighboring groups.
    pub group_gap: Vec2,
    /// Swing cycles per second.
    pub swing_frequency: f32,
    /// Stick reach along the pose's local up axis.
    pub swing_offset: f32,
    /// Animation and color flavor.
    pub style: SwingStyle,
}

impl Default for FormationConfig {
    /// The seated-audience preset: 7×3 blocks of 8×12 seats.
    fn default() -> Self {
        Self {
            member_count: UVec2::new(8, 12),
            member_spacing: Vec2::new(0.4, 0.8),
            group_count: UVec2::new(7, 3),
            group_gap: Vec2::new(0.7, 1.2),
            swing_frequency: 0.5,
            swing_offset: 0.3,
            style: SwingStyle::default(),
        }
    }
}

impl FormationConfig {
    /// The drill-squad preset: same grid as the default, coherent swing.
    #[must_use]
    pub fn parade() -> Self {
        Self {
            style: SwingStyle::Coherent,
            ..Self::default()
        }
    }

    /// Sticks in one group.
    #[must_use]
    pub const fn members_per_group(&self) -> usize {
        self.member_count.x as usize * self.member_count.y as usize
    }

    /// Groups in the whole formation.
    #[must_use]
    pub const fn group_total(&self) -> usize {
        self.group_count.x as usize * self.group_count.y as usize
    }

    /// Sticks in the whole formation.
    #[must_use]
    pub const fn total_instances(&self) -> usize {
        self.members_per_group() * self.group_total()
    }

    /// Validates the configuration, returning the total instance count.
    ///
    /// Zero counts would divide by zero in the index decomposition, so they
    /// fail here, before any array is touched.
    pub fn validate(&self) -> Result<usize, FormationError> {
        if self.member_count.x == 0 || self.member_count.y == 0 {
            return Err(FormationError::InvalidConfig(
                "member_count must be positive on both axes",
            ));
        }
        if self.group_count.x == 0 || self.group_count.y == 0 {
            return Err(FormationError::InvalidConfig(
                "group_count must be positive on both axes",
            ));
        }
        let members = u64::from(self.member_count.x).checked_mul(u64::from(self.member_count.y));
        let groups = u64::from(self.group_count.x).checked_mul(u64::from(self.group_count.y));
        members
            .zip(groups)
            .and_then(|(members, groups)| members.checked_mul(groups))
            .and_then(|total| usize::try_from(total).ok())
            .ok_or(FormationError::InvalidConfig(
                "instance count overflows the addressable range",
            ))
    }

    /// Decomposes a flat index into its grid coordinate. Member-x varies
    /// fastest within a group; group-x varies fastest across groups, so each
    /// group covers one contiguous index range.
    ///
    /// `index` must lie in `[0, total_instances())`; the batch evaluator
    /// never produces one outside it.
    #[must_use]
    pub fn coordinate_of(&self, index: usize) -> GridCoordinate {
        debug_assert!(index < self.total_instances());
        let members = self.members_per_group();
        let group_index = index / members;
        let member_index = index - members * group_index;
        let group = UVec2::new(
            (group_index % self.group_count.x as usize) as u32,
            (group_index / self.group_count.x as usize) as u32,
        );
        let member = UVec2::new(
            (member_index % self.member_count.x as usize) as u32,
            (member_index / self.member_count.x as usize) as u32,
        );
        GridCoordinate { group, member }
    }

    /// Recomposes the flat index of `coordinate`; inverse of
    /// [`FormationConfig::coordinate_of`].
    #[must_use]
    pub fn index_of(&self, coordinate: GridCoordinate) -> usize {
        let group_index = coordinate.group.y as usize * self.group_count.x as usize
            + coordinate.group.x as usize;
        let member_index = coordinate.member.y as usize * self.member_count.x as usize
            + coordinate.member.x as usize;
        group_index * self.members_per_group() + member_index
    }

    /// Planar position of `coordinate`, centered so the whole formation
    /// straddles the origin regardless of count parity.
    #[must_use]
    pub fn plane_position(&self, coordinate: GridCoordinate) -> Vec2 {
        let members = self.member_count.as_vec2();
        let groups = self.group_count.as_vec2();
        let local = self.member_spacing * (coordinate.member.as_vec2() - (members - 1.0) * 0.5);
        let stride = self.member_spacing * (members - 1.0) + self.group_gap;
        local + stride * (coordinate.group.as_vec2() - (groups - 1.0) * 0.5)
    }

    /// Contiguous flat-index range covered by one group (row-major group
    /// order), ready for one instanced draw call per group.
    #[must_use]
    pub fn group_span(&self, group_index: usize) -> Range<usize> {
        debug_assert!(group_index < self.group_total());
        let members = self.members_per_group();
        group_index * members..(group_index + 1) * members
    }
}

/// Two-level grid address of a stick: which group, and which member slot
/// inside that group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCoordinate {
    /// Group cell along each axis.
    pub group: UVec2,
    /// Member cell within the group.
    pub member: UVec2,
}

/// RGBA output color, `#[repr(C)]` so the renderer can upload slices of it
/// verbatim. Components may exceed 1.0: the wave style encodes HDR
/// brightness for bloom.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StickColor {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component; the synthesizers always emit 1.0.
    pub a: f32,
}

impl StickColor {
    /// Builds a color from explicit components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// HSV to RGB. Hue is wrapped into `[0, 1)` first; value passes through
    /// unclamped so HDR brightness survives.
    fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = frac(hue) * 6.0;
        let sector = (h.floor() as i32).rem_euclid(6);
        let f = h - h.floor();
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match sector {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };
        Self { r, g, b, a: 1.0 }
    }
}

/// Fractional part in `[0, 1)`, also for negative inputs. Rounding can pull
/// `x - floor(x)` up to exactly 1.0 for tiny negative inputs; that case
/// wraps to 0.
fn frac(value: f32) -> f32 {
    let f = value - value.floor();
    if f >= 1.0 { 0.0 } else { f }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Sway axis in the XZ plane. The tilt comes from noise in [-1, 1] so the
/// axis is never close to zero-length, but a degenerate input still has a
/// defined answer: straight +Z.
fn swing_axis(tilt: f32) -> Vec3 {
    Vec3::new(tilt, 0.0, 1.0)
        .try_normalize()
        .unwrap_or(Vec3::Z)
}

/// Anchor first, rotate about the anchor, then push the stick out along its
/// rotated up axis; a swing, not an orbit.
fn compose_pose(world: Mat4, origin: Vec3, axis: Vec3, angle: f32, arm: f32) -> Mat4 {
    world
        * Mat4::from_translation(origin)
        * Mat4::from_axis_angle(axis, angle)
        * Mat4::from_translation(Vec3::new(0.0, arm, 0.0))
}

/// Randomized swing pose for a stick seated at `position`.
///
/// The draw order against the seeded stream is part of the reproducibility
/// contract: phase coordinate, shoulder offset pair, vertical jitter,
/// profile blend, amplitude, axis coordinate, arm scale.
#[must_use]
pub fn seeded_stick_pose(
    config: &FormationConfig,
    position: Vec2,
    world: Mat4,
    time: f32,
    seed: u64,
) -> Mat4 {
    let mut stream = SeededStream::new(seed);
    stream.discard(WARMUP_DRAWS);

    // Cyclic phase, decorrelated per stick by a noise sample at a random
    // abscissa drifting slowly in time.
    let mut phase = TAU * config.swing_frequency * time;
    let phase_draw = stream.next_float(-NOISE_DRAW_SPAN, NOISE_DRAW_SPAN);
    phase += perlin2(Vec2::new(phase_draw, time * PHASE_NOISE_RATE));

    // Shoulder anchor: the seat position plus a little per-stick variance.
    let shoulder =
        position + stream.next_float2(-SHOULDER_JITTER, SHOULDER_JITTER) * config.member_spacing;
    let lift = stream.next_float(-LIFT_JITTER, LIFT_JITTER);
    let origin = Vec3::new(shoulder.x, lift, shoulder.y);

    // Swing angle: blend the raw cosine toward a sharpened snap profile,
    // then scale by a per-stick amplitude.
    let raw = phase.cos();
    let sharp = smoothstep(-1.0, 1.0, raw) * 2.0 - 1.0;
    let blend = stream.next_uniform();
    let amplitude = stream.next_float(AMPLITUDE_MIN, AMPLITUDE_MAX);
    let angle = lerp(raw, sharp, blend) * amplitude;

    // Sway direction wanders with its own noise sample.
    let axis_draw = stream.next_float(-NOISE_DRAW_SPAN, NOISE_DRAW_SPAN);
    let tilt = perlin2(Vec2::new(axis_draw, time * AXIS_NOISE_RATE + AXIS_NOISE_SHIFT));

    let arm = config.swing_offset * stream.next_float(ARM_SCALE_MIN, ARM_SCALE_MAX);

    compose_pose(world, origin, swing_axis(tilt), angle, arm)
}

/// Coherent swing pose: angle and axis come straight from the noise field at
/// the stick's own position, so neighbors sway almost together.
#[must_use]
pub fn coherent_stick_pose(
    config: &FormationConfig,
    position: Vec2,
    world: Mat4,
    time: f32,
) -> Mat4 {
    let phase = TAU * config.swing_frequency * time;
    let drift = time * COHERENT_NOISE_RATE;
    let sway = perlin3(Vec3::new(position.x, drift, position.y));
    let tilt = perlin3(Vec3::new(position.x, drift + AXIS_NOISE_SHIFT, position.y));
    let angle = (phase + sway).cos();
    let origin = Vec3::new(position.x, 0.0, position.y);
    compose_pose(world, origin, swing_axis(tilt), angle, config.swing_offset)
}

/// Seeded wave color: brightness ripples outward from [`WAVE_CENTER`] while
/// the hue drifts from a per-stick random offset.
#[must_use]
pub fn wave_color(position: Vec2, time: f32, seed: u64) -> StickColor {
    let mut stream = SeededStream::new(seed);
    stream.discard(WARMUP_DRAWS);

    let wave = (position.distance(WAVE_CENTER) * WAVE_DENSITY - time * WAVE_SPEED).sin() * 0.5 + 0.5;
    let hue = frac(stream.next_uniform() + time * HUE_DRIFT_RATE);
    let brightness = wave * wave * WAVE_BRIGHTNESS_GAIN + WAVE_BRIGHTNESS_FLOOR;
    StickColor::from_hsv(hue, 1.0, brightness)
}

/// Positional color: a fixed trigonometric hash of the stick's position.
/// No time, no randomness; the same seat always shows the same hue.
#[must_use]
pub fn positional_color(position: Vec2) -> StickColor {
    let hue = frac((position.x * GRID_HUE_X + position.y * GRID_HUE_Z).sin() * GRID_HUE_GAIN);
    StickColor::from_hsv(hue, 1.0, GRID_BRIGHTNESS)
}

/// Pose and color for the stick at `index`: the whole per-instance pipeline.
///
/// Pure (it reads nothing but its arguments), so callers with their own
/// scheduler can fan out over any chunking of `[0, total_instances())`.
/// Seeded styles give the pose stream seed `2·index + salt` and the color
/// stream the seed right after it.
#[must_use]
pub fn stick_instance(
    config: &FormationConfig,
    world: Mat4,
    time: f32,
    index: usize,
) -> (Mat4, StickColor) {
    let coordinate = config.coordinate_of(index);
    let position = config.plane_position(coordinate);
    match config.style {
        SwingStyle::Seeded { seed_salt } => {
            let seed = index as u64 * 2 + seed_salt;
            (
                seeded_stick_pose(config, position, world, time, seed),
                wave_color(position, time, seed + 1),
            )
        }
        SwingStyle::Coherent => (
            coherent_stick_pose(config, position, world, time),
            positional_color(position),
        ),
    }
}

/// Evaluates the whole formation for one frame, filling `poses` and `colors`
/// index-aligned with [`FormationConfig::coordinate_of`].
///
/// Both slices must hold at least [`FormationConfig::total_instances`]
/// entries; that is checked before anything is written. Work fans out across
/// the rayon pool; every index is independent and each output slot is
/// written by exactly one task, so no ordering or locking is involved. After
/// `Ok(())`, both arrays are fully populated.
pub fn evaluate(
    config: &FormationConfig,
    world: Mat4,
    time: f32,
    poses: &mut [Mat4],
    colors: &mut [StickColor],
) -> Result<(), FormationError> {
    let total = config.validate()?;
    if poses.len() < total {
        return Err(FormationError::OutputTooSmall {
            required: total,
            provided: poses.len(),
        });
    }
    if colors.len() < total {
        return Err(FormationError::OutputTooSmall {
            required: total,
            provided: colors.len(),
        });
    }
    tracing::trace!(
        instances = total as u64,
        time = f64::from(time),
        "evaluating formation batch"
    );

    poses[..total]
        .par_iter_mut()
        .zip(colors[..total].par_iter_mut())
        .enumerate()
        .for_each(|(index, (pose, color))| {
            let (next_pose, next_color) = stick_instance(config, world, time, index);
            *pose = next_pose;
            *color = next_color;
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_close(a: Mat4, b: Mat4) {
        let lhs = a.to_cols_array();
        let rhs = b.to_cols_array();
        for (x, y) in lhs.iter().zip(rhs.iter()) {
            assert!((x - y).abs() < 1.0e-4, "{lhs:?} vs {rhs:?}");
        }
    }

    #[test]
    fn default_preset_matches_the_house_numbers() {
        let config = FormationConfig::default();
        assert_eq!(config.members_per_group(), 96);
        assert_eq!(config.group_total(), 21);
        assert_eq!(config.total_instances(), 2016);
        assert_eq!(config.validate().expect("valid default"), 2016);

        let parade = FormationConfig::parade();
        assert_eq!(parade.style, SwingStyle::Coherent);
        assert_eq!(parade.total_instances(), 2016);
    }

    #[test]
    fn validate_rejects_zero_counts() {
        let no_members = FormationConfig {
            member_count: UVec2::new(0, 12),
            ..FormationConfig::default()
        };
        assert!(matches!(
            no_members.validate(),
            Err(FormationError::InvalidConfig(_))
        ));

        let no_groups = FormationConfig {
            group_count: UVec2::new(7, 0),
            ..FormationConfig::default()
        };
        assert!(matches!(
            no_groups.validate(),
            Err(FormationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_overflowing_totals() {
        let absurd = FormationConfig {
            member_count: UVec2::splat(u32::MAX),
            group_count: UVec2::splat(u32::MAX),
            ..FormationConfig::default()
        };
        assert!(matches!(
            absurd.validate(),
            Err(FormationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn coordinate_roundtrip_on_spot_checks() {
        let config = FormationConfig::default();
        for index in [0, 1, 7, 8, 95, 96, 97, 671, 672, 2015] {
            let coordinate = config.coordinate_of(index);
            assert_eq!(config.index_of(coordinate), index);
        }

        let first_of_second_group = config.coordinate_of(96);
        assert_eq!(first_of_second_group.group, UVec2::new(1, 0));
        assert_eq!(first_of_second_group.member, UVec2::ZERO);
    }

    #[test]
    fn two_by_two_grid_centers_on_origin() {
        let config = FormationConfig {
            member_count: UVec2::new(2, 2),
            member_spacing: Vec2::new(1.0, 1.0),
            group_count: UVec2::new(1, 1),
            group_gap: Vec2::ZERO,
            ..FormationConfig::default()
        };
        let expected = [
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(-0.5, 0.5),
            Vec2::new(0.5, 0.5),
        ];
        for (index, want) in expected.iter().enumerate() {
            let got = config.plane_position(config.coordinate_of(index));
            assert_eq!(got, *want, "index {index}");
        }
    }

    #[test]
    fn composition_swings_rather_than_orbits() {
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let angle = 0.5_f32;
        let arm = 2.0_f32;
        let pose = compose_pose(Mat4::IDENTITY, origin, Vec3::Z, angle, arm);

        // Rotating (0, arm, 0) about +Z through the anchor.
        let expected = origin + Vec3::new(-arm * angle.sin(), arm * angle.cos(), 0.0);
        let got = pose.transform_point3(Vec3::ZERO);
        assert!((got - expected).length() < 1.0e-5, "{got} vs {expected}");
    }

    #[test]
    fn degenerate_axis_falls_back_to_z() {
        assert_eq!(swing_axis(f32::NAN), Vec3::Z);
        assert_eq!(swing_axis(0.0), Vec3::Z);
        let tilted = swing_axis(0.8);
        assert!((tilted.length() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn hsv_hits_the_primaries() {
        let red = StickColor::from_hsv(0.0, 1.0, 1.0);
        assert!((red.r - 1.0).abs() < 1.0e-4 && red.g.abs() < 1.0e-4 && red.b.abs() < 1.0e-4);

        let green = StickColor::from_hsv(1.0 / 3.0, 1.0, 1.0);
        assert!((green.g - 1.0).abs() < 1.0e-4 && green.r.abs() < 1.0e-3 && green.b.abs() < 1.0e-3);

        let blue = StickColor::from_hsv(2.0 / 3.0, 1.0, 1.0);
        assert!((blue.b - 1.0).abs() < 1.0e-4 && blue.r.abs() < 1.0e-3 && blue.g.abs() < 1.0e-3);

        // Zero saturation is gray at the given value, HDR included.
        let gray = StickColor::from_hsv(0.7, 0.0, 2.0);
        assert_eq!((gray.r, gray.g, gray.b, gray.a), (2.0, 2.0, 2.0, 1.0));
    }

    #[test]
    fn frac_wraps_into_the_unit_interval() {
        for value in [-2.25_f32, -1.0e-9, -0.4, 0.0, 0.5, 3.75, 1.0e6] {
            let wrapped = frac(value);
            assert!(
                (0.0..1.0).contains(&wrapped),
                "frac({value}) = {wrapped}"
            );
        }
        assert_eq!(frac(-0.25), 0.75);
        assert_eq!(frac(2.5), 0.5);
    }

    #[test]
    fn colors_are_deterministic_and_nonnegative() {
        let position = Vec2::new(1.5, -4.0);
        let first = wave_color(position, 12.3, 77);
        let again = wave_color(position, 12.3, 77);
        assert_eq!(first, again);
        assert!(first.r >= 0.0 && first.g >= 0.0 && first.b >= 0.0);
        assert_eq!(first.a, 1.0);

        let other_seed = wave_color(position, 12.3, 78);
        assert_ne!(first, other_seed);

        let fixed = positional_color(position);
        assert_eq!(fixed, positional_color(position));
        assert!(fixed.r >= 0.0 && fixed.g >= 0.0 && fixed.b >= 0.0);
    }

    #[test]
    fn seeded_poses_replay_and_differ_across_seeds() {
        let config = FormationConfig::default();
        let position = Vec2::new(0.25, -1.5);
        let first = seeded_stick_pose(&config, position, Mat4::IDENTITY, 3.0, 123);
        let again = seeded_stick_pose(&config, position, Mat4::IDENTITY, 3.0, 123);
        assert_eq!(first, again);

        let other = seeded_stick_pose(&config, position, Mat4::IDENTITY, 3.0, 125);
        assert_ne!(first, other);
    }

    #[test]
    fn world_transform_carries_both_styles() {
        let config = FormationConfig::default();
        let position = Vec2::new(-2.0, 0.75);
        let shift = Mat4::from_translation(Vec3::new(10.0, -3.0, 4.5));

        let seeded_local = seeded_stick_pose(&config, position, Mat4::IDENTITY, 1.25, 321);
        let seeded_world = seeded_stick_pose(&config, position, shift, 1.25, 321);
        assert_mat4_close(seeded_world, shift * seeded_local);

        let coherent_local = coherent_stick_pose(&config, position, Mat4::IDENTITY, 1.25);
        let coherent_world = coherent_stick_pose(&config, position, shift, 1.25);
        assert_mat4_close(coherent_world, shift * coherent_local);
    }

    #[test]
    fn evaluate_matches_the_per_instance_pipeline() {
        let config = FormationConfig {
            member_count: UVec2::new(3, 2),
            group_count: UVec2::new(2, 2),
            ..FormationConfig::default()
        };
        let total = config.total_instances();
        let mut poses = vec![Mat4::IDENTITY; total];
        let mut colors = vec![StickColor::new(0.0, 0.0, 0.0, 0.0); total];
        evaluate(&config, Mat4::IDENTITY, 2.5, &mut poses, &mut colors).expect("evaluate");

        for index in 0..total {
            let (pose, color) = stick_instance(&config, Mat4::IDENTITY, 2.5, index);
            assert_eq!(poses[index], pose, "pose at {index}");
            assert_eq!(colors[index], color, "color at {index}");
        }
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = FormationConfig {
            style: SwingStyle::Seeded { seed_salt: 9000 },
            ..FormationConfig::default()
        };
        let encoded = serde_json::to_string(&config).expect("serialize");
        let decoded: FormationConfig = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, config);
    }
}
