//! Celestial body definitions and calculations
//!
//! A [`CelestialBody`] owns its static description (size, photometric
//! parameters, orbit model, rotation elements) and the state computed for
//! the most recent instant. Positions are always relative to an explicit
//! time; the hierarchy in [`crate::system`] composes them across parents.

use crate::cache::PositionCache;
use crate::orbits::{OrbitModel, StateVector};
use crate::planetlib::{Body, PlanetType};
use crate::rotation::{CorrectionTable, RotationElements};
use crate::system::BodyId;
use crate::time::Time;
use crate::{photometry, Result};
use log::{debug, trace};
use nalgebra::{Matrix4, Rotation3, Translation3, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Answers whether an externally loaded asset (e.g. a shape model) is ready
pub trait AssetProvider {
    fn is_ready(&self, model: &str) -> bool;
}

/// Planetary ring system, radii in AU
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

/// Local state of one body at one instant, not yet applied to the body
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalState {
    jde: f64,
    state: StateVector,
    rot_local_to_parent: Rotation3<f64>,
    axis_rotation: f64,
    spin: f64,
}

/// A body of the solar system
#[derive(Debug)]
pub struct CelestialBody {
    name: String,
    kind: PlanetType,
    major: Option<Body>,
    radius: f64,
    one_minus_oblateness: f64,
    albedo: f64,
    absolute_magnitude: Option<f64>,
    slope: Option<f64>,
    rings: Option<Ring>,
    orbit: OrbitModel,
    rotation: RotationElements,
    gm: f64,
    model: Option<String>,

    pub(crate) parent: Option<BodyId>,
    pub(crate) satellites: Vec<BodyId>,

    last_jde: Option<f64>,
    ecliptic_pos: Vector3<f64>,
    ecliptic_velocity: Vector3<f64>,
    heliocentric_pos: Vector3<f64>,
    heliocentric_velocity: Vector3<f64>,
    rot_local_to_parent: Rotation3<f64>,
    axis_rotation: f64,
    trans_matrix: Matrix4<f64>,
    cache: Mutex<PositionCache>,
}

impl CelestialBody {
    /// Create a new celestial body
    pub fn new(
        name: &str,
        kind: PlanetType,
        orbit: OrbitModel,
        rotation: RotationElements,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            major: Body::from_name(name),
            radius: 0.0,
            one_minus_oblateness: 1.0,
            albedo: 0.0,
            absolute_magnitude: None,
            slope: None,
            rings: None,
            orbit,
            rotation,
            gm: crate::constants::GM_SUN_AU,
            model: None,
            parent: None,
            satellites: Vec::new(),
            last_jde: None,
            ecliptic_pos: Vector3::zeros(),
            ecliptic_velocity: Vector3::zeros(),
            heliocentric_pos: Vector3::zeros(),
            heliocentric_velocity: Vector3::zeros(),
            rot_local_to_parent: Rotation3::identity(),
            axis_rotation: 0.0,
            trans_matrix: Matrix4::identity(),
            cache: Mutex::new(PositionCache::default()),
        }
    }

    /// Equatorial radius in AU and one minus the oblateness
    pub fn with_radius(mut self, radius: f64, one_minus_oblateness: f64) -> Self {
        self.radius = radius;
        self.one_minus_oblateness = one_minus_oblateness;
        self
    }

    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo;
        self
    }

    /// H and G (minor planets) or H and k (comets)
    pub fn with_magnitude_parameters(
        mut self,
        absolute_magnitude: Option<f64>,
        slope: Option<f64>,
    ) -> Self {
        self.absolute_magnitude = absolute_magnitude;
        self.slope = slope;
        self
    }

    pub fn with_rings(mut self, rings: Ring) -> Self {
        self.rings = Some(rings);
        self
    }

    /// Gravitational parameter of the central body, AU³/day²
    pub fn with_gm(mut self, gm: f64) -> Self {
        self.gm = gm;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PlanetType {
        self.kind
    }

    /// The major body this is, if any
    pub fn major_body(&self) -> Option<Body> {
        self.major
    }

    /// Equatorial radius, AU
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Polar radius, AU
    pub fn polar_radius(&self) -> f64 {
        self.radius * self.one_minus_oblateness
    }

    pub fn one_minus_oblateness(&self) -> f64 {
        self.one_minus_oblateness
    }

    pub fn albedo(&self) -> f64 {
        self.albedo
    }

    pub fn absolute_magnitude(&self) -> Option<f64> {
        self.absolute_magnitude
    }

    pub fn slope(&self) -> Option<f64> {
        self.slope
    }

    pub fn rings(&self) -> Option<&Ring> {
        self.rings.as_ref()
    }

    pub fn orbit(&self) -> &OrbitModel {
        &self.orbit
    }

    pub(crate) fn orbit_mut(&mut self) -> &mut OrbitModel {
        &mut self.orbit
    }

    pub fn rotation(&self) -> &RotationElements {
        &self.rotation
    }

    pub fn gm(&self) -> f64 {
        self.gm
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    /// Satellites in insertion order
    pub fn satellites(&self) -> &[BodyId] {
        &self.satellites
    }

    /// JDE of the last computed state
    pub fn last_jde(&self) -> Option<f64> {
        self.last_jde
    }

    /// Parentocentric position at the last computed instant, AU
    pub fn ecliptic_pos(&self) -> Vector3<f64> {
        self.ecliptic_pos
    }

    /// Parentocentric velocity at the last computed instant, AU/day
    pub fn ecliptic_velocity(&self) -> Vector3<f64> {
        self.ecliptic_velocity
    }

    /// Heliocentric position at the last composed instant, AU
    pub fn heliocentric_ecliptic_pos(&self) -> Vector3<f64> {
        self.heliocentric_pos
    }

    /// Heliocentric velocity at the last composed instant, AU/day
    pub fn heliocentric_ecliptic_velocity(&self) -> Vector3<f64> {
        self.heliocentric_velocity
    }

    pub fn rot_local_to_parent(&self) -> &Rotation3<f64> {
        &self.rot_local_to_parent
    }

    /// Sidereal rotation angle W at the last computed instant, degrees
    pub fn axis_rotation(&self) -> f64 {
        self.axis_rotation
    }

    /// Body-fixed to parent-centred ecliptic transform
    pub fn trans_matrix(&self) -> &Matrix4<f64> {
        &self.trans_matrix
    }

    fn lock_cache(&self) -> MutexGuard<'_, PositionCache> {
        // A poisoned cache only ever holds fully written entries
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn reset_cache(&mut self, capacity: usize) {
        *self.lock_cache() = PositionCache::new(capacity);
    }

    /// Evaluate the orbit model at `jde` and keep the result as current state
    pub fn compute_position(&mut self, jde: f64) {
        let state = self.orbit.evaluate(jde);
        trace!("{} at JDE {}: {:?}", self.name, jde, state.position);
        self.ecliptic_pos = state.position;
        self.ecliptic_velocity = state.velocity;
        self.last_jde = Some(jde);
        self.lock_cache().store(jde, state.position);
    }

    /// Parentocentric position at an arbitrary `jde`, from the cache when possible
    pub fn ecliptic_pos_at(&self, jde: f64) -> Vector3<f64> {
        if self.last_jde == Some(jde) {
            return self.ecliptic_pos;
        }
        let mut cache = self.lock_cache();
        if let Some(position) = cache.get(jde) {
            return position;
        }
        debug!("{}: position cache miss for JDE {}", self.name, jde);
        let position = self.orbit.position(jde);
        cache.store(jde, position);
        position
    }

    /// Compute orientation and the full local-to-parent transform at `t`.
    ///
    /// The axis uses ephemeris time; the spin uses the flavour the rotation
    /// elements ask for, so Earth spins with civil time.
    pub fn compute_trans_matrix(&mut self, t: &Time, table: &CorrectionTable) -> Result<()> {
        let jde = t.jde();
        let axis_rotation = self.rotation.sidereal_rotation_angle(t, table)?;
        let spin = self.rotation.spin_angle(t, table)?;
        self.rotation.refresh_axis(jde, table);
        self.rot_local_to_parent = self.rotation.axis_rotation(jde, table);
        self.axis_rotation = axis_rotation;
        self.set_trans_matrix(spin);
        Ok(())
    }

    fn set_trans_matrix(&mut self, spin: f64) {
        self.trans_matrix = Translation3::from(self.ecliptic_pos).to_homogeneous()
            * self.rot_local_to_parent.to_homogeneous()
            * Rotation3::from_axis_angle(&Vector3::z_axis(), spin.to_radians()).to_homogeneous();
    }

    /// Position and orientation at `t`, leaving the body untouched
    pub(crate) fn evaluate(&self, t: &Time, table: &CorrectionTable) -> Result<LocalState> {
        let jde = t.jde();
        Ok(LocalState {
            jde,
            state: self.orbit.evaluate(jde),
            rot_local_to_parent: self.rotation.axis_rotation(jde, table),
            axis_rotation: self.rotation.sidereal_rotation_angle(t, table)?,
            spin: self.rotation.spin_angle(t, table)?,
        })
    }

    /// Make an evaluated local state the current one
    pub(crate) fn commit(&mut self, local: LocalState, table: &CorrectionTable) {
        let jde = local.jde;
        trace!("{} at JDE {}: {:?}", self.name, jde, local.state.position);
        self.ecliptic_pos = local.state.position;
        self.ecliptic_velocity = local.state.velocity;
        self.last_jde = Some(jde);
        self.lock_cache().store(jde, local.state.position);
        self.rotation.refresh_axis(jde, table);
        self.rot_local_to_parent = local.rot_local_to_parent;
        self.axis_rotation = local.axis_rotation;
        self.set_trans_matrix(local.spin);
    }

    pub(crate) fn set_heliocentric(&mut self, position: Vector3<f64>, velocity: Vector3<f64>) {
        self.heliocentric_pos = position;
        self.heliocentric_velocity = velocity;
    }

    pub(crate) fn set_fixed_position(&mut self, position: Vector3<f64>) {
        self.ecliptic_pos = position;
        self.ecliptic_velocity = Vector3::zeros();
        self.lock_cache().clear();
    }

    /// Rotation period in days, signed
    pub fn sidereal_day(&self) -> f64 {
        self.rotation.sidereal_day()
    }

    pub fn sidereal_period(&self) -> f64 {
        self.rotation.sidereal_period()
    }

    /// Length of the mean solar day in days.
    ///
    /// `period` is the orbital period around the Sun: the body's own for
    /// planets, the parent's for moons. Without one the sidereal day is
    /// returned.
    pub fn mean_solar_day(&self, period: f64) -> f64 {
        let sday = self.sidereal_day();
        if period == 0.0 || !period.is_finite() {
            return sday;
        }
        sday / (1.0 - sday / period)
    }

    pub fn distance_to(&self, observer: &Vector3<f64>) -> f64 {
        (self.heliocentric_pos - observer).norm()
    }

    /// Phase angle seen from a heliocentric observer position, radians
    pub fn phase_angle(&self, observer: &Vector3<f64>) -> f64 {
        photometry::phase_angle(&self.heliocentric_pos, observer)
    }

    /// Elongation from the Sun seen from a heliocentric observer position, radians
    pub fn elongation(&self, observer: &Vector3<f64>) -> f64 {
        photometry::elongation(&self.heliocentric_pos, observer)
    }

    /// Illuminated fraction of the disk
    pub fn phase(&self, observer: &Vector3<f64>) -> f64 {
        photometry::illuminated_fraction(self.phase_angle(observer))
    }

    fn semidiameter(&self, radius: f64, observer: &Vector3<f64>) -> f64 {
        let distance = self.distance_to(observer);
        if distance == 0.0 {
            return 180.0;
        }
        radius.atan2(distance).to_degrees()
    }

    /// Apparent semidiameter of the globe, degrees
    pub fn spheroid_angular_size(&self, observer: &Vector3<f64>) -> f64 {
        self.semidiameter(self.radius, observer)
    }

    /// Apparent semidiameter including rings, degrees
    pub fn angular_size(&self, observer: &Vector3<f64>) -> f64 {
        let radius = self
            .rings
            .map_or(self.radius, |r| r.outer_radius.max(self.radius));
        self.semidiameter(radius, observer)
    }

    /// Photometric description of this body seen from `observer`
    pub fn magnitude_input(
        &self,
        observer: &Vector3<f64>,
        ring_tilt_sin: f64,
    ) -> photometry::MagnitudeInput {
        photometry::MagnitudeInput {
            body: self.major,
            kind: self.kind,
            radius: self.radius,
            albedo: self.albedo,
            absolute_magnitude: self.absolute_magnitude,
            slope: self.slope,
            r: self.heliocentric_pos.norm(),
            delta: self.distance_to(observer),
            phase_angle: self.phase_angle(observer),
            ring_tilt_sin,
        }
    }

    /// Whether the body's external model is available; bodies without one always are
    pub fn model_ready(&self, provider: &dyn AssetProvider) -> bool {
        self.model.as_deref().map_or(true, |m| provider.is_ready(m))
    }
}
