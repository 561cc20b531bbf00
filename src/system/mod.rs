//! Flat store of bodies linked into a parent/satellite tree
//!
//! Bodies are addressed by [`BodyId`], an index into the store. A parent is
//! always inserted before its satellites, so index order is a topological
//! order of the tree and composition can walk the store front to back.

use crate::celestial::{AssetProvider, CelestialBody};
use crate::config::{Settings, SystemConfig};
use crate::constants::{J2000, SUN_RADIUS_AU};
use crate::framelib::ecliptic_to_icrf;
use crate::orbits::{OrbitModel, OsculatingElements, StateVector};
use crate::photometry::{self, MagnitudeAlgorithm};
use crate::planetlib::PlanetType;
use crate::rotation::CorrectionTable;
use crate::time::Time;
use crate::{OrreryError, Result};
use log::{debug, warn};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index of a body inside its hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

impl BodyId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A body refused while building from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedBody {
    pub name: String,
    pub reason: String,
}

/// The solar system tree with its shared settings and correction table
#[derive(Debug)]
pub struct BodyHierarchy {
    bodies: Vec<CelestialBody>,
    names: HashMap<String, BodyId>,
    root: Option<BodyId>,
    settings: Arc<Settings>,
    corrections: CorrectionTable,
    current_time: Option<Time>,
    rejected: Vec<RejectedBody>,
}

impl BodyHierarchy {
    pub fn new(settings: Settings) -> Self {
        Self {
            bodies: Vec::new(),
            names: HashMap::new(),
            root: None,
            settings: Arc::new(settings),
            corrections: CorrectionTable::default(),
            current_time: None,
            rejected: Vec::new(),
        }
    }

    /// Build from configuration records.
    ///
    /// Records may come in any order. A body that fails to build, names an
    /// unknown parent or hangs below a rejected body is logged and listed in
    /// [`rejected`](Self::rejected); everything else is inserted.
    pub fn from_config(config: &SystemConfig) -> Self {
        let mut hierarchy = Self::new(config.settings.clone());
        let mut pending: Vec<_> = config.bodies.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for record in pending {
                let parent = match record.parent.as_deref() {
                    None => None,
                    Some(name) => match hierarchy.find(name) {
                        Some(id) => Some(id),
                        None if hierarchy.is_rejected(name) => {
                            hierarchy.reject(&record.name, format!("parent {name} was rejected"));
                            continue;
                        }
                        None => {
                            deferred.push(record);
                            continue;
                        }
                    },
                };
                if let Err(e) = record.build().and_then(|body| hierarchy.add_body(body, parent)) {
                    hierarchy.reject(&record.name, e.to_string());
                }
            }
            if deferred.len() == before {
                for record in deferred {
                    let parent = record.parent.as_deref().unwrap_or_default();
                    hierarchy.reject(&record.name, format!("unknown parent {parent}"));
                }
                break;
            }
            pending = deferred;
        }
        hierarchy
    }

    fn is_rejected(&self, name: &str) -> bool {
        self.rejected.iter().any(|r| r.name == name)
    }

    fn reject(&mut self, name: &str, reason: String) {
        warn!("rejecting body {name}: {reason}");
        self.rejected.push(RejectedBody {
            name: name.to_string(),
            reason,
        });
    }

    /// Insert a body below `parent`, or as the root when `parent` is `None`
    pub fn add_body(&mut self, mut body: CelestialBody, parent: Option<BodyId>) -> Result<BodyId> {
        if self.names.contains_key(body.name()) {
            return Err(OrreryError::InvalidConfiguration(format!(
                "duplicate body name {}",
                body.name()
            )));
        }
        match parent {
            None if self.root.is_some() => {
                return Err(OrreryError::InvalidConfiguration(format!(
                    "{} would be a second root",
                    body.name()
                )))
            }
            Some(p) if p.0 >= self.bodies.len() => {
                return Err(OrreryError::InvalidConfiguration(format!(
                    "{}: unknown parent {p}",
                    body.name()
                )))
            }
            _ => {}
        }

        let id = BodyId(self.bodies.len());
        body.parent = parent;
        body.reset_cache(self.settings.cache_capacity);
        match parent {
            Some(p) => self.bodies[p.0].satellites.push(id),
            None => self.root = Some(id),
        }
        self.names.insert(body.name().to_string(), id);
        self.bodies.push(body);
        Ok(id)
    }

    pub fn get(&self, id: BodyId) -> Option<&CelestialBody> {
        self.bodies.get(id.0)
    }

    fn body(&self, id: BodyId) -> Result<&CelestialBody> {
        self.get(id)
            .ok_or_else(|| OrreryError::UnknownBody(id.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.names.get(name).copied()
    }

    pub fn id_of(&self, name: &str) -> Result<BodyId> {
        self.find(name)
            .ok_or_else(|| OrreryError::UnknownBody(name.to_string()))
    }

    pub fn root(&self) -> Option<BodyId> {
        self.root
    }

    /// Bodies in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn rejected(&self) -> &[RejectedBody] {
        &self.rejected
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    /// Replace the settings; caches are rebuilt when their capacity changes
    pub fn reconfigure(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        if settings.cache_capacity != self.settings.cache_capacity {
            debug!("resizing position caches to {}", settings.cache_capacity);
            for body in &mut self.bodies {
                body.reset_cache(settings.cache_capacity);
            }
        }
        self.settings = Arc::new(settings);
        Ok(())
    }

    pub fn corrections(&self) -> &CorrectionTable {
        &self.corrections
    }

    pub fn current_time(&self) -> Option<Time> {
        self.current_time
    }

    fn current_jde(&self) -> f64 {
        self.current_time.map_or(J2000, |t| t.jde())
    }

    /// Advance every body to `t`.
    ///
    /// Local positions and orientations are evaluated per body (on the rayon
    /// pool when enabled), then composed into heliocentric state in tree
    /// order. Nothing is applied unless every body evaluates, so on error
    /// the whole hierarchy stays at its previous instant.
    pub fn advance_to(&mut self, t: &Time) -> Result<()> {
        let mut corrections = self.corrections.clone();
        corrections.update_all(t.jde());
        let locals: Vec<_> = if self.settings.parallel {
            self.bodies
                .par_iter()
                .map(|body| body.evaluate(t, &corrections))
                .collect::<Result<_>>()?
        } else {
            self.bodies
                .iter()
                .map(|body| body.evaluate(t, &corrections))
                .collect::<Result<_>>()?
        };
        for (body, local) in self.bodies.iter_mut().zip(locals) {
            body.commit(local, &corrections);
        }
        self.corrections = corrections;
        self.compose();
        self.current_time = Some(*t);
        Ok(())
    }

    fn compose(&mut self) {
        for i in 0..self.bodies.len() {
            let body = &self.bodies[i];
            let (position, velocity) = match body.parent {
                Some(p) => {
                    let parent = &self.bodies[p.0];
                    (
                        parent.heliocentric_ecliptic_pos() + body.ecliptic_pos(),
                        parent.heliocentric_ecliptic_velocity() + body.ecliptic_velocity(),
                    )
                }
                None => (body.ecliptic_pos(), body.ecliptic_velocity()),
            };
            self.bodies[i].set_heliocentric(position, velocity);
        }
    }

    /// Heliocentric ecliptic position at the current time, AU
    pub fn heliocentric_ecliptic_pos(&self, id: BodyId) -> Result<Vector3<f64>> {
        Ok(self.body(id)?.heliocentric_ecliptic_pos())
    }

    /// Heliocentric ecliptic velocity at the current time, AU/day
    pub fn heliocentric_ecliptic_velocity(&self, id: BodyId) -> Result<Vector3<f64>> {
        Ok(self.body(id)?.heliocentric_ecliptic_velocity())
    }

    /// Heliocentric position at any `jde`, summed up the parent chain
    pub fn heliocentric_ecliptic_pos_at(&self, id: BodyId, jde: f64) -> Result<Vector3<f64>> {
        let mut position = Vector3::zeros();
        let mut current = Some(id);
        while let Some(cid) = current {
            let body = self.body(cid)?;
            position += body.ecliptic_pos_at(jde);
            current = body.parent;
        }
        Ok(position)
    }

    pub fn heliocentric_ecliptic_velocity_at(&self, id: BodyId, jde: f64) -> Result<Vector3<f64>> {
        let mut velocity = Vector3::zeros();
        let mut current = Some(id);
        while let Some(cid) = current {
            let body = self.body(cid)?;
            velocity += if body.last_jde() == Some(jde) {
                body.ecliptic_velocity()
            } else {
                body.orbit().evaluate(jde).velocity
            };
            current = body.parent;
        }
        Ok(velocity)
    }

    /// Place a fixed body at a heliocentric position
    pub fn set_heliocentric_ecliptic_pos(
        &mut self,
        id: BodyId,
        position: Vector3<f64>,
    ) -> Result<()> {
        let body = self.body(id)?;
        if !body.orbit().is_fixed() {
            return Err(OrreryError::UnsupportedOperation(format!(
                "{} does not have a fixed orbit",
                body.name()
            )));
        }
        let local = match body.parent {
            Some(p) => position - self.bodies[p.0].heliocentric_ecliptic_pos(),
            None => position,
        };

        let body = &mut self.bodies[id.0];
        if let OrbitModel::Fixed(orbit) = body.orbit_mut() {
            orbit.set_position(local);
        }
        body.set_fixed_position(local);
        self.compose();
        Ok(())
    }

    /// Observer-centred position in the ICRF (J2000 equatorial) frame, AU
    pub fn j2000_equatorial_pos(&self, id: BodyId, observer: BodyId) -> Result<Vector3<f64>> {
        let relative =
            self.heliocentric_ecliptic_pos(id)? - self.heliocentric_ecliptic_pos(observer)?;
        Ok(ecliptic_to_icrf(&relative))
    }

    /// Visual magnitude with the configured algorithm
    pub fn v_magnitude(&self, id: BodyId, observer: &Vector3<f64>) -> Result<f64> {
        self.v_magnitude_with(id, observer, self.settings.magnitude_algorithm)
    }

    /// Visual magnitude seen from a heliocentric observer position
    pub fn v_magnitude_with(
        &self,
        id: BodyId,
        observer: &Vector3<f64>,
        algorithm: MagnitudeAlgorithm,
    ) -> Result<f64> {
        let body = self.body(id)?;
        let ring_tilt = if body.rings().is_some() {
            let pole = body.rotation().pole_vector(self.current_jde(), &self.corrections);
            photometry::ring_tilt_sin(&pole, &body.heliocentric_ecliptic_pos(), observer)
        } else {
            0.0
        };
        photometry::v_magnitude(algorithm, &body.magnitude_input(observer, ring_tilt))
    }

    /// Brightness at a mean opposition, for bodies outside Earth's orbit.
    ///
    /// Moons use their planet's semi-major axis, and only count when their
    /// own orbit fits inside the opposition distance. `None` where no
    /// opposition is defined.
    pub fn mean_opposition_magnitude(&self, id: BodyId) -> Result<Option<f64>> {
        let body = self.body(id)?;
        if Some(id) == self.root || body.kind() == PlanetType::Star {
            return Ok(None);
        }
        let jde = self.current_jde();
        let a = match body.parent {
            Some(p) if Some(p) != self.root => {
                let a = self.body(p)?.orbit().semi_major_axis(jde);
                match (a, body.orbit().semi_major_axis(jde)) {
                    (Some(a), Some(local)) if a - 1.0 > local => Some(a),
                    _ => None,
                }
            }
            _ => body.orbit().semi_major_axis(jde),
        };
        let a = match a {
            Some(a) if a > 1.0 => a,
            _ => return Ok(None),
        };
        let mut input = body.magnitude_input(&Vector3::zeros(), 0.0);
        input.r = 1.0;
        input.delta = 1.0;
        input.phase_angle = 0.0;
        let v10 = photometry::v_magnitude(self.settings.magnitude_algorithm, &input)?;
        Ok(Some(v10 + 5.0 * (a * (a - 1.0)).log10()))
    }

    fn orbital_period(&self, body: &CelestialBody, jde: f64) -> Option<f64> {
        let sidereal = body.sidereal_period();
        if sidereal > 0.0 {
            Some(sidereal)
        } else {
            body.orbit().orbital_period(jde, body.gm())
        }
    }

    /// Length of the mean solar day in days; moons use their planet's year
    pub fn mean_solar_day(&self, id: BodyId) -> Result<f64> {
        let body = self.body(id)?;
        let orbiter = match body.parent {
            Some(p) if Some(p) != self.root => self.body(p)?,
            _ => body,
        };
        let period = self.orbital_period(orbiter, self.current_jde()).unwrap_or(0.0);
        Ok(body.mean_solar_day(period))
    }

    /// Bodies that may shadow `id` at the current time.
    ///
    /// Satellites come first, then the parent, then sibling satellites. Each
    /// must be closer to the Sun and its penumbra cone must reach the body.
    pub fn candidates_for_shadow(&self, id: BodyId) -> Result<Vec<BodyId>> {
        let body = self.body(id)?;
        if Some(id) == self.root {
            return Ok(Vec::new());
        }
        let sun_radius = self
            .root
            .and_then(|r| self.get(r))
            .map(|sun| sun.radius())
            .filter(|r| *r > 0.0)
            .unwrap_or(SUN_RADIUS_AU);
        let position = body.heliocentric_ecliptic_pos();
        let reaches = |caster: BodyId| {
            let caster = &self.bodies[caster.0];
            shadow_reaches(
                &caster.heliocentric_ecliptic_pos(),
                caster.radius(),
                &position,
                body.radius(),
                sun_radius,
            )
        };

        let mut candidates: Vec<BodyId> = body
            .satellites()
            .iter()
            .copied()
            .filter(|&s| reaches(s))
            .collect();
        if let Some(parent) = body.parent.filter(|p| Some(*p) != self.root) {
            if reaches(parent) {
                candidates.push(parent);
            }
            candidates.extend(
                self.bodies[parent.0]
                    .satellites()
                    .iter()
                    .copied()
                    .filter(|&s| s != id && reaches(s)),
            );
        }
        Ok(candidates)
    }

    /// Osculating state at `jde` from elements taken at `jde0`.
    ///
    /// Bodies on a series theory get elements re-derived from their
    /// parentocentric state vector at `jde0`.
    pub fn osculating_state(&self, id: BodyId, jde0: f64, jde: f64) -> Result<StateVector> {
        let body = self.body(id)?;
        match body.orbit() {
            OrbitModel::Osculating(orbit) => Ok(orbit.evaluate_from_epoch(jde0, jde)),
            OrbitModel::Series(series) => {
                let r = series.position(jde0);
                let v = series.velocity(jde0);
                let elements = OsculatingElements::from_state(jde0, &r, &v, body.gm())?;
                Ok(elements.state_at(jde))
            }
            OrbitModel::Fixed(_) => Err(OrreryError::UnsupportedOperation(format!(
                "{} has no orbit to osculate",
                body.name()
            ))),
        }
    }

    /// Heliocentric points along one orbital period centred on `jde`.
    ///
    /// The parent is held at its position at `jde`; `segments + 1` points
    /// are returned so the path closes.
    pub fn orbit_path(&self, id: BodyId, jde: f64, segments: usize) -> Result<Vec<Vector3<f64>>> {
        if segments == 0 {
            return Err(OrreryError::InvalidConfiguration(
                "an orbit path needs at least one segment".into(),
            ));
        }
        let body = self.body(id)?;
        if body.orbit().is_fixed() {
            return Err(OrreryError::UnsupportedOperation(format!(
                "{} does not move along an orbit",
                body.name()
            )));
        }
        let period = self.orbital_period(body, jde).ok_or_else(|| {
            OrreryError::UnsupportedOperation(format!("{} has no orbital period", body.name()))
        })?;
        let origin = match body.parent {
            Some(p) => self.heliocentric_ecliptic_pos_at(p, jde)?,
            None => Vector3::zeros(),
        };
        let start = jde - period / 2.0;
        let step = period / segments as f64;
        Ok((0..=segments)
            .map(|k| origin + body.orbit().position(start + k as f64 * step))
            .collect())
    }

    pub fn model_ready(&self, id: BodyId, provider: &dyn AssetProvider) -> Result<bool> {
        Ok(self.body(id)?.model_ready(provider))
    }
}

/// Whether the penumbra of a spherical caster reaches a body.
///
/// All positions are heliocentric. The cone is measured along the Sun-caster
/// line at the body's projected distance.
fn shadow_reaches(
    caster: &Vector3<f64>,
    caster_radius: f64,
    body: &Vector3<f64>,
    body_radius: f64,
    sun_radius: f64,
) -> bool {
    let caster_distance = caster.norm();
    if caster_distance == 0.0 {
        return false;
    }
    let axis = caster / caster_distance;
    let along = axis.dot(body);
    if along <= caster_distance {
        return false;
    }
    let penumbra = caster_radius
        + (along - caster_distance) * (sun_radius + caster_radius) / caster_distance;
    let off_axis = (body - axis * along).norm();
    off_axis < penumbra + body_radius
}
