//! Agent proxies
//!
//! One proxy bridges one moving entity to one solver agent record: it
//! pushes the host position and desired velocity in before the step and
//! reads the resolved velocity back out after. The plane-perpendicular
//! coordinate always comes from the host, so elevation controlled outside
//! the solver (jumping, terrain following) is never overwritten by the
//! solver's 2D computation.
//!
//! Ownership comes in two variants: [`OwnedProxy`] rents its record from
//! the bundle and releases it on reassignment or destruction;
//! [`BorrowedProxy`] adopts a record owned elsewhere and never releases.

use crate::bundle::Bundle;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use swerve_core::agent::AgentRecord;
use swerve_core::layer::LayerMask;
use swerve_core::math::AxisPair;
use swerve_core::pool::Handle;
use tracing::warn;

/// Template copied onto the solver record on association and on settings
/// commits. Defaults match [`AgentRecord::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTemplate {
    pub radius: f32,
    pub radius_obst: f32,
    pub height: f32,
    pub max_speed: f32,
    pub max_neighbors: u32,
    pub neighbor_dist: f32,
    pub time_horizon: f32,
    pub time_horizon_obst: f32,
    pub layer_occupation: LayerMask,
    pub layer_ignore: LayerMask,
    pub navigation_enabled: bool,
    pub collision_enabled: bool,
}

impl Default for AgentTemplate {
    fn default() -> Self {
        let rec = AgentRecord::default();
        Self {
            radius: rec.radius,
            radius_obst: rec.radius_obst,
            height: rec.height,
            max_speed: rec.max_speed,
            max_neighbors: rec.max_neighbors,
            neighbor_dist: rec.neighbor_dist,
            time_horizon: rec.time_horizon,
            time_horizon_obst: rec.time_horizon_obst,
            layer_occupation: rec.layer_occupation,
            layer_ignore: rec.layer_ignore,
            navigation_enabled: rec.navigation_enabled,
            collision_enabled: rec.collision_enabled,
        }
    }
}

impl AgentTemplate {
    /// Copies the full field set onto `rec`.
    pub fn apply_to(&self, rec: &mut AgentRecord) {
        rec.radius = self.radius;
        rec.radius_obst = self.radius_obst;
        rec.height = self.height;
        rec.max_speed = self.max_speed;
        rec.max_neighbors = self.max_neighbors;
        rec.neighbor_dist = self.neighbor_dist;
        rec.time_horizon = self.time_horizon;
        rec.time_horizon_obst = self.time_horizon_obst;
        rec.layer_occupation = self.layer_occupation;
        rec.layer_ignore = self.layer_ignore;
        rec.navigation_enabled = self.navigation_enabled;
        rec.collision_enabled = self.collision_enabled;
    }
}

/// Shared state and behavior of both proxy variants.
struct ProxyCore {
    template: AgentTemplate,
    plane: AxisPair,
    /// Re-commit the template every exchange; useful while tuning settings
    /// at runtime, wasted writes otherwise.
    always_update: bool,
    agent: Option<Handle<AgentRecord>>,
}

impl ProxyCore {
    fn new(template: AgentTemplate, plane: AxisPair) -> Self {
        Self {
            template,
            plane,
            always_update: false,
            agent: None,
        }
    }

    fn commit_settings(&self, bundle: &mut Bundle) {
        let Some(handle) = self.agent else { return };
        match bundle.agent_mut(handle) {
            Ok(rec) => self.template.apply_to(rec),
            Err(err) => warn!(?handle, %err, "commit_settings on a dead agent record"),
        }
    }

    fn exchange(
        &self,
        bundle: &mut Bundle,
        position: &mut Vec3,
        velocity: &mut Vec3,
        heading: &mut Vec3,
    ) {
        let Some(handle) = self.agent else { return };
        if self.always_update {
            self.commit_settings(bundle);
        }
        let rec = match bundle.agent_mut(handle) {
            Ok(rec) => rec,
            Err(err) => {
                warn!(?handle, %err, "exchange on a dead agent record");
                return;
            }
        };

        if !rec.navigation_enabled {
            // The entity stays where the host puts it and stops
            // negotiating; collision_enabled alone decides whether others
            // still see it.
            rec.position = *position;
            rec.pref_velocity = Vec3::ZERO;
            rec.velocity = Vec3::ZERO;
            return;
        }

        // Elevation comes from the host, planar coordinates from the
        // solver's authoritative record.
        let pinned = self.plane.pin(rec.position, *position);
        rec.position = pinned;
        rec.pref_velocity = *velocity;

        *position = pinned;
        *velocity = rec.velocity;
        *heading = rec.velocity;
    }

    fn enable(&self, bundle: &mut Bundle, position: Vec3) {
        let Some(handle) = self.agent else { return };
        if let Ok(rec) = bundle.agent_mut(handle) {
            rec.position = position;
            rec.navigation_enabled = self.template.navigation_enabled;
            rec.collision_enabled = self.template.collision_enabled;
        }
    }

    fn disable(&self, bundle: &mut Bundle) {
        let Some(handle) = self.agent else { return };
        if let Ok(rec) = bundle.agent_mut(handle) {
            rec.navigation_enabled = false;
            rec.collision_enabled = false;
        }
    }
}

/// Capability interface common to both proxy variants.
pub trait AgentProxy {
    fn agent(&self) -> Option<Handle<AgentRecord>>;
    fn template(&self) -> &AgentTemplate;
    fn template_mut(&mut self) -> &mut AgentTemplate;
    /// Re-commit the template on every exchange.
    fn set_always_update(&mut self, always: bool);

    /// Pushes the template onto the current record.
    fn commit_settings(&self, bundle: &mut Bundle);

    /// Per-step data exchange. Inputs: host `position` and desired
    /// `velocity`. Outputs (written in place): the solver-side position
    /// with host elevation, the resolved velocity, and the heading.
    fn exchange(
        &mut self,
        bundle: &mut Bundle,
        position: &mut Vec3,
        velocity: &mut Vec3,
        heading: &mut Vec3,
    );

    /// Re-activates the record at `position` with the template's enable flags.
    fn enable(&self, bundle: &mut Bundle, position: Vec3);

    /// Stops the record from navigating or being seen until re-enabled.
    fn disable(&self, bundle: &mut Bundle);
}

macro_rules! delegate_proxy_impl {
    ($ty:ty) => {
        impl AgentProxy for $ty {
            fn agent(&self) -> Option<Handle<AgentRecord>> {
                self.core.agent
            }
            fn template(&self) -> &AgentTemplate {
                &self.core.template
            }
            fn template_mut(&mut self) -> &mut AgentTemplate {
                &mut self.core.template
            }
            fn set_always_update(&mut self, always: bool) {
                self.core.always_update = always;
            }
            fn commit_settings(&self, bundle: &mut Bundle) {
                self.core.commit_settings(bundle);
            }
            fn exchange(
                &mut self,
                bundle: &mut Bundle,
                position: &mut Vec3,
                velocity: &mut Vec3,
                heading: &mut Vec3,
            ) {
                self.core.exchange(bundle, position, velocity, heading);
            }
            fn enable(&self, bundle: &mut Bundle, position: Vec3) {
                self.core.enable(bundle, position);
            }
            fn disable(&self, bundle: &mut Bundle) {
                self.core.disable(bundle);
            }
        }
    };
}

/// Proxy that owns its record: rents it from the bundle and releases it
/// on reassignment and destruction.
pub struct OwnedProxy {
    core: ProxyCore,
}

impl OwnedProxy {
    /// Rents a record at `position` with the default template.
    pub fn spawn(bundle: &mut Bundle, position: Vec3) -> Self {
        Self::spawn_with(bundle, position, AgentTemplate::default(), AxisPair::default())
    }

    pub fn spawn_with(
        bundle: &mut Bundle,
        position: Vec3,
        template: AgentTemplate,
        plane: AxisPair,
    ) -> Self {
        let mut proxy = Self {
            core: ProxyCore::new(template, plane),
        };
        let handle = bundle.add_agent(position);
        proxy.core.agent = Some(handle);
        proxy.core.commit_settings(bundle);
        proxy
    }

    /// Reassigns the underlying record, releasing the previous one.
    ///
    /// Assigning the record already held is a no-op; assigning `None`
    /// releases and detaches (the destroy path).
    pub fn set_agent(&mut self, bundle: &mut Bundle, agent: Option<Handle<AgentRecord>>) {
        if self.core.agent == agent {
            return;
        }
        if let Some(previous) = self.core.agent.take() {
            bundle.remove_agent(previous);
        }
        self.core.agent = agent;
        if agent.is_some() {
            self.core.commit_settings(bundle);
        }
    }

    /// Releases the record. The proxy can be respawned via `set_agent`.
    pub fn destroy(&mut self, bundle: &mut Bundle) {
        self.set_agent(bundle, None);
    }
}

delegate_proxy_impl!(OwnedProxy);

/// Proxy over a record owned by the caller; never releases it.
pub struct BorrowedProxy {
    core: ProxyCore,
}

impl BorrowedProxy {
    pub fn new(template: AgentTemplate, plane: AxisPair) -> Self {
        Self {
            core: ProxyCore::new(template, plane),
        }
    }

    /// Adopts (or drops, with `None`) an externally owned record. The
    /// previous record is left untouched.
    pub fn set_agent(&mut self, bundle: &mut Bundle, agent: Option<Handle<AgentRecord>>) {
        if self.core.agent == agent {
            return;
        }
        self.core.agent = agent;
        if agent.is_some() {
            self.core.commit_settings(bundle);
        }
    }
}

delegate_proxy_impl!(BorrowedProxy);
