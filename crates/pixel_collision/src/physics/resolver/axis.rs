//! Axis-separated collision response
//!
//! The entity is first moved back along its primary axis so the secondary
//! axis can be resolved in isolation. The primary displacement is then
//! restored, keeping the secondary correction, and the primary axis is
//! resolved against freshly computed contacts.
//!
//! Horizontal: box-only solid contacts that are not ground contacts push the
//! entity back by the widest overlap, against the direction of travel.
//! Vertical: only while falling, solid contacts wider than the corner
//! threshold push the entity up by the tallest overlap.
//!
//! Corrections land the entity exactly on the obstacle edge. Rects are
//! half-open, so a second pass finds no overlap and changes nothing.
//! Nothing is rounded: an entity or obstacle at a fractional position ends
//! up at a fractional position, flush with the edge.

use super::{AxisMask, AxisResolverConfig, CollisionResolver, PrimaryAxis, ResolveContext, Resolution};
use crate::ecs::Entity;
use crate::foundation::math::Vec2;
use crate::physics::contact::Contact;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    const fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    fn vector(self, amount: f32) -> Vec2 {
        match self {
            Self::X => Vec2::new(amount, 0.0),
            Self::Y => Vec2::new(0.0, amount),
        }
    }

    const fn mask(self) -> AxisMask {
        match self {
            Self::X => AxisMask::X,
            Self::Y => AxisMask::Y,
        }
    }
}

impl From<PrimaryAxis> for Axis {
    fn from(axis: PrimaryAxis) -> Self {
        match axis {
            PrimaryAxis::X => Self::X,
            PrimaryAxis::Y => Self::Y,
        }
    }
}

/// Resolves x and y independently
#[derive(Debug, Clone, Default)]
pub struct AxisSeparatedResolver {
    config: AxisResolverConfig,
}

impl AxisSeparatedResolver {
    /// Create a resolver with the given tuning
    pub const fn new(config: AxisResolverConfig) -> Self {
        Self { config }
    }

    /// Current tuning
    pub const fn config(&self) -> &AxisResolverConfig {
        &self.config
    }

    /// Signed x correction, `None` when nothing blocks horizontally
    ///
    /// The magnitude is the exact overlap width, fractional overlaps
    /// included.
    pub fn horizontal_correction(&self, contacts: &[Contact], velocity_x: f32, height: f32) -> Option<f32> {
        if velocity_x == 0.0 {
            return None;
        }
        let ground_line = self.config.ground_fraction * height;
        let width = widest(
            contacts
                .iter()
                .filter(|c| c.contact_type.is_blocking() && c.is_box_only() && c.bounds.y <= ground_line)
                .map(|c| c.bounds.width),
        )?;
        Some(-width * velocity_x.signum())
    }

    /// Signed y correction, `None` unless falling into something
    pub fn vertical_correction(&self, contacts: &[Contact], velocity_y: f32) -> Option<f32> {
        if velocity_y <= 0.0 {
            return None;
        }
        let height = widest(
            contacts
                .iter()
                .filter(|c| c.contact_type.is_blocking() && c.bounds.width > self.config.corner_threshold)
                .map(|c| c.bounds.height),
        )?;
        Some(-height)
    }

    fn correction(&self, axis: Axis, contacts: &[Contact], velocity: Vec2, height: f32) -> Option<f32> {
        match axis {
            Axis::X => self.horizontal_correction(contacts, velocity.x, height),
            Axis::Y => self.vertical_correction(contacts, velocity.y),
        }
    }
}

fn widest(values: impl Iterator<Item = f32>) -> Option<f32> {
    values.fold(None, |best, value| Some(best.map_or(value, |best: f32| best.max(value))))
}

impl CollisionResolver for AxisSeparatedResolver {
    fn resolve(
        &mut self,
        entity: Entity,
        contacts: &[Contact],
        velocity: Vec2,
        ctx: &mut ResolveContext<'_>,
    ) -> Resolution {
        if !contacts.iter().any(|c| c.contact_type.is_blocking()) {
            return Resolution::none();
        }
        let (Some(position), Some(bounds)) = (ctx.world.position(entity), ctx.world.bounds(entity)) else {
            return Resolution::none();
        };

        let primary = Axis::from(self.config.primary_axis);
        let secondary = primary.other();
        let primary_velocity = match primary {
            Axis::X => velocity.x,
            Axis::Y => velocity.y,
        };

        let secondary_contacts: Cow<'_, [Contact]> = if primary_velocity == 0.0 {
            Cow::Borrowed(contacts)
        } else {
            Cow::Owned(ctx.contacts_at(entity, position - primary.vector(primary_velocity)))
        };
        let secondary_fix = self.correction(secondary, &secondary_contacts, velocity, bounds.height);

        let primary_contacts: Cow<'_, [Contact]> = match secondary_fix {
            Some(amount) => Cow::Owned(ctx.contacts_at(entity, position + secondary.vector(amount))),
            None => Cow::Borrowed(contacts),
        };
        let primary_fix = self.correction(primary, &primary_contacts, velocity, bounds.height);

        let mut resolution = Resolution::none();
        for (axis, fix) in [(secondary, secondary_fix), (primary, primary_fix)] {
            if let Some(amount) = fix {
                resolution.correction += axis.vector(amount);
                resolution.zero_velocity |= axis.mask();
            }
        }
        if !resolution.is_noop() {
            log::trace!("AxisSeparatedResolver: {entity:?} corrected by {:?}", resolution.correction);
        }
        resolution
    }

    fn name(&self) -> &'static str {
        "axis-separated"
    }
}
