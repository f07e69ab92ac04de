use keel_core::ecs::{ComponentError, ComponentRegistry};

/// Rendered by the render system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visible;

/// Never moves after creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Static;

/// Treated as an enemy by gameplay systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hostile;

pub(super) fn register(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    components.marker::<Visible>("visible").register()?;
    components.marker::<Static>("static").register()?;
    components.marker::<Hostile>("hostile").register()?;
    Ok(())
}
