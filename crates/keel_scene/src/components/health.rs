use keel_core::ecs::{
    ComponentError, ComponentRegistry, FieldError, FieldValue, HookContext, HookError, Reflect,
    PRIMARY_FIELD,
};
use std::collections::BTreeMap;

/// Hit points. `current` starts at `base` when the component is added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Health {
    pub base: f32,
    pub current: f32,
}

impl Reflect for Health {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "base" | PRIMARY_FIELD => self.base = value.to_f32(field)?,
            "current" => self.current = value.to_f32(field)?,
            _ => return Err(FieldError::unknown(field)),
        }
        Ok(())
    }
}

fn on_added(health: &mut Health, _ctx: &HookContext<'_>) -> Result<(), HookError> {
    if health.base < 0.0 {
        return Err(FieldError::Invalid {
            field: "base".into(),
            reason: format!("{} is negative", health.base),
        }
        .into());
    }
    health.current = health.base;
    Ok(())
}

pub(super) fn register(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    components
        .component::<Health>("health")
        .on_added(on_added)
        .print(|health| format!("health {}/{}", health.current, health.base))
        .to_map(|health| {
            BTreeMap::from([
                ("base".to_string(), health.base.to_string()),
                ("current".to_string(), health.current.to_string()),
            ])
        })
        .register()?;
    Ok(())
}
