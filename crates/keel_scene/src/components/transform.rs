use keel_core::ecs::{
    ComponentError, ComponentRegistry, FieldError, FieldValue, HookContext, HookError, Reflect,
};
use keel_core::math::{Mat4, Quat, Vec3};
use std::collections::BTreeMap;

/// Position, rotation and scale, plus the model matrix derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub model: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            model: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    /// Recompute `model` after moving the transform.
    pub fn update_model(&mut self) {
        self.model = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
    }
}

impl Reflect for Transform {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "position" => self.position = value.to_vec3(field)?,
            "rotation" => self.rotation = value.to_quat(field)?,
            "scale" => self.scale = value.to_vec3(field)?,
            _ => return Err(FieldError::unknown(field)),
        }
        Ok(())
    }
}

fn on_added(transform: &mut Transform, _ctx: &HookContext<'_>) -> Result<(), HookError> {
    transform.update_model();
    Ok(())
}

pub(super) fn register(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    components
        .component::<Transform>("transform")
        .on_added(on_added)
        .to_map(|transform| {
            BTreeMap::from([
                ("position".to_string(), transform.position.to_string()),
                ("rotation".to_string(), transform.rotation.to_string()),
                ("scale".to_string(), transform.scale.to_string()),
            ])
        })
        .register()?;
    Ok(())
}
