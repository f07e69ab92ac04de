use keel_core::ecs::{
    CloneContext, ComponentError, ComponentRegistry, FieldError, FieldValue, HookContext,
    HookError, Reflect,
};
use keel_core::math::Mat4;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

impl FromStr for Projection {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perspective" => Ok(Self::Perspective),
            "orthographic" | "ortho" => Ok(Self::Orthographic),
            other => Err(FieldError::Invalid {
                field: "projection".into(),
                reason: format!("unknown projection '{other}'"),
            }),
        }
    }
}

/// Camera parameters as authored, and the matrix derived from them.
///
/// `fov` is the vertical field of view in degrees. `size` is the vertical
/// extent of an orthographic view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub projection_name: String,
    pub projection: Projection,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub size: f32,
    pub matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection_name: "perspective".into(),
            projection: Projection::Perspective,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            aspect: 16.0 / 9.0,
            size: 10.0,
            matrix: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    /// Recompute `matrix` from the current parameters.
    pub fn update_projection(&mut self) -> Result<(), FieldError> {
        let invalid = |field: &str, reason: String| FieldError::Invalid {
            field: field.to_string(),
            reason,
        };
        if self.far <= self.near {
            return Err(invalid("far", format!("{} is not beyond near {}", self.far, self.near)));
        }
        if self.aspect <= 0.0 {
            return Err(invalid("aspect", format!("{} is not positive", self.aspect)));
        }
        self.matrix = match self.projection {
            Projection::Perspective => {
                if self.near <= 0.0 {
                    return Err(invalid("near", format!("{} is not positive", self.near)));
                }
                Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
            }
            Projection::Orthographic => {
                let half_h = self.size * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        };
        Ok(())
    }
}

impl Reflect for Camera {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "projection" => self.projection_name = value.into_string(field)?,
            "fov" => self.fov = value.to_f32(field)?,
            "near" => self.near = value.to_f32(field)?,
            "far" => self.far = value.to_f32(field)?,
            "aspect" => self.aspect = value.to_f32(field)?,
            "size" => self.size = value.to_f32(field)?,
            _ => return Err(FieldError::unknown(field)),
        }
        Ok(())
    }
}

fn derive(camera: &mut Camera) -> Result<(), HookError> {
    camera.projection = camera.projection_name.parse()?;
    camera.update_projection()?;
    Ok(())
}

fn on_added(camera: &mut Camera, _ctx: &HookContext<'_>) -> Result<(), HookError> {
    derive(camera)
}

// A copy may be retargeted (aspect, fov) before its hook runs.
fn on_cloned(camera: &mut Camera, _ctx: &CloneContext<'_>) -> Result<(), HookError> {
    derive(camera)
}

pub(super) fn register(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    components
        .component::<Camera>("camera")
        .on_added(on_added)
        .on_cloned(on_cloned)
        .print(|camera| format!("{:?} camera, fov {}", camera.projection, camera.fov))
        .to_map(|camera| {
            BTreeMap::from([
                ("projection".to_string(), camera.projection_name.clone()),
                ("fov".to_string(), camera.fov.to_string()),
                ("near".to_string(), camera.near.to_string()),
                ("far".to_string(), camera.far.to_string()),
                ("aspect".to_string(), camera.aspect.to_string()),
                ("size".to_string(), camera.size.to_string()),
            ])
        })
        .register()?;
    Ok(())
}
