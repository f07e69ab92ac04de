// render.rs - Components that reference shared render assets
//
// Asset ids are authored in prefab data; the handles are resolved once in
// `on_added` and shared by every clone.

use keel_asset::{AssetHandle, ModelAsset, TextureAsset};
use keel_core::ecs::{
    ComponentError, ComponentRegistry, FieldError, FieldValue, HookContext, HookError, Reflect,
    PRIMARY_FIELD,
};
use keel_core::math::{Vec3, Vec4};
use std::collections::BTreeMap;

/// Reference to a loaded model.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub model: String,
    pub handle: Option<AssetHandle<ModelAsset>>,
}

impl Reflect for Mesh {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "model" | PRIMARY_FIELD => self.model = value.into_string(field)?,
            _ => return Err(FieldError::unknown(field)),
        }
        Ok(())
    }
}

fn mesh_added(mesh: &mut Mesh, ctx: &HookContext<'_>) -> Result<(), HookError> {
    mesh.handle = Some(ctx.assets.get::<ModelAsset>(&mesh.model)?);
    Ok(())
}

/// Surface parameters and the textures they sample.
#[derive(Debug, Clone)]
pub struct Material {
    pub textures: Vec<String>,
    pub color: Vec4,
    pub shader: String,
    pub handles: Vec<AssetHandle<TextureAsset>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            textures: Vec::new(),
            color: Vec4::ONE,
            shader: String::new(),
            handles: Vec::new(),
        }
    }
}

impl Reflect for Material {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "textures" => self.textures = value.into_string_list(field)?,
            "color" => self.color = value.to_vec4(field)?,
            "shader" => self.shader = value.into_string(field)?,
            _ => return Err(FieldError::unknown(field)),
        }
        Ok(())
    }
}

fn material_added(material: &mut Material, ctx: &HookContext<'_>) -> Result<(), HookError> {
    material.handles = material
        .textures
        .iter()
        .map(|id| ctx.assets.get::<TextureAsset>(id))
        .collect::<Result<_, _>>()?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LightKind {
    #[default]
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind_name: String,
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind_name: "directional".into(),
            kind: LightKind::Directional,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl Reflect for Light {
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        match field {
            "kind" => self.kind_name = value.into_string(field)?,
            "color" => self.color = value.to_vec3(field)?,
            "intensity" | PRIMARY_FIELD => self.intensity = value.to_f32(field)?,
            _ => return Err(FieldError::unknown(field)),
        }
        Ok(())
    }
}

fn light_added(light: &mut Light, _ctx: &HookContext<'_>) -> Result<(), HookError> {
    light.kind = match light.kind_name.as_str() {
        "directional" => LightKind::Directional,
        "point" => LightKind::Point,
        "spot" => LightKind::Spot,
        other => {
            return Err(FieldError::Invalid {
                field: "kind".into(),
                reason: format!("unknown light kind '{other}'"),
            }
            .into())
        }
    };
    Ok(())
}

pub(super) fn register(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    components
        .component::<Mesh>("mesh")
        .on_added(mesh_added)
        .to_map(|mesh| {
            let vertices = mesh
                .handle
                .as_ref()
                .map(|handle| handle.read().vertex_count)
                .unwrap_or_default();
            BTreeMap::from([
                ("model".to_string(), mesh.model.clone()),
                ("vertices".to_string(), vertices.to_string()),
            ])
        })
        .register()?;
    components
        .component::<Material>("material")
        .on_added(material_added)
        .to_map(|material| {
            BTreeMap::from([
                ("textures".to_string(), material.textures.join(", ")),
                ("color".to_string(), material.color.to_string()),
                ("shader".to_string(), material.shader.clone()),
            ])
        })
        .register()?;
    components
        .component::<Light>("light")
        .on_added(light_added)
        .to_map(|light| {
            BTreeMap::from([
                ("kind".to_string(), light.kind_name.clone()),
                ("color".to_string(), light.color.to_string()),
                ("intensity".to_string(), light.intensity.to_string()),
            ])
        })
        .register()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_asset::{AssetRegistry, TextureKind};
    use keel_core::ecs::World;
    use serde_json::json;
    use std::path::PathBuf;

    fn registry() -> ComponentRegistry {
        let mut components = ComponentRegistry::new();
        register(&mut components).unwrap();
        components
    }

    #[test]
    fn test_handles_are_shared_with_the_registry() {
        let components = registry();
        let mut assets = AssetRegistry::new();
        let model = assets
            .insert(
                "cube",
                ModelAsset {
                    path: PathBuf::from("cube.obj"),
                    data: Vec::new(),
                    vertex_count: 8,
                },
            )
            .unwrap();
        assets
            .insert(
                "bricks",
                TextureAsset {
                    path: PathBuf::from("bricks.png"),
                    kind: TextureKind::Diffuse,
                    flip_vertically: false,
                    data: vec![1],
                },
            )
            .unwrap();

        let mut world = World::new();
        let e = world.spawn(());
        components
            .emplace(&mut world, e, "mesh", Some(&json!("cube")), &assets)
            .unwrap();
        components
            .emplace(
                &mut world,
                e,
                "material",
                Some(&json!({ "textures": ["bricks"], "color": { "r": 1, "g": 0, "b": 0 } })),
                &assets,
            )
            .unwrap();

        let mesh = world.get::<&Mesh>(e).unwrap();
        assert!(mesh.handle.as_ref().unwrap().ptr_eq(&model));
        let material = world.get::<&Material>(e).unwrap();
        assert_eq!(material.handles.len(), 1);
        assert_eq!(material.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_model_fails_the_hook() {
        let components = registry();
        let assets = AssetRegistry::new();
        let mut world = World::new();
        let e = world.spawn(());
        let err = components
            .emplace(&mut world, e, "mesh", Some(&json!({ "model": "ghost" })), &assets)
            .unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Hook {
                source: HookError::Asset(_),
                ..
            }
        ));
    }

    #[test]
    fn test_light_kind() {
        let components = registry();
        let assets = AssetRegistry::new();
        let mut world = World::new();
        let e = world.spawn(());
        components
            .emplace(&mut world, e, "light", Some(&json!({ "kind": "spot", "intensity": 3 })), &assets)
            .unwrap();
        assert_eq!(world.get::<&Light>(e).unwrap().kind, LightKind::Spot);
    }
}
