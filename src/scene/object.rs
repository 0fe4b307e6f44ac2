//! Object tree, mesh resources, and transforms
//!
//! Objects carry a process-unique id so per-instance side tables (the
//! animation state map) can key on identity, and so tests can tell two
//! clones apart. `deep_clone` always mints fresh ids and fresh resource
//! handles; `dispose` releases every mesh resource in a subtree.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one object instance
pub type ObjectId = u64;

fn next_object_id() -> ObjectId {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Position, yaw, and scale of one object
///
/// Yaw is the only rotation the animation engine writes, so the full
/// quaternion machinery stays out of the hot per-frame path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            scale: Vec3::ONE,
        }
    }
}

/// Geometry buffer handle
///
/// The shared release flag outlives the object so callers (and tests)
/// can observe disposal after the instance itself is gone.
#[derive(Debug)]
pub struct Geometry {
    label: String,
    released: Arc<AtomicBool>,
}

impl Geometry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Release the underlying buffers; idempotent
    pub fn release(&mut self) {
        self.released.store(true, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Handle to the release flag, for observing disposal externally
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    /// Copy with a fresh, unreleased resource handle
    fn fresh_copy(&self) -> Self {
        Geometry::new(self.label.clone())
    }
}

/// Material handle with a PBR refresh flag
#[derive(Debug)]
pub struct Material {
    pub color: [f32; 3],
    /// Set when the material must be re-uploaded before the next frame
    pub needs_refresh: bool,
    released: Arc<AtomicBool>,
}

impl Material {
    pub fn new(color: [f32; 3]) -> Self {
        Self {
            color,
            needs_refresh: false,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn release(&mut self) {
        self.released.store(true, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    fn fresh_copy(&self) -> Self {
        Self {
            color: self.color,
            needs_refresh: self.needs_refresh,
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// What one node in the tree is
#[derive(Debug)]
pub enum ObjectKind {
    Group,
    Mesh { geometry: Geometry, material: Material },
    AmbientLight { color: [f32; 3], intensity: f32 },
    DirectionalLight { color: [f32; 3], intensity: f32, cast_shadow: bool },
}

/// One node of the object tree
#[derive(Debug)]
pub struct Object3d {
    id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub children: Vec<Object3d>,
}

impl Object3d {
    fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: next_object_id(),
            name: name.into(),
            kind,
            transform: Transform::default(),
            cast_shadow: false,
            receive_shadow: false,
            children: Vec::new(),
        }
    }

    /// Empty group node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, ObjectKind::Group)
    }

    /// Mesh node owning its geometry and material
    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(name, ObjectKind::Mesh { geometry, material })
    }

    /// Ambient light node
    pub fn ambient_light(color: [f32; 3], intensity: f32) -> Self {
        Self::new("ambient-light", ObjectKind::AmbientLight { color, intensity })
    }

    /// Directional light node
    pub fn directional_light(color: [f32; 3], intensity: f32, cast_shadow: bool) -> Self {
        Self::new(
            "directional-light",
            ObjectKind::DirectionalLight {
                color,
                intensity,
                cast_shadow,
            },
        )
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, ObjectKind::Mesh { .. })
    }

    pub fn add_child(&mut self, child: Object3d) {
        self.children.push(child);
    }

    /// Remove and return the direct child with the given id
    pub fn take_child(&mut self, id: ObjectId) -> Option<Object3d> {
        let index = self.children.iter().position(|c| c.id == id)?;
        Some(self.children.remove(index))
    }

    /// Mutable access to the direct child with the given id
    pub fn child_mut(&mut self, id: ObjectId) -> Option<&mut Object3d> {
        self.children.iter_mut().find(|c| c.id == id)
    }

    /// Deep clone with fresh ids and fresh resource handles
    ///
    /// Mutating the clone can never touch the source; this is what keeps
    /// cached templates immune to instance mutation.
    pub fn deep_clone(&self) -> Object3d {
        let kind = match &self.kind {
            ObjectKind::Group => ObjectKind::Group,
            ObjectKind::Mesh { geometry, material } => ObjectKind::Mesh {
                geometry: geometry.fresh_copy(),
                material: material.fresh_copy(),
            },
            ObjectKind::AmbientLight { color, intensity } => ObjectKind::AmbientLight {
                color: *color,
                intensity: *intensity,
            },
            ObjectKind::DirectionalLight {
                color,
                intensity,
                cast_shadow,
            } => ObjectKind::DirectionalLight {
                color: *color,
                intensity: *intensity,
                cast_shadow: *cast_shadow,
            },
        };
        Object3d {
            id: next_object_id(),
            name: self.name.clone(),
            kind,
            transform: self.transform,
            cast_shadow: self.cast_shadow,
            receive_shadow: self.receive_shadow,
            children: self.children.iter().map(Object3d::deep_clone).collect(),
        }
    }

    /// Release geometry and material of every mesh in the subtree
    pub fn dispose(&mut self) {
        if let ObjectKind::Mesh { geometry, material } = &mut self.kind {
            geometry.release();
            material.release();
        }
        for child in &mut self.children {
            child.dispose();
        }
    }

    /// Visit every mesh node in the subtree, including this one
    pub fn for_each_mesh_mut<F: FnMut(&mut Object3d)>(&mut self, f: &mut F) {
        if self.is_mesh() {
            f(self);
        }
        for child in &mut self.children {
            child.for_each_mesh_mut(f);
        }
    }

    /// Number of mesh nodes in the subtree
    pub fn mesh_count(&self) -> usize {
        let own = usize::from(self.is_mesh());
        own + self.children.iter().map(Object3d::mesh_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_mesh_group() -> Object3d {
        let mut root = Object3d::group("root");
        root.add_child(Object3d::mesh(
            "body",
            Geometry::new("body-geo"),
            Material::new([0.2, 0.4, 0.6]),
        ));
        let mut limb = Object3d::group("limb");
        limb.add_child(Object3d::mesh(
            "hand",
            Geometry::new("hand-geo"),
            Material::new([0.9, 0.1, 0.1]),
        ));
        root.add_child(limb);
        root
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Object3d::group("a");
        let b = Object3d::group("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_deep_clone_fresh_identity_and_resources() {
        let source = two_mesh_group();
        let clone = source.deep_clone();

        assert_ne!(source.id(), clone.id());
        assert_eq!(clone.mesh_count(), 2);

        // Disposing the clone must leave the source untouched
        let mut clone = clone;
        clone.dispose();
        let mut released_in_source = false;
        let mut source = source;
        source.for_each_mesh_mut(&mut |mesh| {
            if let ObjectKind::Mesh { geometry, .. } = &mesh.kind {
                released_in_source |= geometry.is_released();
            }
        });
        assert!(!released_in_source);
    }

    #[test]
    fn test_dispose_releases_every_mesh() {
        let mut root = two_mesh_group();
        let mut flags = Vec::new();
        root.for_each_mesh_mut(&mut |mesh| {
            if let ObjectKind::Mesh { geometry, material } = &mesh.kind {
                flags.push(geometry.release_flag());
                flags.push(material.release_flag());
            }
        });
        root.dispose();
        assert_eq!(flags.len(), 4);
        assert!(flags.iter().all(|f| f.load(std::sync::atomic::Ordering::Acquire)));
    }

    #[test]
    fn test_take_child() {
        let mut root = two_mesh_group();
        let first_id = root.children[0].id();
        let taken = root.take_child(first_id).expect("child exists");
        assert_eq!(taken.name, "body");
        assert!(root.take_child(first_id).is_none());
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_for_each_mesh_mut_reaches_nested() {
        let mut root = two_mesh_group();
        let mut names = Vec::new();
        root.for_each_mesh_mut(&mut |mesh| names.push(mesh.name.clone()));
        assert_eq!(names, vec!["body".to_string(), "hand".to_string()]);
    }
}
