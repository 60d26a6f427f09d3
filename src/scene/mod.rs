pub mod backend;
pub mod camera;
pub mod host;
pub mod light;
pub mod model;
pub mod node;
pub mod orbit;
pub mod transform;

use slotmap::new_key_type;

new_key_type! {
    /// Handle of a node inside one [`ModelScene`].
    pub struct NodeKey;
}

pub use backend::{Frame, FrameBuffer, HeadlessBackend, RenderBackend};
pub use camera::Camera;
pub use host::SceneHost;
pub use light::{Light, LightKind, ShadowConfig};
pub use model::{DrawItem, ModelScene};
pub use node::{MeshPart, Node, RestPose};
pub use orbit::OrbitControls;
pub use transform::Transform;
