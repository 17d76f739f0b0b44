//! The narrow slice of the external model viewer the binder is allowed to
//! touch: material lookup, texture creation and a couple of scene toggles.

use crate::error::ViewerError;

/// A named material on the loaded model.
pub trait MaterialHandle {
    type Texture;

    fn set_base_color_texture(&self, texture: &Self::Texture) -> Result<(), ViewerError>;
    fn set_roughness_texture(&self, texture: &Self::Texture) -> Result<(), ViewerError>;
}

/// Capabilities consumed from the model viewer once the model has loaded.
///
/// Futures returned here are not `Send`; everything runs on the page's
/// event loop.
#[allow(async_fn_in_trait)]
pub trait ModelViewer {
    type Texture: Clone;
    type Material: MaterialHandle<Texture = Self::Texture>;

    fn material_by_name(&self, name: &str) -> Option<Self::Material>;

    async fn create_texture(&self, url: &str) -> Result<Self::Texture, ViewerError>;

    fn set_auto_rotate(&self, enabled: bool);

    fn set_background(&self, background: &str);
}
