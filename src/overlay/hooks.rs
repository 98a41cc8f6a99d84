use super::{LayerId, OverlayFeature, OverlayGroup, StyleDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    MouseOver,
    MouseOut,
    Click,
}

/// Pointer interaction reported by the host for one rendered feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureInteraction {
    pub kind: InteractionKind,
    pub layer_id: LayerId,
}

impl FeatureInteraction {
    pub const fn new(kind: InteractionKind, layer_id: LayerId) -> Self {
        Self { kind, layer_id }
    }
}

pub type StyleFn = Box<dyn Fn(&OverlayFeature) -> StyleDescriptor>;
pub type GroupPointerFn = Box<dyn FnMut(&FeatureInteraction, &OverlayGroup)>;

#[derive(Default)]
pub struct OverlayHooks {
    pub style_fn: Option<StyleFn>,
    pub mouse_over_fn: Option<GroupPointerFn>,
    pub mouse_out_fn: Option<GroupPointerFn>,
    pub click_fn: Option<GroupPointerFn>,
}

impl std::fmt::Debug for OverlayHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayHooks")
            .field("style_fn", &self.style_fn.is_some())
            .field("mouse_over_fn", &self.mouse_over_fn.is_some())
            .field("mouse_out_fn", &self.mouse_out_fn.is_some())
            .field("click_fn", &self.click_fn.is_some())
            .finish()
    }
}

impl OverlayHooks {
    pub fn with_style_fn(
        mut self,
        style_fn: impl Fn(&OverlayFeature) -> StyleDescriptor + 'static,
    ) -> Self {
        self.style_fn = Some(Box::new(style_fn));
        self
    }

    pub fn with_mouse_over_fn(
        mut self,
        hook: impl FnMut(&FeatureInteraction, &OverlayGroup) + 'static,
    ) -> Self {
        self.mouse_over_fn = Some(Box::new(hook));
        self
    }

    pub fn with_mouse_out_fn(
        mut self,
        hook: impl FnMut(&FeatureInteraction, &OverlayGroup) + 'static,
    ) -> Self {
        self.mouse_out_fn = Some(Box::new(hook));
        self
    }

    pub fn with_click_fn(
        mut self,
        hook: impl FnMut(&FeatureInteraction, &OverlayGroup) + 'static,
    ) -> Self {
        self.click_fn = Some(Box::new(hook));
        self
    }

    pub(crate) fn style_for(
        &self,
        feature: &OverlayFeature,
        fallback: &StyleDescriptor,
    ) -> StyleDescriptor {
        match &self.style_fn {
            Some(style_fn) => style_fn(feature),
            None => fallback.clone(),
        }
    }

    pub(crate) fn pointer_hook(&mut self, kind: InteractionKind) -> Option<&mut GroupPointerFn> {
        match kind {
            InteractionKind::MouseOver => self.mouse_over_fn.as_mut(),
            InteractionKind::MouseOut => self.mouse_out_fn.as_mut(),
            InteractionKind::Click => self.click_fn.as_mut(),
        }
    }
}
