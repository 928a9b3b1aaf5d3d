use super::{Bounds, Element, ElementId, FocusDirection, InputMode, TouchEvent, TouchInfo};
use crate::ui::input::{Buttons, InputSnapshot};
use crate::ui::renderer::Renderer;
use crate::ui::text_rasterizing::TextStyle;

const TITLE_SIZE: f32 = 30.0;
const SUBTITLE_SIZE: f32 = 15.0;
const FOOTER_SIZE: f32 = 23.0;
const CONTENT_TOP: i32 = 125;
const FOOTER_HEIGHT: i32 = 73;

/// Full-screen chrome: title block, one content element, footer hints
pub struct OverlayFrame {
    id: ElementId,
    bounds: Bounds,
    title: String,
    subtitle: String,
    footer: String,
    content: Option<Box<dyn Element>>,
}

impl OverlayFrame {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            title: title.into(),
            subtitle: subtitle.into(),
            footer: "\u{E0E1}  Back     \u{E0E0}  OK".into(),
            content: None,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Replaces the content; the old one is returned
    pub fn set_content(&mut self, content: Box<dyn Element>) -> Option<Box<dyn Element>> {
        let old = self.content.replace(content);
        if self.bounds.width > 0 {
            let viewport = self.viewport();
            if let Some(c) = self.content.as_mut() {
                c.layout(viewport);
            }
        }
        old
    }

    pub fn content_mut(&mut self) -> Option<&mut (dyn Element + 'static)> {
        self.content.as_deref_mut()
    }

    /// Area handed to the content element
    pub fn viewport(&self) -> Bounds {
        let b = self.bounds;
        Bounds::new(
            b.x + 35,
            b.y + CONTENT_TOP,
            (b.width - 85).max(0),
            (b.height - FOOTER_HEIGHT - CONTENT_TOP).max(0),
        )
    }
}

impl Element for OverlayFrame {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn layout(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        let viewport = self.viewport();
        if let Some(c) = self.content.as_mut() {
            c.layout(viewport);
        }
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        let b = self.bounds;
        let theme = renderer.theme().clone();
        renderer.draw_rect(b.x, b.y, b.width, b.height, theme.default_background);
        renderer.draw_string(&self.title, b.x + 20, b.y + 50, TextStyle::new(TITLE_SIZE), theme.text);
        renderer.draw_string(
            &self.subtitle,
            b.x + 20,
            b.y + 70,
            TextStyle::new(SUBTITLE_SIZE),
            theme.header_text,
        );
        renderer.draw_rect(b.x + 15, b.bottom() - FOOTER_HEIGHT, b.width - 30, 1, theme.text);
        renderer.draw_string(
            &self.footer,
            b.x + 30,
            b.bottom() - 36,
            TextStyle::new(FOOTER_SIZE),
            theme.text,
        );
        if let Some(c) = self.content.as_mut() {
            c.draw(renderer);
        }
    }

    fn handle_input(&mut self, input: &InputSnapshot) -> bool {
        self.content.as_mut().is_some_and(|c| c.handle_input(input))
    }

    fn on_click(&mut self, buttons: Buttons) -> bool {
        self.content.as_mut().is_some_and(|c| c.on_click(buttons))
    }

    fn on_touch(&mut self, event: TouchEvent, touch: &TouchInfo) -> bool {
        self.content.as_mut().is_some_and(|c| c.on_touch(event, touch))
    }

    fn request_focus(
        &mut self,
        old: Option<ElementId>,
        direction: FocusDirection,
    ) -> Option<ElementId> {
        self.content.as_mut().and_then(|c| c.request_focus(old, direction))
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        if let Some(c) = self.content.as_mut() {
            c.set_input_mode(mode);
        }
    }

    fn is_scrolling(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.is_scrolling())
    }

    fn child_mut(&mut self, id: ElementId) -> Option<&mut dyn Element> {
        let content = self.content.as_mut()?;
        if content.id() == id {
            return Some(content.as_mut());
        }
        content.child_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::element::{find_mut, ListItem};

    #[test]
    fn test_viewport_inside_chrome() {
        let mut frame = OverlayFrame::new("Tessera", "v0.1");
        frame.layout(Bounds::new(0, 0, 448, 720));
        assert_eq!(frame.viewport(), Bounds::new(35, 125, 363, 522));
    }

    #[test]
    fn test_content_gets_laid_out_and_found() {
        let mut frame = OverlayFrame::new("t", "s");
        frame.layout(Bounds::new(0, 0, 448, 720));
        let item = ListItem::new("only");
        let id = item.id();
        frame.set_content(Box::new(item));
        let found = find_mut(&mut frame, id).map(|e| e.bounds());
        assert_eq!(found, Some(frame.viewport()));
        assert_eq!(frame.request_focus(None, FocusDirection::None), Some(id));
    }

    #[test]
    fn test_empty_frame_has_no_focus() {
        let mut frame = OverlayFrame::new("t", "s");
        assert_eq!(frame.request_focus(None, FocusDirection::Down), None);
        assert!(!frame.is_scrolling());
    }
}
