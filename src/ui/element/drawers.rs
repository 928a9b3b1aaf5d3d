use super::{Bounds, Element, ElementId, HEADER_TEXT_SIZE, LIST_ITEM_HEIGHT};
use crate::ui::renderer::Renderer;
use crate::ui::text_rasterizing::TextStyle;

pub const TABLE_ROW_HEIGHT: i32 = 26;
const TABLE_PADDING: i32 = 12;
const TABLE_TEXT_SIZE: f32 = 18.0;

/// Section label; only half as tall when it opens a list
pub struct CategoryHeader {
    id: ElementId,
    bounds: Bounds,
    text: String,
    first_in_list: bool,
}

impl CategoryHeader {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            text: text.into(),
            first_in_list: false,
        }
    }
}

impl Element for CategoryHeader {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn preferred_height(&self) -> i32 {
        if self.first_in_list {
            LIST_ITEM_HEIGHT / 2
        } else {
            LIST_ITEM_HEIGHT
        }
    }

    fn set_first_in_list(&mut self, first: bool) {
        self.first_in_list = first;
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        let b = self.bounds;
        let theme = renderer.theme().clone();
        renderer.draw_rect(b.x - 2, b.bottom() - 30, 5, 23, theme.header_bar);
        renderer.draw_string(
            &self.text,
            b.x + 13,
            b.bottom() - 12,
            TextStyle::new(HEADER_TEXT_SIZE),
            theme.header_text,
        );
    }
}

/// Read-only block of label/value rows; lists scroll through tall ones in steps
pub struct TableDrawer {
    id: ElementId,
    bounds: Bounds,
    rows: Vec<(String, String)>,
}

impl TableDrawer {
    pub fn new<L, V>(rows: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<String>,
    {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            rows: rows.into_iter().map(|(l, v)| (l.into(), v.into())).collect(),
        }
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }
}

impl Element for TableDrawer {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn preferred_height(&self) -> i32 {
        self.rows.len() as i32 * TABLE_ROW_HEIGHT + TABLE_PADDING * 2
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        let b = self.bounds;
        let theme = renderer.theme().clone();
        let style = TextStyle::new(TABLE_TEXT_SIZE);
        renderer.draw_rounded_rect(b.x + 4, b.y, b.width - 8, b.height, 10, theme.table_background);
        let mut y = b.y + TABLE_PADDING + TABLE_ROW_HEIGHT - 7;
        for (label, value) in &self.rows {
            renderer.draw_string(label, b.x + 16, y, style, theme.table_label);
            let w = renderer.calculate_string_width(value, style) as i32;
            renderer.draw_string(value, b.right() - 16 - w, y, style, theme.table_value);
            y += TABLE_ROW_HEIGHT;
        }
    }

    fn is_table(&self) -> bool {
        true
    }
}

pub type DrawCallback = Box<dyn FnMut(&mut Renderer, Bounds)>;

/// Arbitrary drawing in a fixed-height slot
pub struct CustomDrawer {
    id: ElementId,
    bounds: Bounds,
    height: i32,
    callback: DrawCallback,
}

impl CustomDrawer {
    pub fn new(height: i32, callback: impl FnMut(&mut Renderer, Bounds) + 'static) -> Self {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            height,
            callback: Box::new(callback),
        }
    }
}

impl Element for CustomDrawer {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn preferred_height(&self) -> i32 {
        self.height
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        (self.callback)(renderer, self.bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::colour::Colour;
    use crate::ui::renderer::test_renderer;

    #[test]
    fn test_header_halves_when_first() {
        let mut h = CategoryHeader::new("General");
        assert_eq!(h.preferred_height(), LIST_ITEM_HEIGHT);
        h.set_first_in_list(true);
        assert_eq!(h.preferred_height(), LIST_ITEM_HEIGHT / 2);
        assert!(!h.is_item());
    }

    #[test]
    fn test_table_height_follows_rows() {
        let t = TableDrawer::new([("CPU", "1020 MHz"), ("GPU", "768 MHz")]);
        assert!(t.is_table());
        assert!(!t.is_item());
        assert_eq!(t.preferred_height(), 2 * TABLE_ROW_HEIGHT + 24);
        assert_eq!(t.rows()[1].1, "768 MHz");
    }

    #[test]
    fn test_custom_drawer_gets_its_bounds() {
        let mut r = test_renderer(32, 32);
        let mut d = CustomDrawer::new(10, |r, b| r.draw_rect(b.x, b.y, b.width, b.height, Colour::WHITE));
        d.set_bounds(Bounds::new(2, 3, 4, 5));
        d.draw(&mut r);
        assert_eq!(r.surface().get_pixel(2, 3), Some(Colour::WHITE));
        assert_eq!(r.surface().get_pixel(6, 3), Some(Colour::TRANSPARENT));
        assert_eq!(d.preferred_height(), 10);
    }
}
