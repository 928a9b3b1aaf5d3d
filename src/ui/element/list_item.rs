use super::{
    Bounds, Element, ElementId, FocusDirection, Highlight, TouchEvent, TouchInfo, ITEM_TEXT_SIZE,
    ITEM_VALUE_SIZE,
};
use crate::ui::input::Buttons;
use crate::ui::renderer::Renderer;
use crate::ui::text_rasterizing::TextStyle;
use std::time::{Duration, Instant};

const TEXT_X: i32 = 19;
const TEXT_BASELINE: i32 = 45;
const VALUE_RIGHT_PAD: i32 = 15;
const VALUE_GAP: i32 = 20;

const MARQUEE_DELAY: Duration = Duration::from_millis(2000);
const MARQUEE_SPEED: f32 = 0.1; // px per ms
const MARQUEE_GAP: f32 = 40.0;

pub type ClickListener = Box<dyn FnMut(Buttons) -> bool>;
pub type StateListener = Box<dyn FnMut(bool)>;

/// What pressing A does
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemBehaviour {
    #[default]
    Plain,
    Toggle {
        state: bool,
        on_label: String,
        off_label: String,
    },
}

/// Single focusable row with text and an optional right-aligned value
pub struct ListItem {
    id: ElementId,
    bounds: Bounds,
    text: String,
    value: String,
    faint_value: bool,
    behaviour: ItemBehaviour,
    highlight: Highlight,
    listener: Option<ClickListener>,
    state_listener: Option<StateListener>,
    // Cached by draw so marquee maths doesn't need the glyph cache
    text_width: f32,
    text_room: f32,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            text: text.into(),
            value: String::new(),
            faint_value: false,
            behaviour: ItemBehaviour::Plain,
            highlight: Highlight::default(),
            listener: None,
            state_listener: None,
            text_width: 0.0,
            text_room: 0.0,
        }
    }

    pub fn toggle(text: impl Into<String>, state: bool) -> Self {
        let mut item = Self::new(text);
        item.behaviour = ItemBehaviour::Toggle {
            state,
            on_label: "On".into(),
            off_label: "Off".into(),
        };
        item
    }

    pub fn with_value(mut self, value: impl Into<String>, faint: bool) -> Self {
        self.set_value(value, faint);
        self
    }

    pub fn with_listener(mut self, listener: impl FnMut(Buttons) -> bool + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn with_state_listener(mut self, listener: impl FnMut(bool) + 'static) -> Self {
        self.state_listener = Some(Box::new(listener));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn value(&self) -> &str {
        match &self.behaviour {
            ItemBehaviour::Toggle {
                state,
                on_label,
                off_label,
            } => {
                if *state {
                    on_label
                } else {
                    off_label
                }
            }
            ItemBehaviour::Plain => &self.value,
        }
    }

    pub fn set_value(&mut self, value: impl Into<String>, faint: bool) {
        self.value = value.into();
        self.faint_value = faint;
    }

    pub fn state(&self) -> Option<bool> {
        match self.behaviour {
            ItemBehaviour::Toggle { state, .. } => Some(state),
            ItemBehaviour::Plain => None,
        }
    }

    /// Sets a toggle's state without notifying the listener
    pub fn set_state(&mut self, new_state: bool) {
        if let ItemBehaviour::Toggle { state, .. } = &mut self.behaviour {
            *state = new_state;
        }
    }

    pub fn is_focused(&self) -> bool {
        self.highlight.is_focused()
    }

    fn truncated(&self) -> bool {
        self.text_width > self.text_room
    }

    /// Horizontal scroll of an over-long label, 0 until it has been focused a while
    pub fn marquee_offset(&self, focused_for: Duration) -> f32 {
        if !self.truncated() || focused_for < MARQUEE_DELAY {
            return 0.0;
        }
        let ms = (focused_for - MARQUEE_DELAY).as_secs_f32() * 1000.0;
        (ms * MARQUEE_SPEED) % (self.text_width + MARQUEE_GAP)
    }
}

impl Element for ListItem {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        let b = self.bounds;
        let theme = renderer.theme().clone();
        let text_style = TextStyle::new(ITEM_TEXT_SIZE);
        let value_style = TextStyle::new(ITEM_VALUE_SIZE);

        renderer.draw_rect(b.x + 4, b.y, b.width - 8, 1, theme.separator);
        renderer.draw_rect(b.x + 4, b.bottom(), b.width - 8, 1, theme.separator);

        let value = self.value().to_owned();
        let value_width = if value.is_empty() {
            0.0
        } else {
            renderer.calculate_string_width(&value, value_style)
        };
        self.text_width = renderer.calculate_string_width(&self.text, text_style);
        let value_space = if value.is_empty() { 0.0 } else { value_width + VALUE_GAP as f32 };
        self.text_room = (b.width - TEXT_X - VALUE_RIGHT_PAD) as f32 - value_space;

        let text_colour = if self.highlight.is_focused() {
            theme.selected_text
        } else {
            theme.text
        };
        let x = b.x + TEXT_X;
        let y = b.y + TEXT_BASELINE;
        if !self.truncated() {
            renderer.draw_string(&self.text, x, y, text_style, text_colour);
        } else if self.highlight.is_focused() {
            let focused_for = self.highlight.focused_for(renderer.frame_time());
            let shift = self.marquee_offset(focused_for);
            renderer.enable_scissoring(x, b.y, self.text_room.max(0.0) as u32, b.height as u32);
            let start = x - shift as i32;
            renderer.draw_string(&self.text, start, y, text_style, text_colour);
            let again = start + (self.text_width + MARQUEE_GAP) as i32;
            renderer.draw_string(&self.text, again, y, text_style, text_colour);
            renderer.disable_scissoring();
        } else {
            let short = renderer.limit_string_length(&self.text, self.text_room, text_style);
            renderer.draw_string(&short, x, y, text_style, text_colour);
        }

        if !value.is_empty() {
            let colour = match self.state() {
                Some(true) => theme.on_text,
                Some(false) => theme.off_text,
                None if self.faint_value => theme.off_text,
                None => theme.on_text,
            };
            let vx = b.right() - VALUE_RIGHT_PAD - value_width as i32;
            renderer.draw_string(&value, vx, y, value_style, colour);
        }
    }

    fn draw_highlight(&mut self, renderer: &mut Renderer) {
        if self.highlight.is_focused() {
            self.highlight.draw(renderer, self.bounds);
        }
    }

    fn on_click(&mut self, buttons: Buttons) -> bool {
        let now = Instant::now();
        if let ItemBehaviour::Toggle { state, .. } = &mut self.behaviour {
            if buttons.contains(Buttons::A) {
                *state = !*state;
                let new_state = *state;
                if let Some(listener) = self.state_listener.as_mut() {
                    listener(new_state);
                }
                self.highlight.click(now);
                return true;
            }
        }
        let handled = match self.listener.as_mut() {
            Some(listener) => listener(buttons),
            None => false,
        };
        if handled {
            self.highlight.click(now);
        }
        handled
    }

    fn on_touch(&mut self, event: TouchEvent, touch: &TouchInfo) -> bool {
        let inside = self.bounds.contains(touch.x, touch.y);
        match event {
            TouchEvent::Touch if inside => {
                self.highlight.click(Instant::now());
                true
            }
            TouchEvent::Release
                if inside && self.bounds.contains(touch.initial_x, touch.initial_y) =>
            {
                self.on_click(Buttons::A)
            }
            TouchEvent::Scroll => {
                self.highlight.cancel_click();
                false
            }
            _ => false,
        }
    }

    fn request_focus(
        &mut self,
        _old: Option<ElementId>,
        _direction: FocusDirection,
    ) -> Option<ElementId> {
        Some(self.id)
    }

    fn set_focused(&mut self, focused: bool) {
        self.highlight.set_focused(focused, Instant::now());
    }

    fn shake_highlight(&mut self, direction: FocusDirection, now: Instant) {
        self.highlight.shake(direction, now);
    }

    fn is_item(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::renderer::test_renderer;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_toggle_flips_and_notifies() {
        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let mut item = ListItem::toggle("Wi-Fi", false).with_state_listener(move |s| sink.set(Some(s)));
        assert_eq!(item.value(), "Off");
        assert!(item.on_click(Buttons::A));
        assert_eq!(item.state(), Some(true));
        assert_eq!(seen.get(), Some(true));
        assert_eq!(item.value(), "On");
        // Other buttons fall through to the plain listener, which is absent
        assert!(!item.on_click(Buttons::Y));
        assert_eq!(item.state(), Some(true));
    }

    #[test]
    fn test_plain_listener_decides() {
        let mut item = ListItem::new("Reboot").with_listener(|b| b.contains(Buttons::A));
        assert!(item.on_click(Buttons::A));
        assert!(!item.on_click(Buttons::B));
        assert_eq!(item.state(), None);
    }

    #[test]
    fn test_release_inside_clicks() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let mut item = ListItem::new("x").with_listener(move |_| {
            c.set(c.get() + 1);
            true
        });
        item.set_bounds(Bounds::new(0, 0, 100, 70));
        let inside = TouchInfo {
            x: 10,
            y: 10,
            initial_x: 12,
            initial_y: 12,
            ..Default::default()
        };
        assert!(item.on_touch(TouchEvent::Release, &inside));
        let started_outside = TouchInfo {
            initial_y: 200,
            ..inside
        };
        assert!(!item.on_touch(TouchEvent::Release, &started_outside));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_marquee_waits_then_wraps() {
        let mut r = test_renderer(200, 80);
        let mut item = ListItem::new("a label far too long to ever fit in this narrow row");
        item.set_bounds(Bounds::new(0, 0, 200, 70));
        item.set_focused(true);
        item.draw(&mut r);
        assert!(item.truncated());
        assert_eq!(item.marquee_offset(Duration::from_millis(1999)), 0.0);
        let moved = item.marquee_offset(Duration::from_millis(2100));
        assert!((moved - 10.0).abs() < 0.01);
        let cycle = item.text_width + MARQUEE_GAP;
        let ms = cycle / MARQUEE_SPEED;
        let wrapped =
            item.marquee_offset(MARQUEE_DELAY + Duration::from_secs_f32((ms + 100.0) / 1000.0));
        assert!((wrapped - 10.0).abs() < 0.5);
    }

    #[test]
    fn test_short_label_never_scrolls() {
        let mut r = test_renderer(448, 80);
        let mut item = ListItem::new("ok").with_value("1.0", true);
        item.set_bounds(Bounds::new(0, 0, 448, 70));
        item.draw(&mut r);
        assert!(!item.truncated());
        assert_eq!(item.marquee_offset(Duration::from_secs(10)), 0.0);
    }
}
