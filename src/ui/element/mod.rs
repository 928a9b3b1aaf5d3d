//! Element tree
//!
//! Widgets are a small closed set of structs behind one capability trait.
//! Containers own their children as `Box<dyn Element>`; anything that needs to
//! point back at an element holds its `ElementId`, never a shared reference.

mod drawers;
mod frame;
mod list_item;
mod track_bar;

pub use drawers::{CategoryHeader, CustomDrawer, TableDrawer};
pub use frame::OverlayFrame;
pub use list_item::{ItemBehaviour, ListItem};
pub use track_bar::{StepMode, TrackBar};

use super::colour::Colour;
use super::input::{Buttons, InputSnapshot};
use super::renderer::Renderer;
use super::theme::Theme;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const LIST_ITEM_HEIGHT: i32 = 70;
pub const ITEM_TEXT_SIZE: f32 = 23.0;
pub const ITEM_VALUE_SIZE: f32 = 20.0;
pub const HEADER_TEXT_SIZE: f32 = 16.0;

pub const HIGHLIGHT_THICKNESS: i32 = 4;
pub const HIGHLIGHT_RADIUS: u16 = 4;

const SHAKE_DURATION: Duration = Duration::from_millis(200);
const SHAKE_AMPLITUDE: f32 = 6.0;
const CLICK_DURATION: Duration = Duration::from_millis(150);
const PULSE_PERIOD_SECS: f32 = 1.0;

/// Stable handle to an element, unique for the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ElementId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusDirection {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl FocusDirection {
    /// The single d-pad direction in `buttons`, if exactly one is set
    pub fn from_buttons(buttons: Buttons) -> Option<Self> {
        let dpad = buttons & Buttons::DPAD;
        if dpad == Buttons::UP {
            Some(FocusDirection::Up)
        } else if dpad == Buttons::DOWN {
            Some(FocusDirection::Down)
        } else if dpad == Buttons::LEFT {
            Some(FocusDirection::Left)
        } else if dpad == Buttons::RIGHT {
            Some(FocusDirection::Right)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Controller,
    Touch,
    TouchScroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchEvent {
    Touch,
    Hold,
    Scroll,
    Release,
    #[default]
    None,
}

/// Touch position for this frame plus where the gesture started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchInfo {
    pub x: i32,
    pub y: i32,
    pub prev_x: i32,
    pub prev_y: i32,
    pub initial_x: i32,
    pub initial_y: i32,
}

/// Capability interface every widget implements
///
/// Defaults describe a passive element: not an item, not a table, never
/// accepts focus, ignores input.
pub trait Element {
    fn id(&self) -> ElementId;

    fn bounds(&self) -> Bounds;

    fn set_bounds(&mut self, bounds: Bounds);

    /// Height a list gives this element when no hint was supplied
    fn preferred_height(&self) -> i32 {
        LIST_ITEM_HEIGHT
    }

    fn layout(&mut self, bounds: Bounds) {
        self.set_bounds(bounds);
    }

    fn draw(&mut self, renderer: &mut Renderer);

    /// Focus frame; only called on the focused element
    fn draw_highlight(&mut self, _renderer: &mut Renderer) {}

    fn handle_input(&mut self, _input: &InputSnapshot) -> bool {
        false
    }

    fn on_click(&mut self, _buttons: Buttons) -> bool {
        false
    }

    fn on_touch(&mut self, _event: TouchEvent, _touch: &TouchInfo) -> bool {
        false
    }

    /// The element that should hold focus after moving from `old` in `direction`
    fn request_focus(
        &mut self,
        _old: Option<ElementId>,
        _direction: FocusDirection,
    ) -> Option<ElementId> {
        None
    }

    fn set_focused(&mut self, _focused: bool) {}

    fn shake_highlight(&mut self, _direction: FocusDirection, _now: Instant) {}

    fn set_input_mode(&mut self, _mode: InputMode) {}

    /// Containers report whether they are still scrolling toward a target
    fn is_scrolling(&self) -> bool {
        false
    }

    /// Lists tell their first child so headers can shrink
    fn set_first_in_list(&mut self, _first: bool) {}

    fn is_item(&self) -> bool {
        false
    }

    fn is_table(&self) -> bool {
        false
    }

    /// Descendant lookup for containers
    fn child_mut(&mut self, _id: ElementId) -> Option<&mut dyn Element> {
        None
    }
}

/// `root` itself or the descendant with `id`
pub fn find_mut(root: &mut dyn Element, id: ElementId) -> Option<&mut dyn Element> {
    if root.id() == id {
        return Some(root);
    }
    root.child_mut(id)
}

/// Animation state for the focus frame: pulse, shake on refused moves, click flash
#[derive(Debug, Clone, Default)]
pub struct Highlight {
    focused_at: Option<Instant>,
    shake: Option<(FocusDirection, Instant)>,
    click_at: Option<Instant>,
}

impl Highlight {
    pub fn set_focused(&mut self, focused: bool, now: Instant) {
        self.focused_at = focused.then_some(now);
        if !focused {
            self.shake = None;
            self.click_at = None;
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused_at.is_some()
    }

    pub fn focused_for(&self, now: Instant) -> Duration {
        self.focused_at
            .map(|f| now.saturating_duration_since(f))
            .unwrap_or_default()
    }

    pub fn shake(&mut self, direction: FocusDirection, now: Instant) {
        self.shake = Some((direction, now));
    }

    pub fn click(&mut self, now: Instant) {
        self.click_at = Some(now);
    }

    pub fn cancel_click(&mut self) {
        self.click_at = None;
    }

    pub fn is_shaking(&self, now: Instant) -> bool {
        self.shake
            .is_some_and(|(_, start)| now.saturating_duration_since(start) < SHAKE_DURATION)
    }

    /// Damped sine offset along the refused direction
    pub fn shake_offset(&self, now: Instant) -> (i32, i32) {
        let Some((direction, start)) = self.shake else {
            return (0, 0);
        };
        let t = now.saturating_duration_since(start);
        if t >= SHAKE_DURATION {
            return (0, 0);
        }
        let ms = t.as_secs_f32() * 1000.0;
        let amount = (SHAKE_AMPLITUDE * (ms / 12.0).sin() * (-ms / 80.0).exp()).round() as i32;
        match direction {
            FocusDirection::Up => (0, -amount),
            FocusDirection::Down => (0, amount),
            FocusDirection::Left => (-amount, 0),
            FocusDirection::Right => (amount, 0),
            FocusDirection::None => (0, 0),
        }
    }

    /// 0 at the click, 1 once the flash is over
    pub fn click_progress(&self, now: Instant) -> Option<f32> {
        let start = self.click_at?;
        let t = now.saturating_duration_since(start);
        (t < CLICK_DURATION).then(|| t.as_secs_f32() / CLICK_DURATION.as_secs_f32())
    }

    /// Frame colour, pulsing between the first two highlight colours
    pub fn colour(&self, theme: &Theme, now: Instant) -> Colour {
        if self.is_shaking(now) {
            return theme.highlight_3;
        }
        let since = self.focused_for(now).as_secs_f32();
        let phase = (since / PULSE_PERIOD_SECS) * std::f32::consts::TAU;
        theme.highlight_1.lerp(theme.highlight_2, (phase.sin() + 1.0) / 2.0)
    }

    pub fn draw(&self, renderer: &mut Renderer, bounds: Bounds) {
        let now = renderer.frame_time();
        let theme = renderer.theme().clone();
        renderer.draw_rect(bounds.x, bounds.y, bounds.width, bounds.height, theme.focus_background);
        if let Some(progress) = self.click_progress(now) {
            let alpha = ((1.0 - progress) * 15.0) as u8;
            renderer.draw_rect(
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                theme.click.with_alpha(alpha.min(theme.click.a())),
            );
        }
        let (dx, dy) = self.shake_offset(now);
        renderer.draw_bordered_rounded_rect(
            bounds.x + dx,
            bounds.y + dy,
            bounds.width,
            bounds.height,
            HIGHLIGHT_THICKNESS,
            HIGHLIGHT_RADIUS,
            self.colour(&theme, now),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::new(10, 20, 5, 5);
        assert!(b.contains(10, 20));
        assert!(b.contains(14, 24));
        assert!(!b.contains(15, 24));
        assert!(!b.contains(9, 22));
        assert_eq!(b.bottom(), 25);
    }

    #[test]
    fn test_direction_from_buttons() {
        assert_eq!(
            FocusDirection::from_buttons(Buttons::DOWN | Buttons::A),
            Some(FocusDirection::Down)
        );
        assert_eq!(FocusDirection::from_buttons(Buttons::UP | Buttons::DOWN), None);
        assert_eq!(FocusDirection::from_buttons(Buttons::A), None);
    }

    #[test]
    fn test_shake_settles() {
        let mut h = Highlight::default();
        let start = Instant::now();
        h.shake(FocusDirection::Right, start);
        assert!(h.is_shaking(start + Duration::from_millis(50)));
        let (dx, dy) = h.shake_offset(start + Duration::from_millis(20));
        assert!(dx > 0);
        assert_eq!(dy, 0);
        assert_eq!(h.shake_offset(start + Duration::from_millis(500)), (0, 0));
        assert!(!h.is_shaking(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_click_progress() {
        let mut h = Highlight::default();
        let start = Instant::now();
        assert_eq!(h.click_progress(start), None);
        h.click(start);
        assert_eq!(h.click_progress(start), Some(0.0));
        assert!(h.click_progress(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_highlight_colour_shakes_red() {
        let theme = Theme::default();
        let mut h = Highlight::default();
        let now = Instant::now();
        h.set_focused(true, now);
        assert_eq!(h.colour(&theme, now), theme.highlight_1.lerp(theme.highlight_2, 0.5));
        h.shake(FocusDirection::Up, now);
        assert_eq!(h.colour(&theme, now), theme.highlight_3);
        h.set_focused(false, now);
        assert!(!h.is_focused());
    }
}
