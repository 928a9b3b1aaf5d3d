//! Top of the element tree: owns focus, turns raw input into focus moves,
//! clicks and touch gestures.

use super::element::{
    find_mut, Bounds, Element, ElementId, FocusDirection, InputMode, TouchEvent, TouchInfo,
};
use super::input::{Buttons, InputSnapshot, TouchPoint};
use super::renderer::{Display, Renderer};
use crate::error::DisplayError;
use std::time::{Duration, Instant};

/// How long a direction must be held before it starts repeating
pub const CLICK_THRESHOLD: Duration = Duration::from_millis(340);

const TOUCH_SCROLL_DISTANCE: i32 = 10;

/// Repeat interval for a direction held this long; speeds up the longer it's held
pub fn repeat_interval(held_for: Duration) -> Duration {
    let ms = held_for.as_millis();
    Duration::from_millis(if ms > 2400 {
        10
    } else if ms > 1600 {
        20
    } else if ms > 800 {
        50
    } else {
        67
    })
}

#[derive(Debug, Default)]
struct KeyRepeat {
    direction: Option<FocusDirection>,
    since: Option<Instant>,
    last_fire: Option<Instant>,
}

impl KeyRepeat {
    /// Direction to move this frame, if any
    fn tick(&mut self, input: &InputSnapshot, now: Instant) -> Option<FocusDirection> {
        if let Some(dir) = FocusDirection::from_buttons(input.buttons_down) {
            self.direction = Some(dir);
            self.since = Some(now);
            self.last_fire = Some(now);
            return Some(dir);
        }
        let held = FocusDirection::from_buttons(input.buttons_held);
        if held.is_none() || held != self.direction {
            self.direction = held;
            self.since = held.map(|_| now);
            self.last_fire = None;
            return None;
        }
        let since = self.since?;
        let held_for = now.saturating_duration_since(since);
        if held_for < CLICK_THRESHOLD {
            return None;
        }
        let due = self
            .last_fire
            .is_none_or(|last| now.saturating_duration_since(last) >= repeat_interval(held_for));
        if due {
            self.last_fire = Some(now);
            held
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct TouchTracker {
    active: bool,
    scrolling: bool,
    started: Option<Instant>,
    initial: TouchPoint,
    prev: TouchPoint,
}

impl TouchTracker {
    fn classify(&mut self, touch: Option<TouchPoint>, now: Instant) -> (TouchEvent, TouchInfo) {
        match (touch, self.active) {
            (Some(p), false) => {
                self.active = true;
                self.scrolling = false;
                self.started = Some(now);
                self.initial = p;
                self.prev = p;
                (TouchEvent::Touch, self.info(p))
            }
            (Some(p), true) => {
                let moved = (p.x - self.initial.x).abs() > TOUCH_SCROLL_DISTANCE
                    || (p.y - self.initial.y).abs() > TOUCH_SCROLL_DISTANCE;
                self.scrolling |= moved;
                let held_long = self
                    .started
                    .is_some_and(|s| now.saturating_duration_since(s) >= CLICK_THRESHOLD);
                let event = if self.scrolling {
                    TouchEvent::Scroll
                } else if held_long {
                    TouchEvent::Hold
                } else {
                    TouchEvent::None
                };
                let info = self.info(p);
                self.prev = p;
                (event, info)
            }
            (None, true) => {
                self.active = false;
                let info = self.info(self.prev);
                // A drag ends silently; only a tap releases onto what's under it
                let event = if self.scrolling {
                    TouchEvent::None
                } else {
                    TouchEvent::Release
                };
                self.scrolling = false;
                (event, info)
            }
            (None, false) => (TouchEvent::None, TouchInfo::default()),
        }
    }

    fn info(&self, p: TouchPoint) -> TouchInfo {
        TouchInfo {
            x: p.x,
            y: p.y,
            prev_x: self.prev.x,
            prev_y: self.prev.y,
            initial_x: self.initial.x,
            initial_y: self.initial.y,
        }
    }
}

pub struct Gui {
    top: Box<dyn Element>,
    focused: Option<ElementId>,
    input_mode: InputMode,
    repeat: KeyRepeat,
    touch: TouchTracker,
}

impl Gui {
    pub fn new(top: Box<dyn Element>) -> Self {
        Self {
            top,
            focused: None,
            input_mode: InputMode::Controller,
            repeat: KeyRepeat::default(),
            touch: TouchTracker::default(),
        }
    }

    pub fn top_mut(&mut self) -> &mut dyn Element {
        self.top.as_mut()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut dyn Element> {
        find_mut(self.top.as_mut(), id)
    }

    fn focused_element(&mut self) -> Option<&mut dyn Element> {
        let id = self.focused?;
        self.element_mut(id)
    }

    /// Move focus; a refused move shakes the current highlight unless the view is still scrolling
    pub fn request_focus(&mut self, direction: FocusDirection, shake: bool, now: Instant) {
        let old = self.focused;
        let new = self.top.request_focus(old, direction);
        match new {
            Some(id) if new != old => {
                if let Some(prev) = self.focused_element() {
                    prev.set_focused(false);
                }
                if let Some(next) = self.element_mut(id) {
                    next.set_focused(true);
                }
                log::trace!("focus {:?} -> {:?} ({:?})", old, id, direction);
                self.focused = Some(id);
            }
            _ => {
                if shake && !self.top.is_scrolling() {
                    if let Some(current) = self.focused_element() {
                        current.shake_highlight(direction, now);
                    }
                }
            }
        }
    }

    /// Drop focus from `id`, or from whatever holds it when `None`
    pub fn remove_focus(&mut self, id: Option<ElementId>) {
        let Some(current) = self.focused else {
            return;
        };
        if id.is_some_and(|i| i != current) {
            return;
        }
        if let Some(e) = self.element_mut(current) {
            e.set_focused(false);
        }
        self.focused = None;
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        if self.input_mode != mode {
            log::debug!("input mode {:?} -> {:?}", self.input_mode, mode);
            self.input_mode = mode;
            self.top.set_input_mode(mode);
        }
    }

    /// Route one frame of input; returns whether anything consumed it
    pub fn handle_input(&mut self, input: &InputSnapshot, now: Instant) -> bool {
        // Focus may point at an element that was removed since last frame
        if self.focused.is_some() && self.focused_element().is_none() {
            self.focused = None;
        }

        if input.is_touching() || self.touch.active {
            let (event, info) = self.touch.classify(input.touch(), now);
            match event {
                TouchEvent::Touch => self.set_input_mode(InputMode::Touch),
                TouchEvent::Scroll => self.set_input_mode(InputMode::TouchScroll),
                TouchEvent::Release => self.set_input_mode(InputMode::Touch),
                TouchEvent::None if !self.touch.active => self.set_input_mode(InputMode::Touch),
                _ => {}
            }
            if event == TouchEvent::None {
                return false;
            }
            return self.top.on_touch(event, &info);
        }

        if input.buttons_down.is_empty() && input.buttons_held.is_empty() {
            self.repeat = KeyRepeat::default();
            return false;
        }
        if !input.buttons_down.is_empty() {
            self.set_input_mode(InputMode::Controller);
        }
        if self.focused.is_none() {
            self.request_focus(FocusDirection::None, false, now);
        }

        let clicks = input.buttons_down - Buttons::DPAD;
        if !clicks.is_empty() {
            let handled = match self.focused_element() {
                Some(e) => e.on_click(clicks),
                None => false,
            };
            if handled || self.top.on_click(clicks) {
                return true;
            }
        }

        // Sliders and the like get first refusal on directions
        if let Some(e) = self.focused_element() {
            if e.handle_input(input) {
                self.repeat = KeyRepeat::default();
                return true;
            }
        }

        match self.repeat.tick(input, now) {
            Some(direction) => {
                self.request_focus(direction, true, now);
                true
            }
            None => false,
        }
    }

    pub fn draw(&mut self, renderer: &mut Renderer) {
        let bounds = Bounds::new(0, 0, renderer.width() as i32, renderer.height() as i32);
        self.top.layout(bounds);
        if self.focused.is_none() && self.input_mode == InputMode::Controller {
            self.request_focus(FocusDirection::None, false, renderer.frame_time());
        }
        self.top.draw(renderer);
    }

    /// One full frame: clear, draw, present
    pub fn render(
        &mut self,
        renderer: &mut Renderer,
        display: &mut dyn Display,
    ) -> Result<(), DisplayError> {
        renderer.start_frame();
        self.draw(renderer);
        renderer.end_frame(display)
    }
}
