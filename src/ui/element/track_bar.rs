use super::{
    Bounds, Element, ElementId, FocusDirection, Highlight, TouchEvent, TouchInfo, ITEM_VALUE_SIZE,
    LIST_ITEM_HEIGHT,
};
use crate::ui::input::{Buttons, InputSnapshot};
use crate::ui::renderer::Renderer;
use crate::ui::text_rasterizing::TextStyle;
use std::time::Instant;

const TRACK_LEFT: i32 = 60;
const TRACK_RIGHT: i32 = 60;
const TRACK_THICKNESS: i32 = 6;
const KNOB_RADIUS: u16 = 10;

pub type ValueListener = Box<dyn FnMut(u8)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMode {
    /// Any value 0..=100, moves one unit per frame while held
    Analog,
    /// `n` evenly spaced stops
    Stepped(u8),
    /// One stop per name; the current name is drawn above the track
    Named(Vec<String>),
}

impl StepMode {
    fn stops(&self) -> Option<u8> {
        match self {
            StepMode::Analog => None,
            StepMode::Stepped(n) => Some((*n).max(2)),
            StepMode::Named(names) => Some((names.len().clamp(2, u8::MAX as usize)) as u8),
        }
    }
}

/// Horizontal slider over 0..=100
pub struct TrackBar {
    id: ElementId,
    bounds: Bounds,
    label: String,
    value: u8,
    mode: StepMode,
    highlight: Highlight,
    listener: Option<ValueListener>,
}

impl TrackBar {
    pub fn new(label: impl Into<String>, mode: StepMode) -> Self {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            label: label.into(),
            value: 0,
            mode,
            highlight: Highlight::default(),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: impl FnMut(u8) + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Index of the current stop, or the raw value for analog bars
    pub fn step(&self) -> u8 {
        match self.mode.stops() {
            Some(stops) => {
                let span = 100.0 / (stops - 1) as f32;
                (self.value as f32 / span).round() as u8
            }
            None => self.value,
        }
    }

    /// Sets without notifying; stepped bars snap to the nearest stop
    pub fn set_value(&mut self, value: u8) {
        let value = value.min(100);
        self.value = match self.mode.stops() {
            Some(stops) => {
                let span = 100.0 / (stops - 1) as f32;
                ((value as f32 / span).round() * span).round() as u8
            }
            None => value,
        };
    }

    fn nudge(&mut self, right: bool) -> bool {
        let before = self.value;
        match self.mode.stops() {
            Some(stops) => {
                let step = self.step();
                let target = if right {
                    (step + 1).min(stops - 1)
                } else {
                    step.saturating_sub(1)
                };
                let span = 100.0 / (stops - 1) as f32;
                self.value = (target as f32 * span).round() as u8;
            }
            None => {
                self.value = if right {
                    (self.value + 1).min(100)
                } else {
                    self.value.saturating_sub(1)
                };
            }
        }
        if self.value != before {
            if let Some(listener) = self.listener.as_mut() {
                listener(self.value);
            }
        }
        self.value != before
    }

    fn track_span(&self) -> (i32, i32) {
        let start = self.bounds.x + TRACK_LEFT;
        let end = self.bounds.right() - TRACK_RIGHT;
        (start, end.max(start))
    }

    fn knob_x(&self) -> i32 {
        let (start, end) = self.track_span();
        start + ((end - start) as f32 * self.value as f32 / 100.0) as i32
    }
}

impl Element for TrackBar {
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
        LIST_ITEM_HEIGHT + 13
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        let b = self.bounds;
        let theme = renderer.theme().clone();
        let style = TextStyle::new(ITEM_VALUE_SIZE);
        let caption = match &self.mode {
            StepMode::Named(names) => names
                .get(self.step() as usize)
                .map(|n| format!("{}: {}", self.label, n))
                .unwrap_or_else(|| self.label.clone()),
            _ => self.label.clone(),
        };
        renderer.draw_string(&caption, b.x + 19, b.y + 28, style, theme.text);

        let (start, end) = self.track_span();
        let cy = b.y + b.height * 2 / 3;
        let knob = self.knob_x();
        renderer.draw_uniform_rounded_rect(
            start,
            cy - TRACK_THICKNESS / 2,
            end - start,
            TRACK_THICKNESS,
            theme.track_bar_empty,
        );
        if knob > start {
            renderer.draw_uniform_rounded_rect(
                start,
                cy - TRACK_THICKNESS / 2,
                knob - start,
                TRACK_THICKNESS,
                theme.track_bar,
            );
        }
        if let Some(stops) = self.mode.stops() {
            for i in 0..stops {
                let x = start + (end - start) * i as i32 / (stops - 1) as i32;
                renderer.draw_rect(x, cy - TRACK_THICKNESS, 1, TRACK_THICKNESS * 2, theme.separator);
            }
        }
        renderer.draw_circle(knob, cy, KNOB_RADIUS, true, theme.track_bar_knob);
        renderer.draw_circle(knob, cy, KNOB_RADIUS, false, theme.track_bar);
    }

    fn draw_highlight(&mut self, renderer: &mut Renderer) {
        if self.highlight.is_focused() {
            self.highlight.draw(renderer, self.bounds);
        }
    }

    fn handle_input(&mut self, input: &InputSnapshot) -> bool {
        if !self.highlight.is_focused() {
            return false;
        }
        // Analog bars slide while held; stepped ones move once per press
        let keys = match self.mode {
            StepMode::Analog => input.buttons_held,
            _ => input.buttons_down,
        };
        if keys.contains(Buttons::LEFT) {
            if !self.nudge(false) {
                self.highlight.shake(FocusDirection::Left, Instant::now());
            }
            return true;
        }
        if keys.contains(Buttons::RIGHT) {
            if !self.nudge(true) {
                self.highlight.shake(FocusDirection::Right, Instant::now());
            }
            return true;
        }
        // Swallow the held half of a stepped press so focus doesn't move sideways
        input.buttons_held.intersects(Buttons::LEFT | Buttons::RIGHT)
    }

    fn on_touch(&mut self, event: TouchEvent, touch: &TouchInfo) -> bool {
        if !matches!(event, TouchEvent::Touch | TouchEvent::Scroll | TouchEvent::Hold)
            || !self.bounds.contains(touch.initial_x, touch.initial_y)
        {
            return false;
        }
        let (start, end) = self.track_span();
        if end <= start {
            return false;
        }
        let before = self.value;
        let raw = ((touch.x - start) as f32 / (end - start) as f32 * 100.0).clamp(0.0, 100.0);
        self.set_value(raw.round() as u8);
        if self.value != before {
            if let Some(listener) = self.listener.as_mut() {
                listener(self.value);
            }
        }
        true
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
