//! Scrolling list
//!
//! Keeps the focused item about a third of the way down the viewport and walks
//! through tables taller than the free space in fixed steps ("in-table" mode)
//! instead of jumping over them. Structural changes are queued and applied at
//! the start of the next layout or draw, so listeners may add and remove items
//! while the list is iterating.

use super::element::{
    Bounds, Element, ElementId, FocusDirection, InputMode, TouchEvent, TouchInfo,
};
use super::input::InputSnapshot;
use super::renderer::Renderer;
use std::collections::HashMap;

pub const SCROLL_STEP: f32 = 40.0;
/// Extra scroll room past the last element
pub const SLACK: f32 = 50.0;

const DAMPING: f32 = 0.5;
const SMOOTHING: f32 = 0.2;
const SNAP_DISTANCE: f32 = 1.0;

const SCROLLBAR_X: i32 = 10;
const SCROLLBAR_WIDTH: i32 = 5;
const SCROLLBAR_MARGIN: f32 = 6.0;
const MIN_THUMB: f32 = 20.0;

enum PendingOp {
    Add {
        element: Box<dyn Element>,
        height: Option<i32>,
        index: Option<usize>,
    },
    Remove(ElementId),
    RemoveIndex(usize),
    Clear,
}

/// Where a tall table was entered and how many steps have been taken inside it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TableScroll {
    entry_offset: f32,
    steps: u32,
}

pub struct List {
    id: ElementId,
    bounds: Bounds,
    items: Vec<Box<dyn Element>>,
    hints: Vec<Option<i32>>,
    heights: Vec<f32>,
    tops: Vec<f32>,
    focused_index: usize,
    offset: f32,
    next_offset: f32,
    velocity: f32,
    pending: Vec<PendingOp>,
    tables: HashMap<ElementId, TableScroll>,
    in_table: Option<ElementId>,
    input_mode: InputMode,
    touch_target: Option<ElementId>,
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    pub fn new() -> Self {
        Self {
            id: ElementId::next(),
            bounds: Bounds::default(),
            items: Vec::new(),
            hints: Vec::new(),
            heights: Vec::new(),
            tops: Vec::new(),
            focused_index: 0,
            offset: 0.0,
            next_offset: 0.0,
            velocity: 0.0,
            pending: Vec::new(),
            tables: HashMap::new(),
            in_table: None,
            input_mode: InputMode::Controller,
            touch_target: None,
        }
    }

    /// Queue `element` for insertion before `insert_index` (end of list when `None`,
    /// clamped at flush time); `height_hint` overrides its preferred height
    pub fn add_item(
        &mut self,
        element: Box<dyn Element>,
        height_hint: Option<i32>,
        insert_index: Option<usize>,
    ) {
        self.pending.push(PendingOp::Add {
            element,
            height: height_hint,
            index: insert_index,
        });
    }

    pub fn remove_item(&mut self, id: ElementId) {
        self.pending.push(PendingOp::Remove(id));
    }

    pub fn remove_index(&mut self, index: usize) {
        self.pending.push(PendingOp::RemoveIndex(index));
    }

    pub fn clear(&mut self) {
        self.pending.push(PendingOp::Clear);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn item_at_index(&self, index: usize) -> Option<&dyn Element> {
        self.items.get(index).map(|e| e.as_ref())
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.items.iter().position(|e| e.id() == id)
    }

    pub fn focused_index(&self) -> usize {
        self.focused_index
    }

    /// Moves the focus bookkeeping only; the owner updates element focus flags
    pub fn set_focused_index(&mut self, index: usize) {
        self.focused_index = index.min(self.items.len().saturating_sub(1));
        self.in_table = None;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn next_offset(&self) -> f32 {
        self.next_offset
    }

    /// The tall table currently being stepped through
    pub fn in_table(&self) -> Option<ElementId> {
        self.in_table
    }

    pub fn content_height(&self) -> f32 {
        self.heights.iter().sum()
    }

    pub fn max_offset(&self) -> f32 {
        let content = self.content_height();
        let view = self.view_height();
        if content > view {
            content - view + SLACK
        } else {
            0.0
        }
    }

    fn view_height(&self) -> f32 {
        self.bounds.height as f32
    }

    fn clamp_offset(&self, offset: f32) -> f32 {
        offset.clamp(0.0, self.max_offset())
    }

    /// Scroll target that puts item `index` a third of the way down
    fn focus_offset(&self, index: usize) -> f32 {
        self.clamp_offset(self.tops[index] - self.view_height() / 3.0)
    }

    fn bottom_of(&self, index: usize) -> f32 {
        self.tops[index] + self.heights[index]
    }

    /// Apply queued structural changes in order
    pub fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        for op in std::mem::take(&mut self.pending) {
            match op {
                PendingOp::Add {
                    mut element,
                    height,
                    index,
                } => {
                    element.set_input_mode(self.input_mode);
                    let at = index.unwrap_or(self.items.len()).min(self.items.len());
                    if !self.items.is_empty() && at <= self.focused_index {
                        self.focused_index += 1;
                    }
                    self.items.insert(at, element);
                    self.hints.insert(at, height);
                }
                PendingOp::Remove(id) => {
                    if let Some(i) = self.index_of(id) {
                        self.remove_at(i);
                    } else {
                        log::debug!("list {:?}: remove of unknown element {:?}", self.id, id);
                    }
                }
                PendingOp::RemoveIndex(i) => {
                    if i < self.items.len() {
                        self.remove_at(i);
                    } else {
                        log::debug!("list {:?}: remove index {} out of range", self.id, i);
                    }
                }
                PendingOp::Clear => {
                    self.items.clear();
                    self.hints.clear();
                    self.tables.clear();
                    self.in_table = None;
                    self.focused_index = 0;
                    self.offset = 0.0;
                    self.next_offset = 0.0;
                    self.velocity = 0.0;
                }
            }
        }
        if self.focused_index >= self.items.len() {
            self.focused_index = self.items.len().saturating_sub(1);
        }
        self.measure();
        self.next_offset = self.clamp_offset(self.next_offset);
        self.offset = self.clamp_offset(self.offset);
    }

    fn remove_at(&mut self, i: usize) {
        let removed = self.items.remove(i);
        self.hints.remove(i);
        self.tables.remove(&removed.id());
        if self.in_table == Some(removed.id()) {
            self.in_table = None;
        }
        if i < self.focused_index {
            self.focused_index -= 1;
        }
    }

    fn measure(&mut self) {
        self.heights.clear();
        self.tops.clear();
        let mut top = 0.0;
        for (i, item) in self.items.iter_mut().enumerate() {
            item.set_first_in_list(i == 0);
            let h = self.hints[i].unwrap_or_else(|| item.preferred_height()) as f32;
            self.tops.push(top);
            self.heights.push(h);
            top += h;
        }
    }

    /// Advance the smoothed offset one frame toward the target
    pub fn update_scroll(&mut self) {
        self.next_offset = self.clamp_offset(self.next_offset);
        if self.input_mode == InputMode::TouchScroll {
            self.offset = self.next_offset;
            self.velocity = 0.0;
            return;
        }
        let distance = self.next_offset - self.offset;
        self.velocity = self.velocity * DAMPING + distance * SMOOTHING;
        self.offset += self.velocity;
        let remaining = self.next_offset - self.offset;
        if remaining.abs() < SNAP_DISTANCE && self.velocity.abs() < SNAP_DISTANCE {
            self.offset = self.next_offset;
            self.velocity = 0.0;
        }
        self.offset = self.clamp_offset(self.offset);
    }

    fn layout_children(&mut self) {
        let b = self.bounds;
        for (i, item) in self.items.iter_mut().enumerate() {
            let y = b.y + (self.tops[i] - self.offset).round() as i32;
            item.layout(Bounds::new(b.x, y, b.width, self.heights[i] as i32));
        }
    }

    fn has_focusable(&self) -> bool {
        self.items.iter().any(|e| e.is_item())
    }

    fn current(&self) -> Option<ElementId> {
        self.items
            .get(self.focused_index)
            .filter(|e| e.is_item())
            .map(|e| e.id())
    }

    fn focus_item(&mut self, index: usize) -> Option<ElementId> {
        self.focused_index = index;
        self.in_table = None;
        self.next_offset = self.focus_offset(index);
        Some(self.items[index].id())
    }

    /// Item visible at the current scroll position, then backwards, then forwards
    fn focus_from_offset(&mut self) -> Option<ElementId> {
        let at = self
            .tops
            .iter()
            .zip(&self.heights)
            .position(|(top, h)| self.next_offset < top + h)
            .unwrap_or(self.items.len() - 1);
        let target = (0..=at)
            .rev()
            .chain(at + 1..self.items.len())
            .find(|&i| self.items[i].is_item())?;
        self.focus_item(target)
    }

    /// Forward search from `from`, starting below `anchor_bottom`
    fn walk_down(&mut self, from: usize, anchor_bottom: f32) -> Option<ElementId> {
        let view = self.view_height();
        let mut passed = 0.0;
        for i in from..self.items.len() {
            if self.items[i].is_item() {
                return self.focus_item(i);
            }
            passed += self.heights[i];
            if self.items[i].is_table() && passed > self.next_offset + view - anchor_bottom {
                let id = self.items[i].id();
                self.tables.insert(
                    id,
                    TableScroll {
                        entry_offset: self.next_offset,
                        steps: 0,
                    },
                );
                self.in_table = Some(id);
                return self.step_down_in_table(i);
            }
        }
        // Nothing focusable below; reveal whatever trails the last item
        self.next_offset = (self.next_offset + SCROLL_STEP).min(self.max_offset());
        self.current()
    }

    fn step_down_in_table(&mut self, index: usize) -> Option<ElementId> {
        let max = self.max_offset();
        if self.next_offset + self.view_height() >= self.bottom_of(index) || self.next_offset >= max {
            self.in_table = None;
            return self.walk_down(index + 1, self.bottom_of(index));
        }
        self.next_offset = (self.next_offset + SCROLL_STEP).min(max);
        if let Some(state) = self.tables.get_mut(&self.items[index].id()) {
            state.steps += 1;
        }
        self.current()
    }

    /// Backward search from just above `from`, starting above `anchor_top`
    fn walk_up(&mut self, from: usize, anchor_top: f32) -> Option<ElementId> {
        let view = self.view_height();
        let mut passed = 0.0;
        for i in (0..from).rev() {
            if self.items[i].is_item() {
                return self.focus_item(i);
            }
            passed += self.heights[i];
            if !self.items[i].is_table() || passed <= anchor_top - self.next_offset {
                continue;
            }
            let id = self.items[i].id();
            let recorded = self.tables.get(&id).copied().unwrap_or_default();
            if recorded.steps == 0 {
                // Never walked down, or already unwound: derive the steps from geometry
                let entry = self.clamp_offset(self.tops[i] - view / 3.0);
                let steps = if self.next_offset > entry {
                    ((self.next_offset - entry) / SCROLL_STEP).ceil() as u32
                } else {
                    0
                };
                if steps == 0 {
                    continue;
                }
                self.tables.insert(
                    id,
                    TableScroll {
                        entry_offset: entry,
                        steps,
                    },
                );
            }
            self.in_table = Some(id);
            return self.step_up_in_table(i);
        }
        self.next_offset = (self.next_offset - SCROLL_STEP).max(0.0);
        self.current()
    }

    fn step_up_in_table(&mut self, index: usize) -> Option<ElementId> {
        let id = self.items[index].id();
        let state = self.tables.get(&id).copied().unwrap_or_default();
        if state.steps == 0 {
            self.in_table = None;
            // Entered from above: the item over the table already has focus
            let from = index.min(self.focused_index);
            return self.walk_up(from, self.tops[from]);
        }
        self.next_offset = (self.next_offset - SCROLL_STEP).max(state.entry_offset);
        self.tables.insert(
            id,
            TableScroll {
                steps: state.steps - 1,
                ..state
            },
        );
        self.current()
    }

    fn scroll_by(&mut self, delta: f32) {
        self.in_table = None;
        self.next_offset = self.clamp_offset(self.next_offset + delta);
    }

    /// Thumb length, `None` when everything fits
    pub fn scrollbar_thumb(&self) -> Option<f32> {
        let content = self.content_height();
        let view_height = self.view_height();
        if content <= view_height {
            return None;
        }
        let view = view_height - 2.0 * SCROLLBAR_MARGIN;
        let total = content + 4.0 * SCROLLBAR_MARGIN;
        Some((view * view / total).clamp(MIN_THUMB.min(view), view.max(0.0)))
    }

    fn draw_scrollbar(&self, renderer: &mut Renderer) {
        let Some(thumb) = self.scrollbar_thumb() else {
            return;
        };
        let theme = renderer.theme().clone();
        let view = self.view_height() - 2.0 * SCROLLBAR_MARGIN;
        let max = self.max_offset();
        let progress = if max > 0.0 { self.offset / max } else { 0.0 };
        let x = self.bounds.right() + SCROLLBAR_X;
        let top = self.bounds.y as f32 + SCROLLBAR_MARGIN;
        let thumb_y = top + (view - thumb) * progress;
        renderer.draw_rect(x + 2, top as i32, 1, view as i32, theme.scrollbar_wall);
        renderer.draw_uniform_rounded_rect(
            x,
            thumb_y.round() as i32,
            SCROLLBAR_WIDTH,
            thumb.round() as i32,
            theme.scrollbar,
        );
    }
}

impl Element for List {
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
        self.flush_pending();
        self.measure();
        self.next_offset = self.clamp_offset(self.next_offset);
        self.offset = self.clamp_offset(self.offset);
        self.layout_children();
    }

    fn draw(&mut self, renderer: &mut Renderer) {
        self.flush_pending();
        self.update_scroll();
        self.layout_children();

        let b = self.bounds;
        renderer.enable_scissoring(b.x, b.y, b.width.max(0) as u32, b.height.max(0) as u32);
        for item in self.items.iter_mut() {
            let ib = item.bounds();
            if ib.bottom() >= b.y && ib.y <= b.bottom() {
                item.draw(renderer);
            }
        }
        if self.input_mode == InputMode::Controller {
            if let Some(item) = self.items.get_mut(self.focused_index) {
                item.draw_highlight(renderer);
            }
        }
        renderer.disable_scissoring();
        self.draw_scrollbar(renderer);
    }

    fn handle_input(&mut self, input: &InputSnapshot) -> bool {
        match self.items.get_mut(self.focused_index) {
            Some(item) if item.is_item() => item.handle_input(input),
            _ => false,
        }
    }

    fn on_touch(&mut self, event: TouchEvent, touch: &TouchInfo) -> bool {
        if event == TouchEvent::Scroll {
            if !self.bounds.contains(touch.initial_x, touch.initial_y) {
                return false;
            }
            // The element under first contact may claim the drag for itself
            let target = self.touch_target;
            if let Some(item) = self.items.iter_mut().find(|item| Some(item.id()) == target) {
                if item.on_touch(event, touch) {
                    return true;
                }
            }
            self.scroll_by((touch.prev_y - touch.y) as f32);
            self.offset = self.next_offset;
            self.velocity = 0.0;
            return true;
        }
        if !self.bounds.contains(touch.x, touch.y) {
            if event == TouchEvent::Touch {
                self.touch_target = None;
            }
            return false;
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.bounds().contains(touch.x, touch.y));
        if event == TouchEvent::Touch {
            self.touch_target = item.as_ref().map(|item| item.id());
        }
        item.is_some_and(|item| item.on_touch(event, touch))
    }

    fn request_focus(
        &mut self,
        old: Option<ElementId>,
        direction: FocusDirection,
    ) -> Option<ElementId> {
        self.flush_pending();
        if self.items.is_empty() {
            return None;
        }
        if !self.has_focusable() {
            match direction {
                FocusDirection::Down => self.scroll_by(SCROLL_STEP),
                FocusDirection::Up => self.scroll_by(-SCROLL_STEP),
                _ => {}
            }
            return None;
        }

        let known = old.and_then(|id| self.index_of(id)).filter(|&i| self.items[i].is_item());
        let Some(index) = known else {
            return self.focus_from_offset();
        };
        self.focused_index = index;

        match direction {
            FocusDirection::None => self.focus_from_offset(),
            FocusDirection::Left | FocusDirection::Right => {
                self.items[index].request_focus(old, direction)
            }
            FocusDirection::Down => match self.in_table.and_then(|t| self.index_of(t)) {
                Some(t) => self.step_down_in_table(t),
                None => {
                    self.in_table = None;
                    self.walk_down(index + 1, self.bottom_of(index))
                }
            },
            FocusDirection::Up => match self.in_table.and_then(|t| self.index_of(t)) {
                Some(t) => self.step_up_in_table(t),
                None => {
                    self.in_table = None;
                    let above = index.checked_sub(1).filter(|&i| self.items[i].is_table());
                    let resumable = above.filter(|&i| {
                        self.tables
                            .get(&self.items[i].id())
                            .is_some_and(|t| t.steps > 0)
                    });
                    match resumable {
                        Some(t) => {
                            self.in_table = Some(self.items[t].id());
                            self.step_up_in_table(t)
                        }
                        None => self.walk_up(index, self.tops[index]),
                    }
                }
            },
        }
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
        for item in self.items.iter_mut() {
            item.set_input_mode(mode);
        }
    }

    fn is_scrolling(&self) -> bool {
        self.offset != self.next_offset
    }

    fn child_mut(&mut self, id: ElementId) -> Option<&mut dyn Element> {
        for item in self.items.iter_mut() {
            if item.id() == id {
                return Some(item.as_mut());
            }
            if let Some(found) = item.child_mut(id) {
                return Some(found);
            }
        }
        None
    }
}
