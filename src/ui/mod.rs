pub mod colour;
pub mod compositing;
pub mod drawing;
pub mod element;
pub mod gui;
pub mod input;
pub mod list;
pub mod renderer;
pub mod surface;
pub mod text_rasterizing;
pub mod theme;

pub use colour::Colour;
pub use element::{Bounds, Element, ElementId, FocusDirection, InputMode};
pub use gui::Gui;
pub use input::{Buttons, InputPoller, InputSnapshot, InputSource, SharedInput};
pub use list::List;
pub use renderer::{Display, HeadlessDisplay, Renderer};
pub use surface::{PixelLayout, PixelSurface};
pub use text_rasterizing::{FontSet, FontdueFace, GlyphCache, TextStyle};
pub use theme::Theme;
