// UI module exports
// Plain-text rendering of the board for the terminal

mod terminal;

pub use terminal::{render_board, render_event_list, RenderOptions};
