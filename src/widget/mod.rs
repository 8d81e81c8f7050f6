//! Widget system: the trait the layout and render passes drive.

pub mod traits;

pub use traits::{Panel, Widget};
