//! Read and write part lists, and give parts a place and a look for export

mod part_list;
mod placement;

use serde::{Deserialize, Serialize};

pub use part_list::{
    check_limits, read_part_file, read_parts, write_part_file, write_parts, MAX_INPUTS,
};
pub use placement::{place, AtOrigin, Linear, Placement};

/// Look of an exported part, attached as its payload
///
/// The network never interprets it; it is carried to the part list as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    /// Color, as a hexadecimal RGB string
    pub color: String,
    /// Position, in grid units
    pub pos: [i32; 3],
    /// Orientation, as the x and z axes
    pub axis: (i32, i32),
}

impl Default for Appearance {
    fn default() -> Self {
        Appearance {
            color: "222222".to_owned(),
            pos: [0, 0, 0],
            axis: (1, -2),
        }
    }
}
