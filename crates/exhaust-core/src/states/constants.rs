//! Layout constants for the 128x64 screens.

// Splash

/// Top of each splash title line
pub const SPLASH_TITLE_ROWS_PX: [i32; 3] = [3, 18, 33];

/// Top of the version line
pub const SPLASH_VERSION_ROW_PX: i32 = 51;

// Monitor

/// Top of the large temperature readout
pub const READOUT_TOP_PX: i32 = 0;

/// Top edge of the graph outline; the readout sits above it
pub const GRAPH_TOP_PX: i32 = 20;

/// Horizontal spacing of the dots on the alarm threshold line
pub const ALARM_LINE_DOT_SPACING_PX: usize = 4;

// Menu

/// Height of one menu row and of the selection bar
pub const MENU_ROW_HEIGHT_PX: u32 = 10;

/// Left edge of menu labels
pub const MENU_TEXT_X_PX: i32 = 10;

/// Capacity of a rendered label
pub const LABEL_LEN: usize = 24;
