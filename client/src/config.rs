// Element ids of the stock pages. Features whose anchor element is missing
// are skipped.

pub const CANVAS_ID: &str = "drawing-canvas";
pub const MATH_INPUT_ID: &str = "math-input";
pub const MATH_PREVIEW_ID: &str = "math-preview";
pub const COLOR_PICKER_ID: &str = "colorPicker";

pub const UNDO_ID: &str = "undo-btn";
pub const REDO_ID: &str = "redo-btn";
pub const CLEAR_ID: &str = "clear-btn";
pub const PRINT_MATH_ID: &str = "print-math-btn";
pub const EXPORT_ID: &str = "export-btn";
pub const SAVE_SHEET_ID: &str = "save-sheet-btn";
pub const LOAD_SHEET_ID: &str = "load-sheet-btn";
pub const LOAD_SHEET_INPUT_ID: &str = "load-sheet-file";

pub const MATRIX_ROWS_ID: &str = "matrix-rows";
pub const MATRIX_COLS_ID: &str = "matrix-cols";
pub const MATRIX_BUTTON_ID: &str = "matrix-btn";
pub const QUICK_FORMULA_ID: &str = "quick-formula-select";
pub const QUICK_FORMULA_BUTTON_ID: &str = "quick-formula-btn";

/// Toolbar buttons carry `data-tool="pen|highlighter|line|arrow"`.
pub const TOOL_BUTTON_SELECTOR: &str = ".tool-btn[data-tool]";
/// Buttons inserting raw markup carry `data-insert="..."`.
pub const INSERT_BUTTON_SELECTOR: &str = "[data-insert]";
/// Buttons inserting a named snippet carry `data-snippet="box|bold|..."`.
pub const SNIPPET_BUTTON_SELECTOR: &str = "[data-snippet]";
pub const ACTIVE_TOOL_CLASS: &str = "active-tool";

pub const PAGES_CONTAINER_ID: &str = "pages-container";
pub const PARTICIPANTS_LIST_ID: &str = "participants-list";
pub const ADD_PAGE_ID: &str = "add-page-btn";
pub const ADD_PARTICIPANT_ID: &str = "add-participant-btn";
pub const PRINT_ID: &str = "print-btn";
pub const SELECT_ALL_ID: &str = "select-all-btn";
pub const CLEAR_CONTENT_ID: &str = "clear-content-btn";

pub const EXPORT_FILE_NAME: &str = "sheetboard.png";
pub const SHEET_FILE_NAME: &str = "sheetboard.sheet";

pub const EXPORT_BLOCKED_MESSAGE: &str =
    "Your browser blocked the automatic capture. Please take a manual screenshot or use Print.";
pub const PRINT_BLOCKED_MESSAGE: &str =
    "Printing is not available here. Please take a manual screenshot instead.";
pub const CLEAR_ALL_CONFIRM: &str = "Clear all content and drawing?";
pub const DELETE_PAGE_CONFIRM: &str = "Delete this page?";
pub const CLEAR_PAGES_CONFIRM: &str = "Delete ALL content blocks?";
pub const BAD_SHEET_MESSAGE: &str = "That file is not a worksheet this version can open.";

// Coordinate plotter, driven through the page's JSXGraph script.
pub const PLOT_BOX_ID: &str = "box";
pub const PLOT_X_ID: &str = "ptX";
pub const PLOT_Y_ID: &str = "ptY";
pub const ADD_POINT_ID: &str = "add-point-btn";
pub const TOGGLE_LINE_ID: &str = "toggle-line-btn";
pub const CAPTURE_PLOT_ID: &str = "capture-plot-btn";
pub const RESET_PLOT_ID: &str = "reset-plot-btn";
pub const PLOT_FILE_NAME: &str = "sheetboard-plot.png";
pub const INVALID_POINT_MESSAGE: &str = "Enter valid numbers.";
pub const TOO_FEW_POINTS_MESSAGE: &str = "Add at least 2 points.";
pub const PLOT_CANVAS_MISSING_MESSAGE: &str =
    "No drawing area was found. Please use Print instead.";
