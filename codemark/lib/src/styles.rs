//! Stylesheet for the overlay classes.
//!
//! Colours come straight from [`Settings`]; the layout rules position the
//! title bar in the padding reserved above the code and lay the number and
//! highlight columns over the code's left edge and full width.

use crate::config::Settings;
use crate::live::{LINE_NUMBER_CLASS, LINE_SHOW_CLASS};
use crate::reading::overlay::{
    CLOSED_ATTRIBUTE, COLLAPSER_CLASS, HANDLE_CLASS, HAS_LINENUM_CLASS, HIGHLIGHT_CLASS,
    HIGHLIGHT_WRAP_CLASS, LANG_NAME_CLASS, LINENUM_CLASS, LINENUM_WRAP_CLASS, PADDING_TOP,
    TITLE_CLASS, TITLE_TEXT_CLASS,
};

/// Generates the `<style>` block for every overlay and decoration class.
///
/// ## Examples
///
/// ```
/// use codemark_lib::Settings;
/// use codemark_lib::styles::generate_styles;
///
/// let css = generate_styles(&Settings::default());
/// assert!(css.starts_with("<style>"));
/// assert!(css.contains("#00000020"));
/// ```
pub fn generate_styles(settings: &Settings) -> String {
    let title_color = settings
        .title_font()
        .map(|color| format!("\n    color: {};", color))
        .unwrap_or_default();
    let divider = if settings.show_dividing_line {
        "\n    border-right: 1px currentColor solid;"
    } else {
        ""
    };

    format!(
        r#"<style>
.{title} {{
    position: absolute;
    top: 0;
    left: 0;
    right: 0;
    height: {padding};
    line-height: {padding};
    padding: 0 1em;
    background-color: {title_bg};{title_color}
    cursor: pointer;
    user-select: none;
    border-radius: 4px 4px 0 0;
}}

.{title_text} {{
    font-weight: bold;
}}

.{lang} {{
    float: right;
    margin-right: 1.5em;
    opacity: 0.6;
}}

.{collapser} {{
    position: absolute;
    top: 50%;
    right: 0.75em;
    transform: translateY(-50%);
}}

.{handle} {{
    width: 0.5em;
    height: 0.5em;
    border-right: 2px solid currentColor;
    border-bottom: 2px solid currentColor;
    transform: rotate(45deg);
    transition: transform 0.2s;
}}

.{title}[{closed}] .{handle} {{
    transform: rotate(-45deg);
}}

pre:has(> .{title}[{closed}]) {{
    height: {padding};
    overflow: hidden;
}}

.{has_linenum} > code {{
    padding-left: 3.5em;
}}

.{linenum_wrap} {{
    position: absolute;
    top: {padding};
    left: 0;
    width: 2.5em;
    text-align: right;
    user-select: none;
    opacity: 0.6;{divider}
}}

.{linenum}, .{highlight} {{
    display: block;
    padding-right: 0.5em;
}}

.{highlight_wrap} {{
    position: absolute;
    top: {padding};
    left: 0;
    right: 0;
    z-index: 0;
    pointer-events: none;
}}

.{highlight} {{
    background-color: transparent;
}}

.{line_show} {{
    position: relative;
    padding-left: 3.5em !important;
}}

.{line_num} {{
    position: absolute;
    left: 0;
    width: 2.5em;
    padding-right: 0.5em;
    text-align: right;
    opacity: 0.6;
}}
</style>
"#,
        title = TITLE_CLASS,
        title_text = TITLE_TEXT_CLASS,
        lang = LANG_NAME_CLASS,
        collapser = COLLAPSER_CLASS,
        handle = HANDLE_CLASS,
        closed = CLOSED_ATTRIBUTE,
        has_linenum = HAS_LINENUM_CLASS,
        linenum_wrap = LINENUM_WRAP_CLASS,
        linenum = LINENUM_CLASS,
        highlight_wrap = HIGHLIGHT_WRAP_CLASS,
        highlight = HIGHLIGHT_CLASS,
        line_show = LINE_SHOW_CLASS,
        line_num = LINE_NUMBER_CLASS,
        padding = PADDING_TOP,
        title_bg = settings.title_background(),
        title_color = title_color,
        divider = divider,
    )
}
