//! Deterministic stylesheet assembly.
//!
//! Every tree node contributes one class named after its id. Desktop
//! properties form the base rules; tablet and mobile overrides go into two
//! `@media` sections so the cascade mirrors the breakpoint inheritance in
//! [`Styles::resolve`]. Properties are emitted in a fixed order and rules in
//! tree order, so the same tree always produces the same bytes.

use fhub_domain::blocks::{Breakpoint, StyleProps, Styles};
use fhub_domain::constants::{MOBILE_MAX_WIDTH, TABLET_MAX_WIDTH};
use std::fmt::Write;

/// Collects rules while the tree is walked, then emits one stylesheet.
#[derive(Debug, Default)]
pub struct StylesheetBuilder {
    base: String,
    tablet: String,
    mobile: String,
}

impl StylesheetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the rules for one node.
    pub fn push(&mut self, id: &str, styles: &Styles) {
        let class = css_class(id);
        write_rule(&mut self.base, &class, &styles.desktop);
        if let Some(over) = styles.override_for(Breakpoint::Tablet) {
            write_rule(&mut self.tablet, &class, over);
        }
        if let Some(over) = styles.override_for(Breakpoint::Mobile) {
            write_rule(&mut self.mobile, &class, over);
        }
    }

    /// Base rules, then the tablet window, then the mobile window.
    #[must_use]
    pub fn finish(self) -> String {
        let mut out = self.base;
        if !self.tablet.is_empty() {
            let _ = write!(out, "@media (max-width:{TABLET_MAX_WIDTH}px){{{}}}", self.tablet);
        }
        if !self.mobile.is_empty() {
            let _ = write!(out, "@media (max-width:{MOBILE_MAX_WIDTH}px){{{}}}", self.mobile);
        }
        out
    }
}

/// Class name for a node id. Ids come from the editor as url-safe tokens;
/// anything else is flattened to `-` so the class stays a valid identifier.
#[must_use]
pub fn css_class(id: &str) -> String {
    let mut class = String::with_capacity(id.len() + 3);
    class.push_str("fh-");
    for ch in id.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            class.push(ch);
        } else {
            class.push('-');
        }
    }
    class
}

/// One `.class{...}` rule. Empty property sets produce nothing.
fn write_rule(out: &mut String, class: &str, props: &StyleProps) {
    if props.is_empty() {
        return;
    }
    let _ = write!(out, ".{class}{{");
    if let Some(direction) = props.direction {
        let _ = write!(out, "display:flex;flex-direction:{};", direction.as_css());
    }
    write_prop(out, "gap", props.gap.as_deref());
    write_prop(out, "padding", props.padding.as_deref());
    write_prop(out, "margin", props.margin.as_deref());
    write_prop(out, "width", props.width.as_deref());
    write_prop(out, "max-width", props.max_width.as_deref());
    if let Some(align) = props.align {
        let _ = write!(out, "align-items:{};", align.as_css());
    }
    if let Some(justify) = props.justify {
        let _ = write!(out, "justify-content:{};", justify.as_css());
    }
    write_prop(out, "font-size", props.font_size.as_deref());
    write_prop(out, "font-weight", props.font_weight.as_deref());
    if let Some(text_align) = props.text_align {
        let _ = write!(out, "text-align:{};", text_align.as_css());
    }
    write_prop(out, "color", props.color.as_deref());
    write_prop(out, "background", props.background.as_deref());
    write_prop(out, "border-radius", props.border_radius.as_deref());
    // Last so it beats the flex display when both are set.
    match props.hidden {
        Some(true) => out.push_str("display:none;"),
        Some(false) => out.push_str("display:revert;"),
        None => {}
    }
    out.push('}');
}

fn write_prop(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = write!(out, "{name}:{};", css_value(value));
    }
}

/// Strips the characters that would let a value break out of its rule.
fn css_value(value: &str) -> String {
    value.chars().filter(|ch| !matches!(ch, ';' | '{' | '}' | '\n' | '\r')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhub_domain::blocks::{AxisAlign, Direction};

    fn styles() -> Styles {
        Styles {
            desktop: StyleProps {
                direction: Some(Direction::Row),
                gap: Some("16px".to_owned()),
                align: Some(AxisAlign::Center),
                background: Some("#fff".to_owned()),
                ..StyleProps::default()
            },
            tablet: Some(StyleProps {
                gap: Some("12px".to_owned()),
                ..StyleProps::default()
            }),
            mobile: Some(StyleProps {
                direction: Some(Direction::Column),
                hidden: Some(false),
                ..StyleProps::default()
            }),
        }
    }

    #[test]
    fn rules_land_in_their_breakpoint_window() {
        let mut builder = StylesheetBuilder::new();
        builder.push("hero", &styles());
        let css = builder.finish();

        assert_eq!(
            css,
            ".fh-hero{display:flex;flex-direction:row;gap:16px;align-items:center;\
             background:#fff;}\
             @media (max-width:1024px){.fh-hero{gap:12px;}}\
             @media (max-width:640px){.fh-hero{display:flex;flex-direction:column;\
             display:revert;}}"
        );
    }

    #[test]
    fn output_is_byte_stable() {
        let render = || {
            let mut builder = StylesheetBuilder::new();
            builder.push("a", &styles());
            builder.push("b", &Styles {
                desktop: StyleProps { hidden: Some(true), ..StyleProps::default() },
                tablet: None,
                mobile: None,
            });
            builder.finish()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn empty_styles_emit_nothing() {
        let mut builder = StylesheetBuilder::new();
        builder.push("quiet", &Styles::default());
        assert_eq!(builder.finish(), "");
    }

    #[test]
    fn values_cannot_escape_their_rule() {
        let mut builder = StylesheetBuilder::new();
        builder.push("sneaky", &Styles {
            desktop: StyleProps {
                color: Some("red;}body{display:none".to_owned()),
                ..StyleProps::default()
            },
            tablet: None,
            mobile: None,
        });
        let css = builder.finish();
        assert_eq!(css, ".fh-sneaky{color:redbodydisplay:none;}");
    }

    #[test]
    fn class_names_are_flattened_to_safe_tokens() {
        assert_eq!(css_class("hero-1"), "fh-hero-1");
        assert_eq!(css_class("a b\"c"), "fh-a-b-c");
    }
}
