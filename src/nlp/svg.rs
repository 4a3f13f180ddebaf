use std::fmt::Write as _;

use super::annotation::Token;

const STEP: usize = 110;
const MARGIN: usize = 40;
const BASELINE: usize = 170;
const HEIGHT: usize = 220;

/// Render tokens and their dependency arcs as a standalone SVG document.
///
/// The layout is a single row of tokens with labelled arcs drawn above,
/// dependent to head. Good enough to eyeball a parse in a browser.
pub fn render_arcs(tokens: &[Token]) -> String {
    let width = MARGIN * 2 + tokens.len().max(1) * STEP;
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {width} {HEIGHT}\" font-family=\"monospace\">"
    );

    for (i, token) in tokens.iter().enumerate() {
        let x = MARGIN + i * STEP;
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{BASELINE}\" font-size=\"14\">{}</text>",
            xml_escape(&token.text)
        );
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{}\" font-size=\"10\" fill=\"#888\">{}</text>",
            BASELINE + 22,
            xml_escape(&token.pos)
        );
    }

    for (i, token) in tokens.iter().enumerate() {
        if token.head == i {
            continue;
        }
        let (from, to) = if token.head > i {
            (i, token.head)
        } else {
            (token.head, i)
        };
        let x1 = MARGIN + from * STEP + 10;
        let x2 = MARGIN + to * STEP + 10;
        let xm = (x1 + x2) / 2;
        // arcs over longer distances rise higher, clamped to the canvas
        let rise = (24 + (to - from) * 14).min(BASELINE - 40);
        let base = BASELINE - 20;
        let apex = base - rise;
        let _ = write!(
            svg,
            "<path d=\"M {x1},{base} Q {xm},{apex} {x2},{base}\" fill=\"none\" \
             stroke=\"#555\" stroke-width=\"1\"/>"
        );
        let _ = write!(
            svg,
            "<text x=\"{xm}\" y=\"{}\" font-size=\"9\" fill=\"#555\" \
             text-anchor=\"middle\">{}</text>",
            apex.saturating_sub(2).max(10),
            xml_escape(&token.dep)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
