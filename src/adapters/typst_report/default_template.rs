//! Default Typst report template.
//!
//! Built-in Typst report markup with `{{PLACEHOLDER}}` substitution. Custom
//! templates may use any subset of the placeholders below.

pub const PLACEHOLDERS: [&str; 14] = [
    "{{TITLE}}",
    "{{H_PERFORMANCE}}",
    "{{H_HOLDING_OUTCOMES}}",
    "{{H_NAV}}",
    "{{H_DRAWDOWN}}",
    "{{H_INSTRUMENTS}}",
    "{{RUN_SUMMARY}}",
    "{{METRICS_TABLE}}",
    "{{PROBABILITY_TABLE}}",
    "{{NAV_CHART}}",
    "{{DRAWDOWN_CHARTS}}",
    "{{INSTRUMENT_SECTIONS}}",
    "{{SKIPPED_CODES}}",
    "{{GENERATED_WITH}}",
];

const TEMPLATE: &str = r#"#set page(paper: "a4", margin: 2cm)
#set text(size: 10pt, font: ("Linux Libertine", "Noto Serif CJK SC"))
#set table(stroke: 0.5pt + luma(180), inset: 6pt)

= {{TITLE}}

{{RUN_SUMMARY}}

{{SKIPPED_CODES}}

== {{H_PERFORMANCE}}

{{METRICS_TABLE}}

== {{H_HOLDING_OUTCOMES}}

{{PROBABILITY_TABLE}}

== {{H_NAV}}

{{NAV_CHART}}

== {{H_DRAWDOWN}}

{{DRAWDOWN_CHARTS}}

#pagebreak()

== {{H_INSTRUMENTS}}

{{INSTRUMENT_SECTIONS}}

#v(1fr)
#text(size: 8pt, fill: luma(120))[{{GENERATED_WITH}}]
"#;

pub fn template() -> &'static str {
    TEMPLATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_uses_every_placeholder() {
        for placeholder in PLACEHOLDERS {
            assert!(template().contains(placeholder), "missing {placeholder}");
        }
    }

    #[test]
    fn template_sets_up_page() {
        assert!(template().starts_with("#set page("));
    }
}
