//! Compatibility cleaner for generated mission documents.
//!
//! A single forward pass over the document lines. Deny-listed scalar fields are
//! dropped wherever they appear; action groups are buffered until their nesting
//! closes and then either flushed verbatim or discarded whole when any line
//! inside names a deny-listed actuator function.
//!
//! Relies on the one-element-per-line layout produced by [`crate::wpml`]. It is
//! not a general XML filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{MissionError, Result};

const ACTION_GROUP_TAG: &str = "wpml:actionGroup";
const ACTUATOR_FUNC_TAG: &str = "wpml:actionActuatorFunc";

/// What to strip and rewrite for one firmware compatibility target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerRules {
    /// Element tags removed wherever they appear
    pub denied_fields: HashSet<String>,
    /// Actuator functions whose whole action group is removed
    pub denied_actuator_functions: HashSet<String>,
    /// Namespace literal rewritten from `.0` to `.1`
    pub namespace_rewrite: Option<(String, String)>,
}

impl CleanerRules {
    /// Rules for firmware that predates the 1.0.6 schema.
    pub fn legacy_firmware() -> Self {
        Self {
            denied_fields: [
                "wpml:efficiencyFlightModeEnable",
                "wpml:waypointHeadingAngle",
                "wpml:waypointHeadingAngleEnable",
                "wpml:waypointHeadingPoiIndex",
                "wpml:waypointPoiPoint",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            denied_actuator_functions: ["gimbalEvenlyRotate"]
                .into_iter()
                .map(String::from)
                .collect(),
            namespace_rewrite: Some((
                "http://www.dji.com/wpmz/1.0.6".to_string(),
                "http://www.dji.com/wpmz/1.0.2".to_string(),
            )),
        }
    }

    pub fn deny_actuator_function(mut self, function: impl Into<String>) -> Self {
        self.denied_actuator_functions.insert(function.into());
        self
    }
}

impl Default for CleanerRules {
    fn default() -> Self {
        Self::legacy_firmware()
    }
}

/// Counts of what a pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub removed_fields: usize,
    pub removed_groups: usize,
    pub rewritten_namespaces: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub text: String,
    pub report: CleanReport,
}

enum State<'a> {
    Outside,
    Buffering {
        depth: usize,
        marked: bool,
        lines: Vec<&'a str>,
    },
}

/// Line shape relevant to the filter.
#[derive(Clone, Copy)]
enum Line<'a> {
    Open(&'a str),
    Close(&'a str),
    Leaf { tag: &'a str, text: &'a str },
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("</") {
        return match rest.strip_suffix('>') {
            Some(tag) => Line::Close(tag.trim()),
            None => Line::Other,
        };
    }
    let Some(rest) = trimmed.strip_prefix('<') else {
        return Line::Other;
    };
    if rest.starts_with('?') || rest.starts_with('!') || trimmed.ends_with("/>") {
        return Line::Other;
    }
    let Some(gt) = rest.find('>') else {
        return Line::Other;
    };
    let head = &rest[..gt];
    let tag = head.split_whitespace().next().unwrap_or(head);
    let after = &rest[gt + 1..];
    if after.is_empty() {
        return Line::Open(tag);
    }
    let closing = format!("</{tag}>");
    match after.strip_suffix(closing.as_str()) {
        Some(text) => Line::Leaf { tag, text },
        None => Line::Other,
    }
}

/// Strip firmware-incompatible content from one document.
///
/// Fails with [`MissionError::MalformedDocument`] when action-group nesting does
/// not balance; no partial output is returned in that case.
pub fn clean(text: &str, rules: &CleanerRules) -> Result<Cleaned> {
    let mut out: Vec<String> = Vec::new();
    let mut report = CleanReport::default();
    let mut state = State::Outside;

    for (number, line) in text.lines().enumerate() {
        let shape = classify(line);

        if let Line::Leaf { tag, .. } = shape {
            if rules.denied_fields.contains(tag) {
                report.removed_fields += 1;
                continue;
            }
        }

        state = match state {
            State::Outside => match shape {
                Line::Open(ACTION_GROUP_TAG) => State::Buffering {
                    depth: 1,
                    marked: false,
                    lines: vec![line],
                },
                Line::Close(ACTION_GROUP_TAG) => {
                    return Err(MissionError::MalformedDocument {
                        line: number + 1,
                        depth: -1,
                    });
                }
                _ => {
                    out.push(rewrite(line, rules, &mut report));
                    State::Outside
                }
            },
            State::Buffering {
                mut depth,
                mut marked,
                mut lines,
            } => {
                lines.push(line);
                match shape {
                    Line::Open(ACTION_GROUP_TAG) => depth += 1,
                    Line::Close(ACTION_GROUP_TAG) => depth -= 1,
                    Line::Leaf {
                        tag: ACTUATOR_FUNC_TAG,
                        text,
                    } if rules.denied_actuator_functions.contains(text.trim()) => marked = true,
                    _ => {}
                }

                if depth > 0 {
                    State::Buffering {
                        depth,
                        marked,
                        lines,
                    }
                } else {
                    if marked {
                        report.removed_groups += 1;
                    } else {
                        for buffered in lines {
                            out.push(rewrite(buffered, rules, &mut report));
                        }
                    }
                    State::Outside
                }
            }
        };
    }

    if let State::Buffering { depth, .. } = state {
        return Err(MissionError::MalformedDocument {
            line: text.lines().count(),
            depth: depth as i64,
        });
    }

    let mut cleaned = out.join("\n");
    if text.ends_with('\n') {
        cleaned.push('\n');
    }

    tracing::debug!(
        removed_fields = report.removed_fields,
        removed_groups = report.removed_groups,
        "cleaned document"
    );

    Ok(Cleaned {
        text: cleaned,
        report,
    })
}

fn rewrite(line: &str, rules: &CleanerRules, report: &mut CleanReport) -> String {
    match &rules.namespace_rewrite {
        Some((from, to)) if line.contains(from.as_str()) => {
            report.rewritten_namespaces += 1;
            line.replace(from.as_str(), to)
        }
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:wpml="http://www.dji.com/wpmz/1.0.6">
  <Document>
    <Folder>
      <wpml:efficiencyFlightModeEnable>0</wpml:efficiencyFlightModeEnable>
      <Placemark>
        <wpml:index>1</wpml:index>
        <wpml:waypointHeadingParam>
          <wpml:waypointHeadingMode>followWayline</wpml:waypointHeadingMode>
          <wpml:waypointHeadingAngle>45.0</wpml:waypointHeadingAngle>
          <wpml:waypointPoiPoint>0.000000,0.000000,0.000000</wpml:waypointPoiPoint>
        </wpml:waypointHeadingParam>
        <wpml:actionGroup>
          <wpml:actionGroupId>0</wpml:actionGroupId>
          <wpml:action>
            <wpml:actionActuatorFunc>gimbalEvenlyRotate</wpml:actionActuatorFunc>
          </wpml:action>
          <wpml:action>
            <wpml:actionActuatorFunc>takePhoto</wpml:actionActuatorFunc>
          </wpml:action>
        </wpml:actionGroup>
      </Placemark>
      <Placemark>
        <wpml:index>2</wpml:index>
        <wpml:actionGroup>
          <wpml:actionGroupId>1</wpml:actionGroupId>
          <wpml:action>
            <wpml:actionActuatorFunc>takePhoto</wpml:actionActuatorFunc>
          </wpml:action>
        </wpml:actionGroup>
      </Placemark>
    </Folder>
  </Document>
</kml>
"#;

    #[test]
    fn drops_denied_fields_everywhere() {
        let cleaned = clean(ROUTE, &CleanerRules::legacy_firmware()).unwrap();
        assert!(!cleaned.text.contains("efficiencyFlightModeEnable"));
        assert!(!cleaned.text.contains("waypointHeadingAngle"));
        assert!(!cleaned.text.contains("waypointPoiPoint"));
        assert!(cleaned.text.contains("<wpml:waypointHeadingMode>followWayline</wpml:waypointHeadingMode>"));
        assert_eq!(cleaned.report.removed_fields, 3);
    }

    #[test]
    fn drops_whole_group_with_denied_function() {
        let cleaned = clean(ROUTE, &CleanerRules::legacy_firmware()).unwrap();
        assert_eq!(cleaned.report.removed_groups, 1);
        assert!(!cleaned.text.contains("<wpml:actionGroupId>0</wpml:actionGroupId>"));
        assert!(cleaned.text.contains("<wpml:actionGroupId>1</wpml:actionGroupId>"));
        // the sibling photo action inside the removed group goes too
        assert_eq!(cleaned.text.matches("takePhoto").count(), 1);
        assert_eq!(
            cleaned.text.matches("<wpml:actionGroup>").count(),
            cleaned.text.matches("</wpml:actionGroup>").count()
        );
    }

    #[test]
    fn action_group_id_is_not_a_group_open() {
        let cleaned = clean(ROUTE, &CleanerRules::legacy_firmware()).unwrap();
        assert!(cleaned.text.contains("<wpml:index>2</wpml:index>"));
    }

    #[test]
    fn rewrites_namespace_version() {
        let cleaned = clean(ROUTE, &CleanerRules::legacy_firmware()).unwrap();
        assert!(cleaned.text.contains("http://www.dji.com/wpmz/1.0.2"));
        assert!(!cleaned.text.contains("http://www.dji.com/wpmz/1.0.6"));
        assert_eq!(cleaned.report.rewritten_namespaces, 1);
        assert!(cleaned.text.ends_with("</kml>\n"));
    }

    #[test]
    fn unclosed_group_is_malformed() {
        let doc = "<Folder>\n<wpml:actionGroup>\n<wpml:actionGroupId>0</wpml:actionGroupId>\n</Folder>\n";
        let err = clean(doc, &CleanerRules::legacy_firmware()).unwrap_err();
        assert!(matches!(err, MissionError::MalformedDocument { depth: 1, .. }));
    }

    #[test]
    fn stray_close_is_malformed() {
        let doc = "<Folder>\n</wpml:actionGroup>\n</Folder>\n";
        let err = clean(doc, &CleanerRules::legacy_firmware()).unwrap_err();
        assert!(matches!(
            err,
            MissionError::MalformedDocument { line: 2, depth: -1 }
        ));
    }

    #[test]
    fn nested_groups_are_buffered_as_one_block() {
        let doc = "\
<wpml:actionGroup>
<wpml:actionGroup>
<wpml:actionActuatorFunc>gimbalEvenlyRotate</wpml:actionActuatorFunc>
</wpml:actionGroup>
<wpml:actionActuatorFunc>takePhoto</wpml:actionActuatorFunc>
</wpml:actionGroup>
<keep>1</keep>";
        let cleaned = clean(doc, &CleanerRules::legacy_firmware()).unwrap();
        assert_eq!(cleaned.text, "<keep>1</keep>");
        assert_eq!(cleaned.report.removed_groups, 1);
    }

    #[test]
    fn custom_rules_can_deny_plain_gimbal_rotate() {
        let doc = "\
<wpml:actionGroup>
<wpml:actionActuatorFunc>gimbalRotate</wpml:actionActuatorFunc>
</wpml:actionGroup>";
        let rules = CleanerRules::legacy_firmware().deny_actuator_function("gimbalRotate");
        let cleaned = clean(doc, &rules).unwrap();
        assert!(cleaned.text.is_empty());
    }

    #[test]
    fn classify_shapes() {
        assert!(matches!(classify("  <wpml:actionGroup>"), Line::Open("wpml:actionGroup")));
        assert!(matches!(classify("</wpml:actionGroup>  "), Line::Close("wpml:actionGroup")));
        assert!(matches!(
            classify("<wpml:actionGroupId>3</wpml:actionGroupId>"),
            Line::Leaf { tag: "wpml:actionGroupId", text: "3" }
        ));
        assert!(matches!(classify("<kml xmlns=\"x\">"), Line::Open("kml")));
        assert!(matches!(classify("<?xml version=\"1.0\"?>"), Line::Other));
        assert!(matches!(classify("<empty/>"), Line::Other));
    }
}
