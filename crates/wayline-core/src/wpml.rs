//! WPML text encoding for route and config documents, plus read-back summaries.
//!
//! The writer emits exactly one element per line. The compatibility cleaner
//! depends on that layout, so every leaf goes through [`WpmlWriter::field`].

use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;

use crate::compiler::{
    ActionGroup, ActuatorFunction, ConfigDocument, DocumentHeader, HeadingParam, Placemark,
    RouteDocument, TurnParam,
};
use crate::error::{MissionError, Result};
use crate::models::{HeadingMode, MissionSettings};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
/// Schema version written by the compiler.
pub const WPML_NAMESPACE: &str = "http://www.dji.com/wpmz/1.0.6";

const NO_POI: &str = "0.000000,0.000000,0.000000";

struct WpmlWriter {
    inner: Writer<Vec<u8>>,
}

impl WpmlWriter {
    fn new() -> Result<Self> {
        let mut inner = Writer::new_with_indent(Vec::new(), b' ', 2);
        inner.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut kml = BytesStart::new("kml");
        kml.push_attribute(("xmlns", KML_NAMESPACE));
        kml.push_attribute(("xmlns:wpml", WPML_NAMESPACE));
        inner.write_event(Event::Start(kml))?;
        inner.write_event(Event::Start(BytesStart::new("Document")))?;
        Ok(Self { inner })
    }

    fn open(&mut self, tag: &str) -> Result<()> {
        self.inner.write_event(Event::Start(BytesStart::new(tag)))?;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.inner.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn field(&mut self, tag: &str, value: impl Display) -> Result<()> {
        self.open(tag)?;
        self.inner
            .write_event(Event::Text(BytesText::new(&value.to_string())))?;
        self.close(tag)
    }

    fn finish(mut self) -> Result<String> {
        self.close("Document")?;
        self.close("kml")?;
        let mut text = String::from_utf8(self.inner.into_inner())?;
        text.push('\n');
        Ok(text)
    }
}

/// Encode the executable route document (`waylines.wpml`).
pub fn encode_route(doc: &RouteDocument) -> Result<String> {
    let mut w = WpmlWriter::new()?;
    write_header(&mut w, &doc.header)?;
    write_mission_config(&mut w, &doc.settings)?;

    w.open("Folder")?;
    w.field("wpml:templateId", doc.template_id)?;
    w.field("wpml:executeHeightMode", doc.settings.height_mode.as_wpml())?;
    w.field("wpml:waylineId", doc.wayline_id)?;
    w.field("wpml:distance", format!("{:.1}", doc.totals.distance_m))?;
    w.field("wpml:duration", doc.totals.duration_s)?;
    w.field("wpml:autoFlightSpeed", doc.settings.global_transitional_speed_mps)?;
    w.field("wpml:efficiencyFlightModeEnable", 0)?;
    for placemark in &doc.placemarks {
        write_placemark(&mut w, placemark)?;
    }
    w.close("Folder")?;

    w.finish()
}

/// Encode the mission template / config document (`template.kml`).
pub fn encode_config(doc: &ConfigDocument) -> Result<String> {
    let mut w = WpmlWriter::new()?;
    write_header(&mut w, &doc.header)?;
    write_mission_config(&mut w, &doc.settings)?;

    w.open("Folder")?;
    w.field("wpml:templateType", "waypoint")?;
    w.field("wpml:templateId", doc.template_id)?;
    w.open("wpml:waylineCoordinateSysParam")?;
    w.field("wpml:coordinateMode", "WGS84")?;
    w.field("wpml:heightMode", doc.settings.height_mode.as_wpml())?;
    w.close("wpml:waylineCoordinateSysParam")?;
    w.field("wpml:autoFlightSpeed", doc.settings.global_transitional_speed_mps)?;
    w.field("wpml:globalHeight", doc.global_height_m)?;
    w.field("wpml:distance", format!("{:.1}", doc.totals.distance_m))?;
    w.field("wpml:duration", doc.totals.duration_s)?;
    w.field("wpml:globalWaypointTurnMode", doc.global_turn_mode.as_wpml())?;
    w.field("wpml:globalUseStraightLine", 1)?;
    w.field("wpml:gimbalPitchMode", "usePointSetting")?;
    w.open("wpml:globalWaypointHeadingParam")?;
    match doc.settings.point_of_interest {
        Some(poi) => {
            w.field("wpml:waypointHeadingMode", HeadingMode::TowardPointOfInterest.as_wpml())?;
            w.field("wpml:waypointPoiPoint", poi_text(poi.lat, poi.lon, poi.height_m))?;
        }
        None => {
            w.field("wpml:waypointHeadingMode", HeadingMode::FollowRoute.as_wpml())?;
        }
    }
    w.close("wpml:globalWaypointHeadingParam")?;
    w.close("Folder")?;

    w.finish()
}

fn write_header(w: &mut WpmlWriter, header: &DocumentHeader) -> Result<()> {
    w.field("wpml:author", &header.author)?;
    w.field("wpml:createTime", header.create_time)?;
    w.field("wpml:updateTime", header.update_time)
}

fn write_mission_config(w: &mut WpmlWriter, settings: &MissionSettings) -> Result<()> {
    w.open("wpml:missionConfig")?;
    w.field("wpml:flyToWaylineMode", settings.fly_to_first_mode.as_wpml())?;
    w.field("wpml:finishAction", settings.finish_action.as_wpml())?;
    w.field("wpml:exitOnRCLost", settings.rc_lost_behavior.as_wpml())?;
    w.field("wpml:executeRCLostAction", settings.rc_lost_action.as_wpml())?;
    w.field("wpml:takeOffSecurityHeight", settings.takeoff_security_height_m)?;
    w.field("wpml:globalTransitionalSpeed", settings.global_transitional_speed_mps)?;
    w.open("wpml:droneInfo")?;
    w.field("wpml:droneEnumValue", settings.drone.enum_value)?;
    w.field("wpml:droneSubEnumValue", settings.drone.sub_enum_value)?;
    w.close("wpml:droneInfo")?;
    w.open("wpml:payloadInfo")?;
    w.field("wpml:payloadEnumValue", settings.payload.enum_value)?;
    w.field("wpml:payloadSubEnumValue", settings.payload.sub_enum_value)?;
    w.field("wpml:payloadPositionIndex", settings.payload.position_index)?;
    w.close("wpml:payloadInfo")?;
    w.close("wpml:missionConfig")
}

fn write_placemark(w: &mut WpmlWriter, placemark: &Placemark) -> Result<()> {
    w.open("Placemark")?;
    w.open("Point")?;
    w.field(
        "coordinates",
        format!("{},{}", placemark.position.lon, placemark.position.lat),
    )?;
    w.close("Point")?;
    w.field("wpml:index", placemark.index)?;
    w.field("wpml:executeHeight", placemark.execute_height_m)?;
    w.field("wpml:waypointSpeed", placemark.speed_mps)?;
    write_heading(w, &placemark.heading)?;
    write_turn(w, &placemark.turn)?;
    w.field("wpml:useStraightLine", 1)?;
    if let Some(group) = &placemark.action_group {
        write_action_group(w, group)?;
    }
    w.close("Placemark")
}

fn write_heading(w: &mut WpmlWriter, heading: &HeadingParam) -> Result<()> {
    w.open("wpml:waypointHeadingParam")?;
    w.field("wpml:waypointHeadingMode", heading.mode.as_wpml())?;
    w.field("wpml:waypointHeadingAngle", format!("{:.1}", heading.angle_deg))?;
    match heading.poi {
        Some(poi) => w.field("wpml:waypointPoiPoint", poi_text(poi.lat, poi.lon, poi.height_m))?,
        None => w.field("wpml:waypointPoiPoint", NO_POI)?,
    }
    w.field("wpml:waypointHeadingAngleEnable", 0)?;
    w.field("wpml:waypointHeadingPathMode", "followBadArc")?;
    w.field("wpml:waypointHeadingPoiIndex", 0)?;
    w.close("wpml:waypointHeadingParam")
}

fn write_turn(w: &mut WpmlWriter, turn: &TurnParam) -> Result<()> {
    w.open("wpml:waypointTurnParam")?;
    w.field("wpml:waypointTurnMode", turn.mode.as_wpml())?;
    w.field("wpml:waypointTurnDampingDist", turn.damping_dist_m)?;
    w.close("wpml:waypointTurnParam")
}

fn write_action_group(w: &mut WpmlWriter, group: &ActionGroup) -> Result<()> {
    w.open("wpml:actionGroup")?;
    w.field("wpml:actionGroupId", group.id)?;
    w.field("wpml:actionGroupStartIndex", group.start_index)?;
    w.field("wpml:actionGroupEndIndex", group.end_index)?;
    w.field("wpml:actionGroupMode", "sequence")?;
    w.open("wpml:actionTrigger")?;
    w.field("wpml:actionTriggerType", group.trigger.as_wpml())?;
    w.close("wpml:actionTrigger")?;

    for action in &group.actions {
        w.open("wpml:action")?;
        w.field("wpml:actionId", action.id)?;
        w.field("wpml:actionActuatorFunc", action.function.as_wpml())?;
        w.open("wpml:actionActuatorFuncParam")?;
        match &action.function {
            ActuatorFunction::GimbalRotate {
                pitch_deg,
                payload_position_index,
            } => {
                w.field("wpml:gimbalHeadingYawBase", "aircraft")?;
                w.field("wpml:gimbalRotateMode", "absoluteAngle")?;
                w.field("wpml:gimbalPitchRotateEnable", 1)?;
                w.field("wpml:gimbalPitchRotateAngle", pitch_deg)?;
                w.field("wpml:gimbalRollRotateEnable", 0)?;
                w.field("wpml:gimbalRollRotateAngle", 0)?;
                w.field("wpml:gimbalYawRotateEnable", 0)?;
                w.field("wpml:gimbalYawRotateAngle", 0)?;
                w.field("wpml:gimbalRotateTimeEnable", 0)?;
                w.field("wpml:gimbalRotateTime", 0)?;
                w.field("wpml:payloadPositionIndex", payload_position_index)?;
            }
            ActuatorFunction::GimbalEvenlyRotate {
                pitch_deg,
                payload_position_index,
            } => {
                w.field("wpml:gimbalPitchRotateAngle", pitch_deg)?;
                w.field("wpml:payloadPositionIndex", payload_position_index)?;
            }
            ActuatorFunction::TakePhoto {
                file_suffix,
                payload_position_index,
            } => {
                w.field("wpml:fileSuffix", file_suffix)?;
                w.field("wpml:payloadPositionIndex", payload_position_index)?;
                w.field("wpml:useGlobalPayloadLensIndex", 0)?;
            }
        }
        w.close("wpml:actionActuatorFuncParam")?;
        w.close("wpml:action")?;
    }

    w.close("wpml:actionGroup")
}

fn poi_text(lat: f64, lon: f64, height: f64) -> String {
    format!("{:.6},{:.6},{:.6}", lat, lon, height)
}

// ========== READ-BACK ==========

/// Facts extracted from an encoded route document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSummary {
    pub wpml_namespace: Option<String>,
    pub distance_m: Option<f64>,
    pub duration_s: Option<u64>,
    pub waypoint_indices: Vec<usize>,
    pub action_groups: usize,
    pub actuator_functions: Vec<String>,
}

impl RouteSummary {
    pub fn waypoint_count(&self) -> usize {
        self.waypoint_indices.len()
    }

    /// Placemark indices run 0, 1, 2, ... in document order.
    pub fn indices_contiguous(&self) -> bool {
        self.waypoint_indices
            .iter()
            .enumerate()
            .all(|(position, index)| position == *index)
    }
}

/// Facts extracted from an encoded config document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub wpml_namespace: Option<String>,
    pub has_mission_config: bool,
    pub template_type: Option<String>,
    pub finish_action: Option<String>,
}

/// Parse a route document and collect its summary. Fails on malformed XML.
pub fn inspect_route(text: &str) -> Result<RouteSummary> {
    let mut summary = RouteSummary::default();
    walk(text, |event| match event {
        Walk::Namespace(ns) => summary.wpml_namespace = Some(ns),
        Walk::Open("wpml:actionGroup") => summary.action_groups += 1,
        Walk::Open(_) => {}
        Walk::Text("wpml:distance", value) => summary.distance_m = value.trim().parse().ok(),
        Walk::Text("wpml:duration", value) => summary.duration_s = value.trim().parse().ok(),
        Walk::Text("wpml:index", value) => {
            if let Ok(index) = value.trim().parse() {
                summary.waypoint_indices.push(index);
            }
        }
        Walk::Text("wpml:actionActuatorFunc", value) => {
            summary.actuator_functions.push(value.trim().to_string())
        }
        Walk::Text(_, _) => {}
    })?;
    Ok(summary)
}

/// Parse a config document and collect its summary. Fails on malformed XML.
pub fn inspect_config(text: &str) -> Result<ConfigSummary> {
    let mut summary = ConfigSummary::default();
    walk(text, |event| match event {
        Walk::Namespace(ns) => summary.wpml_namespace = Some(ns),
        Walk::Open("wpml:missionConfig") => summary.has_mission_config = true,
        Walk::Open(_) => {}
        Walk::Text("wpml:templateType", value) => {
            summary.template_type = Some(value.trim().to_string())
        }
        Walk::Text("wpml:finishAction", value) => {
            summary.finish_action = Some(value.trim().to_string())
        }
        Walk::Text(_, _) => {}
    })?;
    Ok(summary)
}

enum Walk<'a> {
    Namespace(String),
    Open(&'a str),
    Text(&'a str, &'a str),
}

fn walk<F>(text: &str, mut visit: F) -> Result<()>
where
    F: FnMut(Walk<'_>),
{
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if name == "kml" {
                    for attr in start.attributes() {
                        let attr = attr.map_err(|err| MissionError::Encoding(err.to_string()))?;
                        if attr.key.as_ref() == b"xmlns:wpml" {
                            let value = attr.unescape_value()?;
                            visit(Walk::Namespace(value.into_owned()));
                        }
                    }
                }
                visit(Walk::Open(&name));
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(content) => {
                if let Some(current) = stack.last() {
                    let value = content.unescape()?;
                    visit(Walk::Text(current, &value));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MissionError::Encoding(format!(
            "document ended with {} unclosed element(s)",
            stack.len()
        )));
    }
    Ok(())
}
