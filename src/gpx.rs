use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{CoordinateField, MissionError};
use crate::store::parse_coordinate;
use crate::waypoint::Waypoint;

type Result<T> = std::result::Result<T, MissionError>;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// A `<wpt>` read from a GPX document.
#[derive(Debug, Clone, PartialEq)]
pub struct GpxWaypoint {
    pub lat: f64,
    pub lon: f64,
    /// Altitude in meters, 0 when `<ele>` is absent.
    pub ele: f64,
    pub name: Option<String>,
}

/// Serialize the mission as a GPX 1.1 document with one `<wpt>` per waypoint.
pub fn to_gpx(waypoints: &[Waypoint]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", "mission-editor"));
    gpx.push_attribute(("xmlns", GPX_NAMESPACE));
    write(&mut writer, Event::Start(gpx))?;

    for wp in waypoints {
        let lat = wp.latitude.to_string();
        let lon = wp.longitude.to_string();
        let mut wpt = BytesStart::new("wpt");
        wpt.push_attribute(("lat", lat.as_str()));
        wpt.push_attribute(("lon", lon.as_str()));
        write(&mut writer, Event::Start(wpt))?;
        write_text_element(&mut writer, "ele", &wp.altitude.to_string())?;
        write_text_element(&mut writer, "name", &wp.name)?;
        write(&mut writer, Event::End(BytesEnd::new("wpt")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("gpx")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| MissionError::GpxWrite(e.to_string()))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| MissionError::GpxWrite(e.to_string()))
}

/// Read every `<wpt>` in document order. Routes and tracks are ignored.
///
/// All or nothing: a missing lat/lon, a lat/lon/ele that is not a finite
/// number, or a document that ends inside an open element fails the whole
/// parse.
pub fn parse_waypoints(xml: &str) -> Result<Vec<GpxWaypoint>> {
    let mut reader = Reader::from_str(xml);
    let mut waypoints = Vec::new();
    let mut open: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"wpt" => waypoints.push(parse_point(&e, &mut reader)?),
                b"rte" | b"trk" | b"metadata" | b"extensions" => {
                    reader.read_to_end(e.name())?;
                }
                _ => open.push(e.name().0.to_vec()),
            },
            Event::Empty(e) if e.local_name().as_ref() == b"wpt" => {
                let (lat, lon) = parse_lat_lon(&e)?;
                waypoints.push(GpxWaypoint {
                    lat,
                    lon,
                    ele: 0.0,
                    name: None,
                });
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => match open.pop() {
                Some(name) => return Err(truncated(&name)),
                None => break,
            },
            _ => {}
        }
    }

    Ok(waypoints)
}

fn parse_lat_lon(e: &BytesStart<'_>) -> Result<(f64, f64)> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| MissionError::Gpx(e.into()))?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_coordinate(CoordinateField::Latitude, val)?),
            b"lon" => lon = Some(parse_coordinate(CoordinateField::Longitude, val)?),
            _ => {}
        }
    }

    let missing = |field| MissionError::InvalidCoordinate {
        field,
        value: String::new(),
    };
    Ok((
        lat.ok_or_else(|| missing(CoordinateField::Latitude))?,
        lon.ok_or_else(|| missing(CoordinateField::Longitude))?,
    ))
}

/// Called after `Event::Start` for a `<wpt>`; consumes through `</wpt>`.
fn parse_point<'a>(start: &BytesStart<'a>, reader: &mut Reader<&'a [u8]>) -> Result<GpxWaypoint> {
    let (lat, lon) = parse_lat_lon(start)?;
    let mut point = GpxWaypoint {
        lat,
        lon,
        ele: 0.0,
        name: None,
    };
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ele" => {
                    let text = element_text(reader, &e)?;
                    point.ele = parse_coordinate(CoordinateField::Altitude, &text)?;
                }
                b"name" => point.name = Some(element_text(reader, &e)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.name().0 == end_name.as_slice() => return Ok(point),
            Event::Eof => return Err(truncated(&end_name)),
            _ => {}
        }
    }
}

/// Collect the text of a leaf element up to its end tag. CDATA is taken
/// verbatim; character and predefined entity references are resolved.
fn element_text<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        let chunk = match reader.read_event()? {
            Event::Text(e) => String::from_utf8_lossy(e.as_ref()).into_owned(),
            Event::CData(e) => String::from_utf8_lossy(e.as_ref()).into_owned(),
            Event::GeneralRef(e) => match e.resolve_char_ref() {
                Ok(Some(ch)) => ch.to_string(),
                _ => {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    resolve_predefined_entity(&entity).unwrap_or_default().to_string()
                }
            },
            Event::End(e) if e.name().0 == end_name.as_slice() => return Ok(text),
            Event::Eof => return Err(truncated(&end_name)),
            _ => continue,
        };
        text.push_str(&chunk);
    }
}

fn truncated(name: &[u8]) -> MissionError {
    MissionError::GpxTruncated(String::from_utf8_lossy(name).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WaypointStore;

    #[test]
    fn test_export_contains_every_waypoint() {
        let mut store = WaypointStore::new();
        store.add_waypoint("25.2", "55.3", "10").unwrap();
        store.add_waypoint("25.3", "55.4", "20.5").unwrap();

        let gpx = to_gpx(store.list()).unwrap();
        assert!(gpx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(gpx.contains(r#"<wpt lat="25.2" lon="55.3">"#));
        assert!(gpx.contains("<ele>20.5</ele>"));
        assert!(gpx.contains("<name>Waypoint 2</name>"));
    }

    #[test]
    fn test_export_empty_mission() {
        let gpx = to_gpx(&[]).unwrap();
        assert!(parse_waypoints(&gpx).unwrap().is_empty());
    }

    #[test]
    fn test_parse_reads_waypoints_only() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><name>Survey</name></metadata>
  <wpt lat="35.6762" lon="139.6503">
    <ele>40.5</ele>
    <name>Tokyo Tower</name>
    <extensions><foo>bar</foo></extensions>
  </wpt>
  <wpt lat="35.0" lon="139.0"/>
  <rte><rtept lat="1.0" lon="1.0"/></rte>
</gpx>"#;
        let wps = parse_waypoints(xml).unwrap();
        assert_eq!(wps.len(), 2);
        assert!((wps[0].ele - 40.5).abs() < 1e-10);
        assert_eq!(wps[0].name.as_deref(), Some("Tokyo Tower"));
        assert_eq!(wps[1].ele, 0.0);
        assert_eq!(wps[1].name, None);
    }

    fn rejected_field(xml: &str) -> CoordinateField {
        match parse_waypoints(xml) {
            Err(MissionError::InvalidCoordinate { field, .. }) => field,
            other => panic!("Expected InvalidCoordinate, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_lat_lon_rejected() {
        let no_lat = r#"<gpx><wpt lon="139.0"><name>No lat</name></wpt></gpx>"#;
        let no_lon = r#"<gpx><wpt lat="35.0"/></gpx>"#;
        assert_eq!(rejected_field(no_lat), CoordinateField::Latitude);
        assert_eq!(rejected_field(no_lon), CoordinateField::Longitude);
    }

    #[test]
    fn test_unparsable_lat_lon_rejected() {
        let bad_lat = r#"<gpx><wpt lat="x" lon="139.0"/></gpx>"#;
        let bad_lon = r#"<gpx><wpt lat="35" lon="inf"></wpt></gpx>"#;
        assert_eq!(rejected_field(bad_lat), CoordinateField::Latitude);
        assert_eq!(rejected_field(bad_lon), CoordinateField::Longitude);
    }

    #[test]
    fn test_non_finite_or_text_ele_rejected() {
        for ele in ["NaN", "inf", "-infinity", "ten", ""] {
            let xml = format!(r#"<gpx><wpt lat="1" lon="2"><ele>{ele}</ele></wpt></gpx>"#);
            assert_eq!(rejected_field(&xml), CoordinateField::Altitude, "ele {ele:?}");
        }
    }

    #[test]
    fn test_truncated_document_is_error() {
        for xml in [
            r#"<gpx><wpt lat="1" lon="2"><ele>5</ele>"#,
            r#"<gpx><wpt lat="1" lon="2"><name>Cut"#,
            r#"<gpx><wpt lat="1" lon="2"/>"#,
        ] {
            assert!(
                matches!(parse_waypoints(xml), Err(MissionError::GpxTruncated(_))),
                "{xml}"
            );
        }
    }

    #[test]
    fn test_entities_in_name() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name>Ridge &amp; gully &#35;2</name></wpt></gpx>"#;
        let wps = parse_waypoints(xml).unwrap();
        assert_eq!(wps[0].name.as_deref(), Some("Ridge & gully #2"));
    }

    #[test]
    fn test_namespaced_elements() {
        let xml = r#"<g:gpx xmlns:g="http://www.topografix.com/GPX/1/1">
  <g:wpt lat="1.5" lon="2.5"><g:ele>3</g:ele></g:wpt>
</g:gpx>"#;
        let wps = parse_waypoints(xml).unwrap();
        assert_eq!(wps.len(), 1);
        assert!((wps[0].ele - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let xml = "<gpx><wpt lat=\"1\" lon=\"2\"></trk></gpx>";
        assert!(matches!(parse_waypoints(xml), Err(MissionError::Gpx(_))));
    }
}
