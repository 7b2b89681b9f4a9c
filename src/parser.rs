use crate::config::READ_BUFFER_SIZE;
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

/// A direct child of a yielded element (`tag`, `nd`, ...), attributes only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlChild {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl XmlChild {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        find_attribute(&self.attributes, key)
    }
}

/// One element of interest with its attributes and direct children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

impl XmlElement {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        find_attribute(&self.attributes, key)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlChild> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn find_attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Element being assembled, with the depth at which it was opened.
struct Pending {
    element: XmlElement,
    depth: usize,
}

/// Streams elements of interest out of an OSM XML document.
///
/// Each element is yielded once its end tag is read and is not kept afterwards,
/// so memory stays proportional to one element rather than the document.
pub struct OsmReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    wanted: Vec<String>,
    depth: usize,
    pending: Option<Pending>,
    peak_retained: usize,
    finished: bool,
}

impl OsmReader<Box<dyn BufRead>> {
    /// Opens a document from disk, decompressing `.bz2` files on the fly.
    pub fn open(path: &str, wanted: &[&str]) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open OSM file: {}", path))?;
        let source: Box<dyn BufRead> = if is_bz2(path) {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                BzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };
        Ok(Self::from_reader(source, wanted))
    }
}

impl<R: BufRead> OsmReader<R> {
    pub fn from_reader(source: R, wanted: &[&str]) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            wanted: wanted.iter().map(|w| w.to_string()).collect(),
            depth: 0,
            pending: None,
            peak_retained: 0,
            finished: false,
        }
    }

    /// XML nodes held for the element currently being assembled.
    pub fn retained_nodes(&self) -> usize {
        self.pending
            .as_ref()
            .map_or(0, |p| 1 + p.element.children.len())
    }

    /// Largest value `retained_nodes` has reached so far.
    pub fn peak_retained_nodes(&self) -> usize {
        self.peak_retained
    }

    fn read_element(&mut self) -> Result<Option<XmlElement>> {
        loop {
            self.peak_retained = self.peak_retained.max(self.retained_nodes());
            self.buf.clear();
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .with_context(|| format!("Malformed XML near byte {}", position))?;

            match event {
                Event::Start(e) => {
                    self.depth += 1;
                    if let Some(pending) = self.pending.as_mut() {
                        if self.depth == pending.depth + 1 {
                            pending.element.children.push(read_child(&e)?);
                        }
                    } else if is_wanted(&self.wanted, e.name().as_ref()) {
                        self.pending = Some(Pending {
                            element: read_element_start(&e)?,
                            depth: self.depth,
                        });
                    }
                }
                Event::Empty(e) => {
                    if let Some(pending) = self.pending.as_mut() {
                        if self.depth == pending.depth {
                            pending.element.children.push(read_child(&e)?);
                        }
                    } else if is_wanted(&self.wanted, e.name().as_ref()) {
                        self.peak_retained = self.peak_retained.max(1);
                        return read_element_start(&e).map(Some);
                    }
                }
                Event::End(_) => {
                    let closing = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    if self.pending.as_ref().is_some_and(|p| p.depth == closing) {
                        return Ok(self.pending.take().map(|p| p.element));
                    }
                }
                Event::Eof => {
                    if self.depth > 0 {
                        bail!(
                            "Unexpected end of document with {} unclosed element(s)",
                            self.depth
                        );
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmReader<R> {
    type Item = Result<XmlElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                self.pending = None;
                Some(Err(e))
            }
        }
    }
}

fn is_wanted(wanted: &[String], name: &[u8]) -> bool {
    wanted.iter().any(|w| w.as_bytes() == name)
}

fn is_bz2(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"))
}

fn element_name(e: &BytesStart) -> Result<String> {
    let qname = e.name();
    let name = str::from_utf8(qname.as_ref()).context("Element name is not valid UTF-8")?;
    Ok(name.to_string())
}

fn read_attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute in e.attributes() {
        let attribute = attribute.context("Malformed attribute")?;
        let key = str::from_utf8(attribute.key.as_ref())
            .context("Attribute name is not valid UTF-8")?
            .to_string();
        let value = attribute
            .unescape_value()
            .with_context(|| format!("Malformed value for attribute '{}'", key))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn read_element_start(e: &BytesStart) -> Result<XmlElement> {
    Ok(XmlElement {
        name: element_name(e)?,
        attributes: read_attributes(e)?,
        children: Vec::new(),
    })
}

fn read_child(e: &BytesStart) -> Result<XmlChild> {
    Ok(XmlChild {
        name: element_name(e)?,
        attributes: read_attributes(e)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="41.9" minlon="-87.7" maxlat="42.0" maxlon="-87.6"/>
  <node id="1" lat="41.9" lon="-87.6"/>
  <node id="2" lat="41.8" lon="-87.5">
    <tag k="name" v="Corner &amp; Co"/>
  </node>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
  </way>
  <relation id="100">
    <member type="way" ref="10" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>"#;

    fn read_all(xml: &str) -> Vec<XmlElement> {
        OsmReader::from_reader(xml.as_bytes(), &["node", "way"])
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn yields_wanted_elements_in_document_order() {
        let elements = read_all(SAMPLE);
        let names: Vec<_> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["node", "node", "way"]);
        assert_eq!(elements[0].attribute("id"), Some("1"));
        assert_eq!(elements[2].attribute("id"), Some("10"));
    }

    #[test]
    fn self_closing_element_has_no_children() {
        let elements = read_all(SAMPLE);
        assert!(elements[0].children.is_empty());
        assert_eq!(elements[0].attribute("lat"), Some("41.9"));
    }

    #[test]
    fn captures_direct_children_in_order() {
        let elements = read_all(SAMPLE);
        let way = &elements[2];
        let names: Vec<_> = way.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["nd", "nd", "tag"]);
        let refs: Vec<_> = way
            .children_named("nd")
            .filter_map(|c| c.attribute("ref"))
            .collect();
        assert_eq!(refs, vec!["1", "2"]);
    }

    #[test]
    fn unescapes_attribute_values() {
        let elements = read_all(SAMPLE);
        let tag = &elements[1].children[0];
        assert_eq!(tag.attribute("v"), Some("Corner & Co"));
    }

    #[test]
    fn relations_are_not_yielded() {
        let elements = read_all(SAMPLE);
        assert!(elements.iter().all(|e| e.name != "relation"));
        assert!(elements
            .iter()
            .flat_map(|e| e.children.iter())
            .all(|c| c.name != "member"));
    }

    #[test]
    fn wanted_set_is_respected() {
        let elements: Vec<_> = OsmReader::from_reader(SAMPLE.as_bytes(), &["relation"])
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].children.len(), 2);
    }

    #[test]
    fn grandchildren_are_not_captured() {
        let xml = r#"<osm><way id="1"><nd ref="5"><extra a="b"/></nd></way></osm>"#;
        let elements = read_all(xml);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].children.len(), 1);
        assert_eq!(elements[0].children[0].name, "nd");
    }

    #[test]
    fn mismatched_end_tag_is_fatal() {
        let xml = r#"<osm><node id="1"></way></osm>"#;
        let mut reader = OsmReader::from_reader(xml.as_bytes(), &["node", "way"]);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncated_document_is_fatal() {
        let xml = r#"<osm><node id="1" lat="1" lon="2"/><way id="2"><nd ref="1"/>"#;
        let mut reader = OsmReader::from_reader(xml.as_bytes(), &["node", "way"]);
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn mismatched_end_tag_reports_byte_offset() {
        let xml = r#"<osm><node id="1"></way></osm>"#;
        let mut reader = OsmReader::from_reader(xml.as_bytes(), &["node"]);
        let err = reader.next().unwrap().unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Malformed XML near byte 18"), "{}", message);
    }

    #[test]
    fn retention_does_not_grow_with_document_size() {
        for count in [10usize, 1_000, 20_000] {
            let mut xml = String::from("<osm>");
            for i in 0..count {
                xml.push_str(&format!(
                    r#"<node id="{i}" lat="1.0" lon="2.0"><tag k="a" v="b"/><tag k="c" v="d"/></node>"#
                ));
            }
            xml.push_str("</osm>");

            let mut reader = OsmReader::from_reader(xml.as_bytes(), &["node"]);
            let mut seen = 0;
            while let Some(element) = reader.next() {
                assert_eq!(element.unwrap().children.len(), 2);
                assert_eq!(reader.retained_nodes(), 0);
                seen += 1;
            }
            assert_eq!(seen, count);
            // the node plus its two tags, however long the document
            assert_eq!(reader.peak_retained_nodes(), 3);
        }
    }

    #[test]
    fn peak_retention_follows_the_largest_element() {
        let xml = r#"<osm>
  <way id="1"><nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="4"/></way>
  <node id="2" lat="1" lon="2"/>
  <way id="3"><nd ref="1"/></way>
</osm>"#;
        let mut reader = OsmReader::from_reader(xml.as_bytes(), &["node", "way"]);
        assert_eq!(reader.peak_retained_nodes(), 0);
        reader.next().unwrap().unwrap();
        assert_eq!(reader.peak_retained_nodes(), 5);
        assert_eq!(reader.by_ref().count(), 2);
        assert_eq!(reader.peak_retained_nodes(), 5);
    }

    #[test]
    fn detects_bz2_extension() {
        assert!(is_bz2("map.osm.bz2"));
        assert!(is_bz2("MAP.OSM.BZ2"));
        assert!(!is_bz2("map.osm"));
    }
}
