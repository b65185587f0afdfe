// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event descriptor file writer.
//!
//! The map-generation program reads its input from
//! `<data_root>/<id>/current/event.xml`. The origin time attribute is
//! serialized from the parsed temporal value, never copied from the raw
//! payload string.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Writer;
use shq_core::{format_event_time, parse_event_time, EventRecord};

use crate::error::EngineError;

/// Name of the descriptor file inside the event's `current/` directory.
pub const DESCRIPTOR_FILE: &str = "event.xml";

/// Ensure `<data_root>/<id>/current/` exists and (re)write the descriptor.
///
/// String-valued passthrough fields become attributes alongside the typed
/// ones; non-string passthrough values are not representable in the
/// descriptor and are skipped. The record itself is left untouched.
pub fn write_event_descriptor(data_root: &Path, record: &EventRecord) -> Result<(), EngineError> {
    let raw_time = record.time.as_deref().unwrap_or_default();
    let origin = parse_event_time(raw_time)?;

    let dir = data_root.join(record.id.as_str()).join("current");
    fs::create_dir_all(&dir)?;

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut quake = BytesStart::new("earthquake");
    quake.push_attribute(("id", record.id.as_str()));
    quake.push_attribute(("time", format_event_time(origin).as_str()));
    if let Some(lat) = record.lat {
        quake.push_attribute(("lat", lat.to_string().as_str()));
    }
    if let Some(lon) = record.lon {
        quake.push_attribute(("lon", lon.to_string().as_str()));
    }
    if let Some(mag) = record.mag {
        quake.push_attribute(("mag", mag.to_string().as_str()));
    }
    if let Some(depth) = record.depth {
        quake.push_attribute(("depth", depth.to_string().as_str()));
    }
    for (key, value) in &record.extra {
        if let Some(s) = value.as_str() {
            quake.push_attribute((key.as_str(), s));
        }
    }
    writer.write_event(Event::Empty(quake))?;

    let mut xml = writer.into_inner();
    xml.push(b'\n');
    fs::write(dir.join(DESCRIPTOR_FILE), xml)?;
    Ok(())
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
