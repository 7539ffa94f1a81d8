//! Serialize a [`Testsuites`] document as XML.

use super::{Output, Property, ResultRecord, Testcase, TestcaseStatus, Testsuite, Testsuites};
use crate::error::Result;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::{self, Write};

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static PROPERTIES_TAG: &str = "properties";
static PROPERTY_TAG: &str = "property";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SKIPPED_TAG: &str = "skipped";
static SYSTEM_OUT_TAG: &str = "system-out";
static SYSTEM_ERR_TAG: &str = "system-err";

pub(crate) fn serialize_testsuites(
    testsuites: &Testsuites,
    writer: impl io::Write,
    header: bool,
) -> Result<()> {
    let mut writer = Writer::new_with_indent(writer, b'\t', 1);

    if header {
        let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
        writer.write_event(Event::Decl(decl))?;
    }

    // Use the destructuring syntax to ensure that all fields are handled.
    let Testsuites {
        name,
        time,
        tests,
        errors,
        failures,
        skipped,
        disabled,
        suites,
    } = testsuites;

    let mut tag = BytesStart::new(TESTSUITES_TAG);
    if let Some(name) = name {
        push_attribute(&mut tag, "name", name);
    }
    if let Some(time) = time {
        push_attribute(&mut tag, "time", time);
    }
    push_count(&mut tag, "tests", *tests);
    push_count(&mut tag, "errors", *errors);
    push_count(&mut tag, "failures", *failures);
    push_count(&mut tag, "skipped", *skipped);
    push_count(&mut tag, "disabled", *disabled);

    if suites.is_empty() {
        writer.write_event(Event::Empty(tag))?;
    } else {
        writer.write_event(Event::Start(tag))?;
        for suite in suites {
            serialize_testsuite(suite, &mut writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(TESTSUITES_TAG)))?;
    }

    // Add a trailing newline.
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn serialize_testsuite(
    testsuite: &Testsuite,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let Testsuite {
        name,
        tests,
        failures,
        errors,
        id,
        disabled,
        hostname,
        skipped,
        time,
        timestamp,
        properties,
        testcases,
        system_out,
        system_err,
    } = testsuite;

    let mut tag = BytesStart::new(TESTSUITE_TAG);
    push_attribute(&mut tag, "name", name);
    push_attribute(&mut tag, "tests", &tests.to_string());
    push_attribute(&mut tag, "failures", &failures.to_string());
    push_attribute(&mut tag, "errors", &errors.to_string());
    push_attribute(&mut tag, "id", &id.to_string());
    push_count(&mut tag, "disabled", *disabled);
    if let Some(hostname) = hostname {
        push_attribute(&mut tag, "hostname", hostname);
    }
    push_count(&mut tag, "skipped", *skipped);
    push_attribute(&mut tag, "time", time);
    if let Some(timestamp) = timestamp {
        push_attribute(&mut tag, "timestamp", timestamp);
    }
    writer.write_event(Event::Start(tag))?;

    if !properties.is_empty() {
        writer.write_event(Event::Start(BytesStart::new(PROPERTIES_TAG)))?;
        for property in properties {
            serialize_property(property, writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(PROPERTIES_TAG)))?;
    }

    for testcase in testcases {
        serialize_testcase(testcase, writer)?;
    }

    if let Some(system_out) = system_out {
        serialize_output(system_out, SYSTEM_OUT_TAG, writer)?;
    }
    if let Some(system_err) = system_err {
        serialize_output(system_err, SYSTEM_ERR_TAG, writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new(TESTSUITE_TAG)))
}

fn serialize_property(
    property: &Property,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut tag = BytesStart::new(PROPERTY_TAG);
    push_attribute(&mut tag, "name", &property.name);
    push_attribute(&mut tag, "value", &property.value);
    writer.write_event(Event::Empty(tag))
}

fn serialize_testcase(
    testcase: &Testcase,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let Testcase {
        name,
        classname,
        time,
        status,
        system_out,
        system_err,
    } = testcase;

    let mut tag = BytesStart::new(TESTCASE_TAG);
    push_attribute(&mut tag, "name", name);
    push_attribute(&mut tag, "classname", classname);
    push_attribute(&mut tag, "time", time);

    let record = match status {
        TestcaseStatus::Success => None,
        TestcaseStatus::Failure(record) => Some((FAILURE_TAG, record)),
        TestcaseStatus::Error(record) => Some((ERROR_TAG, record)),
        TestcaseStatus::Skipped(record) => Some((SKIPPED_TAG, record)),
    };

    if record.is_none() && system_out.is_none() && system_err.is_none() {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    if let Some((tag_name, record)) = record {
        serialize_record(record, tag_name, writer)?;
    }
    if let Some(system_out) = system_out {
        serialize_output(system_out, SYSTEM_OUT_TAG, writer)?;
    }
    if let Some(system_err) = system_err {
        serialize_output(system_err, SYSTEM_ERR_TAG, writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new(TESTCASE_TAG)))
}

fn serialize_record(
    record: &ResultRecord,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut tag = BytesStart::new(tag_name);
    push_attribute(&mut tag, "message", &record.message);
    if let Some(ty) = &record.ty {
        push_attribute(&mut tag, "type", ty);
    }

    if record.data.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    write_cdata(&record.data, writer)?;
    writer.write_event(Event::End(BytesEnd::new(tag_name)))
}

fn serialize_output(
    output: &Output,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag_name)))?;
    write_cdata(&output.data, writer)?;
    writer.write_event(Event::End(BytesEnd::new(tag_name)))
}

/// Writes `text` as CDATA, splitting sections around any `]]>`.
fn write_cdata(text: &str, writer: &mut Writer<impl io::Write>) -> quick_xml::Result<()> {
    let text = sanitize(text);
    if text.is_empty() {
        return writer.write_event(Event::Text(BytesText::new("")));
    }
    for section in cdata_sections(&text) {
        writer.write_event(Event::CData(BytesCData::new(section)))?;
    }
    Ok(())
}

fn cdata_sections(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::new();
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

fn push_count(tag: &mut BytesStart<'_>, key: &str, count: usize) {
    if count > 0 {
        push_attribute(tag, key, &count.to_string());
    }
}

fn push_attribute(tag: &mut BytesStart<'_>, key: &str, value: &str) {
    tag.push_attribute(Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escape_attribute(value).into_bytes()),
    });
}

/// Escapes an attribute value, including whitespace that XML parsers would
/// otherwise normalize away.
fn escape_attribute(value: &str) -> String {
    let escaped = escape(value);
    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        match c {
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c if is_xml_char(c) => out.push(c),
            _ => out.push(char::REPLACEMENT_CHARACTER),
        }
    }
    out
}

/// Replaces characters that cannot appear in an XML document.
fn sanitize(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(
            text.chars()
                .map(|c| if is_xml_char(c) { c } else { char::REPLACEMENT_CHARACTER })
                .collect(),
        )
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
