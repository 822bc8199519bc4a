//! Readers for the XML corpus (`<RECORD>` files) and query (`<QUERY>`) files.
//!
//! Both readers are event driven: text is accumulated while inside a field of
//! interest and committed on its end tag. Elements outside the known fields are
//! ignored, so extra metadata in the files is harmless.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::index::DocId;

/// Which field supplied a record's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Abstract,
    Extract,
    Title,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub record_num: DocId,
    pub source: TextSource,
    pub text: String,
}

/// Per-file totals, one counter per text source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCounts {
    pub abstracts: usize,
    pub extracts: usize,
    pub titles: usize,
    pub empty: usize,
}

impl SourceCounts {
    pub fn tally(records: &[Record]) -> Self {
        let mut counts = Self::default();
        for r in records {
            match r.source {
                TextSource::Abstract => counts.abstracts += 1,
                TextSource::Extract => counts.extracts += 1,
                TextSource::Title => counts.titles += 1,
                TextSource::Empty => counts.empty += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    RecordNum,
    Abstract,
    Extract,
    Title,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"RECORDNUM" => Some(Field::RecordNum),
            b"ABSTRACT" => Some(Field::Abstract),
            b"EXTRACT" => Some(Field::Extract),
            b"TITLE" => Some(Field::Title),
            _ => None,
        }
    }
}

#[derive(Default)]
struct RecordFields {
    record_num: Option<String>,
    abstract_text: Option<String>,
    extract: Option<String>,
    title: Option<String>,
}

impl RecordFields {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::RecordNum => &mut self.record_num,
            Field::Abstract => &mut self.abstract_text,
            Field::Extract => &mut self.extract,
            Field::Title => &mut self.title,
        }
    }

    /// Abstract, then extract, then title, then nothing. Blank fields count as absent.
    fn into_record(self, path: &Path) -> Result<Record> {
        let raw = self
            .record_num
            .ok_or_else(|| Error::corpus(path, "RECORD without RECORDNUM"))?;
        let record_num = parse_id(path, "RECORDNUM", &raw)?;
        if record_num == 0 {
            return Err(Error::corpus(path, "RECORDNUM must be positive"));
        }
        let non_blank = |s: Option<String>| s.filter(|t| !t.trim().is_empty());
        let (source, text) = if let Some(t) = non_blank(self.abstract_text) {
            (TextSource::Abstract, t)
        } else if let Some(t) = non_blank(self.extract) {
            (TextSource::Extract, t)
        } else if let Some(t) = non_blank(self.title) {
            (TextSource::Title, t)
        } else {
            (TextSource::Empty, String::new())
        };
        Ok(Record { record_num, source, text })
    }
}

/// Read every `<RECORD>` of a corpus file, in file order.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_records(path, &content)
}

fn parse_records(path: &Path, xml: &str) -> Result<Vec<Record>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut current: Option<RecordFields> = None;
    let mut field: Option<Field> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                if local_name.as_ref() == b"RECORD" {
                    current = Some(RecordFields::default());
                } else if let Some(f) = Field::from_tag(local_name.as_ref()) {
                    field = Some(f);
                    text_buf.clear();
                }
            }
            Ok(Event::Text(ref e)) => {
                if field.is_some() {
                    let unescaped = e.unescape().map_err(|err| Error::xml(path, err))?;
                    text_buf.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text_buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                if local_name.as_ref() == b"RECORD" {
                    if let Some(fields) = current.take() {
                        records.push(fields.into_record(path)?);
                    }
                    field = None;
                } else if Field::from_tag(local_name.as_ref()).is_some() {
                    if let (Some(fields), Some(f)) = (current.as_mut(), field.take()) {
                        // first occurrence wins
                        fields.slot(f).get_or_insert(std::mem::take(&mut text_buf));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(Error::xml(
                    path,
                    format!("at byte {}: {err}", reader.buffer_position()),
                ))
            }
            _ => {}
        }
    }
    Ok(records)
}

/// One query as read from the query file, text still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    pub number: u32,
    pub text: String,
    /// Declared count of relevant documents (`<Results>`), when present.
    pub declared_results: Option<usize>,
    pub judgments: Vec<Judgment>,
}

/// A relevant document for a query and its assessor votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgment {
    pub doc_id: DocId,
    /// Sum of the digits of the `score` attribute, one digit per assessor.
    pub votes: u32,
}

#[derive(Default)]
struct QueryFields {
    number: Option<String>,
    text: Option<String>,
    results: Option<String>,
    judgments: Vec<Judgment>,
}

/// Read every `<QUERY>` of a query file, in file order.
pub fn read_queries(path: &Path) -> Result<Vec<RawQuery>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_queries(path, &content)
}

fn parse_queries(path: &Path, xml: &str) -> Result<Vec<RawQuery>> {
    let mut reader = Reader::from_str(xml);
    let mut queries = Vec::new();
    let mut current: Option<QueryFields> = None;
    let mut in_field = false;
    let mut item_votes: Option<u32> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"QUERY" => current = Some(QueryFields::default()),
                    b"QueryNumber" | b"QueryText" | b"Results" => {
                        in_field = true;
                        text_buf.clear();
                    }
                    b"Item" => {
                        let mut votes = 0;
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().as_ref() == b"score" {
                                votes = digit_sum(&attr.value);
                            }
                        }
                        item_votes = Some(votes);
                        in_field = true;
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_field {
                    let unescaped = e.unescape().map_err(|err| Error::xml(path, err))?;
                    text_buf.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if in_field {
                    text_buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                if local_name.as_ref() == b"QUERY" {
                    if let Some(done) = current.take() {
                        queries.push(finish_query(path, done)?);
                    }
                } else if let Some(fields) = current.as_mut() {
                    match local_name.as_ref() {
                        b"QueryNumber" => fields.number = Some(std::mem::take(&mut text_buf)),
                        b"QueryText" => fields.text = Some(std::mem::take(&mut text_buf)),
                        b"Results" => fields.results = Some(std::mem::take(&mut text_buf)),
                        b"Item" => {
                            let doc_id = parse_id(path, "Item", &text_buf)?;
                            let votes = item_votes.take().unwrap_or(0);
                            fields.judgments.push(Judgment { doc_id, votes });
                        }
                        _ => {}
                    }
                }
                in_field = false;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(Error::xml(
                    path,
                    format!("at byte {}: {err}", reader.buffer_position()),
                ))
            }
            _ => {}
        }
    }
    Ok(queries)
}

fn finish_query(path: &Path, fields: QueryFields) -> Result<RawQuery> {
    let raw = fields
        .number
        .ok_or_else(|| Error::corpus(path, "QUERY without QueryNumber"))?;
    let number = parse_id(path, "QueryNumber", &raw)?;
    let declared_results = match fields.results {
        Some(r) => Some(parse_id(path, "Results", &r)? as usize),
        None => None,
    };
    Ok(RawQuery {
        number,
        text: fields.text.unwrap_or_default(),
        declared_results,
        judgments: fields.judgments,
    })
}

fn parse_id(path: &Path, field: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| Error::corpus(path, format!("{field} is not a number: {:?}", raw.trim())))
}

fn digit_sum(score: &[u8]) -> u32 {
    score
        .iter()
        .filter(|b| b.is_ascii_digit())
        .map(|b| u32::from(b - b'0'))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <RECORD>
    <PAPERNUM>PN74001</PAPERNUM>
    <RECORDNUM>00001 </RECORDNUM>
    <TITLE>Title one</TITLE>
    <ABSTRACT>Cystic fibrosis &amp; the lung.</ABSTRACT>
    <EXTRACT>ignored extract</EXTRACT>
  </RECORD>
  <RECORD>
    <RECORDNUM>2</RECORDNUM>
    <TITLE>Second title</TITLE>
    <EXTRACT>Sweat chloride</EXTRACT>
  </RECORD>
  <RECORD>
    <RECORDNUM>3</RECORDNUM>
    <TITLE>Only a title</TITLE>
    <ABSTRACT>   </ABSTRACT>
  </RECORD>
  <RECORD>
    <RECORDNUM>4</RECORDNUM>
    <AUTHORS><AUTHOR>Someone</AUTHOR></AUTHORS>
  </RECORD>
</root>"#;

    #[test]
    fn fallback_chain() {
        let recs = parse_records(Path::new("t.xml"), CORPUS).unwrap();
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].record_num, 1);
        assert_eq!(recs[0].source, TextSource::Abstract);
        assert_eq!(recs[0].text, "Cystic fibrosis & the lung.");
        assert_eq!(recs[1].source, TextSource::Extract);
        assert_eq!(recs[1].text, "Sweat chloride");
        assert_eq!(recs[2].source, TextSource::Title);
        assert_eq!(recs[2].text, "Only a title");
        assert_eq!(recs[3].source, TextSource::Empty);
        assert_eq!(recs[3].text, "");
        assert_eq!(
            SourceCounts::tally(&recs),
            SourceCounts { abstracts: 1, extracts: 1, titles: 1, empty: 1 }
        );
    }

    #[test]
    fn bad_record_number_is_fatal() {
        let xml = "<root><RECORD><RECORDNUM>abc</RECORDNUM></RECORD></root>";
        let err = parse_records(Path::new("t.xml"), xml).unwrap_err();
        assert!(err.to_string().contains("RECORDNUM"));

        let xml = "<root><RECORD><RECORDNUM>0</RECORDNUM></RECORD></root>";
        assert!(parse_records(Path::new("t.xml"), xml).is_err());

        let xml = "<root><RECORD><TITLE>x</TITLE></RECORD></root>";
        assert!(parse_records(Path::new("t.xml"), xml).is_err());
    }

    #[test]
    fn malformed_xml_is_fatal() {
        let xml = "<root><RECORD><RECORDNUM>1</RECORDNUM></TITLE></root>";
        assert!(matches!(
            parse_records(Path::new("t.xml"), xml),
            Err(Error::Xml { .. })
        ));
    }

    #[test]
    fn queries_with_judgments() {
        let xml = r#"<FILEQUERY>
  <QUERY>
    <QueryNumber>00002</QueryNumber>
    <QueryText>Can one distinguish between the effects of mucus
      hypersecretion and infection?</QueryText>
    <Results>2</Results>
    <Records>
      <Item score="0010">139</Item>
      <Item score="2212">151</Item>
    </Records>
  </QUERY>
  <QUERY>
    <QueryNumber>1</QueryNumber>
    <QueryText>What are the effects of calcium?</QueryText>
  </QUERY>
</FILEQUERY>"#;
        let qs = parse_queries(Path::new("q.xml"), xml).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].number, 2);
        assert!(qs[0].text.starts_with("Can one distinguish"));
        assert_eq!(qs[0].declared_results, Some(2));
        assert_eq!(
            qs[0].judgments,
            vec![Judgment { doc_id: 139, votes: 1 }, Judgment { doc_id: 151, votes: 7 }]
        );
        assert_eq!(qs[1].number, 1);
        assert!(qs[1].judgments.is_empty());
        assert_eq!(qs[1].declared_results, None);
    }
}
