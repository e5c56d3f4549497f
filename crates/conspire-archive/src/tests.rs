//! Codec tests over in-memory archives.

use std::io::{Cursor, Write as _};

use conspire_core::{
  asset::{Asset, AssetId},
  conspiracy::Conspiracy,
  graph::{GraphData, Node},
};
use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::{
  ArchiveWriter, CONSPIRACY_ENTRY, Error, GRAPH_ENTRY, read_archive, read_archive_with_limit,
};

fn png(bytes: &[u8]) -> Asset {
  Asset::from_upload(Some("evidence.png".into()), "image/png", bytes.to_vec())
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
  let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
  let mut names: Vec<String> = zip.file_names().map(str::to_owned).collect();
  names.sort();
  names
}

/// Build a raw archive from `(name, contents)` pairs.
fn raw_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
  for (name, contents) in entries {
    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
    zip.write_all(contents).unwrap();
  }
  zip.finish().unwrap().into_inner()
}

#[test]
fn no_assets_means_exactly_two_entries() {
  let c = Conspiracy::new("empty");
  let bytes = ArchiveWriter::new(&c, &GraphData::default()).unwrap().finish().unwrap();
  assert_eq!(entry_names(&bytes), vec![CONSPIRACY_ENTRY, GRAPH_ENTRY]);
}

#[test]
fn asset_entries_are_named_by_id() {
  let c = Conspiracy::new("one asset");
  let asset = png(b"\x89PNG fake");
  let mut w = ArchiveWriter::new(&c, &GraphData::default()).unwrap();
  w.add_asset(&asset).unwrap();
  assert_eq!(w.asset_count(), 1);
  let bytes = w.finish().unwrap();

  let names = entry_names(&bytes);
  assert_eq!(names.len(), 4);
  assert!(names.contains(&asset.id.to_string()));
  assert!(names.contains(&format!("{}.json", asset.id)));
}

#[test]
fn write_then_read_preserves_everything() {
  let c = Conspiracy::new("roundtrip");
  let a = png(b"first");
  let b = Asset::from_upload(None, "image/jpeg", b"second".to_vec());

  let mut graph = GraphData::default();
  graph.upsert_node(Node::image(a.id.clone(), a.name.clone(), "image/png"));
  graph.upsert_node(Node::image(b.id.clone(), None, "image/jpeg"));
  graph.upsert_node(Node::entity("Carol", "person"));
  let (first, last) = (graph.nodes[0].id, graph.nodes[2].id);
  graph.add_edge(first, last).unwrap();

  let mut w = ArchiveWriter::new(&c, &graph).unwrap();
  w.add_asset(&a).unwrap();
  w.add_asset(&b).unwrap();
  let archive = read_archive(&w.finish().unwrap()).unwrap();

  assert_eq!(archive.conspiracy, c);
  assert_eq!(archive.graph, graph);
  assert_eq!(archive.assets.len(), 2);
  assert!(archive.assets.contains(&a));
  assert!(archive.assets.contains(&b));
  assert!(archive.skipped.is_empty());
}

#[test]
fn missing_graph_is_malformed() {
  let c = serde_json::to_vec(&Conspiracy::new("x")).unwrap();
  let bytes = raw_archive(&[(CONSPIRACY_ENTRY, c.as_slice())]);
  let err = read_archive(&bytes).unwrap_err();
  assert!(matches!(err, Error::MissingEntry(GRAPH_ENTRY)));
}

#[test]
fn missing_conspiracy_is_malformed() {
  let bytes = raw_archive(&[(GRAPH_ENTRY, b"{}".as_slice())]);
  let err = read_archive(&bytes).unwrap_err();
  assert!(matches!(err, Error::MissingEntry(CONSPIRACY_ENTRY)));
}

#[test]
fn unparseable_graph_names_the_entry() {
  let c = serde_json::to_vec(&Conspiracy::new("x")).unwrap();
  let bytes = raw_archive(&[(CONSPIRACY_ENTRY, c.as_slice()), (GRAPH_ENTRY, b"not json".as_slice())]);
  match read_archive(&bytes).unwrap_err() {
    Error::InvalidDocument { entry, .. } => assert_eq!(entry, GRAPH_ENTRY),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn metadata_without_payload_is_skipped() {
  let c = serde_json::to_vec(&Conspiracy::new("x")).unwrap();
  let orphan = png(b"never shipped");
  let meta = serde_json::to_vec(&orphan.meta()).unwrap();
  let meta_name = format!("{}.json", orphan.id);
  let bytes = raw_archive(&[
    (CONSPIRACY_ENTRY, c.as_slice()),
    (GRAPH_ENTRY, b"{}".as_slice()),
    (meta_name.as_str(), meta.as_slice()),
  ]);

  let archive = read_archive(&bytes).unwrap();
  assert!(archive.assets.is_empty());
  assert_eq!(archive.skipped, vec![meta_name]);
}

#[test]
fn tampered_payload_is_rejected() {
  let c = serde_json::to_vec(&Conspiracy::new("x")).unwrap();
  let asset = png(b"original");
  let meta = serde_json::to_vec(&asset.meta()).unwrap();
  let meta_name = format!("{}.json", asset.id);
  let bytes = raw_archive(&[
    (CONSPIRACY_ENTRY, c.as_slice()),
    (GRAPH_ENTRY, b"{}".as_slice()),
    (meta_name.as_str(), meta.as_slice()),
    (asset.id.as_str(), b"tampered".as_slice()),
  ]);

  let err = read_archive(&bytes).unwrap_err();
  assert!(matches!(err, Error::DigestMismatch(id) if id == asset.id));
}

#[test]
fn not_a_zip_is_an_error() {
  assert!(matches!(read_archive(b"definitely not a zip"), Err(Error::Zip(_))));
}

#[test]
fn metadata_name_field_defaults_when_absent() {
  let c = serde_json::to_vec(&Conspiracy::new("x")).unwrap();
  let data = b"nameless";
  let id = AssetId::digest(data);
  let meta = format!(r#"{{"id":"{id}","type":"image/gif"}}"#);
  let meta_name = format!("{id}.json");
  let bytes = raw_archive(&[
    (CONSPIRACY_ENTRY, c.as_slice()),
    (GRAPH_ENTRY, b"{}".as_slice()),
    (meta_name.as_str(), meta.as_bytes()),
    (id.as_str(), data.as_slice()),
  ]);

  let archive = read_archive(&bytes).unwrap();
  assert_eq!(archive.assets.len(), 1);
  assert_eq!(archive.assets[0].name, None);
  assert_eq!(archive.assets[0].mime_type, "image/gif");
}

#[test]
fn highly_compressed_entry_is_capped() {
  let c = serde_json::to_vec(&Conspiracy::new("bomb")).unwrap();
  let zeros = vec![0u8; 1024 * 1024];

  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
  zip.start_file(CONSPIRACY_ENTRY, SimpleFileOptions::default()).unwrap();
  zip.write_all(&c).unwrap();
  let deflated =
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
  zip.start_file(GRAPH_ENTRY, deflated).unwrap();
  zip.write_all(&zeros).unwrap();
  let bytes = zip.finish().unwrap().into_inner();
  assert!(bytes.len() < 64 * 1024);

  let err = read_archive_with_limit(&bytes, 64 * 1024).unwrap_err();
  assert!(
    matches!(err, Error::EntryTooLarge { ref entry, limit } if entry == GRAPH_ENTRY && limit == 64 * 1024),
    "{err}"
  );
}

#[test]
fn payload_at_limit_is_accepted_and_one_over_rejected() {
  let c = Conspiracy::new("sized");
  let asset = png(&[7u8; 4096]);
  let mut w = ArchiveWriter::new(&c, &GraphData::default()).unwrap();
  w.add_asset(&asset).unwrap();
  let bytes = w.finish().unwrap();

  let archive = read_archive_with_limit(&bytes, 4096).unwrap();
  assert_eq!(archive.assets, vec![asset.clone()]);

  let err = read_archive_with_limit(&bytes, 4095).unwrap_err();
  assert!(matches!(err, Error::EntryTooLarge { .. }), "{err}");
}
