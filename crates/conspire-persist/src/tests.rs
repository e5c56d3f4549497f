//! Facade tests against an in-memory SQLite store.

use std::{
  io::{Cursor, Write as _},
  sync::Arc,
};

use conspire_core::{
  asset::{Asset, AssetId},
  conspiracy::Conspiracy,
  graph::{Crop, GraphData, Node},
  session::Session,
  store::BoardStore as _,
};
use conspire_store_sqlite::SqliteStore;
use uuid::Uuid;
use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::{Error, Persistence, Resolution, archive::archive_file_name};

async fn persistence() -> Persistence<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  Persistence::new(Arc::new(store))
}

async fn board(p: &Persistence<SqliteStore>, name: &str) -> Session {
  Session::from(&p.create_conspiracy(name).await.unwrap())
}

fn entry_count(bytes: &[u8]) -> usize {
  ZipArchive::new(Cursor::new(bytes)).unwrap().len()
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_without_request_creates_and_redirects() {
  let p = persistence().await;

  let first = p.resolve_session(None).await.unwrap();
  assert!(first.is_redirect());

  let second = p.resolve_session(None).await.unwrap();
  assert_eq!(second.conspiracy().id, first.conspiracy().id);
  assert_eq!(p.list_conspiracies().await.unwrap().len(), 1);
}

#[tokio::test]
async fn resolve_existing_board_opens_it() {
  let p = persistence().await;
  let s = board(&p, "known").await;

  let r = p.resolve_session(Some(s.conspiracy_id)).await.unwrap();
  assert!(matches!(r, Resolution::Existing(ref c) if c.id == s.conspiracy_id));
  assert_eq!(r.session(), s);
}

#[tokio::test]
async fn resolve_unknown_board_redirects_to_most_recent() {
  let p = persistence().await;
  let s = board(&p, "only").await;

  let r = p.resolve_session(Some(Uuid::new_v4())).await.unwrap();
  assert!(r.is_redirect());
  assert_eq!(r.session(), s);
}

// ─── Graph saves ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn saving_graph_stamps_last_modified() {
  let p = persistence().await;
  let s = board(&p, "stamped").await;
  let before = p.get_conspiracy(s.conspiracy_id).await.unwrap().last_modified;

  let mut g = GraphData::default();
  g.upsert_node(Node::entity("Dave", "person"));
  let stamped = p.put_graph(s, &g).await.unwrap();

  assert!(stamped.last_modified >= before);
  assert_eq!(p.get_graph(s).await.unwrap(), g);
}

#[tokio::test]
async fn put_graph_for_unknown_board_is_not_found() {
  let p = persistence().await;
  let err = p
    .put_graph(Session::new(Uuid::new_v4()), &GraphData::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ConspiracyNotFound(_)));
  assert!(err.is_not_found());
}

#[tokio::test]
async fn update_graph_propagates_edit_errors_without_saving() {
  let p = persistence().await;
  let s = board(&p, "edits").await;

  let err = p
    .update_graph(s, |g| g.add_edge(Uuid::new_v4(), Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(conspire_core::Error::NodeNotFound(_))));
  assert!(p.get_graph(s).await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_changes_name_only() {
  let p = persistence().await;
  let s = board(&p, "before").await;
  let created = p.get_conspiracy(s.conspiracy_id).await.unwrap().created;

  let renamed = p.rename(s, "after").await.unwrap();
  assert_eq!(renamed.name, "after");
  assert_eq!(renamed.created, created);
}

// ─── Upload ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_uploads_share_one_asset() {
  let p = persistence().await;
  let s = board(&p, "dedup").await;

  let a = p.upload(s, Some("a.png".into()), "image/png", b"same pixels".to_vec()).await.unwrap();
  let b = p.upload(s, Some("b.png".into()), "image/png", b"same pixels".to_vec()).await.unwrap();

  assert_ne!(a.id, b.id);
  assert_eq!(a.asset_ref(), b.asset_ref());
  assert_eq!(p.store().asset_count().await.unwrap(), 1);

  let graph = p.get_graph(s).await.unwrap();
  assert_eq!(graph.nodes.len(), 2);
  assert_eq!(graph.asset_refs().len(), 1);
}

#[tokio::test]
async fn stored_assets_satisfy_content_addressing() {
  let p = persistence().await;
  let s = board(&p, "hashes").await;
  let node = p.upload(s, None, "image/gif", b"GIF89a".to_vec()).await.unwrap();

  let id = node.asset_ref().unwrap();
  let asset = p.get_asset(id).await.unwrap();
  assert_eq!(AssetId::digest(&asset.data), asset.id);
}

#[tokio::test]
async fn upload_to_unknown_board_writes_nothing() {
  let p = persistence().await;
  let err = p
    .upload(Session::new(Uuid::new_v4()), None, "image/png", b"lost".to_vec())
    .await
    .unwrap_err();
  assert!(err.is_not_found());
  assert_eq!(p.store().asset_count().await.unwrap(), 0);
}

// ─── Export ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_without_assets_has_two_entries() {
  let p = persistence().await;
  let s = board(&p, "plain").await;
  p.add_node(s, Node::entity("Eve", "person")).await.unwrap();

  let export = p.export(s).await.unwrap();
  assert_eq!(export.file_name, "plain.zip");
  assert_eq!(entry_count(&export.bytes), 2);
}

#[tokio::test]
async fn export_prunes_unreferenced_assets() {
  let p = persistence().await;
  let s = board(&p, "pruned").await;
  p.upload(s, Some("kept.png".into()), "image/png", b"kept".to_vec()).await.unwrap();
  p.put_asset(&Asset::from_upload(None, "image/png", b"orphan".to_vec()))
    .await
    .unwrap();

  let other = board(&p, "other").await;
  p.upload(other, None, "image/png", b"elsewhere".to_vec()).await.unwrap();

  let export = p.export(s).await.unwrap();
  assert_eq!(export.assets, vec![AssetId::digest(b"kept")]);
  assert_eq!(entry_count(&export.bytes), 4);
}

#[tokio::test]
async fn export_tolerates_dangling_asset_reference() {
  let p = persistence().await;
  let s = board(&p, "dangling").await;
  let ghost = AssetId::digest(b"never stored");
  p.add_node(s, Node::image(ghost.clone(), None, "image/png")).await.unwrap();

  let export = p.export(s).await.unwrap();
  assert!(export.assets.is_empty());
  assert_eq!(export.missing, vec![ghost]);
  assert_eq!(entry_count(&export.bytes), 2);
}

#[tokio::test]
async fn export_unknown_board_is_not_found() {
  let p = persistence().await;
  let err = p.export(Session::new(Uuid::new_v4())).await.unwrap_err();
  assert!(matches!(err, Error::GraphNotFound(_)));
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_then_import_into_fresh_store_is_lossless() {
  let src = persistence().await;
  let s = board(&src, "evidence wall").await;
  let photo = src
    .upload(s, Some("photo.png".into()), "image/png", b"photo".to_vec())
    .await
    .unwrap();
  src.upload(s, Some("map.png".into()), "image/png", b"map".to_vec()).await.unwrap();
  let person = src.add_node(s, Node::entity("Frank", "person")).await.unwrap();
  src
    .update_graph(s, |g| {
      g.add_edge(person.id, photo.id)?;
      g.extract_crop(photo.id, Crop { x0: 1.0, y0: 2.0, width: 3.0, height: 4.0 })
    })
    .await
    .unwrap();
  src
    .put_asset(&Asset::from_upload(None, "image/png", b"unrelated".to_vec()))
    .await
    .unwrap();

  let original_graph = src.get_graph(s).await.unwrap();
  let export = src.export(s).await.unwrap();

  let dst = persistence().await;
  let imported = dst.import(&export.bytes).await.unwrap();
  assert_eq!(imported.id, s.conspiracy_id);
  assert_eq!(imported.name, "evidence wall");

  let session = Session::from(&imported);
  assert_eq!(dst.get_graph(session).await.unwrap(), original_graph);

  let mut expected: Vec<AssetId> = original_graph.asset_refs().into_iter().collect();
  expected.sort();
  let mut stored = Vec::new();
  let mut cursor = None;
  loop {
    let page = dst.store().scan_assets(cursor, 8).await.unwrap();
    stored.extend(page.assets.into_iter().map(|a| a.id));
    match page.next {
      Some(next) => cursor = Some(next),
      None => break,
    }
  }
  stored.sort();
  assert_eq!(stored, expected);
}

#[tokio::test]
async fn import_missing_graph_leaves_store_untouched() {
  let p = persistence().await;

  let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
  zip
    .start_file("conspiracy.json", SimpleFileOptions::default())
    .unwrap();
  zip
    .write_all(&serde_json::to_vec(&Conspiracy::new("half")).unwrap())
    .unwrap();
  let bytes = zip.finish().unwrap().into_inner();

  let err = p.import(&bytes).await.unwrap_err();
  assert!(matches!(err, Error::MalformedArchive(_)));
  assert!(p.list_conspiracies().await.unwrap().is_empty());
  assert_eq!(p.store().asset_count().await.unwrap(), 0);
}

#[tokio::test]
async fn import_overwrites_board_with_same_id() {
  let p = persistence().await;
  let s = board(&p, "mine").await;
  let export = p.export(s).await.unwrap();

  p.add_node(s, Node::entity("added later", "")).await.unwrap();
  p.rename(s, "renamed later").await.unwrap();

  let restored = p.import(&export.bytes).await.unwrap();
  assert_eq!(restored.name, "mine");
  assert!(p.get_graph(s).await.unwrap().is_empty());
  assert_eq!(p.list_conspiracies().await.unwrap().len(), 1);
}

#[tokio::test]
async fn entities_and_web_references_land_on_the_board() {
  let p = persistence().await;
  let s = board(&p, "links").await;

  let who = p.add_entity(s, "Mallory", "person").await.unwrap();
  let url = p
    .add_web_reference(s, "https://example.org/leak.pdf", "application/pdf")
    .await
    .unwrap();

  let graph = p.get_graph(s).await.unwrap();
  assert_eq!(graph.node(who.id), Some(&who));
  assert_eq!(graph.node(url.id), Some(&url));
  assert!(graph.asset_refs().is_empty());
}

// ─── Concurrent edits ────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_uploads_keep_every_node() {
  let p = persistence().await;
  let s = board(&p, "drop zone").await;

  let (one, two) = tokio::join!(
    p.upload(s, Some("one.png".into()), "image/png", b"one".to_vec()),
    p.upload(s, Some("two.png".into()), "image/png", b"two".to_vec()),
  );
  let (one, two) = (one.unwrap(), two.unwrap());

  let graph = p.get_graph(s).await.unwrap();
  assert_eq!(graph.nodes.len(), 2);
  assert!(graph.node(one.id).is_some());
  assert!(graph.node(two.id).is_some());
}

#[tokio::test]
async fn many_concurrent_edits_through_clones_all_land() {
  let p = persistence().await;
  let s = board(&p, "crowd").await;

  let tasks: Vec<_> = (0..8)
    .map(|i| {
      let p = p.clone();
      tokio::spawn(async move { p.add_entity(s, &format!("suspect {i}"), "person").await })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  assert_eq!(p.get_graph(s).await.unwrap().nodes.len(), 8);
}

#[tokio::test]
async fn concurrent_rename_and_save_keeps_new_name() {
  let p = persistence().await;
  let s = board(&p, "old").await;
  let mut g = GraphData::default();
  g.upsert_node(Node::entity("Walter", "person"));

  let (renamed, saved) = tokio::join!(p.rename(s, "new"), p.put_graph(s, &g));
  renamed.unwrap();
  saved.unwrap();

  assert_eq!(p.get_conspiracy(s.conspiracy_id).await.unwrap().name, "new");
  assert_eq!(p.get_graph(s).await.unwrap(), g);
}

#[tokio::test]
async fn saving_graph_does_not_rewrite_the_name() {
  let p = persistence().await;
  let s = board(&p, "stale").await;

  // A rename through another handle lands between reads and the save.
  p.store()
    .save_conspiracy(&Conspiracy { name: "fresh".into(), ..p.get_conspiracy(s.conspiracy_id).await.unwrap() })
    .await
    .unwrap();
  let stamped = p.put_graph(s, &GraphData::default()).await.unwrap();
  assert_eq!(stamped.name, "fresh");
}

// ─── Export file names ───────────────────────────────────────────────────────

#[test]
fn export_file_name_is_a_single_safe_component() {
  let id = Uuid::new_v4();
  assert_eq!(archive_file_name("case file", id), "case file.zip");
  assert_eq!(archive_file_name("../../etc/passwd", id), "_.._etc_passwd.zip");
  assert_eq!(archive_file_name("a\\b\nc", id), "a_b_c.zip");
  assert_eq!(archive_file_name("..", id), format!("{id}.zip"));
  assert_eq!(archive_file_name("   ", id), format!("{id}.zip"));
}

#[tokio::test]
async fn export_of_hostile_name_stays_in_place() {
  let p = persistence().await;
  let s = board(&p, "../outside").await;
  let export = p.export(s).await.unwrap();
  assert_eq!(export.file_name, "_outside.zip");
  assert!(!export.file_name.contains('/'));
}
