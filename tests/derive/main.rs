//! Integration tests for `#[derive(RecordType)]`.

use recollect::{Collection, CollectionSlot, PropertyKind, Properties, RecordDefinition, RecordType};
use serde_json::json;

thread_local! {
    static BANDS: CollectionSlot = CollectionSlot::new();
    static TRACKS: CollectionSlot = CollectionSlot::new();
}

fn bands() -> Option<Collection> {
    BANDS.with(CollectionSlot::get)
}

fn tracks() -> Option<Collection> {
    TRACKS.with(CollectionSlot::get)
}

#[allow(dead_code)]
#[derive(RecordType)]
struct Band {
    id: i64,
    name: String,
}

#[allow(dead_code)]
#[derive(RecordType)]
#[record(name = "Album")]
struct AlbumRecord {
    id: i64,
    name: String,
    #[record(rename = "coverUrl")]
    cover_url: String,
    band_id: i64,
    #[record(to_one(collection = bands, foreign_key = "band_id", merge))]
    band: (),
    #[record(to_many(collection = tracks))]
    tracks: (),
    #[record(skip)]
    cached_title: String,
}

#[allow(dead_code)]
#[derive(RecordType)]
#[record(primary_key = "isrc")]
struct Track {
    isrc: String,
    name: String,
    album_id: i64,
}

#[test]
fn derives_the_declaration() {
    let album = AlbumRecord::record_type();

    assert_eq!(album.name(), "Album");
    assert_eq!(album.primary_key(), "id");
    assert_eq!(
        album.property_names(),
        &["id", "name", "coverUrl", "band_id", "band", "tracks"]
    );
    assert_eq!(album.property_kind("band"), Some(PropertyKind::ToOne));
    assert_eq!(album.property_kind("tracks"), Some(PropertyKind::ToMany));
    assert!(!album.has_property("cached_title"));
    assert!(album.to_one_associations()[0].1.merges_on_assign());

    let track = Track::record_type();
    assert!(track.is_primary_key("isrc"));
    assert!(!track.has_property("id"));
}

#[test]
fn derived_types_wire_associations() {
    let band_collection = Collection::of::<Band>();
    let track_collection = Collection::of::<Track>();
    BANDS.with(|slot| slot.bind(&band_collection));
    TRACKS.with(|slot| slot.bind(&track_collection));
    let albums = Collection::of::<AlbumRecord>();

    let album = albums
        .set(
            Properties::new()
                .with("name", "Misplaced Childhood")
                .with("band", Properties::new().with("id", 1).with("name", "Marillion"))
                .with(
                    "tracks",
                    vec![Properties::new()
                        .with("isrc", "GB-EMI-85-001")
                        .with("name", "Kayleigh")],
                ),
        )
        .unwrap();

    assert_eq!(album.attr("band_id"), json!(1));
    assert_eq!(album.foreign_key_of("tracks"), Some("album_id"));
    assert_eq!(album.many("tracks").unwrap().len(), 1);

    // merge_on_assign updates the known band in place
    album
        .assign_one("band", Some(Properties::new().with("id", 1).with("name", "Marillion (UK)")))
        .unwrap();
    assert_eq!(band_collection.size(), 1);
    assert_eq!(band_collection.get(1).unwrap().attr("name"), json!("Marillion (UK)"));

    let track = track_collection.get("GB-EMI-85-001").unwrap();
    album.set_attr("id", 3).unwrap();
    assert_eq!(track.attr("album_id"), json!(3));
}

#[test]
fn unbound_slot_fails_construction() {
    // slots are thread-local, a fresh thread has none bound
    let message = std::thread::spawn(|| {
        let albums = Collection::of::<AlbumRecord>();
        let err = albums.set(Properties::new()).unwrap_err();
        assert!(albums.is_empty());
        err.to_string()
    })
    .join()
    .unwrap();
    assert!(message.contains("band"));
}
