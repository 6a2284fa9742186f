//! Integration tests for identity tracking and associations.

mod fixtures;

use fixtures::Music;
use recollect::{OrmError, PrimaryKey, Properties, Related};
use serde_json::{json, Value};

fn named(name: &str) -> Properties {
    Properties::new().with("name", name)
}

#[test]
fn to_one_assignment_follows_identity_promotion() {
    let music = Music::new();

    let album = music.albums.set(named("Foxtrot")).unwrap();
    album.assign_one("band", Some(named("Genesis"))).unwrap();
    assert_eq!(music.bands.size(), 1);

    let band = album.one("band").unwrap();
    assert!(music.bands.get(band.key()).unwrap().ptr_eq(&band));
    let optimistic = band.key();

    band.set_attr("id", 123).unwrap();

    assert_eq!(album.attr("band_id"), json!(123));
    assert!(music.bands.get(123).unwrap().ptr_eq(&band));
    assert!(music.bands.get(optimistic).is_none());
    assert!(album.one("band").unwrap().ptr_eq(&band));
}

#[test]
fn to_many_push_materializes_members() {
    let music = Music::new();

    let album = music.albums.set(named("X")).unwrap();
    album.assign_many("tracks", [named("T1")]).unwrap();
    assert_eq!(music.tracks.size(), 1);

    let mut tracks = album.many("tracks").unwrap();
    tracks.push(named("T2")).unwrap();

    assert_eq!(album.many("tracks").unwrap().len(), 2);
    assert_eq!(music.tracks.size(), 2);
}

#[test]
fn to_many_assignment_replaces() {
    let music = Music::new();

    let album = music.albums.set(named("Foxtrot")).unwrap();
    let t1 = music.tracks.set(named("Watcher of the Skies")).unwrap();
    let t2 = music.tracks.set(named("Time Table")).unwrap();

    album.assign_many("tracks", [&t1, &t2]).unwrap();
    album.assign_many("tracks", [&t2]).unwrap();

    assert_eq!(t1.attr("album_id"), Value::Null);
    assert_eq!(t2.attr("album_id"), album.key().to_value());
    assert_eq!(music.tracks.size(), 2);

    let members = album.many("tracks").unwrap();
    assert_eq!(members.len(), 1);
    assert!(members.get(0).unwrap().ptr_eq(&t2));
}

#[test]
fn members_and_back_references_follow_parent_promotion() {
    let music = Music::new();

    let album = music.albums.set(named("Selling England by the Pound")).unwrap();
    album
        .assign_many("tracks", [named("Dancing with the Moonlit Knight"), named("Firth of Fifth")])
        .unwrap();

    let track = album.many("tracks").unwrap().into_vec().remove(0);
    assert!(track.one("album").unwrap().ptr_eq(&album));

    album.set_attr("id", 77).unwrap();

    for track in music.tracks.items() {
        assert_eq!(track.attr("album_id"), json!(77));
    }
    assert!(track.one("album").unwrap().ptr_eq(&album));
    assert_eq!(album.many("tracks").unwrap().len(), 2);
}

#[test]
fn backend_keys_promote_whole_graph() {
    let music = Music::new();

    let band = music.bands.set(named("Genesis")).unwrap();
    let album = music.albums.set(named("Foxtrot")).unwrap();
    album.assign_one("band", Some(&band)).unwrap();
    album.assign_many("tracks", [named("Get 'Em Out by Friday")]).unwrap();

    band.set_attr("id", 1).unwrap();
    album.set_attr("id", 10).unwrap();

    assert_eq!(album.attr("band_id"), json!(1));
    assert_eq!(band.many("albums").unwrap().len(), 1);
    let track = music.tracks.items().remove(0);
    assert_eq!(track.attr("album_id"), json!(10));
    assert!(track.one("album").unwrap().one("band").unwrap().ptr_eq(&band));
}

#[test]
fn nested_bags_create_the_whole_graph() {
    let music = Music::new();

    let album = music
        .albums
        .set(
            Properties::new()
                .with("name", "The Lamb Lies Down on Broadway")
                .with("band", named("Genesis"))
                .with("tracks", vec![named("Fly on a Windshield"), named("Carpet Crawlers")]),
        )
        .unwrap();

    assert_eq!(music.bands.size(), 1);
    assert_eq!(music.tracks.size(), 2);
    assert_eq!(album.one("band").unwrap().attr("name"), json!("Genesis"));
    assert_eq!(album.many("tracks").unwrap().len(), 2);
}

#[test]
fn strict_and_lenient_set() {
    let music = Music::new();

    let err = music
        .albums
        .set(Properties::new().with("unknownField", 1))
        .unwrap_err();
    assert_eq!(
        err,
        OrmError::UndeclaredProperty {
            record_type: "Album".into(),
            property: "unknownField".into(),
        }
    );
    assert!(music.albums.is_empty());

    let album = music
        .albums
        .set_lenient(Properties::new().with("unknownField", 1))
        .unwrap();
    assert_eq!(album.attr("unknownField"), Value::Null);
    assert_eq!(music.albums.size(), 1);
}

#[test]
fn nested_bags_are_validated_before_anything_is_written() {
    let music = Music::new();
    let keep = music
        .albums
        .set(Properties::new().with("id", 1).with("name", "Keep"))
        .unwrap();

    let err = music
        .albums
        .set(
            Properties::new()
                .with("id", 1)
                .with("tracks", vec![named("ok"), Properties::new().with("bogus", 1)]),
        )
        .unwrap_err();

    assert_eq!(
        err,
        OrmError::UndeclaredProperty {
            record_type: "Track".into(),
            property: "bogus".into(),
        }
    );
    assert_eq!(music.albums.size(), 1);
    assert!(music.albums.get(1).unwrap().ptr_eq(&keep));
    assert!(music.tracks.is_empty());

    let album = named("Foxtrot").with("band", json!({"x": 1}));
    let err = music
        .tracks
        .set(named("Supper's Ready").with("album", album))
        .unwrap_err();
    assert!(matches!(err, OrmError::UndeclaredProperty { property, .. } if property == "x"));
    assert!(music.tracks.is_empty());
    assert_eq!(music.albums.size(), 1);
    assert!(music.bands.is_empty());
}

#[test]
fn lenient_set_skips_nested_undeclared_keys() {
    let music = Music::new();
    let album = music
        .albums
        .set_lenient(named("Foxtrot").with("tracks", vec![named("Horizons").with("bogus", 1)]))
        .unwrap();

    let tracks = album.many("tracks").unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks.get(0).unwrap().attr("name"), json!("Horizons"));
}

#[test]
fn to_many_rejects_non_lists() {
    let music = Music::new();
    let album = music.albums.set(named("Abacab")).unwrap();

    let err = album
        .merge_properties(Properties::new().with("tracks", "not a list"))
        .unwrap_err();
    assert!(matches!(
        err,
        OrmError::InvalidAssociationValue { association, .. } if association == "tracks"
    ));
}

#[test]
fn unset_many_ignores_missing_keys() {
    let music = Music::new();
    let k1 = music.bands.set(named("Genesis")).unwrap().key();
    let k2 = music.bands.set(named("Yes")).unwrap().key();
    music.bands.set(named("Camel")).unwrap();

    let removed = music
        .bands
        .unset_many([k1, k2, PrimaryKey::from("missing")]);

    assert_eq!(removed, 2);
    assert_eq!(music.bands.size(), 1);
}

#[test]
fn unset_leaves_foreign_keys_dangling() {
    let music = Music::new();
    let album = music.albums.set(named("Duke")).unwrap();
    album
        .assign_one("band", Some(Properties::new().with("id", 5).with("name", "Genesis")))
        .unwrap();

    music.bands.unset(5);

    assert_eq!(album.attr("band_id"), json!(5));
    assert!(album.one("band").is_none());

    let again = music.bands.set(Properties::new().with("id", 5)).unwrap();
    assert!(album.one("band").unwrap().ptr_eq(&again));
}

#[test]
fn every_record_reachable_under_exactly_its_key() {
    let music = Music::new();
    let mut bands = Vec::new();
    for i in 0..5 {
        bands.push(music.bands.set(named(&format!("band {}", i))).unwrap());
    }
    bands[1].set_attr("id", 100).unwrap();
    bands[3].set_attr("id", "b3").unwrap();
    bands[1].set_attr("id", 101).unwrap();
    bands[3].set_attr("id", Value::Null).unwrap();

    assert_eq!(music.bands.size(), 5);
    for band in &bands {
        assert!(music.bands.get(band.key()).unwrap().ptr_eq(band));
        let reachable = music
            .bands
            .items()
            .iter()
            .filter(|candidate| candidate.ptr_eq(band))
            .count();
        assert_eq!(reachable, 1);
    }
    assert!(!music.bands.has(100));
    assert!(!music.bands.has("b3"));
}

#[test]
fn clearing_a_to_one() {
    let music = Music::new();
    let album = music.albums.set(named("Wind & Wuthering")).unwrap();
    album.assign_one("band", Some(named("Genesis"))).unwrap();

    album.assign_one("band", None::<Related>).unwrap();
    assert_eq!(album.attr("band_id"), Value::Null);
    assert!(album.one("band").is_none());
    assert_eq!(music.bands.size(), 1);
}

#[test]
fn populate_band_discography() {
    let music = Music::new();
    let band = music
        .bands
        .set(Properties::new().with("id", 1).with("name", "Genesis").with("genre", "prog"))
        .unwrap();
    band.assign_many(
        "albums",
        [Properties::new().with("id", 2).with("name", "Trespass")],
    )
    .unwrap();

    let populated = band.populate(&json!({"albums": true}));
    assert_eq!(populated["name"], json!("Genesis"));
    assert_eq!(populated["albums"][0]["name"], json!("Trespass"));
    assert_eq!(populated["albums"][0]["band_id"], json!(1));
}
