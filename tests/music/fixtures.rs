use recollect::{AssociationDescriptor, Collection, CollectionSlot, RecordType};

/// Band 1-n Album 1-n Track, wired through late-bound slots.
pub struct Music {
    pub bands: Collection,
    pub albums: Collection,
    pub tracks: Collection,
}

impl Music {
    pub fn new() -> Self {
        let band_slot = CollectionSlot::new();
        let album_slot = CollectionSlot::new();
        let track_slot = CollectionSlot::new();

        let bands = Collection::new(
            RecordType::builder("Band")
                .attributes(["name", "genre"])
                .to_many(
                    "albums",
                    AssociationDescriptor::new(album_slot.accessor()).foreign_key("band_id"),
                )
                .build(),
        );
        let albums = Collection::new(
            RecordType::builder("Album")
                .attributes(["name", "coverUrl", "releaseDate", "band_id"])
                .to_one(
                    "band",
                    AssociationDescriptor::new(band_slot.accessor()).foreign_key("band_id"),
                )
                .to_many(
                    "tracks",
                    AssociationDescriptor::new(track_slot.accessor()).foreign_key("album_id"),
                )
                .build(),
        );
        let tracks = Collection::new(
            RecordType::builder("Track")
                .attributes(["name", "duration", "album_id"])
                .to_one("album", AssociationDescriptor::new(album_slot.accessor()))
                .build(),
        );

        band_slot.bind(&bands);
        album_slot.bind(&albums);
        track_slot.bind(&tracks);

        Music {
            bands,
            albums,
            tracks,
        }
    }
}
