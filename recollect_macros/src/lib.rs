mod record_type;

use proc_macro::TokenStream;

/// Derive `recollect::RecordDefinition` from a marker struct.
///
/// Every named field is an own attribute unless annotated. Struct-level
/// `#[record(name = "...", primary_key = "...")]` overrides the type name
/// (default: the struct name) and the primary-key field (default: `"id"`).
///
/// Field annotations:
/// - `#[record(rename = "coverUrl")]` declares the attribute under another name
/// - `#[record(to_one(collection = bands, foreign_key = "band_id"))]`
/// - `#[record(to_many(collection = tracks, foreign_key = "album_id", merge))]`
/// - `#[record(skip)]` leaves the field undeclared
///
/// `collection` is any expression usable as `Fn() -> Option<Collection>`,
/// usually the path of a function.
///
/// ```ignore
/// #[derive(RecordType)]
/// struct Album {
///     id: i64,
///     name: String,
///     band_id: i64,
///     #[record(to_one(collection = bands, foreign_key = "band_id"))]
///     band: (),
///     #[record(to_many(collection = tracks))]
///     tracks: (),
/// }
///
/// let albums = Collection::of::<Album>();
/// ```
#[proc_macro_derive(RecordType, attributes(record))]
pub fn derive_record_type(input: TokenStream) -> TokenStream {
    record_type::derive_record_type(input)
}
