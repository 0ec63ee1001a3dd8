//! Paginated lister — turns page-at-a-time access into one complete list.

use serde::de::DeserializeOwned;

use crate::client::{PageRequest, ResourceKind, ResourceSource};
use crate::error::TransportError;

/// Records requested per page.
pub const PER_PAGE: u32 = 200;

/// Fetch every record of `kind`, following pagination until the API stops
/// advertising a next page.
///
/// All or nothing: the first failing page aborts the listing and its error
/// is returned; records from earlier pages are dropped.
pub async fn list_all<T>(
    source: &dyn ResourceSource,
    kind: ResourceKind,
) -> Result<Vec<T>, TransportError>
where
    T: DeserializeOwned,
{
    let mut records = Vec::new();
    let mut page = 1;

    loop {
        let listing = source
            .list_page(kind, PageRequest { page, per_page: PER_PAGE })
            .await?;

        // An empty page ends the listing even if the API claims more follow.
        if listing.items.is_empty() && listing.has_next {
            tracing::warn!(kind = %kind, page, "Empty page advertised a next page — stopping");
            break;
        }

        records.reserve(listing.items.len());
        for item in listing.items {
            let record = serde_json::from_value(item)
                .map_err(|source| TransportError::Decode { kind, page, source })?;
            records.push(record);
        }

        if !listing.has_next {
            break;
        }
        page += 1;
    }

    tracing::trace!(kind = %kind, pages = page, records = records.len(), "Listing complete");
    Ok(records)
}
