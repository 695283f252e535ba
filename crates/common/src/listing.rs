use futures::{Stream, TryStreamExt};
use serde::Serialize;

use crate::backend::{BackendError, ObjectInfo};
use crate::size::format_base10;

/// One navigation link in a listing's ancestry chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// Key with the listed prefix removed
    pub name: String,
    pub size: String,
    pub is_prefix: bool,
}

/// A prefix listing ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub bucket: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub entries: Vec<ListingEntry>,
}

/// Breadcrumbs for `prefix`, rooted at the bucket.
///
/// For prefix `a/b/` the trail is `bucket`, `a`, `b` with links
/// `access/bucket/`, `access/bucket//a/`, `access/bucket//a/b/`.
pub fn breadcrumbs(serialized_access: &str, bucket: &str, prefix: &str) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb {
        label: bucket.to_string(),
        url: format!("{}/{}/", serialized_access, bucket),
    }];

    if !prefix.is_empty() {
        let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
        for (depth, component) in trimmed.split('/').enumerate() {
            let parent = &crumbs[crumbs.len() - 1].url;
            // the bucket crumb is followed by an empty segment
            let url = if depth == 0 {
                format!("{}/{}/", parent, component)
            } else {
                format!("{}{}/", parent, component)
            };
            crumbs.push(Breadcrumb {
                label: component.to_string(),
                url,
            });
        }
    }

    crumbs
}

/// Drain a backend listing into a [`Listing`].
///
/// The whole listing is held in memory; entries keep the backend's order.
pub async fn build_listing<S>(
    serialized_access: &str,
    bucket: &str,
    prefix: &str,
    items: S,
) -> Result<Listing, BackendError>
where
    S: Stream<Item = Result<ObjectInfo, BackendError>>,
{
    let entries = items
        .map_ok(|item| ListingEntry {
            name: item
                .key
                .strip_prefix(prefix)
                .unwrap_or(&item.key)
                .to_string(),
            size: format_base10(item.size),
            is_prefix: item.is_prefix,
        })
        .try_collect()
        .await?;

    Ok(Listing {
        bucket: bucket.to_string(),
        breadcrumbs: breadcrumbs(serialized_access, bucket, prefix),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::stream;

    #[test]
    fn test_breadcrumbs_bucket_root() {
        let crumbs = breadcrumbs("cred", "bucket", "");
        assert_eq!(
            crumbs,
            vec![Breadcrumb {
                label: "bucket".to_string(),
                url: "cred/bucket/".to_string(),
            }]
        );
    }

    #[test]
    fn test_breadcrumbs_nested_prefix() {
        let crumbs = breadcrumbs("cred", "bucket", "a/b/c/");
        let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        let urls: Vec<&str> = crumbs.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(labels, vec!["bucket", "a", "b", "c"]);
        assert_eq!(
            urls,
            vec![
                "cred/bucket/",
                "cred/bucket//a/",
                "cred/bucket//a/b/",
                "cred/bucket//a/b/c/",
            ]
        );
        for pair in urls.windows(2) {
            assert!(pair[1].starts_with(pair[0]));
        }
    }

    #[tokio::test]
    async fn test_build_listing() {
        let items = stream::iter(vec![
            Ok(ObjectInfo {
                key: "docs/z.txt".to_string(),
                is_prefix: false,
                size: 1_500,
                created: None,
            }),
            Ok(ObjectInfo::prefix("docs/a/")),
            Ok(ObjectInfo {
                key: "docs/b.txt".to_string(),
                is_prefix: false,
                size: 3,
                created: None,
            }),
        ]);

        let listing = build_listing("cred", "bucket", "docs/", items).await.unwrap();
        assert_eq!(listing.bucket, "bucket");
        assert_eq!(listing.breadcrumbs.len(), 2);

        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["z.txt", "a/", "b.txt"]);
        assert_eq!(listing.entries[0].size, "1.5 KB");
        assert!(listing.entries[1].is_prefix);
        assert_eq!(listing.entries[2].size, "3 B");
    }

    #[tokio::test]
    async fn test_build_listing_error() {
        let items = stream::iter(vec![Err(BackendError::BucketNotFound("bucket".to_string()))]);
        let err = build_listing("cred", "bucket", "", items).await.unwrap_err();
        assert!(matches!(err, BackendError::BucketNotFound(_)));
    }
}
