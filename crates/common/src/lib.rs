/**
 * Access grants: the opaque bearer credential
 *  embedded in sharing links and TXT records.
 */
pub mod access;
/**
 * Storage backend capability and its
 *  object_store implementation.
 */
pub mod backend;
/**
 * Hostname -> (access, root) cache with
 *  time based expiry.
 */
pub mod cache;
/**
 * DNS TXT lookups.
 */
pub mod dns;
/**
 * Geo-IP lookups for storage node locations.
 */
pub mod geoip;
/**
 * Resolution of custom domains into an
 *  access grant and a storage root.
 */
pub mod hosting;
/**
 * Prefix listings and breadcrumbs.
 */
pub mod listing;
/**
 * Randomly addressable view of a stored object.
 */
pub mod ranger;
/**
 * Parsing of the TXT records that
 *  map a hostname onto a bucket.
 */
pub mod records;
/**
 * Parsing of traditional sharing link paths.
 */
pub mod request_path;
pub mod size;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::access::{Access, AccessError};
    pub use crate::backend::{
        BackendError, ByteStream, ObjectInfo, ObjectStoreBackend, ObjectStoreConfig, Project,
        StorageBackend,
    };
    pub use crate::cache::{CacheEntry, CredentialCache};
    pub use crate::dns::{LookupError, StaticTxtLookup, SystemTxtLookup, TxtLookup};
    pub use crate::geoip::{GeoIpError, GeoLocator, IpTable, Location};
    pub use crate::hosting::{HostResolver, ResolveError};
    pub use crate::listing::{Breadcrumb, Listing, ListingEntry};
    pub use crate::ranger::ObjectRanger;
    pub use crate::records::{RecordError, RootPath};
    pub use crate::request_path::{RequestPath, RequestPathError};
    pub use crate::size::format_base10;
    pub use crate::version::BuildInfo;
}
