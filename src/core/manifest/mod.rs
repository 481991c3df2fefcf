pub mod model;
pub mod store;

pub use model::{
    split_disabled, Destination, Entry, Loader, LoaderPolicy, Manifest, Minecraft, Section,
    DISABLED_SUFFIX, SCHEMA_VERSION,
};
pub use store::ManifestStore;
