mod cloud_store;
mod local_store;
mod store_factory;

pub use cloud_store::CloudStagingStore;
pub use local_store::{LocalStagingStore, UPLOAD_ROUTE_PREFIX};
pub use store_factory::{StagingStoreFactory, StagingStores};
