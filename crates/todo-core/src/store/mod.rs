//! Document store access
//!
//! The provisioner builds the store client and creates the database and
//! container at startup; the resulting handle carries item access for the
//! rest of the process lifetime.

mod cosmos;
mod handle;
mod mock;
mod provisioner;
mod traits;

pub use cosmos::CosmosStore;
pub use handle::DataAccessHandle;
pub use mock::MockDocumentStore;
pub use provisioner::{
    ProvisionError, ProvisionResult, StoreConnectionDescriptor, StoreFactory, StoreProvisioner,
    CONTAINER_NAME_KEY, COSMOS_ENDPOINT_KEY, DATABASE_NAME_KEY, DEFAULT_PARTITION_KEY_PATH,
};
pub use traits::{DocumentStore, ProvisionOutcome, StoreError, StoreResult};
